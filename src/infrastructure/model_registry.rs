//! 模型注册表
//!
//! 进程启动时构造一次，之后只读共享；评分流程通过引用使用

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::config::{Config, CorrectionStage, ModelBackend};
use crate::error::Capability;
use crate::infrastructure::{
    Embedder, HfEmbedder, HfInferenceClient, HfTextGenerator, OpenAiChatGenerator, OpenAiEmbedder,
    TextGenerator,
};

const SPELLING_SYSTEM_PROMPT: &str =
    "Correct the spelling mistakes in the user's text. Reply with the corrected text only.";
const GRAMMAR_SYSTEM_PROMPT: &str =
    "Follow the user's instruction and reply with the corrected text only.";

/// 模型注册表
///
/// 持有三种模型能力的共享句柄，构造后不再修改
pub struct ModelRegistry {
    spelling: Arc<dyn TextGenerator>,
    grammar: Arc<dyn TextGenerator>,
    embedder: Arc<dyn Embedder>,
}

impl ModelRegistry {
    /// 使用自定义能力创建（测试或本地模型）
    pub fn new(
        spelling: Arc<dyn TextGenerator>,
        grammar: Arc<dyn TextGenerator>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            spelling,
            grammar,
            embedder,
        }
    }

    /// 按配置构造远程模型后端
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = match config.model_backend {
            ModelBackend::Hf => {
                let client =
                    HfInferenceClient::new(&config.hf_api_base_url, config.hf_api_token.clone())?;
                Self::new(
                    Arc::new(HfTextGenerator::new(client.clone(), &config.spelling_model)),
                    Arc::new(HfTextGenerator::new(client.clone(), &config.grammar_model)),
                    Arc::new(HfEmbedder::new(client, &config.embedding_model)),
                )
            }
            ModelBackend::OpenAi => Self::new(
                Arc::new(OpenAiChatGenerator::new(
                    &config.llm_api_key,
                    &config.llm_api_base_url,
                    &config.spelling_model,
                    SPELLING_SYSTEM_PROMPT,
                )),
                Arc::new(OpenAiChatGenerator::new(
                    &config.llm_api_key,
                    &config.llm_api_base_url,
                    &config.grammar_model,
                    GRAMMAR_SYSTEM_PROMPT,
                )),
                Arc::new(OpenAiEmbedder::new(
                    &config.llm_api_key,
                    &config.llm_api_base_url,
                    &config.embedding_model,
                )),
            ),
        };

        info!(
            "✓ 模型已就绪: spelling={}, grammar={}, embedding={}",
            registry.spelling.model_name(),
            registry.grammar.model_name(),
            registry.embedder.model_name()
        );
        Ok(registry)
    }

    /// 纠错阶段对应的生成模型
    pub fn generator(&self, stage: CorrectionStage) -> &dyn TextGenerator {
        match stage {
            CorrectionStage::Spelling => self.spelling.as_ref(),
            CorrectionStage::Grammar => self.grammar.as_ref(),
        }
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }
}

impl From<CorrectionStage> for Capability {
    fn from(stage: CorrectionStage) -> Self {
        match stage {
            CorrectionStage::Spelling => Capability::Spelling,
            CorrectionStage::Grammar => Capability::Grammar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_backend_uses_one_client_kind_for_all_capabilities() {
        let config = Config {
            model_backend: ModelBackend::OpenAi,
            llm_api_key: "sk-test".to_string(),
            llm_api_base_url: "http://localhost:9/v1".to_string(),
            spelling_model: "speller".to_string(),
            grammar_model: "grammarian".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            ..Config::default()
        };
        let registry = ModelRegistry::from_config(&config).unwrap();

        assert_eq!(registry.generator(CorrectionStage::Spelling).model_name(), "speller");
        assert_eq!(registry.generator(CorrectionStage::Grammar).model_name(), "grammarian");
        assert_eq!(registry.embedder().model_name(), "text-embedding-3-small");
    }

    #[test]
    fn hf_backend_names_default_models() {
        let registry = ModelRegistry::from_config(&Config::default()).unwrap();
        assert_eq!(
            registry.generator(CorrectionStage::Spelling).model_name(),
            "oliverguhr/spelling-correction-english-base"
        );
        assert_eq!(
            registry.embedder().model_name(),
            "sentence-transformers/all-MiniLM-L6-v2"
        );
    }

    #[test]
    fn stages_map_to_capabilities() {
        assert_eq!(Capability::from(CorrectionStage::Spelling), Capability::Spelling);
        assert_eq!(Capability::from(CorrectionStage::Grammar), Capability::Grammar);
    }
}
