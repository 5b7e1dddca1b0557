//! 文本纠错服务 - 业务能力层
//!
//! 按顺序执行一组纠错步骤（默认先拼写后语法），最后统一修正标点前的空白

use anyhow::Result;
use futures::future::BoxFuture;
use regex::Regex;
use tracing::{debug, info};

use crate::config::{Config, CorrectionStage, GenerationParams};
use crate::error::{Capability, GradingError};
use crate::infrastructure::ModelRegistry;
use crate::utils::logging::truncate_text;

/// 单个纠错步骤
///
/// 步骤本身只保存参数，模型能力在执行时从注册表获取
pub trait CorrectionStep: Send + Sync {
    /// 步骤名称（用于日志）
    fn name(&self) -> &str;

    fn apply<'a>(
        &'a self,
        models: &'a ModelRegistry,
        text: &'a str,
    ) -> BoxFuture<'a, Result<String, GradingError>>;
}

/// 拼写纠正：直接把文本交给拼写模型
pub struct SpellingCorrection {
    params: GenerationParams,
}

impl SpellingCorrection {
    pub fn new(params: GenerationParams) -> Self {
        Self { params }
    }
}

impl CorrectionStep for SpellingCorrection {
    fn name(&self) -> &str {
        "spelling"
    }

    fn apply<'a>(
        &'a self,
        models: &'a ModelRegistry,
        text: &'a str,
    ) -> BoxFuture<'a, Result<String, GradingError>> {
        Box::pin(async move {
            models
                .generator(CorrectionStage::Spelling)
                .generate(text, &self.params)
                .await
                .map_err(|e| GradingError::model_unavailable(Capability::Spelling, e))
        })
    }
}

/// 语法纠正：先套用指令模板，再交给语法模型
pub struct GrammarCorrection {
    params: GenerationParams,
    /// 含 `{text}` 占位符的指令模板
    template: String,
}

impl GrammarCorrection {
    pub fn new(params: GenerationParams, template: impl Into<String>) -> Self {
        Self {
            params,
            template: template.into(),
        }
    }

    fn prompt(&self, text: &str) -> String {
        self.template.replace("{text}", text)
    }
}

impl CorrectionStep for GrammarCorrection {
    fn name(&self) -> &str {
        "grammar"
    }

    fn apply<'a>(
        &'a self,
        models: &'a ModelRegistry,
        text: &'a str,
    ) -> BoxFuture<'a, Result<String, GradingError>> {
        Box::pin(async move {
            let prompt = self.prompt(text);
            models
                .generator(CorrectionStage::Grammar)
                .generate(&prompt, &self.params)
                .await
                .map_err(|e| GradingError::model_unavailable(Capability::Grammar, e))
        })
    }
}

/// 文本纠错
///
/// 职责：
/// - 按顺序执行纠错步骤，前一步的输出是后一步的输入
/// - 去掉标点（`. , ! ?`）前的空白
/// - 模型失败直接向上返回，不重试
pub struct TextCorrector {
    steps: Vec<Box<dyn CorrectionStep>>,
    space_before_punct: Regex,
}

impl TextCorrector {
    /// 使用自定义步骤创建
    pub fn with_steps(steps: Vec<Box<dyn CorrectionStep>>) -> Result<Self> {
        Ok(Self {
            steps,
            space_before_punct: Regex::new(r"\s+([.,!?])")?,
        })
    }

    /// 按配置中的阶段列表创建
    pub fn from_config(config: &Config) -> Result<Self> {
        let steps = config
            .correction_stages
            .iter()
            .map(|stage| -> Box<dyn CorrectionStep> {
                match stage {
                    CorrectionStage::Spelling => {
                        Box::new(SpellingCorrection::new(config.generation.clone()))
                    }
                    CorrectionStage::Grammar => Box::new(GrammarCorrection::new(
                        config.generation.clone(),
                        &config.grammar_prompt_template,
                    )),
                }
            })
            .collect();
        Self::with_steps(steps)
    }

    /// 步骤名称列表
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// 纠正文本
    pub async fn correct(&self, models: &ModelRegistry, text: &str) -> Result<String, GradingError> {
        let mut current = text.to_string();

        for step in &self.steps {
            info!("✏️ 执行纠错步骤: {}", step.name());
            let next = step.apply(models, &current).await?;
            current = next;
            debug!("{} 输出: {}", step.name(), truncate_text(&current, 120));
        }

        Ok(self.tidy_punctuation(&current))
    }

    /// 去掉标点前的空白，`"word ."` → `"word."`
    pub fn tidy_punctuation(&self, text: &str) -> String {
        self.space_before_punct.replace_all(text, "$1").into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{Embedder, TextGenerator};
    use std::sync::{Arc, Mutex};

    /// 记录收到的输入，并给输出加上标记
    struct TaggingGenerator {
        tag: &'static str,
        seen: Mutex<Vec<(String, u32)>>,
    }

    impl TaggingGenerator {
        fn new(tag: &'static str) -> Arc<Self> {
            Arc::new(Self {
                tag,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl TextGenerator for TaggingGenerator {
        fn model_name(&self) -> &str {
            self.tag
        }

        fn generate<'a>(
            &'a self,
            input: &'a str,
            params: &'a GenerationParams,
        ) -> BoxFuture<'a, anyhow::Result<String>> {
            self.seen
                .lock()
                .unwrap()
                .push((input.to_string(), params.num_beams));
            let out = format!("{} [{}] .", input, self.tag);
            Box::pin(async move { Ok(out) })
        }
    }

    struct FailingGenerator;

    impl TextGenerator for FailingGenerator {
        fn model_name(&self) -> &str {
            "broken"
        }

        fn generate<'a>(
            &'a self,
            _input: &'a str,
            _params: &'a GenerationParams,
        ) -> BoxFuture<'a, anyhow::Result<String>> {
            Box::pin(async move { Err(anyhow::anyhow!("weights missing")) })
        }
    }

    struct ZeroEmbedder;

    impl Embedder for ZeroEmbedder {
        fn model_name(&self) -> &str {
            "zero"
        }

        fn embed<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, anyhow::Result<Vec<f32>>> {
            Box::pin(async move { Ok(vec![0.0; 4]) })
        }
    }

    #[test]
    fn stages_run_in_order_with_template_and_params() {
        let spelling = TaggingGenerator::new("S");
        let grammar = TaggingGenerator::new("G");
        let models = ModelRegistry::new(spelling.clone(), grammar.clone(), Arc::new(ZeroEmbedder));
        let corrector = TextCorrector::from_config(&Config::default()).unwrap();
        assert_eq!(corrector.step_names(), vec!["spelling", "grammar"]);

        let out = tokio_test::block_on(corrector.correct(&models, "teh cat")).unwrap();

        assert_eq!(
            spelling.seen.lock().unwrap().as_slice(),
            &[("teh cat".to_string(), 5)]
        );
        assert_eq!(
            grammar.seen.lock().unwrap().as_slice(),
            &[("Fix grammatical errors in this text: teh cat [S] .".to_string(), 5)]
        );
        assert_eq!(out, "Fix grammatical errors in this text: teh cat [S]. [G].");
    }

    #[test]
    fn spelling_only_pipeline() {
        let spelling = TaggingGenerator::new("S");
        let grammar = TaggingGenerator::new("G");
        let models = ModelRegistry::new(spelling.clone(), grammar.clone(), Arc::new(ZeroEmbedder));
        let config = Config {
            correction_stages: vec![CorrectionStage::Spelling],
            ..Config::default()
        };
        let corrector = TextCorrector::from_config(&config).unwrap();

        let out = tokio_test::block_on(corrector.correct(&models, "hello")).unwrap();
        assert_eq!(out, "hello [S].");
        assert!(grammar.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn model_failure_propagates_with_capability() {
        let models = ModelRegistry::new(
            Arc::new(FailingGenerator),
            TaggingGenerator::new("G"),
            Arc::new(ZeroEmbedder),
        );
        let corrector = TextCorrector::from_config(&Config::default()).unwrap();

        let err = tokio_test::block_on(corrector.correct(&models, "text")).unwrap_err();
        match err {
            GradingError::ModelUnavailable { capability, .. } => {
                assert_eq!(capability, Capability::Spelling)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn tidy_punctuation_removes_space_before_marks() {
        let corrector = TextCorrector::with_steps(Vec::new()).unwrap();
        assert_eq!(
            corrector.tidy_punctuation("Cats are mammals . Dogs bark , loudly !  Why ?"),
            "Cats are mammals. Dogs bark, loudly!  Why?"
        );
        assert_eq!(corrector.tidy_punctuation("no change here"), "no change here");
    }
}
