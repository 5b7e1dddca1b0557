//! OpenAI 兼容接口后端
//!
//! ## 技术栈
//! - 纠错使用 `async-openai` 的 chat completions（temperature 固定为 0）
//! - 向量使用 `async-openai` 的 embeddings 接口，与 chat 共用同一种客户端配置
//!
//! chat 接口不支持束搜索参数，`num_beams` / `repetition_penalty` / `early_stopping`
//! 会被忽略，只有 `max_length` 映射为 `max_tokens`

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    types::embeddings::CreateEmbeddingRequestArgs,
    Client,
};
use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::config::GenerationParams;
use crate::infrastructure::{Embedder, TextGenerator};

/// 基于 chat completions 的文本纠错
pub struct OpenAiChatGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    system_prompt: String,
}

impl OpenAiChatGenerator {
    /// 创建新的生成器
    ///
    /// `system_prompt` 决定这个实例承担哪一种纠错
    pub fn new(
        api_key: &str,
        api_base_url: &str,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model: model.into(),
            system_prompt: system_prompt.into(),
        }
    }

    async fn complete(&self, input: &str, params: &GenerationParams) -> Result<String> {
        debug!(
            "调用 chat 接口，模型: {}，忽略束搜索参数 (num_beams={})",
            self.model, params.num_beams
        );

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(self.system_prompt.as_str())
            .build()?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(input)
            .build()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(0.0)
            .max_tokens(params.max_length)
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("chat 接口调用失败: {}", e);
            anyhow::anyhow!("chat 接口调用失败: {}", e)
        })?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("模型 {} 返回内容为空", self.model))?;

        Ok(content.trim().to_string())
    }
}

impl TextGenerator for OpenAiChatGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn generate<'a>(
        &'a self,
        input: &'a str,
        params: &'a GenerationParams,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.complete(input, params))
    }
}

/// 基于 embeddings 接口的语义向量
pub struct OpenAiEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(api_key: &str, api_base_url: &str, model: impl Into<String>) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model: model.into(),
        }
    }

    async fn create(&self, text: &str) -> Result<Vec<f32>> {
        debug!("调用 embeddings 接口，模型: {}", self.model);

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(text)
            .build()?;

        let response = self.client.embeddings().create(request).await.map_err(|e| {
            warn!("embeddings 接口调用失败: {}", e);
            anyhow::anyhow!("embeddings 接口调用失败: {}", e)
        })?;

        response
            .data
            .into_iter()
            .next()
            .map(|item| item.embedding)
            .ok_or_else(|| anyhow::anyhow!("模型 {} 返回向量为空", self.model))
    }
}

impl Embedder for OpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>>> {
        Box::pin(self.create(text))
    }
}
