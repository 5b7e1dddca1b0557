//! 基础设施层（Infrastructure）
//!
//! 持有模型资源，只暴露三种能力：拼写纠正、语法纠正、语义向量。
//! 不认识答卷、参考答案，也不关心评分流程。

pub mod hf_inference;
pub mod model_registry;
pub mod openai_backend;

use anyhow::Result;
use futures::future::BoxFuture;

use crate::config::GenerationParams;

pub use hf_inference::{HfEmbedder, HfInferenceClient, HfTextGenerator};
pub use model_registry::ModelRegistry;
pub use openai_backend::{OpenAiChatGenerator, OpenAiEmbedder};

/// 文本生成能力（seq2seq）
///
/// 拼写纠正和语法纠正都通过该接口调用
pub trait TextGenerator: Send + Sync {
    /// 模型标识（用于日志）
    fn model_name(&self) -> &str;

    /// 根据输入文本生成输出文本
    fn generate<'a>(
        &'a self,
        input: &'a str,
        params: &'a GenerationParams,
    ) -> BoxFuture<'a, Result<String>>;
}

/// 语义向量能力
///
/// 同一个实例的输出处于同一向量空间，学生答案和参考答案必须用同一实例
pub trait Embedder: Send + Sync {
    /// 模型标识（用于日志）
    fn model_name(&self) -> &str;

    /// 计算文本的定长向量
    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>>>;
}
