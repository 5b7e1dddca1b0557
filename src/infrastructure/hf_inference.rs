//! Hugging Face 推理接口后端
//!
//! 兼容 `text2text-generation` 和 `feature-extraction` 两类 pipeline 的 HTTP 接口，
//! 生成参数原样透传（束宽、重复惩罚、提前停止），保证与本地 pipeline 输出一致

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::config::GenerationParams;
use crate::infrastructure::{Embedder, TextGenerator};

/// Hugging Face 推理接口客户端
///
/// 只负责 HTTP 调用，`reqwest::Client` 内部是连接池，克隆开销很小
#[derive(Clone)]
pub struct HfInferenceClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HfInferenceClient {
    /// 创建新的客户端
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("answer_grader/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("无法创建 HTTP 客户端")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), model)
    }

    /// 向指定模型发送 JSON 请求并解析响应
    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        model: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let url = self.endpoint(model);
        debug!("调用 HF 推理接口: {}", url);

        let mut request = self.http.post(&url).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("请求失败: {}", url))?
            .error_for_status()
            .with_context(|| format!("接口返回错误状态: {}", url))?;

        response
            .json::<T>()
            .await
            .with_context(|| format!("无法解析接口响应: {}", url))
    }
}

/// 生成参数在 HF 接口中的格式
#[derive(Debug, Serialize)]
struct HfGenerationParameters {
    max_length: u32,
    num_beams: u32,
    repetition_penalty: f32,
    early_stopping: bool,
}

impl From<&GenerationParams> for HfGenerationParameters {
    fn from(p: &GenerationParams) -> Self {
        Self {
            max_length: p.max_length,
            num_beams: p.num_beams,
            repetition_penalty: p.repetition_penalty,
            early_stopping: p.early_stopping,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenerationResponse {
    Batch(Vec<GeneratedText>),
    Single(GeneratedText),
}

impl GenerationResponse {
    fn into_text(self) -> Option<String> {
        match self {
            GenerationResponse::Batch(items) => items.into_iter().next().map(|g| g.generated_text),
            GenerationResponse::Single(item) => Some(item.generated_text),
        }
    }
}

/// 基于 HF 接口的 seq2seq 文本生成
pub struct HfTextGenerator {
    client: HfInferenceClient,
    model: String,
}

impl HfTextGenerator {
    pub fn new(client: HfInferenceClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

impl TextGenerator for HfTextGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn generate<'a>(
        &'a self,
        input: &'a str,
        params: &'a GenerationParams,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let body = json!({
                "inputs": input,
                "parameters": HfGenerationParameters::from(params),
                "options": { "wait_for_model": true, "use_cache": false },
            });

            let response: GenerationResponse = self.client.post(&self.model, &body).await?;
            response
                .into_text()
                .ok_or_else(|| anyhow::anyhow!("模型 {} 返回结果为空", self.model))
        })
    }
}

/// feature-extraction 的几种返回形状
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeatureResponse {
    /// sentence-transformers 模型：已池化的句向量
    Flat(Vec<f32>),
    /// 单行矩阵，或逐 token 向量
    Matrix(Vec<Vec<f32>>),
    /// 批量的逐 token 向量
    Tensor(Vec<Vec<Vec<f32>>>),
}

impl FeatureResponse {
    fn into_vector(self) -> Option<Vec<f32>> {
        match self {
            FeatureResponse::Flat(v) => Some(v),
            FeatureResponse::Matrix(rows) => mean_pool(&rows),
            FeatureResponse::Tensor(batch) => batch.first().and_then(|rows| mean_pool(rows)),
        }
    }
}

/// 逐维求平均；行长度不一致时返回 None
fn mean_pool(rows: &[Vec<f32>]) -> Option<Vec<f32>> {
    let first = rows.first()?;
    let dims = first.len();
    if rows.iter().any(|r| r.len() != dims) {
        return None;
    }

    let mut pooled = vec![0.0f32; dims];
    for row in rows {
        for (acc, value) in pooled.iter_mut().zip(row) {
            *acc += value;
        }
    }
    let count = rows.len() as f32;
    pooled.iter_mut().for_each(|v| *v /= count);
    Some(pooled)
}

/// 基于 HF 接口的语义向量
pub struct HfEmbedder {
    client: HfInferenceClient,
    model: String,
}

impl HfEmbedder {
    pub fn new(client: HfInferenceClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

impl Embedder for HfEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>>> {
        Box::pin(async move {
            let body = json!({
                "inputs": text,
                "options": { "wait_for_model": true },
            });

            let response: FeatureResponse = self.client.post(&self.model, &body).await?;
            response
                .into_vector()
                .ok_or_else(|| anyhow::anyhow!("模型 {} 返回的向量形状无效", self.model))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_response_shapes() {
        let flat: FeatureResponse = serde_json::from_str("[0.5, 1.0]").unwrap();
        assert_eq!(flat.into_vector(), Some(vec![0.5, 1.0]));

        let single_row: FeatureResponse = serde_json::from_str("[[0.5, 1.0]]").unwrap();
        assert_eq!(single_row.into_vector(), Some(vec![0.5, 1.0]));

        let tokens: FeatureResponse = serde_json::from_str("[[1.0, 0.0], [3.0, 2.0]]").unwrap();
        assert_eq!(tokens.into_vector(), Some(vec![2.0, 1.0]));

        let batch: FeatureResponse = serde_json::from_str("[[[1.0, 1.0], [3.0, 3.0]]]").unwrap();
        assert_eq!(batch.into_vector(), Some(vec![2.0, 2.0]));
    }

    #[test]
    fn ragged_token_vectors_are_rejected() {
        assert_eq!(mean_pool(&[vec![1.0, 2.0], vec![1.0]]), None);
        assert_eq!(mean_pool(&[]), None);
    }

    #[test]
    fn generation_response_shapes() {
        let batch: GenerationResponse =
            serde_json::from_str(r#"[{"generated_text": "fixed text"}]"#).unwrap();
        assert_eq!(batch.into_text().as_deref(), Some("fixed text"));

        let empty: GenerationResponse = serde_json::from_str("[]").unwrap();
        assert_eq!(empty.into_text(), None);
    }

    #[test]
    fn endpoint_joins_model_path() {
        let client = HfInferenceClient::new("https://example.test/models/", None).unwrap();
        assert_eq!(
            client.endpoint("org/model"),
            "https://example.test/models/org/model"
        );
    }

    #[test]
    fn generation_parameters_are_passed_through() {
        let params = GenerationParams::default();
        let value = serde_json::to_value(HfGenerationParameters::from(&params)).unwrap();
        assert_eq!(value["num_beams"], 5);
        assert_eq!(value["max_length"], 1024);
        assert_eq!(value["early_stopping"], true);
    }
}
