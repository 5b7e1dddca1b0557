//! 相似度评分服务 - 业务能力层
//!
//! 计算学生答案与每个参考答案的语义相似度，选出最佳匹配并换算分数

use simsimd::SpatialSimilarity;
use tracing::{debug, info, warn};

use crate::error::{Capability, GradingError};
use crate::infrastructure::ModelRegistry;
use crate::services::differ::SentenceDiffer;

/// 单次评分结果
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreOutcome {
    /// 最佳相似度，范围 [0, 1]
    pub best_score: f64,
    /// 最佳参考答案对应的逐句反馈
    pub best_feedback: String,
    /// 最佳参考答案的下标；没有任何答案的相似度大于 0 时为 None
    pub best_index: Option<usize>,
    pub similarity_percentage: f64,
    pub marks_scored: f64,
}

/// 相似度评分
///
/// 职责：
/// - 学生答案只计算一次向量
/// - 每个参考答案计算向量、余弦相似度和逐句反馈
/// - 严格大于才替换当前最佳，相同分数时保留先出现的答案
pub struct SimilarityScorer {
    differ: SentenceDiffer,
}

impl SimilarityScorer {
    pub fn new(differ: SentenceDiffer) -> Self {
        Self { differ }
    }

    /// 评分
    ///
    /// # 参数
    /// - `corrected_answer`: 纠错后的学生答案
    /// - `answer_keys`: 非空参考答案（调用方已过滤）
    /// - `total_marks`: 总分
    pub async fn score(
        &self,
        models: &ModelRegistry,
        corrected_answer: &str,
        answer_keys: &[&str],
        total_marks: f64,
    ) -> Result<ScoreOutcome, GradingError> {
        let embedder = models.embedder();
        let student_embedding = embedder
            .embed(corrected_answer)
            .await
            .map_err(|e| GradingError::model_unavailable(Capability::Embedding, e))?;

        let mut best_score = 0.0f64;
        let mut best_feedback = String::new();
        let mut best_index = None;

        for (idx, key) in answer_keys.iter().enumerate() {
            if key.trim().is_empty() {
                continue;
            }

            let key_embedding = embedder
                .embed(key)
                .await
                .map_err(|e| GradingError::model_unavailable(Capability::Embedding, e))?;

            let similarity = cosine_similarity(&student_embedding, &key_embedding)?;
            let feedback = self.differ.diff(corrected_answer, key);
            debug!("参考答案 {} 相似度: {:.4}", idx + 1, similarity);

            if similarity > best_score {
                best_score = similarity;
                best_feedback = feedback;
                best_index = Some(idx);
            }
        }

        if best_index.is_none() {
            warn!("⚠️ 所有参考答案的相似度都不大于 0");
        }

        let best_score = best_score.clamp(0.0, 1.0);
        let similarity_percentage = similarity_percentage(best_score);
        let marks_scored = marks_scored(similarity_percentage, total_marks);

        info!(
            "✓ 最佳相似度: {}% ({:?})，得分 {}/{}",
            similarity_percentage, best_index, marks_scored, total_marks
        );

        Ok(ScoreOutcome {
            best_score,
            best_feedback,
            best_index,
            similarity_percentage,
            marks_scored,
        })
    }
}

/// 余弦相似度
///
/// 零向量（例如空文本）的相似度为 0；维度不一致说明向量不在同一空间，按模型错误处理
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, GradingError> {
    if a.len() != b.len() {
        return Err(GradingError::model_unavailable(
            Capability::Embedding,
            anyhow::anyhow!("向量维度不一致: {} vs {}", a.len(), b.len()),
        ));
    }

    if is_zero(a) || is_zero(b) {
        return Ok(0.0);
    }

    // simsimd 返回余弦距离 (1 - similarity)
    let similarity = match f32::cosine(a, b) {
        Some(distance) => 1.0 - distance,
        None => scalar_cosine(a, b),
    };
    Ok(similarity.clamp(-1.0, 1.0))
}

fn is_zero(v: &[f32]) -> bool {
    v.iter().all(|x| *x == 0.0)
}

fn scalar_cosine(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
    let norm_a: f64 = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    dot / (norm_a * norm_b)
}

/// 保留两位小数（四舍五入，远离零）
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 相似度百分比：`round(score * 100, 2)`
pub fn similarity_percentage(best_score: f64) -> f64 {
    round2(best_score * 100.0)
}

/// 得分：`round(percentage / 100 * total_marks, 2)`
pub fn marks_scored(similarity_percentage: f64, total_marks: f64) -> f64 {
    round2(similarity_percentage / 100.0 * total_marks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationParams;
    use crate::infrastructure::{Embedder, TextGenerator};
    use futures::future::BoxFuture;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// 按文本查表返回固定向量
    struct TableEmbedder(HashMap<&'static str, Vec<f32>>);

    impl Embedder for TableEmbedder {
        fn model_name(&self) -> &str {
            "table"
        }

        fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, anyhow::Result<Vec<f32>>> {
            let found = self.0.get(text).cloned();
            Box::pin(async move { found.ok_or_else(|| anyhow::anyhow!("unknown text: {}", text)) })
        }
    }

    struct Unused;

    impl TextGenerator for Unused {
        fn model_name(&self) -> &str {
            "unused"
        }

        fn generate<'a>(
            &'a self,
            input: &'a str,
            _params: &'a GenerationParams,
        ) -> BoxFuture<'a, anyhow::Result<String>> {
            Box::pin(async move { Ok(input.to_string()) })
        }
    }

    fn registry(table: &[(&'static str, Vec<f32>)]) -> ModelRegistry {
        ModelRegistry::new(
            Arc::new(Unused),
            Arc::new(Unused),
            Arc::new(TableEmbedder(table.iter().cloned().collect())),
        )
    }

    fn score(models: &ModelRegistry, answer: &str, keys: &[&str], total: f64) -> ScoreOutcome {
        let scorer = SimilarityScorer::new(SentenceDiffer::default());
        tokio_test::block_on(scorer.score(models, answer, keys, total)).unwrap()
    }

    #[test]
    fn picks_best_key_and_its_feedback() {
        let models = registry(&[
            ("Dogs bark.", vec![1.0, 0.0]),
            ("Cats meow.", vec![0.0, 1.0]),
            ("Dogs bark loudly.", vec![0.8, 0.6]),
        ]);
        let outcome = score(&models, "Dogs bark.", &["Cats meow.", "Dogs bark loudly."], 10.0);

        assert_eq!(outcome.best_index, Some(1));
        assert_eq!(outcome.similarity_percentage, 80.0);
        assert_eq!(outcome.marks_scored, 8.0);
        assert_eq!(
            outcome.best_feedback,
            "❌ Sentence 1:\nStudent: Dogs bark.\nExpected: Dogs bark loudly."
        );
    }

    #[test]
    fn ties_keep_first_key() {
        let models = registry(&[
            ("A. B", vec![1.0, 1.0]),
            ("A. B.", vec![2.0, 2.0]),
            ("B. A", vec![2.0, 2.0]),
        ]);
        let outcome = score(&models, "A. B", &["B. A", "A. B."], 5.0);
        assert_eq!(outcome.best_index, Some(0));
        assert!(outcome.best_feedback.contains("Expected: B"));
        assert_eq!(outcome.marks_scored, 5.0);
    }

    #[test]
    fn negative_similarity_scores_zero() {
        let models = registry(&[("up", vec![1.0, 0.0]), ("down", vec![-1.0, 0.0])]);
        let outcome = score(&models, "up", &["down"], 10.0);
        assert_eq!(outcome.best_score, 0.0);
        assert_eq!(outcome.marks_scored, 0.0);
        assert_eq!(outcome.best_feedback, "");
        assert_eq!(outcome.best_index, None);
    }

    #[test]
    fn embedding_failure_is_model_unavailable() {
        let models = registry(&[("known", vec![1.0])]);
        let scorer = SimilarityScorer::new(SentenceDiffer::default());
        let err = tokio_test::block_on(scorer.score(&models, "known", &["missing"], 1.0))
            .unwrap_err();
        assert!(matches!(
            err,
            GradingError::ModelUnavailable {
                capability: Capability::Embedding,
                ..
            }
        ));
    }

    #[test]
    fn cosine_edge_cases() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).unwrap(), 0.0);
        assert!((cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]).unwrap() - 1.0).abs() < 1e-5);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]).unwrap().abs() < 1e-5);
        assert!((cosine_similarity(&[1.0, 0.0], &[-2.0, 0.0]).unwrap() + 1.0).abs() < 1e-5);
        assert!(cosine_similarity(&[1.0], &[1.0, 0.0]).is_err());
    }

    #[test]
    fn rounding_contract() {
        assert_eq!(similarity_percentage(0.123456), 12.35);
        assert_eq!(marks_scored(85.5, 20.0), 17.1);
        assert_eq!(marks_scored(75.0, 8.0), 6.0);
        assert_eq!(marks_scored(100.0, 7.0), 7.0);
        assert_eq!(round2(2.0 / 3.0), 0.67);
    }

    #[test]
    fn totals_beyond_two_decimals_round_marks() {
        // 得分只保留两位小数，满分 0.125 记为 0.13
        let pct = similarity_percentage(1.0);
        assert_eq!(pct, 100.0);
        assert_eq!(marks_scored(pct, 0.125), 0.13);
        assert_eq!(marks_scored(pct, 0.5), 0.5);
    }
}
