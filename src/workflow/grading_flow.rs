//! 评分流程 - 流程层
//!
//! 核心职责：定义"一份答卷"的完整评分流程
//!
//! 流程顺序：
//! 1. 校验输入（参考答案、总分）
//! 2. 清洗 OCR 文本
//! 3. 拼写 / 语法纠错
//! 4. 与每个参考答案比较相似度，取最佳（内部逐句对比）

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::GradingError;
use crate::infrastructure::ModelRegistry;
use crate::models::{filter_answer_keys, validate_total_marks, GradingResult};
use crate::services::{SentenceDiffer, SimilarityScorer, TextCorrector, TextNormalizer, WordSegmenter};
use crate::utils::logging::truncate_text;

/// 评分流程
///
/// - 编排 清洗 → 纠错 → 评分
/// - 不持有模型，只借用注册表
/// - 除模型调用外没有任何 I/O
pub struct Grader<'m> {
    models: &'m ModelRegistry,
    normalizer: TextNormalizer,
    corrector: TextCorrector,
    scorer: SimilarityScorer,
    max_answer_keys: usize,
}

impl<'m> Grader<'m> {
    /// 按配置创建评分流程
    pub fn new(config: &Config, models: &'m ModelRegistry) -> Result<Self> {
        let segmenter = match &config.dictionary_path {
            Some(path) => WordSegmenter::from_file(path)?,
            None => WordSegmenter::builtin(),
        };
        debug!("分词词典大小: {}", segmenter.len());

        Ok(Self::from_parts(
            models,
            TextNormalizer::new(segmenter, config.segment_min_length)?,
            TextCorrector::from_config(config)?,
            SimilarityScorer::new(SentenceDiffer::from_config(config)),
            config.max_answer_keys,
        ))
    }

    /// 使用自定义组件创建
    pub fn from_parts(
        models: &'m ModelRegistry,
        normalizer: TextNormalizer,
        corrector: TextCorrector,
        scorer: SimilarityScorer,
        max_answer_keys: usize,
    ) -> Self {
        Self {
            models,
            normalizer,
            corrector,
            scorer,
            max_answer_keys,
        }
    }

    /// 评分
    ///
    /// # 参数
    /// - `tokens`: OCR 识别出的文本片段
    /// - `answer_keys`: 参考答案（空白项会被忽略）
    /// - `total_marks`: 总分，必须为正数
    ///
    /// # 返回
    /// 纠错后的答案、相似度百分比、得分和逐句反馈
    pub async fn evaluate<S: AsRef<str>>(
        &self,
        tokens: &[S],
        answer_keys: &[String],
        total_marks: f64,
    ) -> Result<GradingResult, GradingError> {
        let (positions, keys): (Vec<usize>, Vec<&str>) =
            filter_answer_keys(answer_keys, self.max_answer_keys)?
                .into_iter()
                .unzip();
        let total_marks = validate_total_marks(total_marks)?;

        let normalized = self.normalizer.normalize(tokens);
        if normalized.is_empty() {
            warn!("⚠️ 清洗后文本为空，将按空答案评分");
        }
        info!("🧹 清洗后文本: {}", truncate_text(&normalized, 80));

        let corrected = self.corrector.correct(self.models, &normalized).await?;
        info!("✏️ 纠错后文本: {}", truncate_text(&corrected, 80));

        let outcome = self
            .scorer
            .score(self.models, &corrected, &keys, total_marks)
            .await?;

        Ok(GradingResult {
            corrected_answer: corrected,
            similarity_percentage: outcome.similarity_percentage,
            marks_scored: outcome.marks_scored,
            feedback: outcome.best_feedback,
            matched_key: outcome.best_index.map(|idx| positions[idx]),
        })
    }
}
