use serde::{Deserialize, Serialize};

/// 评分结果
///
/// 不变式：`marks_scored == round(similarity_percentage / 100 * total_marks, 2)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingResult {
    /// 清洗、纠错后的学生答案
    pub corrected_answer: String,
    /// 相似度百分比，范围 [0, 100]
    pub similarity_percentage: f64,
    /// 得分，范围 [0, total_marks]
    pub marks_scored: f64,
    /// 与最佳参考答案的逐句对比
    pub feedback: String,
    /// 最佳参考答案在调用方传入列表中的下标（空白项也计入）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_key: Option<usize>,
}
