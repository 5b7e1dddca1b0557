use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// 一份待评分的答卷
///
/// 对应一个 TOML 文件：OCR 识别片段 + 参考答案 + 总分
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// OCR 识别出的文本片段（阅读顺序）
    #[serde(default)]
    pub tokens: Vec<String>,
    pub answer_keys: Vec<String>,
    pub total_marks: f64,
    #[serde(skip_serializing, skip_deserializing)]
    pub file_path: Option<String>,
}

impl Submission {
    /// 日志中显示的名称：优先 id，其次文件路径
    pub fn display_name(&self) -> String {
        self.id
            .clone()
            .or_else(|| self.file_path.clone())
            .unwrap_or_else(|| "<unnamed>".to_string())
    }
}

/// 过滤空白参考答案
///
/// 先检查提供的数量不超过 `max`，再丢弃空白项；全部为空时报错。
/// 返回 `(原始下标, 答案)`
pub fn filter_answer_keys(keys: &[String], max: usize) -> Result<Vec<(usize, &str)>, InputError> {
    if keys.len() > max {
        return Err(InputError::TooManyAnswerKeys {
            count: keys.len(),
            max,
        });
    }

    let kept: Vec<(usize, &str)> = keys
        .iter()
        .map(String::as_str)
        .enumerate()
        .filter(|(_, k)| !k.trim().is_empty())
        .collect();

    if kept.is_empty() {
        return Err(InputError::NoAnswerKeys);
    }
    Ok(kept)
}

/// 校验总分为有限正数
pub fn validate_total_marks(value: f64) -> Result<f64, InputError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(InputError::NonPositiveTotalMarks { value })
    }
}
