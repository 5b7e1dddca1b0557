//! 文本清洗服务 - 业务能力层
//!
//! 只负责把 OCR 片段整理成一段干净的文本，不做拼写和语法纠正

use anyhow::Result;
use regex::Regex;

use crate::services::segmenter::WordSegmenter;

/// OCR 文本清洗
///
/// 职责：
/// - 拼接 OCR 片段
/// - 去掉白名单以外的字符（字母、数字、空白、`. , ? ! - ' "`）
/// - 合并空白
/// - 拆分过长或混有数字的单词
pub struct TextNormalizer {
    segmenter: WordSegmenter,
    /// 长度超过该值的单词会被拆分
    min_split_len: usize,
    disallowed: Regex,
}

impl TextNormalizer {
    /// 创建新的清洗服务
    pub fn new(segmenter: WordSegmenter, min_split_len: usize) -> Result<Self> {
        Ok(Self {
            segmenter,
            min_split_len,
            disallowed: Regex::new(r#"[^a-zA-Z0-9\s.,?!\-'"]"#)?,
        })
    }

    /// 清洗 OCR 片段
    ///
    /// # 参数
    /// - `tokens`: OCR 识别出的文本片段（阅读顺序）
    ///
    /// # 返回
    /// 以单个空格分隔的文本，空输入返回空字符串
    pub fn normalize<S: AsRef<str>>(&self, tokens: &[S]) -> String {
        let raw = tokens
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<&str>>()
            .join(" ");

        let cleaned = self.disallowed.replace_all(&raw, " ").replace('_', " ");

        let mut words: Vec<String> = Vec::new();
        for word in cleaned.split_whitespace() {
            if self.needs_split(word) {
                words.extend(self.segmenter.split(word));
            } else {
                words.push(word.to_string());
            }
        }

        words.join(" ")
    }

    fn needs_split(&self, word: &str) -> bool {
        word.chars().count() > self.min_split_len || word.chars().any(|c| c.is_ascii_digit())
    }
}
