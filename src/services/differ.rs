//! 逐句对比服务 - 业务能力层
//!
//! 把学生答案和参考答案按句子位置配对，生成可读的对比反馈

use crate::config::{Config, SplitterKind, UnpairedPolicy};

/// 分句策略
pub trait SentenceSplitter: Send + Sync {
    fn split<'a>(&self, text: &'a str) -> Vec<&'a str>;
}

/// 按字面量 `". "` 切分
///
/// 不做真正的句子边界识别，缩写等情况也会被切开
#[derive(Debug, Default, Clone, Copy)]
pub struct LiteralSplitter;

impl SentenceSplitter for LiteralSplitter {
    fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text.split(". ").collect()
    }
}

/// 在 `.` `!` `?` 后跟空白处切分，标点保留在句尾
#[derive(Debug, Default, Clone, Copy)]
pub struct PunctuationSplitter;

impl SentenceSplitter for PunctuationSplitter {
    fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut sentences = Vec::new();
        let mut start = 0;
        let mut chars = text.char_indices().peekable();

        while let Some((_, c)) = chars.next() {
            if matches!(c, '.' | '!' | '?') {
                if let Some(&(next_idx, next)) = chars.peek() {
                    if next.is_whitespace() {
                        sentences.push(&text[start..next_idx]);
                        start = next_idx;
                    }
                }
            }
        }
        sentences.push(&text[start..]);
        sentences
    }
}

const MISSING: &str = "(missing)";

/// 逐句对比
pub struct SentenceDiffer {
    splitter: Box<dyn SentenceSplitter>,
    unpaired: UnpairedPolicy,
}

impl Default for SentenceDiffer {
    fn default() -> Self {
        Self::new(Box::new(LiteralSplitter), UnpairedPolicy::Drop)
    }
}

impl SentenceDiffer {
    pub fn new(splitter: Box<dyn SentenceSplitter>, unpaired: UnpairedPolicy) -> Self {
        Self { splitter, unpaired }
    }

    pub fn from_config(config: &Config) -> Self {
        let splitter: Box<dyn SentenceSplitter> = match config.sentence_splitter {
            SplitterKind::Literal => Box::new(LiteralSplitter),
            SplitterKind::Punctuation => Box::new(PunctuationSplitter),
        };
        Self::new(splitter, config.unpaired_sentences)
    }

    /// 对比学生答案和参考答案
    ///
    /// - 按位置配对，默认丢弃较长一方多出来的句子
    /// - 任一方去掉空白后为空则跳过该位置
    /// - 忽略大小写比较
    ///
    /// # 返回
    /// 每句一段，空行分隔；没有可比较的句子时返回空字符串
    pub fn diff(&self, student_answer: &str, answer_key: &str) -> String {
        let student = self.splitter.split(student_answer);
        let expected = self.splitter.split(answer_key);

        let pairs = match self.unpaired {
            UnpairedPolicy::Drop => student.len().min(expected.len()),
            UnpairedPolicy::Pad => student.len().max(expected.len()),
        };

        let mut feedback = Vec::new();
        for i in 0..pairs {
            let s = student.get(i).map(|s| s.trim());
            let e = expected.get(i).map(|e| e.trim());

            if s == Some("") || e == Some("") {
                continue;
            }

            let line = match (s, e) {
                (Some(s), Some(e)) if s.to_lowercase() == e.to_lowercase() => {
                    format!("✅ Sentence {}: Correct", i + 1)
                }
                (s, e) => format!(
                    "❌ Sentence {}:\nStudent: {}\nExpected: {}",
                    i + 1,
                    s.unwrap_or(MISSING),
                    e.unwrap_or(MISSING)
                ),
            };
            feedback.push(line);
        }

        feedback.join("\n\n")
    }
}
