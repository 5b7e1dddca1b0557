//! 分词服务 - 业务能力层
//!
//! 把 OCR 粘连在一起的单词按词频词典拆开（"thequickbrownfox" → "the quick brown fox"）

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// 内置词频表（按词频降序，每行一个词）
const BUILTIN_WORDS: &str = include_str!("../../data/words.txt");

/// 基于词频的分词器
///
/// 排名为 r 的词代价为 `ln((r + 1) * ln N)`，取总代价最小的完整切分
#[derive(Debug, Clone)]
pub struct WordSegmenter {
    word_cost: HashMap<String, f64>,
    max_word_len: usize,
}

impl WordSegmenter {
    /// 使用内置词表
    pub fn builtin() -> Self {
        Self::from_word_list(BUILTIN_WORDS)
    }

    /// 从词表文本构造；重复出现的词以第一次的排名为准
    pub fn from_word_list(list: &str) -> Self {
        let mut words: Vec<String> = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for line in list.lines() {
            let word = line.trim().to_ascii_lowercase();
            if !word.is_empty() && seen.insert(word.clone()) {
                words.push(word);
            }
        }

        let ln_n = (words.len().max(2) as f64).ln();
        let max_word_len = words.iter().map(|w| w.chars().count()).max().unwrap_or(0);
        let word_cost = words
            .into_iter()
            .enumerate()
            .map(|(rank, word)| (word, ((rank + 1) as f64 * ln_n).ln()))
            .collect();

        Self {
            word_cost,
            max_word_len,
        }
    }

    /// 从文件加载词表
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取词典文件: {}", path.display()))?;
        let segmenter = Self::from_word_list(&content);
        if segmenter.is_empty() {
            anyhow::bail!("词典文件为空: {}", path.display());
        }
        Ok(segmenter)
    }

    pub fn len(&self) -> usize {
        self.word_cost.len()
    }

    pub fn is_empty(&self) -> bool {
        self.word_cost.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.word_cost.contains_key(&word.to_ascii_lowercase())
    }

    /// 拆分一个单词
    ///
    /// - `[A-Za-z0-9']` 以外的字符视为分隔符并丢弃
    /// - 连续数字保持为一个整体
    /// - 字母段取代价最小的完整切分；无法完整切分时保持原样
    /// - 保留原始大小写
    pub fn split(&self, token: &str) -> Vec<String> {
        let mut out = Vec::new();

        for piece in token
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '\''))
            .filter(|p| !p.is_empty())
        {
            for run in digit_runs(piece) {
                if run.chars().all(|c| c == '\'') {
                    continue;
                }
                if run.starts_with(|c: char| c.is_ascii_digit()) {
                    out.push(run.to_string());
                    continue;
                }
                match self.segment_run(run) {
                    Some(words) => out.extend(words),
                    None => out.push(run.to_string()),
                }
            }
        }

        out
    }

    /// 动态规划求最小代价切分，存在无法识别的片段时返回 None
    fn segment_run(&self, run: &str) -> Option<Vec<String>> {
        let chars: Vec<char> = run.chars().collect();
        let lower: Vec<char> = chars.iter().map(|c| c.to_ascii_lowercase()).collect();
        let n = chars.len();

        let mut cost = vec![f64::INFINITY; n + 1];
        let mut back = vec![0usize; n + 1];
        cost[0] = 0.0;

        for i in 1..=n {
            for k in 1..=i.min(self.max_word_len) {
                let prev = cost[i - k];
                if prev.is_infinite() {
                    continue;
                }
                let candidate: String = lower[i - k..i].iter().collect();
                if let Some(word_cost) = self.word_cost.get(&candidate) {
                    let total = prev + word_cost;
                    if total < cost[i] {
                        cost[i] = total;
                        back[i] = k;
                    }
                }
            }
        }

        if cost[n].is_infinite() {
            return None;
        }

        let mut words = Vec::new();
        let mut i = n;
        while i > 0 {
            let k = back[i];
            words.push(chars[i - k..i].iter().collect());
            i -= k;
        }
        words.reverse();
        Some(words)
    }
}

impl Default for WordSegmenter {
    fn default() -> Self {
        Self::builtin()
    }
}

/// 按"数字 / 非数字"切成连续片段
fn digit_runs(piece: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut prev_digit: Option<bool> = None;

    for (idx, c) in piece.char_indices() {
        let is_digit = c.is_ascii_digit();
        if let Some(prev) = prev_digit {
            if prev != is_digit {
                runs.push(&piece[start..idx]);
                start = idx;
            }
        }
        prev_digit = Some(is_digit);
    }
    if start < piece.len() {
        runs.push(&piece[start..]);
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_glued_words() {
        let segmenter = WordSegmenter::builtin();
        assert_eq!(
            segmenter.split("thequickbrownfox"),
            vec!["the", "quick", "brown", "fox"]
        );
    }

    #[test]
    fn splits_everyday_glued_phrases() {
        let segmenter = WordSegmenter::builtin();
        let cases = [
            ("informationtechnology", vec!["information", "technology"]),
            ("theheartpumpsblood", vec!["the", "heart", "pumps", "blood"]),
            ("waterevaporatesquickly", vec!["water", "evaporates", "quickly"]),
            ("electricityflowsthroughwires", vec!["electricity", "flows", "through", "wires"]),
            ("theinternationalcommunity", vec!["the", "international", "community"]),
            ("therivercarvedthecanyon", vec!["the", "river", "carved", "the", "canyon"]),
            ("weatherforecastpredictsrain", vec!["weather", "forecast", "predicts", "rain"]),
            ("Thealgorithmsortsthelist", vec!["The", "algorithm", "sorts", "the", "list"]),
        ];
        for (glued, expected) in cases {
            assert_eq!(segmenter.split(glued), expected, "输入 {}", glued);
        }
    }

    #[test]
    fn builtin_list_has_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        let lines: Vec<&str> = BUILTIN_WORDS.lines().filter(|l| !l.trim().is_empty()).collect();
        for line in &lines {
            assert!(seen.insert(*line), "重复的词: {}", line);
        }
        assert_eq!(WordSegmenter::builtin().len(), lines.len());
        assert!(lines.len() > 50_000);
    }

    #[test]
    fn misspelled_runs_stay_whole() {
        let segmenter = WordSegmenter::builtin();
        assert_eq!(segmenter.split("Fotosynthesis"), vec!["Fotosynthesis"]);
    }

    #[test]
    fn keeps_original_case() {
        let segmenter = WordSegmenter::builtin();
        assert_eq!(segmenter.split("PlantsNeedWater"), vec!["Plants", "Need", "Water"]);
    }

    #[test]
    fn separates_digits_from_letters() {
        let segmenter = WordSegmenter::builtin();
        assert_eq!(segmenter.split("year2024was"), vec!["year", "2024", "was"]);
        assert_eq!(segmenter.split("1984"), vec!["1984"]);
    }

    #[test]
    fn unknown_runs_stay_intact() {
        let segmenter = WordSegmenter::builtin();
        assert_eq!(segmenter.split("xylophonist"), vec!["xylophonist"]);
        assert_eq!(segmenter.split("zqx7"), vec!["zqx", "7"]);
    }

    #[test]
    fn punctuation_acts_as_separator() {
        let segmenter = WordSegmenter::builtin();
        assert_eq!(segmenter.split("mammals.Dogs"), vec!["mammals", "Dogs"]);
        assert_eq!(segmenter.split("'"), Vec::<String>::new());
    }

    #[test]
    fn cheaper_split_beats_rare_whole_word() {
        // in(0.09) + formation(0.79) < information(1.19)
        let segmenter = WordSegmenter::from_word_list("in\nformation\ninformation\n");
        assert!(segmenter.contains("Information"));
        assert_eq!(segmenter.split("information"), vec!["in", "formation"]);
    }

    #[test]
    fn duplicate_words_keep_first_rank() {
        let segmenter = WordSegmenter::from_word_list("the\ncat\nthe\n\n");
        assert_eq!(segmenter.len(), 2);
    }

    #[test]
    fn digit_runs_partition_piece() {
        assert_eq!(digit_runs("ab12cd3"), vec!["ab", "12", "cd", "3"]);
        assert_eq!(digit_runs("42"), vec!["42"]);
    }
}
