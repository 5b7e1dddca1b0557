//! 程序配置
//!
//! 默认值 → TOML 配置文件 → 环境变量，后者覆盖前者

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 模型后端类型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelBackend {
    /// Hugging Face 推理接口（text2text-generation / feature-extraction）
    Hf,
    /// OpenAI 兼容接口（chat completions / embeddings）
    OpenAi,
}

impl std::str::FromStr for ModelBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hf" | "huggingface" => Ok(ModelBackend::Hf),
            "openai" => Ok(ModelBackend::OpenAi),
            other => Err(format!("未知的模型后端: {}", other)),
        }
    }
}

/// 纠错阶段
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrectionStage {
    Spelling,
    Grammar,
}

impl std::str::FromStr for CorrectionStage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spelling" => Ok(CorrectionStage::Spelling),
            "grammar" => Ok(CorrectionStage::Grammar),
            other => Err(format!("未知的纠错阶段: {}", other)),
        }
    }
}

/// 分句策略
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitterKind {
    /// 按字面量 ". " 切分
    Literal,
    /// 按 `.` `!` `?` 后跟空白切分
    Punctuation,
}

/// 末尾未配对句子的处理方式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnpairedPolicy {
    /// 直接丢弃
    Drop,
    /// 以 "(missing)" 补齐并标记为不匹配
    Pad,
}

/// 生成参数
///
/// 拼写和语法两个阶段共用同一组参数
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    pub max_length: u32,
    pub num_beams: u32,
    pub repetition_penalty: f32,
    pub early_stopping: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_length: 1024,
            num_beams: 5,
            repetition_penalty: 2.5,
            early_stopping: true,
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 模型后端 ---
    pub model_backend: ModelBackend,
    pub hf_api_base_url: String,
    pub hf_api_token: Option<String>,
    pub llm_api_base_url: String,
    pub llm_api_key: String,
    pub spelling_model: String,
    pub grammar_model: String,
    pub embedding_model: String,
    /// 生成参数（束搜索等）
    pub generation: GenerationParams,
    // --- 评分流程 ---
    /// 按顺序执行的纠错阶段
    pub correction_stages: Vec<CorrectionStage>,
    pub grammar_prompt_template: String,
    /// 超过该长度的单词会被拆分
    pub segment_min_length: usize,
    /// 词频词典路径（每行一个词，按词频降序）
    pub dictionary_path: Option<String>,
    pub sentence_splitter: SplitterKind,
    pub unpaired_sentences: UnpairedPolicy,
    pub max_answer_keys: usize,
    // --- 批量处理 ---
    /// 待评分答卷存放目录
    pub submissions_folder: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_backend: ModelBackend::Hf,
            hf_api_base_url: "https://api-inference.huggingface.co/models".to_string(),
            hf_api_token: None,
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_api_key: String::new(),
            spelling_model: "oliverguhr/spelling-correction-english-base".to_string(),
            grammar_model: "pszemraj/flan-t5-large-grammar-synthesis".to_string(),
            embedding_model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            generation: GenerationParams::default(),
            correction_stages: vec![CorrectionStage::Spelling, CorrectionStage::Grammar],
            grammar_prompt_template: "Fix grammatical errors in this text: {text}".to_string(),
            segment_min_length: 10,
            dictionary_path: None,
            sentence_splitter: SplitterKind::Literal,
            unpaired_sentences: UnpairedPolicy::Drop,
            max_answer_keys: 3,
            submissions_folder: "submissions".to_string(),
            output_log_file: "grading_log.txt".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量加载（以默认值为基础）
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载，缺省字段使用默认值，再叠加环境变量
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))?;
        Ok(config.with_env_overrides())
    }

    /// 若设置了 `GRADER_CONFIG` 则读取该文件，否则只用环境变量
    pub fn load() -> Result<Self> {
        match std::env::var("GRADER_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim()),
            _ => Ok(Self::from_env()),
        }
    }

    fn with_env_overrides(self) -> Self {
        let current = self;
        Self {
            model_backend: env_parse("MODEL_BACKEND").unwrap_or(current.model_backend),
            hf_api_base_url: std::env::var("HF_API_BASE_URL").unwrap_or(current.hf_api_base_url),
            hf_api_token: std::env::var("HF_API_TOKEN").ok().or(current.hf_api_token),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(current.llm_api_base_url),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(current.llm_api_key),
            spelling_model: std::env::var("SPELLING_MODEL").unwrap_or(current.spelling_model),
            grammar_model: std::env::var("GRAMMAR_MODEL").unwrap_or(current.grammar_model),
            embedding_model: std::env::var("EMBEDDING_MODEL").unwrap_or(current.embedding_model),
            generation: current.generation,
            correction_stages: std::env::var("CORRECTION_STAGES")
                .ok()
                .and_then(|v| parse_stage_list(&v))
                .unwrap_or(current.correction_stages),
            grammar_prompt_template: std::env::var("GRAMMAR_PROMPT_TEMPLATE")
                .unwrap_or(current.grammar_prompt_template),
            segment_min_length: env_parse("SEGMENT_MIN_LENGTH").unwrap_or(current.segment_min_length),
            dictionary_path: std::env::var("DICTIONARY_PATH").ok().or(current.dictionary_path),
            sentence_splitter: current.sentence_splitter,
            unpaired_sentences: current.unpaired_sentences,
            max_answer_keys: env_parse("MAX_ANSWER_KEYS").unwrap_or(current.max_answer_keys),
            submissions_folder: std::env::var("SUBMISSIONS_FOLDER").unwrap_or(current.submissions_folder),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(current.output_log_file),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(current.verbose_logging),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// 解析逗号分隔的阶段列表，如 `spelling,grammar`；空字符串表示不做模型纠错
fn parse_stage_list(value: &str) -> Option<Vec<CorrectionStage>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}
