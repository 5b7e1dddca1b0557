use std::fmt;

/// 模型能力类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// 拼写纠正
    Spelling,
    /// 语法纠正
    Grammar,
    /// 语义向量
    Embedding,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Spelling => write!(f, "spelling"),
            Capability::Grammar => write!(f, "grammar"),
            Capability::Embedding => write!(f, "embedding"),
        }
    }
}

/// 评分错误类型
#[derive(Debug, thiserror::Error)]
pub enum GradingError {
    /// 调用方可检测的前置条件不满足
    #[error("输入无效: {0}")]
    InvalidInput(#[from] InputError),

    /// 模型加载或推理失败，不做重试
    #[error("模型不可用 ({capability}): {source}")]
    ModelUnavailable {
        capability: Capability,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 输入校验错误
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    /// 没有非空的参考答案
    #[error("至少需要提供一个参考答案")]
    NoAnswerKeys,

    /// 参考答案数量超过上限
    #[error("参考答案数量 {count} 超过上限 {max}")]
    TooManyAnswerKeys { count: usize, max: usize },

    /// 总分不是有限正数
    ///
    /// 超过两位小数的总分可以通过校验，但得分按两位小数取整，可能比总分多出不到 0.005
    #[error("总分必须为正数，实际为 {value}")]
    NonPositiveTotalMarks { value: f64 },
}

impl GradingError {
    /// 创建模型不可用错误
    pub fn model_unavailable(capability: Capability, source: impl Into<anyhow::Error>) -> Self {
        let source: anyhow::Error = source.into();
        GradingError::ModelUnavailable {
            capability,
            source: source.into(),
        }
    }

    /// 是否为输入校验错误
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, GradingError::InvalidInput(_))
    }
}

/// 评分流程结果类型
pub type Result<T> = std::result::Result<T, GradingError>;
