//! # Answer Grader
//!
//! 对手写答卷的 OCR 结果进行自动评分的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有模型资源，只暴露能力
//! - `ModelRegistry` - 唯一的模型 owner，提供拼写、语法、向量三种能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，每个服务只做一件事
//! - `TextNormalizer` - OCR 文本清洗（依赖 `WordSegmenter` 拆分粘连单词）
//! - `TextCorrector` - 拼写、语法纠错
//! - `SimilarityScorer` - 语义相似度和最佳匹配
//! - `SentenceDiffer` - 逐句对比反馈
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一份答卷"的完整评分流程
//! - `Grader` - 流程编排（校验 → 清洗 → 纠错 → 评分）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 应用入口，单份或批量评分
//! - `orchestrator/submission_processor` - 单份答卷处理器，写结果和日志
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{Capability, GradingError, InputError, Result};
pub use infrastructure::{Embedder, ModelRegistry, TextGenerator};
pub use models::{GradingResult, Submission};
pub use orchestrator::{App, BatchStats};
pub use workflow::Grader;
