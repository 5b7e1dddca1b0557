//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责加载答卷、调度评分和统计结果，不做具体评分判断。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量答卷处理器
//! - 管理应用生命周期（初始化、运行）
//! - 唯一持有 `ModelRegistry` 的模块
//! - 逐份评分答卷目录，输出全局统计
//!
//! ### `submission_processor` - 单份答卷处理器
//! - 调用 `Grader` 评分一份答卷
//! - 写出结果文件和日志摘要
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<Submission>)
//!     ↓
//! submission_processor (处理单个 Submission)
//!     ↓
//! workflow::Grader (清洗 → 纠错 → 评分)
//!     ↓
//! services (能力层：normalize / correct / score / diff)
//!     ↓
//! infrastructure (基础设施：ModelRegistry)
//! ```

pub mod batch_processor;
pub mod submission_processor;

pub use batch_processor::{App, BatchStats};
pub use submission_processor::{grade_and_record, process_submission};
