//! 批量答卷处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责模型资源和批量评分。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：输出启动信息、构造模型注册表（只构造一次）
//! 2. **单份评分**：评分指定答卷并输出 JSON
//! 3. **批量评分**：扫描答卷目录，逐份评分（不并发），失败不影响后续答卷
//! 4. **全局统计**：汇总成功和失败数量

use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

use crate::config::Config;
use crate::infrastructure::ModelRegistry;
use crate::models::{load_all_submissions, load_submission};
use crate::orchestrator::submission_processor::{grade_and_record, process_submission};
use crate::utils::logging::{init_log_file, log_startup, print_final_stats};
use crate::workflow::Grader;

/// 应用主结构
pub struct App {
    config: Config,
    models: ModelRegistry,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);
        let models = ModelRegistry::from_config(&config)?;
        Ok(Self::with_models(config, models))
    }

    /// 使用已有的模型注册表
    pub fn with_models(config: Config, models: ModelRegistry) -> Self {
        Self { config, models }
    }

    /// 评分单份答卷，结果以 JSON 打印到标准输出
    pub async fn grade_file(&self, path: &Path) -> Result<()> {
        let grader = Grader::new(&self.config, &self.models)?;
        let submission = load_submission(path).await?;
        let result = process_submission(&grader, &submission, 1).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok(())
    }

    /// 批量评分答卷目录
    pub async fn run(&self) -> Result<BatchStats> {
        init_log_file(&self.config.output_log_file)?;

        info!("\n📁 正在扫描待评分的答卷: {}", self.config.submissions_folder);
        let submissions = load_all_submissions(&self.config.submissions_folder).await?;

        let mut stats = BatchStats {
            total: submissions.len(),
            ..Default::default()
        };

        if submissions.is_empty() {
            warn!("⚠️ 没有找到待评分的TOML文件，程序结束");
            return Ok(stats);
        }
        info!("✓ 找到 {} 份待评分的答卷", stats.total);

        let grader = Grader::new(&self.config, &self.models)?;
        for (idx, submission) in submissions.iter().enumerate() {
            if grade_and_record(&grader, submission, idx + 1, &self.config.output_log_file).await {
                stats.success += 1;
            } else {
                stats.failed += 1;
            }
        }

        print_final_stats(
            stats.success,
            stats.failed,
            stats.total,
            &self.config.output_log_file,
        );
        Ok(stats)
    }
}

/// 批量评分统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub success: usize,
    pub failed: usize,
    pub total: usize,
}
