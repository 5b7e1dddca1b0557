//! 单份答卷处理器 - 编排层
//!
//! 评分一份答卷，并把结果写到答卷旁边的 `.result.json` 文件

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info};

use crate::models::{GradingResult, Submission};
use crate::utils::logging::append_log_line;
use crate::workflow::Grader;

/// 评分一份答卷
///
/// # 参数
/// - `grader`: 评分流程
/// - `submission`: 答卷数据
/// - `index`: 答卷序号（仅用于日志）
pub async fn process_submission(
    grader: &Grader<'_>,
    submission: &Submission,
    index: usize,
) -> Result<GradingResult> {
    info!("[答卷 {}] 📝 开始评分: {}", index, submission.display_name());

    let result = grader
        .evaluate(
            &submission.tokens,
            &submission.answer_keys,
            submission.total_marks,
        )
        .await
        .with_context(|| format!("评分失败: {}", submission.display_name()))?;

    info!(
        "[答卷 {}] ✓ 相似度 {}%，得分 {}/{}",
        index, result.similarity_percentage, result.marks_scored, submission.total_marks
    );

    Ok(result)
}

/// 结果文件路径：`answer.toml` → `answer.result.json`
pub fn result_path(submission_path: &Path) -> PathBuf {
    submission_path.with_extension("result.json")
}

/// 评分并写出结果文件，同时追加一行摘要到日志文件
///
/// # 返回
/// 返回是否成功
pub async fn grade_and_record(
    grader: &Grader<'_>,
    submission: &Submission,
    index: usize,
    log_file_path: &str,
) -> bool {
    let name = submission.display_name();

    let outcome = match process_submission(grader, submission, index).await {
        Ok(result) => write_result(submission, &result).await.map(|_| result),
        Err(e) => Err(e),
    };

    let line = match &outcome {
        Ok(result) => format!(
            "[成功] {} | 相似度 {}% | 得分 {}/{}",
            name, result.similarity_percentage, result.marks_scored, submission.total_marks
        ),
        Err(e) => {
            error!("[答卷 {}] ❌ {:#}", index, e);
            format!("[失败] {} | {:#}", name, e)
        }
    };

    if let Err(e) = append_log_line(log_file_path, &line) {
        error!("写入日志文件失败 {}: {}", log_file_path, e);
    }

    outcome.is_ok()
}

async fn write_result(submission: &Submission, result: &GradingResult) -> Result<()> {
    let Some(path) = submission.file_path.as_deref() else {
        return Ok(());
    };

    let out = result_path(Path::new(path));
    let json = serde_json::to_string_pretty(result)?;
    fs::write(&out, json)
        .await
        .with_context(|| format!("无法写入结果文件: {}", out.display()))?;
    info!("💾 结果已保存: {}", out.display());
    Ok(())
}
