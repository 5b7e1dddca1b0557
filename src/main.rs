use anyhow::Result;
use std::path::PathBuf;

use answer_grader::utils::logging;
use answer_grader::{App, Config};

/// 用法：
/// - `answer_grader <submission.toml>` 评分单份答卷，结果 JSON 输出到 stdout
/// - `answer_grader` 批量评分 `submissions_folder` 下的所有答卷
#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    let target = std::env::args().nth(1).map(PathBuf::from);

    // 初始化并运行应用
    let app = App::initialize(config)?;
    match target {
        Some(path) => app.grade_file(&path).await?,
        None => {
            app.run().await?;
        }
    }

    Ok(())
}
