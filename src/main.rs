use anyhow::Result;
use quiz_chain_solver::utils::logging;
use quiz_chain_solver::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载并校验配置
    let config = Config::from_env()?;
    config.validate_required()?;

    // 初始化日志（guard 需要活到进程结束）
    let _log_guard = logging::init(&config.log_file);

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
