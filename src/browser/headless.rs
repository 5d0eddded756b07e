use anyhow::Context;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{AppError, AppResult, BrowserError};

/// 启动浏览器（默认无头模式）
///
/// 返回浏览器句柄以及处理 CDP 事件的后台任务
pub async fn launch_headless_browser(config: &Config) -> AppResult<(Browser, JoinHandle<()>)> {
    info!("🚀 启动浏览器 (无头模式: {})...", config.headless);

    let mut builder = BrowserConfig::builder()
        .no_sandbox()
        .window_size(1920, 1080)
        .request_timeout(config.browser_timeout())
        .args(vec![
            "--disable-gpu",
            "--disable-dev-shm-usage",
            "--disable-setuid-sandbox",
        ]);

    builder = if config.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };

    if let Some(executable) = &config.chrome_executable {
        debug!("使用自定义浏览器: {}", executable.display());
        builder = builder.chrome_executable(executable);
    }

    let browser_config = builder.build().map_err(|message| {
        error!("配置浏览器失败: {}", message);
        AppError::Browser(BrowserError::ConfigurationFailed { message })
    })?;

    let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        AppError::Browser(BrowserError::LaunchFailed {
            source: Box::new(e),
        })
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    let handler_task = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    info!("✅ 浏览器已就绪");
    Ok((browser, handler_task))
}

/// 关闭浏览器并等待进程退出
pub async fn close_browser(browser: &mut Browser) -> anyhow::Result<()> {
    browser.close().await.context("关闭浏览器失败")?;
    browser.wait().await.context("等待浏览器退出失败")?;
    info!("浏览器已关闭");
    Ok(())
}
