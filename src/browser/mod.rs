pub mod connection;
pub mod headless;

use chromiumoxide::Browser;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::AppResult;

pub use connection::connect_to_browser;
pub use headless::{close_browser, launch_headless_browser};

/// 按配置连接已有浏览器或启动新浏览器
pub async fn start_browser(config: &Config) -> AppResult<(Browser, JoinHandle<()>)> {
    match config.browser_debug_port {
        Some(port) => connect_to_browser(port).await,
        None => launch_headless_browser(config).await,
    }
}
