//! 应用生命周期
//!
//! 启动浏览器、组装能力上下文、运行 HTTP 服务，退出时关闭浏览器

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::{create_router, AppState};
use crate::browser;
use crate::config::Config;
use crate::infrastructure::BrowserFetcher;
use crate::orchestrator::{ChainSupervisor, QuizContext};
use crate::utils::logging::log_startup;

/// 应用主结构
pub struct App {
    config: Arc<Config>,
    fetcher: Arc<BrowserFetcher>,
    browser_handler: JoinHandle<()>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        // 启动或连接浏览器
        let (browser, browser_handler) = browser::start_browser(&config).await?;
        let fetcher = Arc::new(BrowserFetcher::new(browser, &config));

        Ok(Self {
            config: Arc::new(config),
            fetcher,
            browser_handler,
        })
    }

    /// 运行 HTTP 服务直到收到 Ctrl-C
    pub async fn run(self) -> Result<()> {
        let ctx = QuizContext::production(self.config.clone(), self.fetcher.clone());
        let supervisor = Arc::new(ChainSupervisor::new(ctx));
        let state = Arc::new(AppState::new(self.config.clone(), supervisor.clone()));
        let router = create_router(state);

        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("无法监听 {}", addr))?;
        info!("✓ HTTP 服务已启动: http://{}", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP 服务异常退出")?;

        let remaining = supervisor.chains_in_flight();
        if remaining > 0 {
            warn!("⚠️ 仍有 {} 条答题链未完成，随进程退出", remaining);
        }

        self.fetcher.shutdown().await;
        self.browser_handler.abort();
        info!("👋 服务已停止");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("无法监听 Ctrl-C 信号: {}", e);
        std::future::pending::<()>().await;
    }
    info!("收到 Ctrl-C，正在关闭服务...");
}
