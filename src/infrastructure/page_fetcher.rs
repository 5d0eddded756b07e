//! 页面抓取 - 基础设施层
//!
//! 唯一持有浏览器的地方，只暴露"渲染页面"和"下载文件"的能力

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, Page};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::RwLock;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult, BrowserError};
use crate::models::{PageContent, PageLink};

/// 等待前端脚本渲染的时间
const RENDER_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// 提取正文、`#result` 和外链
const EXTRACT_SCRIPT: &str = r##"
(() => {
    const body = document.body ? document.body.innerText : "";
    const result = document.querySelector("#result");
    const links = Array.from(document.querySelectorAll('a[href*="http"]'))
        .map(a => ({ url: a.getAttribute("href") || "", text: (a.innerText || "").trim() }))
        .filter(link => link.url.length > 0);
    return { text: body, result_text: result ? result.innerText : "", links };
})()
"##;

/// 页面抓取能力
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// 渲染页面并提取文本、结果片段和外链
    async fn fetch(&self, url: &str) -> AppResult<PageContent>;

    /// 下载文件到本地，返回文件路径
    async fn download(&self, url: &str) -> AppResult<PathBuf>;
}

#[derive(Debug, Deserialize)]
struct PageSnapshot {
    text: String,
    result_text: String,
    links: Vec<PageLink>,
}

/// 基于 chromiumoxide 的页面抓取器
///
/// 所有抓取共享同一个浏览器，每次抓取打开独立的新页面，结束后关闭
pub struct BrowserFetcher {
    browser: RwLock<Browser>,
    http: reqwest::Client,
    navigation_timeout: Duration,
    downloads_dir: PathBuf,
    screenshot_dir: Option<PathBuf>,
}

impl BrowserFetcher {
    /// 创建新的页面抓取器
    pub fn new(browser: Browser, config: &Config) -> Self {
        Self {
            browser: RwLock::new(browser),
            http: reqwest::Client::new(),
            navigation_timeout: config.browser_timeout(),
            downloads_dir: config.downloads_dir.clone(),
            screenshot_dir: config.screenshot_dir.clone(),
        }
    }

    /// 关闭浏览器
    pub async fn shutdown(&self) {
        let mut browser = self.browser.write().await;
        if let Err(e) = crate::browser::close_browser(&mut browser).await {
            warn!("关闭浏览器时出错: {:#}", e);
        }
    }

    async fn open_page(&self) -> AppResult<Page> {
        let browser = self.browser.read().await;
        browser.new_page("about:blank").await.map_err(|e| {
            AppError::Browser(BrowserError::PageCreationFailed {
                source: Box::new(e),
            })
        })
    }

    async fn render(&self, page: &Page, url: &str) -> AppResult<PageContent> {
        match timeout(self.navigation_timeout, page.goto(url)).await {
            Err(_) => {
                return Err(AppError::Browser(BrowserError::NavigationTimeout {
                    url: url.to_string(),
                    timeout_ms: self.navigation_timeout.as_millis() as u64,
                }))
            }
            Ok(Err(e)) => return Err(AppError::navigation_failed(url, e)),
            Ok(Ok(_)) => {}
        }
        debug!("页面导航成功: {}", url);

        sleep(RENDER_SETTLE_DELAY).await;

        let snapshot: PageSnapshot = eval_as(page, EXTRACT_SCRIPT).await?;
        let html = page.content().await?;

        let screenshot = match &self.screenshot_dir {
            Some(dir) => save_screenshot(page, dir, url).await,
            None => None,
        };

        Ok(PageContent {
            url: url.to_string(),
            html,
            text: snapshot.text,
            result_text: snapshot.result_text,
            links: snapshot.links,
            screenshot,
        })
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> AppResult<PageContent> {
        info!("🌐 正在打开题目页面: {}", url);
        let page = self.open_page().await?;

        let result = self.render(&page, url).await;

        if let Err(e) = page.close().await {
            warn!("关闭页面失败: {}", e);
        }

        if let Ok(content) = &result {
            info!(
                "✓ 页面内容已提取: {} 字符, {} 个链接",
                content.text.chars().count(),
                content.links.len()
            );
        }
        result
    }

    async fn download(&self, url: &str) -> AppResult<PathBuf> {
        download_to_dir(&self.http, url, &self.downloads_dir).await
    }
}

/// 执行 JS 代码并反序列化为指定类型
async fn eval_as<T: DeserializeOwned>(page: &Page, js_code: &str) -> AppResult<T> {
    let result = page.evaluate(js_code).await?;
    result.into_value().map_err(|e| {
        AppError::Browser(BrowserError::ScriptExecutionFailed {
            source: Box::new(e),
        })
    })
}

async fn save_screenshot(page: &Page, dir: &Path, url: &str) -> Option<PathBuf> {
    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        warn!("无法创建截图目录 {}: {}", dir.display(), e);
        return None;
    }
    let path = dir.join(format!("quiz_{}.png", url_hash(url)));
    let params = ScreenshotParams::builder().full_page(true).build();
    match page.save_screenshot(params, &path).await {
        Ok(_) => {
            debug!("截图已保存: {}", path.display());
            Some(path)
        }
        Err(e) => {
            warn!("截图失败: {}", e);
            None
        }
    }
}

/// 通过 HTTP 下载文件到指定目录
pub async fn download_to_dir(
    http: &reqwest::Client,
    url: &str,
    downloads_dir: &Path,
) -> AppResult<PathBuf> {
    info!("📥 正在下载文件: {}", url);

    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::api_request_failed(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Api(ApiError::BadStatus {
            endpoint: url.to_string(),
            status: status.as_u16(),
        }));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AppError::api_request_failed(url, e))?;

    tokio::fs::create_dir_all(downloads_dir)
        .await
        .map_err(|e| AppError::file_write_failed(downloads_dir.display().to_string(), e))?;

    let path = downloads_dir.join(download_file_name(url));
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;

    info!("✓ 文件已下载: {} ({} 字节)", path.display(), bytes.len());
    Ok(path)
}

/// 根据 URL 推导本地文件名
pub fn download_file_name(url: &str) -> String {
    let last_segment = url::Url::parse(url).ok().and_then(|parsed| {
        parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last().map(str::to_string))
    });

    match last_segment {
        Some(segment) => segment
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect(),
        None => format!("download_{}", url_hash(url)),
    }
}

fn url_hash(url: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    hasher.finish()
}
