//! 单题处理流程 - 流程层
//!
//! 核心职责：定义"一道题"的完整处理流程
//!
//! 流程顺序：
//! 1. 渲染页面 → LLM 分析题目
//! 2. 需要时下载并提取文件，否则直接使用页面内容
//! 3. LLM 计算答案 → 确定提交地址
//!
//! 提交和重试由链控制器决定，这里不处理

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tracing::{debug, info};
use url::Url;

use crate::clients::{resolve_submit_url, CompletionClient};
use crate::error::{ApiError, AppError, AppResult};
use crate::infrastructure::PageFetcher;
use crate::models::{DataPayload, PageContent, QuestionAnalysis};
use crate::services::{AnswerComputer, ContentExtractor, QuestionAnalyzer};
use crate::workflow::ChainState;

/// 一道题的求解结果，等待提交
#[derive(Debug, Clone, PartialEq)]
pub struct SolvedQuiz {
    pub analysis: QuestionAnalysis,
    pub answer: JsonValue,
    pub submit_url: String,
}

/// 阶段回调，调用方借此跟踪求解进度
pub type Progress<'a> = &'a mut (dyn FnMut(ChainState) + Send);

/// 单题求解能力
#[async_trait]
pub trait QuizSolver: Send + Sync {
    /// 求解一道题，进入分析、计算阶段时通过 `progress` 通知调用方
    async fn solve(&self, url: &str, progress: Progress<'_>) -> AppResult<SolvedQuiz>;
}

/// 单题处理流程
///
/// - 编排抓取、分析、提取、计算四个能力
/// - 不持有浏览器，只依赖 `PageFetcher` 能力
pub struct QuizFlow {
    fetcher: Arc<dyn PageFetcher>,
    analyzer: QuestionAnalyzer,
    extractor: ContentExtractor,
    computer: AnswerComputer,
}

impl QuizFlow {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        llm: Arc<dyn CompletionClient>,
        data_char_budget: usize,
    ) -> Self {
        Self {
            fetcher,
            analyzer: QuestionAnalyzer::new(llm.clone()),
            extractor: ContentExtractor::new(),
            computer: AnswerComputer::new(llm, data_char_budget),
        }
    }

    async fn load_payload(
        &self,
        quiz_url: &str,
        analysis: &QuestionAnalysis,
        page: PageContent,
    ) -> AppResult<DataPayload> {
        let Some(target) = analysis.download_target() else {
            debug!("无需下载，使用页面内容作为数据");
            return Ok(DataPayload::Page {
                text: page.text,
                result_text: page.result_text,
                links: page.links,
            });
        };

        let download_url = resolve_link(quiz_url, target)?;
        let path = self.fetcher.download(&download_url).await?;
        self.extractor.extract(&path, analysis.file_type).await
    }
}

#[async_trait]
impl QuizSolver for QuizFlow {
    async fn solve(&self, url: &str, progress: Progress<'_>) -> AppResult<SolvedQuiz> {
        debug!("渲染页面: {}", url);
        let page = self.fetcher.fetch(url).await?;

        progress(ChainState::Analyzing);
        let analysis = self.analyzer.analyze(&page).await?;

        progress(ChainState::Computing);
        let payload = self.load_payload(url, &analysis, page).await?;
        let answer = self.computer.compute(&analysis, &payload).await?;

        let submit_url = resolve_submit_url(analysis.submit_url.as_deref(), url)?;
        info!("✓ 题目已求解，提交地址: {}", submit_url);

        Ok(SolvedQuiz {
            analysis,
            answer,
            submit_url,
        })
    }
}

/// 把页面上的链接（可能是相对地址）解析为绝对地址
fn resolve_link(base: &str, link: &str) -> AppResult<String> {
    let invalid = || {
        AppError::Api(ApiError::InvalidUrl {
            url: link.to_string(),
        })
    };
    Url::parse(base)
        .and_then(|base| base.join(link))
        .map(|resolved| resolved.to_string())
        .map_err(|_| invalid())
}
