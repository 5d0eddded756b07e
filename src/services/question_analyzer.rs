//! 题目分析服务 - 业务能力层
//!
//! 只负责"读懂题目"能力：把渲染后的页面交给 LLM，得到结构化的分析结果。
//! 解析失败时返回降级分析，从不因为模型输出格式问题而报错。

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, info, warn};

use crate::clients::{CompletionClient, CompletionRequest};
use crate::error::AppResult;
use crate::models::{Label, PageContent, QuestionAnalysis};
use crate::utils::truncate_text;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"{}|\\^`\[\]]+"#).expect("URL 正则表达式无效")
});

const SYSTEM_MESSAGE: &str = "You analyse data-science quiz pages. \
    You answer with a single JSON object and nothing else: no markdown, no code fences, no commentary.";

/// 题目分析服务
pub struct QuestionAnalyzer {
    llm: Arc<dyn CompletionClient>,
}

impl QuestionAnalyzer {
    pub fn new(llm: Arc<dyn CompletionClient>) -> Self {
        Self { llm }
    }

    /// 分析题目页面
    ///
    /// LLM 调用本身失败会返回错误；返回内容无法解析时降级，不返回错误
    pub async fn analyze(&self, page: &PageContent) -> AppResult<QuestionAnalysis> {
        let request = build_analysis_request(page);
        let response = self.llm.complete(request).await?;
        debug!("分析响应: {}", truncate_text(&response, 300));

        let analysis = parse_analysis(&response, &page.text);
        info!(
            "🧠 题目分析: {} | 类型: {} | 答案形态: {} | 需要下载: {}",
            truncate_text(&analysis.question_summary, 80),
            analysis.task_type.label(),
            analysis.answer_type.label(),
            analysis.download_required
        );
        Ok(analysis)
    }
}

fn build_analysis_request(page: &PageContent) -> CompletionRequest {
    let links_json = serde_json::to_string_pretty(&page.links).unwrap_or_else(|_| "[]".to_string());

    let user_message = format!(
        r#"Analyze this quiz question and determine how to solve it.

QUIZ PAGE CONTENT:
{}

RESULT ELEMENT TEXT:
{}

AVAILABLE LINKS:
{}

Your task is to:
1. Identify what the question is asking
2. Determine what data needs to be retrieved (if any files need to be downloaded)
3. Identify required processing steps (data cleaning, analysis, calculations)
4. Determine the expected answer format (number, string, boolean, JSON object, base64 image URI)
5. Extract the submit URL from the question

Respond with exactly one JSON object of this shape:
{{
    "question_summary": "Brief description of what is being asked",
    "task_type": "data_retrieval|data_analysis|visualization|text_processing|calculation",
    "download_required": true,
    "download_url": "URL to download if needed, otherwise null",
    "file_type": "pdf|csv|json|xlsx|image|txt|html|other",
    "operations": ["sum", "mean", "filter", "sort", "aggregate"],
    "target_column": "column name if analyzing tabular data, otherwise null",
    "target_page": null,
    "answer_type": "number|string|boolean|object|base64_image",
    "submit_url": "the submit URL stated in the question",
    "solution_strategy": "step by step approach to solve this"
}}"#,
        page.text, page.result_text, links_json
    );

    CompletionRequest::new(user_message).with_system(SYSTEM_MESSAGE)
}

/// 严格解析 LLM 输出；失败时返回降级分析
///
/// 解析成功但缺少提交地址时，从页面文本中补齐
pub fn parse_analysis(response: &str, page_text: &str) -> QuestionAnalysis {
    match serde_json::from_str::<QuestionAnalysis>(response.trim()) {
        Ok(mut analysis) => {
            let has_submit = analysis
                .submit_url
                .as_deref()
                .is_some_and(|url| !url.trim().is_empty());
            if !has_submit {
                analysis.submit_url = extract_submit_url(page_text);
            }
            analysis
        }
        Err(e) => {
            warn!("⚠️ 分析结果无法解析 ({})，使用降级分析", e);
            QuestionAnalysis::degraded(extract_submit_url(page_text))
        }
    }
}

/// 取文本中第一个包含 "submit" 的 URL
pub fn extract_submit_url(text: &str) -> Option<String> {
    URL_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?', ')']))
        .find(|url| url.to_ascii_lowercase().contains("submit"))
        .map(str::to_string)
}
