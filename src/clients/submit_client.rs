/// 答案提交客户端
///
/// 封装所有与出题方提交接口相关的调用逻辑
use async_trait::async_trait;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ApiError, AppError, AppResult};
use crate::models::{SubmissionPayload, SubmissionResult};

/// 答案提交能力
#[async_trait]
pub trait AnswerSubmitter: Send + Sync {
    async fn submit(
        &self,
        submit_url: &str,
        payload: &SubmissionPayload,
    ) -> AppResult<SubmissionResult>;
}

/// 基于 reqwest 的提交客户端
#[derive(Clone, Default)]
pub struct SubmitClient {
    http: reqwest::Client,
}

impl SubmitClient {
    /// 创建新的提交客户端
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AnswerSubmitter for SubmitClient {
    async fn submit(
        &self,
        submit_url: &str,
        payload: &SubmissionPayload,
    ) -> AppResult<SubmissionResult> {
        info!("📤 正在提交答案到 {}", submit_url);
        debug!("提交内容: url={}, answer={}", payload.url, payload.answer);

        let response = self
            .http
            .post(submit_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(submit_url, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::api_request_failed(submit_url, e))?;

        let result: SubmissionResult = serde_json::from_str(&body).map_err(|e| {
            warn!("提交响应无法解析 ({}): {}", status, crate::utils::truncate_text(&body, 200));
            AppError::Api(ApiError::InvalidResponse {
                endpoint: submit_url.to_string(),
                source: Box::new(e),
            })
        })?;

        if !status.is_success() {
            warn!("提交接口返回状态码 {}，仍按响应内容处理", status);
        }

        info!("提交结果 ({}): {:?}", status, result);
        Ok(result)
    }
}

/// 确定答案提交地址
///
/// 优先使用分析结果中的地址（相对地址按题目 URL 解析）；
/// 没有时把题目 URL 中的 `/quiz-` 替换为 `/submit`，再不行则使用站点根下的 `/submit`
pub fn resolve_submit_url(analysis_submit_url: Option<&str>, quiz_url: &str) -> AppResult<String> {
    let invalid = || {
        AppError::Api(ApiError::InvalidUrl {
            url: quiz_url.to_string(),
        })
    };

    if let Some(candidate) = analysis_submit_url.map(str::trim).filter(|s| !s.is_empty()) {
        if let Ok(absolute) = Url::parse(candidate) {
            return Ok(absolute.to_string());
        }
        let base = Url::parse(quiz_url).map_err(|_| invalid())?;
        return base
            .join(candidate)
            .map(|u| u.to_string())
            .map_err(|_| invalid());
    }

    if quiz_url.contains("/quiz-") {
        return Ok(quiz_url.replace("/quiz-", "/submit"));
    }

    let base = Url::parse(quiz_url).map_err(|_| invalid())?;
    base.join("/submit")
        .map(|u| u.to_string())
        .map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_analysis_url() {
        let url = resolve_submit_url(Some("https://host/submit-1"), "https://host/quiz-1").unwrap();
        assert_eq!(url, "https://host/submit-1");
    }

    #[test]
    fn test_resolve_relative_analysis_url() {
        let url = resolve_submit_url(Some("/submit"), "https://host/a/quiz-1").unwrap();
        assert_eq!(url, "https://host/submit");
    }

    #[test]
    fn test_resolve_derives_from_quiz_url() {
        let url = resolve_submit_url(None, "https://host/quiz-834").unwrap();
        assert_eq!(url, "https://host/submit834");

        let url = resolve_submit_url(Some("   "), "https://host/demo").unwrap();
        assert_eq!(url, "https://host/submit");
    }

    #[test]
    fn test_resolve_rejects_garbage() {
        assert!(resolve_submit_url(None, "not a url").is_err());
    }
}
