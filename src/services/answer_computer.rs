//! 答案计算服务 - 业务能力层
//!
//! 把分析结果和数据交给 LLM 求出原始答案，再按声明的答案形态做类型转换

use std::sync::Arc;

use serde_json::{Number, Value as JsonValue};
use tracing::{debug, info, warn};

use crate::clients::{CompletionClient, CompletionRequest};
use crate::error::AppResult;
use crate::models::{AnswerType, DataPayload, Label, QuestionAnalysis};
use crate::utils::{clip_chars, truncate_text};

const SYSTEM_MESSAGE: &str =
    "You compute exact answers to data questions. Reply with the bare answer value only.";

/// 答案计算服务
pub struct AnswerComputer {
    llm: Arc<dyn CompletionClient>,
    data_char_budget: usize,
}

impl AnswerComputer {
    pub fn new(llm: Arc<dyn CompletionClient>, data_char_budget: usize) -> Self {
        Self {
            llm,
            data_char_budget,
        }
    }

    /// 计算答案
    pub async fn compute(
        &self,
        analysis: &QuestionAnalysis,
        payload: &DataPayload,
    ) -> AppResult<JsonValue> {
        // 图片题直接提交图片本身
        if analysis.answer_type == AnswerType::Base64Image {
            if let DataPayload::Image { data_uri } = payload {
                info!("🖼️ 图片答案，直接使用下载的图片");
                return Ok(JsonValue::String(data_uri.clone()));
            }
        }

        let rendered = payload.render_for_prompt();
        let data = clip_chars(&rendered, self.data_char_budget);
        if data.len() < rendered.len() {
            debug!(
                "数据已截断: {} -> {} 字符",
                rendered.chars().count(),
                self.data_char_budget
            );
        }

        let request = build_compute_request(analysis, data);
        let raw = self.llm.complete(request).await?;
        debug!("原始答案: {}", truncate_text(&raw, 200));

        let answer = coerce_answer(parse_raw_answer(&raw), analysis.answer_type);
        info!("🧮 计算得到答案: {}", truncate_text(&answer.to_string(), 120));
        Ok(answer)
    }
}

fn build_compute_request(analysis: &QuestionAnalysis, data: &str) -> CompletionRequest {
    let operations = if analysis.operations.is_empty() {
        "N/A".to_string()
    } else {
        analysis.operations.join(", ")
    };

    let user_message = format!(
        r#"Based on this question analysis and data, compute the exact answer.

QUESTION: {}

OPERATIONS NEEDED: {}

DATA:
{}

ANSWER TYPE: {}

TARGET COLUMN: {}

TARGET PAGE: {}

Provide ONLY the final answer value. No explanation, no formatting, just the raw answer.
If it's a number, provide just the number.
If it's a string, provide just the string.
If it's a boolean, provide true or false.
If it's a JSON object, provide the valid JSON."#,
        analysis.question_summary,
        operations,
        data,
        analysis.answer_type.label(),
        analysis.target_column.as_deref().unwrap_or("N/A"),
        analysis
            .target_page
            .map(|page| page.to_string())
            .unwrap_or_else(|| "N/A".to_string()),
    );

    CompletionRequest::new(user_message).with_system(SYSTEM_MESSAGE)
}

/// 原始输出能按 JSON 解析就用 JSON，否则当作字符串
pub fn parse_raw_answer(raw: &str) -> JsonValue {
    let trimmed = raw.trim();
    serde_json::from_str(trimmed).unwrap_or_else(|_| JsonValue::String(trimmed.to_string()))
}

/// 按答案形态转换；转换失败时原样返回
pub fn coerce_answer(raw: JsonValue, answer_type: AnswerType) -> JsonValue {
    let JsonValue::String(text) = &raw else {
        return raw;
    };

    let coerced = match answer_type {
        AnswerType::Number => coerce_number(text),
        AnswerType::Boolean => Some(JsonValue::Bool(matches!(
            text.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "1"
        ))),
        AnswerType::Object => serde_json::from_str(text).ok(),
        AnswerType::String | AnswerType::Base64Image => return raw,
    };

    match coerced {
        Some(value) => value,
        None => {
            warn!(
                "⚠️ 答案 '{}' 无法转换为 {}，原样提交",
                truncate_text(text, 80),
                answer_type.label()
            );
            raw.clone()
        }
    }
}

fn coerce_number(text: &str) -> Option<JsonValue> {
    let cleaned = text.trim().replace(',', "");
    if let Ok(int) = cleaned.parse::<i64>() {
        return Some(JsonValue::Number(int.into()));
    }
    cleaned
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(JsonValue::Number)
}
