use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use tracing::warn;
use validator::Validate;

/// 入站答题请求
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuizRequest {
    #[validate(email)]
    pub email: String,
    pub secret: String,
    #[validate(url)]
    pub url: String,
}

/// 页面上的一个外链
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLink {
    pub url: String,
    #[serde(default)]
    pub text: String,
}

/// 浏览器渲染后的题目页面
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageContent {
    pub url: String,
    #[serde(default)]
    pub html: String,
    /// body 的可见文本
    pub text: String,
    /// `#result` 元素的文本，不存在时为空
    #[serde(default)]
    pub result_text: String,
    #[serde(default)]
    pub links: Vec<PageLink>,
    #[serde(skip)]
    pub screenshot: Option<PathBuf>,
}

/// 可由字符串标签解析的枚举
pub trait Label: Sized + Default {
    fn from_label(label: &str) -> Option<Self>;
    fn label(&self) -> &'static str;
}

/// 题目类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    DataRetrieval,
    DataAnalysis,
    Visualization,
    TextProcessing,
    Calculation,
    #[default]
    Unknown,
}

impl Label for TaskType {
    fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "data_retrieval" => Some(Self::DataRetrieval),
            "data_analysis" => Some(Self::DataAnalysis),
            "visualization" => Some(Self::Visualization),
            "text_processing" => Some(Self::TextProcessing),
            "calculation" => Some(Self::Calculation),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::DataRetrieval => "data_retrieval",
            Self::DataAnalysis => "data_analysis",
            Self::Visualization => "visualization",
            Self::TextProcessing => "text_processing",
            Self::Calculation => "calculation",
            Self::Unknown => "unknown",
        }
    }
}

/// 待下载文件的类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Pdf,
    Csv,
    Json,
    Xlsx,
    Xls,
    Image,
    Txt,
    Html,
    #[default]
    Other,
}

impl Label for FileType {
    fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().trim_start_matches('.') {
            "pdf" => Some(Self::Pdf),
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "xlsx" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            "image" | "png" | "jpg" | "jpeg" | "gif" | "webp" => Some(Self::Image),
            "txt" | "text" => Some(Self::Txt),
            "html" | "htm" => Some(Self::Html),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Xlsx => "xlsx",
            Self::Xls => "xls",
            Self::Image => "image",
            Self::Txt => "txt",
            Self::Html => "html",
            Self::Other => "other",
        }
    }
}

/// 答案的取值形态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerType {
    Number,
    #[default]
    String,
    Boolean,
    Object,
    Base64Image,
}

impl Label for AnswerType {
    fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "number" | "integer" | "float" => Some(Self::Number),
            "string" | "text" => Some(Self::String),
            "boolean" | "bool" => Some(Self::Boolean),
            "object" | "json" => Some(Self::Object),
            "base64_image" | "image" => Some(Self::Base64Image),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Base64Image => "base64_image",
        }
    }
}

/// LLM 对题目的结构化分析
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionAnalysis {
    #[serde(default, deserialize_with = "null_as_default")]
    pub question_summary: String,
    #[serde(default, deserialize_with = "lenient_label")]
    pub task_type: TaskType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub download_required: bool,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_label")]
    pub file_type: FileType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub operations: Vec<String>,
    #[serde(default)]
    pub target_column: Option<String>,
    #[serde(default, deserialize_with = "lenient_page")]
    pub target_page: Option<u32>,
    /// 缺省时为 `string`
    #[serde(default, deserialize_with = "lenient_label")]
    pub answer_type: AnswerType,
    #[serde(default)]
    pub submit_url: Option<String>,
    #[serde(default)]
    pub solution_strategy: Option<String>,
}

impl QuestionAnalysis {
    /// 解析失败时使用的降级分析
    pub fn degraded(submit_url: Option<String>) -> Self {
        Self {
            question_summary: "Could not parse question".to_string(),
            task_type: TaskType::Unknown,
            answer_type: AnswerType::String,
            submit_url,
            ..Self::default()
        }
    }

    /// 需要下载时返回下载地址
    pub fn download_target(&self) -> Option<&str> {
        if !self.download_required {
            return None;
        }
        self.download_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

// 未知或缺失的标签回落到默认值，不让单个字段拖垮整个分析
fn lenient_label<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Label,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    let Some(raw) = value.as_ref().and_then(JsonValue::as_str) else {
        return Ok(T::default());
    };
    match T::from_label(raw.trim()) {
        Some(parsed) => Ok(parsed),
        None => {
            let fallback = T::default();
            warn!("无法识别的取值 '{}'，使用默认值 {}", raw, fallback.label());
            Ok(fallback)
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_page<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(match value {
        Some(JsonValue::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(JsonValue::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// 提交答案的请求体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub email: String,
    pub secret: String,
    pub url: String,
    pub answer: JsonValue,
}

/// 提交结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResult {
    #[serde(default)]
    pub correct: bool,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl SubmissionResult {
    /// 服务器给出的下一题地址（空字符串视为没有）
    pub fn next_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_answer_type_defaults_to_string() {
        let analysis: QuestionAnalysis =
            serde_json::from_value(json!({ "question_summary": "sum the column" })).unwrap();
        assert_eq!(analysis.answer_type, AnswerType::String);
        assert_eq!(analysis.task_type, TaskType::Unknown);
    }

    #[test]
    fn test_unknown_labels_fall_back() {
        let analysis: QuestionAnalysis = serde_json::from_value(json!({
            "answer_type": "matrix",
            "file_type": "parquet",
            "task_type": "guessing",
        }))
        .unwrap();
        assert_eq!(analysis.answer_type, AnswerType::String);
        assert_eq!(analysis.file_type, FileType::Other);
        assert_eq!(analysis.task_type, TaskType::Unknown);
    }

    #[test]
    fn test_null_fields_keep_the_rest_of_the_analysis() {
        let analysis: QuestionAnalysis = serde_json::from_value(json!({
            "question_summary": null,
            "download_required": null,
            "operations": null,
            "target_column": null,
            "answer_type": "number"
        }))
        .unwrap();
        assert_eq!(analysis.answer_type, AnswerType::Number);
        assert_eq!(analysis.question_summary, "");
        assert!(!analysis.download_required);
        assert!(analysis.operations.is_empty());
    }

    #[test]
    fn test_full_analysis_decodes() {
        let analysis: QuestionAnalysis = serde_json::from_value(json!({
            "question_summary": "Sum of the value column",
            "task_type": "data_analysis",
            "download_required": true,
            "download_url": "https://host/data.csv",
            "file_type": "CSV",
            "operations": ["sum"],
            "target_column": "value",
            "target_page": "2",
            "answer_type": "number",
            "submit_url": "https://host/submit",
            "solution_strategy": "download and sum"
        }))
        .unwrap();
        assert_eq!(analysis.file_type, FileType::Csv);
        assert_eq!(analysis.answer_type, AnswerType::Number);
        assert_eq!(analysis.target_page, Some(2));
        assert_eq!(analysis.download_target(), Some("https://host/data.csv"));
    }

    #[test]
    fn test_download_target_requires_flag() {
        let analysis = QuestionAnalysis {
            download_required: false,
            download_url: Some("https://host/data.csv".to_string()),
            ..QuestionAnalysis::default()
        };
        assert_eq!(analysis.download_target(), None);
    }

    #[test]
    fn test_submission_result_next_url() {
        let result: SubmissionResult =
            serde_json::from_value(json!({ "correct": true, "url": "" })).unwrap();
        assert_eq!(result.next_url(), None);

        let result: SubmissionResult = serde_json::from_value(json!({ "url": "https://host/q2" })).unwrap();
        assert!(!result.correct);
        assert_eq!(result.next_url(), Some("https://host/q2"));
    }
}
