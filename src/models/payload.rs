//! 提供给答案计算的数据

use serde_json::Value as JsonValue;

use crate::models::quiz::{FileType, Label, PageLink};

/// 题目数据：页面本身或下载文件的结构化表示
#[derive(Debug, Clone, PartialEq)]
pub enum DataPayload {
    /// 无需下载时直接使用题目页面
    Page {
        text: String,
        result_text: String,
        links: Vec<PageLink>,
    },
    /// 表格数据（首行为列名）
    Table {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// JSON 等键值数据
    Structured(JsonValue),
    /// 纯文本
    Text(String),
    /// 图片，已编码为 data URI
    Image { data_uri: String },
    /// 不解析的文件，只描述元信息
    Opaque {
        file_name: String,
        file_type: FileType,
        size_bytes: u64,
    },
}

impl DataPayload {
    /// 渲染成提示词中的文本
    pub fn render_for_prompt(&self) -> String {
        match self {
            DataPayload::Page {
                text,
                result_text,
                links,
            } => {
                let mut out = format!("PAGE TEXT:\n{}\n", text);
                if !result_text.is_empty() {
                    out.push_str(&format!("\nRESULT ELEMENT:\n{}\n", result_text));
                }
                if !links.is_empty() {
                    out.push_str("\nLINKS:\n");
                    for link in links {
                        out.push_str(&format!("- {} ({})\n", link.url, link.text));
                    }
                }
                out
            }
            DataPayload::Table { columns, rows } => {
                let mut out = format!("Table with {} rows:\n", rows.len());
                // 汇总放在行数据之前，截断时也能保留
                let summaries: Vec<String> = columns
                    .iter()
                    .enumerate()
                    .filter_map(|(index, name)| numeric_summary(name, index, rows))
                    .collect();
                if !summaries.is_empty() {
                    out.push_str("Numeric column summary:\n");
                    for summary in summaries {
                        out.push_str(&summary);
                        out.push('\n');
                    }
                    out.push('\n');
                }
                out.push_str(&columns.join(" | "));
                out.push('\n');
                for row in rows {
                    out.push_str(&row.join(" | "));
                    out.push('\n');
                }
                out
            }
            DataPayload::Structured(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            DataPayload::Text(text) => text.clone(),
            DataPayload::Image { data_uri } => {
                format!("Image ({} bytes as data URI)", data_uri.len())
            }
            DataPayload::Opaque {
                file_name,
                file_type,
                size_bytes,
            } => format!(
                "Binary {} file '{}' ({} bytes); contents not extracted",
                file_type.label(),
                file_name,
                size_bytes
            ),
        }
    }
}

/// 整列（忽略空单元格）都能解析为数字时给出 count/sum/mean/min/max
fn numeric_summary(name: &str, index: usize, rows: &[Vec<String>]) -> Option<String> {
    let mut values = Vec::new();
    for cell in rows.iter().filter_map(|row| row.get(index)) {
        let cell = cell.trim();
        if cell.is_empty() {
            continue;
        }
        values.push(cell.replace(',', "").parse::<f64>().ok()?);
    }
    if values.is_empty() {
        return None;
    }

    let count = values.len();
    let sum: f64 = values.iter().sum();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some(format!(
        "- {}: count={}, sum={}, mean={}, min={}, max={}",
        name,
        count,
        sum,
        sum / count as f64,
        min,
        max
    ))
}
