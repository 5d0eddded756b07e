//! 内容提取服务 - 业务能力层
//!
//! 只负责把下载下来的文件变成 `DataPayload`

use std::path::Path;

use base64::{engine::general_purpose, Engine as _};
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use crate::error::{AppError, AppResult, BoxError, FileError};
use crate::models::{DataPayload, FileType, Label};

/// 内容提取服务
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentExtractor;

impl ContentExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 按声明的文件类型读取文件
    ///
    /// 声明为 `other` 时按扩展名推断类型
    pub async fn extract(&self, path: &Path, declared: FileType) -> AppResult<DataPayload> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

        let file_type = match declared {
            FileType::Other => infer_file_type(path),
            other => other,
        };
        debug!("提取文件 {} (类型: {})", path.display(), file_type.label());

        let payload = extract_bytes(&bytes, file_type, path)?;
        info!("✓ 已提取 {} 文件: {}", file_type.label(), path.display());
        Ok(payload)
    }
}

fn extract_bytes(bytes: &[u8], file_type: FileType, path: &Path) -> AppResult<DataPayload> {
    let parse_failed = |source: BoxError| {
        AppError::File(FileError::ParseFailed {
            path: path.display().to_string(),
            file_type: file_type.label().to_string(),
            source,
        })
    };

    match file_type {
        FileType::Csv => read_csv(bytes).map_err(|e| parse_failed(Box::new(e))),
        FileType::Json => serde_json::from_slice::<JsonValue>(bytes)
            .map(DataPayload::Structured)
            .map_err(|e| parse_failed(Box::new(e))),
        FileType::Image => Ok(DataPayload::Image {
            data_uri: to_data_uri(bytes, path),
        }),
        FileType::Txt | FileType::Html | FileType::Other => {
            Ok(DataPayload::Text(String::from_utf8_lossy(bytes).into_owned()))
        }
        FileType::Pdf | FileType::Xlsx | FileType::Xls => Ok(DataPayload::Opaque {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            file_type,
            size_bytes: bytes.len() as u64,
        }),
    }
}

/// 读取 CSV：首行为列名，去除单元格首尾空白，丢弃空行
fn read_csv(bytes: &[u8]) -> Result<DataPayload, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(DataPayload::Table { columns, rows })
}

fn infer_file_type(path: &Path) -> FileType {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(FileType::from_label)
        .unwrap_or(FileType::Other)
}

/// 编码为 `data:<mime>;base64,...`
fn to_data_uri(bytes: &[u8], path: &Path) -> String {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let mime = match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/png",
    };
    format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(bytes))
}
