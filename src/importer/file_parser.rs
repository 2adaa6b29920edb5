// ==========================================
// 车队碳排放报告系统 - 文件解析器实现
// ==========================================
// 阶段 0: 文件读取与解析
// 支持: CSV 文件路径 / 文本 / 字节（UTF-8，可带 BOM）
// 非 UTF-8 字节替换为 U+FFFD，不中断解析
// ==========================================

use crate::domain::trip::{RawRow, RawTable};
use crate::domain::types::FileKind;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::report_importer_trait::TableParser;
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::borrow::Cow;
use tracing::{debug, warn};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// ==========================================
// CsvSource - CSV 数据来源
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvSource {
    Path(PathBuf),
    Text(String),
    Bytes(Vec<u8>),
}

impl CsvSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        CsvSource::Path(path.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        CsvSource::Text(text.into())
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvParser;

impl TableParser for CsvParser {
    fn parse(&self, source: &CsvSource, kind: FileKind) -> ImportResult<RawTable> {
        match source {
            CsvSource::Path(path) => {
                let bytes = self.read_file(path)?;
                self.parse_bytes(&bytes, kind)
            }
            CsvSource::Text(text) => self.parse_bytes(text.as_bytes(), kind),
            CsvSource::Bytes(bytes) => self.parse_bytes(bytes, kind),
        }
    }
}

impl CsvParser {
    /// 读取文件（检查存在性与扩展名）
    fn read_file(&self, path: &Path) -> ImportResult<Vec<u8>> {
        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        if let Some(ext) = path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        Ok(std::fs::read(path)?)
    }

    /// 解析 CSV 字节
    ///
    /// # 规则
    /// - 去除 UTF-8 BOM
    /// - 非 UTF-8 字节按 U+FFFD 替换（整行保留）
    /// - 表头 TRIM
    /// - 允许行长度不一致
    /// - 跳过完全空白的行
    /// - 无表头或无数据行 → EmptyFile
    pub fn parse_bytes(&self, bytes: &[u8], kind: FileKind) -> ImportResult<RawTable> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(bytes);

        // 读取表头
        let headers: Vec<String> = reader
            .byte_headers()
            .map_err(|e| ImportError::csv(kind, e))?
            .iter()
            .map(|h| decode_field(h).trim().to_string())
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(ImportError::EmptyFile { file: kind });
        }

        // 读取所有行
        let mut rows = Vec::new();
        let mut lossy_rows = 0;
        for (row_idx, result) in reader.byte_records().enumerate() {
            let record = result.map_err(|e| ImportError::csv(kind, e))?;
            let mut values = HashMap::new();
            let mut lossy = false;

            for (col_idx, raw) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    let value = decode_field(raw);
                    lossy |= matches!(value, Cow::Owned(_));
                    // 表头重名时保留第一列
                    values
                        .entry(header.clone())
                        .or_insert_with(|| value.into_owned());
                }
            }

            if lossy {
                lossy_rows += 1;
                debug!(file = %kind, row_number = row_idx + 1, "行内含非 UTF-8 字节，已替换");
            }

            // 跳过完全空白的行
            if values.values().all(|v| v.trim().is_empty()) {
                continue;
            }

            rows.push(RawRow::new(row_idx + 1, values));
        }

        if rows.is_empty() {
            return Err(ImportError::EmptyFile { file: kind });
        }

        if lossy_rows > 0 {
            warn!(file = %kind, rows = lossy_rows, "非 UTF-8 字节已替换为 U+FFFD");
        }
        debug!(file = %kind, columns = headers.len(), rows = rows.len(), "CSV 解析完成");

        Ok(RawTable {
            kind,
            headers,
            rows,
        })
    }
}

// from_utf8_lossy 仅在发生替换时返回 Owned
fn decode_field(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}
