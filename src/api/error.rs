// ==========================================
// 车队碳排放报告系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换导入/流水线错误为用户友好的错误消息
// 用户可见文案: user_message(locale) 按语言翻译
// ==========================================

use crate::domain::types::{FileKind, LogicalField};
use crate::i18n;
use crate::importer::error::ImportError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入文件错误
    // ==========================================
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}")]
    UnsupportedFormat(String),

    #[error("缺少输入文件: {0}")]
    MissingInputFile(FileKind),

    #[error("{0} 文件为空或不是有效的 CSV")]
    EmptyFile(FileKind),

    #[error("CSV 读取失败: {detail}")]
    UnreadableCsv {
        file: Option<FileKind>,
        detail: String,
    },

    #[error("{file} 文件缺少必填列 {field}")]
    MissingRequiredColumn {
        file: FileKind,
        field: LogicalField,
        expected: Vec<String>,
        available: Vec<String>,
    },

    // ==========================================
    // 使用错误
    // ==========================================
    #[error("当前没有等待人工确认的车型分类")]
    NoPendingClassification,

    #[error("仍有车辆未确定车型: {}", .vehicle_ids.join(", "))]
    ClassificationIncomplete { vehicle_ids: Vec<String> },

    #[error("无效车型: vehicle={vehicle_id}, value={value}")]
    InvalidCategory { vehicle_id: String, value: String },

    #[error("尚未生成报告")]
    NoReport,

    #[error("无效配置: {key}={value}")]
    InvalidConfig { key: String, value: String },

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::FileNotFound(path) => ApiError::FileNotFound(path),
            ImportError::UnsupportedFormat(ext) => ApiError::UnsupportedFormat(ext),
            ImportError::FileReadError(detail) => ApiError::UnreadableCsv { file: None, detail },
            ImportError::MissingInputFile(kind) => ApiError::MissingInputFile(kind),
            ImportError::EmptyFile { file } => ApiError::EmptyFile(file),
            ImportError::CsvParseError { file, message } => ApiError::UnreadableCsv {
                file,
                detail: message,
            },
            ImportError::MissingRequiredColumn {
                file,
                field,
                candidates,
                available,
            } => ApiError::MissingRequiredColumn {
                file,
                field,
                expected: candidates,
                available,
            },
            ImportError::NoPendingClassification => ApiError::NoPendingClassification,
            ImportError::ClassificationIncomplete { missing } => {
                ApiError::ClassificationIncomplete {
                    vehicle_ids: missing,
                }
            }
            ImportError::InvalidCategory { vehicle_id, value } => {
                ApiError::InvalidCategory { vehicle_id, value }
            }
            ImportError::ConfigReadError { key, message } => ApiError::InvalidConfig {
                key,
                value: message,
            },
            ImportError::ConfigValueError { key, value, .. } => {
                ApiError::InvalidConfig { key, value }
            }
            ImportError::InternalError(msg) => ApiError::InternalError(msg),
            ImportError::Other(err) => ApiError::Other(err),
        }
    }
}

impl ApiError {
    /// 面向用户的错误文案
    pub fn user_message(&self, locale: &str) -> String {
        let tr = |key: &str, args: &[(&str, &str)]| i18n::t_with_args_in(locale, key, args);
        let file_name = |kind: FileKind| i18n::t_in(locale, &format!("file.{}", kind.key()));

        match self {
            ApiError::FileNotFound(path) => tr("import.file_not_found", &[("path", path.as_str())]),
            ApiError::UnsupportedFormat(ext) => {
                tr("import.unsupported_format", &[("ext", ext.as_str())])
            }
            ApiError::MissingInputFile(_) => tr("import.missing_file", &[]),
            ApiError::EmptyFile(kind) => {
                let file = file_name(*kind);
                tr("import.empty_file", &[("file", file.as_str())])
            }
            ApiError::UnreadableCsv { file, detail } => {
                let file = file.map(file_name).unwrap_or_default();
                tr(
                    "import.csv_parse",
                    &[("file", file.as_str()), ("detail", detail.as_str())],
                )
            }
            ApiError::MissingRequiredColumn {
                file,
                field,
                expected,
                available,
            } => {
                let file = file_name(*file);
                let field = i18n::t_in(locale, &format!("field.{}", field.key()));
                let available = available.join(", ");
                let expected = expected.join(", ");
                tr(
                    "import.missing_column",
                    &[
                        ("file", file.as_str()),
                        ("field", field.as_str()),
                        ("available", available.as_str()),
                        ("expected", expected.as_str()),
                    ],
                )
            }
            ApiError::NoPendingClassification => tr("api.no_pending_classification", &[]),
            ApiError::ClassificationIncomplete { vehicle_ids } => {
                let vehicles = vehicle_ids.join(", ");
                tr(
                    "api.classification_incomplete",
                    &[("vehicles", vehicles.as_str())],
                )
            }
            ApiError::InvalidCategory { vehicle_id, value } => tr(
                "api.invalid_category",
                &[("value", value.as_str()), ("vehicle", vehicle_id.as_str())],
            ),
            ApiError::NoReport => tr("api.no_report", &[]),
            ApiError::InvalidConfig { key, value } => tr(
                "api.invalid_config",
                &[("key", key.as_str()), ("value", value.as_str())],
            ),
            ApiError::InternalError(detail) => {
                tr("import.internal", &[("detail", detail.as_str())])
            }
            ApiError::Other(err) => {
                let detail = err.to_string();
                tr("import.internal", &[("detail", detail.as_str())])
            }
        }
    }

    /// 调用方可修正后重试的错误（输入 / 使用错误）
    pub fn is_user_error(&self) -> bool {
        !matches!(self, ApiError::InternalError(_) | ApiError::Other(_))
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
