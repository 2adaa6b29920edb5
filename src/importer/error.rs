// ==========================================
// 车队碳排放报告系统 - 导入/流水线错误类型
// ==========================================
// 工具: thiserror 派生宏
// 用户可见文案由 API 层按语言翻译，此处为日志用文本
// ==========================================

use crate::domain::types::{FileKind, LogicalField};
use thiserror::Error;

/// 导入/流水线错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("缺少输入文件: {0}")]
    MissingInputFile(FileKind),

    #[error("{file} 文件为空或不是有效的 CSV")]
    EmptyFile { file: FileKind },

    #[error("CSV 解析失败 ({}): {message}", .file.map(|f| f.key()).unwrap_or("-"))]
    CsvParseError {
        file: Option<FileKind>,
        message: String,
    },

    // ===== 列名解析错误 =====
    #[error(
        "{file} 文件缺少必填列 {field}（可用列: [{}]，期望列名: {}）",
        .available.join(", "),
        .candidates.join(", ")
    )]
    MissingRequiredColumn {
        file: FileKind,
        field: LogicalField,
        candidates: Vec<String>,
        available: Vec<String>,
    },

    // ===== 人工分类错误 =====
    #[error("当前没有等待人工确认的车型分类")]
    NoPendingClassification,

    #[error("以下车辆仍未确定车型: {}", .missing.join(", "))]
    ClassificationIncomplete { missing: Vec<String> },

    #[error("车辆 {vehicle_id} 的车型无效: {value}")]
    InvalidCategory { vehicle_id: String, value: String },

    // ===== 配置错误 =====
    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 带文件上下文的 CSV 错误
    pub fn csv(file: FileKind, err: impl std::fmt::Display) -> Self {
        ImportError::CsvParseError {
            file: Some(file),
            message: err.to_string(),
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError {
            file: None,
            message: err.to_string(),
        }
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
