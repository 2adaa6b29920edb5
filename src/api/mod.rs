// ==========================================
// 车队碳排放报告系统 - API 层
// ==========================================
// 职责: 提供报告 API 接口,供命令行/界面调用
// ==========================================

pub mod error;
pub mod report_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use report_api::{ReportApi, ReportResponse};
