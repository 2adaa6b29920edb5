// ==========================================
// 车队碳排放报告系统 - 核心库
// ==========================================
// 职责: 行程日志 + 车辆台账 → 对账后的碳排放报告
// 系统定位: 单用户、单次触发的报告流水线（人工确认车型）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 导入层 - CSV 解析、列名解析、行程合并
pub mod importer;

// 引擎层 - 车型分类、排放计算、流水线编排
pub mod engine;

// 导出层 - 报告/模板 CSV 文本
pub mod exporter;

// 配置层 - 系统配置
pub mod config;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 调用方门面
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AssumptionKind, DateOrder, FileKind, LogicalField, VehicleCategory};

// 领域实体
pub use domain::{
    AssumptionNote, ConsolidatedTrip, PendingClassificationBundle, RawRow, RawTable,
    ReportOutput, ReportRow, ReportSummary,
};

// 引擎
pub use engine::{
    EmissionCalculator, GenerationOutcome, JobState, ReportPipeline, VehicleClassifier,
};

// 导入
pub use importer::{ImportError, ImportResult};

// API
pub use api::{ApiError, ReportApi, ReportResponse};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "车队碳排放报告系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
