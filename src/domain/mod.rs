// ==========================================
// 车队碳排放报告系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含文件解析逻辑,不含引擎逻辑
// ==========================================

pub mod report;
pub mod trip;
pub mod types;

// 重导出核心类型
pub use report::{
    AssumptionNote, CategoryEmissions, PendingClassificationBundle, ReportOutput, ReportRow,
    ReportSummary, VehicleStats,
};
pub use trip::{
    ColumnResolution, CompletionStamp, ConsolidatedTrip, RawRow, RawTable, TripKey, TripLeg,
};
pub use types::{AssumptionKind, DateOrder, FileKind, LogicalField, VehicleCategory};
