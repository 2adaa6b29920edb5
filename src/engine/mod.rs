// ==========================================
// 车队碳排放报告系统 - 引擎层
// ==========================================
// 职责: 车型分类、排放计算、汇总、流水线编排
// 红线: 引擎不读写文件, 所有兜底处理必须输出假设说明
// ==========================================

pub mod assumption_notes;
pub mod emission_calculator;
pub mod report_pipeline;
pub mod report_summary;
pub mod vehicle_classifier;

// 重导出核心引擎
pub use assumption_notes::NoteWriter;
pub use emission_calculator::{Calculation, EmissionCalculator, NOT_AVAILABLE};
pub use report_pipeline::{
    resume, GenerationOutcome, JobState, PipelineSettings, ReportInputs, ReportPipeline,
};
pub use report_summary::ReportSummaryEngine;
pub use vehicle_classifier::{
    compact_vehicle_id, parse_manual_categories, Classification, ManualResolution,
    VehicleClassifier, VehicleRegistry,
};
