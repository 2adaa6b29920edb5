// ==========================================
// 车队碳排放报告系统 - 导出层
// ==========================================
// 职责: 报告 / 单车统计 / 上传模板 → CSV 文本
// ==========================================

pub mod csv_exporter;
pub mod templates;

pub use csv_exporter::{
    export_report_csv, export_vehicle_summary_csv, write_csv, BOM, VEHICLE_SUMMARY_HEADERS,
};
pub use templates::{template_csv, TemplateKind};
