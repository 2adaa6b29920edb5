// ==========================================
// 车队碳排放报告系统 - 配置层
// ==========================================
// 职责: 系统配置管理（默认值 + JSON 覆写）
// 存储: 内存 key-value
// ==========================================

pub mod config_manager;
pub mod report_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use report_config_trait::ReportConfigReader;
