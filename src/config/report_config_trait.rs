// ==========================================
// 车队碳排放报告系统 - 报告配置读取 Trait
// ==========================================
// 职责: 定义流水线所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::{DateOrder, LogicalField, VehicleCategory};
use crate::importer::error::ImportResult;

// ==========================================
// ReportConfigReader Trait
// ==========================================
// 用途: 报告流水线所需的配置读取接口
// 实现者: ConfigManager
pub trait ReportConfigReader: Send + Sync {
    /// 车型列缺失时的兜底车型
    ///
    /// # 默认值
    /// - HGV（保守估算）
    fn get_fallback_category(&self) -> ImportResult<VehicleCategory>;

    /// 物理行程编号前缀
    ///
    /// # 默认值
    /// - PT（编号形如 PT-0001）
    fn get_trip_id_prefix(&self) -> ImportResult<String>;

    /// UID 列表分隔符
    ///
    /// # 默认值
    /// - ", "
    fn get_uid_separator(&self) -> ImportResult<String>;

    /// 数字日期（01/05/2024）的日月顺序
    ///
    /// # 默认值
    /// - mdy（月/日/年）
    fn get_date_order(&self) -> ImportResult<DateOrder>;

    /// 逻辑字段的追加别名（排在内置候选之后）
    ///
    /// # 配置键
    /// - alias.<field>，逗号分隔
    fn get_extra_aliases(&self, field: LogicalField) -> ImportResult<Vec<String>>;

    /// 假设说明 / 错误信息语言
    ///
    /// # 默认值
    /// - en
    fn get_locale(&self) -> ImportResult<String>;
}
