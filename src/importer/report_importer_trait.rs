// ==========================================
// 车队碳排放报告系统 - 导入组件 Trait
// ==========================================
// 职责: 定义导入阶段各组件接口（不包含实现）
// 流程: 文件解析 → 列名解析 → 值清洗 → 行程合并
// ==========================================

use crate::domain::trip::{ColumnResolution, RawTable};
use crate::domain::types::{DateOrder, FileKind};
use crate::importer::error::ImportResult;
use crate::importer::file_parser::CsvSource;
use crate::importer::schema_resolver::{AliasTable, ResolvedSchema};
use crate::importer::trip_consolidator::Consolidation;
use chrono::NaiveDateTime;

// ==========================================
// TableParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: CsvParser
pub trait TableParser: Send + Sync {
    /// 解析 CSV 来源为原始表
    ///
    /// # 参数
    /// - source: 文件路径 / 文本 / 字节
    /// - kind: 文件类型（用于错误信息）
    ///
    /// # 返回
    /// - Ok(RawTable): 表头 + 数据行（已跳过空白行）
    /// - Err: 文件不存在、格式错误、空文件
    fn parse(&self, source: &CsvSource, kind: FileKind) -> ImportResult<RawTable>;
}

// ==========================================
// SchemaResolver Trait
// ==========================================
// 用途: 列名解析接口（阶段 1）
// 实现者: SchemaResolverImpl
pub trait SchemaResolver: Send + Sync {
    /// 将逻辑字段解析为实际表头
    ///
    /// # 参数
    /// - table: 原始表（只读取表头）
    /// - extra_aliases: 配置追加的别名（排在内置候选之后）
    ///
    /// # 返回
    /// - Ok(ResolvedSchema): 列名映射 + 缺失的可选字段
    /// - Err: 必填列缺失（错误中列出可用列与候选列名）
    fn resolve(&self, table: &RawTable, extra_aliases: &AliasTable)
        -> ImportResult<ResolvedSchema>;
}

// ==========================================
// DataCleaner Trait
// ==========================================
// 用途: 值清洗接口（阶段 2）
// 实现者: DataCleanerImpl
pub trait DataCleaner: Send + Sync {
    /// 标准化 NULL 值（空字符串/空白 → None）
    fn normalize_null(&self, value: Option<&str>) -> Option<String>;

    /// 解析里程（km）
    ///
    /// # 返回
    /// - Some(f64): 有限且非负
    /// - None: 无法解析 / 非有限 / 负数
    fn parse_distance(&self, value: &str) -> Option<f64>;

    /// 解析时间戳（不做时区换算）
    ///
    /// # 参数
    /// - date_order: 数字日期（01/05/2024）的日月顺序
    fn parse_timestamp(&self, value: &str, date_order: DateOrder) -> Option<NaiveDateTime>;
}

// ==========================================
// TripConsolidator Trait
// ==========================================
// 用途: 行程合并接口（阶段 3）
// 实现者: TripConsolidatorImpl
pub trait TripConsolidator: Send + Sync {
    /// 将行程原始行合并为物理行程
    ///
    /// # 规则
    /// - 合并键: (车辆, 起点, 终点, 开始日期)
    /// - 里程取最大，完成时间取最晚，UID 取并集
    /// - 无效行跳过并按原因计数（不报错）
    /// - 输出顺序 = 合并键首次出现顺序
    fn consolidate(
        &self,
        table: &RawTable,
        resolution: &ColumnResolution,
        date_order: DateOrder,
    ) -> Consolidation;
}
