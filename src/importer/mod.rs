// ==========================================
// 车队碳排放报告系统 - 导入层
// ==========================================
// 职责: 外部 CSV 数据导入,生成合并后的物理行程
// 流程: 解析 → 列名解析 → 清洗 → 合并
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod error;
pub mod file_parser;
pub mod report_importer_trait;
pub mod schema_resolver;
pub mod trip_consolidator;

// 重导出核心类型
pub use data_cleaner::DataCleaner as DataCleanerImpl;
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, CsvSource};
pub use schema_resolver::{
    field_specs, normalize, resolve_header, AliasTable, FieldSpec, ResolvedSchema,
    SchemaResolver as SchemaResolverImpl,
};
pub use trip_consolidator::{Consolidation, SkipCounts, TripConsolidator as TripConsolidatorImpl};

// 重导出 Trait 接口
pub use report_importer_trait::{DataCleaner, SchemaResolver, TableParser, TripConsolidator};
