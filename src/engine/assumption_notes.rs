// ==========================================
// 车队碳排放报告系统 - 假设说明生成
// ==========================================
// 职责: 将流水线各阶段的兜底处理转换为面向用户的说明
// 文案来自 locales/*.yml，按流水线配置的语言翻译
// ==========================================

use crate::domain::report::AssumptionNote;
use crate::domain::types::{AssumptionKind, FileKind, LogicalField, VehicleCategory};
use crate::i18n;
use crate::importer::trip_consolidator::SkipCounts;

#[derive(Debug, Clone)]
pub struct NoteWriter {
    locale: String,
}

impl NoteWriter {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
        }
    }

    fn tr(&self, key: &str, args: &[(&str, &str)]) -> String {
        i18n::t_with_args_in(&self.locale, key, args)
    }

    /// 可选列缺失
    pub fn missing_optional_column(&self, file: FileKind, field: LogicalField) -> AssumptionNote {
        let fallback_key = match field {
            LogicalField::CompletedAt => "notes.fallback_not_available",
            _ => "notes.fallback_blank",
        };
        let fallback = self.tr(fallback_key, &[]);
        let field_name = self.tr(&format!("field.{}", field.key()), &[]);
        let file_name = self.tr(&format!("file.{}", file.key()), &[]);

        AssumptionNote::new(
            AssumptionKind::MissingOptionalColumn,
            self.tr(
                "notes.missing_optional_column",
                &[
                    ("field", field_name.as_str()),
                    ("file", file_name.as_str()),
                    ("fallback", fallback.as_str()),
                ],
            ),
        )
    }

    /// 车型列缺失，全部按兜底车型
    pub fn category_column_missing(&self, fallback: VehicleCategory) -> AssumptionNote {
        AssumptionNote::new(
            AssumptionKind::CategoryColumnMissing,
            self.tr(
                "notes.category_column_missing",
                &[("category", fallback.code())],
            ),
        )
    }

    /// 行程行跳过（汇总一条）
    pub fn skipped_trip_rows(&self, counts: &SkipCounts, date_column: &str) -> AssumptionNote {
        AssumptionNote::new(
            AssumptionKind::SkippedTripRows,
            self.tr(
                "notes.skipped_trip_rows",
                &[
                    ("count", counts.total().to_string().as_str()),
                    ("missing", counts.missing_value.to_string().as_str()),
                    ("distance", counts.bad_distance.to_string().as_str()),
                    ("column", date_column),
                    ("date", counts.bad_date.to_string().as_str()),
                ],
            ),
        )
    }

    /// 车辆台账重复登记
    pub fn duplicate_registry_entries(&self, count: usize) -> AssumptionNote {
        AssumptionNote::new(
            AssumptionKind::DuplicateRegistryEntries,
            self.tr(
                "notes.duplicate_registry_entries",
                &[("count", count.to_string().as_str())],
            ),
        )
    }

    /// 人工指定车型
    pub fn manual_classification_applied(&self, count: usize) -> AssumptionNote {
        AssumptionNote::new(
            AssumptionKind::ManualClassificationApplied,
            self.tr(
                "notes.manual_classification_applied",
                &[("count", count.to_string().as_str())],
            ),
        )
    }

    /// 计算结果非有限数被剔除
    pub fn non_finite_rows_dropped(&self, count: usize) -> AssumptionNote {
        AssumptionNote::new(
            AssumptionKind::NonFiniteRowsDropped,
            self.tr(
                "notes.non_finite_rows_dropped",
                &[("count", count.to_string().as_str())],
            ),
        )
    }
}
