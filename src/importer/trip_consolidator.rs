// ==========================================
// 车队碳排放报告系统 - 行程合并器实现
// ==========================================
// 阶段 3: 多条行程段记录 → 唯一物理行程
// 合并键: (车辆, 起点, 终点, 开始时间的自然日)
// ==========================================

use crate::domain::trip::{ColumnResolution, CompletionStamp, ConsolidatedTrip, RawRow, RawTable, TripKey, TripLeg};
use crate::domain::types::{DateOrder, LogicalField};
use crate::importer::data_cleaner::DataCleaner as DefaultDataCleaner;
use crate::importer::report_importer_trait::{
    DataCleaner, TripConsolidator as TripConsolidatorTrait,
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

// ==========================================
// SkipCounts - 跳过行计数（按原因）
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipCounts {
    pub missing_value: usize, // 必填值缺失
    pub bad_distance: usize,  // 里程无法解析
    pub bad_date: usize,      // 开始时间无法解析
}

impl SkipCounts {
    pub fn total(&self) -> usize {
        self.missing_value + self.bad_distance + self.bad_date
    }
}

// ==========================================
// Consolidation - 合并结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct Consolidation {
    pub trips: Vec<ConsolidatedTrip>, // 合并键首次出现顺序
    pub skipped: SkipCounts,
    pub total_rows: usize,
}

// 单行提取失败原因
enum RowRejection {
    MissingValue,
    BadDistance,
    BadDate,
}

// ==========================================
// TripConsolidator 实现
// ==========================================
pub struct TripConsolidator {
    data_cleaner: Box<dyn DataCleaner>,
}

impl Default for TripConsolidator {
    fn default() -> Self {
        Self::new(Box::new(DefaultDataCleaner))
    }
}

impl TripConsolidator {
    pub fn new(data_cleaner: Box<dyn DataCleaner>) -> Self {
        Self { data_cleaner }
    }

    /// 将原始行转换为行程段
    fn extract_leg(
        &self,
        row: &RawRow,
        resolution: &ColumnResolution,
        date_order: DateOrder,
    ) -> Result<TripLeg, RowRejection> {
        let field = |f: LogicalField| self.data_cleaner.normalize_null(row.field(resolution, f));

        let (vehicle_id, source, destination, started_raw, distance_raw) = match (
            field(LogicalField::VehicleId),
            field(LogicalField::Source),
            field(LogicalField::Destination),
            field(LogicalField::TripStart),
            field(LogicalField::Distance),
        ) {
            (Some(v), Some(s), Some(d), Some(t), Some(km)) => (v, s, d, t, km),
            _ => return Err(RowRejection::MissingValue),
        };

        let distance_km = self
            .data_cleaner
            .parse_distance(&distance_raw)
            .ok_or(RowRejection::BadDistance)?;

        let started_at = self
            .data_cleaner
            .parse_timestamp(&started_raw, date_order)
            .ok_or(RowRejection::BadDate)?;

        // 完成时间无法解析时忽略（不影响行程）
        let completed_at = field(LogicalField::CompletedAt).and_then(|raw| {
            match self.data_cleaner.parse_timestamp(&raw, date_order) {
                Some(at) => Some(CompletionStamp { raw, at }),
                None => {
                    debug!(row_number = row.row_number, value = %raw, "完成时间无法解析，已忽略");
                    None
                }
            }
        });

        Ok(TripLeg {
            row_number: row.row_number,
            vehicle_id,
            source,
            destination,
            started_at,
            distance_km,
            completed_at,
            assignment_uid: field(LogicalField::AssignmentUid),
            consignment_note_uid: field(LogicalField::ConsignmentNoteUid),
        })
    }
}

impl TripConsolidatorTrait for TripConsolidator {
    fn consolidate(
        &self,
        table: &RawTable,
        resolution: &ColumnResolution,
        date_order: DateOrder,
    ) -> Consolidation {
        let mut trips: Vec<ConsolidatedTrip> = Vec::new();
        let mut first_occurrence: HashMap<TripKey, usize> = HashMap::new();
        let mut skipped = SkipCounts::default();

        for row in &table.rows {
            let leg = match self.extract_leg(row, resolution, date_order) {
                Ok(leg) => leg,
                Err(reason) => {
                    let reason_str = match reason {
                        RowRejection::MissingValue => {
                            skipped.missing_value += 1;
                            "missing_value"
                        }
                        RowRejection::BadDistance => {
                            skipped.bad_distance += 1;
                            "bad_distance"
                        }
                        RowRejection::BadDate => {
                            skipped.bad_date += 1;
                            "bad_date"
                        }
                    };
                    warn!(row_number = row.row_number, reason = reason_str, "行程行已跳过");
                    continue;
                }
            };

            let key = leg.key();
            match first_occurrence.get(&key) {
                Some(&idx) => {
                    debug!(row_number = leg.row_number, vehicle_id = %key.vehicle_id, "合并重复行程段");
                    trips[idx].absorb(leg);
                }
                None => {
                    first_occurrence.insert(key, trips.len());
                    trips.push(ConsolidatedTrip::from_leg(leg));
                }
            }
        }

        info!(
            total_rows = table.rows.len(),
            trips = trips.len(),
            skipped = skipped.total(),
            "行程合并完成"
        );

        Consolidation {
            trips,
            skipped,
            total_rows: table.rows.len(),
        }
    }
}
