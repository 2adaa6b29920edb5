// ==========================================
// 车队碳排放报告系统 - 排放计算引擎
// ==========================================
// 职责: 物理行程 × 车型排放因子 → 报告行
// 公式: emissions (kg CO₂e) = distance_km × factor
// ==========================================

use crate::domain::report::ReportRow;
use crate::domain::trip::ConsolidatedTrip;
use crate::domain::types::VehicleCategory;
use crate::importer::error::{ImportError, ImportResult};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// 缺失完成时间的展示值
pub const NOT_AVAILABLE: &str = "N/A";

// ==========================================
// Calculation - 计算结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct Calculation {
    pub rows: Vec<ReportRow>,
    pub dropped_non_finite: usize, // 里程或排放非有限数被剔除的行程数
}

// ==========================================
// EmissionCalculator - 排放计算引擎
// ==========================================
#[derive(Debug, Clone)]
pub struct EmissionCalculator {
    trip_id_prefix: String,
    uid_separator: String,
}

impl Default for EmissionCalculator {
    fn default() -> Self {
        Self::new("PT", ", ")
    }
}

impl EmissionCalculator {
    /// 创建排放计算引擎
    ///
    /// # 参数
    /// - trip_id_prefix: 物理行程编号前缀（PT → PT-0001）
    /// - uid_separator: UID 列表分隔符
    pub fn new(trip_id_prefix: impl Into<String>, uid_separator: impl Into<String>) -> Self {
        Self {
            trip_id_prefix: trip_id_prefix.into(),
            uid_separator: uid_separator.into(),
        }
    }

    /// 物理行程编号: <前缀>-<序号，4 位补零>
    pub fn trip_id(&self, sequence: usize) -> String {
        format!("{}-{:04}", self.trip_id_prefix, sequence)
    }

    /// 计算报告行
    ///
    /// # 规则
    /// - 每条行程的车辆必须已有车型，否则为内部错误
    /// - 里程或排放非有限数的行程剔除（计数）
    /// - 保留的行程按合并顺序连续编号
    pub fn calculate(
        &self,
        trips: &[ConsolidatedTrip],
        categories: &BTreeMap<String, VehicleCategory>,
    ) -> ImportResult<Calculation> {
        let mut rows = Vec::with_capacity(trips.len());
        let mut dropped_non_finite = 0;

        for trip in trips {
            let category = *categories.get(&trip.vehicle_id).ok_or_else(|| {
                ImportError::InternalError(format!("车辆 {} 缺少车型", trip.vehicle_id))
            })?;

            let emissions = trip.distance_km * category.emission_factor();
            if !trip.distance_km.is_finite() || !emissions.is_finite() {
                warn!(
                    vehicle_id = %trip.vehicle_id,
                    distance_km = trip.distance_km,
                    "排放结果非有限数，行程已剔除"
                );
                dropped_non_finite += 1;
                continue;
            }

            let completed_at = trip
                .completed_at
                .as_ref()
                .map(|stamp| stamp.raw.clone())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string());

            rows.push(ReportRow::new(
                self.trip_id(rows.len() + 1),
                self.join_uids(&trip.assignment_uids),
                self.join_uids(&trip.consignment_note_uids),
                trip.vehicle_id.clone(),
                trip.source.clone(),
                trip.destination.clone(),
                trip.distance_km,
                completed_at,
                category,
                emissions,
            ));
        }

        info!(rows = rows.len(), dropped = dropped_non_finite, "排放计算完成");

        Ok(Calculation {
            rows,
            dropped_non_finite,
        })
    }

    fn join_uids(&self, uids: &BTreeSet<String>) -> String {
        uids.iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(&self.uid_separator)
    }
}
