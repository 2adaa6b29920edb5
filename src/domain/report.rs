// ==========================================
// 车队碳排放报告系统 - 报告领域模型
// ==========================================
// 职责: 报告行 / 假设说明 / 待人工分类快照 / 报告汇总
// ==========================================

use crate::domain::trip::ConsolidatedTrip;
use crate::domain::types::{AssumptionKind, VehicleCategory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// ReportRow - 最终报告行
// ==========================================
// 仅由 EmissionCalculator 创建，创建后不可修改
// 序列化字段名即导出表头
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "Physical Trip ID")]
    physical_trip_id: String,
    #[serde(rename = "Assignment UIDs")]
    assignment_uids: String,
    #[serde(rename = "Consignment Note UIDs")]
    consignment_note_uids: String,
    #[serde(rename = "Vehicle No.")]
    vehicle_id: String,
    #[serde(rename = "Source")]
    source: String,
    #[serde(rename = "Destination")]
    destination: String,
    #[serde(rename = "Running Distance (km)")]
    distance_km: f64,
    #[serde(rename = "Trip Completed At")]
    completed_at: String,
    #[serde(rename = "Vehicle Category")]
    vehicle_category: VehicleCategory,
    #[serde(rename = "Emission Factor (kg CO₂e/km)")]
    emission_factor: f64,
    #[serde(rename = "Calculated Carbon Emissions (kg CO₂e)")]
    emissions_kg_co2e: f64,
}

impl ReportRow {
    /// 导出表头（固定顺序）
    pub const HEADERS: [&'static str; 11] = [
        "Physical Trip ID",
        "Assignment UIDs",
        "Consignment Note UIDs",
        "Vehicle No.",
        "Source",
        "Destination",
        "Running Distance (km)",
        "Trip Completed At",
        "Vehicle Category",
        "Emission Factor (kg CO₂e/km)",
        "Calculated Carbon Emissions (kg CO₂e)",
    ];

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        physical_trip_id: String,
        assignment_uids: String,
        consignment_note_uids: String,
        vehicle_id: String,
        source: String,
        destination: String,
        distance_km: f64,
        completed_at: String,
        vehicle_category: VehicleCategory,
        emissions_kg_co2e: f64,
    ) -> Self {
        Self {
            physical_trip_id,
            assignment_uids,
            consignment_note_uids,
            vehicle_id,
            source,
            destination,
            distance_km,
            completed_at,
            vehicle_category,
            emission_factor: vehicle_category.emission_factor(),
            emissions_kg_co2e,
        }
    }

    pub fn physical_trip_id(&self) -> &str {
        &self.physical_trip_id
    }

    pub fn assignment_uids(&self) -> &str {
        &self.assignment_uids
    }

    pub fn consignment_note_uids(&self) -> &str {
        &self.consignment_note_uids
    }

    pub fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub fn completed_at(&self) -> &str {
        &self.completed_at
    }

    pub fn vehicle_category(&self) -> VehicleCategory {
        self.vehicle_category
    }

    pub fn emission_factor(&self) -> f64 {
        self.emission_factor
    }

    pub fn emissions_kg_co2e(&self) -> f64 {
        self.emissions_kg_co2e
    }
}

// ==========================================
// AssumptionNote - 假设说明
// ==========================================
// 非致命、面向用户；message 已按当前语言翻译
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssumptionNote {
    pub kind: AssumptionKind,
    pub message: String,
}

impl AssumptionNote {
    pub fn new(kind: AssumptionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

// ==========================================
// PendingClassificationBundle - 待人工分类快照
// ==========================================
// 仅在流水线暂停等待人工车型输入期间存在
// 纯数据，可序列化；恢复或重置后销毁
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingClassificationBundle {
    pub trips: Vec<ConsolidatedTrip>,                  // 合并后的物理行程（已定序）
    pub resolved: BTreeMap<String, VehicleCategory>,   // 已自动识别的车型（按行程中的车辆号）
    pub unresolved_vehicle_ids: Vec<String>,           // 待人工确认的车辆号（首次出现顺序）
    pub notes: Vec<AssumptionNote>,                    // 暂停前已产生的假设说明
}

// ==========================================
// ReportSummary - 报告汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_emissions_kg: f64,
    pub total_distance_km: f64,
    pub total_trips: usize,
    pub total_vehicles: usize,
    pub vehicles: Vec<VehicleStats>,        // 按排放降序
    pub categories: Vec<CategoryEmissions>, // 按排放降序
}

// 单车统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleStats {
    pub vehicle_id: String,
    pub trip_count: usize,
    pub total_distance_km: f64,
    pub total_emissions_kg: f64,
    pub efficiency_kg_per_km: f64, // 排放 / 里程，里程为 0 时为 0
}

// 车型排放
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEmissions {
    pub category: VehicleCategory,
    pub trip_count: usize,
    pub emissions_kg: f64,
}

// ==========================================
// ReportOutput - 一次成功生成的报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportOutput {
    pub report_id: String,          // UUID
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<ReportRow>,
    pub notes: Vec<AssumptionNote>,
    pub summary: ReportSummary,
}
