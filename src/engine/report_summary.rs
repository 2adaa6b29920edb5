// ==========================================
// 车队碳排放报告系统 - 报告汇总引擎
// ==========================================
// 职责: 报告行 → KPI / 单车统计 / 车型排放
// 红线: 无状态引擎,所有方法都是纯函数
// ==========================================

use crate::domain::report::{CategoryEmissions, ReportRow, ReportSummary, VehicleStats};
use crate::domain::types::VehicleCategory;
use std::collections::HashMap;

#[derive(Debug, Default, Clone, Copy)]
pub struct ReportSummaryEngine;

impl ReportSummaryEngine {
    pub fn new() -> Self {
        Self
    }

    /// 生成报告汇总
    pub fn summarize(&self, rows: &[ReportRow]) -> ReportSummary {
        let vehicles = self.vehicle_stats(rows);
        let categories = self.category_emissions(rows);

        ReportSummary {
            total_emissions_kg: rows.iter().map(ReportRow::emissions_kg_co2e).sum(),
            total_distance_km: rows.iter().map(ReportRow::distance_km).sum(),
            total_trips: rows.len(),
            total_vehicles: vehicles.len(),
            vehicles,
            categories,
        }
    }

    /// 单车统计（按排放降序，排放相同按首次出现顺序）
    pub fn vehicle_stats(&self, rows: &[ReportRow]) -> Vec<VehicleStats> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut stats: Vec<VehicleStats> = Vec::new();

        for row in rows {
            let idx = *index.entry(row.vehicle_id()).or_insert_with(|| {
                stats.push(VehicleStats {
                    vehicle_id: row.vehicle_id().to_string(),
                    trip_count: 0,
                    total_distance_km: 0.0,
                    total_emissions_kg: 0.0,
                    efficiency_kg_per_km: 0.0,
                });
                stats.len() - 1
            });

            let entry = &mut stats[idx];
            entry.trip_count += 1;
            entry.total_distance_km += row.distance_km();
            entry.total_emissions_kg += row.emissions_kg_co2e();
        }

        for entry in &mut stats {
            entry.efficiency_kg_per_km = if entry.total_distance_km > 0.0 {
                entry.total_emissions_kg / entry.total_distance_km
            } else {
                0.0
            };
        }

        stats.sort_by(|a, b| b.total_emissions_kg.total_cmp(&a.total_emissions_kg));
        stats
    }

    /// 车型排放（按排放降序，仅包含出现过的车型）
    pub fn category_emissions(&self, rows: &[ReportRow]) -> Vec<CategoryEmissions> {
        let mut result: Vec<CategoryEmissions> = VehicleCategory::ALL
            .iter()
            .filter_map(|category| {
                let matching: Vec<&ReportRow> = rows
                    .iter()
                    .filter(|r| r.vehicle_category() == *category)
                    .collect();
                if matching.is_empty() {
                    return None;
                }
                Some(CategoryEmissions {
                    category: *category,
                    trip_count: matching.len(),
                    emissions_kg: matching.iter().map(|r| r.emissions_kg_co2e()).sum(),
                })
            })
            .collect();

        result.sort_by(|a, b| b.emissions_kg.total_cmp(&a.emissions_kg));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: usize, vehicle: &str, distance: f64, category: VehicleCategory) -> ReportRow {
        ReportRow::new(
            format!("PT-{:04}", id),
            String::new(),
            String::new(),
            vehicle.to_string(),
            "A".to_string(),
            "B".to_string(),
            distance,
            "N/A".to_string(),
            category,
            distance * category.emission_factor(),
        )
    }

    #[test]
    fn test_summary_totals() {
        let rows = vec![
            row(1, "V1", 100.0, VehicleCategory::Lgv),
            row(2, "V2", 100.0, VehicleCategory::Hgv),
            row(3, "V1", 50.0, VehicleCategory::Lgv),
        ];

        let summary = ReportSummaryEngine::new().summarize(&rows);
        assert_eq!(summary.total_trips, 3);
        assert_eq!(summary.total_vehicles, 2);
        assert!((summary.total_distance_km - 250.0).abs() < 1e-9);
        assert!((summary.total_emissions_kg - (150.0 * 0.34 + 126.0)).abs() < 1e-9);
    }

    #[test]
    fn test_vehicle_stats_sorted_by_emissions() {
        let rows = vec![
            row(1, "V1", 100.0, VehicleCategory::Lgv),
            row(2, "V2", 100.0, VehicleCategory::Hgv),
            row(3, "V1", 50.0, VehicleCategory::Lgv),
        ];

        let stats = ReportSummaryEngine::new().vehicle_stats(&rows);
        assert_eq!(stats[0].vehicle_id, "V2");
        assert_eq!(stats[1].vehicle_id, "V1");
        assert_eq!(stats[1].trip_count, 2);
        assert!((stats[1].efficiency_kg_per_km - 0.34).abs() < 1e-9);
    }

    #[test]
    fn test_zero_distance_efficiency() {
        let rows = vec![row(1, "V1", 0.0, VehicleCategory::Mgv)];
        let stats = ReportSummaryEngine::new().vehicle_stats(&rows);
        assert_eq!(stats[0].efficiency_kg_per_km, 0.0);
    }

    #[test]
    fn test_category_emissions() {
        let rows = vec![
            row(1, "V1", 100.0, VehicleCategory::Lgv),
            row(2, "V2", 100.0, VehicleCategory::Hgv),
        ];

        let categories = ReportSummaryEngine::new().category_emissions(&rows);
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].category, VehicleCategory::Hgv);
        assert_eq!(categories[1].category, VehicleCategory::Lgv);
        assert_eq!(categories[1].trip_count, 1);
    }
}
