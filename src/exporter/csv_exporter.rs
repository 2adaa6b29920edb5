// ==========================================
// 车队碳排放报告系统 - CSV 导出器
// ==========================================
// 职责: 报告行 / 单车统计 → 可下载的 CSV 文本
// 格式: UTF-8 + BOM，RFC 4180 引号规则，数值两位小数
// ==========================================

use crate::domain::report::{ReportRow, VehicleStats};
use crate::importer::error::{ImportError, ImportResult};
use csv::{QuoteStyle, Writer, WriterBuilder};
use tracing::debug;

/// UTF-8 BOM（便于 Excel 识别编码）
pub const BOM: &str = "\u{feff}";

/// 单车统计导出表头
pub const VEHICLE_SUMMARY_HEADERS: [&str; 5] = [
    "Vehicle No.",
    "Total Trips",
    "Total Distance (km)",
    "Total Emissions (kg CO₂e)",
    "Efficiency (kg CO₂e/km)",
];

fn new_writer() -> Writer<Vec<u8>> {
    WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new())
}

// 取出缓冲区并加 BOM
fn finish(writer: Writer<Vec<u8>>) -> ImportResult<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ImportError::InternalError(format!("CSV 写入失败: {}", e)))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| ImportError::InternalError(format!("CSV 编码错误: {}", e)))?;
    Ok(format!("{}{}", BOM, text))
}

/// 按表头与行写出 CSV 文本（带 BOM）
pub fn write_csv<H, R>(headers: &[H], rows: &[R]) -> ImportResult<String>
where
    H: AsRef<str>,
    R: AsRef<[String]>,
{
    let mut writer = new_writer();
    writer.write_record(headers.iter().map(|h| h.as_ref()))?;
    for row in rows {
        writer.write_record(row.as_ref())?;
    }
    finish(writer)
}

/// 导出报告行
pub fn export_report_csv(rows: &[ReportRow]) -> ImportResult<String> {
    let records: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.physical_trip_id().to_string(),
                row.assignment_uids().to_string(),
                row.consignment_note_uids().to_string(),
                row.vehicle_id().to_string(),
                row.source().to_string(),
                row.destination().to_string(),
                format!("{:.2}", row.distance_km()),
                row.completed_at().to_string(),
                row.vehicle_category().code().to_string(),
                format!("{:.2}", row.emission_factor()),
                format!("{:.2}", row.emissions_kg_co2e()),
            ]
        })
        .collect();

    debug!(rows = records.len(), "导出报告 CSV");
    write_csv(&ReportRow::HEADERS, &records)
}

/// 导出单车统计
pub fn export_vehicle_summary_csv(vehicles: &[VehicleStats]) -> ImportResult<String> {
    let records: Vec<Vec<String>> = vehicles
        .iter()
        .map(|v| {
            vec![
                v.vehicle_id.clone(),
                v.trip_count.to_string(),
                format!("{:.2}", v.total_distance_km),
                format!("{:.2}", v.total_emissions_kg),
                format!("{:.3}", v.efficiency_kg_per_km),
            ]
        })
        .collect();

    debug!(vehicles = records.len(), "导出单车统计 CSV");
    write_csv(&VEHICLE_SUMMARY_HEADERS, &records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::VehicleCategory;

    fn sample_row() -> ReportRow {
        ReportRow::new(
            "PT-0001".to_string(),
            "AS-1, AS-2".to_string(),
            String::new(),
            "V1".to_string(),
            "Mumbai, MH".to_string(),
            "Delhi \"NCR\"".to_string(),
            120.0,
            "N/A".to_string(),
            VehicleCategory::Hgv,
            151.2,
        )
    }

    #[test]
    fn test_report_csv_layout() {
        let csv = export_report_csv(&[sample_row()]).unwrap();
        assert!(csv.starts_with(BOM));

        let mut lines = csv.trim_start_matches(BOM).lines();
        assert_eq!(
            lines.next().unwrap(),
            "Physical Trip ID,Assignment UIDs,Consignment Note UIDs,Vehicle No.,Source,Destination,\
             Running Distance (km),Trip Completed At,Vehicle Category,Emission Factor (kg CO₂e/km),\
             Calculated Carbon Emissions (kg CO₂e)"
        );
        assert_eq!(
            lines.next().unwrap(),
            "PT-0001,\"AS-1, AS-2\",,V1,\"Mumbai, MH\",\"Delhi \"\"NCR\"\"\",120.00,N/A,HGV,1.26,151.20"
        );
    }

    #[test]
    fn test_empty_report_has_header_only() {
        let csv = export_report_csv(&[]).unwrap();
        assert_eq!(csv.trim_start_matches(BOM).lines().count(), 1);
    }

    #[test]
    fn test_vehicle_summary_csv() {
        let stats = vec![VehicleStats {
            vehicle_id: "V1".to_string(),
            trip_count: 2,
            total_distance_km: 150.0,
            total_emissions_kg: 51.0,
            efficiency_kg_per_km: 0.34,
        }];

        let csv = export_vehicle_summary_csv(&stats).unwrap();
        let lines: Vec<&str> = csv.trim_start_matches(BOM).lines().collect();
        assert_eq!(
            lines[0],
            "Vehicle No.,Total Trips,Total Distance (km),Total Emissions (kg CO₂e),Efficiency (kg CO₂e/km)"
        );
        assert_eq!(lines[1], "V1,2,150.00,51.00,0.340");
    }
}
