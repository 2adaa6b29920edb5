// ==========================================
// 车队碳排放报告系统 - 上传模板
// ==========================================
// 职责: 生成可下载的行程 / 车辆 CSV 模板（含示例数据）
// 模板表头均可被 SchemaResolver 识别
// ==========================================

use crate::exporter::csv_exporter::write_csv;
use crate::importer::error::ImportResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Trips,
    Vehicles,
}

impl TemplateKind {
    /// 下载文件名
    pub fn file_name(self) -> &'static str {
        match self {
            TemplateKind::Trips => "trip_data_template.csv",
            TemplateKind::Vehicles => "vehicle_data_template.csv",
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateKind::Trips => write!(f, "trips"),
            TemplateKind::Vehicles => write!(f, "vehicles"),
        }
    }
}

impl FromStr for TemplateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trips" | "trip" => Ok(TemplateKind::Trips),
            "vehicles" | "vehicle" => Ok(TemplateKind::Vehicles),
            other => Err(format!("unknown template kind: {}", other)),
        }
    }
}

const TRIP_HEADERS: [&str; 11] = [
    "Assignment_ID",
    "Consignment_Note_ID",
    "Vehicle_Number",
    "Source",
    "Destination",
    "Distance_KM",
    "Date_Time",
    "Trip_Completed_At",
    "Fuel_Consumed_L",
    "Duration_Hours",
    "Load_Tonnes",
];

const TRIP_SAMPLES: [[&str; 11]; 3] = [
    [
        "ASSIGN001", "CN001", "VEHICLE-001", "Mumbai", "Delhi", "1400", "2024-01-15 08:00",
        "2024-01-16 06:00", "180", "15.5", "2.5",
    ],
    [
        "ASSIGN002", "CN002", "VEHICLE-002", "Chennai", "Bangalore", "350", "2024-01-16 14:30",
        "2024-01-16 20:45", "45", "8.2", "1.0",
    ],
    [
        "ASSIGN003", "CN003", "VEHICLE-003", "Kolkata", "Hyderabad", "1200", "2024-01-17 10:15",
        "2024-01-18 07:30", "150", "20.0", "3.0",
    ],
];

const VEHICLE_HEADERS: [&str; 7] = [
    "Vehicle_Number",
    "Vehicle_Type",
    "Model",
    "Fuel_Type",
    "Capacity_Tonnes",
    "Year",
    "Emission_Standard",
];

const VEHICLE_SAMPLES: [[&str; 7]; 3] = [
    ["VEHICLE-001", "Heavy Goods Vehicle", "Tata 1618", "Diesel", "16.2", "2019", "BS-VI"],
    ["VEHICLE-002", "Medium Goods Vehicle", "Ashok Leyland 1415", "Diesel", "14.0", "2020", "BS-VI"],
    ["VEHICLE-003", "Heavy Goods Vehicle", "Mahindra Blazo", "Diesel", "25.0", "2021", "BS-VI"],
];

fn to_records<const N: usize>(samples: &[[&str; N]]) -> Vec<Vec<String>> {
    samples
        .iter()
        .map(|row| row.iter().map(|v| v.to_string()).collect())
        .collect()
}

/// 生成模板 CSV 文本（带 BOM）
pub fn template_csv(kind: TemplateKind) -> ImportResult<String> {
    match kind {
        TemplateKind::Trips => write_csv(&TRIP_HEADERS, &to_records(&TRIP_SAMPLES)),
        TemplateKind::Vehicles => write_csv(&VEHICLE_HEADERS, &to_records(&VEHICLE_SAMPLES)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{FileKind, LogicalField};
    use crate::importer::file_parser::{CsvParser, CsvSource};
    use crate::importer::report_importer_trait::{SchemaResolver, TableParser};
    use crate::importer::schema_resolver::{AliasTable, SchemaResolver as SchemaResolverImpl};

    fn resolve(kind: TemplateKind, file: FileKind) -> crate::importer::schema_resolver::ResolvedSchema {
        let text = template_csv(kind).unwrap();
        let table = CsvParser.parse(&CsvSource::text(text), file).unwrap();
        SchemaResolverImpl.resolve(&table, &AliasTable::new()).unwrap()
    }

    #[test]
    fn test_trip_template_resolves_every_field() {
        let schema = resolve(TemplateKind::Trips, FileKind::Trips);
        assert!(schema.missing_optional.is_empty());
        assert_eq!(
            schema.resolution.header(LogicalField::Distance),
            Some("Distance_KM")
        );
        assert_eq!(
            schema.resolution.header(LogicalField::CompletedAt),
            Some("Trip_Completed_At")
        );
        assert_eq!(
            schema.resolution.header(LogicalField::TripStart),
            Some("Date_Time")
        );
    }

    #[test]
    fn test_vehicle_template_resolves_category() {
        let schema = resolve(TemplateKind::Vehicles, FileKind::Vehicles);
        assert_eq!(
            schema.resolution.header(LogicalField::Category),
            Some("Vehicle_Type")
        );
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("Trips".parse::<TemplateKind>(), Ok(TemplateKind::Trips));
        assert_eq!("vehicle".parse::<TemplateKind>(), Ok(TemplateKind::Vehicles));
        assert!("routes".parse::<TemplateKind>().is_err());
    }
}
