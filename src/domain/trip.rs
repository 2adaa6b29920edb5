// ==========================================
// 车队碳排放报告系统 - 行程领域模型
// ==========================================
// 职责: 原始行 / 列名解析结果 / 行程中间结构 / 合并后的物理行程
// ==========================================

use crate::domain::types::{FileKind, LogicalField};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

// ==========================================
// RawRow - CSV 原始行
// ==========================================
// 表头事先未知，按 "表头 → 单元格" 存储
// 生命周期: 仅在一次报告生成内
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub row_number: usize, // 数据行号（从 1 开始，不含表头）
    pub values: HashMap<String, String>,
}

impl RawRow {
    pub fn new(row_number: usize, values: HashMap<String, String>) -> Self {
        Self { row_number, values }
    }

    /// 读取单元格（TRIM 后为空视为缺失）
    pub fn get(&self, header: &str) -> Option<&str> {
        self.values
            .get(header)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// 按列名解析结果读取单元格
    pub fn field(&self, resolution: &ColumnResolution, field: LogicalField) -> Option<&str> {
        resolution.header(field).and_then(|h| self.get(h))
    }
}

// ==========================================
// RawTable - 一个 CSV 文件的解析结果
// ==========================================
#[derive(Debug, Clone)]
pub struct RawTable {
    pub kind: FileKind,
    pub headers: Vec<String>, // 文件中的表头顺序
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

// ==========================================
// ColumnResolution - 逻辑字段 → 实际表头
// ==========================================
// 每个文件解析一次，所有行复用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnResolution {
    pub kind: FileKind,
    columns: HashMap<LogicalField, String>,
}

impl ColumnResolution {
    pub fn new(kind: FileKind) -> Self {
        Self {
            kind,
            columns: HashMap::new(),
        }
    }

    pub fn insert(&mut self, field: LogicalField, header: String) {
        self.columns.insert(field, header);
    }

    pub fn header(&self, field: LogicalField) -> Option<&str> {
        self.columns.get(&field).map(String::as_str)
    }

    pub fn is_resolved(&self, field: LogicalField) -> bool {
        self.columns.contains_key(&field)
    }
}

// ==========================================
// CompletionStamp - 行程完成时间
// ==========================================
// raw 保留原始文本用于展示，at 用于比较先后
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionStamp {
    pub raw: String,
    pub at: NaiveDateTime,
}

// ==========================================
// TripLeg - 行程中间结构体
// ==========================================
// 用途: 原始行经字段提取与类型转换后的产物
// 生命周期: 仅在合并流程内
#[derive(Debug, Clone, PartialEq)]
pub struct TripLeg {
    pub row_number: usize,
    pub vehicle_id: String,
    pub source: String,
    pub destination: String,
    pub started_at: NaiveDateTime,
    pub distance_km: f64,
    pub completed_at: Option<CompletionStamp>,
    pub assignment_uid: Option<String>,
    pub consignment_note_uid: Option<String>,
}

impl TripLeg {
    /// 合并键: (车辆, 起点, 终点, 开始时间的自然日)
    pub fn key(&self) -> TripKey {
        TripKey {
            vehicle_id: self.vehicle_id.clone(),
            source: self.source.clone(),
            destination: self.destination.clone(),
            trip_date: self.started_at.date(),
        }
    }
}

// ==========================================
// TripKey - 物理行程合并键
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TripKey {
    pub vehicle_id: String,
    pub source: String,
    pub destination: String,
    pub trip_date: NaiveDate,
}

// ==========================================
// ConsolidatedTrip - 合并后的物理行程
// ==========================================
// 不变量:
// - 每个合并键恰好一条
// - distance_km 合并时只增不减
// - UID 集合只增不减
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedTrip {
    pub vehicle_id: String,
    pub source: String,
    pub destination: String,
    pub trip_date: NaiveDate,
    pub distance_km: f64,
    pub completed_at: Option<CompletionStamp>,
    pub assignment_uids: BTreeSet<String>,
    pub consignment_note_uids: BTreeSet<String>,
    pub merged_rows: usize,
}

impl ConsolidatedTrip {
    /// 以首条行程段创建
    pub fn from_leg(leg: TripLeg) -> Self {
        let trip_date = leg.started_at.date();
        let mut trip = Self {
            vehicle_id: leg.vehicle_id,
            source: leg.source,
            destination: leg.destination,
            trip_date,
            distance_km: leg.distance_km,
            completed_at: None,
            assignment_uids: BTreeSet::new(),
            consignment_note_uids: BTreeSet::new(),
            merged_rows: 0,
        };
        trip.absorb_extras(leg.completed_at, leg.assignment_uid, leg.consignment_note_uid);
        trip.merged_rows = 1;
        trip
    }

    pub fn key(&self) -> TripKey {
        TripKey {
            vehicle_id: self.vehicle_id.clone(),
            source: self.source.clone(),
            destination: self.destination.clone(),
            trip_date: self.trip_date,
        }
    }

    /// 合并同键的另一条行程段
    ///
    /// # 规则
    /// - 里程取最大值（防止部分/重复记录低报）
    /// - 完成时间取最晚的非空值
    /// - UID 取并集
    pub fn absorb(&mut self, leg: TripLeg) {
        if leg.distance_km > self.distance_km {
            self.distance_km = leg.distance_km;
        }
        self.absorb_extras(leg.completed_at, leg.assignment_uid, leg.consignment_note_uid);
        self.merged_rows += 1;
    }

    fn absorb_extras(
        &mut self,
        completed_at: Option<CompletionStamp>,
        assignment_uid: Option<String>,
        consignment_note_uid: Option<String>,
    ) {
        if let Some(stamp) = completed_at {
            let later = self
                .completed_at
                .as_ref()
                .map_or(true, |current| stamp.at > current.at);
            if later {
                self.completed_at = Some(stamp);
            }
        }
        if let Some(uid) = assignment_uid {
            self.assignment_uids.insert(uid);
        }
        if let Some(uid) = consignment_note_uid {
            self.consignment_note_uids.insert(uid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(distance: f64, hour: u32, assignment: Option<&str>) -> TripLeg {
        let started_at = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        TripLeg {
            row_number: 1,
            vehicle_id: "V1".to_string(),
            source: "A".to_string(),
            destination: "B".to_string(),
            started_at,
            distance_km: distance,
            completed_at: None,
            assignment_uid: assignment.map(str::to_string),
            consignment_note_uid: None,
        }
    }

    fn stamp(raw: &str, hour: u32) -> CompletionStamp {
        CompletionStamp {
            raw: raw.to_string(),
            at: NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_raw_row_get_trims_and_treats_blank_as_missing() {
        let mut values = HashMap::new();
        values.insert("Source".to_string(), "  Mumbai ".to_string());
        values.insert("Destination".to_string(), "   ".to_string());
        let row = RawRow::new(1, values);

        assert_eq!(row.get("Source"), Some("Mumbai"));
        assert_eq!(row.get("Destination"), None);
        assert_eq!(row.get("Missing"), None);
    }

    #[test]
    fn test_absorb_keeps_max_distance() {
        let mut trip = ConsolidatedTrip::from_leg(leg(120.0, 8, None));
        trip.absorb(leg(100.0, 9, None));
        assert_eq!(trip.distance_km, 120.0);

        trip.absorb(leg(150.0, 10, None));
        assert_eq!(trip.distance_km, 150.0);
        assert_eq!(trip.merged_rows, 3);
    }

    #[test]
    fn test_absorb_unions_uids() {
        let mut trip = ConsolidatedTrip::from_leg(leg(100.0, 8, Some("AS-1")));
        trip.absorb(leg(100.0, 9, Some("AS-2")));
        trip.absorb(leg(100.0, 10, Some("AS-1")));

        let uids: Vec<&str> = trip.assignment_uids.iter().map(String::as_str).collect();
        assert_eq!(uids, vec!["AS-1", "AS-2"]);
    }

    #[test]
    fn test_absorb_keeps_latest_completion() {
        let mut first = leg(100.0, 8, None);
        first.completed_at = Some(stamp("2024-01-15 14:00", 14));
        let mut trip = ConsolidatedTrip::from_leg(first);

        let mut earlier = leg(100.0, 9, None);
        earlier.completed_at = Some(stamp("2024-01-15 12:00", 12));
        trip.absorb(earlier);
        assert_eq!(trip.completed_at.as_ref().unwrap().raw, "2024-01-15 14:00");

        let mut later = leg(100.0, 10, None);
        later.completed_at = Some(stamp("2024-01-15 18:00", 18));
        trip.absorb(later);
        assert_eq!(trip.completed_at.as_ref().unwrap().raw, "2024-01-15 18:00");

        // 空值不覆盖已有完成时间
        trip.absorb(leg(100.0, 11, None));
        assert_eq!(trip.completed_at.as_ref().unwrap().raw, "2024-01-15 18:00");
    }
}
