// ==========================================
// 车队碳排放报告系统 - 领域类型定义
// ==========================================
// 职责: 车型枚举与排放因子、逻辑字段、文件类型、假设说明类型
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 车型 (Vehicle Category)
// ==========================================
// 排放因子单位: kg CO₂e / km
// 序列化格式: LGV / MGV / HGV / UNKNOWN
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleCategory {
    Lgv,     // 轻型货车
    Mgv,     // 中型货车
    Hgv,     // 重型货车
    Unknown, // 无法识别（兜底因子）
}

impl VehicleCategory {
    pub const ALL: [VehicleCategory; 4] = [
        VehicleCategory::Lgv,
        VehicleCategory::Mgv,
        VehicleCategory::Hgv,
        VehicleCategory::Unknown,
    ];

    /// 排放因子（kg CO₂e / km）
    pub fn emission_factor(self) -> f64 {
        match self {
            VehicleCategory::Lgv => 0.34,
            VehicleCategory::Mgv => 0.42,
            VehicleCategory::Hgv => 1.26,
            VehicleCategory::Unknown => 0.5,
        }
    }

    /// 标准代码
    pub fn code(self) -> &'static str {
        match self {
            VehicleCategory::Lgv => "LGV",
            VehicleCategory::Mgv => "MGV",
            VehicleCategory::Hgv => "HGV",
            VehicleCategory::Unknown => "UNKNOWN",
        }
    }

    pub fn is_known(self) -> bool {
        self != VehicleCategory::Unknown
    }

    /// 将台账中的原始车型文本归一化为标准车型
    ///
    /// # 规则（按顺序）
    /// 1. 与标准代码完全一致（忽略大小写） → 对应车型
    /// 2. 关键字包含: heavy/hgv → HGV, medium/mgv → MGV, light/lgv → LGV
    /// 3. 其他 → UNKNOWN
    pub fn normalize(raw: &str) -> VehicleCategory {
        let trimmed = raw.trim();

        if let Some(category) = Self::ALL
            .iter()
            .find(|c| c.code().eq_ignore_ascii_case(trimmed))
        {
            return *category;
        }

        let lower = trimmed.to_lowercase();
        if lower.contains("heavy") || lower.contains("hgv") {
            VehicleCategory::Hgv
        } else if lower.contains("medium") || lower.contains("mgv") {
            VehicleCategory::Mgv
        } else if lower.contains("light") || lower.contains("lgv") {
            VehicleCategory::Lgv
        } else {
            VehicleCategory::Unknown
        }
    }
}

impl fmt::Display for VehicleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// 人工输入解析: 与台账归一化规则一致，但拒绝无法识别的文本
// （显式填写 "UNKNOWN" 除外）
impl FromStr for VehicleCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match VehicleCategory::normalize(s) {
            VehicleCategory::Unknown
                if !s.trim().eq_ignore_ascii_case(VehicleCategory::Unknown.code()) =>
            {
                Err(format!("无法识别的车型: {}", s))
            }
            category => Ok(category),
        }
    }
}

// ==========================================
// 输入文件类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Trips,    // 行程日志
    Vehicles, // 车辆台账
}

impl FileKind {
    pub fn key(self) -> &'static str {
        match self {
            FileKind::Trips => "trips",
            FileKind::Vehicles => "vehicles",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

// ==========================================
// 斜杠/短横日期的日月顺序
// ==========================================
// 01/05/2024: Mdy → 1 月 5 日，Dmy → 5 月 1 日
// 按首选顺序无法解析时再尝试另一顺序（如 15/01/2024）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    #[default]
    Mdy, // 月/日/年
    Dmy, // 日/月/年
}

impl DateOrder {
    pub fn key(self) -> &'static str {
        match self {
            DateOrder::Mdy => "mdy",
            DateOrder::Dmy => "dmy",
        }
    }

    /// 另一种顺序（首选顺序解析失败时的回退）
    pub fn other(self) -> Self {
        match self {
            DateOrder::Mdy => DateOrder::Dmy,
            DateOrder::Dmy => DateOrder::Mdy,
        }
    }
}

impl fmt::Display for DateOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for DateOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mdy" => Ok(DateOrder::Mdy),
            "dmy" => Ok(DateOrder::Dmy),
            _ => Err(format!("无法识别的日期顺序: {}", s)),
        }
    }
}

// ==========================================
// 逻辑字段（与实际 CSV 表头解耦）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalField {
    VehicleId,
    Distance,
    Source,
    Destination,
    TripStart,
    AssignmentUid,
    ConsignmentNoteUid,
    CompletedAt,
    Category,
}

impl LogicalField {
    /// 配置键 / 翻译键使用的名称
    pub fn key(self) -> &'static str {
        match self {
            LogicalField::VehicleId => "vehicle_id",
            LogicalField::Distance => "distance",
            LogicalField::Source => "source",
            LogicalField::Destination => "destination",
            LogicalField::TripStart => "trip_start",
            LogicalField::AssignmentUid => "assignment_uid",
            LogicalField::ConsignmentNoteUid => "consignment_note_uid",
            LogicalField::CompletedAt => "completed_at",
            LogicalField::Category => "vehicle_category",
        }
    }
}

impl fmt::Display for LogicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

// ==========================================
// 假设说明类型
// ==========================================
// 非致命、面向用户: 描述流水线采用的兜底处理
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssumptionKind {
    MissingOptionalColumn,       // 可选列缺失
    CategoryColumnMissing,       // 车型列缺失，全部按兜底车型
    SkippedTripRows,             // 行程行被跳过（汇总一条）
    DuplicateRegistryEntries,    // 车辆台账重复登记
    ManualClassificationApplied, // 人工指定车型
    NonFiniteRowsDropped,        // 计算结果非有限数被剔除
}
