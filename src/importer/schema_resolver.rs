// ==========================================
// 车队碳排放报告系统 - 列名解析器实现
// ==========================================
// 阶段 1: 逻辑字段 → 实际 CSV 表头
// 规则: 归一化后精确匹配（小写 + 去除非字母数字），不做模糊匹配
// ==========================================

use crate::domain::trip::{ColumnResolution, RawTable};
use crate::domain::types::{FileKind, LogicalField};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::report_importer_trait::SchemaResolver as SchemaResolverTrait;
use std::collections::HashMap;
use tracing::debug;

/// 配置追加的别名表（逻辑字段 → 别名列表）
pub type AliasTable = HashMap<LogicalField, Vec<String>>;

// ==========================================
// FieldSpec - 字段候选列名（静态数据）
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: LogicalField,
    pub required: bool,
    pub candidates: &'static [&'static str], // 按优先级排列（已归一化）
}

/// 行程日志字段
pub const TRIP_FIELDS: [FieldSpec; 8] = [
    FieldSpec {
        field: LogicalField::VehicleId,
        required: true,
        candidates: &[
            "vehiclenumber",
            "vehicleno",
            "vehicleid",
            "regno",
            "registrationno",
            "currentvehicleno",
        ],
    },
    FieldSpec {
        field: LogicalField::Distance,
        required: true,
        candidates: &[
            "runningdistance",
            "runningdistancekm",
            "totaldistance",
            "distance",
            "distancekm",
        ],
    },
    FieldSpec {
        field: LogicalField::Source,
        required: true,
        candidates: &["source", "origin"],
    },
    FieldSpec {
        field: LogicalField::Destination,
        required: true,
        candidates: &["destination", "dest"],
    },
    FieldSpec {
        field: LogicalField::TripStart,
        required: true,
        candidates: &[
            "tripstartedat",
            "tripstarttime",
            "tripstart",
            "startedat",
            "datetime",
        ],
    },
    FieldSpec {
        field: LogicalField::AssignmentUid,
        required: false,
        candidates: &["assignmentuid", "assignmentuids", "assignmentid"],
    },
    FieldSpec {
        field: LogicalField::ConsignmentNoteUid,
        required: false,
        candidates: &[
            "consignmentnoteuid",
            "consignmentnoteuids",
            "consignmentnoteid",
            "cnuid",
            "cnno",
        ],
    },
    FieldSpec {
        field: LogicalField::CompletedAt,
        required: false,
        candidates: &["tripcompletedat", "completedat", "tripendedat", "tripendtime"],
    },
];

/// 车辆台账字段
pub const VEHICLE_FIELDS: [FieldSpec; 2] = [
    FieldSpec {
        field: LogicalField::VehicleId,
        required: true,
        candidates: &[
            "vehiclenumber",
            "vehicleno",
            "regno",
            "vehicleid",
            "registration",
            "currentvehicleno",
        ],
    },
    FieldSpec {
        field: LogicalField::Category,
        required: false,
        candidates: &[
            "class",
            "vehicleclass",
            "type",
            "vehicletype",
            "vehiclecategory",
            "category",
        ],
    },
];

/// 按文件类型取字段表
pub fn field_specs(kind: FileKind) -> &'static [FieldSpec] {
    match kind {
        FileKind::Trips => &TRIP_FIELDS,
        FileKind::Vehicles => &VEHICLE_FIELDS,
    }
}

/// 列名归一化: 小写 + 去除所有非字母数字字符（Unicode）
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// 按候选列名顺序查找表头
///
/// 每个候选依次扫描所有表头（文件顺序），返回第一个命中
pub fn resolve_header<'a, S: AsRef<str>>(headers: &'a [String], candidates: &[S]) -> Option<&'a str> {
    let normalized_headers: Vec<String> = headers.iter().map(|h| normalize(h)).collect();

    candidates
        .iter()
        .map(|c| normalize(c.as_ref()))
        .filter(|c| !c.is_empty())
        .find_map(|candidate| {
            normalized_headers
                .iter()
                .position(|h| *h == candidate)
                .map(|idx| headers[idx].as_str())
        })
}

// ==========================================
// ResolvedSchema - 列名解析结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSchema {
    pub resolution: ColumnResolution,
    pub missing_optional: Vec<LogicalField>, // 未找到的可选字段（字段表顺序）
}

// ==========================================
// SchemaResolver 实现
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaResolver;

impl SchemaResolverTrait for SchemaResolver {
    fn resolve(
        &self,
        table: &RawTable,
        extra_aliases: &AliasTable,
    ) -> ImportResult<ResolvedSchema> {
        let mut resolution = ColumnResolution::new(table.kind);
        let mut missing_optional = Vec::new();

        for spec in field_specs(table.kind) {
            // 内置候选在前，配置别名在后
            let mut candidates: Vec<String> =
                spec.candidates.iter().map(|c| c.to_string()).collect();
            if let Some(extra) = extra_aliases.get(&spec.field) {
                candidates.extend(extra.iter().cloned());
            }

            match resolve_header(&table.headers, &candidates) {
                Some(header) => {
                    debug!(file = %table.kind, field = %spec.field, header = %header, "列名已解析");
                    resolution.insert(spec.field, header.to_string());
                }
                None if spec.required => {
                    return Err(ImportError::MissingRequiredColumn {
                        file: table.kind,
                        field: spec.field,
                        candidates,
                        available: table.headers.clone(),
                    });
                }
                None => {
                    debug!(file = %table.kind, field = %spec.field, "可选列缺失");
                    missing_optional.push(spec.field);
                }
            }
        }

        Ok(ResolvedSchema {
            resolution,
            missing_optional,
        })
    }
}
