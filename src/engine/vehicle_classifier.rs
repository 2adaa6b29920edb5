// ==========================================
// 车队碳排放报告系统 - 车型分类引擎
// ==========================================
// 职责: 将行程中的每辆车解析为排放车型
// 第 1 轮: 车辆台账自动识别
// 第 2 轮: 无法识别的车辆交由人工确认（流水线暂停）
// ==========================================

use crate::domain::trip::{ColumnResolution, ConsolidatedTrip, RawTable};
use crate::domain::types::{LogicalField, VehicleCategory};
use crate::importer::error::{ImportError, ImportResult};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, warn};

/// 车辆号紧凑形式: 仅保留字母数字并转大写（"mh-12 ab 1234" → "MH12AB1234"）
pub fn compact_vehicle_id(id: &str) -> String {
    id.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        .collect()
}

// ==========================================
// VehicleRegistry - 车辆台账索引
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct VehicleRegistry {
    exact: HashMap<String, VehicleCategory>,   // TRIM 后的车辆号 → 车型
    compact: HashMap<String, VehicleCategory>, // 紧凑车辆号 → 车型
    pub vehicle_count: usize,                  // 去重后的车辆数
    pub duplicate_ids: Vec<String>,            // 重复登记的车辆号（首次重复顺序）
    pub has_category_column: bool,
}

impl VehicleRegistry {
    /// 查找车型: 先按 TRIM 后的车辆号，再按紧凑形式
    pub fn lookup(&self, vehicle_id: &str) -> Option<VehicleCategory> {
        self.exact
            .get(vehicle_id.trim())
            .or_else(|| self.compact.get(&compact_vehicle_id(vehicle_id)))
            .copied()
    }
}

// ==========================================
// Classification - 第 1 轮分类结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub resolved: BTreeMap<String, VehicleCategory>, // 已识别车辆（行程中的车辆号）
    pub unresolved: Vec<String>,                     // 待人工确认（首次出现顺序）
}

impl Classification {
    pub fn needs_manual_input(&self) -> bool {
        !self.unresolved.is_empty()
    }
}

// ==========================================
// ManualResolution - 人工分类合并结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ManualResolution {
    pub categories: BTreeMap<String, VehicleCategory>,
    pub manually_classified: usize, // 由人工输入决定车型的车辆数
}

// ==========================================
// VehicleClassifier - 车型分类引擎
// ==========================================
// 红线: 无状态引擎
#[derive(Debug, Default, Clone, Copy)]
pub struct VehicleClassifier;

impl VehicleClassifier {
    pub fn new() -> Self {
        Self
    }

    /// 由车辆台账构建索引
    ///
    /// # 规则
    /// - 车辆号为空的行跳过
    /// - 重复车辆号保留首条，记录重复
    /// - 车型列缺失时只记录车辆号
    pub fn build_registry(&self, table: &RawTable, resolution: &ColumnResolution) -> VehicleRegistry {
        let has_category_column = resolution.is_resolved(LogicalField::Category);
        let mut registry = VehicleRegistry {
            has_category_column,
            ..VehicleRegistry::default()
        };
        let mut seen: HashSet<String> = HashSet::new();
        let mut duplicate_set: HashSet<String> = HashSet::new();

        for row in &table.rows {
            let Some(vehicle_id) = row.field(resolution, LogicalField::VehicleId) else {
                debug!(row_number = row.row_number, "台账行车辆号为空，已跳过");
                continue;
            };

            if !seen.insert(vehicle_id.to_string()) {
                warn!(row_number = row.row_number, vehicle_id = %vehicle_id, "车辆重复登记，保留首条");
                if duplicate_set.insert(vehicle_id.to_string()) {
                    registry.duplicate_ids.push(vehicle_id.to_string());
                }
                continue;
            }

            if has_category_column {
                let raw = row.field(resolution, LogicalField::Category).unwrap_or("");
                let category = VehicleCategory::normalize(raw);
                registry.exact.insert(vehicle_id.to_string(), category);
                registry
                    .compact
                    .entry(compact_vehicle_id(vehicle_id))
                    .or_insert(category);
            }
        }

        registry.vehicle_count = seen.len();
        info!(
            vehicles = registry.vehicle_count,
            duplicates = registry.duplicate_ids.len(),
            has_category_column,
            "车辆台账索引完成"
        );
        registry
    }

    /// 第 1 轮: 自动分类
    ///
    /// # 规则
    /// - 车型列缺失: 全部车辆取兜底车型（不暂停）
    /// - 台账中找不到 / 归一化为 UNKNOWN: 待人工确认
    pub fn classify(
        &self,
        trips: &[ConsolidatedTrip],
        registry: &VehicleRegistry,
        fallback: VehicleCategory,
    ) -> Classification {
        let mut resolved = BTreeMap::new();
        let mut unresolved = Vec::new();

        for vehicle_id in unique_vehicle_ids(trips) {
            if !registry.has_category_column {
                resolved.insert(vehicle_id, fallback);
                continue;
            }

            match registry.lookup(&vehicle_id) {
                Some(category) if category.is_known() => {
                    resolved.insert(vehicle_id, category);
                }
                found => {
                    debug!(vehicle_id = %vehicle_id, in_registry = found.is_some(), "车型无法自动识别");
                    unresolved.push(vehicle_id);
                }
            }
        }

        info!(
            resolved = resolved.len(),
            unresolved = unresolved.len(),
            "车型自动分类完成"
        );

        Classification {
            resolved,
            unresolved,
        }
    }

    /// 第 2 轮: 合并人工输入
    ///
    /// # 规则
    /// - 人工输入优先于台账识别结果
    /// - 人工输入按 TRIM 后车辆号匹配，再按紧凑形式匹配
    /// - 多个输入键归一后相同时，按键的字典序取第一个
    /// - 合并后仍有车辆无车型 → ClassificationIncomplete（列出车辆号）
    pub fn apply_manual(
        &self,
        trips: &[ConsolidatedTrip],
        resolved: &BTreeMap<String, VehicleCategory>,
        manual: &HashMap<String, VehicleCategory>,
    ) -> ImportResult<ManualResolution> {
        let sorted: BTreeMap<&str, VehicleCategory> =
            manual.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        let mut exact: HashMap<&str, VehicleCategory> = HashMap::new();
        let mut compact: HashMap<String, VehicleCategory> = HashMap::new();
        for (key, category) in sorted {
            exact.entry(key.trim()).or_insert(category);
            compact.entry(compact_vehicle_id(key)).or_insert(category);
        }

        let mut categories = BTreeMap::new();
        let mut missing = Vec::new();
        let mut manually_classified = 0;

        for vehicle_id in unique_vehicle_ids(trips) {
            let supplied = exact
                .get(vehicle_id.as_str())
                .copied()
                .or_else(|| compact.get(&compact_vehicle_id(&vehicle_id)).copied());

            match (supplied, resolved.get(&vehicle_id)) {
                (Some(category), _) => {
                    manually_classified += 1;
                    categories.insert(vehicle_id, category);
                }
                (None, Some(category)) => {
                    categories.insert(vehicle_id, *category);
                }
                (None, None) => missing.push(vehicle_id),
            }
        }

        if !missing.is_empty() {
            warn!(missing = ?missing, "人工分类后仍有车辆未确定车型");
            return Err(ImportError::ClassificationIncomplete { missing });
        }

        Ok(ManualResolution {
            categories,
            manually_classified,
        })
    }
}

/// 解析人工输入的车型文本
///
/// 与台账归一化规则一致；无法识别的文本（显式 "UNKNOWN" 除外）报 InvalidCategory。
/// 按车辆号字典序处理: 报错的总是序最小的无效项，TRIM 后重复的键取第一个
pub fn parse_manual_categories(
    input: &HashMap<String, String>,
) -> ImportResult<HashMap<String, VehicleCategory>> {
    let sorted: BTreeMap<&String, &String> = input.iter().collect();
    let mut parsed = HashMap::new();

    for (vehicle_id, value) in sorted {
        let category = value
            .parse::<VehicleCategory>()
            .map_err(|_| ImportError::InvalidCategory {
                vehicle_id: vehicle_id.clone(),
                value: value.clone(),
            })?;
        parsed
            .entry(vehicle_id.trim().to_string())
            .or_insert(category);
    }

    Ok(parsed)
}

// 行程中的车辆号（首次出现顺序，去重）
fn unique_vehicle_ids(trips: &[ConsolidatedTrip]) -> Vec<String> {
    let mut seen = HashSet::new();
    trips
        .iter()
        .filter(|t| seen.insert(t.vehicle_id.as_str()))
        .map(|t| t.vehicle_id.clone())
        .collect()
}
