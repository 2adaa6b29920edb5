// ==========================================
// 车队碳排放报告系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: 内存 key-value（可从 JSON 快照 / 文件恢复）
// ==========================================

use crate::config::report_config_trait::ReportConfigReader;
use crate::domain::types::{DateOrder, LogicalField, VehicleCategory};
use crate::i18n;
use crate::importer::error::{ImportError, ImportResult};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug)]
pub struct ConfigManager {
    values: Mutex<BTreeMap<String, String>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例（默认配置）
    pub fn new() -> Self {
        let values = config_keys::DEFAULTS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Self {
            values: Mutex::new(values),
        }
    }

    /// 从配置快照创建（未出现的键取默认值）
    pub fn from_snapshot(snapshot_json: &str) -> ImportResult<Self> {
        let manager = Self::new();
        manager.restore_config_from_snapshot(snapshot_json)?;
        Ok(manager)
    }

    /// 从 JSON 配置文件加载
    ///
    /// # 文件格式
    /// ```json
    /// { "fallback_category": "HGV", "alias.distance": "km_run,odometer" }
    /// ```
    pub fn load_from_file(path: &Path) -> ImportResult<Self> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let manager = Self::from_snapshot(&content)?;
        info!(path = %path.display(), "配置文件已加载");
        Ok(manager)
    }

    /// 默认配置文件路径（平台配置目录下）
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(config_keys::APP_DIR).join("config.json"))
    }

    fn lock(&self) -> ImportResult<MutexGuard<'_, BTreeMap<String, String>>> {
        self.values
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))
    }

    /// 读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> ImportResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    /// 读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ImportResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入配置值（写入前校验）
    pub fn set_config_value(&self, key: &str, value: &str) -> ImportResult<()> {
        validate_value(key, value)?;
        debug!(key = %key, value = %value, "配置已更新");
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式，键有序）
    pub fn get_config_snapshot(&self) -> ImportResult<String> {
        let values = self.lock()?;
        serde_json::to_string(&*values).map_err(|e| ImportError::ConfigReadError {
            key: "*".to_string(),
            message: e.to_string(),
        })
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    ///
    /// # 注意
    /// - 覆盖同名配置；以 __meta_ 开头的键忽略
    /// - 任一值校验失败则整体不生效
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> ImportResult<usize> {
        let config_map: HashMap<String, String> =
            serde_json::from_str(snapshot_json).map_err(|e| ImportError::ConfigReadError {
                key: "*".to_string(),
                message: e.to_string(),
            })?;

        let entries: Vec<(String, String)> = config_map
            .into_iter()
            .filter(|(key, _)| !key.starts_with("__meta_"))
            .collect();

        for (key, value) in &entries {
            validate_value(key, value)?;
        }

        let mut values = self.lock()?;
        let count = entries.len();
        values.extend(entries);

        Ok(count)
    }
}

// 已知键的取值校验；未知键（含别名）不校验
fn validate_value(key: &str, value: &str) -> ImportResult<()> {
    let invalid = |message: &str| ImportError::ConfigValueError {
        key: key.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    };

    match key {
        config_keys::FALLBACK_CATEGORY => parse_fallback_category(value)
            .map(|_| ())
            .map_err(|_| invalid("必须为 LGV / MGV / HGV")),
        config_keys::TRIP_ID_PREFIX if value.trim().is_empty() => Err(invalid("前缀不能为空")),
        config_keys::UID_SEPARATOR if value.is_empty() => Err(invalid("分隔符不能为空")),
        config_keys::DATE_ORDER => value
            .parse::<DateOrder>()
            .map(|_| ())
            .map_err(|_| invalid("必须为 mdy / dmy")),
        config_keys::LOCALE if !i18n::is_supported(value.trim()) => {
            Err(invalid("仅支持 en / zh-CN"))
        }
        _ => Ok(()),
    }
}

// 兜底车型必须为已知车型
fn parse_fallback_category(value: &str) -> Result<VehicleCategory, String> {
    match value.parse::<VehicleCategory>()? {
        VehicleCategory::Unknown => Err(value.to_string()),
        category => Ok(category),
    }
}

// ==========================================
// ReportConfigReader Trait 实现
// ==========================================
impl ReportConfigReader for ConfigManager {
    fn get_fallback_category(&self) -> ImportResult<VehicleCategory> {
        let value = self.get_config_or_default(config_keys::FALLBACK_CATEGORY, "HGV")?;
        parse_fallback_category(&value).map_err(|_| ImportError::ConfigValueError {
            key: config_keys::FALLBACK_CATEGORY.to_string(),
            value,
            message: "必须为 LGV / MGV / HGV".to_string(),
        })
    }

    fn get_trip_id_prefix(&self) -> ImportResult<String> {
        let value = self.get_config_or_default(config_keys::TRIP_ID_PREFIX, "PT")?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Ok("PT".to_string())
        } else {
            Ok(trimmed.to_string())
        }
    }

    fn get_uid_separator(&self) -> ImportResult<String> {
        let value = self.get_config_or_default(config_keys::UID_SEPARATOR, ", ")?;
        if value.is_empty() {
            Ok(", ".to_string())
        } else {
            Ok(value)
        }
    }

    fn get_date_order(&self) -> ImportResult<DateOrder> {
        let value = self.get_config_or_default(config_keys::DATE_ORDER, "mdy")?;
        value.parse().map_err(|_| ImportError::ConfigValueError {
            key: config_keys::DATE_ORDER.to_string(),
            value,
            message: "必须为 mdy / dmy".to_string(),
        })
    }

    fn get_extra_aliases(&self, field: LogicalField) -> ImportResult<Vec<String>> {
        let value = self.get_config_or_default(&config_keys::alias_key(field), "")?;

        Ok(value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }

    fn get_locale(&self) -> ImportResult<String> {
        let value = self.get_config_or_default(config_keys::LOCALE, "en")?;
        let trimmed = value.trim();
        if i18n::is_supported(trimmed) {
            Ok(trimmed.to_string())
        } else {
            Err(ImportError::ConfigValueError {
                key: config_keys::LOCALE.to_string(),
                value: value.clone(),
                message: "仅支持 en / zh-CN".to_string(),
            })
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    use crate::domain::types::LogicalField;

    // 配置目录名
    pub const APP_DIR: &str = "fleet-carbon-report";

    // 车型
    pub const FALLBACK_CATEGORY: &str = "fallback_category"; // 车型列缺失时的兜底车型

    // 报告格式
    pub const TRIP_ID_PREFIX: &str = "trip_id_prefix";
    pub const UID_SEPARATOR: &str = "uid_separator";

    // 时间解析
    pub const DATE_ORDER: &str = "date_order"; // mdy | dmy

    // 语言
    pub const LOCALE: &str = "locale";

    // 列名别名: alias.<field>
    pub const ALIAS_PREFIX: &str = "alias.";

    pub fn alias_key(field: LogicalField) -> String {
        format!("{}{}", ALIAS_PREFIX, field.key())
    }

    // 默认值
    pub const DEFAULTS: [(&str, &str); 5] = [
        (FALLBACK_CATEGORY, "HGV"),
        (TRIP_ID_PREFIX, "PT"),
        (UID_SEPARATOR, ", "),
        (DATE_ORDER, "mdy"),
        (LOCALE, "en"),
    ];
}
