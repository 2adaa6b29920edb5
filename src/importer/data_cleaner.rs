// ==========================================
// 车队碳排放报告系统 - 数据清洗器实现
// ==========================================
// 阶段 2: 值级清洗
// 职责: TRIM / NULL 标准化 / 里程解析 / 时间戳解析
// ==========================================

use crate::domain::types::DateOrder;
use crate::importer::report_importer_trait::DataCleaner as DataCleanerTrait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

// 一组时间格式: 带时间的格式 + 仅日期的格式（时间取 00:00:00）
// %.f 可匹配空的小数秒；%b 同时接受月份缩写与全称
struct FormatSet {
    datetime: &'static [&'static str],
    date: &'static [&'static str],
}

// 年在前: 无日月歧义
const YEAR_FIRST: FormatSet = FormatSet {
    datetime: &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y/%m/%d %H:%M:%S%.f",
        "%Y/%m/%d %H:%M",
    ],
    date: &["%Y-%m-%d", "%Y/%m/%d"],
};

const DAY_FIRST: FormatSet = FormatSet {
    datetime: &[
        "%d/%m/%Y %H:%M:%S%.f",
        "%d/%m/%Y %H:%M",
        "%d-%m-%Y %H:%M:%S%.f",
        "%d-%m-%Y %H:%M",
    ],
    date: &["%d/%m/%Y", "%d-%m-%Y"],
};

const MONTH_FIRST: FormatSet = FormatSet {
    datetime: &[
        "%m/%d/%Y %H:%M:%S%.f",
        "%m/%d/%Y %H:%M",
        "%m-%d-%Y %H:%M:%S%.f",
        "%m-%d-%Y %H:%M",
    ],
    date: &["%m/%d/%Y", "%m-%d-%Y"],
};

// 英文月份名: Jan 15 2024 / January 15, 2024 / 15 Jan 2024
const MONTH_NAME: FormatSet = FormatSet {
    datetime: &[
        "%b %d %Y %H:%M:%S%.f",
        "%b %d %Y %H:%M",
        "%b %d, %Y %H:%M:%S%.f",
        "%b %d, %Y %H:%M",
        "%d %b %Y %H:%M:%S%.f",
        "%d %b %Y %H:%M",
    ],
    date: &["%b %d %Y", "%b %d, %Y", "%d %b %Y"],
};

fn numeric_formats(order: DateOrder) -> &'static FormatSet {
    match order {
        DateOrder::Dmy => &DAY_FIRST,
        DateOrder::Mdy => &MONTH_FIRST,
    }
}

impl FormatSet {
    fn parse(&self, value: &str) -> Option<NaiveDateTime> {
        self.datetime
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
            .or_else(|| {
                self.date
                    .iter()
                    .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                    .map(|d| d.and_time(NaiveTime::MIN))
            })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DataCleaner;

impl DataCleanerTrait for DataCleaner {
    fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    fn parse_distance(&self, value: &str) -> Option<f64> {
        let trimmed = value.trim();
        // 允许末尾单位 km（不区分大小写）
        let number = match trimmed.len().checked_sub(2) {
            Some(split)
                if trimmed.is_char_boundary(split)
                    && trimmed[split..].eq_ignore_ascii_case("km") =>
            {
                trimmed[..split].trim_end()
            }
            _ => trimmed,
        };

        number
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d >= 0.0)
    }

    fn parse_timestamp(&self, value: &str, date_order: DateOrder) -> Option<NaiveDateTime> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }

        // RFC 3339: 保留原始本地时间（不换算时区）
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(dt.naive_local());
        }

        // 数字日期先按配置的日月顺序，失败再按另一顺序（15/01/2024 只能是日在前）
        YEAR_FIRST
            .parse(trimmed)
            .or_else(|| numeric_formats(date_order).parse(trimmed))
            .or_else(|| numeric_formats(date_order.other()).parse(trimmed))
            .or_else(|| MONTH_NAME.parse(trimmed))
    }
}
