// ==========================================
// 车队碳排放报告系统 - 报告 API
// ==========================================
// 职责: 调用方门面（上传 / 生成 / 人工车型 / 重置 / 导出）
// 错误: ImportError → ApiError，文案由 ApiError::user_message 翻译
// ==========================================

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::report::ReportOutput;
use crate::engine::report_pipeline::{
    GenerationOutcome, PipelineSettings, ReportInputs, ReportPipeline,
};
use crate::engine::vehicle_classifier::parse_manual_categories;
use crate::exporter::{self, TemplateKind};
use crate::importer::file_parser::CsvSource;

/// 生成/恢复调用的响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReportResponse {
    /// 报告已生成
    Completed { report: ReportOutput },
    /// 等待人工确认车型
    Paused { vehicle_ids: Vec<String> },
}

impl ReportResponse {
    pub fn report(&self) -> Option<&ReportOutput> {
        match self {
            ReportResponse::Completed { report } => Some(report),
            ReportResponse::Paused { .. } => None,
        }
    }
}

impl From<GenerationOutcome> for ReportResponse {
    fn from(outcome: GenerationOutcome) -> Self {
        match outcome {
            GenerationOutcome::Completed(report) => ReportResponse::Completed { report },
            GenerationOutcome::Paused { vehicle_ids } => ReportResponse::Paused { vehicle_ids },
        }
    }
}

// ==========================================
// ReportApi - 报告 API
// ==========================================

/// 报告API
///
/// 职责：
/// 1. 保存上传的两个输入文件
/// 2. 驱动流水线（生成、人工车型恢复、重置）
/// 3. 导出报告 / 单车统计 / 上传模板
pub struct ReportApi {
    config_manager: Arc<ConfigManager>,
    pipeline: ReportPipeline,
    inputs: ReportInputs,
}

impl ReportApi {
    /// 创建新的ReportApi实例（流水线参数取自配置）
    pub fn new(config_manager: Arc<ConfigManager>) -> ApiResult<Self> {
        let settings = PipelineSettings::from_config(config_manager.as_ref())?;
        Ok(Self {
            config_manager,
            pipeline: ReportPipeline::new(settings),
            inputs: ReportInputs::default(),
        })
    }

    /// 当前文案语言
    pub fn locale(&self) -> &str {
        &self.pipeline.settings().locale
    }

    pub fn config_manager(&self) -> &ConfigManager {
        &self.config_manager
    }

    /// 更新配置项并刷新流水线参数
    ///
    /// # 返回
    /// - Err(InvalidConfig): 值无效（配置不变）
    pub fn update_config(&mut self, key: &str, value: &str) -> ApiResult<()> {
        self.config_manager.set_config_value(key, value)?;
        let settings = PipelineSettings::from_config(self.config_manager.as_ref())?;
        self.pipeline.set_settings(settings);
        info!(key = %key, value = %value, "配置已更新");
        Ok(())
    }

    /// 上传行程文件（丢弃当前报告与暂停快照）
    pub fn upload_trips(&mut self, source: CsvSource) {
        self.inputs.trips = Some(source);
        self.pipeline.reset();
        info!("行程文件已上传");
    }

    /// 上传车辆文件（丢弃当前报告与暂停快照）
    pub fn upload_vehicles(&mut self, source: CsvSource) {
        self.inputs.vehicles = Some(source);
        self.pipeline.reset();
        info!("车辆文件已上传");
    }

    /// 生成报告
    ///
    /// # 返回
    /// - Ok(Completed): 报告
    /// - Ok(Paused): 需人工确认车型的车辆号
    /// - Err(ApiError): 致命错误（旧报告已清除）
    pub fn generate_report(&mut self) -> ApiResult<ReportResponse> {
        let outcome = self.pipeline.generate(&self.inputs)?;
        Ok(outcome.into())
    }

    /// 提交人工车型（车辆号 → 车型文本）
    ///
    /// # 返回
    /// - Ok(Completed): 报告
    /// - Err(InvalidCategory): 车型文本无法识别（保持暂停）
    /// - Err(ClassificationIncomplete): 仍有车辆未确定（保持暂停）
    /// - Err(NoPendingClassification): 当前未暂停
    pub fn supply_classifications(
        &mut self,
        input: &HashMap<String, String>,
    ) -> ApiResult<ReportResponse> {
        if self.pipeline.pending().is_none() {
            return Err(ApiError::NoPendingClassification);
        }

        let manual = parse_manual_categories(input).map_err(|e| {
            warn!(error = %e, "人工车型无法识别");
            ApiError::from(e)
        })?;
        let report = self.pipeline.supply_classifications(&manual)?;
        Ok(ReportResponse::Completed { report })
    }

    /// 当前等待人工确认的车辆号
    pub fn pending_vehicle_ids(&self) -> Vec<String> {
        self.pipeline
            .pending()
            .map(|bundle| bundle.unresolved_vehicle_ids.clone())
            .unwrap_or_default()
    }

    /// 最近一次生成的报告
    pub fn report(&self) -> Option<&ReportOutput> {
        self.pipeline.report()
    }

    /// 流水线状态名（idle / running / completed / paused / failed）
    pub fn state_name(&self) -> &'static str {
        self.pipeline.state().name()
    }

    /// 重置: 清除上传文件、报告与暂停快照
    pub fn reset(&mut self) {
        self.inputs = ReportInputs::default();
        self.pipeline.reset();
        info!("报告已重置");
    }

    /// 导出报告 CSV
    pub fn export_report_csv(&self) -> ApiResult<String> {
        let report = self.report().ok_or(ApiError::NoReport)?;
        Ok(exporter::export_report_csv(&report.rows)?)
    }

    /// 导出单车统计 CSV
    pub fn export_vehicle_summary_csv(&self) -> ApiResult<String> {
        let report = self.report().ok_or(ApiError::NoReport)?;
        Ok(exporter::export_vehicle_summary_csv(&report.summary.vehicles)?)
    }

    /// 上传模板 CSV
    pub fn template(&self, kind: TemplateKind) -> ApiResult<String> {
        Ok(exporter::template_csv(kind)?)
    }

    /// 错误文案（当前语言）
    pub fn describe_error(&self, err: &ApiError) -> String {
        err.user_message(self.locale())
    }
}
