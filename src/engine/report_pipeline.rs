// ==========================================
// 车队碳排放报告系统 - 报告流水线编排器
// ==========================================
// 用途: 协调导入、分类、计算各阶段的执行顺序
// 流程: 解析 → 列名解析 → 行程合并 → 车型分类 → (暂停) → 排放计算 → 汇总
// ==========================================
// 状态机: Idle → Running → Completed | Paused(快照) | Failed(原因)
// 暂停期间再次生成会丢弃快照（以最后一次调用为准）
// ==========================================

use crate::config::ReportConfigReader;
use crate::domain::report::{AssumptionNote, PendingClassificationBundle, ReportOutput};
use crate::domain::trip::ConsolidatedTrip;
use crate::domain::types::{DateOrder, FileKind, LogicalField, VehicleCategory};
use crate::engine::assumption_notes::NoteWriter;
use crate::engine::emission_calculator::EmissionCalculator;
use crate::engine::report_summary::ReportSummaryEngine;
use crate::engine::vehicle_classifier::VehicleClassifier;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{CsvParser, CsvSource};
use crate::importer::report_importer_trait::{SchemaResolver, TableParser, TripConsolidator};
use crate::importer::schema_resolver::{field_specs, AliasTable, SchemaResolver as SchemaResolverImpl};
use crate::importer::trip_consolidator::TripConsolidator as TripConsolidatorImpl;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// PipelineSettings - 流水线参数
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub fallback_category: VehicleCategory, // 车型列缺失时的兜底车型
    pub trip_id_prefix: String,
    pub uid_separator: String,
    pub date_order: DateOrder, // 数字日期的日月顺序
    pub extra_aliases: AliasTable,
    pub locale: String, // 假设说明语言
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            fallback_category: VehicleCategory::Hgv,
            trip_id_prefix: "PT".to_string(),
            uid_separator: ", ".to_string(),
            date_order: DateOrder::default(),
            extra_aliases: AliasTable::new(),
            locale: "en".to_string(),
        }
    }
}

impl PipelineSettings {
    /// 从配置读取流水线参数
    pub fn from_config<C: ReportConfigReader + ?Sized>(config: &C) -> ImportResult<Self> {
        let mut extra_aliases = AliasTable::new();
        for kind in [FileKind::Trips, FileKind::Vehicles] {
            for spec in field_specs(kind) {
                let aliases = config.get_extra_aliases(spec.field)?;
                if !aliases.is_empty() {
                    extra_aliases.insert(spec.field, aliases);
                }
            }
        }

        Ok(Self {
            fallback_category: config.get_fallback_category()?,
            trip_id_prefix: config.get_trip_id_prefix()?,
            uid_separator: config.get_uid_separator()?,
            date_order: config.get_date_order()?,
            extra_aliases,
            locale: config.get_locale()?,
        })
    }

    fn calculator(&self) -> EmissionCalculator {
        EmissionCalculator::new(self.trip_id_prefix.clone(), self.uid_separator.clone())
    }

    fn notes(&self) -> NoteWriter {
        NoteWriter::new(self.locale.clone())
    }
}

// ==========================================
// ReportInputs - 两个输入文件
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportInputs {
    pub trips: Option<CsvSource>,
    pub vehicles: Option<CsvSource>,
}

impl ReportInputs {
    pub fn new(trips: CsvSource, vehicles: CsvSource) -> Self {
        Self {
            trips: Some(trips),
            vehicles: Some(vehicles),
        }
    }
}

// ==========================================
// JobState - 流水线状态
// ==========================================
#[derive(Debug, Clone, PartialEq, Default)]
pub enum JobState {
    #[default]
    Idle,
    Running,
    Completed(ReportOutput),
    Paused(PendingClassificationBundle),
    Failed(String),
}

impl JobState {
    pub fn name(&self) -> &'static str {
        match self {
            JobState::Idle => "idle",
            JobState::Running => "running",
            JobState::Completed(_) => "completed",
            JobState::Paused(_) => "paused",
            JobState::Failed(_) => "failed",
        }
    }
}

// ==========================================
// GenerationOutcome - 一次生成调用的结果
// ==========================================
// 暂停不是错误: 返回待人工确认的车辆号
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Completed(ReportOutput),
    Paused { vehicle_ids: Vec<String> },
}

// ==========================================
// ReportPipeline - 报告流水线
// ==========================================
pub struct ReportPipeline {
    settings: PipelineSettings,

    // 导入组件
    table_parser: Box<dyn TableParser>,
    schema_resolver: Box<dyn SchemaResolver>,
    trip_consolidator: Box<dyn TripConsolidator>,

    // 引擎
    classifier: VehicleClassifier,

    state: JobState,
}

impl Default for ReportPipeline {
    fn default() -> Self {
        Self::new(PipelineSettings::default())
    }
}

impl ReportPipeline {
    /// 使用默认导入组件创建流水线
    pub fn new(settings: PipelineSettings) -> Self {
        Self::with_components(
            settings,
            Box::new(CsvParser),
            Box::new(SchemaResolverImpl),
            Box::new(TripConsolidatorImpl::default()),
        )
    }

    /// 指定导入组件创建流水线
    pub fn with_components(
        settings: PipelineSettings,
        table_parser: Box<dyn TableParser>,
        schema_resolver: Box<dyn SchemaResolver>,
        trip_consolidator: Box<dyn TripConsolidator>,
    ) -> Self {
        Self {
            settings,
            table_parser,
            schema_resolver,
            trip_consolidator,
            classifier: VehicleClassifier::new(),
            state: JobState::Idle,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// 更新流水线参数（下一次生成/恢复生效）
    pub fn set_settings(&mut self, settings: PipelineSettings) {
        self.settings = settings;
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    /// 当前待人工确认的快照
    pub fn pending(&self) -> Option<&PendingClassificationBundle> {
        match &self.state {
            JobState::Paused(bundle) => Some(bundle),
            _ => None,
        }
    }

    /// 最近一次成功生成的报告
    pub fn report(&self) -> Option<&ReportOutput> {
        match &self.state {
            JobState::Completed(output) => Some(output),
            _ => None,
        }
    }

    /// 重置: 丢弃报告与暂停快照
    pub fn reset(&mut self) {
        debug!(from = self.state.name(), "流水线已重置");
        self.state = JobState::Idle;
    }

    /// 生成报告
    ///
    /// # 返回
    /// - Ok(Completed): 报告已生成
    /// - Ok(Paused): 有车辆需人工确认车型（快照保存在流水线中）
    /// - Err: 致命错误（流水线进入 Failed，旧报告被清除）
    #[instrument(skip(self, inputs), fields(report_id = tracing::field::Empty))]
    pub fn generate(&mut self, inputs: &ReportInputs) -> ImportResult<GenerationOutcome> {
        // 以最后一次调用为准: 丢弃旧报告与暂停快照
        self.state = JobState::Running;
        info!("开始生成报告");

        match self.run(inputs) {
            Ok(Stage::Done(output)) => {
                tracing::Span::current().record("report_id", output.report_id.as_str());
                self.state = JobState::Completed(output.clone());
                Ok(GenerationOutcome::Completed(output))
            }
            Ok(Stage::AwaitingClassification(bundle)) => {
                let vehicle_ids = bundle.unresolved_vehicle_ids.clone();
                info!(vehicles = ?vehicle_ids, "等待人工确认车型，流水线暂停");
                self.state = JobState::Paused(bundle);
                Ok(GenerationOutcome::Paused { vehicle_ids })
            }
            Err(e) => {
                error!(error = %e, "报告生成失败");
                self.state = JobState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// 提交人工车型并恢复流水线
    ///
    /// # 返回
    /// - Ok(ReportOutput): 报告已生成（快照销毁）
    /// - Err(NoPendingClassification): 当前未暂停
    /// - Err(ClassificationIncomplete): 仍有车辆未确定车型（保持暂停）
    /// - Err(其他): 致命错误（进入 Failed）
    #[instrument(skip(self, manual), fields(vehicles = manual.len()))]
    pub fn supply_classifications(
        &mut self,
        manual: &HashMap<String, VehicleCategory>,
    ) -> ImportResult<ReportOutput> {
        let bundle = match std::mem::take(&mut self.state) {
            JobState::Paused(bundle) => bundle,
            other => {
                self.state = other;
                return Err(ImportError::NoPendingClassification);
            }
        };

        self.state = JobState::Running;
        match resume(&bundle, manual, &self.settings) {
            Ok(output) => {
                self.state = JobState::Completed(output.clone());
                Ok(output)
            }
            Err(e @ ImportError::ClassificationIncomplete { .. }) => {
                warn!(error = %e, "人工分类不完整，保持暂停");
                self.state = JobState::Paused(bundle);
                Err(e)
            }
            Err(e) => {
                error!(error = %e, "恢复流水线失败");
                self.state = JobState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    // 执行第 1 轮（到分类为止）
    fn run(&self, inputs: &ReportInputs) -> ImportResult<Stage> {
        let settings = &self.settings;
        let notes = settings.notes();
        let mut assumption_notes = Vec::new();

        // === 步骤 1: 解析文件 ===
        debug!("步骤 1: 解析文件");
        let trips_source = inputs
            .trips
            .as_ref()
            .ok_or(ImportError::MissingInputFile(FileKind::Trips))?;
        let vehicles_source = inputs
            .vehicles
            .as_ref()
            .ok_or(ImportError::MissingInputFile(FileKind::Vehicles))?;

        let trips_table = self.table_parser.parse(trips_source, FileKind::Trips)?;
        let vehicles_table = self.table_parser.parse(vehicles_source, FileKind::Vehicles)?;
        info!(
            trip_rows = trips_table.len(),
            vehicle_rows = vehicles_table.len(),
            "文件解析完成"
        );

        // === 步骤 2: 列名解析 ===
        debug!("步骤 2: 列名解析");
        let trip_schema = self
            .schema_resolver
            .resolve(&trips_table, &settings.extra_aliases)?;
        let vehicle_schema = self
            .schema_resolver
            .resolve(&vehicles_table, &settings.extra_aliases)?;

        for field in &trip_schema.missing_optional {
            assumption_notes.push(notes.missing_optional_column(FileKind::Trips, *field));
        }
        for field in &vehicle_schema.missing_optional {
            if *field == LogicalField::Category {
                assumption_notes.push(notes.category_column_missing(settings.fallback_category));
            } else {
                assumption_notes.push(notes.missing_optional_column(FileKind::Vehicles, *field));
            }
        }

        // === 步骤 3: 行程合并 ===
        debug!("步骤 3: 行程合并");
        let consolidation = self
            .trip_consolidator
            .consolidate(&trips_table, &trip_schema.resolution, settings.date_order);
        if consolidation.skipped.total() > 0 {
            let date_column = trip_schema
                .resolution
                .header(LogicalField::TripStart)
                .unwrap_or_default();
            assumption_notes.push(notes.skipped_trip_rows(&consolidation.skipped, date_column));
        }

        // === 步骤 4: 车型分类（第 1 轮） ===
        debug!("步骤 4: 车型分类");
        let registry = self
            .classifier
            .build_registry(&vehicles_table, &vehicle_schema.resolution);
        if !registry.duplicate_ids.is_empty() {
            assumption_notes.push(notes.duplicate_registry_entries(registry.duplicate_ids.len()));
        }

        let classification = self.classifier.classify(
            &consolidation.trips,
            &registry,
            settings.fallback_category,
        );

        if classification.needs_manual_input() {
            return Ok(Stage::AwaitingClassification(PendingClassificationBundle {
                trips: consolidation.trips,
                resolved: classification.resolved,
                unresolved_vehicle_ids: classification.unresolved,
                notes: assumption_notes,
            }));
        }

        // === 步骤 5: 排放计算 ===
        finish(
            &consolidation.trips,
            &classification.resolved,
            assumption_notes,
            settings,
        )
        .map(Stage::Done)
    }
}

// 第 1 轮结果
enum Stage {
    Done(ReportOutput),
    AwaitingClassification(PendingClassificationBundle),
}

/// 由暂停快照 + 人工车型生成报告（纯函数，不修改快照）
///
/// # 返回
/// - Ok(ReportOutput): 报告已生成
/// - Err(ClassificationIncomplete): 仍有车辆未确定车型
pub fn resume(
    bundle: &PendingClassificationBundle,
    manual: &HashMap<String, VehicleCategory>,
    settings: &PipelineSettings,
) -> ImportResult<ReportOutput> {
    let classifier = VehicleClassifier::new();
    let resolution = classifier.apply_manual(&bundle.trips, &bundle.resolved, manual)?;

    let mut notes = bundle.notes.clone();
    if resolution.manually_classified > 0 {
        notes.push(
            settings
                .notes()
                .manual_classification_applied(resolution.manually_classified),
        );
    }

    finish(&bundle.trips, &resolution.categories, notes, settings)
}

// 排放计算 + 汇总
fn finish(
    trips: &[ConsolidatedTrip],
    categories: &BTreeMap<String, VehicleCategory>,
    mut notes: Vec<AssumptionNote>,
    settings: &PipelineSettings,
) -> ImportResult<ReportOutput> {
    let calculation = settings.calculator().calculate(trips, categories)?;
    if calculation.dropped_non_finite > 0 {
        notes.push(
            settings
                .notes()
                .non_finite_rows_dropped(calculation.dropped_non_finite),
        );
    }

    let summary = ReportSummaryEngine::new().summarize(&calculation.rows);
    let generated_at: DateTime<Utc> = Utc::now();
    let report_id = Uuid::new_v4().to_string();

    info!(
        report_id = %report_id,
        rows = calculation.rows.len(),
        notes = notes.len(),
        total_emissions_kg = summary.total_emissions_kg,
        "报告生成完成"
    );

    Ok(ReportOutput {
        report_id,
        generated_at,
        rows: calculation.rows,
        notes,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::AssumptionKind;

    const TRIPS: &str = "Vehicle Number,Source,Destination,Distance,Trip Started At\n\
                         V1,A,B,100,2024-01-15 08:00\n\
                         V2,C,D,50,2024-01-15 09:00\n";

    fn inputs(trips: &str, vehicles: &str) -> ReportInputs {
        ReportInputs::new(CsvSource::text(trips), CsvSource::text(vehicles))
    }

    #[test]
    fn test_generate_completes() {
        let mut pipeline = ReportPipeline::default();
        let outcome = pipeline
            .generate(&inputs(TRIPS, "Vehicle No,Class\nV1,HGV\nV2,LGV\n"))
            .unwrap();

        let GenerationOutcome::Completed(output) = outcome else {
            panic!("expected completed report");
        };
        assert_eq!(output.rows.len(), 2);
        assert!(matches!(pipeline.state(), JobState::Completed(_)));
        assert_eq!(pipeline.report().unwrap().report_id, output.report_id);
    }

    #[test]
    fn test_pause_then_resume() {
        let mut pipeline = ReportPipeline::default();
        let outcome = pipeline
            .generate(&inputs(TRIPS, "Vehicle No,Class\nV1,HGV\n"))
            .unwrap();

        assert_eq!(
            outcome,
            GenerationOutcome::Paused {
                vehicle_ids: vec!["V2".to_string()]
            }
        );
        assert!(pipeline.pending().is_some());
        assert!(pipeline.report().is_none());

        // 不完整的输入保持暂停
        let err = pipeline.supply_classifications(&HashMap::new()).unwrap_err();
        assert!(matches!(err, ImportError::ClassificationIncomplete { .. }));
        assert!(pipeline.pending().is_some());

        let manual = HashMap::from([("V2".to_string(), VehicleCategory::Mgv)]);
        let output = pipeline.supply_classifications(&manual).unwrap();
        assert_eq!(output.rows[1].vehicle_category(), VehicleCategory::Mgv);
        assert!(output
            .notes
            .iter()
            .any(|n| n.kind == AssumptionKind::ManualClassificationApplied));
        assert!(pipeline.pending().is_none());
    }

    #[test]
    fn test_supply_without_pause_is_usage_error() {
        let mut pipeline = ReportPipeline::default();
        let err = pipeline.supply_classifications(&HashMap::new()).unwrap_err();
        assert!(matches!(err, ImportError::NoPendingClassification));
        assert_eq!(pipeline.state(), &JobState::Idle);
    }

    #[test]
    fn test_failure_clears_previous_report() {
        let mut pipeline = ReportPipeline::default();
        pipeline
            .generate(&inputs(TRIPS, "Vehicle No,Class\nV1,HGV\nV2,LGV\n"))
            .unwrap();

        let err = pipeline
            .generate(&ReportInputs {
                trips: Some(CsvSource::text(TRIPS)),
                vehicles: None,
            })
            .unwrap_err();
        assert!(matches!(
            err,
            ImportError::MissingInputFile(FileKind::Vehicles)
        ));
        assert!(matches!(pipeline.state(), JobState::Failed(_)));
        assert!(pipeline.report().is_none());
    }

    #[test]
    fn test_generate_while_paused_discards_bundle() {
        let mut pipeline = ReportPipeline::default();
        pipeline
            .generate(&inputs(TRIPS, "Vehicle No,Class\nV1,HGV\n"))
            .unwrap();
        assert!(pipeline.pending().is_some());

        pipeline
            .generate(&inputs(TRIPS, "Vehicle No,Class\nV1,HGV\nV2,HGV\n"))
            .unwrap();
        assert!(pipeline.pending().is_none());
        assert!(pipeline.report().is_some());
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut pipeline = ReportPipeline::default();
        pipeline
            .generate(&inputs(TRIPS, "Vehicle No,Class\nV1,HGV\n"))
            .unwrap();
        pipeline.reset();
        assert_eq!(pipeline.state(), &JobState::Idle);
        assert!(pipeline.pending().is_none());
    }

    #[test]
    fn test_resume_is_pure() {
        let mut pipeline = ReportPipeline::default();
        pipeline
            .generate(&inputs(TRIPS, "Vehicle No,Class\nV1,HGV\n"))
            .unwrap();
        let bundle = pipeline.pending().cloned().unwrap();

        let manual = HashMap::from([("V2".to_string(), VehicleCategory::Lgv)]);
        let first = resume(&bundle, &manual, &PipelineSettings::default()).unwrap();
        let second = resume(&bundle, &manual, &PipelineSettings::default()).unwrap();
        assert_eq!(first.rows, second.rows);
        // 流水线本身仍处于暂停
        assert!(pipeline.pending().is_some());
    }
}
