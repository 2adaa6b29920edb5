// ==========================================
// ReportPipeline 集成测试
// ==========================================
// 测试目标: 验证完整的报告流水线（合并、分类、暂停/恢复、假设说明）
// ==========================================


use fleet_carbon_report::engine::{
    resume, GenerationOutcome, JobState, PipelineSettings, ReportInputs, ReportPipeline,
};
use fleet_carbon_report::importer::{CsvSource, ImportError};
use fleet_carbon_report::logging;
use fleet_carbon_report::{
    AssumptionKind, DateOrder, LogicalField, ReportOutput, VehicleCategory,
};
use std::collections::HashMap;
use test_helpers::{csv_text, trips_csv, vehicles_csv, write_temp_csv};

fn inputs(trips: &str, vehicles: &str) -> ReportInputs {
    ReportInputs::new(CsvSource::text(trips), CsvSource::text(vehicles))
}

fn completed(outcome: GenerationOutcome) -> ReportOutput {
    match outcome {
        GenerationOutcome::Completed(output) => output,
        GenerationOutcome::Paused { vehicle_ids } => {
            panic!("Expected completed report, paused on {:?}", vehicle_ids)
        }
    }
}

fn count_notes(output: &ReportOutput, kind: AssumptionKind) -> usize {
    output.notes.iter().filter(|n| n.kind == kind).count()
}

#[test]
fn test_duplicate_legs_merge_into_one_trip() {
    logging::init_test();

    let trips = trips_csv(&[
        &["AS-2", "CN-1", "V1", "A", "B", "100", "2024-01-15 08:00"],
        &["AS-1", "", "V1", "A", "B", "120", "2024-01-15 17:30"],
    ]);
    let vehicles = vehicles_csv(&[("V1", "Heavy")]);

    let mut pipeline = ReportPipeline::default();
    let output = completed(pipeline.generate(&inputs(&trips, &vehicles)).unwrap());

    assert_eq!(output.rows.len(), 1);
    let row = &output.rows[0];
    assert_eq!(row.physical_trip_id(), "PT-0001");
    assert_eq!(row.distance_km(), 120.0);
    assert_eq!(row.vehicle_category(), VehicleCategory::Hgv);
    assert!((row.emissions_kg_co2e() - 120.0 * 1.26).abs() < 1e-9);
    assert_eq!(row.assignment_uids(), "AS-1, AS-2");
    assert_eq!(row.consignment_note_uids(), "CN-1");
    assert_eq!(row.completed_at(), "N/A");
    assert!(matches!(pipeline.state(), JobState::Completed(_)));
}

#[test]
fn test_same_route_on_different_days_stays_separate() {
    let trips = trips_csv(&[
        &["AS-1", "", "V1", "A", "B", "100", "2024-01-15 08:00"],
        &["AS-2", "", "V1", "A", "B", "90", "2024-01-16 08:00"],
        &["AS-3", "", "V1", "B", "A", "80", "2024-01-15 20:00"],
    ]);
    let vehicles = vehicles_csv(&[("V1", "LGV")]);

    let output = completed(
        ReportPipeline::default()
            .generate(&inputs(&trips, &vehicles))
            .unwrap(),
    );

    let ids: Vec<&str> = output.rows.iter().map(|r| r.physical_trip_id()).collect();
    assert_eq!(ids, vec!["PT-0001", "PT-0002", "PT-0003"]);
    assert_eq!(output.summary.total_trips, 3);
    assert!((output.summary.total_distance_km - 270.0).abs() < 1e-9);
}

#[test]
fn test_regeneration_is_idempotent() {
    let trips = trips_csv(&[
        &["AS-1", "", "V1", "A", "B", "100", "2024-01-15 08:00"],
        &["AS-2", "", "V2", "C", "D", "50", "2024-01-15 09:00"],
        &["AS-3", "", "V1", "A", "B", "110", "2024-01-15 10:00"],
    ]);
    let vehicles = vehicles_csv(&[("V1", "HGV"), ("V2", "Medium Goods Vehicle")]);
    let files = inputs(&trips, &vehicles);

    let mut pipeline = ReportPipeline::default();
    let first = completed(pipeline.generate(&files).unwrap());
    let second = completed(pipeline.generate(&files).unwrap());

    assert_eq!(first.rows, second.rows);
    assert_eq!(first.notes, second.notes);
    assert_ne!(first.report_id, second.report_id);
}

#[test]
fn test_column_order_does_not_matter() {
    let vehicles = vehicles_csv(&[("V1", "HGV")]);
    let ordered = trips_csv(&[&["AS-1", "", "V1", "A", "B", "100", "2024-01-15 08:00"]]);
    let shuffled = csv_text(
        &[
            "Trip Started At",
            "Destination",
            "Running Distance",
            "Vehicle No.",
            "Consignment Note UID",
            "Source",
            "Assignment UID",
        ],
        &[&["2024-01-15 08:00", "B", "100", "V1", "", "A", "AS-1"]],
    );

    let mut pipeline = ReportPipeline::default();
    let a = completed(pipeline.generate(&inputs(&ordered, &vehicles)).unwrap());
    let b = completed(pipeline.generate(&inputs(&shuffled, &vehicles)).unwrap());
    assert_eq!(a.rows, b.rows);
}

#[test]
fn test_missing_category_column_uses_fallback_with_one_note() {
    let trips = trips_csv(&[
        &["AS-1", "", "V1", "A", "B", "100", "2024-01-15 08:00"],
        &["AS-2", "", "V2", "A", "C", "10", "2024-01-15 08:00"],
    ]);
    let vehicles = csv_text(&["Vehicle No.", "Model"], &[&["V1", "Tata"], &["V2", "Eicher"]]);

    let mut pipeline = ReportPipeline::default();
    let output = completed(pipeline.generate(&inputs(&trips, &vehicles)).unwrap());

    assert_eq!(output.rows.len(), 2);
    assert!(output
        .rows
        .iter()
        .all(|r| r.vehicle_category() == VehicleCategory::Hgv));
    assert_eq!(count_notes(&output, AssumptionKind::CategoryColumnMissing), 1);
}

#[test]
fn test_configured_fallback_category() {
    let trips = trips_csv(&[&["AS-1", "", "V1", "A", "B", "100", "2024-01-15 08:00"]]);
    let vehicles = csv_text(&["Vehicle No."], &[&["V1"]]);

    let settings = PipelineSettings {
        fallback_category: VehicleCategory::Mgv,
        ..PipelineSettings::default()
    };
    let output = completed(
        ReportPipeline::new(settings)
            .generate(&inputs(&trips, &vehicles))
            .unwrap(),
    );
    assert_eq!(output.rows[0].vehicle_category(), VehicleCategory::Mgv);
    assert_eq!(output.rows[0].emission_factor(), 0.42);
}

#[test]
fn test_pause_then_resume_with_manual_category() {
    let trips = trips_csv(&[
        &["AS-1", "", "V1", "A", "B", "100", "2024-01-15 08:00"],
        &["AS-2", "", "V2", "A", "B", "50", "2024-01-15 08:00"],
    ]);
    let vehicles = vehicles_csv(&[("V1", "HGV"), ("V2", "Tractor")]);

    let mut pipeline = ReportPipeline::default();
    let outcome = pipeline.generate(&inputs(&trips, &vehicles)).unwrap();
    assert_eq!(
        outcome,
        GenerationOutcome::Paused {
            vehicle_ids: vec!["V2".to_string()]
        }
    );
    assert!(pipeline.report().is_none());

    // 缺少车型 → 保持暂停
    let err = pipeline.supply_classifications(&HashMap::new()).unwrap_err();
    assert!(matches!(err, ImportError::ClassificationIncomplete { .. }));
    assert!(pipeline.pending().is_some());

    let manual = HashMap::from([("V2".to_string(), VehicleCategory::Lgv)]);
    let output = pipeline.supply_classifications(&manual).unwrap();

    assert_eq!(output.rows.len(), 2);
    assert_eq!(output.rows[1].vehicle_category(), VehicleCategory::Lgv);
    assert!((output.rows[1].emissions_kg_co2e() - 17.0).abs() < 1e-9);
    assert_eq!(
        count_notes(&output, AssumptionKind::ManualClassificationApplied),
        1
    );
    assert!(pipeline.pending().is_none());
    assert!(matches!(
        pipeline.supply_classifications(&manual),
        Err(ImportError::NoPendingClassification)
    ));
}

#[test]
fn test_vehicle_missing_from_registry_pauses() {
    let trips = trips_csv(&[&["AS-1", "", "V9", "A", "B", "100", "2024-01-15 08:00"]]);
    let vehicles = vehicles_csv(&[("V1", "HGV")]);

    let mut pipeline = ReportPipeline::default();
    let outcome = pipeline.generate(&inputs(&trips, &vehicles)).unwrap();
    assert_eq!(
        outcome,
        GenerationOutcome::Paused {
            vehicle_ids: vec!["V9".to_string()]
        }
    );
}

#[test]
fn test_pure_resume_leaves_bundle_untouched() {
    let trips = trips_csv(&[&["AS-1", "", "V2", "A", "B", "50", "2024-01-15 08:00"]]);
    let vehicles = vehicles_csv(&[("V2", "")]);

    let mut pipeline = ReportPipeline::default();
    pipeline.generate(&inputs(&trips, &vehicles)).unwrap();
    let bundle = pipeline.pending().cloned().expect("pipeline should be paused");

    let manual = HashMap::from([("V2".to_string(), VehicleCategory::Unknown)]);
    let output = resume(&bundle, &manual, pipeline.settings()).unwrap();
    assert_eq!(output.rows[0].emission_factor(), 0.5);
    assert_eq!(pipeline.pending(), Some(&bundle));
}

#[test]
fn test_new_generate_while_paused_discards_bundle() {
    let trips = trips_csv(&[&["AS-1", "", "V2", "A", "B", "50", "2024-01-15 08:00"]]);
    let unknown = vehicles_csv(&[("V2", "Tractor")]);
    let known = vehicles_csv(&[("V2", "MGV")]);

    let mut pipeline = ReportPipeline::default();
    pipeline.generate(&inputs(&trips, &unknown)).unwrap();
    assert!(pipeline.pending().is_some());

    completed(pipeline.generate(&inputs(&trips, &known)).unwrap());
    assert!(pipeline.pending().is_none());
}

#[test]
fn test_unparsable_timestamp_drops_row_with_one_note() {
    let trips = trips_csv(&[
        &["AS-1", "", "V1", "A", "B", "100", "N/A"],
        &["AS-2", "", "V1", "A", "C", "40", "2024-01-15 08:00"],
    ]);
    let vehicles = vehicles_csv(&[("V1", "LGV")]);

    let output = completed(
        ReportPipeline::default()
            .generate(&inputs(&trips, &vehicles))
            .unwrap(),
    );

    assert_eq!(output.rows.len(), 1);
    assert_eq!(output.rows[0].destination(), "C");
    assert_eq!(count_notes(&output, AssumptionKind::SkippedTripRows), 1);
}

#[test]
fn test_missing_optional_columns_produce_notes() {
    let trips = trips_csv(&[&["AS-1", "", "V1", "A", "B", "100", "2024-01-15 08:00"]]);
    let trips_without_uids = csv_text(
        &["Vehicle No.", "Source", "Destination", "Distance", "Trip Start"],
        &[&["V1", "A", "B", "100", "2024-01-15"]],
    );
    let vehicles = vehicles_csv(&[("V1", "LGV")]);

    let mut pipeline = ReportPipeline::default();
    let with_uids = completed(pipeline.generate(&inputs(&trips, &vehicles)).unwrap());
    let without = completed(
        pipeline
            .generate(&inputs(&trips_without_uids, &vehicles))
            .unwrap(),
    );

    // 仅缺完成时间列
    assert_eq!(count_notes(&with_uids, AssumptionKind::MissingOptionalColumn), 1);
    // 缺派车单、托运单、完成时间三列
    assert_eq!(count_notes(&without, AssumptionKind::MissingOptionalColumn), 3);
    assert_eq!(without.rows[0].assignment_uids(), "");
}

#[test]
fn test_missing_required_column_fails_job() {
    let trips = csv_text(
        &["Vehicle No.", "Source", "Destination", "Trip Started At"],
        &[&["V1", "A", "B", "2024-01-15 08:00"]],
    );
    let vehicles = vehicles_csv(&[("V1", "LGV")]);

    let mut pipeline = ReportPipeline::default();
    let err = pipeline.generate(&inputs(&trips, &vehicles)).unwrap_err();

    match err {
        ImportError::MissingRequiredColumn {
            field, available, ..
        } => {
            assert_eq!(field, LogicalField::Distance);
            assert!(available.contains(&"Trip Started At".to_string()));
        }
        other => panic!("Expected MissingRequiredColumn, got {:?}", other),
    }
    assert!(matches!(pipeline.state(), JobState::Failed(_)));
}

#[test]
fn test_failure_clears_previous_report() {
    let trips = trips_csv(&[&["AS-1", "", "V1", "A", "B", "100", "2024-01-15 08:00"]]);
    let vehicles = vehicles_csv(&[("V1", "LGV")]);

    let mut pipeline = ReportPipeline::default();
    completed(pipeline.generate(&inputs(&trips, &vehicles)).unwrap());
    assert!(pipeline.report().is_some());

    let empty = ReportInputs::new(CsvSource::text(""), CsvSource::text(vehicles.clone()));
    assert!(matches!(
        pipeline.generate(&empty),
        Err(ImportError::EmptyFile { .. })
    ));
    assert!(pipeline.report().is_none());
}

#[test]
fn test_generate_from_files_on_disk() {
    let trips = write_temp_csv(&trips_csv(&[&[
        "AS-1",
        "",
        "V1",
        "A",
        "B",
        "100 km",
        "15/01/2024 08:00",
    ]]))
    .unwrap();
    let vehicles = write_temp_csv(&vehicles_csv(&[("V1", "light goods vehicle")])).unwrap();

    let files = ReportInputs::new(CsvSource::path(trips.path()), CsvSource::path(vehicles.path()));
    let output = completed(ReportPipeline::default().generate(&files).unwrap());
    assert_eq!(output.rows[0].distance_km(), 100.0);
    assert_eq!(output.rows[0].vehicle_category(), VehicleCategory::Lgv);
}

#[test]
fn test_missing_file_on_disk_fails() {
    let files = ReportInputs::new(
        CsvSource::path("/nonexistent/trips.csv"),
        CsvSource::text(vehicles_csv(&[("V1", "LGV")])),
    );
    let mut pipeline = ReportPipeline::default();
    assert!(matches!(
        pipeline.generate(&files),
        Err(ImportError::FileNotFound(_))
    ));
}

#[test]
fn test_invalid_utf8_cell_keeps_the_row() {
    let mut trips = trips_csv(&[&["AS-1", "", "V1", "Pune", "Goa", "100", "2024-01-15 08:00"]])
        .into_bytes();
    trips.extend_from_slice(b"AS-2,,V1,S\xE3o Paulo,Rio,50,2024-01-15 09:00\n");
    let vehicles = vehicles_csv(&[("V1", "LGV")]);

    let files = ReportInputs::new(CsvSource::Bytes(trips), CsvSource::text(vehicles));
    let output = completed(ReportPipeline::default().generate(&files).unwrap());

    assert_eq!(output.rows.len(), 2);
    assert_eq!(output.rows[1].source(), "S\u{FFFD}o Paulo");
    assert_eq!(count_notes(&output, AssumptionKind::SkippedTripRows), 0);
}

#[test]
fn test_us_and_month_name_dates_merge_into_one_trip() {
    let trips = trips_csv(&[
        &["AS-1", "", "V1", "A", "B", "100", "01/15/2024 08:00"],
        &["AS-2", "", "V1", "A", "B", "110", "2024-01-15T08:00:00.000Z"],
        &["AS-3", "", "V1", "A", "B", "90", "Jan 15 2024 08:00"],
    ]);
    let vehicles = vehicles_csv(&[("V1", "HGV")]);

    let output = completed(
        ReportPipeline::default()
            .generate(&inputs(&trips, &vehicles))
            .unwrap(),
    );

    assert_eq!(output.rows.len(), 1);
    assert_eq!(output.rows[0].distance_km(), 110.0);
    assert_eq!(output.rows[0].assignment_uids(), "AS-1, AS-2, AS-3");
    assert_eq!(count_notes(&output, AssumptionKind::SkippedTripRows), 0);
}

#[test]
fn test_date_order_setting_decides_ambiguous_dates() {
    let trips = trips_csv(&[
        &["AS-1", "", "V1", "A", "B", "100", "05/01/2024 08:00"],
        &["AS-2", "", "V1", "A", "B", "100", "2024-05-01 18:00"],
    ]);
    let vehicles = vehicles_csv(&[("V1", "HGV")]);
    let files = inputs(&trips, &vehicles);

    // 默认月在前: 两行同为 5 月 1 日
    let mdy = completed(ReportPipeline::default().generate(&files).unwrap());
    assert_eq!(mdy.rows.len(), 1);

    let settings = PipelineSettings {
        date_order: DateOrder::Dmy,
        ..PipelineSettings::default()
    };
    let dmy = completed(ReportPipeline::new(settings).generate(&files).unwrap());
    assert_eq!(dmy.rows.len(), 2);
}
