use battery_health_rater::cache::ManualClock;
use battery_health_rater::config::RaterConfig;
use battery_health_rater::fleet::{aggregate, types::Reliability};
use battery_health_rater::metrics::VehicleClass;
use battery_health_rater::output::write_scores;
use battery_health_rater::report::{DatasetSource, FleetReport, statistics_key};
use battery_health_rater::repository::{export_files, load_paths};
use battery_health_rater::scoring::{Factor, score};
use chrono::{DateTime, TimeZone, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixtures() -> Vec<PathBuf> {
    export_files(&fixtures_dir()).expect("fixtures directory should list")
}

fn eval_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
}

fn report() -> (FleetReport<Arc<ManualClock>>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(eval_time()));
    let report = FleetReport::with_clock(RaterConfig::default(), clock.clone())
        .with_source(DatasetSource::Files(fixtures()));
    (report, clock)
}

#[test]
fn test_fixture_listing_is_sorted() {
    let names: Vec<String> = fixtures()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec!["registry_a.csv", "registry_b.csv", "registry_c.csv.gz"]
    );
}

#[test]
fn test_full_pipeline_merges_sources() {
    let records = load_paths(&fixtures());
    let ids: Vec<&str> = records.iter().map(|r| r.vehicle_id.as_str()).collect();
    assert_eq!(ids, vec!["A001", "A002", "A003", "A004", "B001", "C001"]);

    // A001 appears again in registry_b with an EV9 label; the first copy wins
    let a001 = &records[0];
    assert_eq!(a001.vehicle_class_raw.as_deref(), Some("IONIQ 5"));
    assert_eq!(a001.vehicle_class, VehicleClass::Midsize);
    assert_eq!(a001.efficiency, Some(6.2));

    let a003 = &records[2];
    assert_eq!(a003.vehicle_class, VehicleClass::Premium);
    assert_eq!(a003.model_year, None);
    assert_eq!(a003.model_month, None);

    let a004 = &records[3];
    assert_eq!(a004.model_year, Some(2024));
    assert_eq!(a004.efficiency, None);

    assert_eq!(records[4].vehicle_class, VehicleClass::Large);
    assert_eq!(records[5].vehicle_class, VehicleClass::Compact);
}

#[test]
fn test_full_pipeline_scores_and_aggregates() {
    let records = load_paths(&fixtures());
    let results: Vec<_> = records.iter().map(|r| score(r, eval_time())).collect();

    for result in &results {
        assert!((0.0..=98.0).contains(&result.final_score));
    }

    // C001 carries no telemetry: only the driving and charging defaults count
    let c001 = results.iter().find(|r| r.vehicle_id == "C001").unwrap();
    assert!((c001.weighted_avg - 26.67).abs() < 0.01);
    assert!(c001.scores.get(Factor::Efficiency).is_none());

    let stats = aggregate(&results, None).unwrap();
    assert_eq!(stats.vehicle_count, 6);
    assert_eq!(stats.reliability, Reliability::Normal);
    assert_eq!(stats.factors[&Factor::Efficiency].samples, 4);
    assert_eq!(stats.factors[&Factor::DrivingHabit].samples, 6);
    assert_eq!(stats.grades.total(), 6);

    let large = aggregate(&results, Some(VehicleClass::Large)).unwrap();
    assert_eq!(large.vehicle_count, 1);
    assert!(aggregate(&results, Some(VehicleClass::Commercial)).is_some());
}

#[test]
fn test_report_summary() {
    let (report, _clock) = report();
    let summary = report.summary();

    assert_eq!(summary.vehicle_count, 6);
    assert_eq!(summary.completeness.plenty, 1);
    assert_eq!(summary.completeness.normal, 3);
    assert_eq!(summary.completeness.empty, 2);
    assert_eq!(summary.completeness.empty_pct, 33.3);

    let labels: Vec<&str> = summary.classes.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(
        labels,
        vec!["EV9", "GV80", "IONIQ 5", "KONA Electric", "NIRO", "PORTER II EV"]
    );
    assert_eq!(summary.classes[0].percentage, 16.7);
}

#[test]
fn test_report_statistics_expire_after_ttl() {
    let (report, clock) = report();
    let key = statistics_key(None);

    let first = report.statistics(None);
    let first_stamp = report.cache().stored_at(&key).unwrap();
    let summary = report.summary();

    clock.advance(Duration::from_secs(30));
    let second = report.statistics(None);
    assert!(Arc::ptr_eq(&first, &second));

    clock.advance(Duration::from_secs(31));
    let third = report.statistics(None);
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(first, third);
    assert_eq!(
        report.cache().stored_at(&key).unwrap() - first_stamp,
        chrono::Duration::seconds(61)
    );

    // The summary lives longer than the statistics
    assert!(Arc::ptr_eq(&summary, &report.summary()));
}

#[test]
fn test_report_vehicle_detail() {
    let (report, _clock) = report();

    let detail = report.vehicle("A001").unwrap();
    assert_eq!(detail.result.vehicle_id, "A001");
    assert_eq!(detail.factors.len(), 5);
    assert!(detail.total_penalty >= detail.age_penalty);

    assert!(report.vehicle("Z999").is_none());
}

#[test]
fn test_pipeline_writes_score_csv() {
    let (report, _clock) = report();
    let path = std::env::temp_dir().join("battery_health_rater_integration_scores.csv");

    write_scores(&path, &report.scores()).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 7);
    assert!(content.starts_with("car_id,car_type,vehicle_type"));

    std::fs::remove_file(&path).unwrap();
}
