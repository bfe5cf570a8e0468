//! End-to-end daily run over on-disk fixtures.
//!
//! Snapshot CSV, model JSON and captured payloads are written to a temp
//! directory, then driven through config → pipeline → export exactly as the
//! CLI does it.

use kickscout_core::data::{load_snapshot, snapshot_fingerprint, JsonDirProvider};
use kickscout_core::export::{load_manifest, save_reports, MARKET_FILE, SQUAD_FILE};
use kickscout_core::schema::column_names;
use kickscout_core::{
    DailyPipeline, FixedClock, LinearModel, ReportError, ScoutConfig, ValuePredictor,
};
use polars::prelude::*;
use std::fs;
use std::path::Path;

const SNAPSHOT: &str = "\
player_id,first_name,last_name,position,team_name,date,mv_change_1d,mv_trend_1d,mv,form
1,Florian,Wirtz,MID,Leverkusen,2024-11-19,200000,1,130000000,8.1
2,Granit,Xhaka,MID,Leverkusen,2024-11-19,-30000,-1,12000000,6.0
3,Victor,Boniface,FWD,Leverkusen,2024-11-19,90000,1,,7.5
4,Jonathan,Tah,DEF,Leverkusen,2024-11-19,10000,0,40000000,5.5
1,Florian,Wirtz,MID,Leverkusen,2024-11-18,100000,1,129800000,8.0
";

const MODEL: &str = r#"{
    "name": "mv-target-linear-test",
    "intercept": 0.0,
    "coefficients": { "mv_change_1d": 0.5, "form": 1000.0 }
}"#;

const SQUAD: &str = r#"{
    "it": [
        { "i": "1", "mv": 130100000, "prob": 0.9, "mv_change_1d": 150000 },
        { "i": "4", "mv": 41000000, "prob": 0.6 }
    ]
}"#;

const MARKET: &str = r#"[
    { "id": "4", "exp": 3600, "prob": 0.7 },
    { "id": "2", "exp": 7200 },
    { "id": "99", "exp": 100 }
]"#;

const CONFIG: &str = r#"
league_id = "4711"
snapshot = "snapshot.csv"
model = "model.json"
payload_dir = "payloads"
output_dir = "reports"
features = ["mv_change_1d", "form"]
"#;

fn workspace() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("scout.toml"), CONFIG).unwrap();
    fs::write(root.join("snapshot.csv"), SNAPSHOT).unwrap();
    fs::write(root.join("model.json"), MODEL).unwrap();
    let league = root.join("payloads").join("4711");
    fs::create_dir_all(&league).unwrap();
    fs::write(league.join(JsonDirProvider::SQUAD_FILE), SQUAD).unwrap();
    fs::write(league.join(JsonDirProvider::MARKET_FILE), MARKET).unwrap();
    dir
}

/// 2024-11-20 20:00 Berlin: reporting date is the 19th, two hours to rollover.
fn evening_clock() -> FixedClock {
    FixedClock::parse("2024-11-20T20:00:00").unwrap()
}

fn strings(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    df.column(name)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|s| s.map(str::to_string))
        .collect()
}

fn floats(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name)
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

fn run(root: &Path) -> kickscout_core::DailyReports {
    let config = ScoutConfig::from_file(&root.join("scout.toml")).unwrap();
    let model = LinearModel::from_file(&config.model).unwrap();
    let snapshot = load_snapshot(&config.snapshot).unwrap();
    let provider = JsonDirProvider::new(&config.payload_dir);
    let clock = evening_clock();

    let pipeline = DailyPipeline::new(&model, &config.features, &provider, &provider, &clock);
    pipeline
        .run(&snapshot, &config.token(), &config.league_id)
        .unwrap()
}

#[test]
fn predictions_cover_reporting_day_ranked_by_target() {
    let dir = workspace();
    let reports = run(dir.path());

    assert_eq!(reports.reporting_date.to_string(), "2024-11-19");
    assert_eq!(reports.model_name, "mv-target-linear-test");

    // Boniface has no market value; the 18th's Wirtz row is out of scope.
    let predictions = &reports.predictions;
    assert_eq!(
        strings(predictions, "last_name"),
        [Some("Wirtz".into()), Some("Tah".into()), Some("Xhaka".into())]
    );
    assert_eq!(
        floats(predictions, "predicted_mv_target"),
        [Some(108_100.0), Some(10_500.0), Some(-9_000.0)]
    );
}

#[test]
fn squad_report_resolves_column_collisions() {
    let dir = workspace();
    let squad = run(dir.path()).squad;

    assert_eq!(
        column_names(&squad),
        [
            "first_name",
            "last_name",
            "team_name",
            "mv",
            "mv_change_yesterday",
            "predicted_mv_target",
            "s_11_prob"
        ]
    );
    assert_eq!(
        strings(&squad, "last_name"),
        [Some("Wirtz".into()), Some("Tah".into())]
    );
    assert_eq!(
        floats(&squad, "mv"),
        [Some(130_000_000.0), Some(40_000_000.0)]
    );
    // Both sides carry mv_change_1d, so only the suffixed pair exists.
    assert_eq!(floats(&squad, "mv_change_yesterday"), [None, None]);
    assert_eq!(floats(&squad, "s_11_prob"), [Some(0.9), Some(0.6)]);
}

#[test]
fn market_report_keeps_actionable_listings_only() {
    let dir = workspace();
    let market = run(dir.path()).market;

    // Xhaka is listed but predicted below the bid threshold; id 99 is unknown.
    assert_eq!(market.height(), 1);
    assert_eq!(strings(&market, "last_name"), [Some("Tah".into())]);
    assert_eq!(floats(&market, "hours_to_exp"), [Some(1.0)]);
    assert_eq!(floats(&market, "s_11_prob"), [Some(0.7)]);
    let expiring: Vec<_> = market
        .column("expiring_today")
        .unwrap()
        .bool()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(expiring, [Some(true)]);
}

#[test]
fn exported_manifest_matches_reports() {
    let dir = workspace();
    let reports = run(dir.path());
    let hash = snapshot_fingerprint(&dir.path().join("snapshot.csv")).unwrap();

    let report_dir = save_reports(&reports, &dir.path().join("reports"), &hash).unwrap();
    assert_eq!(report_dir, dir.path().join("reports").join("2024-11-19"));

    let manifest = load_manifest(&report_dir).unwrap();
    assert_eq!(manifest.snapshot_hash, hash);
    assert_eq!(manifest.prediction_rows, 3);
    assert_eq!(manifest.squad_rows, 2);
    assert_eq!(manifest.market_rows, 1);

    let squad_csv = fs::read_to_string(report_dir.join(SQUAD_FILE)).unwrap();
    assert!(squad_csv.contains("Wirtz"));
    let market_csv = fs::read_to_string(report_dir.join(MARKET_FILE)).unwrap();
    assert_eq!(market_csv.lines().count(), 2);
}

#[test]
fn missing_market_payload_fails_the_run() {
    let dir = workspace();
    fs::remove_file(
        dir.path()
            .join("payloads")
            .join("4711")
            .join(JsonDirProvider::MARKET_FILE),
    )
    .unwrap();

    let config = ScoutConfig::from_file(&dir.path().join("scout.toml")).unwrap();
    let model = LinearModel::from_file(&config.model).unwrap();
    let snapshot = load_snapshot(&config.snapshot).unwrap();
    let provider = JsonDirProvider::new(&config.payload_dir);
    let clock = evening_clock();

    let err = DailyPipeline::new(&model, &config.features, &provider, &provider, &clock)
        .run(&snapshot, "", &config.league_id)
        .unwrap_err();
    assert!(matches!(err, ReportError::Provider(_)));
}

#[test]
fn late_evening_run_reports_today() {
    let dir = workspace();
    let config = ScoutConfig::from_file(&dir.path().join("scout.toml")).unwrap();
    let model = LinearModel::from_file(&config.model).unwrap();
    let snapshot = load_snapshot(&config.snapshot).unwrap();
    let provider = JsonDirProvider::new(&config.payload_dir);

    // 23:00 on the 19th: past the publication cutoff, so the 19th is current.
    let clock = FixedClock::parse("2024-11-19T23:00:00").unwrap();
    let pipeline = DailyPipeline::new(&model, &config.features, &provider, &provider, &clock);
    let (day, predictions) = pipeline.predictions(&snapshot).unwrap();

    assert_eq!(day.to_string(), "2024-11-19");
    assert_eq!(predictions.height(), 3);
    assert_eq!(model.name(), "mv-target-linear-test");
}
