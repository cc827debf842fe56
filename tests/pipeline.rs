use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use arrow::array::{
    ArrayRef, BooleanArray, Float64Array, Int32Array, Int64Array, LargeStringArray, StringArray,
};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use rusty_prenoms::data::model::SeriesPoint;
use rusty_prenoms::{
    load_file, AppState, EngineError, LoadError, LoadState, RegistryConfig, ShareBasis,
    VizRequest, VizResponse,
};

const REGISTRY: &str = "\
sexe;preusuel;annais;dpt;nombre
1;JEAN;1950;75;120
1;JEAN;1950;13;30
1;JEAN;1951;75;110
2;MARIE;1950;75;200
2;MARIE;XXXX;XX;57
2;Camille;1995;69;40
1;CAMILLE;1995;69;10
1;CAMILLE;1972;2A;8
2;;1990;75;4
2;MARIE;1960;971;abc
";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn write_fixture(dir: &tempfile::TempDir, file: &str, text: &str) -> PathBuf {
    let path = dir.path().join(file);
    fs::write(&path, text).unwrap();
    path
}

fn loaded_state(config: RegistryConfig) -> (tempfile::TempDir, AppState) {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "dpt.csv", REGISTRY);
    let mut state = AppState::new(config);
    state.begin_load(path);
    state.wait_for_load();
    (dir, state)
}

fn write_parquet(path: &Path, columns: Vec<(&str, ArrayRef)>) {
    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, array)| Field::new(*name, array.data_type().clone(), true))
            .collect::<Vec<_>>(),
    ));
    let batch = RecordBatch::try_new(
        schema.clone(),
        columns.into_iter().map(|(_, array)| array).collect(),
    )
    .unwrap();
    let mut writer = ArrowWriter::try_new(File::create(path).unwrap(), schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

#[test]
fn csv_load_drops_invalid_rows() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "dpt.csv", REGISTRY);
    let store = load_file(&path, &RegistryConfig::default()).unwrap();

    assert_eq!(store.len(), 7);
    let report = store.report();
    assert_eq!(report.unknown_year, 1);
    assert_eq!(report.empty_name, 1);
    assert_eq!(report.invalid_count, 1);
    assert!(store.records().iter().all(|r| !r.name.is_empty()));
    assert!(store.records().iter().any(|r| r.name == "CAMILLE" && r.count == 40));
}

#[test]
fn strict_counts_reject_the_file() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "dpt.csv", REGISTRY);
    let config = RegistryConfig {
        strict_counts: true,
        ..RegistryConfig::default()
    };
    let err = load_file(&path, &config).unwrap_err();
    assert!(matches!(err, LoadError::InvalidCount { ref value, .. } if value == "abc"));
}

#[test]
fn json_and_csv_load_the_same_records() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let csv_path = write_fixture(&dir, "dpt.csv", "sexe;preusuel;annais;dpt;nombre\n2;LEA;2005;35;12\n1;LEO;XXXX;XX;9\n");
    let json_path = write_fixture(
        &dir,
        "dpt.json",
        r#"[{"sexe":"2","preusuel":"lea","annais":2005,"dpt":"35","nombre":12},
            {"sexe":"1","preusuel":"LEO","annais":"XXXX","dpt":"XX","nombre":9}]"#,
    );
    let config = RegistryConfig::default();
    let from_csv = load_file(&csv_path, &config).unwrap();
    let from_json = load_file(&json_path, &config).unwrap();
    assert_eq!(from_csv.records(), from_json.records());
    assert_eq!(from_csv.report(), from_json.report());
}

#[test]
fn config_file_changes_columns_and_delimiter() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let cfg_path = write_fixture(
        &dir,
        "config.json",
        r#"{ "delimiter": ",", "columns": { "name": "prenom", "count": "n" } }"#,
    );
    let data_path = write_fixture(&dir, "dpt.csv", "sexe,prenom,annais,dpt,n\n1,PAUL,1990,75,3\n");

    let config = RegistryConfig::from_json_file(&cfg_path).unwrap();
    let store = load_file(&data_path, &config).unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(store.records()[0].name, "PAUL");
}

#[test]
fn missing_file_fails_the_load() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let mut state = AppState::default();
    state.begin_load(dir.path().join("absent.csv"));
    assert!(state.is_loading());
    state.wait_for_load();
    assert!(matches!(state.load_state(), LoadState::Failed(_)));
    assert_eq!(
        state
            .handle_viz_request(&VizRequest::NameTrends("jean".to_string()))
            .unwrap_err(),
        EngineError::NotLoaded
    );
}

#[test]
fn name_trends_end_to_end() {
    let (_dir, state) = loaded_state(RegistryConfig::default());
    let response = state
        .handle_viz_request(&VizRequest::NameTrends("  marie , Jean ,,".to_string()))
        .unwrap();
    let VizResponse::NameTrends(chart) = response else {
        panic!("wrong response kind");
    };

    let labels: Vec<&str> = chart.series.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["JEAN", "MARIE"]);
    assert_eq!(
        chart.series[0].points,
        vec![
            SeriesPoint { key: 1950, value: 150 },
            SeriesPoint { key: 1951, value: 110 },
        ]
    );
    assert_eq!(chart.series[1].points, vec![SeriesPoint { key: 1950, value: 200 }]);
    assert_eq!(chart.colors, vec!["#ff7f0e", "#1f77b4"]);
    assert_eq!(chart.domain.years, Some((1950, 1951)));
    assert_eq!(chart.domain.max_value, 200);
}

#[test]
fn regional_popularity_end_to_end() {
    let (_dir, state) = loaded_state(RegistryConfig::default());
    let VizResponse::RegionalPopularity(map) = state
        .handle_viz_request(&VizRequest::RegionalPopularity("jean".to_string()))
        .unwrap()
    else {
        panic!("wrong response kind");
    };
    assert_eq!(map.count_for("75"), 230);
    assert_eq!(map.count_for("13"), 30);
    assert_eq!(map.count_for("971"), 0);
    assert_eq!(map.counts.len(), 2);
}

#[test]
fn gender_views_end_to_end() {
    let (_dir, state) = loaded_state(RegistryConfig::default());

    let VizResponse::GenderTrends(chart) = state
        .handle_viz_request(&VizRequest::GenderTrends("Camille".to_string()))
        .unwrap()
    else {
        panic!("wrong response kind");
    };
    let labels: Vec<&str> = chart.series.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["Female", "Male"]);

    let VizResponse::GenderShare(shares) = state
        .handle_viz_request(&VizRequest::GenderShare("camille".to_string()))
        .unwrap()
    else {
        panic!("wrong response kind");
    };
    assert_eq!(shares.name, "CAMILLE");
    let decades: Vec<i32> = shares.bins.iter().map(|b| b.decade).collect();
    assert_eq!(decades, vec![1970, 1990]);
    assert_eq!(shares.bins[0].male_pct, Some(1.0));
    assert_eq!(shares.bins[1].female_pct, Some(0.8));
    assert_eq!(shares.bins[1].male_pct, Some(0.2));
}

#[test]
fn known_only_share_basis_from_config() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        &dir,
        "dpt.csv",
        "sexe;preusuel;annais;dpt;nombre\n1;ALEX;2001;75;3\n2;ALEX;2002;75;1\n9;ALEX;2003;75;4\n",
    );
    for (basis, male_pct) in [(ShareBasis::AllCodes, 0.375), (ShareBasis::KnownOnly, 0.75)] {
        let mut state = AppState::new(RegistryConfig {
            share_basis: basis,
            ..RegistryConfig::default()
        });
        state.begin_load(path.clone());
        state.wait_for_load();
        let VizResponse::GenderShare(shares) = state
            .handle_viz_request(&VizRequest::GenderShare("alex".to_string()))
            .unwrap()
        else {
            panic!("wrong response kind");
        };
        assert_eq!(shares.bins[0].male_pct, Some(male_pct));
    }
}

#[test]
fn repeated_requests_are_identical() {
    let (_dir, state) = loaded_state(RegistryConfig::default());
    let request = VizRequest::NameTrends("jean, marie, camille".to_string());
    let first = state.handle_viz_request(&request).unwrap();
    let second = state.handle_viz_request(&request).unwrap();
    match (first, second) {
        (VizResponse::NameTrends(a), VizResponse::NameTrends(b)) => assert_eq!(a, b),
        _ => panic!("wrong response kind"),
    }
}

#[test]
fn parquet_load_reads_text_and_numeric_columns() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dpt.parquet");
    write_parquet(
        &path,
        vec![
            ("sexe", Arc::new(Int32Array::from(vec![1, 2, 1])) as ArrayRef),
            ("preusuel", Arc::new(StringArray::from(vec![Some("paul"), None, Some("Lea")]))),
            ("annais", Arc::new(Float64Array::from(vec![1990.0, 1991.0, 2005.0]))),
            ("dpt", Arc::new(LargeStringArray::from(vec!["75", "13", "2A"]))),
            ("nombre", Arc::new(Int64Array::from(vec![4, 7, 9]))),
        ],
    );

    let store = load_file(&path, &RegistryConfig::default()).unwrap();
    assert_eq!(store.len(), 2);
    assert_eq!(store.report().empty_name, 1);

    let paul = &store.records()[0];
    assert_eq!(
        (paul.name.as_str(), paul.year, paul.department.as_str(), paul.count),
        ("PAUL", 1990, "75", 4)
    );
    assert_eq!(paul.gender, rusty_prenoms::Gender::Male);
    let lea = &store.records()[1];
    assert_eq!((lea.name.as_str(), lea.year, lea.department.as_str()), ("LEA", 2005, "2A"));
}

#[test]
fn parquet_load_rejects_unsupported_column_types() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dpt.pq");
    write_parquet(
        &path,
        vec![
            ("sexe", Arc::new(BooleanArray::from(vec![true])) as ArrayRef),
            ("preusuel", Arc::new(StringArray::from(vec!["PAUL"]))),
            ("annais", Arc::new(Int32Array::from(vec![1990]))),
            ("dpt", Arc::new(StringArray::from(vec!["75"]))),
            ("nombre", Arc::new(Int64Array::from(vec![4]))),
        ],
    );

    match load_file(&path, &RegistryConfig::default()) {
        Err(LoadError::UnsupportedColumnType { column, data_type }) => {
            assert_eq!(column, "sexe");
            assert!(data_type.contains("Boolean"));
        }
        other => panic!("expected UnsupportedColumnType, got {other:?}"),
    }
}

#[test]
fn polling_reports_a_finished_background_load() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "dpt.csv", REGISTRY);
    let mut state = AppState::default();
    state.begin_load(path);

    let mut finished = false;
    for _ in 0..1000 {
        if state.poll_load() {
            finished = true;
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }
    assert!(finished, "background load did not finish");
    assert!(!state.is_loading());
    match state.load_state() {
        LoadState::Ready(store) => assert_eq!(store.len(), 7),
        other => panic!("expected Ready, got {other:?}"),
    }
    assert!(state.poll_load());
}

#[test]
fn short_rows_are_rejected_without_failing_the_load() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        &dir,
        "dpt.csv",
        "sexe;preusuel;annais;dpt;nombre\n1;PAUL;1990;75;3\n2;MARIE;1991\n2;LEA;2005;35;12;extra\n",
    );
    let store = load_file(&path, &RegistryConfig::default()).unwrap();
    assert_eq!(store.len(), 2);
    assert_eq!(store.report().invalid_count, 1);
}
