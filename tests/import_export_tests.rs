use std::io::Write;

use capacity_tool::{
    Allocation, AnalysisConfig, PersistenceError, Portfolio, PortfolioMetadata, Resource,
    ResourceKind, load_portfolio_from_csv, load_portfolio_from_json, save_portfolio_to_csv,
    save_portfolio_to_json,
};
use chrono::NaiveDate;
use tempfile::NamedTempFile;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn sample_portfolio() -> Portfolio {
    let mut metadata = PortfolioMetadata::with_range(d(2024, 1, 1), d(2024, 1, 31));
    metadata.name = "Platform Team".into();
    metadata.description = "Q1 staffing".into();

    let mut portfolio = Portfolio::new_with_metadata(metadata).unwrap();
    portfolio
        .add_resource(
            Resource::person("alice", 8.0)
                .with_name("Alice Example")
                .with_hourly_cost(50.0)
                .with_skill("rust")
                .with_skill("sql"),
        )
        .unwrap();
    portfolio
        .add_resource(Resource::new("rig-1", ResourceKind::Equipment, 24.0))
        .unwrap();
    portfolio
        .add_allocation(Allocation::new(
            "alice",
            "t1",
            6.0,
            d(2024, 1, 15),
            d(2024, 1, 20),
            75.0,
        ))
        .unwrap();
    portfolio
        .add_allocation(Allocation::new(
            "alice",
            "t2",
            8.0,
            d(2024, 1, 18),
            d(2024, 1, 25),
            100.0,
        ))
        .unwrap();
    portfolio
        .add_allocation(Allocation::new(
            "rig-1",
            "t2",
            12.5,
            d(2024, 1, 18),
            d(2024, 1, 19),
            52.08,
        ))
        .unwrap();

    let mut config = AnalysisConfig::default();
    config.severity.low_max = 1.0;
    portfolio.set_config(config).unwrap();
    portfolio
}

fn assert_same_portfolio(loaded: &Portfolio, expected: &Portfolio) {
    assert_eq!(loaded.metadata(), expected.metadata());
    assert_eq!(loaded.config(), expected.config());
    assert_eq!(loaded.resources(), expected.resources());
    assert_eq!(loaded.allocations(), expected.allocations());
}

#[test]
fn json_round_trip_preserves_portfolio() {
    let portfolio = sample_portfolio();
    let file = NamedTempFile::new().unwrap();
    save_portfolio_to_json(&portfolio, file.path()).unwrap();

    let loaded = load_portfolio_from_json(file.path()).unwrap();
    assert_same_portfolio(&loaded, &portfolio);
    assert_eq!(
        loaded.analyze().unwrap().conflicts,
        portfolio.analyze().unwrap().conflicts
    );
}

#[test]
fn csv_round_trip_preserves_portfolio() {
    let portfolio = sample_portfolio();
    let file = NamedTempFile::new().unwrap();
    save_portfolio_to_csv(&portfolio, file.path()).unwrap();

    let loaded = load_portfolio_from_csv(file.path()).unwrap();
    assert_same_portfolio(&loaded, &portfolio);
    assert_eq!(
        loaded.find_resource("alice").unwrap().display_name(),
        "Alice Example"
    );
}

#[test]
fn csv_without_metadata_row_uses_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "record_type,id,kind,daily_capacity,resource_id,task_id,allocated_hours,start_date,end_date,allocation_percent"
    )
    .unwrap();
    writeln!(file, "resource,r1,human,8,,,,,,").unwrap();
    writeln!(file, "allocation,,,,r1,t1,4,2024-02-01,2024-02-02,50").unwrap();
    file.flush().unwrap();

    let loaded = load_portfolio_from_csv(file.path()).unwrap();
    assert_eq!(loaded.resources()[0].kind, ResourceKind::Person);
    assert_eq!(loaded.allocations()[0].allocation_percent, 50.0);
    assert_eq!(loaded.config(), &AnalysisConfig::default());
}

#[test]
fn csv_allocation_without_percent_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "record_type,id,kind,daily_capacity,resource_id,task_id,allocated_hours,start_date,end_date,allocation_percent"
    )
    .unwrap();
    writeln!(file, "resource,r1,person,8,,,,,,").unwrap();
    writeln!(file, "allocation,,,,r1,t1,12,2024-02-01,2024-02-02,").unwrap();
    file.flush().unwrap();

    let err = load_portfolio_from_csv(file.path()).unwrap_err();
    match err {
        PersistenceError::InvalidData(message) => {
            assert!(message.contains("missing allocation_percent"), "{message}")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn csv_with_unknown_record_type_fails() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "record_type,id,kind,daily_capacity").unwrap();
    writeln!(file, "resource,r1,person,8").unwrap();
    writeln!(file, "task,t1,,").unwrap();
    file.flush().unwrap();

    let err = load_portfolio_from_csv(file.path()).unwrap_err();
    match err {
        PersistenceError::InvalidData(message) => {
            assert!(message.contains("unknown record_type"), "{message}")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn empty_portfolio_round_trips_through_csv() {
    let metadata = PortfolioMetadata::with_range(d(2024, 5, 1), d(2024, 5, 31));
    let portfolio = Portfolio::new_with_metadata(metadata).unwrap();
    let file = NamedTempFile::new().unwrap();
    save_portfolio_to_csv(&portfolio, file.path()).unwrap();

    let loaded = load_portfolio_from_csv(file.path()).unwrap();
    assert!(loaded.resources().is_empty());
    assert!(loaded.allocations().is_empty());
    assert_eq!(loaded.metadata(), portfolio.metadata());
}

#[test]
fn json_with_dangling_allocation_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    let body = serde_json::json!({
        "metadata": {
            "name": "Broken",
            "description": "",
            "range_start": "2024-01-01",
            "range_end": "2024-01-31"
        },
        "resources": [
            { "id": "r1", "kind": "person", "daily_capacity": 8.0 }
        ],
        "allocations": [
            {
                "resource_id": "r2",
                "task_id": "t1",
                "allocated_hours": 4.0,
                "start_date": "2024-01-02",
                "end_date": "2024-01-03",
                "allocation_percent": 50.0
            }
        ]
    });
    write!(file, "{body}").unwrap();
    file.flush().unwrap();

    let err = load_portfolio_from_json(file.path()).unwrap_err();
    assert!(matches!(err, PersistenceError::Validation(_)));
}

#[test]
fn json_allocation_without_percent_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    let body = serde_json::json!({
        "metadata": {
            "name": "No percent",
            "description": "",
            "range_start": "2024-01-01",
            "range_end": "2024-01-31"
        },
        "resources": [
            { "id": "r1", "kind": "person", "daily_capacity": 8.0 }
        ],
        "allocations": [
            {
                "resource_id": "r1",
                "task_id": "t1",
                "allocated_hours": 12.0,
                "start_date": "2024-01-02",
                "end_date": "2024-01-03"
            }
        ]
    });
    write!(file, "{body}").unwrap();
    file.flush().unwrap();

    let err = load_portfolio_from_json(file.path()).unwrap_err();
    match err {
        PersistenceError::Serialization(inner) => {
            assert!(inner.to_string().contains("allocation_percent"), "{inner}")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn config_file_round_trip() {
    let file = NamedTempFile::new().unwrap();
    let mut config = AnalysisConfig::default();
    config.advisor.hire_cost = 80_000.0;
    config.max_range_days = 400;
    config.save(file.path()).unwrap();

    let loaded = AnalysisConfig::load(file.path()).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn invalid_config_file_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{"severity": {{"low_max": 5.0, "medium_max": 1.0}}}}"#).unwrap();
    file.flush().unwrap();

    let err = AnalysisConfig::load(file.path()).unwrap_err();
    assert!(err.to_string().contains("low_max < medium_max"));
}
