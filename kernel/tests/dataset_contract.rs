// Behaviour every dataset backend must share, exercised through the
// selector the way service code obtains a backend.

use std::collections::HashSet;
use std::fs;
use std::sync::Arc;

use feather_kernel::config::{PersistConfig, PersistMode};
use feather_kernel::context::select_store;
use feather_kernel::dataset::{BackendKind, DatasetId, DatasetStore, Meta, Row};
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};

fn object(value: Value) -> serde_json::Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn aapl_rows() -> Vec<Row> {
    vec![
        object(json!({ "t": 1, "close": 100.0 })),
        object(json!({ "t": 2, "close": 101.5 })),
        object(json!({ "t": 3, "close": 99.0 })),
    ]
}

fn aapl_meta() -> Meta {
    object(json!({ "rows": 3, "columns": ["t", "close"] }))
}

/// Both backends; the temp dir must outlive the durable store.
fn backends() -> Vec<(Arc<dyn DatasetStore>, Option<TempDir>)> {
    let dir = tempdir().unwrap();
    let files = select_store(&PersistConfig::files(dir.path())).unwrap();
    let memory = select_store(&PersistConfig::memory()).unwrap();
    vec![(memory, None), (files, Some(dir))]
}

#[test]
fn stored_dataset_reads_back_exactly() {
    for (store, _dir) in backends() {
        let id = store.save("aapl.csv", aapl_meta(), aapl_rows()).unwrap();

        let dataset = store.get(&id).unwrap().unwrap();
        assert_eq!(dataset.id, id);
        assert_eq!(dataset.name, "aapl.csv");
        assert_eq!(dataset.meta, aapl_meta());

        let closes: Vec<f64> = dataset
            .rows
            .iter()
            .map(|r| r["close"].as_f64().unwrap())
            .collect();
        assert_eq!(closes, vec![100.0, 101.5, 99.0], "{:?}", store.kind());
    }
}

#[test]
fn identical_saves_get_distinct_ids() {
    for (store, _dir) in backends() {
        let first = store.save("dup", aapl_meta(), aapl_rows()).unwrap();
        let second = store.save("dup", aapl_meta(), aapl_rows()).unwrap();

        assert_ne!(first, second);
        assert_eq!(store.get(&first).unwrap().unwrap().rows, aapl_rows());
        assert_eq!(store.get(&second).unwrap().unwrap().rows, aapl_rows());
    }
}

#[test]
fn list_has_one_summary_per_save_without_rows() {
    for (store, _dir) in backends() {
        let mut expected = HashSet::new();
        for n in 0..5 {
            let name = format!("set-{n}");
            let meta = object(json!({ "n": n }));
            let id = store.save(&name, meta, aapl_rows()).unwrap();
            expected.insert((id, name));
        }

        let summaries = store.list().unwrap();
        assert_eq!(summaries.len(), 5);

        for summary in &summaries {
            assert!(expected.contains(&(summary.id.clone(), summary.name.clone())));
            let n: usize = summary.name["set-".len()..].parse().unwrap();
            assert_eq!(summary.meta["n"], json!(n));

            let encoded = serde_json::to_value(summary).unwrap();
            assert!(encoded.get("rows").is_none());
        }
    }
}

#[test]
fn unknown_id_is_absent_not_an_error() {
    for (store, _dir) in backends() {
        store.save("present", Meta::new(), vec![]).unwrap();
        let missing = DatasetId::from("0123456789abcdef0123456789abcdef");
        assert!(store.get(&missing).unwrap().is_none());
    }
}

#[test]
fn durable_data_survives_new_instance() {
    let dir = tempdir().unwrap();
    let config = PersistConfig::files(dir.path());

    let id = {
        let store = select_store(&config).unwrap();
        store.save("aapl.csv", aapl_meta(), aapl_rows()).unwrap()
    };

    let reopened = select_store(&config).unwrap();
    let dataset = reopened.get(&id).unwrap().unwrap();
    assert_eq!(dataset.rows, aapl_rows());
    assert_eq!(dataset.meta, aapl_meta());

    let listed = reopened.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
}

#[test]
fn durable_missing_rows_degrade_to_empty() {
    let dir = tempdir().unwrap();
    let store = select_store(&PersistConfig::files(dir.path())).unwrap();
    let id = store.save("aapl.csv", aapl_meta(), aapl_rows()).unwrap();

    let record = dir.path().join(format!("{id}.rows.jsonl"));
    assert!(record.exists());
    fs::remove_file(&record).unwrap();

    let dataset = store.get(&id).unwrap().unwrap();
    assert!(dataset.rows.is_empty());
    assert_eq!(dataset.meta, aapl_meta());
}

#[test]
fn unrecognized_mode_still_works() {
    let config = PersistConfig {
        mode: PersistMode::parse("sql"),
        ..PersistConfig::default()
    };

    let store = select_store(&config).unwrap();
    assert_eq!(store.kind(), BackendKind::Memory);

    let id = store.save("aapl.csv", aapl_meta(), aapl_rows()).unwrap();
    assert_eq!(store.get(&id).unwrap().unwrap().rows.len(), 3);
}
