//! Exercises `substrate_store::MemoryAdapter` directly against a real
//! ingested corpus, independent of `Substrate` (which keeps its own
//! in-memory stores and never routes through `HostStoreAdapter` itself).
//! This is the standalone usage spec.md §4.13 describes: a host snapshots
//! the physicality table into the adapter and reads it back by key or by
//! full scan.

use substrate_core::adapter::{HostStoreAdapter, HostTransaction};
use substrate_core::cancel::CancellationToken;
use substrate_core::config::EngineConfig;
use substrate_core::engine::Substrate;
use substrate_core::ingest::Ingestor;
use substrate_store::MemoryAdapter;

use serde_json::json;

fn seeded_engine() -> Substrate {
    let engine = Substrate::new(EngineConfig::default()).unwrap();
    engine.seed_atoms("the cat sat on the mat".chars().map(|c| c as u32)).unwrap();
    Ingestor::new(&engine)
        .ingest(b"the cat sat on the mat", "store-adapter-test", "text/plain", &CancellationToken::new())
        .unwrap();
    engine
}

#[test]
fn bulk_copying_a_physicality_snapshot_round_trips_by_key() {
    let engine = seeded_engine();
    let rows = engine.physicality.snapshot();
    assert!(!rows.is_empty());

    let adapter = MemoryAdapter::new();
    let stored: Vec<_> = rows
        .iter()
        .map(|row| {
            json!({
                "id": row.id.to_hex(),
                "hilbert": hex::encode(row.hilbert),
                "centroid": row.centroid,
            })
        })
        .collect();
    adapter.bulk_copy("physicality", &stored).unwrap();

    let sample = &rows[0];
    let found = adapter
        .query_by_key("physicality", &json!(sample.id.to_hex()))
        .unwrap()
        .expect("row copied by bulk_copy must be queryable by key");
    assert_eq!(found["hilbert"], json!(hex::encode(sample.hilbert)));
}

#[test]
fn scan_visits_every_copied_physicality_row() {
    let engine = seeded_engine();
    let rows = engine.physicality.snapshot();

    let adapter = MemoryAdapter::new();
    let stored: Vec<_> = rows.iter().map(|row| json!({"id": row.id.to_hex()})).collect();
    adapter.bulk_copy("physicality", &stored).unwrap();

    let mut seen = 0usize;
    adapter
        .scan("physicality", &mut |_row| {
            seen += 1;
            true
        })
        .unwrap();
    assert_eq!(seen, rows.len());
}

#[test]
fn transaction_rollback_leaves_prior_bulk_copy_untouched() {
    let engine = seeded_engine();
    let rows = engine.physicality.snapshot();
    let first_key = rows[0].id.to_hex();

    let adapter = MemoryAdapter::new();
    adapter.bulk_copy("physicality", &[json!({"id": first_key})]).unwrap();

    {
        let mut txn = adapter.begin_transaction().unwrap();
        txn.stage_delete("physicality", &json!(first_key)).unwrap();
        // dropped without commit: delete must not apply
    }

    assert!(adapter.query_by_key("physicality", &json!(first_key)).unwrap().is_some());
}
