//! The adapter itself: one ordered table per logical table name, each a
//! `BTreeMap<Value, Value>` keyed by the table's primary key.

use crate::transaction::MemoryTransaction;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use substrate_core::adapter::{HostStoreAdapter, StoredRow};
use substrate_core::error::Result;

/// JSON values don't implement `Ord`, so keys are compared by their
/// canonical string rendering — stable because `serde_json::Value`'s
/// `Display`/`to_string` output is deterministic for a given value.
type Key = String;

fn key_string(v: &Value) -> Key {
    v.to_string()
}

/// Derive the primary key of `row` in `table`, per the persisted layout
/// in spec.md §6. Single-column PKs read the obvious field; the two
/// sequence tables use their documented composite PK; any other table
/// falls back to the row's own canonical JSON as the key (still unique,
/// just not indexed by a business key).
pub(crate) fn primary_key_of(table: &str, row: &Value) -> Value {
    match table {
        "atom" | "composition" | "relation" | "physicality" | "content" | "relation_evidence" => {
            row.get("id").cloned().unwrap_or_else(|| row.clone())
        }
        "relation_rating" => row
            .get("relation_id")
            .cloned()
            .unwrap_or_else(|| row.clone()),
        "composition_sequence" => serde_json::json!([
            row.get("composition_id").cloned().unwrap_or(Value::Null),
            row.get("ordinal").cloned().unwrap_or(Value::Null),
        ]),
        "relation_sequence" => serde_json::json!([
            row.get("relation_id").cloned().unwrap_or(Value::Null),
            row.get("ordinal").cloned().unwrap_or(Value::Null),
        ]),
        _ => row.clone(),
    }
}

#[derive(Default)]
pub(crate) struct Table {
    pub(crate) rows: BTreeMap<Key, Value>,
}

/// The reference Host-Store Adapter: one in-memory table per logical
/// table name, guarded by a single lock (the real external store would
/// shard this per-table/per-row; this adapter favors simplicity since it
/// exists for tests and local use, not production throughput).
#[derive(Default)]
pub struct MemoryAdapter {
    pub(crate) tables: Arc<RwLock<BTreeMap<String, Table>>>,
}

impl MemoryAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total row count across every table, for test assertions.
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.tables.read().values().map(|t| t.rows.len()).sum()
    }
}

impl HostStoreAdapter for MemoryAdapter {
    type Transaction = MemoryTransaction;

    fn bulk_copy(&self, table: &str, rows: &[StoredRow]) -> Result<()> {
        let mut tables = self.tables.write();
        let entry = tables.entry(table.to_string()).or_default();
        for row in rows {
            let key = primary_key_of(table, row);
            entry.rows.insert(key_string(&key), row.clone());
        }
        Ok(())
    }

    fn query_by_key(&self, table: &str, key: &StoredRow) -> Result<Option<StoredRow>> {
        Ok(self
            .tables
            .read()
            .get(table)
            .and_then(|t| t.rows.get(&key_string(key)).cloned()))
    }

    fn scan(&self, table: &str, row_callback: &mut dyn FnMut(&StoredRow) -> bool) -> Result<()> {
        let tables = self.tables.read();
        let Some(t) = tables.get(table) else {
            return Ok(());
        };
        for row in t.rows.values() {
            if !row_callback(row) {
                break;
            }
        }
        Ok(())
    }

    fn begin_transaction(&self) -> Result<Self::Transaction> {
        Ok(MemoryTransaction::new(self.tables.clone()))
    }
}
