//! A transaction scope staged against [`crate::MemoryAdapter`].
//!
//! Writes are buffered in `staged` and only applied to the shared tables
//! on [`MemoryTransaction::commit`]. Dropping the transaction without
//! calling `commit` discards the buffer — the scope-safety guarantee
//! spec.md §4.13 asks of any Host-Store Adapter ("on any abnormal exit
//! the transaction is rolled back").

use crate::snapshot::{Table, primary_key_of};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use substrate_core::adapter::{HostTransaction, StoredRow};
use substrate_core::error::Result;

enum StagedWrite {
    Insert { table: String, row: Value },
    Delete { table: String, key: Value },
}

pub struct MemoryTransaction {
    tables: Arc<RwLock<BTreeMap<String, Table>>>,
    staged: Vec<StagedWrite>,
    committed: bool,
}

impl MemoryTransaction {
    pub(crate) fn new(tables: Arc<RwLock<BTreeMap<String, Table>>>) -> Self {
        Self {
            tables,
            staged: Vec::new(),
            committed: false,
        }
    }
}

impl HostTransaction for MemoryTransaction {
    fn stage_bulk_copy(&mut self, table: &str, rows: &[StoredRow]) -> Result<()> {
        for row in rows {
            self.staged.push(StagedWrite::Insert {
                table: table.to_string(),
                row: row.clone(),
            });
        }
        Ok(())
    }

    fn stage_delete(&mut self, table: &str, key: &StoredRow) -> Result<()> {
        self.staged.push(StagedWrite::Delete {
            table: table.to_string(),
            key: key.clone(),
        });
        Ok(())
    }

    fn commit(mut self) -> Result<()> {
        let mut tables = self.tables.write();
        for write in self.staged.drain(..) {
            match write {
                StagedWrite::Insert { table, row } => {
                    let entry = tables.entry(table.clone()).or_default();
                    let key = primary_key_of(&table, &row);
                    entry.rows.insert(key.to_string(), row);
                }
                StagedWrite::Delete { table, key } => {
                    if let Some(entry) = tables.get_mut(&table) {
                        entry.rows.remove(&key.to_string());
                    }
                }
            }
        }
        self.committed = true;
        Ok(())
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if !self.committed {
            self.staged.clear();
        }
    }
}
