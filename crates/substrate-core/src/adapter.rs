//! Host-Store Adapter (spec.md §4.13, component C13): the abstraction
//! boundary over the external relational store.
//!
//! The real external store (and the database extension shim in front of
//! it) is out of scope for this workspace (spec.md §1); what's in scope
//! is this trait and the `bulk_copy` / `query` / `transaction` shape the
//! engine consumes. `substrate-store` ships one reference in-memory
//! implementation used by the harness and by `substrate-abi`'s default
//! `DbConnection`.

use crate::error::Result;
use serde_json::Value;

/// One row of a logical table (spec.md §6). Opaque to the adapter — only
/// the Store layer (C6) knows each table's schema; the adapter just
/// stores and retrieves rows keyed by whatever key the caller supplies.
pub type StoredRow = Value;

/// High-throughput bulk load / streaming query / transaction-scope
/// abstraction over an external ordered, indexed key-value store.
pub trait HostStoreAdapter: Send + Sync {
    /// This adapter's transaction handle.
    type Transaction: HostTransaction;

    /// Bulk-insert `rows` into `table`, outside any transaction.
    fn bulk_copy(&self, table: &str, rows: &[StoredRow]) -> Result<()>;

    /// Look up a single row in `table` by primary key.
    fn query_by_key(&self, table: &str, key: &StoredRow) -> Result<Option<StoredRow>>;

    /// Stream every row in `table` through `row_callback`; stop early if
    /// the callback returns `false`.
    fn scan(&self, table: &str, row_callback: &mut dyn FnMut(&StoredRow) -> bool) -> Result<()>;

    /// Open a transaction scope. Scope-safe: if the returned transaction
    /// is dropped without [`HostTransaction::commit`], every staged write
    /// rolls back and the adapter returns to a usable state.
    fn begin_transaction(&self) -> Result<Self::Transaction>;
}

/// A transaction scope staged against a [`HostStoreAdapter`].
pub trait HostTransaction {
    /// Stage a bulk insert for commit.
    fn stage_bulk_copy(&mut self, table: &str, rows: &[StoredRow]) -> Result<()>;

    /// Delete every row in `table` matching `key` (used by surgical
    /// evidence-purge/cascade-prune, spec.md §4.9/§8 P-DELETE).
    fn stage_delete(&mut self, table: &str, key: &StoredRow) -> Result<()>;

    /// Commit every staged write atomically. Consumes the transaction;
    /// dropping it instead (without calling `commit`) rolls back.
    fn commit(self) -> Result<()>;
}
