//! Reference in-memory implementation of [`substrate_core::adapter::HostStoreAdapter`]
//! (spec.md §4.13, component C13).
//!
//! The real external relational store and the database extension shim in
//! front of it are out of scope for this workspace (spec.md §1); this
//! crate exists so the engine has one concrete, scope-safe adapter to run
//! against in the harness and in local use, without requiring a real
//! external database. Every logical table from spec.md §6 is kept as an
//! ordered `BTreeMap` keyed by the table's primary key, which gives
//! `bulk_copy`/`query_by_key`/`scan` the same "ordered, indexed key-value
//! store" shape the core expects from the real thing.

mod snapshot;
mod transaction;

pub use snapshot::MemoryAdapter;
pub use transaction::MemoryTransaction;
