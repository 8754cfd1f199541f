//! # substrate-abi
//!
//! Opaque-handle C ABI for the semantic substrate engine (spec.md §4.12,
//! component C12).
//!
//! Four opaque handle types cross the boundary: [`db_abi::db_connection_t`],
//! [`ingest_abi::ingester_t`], [`query_abi::query_t`], and
//! [`walk_abi::walk_t`]. Every entry point returns a `bool` success flag;
//! on `false` the caller retrieves the error via [`error_abi::get_last_error`],
//! a thread-local accessor in the same style as the source repository's
//! `__errno_location`/`dlerror` (`errno_abi.rs`, `dlfcn_abi.rs`). No error
//! ever unwinds across this boundary — every public function catches
//! `substrate_core::Error` at the edge and converts it to `false` plus a
//! message (spec.md §7's propagation policy).
//!
//! 128-bit quantities cross as fixed `[u8; 16]` arrays, 4-vectors as fixed
//! `[f64; 4]` arrays, and strings as UTF-8 byte pointers with an explicit
//! length — never as null-terminated C strings, since composition text may
//! itself legitimately contain embedded nulls after lossy codepoint
//! substitution. Every allocation the core hands back across the boundary
//! (returned arrays, returned strings) is freed by the matching `free_*`
//! call in [`memory`]; ownership never crosses back into the core.

pub mod cancel_abi;
pub mod db_abi;
pub mod error_abi;
pub mod handle;
pub mod ingest_abi;
pub mod memory;
pub mod query_abi;
pub mod walk_abi;

pub use error_abi::substrate_get_last_error;
