//! ABI layer for the `ingester_t` handle (spec.md §4.8/§4.12).

use crate::cancel_abi::{cancel_token_t, token_or_default};
use crate::db_abi::{db_connection_t, substrate_of};
use crate::error_abi::report;
use crate::handle::{as_ref, drop_handle, into_handle};
use std::sync::Arc;
use substrate_core::Substrate;
use substrate_core::ingest::Ingestor;

pub struct ingester_t {
    substrate: Arc<Substrate>,
}

/// Per-ingest counters, mirroring [`substrate_core::ingest::IngestReport`]
/// (spec.md §4.8 step 5) as a plain-C-scalar struct.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct substrate_ingest_report_t {
    pub atoms_processed: u64,
    pub compositions_created: u64,
    pub relations_created: u64,
    pub original_bytes: u64,
    pub stored_bytes: u64,
    pub compression_ratio: f64,
}

/// Create an ingester bound to `conn`'s engine.
///
/// # Safety
/// `conn` must be a live `db_connection_t` handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn substrate_ingester_new(conn: *const db_connection_t) -> *mut ingester_t {
    let Some(conn) = (unsafe { as_ref(conn) }) else {
        return std::ptr::null_mut();
    };
    into_handle(ingester_t {
        substrate: substrate_of(conn),
    })
}

/// Ingest `bytes[0..len)` tagged with `source_identifier`/`mime` (both
/// UTF-8 byte pointers with explicit lengths, per spec.md §4.12) in one
/// transaction. `cancel` may be null. On success, `*out_report` is filled
/// and `true` is returned; on failure (malformed UTF-8, an unknown
/// codepoint, or cancellation), `false` is returned and `*out_report` is
/// left untouched.
///
/// # Safety
/// `ingester` must be a live handle. `bytes` must point to `len` readable
/// bytes. `source_identifier`/`mime` must point to their respective
/// lengths of valid UTF-8. `out_report` must point to writable storage for
/// one `substrate_ingest_report_t`. `cancel` must be either null or a live
/// `cancel_token_t`.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn substrate_ingester_ingest(
    ingester: *const ingester_t,
    bytes: *const u8,
    len: usize,
    source_identifier: *const u8,
    source_identifier_len: usize,
    mime: *const u8,
    mime_len: usize,
    cancel: *const cancel_token_t,
    out_report: *mut substrate_ingest_report_t,
) -> bool {
    let Some(ingester) = (unsafe { as_ref(ingester) }) else {
        return false;
    };
    if bytes.is_null() || source_identifier.is_null() || mime.is_null() || out_report.is_null() {
        return false;
    }
    // SAFETY: caller contract guarantees these pointer/length pairs are
    // readable for their stated lengths and (for the two string
    // parameters) valid UTF-8.
    let result = report(|| {
        let bytes = unsafe { std::slice::from_raw_parts(bytes, len) };
        let source_identifier = unsafe {
            std::str::from_utf8(std::slice::from_raw_parts(
                source_identifier,
                source_identifier_len,
            ))
        }
        .map_err(|e| substrate_core::Error::InvalidInput(format!("source_identifier: {e}")))?;
        let mime = unsafe { std::str::from_utf8(std::slice::from_raw_parts(mime, mime_len)) }
            .map_err(|e| substrate_core::Error::InvalidInput(format!("mime: {e}")))?;
        let cancel_token = unsafe { token_or_default(cancel) };
        Ingestor::new(&ingester.substrate).ingest(bytes, source_identifier, mime, &cancel_token)
    });

    match result {
        Some(r) => {
            // SAFETY: `out_report` non-null and writable per caller contract.
            unsafe {
                *out_report = substrate_ingest_report_t {
                    atoms_processed: r.atoms_processed as u64,
                    compositions_created: r.compositions_created as u64,
                    relations_created: r.relations_created as u64,
                    original_bytes: r.original_bytes as u64,
                    stored_bytes: r.stored_bytes as u64,
                    compression_ratio: r.compression_ratio,
                };
            }
            true
        }
        None => false,
    }
}

/// Surgical deletion (spec.md §4.9/P-DELETE): purge every evidence row
/// tagged with `source_identifier`, recompute ratings for touched
/// relations, and prune any relation left with zero evidence. On
/// success, `*out_pruned_count` is set to the number of relations pruned.
///
/// # Safety
/// `ingester` must be a live handle. `source_identifier` must point to
/// `len` bytes of valid UTF-8. `out_pruned_count` must point to writable
/// storage for one `u64`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn substrate_ingester_purge_source(
    ingester: *const ingester_t,
    source_identifier: *const u8,
    source_identifier_len: usize,
    out_pruned_count: *mut u64,
) -> bool {
    let Some(ingester) = (unsafe { as_ref(ingester) }) else {
        return false;
    };
    if source_identifier.is_null() || out_pruned_count.is_null() {
        return false;
    }
    let result = report(|| {
        let source_identifier = unsafe {
            std::str::from_utf8(std::slice::from_raw_parts(
                source_identifier,
                source_identifier_len,
            ))
        }
        .map_err(|e| substrate_core::Error::InvalidInput(format!("source_identifier: {e}")))?;
        Ingestor::new(&ingester.substrate).purge_source(source_identifier)
    });
    match result {
        Some(count) => {
            unsafe { *out_pruned_count = count as u64 };
            true
        }
        None => false,
    }
}

/// Free an ingester returned by [`substrate_ingester_new`].
///
/// # Safety
/// `ingester` must be either null or a handle from this crate not already
/// freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn substrate_ingester_free(ingester: *mut ingester_t) {
    unsafe { drop_handle(ingester) };
}
