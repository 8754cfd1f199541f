//! ABI layer for the `db_connection_t` handle (spec.md §4.12/§6):
//! construction, configuration, and atom seeding.

use crate::error_abi::report;
use crate::handle::{as_ref, drop_handle, into_handle};
use std::sync::Arc;
use substrate_core::{EngineConfig, Substrate};

/// Opaque handle to an assembled engine instance.
pub struct db_connection_t {
    pub(crate) substrate: Arc<Substrate>,
}

/// Plain-C-scalar mirror of [`EngineConfig`] (spec.md §6's configuration
/// table), passed by value/pointer across the ABI boundary instead of
/// the Rust struct directly.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct substrate_config_t {
    pub ngram_max_n: u64,
    pub ngram_min_occ: u32,
    pub ngram_llr_threshold: f64,
    pub cooccurrence_window: u64,
    pub rating_k_factor: f64,
    pub rating_base_default: f64,
    pub gravitational_radius: f64,
    pub walk_energy: f64,
    pub walk_decay: f64,
    pub walk_temperature: f64,
    pub walk_max_tokens: u64,
    pub walk_alpha: f64,
    pub walk_beta: f64,
    pub check_interval: u64,
    pub walk_visited_cap: u64,
}

impl From<substrate_config_t> for EngineConfig {
    fn from(c: substrate_config_t) -> Self {
        EngineConfig {
            ngram_max_n: c.ngram_max_n as usize,
            ngram_min_occ: c.ngram_min_occ,
            ngram_llr_threshold: c.ngram_llr_threshold,
            cooccurrence_window: c.cooccurrence_window as usize,
            rating_k_factor: c.rating_k_factor,
            rating_base_default: c.rating_base_default,
            gravitational_radius: c.gravitational_radius,
            walk_energy: c.walk_energy,
            walk_decay: c.walk_decay,
            walk_temperature: c.walk_temperature,
            walk_max_tokens: c.walk_max_tokens as usize,
            walk_alpha: c.walk_alpha,
            walk_beta: c.walk_beta,
            check_interval: c.check_interval as usize,
            walk_visited_cap: c.walk_visited_cap as usize,
        }
    }
}

/// Open a new engine instance with default configuration. Returns null on
/// failure (see [`crate::error_abi::substrate_get_last_error`]); this can
/// currently only happen if a future default becomes invalid, since
/// `EngineConfig::default()` is validated at construction.
#[unsafe(no_mangle)]
pub extern "C" fn substrate_db_open() -> *mut db_connection_t {
    substrate_db_open_with_config(std::ptr::null())
}

/// Open a new engine instance with the configuration pointed to by
/// `config`, or defaults if `config` is null. Returns null on failure
/// (an out-of-range configuration value).
///
/// # Safety
/// `config` must be either null or point to a valid, initialized
/// `substrate_config_t` for the duration of this call.
#[unsafe(no_mangle)]
pub extern "C" fn substrate_db_open_with_config(
    config: *const substrate_config_t,
) -> *mut db_connection_t {
    let engine_config = if config.is_null() {
        EngineConfig::default()
    } else {
        // SAFETY: caller contract requires `config` to be a valid pointer
        // or null, checked above.
        (unsafe { *config }).into()
    };
    report(|| Substrate::new(engine_config))
        .map(|substrate| {
            into_handle(db_connection_t {
                substrate: Arc::new(substrate),
            })
        })
        .unwrap_or(std::ptr::null_mut())
}

/// Seed the immutable Unicode-scalar foundation (spec.md §4.5) from
/// `codepoints[0..len)`. Returns `true` on success; `false` (with
/// `substrate_get_last_error` populated) if any codepoint is invalid or
/// the foundation is already sealed.
///
/// # Safety
/// `conn` must be a live handle from [`substrate_db_open`]/
/// [`substrate_db_open_with_config`]. `codepoints` must point to `len`
/// valid `u32` values.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn substrate_db_seed_atoms(
    conn: *mut db_connection_t,
    codepoints: *const u32,
    len: usize,
) -> bool {
    let Some(conn) = (unsafe { as_ref(conn as *const db_connection_t) }) else {
        return false;
    };
    if codepoints.is_null() {
        return false;
    }
    // SAFETY: caller contract guarantees `len` valid `u32`s at `codepoints`.
    let slice = unsafe { std::slice::from_raw_parts(codepoints, len) };
    report(|| conn.substrate.seed_atoms(slice.iter().copied())).is_some()
}

/// Number of atoms seeded so far (spec.md §8 scenario 1's `count(atom)`).
///
/// # Safety
/// `conn` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn substrate_db_atom_count(conn: *const db_connection_t) -> u64 {
    let Some(conn) = (unsafe { as_ref(conn) }) else {
        return 0;
    };
    conn.substrate.atoms.len() as u64
}

/// Clone the engine handle held by `conn` into a fresh `Arc`, for wiring
/// into an ingester/query/walk handle. Internal to this crate.
pub(crate) fn substrate_of(conn: &db_connection_t) -> Arc<Substrate> {
    conn.substrate.clone()
}

/// Close and free a `db_connection_t` opened by this crate.
///
/// # Safety
/// `conn` must be either null or a handle from this crate not already
/// freed, and must not be used again after this call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn substrate_db_close(conn: *mut db_connection_t) {
    unsafe { drop_handle(conn) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_default_then_seed_then_close() {
        let conn = substrate_db_open();
        assert!(!conn.is_null());
        let codepoints = [65u32, 66, 67];
        let ok = unsafe { substrate_db_seed_atoms(conn, codepoints.as_ptr(), codepoints.len()) };
        assert!(ok);
        assert_eq!(unsafe { substrate_db_atom_count(conn) }, 3);
        unsafe { substrate_db_close(conn) };
    }

    #[test]
    fn seeding_twice_is_rejected_on_second_distinct_call() {
        let conn = substrate_db_open();
        let first = [65u32];
        let second = [66u32];
        assert!(unsafe { substrate_db_seed_atoms(conn, first.as_ptr(), 1) });
        assert!(!unsafe { substrate_db_seed_atoms(conn, second.as_ptr(), 1) });
        unsafe { substrate_db_close(conn) };
    }

    #[test]
    fn out_of_range_config_returns_null() {
        let mut cfg = substrate_config_t {
            ngram_max_n: 7,
            ngram_min_occ: 2,
            ngram_llr_threshold: 3.0,
            cooccurrence_window: 5,
            rating_k_factor: 32.0,
            rating_base_default: 1500.0,
            gravitational_radius: 0.05,
            walk_energy: 1.0,
            walk_decay: 0.05,
            walk_temperature: 0.7,
            walk_max_tokens: 200,
            walk_alpha: 0.3,
            walk_beta: 1.0,
            check_interval: 1024,
            walk_visited_cap: 4096,
        };
        cfg.rating_base_default = 9000.0;
        let conn = substrate_db_open_with_config(&cfg);
        assert!(conn.is_null());
    }
}
