//! ABI layer for the `query_t` handle (spec.md §4.10/§4.12).

use std::ffi::c_char;
use std::sync::Arc;

use crate::db_abi::{db_connection_t, substrate_of};
use crate::error_abi::report;
use crate::handle::{as_ref, drop_handle, into_handle};
use crate::memory::leak_string;
use substrate_core::Substrate;
use substrate_core::query::QueryEngine;

pub struct query_t {
    substrate: Arc<Substrate>,
}

/// One `find_related` result, crossing the boundary as a flat array
/// (spec.md §4.12): the core allocates the array and every element's
/// string, freed together via
/// [`crate::memory::substrate_free_related_candidates`].
#[repr(C)]
pub struct substrate_related_candidate_t {
    pub text_ptr: *mut c_char,
    pub text_len: usize,
    pub composition_id: [u8; 16],
    pub relation_id: [u8; 16],
    pub consensus_elo: f64,
    pub observations: u64,
}

/// One `find_gravitational_truth` result.
#[repr(C)]
pub struct substrate_gravitational_candidate_t {
    pub text_ptr: *mut c_char,
    pub text_len: usize,
    pub composition_id: [u8; 16],
    pub relation_id: [u8; 16],
    pub base_elo: f64,
    pub observations: u64,
    pub cluster_density: u64,
    pub score: f64,
}

/// `answer_question`'s single result.
#[repr(C)]
pub struct substrate_answer_t {
    pub text_ptr: *mut c_char,
    pub text_len: usize,
    pub score: f64,
    pub supporting_keywords: u64,
}

/// Create a query handle bound to `conn`'s engine.
///
/// # Safety
/// `conn` must be a live `db_connection_t` handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn substrate_query_new(conn: *const db_connection_t) -> *mut query_t {
    let Some(conn) = (unsafe { as_ref(conn) }) else {
        return std::ptr::null_mut();
    };
    into_handle(query_t {
        substrate: substrate_of(conn),
    })
}

/// Rank `text`'s relation neighbours by consensus ELO (spec.md §4.10).
/// On success, `*out_ptr`/`*out_len` describe a freshly allocated array
/// to be freed with [`crate::memory::substrate_free_related_candidates`].
///
/// # Safety
/// `query` must be a live handle. `text` must point to `text_len` bytes
/// of valid UTF-8. `out_ptr`/`out_len` must point to writable storage.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn substrate_query_find_related(
    query: *const query_t,
    text: *const u8,
    text_len: usize,
    limit: usize,
    out_ptr: *mut *mut substrate_related_candidate_t,
    out_len: *mut usize,
) -> bool {
    let Some(query) = (unsafe { as_ref(query) }) else {
        return false;
    };
    if text.is_null() || out_ptr.is_null() || out_len.is_null() {
        return false;
    }
    let result = report(|| {
        let text = unsafe { std::slice::from_raw_parts(text, text_len) };
        let text = std::str::from_utf8(text)
            .map_err(|e| substrate_core::Error::InvalidInput(format!("text: {e}")))?;
        QueryEngine::new(&query.substrate).find_related(text, limit)
    });
    match result {
        Some(candidates) => {
            let mut items: Vec<substrate_related_candidate_t> = candidates
                .into_iter()
                .map(|c| {
                    let (text_ptr, text_len) = leak_string(c.text);
                    substrate_related_candidate_t {
                        text_ptr,
                        text_len,
                        composition_id: *c.composition_id.as_bytes(),
                        relation_id: *c.relation_id.as_bytes(),
                        consensus_elo: c.consensus_elo,
                        observations: c.observations,
                    }
                })
                .collect();
            items.shrink_to_fit();
            let len = items.len();
            let ptr = items.as_mut_ptr();
            std::mem::forget(items);
            unsafe {
                *out_ptr = ptr;
                *out_len = len;
            }
            true
        }
        None => false,
    }
}

/// "Truths cluster, lies scatter" (spec.md §4.10). Same allocation
/// contract as [`substrate_query_find_related`], freed with
/// [`crate::memory::substrate_free_gravitational_candidates`].
///
/// # Safety
/// Same contract as [`substrate_query_find_related`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn substrate_query_find_gravitational_truth(
    query: *const query_t,
    text: *const u8,
    text_len: usize,
    min_base_elo: f64,
    limit: usize,
    out_ptr: *mut *mut substrate_gravitational_candidate_t,
    out_len: *mut usize,
) -> bool {
    let Some(query) = (unsafe { as_ref(query) }) else {
        return false;
    };
    if text.is_null() || out_ptr.is_null() || out_len.is_null() {
        return false;
    }
    let result = report(|| {
        let text = unsafe { std::slice::from_raw_parts(text, text_len) };
        let text = std::str::from_utf8(text)
            .map_err(|e| substrate_core::Error::InvalidInput(format!("text: {e}")))?;
        QueryEngine::new(&query.substrate).find_gravitational_truth(text, min_base_elo, limit)
    });
    match result {
        Some(candidates) => {
            let mut items: Vec<substrate_gravitational_candidate_t> = candidates
                .into_iter()
                .map(|c| {
                    let (text_ptr, text_len) = leak_string(c.text);
                    substrate_gravitational_candidate_t {
                        text_ptr,
                        text_len,
                        composition_id: *c.composition_id.as_bytes(),
                        relation_id: *c.relation_id.as_bytes(),
                        base_elo: c.base_elo,
                        observations: c.observations,
                        cluster_density: c.cluster_density as u64,
                        score: c.score,
                    }
                })
                .collect();
            items.shrink_to_fit();
            let len = items.len();
            let ptr = items.as_mut_ptr();
            std::mem::forget(items);
            unsafe {
                *out_ptr = ptr;
                *out_len = len;
            }
            true
        }
        None => false,
    }
}

/// Answer a free-text question (spec.md §4.10). On success, `*out`
/// carries a single allocated string field freed with
/// [`crate::memory::substrate_free_string`].
///
/// # Safety
/// `query` must be a live handle. `question` must point to `question_len`
/// bytes of valid UTF-8. `out` must point to writable storage.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn substrate_query_answer_question(
    query: *const query_t,
    question: *const u8,
    question_len: usize,
    out: *mut substrate_answer_t,
) -> bool {
    let Some(query) = (unsafe { as_ref(query) }) else {
        return false;
    };
    if question.is_null() || out.is_null() {
        return false;
    }
    let result = report(|| {
        let question = unsafe { std::slice::from_raw_parts(question, question_len) };
        let question = std::str::from_utf8(question)
            .map_err(|e| substrate_core::Error::InvalidInput(format!("question: {e}")))?;
        QueryEngine::new(&query.substrate).answer_question(question)
    });
    match result {
        Some(answer) => {
            let (text_ptr, text_len) = leak_string(answer.text);
            unsafe {
                *out = substrate_answer_t {
                    text_ptr,
                    text_len,
                    score: answer.score,
                    supporting_keywords: answer.supporting_keywords as u64,
                };
            }
            true
        }
        None => false,
    }
}

/// Free a query handle returned by [`substrate_query_new`].
///
/// # Safety
/// `query` must be either null or a handle from this crate not already
/// freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn substrate_query_free(query: *mut query_t) {
    unsafe { drop_handle(query) };
}
