//! Ownership of core-allocated memory crossing the ABI boundary (spec.md
//! §4.12): every buffer a query/walk entry point hands back is freed
//! through exactly one of these functions, never through the caller's
//! own allocator.

use std::ffi::c_char;

use crate::query_abi::{substrate_gravitational_candidate_t, substrate_related_candidate_t};

/// Free a string previously returned in a `text_ptr`/`text_len` pair
/// (e.g. [`crate::query_abi::substrate_answer_t`]).
///
/// # Safety
/// `ptr`/`len` must be exactly the pair most recently returned together
/// from this crate and not already freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn substrate_free_string(ptr: *mut c_char, len: usize) {
    if ptr.is_null() {
        return;
    }
    // SAFETY: caller contract requires this to be a `Vec<u8>` of exactly
    // `len` bytes, leaked via `into_raw_parts`-style boxing in query_abi.
    drop(unsafe { Vec::from_raw_parts(ptr as *mut u8, len, len) });
}

/// Free an array returned by [`crate::query_abi::substrate_query_find_related`].
///
/// # Safety
/// `ptr`/`len` must be exactly the pair returned together from that call
/// and not already freed. Each element's `text_ptr` is freed along with
/// the array; do not separately call [`substrate_free_string`] on it.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn substrate_free_related_candidates(
    ptr: *mut substrate_related_candidate_t,
    len: usize,
) {
    if ptr.is_null() {
        return;
    }
    // SAFETY: see struct-level contract above.
    let items = unsafe { Vec::from_raw_parts(ptr, len, len) };
    for item in items {
        if !item.text_ptr.is_null() {
            drop(unsafe {
                Vec::from_raw_parts(item.text_ptr as *mut u8, item.text_len, item.text_len)
            });
        }
    }
}

/// Free an array returned by
/// [`crate::query_abi::substrate_query_find_gravitational_truth`].
///
/// # Safety
/// Same contract as [`substrate_free_related_candidates`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn substrate_free_gravitational_candidates(
    ptr: *mut substrate_gravitational_candidate_t,
    len: usize,
) {
    if ptr.is_null() {
        return;
    }
    let items = unsafe { Vec::from_raw_parts(ptr, len, len) };
    for item in items {
        if !item.text_ptr.is_null() {
            drop(unsafe {
                Vec::from_raw_parts(item.text_ptr as *mut u8, item.text_len, item.text_len)
            });
        }
    }
}

/// Box a UTF-8 string into a leaked, exactly-sized byte buffer plus
/// length, the representation every `text_ptr`/`text_len` field in this
/// crate shares.
pub(crate) fn leak_string(s: String) -> (*mut c_char, usize) {
    let mut bytes = s.into_bytes();
    bytes.shrink_to_fit();
    let len = bytes.len();
    let ptr = bytes.as_mut_ptr();
    std::mem::forget(bytes);
    (ptr as *mut c_char, len)
}
