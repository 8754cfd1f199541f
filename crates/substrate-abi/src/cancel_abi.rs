//! ABI layer for cooperative cancellation (spec.md §5/§4.8/§4.11).
//!
//! A `cancel_token_t` is a cloneable handle; cancelling it from any
//! thread is observed by the ingest/walk loop holding the matching
//! `CancellationToken` on its next `check_interval` boundary.

use crate::handle::{as_ref, drop_handle, into_handle};
use substrate_core::cancel::CancellationToken;

pub struct cancel_token_t {
    pub(crate) token: CancellationToken,
}

/// Create a fresh, non-cancelled token.
#[unsafe(no_mangle)]
pub extern "C" fn substrate_cancel_token_new() -> *mut cancel_token_t {
    into_handle(cancel_token_t {
        token: CancellationToken::new(),
    })
}

/// Signal cancellation. Safe to call from a different thread than the
/// one running the ingest/walk loop.
///
/// # Safety
/// `token` must be a live handle from [`substrate_cancel_token_new`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn substrate_cancel_token_cancel(token: *const cancel_token_t) {
    if let Some(t) = unsafe { as_ref(token) } {
        t.token.cancel();
    }
}

/// Whether cancellation has been requested.
///
/// # Safety
/// `token` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn substrate_cancel_token_is_cancelled(token: *const cancel_token_t) -> bool {
    unsafe { as_ref(token) }.is_some_and(|t| t.token.is_cancelled())
}

/// Free a token returned by [`substrate_cancel_token_new`].
///
/// # Safety
/// `token` must be either null or a handle from this crate not already
/// freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn substrate_cancel_token_free(token: *mut cancel_token_t) {
    unsafe { drop_handle(token) };
}

/// Borrow the token inside `ptr`, or a fresh never-cancelled one if `ptr`
/// is null — every ingest/walk entry point accepts an optional token.
///
/// # Safety
/// `ptr` must be either null or a live handle.
pub(crate) unsafe fn token_or_default(ptr: *const cancel_token_t) -> CancellationToken {
    unsafe { as_ref(ptr) }
        .map(|h| h.token.clone())
        .unwrap_or_default()
}
