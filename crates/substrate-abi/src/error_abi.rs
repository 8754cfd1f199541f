//! Thread-local error state (spec.md §4.12/§7).
//!
//! Mirrors the source repository's thread-local `dlerror` pattern
//! (`dlfcn_abi.rs`'s `DLERROR_MSG` cell), adapted to own a `String` behind
//! a `RefCell` rather than a `&'static [u8]`, since ABI error messages
//! here are dynamic (built from `substrate_core::Error`'s `Display`
//! impl), not a fixed set of static C string literals.

use std::cell::RefCell;
use std::ffi::{CString, c_char};
use substrate_core::Error;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Record `err` as this thread's last error.
pub(crate) fn set_last_error(err: &Error) {
    let msg = CString::new(err.to_string()).unwrap_or_else(|_| {
        CString::new("error message contained an interior NUL byte").unwrap()
    });
    LAST_ERROR.with(|cell| *cell.borrow_mut() = Some(msg));
}

/// Clear this thread's last error, called at the top of every successful
/// entry point so a stale message from an earlier call never leaks
/// forward.
pub(crate) fn clear_last_error() {
    LAST_ERROR.with(|cell| *cell.borrow_mut() = None);
}

/// Run `f`; on `Ok`, clear the last-error slot and return `Some(value)`.
/// On `Err`, record the error and return `None`. Every ABI entry point in
/// this crate is a thin wrapper around this function.
pub(crate) fn report<T>(f: impl FnOnce() -> Result<T, Error>) -> Option<T> {
    match f() {
        Ok(value) => {
            clear_last_error();
            Some(value)
        }
        Err(err) => {
            set_last_error(&err);
            None
        }
    }
}

/// Retrieve the calling thread's last error message, or null if the last
/// call on this thread succeeded (or no call has been made yet). The
/// returned pointer is valid until the next ABI call on this thread,
/// exactly as with POSIX `dlerror`/`strerror`; callers that need to keep
/// the message must copy it out before calling anything else.
///
/// # Safety
/// The returned pointer must not be freed by the caller and must not be
/// read after a subsequent call into this crate from the same thread.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn substrate_get_last_error() -> *const c_char {
    LAST_ERROR.with(|cell| {
        cell.borrow()
            .as_ref()
            .map_or(std::ptr::null(), |s| s.as_ptr())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_ok_clears_error_and_returns_value() {
        set_last_error(&Error::NotFound("stale".into()));
        let value = report::<i32>(|| Ok(42));
        assert_eq!(value, Some(42));
        let ptr = unsafe { substrate_get_last_error() };
        assert!(ptr.is_null());
    }

    #[test]
    fn report_err_sets_retrievable_message() {
        let value = report::<i32>(|| Err(Error::InvalidInput("bad codepoint".into())));
        assert_eq!(value, None);
        let ptr = unsafe { substrate_get_last_error() };
        assert!(!ptr.is_null());
        let msg = unsafe { std::ffi::CStr::from_ptr(ptr) }.to_str().unwrap();
        assert!(msg.contains("bad codepoint"));
    }
}
