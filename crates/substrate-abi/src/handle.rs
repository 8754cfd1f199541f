//! Opaque-handle plumbing shared by every handle type in this crate.
//!
//! Each handle (`db_connection_t`, `ingester_t`, `query_t`, `walk_t`) is a
//! `Box<T>` leaked across the boundary as a raw pointer via
//! [`into_handle`], and reclaimed by the matching `free_*` call via
//! [`drop_handle`]. Borrowing a handle for the duration of a call (never
//! taking ownership back) goes through [`as_ref`].

/// Leak `value` onto the heap and hand back the raw pointer a C caller
/// holds as its opaque handle.
pub(crate) fn into_handle<T>(value: T) -> *mut T {
    Box::into_raw(Box::new(value))
}

/// Borrow a handle for the duration of one call. Returns `None` for a
/// null pointer instead of dereferencing it.
///
/// # Safety
/// `ptr` must be either null or a pointer previously returned by
/// [`into_handle`] for the same `T`, not yet passed to [`drop_handle`].
pub(crate) unsafe fn as_ref<'a, T>(ptr: *const T) -> Option<&'a T> {
    unsafe { ptr.as_ref() }
}

/// Reclaim and drop a handle previously returned by [`into_handle`].
/// A null pointer is a no-op, matching `free(NULL)` semantics.
///
/// # Safety
/// `ptr` must be either null or a pointer previously returned by
/// [`into_handle`] for the same `T`, and must not be used again (by this
/// call or any other) after this call returns.
pub(crate) unsafe fn drop_handle<T>(ptr: *mut T) {
    if !ptr.is_null() {
        drop(unsafe { Box::from_raw(ptr) });
    }
}
