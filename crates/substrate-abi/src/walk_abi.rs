//! ABI layer for the `walk_t` handle (spec.md §4.11/§4.12): stochastic
//! walk generation, including a streaming variant driven by a C callback.

use std::ffi::c_void;
use std::sync::Arc;

use crate::cancel_abi::{cancel_token_t, token_or_default};
use crate::db_abi::{db_connection_t, substrate_of};
use crate::error_abi::report;
use crate::handle::{as_ref, drop_handle, into_handle};
use crate::memory::leak_string;
use substrate_core::Substrate;
use substrate_core::walk::{FinishReason, WalkEngine, WalkParams};

pub struct walk_t {
    substrate: Arc<Substrate>,
}

/// Per-call walk overrides (spec.md §4.11/§6), with sentinel values
/// standing in for "use the engine default": `NAN` for the `f64` fields,
/// a negative value for `max_tokens`, and a null pointer for
/// `stop_text_ptr`.
#[repr(C)]
pub struct substrate_walk_params_t {
    pub energy: f64,
    pub max_tokens: i64,
    pub temperature: f64,
    pub top_p: f64,
    pub stop_text_ptr: *const u8,
    pub stop_text_len: usize,
}

impl substrate_walk_params_t {
    /// # Safety
    /// `stop_text_ptr` must be either null or point to `stop_text_len`
    /// bytes of valid UTF-8.
    unsafe fn to_walk_params(&self) -> Result<WalkParams, substrate_core::Error> {
        let stop_text = if self.stop_text_ptr.is_null() {
            None
        } else {
            let bytes = unsafe { std::slice::from_raw_parts(self.stop_text_ptr, self.stop_text_len) };
            Some(
                std::str::from_utf8(bytes)
                    .map_err(|e| substrate_core::Error::InvalidInput(format!("stop_text: {e}")))?
                    .to_string(),
            )
        };
        Ok(WalkParams {
            energy: (!self.energy.is_nan()).then_some(self.energy),
            max_tokens: (self.max_tokens >= 0).then_some(self.max_tokens as usize),
            temperature: (!self.temperature.is_nan()).then_some(self.temperature),
            top_p: (!self.top_p.is_nan()).then_some(self.top_p),
            stop_text,
        })
    }
}

/// A reasonable "use every default" value for callers that don't want to
/// override anything.
#[unsafe(no_mangle)]
pub extern "C" fn substrate_walk_params_default() -> substrate_walk_params_t {
    substrate_walk_params_t {
        energy: f64::NAN,
        max_tokens: -1,
        temperature: f64::NAN,
        top_p: f64::NAN,
        stop_text_ptr: std::ptr::null(),
        stop_text_len: 0,
    }
}

/// C-compatible mirror of [`FinishReason`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum substrate_finish_reason_t {
    Energy = 0,
    Length = 1,
    Stop = 2,
    DeadEnd = 3,
    Cancelled = 4,
}

impl From<FinishReason> for substrate_finish_reason_t {
    fn from(r: FinishReason) -> Self {
        match r {
            FinishReason::Energy => Self::Energy,
            FinishReason::Length => Self::Length,
            FinishReason::Stop => Self::Stop,
            FinishReason::DeadEnd => Self::DeadEnd,
            FinishReason::Cancelled => Self::Cancelled,
        }
    }
}

#[repr(C)]
pub struct substrate_walk_result_t {
    pub text_ptr: *mut std::ffi::c_char,
    pub text_len: usize,
    pub finish_reason: substrate_finish_reason_t,
    pub steps: u64,
    pub energy_remaining: f64,
}

/// Create a walk handle bound to `conn`'s engine.
///
/// # Safety
/// `conn` must be a live `db_connection_t` handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn substrate_walk_new(conn: *const db_connection_t) -> *mut walk_t {
    let Some(conn) = (unsafe { as_ref(conn) }) else {
        return std::ptr::null_mut();
    };
    into_handle(walk_t {
        substrate: substrate_of(conn),
    })
}

/// Run a walk from `prompt` to completion. On success, `*out`'s
/// `text_ptr`/`text_len` must be freed with
/// [`crate::memory::substrate_free_string`].
///
/// # Safety
/// `walk` must be a live handle. `prompt` must point to `prompt_len`
/// bytes of valid UTF-8. `params` must point to a valid
/// `substrate_walk_params_t` (its `stop_text_ptr`, if non-null, must
/// point to `stop_text_len` bytes of valid UTF-8). `cancel` may be null.
/// `out` must point to writable storage.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn substrate_walk_run(
    walk: *const walk_t,
    prompt: *const u8,
    prompt_len: usize,
    params: *const substrate_walk_params_t,
    cancel: *const cancel_token_t,
    out: *mut substrate_walk_result_t,
) -> bool {
    let Some(walk) = (unsafe { as_ref(walk) }) else {
        return false;
    };
    if prompt.is_null() || params.is_null() || out.is_null() {
        return false;
    }
    let result = report(|| {
        let prompt = unsafe { std::slice::from_raw_parts(prompt, prompt_len) };
        let prompt = std::str::from_utf8(prompt)
            .map_err(|e| substrate_core::Error::InvalidInput(format!("prompt: {e}")))?;
        let walk_params = unsafe { (*params).to_walk_params() }?;
        let cancel_token = unsafe { token_or_default(cancel) };
        WalkEngine::new(&walk.substrate).run(prompt, &walk_params, &cancel_token)
    });
    match result {
        Some(r) => {
            let (text_ptr, text_len) = leak_string(r.text);
            unsafe {
                *out = substrate_walk_result_t {
                    text_ptr,
                    text_len,
                    finish_reason: r.finish_reason.into(),
                    steps: r.steps as u64,
                    energy_remaining: r.energy_remaining,
                };
            }
            true
        }
        None => false,
    }
}

/// C callback invoked with each newly appended fragment during a
/// streaming walk; returning `false` stops the walk cooperatively
/// (spec.md §4.11). `user_data` is the opaque pointer passed through
/// unchanged from [`substrate_walk_run_streaming`].
pub type substrate_walk_fragment_cb =
    unsafe extern "C" fn(fragment: *const u8, fragment_len: usize, user_data: *mut c_void) -> bool;

/// Streaming variant of [`substrate_walk_run`]: `callback` is invoked
/// once per appended fragment. Same allocation contract for `*out` as
/// [`substrate_walk_run`].
///
/// # Safety
/// Same contract as [`substrate_walk_run`], plus: `callback` must be a
/// valid function pointer safe to call from this thread any number of
/// times during this call, and `user_data` must remain valid for the
/// duration of this call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn substrate_walk_run_streaming(
    walk: *const walk_t,
    prompt: *const u8,
    prompt_len: usize,
    params: *const substrate_walk_params_t,
    cancel: *const cancel_token_t,
    callback: substrate_walk_fragment_cb,
    user_data: *mut c_void,
    out: *mut substrate_walk_result_t,
) -> bool {
    let Some(walk) = (unsafe { as_ref(walk) }) else {
        return false;
    };
    if prompt.is_null() || params.is_null() || out.is_null() {
        return false;
    }
    // Wraps `user_data` so the closure below can cross into `run_streaming`'s
    // `&mut dyn FnMut` without `user_data` needing to be `Send`: this call
    // runs to completion on the calling thread.
    struct SendPtr(*mut c_void);
    unsafe impl Send for SendPtr {}
    let data = SendPtr(user_data);

    let result = report(|| {
        let prompt = unsafe { std::slice::from_raw_parts(prompt, prompt_len) };
        let prompt = std::str::from_utf8(prompt)
            .map_err(|e| substrate_core::Error::InvalidInput(format!("prompt: {e}")))?;
        let walk_params = unsafe { (*params).to_walk_params() }?;
        let cancel_token = unsafe { token_or_default(cancel) };
        let data = data;
        let mut on_fragment = |fragment: &str| -> bool {
            unsafe { callback(fragment.as_ptr(), fragment.len(), data.0) }
        };
        WalkEngine::new(&walk.substrate).run_streaming(
            prompt,
            &walk_params,
            &cancel_token,
            &mut on_fragment,
        )
    });
    match result {
        Some(r) => {
            let (text_ptr, text_len) = leak_string(r.text);
            unsafe {
                *out = substrate_walk_result_t {
                    text_ptr,
                    text_len,
                    finish_reason: r.finish_reason.into(),
                    steps: r.steps as u64,
                    energy_remaining: r.energy_remaining,
                };
            }
            true
        }
        None => false,
    }
}

/// Free a walk handle returned by [`substrate_walk_new`].
///
/// # Safety
/// `walk` must be either null or a handle from this crate not already
/// freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn substrate_walk_free(walk: *mut walk_t) {
    unsafe { drop_handle(walk) };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_abi::{substrate_db_close, substrate_db_open, substrate_db_seed_atoms};
    use crate::ingest_abi::{
        substrate_ingest_report_t, substrate_ingester_free, substrate_ingester_ingest,
        substrate_ingester_new,
    };
    use crate::memory::substrate_free_string;

    fn seeded_conn_with_corpus(corpus: &str) -> *mut db_connection_t {
        let conn = substrate_db_open();
        let codepoints: Vec<u32> = corpus.chars().map(|c| c as u32).collect();
        unsafe { substrate_db_seed_atoms(conn, codepoints.as_ptr(), codepoints.len()) };
        let ingester = unsafe { substrate_ingester_new(conn) };
        let bytes = corpus.as_bytes();
        let source = b"doc";
        let mime = b"text/plain";
        let mut report = substrate_ingest_report_t::default();
        unsafe {
            substrate_ingester_ingest(
                ingester,
                bytes.as_ptr(),
                bytes.len(),
                source.as_ptr(),
                source.len(),
                mime.as_ptr(),
                mime.len(),
                std::ptr::null(),
                &mut report,
            );
            substrate_ingester_free(ingester);
        }
        conn
    }

    #[test]
    fn run_produces_allocated_text() {
        let conn = seeded_conn_with_corpus("the cat sat on the mat the cat ran");
        let walk = unsafe { substrate_walk_new(conn) };
        assert!(!walk.is_null());

        let prompt = b"the";
        let mut params = substrate_walk_params_default();
        params.energy = 0.2;
        params.max_tokens = 5;
        let mut out = substrate_walk_result_t {
            text_ptr: std::ptr::null_mut(),
            text_len: 0,
            finish_reason: substrate_finish_reason_t::Energy,
            steps: 0,
            energy_remaining: 0.0,
        };
        let ok = unsafe {
            substrate_walk_run(
                walk,
                prompt.as_ptr(),
                prompt.len(),
                &params,
                std::ptr::null(),
                &mut out,
            )
        };
        assert!(ok);
        assert!(!out.text_ptr.is_null());

        unsafe {
            substrate_free_string(out.text_ptr, out.text_len);
            substrate_walk_free(walk);
            substrate_db_close(conn);
        }
    }

    unsafe extern "C" fn count_calls(
        _fragment: *const u8,
        _fragment_len: usize,
        user_data: *mut c_void,
    ) -> bool {
        let counter = unsafe { &*(user_data as *const std::sync::atomic::AtomicUsize) };
        counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        true
    }

    #[test]
    fn streaming_invokes_callback_per_fragment() {
        let conn = seeded_conn_with_corpus("the cat sat on the mat the cat ran the dog sat");
        let walk = unsafe { substrate_walk_new(conn) };
        let prompt = b"the";
        let mut params = substrate_walk_params_default();
        params.energy = 5.0;
        params.max_tokens = 50;

        let counter = std::sync::atomic::AtomicUsize::new(0);
        let mut out = substrate_walk_result_t {
            text_ptr: std::ptr::null_mut(),
            text_len: 0,
            finish_reason: substrate_finish_reason_t::Energy,
            steps: 0,
            energy_remaining: 0.0,
        };
        let ok = unsafe {
            substrate_walk_run_streaming(
                walk,
                prompt.as_ptr(),
                prompt.len(),
                &params,
                std::ptr::null(),
                count_calls,
                &counter as *const _ as *mut c_void,
                &mut out,
            )
        };
        assert!(ok);
        assert!(counter.load(std::sync::atomic::Ordering::SeqCst) >= 1);

        unsafe {
            substrate_free_string(out.text_ptr, out.text_len);
            substrate_walk_free(walk);
            substrate_db_close(conn);
        }
    }
}
