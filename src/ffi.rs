//! C ABI - process-wide runtime lifecycle and reference counting
//!
//! Design: Handles cross the boundary as nonzero `u64`s (0 means "no
//! object"). Every entry point records an [`ErrorCode`] for the calling
//! thread, readable with `classtree_last_error`, so hosts can tell a dead
//! handle from an uninitialized runtime.

use std::cell::Cell;

use crate::config::RuntimeConfig;
use crate::error::{InstanceError, RuntimeError};
use crate::instance::ObjectHandle;
use crate::logging::{self, debug};
use crate::runtime::{initialize_runtime, shutdown_runtime, with_runtime, Runtime};
use crate::tag::TypeTag;

/// Outcome of the most recent C call on this thread
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Ok = 0,
    NotInitialized = 1,
    AlreadyInitialized = 2,
    InvalidConfig = 3,
    UnknownClass = 4,
    InvalidHandle = 5,
    DoubleRelease = 6,
    OutOfMemory = 7,
    Other = 99,
}

impl From<&RuntimeError> for ErrorCode {
    fn from(err: &RuntimeError) -> Self {
        match err {
            RuntimeError::NotInitialized => ErrorCode::NotInitialized,
            RuntimeError::AlreadyInitialized => ErrorCode::AlreadyInitialized,
            RuntimeError::Config(_) => ErrorCode::InvalidConfig,
            RuntimeError::Instance(err) => err.into(),
            RuntimeError::Registration(_) | RuntimeError::Dispatch(_) => ErrorCode::Other,
        }
    }
}

impl From<&InstanceError> for ErrorCode {
    fn from(err: &InstanceError) -> Self {
        match err {
            InstanceError::UnknownClass(_) => ErrorCode::UnknownClass,
            InstanceError::InvalidHandle(_) => ErrorCode::InvalidHandle,
            InstanceError::DoubleRelease(_) => ErrorCode::DoubleRelease,
            InstanceError::OutOfMemory(_) => ErrorCode::OutOfMemory,
            InstanceError::NotAnAncestor { .. } | InstanceError::RefCountOverflow(_) => ErrorCode::Other,
        }
    }
}

thread_local! {
    static LAST_ERROR: Cell<ErrorCode> = Cell::new(ErrorCode::Ok);
}

fn set_last_error(code: ErrorCode) {
    LAST_ERROR.with(|cell| cell.set(code));
}

/// Run `f` on the global runtime, flattening both failure layers into the
/// thread's error slot
fn call<T>(f: impl FnOnce(&mut Runtime) -> Result<T, InstanceError>) -> Option<T> {
    match with_runtime(f) {
        Ok(Ok(value)) => {
            set_last_error(ErrorCode::Ok);
            Some(value)
        }
        Ok(Err(err)) => {
            debug!(error = %err, "C call failed");
            set_last_error((&err).into());
            None
        }
        Err(err) => {
            set_last_error((&err).into());
            None
        }
    }
}

/// Install the process-wide runtime, configured from `CLASSTREE_*`
/// variables; also sets up logging. Returns 0 on success.
#[no_mangle]
pub extern "C" fn classtree_runtime_init() -> i32 {
    logging::init();

    let result = RuntimeConfig::from_env()
        .map_err(RuntimeError::from)
        .and_then(initialize_runtime);

    let code = match &result {
        Ok(()) => ErrorCode::Ok,
        Err(err) => err.into(),
    };
    set_last_error(code);
    code as i32
}

/// Tear down the process-wide runtime
///
/// Returns the number of instances that were still alive, or -1 if the
/// runtime was not initialized.
#[no_mangle]
pub extern "C" fn classtree_runtime_shutdown() -> i64 {
    match shutdown_runtime() {
        Ok(report) => {
            set_last_error(ErrorCode::Ok);
            report.leaked_instances as i64
        }
        Err(err) => {
            set_last_error((&err).into());
            -1
        }
    }
}

/// Create an instance of class `tag`; returns 0 on failure
#[no_mangle]
pub extern "C" fn classtree_create_instance(tag: u32) -> u64 {
    call(|rt| rt.create_instance(TypeTag::from_raw(tag)))
        .map_or(0, ObjectHandle::to_bits)
}

/// Add a reference; returns the new count, or 0 on failure
#[no_mangle]
pub extern "C" fn classtree_retain(handle: u64) -> u32 {
    let Some(handle) = ObjectHandle::from_bits(handle) else {
        set_last_error(ErrorCode::InvalidHandle);
        return 0;
    };
    call(|rt| rt.retain(handle)).unwrap_or(0)
}

/// Drop a reference; returns the remaining count (0 once destroyed), or -1
/// on failure
#[no_mangle]
pub extern "C" fn classtree_release(handle: u64) -> i64 {
    let Some(handle) = ObjectHandle::from_bits(handle) else {
        set_last_error(ErrorCode::InvalidHandle);
        return -1;
    };
    call(|rt| rt.release(handle)).map_or(-1, i64::from)
}

/// Current reference count; 0 for dead handles
#[no_mangle]
pub extern "C" fn classtree_ref_count(handle: u64) -> u32 {
    let Some(handle) = ObjectHandle::from_bits(handle) else {
        set_last_error(ErrorCode::InvalidHandle);
        return 0;
    };
    call(|rt| rt.ref_count(handle)).unwrap_or(0)
}

/// Whether class `tag` is `ancestor` or derives from it
#[no_mangle]
pub extern "C" fn classtree_is_descendant_of(tag: u32, ancestor: u32) -> bool {
    call(|rt| Ok(rt.is_descendant_of(TypeTag::from_raw(tag), TypeTag::from_raw(ancestor))))
        .unwrap_or(false)
}

/// [`ErrorCode`] of the last C call made on this thread
#[no_mangle]
pub extern "C" fn classtree_last_error() -> i32 {
    LAST_ERROR.with(|cell| cell.get()) as i32
}
