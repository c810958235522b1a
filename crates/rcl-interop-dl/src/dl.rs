//! `dlopen` family shared by the Unix and macOS loaders.

use std::ffi::{CStr, CString, c_int};

use crate::error::{DlError, Result};
use crate::loader::{LibraryHandle, SymbolAddress};

/// Opens `file_name` with the given `dlopen` flags.
pub(crate) fn open(file_name: &str, flags: c_int) -> Result<LibraryHandle> {
    let c_name = CString::new(file_name)
        .map_err(|_| DlError::link(file_name, "file name contains a NUL byte"))?;

    // SAFETY: `c_name` is a valid NUL-terminated string for the duration of
    // the call.
    let raw = unsafe { libc::dlopen(c_name.as_ptr(), flags) };

    // SAFETY: a non-null `dlopen` result is a fresh reference we now own.
    match unsafe { LibraryHandle::from_raw(raw) } {
        Some(handle) => {
            tracing::debug!(file = file_name, ?handle, "opened library");
            Ok(handle)
        }
        None => {
            let detail = last_error().unwrap_or_else(|| "dlopen returned NULL".to_string());
            Err(DlError::link(file_name, detail))
        }
    }
}

/// Drops one reference obtained by [`open`].
pub(crate) fn close(handle: LibraryHandle) {
    // SAFETY: the handle came from `dlopen` and is consumed here, so it is
    // closed exactly once.
    let status = unsafe { libc::dlclose(handle.into_raw()) };
    if status != 0 {
        tracing::warn!(
            error = last_error().as_deref().unwrap_or("unknown"),
            "dlclose failed"
        );
    }
}

/// Resolves `name` in `handle`.
///
/// A null address is a valid `dlsym` result, so success is decided by the
/// thread-local `dlerror` indicator, cleared right before the call and read
/// right after it.
pub(crate) fn resolve(handle: &LibraryHandle, name: &str) -> Result<SymbolAddress> {
    let c_name =
        CString::new(name).map_err(|_| DlError::symbol(name, "symbol name contains a NUL byte"))?;

    let _ = last_error();
    // SAFETY: the handle is live for the borrow and `c_name` outlives the call.
    let raw = unsafe { libc::dlsym(handle.as_ptr(), c_name.as_ptr()) };
    let error = last_error();

    interpret(name, SymbolAddress::new(raw), error)
}

/// Decides the outcome of a resolution from its address and error indicator.
pub(crate) fn interpret(
    name: &str,
    address: SymbolAddress,
    error: Option<String>,
) -> Result<SymbolAddress> {
    match error {
        Some(message) => Err(DlError::symbol(name, format!("dlsym: {message}"))),
        None => Ok(address),
    }
}

/// Reads and clears the thread-local `dlerror` indicator.
fn last_error() -> Option<String> {
    // SAFETY: `dlerror` returns either NULL or a NUL-terminated string that
    // stays valid until the next dl call on this thread; we copy it out
    // immediately.
    unsafe {
        let message = libc::dlerror();
        if message.is_null() {
            None
        } else {
            Some(CStr::from_ptr(message).to_string_lossy().into_owned())
        }
    }
}
