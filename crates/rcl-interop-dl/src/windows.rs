//! Windows loaders: desktop (`LoadLibraryA`) and UWP (`LoadPackagedLibrary`).
//!
//! Both share `<name>.dll` naming, `FreeLibrary` and `GetProcAddress`.

use std::ffi::{CString, c_void};

use windows_sys::Win32::Foundation::{GetLastError, SetLastError};
use windows_sys::Win32::System::LibraryLoader::{
    FreeLibrary, GetProcAddress, LoadLibraryA, LoadPackagedLibrary,
};

use crate::detect::Platform;
use crate::error::{DlError, Result};
use crate::loader::{DynamicLibraryLoader, LibraryHandle, LibraryNaming, SymbolAddress};

const DESKTOP_PROBE_LIBRARY: &str = "kernel32.dll";
const UWP_PROBE_LIBRARY: &str = "api-ms-win-core-libraryloader-l2-1-0.dll";

pub(crate) fn probe_desktop() -> bool {
    match open_desktop(DESKTOP_PROBE_LIBRARY) {
        Ok(handle) => {
            free(handle);
            true
        }
        Err(_) => false,
    }
}

pub(crate) fn probe_uwp() -> bool {
    match open_packaged(UWP_PROBE_LIBRARY) {
        Ok(handle) => {
            free(handle);
            true
        }
        Err(_) => false,
    }
}

fn last_error_message() -> String {
    std::io::Error::last_os_error().to_string()
}

fn open_desktop(file_name: &str) -> Result<LibraryHandle> {
    let c_name = CString::new(file_name)
        .map_err(|_| DlError::link(file_name, "file name contains a NUL byte"))?;
    // SAFETY: `c_name` is NUL-terminated and outlives the call.
    let raw = unsafe { LoadLibraryA(c_name.as_ptr().cast()) };
    wrap(file_name, raw)
}

fn open_packaged(file_name: &str) -> Result<LibraryHandle> {
    let wide: Vec<u16> = file_name.encode_utf16().chain(std::iter::once(0)).collect();
    if wide[..wide.len() - 1].contains(&0) {
        return Err(DlError::link(file_name, "file name contains a NUL byte"));
    }
    // SAFETY: `wide` is NUL-terminated UTF-16 and outlives the call.
    let raw = unsafe { LoadPackagedLibrary(wide.as_ptr(), 0) };
    wrap(file_name, raw)
}

fn wrap(file_name: &str, raw: *mut c_void) -> Result<LibraryHandle> {
    // SAFETY: a non-null module handle is a fresh reference we now own.
    match unsafe { LibraryHandle::from_raw(raw) } {
        Some(handle) => {
            tracing::debug!(file = file_name, ?handle, "opened library");
            Ok(handle)
        }
        None => Err(DlError::link(file_name, last_error_message())),
    }
}

fn free(handle: LibraryHandle) {
    // SAFETY: the handle came from a successful load and is consumed here.
    let ok = unsafe { FreeLibrary(handle.into_raw()) };
    if ok == 0 {
        tracing::warn!(error = %last_error_message(), "FreeLibrary failed");
    }
}

/// A null address alone is the failure signal: `GetProcAddress` never
/// yields a legitimate null export. The last-error slot is cleared first so
/// the message describes this call only.
fn resolve(handle: &LibraryHandle, name: &str) -> Result<SymbolAddress> {
    let c_name =
        CString::new(name).map_err(|_| DlError::symbol(name, "symbol name contains a NUL byte"))?;
    // SAFETY: plain thread-local error slot accessors; the handle is live for
    // the borrow and `c_name` outlives the call.
    let (proc, error) = unsafe {
        SetLastError(0);
        let proc = GetProcAddress(handle.as_ptr(), c_name.as_ptr().cast());
        (proc, GetLastError())
    };
    match proc {
        Some(function) => Ok(SymbolAddress::new(function as *mut c_void)),
        None => Err(DlError::symbol(name, proc_error_message(error))),
    }
}

fn proc_error_message(error: u32) -> String {
    if error == 0 {
        "GetProcAddress: returned NULL".to_string()
    } else {
        format!(
            "GetProcAddress: {}",
            std::io::Error::from_raw_os_error(error as i32)
        )
    }
}

/// Loader for classic desktop Windows.
#[derive(Debug, Default)]
pub struct WindowsDesktopLoader;

impl WindowsDesktopLoader {
    /// Creates a loader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DynamicLibraryLoader for WindowsDesktopLoader {
    fn platform(&self) -> Platform {
        Platform::WindowsDesktop
    }

    fn naming(&self) -> LibraryNaming {
        LibraryNaming::WINDOWS
    }

    fn open(&self, file_name: &str) -> Result<LibraryHandle> {
        open_desktop(file_name)
    }

    fn free(&self, handle: LibraryHandle) {
        free(handle);
    }

    fn resolve_symbol(&self, handle: &LibraryHandle, name: &str) -> Result<SymbolAddress> {
        resolve(handle, name)
    }
}

/// Loader for packaged (UWP) applications.
#[derive(Debug, Default)]
pub struct UwpLoader;

impl UwpLoader {
    /// Creates a loader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DynamicLibraryLoader for UwpLoader {
    fn platform(&self) -> Platform {
        Platform::Uwp
    }

    fn naming(&self) -> LibraryNaming {
        LibraryNaming::WINDOWS
    }

    fn open(&self, file_name: &str) -> Result<LibraryHandle> {
        open_packaged(file_name)
    }

    fn free(&self, handle: LibraryHandle) {
        free(handle);
    }

    fn resolve_symbol(&self, handle: &LibraryHandle, name: &str) -> Result<SymbolAddress> {
        resolve(handle, name)
    }
}
