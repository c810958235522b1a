//! macOS loader.
//!
//! Same `dlopen` family as Unix with `.dylib` naming. No preload workaround.

use crate::detect::Platform;
use crate::dl;
use crate::error::Result;
use crate::loader::{DynamicLibraryLoader, LibraryHandle, LibraryNaming, SymbolAddress};

const PROBE_LIBRARY: &str = "/usr/lib/libSystem.B.dylib";

/// Returns true if `dlopen` works on this host.
pub(crate) fn probe() -> bool {
    match dl::open(PROBE_LIBRARY, libc::RTLD_NOW) {
        Ok(handle) => {
            dl::close(handle);
            true
        }
        Err(_) => false,
    }
}

/// `dlopen`-based loader for `lib<name>.dylib` libraries.
#[derive(Debug, Default)]
pub struct MacOsxLoader;

impl MacOsxLoader {
    /// Creates a loader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DynamicLibraryLoader for MacOsxLoader {
    fn platform(&self) -> Platform {
        Platform::MacOsx
    }

    fn naming(&self) -> LibraryNaming {
        LibraryNaming::MACOSX
    }

    fn open(&self, file_name: &str) -> Result<LibraryHandle> {
        dl::open(file_name, libc::RTLD_NOW)
    }

    fn free(&self, handle: LibraryHandle) {
        dl::close(handle);
    }

    fn resolve_symbol(&self, handle: &LibraryHandle, name: &str) -> Result<SymbolAddress> {
        dl::resolve(handle, name)
    }
}
