//! Unix loader (Linux and other non-Apple systems).
//!
//! Uses `dlopen(3)` with `RTLD_NOW`. Carries the optional preload
//! workaround, which runs before every `load`/`load_no_suffix`.

use std::ffi::c_int;

use crate::config::LoaderConfig;
use crate::detect::Platform;
use crate::dl;
use crate::error::Result;
use crate::loader::{DynamicLibraryLoader, LibraryHandle, LibraryNaming, SymbolAddress};
use crate::preload::{LibraryPreloader, PreloadTarget};

/// Libraries tried by the platform probe.
const PROBE_LIBRARIES: [&str; 3] = ["libdl.so.2", "libc.so.6", "libc.so"];

/// glibc value; ignored by loaders that do not implement deep binding.
#[cfg(target_os = "linux")]
const RTLD_DEEPBIND: c_int = 0x0008;

#[cfg(target_os = "linux")]
const ISOLATED_FLAGS: c_int = libc::RTLD_NOW | RTLD_DEEPBIND;
#[cfg(not(target_os = "linux"))]
const ISOLATED_FLAGS: c_int = libc::RTLD_NOW | libc::RTLD_LOCAL;

/// Returns true if `dlopen` works on this host.
pub(crate) fn probe() -> bool {
    PROBE_LIBRARIES.iter().any(|name| match dl::open(name, libc::RTLD_NOW) {
        Ok(handle) => {
            dl::close(handle);
            true
        }
        Err(_) => false,
    })
}

/// `dlopen`-based loader for `lib<name>.so` libraries.
#[derive(Debug, Default)]
pub struct UnixLoader {
    preloader: LibraryPreloader,
}

impl UnixLoader {
    /// Creates a loader; preloading follows `config.preload`.
    #[must_use]
    pub fn new(config: &LoaderConfig) -> Self {
        Self {
            preloader: LibraryPreloader::new(config.preload.clone()),
        }
    }

    /// The preloader owned by this loader.
    #[must_use]
    pub fn preloader(&self) -> &LibraryPreloader {
        &self.preloader
    }
}

impl PreloadTarget for UnixLoader {
    fn open_isolated(&self, file_name: &str) -> Result<LibraryHandle> {
        dl::open(file_name, ISOLATED_FLAGS)
    }

    fn release(&self, handle: LibraryHandle) {
        dl::close(handle);
    }
}

impl DynamicLibraryLoader for UnixLoader {
    fn platform(&self) -> Platform {
        Platform::Unix
    }

    fn naming(&self) -> LibraryNaming {
        LibraryNaming::UNIX
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

    fn load(&self, name: &str) -> Result<LibraryHandle> {
        self.preloader.preload(self)?;
        self.open(&self.naming().native_module(name))
    }

    fn load_no_suffix(&self, name: &str) -> Result<LibraryHandle> {
        self.preloader.preload(self)?;
        self.open(&self.naming().support_library(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DlError;

    #[test]
    fn test_load_missing_native_module() {
        let loader = UnixLoader::default();
        let err = loader.load("rcl_interop_missing").unwrap_err();
        assert_eq!(
            err.link_file_name(),
            Some("librcl_interop_missing_native.so")
        );
    }

    #[test]
    fn test_load_no_suffix_missing_library() {
        let loader = UnixLoader::default();
        let err = loader.load_no_suffix("rcl_interop_missing").unwrap_err();
        assert_eq!(err.link_file_name(), Some("librcl_interop_missing.so"));
    }

    #[test]
    fn test_failed_preload_blocks_load() {
        let config = LoaderConfig::builder()
            .preload("librcl_interop_missing_preload.so")
            .build();
        let loader = UnixLoader::new(&config);
        let err = loader.load("anything").unwrap_err();
        assert!(matches!(err, DlError::Preload { .. }));
        let err = loader.load_no_suffix("anything").unwrap_err();
        assert!(matches!(err, DlError::Preload { .. }));
    }

    #[cfg(target_env = "gnu")]
    #[test]
    fn test_probe_succeeds_on_glibc() {
        assert!(probe());
    }
}
