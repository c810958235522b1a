//! Dynamic library loader contract.
//!
//! One implementation exists per [`Platform`]. The variant is chosen once
//! from the cached detection result by [`create_loader`]; callers then go
//! through the trait object and never branch on the platform themselves.

use std::ffi::c_void;
use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

use crate::config::LoaderConfig;
use crate::detect::{Platform, detect};
use crate::error::{DlError, Result};

/// Opaque handle to a mapped shared library.
///
/// Not `Clone`: [`DynamicLibraryLoader::free`] consumes it, so a handle
/// cannot be released twice through safe code.
#[derive(PartialEq, Eq)]
pub struct LibraryHandle(NonNull<c_void>);

impl LibraryHandle {
    /// Wraps a raw handle returned by a platform loader.
    ///
    /// Returns `None` for a null pointer.
    ///
    /// # Safety
    ///
    /// `raw` must come from a successful platform open call and must not be
    /// owned by any other `LibraryHandle`.
    pub unsafe fn from_raw(raw: *mut c_void) -> Option<Self> {
        NonNull::new(raw).map(Self)
    }

    /// Raw pointer value, only meaningful to the loader that produced it.
    #[must_use]
    pub fn as_ptr(&self) -> *mut c_void {
        self.0.as_ptr()
    }

    pub(crate) fn into_raw(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

impl fmt::Debug for LibraryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LibraryHandle({:p})", self.0)
    }
}

// SAFETY: dl and LoadLibrary handles are process-wide identifiers; every
// operation on them is thread-safe in the platform loaders.
unsafe impl Send for LibraryHandle {}
// SAFETY: see above.
unsafe impl Sync for LibraryHandle {}

/// Address of a resolved function or data symbol.
///
/// May legitimately be null for some data symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolAddress(*mut c_void);

impl SymbolAddress {
    /// Wraps a raw address.
    #[must_use]
    pub const fn new(raw: *mut c_void) -> Self {
        Self(raw)
    }

    /// Raw address.
    #[must_use]
    pub const fn as_ptr(&self) -> *mut c_void {
        self.0
    }

    /// Whether the symbol resolved to address zero.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }
}

// SAFETY: an address is plain data; dereferencing it is the caller's unsafe
// responsibility.
unsafe impl Send for SymbolAddress {}
// SAFETY: see above.
unsafe impl Sync for SymbolAddress {}

/// File-name convention of a platform.
///
/// Native modules carry a `_native` marker between the name and the
/// extension, support libraries do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibraryNaming {
    prefix: &'static str,
    extension: &'static str,
}

impl LibraryNaming {
    /// Marker inserted into native module names.
    pub const NATIVE_MARKER: &'static str = "_native";

    /// `lib<name>.so`
    pub const UNIX: Self = Self {
        prefix: "lib",
        extension: ".so",
    };

    /// `lib<name>.dylib`
    pub const MACOSX: Self = Self {
        prefix: "lib",
        extension: ".dylib",
    };

    /// `<name>.dll`, shared by desktop Windows and UWP.
    pub const WINDOWS: Self = Self {
        prefix: "",
        extension: ".dll",
    };

    /// Convention used by `platform`, if it has a loader.
    #[must_use]
    pub const fn for_platform(platform: Platform) -> Option<Self> {
        match platform {
            Platform::Unix => Some(Self::UNIX),
            Platform::MacOsx => Some(Self::MACOSX),
            Platform::WindowsDesktop | Platform::Uwp => Some(Self::WINDOWS),
            Platform::Unknown => None,
        }
    }

    /// File name of a native module, e.g. `libfoo_native.so`.
    #[must_use]
    pub fn native_module(&self, name: &str) -> String {
        format!(
            "{}{name}{}{}",
            self.prefix,
            Self::NATIVE_MARKER,
            self.extension
        )
    }

    /// File name of a support library, e.g. `libfoo.so`.
    #[must_use]
    pub fn support_library(&self, name: &str) -> String {
        format!("{}{name}{}", self.prefix, self.extension)
    }
}

/// Platform loader contract.
pub trait DynamicLibraryLoader: Send + Sync + fmt::Debug {
    /// Platform this loader targets.
    fn platform(&self) -> Platform;

    /// File-name convention of this platform.
    fn naming(&self) -> LibraryNaming;

    /// Opens `file_name` verbatim with the platform primitive.
    ///
    /// # Errors
    /// [`DlError::Link`] carrying `file_name` if no handle is returned.
    fn open(&self, file_name: &str) -> Result<LibraryHandle>;

    /// Releases a handle. The handle is consumed and cannot be reused.
    fn free(&self, handle: LibraryHandle);

    /// Resolves an exported symbol.
    ///
    /// # Errors
    /// [`DlError::Symbol`] if the platform reports a resolution error.
    fn resolve_symbol(&self, handle: &LibraryHandle, name: &str) -> Result<SymbolAddress>;

    /// Loads the native module for `name` (`lib<name>_native.so` and friends).
    fn load(&self, name: &str) -> Result<LibraryHandle> {
        self.open(&self.naming().native_module(name))
    }

    /// Loads a support library for `name` without the `_native` marker.
    fn load_no_suffix(&self, name: &str) -> Result<LibraryHandle> {
        self.open(&self.naming().support_library(name))
    }
}

/// Builds the loader for the detected platform.
///
/// # Errors
/// [`DlError::UnknownPlatform`] if detection failed.
pub fn create_loader(config: &LoaderConfig) -> Result<Arc<dyn DynamicLibraryLoader>> {
    create_loader_for(detect(), config)
}

/// Builds the loader for an explicit platform.
///
/// # Errors
/// [`DlError::UnknownPlatform`] for [`Platform::Unknown`],
/// [`DlError::UnsupportedPlatform`] if this build lacks that variant.
pub fn create_loader_for(
    platform: Platform,
    config: &LoaderConfig,
) -> Result<Arc<dyn DynamicLibraryLoader>> {
    config.validate()?;
    match platform {
        #[cfg(all(unix, not(target_vendor = "apple")))]
        Platform::Unix => Ok(Arc::new(crate::unix::UnixLoader::new(config))),
        #[cfg(target_vendor = "apple")]
        Platform::MacOsx => Ok(Arc::new(crate::macos::MacOsxLoader::new())),
        #[cfg(windows)]
        Platform::WindowsDesktop => Ok(Arc::new(crate::windows::WindowsDesktopLoader::new())),
        #[cfg(windows)]
        Platform::Uwp => Ok(Arc::new(crate::windows::UwpLoader::new())),
        Platform::Unknown => Err(DlError::UnknownPlatform),
        #[allow(unreachable_patterns)]
        other => Err(DlError::UnsupportedPlatform(other)),
    }
}

/// A loaded library that releases its handle when dropped.
pub struct Library {
    loader: Arc<dyn DynamicLibraryLoader>,
    handle: Option<LibraryHandle>,
    file_name: String,
}

impl Library {
    /// Loads the native module for `name`.
    pub fn load(loader: Arc<dyn DynamicLibraryLoader>, name: &str) -> Result<Self> {
        let file_name = loader.naming().native_module(name);
        let handle = loader.load(name)?;
        Ok(Self::from_parts(loader, handle, file_name))
    }

    /// Loads the support library for `name`.
    pub fn load_no_suffix(loader: Arc<dyn DynamicLibraryLoader>, name: &str) -> Result<Self> {
        let file_name = loader.naming().support_library(name);
        let handle = loader.load_no_suffix(name)?;
        Ok(Self::from_parts(loader, handle, file_name))
    }

    /// Opens `file_name` verbatim.
    pub fn open(loader: Arc<dyn DynamicLibraryLoader>, file_name: &str) -> Result<Self> {
        let handle = loader.open(file_name)?;
        Ok(Self::from_parts(loader, handle, file_name.to_string()))
    }

    fn from_parts(
        loader: Arc<dyn DynamicLibraryLoader>,
        handle: LibraryHandle,
        file_name: String,
    ) -> Self {
        Self {
            loader,
            handle: Some(handle),
            file_name,
        }
    }

    /// File name the library was opened with.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Resolves an exported symbol.
    pub fn symbol(&self, name: &str) -> Result<SymbolAddress> {
        match &self.handle {
            Some(handle) => self.loader.resolve_symbol(handle, name),
            None => Err(DlError::symbol(name, "library already released")),
        }
    }

    /// Resolves a symbol that must be a non-null function entry point.
    pub fn function(&self, name: &str) -> Result<SymbolAddress> {
        let address = self.symbol(name)?;
        if address.is_null() {
            return Err(DlError::NullSymbol {
                symbol: name.to_string(),
            });
        }
        Ok(address)
    }

    /// Releases the library now instead of at drop.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            tracing::debug!(file = %self.file_name, "releasing library");
            self.loader.free(handle);
        }
    }
}

impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("file_name", &self.file_name)
            .field("platform", &self.loader.platform())
            .field("open", &self.handle.is_some())
            .finish()
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        self.release();
    }
}
