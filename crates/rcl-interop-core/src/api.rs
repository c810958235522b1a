//! Resolved native entry points for subscriptions.

use std::ffi::c_void;
use std::fmt;
use std::sync::Arc;

use rcl_interop_dl::{DynamicLibraryLoader, Library};

use crate::error::Result;
use crate::ffi::{self, symbols};

/// Middleware library, loaded as `librcl.so` / `rcl.dll`.
pub const RCL_LIBRARY: &str = "rcl";

/// Interop shim, loaded as `librcl_interop_native.so` / `rcl_interop_native.dll`.
pub const SHIM_LIBRARY: &str = "rcl_interop";

/// Function table for one subscription implementation.
#[derive(Clone, Copy)]
pub struct SubscriptionFns {
    /// Allocates a zero-initialized handle.
    pub zero_initialized: ffi::ZeroInitializedSubscriptionFn,
    /// Initializes a zeroed handle.
    pub init: ffi::SubscriptionInitFn,
    /// Finalizes an initialized handle.
    pub fini: ffi::SubscriptionFiniFn,
    /// Takes one pending message.
    pub take: ffi::TakeFn,
    /// Counts matched publishers.
    pub publisher_count: ffi::PublisherCountFn,
    /// Reports handle validity.
    pub is_valid: ffi::IsValidFn,
    /// Frees a handle from `zero_initialized`.
    pub free: ffi::FreeSubscriptionFn,
    /// Builds an options block from a QoS profile.
    pub create_options: ffi::CreateOptionsFn,
    /// Frees an options block.
    pub dispose_options: ffi::DisposeOptionsFn,
}

impl fmt::Debug for SubscriptionFns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionFns").finish_non_exhaustive()
    }
}

/// Entry-point table plus the libraries that keep it valid.
pub struct SubscriptionApi {
    fns: SubscriptionFns,
    _libraries: Vec<Library>,
}

impl SubscriptionApi {
    /// Wraps an already-resolved table, e.g. statically linked code.
    #[must_use]
    pub fn from_fns(fns: SubscriptionFns) -> Self {
        Self {
            fns,
            _libraries: Vec::new(),
        }
    }

    /// Loads the middleware library and the interop shim and resolves every
    /// subscription entry point.
    ///
    /// # Errors
    /// Link or symbol errors from the loader, never retried.
    pub fn load(loader: Arc<dyn DynamicLibraryLoader>) -> Result<Self> {
        let rcl = Library::load_no_suffix(loader.clone(), RCL_LIBRARY)?;
        let shim = Library::load(loader, SHIM_LIBRARY)?;
        Self::resolve(rcl, shim)
    }

    /// Resolves the table from explicitly opened libraries.
    ///
    /// # Errors
    /// [`rcl_interop_dl::DlError::Symbol`] or `NullSymbol` for the first
    /// entry point that cannot be resolved.
    pub fn resolve(rcl: Library, shim: Library) -> Result<Self> {
        // SAFETY: each symbol is cast to the signature declared for it in
        // `ffi`, which mirrors the native headers.
        let fns = unsafe {
            SubscriptionFns {
                init: function(&rcl, symbols::SUBSCRIPTION_INIT)?,
                fini: function(&rcl, symbols::SUBSCRIPTION_FINI)?,
                take: function(&rcl, symbols::TAKE)?,
                publisher_count: function(&rcl, symbols::PUBLISHER_COUNT)?,
                is_valid: function(&rcl, symbols::IS_VALID)?,
                zero_initialized: function(&shim, symbols::ZERO_INITIALIZED_SUBSCRIPTION)?,
                free: function(&shim, symbols::FREE_SUBSCRIPTION)?,
                create_options: function(&shim, symbols::CREATE_OPTIONS)?,
                dispose_options: function(&shim, symbols::DISPOSE_OPTIONS)?,
            }
        };
        tracing::debug!(
            rcl = rcl.file_name(),
            shim = shim.file_name(),
            "resolved subscription entry points"
        );
        Ok(Self {
            fns,
            _libraries: vec![rcl, shim],
        })
    }

    /// The resolved table.
    #[must_use]
    pub fn fns(&self) -> &SubscriptionFns {
        &self.fns
    }
}

impl fmt::Debug for SubscriptionApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionApi")
            .field("libraries", &self._libraries)
            .finish_non_exhaustive()
    }
}

/// Resolves `name` as a non-null function pointer of type `F`.
///
/// # Safety
///
/// `F` must be an `extern "C"` function pointer type matching the export.
unsafe fn function<F: Copy>(library: &Library, name: &str) -> Result<F> {
    const {
        assert!(std::mem::size_of::<F>() == std::mem::size_of::<*mut c_void>());
    }
    let address = library.function(name)?.as_ptr();
    // SAFETY: sizes match (checked above) and the caller guarantees `F`.
    Ok(unsafe { std::mem::transmute_copy::<*mut c_void, F>(&address) })
}
