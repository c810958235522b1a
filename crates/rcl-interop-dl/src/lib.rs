// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # rcl-interop-dl
//!
//! Runtime loading of the native ROS 2 client libraries without static
//! linkage.
//!
//! - [`detect()`] probes the host once and caches the [`Platform`]
//! - [`create_loader`] builds the matching [`DynamicLibraryLoader`]
//! - [`LibraryPreloader`] forces one library to be mapped early with
//!   isolated symbol resolution (Unix only, opt-in)
//!
//! ## File names
//!
//! | Platform        | `load("foo")`         | `load_no_suffix("foo")` |
//! |-----------------|-----------------------|-------------------------|
//! | Unix            | `libfoo_native.so`    | `libfoo.so`             |
//! | MacOSX          | `libfoo_native.dylib` | `libfoo.dylib`          |
//! | WindowsDesktop  | `foo_native.dll`      | `foo.dll`               |
//! | UWP             | `foo_native.dll`      | `foo.dll`               |
//!
//! ## Example
//!
//! ```rust,no_run
//! use rcl_interop_dl::{Library, LoaderConfig, create_loader};
//!
//! let loader = create_loader(&LoaderConfig::default())?;
//! let rcl = Library::load_no_suffix(loader, "rcl")?;
//! let take = rcl.function("rcl_take")?;
//! # let _ = take;
//! # Ok::<(), rcl_interop_dl::DlError>(())
//! ```

#![warn(missing_docs, rust_2018_idioms)]

pub mod config;
pub mod detect;
pub mod error;
pub mod loader;
pub mod preload;

#[cfg(unix)]
mod dl;

#[cfg(all(unix, not(target_vendor = "apple")))]
pub mod unix;

#[cfg(target_vendor = "apple")]
pub mod macos;

#[cfg(windows)]
pub mod windows;

pub use config::{LoaderConfig, LoaderConfigBuilder, PreloadConfig};
pub use detect::{Platform, PlatformDetector, detect};
pub use error::{DlError, Result};
pub use loader::{
    DynamicLibraryLoader, Library, LibraryHandle, LibraryNaming, SymbolAddress, create_loader,
    create_loader_for,
};
pub use preload::{LibraryPreloader, PreloadTarget};
