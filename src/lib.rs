//! rcl-interop: runtime-loaded interop layer for the ROS 2 client library.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use rcl_interop::prelude::*;
//!
//! let platform = detect();
//! let loader = create_loader(&LoaderConfig::default())?;
//! assert_eq!(loader.platform(), platform);
//! # Ok::<(), rcl_interop::dl::DlError>(())
//! ```

pub use rcl_interop_core as core;
pub use rcl_interop_dl as dl;

/// Prelude module for common imports.
pub mod prelude {
    pub use rcl_interop_core::{
        Executor, Message, MessageBuffer, Node, NodeHandle, QosProfile, RawSubscription, RclError,
        ReturnCode, Subscription, SubscriptionApi, SubscriptionId, SubscriptionState, TakeOutcome,
        TypeSupportHandle,
    };
    pub use rcl_interop_dl::{
        DlError, DynamicLibraryLoader, Library, LoaderConfig, Platform, PreloadConfig,
        create_loader, detect,
    };
}
