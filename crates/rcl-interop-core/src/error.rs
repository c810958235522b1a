//! Error types for rcl-interop-core.

use rcl_interop_dl::DlError;

use crate::return_code::ReturnCode;

/// Result type alias for subscription operations.
pub type Result<T> = std::result::Result<T, RclError>;

/// Failure modes of the subscription layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RclError {
    /// Loading or resolving the native entry points failed.
    #[error(transparent)]
    Dl(#[from] DlError),

    /// A native call returned a status other than success.
    #[error("{operation} failed: {code}")]
    NativeCall {
        /// Entry point that failed.
        operation: &'static str,
        /// Status it returned.
        code: ReturnCode,
    },

    /// Subscription construction failed; nothing was left allocated.
    #[error("failed to initialize subscription on '{topic}': {code}")]
    Init {
        /// Topic the subscription was created for.
        topic: String,
        /// Status returned by native initialization.
        code: ReturnCode,
    },

    /// An operation was invoked on a disposed subscription.
    #[error("subscription for topic '{topic}' is disposed")]
    UseAfterDispose {
        /// Topic of the disposed subscription.
        topic: String,
    },

    /// The topic name cannot be passed to native code.
    #[error("invalid topic name '{0}': contains a NUL byte")]
    InvalidTopic(String),
}

impl RclError {
    /// Native status carried by this error, if any.
    #[must_use]
    pub const fn code(&self) -> Option<ReturnCode> {
        match self {
            Self::NativeCall { code, .. } | Self::Init { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether this is a use-after-dispose error.
    #[must_use]
    pub const fn is_use_after_dispose(&self) -> bool {
        matches!(self, Self::UseAfterDispose { .. })
    }
}
