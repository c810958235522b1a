//! Loader error types.

use crate::detect::Platform;

/// Result type alias for loader operations.
pub type Result<T> = std::result::Result<T, DlError>;

/// Errors raised while detecting the platform or loading native code.
///
/// None of these are retried: every variant propagates straight to the
/// caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DlError {
    /// No platform probe succeeded, so no loader can be constructed.
    #[error("unknown platform: no dynamic loading primitive is available")]
    UnknownPlatform,

    /// A loader was requested for a platform this binary was not built for.
    #[error("platform {0} is not supported by this build")]
    UnsupportedPlatform(Platform),

    /// The platform loader returned no handle for the computed file name.
    #[error("unsatisfied link: {file_name} ({detail})")]
    Link {
        /// File name handed to the platform loader.
        file_name: String,
        /// Loader diagnostic, if the platform exposes one.
        detail: String,
    },

    /// The post-resolution error indicator was non-empty.
    #[error("symbol resolution failed for {symbol}: {message}")]
    Symbol {
        /// Requested symbol name.
        symbol: String,
        /// Message reported by the platform.
        message: String,
    },

    /// A function entry point resolved to address zero.
    #[error("symbol {symbol} resolved to a null address")]
    NullSymbol {
        /// Requested symbol name.
        symbol: String,
    },

    /// The preload open failed. Treated as a process configuration problem.
    #[error("failed to preload {library}: {message}")]
    Preload {
        /// Library requested for preloading.
        library: String,
        /// Loader diagnostic.
        message: String,
    },

    /// Loader configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl DlError {
    /// Creates a link error.
    #[must_use]
    pub fn link(file_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Link {
            file_name: file_name.into(),
            detail: detail.into(),
        }
    }

    /// Creates a symbol error.
    #[must_use]
    pub fn symbol(symbol: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Symbol {
            symbol: symbol.into(),
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// File name carried by a link error.
    #[must_use]
    pub fn link_file_name(&self) -> Option<&str> {
        match self {
            Self::Link { file_name, .. } => Some(file_name),
            _ => None,
        }
    }
}
