//! Early isolated preload of one library.
//!
//! Workaround for symbol clashes seen when the client runs embedded in a
//! host process that already carries conflicting definitions. The library is
//! opened once with deep-bind resolution and the reference is dropped right
//! away; it normally stays mapped because other libraries depend on it, but
//! nothing here guarantees that.

use parking_lot::Mutex;

use crate::config::PreloadConfig;
use crate::error::{DlError, Result};
use crate::loader::LibraryHandle;

/// Loader capable of an isolated (deep-bind) open.
pub trait PreloadTarget {
    /// Opens `file_name` preferring the library's own symbols.
    fn open_isolated(&self, file_name: &str) -> Result<LibraryHandle>;

    /// Drops the reference obtained by [`open_isolated`](Self::open_isolated).
    fn release(&self, handle: LibraryHandle);
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PreloadState {
    Pending,
    Done,
    Failed(String),
}

/// Runs the open/release sequence at most once per instance.
#[derive(Debug)]
pub struct LibraryPreloader {
    config: PreloadConfig,
    state: Mutex<PreloadState>,
}

impl LibraryPreloader {
    /// Creates a preloader from configuration.
    #[must_use]
    pub fn new(config: PreloadConfig) -> Self {
        Self {
            config,
            state: Mutex::new(PreloadState::Pending),
        }
    }

    /// A preloader that never does anything.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(PreloadConfig::default())
    }

    /// Whether preloading is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.library.is_empty()
    }

    /// Configured library file name.
    #[must_use]
    pub fn library(&self) -> &str {
        &self.config.library
    }

    /// Whether the preload sequence has completed successfully.
    #[must_use]
    pub fn is_preloaded(&self) -> bool {
        *self.state.lock() == PreloadState::Done
    }

    /// Preloads the configured library through `target`.
    ///
    /// Idempotent: the open/release sequence runs at most once, even if it
    /// failed. Later calls replay the original outcome.
    ///
    /// # Errors
    /// [`DlError::Preload`] if the isolated open failed.
    pub fn preload<T: PreloadTarget + ?Sized>(&self, target: &T) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let mut state = self.state.lock();
        match &*state {
            PreloadState::Done => return Ok(()),
            PreloadState::Failed(message) => return Err(self.error(message.clone())),
            PreloadState::Pending => {}
        }

        let library = self.config.library.as_str();
        match target.open_isolated(library) {
            Ok(handle) => {
                target.release(handle);
                tracing::debug!(library, "preloaded library with isolated resolution");
                *state = PreloadState::Done;
                Ok(())
            }
            Err(err) => {
                let message = err.to_string();
                tracing::error!(library, error = %message, "library preload failed");
                *state = PreloadState::Failed(message.clone());
                Err(self.error(message))
            }
        }
    }

    fn error(&self, message: String) -> DlError {
        DlError::Preload {
            library: self.config.library.clone(),
            message,
        }
    }
}

impl Default for LibraryPreloader {
    fn default() -> Self {
        Self::disabled()
    }
}
