//! Loader configuration.
//!
//! Replaces process-wide preload toggles with an explicit value handed to the
//! loader at construction time. Validated at load time.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DlError, Result};

/// Configuration for [`create_loader`](crate::create_loader).
///
/// ```rust
/// use rcl_interop_dl::LoaderConfig;
///
/// let config = LoaderConfig::builder()
///     .preload("libstdc++.so.6")
///     .build();
/// assert!(config.preload.enabled);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Early isolated-resolution workaround.
    #[serde(default)]
    pub preload: PreloadConfig,
}

/// Preload workaround settings.
///
/// Only honoured by the Unix loader. Intended for host-embedding scenarios
/// where a library's symbols clash with ones already loaded into the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloadConfig {
    /// Whether to preload at all.
    #[serde(default)]
    pub enabled: bool,

    /// File name passed verbatim to the platform loader.
    #[serde(default)]
    pub library: String,
}

impl PreloadConfig {
    /// Preloading turned on for `library`.
    #[must_use]
    pub fn enabled(library: impl Into<String>) -> Self {
        Self {
            enabled: true,
            library: library.into(),
        }
    }

    /// Validates the preload settings.
    ///
    /// # Errors
    /// Returns an error if preloading is enabled without a library name.
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.library.trim().is_empty() {
            return Err(DlError::config(
                "preload.library cannot be empty when preload.enabled is true",
            ));
        }
        if self.library.contains('\0') {
            return Err(DlError::config("preload.library contains a NUL byte"));
        }
        Ok(())
    }
}

impl LoaderConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> LoaderConfigBuilder {
        LoaderConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        self.preload.validate()
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    /// Returns an error if the document cannot be parsed or is invalid.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| DlError::config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| DlError::config(format!("failed to read config: {e}")))?;
        Self::from_toml_str(&content)
    }
}

/// Builder for [`LoaderConfig`].
#[derive(Debug, Clone, Default)]
pub struct LoaderConfigBuilder {
    config: LoaderConfig,
}

impl LoaderConfigBuilder {
    /// Enables preloading of `library`.
    #[must_use]
    pub fn preload(mut self, library: impl Into<String>) -> Self {
        self.config.preload = PreloadConfig::enabled(library);
        self
    }

    /// Disables preloading.
    #[must_use]
    pub fn no_preload(mut self) -> Self {
        self.config.preload = PreloadConfig::default();
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> LoaderConfig {
        self.config
    }
}
