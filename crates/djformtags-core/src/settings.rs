//! Settings for djformtags.
//!
//! [`Settings`] holds the template engine and logging configuration. Every
//! field has a default, so a TOML file only needs to name what it changes.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML file or string (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! | Env Var | Setting |
//! |---|---|
//! | `FORMTAGS_DEBUG` | `debug` |
//! | `FORMTAGS_LOG_LEVEL` | `log_level` |
//! | `FORMTAGS_TEMPLATE_DIRS` | `templates.dirs` (platform path-list separator) |
//!
//! ```
//! use djformtags_core::settings::Settings;
//!
//! let settings = Settings::from_toml_str(
//!     r#"
//!     log_level = "debug"
//!
//!     [templates]
//!     dirs = ["templates"]
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(settings.log_level, "debug");
//! assert!(settings.templates.auto_escape);
//! ```

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::FormTagsError;

/// Template engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
    /// Directories searched, in order, for template files.
    pub dirs: Vec<PathBuf>,
    /// Whether variable output is HTML-escaped by default.
    pub auto_escape: bool,
    /// Whether the engine runs in debug mode.
    pub debug: bool,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            dirs: Vec::new(),
            auto_escape: true,
            debug: false,
        }
    }
}

/// The complete set of djformtags settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Whether debug mode is enabled. Selects pretty log output.
    pub debug: bool,
    /// The log filter directive (e.g. "info", "djformtags=trace").
    pub log_level: String,
    /// Template engine configuration.
    pub templates: TemplateSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            log_level: "info".to_string(),
            templates: TemplateSettings::default(),
        }
    }
}

impl Settings {
    /// Loads settings from a TOML string. Missing keys keep their defaults.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, FormTagsError> {
        toml::from_str(toml_str)
            .map_err(|e| FormTagsError::ConfigurationError(format!("Failed to parse TOML: {e}")))
    }

    /// Loads settings from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, FormTagsError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            FormTagsError::ConfigurationError(format!(
                "Failed to read TOML file '{}': {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Loads settings from a TOML file, then applies environment overrides.
    pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Self, FormTagsError> {
        let mut settings = Self::from_toml_file(path)?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Builds settings from defaults plus environment overrides.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        settings.apply_env_overrides();
        settings
    }

    /// Applies `FORMTAGS_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from an arbitrary variable source.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("FORMTAGS_DEBUG") {
            self.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
        }

        if let Some(val) = lookup("FORMTAGS_LOG_LEVEL") {
            self.log_level = val;
        }

        if let Some(val) = lookup("FORMTAGS_TEMPLATE_DIRS") {
            self.templates.dirs = std::env::split_paths(&val)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
        }
    }
}

/// A lazily-initialized, globally-accessible settings container.
pub struct LazySettings {
    inner: OnceLock<Settings>,
}

impl Default for LazySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySettings {
    /// Creates a new, unconfigured `LazySettings`.
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Configures the global settings.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if settings were already configured.
    pub fn configure(&self, settings: Settings) -> Result<(), FormTagsError> {
        self.inner.set(settings).map_err(|_| {
            FormTagsError::ConfigurationError("Settings have already been configured".to_string())
        })
    }

    /// Returns the configured settings, or the defaults if none were configured.
    pub fn get(&self) -> &Settings {
        self.inner.get_or_init(Settings::default)
    }

    /// Returns `true` if settings have been configured.
    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// The global settings instance.
pub static SETTINGS: LazySettings = LazySettings::new();
