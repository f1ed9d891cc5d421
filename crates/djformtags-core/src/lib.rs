//! # djformtags-core
//!
//! Foundation types shared by the djformtags crates.
//!
//! ## Modules
//!
//! - [`error`] - The [`FormTagsError`] enum and result alias
//! - [`settings`] - Template and logging configuration, loadable from TOML
//! - [`logging`] - Tracing subscriber setup
//!
//! ## Startup
//!
//! An embedding application configures [`SETTINGS`] once, installs the
//! subscriber, and then builds engines with
//! `djformtags_template::Engine::from_global_settings`. Unconfigured settings
//! read as the defaults.
//!
//! ```
//! use djformtags_core::logging::setup_logging;
//! use djformtags_core::{Settings, SETTINGS};
//!
//! let settings = Settings::from_toml_str("log_level = \"warn\"").unwrap();
//! SETTINGS.configure(settings).unwrap();
//! setup_logging(SETTINGS.get());
//! assert!(SETTINGS.is_configured());
//! assert_eq!(SETTINGS.get().log_level, "warn");
//! ```

pub mod error;
pub mod logging;
pub mod settings;

pub use error::{FormTagsError, FormTagsResult};
pub use settings::{Settings, TemplateSettings, SETTINGS};
