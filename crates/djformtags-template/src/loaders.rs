//! Template loaders.
//!
//! A [`TemplateLoader`] finds template source by name. The engine asks its
//! in-memory [`StringLoader`] first, then each configured loader in order.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use djformtags_core::error::FormTagsError;

/// Loads template source text by name.
pub trait TemplateLoader: Send + Sync {
    /// Loads the template source with the given name.
    ///
    /// # Errors
    ///
    /// Returns `TemplateDoesNotExist` if the template cannot be found.
    fn load(&self, name: &str) -> Result<String, FormTagsError>;
}

/// Loads templates from directories on the filesystem, first match wins.
pub struct FileSystemLoader {
    dirs: Vec<PathBuf>,
}

impl FileSystemLoader {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// The directories searched, in order.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

/// Only plain relative names are looked up; `..` and absolute paths would
/// escape the template directories.
fn is_safe_name(name: &str) -> bool {
    Path::new(name)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

impl TemplateLoader for FileSystemLoader {
    fn load(&self, name: &str) -> Result<String, FormTagsError> {
        if is_safe_name(name) {
            for dir in &self.dirs {
                let path = dir.join(name);
                if path.is_file() {
                    return Ok(std::fs::read_to_string(&path)?);
                }
            }
        }

        Err(FormTagsError::TemplateDoesNotExist(name.to_string()))
    }
}

/// Loads templates from an in-memory map of name to source.
pub struct StringLoader {
    templates: RwLock<HashMap<String, String>>,
}

impl StringLoader {
    pub fn new() -> Self {
        Self {
            templates: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a loader pre-populated from a map of names to sources.
    pub fn from_map(templates: HashMap<String, String>) -> Self {
        Self {
            templates: RwLock::new(templates),
        }
    }

    /// Adds or replaces a template.
    pub fn add(&self, name: impl Into<String>, source: impl Into<String>) {
        self.templates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), source.into());
    }

    /// Returns `true` if a template with this name has been added.
    pub fn contains(&self, name: &str) -> bool {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }
}

impl Default for StringLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateLoader for StringLoader {
    fn load(&self, name: &str) -> Result<String, FormTagsError> {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| FormTagsError::TemplateDoesNotExist(name.to_string()))
    }
}
