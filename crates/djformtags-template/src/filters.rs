//! Built-in template filters.
//!
//! The filter set is deliberately small: what form-row templates reach for
//! when deciding how to print a label, a help text, or a value.

use std::collections::HashMap;
use std::sync::OnceLock;

use djformtags_core::error::FormTagsError;

use crate::context::{escape_html, ContextValue};

/// A template filter.
pub trait Filter: Send + Sync {
    /// The name used after `|` in a variable expression.
    fn name(&self) -> &'static str;

    /// Applies the filter to a value.
    fn apply(
        &self,
        value: &ContextValue,
        args: &[ContextValue],
    ) -> Result<ContextValue, FormTagsError>;
}

/// A registry of filters by name.
pub struct FilterRegistry {
    filters: HashMap<String, Box<dyn Filter>>,
}

impl FilterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            filters: HashMap::new(),
        }
    }

    /// Registers a filter, replacing any filter with the same name.
    pub fn register(&mut self, filter: Box<dyn Filter>) {
        self.filters.insert(filter.name().to_string(), filter);
    }

    /// Returns `true` if a filter with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Applies the named filter.
    ///
    /// # Errors
    ///
    /// Returns `TemplateSyntaxError` if no filter has that name.
    pub fn apply(
        &self,
        name: &str,
        value: &ContextValue,
        args: &[ContextValue],
    ) -> Result<ContextValue, FormTagsError> {
        let filter = self
            .filters
            .get(name)
            .ok_or_else(|| FormTagsError::TemplateSyntaxError(format!("Unknown filter: '{name}'")))?;
        filter.apply(value, args)
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the registry holding every built-in filter.
pub fn default_registry() -> &'static FilterRegistry {
    static REGISTRY: OnceLock<FilterRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut r = FilterRegistry::new();
        r.register(Box::new(DefaultFilter));
        r.register(Box::new(SafeFilter));
        r.register(Box::new(EscapeFilter));
        r.register(Box::new(LowerFilter));
        r.register(Box::new(UpperFilter));
        r.register(Box::new(LengthFilter));
        r
    })
}

struct DefaultFilter;
impl Filter for DefaultFilter {
    fn name(&self) -> &'static str {
        "default"
    }
    fn apply(
        &self,
        value: &ContextValue,
        args: &[ContextValue],
    ) -> Result<ContextValue, FormTagsError> {
        if value.is_truthy() {
            Ok(value.clone())
        } else {
            args.first().cloned().ok_or_else(|| {
                FormTagsError::TemplateSyntaxError("default requires 1 argument".to_string())
            })
        }
    }
}

struct SafeFilter;
impl Filter for SafeFilter {
    fn name(&self) -> &'static str {
        "safe"
    }
    fn apply(
        &self,
        value: &ContextValue,
        _args: &[ContextValue],
    ) -> Result<ContextValue, FormTagsError> {
        Ok(match value {
            ContextValue::Object(_) | ContextValue::SafeString(_) => value.clone(),
            other => ContextValue::SafeString(other.to_display_string()),
        })
    }
}

struct EscapeFilter;
impl Filter for EscapeFilter {
    fn name(&self) -> &'static str {
        "escape"
    }
    fn apply(
        &self,
        value: &ContextValue,
        _args: &[ContextValue],
    ) -> Result<ContextValue, FormTagsError> {
        if value.is_safe() {
            return Ok(value.clone());
        }
        Ok(ContextValue::SafeString(escape_html(
            &value.to_display_string(),
        )))
    }
}

struct LowerFilter;
impl Filter for LowerFilter {
    fn name(&self) -> &'static str {
        "lower"
    }
    fn apply(
        &self,
        value: &ContextValue,
        _args: &[ContextValue],
    ) -> Result<ContextValue, FormTagsError> {
        Ok(ContextValue::String(
            value.to_display_string().to_lowercase(),
        ))
    }
}

struct UpperFilter;
impl Filter for UpperFilter {
    fn name(&self) -> &'static str {
        "upper"
    }
    fn apply(
        &self,
        value: &ContextValue,
        _args: &[ContextValue],
    ) -> Result<ContextValue, FormTagsError> {
        Ok(ContextValue::String(
            value.to_display_string().to_uppercase(),
        ))
    }
}

struct LengthFilter;
impl Filter for LengthFilter {
    fn name(&self) -> &'static str {
        "length"
    }
    fn apply(
        &self,
        value: &ContextValue,
        _args: &[ContextValue],
    ) -> Result<ContextValue, FormTagsError> {
        Ok(ContextValue::from(value.len().unwrap_or(0)))
    }
}
