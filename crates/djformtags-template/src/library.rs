//! Tag libraries.
//!
//! A [`Library`] is a named set of custom tags that a template enables with
//! `{% load name %}`. Each tag is registered as a [`CompileFn`]: at parse
//! time the function receives the tag's bits (tag name first) and returns a
//! [`TagNode`], which is rendered later against the live context.
//!
//! ```
//! use djformtags_core::FormTagsResult;
//! use djformtags_template::context::Context;
//! use djformtags_template::engine::{Engine, TemplateRenderer};
//! use djformtags_template::library::{Library, TagNode};
//!
//! struct Shout(String);
//!
//! impl TagNode for Shout {
//!     fn render(&self, ctx: &mut Context, _: &dyn TemplateRenderer) -> FormTagsResult<String> {
//!         Ok(ctx.get(&self.0).map(|v| v.to_display_string().to_uppercase()).unwrap_or_default())
//!     }
//! }
//!
//! let mut lib = Library::new("loud");
//! lib.register_tag("shout", |bits| Ok(Box::new(Shout(bits[1].clone()))));
//!
//! let mut engine = Engine::new();
//! engine.register_library(lib);
//!
//! let mut ctx = Context::new();
//! ctx.set("word", "hey");
//! let out = engine.render_string("{% load loud %}{% shout word %}", &mut ctx).unwrap();
//! assert_eq!(out, "HEY");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use djformtags_core::error::FormTagsResult;

use crate::context::Context;
use crate::engine::TemplateRenderer;

/// A compiled custom tag, ready to render.
pub trait TagNode {
    /// Renders the tag against the current context.
    fn render(&self, context: &mut Context, engine: &dyn TemplateRenderer)
        -> FormTagsResult<String>;
}

/// Compiles the bits of a custom tag (tag name first) into a [`TagNode`].
pub type CompileFn = fn(&[String]) -> FormTagsResult<Box<dyn TagNode>>;

/// A named collection of custom tags.
pub struct Library {
    name: String,
    tags: HashMap<String, CompileFn>,
}

impl Library {
    /// Creates an empty library; `name` is what templates pass to `{% load %}`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers a tag. A later registration under the same name wins.
    pub fn register_tag(&mut self, name: impl Into<String>, compile: CompileFn) {
        self.tags.insert(name.into(), compile);
    }

    /// Looks up a tag's compile function.
    pub fn tag(&self, name: &str) -> Option<CompileFn> {
        self.tags.get(name).copied()
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    /// Returns the registered tag names, sorted.
    pub fn tag_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tags.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Iterates over every tag and its compile function.
    pub fn tags(&self) -> impl Iterator<Item = (&str, CompileFn)> + '_ {
        self.tags.iter().map(|(name, compile)| (name.as_str(), *compile))
    }
}

/// Libraries available to `{% load %}`, by name.
#[derive(Clone, Default)]
pub struct LibraryRegistry {
    libraries: HashMap<String, Arc<Library>>,
}

impl LibraryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a library, replacing any library with the same name.
    pub fn register(&mut self, library: Library) {
        self.libraries
            .insert(library.name.clone(), Arc::new(library));
    }

    pub fn get(&self, name: &str) -> Option<Arc<Library>> {
        self.libraries.get(name).cloned()
    }

    /// Returns the registered library names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.libraries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }
}
