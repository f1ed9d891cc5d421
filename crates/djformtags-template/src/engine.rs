//! Template engine: loading, parsing, and rendering.
//!
//! The [`Engine`] owns the template loaders and the tag libraries that
//! `{% load %}` can enable. Templates are parsed on every load; parsed
//! templates hold compiled tag nodes and stay on the rendering thread.

use std::path::PathBuf;

use djformtags_core::error::{FormTagsError, FormTagsResult};
use djformtags_core::logging::render_span;
use djformtags_core::settings::{TemplateSettings, SETTINGS};

use crate::context::Context;
use crate::lexer;
use crate::library::{Library, LibraryRegistry};
use crate::loaders::{FileSystemLoader, StringLoader, TemplateLoader};
use crate::parser::{self, Node, Parser};

/// Renders templates by name.
///
/// Tags receive the engine through this trait so that they can render
/// sub-templates without depending on [`Engine`] directly.
pub trait TemplateRenderer: Send + Sync {
    /// Loads, parses, and renders the named template with `context`.
    fn render_template(&self, name: &str, context: &mut Context) -> FormTagsResult<String>;
}

/// A parsed template.
pub struct Template {
    name: String,
    nodes: Vec<Node>,
}

impl Template {
    /// Parses `source`; `{% load %}` resolves against `libraries`.
    pub fn compile(
        name: impl Into<String>,
        source: &str,
        libraries: &LibraryRegistry,
    ) -> FormTagsResult<Self> {
        let tokens = lexer::tokenize(source);
        let nodes = Parser::new(&tokens, libraries).parse()?;
        Ok(Self {
            name: name.into(),
            nodes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renders the template against `context`.
    pub fn render(
        &self,
        context: &mut Context,
        engine: &dyn TemplateRenderer,
    ) -> FormTagsResult<String> {
        let span = render_span(&self.name);
        let _guard = span.enter();
        parser::render_nodes(&self.nodes, context, engine)
    }
}

/// The template engine.
///
/// # Examples
///
/// ```
/// use djformtags_template::engine::Engine;
/// use djformtags_template::context::Context;
///
/// let engine = Engine::new();
/// engine.add_string_template("hello.html", "Hello {{ name }}!");
///
/// let mut ctx = Context::new();
/// ctx.set("name", "World");
///
/// let result = engine.render_to_string("hello.html", &mut ctx).unwrap();
/// assert_eq!(result, "Hello World!");
/// ```
pub struct Engine {
    loaders: Vec<Box<dyn TemplateLoader>>,
    string_loader: StringLoader,
    libraries: LibraryRegistry,
    auto_escape: bool,
    debug: bool,
}

impl Engine {
    /// Creates an engine with no template directories and auto-escaping on.
    pub fn new() -> Self {
        Self {
            loaders: Vec::new(),
            string_loader: StringLoader::new(),
            libraries: LibraryRegistry::new(),
            auto_escape: true,
            debug: false,
        }
    }

    /// Creates an engine configured from settings.
    pub fn from_settings(settings: &TemplateSettings) -> Self {
        let mut engine = Self::new();
        if !settings.dirs.is_empty() {
            engine.set_dirs(settings.dirs.clone());
        }
        engine.auto_escape = settings.auto_escape;
        engine.debug = settings.debug;
        engine
    }

    /// Creates an engine from the global [`SETTINGS`], which fall back to
    /// the defaults when nothing was configured.
    pub fn from_global_settings() -> Self {
        Self::from_settings(&SETTINGS.get().templates)
    }

    /// Adds a filesystem loader over `dirs`, searched before other loaders.
    pub fn set_dirs(&mut self, dirs: Vec<PathBuf>) {
        self.loaders.insert(0, Box::new(FileSystemLoader::new(dirs)));
    }

    /// Appends a loader.
    pub fn add_loader(&mut self, loader: Box<dyn TemplateLoader>) {
        self.loaders.push(loader);
    }

    pub fn set_auto_escape(&mut self, enabled: bool) {
        self.auto_escape = enabled;
    }

    pub const fn auto_escape(&self) -> bool {
        self.auto_escape
    }

    pub fn set_debug(&mut self, enabled: bool) {
        self.debug = enabled;
    }

    pub const fn debug(&self) -> bool {
        self.debug
    }

    /// Adds or replaces an in-memory template. In-memory templates take
    /// precedence over every other loader.
    pub fn add_string_template(&self, name: &str, source: &str) {
        self.string_loader.add(name, source);
    }

    /// Makes a tag library available to `{% load %}`.
    pub fn register_library(&mut self, library: Library) {
        tracing::debug!(library = library.name(), "registering tag library");
        self.libraries.register(library);
    }

    pub const fn libraries(&self) -> &LibraryRegistry {
        &self.libraries
    }

    fn load_source(&self, name: &str) -> FormTagsResult<String> {
        let loaders = std::iter::once(&self.string_loader as &dyn TemplateLoader)
            .chain(self.loaders.iter().map(|loader| &**loader));

        for loader in loaders {
            match loader.load(name) {
                Ok(source) => {
                    tracing::debug!(template = name, "loaded template");
                    return Ok(source);
                }
                Err(FormTagsError::TemplateDoesNotExist(_)) => {}
                Err(other) => return Err(other),
            }
        }

        tracing::debug!(template = name, "template not found");
        Err(FormTagsError::TemplateDoesNotExist(name.to_string()))
    }

    /// Loads and parses a template by name.
    pub fn get_template(&self, name: &str) -> FormTagsResult<Template> {
        let source = self.load_source(name)?;
        Template::compile(name, &source, &self.libraries)
    }

    /// Parses a template from source.
    pub fn from_string(&self, source: &str) -> FormTagsResult<Template> {
        Template::compile("<string>", source, &self.libraries)
    }

    /// Renders a named template, applying the engine's auto-escape setting.
    pub fn render_to_string(&self, name: &str, context: &mut Context) -> FormTagsResult<String> {
        context.set_auto_escape(self.auto_escape);
        self.get_template(name)?.render(context, self)
    }

    /// Renders template source directly, applying the engine's auto-escape
    /// setting.
    pub fn render_string(&self, source: &str, context: &mut Context) -> FormTagsResult<String> {
        context.set_auto_escape(self.auto_escape);
        self.from_string(source)?.render(context, self)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for Engine {
    fn render_template(&self, name: &str, context: &mut Context) -> FormTagsResult<String> {
        self.get_template(name)?.render(context, self)
    }
}
