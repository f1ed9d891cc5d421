//! # djformtags-template
//!
//! A Django-style template engine: the host that the `formtags` tag library
//! plugs into. It supports variables with filters, `if`, `with`, `include`,
//! `comment`, and `load`, plus custom tags supplied by registered
//! [`Library`](library::Library) values.
//!
//! Host objects such as forms and bound fields live in the [`Context`] as
//! [`ContextValue::Object`] and resolve dotted lookups through the
//! [`TemplateObject`] trait.

pub mod context;
pub mod engine;
pub mod filters;
pub mod lexer;
pub mod library;
pub mod loaders;
pub mod parser;

pub use context::{Context, ContextValue, TemplateObject};
pub use engine::{Engine, Template, TemplateRenderer};
pub use library::{CompileFn, Library, LibraryRegistry, TagNode};
