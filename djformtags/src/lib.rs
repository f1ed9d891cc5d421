//! # djformtags
//!
//! Template tags that simplify and enhance form rendering.
//!
//! The `formtags` library provides:
//!
//! - `{% setattr form.field "placeholder" "Email" %}` to mutate a field's
//!   widget or label in place
//! - `{% formrow form.field label="Email" class="wide" %}` to render a field
//!   through a sub-template
//! - `{% field_type form.field %}` to print the field's input type
//! - `{% render_field %}` and `{% text_field %}`, the older row tags
//!
//! Templates written for the older library load it as `form_tags`, which
//! holds only the two older row tags.
//!
//! ## Examples
//!
//! ```
//! use djformtags_forms::{FieldDef, Form};
//! use djformtags_template::{Context, ContextValue, Engine};
//!
//! let mut engine = Engine::new();
//! djformtags::register(&mut engine);
//!
//! let mut ctx = Context::new();
//! ctx.set("form", ContextValue::from(Form::new(vec![FieldDef::char("email", None)])));
//!
//! let html = engine
//!     .render_string(
//!         r#"{% load formtags %}{% setattr form.email "type" "email" %}{{ form.email }}"#,
//!         &mut ctx,
//!     )
//!     .unwrap();
//! assert_eq!(html, r#"<input id="id_email" name="email" type="email" />"#);
//! ```

pub mod classify;
pub mod formrow;
pub mod legacy;
pub mod setattr;

use djformtags_core::error::FormTagsResult;
use djformtags_forms::FieldRef;
use djformtags_template::parser::FilterExpression;
use djformtags_template::{Context, Engine, Library};

pub use classify::classify;
pub use formrow::{render_row, RowOptions};

/// The name templates pass to `{% load %}`.
pub const LIBRARY_NAME: &str = "formtags";

/// The older library name, holding `render_field` and `text_field`.
pub const LEGACY_LIBRARY_NAME: &str = "form_tags";

/// Sub-template used by `formrow` when none is given.
pub const DEFAULT_ROW_TEMPLATE: &str = "formtags/formrow.html";

/// Sub-template used by `render_field` and `text_field` when none is given.
pub const DEFAULT_FIELD_TEMPLATE: &str = "formtags/field.html";

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        DEFAULT_FIELD_TEMPLATE,
        include_str!("../templates/formtags/field.html"),
    ),
    (
        DEFAULT_ROW_TEMPLATE,
        include_str!("../templates/formtags/formrow.html"),
    ),
];

/// Builds the `formtags` tag library.
pub fn library() -> Library {
    let mut lib = Library::new(LIBRARY_NAME);
    lib.register_tag("field_type", classify::compile_field_type);
    lib.register_tag("setattr", setattr::compile_setattr);
    lib.register_tag("formrow", formrow::compile_formrow);
    lib.register_tag("render_field", legacy::compile_render_field);
    lib.register_tag("text_field", legacy::compile_render_field);
    lib
}

/// Builds the `form_tags` library.
pub fn legacy_library() -> Library {
    let mut lib = Library::new(LEGACY_LIBRARY_NAME);
    lib.register_tag("render_field", legacy::compile_render_field);
    lib.register_tag("text_field", legacy::compile_render_field);
    lib
}

/// Registers the `formtags` and `form_tags` libraries on `engine` and
/// installs the built-in sub-templates.
///
/// The built-ins live in the engine's string loader, which is consulted
/// before any template directory, so a project overrides them by adding a
/// string template of the same name.
pub fn register(engine: &mut Engine) {
    engine.register_library(library());
    engine.register_library(legacy_library());
    for (name, source) in BUILTIN_TEMPLATES {
        engine.add_string_template(name, source);
    }
    tracing::debug!(library = LIBRARY_NAME, "formtags registered");
}

/// Resolves a tag's field argument to a bound field.
///
/// Anything that is not a bound field, including a missing variable,
/// resolves to `None`.
pub(crate) fn resolve_field(
    expr: &FilterExpression,
    context: &Context,
) -> FormTagsResult<Option<FieldRef>> {
    let value = expr.resolve(context)?;
    let field = FieldRef::from_value(&value);
    if field.is_none() {
        tracing::debug!(
            field = expr.expression.as_variable().unwrap_or_default(),
            "tag field did not resolve to a bound field"
        );
    }
    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_tags() {
        let lib = library();
        assert_eq!(lib.name(), "formtags");
        for tag in ["field_type", "setattr", "formrow", "render_field", "text_field"] {
            assert!(lib.has_tag(tag), "missing tag {tag}");
        }
    }

    #[test]
    fn test_legacy_library_tags() {
        let lib = legacy_library();
        assert_eq!(lib.name(), "form_tags");
        assert!(lib.has_tag("render_field"));
        assert!(lib.has_tag("text_field"));
        assert!(!lib.has_tag("formrow"));
    }

    #[test]
    fn test_register_installs_templates() {
        let mut engine = Engine::new();
        register(&mut engine);
        assert!(engine.libraries().get("formtags").is_some());
        assert!(engine.libraries().get("form_tags").is_some());
        assert!(engine.get_template(DEFAULT_ROW_TEMPLATE).is_ok());
        assert!(engine.get_template(DEFAULT_FIELD_TEMPLATE).is_ok());
    }
}
