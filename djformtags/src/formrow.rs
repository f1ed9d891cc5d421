//! Field rows: `{% formrow field [key=value ...] %}`.
//!
//! [`render_row`] is the one place a field is dressed up and rendered
//! through a sub-template. The `formrow` tag feeds it options parsed from
//! template expressions; the legacy tags in [`crate::legacy`] feed it
//! options parsed from literal `key="value"` tokens.

use djformtags_core::error::{FormTagsError, FormTagsResult};
use djformtags_forms::FieldRef;
use djformtags_template::parser::{split_kwarg, FilterExpression};
use djformtags_template::{Context, ContextValue, TagNode, TemplateRenderer};

use crate::classify::classify;
use crate::{resolve_field, DEFAULT_ROW_TEMPLATE};

/// Everything a row render may change or add.
#[derive(Debug, Clone)]
pub struct RowOptions {
    /// Replaces the field label.
    pub label: Option<String>,
    /// Replaces the widget's `class` attribute.
    pub class: Option<String>,
    /// Appended to the widget's `class` attribute.
    pub classes: Option<String>,
    /// Appended to `class` after a space, untrimmed, when the field has
    /// errors.
    pub error_class: Option<String>,
    /// Widget attributes to set, in order.
    pub attrs: Vec<(String, String)>,
    /// Explicit sub-template name.
    pub template: Option<String>,
    /// Used when neither `template` nor the context's `field_template` is set.
    pub default_template: String,
    /// Extra values for the sub-template, after `field` and `input_type`.
    pub extra: Vec<(String, ContextValue)>,
}

impl Default for RowOptions {
    fn default() -> Self {
        Self {
            label: None,
            class: None,
            classes: None,
            error_class: None,
            attrs: Vec::new(),
            template: None,
            default_template: DEFAULT_ROW_TEMPLATE.to_string(),
            extra: Vec::new(),
        }
    }
}

impl RowOptions {
    /// The sub-template to render: the explicit one, then the context's
    /// `field_template`, then the default.
    pub fn resolve_template(&self, context: &Context) -> String {
        if let Some(name) = &self.template {
            return name.clone();
        }
        context
            .get("field_template")
            .filter(|value| !value.is_none())
            .map_or_else(
                || self.default_template.clone(),
                |value| value.to_display_string(),
            )
    }
}

/// Applies `options` to `field` and renders it through the sub-template.
///
/// The sub-template sees a copy of `context` with a new scope holding
/// `field`, `input_type`, and then every extra value. Changes to the field
/// outlive the call; the copied context does not. A missing sub-template is
/// an error.
pub fn render_row(
    context: &Context,
    field: &FieldRef,
    options: &RowOptions,
    engine: &dyn TemplateRenderer,
) -> FormTagsResult<String> {
    let input_type = {
        let mut bf = field.borrow_mut();
        if let Some(label) = &options.label {
            bf.set_label(label.as_str());
        }
        let has_errors = bf.has_errors();
        let widget = bf.widget_mut();
        if let Some(class) = &options.class {
            widget.set_attr("class", class.as_str());
        }
        if let Some(classes) = &options.classes {
            widget.append_class(classes);
        }
        if let Some(error_class) = options.error_class.as_deref().filter(|_| has_errors) {
            let class = format!("{} {error_class}", widget.attr("class").unwrap_or_default());
            widget.set_attr("class", class);
        }
        for (key, value) in &options.attrs {
            widget.set_attr(key.as_str(), value.as_str());
        }
        classify(widget)
    };

    let template = options.resolve_template(context);
    tracing::debug!(
        field = %field.borrow().name(),
        template = %template,
        input_type = %input_type,
        "rendering form row"
    );

    let mut row_context = context.clone();
    row_context.push();
    row_context.set("field", field.clone());
    row_context.set("input_type", input_type);
    for (key, value) in &options.extra {
        row_context.set(key.as_str(), value.clone());
    }
    engine.render_template(&template, &mut row_context)
}

/// Option keys the row renderer consumes instead of passing through.
const RESERVED: &[&str] = &["label", "class", "classes", "template"];

struct FormRowNode {
    field: FilterExpression,
    options: Vec<(String, FilterExpression)>,
}

impl FormRowNode {
    fn options(&self, context: &Context) -> FormTagsResult<RowOptions> {
        let mut options = RowOptions::default();
        for (key, expr) in &self.options {
            let value = expr.resolve(context)?;
            if !RESERVED.contains(&key.as_str()) {
                options.extra.push((key.clone(), value));
                continue;
            }
            if value.is_none() {
                continue;
            }
            let value = Some(value.to_display_string());
            match key.as_str() {
                "label" => options.label = value,
                "class" => options.class = value,
                "classes" => options.classes = value,
                _ => options.template = value,
            }
        }
        Ok(options)
    }
}

impl TagNode for FormRowNode {
    fn render(&self, context: &mut Context, engine: &dyn TemplateRenderer) -> FormTagsResult<String> {
        let Some(field) = resolve_field(&self.field, context)? else {
            return Ok(String::new());
        };
        let options = self.options(context)?;
        render_row(context, &field, &options, engine)
    }
}

pub(crate) fn compile_formrow(bits: &[String]) -> FormTagsResult<Box<dyn TagNode>> {
    let Some(field) = bits.get(1) else {
        return Err(FormTagsError::TemplateSyntaxError(
            "'formrow' tag requires a form field".to_string(),
        ));
    };
    let options = bits[2..]
        .iter()
        .map(|bit| {
            let (key, value) = split_kwarg(bit).ok_or_else(|| {
                FormTagsError::TemplateSyntaxError(format!(
                    "'formrow' expects key=value options, got '{bit}'"
                ))
            })?;
            Ok((key.to_string(), FilterExpression::parse(value)?))
        })
        .collect::<FormTagsResult<Vec<_>>>()?;
    Ok(Box::new(FormRowNode {
        field: FilterExpression::parse(field)?,
        options,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use djformtags_forms::{BoundField, FieldDef};
    use djformtags_template::Engine;

    fn field() -> FieldRef {
        FieldRef::new(BoundField::new(FieldDef::char("field", Some(100)), None))
    }

    fn engine() -> Engine {
        let engine = Engine::new();
        engine.add_string_template("row.html", "{{ field.label }}|{{ input_type }}|{{ x }}");
        engine
    }

    #[test]
    fn test_resolve_template_priority() {
        let mut ctx = Context::new();
        let mut options = RowOptions::default();
        assert_eq!(options.resolve_template(&ctx), DEFAULT_ROW_TEMPLATE);

        ctx.set("field_template", "ctx.html");
        assert_eq!(options.resolve_template(&ctx), "ctx.html");

        options.template = Some("explicit.html".to_string());
        assert_eq!(options.resolve_template(&ctx), "explicit.html");
    }

    #[test]
    fn test_render_row_mutates_and_merges() {
        let field = field();
        let options = RowOptions {
            label: Some("Email".to_string()),
            class: Some("wide".to_string()),
            classes: Some("tall".to_string()),
            template: Some("row.html".to_string()),
            extra: vec![("x".to_string(), ContextValue::from("1"))],
            ..RowOptions::default()
        };
        let mut ctx = Context::new();
        ctx.set("x", "ambient");

        let out = render_row(&ctx, &field, &options, &engine()).unwrap();
        assert_eq!(out, "Email|text|1");
        assert_eq!(field.borrow().label(), "Email");
        assert_eq!(field.borrow().widget().attr("class"), Some("wide tall"));
        assert_eq!(ctx.get("x"), Some(ContextValue::from("ambient")));
        assert!(ctx.get("input_type").is_none());
    }

    #[test]
    fn test_error_class_only_with_errors() {
        let field = field();
        let options = RowOptions {
            error_class: Some("error".to_string()),
            template: Some("row.html".to_string()),
            ..RowOptions::default()
        };
        render_row(&Context::new(), &field, &options, &engine()).unwrap();
        assert_eq!(field.borrow().widget().attr("class"), None);

        field.borrow_mut().add_error("Bad.");
        render_row(&Context::new(), &field, &options, &engine()).unwrap();
        assert_eq!(field.borrow().widget().attr("class"), Some(" error"));
    }

    #[test]
    fn test_missing_template_propagates() {
        let options = RowOptions {
            template: Some("missing.html".to_string()),
            ..RowOptions::default()
        };
        let err = render_row(&Context::new(), &field(), &options, &engine()).unwrap_err();
        assert!(err.is_template_missing());
    }

    #[test]
    fn test_compile_rejects_positional_options() {
        let bits = |s: &str| s.split(' ').map(ToString::to_string).collect::<Vec<_>>();
        assert!(compile_formrow(&bits("formrow form.f a=1 b='x'")).is_ok());
        assert!(compile_formrow(&bits("formrow")).is_err());
        assert!(compile_formrow(&bits("formrow form.f stray")).is_err());
    }
}
