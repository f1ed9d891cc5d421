//! The older row tags, `render_field` and `text_field`.
//!
//! ```text
//! {% render_field form.email placeholder="me@example.com" widget_class=wide %}
//! ```
//!
//! Options are literal `key=value` tokens: one layer of matching quotes is
//! stripped, values are never looked up in the context, and anything that
//! is not a `key=value` token is ignored. The tags translate these options
//! into [`RowOptions`] and render through [`render_row`], falling back to
//! `formtags/field.html`.

use djformtags_core::error::{FormTagsError, FormTagsResult};
use djformtags_template::parser::{split_kwarg, unquote, FilterExpression};
use djformtags_template::{Context, ContextValue, TagNode, TemplateRenderer};

use crate::formrow::{render_row, RowOptions};
use crate::{resolve_field, DEFAULT_FIELD_TEMPLATE};

/// Widget attributes copied from options of the same name when non-empty.
const WIDGET_ATTRS: &[&str] = &["placeholder", "autocapitalize", "autocorrect", "rel"];

/// Parses legacy option tokens into `(key, value)` pairs, in order.
pub fn parse_legacy_kwargs(bits: &[String]) -> Vec<(String, String)> {
    bits.iter()
        .filter_map(|bit| {
            let Some((key, value)) = split_kwarg(bit) else {
                tracing::trace!(token = %bit, "ignoring non-keyword token");
                return None;
            };
            let value = unquote(value).unwrap_or(value);
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Translates legacy options into row options.
///
/// The sub-template sees `help_text` (default `""`), `required_decorator`,
/// and then every option under its own name, recognised or not.
pub fn legacy_row_options(
    kwargs: &[(String, String)],
    required_decorator: ContextValue,
) -> RowOptions {
    let mut options = RowOptions {
        default_template: DEFAULT_FIELD_TEMPLATE.to_string(),
        error_class: Some("error".to_string()),
        ..RowOptions::default()
    };
    let mut help_text = String::new();
    let mut widget_classes: Vec<&str> = Vec::new();

    for (key, value) in kwargs {
        let non_empty = (!value.is_empty()).then(|| value.clone());
        match key.as_str() {
            "template" => options.template = non_empty,
            "label" => options.label = non_empty,
            "help_text" => help_text.clone_from(value),
            "widget_class" | "class_name" if !value.is_empty() => widget_classes.push(value),
            "widget_class" | "class_name" => {}
            attr if WIDGET_ATTRS.contains(&attr) && !value.is_empty() => {
                options.attrs.push((attr.to_string(), value.clone()));
            }
            _ => {}
        }
    }

    if !widget_classes.is_empty() {
        options.classes = Some(widget_classes.join(" "));
    }
    options.extra.push(("help_text".to_string(), ContextValue::from(help_text)));
    options
        .extra
        .push(("required_decorator".to_string(), required_decorator));
    options.extra.extend(
        kwargs
            .iter()
            .map(|(key, value)| (key.clone(), ContextValue::from(value.as_str()))),
    );
    options
}

struct RenderFieldNode {
    field: FilterExpression,
    kwargs: Vec<(String, String)>,
}

impl TagNode for RenderFieldNode {
    fn render(&self, context: &mut Context, engine: &dyn TemplateRenderer) -> FormTagsResult<String> {
        let Some(field) = resolve_field(&self.field, context)? else {
            return Ok(String::new());
        };
        let decorator = context
            .get("required_field_decorator")
            .unwrap_or(ContextValue::None);
        let options = legacy_row_options(&self.kwargs, decorator);
        render_row(context, &field, &options, engine)
    }
}

pub(crate) fn compile_render_field(bits: &[String]) -> FormTagsResult<Box<dyn TagNode>> {
    let Some(field) = bits.get(1) else {
        let tag = bits.first().map_or("render_field", String::as_str);
        return Err(FormTagsError::TemplateSyntaxError(format!(
            "'{tag}' tag requires arguments."
        )));
    };
    Ok(Box::new(RenderFieldNode {
        field: FilterExpression::parse(field)?,
        kwargs: parse_legacy_kwargs(&bits[2..]),
    }))
}
