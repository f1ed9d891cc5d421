//! Field-type classification and the `field_type` tag.

use djformtags_core::error::{FormTagsError, FormTagsResult};
use djformtags_forms::{Widget, WidgetKind};
use djformtags_template::parser::FilterExpression;
use djformtags_template::{Context, TagNode, TemplateRenderer};

use crate::resolve_field;

/// Widget kinds checked in order when a widget has no input type. A widget
/// may satisfy several; the first wins.
const WIDGET_TYPES: &[(WidgetKind, &str)] = &[
    (WidgetKind::TextInput, "text"),
    (WidgetKind::HiddenInput, "hidden"),
    (WidgetKind::FileInput, "file"),
    (WidgetKind::Textarea, "textarea"),
    (WidgetKind::CheckboxInput, "checkbox"),
    (WidgetKind::RadioSelect, "radio"),
    (WidgetKind::Select, "select"),
];

/// Returns a short string naming the widget's HTML input type.
///
/// An explicit input type (set with `{% setattr field "type" ... %}`) is
/// returned verbatim. Otherwise `<input>` widgets report their own type and
/// everything else is matched against the widget hierarchy. Unknown widgets
/// classify as `""`.
pub fn classify(widget: &Widget) -> String {
    if let Some(input_type) = widget.input_type() {
        return input_type.to_string();
    }
    WIDGET_TYPES
        .iter()
        .find(|(kind, _)| widget.kind().satisfies(kind))
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_default()
}

/// `{% field_type field %}` or `{% field_type field as var %}`.
struct FieldTypeNode {
    field: FilterExpression,
    target: Option<String>,
}

impl TagNode for FieldTypeNode {
    fn render(&self, context: &mut Context, _: &dyn TemplateRenderer) -> FormTagsResult<String> {
        let field_type = resolve_field(&self.field, context)?
            .map(|field| classify(field.borrow().widget()))
            .unwrap_or_default();

        match &self.target {
            Some(var) => {
                context.set(var.as_str(), field_type);
                Ok(String::new())
            }
            None => Ok(field_type),
        }
    }
}

pub(crate) fn compile_field_type(bits: &[String]) -> FormTagsResult<Box<dyn TagNode>> {
    let target = match bits {
        [_, _] => None,
        [_, _, as_kw, var] if as_kw == "as" => Some(var.clone()),
        _ => {
            return Err(FormTagsError::TemplateSyntaxError(
                "'field_type' tag requires a field and an optional 'as <name>'".to_string(),
            ))
        }
    };
    Ok(Box::new(FieldTypeNode {
        field: FilterExpression::parse(&bits[1])?,
        target,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(kind: WidgetKind) -> String {
        classify(&Widget::new(kind))
    }

    #[test]
    fn test_table_kinds() {
        assert_eq!(kind(WidgetKind::TextInput), "text");
        assert_eq!(kind(WidgetKind::HiddenInput), "hidden");
        assert_eq!(kind(WidgetKind::FileInput), "file");
        assert_eq!(kind(WidgetKind::Textarea), "textarea");
        assert_eq!(kind(WidgetKind::CheckboxInput), "checkbox");
        assert_eq!(kind(WidgetKind::Select), "select");
        assert_eq!(kind(WidgetKind::RadioSelect), "radio");
    }

    #[test]
    fn test_subclasses() {
        assert_eq!(kind(WidgetKind::EmailInput), "email");
        assert_eq!(kind(WidgetKind::PasswordInput), "password");
        assert_eq!(kind(WidgetKind::ClearableFileInput), "file");
        assert_eq!(kind(WidgetKind::SelectMultiple), "select");
        assert_eq!(kind(WidgetKind::CheckboxSelectMultiple), "select");
    }

    #[test]
    fn test_override_wins() {
        let mut widget = Widget::new(WidgetKind::Textarea);
        widget.set_input_type("email");
        assert_eq!(classify(&widget), "email");

        let mut widget = Widget::new(WidgetKind::Select);
        widget.set_input_type("");
        assert_eq!(classify(&widget), "");
    }

    #[test]
    fn test_unknown() {
        assert_eq!(kind(WidgetKind::Custom("ColorPicker".to_string())), "");
    }

    #[test]
    fn test_compile_arity() {
        let bits = |s: &str| s.split(' ').map(ToString::to_string).collect::<Vec<_>>();
        assert!(compile_field_type(&bits("field_type form.f")).is_ok());
        assert!(compile_field_type(&bits("field_type form.f as t")).is_ok());
        assert!(compile_field_type(&bits("field_type")).is_err());
        assert!(compile_field_type(&bits("field_type form.f as")).is_err());
        assert!(compile_field_type(&bits("field_type form.f into t")).is_err());
    }
}
