//! The `setattr` tag: `{% setattr field name value %}`.
//!
//! Mutates a bound field in place and renders nothing. A few names are
//! special:
//!
//! | name      | effect                                      |
//! |-----------|---------------------------------------------|
//! | `type`    | overrides the widget's input type           |
//! | `label`   | replaces the field label                    |
//! | `classes` | appends to the widget's `class` attribute   |
//! | `initial` | replaces the field's initial value          |
//!
//! Any other name sets that widget attribute, replacing an earlier value.

use djformtags_core::error::{FormTagsError, FormTagsResult};
use djformtags_forms::BoundField;
use djformtags_template::parser::FilterExpression;
use djformtags_template::{Context, TagNode, TemplateRenderer};

use crate::resolve_field;

/// Applies one `setattr` mutation to a bound field.
pub fn set_attribute(field: &mut BoundField, name: &str, value: &str) {
    match name {
        "type" => field.widget_mut().set_input_type(value),
        "label" => field.set_label(value),
        "classes" => field.widget_mut().append_class(value),
        "initial" => field.set_initial(value),
        _ => field.widget_mut().set_attr(name, value),
    }
}

struct SetAttrNode {
    field: FilterExpression,
    name: FilterExpression,
    value: FilterExpression,
}

impl TagNode for SetAttrNode {
    fn render(&self, context: &mut Context, _: &dyn TemplateRenderer) -> FormTagsResult<String> {
        let Some(field) = resolve_field(&self.field, context)? else {
            return Ok(String::new());
        };
        let name = self.name.resolve(context)?.to_display_string();
        let value = self.value.resolve(context)?.to_display_string();
        tracing::trace!(attribute = %name, value = %value, "setattr");
        set_attribute(&mut field.borrow_mut(), &name, &value);
        Ok(String::new())
    }
}

pub(crate) fn compile_setattr(bits: &[String]) -> FormTagsResult<Box<dyn TagNode>> {
    let [_, field, name, value] = bits else {
        return Err(FormTagsError::TemplateSyntaxError(
            "'setattr' tag requires a field, an attribute name, and a value".to_string(),
        ));
    };
    Ok(Box::new(SetAttrNode {
        field: FilterExpression::parse(field)?,
        name: FilterExpression::parse(name)?,
        value: FilterExpression::parse(value)?,
    }))
}
