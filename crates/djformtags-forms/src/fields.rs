//! Form field definitions.
//!
//! A [`FieldDef`] describes one field of a form: its type, label, initial
//! value, and the widget it renders with. Binding a definition to submitted
//! data produces a [`BoundField`](crate::bound_field::BoundField).

use std::sync::OnceLock;

use regex::Regex;

use crate::widgets::{Widget, WidgetKind};

/// The type of a form field, controlling its default widget and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Char { max_length: Option<usize> },
    Email,
    Url,
    Integer,
    Boolean,
    Choice { choices: Vec<(String, String)> },
    MultipleChoice { choices: Vec<(String, String)> },
    File,
}

impl FieldType {
    /// The widget kind used when a definition does not name one.
    pub const fn default_widget(&self) -> WidgetKind {
        match self {
            Self::Char { .. } => WidgetKind::TextInput,
            Self::Email => WidgetKind::EmailInput,
            Self::Url => WidgetKind::UrlInput,
            Self::Integer => WidgetKind::NumberInput,
            Self::Boolean => WidgetKind::CheckboxInput,
            Self::Choice { .. } => WidgetKind::Select,
            Self::MultipleChoice { .. } => WidgetKind::SelectMultiple,
            Self::File => WidgetKind::ClearableFileInput,
        }
    }

    pub const fn max_length(&self) -> Option<usize> {
        match self {
            Self::Char { max_length } => *max_length,
            _ => None,
        }
    }

    pub fn choices(&self) -> &[(String, String)] {
        match self {
            Self::Choice { choices } | Self::MultipleChoice { choices } => choices,
            _ => &[],
        }
    }
}

/// Converts a field name to a label: `first_name` -> `First name`.
pub fn pretty_name(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

fn email_re() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap_or_else(|e| panic!("{e}"))
    })
}

fn url_re() -> &'static Regex {
    static URL_RE: OnceLock<Regex> = OnceLock::new();
    URL_RE.get_or_init(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").unwrap_or_else(|e| panic!("{e}")))
}

/// The definition of a single form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    /// Explicit label; `None` falls back to [`pretty_name`].
    pub label: Option<String>,
    pub initial: Option<String>,
    pub help_text: String,
    /// Widget override; `None` uses the type's default widget.
    pub widget: Option<Widget>,
}

impl FieldDef {
    /// Creates a required field with no label, initial value, or help text.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: true,
            label: None,
            initial: None,
            help_text: String::new(),
            widget: None,
        }
    }

    /// A char field with an optional maximum length.
    pub fn char(name: impl Into<String>, max_length: Option<usize>) -> Self {
        Self::new(name, FieldType::Char { max_length })
    }

    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn initial(mut self, value: impl Into<String>) -> Self {
        self.initial = Some(value.into());
        self
    }

    #[must_use]
    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = text.into();
        self
    }

    /// Uses `widget` instead of the type's default.
    #[must_use]
    pub fn widget(mut self, widget: Widget) -> Self {
        self.widget = Some(widget);
        self
    }

    /// The label shown for this field.
    pub fn display_label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| pretty_name(&self.name))
    }

    /// Builds the widget a bound field owns.
    ///
    /// A char field with a maximum length adds `maxlength` to text-like
    /// inputs. Choice fields hand their choices to the widget.
    pub fn build_widget(&self) -> Widget {
        let mut widget = self
            .widget
            .clone()
            .unwrap_or_else(|| Widget::new(self.field_type.default_widget()));

        if let Some(max) = self.field_type.max_length() {
            if widget.kind().satisfies(&WidgetKind::TextInput) && widget.attr("maxlength").is_none()
            {
                widget.set_attr("maxlength", max.to_string());
            }
        }
        if widget.choices().is_empty() && !self.field_type.choices().is_empty() {
            widget = widget.with_choices(self.field_type.choices().to_vec());
        }
        widget
    }

    /// Validates submitted values, returning error messages.
    pub fn validate(&self, values: &[String]) -> Vec<String> {
        let present: Vec<&str> = values
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .collect();

        let empty = match self.field_type {
            FieldType::Boolean => !present.first().is_some_and(|v| is_true(v)),
            _ => present.is_empty(),
        };
        if empty {
            return if self.required {
                vec!["This field is required.".to_string()]
            } else {
                Vec::new()
            };
        }

        let mut errors = Vec::new();
        let value = present[0];
        match &self.field_type {
            FieldType::Char { max_length: Some(max) } => {
                let len = value.chars().count();
                if len > *max {
                    errors.push(format!(
                        "Ensure this value has at most {max} characters (it has {len})."
                    ));
                }
            }
            FieldType::Email if !email_re().is_match(value) => {
                errors.push("Enter a valid email address.".to_string());
            }
            FieldType::Url if !url_re().is_match(value) => {
                errors.push("Enter a valid URL.".to_string());
            }
            FieldType::Integer if value.parse::<i64>().is_err() => {
                errors.push("Enter a whole number.".to_string());
            }
            FieldType::Choice { choices } | FieldType::MultipleChoice { choices } => {
                for v in &present {
                    if !choices.iter().any(|(c, _)| c == v) {
                        errors.push(format!(
                            "Select a valid choice. {v} is not one of the available choices."
                        ));
                    }
                }
            }
            _ => {}
        }
        errors
    }
}

fn is_true(value: &str) -> bool {
    !matches!(value, "false" | "False" | "0" | "off")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(vs: &[&str]) -> Vec<String> {
        vs.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_pretty_name() {
        assert_eq!(pretty_name("field"), "Field");
        assert_eq!(pretty_name("first_name"), "First name");
        assert_eq!(pretty_name(""), "");
    }

    #[test]
    fn test_display_label() {
        assert_eq!(FieldDef::char("field", None).display_label(), "Field");
        assert_eq!(
            FieldDef::char("field", None).label("Your name").display_label(),
            "Your name"
        );
    }

    #[test]
    fn test_default_widgets() {
        assert_eq!(FieldType::Email.default_widget(), WidgetKind::EmailInput);
        assert_eq!(FieldType::Boolean.default_widget(), WidgetKind::CheckboxInput);
        assert_eq!(FieldType::File.default_widget(), WidgetKind::ClearableFileInput);
        assert_eq!(
            FieldType::MultipleChoice { choices: vec![] }.default_widget(),
            WidgetKind::SelectMultiple
        );
    }

    #[test]
    fn test_build_widget_maxlength() {
        let widget = FieldDef::char("field", Some(100)).build_widget();
        assert_eq!(widget.kind(), &WidgetKind::TextInput);
        assert_eq!(widget.attr("maxlength"), Some("100"));

        let widget = FieldDef::char("field", Some(100))
            .widget(Widget::new(WidgetKind::Textarea))
            .build_widget();
        assert_eq!(widget.attr("maxlength"), None);

        let widget = FieldDef::char("field", Some(100))
            .widget(Widget::new(WidgetKind::PasswordInput))
            .build_widget();
        assert_eq!(widget.attr("maxlength"), Some("100"));
    }

    #[test]
    fn test_build_widget_choices() {
        let choices = vec![("a".to_string(), "A".to_string())];
        let def = FieldDef::new("pick", FieldType::Choice { choices: choices.clone() })
            .widget(Widget::new(WidgetKind::RadioSelect));
        let widget = def.build_widget();
        assert_eq!(widget.kind(), &WidgetKind::RadioSelect);
        assert_eq!(widget.choices(), choices.as_slice());
    }

    #[test]
    fn test_validate_required() {
        let def = FieldDef::char("name", None);
        assert_eq!(def.validate(&[]), vec!["This field is required."]);
        assert_eq!(def.validate(&values(&["  "])), vec!["This field is required."]);
        assert!(def.clone().required(false).validate(&[]).is_empty());
        assert!(def.validate(&values(&["x"])).is_empty());
    }

    #[test]
    fn test_validate_max_length() {
        let def = FieldDef::char("name", Some(3));
        assert_eq!(
            def.validate(&values(&["abcd"])),
            vec!["Ensure this value has at most 3 characters (it has 4)."]
        );
        assert!(def.validate(&values(&["abc"])).is_empty());
    }

    #[test]
    fn test_validate_types() {
        let email = FieldDef::new("email", FieldType::Email);
        assert!(email.validate(&values(&["me@example.com"])).is_empty());
        assert_eq!(
            email.validate(&values(&["nope"])),
            vec!["Enter a valid email address."]
        );

        let url = FieldDef::new("site", FieldType::Url);
        assert!(url.validate(&values(&["https://example.com/x"])).is_empty());
        assert_eq!(url.validate(&values(&["example"])), vec!["Enter a valid URL."]);

        let int = FieldDef::new("age", FieldType::Integer);
        assert_eq!(int.validate(&values(&["4.5"])), vec!["Enter a whole number."]);
    }

    #[test]
    fn test_validate_boolean_required_means_checked() {
        let def = FieldDef::new("agree", FieldType::Boolean);
        assert!(def.validate(&values(&["on"])).is_empty());
        assert_eq!(def.validate(&values(&["false"])), vec!["This field is required."]);
    }

    #[test]
    fn test_validate_choices() {
        let def = FieldDef::new(
            "tags",
            FieldType::MultipleChoice {
                choices: vec![("a".into(), "A".into()), ("b".into(), "B".into())],
            },
        );
        assert!(def.validate(&values(&["a", "b"])).is_empty());
        assert_eq!(
            def.validate(&values(&["a", "z"])),
            vec!["Select a valid choice. z is not one of the available choices."]
        );
    }
}
