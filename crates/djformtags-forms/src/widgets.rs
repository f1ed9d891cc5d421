//! Widgets: the HTML representation of form fields.
//!
//! A [`Widget`] is a [`WidgetKind`] plus a mutable attribute map. Tags mutate
//! widgets in place (placeholder, class, input type) before they are rendered.
//! Attributes render in sorted key order, so output is deterministic:
//!
//! ```
//! use djformtags_forms::widgets::{Widget, WidgetKind};
//!
//! let mut widget = Widget::new(WidgetKind::TextInput);
//! widget.set_attr("placeholder", "Email Address");
//! assert_eq!(
//!     widget.render("email", &[], &Default::default()),
//!     r#"<input name="email" placeholder="Email Address" type="text" />"#,
//! );
//! ```

use std::collections::BTreeMap;
use std::fmt;

use djformtags_template::context::escape_html;

/// The built-in widget kinds, plus `Custom` for anything else.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    TextInput,
    NumberInput,
    EmailInput,
    UrlInput,
    PasswordInput,
    HiddenInput,
    FileInput,
    /// A file input with a "clear" checkbox.
    ClearableFileInput,
    Textarea,
    CheckboxInput,
    Select,
    SelectMultiple,
    /// A list of radio buttons.
    RadioSelect,
    /// A list of checkboxes.
    CheckboxSelectMultiple,
    /// A widget outside the built-in hierarchy.
    Custom(String),
}

impl WidgetKind {
    /// The kind this one specializes, if any.
    ///
    /// This is the widget class hierarchy: an email input is a text input,
    /// a radio select is a select, a clearable file input is a file input.
    pub const fn parent(&self) -> Option<Self> {
        match self {
            Self::NumberInput | Self::EmailInput | Self::UrlInput | Self::PasswordInput => {
                Some(Self::TextInput)
            }
            Self::ClearableFileInput => Some(Self::FileInput),
            Self::SelectMultiple | Self::RadioSelect => Some(Self::Select),
            Self::CheckboxSelectMultiple => Some(Self::SelectMultiple),
            _ => None,
        }
    }

    /// Returns `true` if this kind is `base` or specializes it.
    pub fn satisfies(&self, base: &Self) -> bool {
        let mut current = Some(self.clone());
        while let Some(kind) = current {
            if &kind == base {
                return true;
            }
            current = kind.parent();
        }
        false
    }

    /// The `type` attribute of `<input>` kinds.
    pub const fn intrinsic_input_type(&self) -> Option<&'static str> {
        match self {
            Self::TextInput => Some("text"),
            Self::NumberInput => Some("number"),
            Self::EmailInput => Some("email"),
            Self::UrlInput => Some("url"),
            Self::PasswordInput => Some("password"),
            Self::HiddenInput => Some("hidden"),
            Self::FileInput | Self::ClearableFileInput => Some("file"),
            Self::CheckboxInput => Some("checkbox"),
            _ => None,
        }
    }

    /// Returns `true` for kinds that render a set of choices.
    pub fn has_choices(&self) -> bool {
        self.satisfies(&Self::Select)
    }

    /// Returns `true` for kinds that submit several values.
    pub fn allows_multiple(&self) -> bool {
        self.satisfies(&Self::SelectMultiple)
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TextInput => "TextInput",
            Self::NumberInput => "NumberInput",
            Self::EmailInput => "EmailInput",
            Self::UrlInput => "URLInput",
            Self::PasswordInput => "PasswordInput",
            Self::HiddenInput => "HiddenInput",
            Self::FileInput => "FileInput",
            Self::ClearableFileInput => "ClearableFileInput",
            Self::Textarea => "Textarea",
            Self::CheckboxInput => "CheckboxInput",
            Self::Select => "Select",
            Self::SelectMultiple => "SelectMultiple",
            Self::RadioSelect => "RadioSelect",
            Self::CheckboxSelectMultiple => "CheckboxSelectMultiple",
            Self::Custom(name) => name,
        };
        f.write_str(name)
    }
}

/// HTML attributes, rendered in key order.
pub type Attrs = BTreeMap<String, String>;

/// Formats attributes as ` key="value"` pairs with escaped values.
pub fn flatatt(attrs: &Attrs) -> String {
    attrs
        .iter()
        .map(|(k, v)| format!(r#" {k}="{}""#, escape_html(v)))
        .collect()
}

/// A widget instance: kind, attributes, and choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Widget {
    kind: WidgetKind,
    attrs: Attrs,
    input_type: Option<String>,
    choices: Vec<(String, String)>,
}

impl Widget {
    /// Creates a widget with the kind's default attributes.
    pub fn new(kind: WidgetKind) -> Self {
        let mut attrs = Attrs::new();
        if kind == WidgetKind::Textarea {
            attrs.insert("cols".to_string(), "40".to_string());
            attrs.insert("rows".to_string(), "10".to_string());
        }
        Self {
            kind,
            attrs,
            input_type: None,
            choices: Vec::new(),
        }
    }

    /// Adds attributes, overwriting existing keys.
    #[must_use]
    pub fn with_attrs<K, V>(mut self, attrs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in attrs {
            self.attrs.insert(k.into(), v.into());
        }
        self
    }

    /// Sets the `(value, label)` choices.
    #[must_use]
    pub fn with_choices(mut self, choices: Vec<(String, String)>) -> Self {
        self.choices = choices;
        self
    }

    pub const fn kind(&self) -> &WidgetKind {
        &self.kind
    }

    pub const fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// Sets an attribute, replacing any previous value.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(key.into(), value.into());
    }

    /// Appends to the `class` attribute, space-separated.
    pub fn append_class(&mut self, class: &str) {
        let existing = self.attr("class").unwrap_or_default();
        let joined = format!("{existing} {class}");
        self.set_attr("class", joined.trim());
    }

    /// The explicit input type set on this widget, if any.
    pub fn input_type_override(&self) -> Option<&str> {
        self.input_type.as_deref()
    }

    /// Overrides the input type. Rendering and classification use it from
    /// now on.
    pub fn set_input_type(&mut self, input_type: impl Into<String>) {
        self.input_type = Some(input_type.into());
    }

    /// The effective input type: the override, else the kind's own.
    pub fn input_type(&self) -> Option<&str> {
        self.input_type_override()
            .or_else(|| self.kind.intrinsic_input_type())
    }

    pub fn choices(&self) -> &[(String, String)] {
        &self.choices
    }

    pub fn is_hidden(&self) -> bool {
        self.input_type() == Some("hidden")
    }

    /// Renders the widget for `name` with the given values.
    ///
    /// `extra` attributes (typically `id`) are merged over the widget's own.
    /// Single-valued widgets use the first value.
    pub fn render(&self, name: &str, values: &[String], extra: &Attrs) -> String {
        let mut attrs = self.attrs.clone();
        attrs.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        attrs.insert("name".to_string(), name.to_string());
        let value = values.first().map(String::as_str).unwrap_or_default();

        match &self.kind {
            WidgetKind::Textarea if self.input_type.is_none() => {
                format!("<textarea{}>\r\n{}</textarea>", flatatt(&attrs), escape_html(value))
            }
            WidgetKind::CheckboxInput if self.input_type.is_none() => {
                if is_checked(value) {
                    attrs.insert("checked".to_string(), "checked".to_string());
                }
                attrs.insert("type".to_string(), "checkbox".to_string());
                format!("<input{} />", flatatt(&attrs))
            }
            kind if kind.has_choices() && self.input_type.is_none() => {
                self.render_choices(&mut attrs, values)
            }
            _ => {
                if let Some(input_type) = self.input_type() {
                    attrs.insert("type".to_string(), input_type.to_string());
                }
                let renders_value = !matches!(
                    self.input_type(),
                    Some("password" | "file")
                );
                if renders_value && !value.is_empty() {
                    attrs.insert("value".to_string(), value.to_string());
                }
                format!("<input{} />", flatatt(&attrs))
            }
        }
    }

    fn render_choices(&self, attrs: &mut Attrs, values: &[String]) -> String {
        let selected = |v: &str| values.iter().any(|s| s == v);

        if self.kind.satisfies(&WidgetKind::RadioSelect)
            || self.kind.satisfies(&WidgetKind::CheckboxSelectMultiple)
        {
            let input_type = if self.kind.allows_multiple() { "checkbox" } else { "radio" };
            let name = attrs.remove("name").unwrap_or_default();
            let id = attrs.remove("id");
            let mut items = Vec::with_capacity(self.choices.len());
            for (i, (value, label)) in self.choices.iter().enumerate() {
                let mut input = attrs.clone();
                input.insert("name".to_string(), name.clone());
                input.insert("type".to_string(), input_type.to_string());
                input.insert("value".to_string(), value.clone());
                if selected(value) {
                    input.insert("checked".to_string(), "checked".to_string());
                }
                let label_for = id.as_ref().map(|id| format!("{id}_{i}"));
                if let Some(for_id) = &label_for {
                    input.insert("id".to_string(), for_id.clone());
                }
                let for_attr = label_for
                    .map(|id| format!(r#" for="{}""#, escape_html(&id)))
                    .unwrap_or_default();
                items.push(format!(
                    "<li><label{for_attr}><input{} /> {}</label></li>",
                    flatatt(&input),
                    escape_html(label)
                ));
            }
            let ul_id = id
                .map(|id| format!(r#" id="{}""#, escape_html(&id)))
                .unwrap_or_default();
            return format!("<ul{ul_id}>\n{}\n</ul>", items.join("\n"));
        }

        if self.kind.allows_multiple() {
            attrs.insert("multiple".to_string(), "multiple".to_string());
        }
        let mut lines = vec![format!("<select{}>", flatatt(attrs))];
        for (value, label) in &self.choices {
            let marker = if selected(value) { r#" selected="selected""# } else { "" };
            lines.push(format!(
                r#"<option value="{}"{marker}>{}</option>"#,
                escape_html(value),
                escape_html(label)
            ));
        }
        lines.push("</select>".to_string());
        lines.join("\n")
    }
}

fn is_checked(value: &str) -> bool {
    !matches!(value, "" | "false" | "False" | "0" | "off")
}
