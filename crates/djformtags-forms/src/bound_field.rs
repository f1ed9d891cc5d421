//! Bound fields: a field definition paired with its data, errors, and the
//! one widget it renders with.
//!
//! Templates never hold a [`BoundField`] directly. They see a [`FieldRef`],
//! a shared handle, so that a tag mutating the widget or label is observed by
//! every later lookup of the same field in the render.

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;

use djformtags_template::context::{escape_html, ContextValue, TemplateObject};

use crate::fields::FieldDef;
use crate::widgets::{Attrs, Widget};

/// A form field bound to data and validation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundField {
    field: FieldDef,
    html_name: String,
    label: String,
    widget: Widget,
    data: Option<Vec<String>>,
    errors: Vec<String>,
}

impl BoundField {
    /// Creates an unbound field. A `prefix` namespaces the HTML name as
    /// `prefix-name`.
    pub fn new(field: FieldDef, prefix: Option<&str>) -> Self {
        let html_name = match prefix {
            Some(p) => format!("{p}-{}", field.name),
            None => field.name.clone(),
        };
        Self {
            label: field.display_label(),
            widget: field.build_widget(),
            html_name,
            field,
            data: None,
            errors: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.field.name
    }

    pub fn html_name(&self) -> &str {
        &self.html_name
    }

    pub const fn field(&self) -> &FieldDef {
        &self.field
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn initial(&self) -> Option<&str> {
        self.field.initial.as_deref()
    }

    /// Replaces the field's initial value.
    pub fn set_initial(&mut self, initial: impl Into<String>) {
        self.field.initial = Some(initial.into());
    }

    pub const fn widget(&self) -> &Widget {
        &self.widget
    }

    /// The widget, for in-place mutation. It is never replaced.
    pub fn widget_mut(&mut self) -> &mut Widget {
        &mut self.widget
    }

    /// Binds submitted values; an empty slice means nothing was submitted.
    pub fn bind(&mut self, values: Vec<String>) {
        self.data = Some(values);
    }

    pub const fn is_bound(&self) -> bool {
        self.data.is_some()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    /// Runs the field's validation against its data, replacing the errors.
    pub fn clean(&mut self) {
        let values = self.data.clone().unwrap_or_default();
        self.errors = self.field.validate(&values);
    }

    /// The values to display: submitted data when bound, else the initial.
    pub fn values(&self) -> Vec<String> {
        match &self.data {
            Some(data) => data.clone(),
            None => self.initial().map(|v| vec![v.to_string()]).unwrap_or_default(),
        }
    }

    /// The first display value.
    pub fn value(&self) -> Option<String> {
        self.values().into_iter().next()
    }

    /// The HTML `id`: `id_<html name>`.
    pub fn auto_id(&self) -> String {
        format!("id_{}", self.html_name)
    }

    /// The `id` the widget actually renders with.
    pub fn id_for_label(&self) -> String {
        self.widget
            .attr("id")
            .map_or_else(|| self.auto_id(), ToString::to_string)
    }

    pub fn is_hidden(&self) -> bool {
        self.widget.is_hidden()
    }

    /// Renders the widget, adding the auto id unless the widget has one.
    pub fn render(&self) -> String {
        let mut extra = Attrs::new();
        if self.widget.attr("id").is_none() {
            extra.insert("id".to_string(), self.auto_id());
        }
        self.widget.render(&self.html_name, &self.values(), &extra)
    }

    /// Renders a `<label>` for this field with the label escaped.
    pub fn label_tag(&self) -> String {
        format!(
            r#"<label for="{}">{}</label>"#,
            escape_html(&self.id_for_label()),
            escape_html(&self.label)
        )
    }

    /// Renders the errors as `<ul class="errorlist">`, or `""` when valid.
    pub fn errors_as_ul(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        let items: String = self
            .errors
            .iter()
            .map(|e| format!("<li>{}</li>", escape_html(e)))
            .collect();
        format!(r#"<ul class="errorlist">{items}</ul>"#)
    }

    fn field_dict(&self) -> ContextValue {
        let mut field = HashMap::new();
        field.insert("label".to_string(), ContextValue::from(self.label.clone()));
        field.insert("required".to_string(), ContextValue::from(self.field.required));
        field.insert(
            "initial".to_string(),
            ContextValue::from(self.field.initial.clone()),
        );
        field.insert(
            "help_text".to_string(),
            ContextValue::from(self.field.help_text.clone()),
        );
        field.insert(
            "max_length".to_string(),
            ContextValue::from(self.field.field_type.max_length()),
        );
        field.insert("widget".to_string(), self.widget_dict());
        ContextValue::Dict(field)
    }

    fn widget_dict(&self) -> ContextValue {
        let attrs: HashMap<String, ContextValue> = self
            .widget
            .attrs()
            .iter()
            .map(|(k, v)| (k.clone(), ContextValue::from(v.clone())))
            .collect();
        let mut widget = HashMap::new();
        widget.insert("attrs".to_string(), ContextValue::Dict(attrs));
        widget.insert(
            "input_type".to_string(),
            ContextValue::from(self.widget.input_type().map(ToString::to_string)),
        );
        widget.insert(
            "kind".to_string(),
            ContextValue::from(self.widget.kind().to_string()),
        );
        widget.insert("is_hidden".to_string(), ContextValue::from(self.is_hidden()));
        ContextValue::Dict(widget)
    }
}

/// A shared handle to a bound field, as stored in template contexts.
#[derive(Debug, Clone)]
pub struct FieldRef(Rc<RefCell<BoundField>>);

impl FieldRef {
    pub fn new(field: BoundField) -> Self {
        Self(Rc::new(RefCell::new(field)))
    }

    pub fn borrow(&self) -> Ref<'_, BoundField> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, BoundField> {
        self.0.borrow_mut()
    }

    /// Returns the field behind a context value, if it holds one.
    pub fn from_value(value: &ContextValue) -> Option<Self> {
        value.downcast_object::<Self>().cloned()
    }

    /// Returns `true` if both handles point at the same field.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl From<FieldRef> for ContextValue {
    fn from(field: FieldRef) -> Self {
        Self::object(field)
    }
}

impl TemplateObject for FieldRef {
    fn lookup(&self, key: &str) -> Option<ContextValue> {
        let bf = self.borrow();
        let value = match key {
            "name" => ContextValue::from(bf.name()),
            "html_name" => ContextValue::from(bf.html_name()),
            "label" => ContextValue::from(bf.label()),
            "auto_id" => ContextValue::from(bf.auto_id()),
            "id_for_label" => ContextValue::from(bf.id_for_label()),
            "help_text" => ContextValue::from(bf.field.help_text.clone()),
            "value" => ContextValue::from(bf.value()),
            "required" => ContextValue::from(bf.field.required),
            "is_hidden" => ContextValue::from(bf.is_hidden()),
            "errors" => ContextValue::from(bf.errors.clone()),
            "errors_as_ul" => ContextValue::SafeString(bf.errors_as_ul()),
            "label_tag" => ContextValue::SafeString(bf.label_tag()),
            "field" => bf.field_dict(),
            "widget" => bf.widget_dict(),
            _ => return None,
        };
        Some(value)
    }

    fn render_html(&self) -> String {
        self.borrow().render()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldType;
    use crate::widgets::WidgetKind;

    fn char_field(name: &str) -> BoundField {
        BoundField::new(FieldDef::char(name, Some(100)), None)
    }

    #[test]
    fn test_render_matches_django_shape() {
        assert_eq!(
            char_field("field").render(),
            r#"<input id="id_field" maxlength="100" name="field" type="text" />"#
        );
    }

    #[test]
    fn test_prefix() {
        let bf = BoundField::new(FieldDef::char("email", None), Some("signup"));
        assert_eq!(bf.name(), "email");
        assert_eq!(bf.html_name(), "signup-email");
        assert_eq!(bf.auto_id(), "id_signup-email");
    }

    #[test]
    fn test_widget_id_wins_over_auto_id() {
        let mut bf = char_field("field");
        bf.widget_mut().set_attr("id", "custom");
        assert!(bf.render().contains(r#"id="custom""#));
        assert_eq!(bf.label_tag(), r#"<label for="custom">Field</label>"#);
    }

    #[test]
    fn test_values_prefer_data_over_initial() {
        let mut bf = BoundField::new(FieldDef::char("q", None).initial("start"), None);
        assert_eq!(bf.value().as_deref(), Some("start"));
        bf.bind(vec!["typed".to_string()]);
        assert!(bf.is_bound());
        assert_eq!(bf.value().as_deref(), Some("typed"));
        bf.bind(Vec::new());
        assert_eq!(bf.value(), None);
    }

    #[test]
    fn test_set_initial_renders_value() {
        let mut bf = char_field("field");
        bf.set_initial("me@example.com");
        assert_eq!(bf.initial(), Some("me@example.com"));
        assert!(bf.render().contains(r#"value="me@example.com""#));
    }

    #[test]
    fn test_label_tag_escapes() {
        let mut bf = char_field("field");
        bf.set_label("Friend's <Email>");
        assert_eq!(
            bf.label_tag(),
            r#"<label for="id_field">Friend&#39;s &lt;Email&gt;</label>"#
        );
    }

    #[test]
    fn test_errors() {
        let mut bf = char_field("field");
        assert!(!bf.has_errors());
        assert_eq!(bf.errors_as_ul(), "");

        bf.clean();
        assert_eq!(bf.errors(), ["This field is required."]);
        assert_eq!(
            bf.errors_as_ul(),
            r#"<ul class="errorlist"><li>This field is required.</li></ul>"#
        );

        bf.clear_errors();
        bf.add_error("Taken.");
        assert_eq!(bf.errors(), ["Taken."]);
    }

    #[test]
    fn test_field_ref_shares_state() {
        let field = FieldRef::new(char_field("field"));
        let alias = field.clone();
        alias.borrow_mut().widget_mut().set_attr("placeholder", "x");
        assert!(field.ptr_eq(&alias));
        assert_eq!(field.borrow().widget().attr("placeholder"), Some("x"));
    }

    #[test]
    fn test_field_ref_from_value() {
        let value = ContextValue::from(FieldRef::new(char_field("field")));
        assert!(FieldRef::from_value(&value).is_some());
        assert!(FieldRef::from_value(&ContextValue::from("field")).is_none());
    }

    #[test]
    fn test_lookups() {
        let field = FieldRef::new(BoundField::new(
            FieldDef::char("first_name", Some(30)).help_text("Given name"),
            None,
        ));
        let get = |key: &str| field.lookup(key).unwrap();

        assert_eq!(get("label"), ContextValue::from("First name"));
        assert_eq!(get("html_name"), ContextValue::from("first_name"));
        assert_eq!(get("auto_id"), ContextValue::from("id_first_name"));
        assert_eq!(get("help_text"), ContextValue::from("Given name"));
        assert_eq!(get("required"), ContextValue::Bool(true));
        assert_eq!(get("is_hidden"), ContextValue::Bool(false));
        assert!(get("value").is_none());
        assert!(get("label_tag").is_safe());
        assert!(field.lookup("nope").is_none());

        let nested = get("field");
        assert_eq!(nested.resolve_path("max_length"), Some(ContextValue::Integer(30)));
        let widget = nested.resolve_path("widget").unwrap();
        assert_eq!(
            widget.resolve_path("attrs").unwrap().resolve_path("maxlength"),
            Some(ContextValue::from("30"))
        );
        assert_eq!(widget.resolve_path("input_type"), Some(ContextValue::from("text")));
    }

    #[test]
    fn test_hidden_field() {
        let field = FieldRef::new(BoundField::new(
            FieldDef::char("token", None).widget(Widget::new(WidgetKind::HiddenInput)),
            None,
        ));
        assert_eq!(field.lookup("is_hidden"), Some(ContextValue::Bool(true)));
        assert_eq!(
            field.render_html(),
            r#"<input id="id_token" name="token" type="hidden" />"#
        );
    }

    #[test]
    fn test_boolean_field_renders_checkbox() {
        let bf = BoundField::new(
            FieldDef::new("agree", FieldType::Boolean).initial("True"),
            None,
        );
        assert_eq!(
            bf.render(),
            r#"<input checked="checked" id="id_agree" name="agree" type="checkbox" />"#
        );
    }
}
