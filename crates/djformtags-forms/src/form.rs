//! Forms: an ordered set of bound fields sharing a prefix and a data source.
//!
//! A [`Form`] is what view code puts in a template context. Templates reach
//! its fields by name (`{{ form.email }}`), and every lookup of the same name
//! yields the same [`FieldRef`], so tag mutations stick for the whole render.

use std::any::Any;
use std::collections::HashMap;

use djformtags_template::context::{ContextValue, TemplateObject};

use crate::bound_field::{BoundField, FieldRef};
use crate::fields::FieldDef;

/// Submitted form data: each key maps to one or more values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    data: HashMap<String, Vec<String>>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds data from `(key, value)` pairs, keeping repeated keys.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut data = Self::new();
        for (k, v) in pairs {
            data.append(k, v);
        }
        data
    }

    /// Adds a value under `key`, after any existing ones.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.entry(key.into()).or_default().push(value.into());
    }

    /// Returns the last value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data
            .get(key)
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    /// Returns every value for `key`.
    pub fn get_list(&self, key: &str) -> Option<&[String]> {
        self.data.get(key).map(Vec::as_slice)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }
}

/// A form built from field definitions.
#[derive(Debug, Clone)]
pub struct Form {
    fields: Vec<FieldRef>,
    prefix: Option<String>,
    bound: bool,
}

impl Form {
    /// Creates an unbound form with one bound field per definition.
    pub fn new(defs: Vec<FieldDef>) -> Self {
        Self::build(defs, None)
    }

    /// Creates an unbound form whose HTML names carry `prefix`.
    pub fn with_prefix(defs: Vec<FieldDef>, prefix: impl Into<String>) -> Self {
        Self::build(defs, Some(prefix.into()))
    }

    fn build(defs: Vec<FieldDef>, prefix: Option<String>) -> Self {
        let fields = defs
            .into_iter()
            .map(|def| FieldRef::new(BoundField::new(def, prefix.as_deref())))
            .collect();
        Self {
            fields,
            prefix,
            bound: false,
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Binds submitted data to every field by its HTML name.
    pub fn bind(&mut self, data: &FormData) {
        for field in &self.fields {
            let mut bf = field.borrow_mut();
            let values = data.get_list(bf.html_name()).map(<[String]>::to_vec);
            bf.bind(values.unwrap_or_default());
            bf.clear_errors();
        }
        self.bound = true;
    }

    pub const fn is_bound(&self) -> bool {
        self.bound
    }

    /// Validates every field, replacing their errors.
    pub fn full_clean(&self) {
        if !self.bound {
            return;
        }
        for field in &self.fields {
            field.borrow_mut().clean();
        }
        tracing::debug!(
            fields = self.fields.len(),
            errors = self.errors().len(),
            "form cleaned"
        );
    }

    /// Cleans the form and returns `true` when it is bound and error-free.
    /// An unbound form is never valid.
    pub fn is_valid(&self) -> bool {
        self.full_clean();
        self.bound && self.errors().is_empty()
    }

    /// Errors per field name, omitting fields without errors.
    pub fn errors(&self) -> HashMap<String, Vec<String>> {
        self.fields
            .iter()
            .filter_map(|field| {
                let bf = field.borrow();
                bf.has_errors()
                    .then(|| (bf.name().to_string(), bf.errors().to_vec()))
            })
            .collect()
    }

    /// The shared handle for the field called `name`.
    pub fn field(&self, name: &str) -> Option<FieldRef> {
        self.fields
            .iter()
            .find(|field| field.borrow().name() == name)
            .cloned()
    }

    pub fn fields(&self) -> &[FieldRef] {
        &self.fields
    }

    /// Renders each field as a `<p>` row: errors, label, widget, help text.
    pub fn as_p(&self) -> String {
        let mut rows = Vec::with_capacity(self.fields.len());
        let mut hidden = String::new();
        for field in &self.fields {
            let bf = field.borrow();
            if bf.is_hidden() {
                hidden.push_str(&bf.render());
                continue;
            }
            let help = if bf.field().help_text.is_empty() {
                String::new()
            } else {
                format!(
                    r#" <span class="helptext">{}</span>"#,
                    djformtags_template::context::escape_html(&bf.field().help_text)
                )
            };
            rows.push(format!(
                "{}<p>{} {}{help}</p>",
                bf.errors_as_ul(),
                bf.label_tag(),
                bf.render()
            ));
        }
        if !hidden.is_empty() {
            rows.push(hidden);
        }
        rows.join("\n")
    }
}

impl From<Form> for ContextValue {
    fn from(form: Form) -> Self {
        Self::object(form)
    }
}

impl TemplateObject for Form {
    fn lookup(&self, key: &str) -> Option<ContextValue> {
        match key {
            "is_bound" => Some(ContextValue::Bool(self.bound)),
            "fields" => Some(ContextValue::List(
                self.fields.iter().cloned().map(ContextValue::from).collect(),
            )),
            "errors" => Some(ContextValue::from(self.errors())),
            "as_p" => Some(ContextValue::SafeString(self.as_p())),
            name => self.field(name).map(ContextValue::from),
        }
    }

    fn render_html(&self) -> String {
        self.as_p()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
