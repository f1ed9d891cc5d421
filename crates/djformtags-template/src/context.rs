//! Template context for variable resolution and rendering.
//!
//! Provides [`Context`] for holding template variables in a stack of scopes,
//! [`ContextValue`] for representing dynamic template values, and the
//! [`TemplateObject`] trait through which host objects (forms, bound fields)
//! take part in dotted-path lookup and rendering.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A host object that can live in a template context.
///
/// Objects are shared by reference: cloning a [`ContextValue::Object`] clones
/// the `Rc`, so interior mutations made by one tag are seen by every later
/// lookup of the same object.
pub trait TemplateObject: fmt::Debug {
    /// Resolves one segment of a dotted path (`form.email` -> `lookup("email")`).
    fn lookup(&self, key: &str) -> Option<ContextValue>;

    /// Renders the object as HTML. The output is treated as safe.
    fn render_html(&self) -> String;

    /// Truthiness in `{% if %}`.
    fn is_truthy(&self) -> bool {
        true
    }

    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;
}

/// Represents a dynamic value in a template context.
#[derive(Debug, Clone)]
pub enum ContextValue {
    /// A string value, escaped on output when auto-escaping is on.
    String(String),
    /// A 64-bit integer.
    Integer(i64),
    /// A 64-bit floating point number.
    Float(f64),
    /// A boolean value.
    Bool(bool),
    /// An ordered list of values.
    List(Vec<ContextValue>),
    /// A key-value mapping.
    Dict(HashMap<String, ContextValue>),
    /// The absence of a value.
    None,
    /// A string marked as safe; auto-escaping will not be applied.
    SafeString(String),
    /// A shared host object.
    Object(Rc<dyn TemplateObject>),
}

impl ContextValue {
    /// Wraps a host object.
    pub fn object(obj: impl TemplateObject + 'static) -> Self {
        Self::Object(Rc::new(obj))
    }

    /// Returns the host object as `T`, if this is an object of that type.
    pub fn downcast_object<T: 'static>(&self) -> Option<&T> {
        match self {
            Self::Object(obj) => obj.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Returns `true` if this value is considered "truthy" in template logic.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Integer(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::String(s) | Self::SafeString(s) => !s.is_empty(),
            Self::List(l) => !l.is_empty(),
            Self::Dict(d) => !d.is_empty(),
            Self::Object(obj) => obj.is_truthy(),
        }
    }

    /// Converts this value to a display string (without HTML escaping).
    pub fn to_display_string(&self) -> String {
        match self {
            Self::String(s) | Self::SafeString(s) => s.clone(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => {
                if f.fract() == 0.0 {
                    format!("{f:.1}")
                } else {
                    f.to_string()
                }
            }
            Self::Bool(true) => "True".to_string(),
            Self::Bool(false) => "False".to_string(),
            Self::List(items) => {
                let inner: Vec<String> = items.iter().map(Self::to_repr).collect();
                format!("[{}]", inner.join(", "))
            }
            Self::Dict(map) => {
                let mut inner: Vec<String> = map
                    .iter()
                    .map(|(k, v)| format!("'{k}': {}", v.to_repr()))
                    .collect();
                inner.sort();
                format!("{{{}}}", inner.join(", "))
            }
            Self::None => String::new(),
            Self::Object(obj) => obj.render_html(),
        }
    }

    fn to_repr(&self) -> String {
        match self {
            Self::String(s) | Self::SafeString(s) => format!("'{s}'"),
            Self::None => "None".to_string(),
            other => other.to_display_string(),
        }
    }

    /// Returns `true` if output of this value bypasses auto-escaping.
    pub const fn is_safe(&self) -> bool {
        matches!(self, Self::SafeString(_) | Self::Object(_))
    }

    /// Marks a string value as safe.
    #[must_use]
    pub fn mark_safe(self) -> Self {
        match self {
            Self::String(s) => Self::SafeString(s),
            other => other,
        }
    }

    /// Resolves one segment of a dotted path on this value.
    pub fn resolve_path(&self, key: &str) -> Option<Self> {
        match self {
            Self::Dict(map) => map.get(key).cloned(),
            Self::List(list) => key.parse::<usize>().ok().and_then(|i| list.get(i).cloned()),
            Self::Object(obj) => obj.lookup(key),
            _ => None,
        }
    }

    /// Returns the length of a list, string, or dict.
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::String(s) | Self::SafeString(s) => Some(s.chars().count()),
            Self::List(l) => Some(l.len()),
            Self::Dict(d) => Some(d.len()),
            _ => None,
        }
    }

    /// Returns `true` if this is an empty collection or empty string.
    pub fn is_empty(&self) -> Option<bool> {
        self.len().map(|l| l == 0)
    }

    /// Returns the string contents if this is a `String` or `SafeString`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::SafeString(s) => Some(s),
            _ => None,
        }
    }

    /// Returns `true` for `ContextValue::None`.
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl PartialEq for ContextValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a) | Self::SafeString(a), Self::String(b) | Self::SafeString(b)) => {
                a == b
            }
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            #[allow(clippy::cast_precision_loss)]
            (Self::Integer(a), Self::Float(b)) | (Self::Float(b), Self::Integer(a)) => {
                (*a as f64) == *b
            }
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::None, Self::None) => true,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Dict(a), Self::Dict(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// -- From implementations --

impl From<&str> for ContextValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i32> for ContextValue {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<i64> for ContextValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<usize> for ContextValue {
    fn from(i: usize) -> Self {
        Self::Integer(i64::try_from(i).unwrap_or(i64::MAX))
    }
}

impl From<f64> for ContextValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for ContextValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<T: Into<Self>> From<Vec<T>> for ContextValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<HashMap<String, T>> for ContextValue {
    fn from(m: HashMap<String, T>) -> Self {
        Self::Dict(m.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for ContextValue {
    fn from(o: Option<T>) -> Self {
        o.map_or(Self::None, Into::into)
    }
}

impl From<serde_json::Value> for ContextValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::None,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::None),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(arr) => Self::List(arr.into_iter().map(Self::from).collect()),
            serde_json::Value::Object(map) => {
                Self::Dict(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

/// A template context that holds variables in a stack of scopes.
///
/// Lookup searches from the top of the stack downward and returns `None` for
/// anything it cannot resolve; a missing variable is never an error.
/// Cloning a context duplicates every scope while sharing host objects.
///
/// # Examples
///
/// ```
/// use djformtags_template::context::{Context, ContextValue};
///
/// let mut ctx = Context::new();
/// ctx.set("name", ContextValue::from("Django"));
///
/// ctx.push();
/// ctx.set("name", ContextValue::from("Overridden"));
/// assert_eq!(ctx.get("name").unwrap().to_display_string(), "Overridden");
///
/// ctx.pop();
/// assert_eq!(ctx.get("name").unwrap().to_display_string(), "Django");
/// assert!(ctx.get("missing.path").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Context {
    stack: Vec<HashMap<String, ContextValue>>,
    auto_escape: bool,
}

impl Context {
    /// Creates a new empty context with a single scope.
    pub fn new() -> Self {
        Self {
            stack: vec![HashMap::new()],
            auto_escape: true,
        }
    }

    /// Creates a context whose single scope holds the given variables.
    pub fn from_map(vars: HashMap<String, ContextValue>) -> Self {
        Self {
            stack: vec![vars],
            auto_escape: true,
        }
    }

    /// Pushes a new scope onto the context stack.
    pub fn push(&mut self) {
        self.stack.push(HashMap::new());
    }

    /// Pops the top scope. The bottom scope is never removed.
    pub fn pop(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    /// Sets a variable in the current (top) scope.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        if let Some(top) = self.stack.last_mut() {
            top.insert(key.into(), value.into());
        }
    }

    /// Looks up a variable, following dot-separated paths like `form.email.label`.
    pub fn get(&self, key: &str) -> Option<ContextValue> {
        let mut parts = key.split('.');
        let root_key = parts.next()?;

        let mut current = self
            .stack
            .iter()
            .rev()
            .find_map(|scope| scope.get(root_key))?
            .clone();

        for part in parts {
            current = current.resolve_path(part)?;
        }

        Some(current)
    }

    /// Returns `true` if the root name is bound in any scope.
    pub fn contains(&self, key: &str) -> bool {
        self.stack.iter().any(|scope| scope.contains_key(key))
    }

    /// Returns whether auto-escaping is enabled.
    pub const fn auto_escape(&self) -> bool {
        self.auto_escape
    }

    /// Sets whether auto-escaping is enabled.
    pub fn set_auto_escape(&mut self, enabled: bool) {
        self.auto_escape = enabled;
    }

    /// Flattens all scopes into a single map; later scopes win.
    pub fn flatten(&self) -> HashMap<String, ContextValue> {
        let mut result = HashMap::new();
        for scope in &self.stack {
            for (k, v) in scope {
                result.insert(k.clone(), v.clone());
            }
        }
        result
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

/// Escapes HTML special characters.
///
/// Replaces `&`, `<`, `>`, `"`, and `'` with their entity equivalents.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Renders a value for output, escaping it unless it is safe or escaping is off.
pub fn conditional_escape(value: &ContextValue, auto_escape: bool) -> String {
    let s = value.to_display_string();
    if auto_escape && !value.is_safe() {
        escape_html(&s)
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[derive(Debug, Default)]
    struct Counter {
        hits: Cell<u32>,
    }

    impl TemplateObject for Counter {
        fn lookup(&self, key: &str) -> Option<ContextValue> {
            self.hits.set(self.hits.get() + 1);
            (key == "hits").then(|| ContextValue::from(i64::from(self.hits.get())))
        }

        fn render_html(&self) -> String {
            "<b>counter</b>".to_string()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_context_value_display() {
        assert_eq!(ContextValue::from("hello").to_display_string(), "hello");
        assert_eq!(ContextValue::from(42i32).to_display_string(), "42");
        assert_eq!(ContextValue::Float(3.0).to_display_string(), "3.0");
        assert_eq!(ContextValue::from(true).to_display_string(), "True");
        assert_eq!(ContextValue::None.to_display_string(), "");
        assert_eq!(ContextValue::from(vec![1i32, 2]).to_display_string(), "[1, 2]");
    }

    #[test]
    fn test_context_value_from_json() {
        let v: ContextValue = serde_json::json!({"name": "x", "n": 4, "meta": null}).into();
        assert_eq!(v.resolve_path("name"), Some(ContextValue::from("x")));
        assert_eq!(v.resolve_path("n"), Some(ContextValue::Integer(4)));
        assert_eq!(v.resolve_path("meta"), Some(ContextValue::None));
    }

    #[test]
    fn test_context_value_truthiness() {
        assert!(ContextValue::Bool(true).is_truthy());
        assert!(!ContextValue::Integer(0).is_truthy());
        assert!(!ContextValue::String(String::new()).is_truthy());
        assert!(!ContextValue::List(vec![]).is_truthy());
        assert!(!ContextValue::None.is_truthy());
        assert!(ContextValue::object(Counter::default()).is_truthy());
    }

    #[test]
    fn test_object_is_safe_and_renders_html() {
        let v = ContextValue::object(Counter::default());
        assert!(v.is_safe());
        assert_eq!(conditional_escape(&v, true), "<b>counter</b>");
    }

    #[test]
    fn test_object_shared_between_clones() {
        let v = ContextValue::object(Counter::default());
        let copy = v.clone();
        assert_eq!(v, copy);

        v.resolve_path("hits");
        let hits = copy.resolve_path("hits").unwrap();
        assert_eq!(hits, ContextValue::Integer(2));
    }

    #[test]
    fn test_downcast_object() {
        let v = ContextValue::object(Counter::default());
        assert!(v.downcast_object::<Counter>().is_some());
        assert!(v.downcast_object::<String>().is_none());
        assert!(ContextValue::from("x").downcast_object::<Counter>().is_none());
    }

    #[test]
    fn test_distinct_objects_not_equal() {
        let a = ContextValue::object(Counter::default());
        let b = ContextValue::object(Counter::default());
        assert_ne!(a, b);
    }

    #[test]
    fn test_context_push_pop() {
        let mut ctx = Context::new();
        ctx.set("x", 1i32);
        ctx.push();
        ctx.set("x", 2i32);
        assert_eq!(ctx.get("x"), Some(ContextValue::Integer(2)));
        ctx.pop();
        assert_eq!(ctx.get("x"), Some(ContextValue::Integer(1)));
        ctx.pop();
        assert_eq!(ctx.get("x"), Some(ContextValue::Integer(1)));
    }

    #[test]
    fn test_context_dot_notation() {
        let mut user = HashMap::new();
        user.insert("name".to_string(), ContextValue::from("Alice"));
        let mut ctx = Context::new();
        ctx.set("user", ContextValue::Dict(user));
        ctx.set("items", vec!["first", "second"]);

        assert_eq!(ctx.get("user.name").unwrap().to_display_string(), "Alice");
        assert!(ctx.get("user.email").is_none());
        assert_eq!(ctx.get("items.1").unwrap().to_display_string(), "second");
        assert!(ctx.get("items.5").is_none());
    }

    #[test]
    fn test_context_object_path() {
        let mut ctx = Context::new();
        ctx.set("counter", ContextValue::object(Counter::default()));
        assert_eq!(ctx.get("counter.hits"), Some(ContextValue::Integer(1)));
        assert!(ctx.get("counter.other").is_none());
    }

    #[test]
    fn test_context_clone_is_independent() {
        let mut ctx = Context::new();
        ctx.set("a", 1i32);
        let mut copy = ctx.clone();
        copy.set("a", 2i32);
        copy.set("b", 3i32);
        assert_eq!(ctx.get("a"), Some(ContextValue::Integer(1)));
        assert!(ctx.get("b").is_none());
    }

    #[test]
    fn test_context_contains_and_flatten() {
        let mut ctx = Context::new();
        ctx.set("a", 1i32);
        ctx.push();
        ctx.set("a", 10i32);
        ctx.set("b", 2i32);
        assert!(ctx.contains("b"));
        assert!(!ctx.contains("c"));

        let flat = ctx.flatten();
        assert_eq!(flat.get("a"), Some(&ContextValue::Integer(10)));
        assert_eq!(flat.get("b"), Some(&ContextValue::Integer(2)));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>bold</b>"), "&lt;b&gt;bold&lt;/b&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html("\"q\""), "&quot;q&quot;");
        assert_eq!(escape_html("Friend's"), "Friend&#39;s");
    }

    #[test]
    fn test_conditional_escape() {
        assert_eq!(conditional_escape(&ContextValue::from("<i>"), true), "&lt;i&gt;");
        assert_eq!(conditional_escape(&ContextValue::from("<i>"), false), "<i>");
        assert_eq!(
            conditional_escape(&ContextValue::from("<i>").mark_safe(), true),
            "<i>"
        );
    }
}
