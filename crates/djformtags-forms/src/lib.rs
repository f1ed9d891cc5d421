//! # djformtags-forms
//!
//! The form model that `formtags` operates on: field definitions, the
//! widgets they render with, and bound fields exposed to templates as shared
//! [`FieldRef`] handles.

pub mod bound_field;
pub mod fields;
pub mod form;
pub mod widgets;

pub use bound_field::{BoundField, FieldRef};
pub use fields::{FieldDef, FieldType};
pub use form::{Form, FormData};
pub use widgets::{Widget, WidgetKind};
