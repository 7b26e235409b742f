//! Dynamic property values.
//!
//! [`PropertyValue`] is what crosses the [`Resolvable`] boundary: named
//! property lookups return one, and group keys are compared against one.
//! Scalars compare by value, objects compare by identity.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::notify::Resolvable;

/// A dynamically typed property value.
///
/// Serializes untagged, so a group key can be written as a bare JSON scalar
/// (`"north"`, `3`, `true`, `null`). Object values are never serialized.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// No value (a null reference or an unset optional).
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// An integer. All integer widths widen to `i64`.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    String(String),
    /// A nested object that can be resolved further.
    #[serde(skip)]
    Object(Arc<dyn Resolvable>),
}

impl PropertyValue {
    /// Returns `true` if this is [`PropertyValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// Returns the boolean value, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer value, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the numeric value, widening integers.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(n) => Some(*n),
            PropertyValue::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Returns the string slice, if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the nested object, if this is an `Object`.
    pub fn as_object(&self) -> Option<&Arc<dyn Resolvable>> {
        match self {
            PropertyValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// A short label for the kind of value, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Null => "null",
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Int(_) => "int",
            PropertyValue::Float(_) => "float",
            PropertyValue::String(_) => "string",
            PropertyValue::Object(obj) => obj.type_name(),
        }
    }
}

impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropertyValue::Null, PropertyValue::Null) => true,
            (PropertyValue::Bool(a), PropertyValue::Bool(b)) => a == b,
            (PropertyValue::Int(a), PropertyValue::Int(b)) => a == b,
            (PropertyValue::Float(a), PropertyValue::Float(b)) => a == b,
            (PropertyValue::String(a), PropertyValue::String(b)) => a == b,
            (PropertyValue::Object(a), PropertyValue::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => f.write_str("Null"),
            PropertyValue::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            PropertyValue::Int(n) => f.debug_tuple("Int").field(n).finish(),
            PropertyValue::Float(n) => f.debug_tuple("Float").field(n).finish(),
            PropertyValue::String(s) => f.debug_tuple("String").field(s).finish(),
            PropertyValue::Object(obj) => f.debug_tuple("Object").field(&obj.type_name()).finish(),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => f.write_str("null"),
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Int(n) => write!(f, "{}", n),
            PropertyValue::Float(n) => write!(f, "{}", n),
            PropertyValue::String(s) => write!(f, "{:?}", s),
            PropertyValue::Object(obj) => write!(f, "<{}>", obj.type_name()),
        }
    }
}

/// Conversion into a [`PropertyValue`].
///
/// Implemented for the scalar types, `String`, shared objects and `Option`s of
/// those. Fields exposed through `#[derive(Resolvable)]` must implement it.
pub trait IntoPropertyValue {
    /// Convert `self` into a dynamic value.
    fn into_property_value(self) -> PropertyValue;
}

/// Conversion out of a [`PropertyValue`].
///
/// Returns `None` when the value holds a different kind.
pub trait FromPropertyValue: Sized {
    /// Try to extract `Self` from a dynamic value.
    fn from_property_value(value: PropertyValue) -> Option<Self>;
}

impl IntoPropertyValue for PropertyValue {
    fn into_property_value(self) -> PropertyValue {
        self
    }
}

impl IntoPropertyValue for bool {
    fn into_property_value(self) -> PropertyValue {
        PropertyValue::Bool(self)
    }
}

macro_rules! impl_into_int {
    ($($ty:ty),*) => {
        $(
            impl IntoPropertyValue for $ty {
                fn into_property_value(self) -> PropertyValue {
                    PropertyValue::Int(i64::from(self))
                }
            }
        )*
    };
}

impl_into_int!(i8, i16, i32, i64, u8, u16, u32);

impl IntoPropertyValue for f32 {
    fn into_property_value(self) -> PropertyValue {
        PropertyValue::Float(f64::from(self))
    }
}

impl IntoPropertyValue for f64 {
    fn into_property_value(self) -> PropertyValue {
        PropertyValue::Float(self)
    }
}

impl IntoPropertyValue for String {
    fn into_property_value(self) -> PropertyValue {
        PropertyValue::String(self)
    }
}

impl IntoPropertyValue for &str {
    fn into_property_value(self) -> PropertyValue {
        PropertyValue::String(self.to_owned())
    }
}

impl<T: Resolvable + 'static> IntoPropertyValue for Arc<T> {
    fn into_property_value(self) -> PropertyValue {
        PropertyValue::Object(self)
    }
}

impl IntoPropertyValue for Arc<dyn Resolvable> {
    fn into_property_value(self) -> PropertyValue {
        PropertyValue::Object(self)
    }
}

impl<T: IntoPropertyValue> IntoPropertyValue for Option<T> {
    fn into_property_value(self) -> PropertyValue {
        match self {
            Some(value) => value.into_property_value(),
            None => PropertyValue::Null,
        }
    }
}

impl FromPropertyValue for PropertyValue {
    fn from_property_value(value: PropertyValue) -> Option<Self> {
        Some(value)
    }
}

impl FromPropertyValue for bool {
    fn from_property_value(value: PropertyValue) -> Option<Self> {
        value.as_bool()
    }
}

impl FromPropertyValue for i64 {
    fn from_property_value(value: PropertyValue) -> Option<Self> {
        value.as_int()
    }
}

impl FromPropertyValue for i32 {
    fn from_property_value(value: PropertyValue) -> Option<Self> {
        value.as_int().and_then(|n| i32::try_from(n).ok())
    }
}

impl FromPropertyValue for f64 {
    fn from_property_value(value: PropertyValue) -> Option<Self> {
        value.as_float()
    }
}

impl FromPropertyValue for String {
    fn from_property_value(value: PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl FromPropertyValue for Arc<dyn Resolvable> {
    fn from_property_value(value: PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Object(obj) => Some(obj),
            _ => None,
        }
    }
}
