//! Dynamic values and property descriptors
//!
//! Every property of an [`Object`](crate::Object) holds a [`Value`]. Scalars
//! pass through the engine unchanged; objects and callables are the variants
//! the engine instruments.

use std::fmt;

use crate::callable::Callable;
use crate::object::Object;

/// A dynamically typed property value
#[derive(Clone)]
pub enum Value {
    /// Absent or explicitly null
    Null,
    /// Boolean scalar
    Bool(bool),
    /// Integer scalar
    Int(i64),
    /// Floating point scalar
    Float(f64),
    /// String scalar
    Str(String),
    /// Nested object (wrappable)
    Object(Object),
    /// Callable (interceptable as a method)
    Callable(Callable),
}

impl Value {
    /// Check for [`Value::Null`]
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Boolean payload, if any
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer payload, if any
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float payload, if any
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// String payload, if any
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Object payload, if any
    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Callable payload, if any
    #[inline]
    #[must_use]
    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Self::Callable(c) => Some(c),
            _ => None,
        }
    }

    /// Variant name, for error messages
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::Object(_) => "object",
            Self::Callable(_) => "callable",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Int(i) => write!(f, "Int({i})"),
            Self::Float(x) => write!(f, "Float({x})"),
            Self::Str(s) => write!(f, "Str({s:?})"),
            Self::Object(o) => write!(f, "{o:?}"),
            Self::Callable(c) => write!(f, "{c:?}"),
        }
    }
}

impl PartialEq for Value {
    /// Scalars compare structurally; objects and callables compare by
    /// reference identity, matching the engine's identity model.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Object::ptr_eq(a, b),
            (Self::Callable(a), Self::Callable(b)) => Callable::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Self::Object(o)
    }
}

impl From<Callable> for Value {
    fn from(c: Callable) -> Self {
        Self::Callable(c)
    }
}

/// Property descriptor for [`Object::define`](crate::Object::define)
///
/// Defaults mirror plain assignment: writable, enumerable and configurable.
/// Non-enumerable properties are skipped by the engine's recursive wrapping
/// pass; non-writable and non-configurable properties make the forwarded
/// operation itself fail, which the engine propagates unchanged.
#[derive(Clone, Debug)]
pub struct Descriptor {
    /// The property value
    pub value: Value,
    /// Whether plain assignment may replace the value
    pub writable: bool,
    /// Whether the property shows up in enumeration (and recursive wrapping)
    pub enumerable: bool,
    /// Whether the property may be redefined or deleted
    pub configurable: bool,
}

impl Descriptor {
    /// Descriptor with default attributes
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Reject plain assignment
    #[inline]
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    /// Hide from enumeration
    #[inline]
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.enumerable = false;
        self
    }

    /// Reject redefinition and deletion
    #[inline]
    #[must_use]
    pub fn permanent(mut self) -> Self {
        self.configurable = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::{assert_eq, assert_ne};

    #[test]
    fn scalar_equality() {
        assert_eq!(Value::from(3), Value::Int(3));
        assert_eq!(Value::from("hq"), Value::Str("hq".to_string()));
        assert_ne!(Value::from(3), Value::from(3.0));
        assert!(Value::Null.is_null());
    }

    #[test]
    fn object_equality_is_identity() {
        let a = Object::new();
        let b = Object::new();
        assert_eq!(Value::from(a.clone()), Value::from(a.clone()));
        assert_ne!(Value::from(a), Value::from(b));
    }

    #[test]
    fn descriptor_builders() {
        let desc = Descriptor::new(42).read_only().hidden();
        assert!(!desc.writable);
        assert!(!desc.enumerable);
        assert!(desc.configurable);
        assert_eq!(desc.value, Value::Int(42));
    }

    #[test]
    fn accessors() {
        assert_eq!(Value::from(7).as_i64(), Some(7));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert!(Value::Null.as_object().is_none());
        assert_eq!(Value::Null.type_name(), "null");
    }
}
