//! Method values and per-class method providers

use core::fmt;

use crate::error::TableError;
use crate::instance::ObjectHandle;
use crate::runtime::Runtime;
use crate::table::TagTable;
use crate::tag::Selector;

/// Argument or result of a dynamically dispatched call
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Object(ObjectHandle),
}

impl Value {
    #[inline]
    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Unit)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Floats, or integers widened to float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<ObjectHandle> {
        match self {
            Value::Object(h) => Some(*h),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Object(_) => "object",
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Unit
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<ObjectHandle> for Value {
    fn from(h: ObjectHandle) -> Self {
        Value::Object(h)
    }
}

/// Entry point of a method implementation
///
/// Receives the runtime, so a method may create objects, read slots or
/// forward to its superclass with [`Runtime::invoke_super`].
pub type MethodFn = fn(&mut Runtime, ObjectHandle, &[Value]) -> Value;

/// Per-class answer to "do you implement this selector?"
///
/// Only the class's own methods are reported; inherited behavior is found by
/// the dispatcher walking the ancestor chain.
pub trait MethodProvider: Send + Sync {
    fn method(&self, selector: Selector) -> Option<MethodFn>;
}

impl<F> MethodProvider for F
where
    F: Fn(Selector) -> Option<MethodFn> + Send + Sync,
{
    #[inline]
    fn method(&self, selector: Selector) -> Option<MethodFn> {
        self(selector)
    }
}

/// Selector -> method table, the usual provider
pub struct MethodTable {
    methods: TagTable<Selector, MethodFn>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self {
            methods: TagTable::new(7),
        }
    }

    /// Builder form of [`MethodTable::define`]; a repeated selector replaces
    /// the earlier method
    #[must_use]
    pub fn with(mut self, selector: Selector, method: MethodFn) -> Self {
        self.methods.remove(&selector).ok();
        self.methods.insert(selector, method).ok();
        self
    }

    /// Add a method; fails if `selector` is already defined
    pub fn define(&mut self, selector: Selector, method: MethodFn) -> Result<(), TableError> {
        self.methods.insert(selector, method)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn selectors(&self) -> impl Iterator<Item = Selector> + '_ {
        self.methods.keys()
    }
}

impl Default for MethodTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodProvider for MethodTable {
    #[inline]
    fn method(&self, selector: Selector) -> Option<MethodFn> {
        self.methods.find(&selector).copied()
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.methods.keys()).finish()
    }
}
