//! Runtime value type.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::TypeHash;
use crate::builtin::{BuiltinKind, builtins};
use crate::error::NativeError;

use super::{BoundMethod, NativeFn, ObjectRef};

/// Named arguments, in call order.
pub type Kwargs = IndexMap<String, Value>;

/// A complex number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

/// A slice object (`start:stop:step`), each bound any value.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub start: Value,
    pub stop: Value,
    pub step: Value,
}

/// A module: a named attribute namespace.
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    attributes: Kwargs,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Kwargs::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

/// A dynamic value passed through dispatch.
///
/// Built-in variants carry their payload; `Object` is an instance of a
/// registered class. Every payload is either `Copy` or behind an `Arc`, so
/// cloning a value never deep-copies.
#[derive(Clone)]
pub enum Value {
    None,
    Ellipsis,
    /// The sentinel a handler returns to decline a call.
    NotImplemented,
    Bool(bool),
    Int(i64),
    Float(f64),
    Complex(Complex),
    Str(Arc<str>),
    Bytes(Arc<[u8]>),
    List(Arc<[Value]>),
    Tuple(Arc<[Value]>),
    /// String-keyed mapping.
    Dict(Arc<Kwargs>),
    Set(Arc<[Value]>),
    FrozenSet(Arc<[Value]>),
    Slice(Arc<Slice>),
    Module(Arc<Module>),
    Function(NativeFn),
    BoundMethod(Arc<BoundMethod>),
    Object(ObjectRef),
}

impl Value {
    // === Constructors ===

    pub fn str(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn tuple(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Tuple(items.into_iter().collect())
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    pub fn dict(entries: Kwargs) -> Self {
        Value::Dict(Arc::new(entries))
    }

    pub fn module(module: Module) -> Self {
        Value::Module(Arc::new(module))
    }

    pub fn bound(receiver: Value, function: Value) -> Self {
        Value::BoundMethod(Arc::new(BoundMethod::new(receiver, function)))
    }

    // === Type identity ===

    /// The built-in kind of this value, `None` for class instances.
    pub fn builtin_kind(&self) -> Option<BuiltinKind> {
        let kind = match self {
            Value::None => BuiltinKind::NoneType,
            Value::Ellipsis => BuiltinKind::Ellipsis,
            Value::NotImplemented => BuiltinKind::NotImplementedType,
            Value::Bool(_) => BuiltinKind::Bool,
            Value::Int(_) => BuiltinKind::Int,
            Value::Float(_) => BuiltinKind::Float,
            Value::Complex(_) => BuiltinKind::Complex,
            Value::Str(_) => BuiltinKind::Str,
            Value::Bytes(_) => BuiltinKind::Bytes,
            Value::List(_) => BuiltinKind::List,
            Value::Tuple(_) => BuiltinKind::Tuple,
            Value::Dict(_) => BuiltinKind::Dict,
            Value::Set(_) => BuiltinKind::Set,
            Value::FrozenSet(_) => BuiltinKind::FrozenSet,
            Value::Slice(_) => BuiltinKind::Slice,
            Value::Module(_) => BuiltinKind::Module,
            Value::Function(_) => BuiltinKind::Function,
            Value::BoundMethod(_) => BuiltinKind::Method,
            Value::Object(_) => return None,
        };
        Some(kind)
    }

    /// The exact runtime type of this value.
    pub fn type_hash(&self) -> TypeHash {
        match self {
            Value::Object(obj) => obj.class(),
            other => other
                .builtin_kind()
                .map_or(builtins::OBJECT, BuiltinKind::type_hash),
        }
    }

    /// Type name for built-ins, `"object"` for class instances.
    ///
    /// Class names need the registry; see `TypeRegistry::type_name`.
    pub fn type_label(&self) -> &'static str {
        self.builtin_kind().map_or("object", BuiltinKind::name)
    }

    // === Predicates ===

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Value::NotImplemented)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::BoundMethod(_))
    }

    /// Identity comparison.
    ///
    /// Shared payloads compare by pointer, singletons by variant, scalars by value.
    pub fn is(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None)
            | (Value::Ellipsis, Value::Ellipsis)
            | (Value::NotImplemented, Value::NotImplemented) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => Arc::ptr_eq(a, b),
            (Value::Bytes(a), Value::Bytes(b)) => Arc::ptr_eq(a, b),
            (Value::List(a), Value::List(b))
            | (Value::Tuple(a), Value::Tuple(b))
            | (Value::Set(a), Value::Set(b))
            | (Value::FrozenSet(a), Value::FrozenSet(b)) => Arc::ptr_eq(a, b),
            (Value::Dict(a), Value::Dict(b)) => Arc::ptr_eq(a, b),
            (Value::Slice(a), Value::Slice(b)) => Arc::ptr_eq(a, b),
            (Value::Module(a), Value::Module(b)) => Arc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::BoundMethod(a), Value::BoundMethod(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    // === Accessors ===

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Bool(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(&**s),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(items) => Some(&**items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Kwargs> {
        match self {
            Value::Dict(entries) => Some(&**entries),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&NativeFn> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    // === Calling ===

    /// Call this value.
    ///
    /// Functions and bound methods are callable; anything else raises
    /// [`NativeError::NotCallable`].
    pub fn call(&self, args: &[Value], kwargs: &Kwargs) -> Result<Value, NativeError> {
        match self {
            Value::Function(f) => f.call(args, kwargs),
            Value::BoundMethod(m) => m.call(args, kwargs),
            other => Err(NativeError::NotCallable {
                type_name: other.type_label().to_string(),
            }),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Ellipsis => write!(f, "Ellipsis"),
            Value::NotImplemented => write!(f, "NotImplemented"),
            Value::Bool(v) => write!(f, "Bool({})", v),
            Value::Int(v) => write!(f, "Int({})", v),
            Value::Float(v) => write!(f, "Float({})", v),
            Value::Complex(c) => write!(f, "Complex({}, {})", c.re, c.im),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Bytes(b) => write!(f, "Bytes({:?})", b),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Tuple(items) => f.debug_tuple("Tuple").field(items).finish(),
            Value::Dict(entries) => f.debug_tuple("Dict").field(entries).finish(),
            Value::Set(items) => f.debug_tuple("Set").field(items).finish(),
            Value::FrozenSet(items) => f.debug_tuple("FrozenSet").field(items).finish(),
            Value::Slice(s) => write!(f, "Slice({:?}, {:?}, {:?})", s.start, s.stop, s.step),
            Value::Module(m) => write!(f, "Module({})", m.name()),
            Value::Function(func) => write!(f, "Function({})", func.name()),
            Value::BoundMethod(m) => write!(f, "BoundMethod({:?})", m.function()),
            Value::Object(obj) => write!(f, "Object({:?})", obj.class()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Complex(a), Value::Complex(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b))
            | (Value::Tuple(a), Value::Tuple(b))
            | (Value::Set(a), Value::Set(b))
            | (Value::FrozenSet(a), Value::FrozenSet(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            (Value::Slice(a), Value::Slice(b)) => a == b,
            // Everything else compares by identity
            _ => self.is(other),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v.into())
    }
}

impl From<NativeFn> for Value {
    fn from(f: NativeFn) -> Self {
        Value::Function(f)
    }
}

impl From<super::Instance> for Value {
    fn from(instance: super::Instance) -> Self {
        instance.into_value()
    }
}
