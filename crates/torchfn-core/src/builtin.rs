//! Built-in value types and the override exclusion set.
//!
//! Built-in types are the structural values every call carries (numbers,
//! containers, strings, singletons). They never act as override sources, so
//! the precedence registry rejects them by exact type before probing any
//! attribute. Which kinds are rejected is an [`ExclusionSet`], built once
//! from configuration and never mutated.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use thiserror::Error;

use crate::TypeHash;

/// Hashes for the built-in types, computed at compile time from their names.
pub mod builtins {
    use crate::TypeHash;

    /// Root of every class hierarchy.
    pub const OBJECT: TypeHash = TypeHash::from_name_const("object");
    pub const BOOL: TypeHash = TypeHash::from_name_const("bool");
    pub const INT: TypeHash = TypeHash::from_name_const("int");
    pub const FLOAT: TypeHash = TypeHash::from_name_const("float");
    pub const COMPLEX: TypeHash = TypeHash::from_name_const("complex");
    pub const LIST: TypeHash = TypeHash::from_name_const("list");
    pub const TUPLE: TypeHash = TypeHash::from_name_const("tuple");
    pub const DICT: TypeHash = TypeHash::from_name_const("dict");
    pub const SET: TypeHash = TypeHash::from_name_const("set");
    pub const FROZENSET: TypeHash = TypeHash::from_name_const("frozenset");
    pub const STR: TypeHash = TypeHash::from_name_const("str");
    pub const BYTES: TypeHash = TypeHash::from_name_const("bytes");
    pub const SLICE: TypeHash = TypeHash::from_name_const("slice");
    pub const NONE_TYPE: TypeHash = TypeHash::from_name_const("NoneType");
    pub const ELLIPSIS: TypeHash = TypeHash::from_name_const("ellipsis");
    pub const NOT_IMPLEMENTED_TYPE: TypeHash = TypeHash::from_name_const("NotImplementedType");
    pub const MODULE: TypeHash = TypeHash::from_name_const("module");
    pub const FUNCTION: TypeHash = TypeHash::from_name_const("function");
    pub const METHOD: TypeHash = TypeHash::from_name_const("method");
}

/// Kind of a built-in type.
///
/// The discriminant doubles as the bit position in [`ExclusionSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum BuiltinKind {
    Bool = 0,
    Int = 1,
    Float = 2,
    Complex = 3,
    List = 4,
    Tuple = 5,
    Dict = 6,
    Set = 7,
    FrozenSet = 8,
    Str = 9,
    Bytes = 10,
    Slice = 11,
    NoneType = 12,
    Ellipsis = 13,
    NotImplementedType = 14,
    Module = 15,
    Function = 16,
    Method = 17,
}

impl BuiltinKind {
    /// Every built-in kind, in discriminant order.
    pub const ALL: [BuiltinKind; 18] = [
        BuiltinKind::Bool,
        BuiltinKind::Int,
        BuiltinKind::Float,
        BuiltinKind::Complex,
        BuiltinKind::List,
        BuiltinKind::Tuple,
        BuiltinKind::Dict,
        BuiltinKind::Set,
        BuiltinKind::FrozenSet,
        BuiltinKind::Str,
        BuiltinKind::Bytes,
        BuiltinKind::Slice,
        BuiltinKind::NoneType,
        BuiltinKind::Ellipsis,
        BuiltinKind::NotImplementedType,
        BuiltinKind::Module,
        BuiltinKind::Function,
        BuiltinKind::Method,
    ];

    /// The type name as it appears in diagnostics and configuration.
    pub const fn name(self) -> &'static str {
        match self {
            BuiltinKind::Bool => "bool",
            BuiltinKind::Int => "int",
            BuiltinKind::Float => "float",
            BuiltinKind::Complex => "complex",
            BuiltinKind::List => "list",
            BuiltinKind::Tuple => "tuple",
            BuiltinKind::Dict => "dict",
            BuiltinKind::Set => "set",
            BuiltinKind::FrozenSet => "frozenset",
            BuiltinKind::Str => "str",
            BuiltinKind::Bytes => "bytes",
            BuiltinKind::Slice => "slice",
            BuiltinKind::NoneType => "NoneType",
            BuiltinKind::Ellipsis => "ellipsis",
            BuiltinKind::NotImplementedType => "NotImplementedType",
            BuiltinKind::Module => "module",
            BuiltinKind::Function => "function",
            BuiltinKind::Method => "method",
        }
    }

    pub const fn type_hash(self) -> TypeHash {
        match self {
            BuiltinKind::Bool => builtins::BOOL,
            BuiltinKind::Int => builtins::INT,
            BuiltinKind::Float => builtins::FLOAT,
            BuiltinKind::Complex => builtins::COMPLEX,
            BuiltinKind::List => builtins::LIST,
            BuiltinKind::Tuple => builtins::TUPLE,
            BuiltinKind::Dict => builtins::DICT,
            BuiltinKind::Set => builtins::SET,
            BuiltinKind::FrozenSet => builtins::FROZENSET,
            BuiltinKind::Str => builtins::STR,
            BuiltinKind::Bytes => builtins::BYTES,
            BuiltinKind::Slice => builtins::SLICE,
            BuiltinKind::NoneType => builtins::NONE_TYPE,
            BuiltinKind::Ellipsis => builtins::ELLIPSIS,
            BuiltinKind::NotImplementedType => builtins::NOT_IMPLEMENTED_TYPE,
            BuiltinKind::Module => builtins::MODULE,
            BuiltinKind::Function => builtins::FUNCTION,
            BuiltinKind::Method => builtins::METHOD,
        }
    }

    /// Find the kind whose type hash is exactly `hash`.
    pub fn from_type_hash(hash: TypeHash) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.type_hash() == hash)
    }

    /// Direct base of this built-in (`bool` derives from `int`, the rest from `object`).
    pub const fn base(self) -> TypeHash {
        match self {
            BuiltinKind::Bool => builtins::INT,
            _ => builtins::OBJECT,
        }
    }
}

impl fmt::Display for BuiltinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a string names no built-in kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown built-in type '{0}'")]
pub struct UnknownBuiltin(pub String);

impl FromStr for BuiltinKind {
    type Err = UnknownBuiltin;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownBuiltin(s.to_string()))
    }
}

impl TryFrom<String> for BuiltinKind {
    type Error = UnknownBuiltin;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BuiltinKind> for String {
    fn from(kind: BuiltinKind) -> Self {
        kind.name().to_string()
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for BuiltinKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for BuiltinKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

bitflags! {
    /// Set of built-in kinds that are never treated as override sources.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ExclusionSet: u32 {
        const BOOL = 1 << 0;
        const INT = 1 << 1;
        const FLOAT = 1 << 2;
        const COMPLEX = 1 << 3;
        const LIST = 1 << 4;
        const TUPLE = 1 << 5;
        const DICT = 1 << 6;
        const SET = 1 << 7;
        const FROZENSET = 1 << 8;
        const STR = 1 << 9;
        const BYTES = 1 << 10;
        const SLICE = 1 << 11;
        const NONE_TYPE = 1 << 12;
        const ELLIPSIS = 1 << 13;
        const NOT_IMPLEMENTED_TYPE = 1 << 14;
        const MODULE = 1 << 15;
        const FUNCTION = 1 << 16;
        const METHOD = 1 << 17;
    }
}

impl ExclusionSet {
    /// Numbers, containers, strings, singletons and modules.
    pub const DEFAULT: ExclusionSet = ExclusionSet::BOOL
        .union(ExclusionSet::INT)
        .union(ExclusionSet::FLOAT)
        .union(ExclusionSet::COMPLEX)
        .union(ExclusionSet::LIST)
        .union(ExclusionSet::TUPLE)
        .union(ExclusionSet::DICT)
        .union(ExclusionSet::SET)
        .union(ExclusionSet::FROZENSET)
        .union(ExclusionSet::STR)
        .union(ExclusionSet::BYTES)
        .union(ExclusionSet::SLICE)
        .union(ExclusionSet::NONE_TYPE)
        .union(ExclusionSet::ELLIPSIS)
        .union(ExclusionSet::NOT_IMPLEMENTED_TYPE)
        .union(ExclusionSet::MODULE);

    /// The single-bit set for `kind`.
    #[inline]
    pub fn of(kind: BuiltinKind) -> Self {
        Self::from_bits_retain(1 << u8::from(kind))
    }

    #[inline]
    pub fn contains_kind(&self, kind: BuiltinKind) -> bool {
        self.contains(Self::of(kind))
    }

    /// Check whether the type identified by `hash` is an excluded built-in.
    ///
    /// Only exact built-in types match; user subclasses of them do not.
    #[inline]
    pub fn excludes_type(&self, hash: TypeHash) -> bool {
        BuiltinKind::from_type_hash(hash).is_some_and(|kind| self.contains_kind(kind))
    }

    /// Iterate over the excluded kinds in discriminant order.
    pub fn kinds(&self) -> impl Iterator<Item = BuiltinKind> + '_ {
        BuiltinKind::ALL
            .into_iter()
            .filter(|kind| self.contains_kind(*kind))
    }
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl FromIterator<BuiltinKind> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = BuiltinKind>>(iter: I) -> Self {
        let mut set = ExclusionSet::empty();
        for kind in iter {
            set |= ExclusionSet::of(kind);
        }
        set
    }
}
