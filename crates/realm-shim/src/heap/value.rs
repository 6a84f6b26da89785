//! Identities, property keys and runtime values.

use std::fmt;
use std::str::FromStr;

use super::HeapError;

/// Opaque handle referencing an object on the heap. Equality is identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectHandle(pub(crate) u32);

impl ObjectHandle {
    /// Raw arena index, for diagnostics.
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}", self.0)
    }
}

/// Unique symbol identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(pub(crate) u32);

/// Well-known symbols, pre-allocated at ids `1..=13` on every heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WellKnownSymbol {
    AsyncIterator,
    HasInstance,
    IsConcatSpreadable,
    Iterator,
    Match,
    MatchAll,
    Replace,
    Search,
    Species,
    Split,
    ToPrimitive,
    ToStringTag,
    Unscopables,
}

impl WellKnownSymbol {
    pub const ALL: [WellKnownSymbol; 13] = [
        Self::AsyncIterator,
        Self::HasInstance,
        Self::IsConcatSpreadable,
        Self::Iterator,
        Self::Match,
        Self::MatchAll,
        Self::Replace,
        Self::Search,
        Self::Species,
        Self::Split,
        Self::ToPrimitive,
        Self::ToStringTag,
        Self::Unscopables,
    ];

    pub fn id(self) -> SymbolId {
        SymbolId(self as u32 + 1)
    }

    pub fn key(self) -> PropertyKey {
        PropertyKey::Symbol(self.id())
    }

    /// The `Symbol.<description>` name, e.g. `iterator`.
    pub fn description(self) -> &'static str {
        match self {
            Self::AsyncIterator => "asyncIterator",
            Self::HasInstance => "hasInstance",
            Self::IsConcatSpreadable => "isConcatSpreadable",
            Self::Iterator => "iterator",
            Self::Match => "match",
            Self::MatchAll => "matchAll",
            Self::Replace => "replace",
            Self::Search => "search",
            Self::Species => "species",
            Self::Split => "split",
            Self::ToPrimitive => "toPrimitive",
            Self::ToStringTag => "toStringTag",
            Self::Unscopables => "unscopables",
        }
    }

    pub fn from_id(id: SymbolId) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.id() == id)
    }

    pub fn from_description(description: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.description() == description)
    }
}

impl fmt::Display for WellKnownSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@@{}", self.description())
    }
}

/// A property key: either a string or a symbol.
///
/// Strings order before symbols, which matches the own-keys order the
/// heap reports.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyKey {
    String(String),
    Symbol(SymbolId),
}

impl PropertyKey {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Symbol(_) => None,
        }
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, Self::Symbol(_))
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Symbol(id) => match WellKnownSymbol::from_id(*id) {
                Some(wk) => write!(f, "{wk}"),
                None => write!(f, "Symbol({})", id.0),
            },
        }
    }
}

/// Parses the [`Display`](fmt::Display) form back. `@@name` must name a
/// well-known symbol; anything else is a string key.
impl FromStr for PropertyKey {
    type Err = HeapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix("@@") {
            Some(description) => WellKnownSymbol::from_description(description)
                .map(WellKnownSymbol::key)
                .ok_or_else(|| HeapError::UnknownSymbol(s.to_string())),
            None => Ok(Self::String(s.to_string())),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<WellKnownSymbol> for PropertyKey {
    fn from(s: WellKnownSymbol) -> Self {
        s.key()
    }
}

/// Runtime value.
///
/// Equality is ES `SameValue`: `NaN` equals itself, `+0` and `-0` differ.
#[derive(Debug, Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Symbol(SymbolId),
    Object(ObjectHandle),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => {
                (a.is_nan() && b.is_nan())
                    || (a == b && a.is_sign_negative() == b.is_sign_negative())
            }
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Object-like values carry identity; everything else is a primitive.
    pub fn as_object(&self) -> Option<ObjectHandle> {
        match self {
            Self::Object(h) => Some(*h),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::Object(_) => "object",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Symbol(id) => write!(f, "{}", PropertyKey::Symbol(*id)),
            Self::Object(h) => write!(f, "[{h}]"),
        }
    }
}

impl From<ObjectHandle> for Value {
    fn from(h: ObjectHandle) -> Self {
        Self::Object(h)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<WellKnownSymbol> for Value {
    fn from(s: WellKnownSymbol) -> Self {
        Self::Symbol(s.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_symbols_roundtrip_through_display() {
        for wk in WellKnownSymbol::ALL {
            let key = wk.key();
            let parsed: PropertyKey = key.to_string().parse().unwrap();
            assert_eq!(parsed, key);
        }
    }

    #[test]
    fn unknown_symbol_name_is_rejected() {
        let err = "@@doesNotExist".parse::<PropertyKey>().unwrap_err();
        assert!(err.to_string().contains("@@doesNotExist"));
    }

    #[test]
    fn plain_strings_parse_as_string_keys() {
        let key: PropertyKey = "toString".parse().unwrap();
        assert_eq!(key, PropertyKey::from("toString"));
        assert_eq!(key.as_str(), Some("toString"));
    }

    #[test]
    fn strings_order_before_symbols() {
        let s = PropertyKey::from("zzz");
        let sym = WellKnownSymbol::AsyncIterator.key();
        assert!(s < sym);
    }

    #[test]
    fn only_objects_are_object_like() {
        assert!(Value::Object(ObjectHandle(3)).is_object());
        assert!(!Value::from("x").is_object());
        assert_eq!(Value::Null.as_object(), None);
        assert_eq!(Value::Number(1.0).type_name(), "number");
    }

    #[test]
    fn numbers_compare_by_same_value() {
        assert_eq!(Value::Number(f64::NAN), Value::Number(f64::NAN));
        assert_eq!(Value::Number(1.5), Value::Number(1.5));
        assert_ne!(Value::Number(0.0), Value::Number(-0.0));
        assert_ne!(Value::Number(1.0), Value::from("1"));
        assert_ne!(Value::Undefined, Value::Null);
    }
}
