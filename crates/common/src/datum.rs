use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem::discriminant;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Dynamically typed value exchanged at every gateway boundary: envelope
/// fields, command arguments, command results and stored payloads.
///
/// Equality and hashing are total so a `Datum` can live in a `HashSet`;
/// floats compare and hash by bit pattern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Datum {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Bytes),
    List(Vec<Datum>),
    Map(BTreeMap<String, Datum>),
}

impl Datum {
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    /// Integer view. Accepts `Int` directly and `Str` holding a base-10
    /// signed integer, which is how numeric arguments arrive off the wire.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Datum::Int(n) => Some(*n),
            Datum::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Unsigned view of `as_int`, used for connection and lock keys.
    pub fn as_uint(&self) -> Option<u64> {
        self.as_int().and_then(|n| u64::try_from(n).ok())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Datum::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Datum]> {
        match self {
            Datum::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Datum>> {
        match self {
            Datum::Map(map) => Some(map),
            _ => None,
        }
    }

    /// String form of a scalar payload, used when a string-typed operation
    /// (e.g. append) meets a non-string payload. `Null` renders empty.
    pub fn coerce_string(&self) -> String {
        match self {
            Datum::Null => String::new(),
            Datum::Bool(b) => b.to_string(),
            Datum::Int(n) => n.to_string(),
            Datum::Float(f) => f.to_string(),
            Datum::Str(s) => s.clone(),
            Datum::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            Datum::List(_) | Datum::Map(_) => String::new(),
        }
    }
}

impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Datum::Null, Datum::Null) => true,
            (Datum::Bool(a), Datum::Bool(b)) => a == b,
            (Datum::Int(a), Datum::Int(b)) => a == b,
            (Datum::Float(a), Datum::Float(b)) => a.to_bits() == b.to_bits(),
            (Datum::Str(a), Datum::Str(b)) => a == b,
            (Datum::Bytes(a), Datum::Bytes(b)) => a == b,
            (Datum::List(a), Datum::List(b)) => a == b,
            (Datum::Map(a), Datum::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Datum {}

impl Hash for Datum {
    fn hash<H: Hasher>(&self, state: &mut H) {
        discriminant(self).hash(state);
        match self {
            Datum::Null => {}
            Datum::Bool(b) => b.hash(state),
            Datum::Int(n) => n.hash(state),
            Datum::Float(f) => f.to_bits().hash(state),
            Datum::Str(s) => s.hash(state),
            Datum::Bytes(b) => b.hash(state),
            Datum::List(items) => items.hash(state),
            Datum::Map(map) => map.hash(state),
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.coerce_string())
    }
}

impl From<bool> for Datum {
    fn from(v: bool) -> Self {
        Datum::Bool(v)
    }
}

impl From<i64> for Datum {
    fn from(v: i64) -> Self {
        Datum::Int(v)
    }
}

impl From<&str> for Datum {
    fn from(v: &str) -> Self {
        Datum::Str(v.to_owned())
    }
}

impl From<String> for Datum {
    fn from(v: String) -> Self {
        Datum::Str(v)
    }
}

impl From<Bytes> for Datum {
    fn from(v: Bytes) -> Self {
        Datum::Bytes(v)
    }
}

impl From<Vec<Datum>> for Datum {
    fn from(v: Vec<Datum>) -> Self {
        Datum::List(v)
    }
}

impl From<BTreeMap<String, Datum>> for Datum {
    fn from(v: BTreeMap<String, Datum>) -> Self {
        Datum::Map(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn int_view_accepts_numeric_strings() {
        assert_eq!(Datum::Int(7).as_int(), Some(7));
        assert_eq!(Datum::from("-42").as_int(), Some(-42));
        assert_eq!(Datum::from(" 10 ").as_int(), Some(10));
        assert_eq!(Datum::from("ten").as_int(), None);
        assert_eq!(Datum::Bool(true).as_int(), None);
    }

    #[test]
    fn uint_view_rejects_negatives() {
        assert_eq!(Datum::Int(5).as_uint(), Some(5));
        assert_eq!(Datum::Int(-5).as_uint(), None);
    }

    #[test]
    fn floats_are_hashable_set_members() {
        let mut set = HashSet::new();
        set.insert(Datum::Float(1.5));
        set.insert(Datum::Float(1.5));
        set.insert(Datum::Float(f64::NAN));
        set.insert(Datum::Float(f64::NAN));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn distinct_shapes_never_compare_equal() {
        assert_ne!(Datum::Int(1), Datum::from("1"));
        assert_ne!(Datum::Null, Datum::Bool(false));
    }

    #[test]
    fn coerce_string_renders_scalars() {
        assert_eq!(Datum::Null.coerce_string(), "");
        assert_eq!(Datum::Int(-3).coerce_string(), "-3");
        assert_eq!(Datum::from("abc").coerce_string(), "abc");
        assert_eq!(Datum::Bytes(Bytes::from_static(b"xy")).coerce_string(), "xy");
    }
}
