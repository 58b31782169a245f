//! Totally ordered index key
//!
//! Any `K: Ord + Clone` can key an index; `IndexKey` is the heterogeneous
//! key used when attribute values come from loosely typed records.
//!
//! Ordering is deterministic: Null < Bool < numbers < String.
//! Integers and floats share one numeric order and compare by value, so
//! `2` and `2.0` are the same key. NaN sorts above every other number.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// 2^63, the first float above `i64::MAX`
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

/// Index key representing a serialized attribute value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IndexKey {
    /// Absent or null attribute; sorts before every other value
    Null,
    /// Boolean value (false < true)
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value (stored as order-preserving bits)
    Float(u64),
    /// String value
    String(String),
}

/// Numeric value in canonical form: integral floats that fit in `i64` are ints
#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    Real(f64),
}

impl Number {
    fn of_float(v: f64) -> Self {
        if v.is_nan() {
            Number::Real(f64::NAN)
        } else if v.fract() == 0.0 && (-TWO_POW_63..TWO_POW_63).contains(&v) {
            Number::Int(v as i64)
        } else {
            Number::Real(v)
        }
    }

    fn compare(self, other: Self) -> Ordering {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a.cmp(&b),
            (Number::Real(a), Number::Real(b)) => a.total_cmp(&b),
            (Number::Int(i), Number::Real(f)) => compare_int_real(i, f),
            (Number::Real(f), Number::Int(i)) => compare_int_real(i, f).reverse(),
        }
    }
}

/// `f` is NaN, infinite, out of `i64` range or has a fractional part,
/// so the two are never equal.
fn compare_int_real(i: i64, f: f64) -> Ordering {
    if f.is_nan() || f >= TWO_POW_63 {
        Ordering::Less
    } else if f < -TWO_POW_63 {
        Ordering::Greater
    } else {
        // |f| < 2^52 here, far from any rounding of `i`
        (i as f64).partial_cmp(&f).unwrap_or(Ordering::Less)
    }
}

fn encode_float(v: f64) -> u64 {
    let bits = v.to_bits();
    if (bits >> 63) == 1 {
        !bits // Negative: flip all bits
    } else {
        bits ^ (1 << 63) // Positive: flip sign bit
    }
}

fn decode_float(ordered: u64) -> f64 {
    let bits = if (ordered >> 63) == 1 {
        ordered ^ (1 << 63)
    } else {
        !ordered
    };
    f64::from_bits(bits)
}

impl IndexKey {
    /// Create a key from a boolean
    pub fn from_bool(v: bool) -> Self {
        IndexKey::Bool(v)
    }

    /// Create a key from an integer
    pub fn from_int(v: i64) -> Self {
        IndexKey::Int(v)
    }

    /// Create a key from a float
    ///
    /// Integral values that fit in `i64` become `Int`; the rest keep their
    /// bit representation for total ordering.
    pub fn from_float(v: f64) -> Self {
        match Number::of_float(v) {
            Number::Int(i) => IndexKey::Int(i),
            Number::Real(f) => IndexKey::Float(encode_float(f)),
        }
    }

    /// Create a key from a string
    pub fn from_string(v: impl Into<String>) -> Self {
        IndexKey::String(v.into())
    }

    /// Numeric value of an `Int` or `Float` key
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            IndexKey::Int(i) => Some(*i as f64),
            IndexKey::Float(ordered) => Some(decode_float(*ordered)),
            _ => None,
        }
    }

    /// Create a key from a JSON value
    ///
    /// Arrays and objects are not indexable.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => Some(IndexKey::Null),
            serde_json::Value::Bool(b) => Some(IndexKey::from_bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(IndexKey::from_int(i))
                } else {
                    n.as_f64().map(IndexKey::from_float)
                }
            }
            serde_json::Value::String(s) => Some(IndexKey::from_string(s)),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            IndexKey::Null => 0,
            IndexKey::Bool(_) => 1,
            IndexKey::Int(_) | IndexKey::Float(_) => 2,
            IndexKey::String(_) => 3,
        }
    }

    // Deserialized `Float` keys may hold an integral value; normalize here
    fn number(&self) -> Option<Number> {
        match self {
            IndexKey::Int(i) => Some(Number::Int(*i)),
            IndexKey::Float(ordered) => Some(Number::of_float(decode_float(*ordered))),
            _ => None,
        }
    }
}

impl Ord for IndexKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (IndexKey::Bool(a), IndexKey::Bool(b)) => a.cmp(b),
            (IndexKey::String(a), IndexKey::String(b)) => a.cmp(b),
            _ => match (self.number(), other.number()) {
                (Some(a), Some(b)) => a.compare(b),
                _ => self.rank().cmp(&other.rank()),
            },
        }
    }
}

impl PartialOrd for IndexKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for IndexKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for IndexKey {}

impl Hash for IndexKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            IndexKey::Null => {}
            IndexKey::Bool(b) => b.hash(state),
            IndexKey::String(s) => s.hash(state),
            IndexKey::Int(_) | IndexKey::Float(_) => match self.number() {
                Some(Number::Int(i)) => i.hash(state),
                Some(Number::Real(f)) => f.to_bits().hash(state),
                None => {}
            },
        }
    }
}

impl From<i64> for IndexKey {
    fn from(v: i64) -> Self {
        IndexKey::Int(v)
    }
}

impl From<bool> for IndexKey {
    fn from(v: bool) -> Self {
        IndexKey::Bool(v)
    }
}

impl From<&str> for IndexKey {
    fn from(v: &str) -> Self {
        IndexKey::from_string(v)
    }
}

impl From<String> for IndexKey {
    fn from(v: String) -> Self {
        IndexKey::String(v)
    }
}
