//! # JSON Node Typing and Exact Numerics
//!
//! Keyword validators decide applicability from the JSON type of the
//! instance and compare numbers without ever converting through a binary
//! float. This module holds both concerns.
//!
//! ## Integer vs Number
//!
//! A number is an `integer` iff its literal has no fraction and no exponent
//! (`1` is an integer, `1.0` and `1e0` are not). With serde_json's
//! `arbitrary_precision` feature the literal is preserved exactly, so
//! integers of any magnitude (`9007199254740993`, `10^30`) are recognised.
//!
//! ## Exact Comparison
//!
//! Comparisons take an `i64`/`u64` fast path when both operands are exactly
//! representable as machine integers, and otherwise compare
//! arbitrary-precision decimals. Remainders for `multipleOf` /
//! `divisibleBy` are compared with exact zero.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// The seven JSON Schema primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// JSON array.
    Array,
    /// `true` / `false`.
    Boolean,
    /// Number literal without fraction or exponent.
    Integer,
    /// `null`.
    Null,
    /// Any other number literal.
    Number,
    /// JSON object.
    Object,
    /// JSON string.
    String,
}

impl NodeType {
    /// All primitive types, in name order.
    pub const ALL: [NodeType; 7] = [
        NodeType::Array,
        NodeType::Boolean,
        NodeType::Integer,
        NodeType::Null,
        NodeType::Number,
        NodeType::Object,
        NodeType::String,
    ];

    /// The type of a JSON value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => NodeType::Null,
            Value::Bool(_) => NodeType::Boolean,
            Value::Number(n) if is_integer(n) => NodeType::Integer,
            Value::Number(_) => NodeType::Number,
            Value::String(_) => NodeType::String,
            Value::Array(_) => NodeType::Array,
            Value::Object(_) => NodeType::Object,
        }
    }

    /// The schema name of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Array => "array",
            NodeType::Boolean => "boolean",
            NodeType::Integer => "integer",
            NodeType::Null => "null",
            NodeType::Number => "number",
            NodeType::Object => "object",
            NodeType::String => "string",
        }
    }

    /// Look a type up by its schema name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// True if an instance of type `self` satisfies a `type` constraint
    /// naming `declared` (`integer` instances satisfy `number`).
    pub fn satisfies(&self, declared: NodeType) -> bool {
        *self == declared || (*self == NodeType::Integer && declared == NodeType::Number)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of [`NodeType`]s, used to declare keyword applicability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TypeSet(u8);

impl TypeSet {
    /// No types.
    pub const EMPTY: TypeSet = TypeSet(0);
    /// Every type.
    pub const ALL: TypeSet = TypeSet(0b111_1111);
    /// `integer` and `number`.
    pub const NUMERIC: TypeSet = TypeSet(bit(NodeType::Integer) | bit(NodeType::Number));

    /// A set holding exactly the given types.
    pub const fn of(types: &[NodeType]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < types.len() {
            bits |= bit(types[i]);
            i += 1;
        }
        TypeSet(bits)
    }

    /// Membership test.
    pub const fn contains(&self, t: NodeType) -> bool {
        self.0 & bit(t) != 0
    }

    /// Iterate the members in name order.
    pub fn iter(&self) -> impl Iterator<Item = NodeType> + '_ {
        NodeType::ALL.into_iter().filter(|t| self.contains(*t))
    }
}

const fn bit(t: NodeType) -> u8 {
    1 << (t as u8)
}

/// True if the number literal has neither fraction nor exponent.
pub fn is_integer(n: &Number) -> bool {
    if n.is_i64() || n.is_u64() {
        return true;
    }
    let literal = n.to_string();
    !literal.contains(['.', 'e', 'E'])
}

/// Exact decimal value of a JSON number.
pub fn to_decimal(n: &Number) -> Option<BigDecimal> {
    BigDecimal::from_str(&n.to_string()).ok()
}

/// Compare two JSON numbers exactly.
pub fn compare_numbers(a: &Number, b: &Number) -> Ordering {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x.cmp(&y);
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x.cmp(&y);
    }
    match (to_decimal(a), to_decimal(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        // Unreachable for literals produced by serde_json; keep the
        // comparison total regardless.
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// True iff `value` is an exact multiple of `divisor`. A zero divisor
/// divides nothing.
pub fn is_multiple_of(value: &Number, divisor: &Number) -> bool {
    if let (Some(v), Some(d)) = (value.as_i64(), divisor.as_i64()) {
        return d != 0 && v.checked_rem(d).map_or(true, |r| r == 0);
    }
    let (Some(v), Some(d)) = (to_decimal(value), to_decimal(divisor)) else {
        return false;
    };
    let zero = BigDecimal::from(0i64);
    if d == zero {
        return false;
    }
    v % d == zero
}

/// Deep structural equality with numeric value equality (`1 == 1.0`).
pub fn json_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y) == Ordering::Equal,
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_equals(x, y))
        }
        (Value::Object(xm), Value::Object(ym)) => {
            xm.len() == ym.len()
                && xm
                    .iter()
                    .all(|(k, xv)| ym.get(k).is_some_and(|yv| json_equals(xv, yv)))
        }
        _ => a == b,
    }
}
