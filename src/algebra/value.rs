/// Literal values carried by plan expressions and VALUES rows
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Value {
    Int64(i64),
    Int32(i32),
    Float64(f64),
    String(String),
    Bool(bool),
    Null,
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int64(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Null => write!(f, "NULL"),
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Value::Int64(v) => {
                0u8.hash(state); // Discriminator
                v.hash(state);
            }
            // Integers hash by value, not width: Int32(42) == Int64(42), so
            // they must land in the same hash partition
            Value::Int32(v) => {
                0u8.hash(state);
                (*v as i64).hash(state);
            }
            Value::Float64(v) => {
                2u8.hash(state);
                v.to_bits().hash(state);
            }
            Value::String(v) => {
                3u8.hash(state);
                v.hash(state);
            }
            Value::Bool(v) => {
                4u8.hash(state);
                v.hash(state);
            }
            Value::Null => {
                5u8.hash(state);
            }
        }
    }
}

impl std::cmp::PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Int64(a), Value::Int32(b)) | (Value::Int32(b), Value::Int64(a)) => {
                *a == *b as i64
            }
            _ => false,
        }
    }
}

impl std::cmp::Eq for Value {}

// PartialOrd implementation (floats use ordered_float for NaN handling).
// Cross-type numeric comparison is supported because range partition bounds
// and predicate literals do not always agree on integer width.
impl std::cmp::PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        use ordered_float::OrderedFloat;
        match (self, other) {
            (Value::Int64(a), Value::Int64(b)) => a.partial_cmp(b),
            (Value::Int32(a), Value::Int32(b)) => a.partial_cmp(b),
            (Value::Float64(a), Value::Float64(b)) => {
                OrderedFloat(*a).partial_cmp(&OrderedFloat(*b))
            }
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            (Value::Null, Value::Null) => Some(std::cmp::Ordering::Equal),
            (Value::Int64(a), Value::Int32(b)) => a.partial_cmp(&(*b as i64)),
            (Value::Int32(a), Value::Int64(b)) => (*a as i64).partial_cmp(b),
            (Value::Int64(a), Value::Float64(b)) => {
                OrderedFloat(*a as f64).partial_cmp(&OrderedFloat(*b))
            }
            (Value::Float64(a), Value::Int64(b)) => {
                OrderedFloat(*a).partial_cmp(&OrderedFloat(*b as f64))
            }
            (Value::Int32(a), Value::Float64(b)) => {
                OrderedFloat(*a as f64).partial_cmp(&OrderedFloat(*b))
            }
            (Value::Float64(a), Value::Int32(b)) => {
                OrderedFloat(*a).partial_cmp(&OrderedFloat(*b as f64))
            }
            _ => None,
        }
    }
}

impl Value {
    /// True for NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}
