use serde::{Deserialize, Serialize};

/// Operators usable in a rule precondition atom or a goal atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
}

/// A device interaction value, a `custom_data` attribute, or the
/// right-hand side of a precondition/goal atom.
///
/// Untyped JSON would let a comparison silently coerce across kinds;
/// this keeps the handful of shapes the wire contract actually uses
/// explicit so `compare` can decide "false" rather than guess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Text(String),
    /// Anything else (objects, arrays, null) — carried through opaquely
    /// for `Generic`/`DynamicProperty` interactions that don't participate
    /// in ordered comparisons.
    Json(serde_json::Value),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Evaluate `self <op> rhs`. Mismatched variants are never equal and
    /// never ordered: the atom is simply false, matching the spec's
    /// "missing value => atom false" posture for malformed comparisons.
    pub fn compare(&self, op: Operator, rhs: &Value) -> bool {
        use Operator::*;
        match (self, rhs) {
            (Value::Bool(a), Value::Bool(b)) => match op {
                Eq => a == b,
                Ne => a != b,
                _ => false,
            },
            (Value::Number(a), Value::Number(b)) => match op {
                Eq => a == b,
                Ne => a != b,
                Lt => a < b,
                Gt => a > b,
                Le => a <= b,
                Ge => a >= b,
            },
            (Value::Text(a), Value::Text(b)) => match op {
                Eq => a == b,
                Ne => a != b,
                Lt => a < b,
                Gt => a > b,
                Le => a <= b,
                Ge => a >= b,
            },
            (Value::Json(a), Value::Json(b)) => match op {
                Eq => a == b,
                Ne => a != b,
                _ => false,
            },
            _ => matches!(op, Ne),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_bools_match() {
        assert!(Value::Bool(true).compare(Operator::Eq, &Value::Bool(true)));
        assert!(!Value::Bool(true).compare(Operator::Eq, &Value::Bool(false)));
    }

    #[test]
    fn ordering_on_numbers() {
        assert!(Value::Number(5.0).compare(Operator::Gt, &Value::Number(3.0)));
        assert!(!Value::Number(5.0).compare(Operator::Lt, &Value::Number(3.0)));
    }

    #[test]
    fn mismatched_variants_are_not_equal() {
        assert!(!Value::Bool(true).compare(Operator::Eq, &Value::Number(1.0)));
        assert!(Value::Bool(true).compare(Operator::Ne, &Value::Number(1.0)));
    }
}
