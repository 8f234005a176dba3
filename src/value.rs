use crate::error::EvalError;

/// An intermediate value produced while walking an expression tree.
///
/// Only `Number` may leave the evaluator. Sequences exist so that functions
/// taking iterables (`fsum`, `dist`, ...) and returning tuples (`frexp`,
/// `modf`) can be used inside an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Sequence(Vec<f64>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "float",
            Value::Sequence(_) => "tuple",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Sequence(_) => None,
        }
    }

    /// Final conversion at the evaluator boundary.
    pub fn into_number(self) -> Result<f64, EvalError> {
        match self {
            Value::Number(n) => Ok(n),
            Value::Sequence(_) => Err(EvalError::type_mismatch(
                "result must be a real number, not 'tuple'",
            )),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Number(if b { 1.0 } else { 0.0 })
    }
}

impl From<Vec<f64>> for Value {
    fn from(items: Vec<f64>) -> Self {
        Value::Sequence(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_become_zero_or_one() {
        assert_eq!(Value::from(true), Value::Number(1.0));
        assert_eq!(Value::from(false), Value::Number(0.0));
    }

    #[test]
    fn sequences_cannot_escape() {
        let err = Value::Sequence(vec![0.5, 4.0]).into_number().unwrap_err();
        assert_eq!(err.kind(), "type error");
        assert_eq!(Value::Number(2.0).into_number(), Ok(2.0));
    }
}
