use thiserror::Error;

/// Everything that can go wrong between raw text and a number.
///
/// The message is for display only; nothing parses it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("name '{0}' is not defined")]
    UnresolvedSymbol(String),

    #[error("{name}() takes {expected} ({found} given)")]
    ArityMismatch {
        name: String,
        expected: String,
        found: usize,
    },

    #[error("invalid syntax: {0}")]
    Syntax(String),

    #[error("{0}")]
    Domain(String),

    #[error("{0}")]
    Overflow(String),

    #[error("{0}")]
    TypeMismatch(String),
}

impl EvalError {
    pub fn syntax(message: impl Into<String>) -> Self {
        EvalError::Syntax(message.into())
    }

    pub fn domain(message: impl Into<String>) -> Self {
        EvalError::Domain(message.into())
    }

    pub fn overflow(message: impl Into<String>) -> Self {
        EvalError::Overflow(message.into())
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        EvalError::TypeMismatch(message.into())
    }

    /// Math-module style domain failure for a named function.
    pub fn math_domain(name: &str) -> Self {
        EvalError::Domain(format!("{}: math domain error", name))
    }

    /// Math-module style range failure for a named function.
    pub fn math_range(name: &str) -> Self {
        EvalError::Overflow(format!("{}: math range error", name))
    }

    /// Short category label, used by front-ends and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            EvalError::UnresolvedSymbol(_) => "unresolved symbol",
            EvalError::ArityMismatch { .. } => "arity mismatch",
            EvalError::Syntax(_) => "syntax error",
            EvalError::Domain(_) => "domain error",
            EvalError::Overflow(_) => "overflow",
            EvalError::TypeMismatch(_) => "type error",
        }
    }
}
