//! Core of a restricted-expression calculator: a whitelisted symbol table,
//! a safe evaluator, prefix completion and decimal/hex/binary formatting.

pub mod calc_engine;
pub mod completion;
pub mod error;
pub mod format;
pub mod symbols;
pub mod value;

pub use calc_engine::{evaluate, Evaluator, Limits};
pub use completion::{completions, CompletionIndex};
pub use error::EvalError;
pub use format::{format_outcome, format_value, FormattedResult};
pub use symbols::SymbolTable;
