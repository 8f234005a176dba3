//! The closed set of names an expression may ever mention.
//!
//! Every constant and function reachable from evaluated text is registered
//! here, once, in a fixed order. The table is never extended after it is
//! built, and nothing in it touches the host environment.

pub(crate) mod builtins;
mod integer;

use crate::error::EvalError;
use crate::value::Value;
use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    static ref GLOBAL: SymbolTable = SymbolTable::build();
}

/// How many arguments a function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    /// Optional trailing arguments, e.g. `log(x[, base])`.
    Between(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::Between(min, max) => (min..=max).contains(&count),
            Arity::AtLeast(min) => count >= min,
        }
    }

    pub fn is_variadic(&self) -> bool {
        matches!(self, Arity::AtLeast(_))
    }

    pub fn describe(&self) -> String {
        fn plural(n: usize) -> &'static str {
            if n == 1 { "argument" } else { "arguments" }
        }
        match *self {
            Arity::Exact(n) => format!("exactly {} {}", n, plural(n)),
            Arity::Between(min, max) => format!("from {} to {} arguments", min, max),
            Arity::AtLeast(min) => format!("at least {} {}", min, plural(min)),
        }
    }
}

pub type Builtin = fn(&Args<'_>) -> Result<Value, EvalError>;

#[derive(Clone, Copy)]
pub enum SymbolKind {
    Constant(f64),
    Function { arity: Arity, invoke: Builtin },
}

#[derive(Clone, Copy)]
pub struct Symbol {
    pub name: &'static str,
    pub kind: SymbolKind,
}

impl Symbol {
    pub fn is_constant(&self) -> bool {
        matches!(self.kind, SymbolKind::Constant(_))
    }

    pub fn arity(&self) -> Option<Arity> {
        match self.kind {
            SymbolKind::Constant(_) => None,
            SymbolKind::Function { arity, .. } => Some(arity),
        }
    }

    /// Checks the argument count, then runs the function.
    pub fn call(&self, values: &[Value]) -> Result<Value, EvalError> {
        match self.kind {
            SymbolKind::Constant(_) => Err(EvalError::type_mismatch(format!(
                "'float' object '{}' is not callable",
                self.name
            ))),
            SymbolKind::Function { arity, invoke } => {
                if !arity.accepts(values.len()) {
                    return Err(EvalError::ArityMismatch {
                        name: self.name.to_string(),
                        expected: arity.describe(),
                        found: values.len(),
                    });
                }
                invoke(&Args { name: self.name, values })
            }
        }
    }
}

impl std::fmt::Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            SymbolKind::Constant(value) => write!(f, "Constant({} = {})", self.name, value),
            SymbolKind::Function { arity, .. } => write!(f, "Function({}, {:?})", self.name, arity),
        }
    }
}

/// Arguments handed to a builtin, already counted against its arity.
pub struct Args<'a> {
    pub name: &'a str,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, index: usize) -> &'a Value {
        &self.values[index]
    }

    pub fn number(&self, index: usize) -> Result<f64, EvalError> {
        self.values[index].as_number().ok_or_else(|| {
            EvalError::type_mismatch(format!(
                "{}() argument {} must be a real number, not 'tuple'",
                self.name,
                index + 1
            ))
        })
    }

    /// A number with no fractional part.
    pub fn integer(&self, index: usize) -> Result<f64, EvalError> {
        let n = self.number(index)?;
        if n.is_finite() && n.fract() == 0.0 {
            Ok(n)
        } else {
            Err(EvalError::type_mismatch(format!(
                "{}() only accepts integral values",
                self.name
            )))
        }
    }

    pub fn sequence(&self, index: usize) -> Result<&'a [f64], EvalError> {
        match &self.values[index] {
            Value::Sequence(items) => Ok(items),
            Value::Number(_) => Err(EvalError::type_mismatch(format!(
                "{}() argument {} must be a sequence, not 'float'",
                self.name,
                index + 1
            ))),
        }
    }

    pub fn numbers(&self) -> Result<Vec<f64>, EvalError> {
        (0..self.len()).map(|i| self.number(i)).collect()
    }

    pub fn integers(&self) -> Result<Vec<f64>, EvalError> {
        (0..self.len()).map(|i| self.integer(i)).collect()
    }
}

/// Immutable registry of every safe symbol, in definition order.
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    index: HashMap<&'static str, usize>,
}

impl SymbolTable {
    pub fn build() -> Self {
        let mut builder = TableBuilder::default();
        builtins::register(&mut builder);
        SymbolTable {
            symbols: builder.symbols,
            index: builder.index,
        }
    }

    /// The process-wide table, built on first use.
    pub fn global() -> &'static SymbolTable {
        &GLOBAL
    }

    pub fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.index.get(name).map(|&i| &self.symbols[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn all_names(&self) -> Vec<&'static str> {
        self.symbols.iter().map(|s| s.name).collect()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[derive(Default)]
pub(crate) struct TableBuilder {
    symbols: Vec<Symbol>,
    index: HashMap<&'static str, usize>,
}

impl TableBuilder {
    pub(crate) fn constant(&mut self, name: &'static str, value: f64) {
        self.push(Symbol { name, kind: SymbolKind::Constant(value) });
    }

    pub(crate) fn function(&mut self, name: &'static str, arity: Arity, invoke: Builtin) {
        self.push(Symbol { name, kind: SymbolKind::Function { arity, invoke } });
    }

    fn push(&mut self, symbol: Symbol) {
        debug_assert!(is_identifier(symbol.name), "bad symbol name {}", symbol.name);
        let previous = self.index.insert(symbol.name, self.symbols.len());
        debug_assert!(previous.is_none(), "duplicate symbol {}", symbol.name);
        self.symbols.push(symbol);
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITELIST: &[&str] = &[
        "e", "pi", "inf", "nan", "tau", "acos", "acosh", "asin", "asinh", "atan", "atan2",
        "atanh", "cbrt", "ceil", "comb", "copysign", "cos", "cosh", "degrees", "dist", "erf",
        "erfc", "exp", "exp2", "expm1", "fabs", "factorial", "floor", "fmod", "frexp", "fsum",
        "gamma", "gcd", "hypot", "isclose", "isinf", "isfinite", "isnan", "isqrt", "lcm",
        "ldexp", "lgamma", "log", "log10", "log1p", "log2", "modf", "nextafter", "perm", "pow",
        "prod", "radians", "remainder", "sin", "sinh", "sumprod", "sqrt", "tan", "tanh",
        "trunc", "abs", "int", "min", "max", "round",
    ];

    #[test]
    fn table_holds_exactly_the_whitelist_in_order() {
        let table = SymbolTable::build();
        assert_eq!(table.all_names(), WHITELIST);
        assert_eq!(table.len(), WHITELIST.len());
    }

    #[test]
    fn every_name_is_an_identifier() {
        for name in SymbolTable::global().all_names() {
            assert!(is_identifier(name), "{}", name);
        }
    }

    #[test]
    fn order_is_stable_across_calls() {
        let table = SymbolTable::global();
        assert_eq!(table.all_names(), table.all_names());
        assert_eq!(table.all_names(), SymbolTable::build().all_names());
    }

    #[test]
    fn lookups() {
        let table = SymbolTable::global();
        assert!(table.has("sqrt"));
        assert!(!table.has("sum"));
        assert!(!table.has("__import__"));
        assert!(table.get("pi").unwrap().is_constant());
        assert_eq!(table.get("log").unwrap().arity(), Some(Arity::Between(1, 2)));
        assert!(table.get("max").unwrap().arity().unwrap().is_variadic());
        assert!(table.get("eval").is_none());
    }

    #[test]
    fn call_checks_arity_before_running() {
        let sqrt = SymbolTable::global().get("sqrt").unwrap();
        let err = sqrt.call(&[Value::Number(1.0), Value::Number(2.0)]).unwrap_err();
        assert!(matches!(err, EvalError::ArityMismatch { found: 2, .. }));
        assert_eq!(sqrt.call(&[Value::Number(16.0)]), Ok(Value::Number(4.0)));
    }

    #[test]
    fn constants_are_not_callable() {
        let pi = SymbolTable::global().get("pi").unwrap();
        assert_eq!(pi.call(&[]).unwrap_err().kind(), "type error");
    }

    #[test]
    fn arity_descriptions() {
        assert_eq!(Arity::Exact(1).describe(), "exactly 1 argument");
        assert_eq!(Arity::Between(1, 2).describe(), "from 1 to 2 arguments");
        assert_eq!(Arity::AtLeast(1).describe(), "at least 1 argument");
        assert!(Arity::AtLeast(0).accepts(0));
        assert!(!Arity::Between(1, 2).accepts(3));
    }
}
