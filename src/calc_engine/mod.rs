//! Restricted expression evaluation.
//!
//! Text is lower-cased, tokenized, parsed into an [`Expr`] tree and walked.
//! The walker resolves names through a [`SymbolTable`] and nothing else, so
//! the only reachable behaviour is the grammar plus the whitelisted symbols.

mod ops;
mod parser;
mod token;
mod trace;

pub use parser::{Expr, Parser};
pub use token::{tokenize, Op, Token};
pub use trace::{EvaluationTrace, Step};

use crate::error::EvalError;
use crate::format::repr;
use crate::symbols::{SymbolKind, SymbolTable};
use crate::value::Value;
use tracing::debug;

/// Bounds on what a single evaluation may consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Deepest allowed nesting. Brackets, `**`, runs of unary operators and
    /// runs of calls or subscripts all count toward it.
    pub max_depth: usize,
    /// Longest accepted input, in characters.
    pub max_input_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_depth: 200,
            max_input_len: 4096,
        }
    }
}

pub struct Evaluator<'t> {
    symbols: &'t SymbolTable,
    limits: Limits,
}

impl Evaluator<'static> {
    /// Evaluator over the process-wide table.
    pub fn global(limits: Limits) -> Self {
        Evaluator::new(SymbolTable::global(), limits)
    }
}

impl<'t> Evaluator<'t> {
    pub fn new(symbols: &'t SymbolTable, limits: Limits) -> Self {
        Evaluator { symbols, limits }
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn evaluate(&self, text: &str) -> Result<f64, EvalError> {
        self.evaluate_traced(text, &mut EvaluationTrace::disabled())
    }

    pub fn evaluate_traced(
        &self,
        text: &str,
        trace: &mut EvaluationTrace,
    ) -> Result<f64, EvalError> {
        let result = self.run(text, trace);
        match &result {
            Ok(value) => debug!(input = text, value = *value, "evaluated"),
            Err(err) => debug!(input = text, kind = err.kind(), error = %err, "evaluation failed"),
        }
        result
    }

    fn run(&self, text: &str, trace: &mut EvaluationTrace) -> Result<f64, EvalError> {
        if text.chars().count() > self.limits.max_input_len {
            return Err(EvalError::syntax(format!(
                "expression longer than {} characters",
                self.limits.max_input_len
            )));
        }
        let tokens = tokenize(&text.to_lowercase())?;
        let expr = Parser::new(tokens, self.limits.max_depth).parse()?;
        self.eval(&expr, trace)?.into_number()
    }

    fn eval(&self, expr: &Expr, trace: &mut EvaluationTrace) -> Result<Value, EvalError> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Name(name) => self.resolve(name),
            Expr::Unary { op, operand } => {
                let x = self.number(operand, trace, op.symbol())?;
                let result = ops::unary(*op, x)?;
                trace.add_step(|| format!("{}{}", op, repr(x)), result);
                Ok(Value::Number(result))
            }
            Expr::Binary { op, lhs, rhs } => {
                let a = self.number(lhs, trace, op.symbol())?;
                let b = self.number(rhs, trace, op.symbol())?;
                let result = ops::binary(*op, a, b)?;
                trace.add_step(|| format!("{} {} {}", repr(a), op, repr(b)), result);
                Ok(Value::Number(result))
            }
            Expr::Chain { first, rest } => {
                let first_op = rest.first().map_or("", |(op, _)| op.symbol());
                let mut acc = self.number(first, trace, first_op)?;
                for (op, operand) in rest {
                    let b = self.number(operand, trace, op.symbol())?;
                    let result = ops::binary(*op, acc, b)?;
                    trace.add_step(|| format!("{} {} {}", repr(acc), op, repr(b)), result);
                    acc = result;
                }
                Ok(Value::Number(acc))
            }
            Expr::Call { callee, args } => self.call(callee, args, trace),
            Expr::Index { target, index } => {
                let target = self.eval(target, trace)?;
                let index = self.eval(index, trace)?;
                subscript(&target, &index)
            }
            Expr::Sequence(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    match self.eval(item, trace)? {
                        Value::Number(n) => values.push(n),
                        Value::Sequence(_) => {
                            return Err(EvalError::type_mismatch(
                                "nested sequences are not supported",
                            ))
                        }
                    }
                }
                Ok(Value::Sequence(values))
            }
        }
    }

    /// Evaluates an operand that must be a plain number.
    fn number(
        &self,
        expr: &Expr,
        trace: &mut EvaluationTrace,
        op: &str,
    ) -> Result<f64, EvalError> {
        match self.eval(expr, trace)? {
            Value::Number(n) => Ok(n),
            other => Err(EvalError::type_mismatch(format!(
                "unsupported operand type for '{}': '{}'",
                op,
                other.type_name()
            ))),
        }
    }

    fn resolve(&self, name: &str) -> Result<Value, EvalError> {
        match self.symbols.get(name) {
            Some(symbol) => match symbol.kind {
                SymbolKind::Constant(value) => Ok(Value::Number(value)),
                SymbolKind::Function { .. } => Err(EvalError::type_mismatch(format!(
                    "function '{}' must be called with arguments",
                    name
                ))),
            },
            None => Err(EvalError::UnresolvedSymbol(name.to_string())),
        }
    }

    fn call(
        &self,
        callee: &Expr,
        args: &[Expr],
        trace: &mut EvaluationTrace,
    ) -> Result<Value, EvalError> {
        let symbol = match callee {
            Expr::Name(name) => self
                .symbols
                .get(name)
                .ok_or_else(|| EvalError::UnresolvedSymbol(name.clone()))?,
            other => {
                let value = self.eval(other, trace)?;
                return Err(EvalError::type_mismatch(format!(
                    "'{}' object is not callable",
                    value.type_name()
                )));
            }
        };

        let values = args
            .iter()
            .map(|arg| self.eval(arg, trace))
            .collect::<Result<Vec<_>, _>>()?;
        let result = symbol.call(&values)?;

        if let Value::Number(n) = result {
            trace.add_step(
                || {
                    let rendered: Vec<String> = values.iter().map(render).collect();
                    format!("{}({})", symbol.name, rendered.join(", "))
                },
                n,
            );
        }
        Ok(result)
    }
}

fn subscript(target: &Value, index: &Value) -> Result<Value, EvalError> {
    let items = match target {
        Value::Sequence(items) => items,
        Value::Number(_) => {
            return Err(EvalError::type_mismatch("'float' object is not subscriptable"))
        }
    };
    let i = match index {
        Value::Number(i) if i.fract() == 0.0 => *i,
        _ => return Err(EvalError::type_mismatch("sequence indices must be integers")),
    };
    let len = items.len() as f64;
    let position = if i < 0.0 { i + len } else { i };
    if position < 0.0 || position >= len {
        return Err(EvalError::domain("index out of range"));
    }
    Ok(Value::Number(items[position as usize]))
}

fn render(value: &Value) -> String {
    match value {
        Value::Number(n) => repr(*n),
        Value::Sequence(items) => {
            let rendered: Vec<String> = items.iter().map(|n| repr(*n)).collect();
            format!("[{}]", rendered.join(", "))
        }
    }
}

/// Evaluates `text` against the process-wide table with default limits.
pub fn evaluate(text: &str) -> Result<f64, EvalError> {
    Evaluator::global(Limits::default()).evaluate(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn eval(text: &str) -> Result<f64, EvalError> {
        evaluate(text)
    }

    fn kind(text: &str) -> &'static str {
        eval(text).unwrap_err().kind()
    }

    #[test]
    fn basics() {
        let cases = vec![
            ("2 + 2", 4.0),
            ("  1 +   1", 2.0),
            (" 4 * 7 - 14", 14.0),
            ("(1 + 2) * 3", 9.0),
            ("10 / 4", 2.5),
            ("7 // 2", 3.0),
            ("7 // -2", -4.0),
            ("-7 % 3", 2.0),
            ("2 ** 3 ** 2", 512.0),
            ("-2 ** 2", -4.0),
            ("2 ** -1", 0.5),
            ("--3", 3.0),
            ("+-+3", -3.0),
            ("1e3 + .5", 1000.5),
            ("0xff & 0x0f", 15.0),
            ("1 << 4 | 1", 17.0),
            ("~5", -6.0),
            ("6 ^ 3", 5.0),
        ];
        for (input, expected) in cases {
            assert_eq!(eval(input), Ok(expected), "{}", input);
        }
    }

    #[test]
    fn functions_and_constants() {
        assert_eq!(eval("sqrt(16)"), Ok(4.0));
        assert_eq!(eval("max(1,2,3)"), Ok(3.0));
        assert_eq!(eval("pi * 2"), Ok(2.0 * PI));
        assert_eq!(eval("tau"), Ok(2.0 * PI));
        assert_eq!(eval("factorial(5) / comb(5, 2)"), Ok(12.0));
        assert_eq!(eval("fsum([0.1, 0.2, 0.3])"), Ok(0.6));
        assert_eq!(eval("frexp(8)[1]"), Ok(4.0));
        assert_eq!(eval("modf(2.5)[-2]"), Ok(0.5));
        assert_eq!(eval("max([4, 9, 2])"), Ok(9.0));
        assert_eq!(eval("dist((0, 0), (3, 4))"), Ok(5.0));
        assert_eq!(eval("log(8, 2)"), Ok(3.0));
        assert!(eval("nan").unwrap().is_nan());
        assert_eq!(eval("-inf"), Ok(f64::NEG_INFINITY));
    }

    #[test]
    fn identifiers_are_case_insensitive() {
        assert_eq!(eval("SQRT(16)"), Ok(4.0));
        assert_eq!(eval("Pi"), eval("pi"));
        assert_eq!(eval("0XFF"), Ok(255.0));
    }

    #[test]
    fn failures_are_classified() {
        assert_eq!(kind("sqrt(-1)"), "domain error");
        assert_eq!(kind("1/0"), "domain error");
        assert_eq!(kind("1 % 0"), "domain error");
        assert_eq!(kind("log(0)"), "domain error");
        assert_eq!(kind("foo(1)"), "unresolved symbol");
        assert_eq!(kind("x + 1"), "unresolved symbol");
        assert_eq!(kind("sqrt(1, 2)"), "arity mismatch");
        assert_eq!(kind("atan2(1)"), "arity mismatch");
        assert_eq!(kind("max()"), "arity mismatch");
        assert_eq!(kind("exp(1000)"), "overflow");
        assert_eq!(kind("10.0 ** 400"), "overflow");
        assert_eq!(kind("factorial(1000)"), "overflow");
        assert_eq!(kind("2 +"), "syntax error");
        assert_eq!(kind(""), "syntax error");
        assert_eq!(kind("   "), "syntax error");
        assert_eq!(kind("frexp(8)"), "type error");
        assert_eq!(kind("pi(2)"), "type error");
        assert_eq!(kind("sqrt"), "type error");
        assert_eq!(kind("(1, 2) + 1"), "type error");
        assert_eq!(kind("[1] * 3"), "type error");
        assert_eq!(kind("2[0]"), "type error");
        assert_eq!(kind("(1, 2)[2]"), "domain error");
    }

    #[test]
    fn unknown_name_wins_over_bad_arguments() {
        assert_eq!(eval("foo(1/0)"), Err(EvalError::UnresolvedSymbol("foo".into())));
    }

    #[test]
    fn host_escapes_are_rejected() {
        for input in [
            "__import__('os').system('ls')",
            "open('/etc/passwd')",
            "eval('1')",
            "().__class__",
            "lambda: 1",
            "sum([1, 2])",
            "exec",
            "globals()",
        ] {
            assert!(eval(input).is_err(), "{}", input);
        }
    }

    #[test]
    fn hostile_input_is_bounded() {
        let nested = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(kind(&nested), "syntax error");

        let evaluator = Evaluator::global(Limits { max_depth: 200, max_input_len: 100_000 });
        let deep = format!("{}1{}", "(".repeat(5_000), ")".repeat(5_000));
        assert_eq!(evaluator.evaluate(&deep).unwrap_err(), EvalError::syntax("too many nested parentheses"));

        assert!(eval("\u{1F600} + ü").is_err());
        assert!(eval("\0").is_err());
    }

    fn on_two_megabyte_stack<T: Send + 'static>(run: impl FnOnce() -> T + Send + 'static) -> T {
        std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(run)
            .unwrap()
            .join()
            .unwrap()
    }

    /// Repeats `unit` between `head` and `tail` up to the default length limit.
    fn at_length_limit(head: &str, unit: &str, tail: &str) -> String {
        let room = Limits::default().max_input_len - head.len() - tail.len();
        format!("{}{}{}", head, unit.repeat(room / unit.len()), tail)
    }

    #[test]
    fn long_operator_chains_evaluate() {
        let sum = format!("{}1", "1+".repeat(2047));
        assert_eq!(on_two_megabyte_stack(move || evaluate(&sum)), Ok(2048.0));

        let cases = vec![
            (at_length_limit("", "1-", "1"), Ok(-2046.0)),
            (at_length_limit("", "1*", "1"), Ok(1.0)),
            (at_length_limit("", "1|", "1"), Ok(1.0)),
            (at_length_limit("", "1^", "1"), Ok(0.0)),
            (at_length_limit("", "1&", "1"), Ok(1.0)),
            (at_length_limit("1", ">>1", ""), Ok(0.0)),
            (at_length_limit("", "1+2*", "1"), Ok(2047.0)),
        ];
        for (input, expected) in cases {
            assert!(input.len() <= Limits::default().max_input_len);
            let outcome = on_two_megabyte_stack({
                let input = input.clone();
                move || evaluate(&input)
            });
            assert_eq!(outcome, expected, "{}...", &input[..16]);
        }
    }

    #[test]
    fn wide_and_chained_inputs_at_the_length_limit_are_bounded() {
        let limit = Limits::default().max_input_len;
        let wide = vec![
            (at_length_limit("max(", "1,", "1)"), Ok(1.0)),
            (at_length_limit("fsum([", "1,", "1])"), Ok(2044.0)),
            (at_length_limit("hypot(", "0,", "0)"), Ok(0.0)),
            (at_length_limit("(", "1,", "1)[0]"), Ok(1.0)),
        ];
        for (input, expected) in wide {
            assert!(input.len() <= limit);
            let outcome = on_two_megabyte_stack({
                let input = input.clone();
                move || evaluate(&input)
            });
            assert_eq!(outcome, expected, "{}...", &input[..16]);
        }

        for input in [
            at_length_limit("(1,)", "[0]", ""),
            at_length_limit("abs(1)", "(1)", ""),
            at_length_limit("", "-", "1"),
            at_length_limit("", "~", "1"),
            at_length_limit("", "2**", "2"),
            at_length_limit("", "(", ""),
            at_length_limit("", "[", ""),
        ] {
            assert!(input.len() <= limit);
            let kind = on_two_megabyte_stack(move || evaluate(&input).map_err(|e| e.kind()));
            assert_eq!(kind, Err("syntax error"));
        }
    }

    #[test]
    fn trace_records_operations_in_order() {
        let mut trace = EvaluationTrace::new(true);
        let value = Evaluator::global(Limits::default())
            .evaluate_traced("sqrt(16) + 2 * 3", &mut trace)
            .unwrap();
        assert_eq!(value, 10.0);
        let operations: Vec<&str> = trace.steps.iter().map(|s| s.operation.as_str()).collect();
        assert_eq!(operations, vec!["sqrt(16.0)", "2.0 * 3.0", "4.0 + 6.0"]);
    }

    #[test]
    fn custom_table_is_honoured() {
        let table = SymbolTable::build();
        let evaluator = Evaluator::new(&table, Limits::default());
        assert_eq!(evaluator.evaluate("abs(-2)"), Ok(2.0));
        assert_eq!(evaluator.limits(), Limits::default());
    }
}
