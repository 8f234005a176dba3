use super::token::{Op, Token};
use crate::error::EvalError;

/// Expression tree. Names stay unresolved until evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Name(String),
    Unary { op: Op, operand: Box<Expr> },
    Binary { op: Op, lhs: Box<Expr>, rhs: Box<Expr> },
    /// Left-associative run of operators sharing one binding level,
    /// e.g. `1 + 2 - 3`. Kept flat so long runs add no tree depth.
    Chain { first: Box<Expr>, rest: Vec<(Op, Expr)> },
    Call { callee: Box<Expr>, args: Vec<Expr> },
    Index { target: Box<Expr>, index: Box<Expr> },
    Sequence(Vec<Expr>),
}

/// Binding levels from loosest to tightest. `**` and unary operators are
/// handled separately.
const BINARY_LEVELS: &[&[Op]] = &[
    &[Op::Pipe],
    &[Op::Caret],
    &[Op::Amp],
    &[Op::Shl, Op::Shr],
    &[Op::Plus, Op::Minus],
    &[Op::Star, Op::Slash, Op::DoubleSlash, Op::Percent],
];

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, max_depth: usize) -> Self {
        Parser { tokens, current: 0, depth: 0, max_depth }
    }

    pub fn parse(&mut self) -> Result<Expr, EvalError> {
        if self.tokens.is_empty() {
            return Err(EvalError::syntax("empty expression"));
        }
        let expr = self.expr()?;
        if let Some(token) = self.peek() {
            return Err(EvalError::syntax(format!("unexpected {}", describe(token))));
        }
        Ok(expr)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.current).cloned();
        if token.is_some() {
            self.current += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), EvalError> {
        if self.eat(&expected) {
            return Ok(());
        }
        match self.peek() {
            Some(token) => Err(EvalError::syntax(format!(
                "expected {}, found {}",
                what,
                describe(token)
            ))),
            None => Err(EvalError::syntax(format!("expected {}, found end of input", what))),
        }
    }

    fn enter(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(EvalError::syntax("too many nested parentheses"));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn expr(&mut self) -> Result<Expr, EvalError> {
        self.binary(0)
    }

    fn binary(&mut self, level: usize) -> Result<Expr, EvalError> {
        if level == BINARY_LEVELS.len() {
            return self.unary();
        }
        let first = self.binary(level + 1)?;

        let mut rest = Vec::new();
        while let Some(Token::Op(op)) = self.peek() {
            let op = *op;
            if !BINARY_LEVELS[level].contains(&op) {
                break;
            }
            self.current += 1;
            rest.push((op, self.binary(level + 1)?));
        }
        if rest.is_empty() {
            return Ok(first);
        }
        Ok(Expr::Chain { first: Box::new(first), rest })
    }

    fn unary(&mut self) -> Result<Expr, EvalError> {
        let mut ops = Vec::new();
        while let Some(Token::Op(op @ (Op::Plus | Op::Minus | Op::Tilde))) = self.peek() {
            ops.push(*op);
            self.current += 1;
        }
        if self.depth + ops.len() > self.max_depth {
            return Err(EvalError::syntax("too many nested unary operators"));
        }

        let mut result = self.power()?;
        for op in ops.into_iter().rev() {
            result = Expr::Unary { op, operand: Box::new(result) };
        }
        Ok(result)
    }

    fn power(&mut self) -> Result<Expr, EvalError> {
        let base = self.postfix()?;

        if self.eat(&Token::Op(Op::DoubleStar)) {
            self.enter()?;
            let exponent = self.unary();
            self.leave();
            return Ok(Expr::Binary {
                op: Op::DoubleStar,
                lhs: Box::new(base),
                rhs: Box::new(exponent?),
            });
        }
        Ok(base)
    }

    fn postfix(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.primary()?;

        // Each call or subscript wraps the previous node, so a run of them
        // counts toward the depth limit.
        let mut applied = 0;
        loop {
            let is_call = self.eat(&Token::LParen);
            if !is_call && !self.eat(&Token::LBracket) {
                return Ok(expr);
            }
            applied += 1;
            if self.depth + applied > self.max_depth {
                return Err(EvalError::syntax("too many chained calls or subscripts"));
            }

            expr = if is_call {
                let args = self.nested(|p| p.items(Token::RParen, "')'"))?;
                Expr::Call { callee: Box::new(expr), args }
            } else {
                let index = self.nested(|p| {
                    let index = p.expr()?;
                    p.expect(Token::RBracket, "']'")?;
                    Ok(index)
                })?;
                Expr::Index { target: Box::new(expr), index: Box::new(index) }
            };
        }
    }

    fn primary(&mut self) -> Result<Expr, EvalError> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Ident(name)) => Ok(Expr::Name(name)),
            Some(Token::LParen) => self.nested(|p| {
                if p.eat(&Token::RParen) {
                    return Ok(Expr::Sequence(Vec::new()));
                }
                let first = p.expr()?;
                if p.eat(&Token::RParen) {
                    return Ok(first);
                }
                p.expect(Token::Comma, "')'")?;
                let mut items = vec![first];
                items.extend(p.items(Token::RParen, "')'")?);
                Ok(Expr::Sequence(items))
            }),
            Some(Token::LBracket) => {
                self.nested(|p| Ok(Expr::Sequence(p.items(Token::RBracket, "']'")?)))
            }
            Some(token) => Err(EvalError::syntax(format!("unexpected {}", describe(&token)))),
            None => Err(EvalError::syntax("unexpected end of input")),
        }
    }

    fn nested<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<T, EvalError>,
    ) -> Result<T, EvalError> {
        self.enter()?;
        let result = body(self);
        self.leave();
        result
    }

    /// Comma-separated expressions up to `close`; a trailing comma is allowed.
    fn items(&mut self, close: Token, what: &str) -> Result<Vec<Expr>, EvalError> {
        let mut items = Vec::new();
        loop {
            if self.eat(&close) {
                return Ok(items);
            }
            items.push(self.expr()?);
            if !self.eat(&Token::Comma) {
                self.expect(close, what)?;
                return Ok(items);
            }
        }
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(n) => format!("number {}", n),
        Token::Op(op) => format!("operator '{}'", op),
        Token::Ident(name) => format!("name '{}'", name),
        Token::LParen => "'('".to_string(),
        Token::RParen => "')'".to_string(),
        Token::LBracket => "'['".to_string(),
        Token::RBracket => "']'".to_string(),
        Token::Comma => "','".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc_engine::token::tokenize;

    fn parse(input: &str) -> Result<Expr, EvalError> {
        Parser::new(tokenize(input)?, 200).parse()
    }

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::Number(n))
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(
            parse("1 + 2 * 3").unwrap(),
            Expr::Chain {
                first: num(1.0),
                rest: vec![(
                    Op::Plus,
                    Expr::Chain { first: num(2.0), rest: vec![(Op::Star, Expr::Number(3.0))] },
                )],
            }
        );
    }

    #[test]
    fn same_level_operators_form_one_flat_chain() {
        assert_eq!(
            parse("8 - 4 + 2").unwrap(),
            Expr::Chain {
                first: num(8.0),
                rest: vec![(Op::Minus, Expr::Number(4.0)), (Op::Plus, Expr::Number(2.0))],
            }
        );
        assert_eq!(parse("7").unwrap(), Expr::Number(7.0));
    }

    #[test]
    fn long_operator_runs_are_not_limited_by_depth() {
        let sum = format!("{}1", "1 + ".repeat(5_000));
        match parse(&sum).unwrap() {
            Expr::Chain { rest, .. } => assert_eq!(rest.len(), 5_000),
            other => panic!("expected a chain, got {:?}", other),
        }
    }

    #[test]
    fn power_is_right_associative_and_beats_unary_minus() {
        assert_eq!(
            parse("-2 ** 3 ** 2").unwrap(),
            Expr::Unary {
                op: Op::Minus,
                operand: Box::new(Expr::Binary {
                    op: Op::DoubleStar,
                    lhs: num(2.0),
                    rhs: Box::new(Expr::Binary { op: Op::DoubleStar, lhs: num(3.0), rhs: num(2.0) }),
                }),
            }
        );
        assert_eq!(
            parse("2 ** -1").unwrap(),
            Expr::Binary {
                op: Op::DoubleStar,
                lhs: num(2.0),
                rhs: Box::new(Expr::Unary { op: Op::Minus, operand: num(1.0) }),
            }
        );
    }

    #[test]
    fn calls_indexing_and_sequences() {
        assert_eq!(
            parse("frexp(8)[1]").unwrap(),
            Expr::Index {
                target: Box::new(Expr::Call {
                    callee: Box::new(Expr::Name("frexp".into())),
                    args: vec![Expr::Number(8.0)],
                }),
                index: num(1.0),
            }
        );
        assert_eq!(parse("()").unwrap(), Expr::Sequence(vec![]));
        assert_eq!(parse("(1,)").unwrap(), Expr::Sequence(vec![Expr::Number(1.0)]));
        assert_eq!(parse("(1)").unwrap(), Expr::Number(1.0));
        assert_eq!(
            parse("[1, 2,]").unwrap(),
            Expr::Sequence(vec![Expr::Number(1.0), Expr::Number(2.0)])
        );
        assert!(matches!(parse("max(1, 2,)").unwrap(), Expr::Call { args, .. } if args.len() == 2));
    }

    #[test]
    fn malformed_input() {
        for input in ["", "1 +", "(1", "1)", "max(1 2)", "[1", "* 2", "1 2", "f(,)", "1.2.3", "a[]"] {
            assert_eq!(parse(input).unwrap_err().kind(), "syntax error", "{:?}", input);
        }
    }

    #[test]
    fn nesting_is_bounded() {
        let ok = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        assert!(parse(&ok).is_ok());
        let deep = format!("{}1{}", "(".repeat(201), ")".repeat(201));
        assert_eq!(
            parse(&deep).unwrap_err(),
            EvalError::syntax("too many nested parentheses")
        );
        let tower = vec!["2"; 300].join(" ** ");
        assert!(parse(&tower).is_err());
        let negations = format!("{}1", "-".repeat(500));
        assert!(parse(&negations).is_err());
        assert!(parse("---1").is_ok());

        let subscripts = format!("(1,){}", "[0]".repeat(201));
        assert_eq!(
            parse(&subscripts).unwrap_err(),
            EvalError::syntax("too many chained calls or subscripts")
        );
        let calls = format!("abs(1){}", "(1)".repeat(500));
        assert!(parse(&calls).is_err());
        assert!(parse(&format!("(1,){}", "[0]".repeat(200))).is_ok());
    }
}
