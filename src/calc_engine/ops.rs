//! Operator semantics on floats: floored division and modulo, checked
//! overflow, and bitwise operators restricted to 64-bit integers.

use super::token::Op;
use crate::error::EvalError;
use crate::symbols::builtins::power;

const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn checked(op: Op, a: f64, b: f64, r: f64) -> Result<f64, EvalError> {
    if r.is_infinite() && a.is_finite() && b.is_finite() {
        return Err(EvalError::overflow(format!("'{}': numerical result out of range", op)));
    }
    Ok(r)
}

/// Floored quotient and modulo, with the modulo taking the divisor's sign.
fn divmod(a: f64, b: f64) -> (f64, f64) {
    let mut m = a % b;
    let mut div = (a - m) / b;
    if m != 0.0 {
        if (b < 0.0) != (m < 0.0) {
            m += b;
            div -= 1.0;
        }
    } else {
        m = 0.0f64.copysign(b);
    }
    let floordiv = if div != 0.0 {
        let mut f = div.floor();
        if div - f > 0.5 {
            f += 1.0;
        }
        f
    } else {
        0.0f64.copysign(a / b)
    };
    (floordiv, m)
}

fn to_i64(op: Op, x: f64) -> Result<i64, EvalError> {
    if !x.is_finite() || x.fract() != 0.0 {
        return Err(EvalError::type_mismatch(format!(
            "unsupported operand for '{}': {} is not an integer",
            op,
            crate::format::repr(x)
        )));
    }
    if !(-I64_BOUND..I64_BOUND).contains(&x) {
        return Err(EvalError::overflow(format!(
            "'{}': operand outside the 64-bit integer range",
            op
        )));
    }
    Ok(x as i64)
}

fn shift_count(op: Op, x: f64) -> Result<i64, EvalError> {
    let n = to_i64(op, x)?;
    if n < 0 {
        return Err(EvalError::domain("negative shift count"));
    }
    Ok(n)
}

pub fn binary(op: Op, a: f64, b: f64) -> Result<f64, EvalError> {
    match op {
        Op::Plus => checked(op, a, b, a + b),
        Op::Minus => checked(op, a, b, a - b),
        Op::Star => checked(op, a, b, a * b),
        Op::Slash => {
            if b == 0.0 {
                return Err(EvalError::domain("division by zero"));
            }
            checked(op, a, b, a / b)
        }
        Op::DoubleSlash => {
            if b == 0.0 {
                return Err(EvalError::domain("floor division by zero"));
            }
            checked(op, a, b, divmod(a, b).0)
        }
        Op::Percent => {
            if b == 0.0 {
                return Err(EvalError::domain("modulo by zero"));
            }
            Ok(divmod(a, b).1)
        }
        Op::DoubleStar => power("**", a, b),
        Op::Amp => Ok((to_i64(op, a)? & to_i64(op, b)?) as f64),
        Op::Pipe => Ok((to_i64(op, a)? | to_i64(op, b)?) as f64),
        Op::Caret => Ok((to_i64(op, a)? ^ to_i64(op, b)?) as f64),
        Op::Shl => {
            let (a, n) = (to_i64(op, a)?, shift_count(op, b)?);
            // The shifted value is exact in f64 whenever it is finite.
            let r = libm::ldexp(a as f64, n.min(2100) as i32);
            if r.is_infinite() {
                return Err(EvalError::overflow("'<<': int too large to convert to float"));
            }
            Ok(r)
        }
        Op::Shr => {
            let (a, n) = (to_i64(op, a)?, shift_count(op, b)?);
            Ok((a >> n.min(63)) as f64)
        }
        Op::Tilde => Err(EvalError::syntax("'~' is not a binary operator")),
    }
}

pub fn unary(op: Op, x: f64) -> Result<f64, EvalError> {
    match op {
        Op::Plus => Ok(x),
        Op::Minus => Ok(-x),
        Op::Tilde => Ok(!to_i64(op, x)? as f64),
        _ => Err(EvalError::syntax(format!("'{}' is not a unary operator", op))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floored_division_and_modulo() {
        assert_eq!(binary(Op::DoubleSlash, 7.0, 2.0), Ok(3.0));
        assert_eq!(binary(Op::DoubleSlash, 7.0, -2.0), Ok(-4.0));
        assert_eq!(binary(Op::DoubleSlash, -7.5, 2.0), Ok(-4.0));
        assert_eq!(binary(Op::Percent, -7.0, 3.0), Ok(2.0));
        assert_eq!(binary(Op::Percent, 7.0, -3.0), Ok(-2.0));
        assert_eq!(binary(Op::Percent, 5.5, 2.0), Ok(1.5));
    }

    #[test]
    fn zero_divisors() {
        for op in [Op::Slash, Op::DoubleSlash, Op::Percent] {
            assert_eq!(binary(op, 1.0, 0.0).unwrap_err().kind(), "domain error");
        }
        assert_eq!(binary(Op::DoubleStar, 0.0, -1.0).unwrap_err().kind(), "domain error");
    }

    #[test]
    fn overflow_from_finite_operands() {
        assert_eq!(binary(Op::Star, 1e308, 10.0).unwrap_err().kind(), "overflow");
        assert_eq!(binary(Op::DoubleStar, 10.0, 400.0).unwrap_err().kind(), "overflow");
        assert_eq!(binary(Op::Plus, f64::INFINITY, 1.0), Ok(f64::INFINITY));
        assert!(binary(Op::Minus, f64::INFINITY, f64::INFINITY).unwrap().is_nan());
    }

    #[test]
    fn bitwise() {
        assert_eq!(binary(Op::Amp, 255.0, 15.0), Ok(15.0));
        assert_eq!(binary(Op::Pipe, 8.0, 1.0), Ok(9.0));
        assert_eq!(binary(Op::Caret, 6.0, 3.0), Ok(5.0));
        assert_eq!(binary(Op::Shl, 1.0, 10.0), Ok(1024.0));
        assert_eq!(binary(Op::Shl, 1.0, 70.0), Ok(2f64.powi(70)));
        assert_eq!(binary(Op::Shr, -9.0, 1.0), Ok(-5.0));
        assert_eq!(binary(Op::Shr, -9.0, 500.0), Ok(-1.0));
        assert_eq!(unary(Op::Tilde, 0.0), Ok(-1.0));
        assert_eq!(binary(Op::Shl, 1.0, 5000.0).unwrap_err().kind(), "overflow");
        assert_eq!(binary(Op::Shl, 1.0, -1.0).unwrap_err().kind(), "domain error");
        assert_eq!(binary(Op::Amp, 1.5, 1.0).unwrap_err().kind(), "type error");
        assert_eq!(binary(Op::Amp, 1e30, 1.0).unwrap_err().kind(), "overflow");
    }
}
