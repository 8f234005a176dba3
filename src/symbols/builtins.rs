//! Registration and implementation of every whitelisted symbol.
//!
//! Semantics follow the usual real-valued math module: a NaN produced from
//! non-NaN input is a domain error, an infinity produced from finite input is
//! a range error (or a domain error for functions with a pole).

use super::integer;
use super::{Args, Arity, TableBuilder};
use crate::error::EvalError;
use crate::value::Value;
use std::f64::consts::{E, PI, TAU};

type Outcome = Result<Value, EvalError>;

const ISCLOSE_REL_TOL: f64 = 1e-9;

pub(crate) fn register(t: &mut TableBuilder) {
    use Arity::*;

    t.constant("e", E);
    t.constant("pi", PI);
    t.constant("inf", f64::INFINITY);
    t.constant("nan", f64::NAN);
    t.constant("tau", TAU);

    t.function("acos", Exact(1), |a| unary(a, f64::acos));
    t.function("acosh", Exact(1), |a| unary(a, f64::acosh));
    t.function("asin", Exact(1), |a| unary(a, f64::asin));
    t.function("asinh", Exact(1), |a| unary(a, f64::asinh));
    t.function("atan", Exact(1), |a| unary(a, f64::atan));
    t.function("atan2", Exact(2), |a| binary(a, f64::atan2));
    t.function("atanh", Exact(1), |a| unary(a, f64::atanh));
    t.function("cbrt", Exact(1), |a| unary(a, f64::cbrt));
    t.function("ceil", Exact(1), |a| to_integral(a, f64::ceil));
    t.function("comb", Exact(2), |a| Ok(integer::comb(a.integer(0)?, a.integer(1)?)?.into()));
    t.function("copysign", Exact(2), |a| binary(a, f64::copysign));
    t.function("cos", Exact(1), |a| unary(a, f64::cos));
    t.function("cosh", Exact(1), |a| unary_overflowing(a, f64::cosh));
    t.function("degrees", Exact(1), |a| Ok(a.number(0)?.to_degrees().into()));
    t.function("dist", Exact(2), dist);
    t.function("erf", Exact(1), |a| unary(a, libm::erf));
    t.function("erfc", Exact(1), |a| unary(a, libm::erfc));
    t.function("exp", Exact(1), |a| unary_overflowing(a, f64::exp));
    t.function("exp2", Exact(1), |a| unary_overflowing(a, f64::exp2));
    t.function("expm1", Exact(1), |a| unary_overflowing(a, f64::exp_m1));
    t.function("fabs", Exact(1), |a| Ok(a.number(0)?.abs().into()));
    t.function("factorial", Exact(1), |a| Ok(integer::factorial(a.integer(0)?)?.into()));
    t.function("floor", Exact(1), |a| to_integral(a, f64::floor));
    t.function("fmod", Exact(2), |a| binary(a, |x, y| x % y));
    t.function("frexp", Exact(1), frexp);
    t.function("fsum", Exact(1), |a| Ok(fsum(a.sequence(0)?)?.into()));
    t.function("gamma", Exact(1), gamma);
    t.function("gcd", AtLeast(0), |a| Ok(integer::gcd(&a.integers()?)?.into()));
    t.function("hypot", AtLeast(0), |a| Ok(hypot(&a.numbers()?)?.into()));
    t.function("isclose", Exact(2), |a| Ok(isclose(a.number(0)?, a.number(1)?).into()));
    t.function("isinf", Exact(1), |a| Ok(a.number(0)?.is_infinite().into()));
    t.function("isfinite", Exact(1), |a| Ok(a.number(0)?.is_finite().into()));
    t.function("isnan", Exact(1), |a| Ok(a.number(0)?.is_nan().into()));
    t.function("isqrt", Exact(1), |a| Ok(integer::isqrt(a.integer(0)?)?.into()));
    t.function("lcm", AtLeast(0), |a| Ok(integer::lcm(&a.integers()?)?.into()));
    t.function("ldexp", Exact(2), ldexp);
    t.function("lgamma", Exact(1), lgamma);
    t.function("log", Between(1, 2), log);
    t.function("log10", Exact(1), |a| logarithm(a, f64::log10));
    t.function("log1p", Exact(1), |a| unary(a, f64::ln_1p));
    t.function("log2", Exact(1), |a| logarithm(a, f64::log2));
    t.function("modf", Exact(1), modf);
    t.function("nextafter", Exact(2), |a| binary(a, libm::nextafter));
    t.function("perm", Between(1, 2), perm);
    t.function("pow", Exact(2), |a| Ok(power("pow", a.number(0)?, a.number(1)?)?.into()));
    t.function("prod", Exact(1), |a| Ok(prod(a.sequence(0)?)?.into()));
    t.function("radians", Exact(1), |a| Ok(a.number(0)?.to_radians().into()));
    t.function("remainder", Exact(2), remainder);
    t.function("sin", Exact(1), |a| unary(a, f64::sin));
    t.function("sinh", Exact(1), |a| unary_overflowing(a, f64::sinh));
    t.function("sumprod", Exact(2), sumprod);
    t.function("sqrt", Exact(1), |a| unary(a, f64::sqrt));
    t.function("tan", Exact(1), |a| unary(a, f64::tan));
    t.function("tanh", Exact(1), |a| unary(a, f64::tanh));
    t.function("trunc", Exact(1), |a| to_integral(a, f64::trunc));

    t.function("abs", Exact(1), |a| Ok(a.number(0)?.abs().into()));
    t.function("int", Between(0, 1), int);
    t.function("min", AtLeast(1), |a| extremum(a, |x, best| x < best));
    t.function("max", AtLeast(1), |a| extremum(a, |x, best| x > best));
    t.function("round", Between(1, 2), round);
}

fn unary(args: &Args<'_>, f: fn(f64) -> f64) -> Outcome {
    let x = args.number(0)?;
    let r = f(x);
    if r.is_nan() && !x.is_nan() {
        return Err(EvalError::math_domain(args.name));
    }
    if r.is_infinite() && x.is_finite() {
        return Err(EvalError::math_domain(args.name));
    }
    Ok(r.into())
}

fn unary_overflowing(args: &Args<'_>, f: fn(f64) -> f64) -> Outcome {
    let x = args.number(0)?;
    let r = f(x);
    if r.is_infinite() && x.is_finite() {
        return Err(EvalError::math_range(args.name));
    }
    Ok(r.into())
}

fn binary(args: &Args<'_>, f: fn(f64, f64) -> f64) -> Outcome {
    let (x, y) = (args.number(0)?, args.number(1)?);
    let r = f(x, y);
    if r.is_nan() && !x.is_nan() && !y.is_nan() {
        return Err(EvalError::math_domain(args.name));
    }
    if r.is_infinite() && x.is_finite() && y.is_finite() {
        return Err(EvalError::math_range(args.name));
    }
    Ok(r.into())
}

/// Shared by `**` and `pow`.
pub fn power(name: &str, x: f64, y: f64) -> Result<f64, EvalError> {
    if x.is_finite() && y.is_finite() {
        if x == 0.0 && y < 0.0 {
            return Err(EvalError::domain(format!(
                "{}: 0.0 cannot be raised to a negative power",
                name
            )));
        }
        if x < 0.0 && y.fract() != 0.0 {
            return Err(EvalError::domain(format!(
                "{}: negative number cannot be raised to a fractional power",
                name
            )));
        }
        let r = x.powf(y);
        if r.is_infinite() {
            return Err(EvalError::overflow(format!("{}: numerical result out of range", name)));
        }
        return Ok(r);
    }
    Ok(x.powf(y))
}

/// Rounds to an integral value, refusing NaN and infinities.
pub fn integral(x: f64) -> Result<f64, EvalError> {
    if x.is_nan() {
        return Err(EvalError::domain("cannot convert float NaN to integer"));
    }
    if x.is_infinite() {
        return Err(EvalError::overflow("cannot convert float infinity to integer"));
    }
    Ok(x)
}

fn to_integral(args: &Args<'_>, f: fn(f64) -> f64) -> Outcome {
    Ok(f(integral(args.number(0)?)?).into())
}

fn int(args: &Args<'_>) -> Outcome {
    if args.is_empty() {
        return Ok(0.0f64.into());
    }
    Ok(integral(args.number(0)?)?.trunc().into())
}

fn logarithm(args: &Args<'_>, f: fn(f64) -> f64) -> Outcome {
    Ok(log_of(args.name, args.number(0)?, f)?.into())
}

fn log_of(name: &str, x: f64, f: fn(f64) -> f64) -> Result<f64, EvalError> {
    if x.is_nan() {
        return Ok(x);
    }
    if x <= 0.0 {
        return Err(EvalError::math_domain(name));
    }
    Ok(f(x))
}

fn log(args: &Args<'_>) -> Outcome {
    let num = log_of("log", args.number(0)?, f64::ln)?;
    if args.len() == 1 {
        return Ok(num.into());
    }
    let den = log_of("log", args.number(1)?, f64::ln)?;
    if den == 0.0 {
        return Err(EvalError::domain("log: division by zero"));
    }
    Ok((num / den).into())
}

fn gamma(args: &Args<'_>) -> Outcome {
    let x = args.number(0)?;
    if x.is_nan() || x == f64::INFINITY {
        return Ok(x.into());
    }
    if x == f64::NEG_INFINITY || (x <= 0.0 && x.fract() == 0.0) {
        return Err(EvalError::math_domain("gamma"));
    }
    let r = libm::tgamma(x);
    if r.is_infinite() {
        return Err(EvalError::math_range("gamma"));
    }
    Ok(r.into())
}

fn lgamma(args: &Args<'_>) -> Outcome {
    let x = args.number(0)?;
    if x.is_nan() {
        return Ok(x.into());
    }
    if x.is_infinite() {
        return Ok(f64::INFINITY.into());
    }
    if x <= 0.0 && x.fract() == 0.0 {
        return Err(EvalError::math_domain("lgamma"));
    }
    let r = libm::lgamma(x);
    if r.is_infinite() {
        return Err(EvalError::math_range("lgamma"));
    }
    Ok(r.into())
}

fn frexp(args: &Args<'_>) -> Outcome {
    let x = args.number(0)?;
    if x == 0.0 || !x.is_finite() {
        return Ok(vec![x, 0.0].into());
    }
    let (mantissa, exponent) = libm::frexp(x);
    Ok(vec![mantissa, exponent as f64].into())
}

fn modf(args: &Args<'_>) -> Outcome {
    let x = args.number(0)?;
    if x.is_nan() {
        return Ok(vec![x, x].into());
    }
    if x.is_infinite() {
        return Ok(vec![0.0f64.copysign(x), x].into());
    }
    let whole = x.trunc();
    Ok(vec![(x - whole).copysign(x), whole].into())
}

fn ldexp(args: &Args<'_>) -> Outcome {
    let x = args.number(0)?;
    let exp = args.value(1).as_number().filter(|e| e.fract() == 0.0).ok_or_else(|| {
        EvalError::type_mismatch("ldexp() expected an integral exponent")
    })?;
    if x == 0.0 || !x.is_finite() {
        return Ok(x.into());
    }
    // Anything past ±2100 saturates: |x| spans at most 2^-1074..2^1024.
    let clamped = exp.clamp(-2100.0, 2100.0) as i32;
    let r = libm::ldexp(x, clamped);
    if r.is_infinite() {
        return Err(EvalError::math_range("ldexp"));
    }
    Ok(r.into())
}

fn remainder(args: &Args<'_>) -> Outcome {
    let (x, y) = (args.number(0)?, args.number(1)?);
    if x.is_nan() || y.is_nan() {
        return Ok(f64::NAN.into());
    }
    if x.is_infinite() || y == 0.0 {
        return Err(EvalError::math_domain("remainder"));
    }
    if y.is_infinite() {
        return Ok(x.into());
    }
    Ok(libm::remainder(x, y).into())
}

fn perm(args: &Args<'_>) -> Outcome {
    let n = args.integer(0)?;
    let k = if args.len() == 2 { Some(args.integer(1)?) } else { None };
    Ok(integer::perm(n, k)?.into())
}

fn isclose(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    if a.is_infinite() || b.is_infinite() {
        return false;
    }
    let diff = (b - a).abs();
    diff <= (ISCLOSE_REL_TOL * b).abs() || diff <= (ISCLOSE_REL_TOL * a).abs()
}

fn hypot(coords: &[f64]) -> Result<f64, EvalError> {
    let mut max = 0.0f64;
    let mut found_nan = false;
    for &c in coords {
        let c = c.abs();
        if c.is_infinite() {
            return Ok(f64::INFINITY);
        }
        found_nan |= c.is_nan();
        if c > max {
            max = c;
        }
    }
    if found_nan {
        return Ok(f64::NAN);
    }
    if max == 0.0 {
        return Ok(0.0);
    }
    let scaled: Vec<f64> = coords.iter().map(|c| (c / max) * (c / max)).collect();
    let r = fsum(&scaled)?.sqrt() * max;
    if r.is_infinite() {
        return Err(EvalError::math_range("hypot"));
    }
    Ok(r)
}

fn dist(args: &Args<'_>) -> Outcome {
    let (p, q) = (args.sequence(0)?, args.sequence(1)?);
    if p.len() != q.len() {
        return Err(EvalError::domain(
            "dist: both points must have the same number of dimensions",
        ));
    }
    let diffs: Vec<f64> = p.iter().zip(q).map(|(a, b)| a - b).collect();
    Ok(hypot(&diffs)?.into())
}

fn sumprod(args: &Args<'_>) -> Outcome {
    let (p, q) = (args.sequence(0)?, args.sequence(1)?);
    if p.len() != q.len() {
        return Err(EvalError::domain("sumprod: inputs are not the same length"));
    }
    let products: Vec<f64> = p.iter().zip(q).map(|(a, b)| a * b).collect();
    Ok(fsum(&products)?.into())
}

fn prod(items: &[f64]) -> Result<f64, EvalError> {
    let mut acc = 1.0f64;
    for &x in items {
        let next = acc * x;
        if next.is_infinite() && acc.is_finite() && x.is_finite() {
            return Err(EvalError::overflow("prod: numerical result out of range"));
        }
        acc = next;
    }
    Ok(acc)
}

/// Exactly rounded sum using a list of non-overlapping partial sums.
pub fn fsum(items: &[f64]) -> Result<f64, EvalError> {
    let mut partials: Vec<f64> = Vec::new();
    let mut special_sum = 0.0f64;
    let mut inf_sum = 0.0f64;

    for &item in items {
        let mut x = item;
        let mut kept = 0;
        for i in 0..partials.len() {
            let mut y = partials[i];
            if x.abs() < y.abs() {
                std::mem::swap(&mut x, &mut y);
            }
            let hi = x + y;
            let lo = y - (hi - x);
            if lo != 0.0 {
                partials[kept] = lo;
                kept += 1;
            }
            x = hi;
        }
        partials.truncate(kept);

        if x != 0.0 {
            if !x.is_finite() {
                if item.is_finite() {
                    return Err(EvalError::overflow("intermediate overflow in fsum"));
                }
                if item.is_infinite() {
                    inf_sum += item;
                }
                special_sum += item;
                partials.clear();
            } else {
                partials.push(x);
            }
        }
    }

    if special_sum != 0.0 {
        if inf_sum.is_nan() {
            return Err(EvalError::domain("-inf + inf in fsum"));
        }
        return Ok(special_sum);
    }

    let mut n = partials.len();
    let mut hi = 0.0f64;
    if n > 0 {
        n -= 1;
        hi = partials[n];
        let mut lo = 0.0f64;
        while n > 0 {
            let x = hi;
            n -= 1;
            let y = partials[n];
            hi = x + y;
            let yr = hi - x;
            lo = y - yr;
            if lo != 0.0 {
                break;
            }
        }
        // Round half-even correctly when the remaining partials push past a tie.
        if n > 0 && ((lo < 0.0 && partials[n - 1] < 0.0) || (lo > 0.0 && partials[n - 1] > 0.0)) {
            let y = lo * 2.0;
            let x = hi + y;
            if y == x - hi {
                hi = x;
            }
        }
    }
    Ok(hi)
}

/// `min`/`max`: one sequence argument, or two or more numbers.
fn extremum(args: &Args<'_>, better: fn(f64, f64) -> bool) -> Outcome {
    let items = if args.len() == 1 {
        match args.value(0) {
            Value::Sequence(items) => items.clone(),
            Value::Number(_) => {
                return Err(EvalError::type_mismatch(format!(
                    "{}() expected a sequence or at least 2 arguments",
                    args.name
                )))
            }
        }
    } else {
        args.numbers()?
    };
    let mut iter = items.into_iter();
    let first = iter
        .next()
        .ok_or_else(|| EvalError::domain(format!("{}() arg is an empty sequence", args.name)))?;
    Ok(iter.fold(first, |best, x| if better(x, best) { x } else { best }).into())
}

fn round(args: &Args<'_>) -> Outcome {
    let x = args.number(0)?;
    if args.len() == 1 {
        return Ok(integral(x)?.round_ties_even().into());
    }
    let digits = args.value(1).as_number().filter(|d| d.fract() == 0.0).ok_or_else(|| {
        EvalError::type_mismatch("round() ndigits must be an integer")
    })?;
    Ok(round_to(x, digits)?.into())
}

fn round_to(x: f64, digits: f64) -> Result<f64, EvalError> {
    if !x.is_finite() || x == 0.0 || digits > 323.0 {
        return Ok(x);
    }
    if digits < -308.0 {
        return Ok(0.0f64.copysign(x));
    }
    let digits = digits as i32;
    let (pow1, pow2, y) = if digits >= 0 {
        let (pow1, pow2) = if digits > 22 {
            (10f64.powi(digits - 22), 1e22)
        } else {
            (10f64.powi(digits), 1.0)
        };
        let y = (x * pow1) * pow2;
        if !y.is_finite() {
            return Ok(x);
        }
        (pow1, pow2, y)
    } else {
        let pow1 = 10f64.powi(-digits);
        (pow1, 1.0, x / pow1)
    };

    let z = y.round_ties_even();
    let z = if digits >= 0 { (z / pow2) / pow1 } else { z * pow1 };
    if !z.is_finite() {
        return Err(EvalError::overflow("overflow occurred during round"));
    }
    Ok(z)
}
