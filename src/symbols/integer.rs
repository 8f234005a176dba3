//! Exact integer arithmetic behind the number-theoretic functions.
//!
//! Arguments arrive as integral `f64` values; the work is done on big
//! integers and only the final result is rounded back to `f64`. Every loop
//! stops as soon as its result can no longer be represented.

use crate::error::EvalError;
use num_bigint::{BigInt, BigUint};
use num_traits::{FromPrimitive, One, ToPrimitive, Zero};

/// Anything wider than this rounds to infinity as an `f64`.
const MAX_BITS: u64 = 1024;

/// Largest n whose factorial is finite as an `f64`.
const MAX_FACTORIAL: f64 = 170.0;

fn too_large() -> EvalError {
    EvalError::overflow("int too large to convert to float")
}

fn unsigned(n: f64) -> BigUint {
    BigUint::from_f64(n).unwrap_or_default()
}

fn signed(n: f64) -> BigInt {
    BigInt::from_f64(n).unwrap_or_default()
}

fn to_f64(n: &BigUint) -> Result<f64, EvalError> {
    n.to_f64().filter(|v| v.is_finite()).ok_or_else(too_large)
}

fn check_width(n: &BigUint) -> Result<(), EvalError> {
    if n.bits() > MAX_BITS {
        Err(too_large())
    } else {
        Ok(())
    }
}

fn non_negative(name: &str, what: &str, n: f64) -> Result<(), EvalError> {
    if n < 0.0 {
        Err(EvalError::domain(format!("{}() {} must be a non-negative integer", name, what)))
    } else {
        Ok(())
    }
}

pub fn factorial(n: f64) -> Result<f64, EvalError> {
    if n < 0.0 {
        return Err(EvalError::domain("factorial() not defined for negative values"));
    }
    if n > MAX_FACTORIAL {
        return Err(too_large());
    }
    let mut acc = BigUint::one();
    for i in 2..=(n as u32) {
        acc *= i;
    }
    to_f64(&acc)
}

pub fn comb(n: f64, k: f64) -> Result<f64, EvalError> {
    non_negative("comb", "n", n)?;
    non_negative("comb", "k", k)?;
    let n = unsigned(n);
    let k = unsigned(k);
    if k > n {
        return Ok(0.0);
    }
    let rest = &n - &k;
    let k = if rest < k { rest } else { k };

    let mut acc = BigUint::one();
    let mut i = BigUint::zero();
    while i < k {
        acc *= &n - &i;
        i += 1u32;
        acc /= &i;
        check_width(&acc)?;
    }
    to_f64(&acc)
}

/// `perm(n)` is `n!`; `perm(n, k)` counts ordered selections.
pub fn perm(n: f64, k: Option<f64>) -> Result<f64, EvalError> {
    non_negative("perm", "n", n)?;
    let k = match k {
        Some(k) => k,
        None => return factorial(n),
    };
    non_negative("perm", "k", k)?;
    let n = unsigned(n);
    let k = unsigned(k);
    if k > n {
        return Ok(0.0);
    }

    let mut acc = BigUint::one();
    let mut i = BigUint::zero();
    while i < k {
        acc *= &n - &i;
        i += 1u32;
        check_width(&acc)?;
    }
    to_f64(&acc)
}

fn gcd_pair(mut a: BigUint, mut b: BigUint) -> BigUint {
    while !b.is_zero() {
        let r = &a % &b;
        a = b;
        b = r;
    }
    a
}

pub fn gcd(values: &[f64]) -> Result<f64, EvalError> {
    let result = values
        .iter()
        .map(|&v| signed(v).magnitude().clone())
        .fold(BigUint::zero(), gcd_pair);
    to_f64(&result)
}

pub fn lcm(values: &[f64]) -> Result<f64, EvalError> {
    let mut acc = BigUint::one();
    for &v in values {
        let v = signed(v).magnitude().clone();
        if v.is_zero() {
            return Ok(0.0);
        }
        let g = gcd_pair(acc.clone(), v.clone());
        acc = acc / g * v;
        check_width(&acc)?;
    }
    to_f64(&acc)
}

pub fn isqrt(n: f64) -> Result<f64, EvalError> {
    if n < 0.0 {
        return Err(EvalError::domain("isqrt() argument must be nonnegative"));
    }
    to_f64(&unsigned(n).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factorial_is_exact_and_bounded() {
        assert_eq!(factorial(0.0), Ok(1.0));
        assert_eq!(factorial(5.0), Ok(120.0));
        assert_eq!(factorial(20.0), Ok(2432902008176640000.0));
        assert!(factorial(170.0).unwrap().is_finite());
        assert_eq!(factorial(171.0).unwrap_err().kind(), "overflow");
        assert_eq!(factorial(1e300).unwrap_err().kind(), "overflow");
        assert_eq!(factorial(-1.0).unwrap_err().kind(), "domain error");
    }

    #[test]
    fn comb_and_perm() {
        assert_eq!(comb(5.0, 2.0), Ok(10.0));
        assert_eq!(comb(2.0, 5.0), Ok(0.0));
        assert_eq!(comb(1e15, 1.0), Ok(1e15));
        assert_eq!(comb(100.0, 98.0), Ok(4950.0));
        assert_eq!(comb(1e300, 1e150).unwrap_err().kind(), "overflow");
        assert_eq!(perm(5.0, Some(2.0)), Ok(20.0));
        assert_eq!(perm(5.0, None), Ok(120.0));
        assert_eq!(perm(3.0, Some(4.0)), Ok(0.0));
        assert_eq!(perm(1e9, Some(1e9)).unwrap_err().kind(), "overflow");
        assert_eq!(comb(-1.0, 1.0).unwrap_err().kind(), "domain error");
    }

    #[test]
    fn gcd_and_lcm() {
        assert_eq!(gcd(&[]), Ok(0.0));
        assert_eq!(gcd(&[12.0, -18.0]), Ok(6.0));
        assert_eq!(gcd(&[0.0, 7.0]), Ok(7.0));
        assert_eq!(lcm(&[]), Ok(1.0));
        assert_eq!(lcm(&[4.0, 6.0, 10.0]), Ok(60.0));
        assert_eq!(lcm(&[4.0, 0.0]), Ok(0.0));
        assert_eq!(lcm(&[1e300, 1e300 + 2f64.powi(950)]).unwrap_err().kind(), "overflow");
    }

    #[test]
    fn isqrt_floors() {
        assert_eq!(isqrt(15.0), Ok(3.0));
        assert_eq!(isqrt(16.0), Ok(4.0));
        assert_eq!(isqrt(0.0), Ok(0.0));
        assert_eq!(isqrt(-4.0).unwrap_err().kind(), "domain error");
    }
}
