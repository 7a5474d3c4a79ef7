//! Arbitrary precision numbers using dashu
//!
//! `Number` is the expression language's only numeric type. It wraps
//! dashu-float's `DBig` so host decimals cross the bridge without loss;
//! narrowing to `f64` is always an explicit call.

use dashu_float::ops::Abs;
use dashu_float::DBig;
use dashu_int::ops::BitTest;
use dashu_int::IBig;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Error type for number operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumberError {
    #[error("Invalid number format: {0}")]
    ParseError(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Not a finite number: {0}")]
    NonFinite(String),
}

/// Default precision for division (decimal digits)
pub const DEFAULT_PRECISION: u32 = 50;

/// Arbitrary precision decimal number
#[derive(Debug, Clone)]
pub struct Number {
    inner: DBig,
}

impl Number {
    // ========== Construction ==========

    fn with_precision(val: DBig, precision: u32) -> DBig {
        val.with_precision(precision as usize).value()
    }

    /// Literals and host integers get enough working digits that sums
    /// with differently sized operands do not round
    fn with_work_precision(val: DBig) -> DBig {
        let digits = val.precision().max(DEFAULT_PRECISION as usize);
        val.with_precision(digits).value()
    }

    /// Parse a decimal literal: "123", "-4.5", "1.5e10"
    pub fn from_str(s: &str) -> Result<Self, NumberError> {
        let s = s.trim();

        // Scientific notation with an integer mantissa keeps every digit
        if (s.contains('e') || s.contains('E')) && !s.contains('.') {
            let lower = s.to_lowercase();
            if let Some((mantissa, exp)) = lower.split_once('e') {
                let mantissa: IBig = mantissa
                    .parse()
                    .map_err(|_| NumberError::ParseError(s.to_string()))?;
                let exp: isize = exp
                    .parse()
                    .map_err(|_| NumberError::ParseError(s.to_string()))?;
                return Ok(Self { inner: Self::with_work_precision(DBig::from_parts(mantissa, exp)) });
            }
        }

        let inner: DBig = s
            .parse()
            .map_err(|_| NumberError::ParseError(s.to_string()))?;
        Ok(Self { inner: Self::with_work_precision(inner) })
    }

    pub fn from_i64(n: i64) -> Self {
        Self { inner: Self::with_work_precision(DBig::from(n)) }
    }

    pub fn from_u64(n: u64) -> Self {
        Self { inner: Self::with_work_precision(DBig::from(IBig::from(n))) }
    }

    /// Create from f64 using its shortest round-trip decimal form
    pub fn from_f64(f: f64) -> Result<Self, NumberError> {
        if !f.is_finite() {
            return Err(NumberError::NonFinite(f.to_string()));
        }
        Self::from_str(&f.to_string())
    }

    pub fn from_dbig(inner: DBig) -> Self {
        Self { inner }
    }

    pub fn as_dbig(&self) -> &DBig {
        &self.inner
    }

    pub fn into_dbig(self) -> DBig {
        self.inner
    }

    // ========== Predicates ==========

    pub fn is_zero(&self) -> bool {
        self.inner == DBig::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.inner < DBig::ZERO
    }

    pub fn is_integer(&self) -> bool {
        self.inner == self.inner.clone().floor()
    }

    // ========== Arithmetic ==========

    pub fn add(&self, other: &Self) -> Self {
        Self { inner: &self.inner + &other.inner }
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self { inner: &self.inner - &other.inner }
    }

    pub fn mul(&self, other: &Self) -> Self {
        Self { inner: &self.inner * &other.inner }
    }

    /// Division carried out at `precision` decimal digits, at least one.
    /// dashu reads a precision of zero as unlimited, which fails on
    /// non-terminating quotients.
    pub fn checked_div(&self, other: &Self, precision: u32) -> Result<Self, NumberError> {
        if other.is_zero() {
            return Err(NumberError::DivisionByZero);
        }
        let precision = precision.max(1);
        let num = Self::with_precision(self.inner.clone(), precision);
        let den = Self::with_precision(other.inner.clone(), precision);
        Ok(Self { inner: num / den })
    }

    pub fn neg(&self) -> Self {
        Self { inner: -self.inner.clone() }
    }

    pub fn abs(&self) -> Self {
        Self { inner: Abs::abs(self.inner.clone()) }
    }

    pub fn floor(&self) -> Self {
        Self { inner: self.inner.clone().floor() }
    }

    pub fn ceil(&self) -> Self {
        Self { inner: self.inner.clone().ceil() }
    }

    // ========== Narrowing ==========

    /// Exact conversion to i64; `None` for fractions or out-of-range values
    pub fn to_i64(&self) -> Option<i64> {
        if !self.is_integer() {
            return None;
        }

        // DBig stores significand * 10^exponent
        let (significand, exponent) = self.inner.clone().into_repr().into_parts();
        let sig: i64 = significand.try_into().ok()?;

        match exponent {
            0 => Some(sig),
            1..=18 => sig.checked_mul(10_i64.checked_pow(exponent as u32)?),
            -18..=-1 => {
                let divisor = 10_i64.checked_pow((-exponent) as u32)?;
                (sig % divisor == 0).then(|| sig / divisor)
            }
            _ => None,
        }
    }

    /// Lossy conversion to f64; `None` when outside the f64 range
    pub fn to_f64(&self) -> Option<f64> {
        let (significand, exponent) = self.inner.clone().into_repr().into_parts();

        let sig = if significand.bit_len() <= 53 {
            let small: i64 = significand.try_into().ok()?;
            small as f64
        } else {
            // keep the top 53 bits, account for the rest as a power of two
            let extra_bits = significand.bit_len() - 53;
            let shifted: i64 = (&significand >> extra_bits).try_into().ok()?;
            shifted as f64 * 2_f64.powi(extra_bits as i32)
        };

        let result = match exponent {
            0 => sig,
            1..=308 => sig * 10_f64.powi(exponent as i32),
            -308..=-1 => sig / 10_f64.powi((-exponent) as i32),
            _ => return None,
        };

        result.is_finite().then_some(result)
    }
}

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_i64() {
            Some(n) => write!(f, "{}", n),
            None => write!(f, "{}", self.inner),
        }
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.inner.to_string())
    }
}

impl<'de> Deserialize<'de> for Number {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.inner
            .partial_cmp(&other.inner)
            .unwrap_or(std::cmp::Ordering::Equal)
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Self::from_i64(n)
    }
}

impl From<DBig> for Number {
    fn from(inner: DBig) -> Self {
        Self::from_dbig(inner)
    }
}
