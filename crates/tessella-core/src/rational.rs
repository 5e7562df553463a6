//! Exact rational arithmetic for timing math.
//!
//! Durations, framerates and stretch factors are held as reduced `i128`
//! fractions, so repetition candidates compare exactly.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Maximum number of fractional decimal digits kept by [`Rational::from_f64`].
pub const MAX_DECIMAL_DIGITS: usize = 9;

/// A reduced fraction with a strictly positive denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rational {
    num: i128,
    den: i128,
}

fn gcd(a: i128, b: i128) -> i128 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a as i128
}

impl Rational {
    pub const ZERO: Rational = Rational { num: 0, den: 1 };
    pub const ONE: Rational = Rational { num: 1, den: 1 };

    /// Create a reduced fraction.
    ///
    /// # Panics
    /// Panics if `den` is zero.
    pub fn new(num: i128, den: i128) -> Self {
        assert!(den != 0, "rational denominator must be non-zero");
        let sign = if den < 0 { -1 } else { 1 };
        let g = gcd(num, den).max(1);
        Self {
            num: sign * num / g,
            den: sign * den / g,
        }
    }

    /// Create a reduced fraction, or `None` when `den` is zero.
    pub fn try_new(num: i128, den: i128) -> Option<Self> {
        (den != 0).then(|| Self::new(num, den))
    }

    pub fn from_integer(value: i128) -> Self {
        Self { num: value, den: 1 }
    }

    /// Convert a real value through its shortest decimal representation,
    /// so `29.97` becomes exactly `2997/100`. Values with more than
    /// [`MAX_DECIMAL_DIGITS`] fractional digits are rounded to that precision.
    /// Returns `None` for non-finite or out-of-range values.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let text = value.to_string();
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.as_str()),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));

        let parsed = if frac_part.len() <= MAX_DECIMAL_DIGITS {
            let den = 10i128.checked_pow(frac_part.len() as u32)?;
            let int: i128 = int_part.parse().ok()?;
            let frac: i128 = if frac_part.is_empty() {
                0
            } else {
                frac_part.parse().ok()?
            };
            Self::new(int.checked_mul(den)?.checked_add(frac)?, den)
        } else {
            let den = 10i128.pow(MAX_DECIMAL_DIGITS as u32);
            let scaled = (value.abs() * den as f64).round();
            if scaled >= i128::MAX as f64 {
                return None;
            }
            Self::new(scaled as i128, den)
        };

        Some(if negative { -parsed } else { parsed })
    }

    pub fn numer(&self) -> i128 {
        self.num
    }

    pub fn denom(&self) -> i128 {
        self.den
    }

    pub fn is_positive(&self) -> bool {
        self.num > 0
    }

    pub fn is_zero(&self) -> bool {
        self.num == 0
    }

    pub fn abs(self) -> Self {
        Self {
            num: self.num.abs(),
            den: self.den,
        }
    }

    /// The reciprocal, or `None` for zero.
    pub fn recip(self) -> Option<Self> {
        Self::try_new(self.den, self.num)
    }

    /// Division that reports a zero divisor instead of panicking.
    pub fn checked_div(self, rhs: Rational) -> Option<Self> {
        rhs.recip().map(|inv| self * inv)
    }

    /// Largest integer less than or equal to the value.
    pub fn floor(&self) -> i128 {
        self.num.div_euclid(self.den)
    }

    /// Smallest integer greater than or equal to the value.
    pub fn ceil(&self) -> i128 {
        -(-self.num).div_euclid(self.den)
    }

    /// Nearest integer, ties resolved to the even neighbour.
    pub fn round_half_even(&self) -> i128 {
        let floor = self.floor();
        let twice_rem = 2 * self.num.rem_euclid(self.den);
        match twice_rem.cmp(&self.den) {
            Ordering::Less => floor,
            Ordering::Greater => floor + 1,
            Ordering::Equal => {
                if floor.rem_euclid(2) == 0 {
                    floor
                } else {
                    floor + 1
                }
            }
        }
    }

    /// Euclidean remainder against another rational; always non-negative
    /// for a positive modulus.
    pub fn rem_euclid(self, modulus: Rational) -> Rational {
        let quotient = match self.checked_div(modulus) {
            Some(q) => q.floor(),
            None => return self,
        };
        self - modulus * Rational::from_integer(quotient)
    }

    pub fn to_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

impl Default for Rational {
    fn default() -> Self {
        Rational::ZERO
    }
}

impl From<u32> for Rational {
    fn from(value: u32) -> Self {
        Rational::from_integer(value as i128)
    }
}

impl From<u64> for Rational {
    fn from(value: u64) -> Self {
        Rational::from_integer(value as i128)
    }
}

impl Add for Rational {
    type Output = Rational;
    fn add(self, rhs: Rational) -> Rational {
        let g = gcd(self.den, rhs.den).max(1);
        let lhs_scale = rhs.den / g;
        let rhs_scale = self.den / g;
        Rational::new(
            self.num * lhs_scale + rhs.num * rhs_scale,
            self.den * lhs_scale,
        )
    }
}

impl Sub for Rational {
    type Output = Rational;
    fn sub(self, rhs: Rational) -> Rational {
        self + (-rhs)
    }
}

impl Neg for Rational {
    type Output = Rational;
    fn neg(self) -> Rational {
        Rational {
            num: -self.num,
            den: self.den,
        }
    }
}

impl Mul for Rational {
    type Output = Rational;
    fn mul(self, rhs: Rational) -> Rational {
        // Cross-cancel first so intermediates stay small.
        let g1 = gcd(self.num, rhs.den).max(1);
        let g2 = gcd(rhs.num, self.den).max(1);
        Rational::new(
            (self.num / g1) * (rhs.num / g2),
            (self.den / g2) * (rhs.den / g1),
        )
    }
}

impl Div for Rational {
    type Output = Rational;

    /// # Panics
    /// Panics on division by zero, like integer division.
    fn div(self, rhs: Rational) -> Rational {
        assert!(!rhs.is_zero(), "rational division by zero");
        self * Rational::new(rhs.den, rhs.num)
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        (*self - *other).num.cmp(&0)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}
