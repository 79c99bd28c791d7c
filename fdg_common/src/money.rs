use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

pub const INR_CURRENCY_CODE: &str = "INR";
pub const INR_CURRENCY_CODE_LOWER: &str = "inr";

//--------------------------------------       Paise       -----------------------------------------------------------
/// Fixed-point Indian Rupee amount. 100 paise = ₹1. All monetary values in the gateway are carried and stored in
/// paise so that order totals never go through floating point.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Paise(i64);

impl Add for Paise {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Paise {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Paise {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Paise {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Mul<i64> for Paise {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Paise {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in paise: {0}")]
pub struct PaiseConversionError(String);

impl From<i64> for Paise {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Paise {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Paise {}

impl TryFrom<u64> for Paise {
    type Error = PaiseConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(PaiseConversionError(format!("Value {value} is too large to convert to Paise")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Paise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rupees = self.0 as f64 / 100.0;
        write!(f, "₹{rupees:0.2}")
    }
}

impl Paise {
    pub fn from_rupees(rupees: i64) -> Self {
        Self(rupees * 100)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Scales the amount by the given number of basis points, rounding to the nearest paisa.
    /// 10,000 bps = 100%, so a 5% tax on an amount is `amount.basis_points(500)`.
    pub fn basis_points(&self, bps: i64) -> Self {
        let scaled = (self.0 as i128 * bps as i128 + 5_000) / 10_000;
        #[allow(clippy::cast_possible_truncation)]
        Self(scaled as i64)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = Paise::from_rupees(400);
        let b = Paise::from(2_500);
        assert_eq!(a + b, Paise::from(42_500));
        assert_eq!(a - b, Paise::from(37_500));
        assert_eq!(-b, Paise::from(-2_500));
        assert_eq!(b * 4, Paise::from_rupees(100));
        let total: Paise = [a, b, b].into_iter().sum();
        assert_eq!(total, Paise::from(45_000));
    }

    #[test]
    fn tax_scaling() {
        // 5% of ₹400 is ₹20
        assert_eq!(Paise::from_rupees(400).basis_points(500), Paise::from_rupees(20));
        // rounding: 5% of ₹0.30 (30 paise) is 1.5 paise, rounds to 2
        assert_eq!(Paise::from(30).basis_points(500), Paise::from(2));
        assert_eq!(Paise::default().basis_points(500), Paise::default());
    }

    #[test]
    fn display_format() {
        assert_eq!(Paise::from(12_345).to_string(), "₹123.45");
        assert_eq!(Paise::from_rupees(50).to_string(), "₹50.00");
    }
}
