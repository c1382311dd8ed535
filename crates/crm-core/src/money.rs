//! Fixed-point monetary amounts, `decimal(9,2)`.

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Digits after the decimal point.
pub const SCALE: u32 = 2;
/// Total significant digits.
pub const PRECISION: u32 = 9;

/// A non-negative amount with at most [`PRECISION`] digits, [`SCALE`] of
/// them fractional. Always held at exactly two fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
  pub const ZERO: Self = Self(Decimal::from_parts(0, 0, 0, false, SCALE));

  pub fn new(value: Decimal) -> Result<Self> {
    if value < Decimal::ZERO {
      return Err(Error::Validation(format!("amount {value} is negative")));
    }

    let mut value = value.normalize();
    if value.scale() > SCALE {
      return Err(Error::Validation(format!(
        "amount {value} has more than {SCALE} fractional digits"
      )));
    }
    value.rescale(SCALE);

    // 10^(PRECISION - SCALE): the first value needing a tenth digit.
    let limit = Decimal::from(10_i64.pow(PRECISION - SCALE));
    if value >= limit {
      return Err(Error::Validation(format!(
        "amount {value} does not fit decimal({PRECISION},{SCALE})"
      )));
    }

    Ok(Self(value))
  }

  pub fn value(self) -> Decimal { self.0 }

  /// `self - other`, or `None` if the result would be negative.
  pub fn checked_sub(self, other: Self) -> Option<Self> {
    let diff = self.0 - other.0;
    (diff >= Decimal::ZERO).then_some(Self(diff))
  }
}

impl TryFrom<Decimal> for Amount {
  type Error = Error;

  fn try_from(value: Decimal) -> Result<Self> { Self::new(value) }
}

impl From<Amount> for Decimal {
  fn from(amount: Amount) -> Self { amount.0 }
}

impl FromStr for Amount {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let value = Decimal::from_str(s.trim())
      .map_err(|e| Error::Validation(format!("invalid amount {s:?}: {e}")))?;
    Self::new(value)
  }
}

impl fmt::Display for Amount {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(&self.0, f) }
}
