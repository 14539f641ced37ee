// apps/orders_service/src/models/money.rs

//! Integer-cent amounts. Clients send and receive decimal major units
//! (`45.0`); everything inside the service adds and compares whole cents.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
  pub const ZERO: Money = Money(0);

  pub fn from_cents(cents: i64) -> Self {
    Money(cents)
  }

  /// Rounds to the nearest cent. `None` for NaN, infinities and values
  /// beyond the i64 cent range.
  pub fn from_major(units: f64) -> Option<Self> {
    if !units.is_finite() {
      return None;
    }
    let cents = (units * 100.0).round();
    if cents.abs() >= i64::MAX as f64 {
      return None;
    }
    Some(Money(cents as i64))
  }

  pub fn cents(self) -> i64 {
    self.0
  }

  pub fn as_major(self) -> f64 {
    self.0 as f64 / 100.0
  }

  pub fn is_negative(self) -> bool {
    self.0 < 0
  }

  pub fn checked_add(self, rhs: Money) -> Option<Money> {
    self.0.checked_add(rhs.0).map(Money)
  }

  pub fn checked_mul(self, quantity: i64) -> Option<Money> {
    self.0.checked_mul(quantity).map(Money)
  }

  /// Sums `price * quantity` over the lines, `None` once any step leaves the i64 cent range.
  pub fn checked_total<I: IntoIterator<Item = (Money, i64)>>(lines: I) -> Option<Money> {
    lines
      .into_iter()
      .try_fold(Money::ZERO, |acc, (price, quantity)| acc.checked_add(price.checked_mul(quantity)?))
  }
}

impl fmt::Display for Money {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let sign = if self.0 < 0 { "-" } else { "" };
    write!(f, "{}{}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
  }
}

impl Serialize for Money {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(self.as_major())
  }
}

impl<'de> Deserialize<'de> for Money {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let units = f64::deserialize(deserializer)?;
    Money::from_major(units).ok_or_else(|| serde::de::Error::custom(format!("invalid amount {}", units)))
  }
}
