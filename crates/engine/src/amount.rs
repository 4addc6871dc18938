use std::{
    cmp::Ordering,
    fmt,
    iter::Sum,
    ops::{Add, AddAssign},
};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary total that may be unknown.
///
/// Converted totals depend on an external exchange rate source. When the
/// source cannot be reached the total is [`Amount::Unknown`] instead of a
/// made-up number, and any sum involving it stays unknown:
///
/// ```rust
/// use engine::Amount;
/// use rust_decimal::Decimal;
///
/// let known = Amount::Known(Decimal::new(6000, 2));
/// assert_eq!(known + Amount::Known(Decimal::ONE), Amount::Known(Decimal::new(6100, 2)));
/// assert_eq!(known + Amount::Unknown, Amount::Unknown);
/// ```
///
/// Serializes as the decimal string, or `null` when unknown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<Decimal>", into = "Option<Decimal>")]
pub enum Amount {
    Known(Decimal),
    Unknown,
}

impl Amount {
    pub const ZERO: Amount = Amount::Known(Decimal::ZERO);

    /// Returns the value if known.
    #[must_use]
    pub const fn known(self) -> Option<Decimal> {
        match self {
            Amount::Known(value) => Some(value),
            Amount::Unknown => None,
        }
    }

    #[must_use]
    pub const fn is_unknown(self) -> bool {
        matches!(self, Amount::Unknown)
    }

    /// Ordering used when sorting by amount: known values by value, unknown
    /// values after every known one.
    pub fn cmp_unknown_last(&self, other: &Amount) -> Ordering {
        match (self, other) {
            (Amount::Known(a), Amount::Known(b)) => a.cmp(b),
            (Amount::Known(_), Amount::Unknown) => Ordering::Less,
            (Amount::Unknown, Amount::Known(_)) => Ordering::Greater,
            (Amount::Unknown, Amount::Unknown) => Ordering::Equal,
        }
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::Known(value)
    }
}

impl From<Option<Decimal>> for Amount {
    fn from(value: Option<Decimal>) -> Self {
        value.map_or(Amount::Unknown, Amount::Known)
    }
}

impl From<Amount> for Option<Decimal> {
    fn from(value: Amount) -> Self {
        value.known()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Known(value) => write!(f, "{value}"),
            Amount::Unknown => f.write_str("unknown"),
        }
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Self::Output {
        match (self, rhs) {
            (Amount::Known(a), Amount::Known(b)) => Amount::Known(a + b),
            _ => Amount::Unknown,
        }
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        *self = *self + rhs;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}
