//! Money columns - amounts are stored as integer minor units (cents).
//!
//! `SQLite` has no exact decimal type, so every amount column is an `i64`
//! count of cents. Models expose it as a [`Decimal`] with a fixed scale of
//! two, and serialize it the same way.

use rust_decimal::{Decimal, prelude::ToPrimitive};

/// Fractional digits kept for every amount
pub const SCALE: u32 = 2;

/// Turns a cents count into its two-decimal amount.
#[must_use]
pub fn from_minor(minor: i64) -> Decimal {
    Decimal::new(minor, SCALE)
}

/// Turns an amount into cents.
///
/// Returns `None` when the amount has more than two fractional digits or
/// does not fit the column.
#[must_use]
pub fn to_minor(amount: Decimal) -> Option<i64> {
    let scaled = amount.checked_mul(Decimal::ONE_HUNDRED)?;
    if !scaled.fract().is_zero() {
        return None;
    }
    scaled.to_i64()
}

/// Serde adapter that presents a cents column as a decimal amount.
pub mod as_decimal {
    use super::{from_minor, to_minor};
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

    /// Writes the cents as a two-decimal amount.
    pub fn serialize<S>(minor: &i64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Serialize::serialize(&from_minor(*minor), serializer)
    }

    /// Reads a decimal amount back into cents.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        to_minor(amount).ok_or_else(|| {
            de::Error::custom(format!("{amount} is not a storable two-decimal amount"))
        })
    }
}
