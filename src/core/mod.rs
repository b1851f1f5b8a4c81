//! Core business logic - framework-agnostic ledger operations.
//!
//! Each submodule owns one component. Every operation takes the request's
//! [`user::CurrentUser`] explicitly and only ever touches records it owns.

pub mod category;
pub mod goal;
pub mod report;
pub mod transaction;
pub mod user;

use crate::{
    entities::money,
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

/// Today's date in UTC, used for "not in the future" checks and goal status.
#[must_use]
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Trims `value` and rejects it if nothing is left.
pub(crate) fn non_blank(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

/// Money amounts must be positive and carry at most two fractional digits.
///
/// Returns the amount in cents, ready for a money column.
pub(crate) fn validate_amount(field: &str, amount: Decimal) -> Result<i64> {
    if amount <= Decimal::ZERO {
        return Err(Error::validation(format!(
            "{field} must be greater than zero, got {amount}"
        )));
    }
    if amount.normalize().scale() > money::SCALE {
        return Err(Error::validation(format!(
            "{field} cannot have more than two decimal places, got {amount}"
        )));
    }
    money::to_minor(amount)
        .ok_or_else(|| Error::validation(format!("{field} is too large, got {amount}")))
}

/// Adds two money values, failing instead of overflowing.
pub(crate) fn checked_total(left: Decimal, right: Decimal) -> Result<Decimal> {
    left.checked_add(right).ok_or_else(|| Error::Invariant {
        message: format!("money total overflowed adding {right} to {left}"),
    })
}

/// Blank descriptions are stored as absent.
pub(crate) fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
