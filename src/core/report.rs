//! Report generation business logic.
//!
//! Turns the owner's transactions in a date window into per-category income
//! and expense totals plus net savings. All sums use exact decimal
//! arithmetic. The aggregation itself is a pure function over
//! (transaction, category) pairs; the monthly and yearly entry points only
//! compute the window and load the rows.

use crate::{
    core::{checked_total, transaction::ensure_type_matches, user::CurrentUser},
    entities::{Category, CategoryType, Transaction, category, transaction},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, prelude::*};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Income and expense breakdown for one window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Total of INCOME transactions, keyed by category name
    pub income_by_category: BTreeMap<String, Decimal>,
    /// Total of EXPENSE transactions, keyed by category name
    pub expense_by_category: BTreeMap<String, Decimal>,
    /// Total income minus total expense; negative when overspent
    pub net_savings: Decimal,
}

impl Summary {
    /// Sum of all income in the window.
    pub fn total_income(&self) -> Result<Decimal> {
        total(&self.income_by_category)
    }

    /// Sum of all expenses in the window.
    pub fn total_expense(&self) -> Result<Decimal> {
        total(&self.expense_by_category)
    }
}

fn total(by_category: &BTreeMap<String, Decimal>) -> Result<Decimal> {
    by_category
        .values()
        .try_fold(Decimal::ZERO, |sum, amount| checked_total(sum, *amount))
}

/// Report for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    /// Month number, 1-12
    pub month: u32,
    /// Calendar year
    pub year: i32,
    /// Totals for the month
    #[serde(flatten)]
    pub summary: Summary,
}

/// Report for one calendar year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyReport {
    /// Calendar year
    pub year: i32,
    /// Totals for the year
    #[serde(flatten)]
    pub summary: Summary,
}

/// First and last day of a month, accounting for leap years.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let invalid = || Error::validation(format!("invalid month {year}-{month:02}"));

    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next_month = if month == 12 {
        year.checked_add(1)
            .and_then(|next_year| NaiveDate::from_ymd_opt(next_year, 1, 1))
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let end = next_month
        .and_then(|first| first.pred_opt())
        .ok_or_else(invalid)?;

    Ok((start, end))
}

/// January 1st and December 31st of `year`.
pub fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate)> {
    let invalid = || Error::validation(format!("invalid year {year}"));
    let start = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?;
    let end = NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(invalid)?;
    Ok((start, end))
}

/// Aggregates transactions with their categories. Order of `rows` does not matter.
///
/// Fails with `Invariant` if a transaction is paired with the wrong category
/// or disagrees with its category's type.
pub fn summarize(rows: &[(transaction::Model, category::Model)]) -> Result<Summary> {
    let mut summary = Summary::default();

    for (entry, category) in rows {
        ensure_type_matches(entry, category)?;

        let bucket = match entry.transaction_type {
            CategoryType::Income => &mut summary.income_by_category,
            CategoryType::Expense => &mut summary.expense_by_category,
        };
        let slot = bucket.entry(category.name.clone()).or_default();
        *slot = checked_total(*slot, entry.amount())?;
    }

    let income = summary.total_income()?;
    let expense = summary.total_expense()?;
    summary.net_savings = income.checked_sub(expense).ok_or_else(|| Error::Invariant {
        message: format!("net savings overflowed: {income} - {expense}"),
    })?;
    Ok(summary)
}

async fn load_window(
    db: &DatabaseConnection,
    owner: &CurrentUser,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<(transaction::Model, category::Model)>> {
    let rows = Transaction::find()
        .filter(transaction::Column::OwnerId.eq(owner.id))
        .filter(transaction::Column::Date.between(start, end))
        .order_by_asc(transaction::Column::Id)
        .find_also_related(Category)
        .all(db)
        .await?;

    rows.into_iter()
        .map(|(entry, category)| match category {
            Some(category) => Ok((entry, category)),
            None => Err(Error::Invariant {
                message: format!(
                    "transaction {} references missing category {}",
                    entry.id, entry.category_id
                ),
            }),
        })
        .collect()
}

/// Builds the report for `month` of `year`.
pub async fn monthly_report(
    db: &DatabaseConnection,
    owner: &CurrentUser,
    year: i32,
    month: u32,
) -> Result<MonthlyReport> {
    let (start, end) = month_bounds(year, month)?;
    let rows = load_window(db, owner, start, end).await?;
    debug!(owner_id = owner.id, %start, %end, rows = rows.len(), "Monthly report");

    Ok(MonthlyReport {
        month,
        year,
        summary: summarize(&rows)?,
    })
}

/// Builds the report for the whole of `year`.
pub async fn yearly_report(
    db: &DatabaseConnection,
    owner: &CurrentUser,
    year: i32,
) -> Result<YearlyReport> {
    let (start, end) = year_bounds(year)?;
    let rows = load_window(db, owner, start, end).await?;
    debug!(owner_id = owner.id, year, rows = rows.len(), "Yearly report");

    Ok(YearlyReport {
        year,
        summary: summarize(&rows)?,
    })
}
