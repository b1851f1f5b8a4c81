//! Savings goal business logic.
//!
//! A goal's progress is the owner's net savings (income minus expenses) inside
//! the goal's window `[start_date, target_date]`, floored at zero. Status is
//! never set by the caller. Every read recomputes it with [`evaluate_progress`]
//! and [`reconcile_status`] writes it back only when it changed.

use crate::{
    core::{checked_total, non_blank, today, user::CurrentUser, validate_amount},
    entities::{
        CategoryType, GoalStatus, SavingsGoal, Transaction, savings_goal, transaction,
    },
    errors::{Error, Result},
};
use chrono::NaiveDate;
use rust_decimal::RoundingStrategy;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{debug, info, instrument};

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Figures derived from the transactions in a goal's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Net savings in the window, never negative
    pub current_progress: Decimal,
    /// What is still missing to reach the target, never negative
    pub remaining_amount: Decimal,
    /// Share of the target reached, 0-100 with two decimals
    pub progress_percentage: Decimal,
    /// Status implied by the figures above
    pub status: GoalStatus,
}

/// A goal together with its freshly computed progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    /// The stored goal, with its status already reconciled
    #[serde(flatten)]
    pub goal: savings_goal::Model,
    /// Net savings in the window
    pub current_progress: Decimal,
    /// Amount still missing
    pub remaining_amount: Decimal,
    /// Share of the target reached
    pub progress_percentage: Decimal,
}

/// Computes progress and status for `goal` as of `today`.
///
/// Only transactions dated inside the goal's window count. Status rules, first
/// match wins: `Completed` once the target is reached, `Overdue` once the
/// target date has passed, and `InProgress` otherwise.
///
/// Fails with `Invariant` if the sums overflow.
pub fn evaluate_progress(
    goal: &savings_goal::Model,
    transactions: &[transaction::Model],
    today: NaiveDate,
) -> Result<Progress> {
    let (income, expense) = transactions
        .iter()
        .filter(|entry| entry.date >= goal.start_date && entry.date <= goal.target_date)
        .try_fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(income, expense), entry| -> Result<_> {
                Ok(match entry.transaction_type {
                    CategoryType::Income => (checked_total(income, entry.amount())?, expense),
                    CategoryType::Expense => (income, checked_total(expense, entry.amount())?),
                })
            },
        )?;

    let overflow = || Error::Invariant {
        message: format!("progress of goal {} overflowed", goal.id),
    };
    let target_amount = goal.target_amount();

    let current_progress = income
        .checked_sub(expense)
        .ok_or_else(overflow)?
        .max(Decimal::ZERO);
    let remaining_amount = (target_amount - current_progress).max(Decimal::ZERO);

    let progress_percentage = if target_amount <= Decimal::ZERO {
        Decimal::ZERO
    } else if current_progress >= target_amount {
        ONE_HUNDRED
    } else {
        current_progress
            .checked_mul(ONE_HUNDRED)
            .and_then(|scaled| scaled.checked_div(target_amount))
            .ok_or_else(overflow)?
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .min(ONE_HUNDRED)
    };

    let status = if current_progress >= target_amount {
        GoalStatus::Completed
    } else if today > goal.target_date {
        GoalStatus::Overdue
    } else {
        GoalStatus::InProgress
    };

    Ok(Progress {
        current_progress,
        remaining_amount,
        progress_percentage,
        status,
    })
}

/// Persists `status` on `goal` if it differs from what is stored.
pub async fn reconcile_status<C>(
    db: &C,
    goal: savings_goal::Model,
    status: GoalStatus,
) -> Result<savings_goal::Model>
where
    C: ConnectionTrait,
{
    if goal.status == status {
        return Ok(goal);
    }

    let goal_id = goal.id;
    let previous = goal.status;
    let mut active: savings_goal::ActiveModel = goal.into();
    active.status = Set(status);
    let updated = active.update(db).await?;

    info!(goal_id, ?previous, current = ?status, "Goal status changed");
    Ok(updated)
}

async fn load_owned<C>(db: &C, owner: &CurrentUser, goal_id: i64) -> Result<savings_goal::Model>
where
    C: ConnectionTrait,
{
    let found = SavingsGoal::find_by_id(goal_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("savings goal", goal_id))?;

    if !owner.owns(found.owner_id) {
        return Err(Error::Forbidden {
            entity: "savings goal",
            id: goal_id,
        });
    }
    Ok(found)
}

/// Recomputes a goal from the ledger and writes back a changed status.
async fn refresh<C>(db: &C, goal: savings_goal::Model, today: NaiveDate) -> Result<GoalProgress>
where
    C: ConnectionTrait,
{
    let window = Transaction::find()
        .filter(transaction::Column::OwnerId.eq(goal.owner_id))
        .filter(transaction::Column::Date.between(goal.start_date, goal.target_date))
        .all(db)
        .await?;

    let progress = evaluate_progress(&goal, &window, today)?;
    let goal = reconcile_status(db, goal, progress.status).await?;

    Ok(GoalProgress {
        goal,
        current_progress: progress.current_progress,
        remaining_amount: progress.remaining_amount,
        progress_percentage: progress.progress_percentage,
    })
}

/// Creates a savings goal. `start_date` defaults to today.
///
/// The target date must be in the future and after the start date. The goal
/// starts `InProgress` and is evaluated once right after it is stored.
#[instrument(skip(db))]
pub async fn create_goal(
    db: &DatabaseConnection,
    owner: &CurrentUser,
    name: &str,
    target_amount: Decimal,
    target_date: NaiveDate,
    start_date: Option<NaiveDate>,
) -> Result<GoalProgress> {
    let name = non_blank("goal name", name)?;
    let target_amount = validate_amount("target amount", target_amount)?;

    let today = today();
    let start_date = start_date.unwrap_or(today);
    if target_date <= today {
        return Err(Error::validation(format!(
            "target date {target_date} must be in the future"
        )));
    }
    if target_date <= start_date {
        return Err(Error::validation(format!(
            "target date {target_date} must be after start date {start_date}"
        )));
    }

    let txn = db.begin().await?;

    let created = savings_goal::ActiveModel {
        name: Set(name),
        target_amount_minor: Set(target_amount),
        target_date: Set(target_date),
        start_date: Set(start_date),
        status: Set(GoalStatus::InProgress),
        owner_id: Set(owner.id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    info!(goal_id = created.id, "Created savings goal");

    let progress = refresh(&txn, created, today).await?;

    txn.commit().await?;
    Ok(progress)
}

/// Fetches one of the owner's goals with up-to-date progress.
pub async fn get_goal(
    db: &DatabaseConnection,
    owner: &CurrentUser,
    goal_id: i64,
) -> Result<GoalProgress> {
    let txn = db.begin().await?;

    let goal = load_owned(&txn, owner, goal_id).await?;
    let progress = refresh(&txn, goal, today()).await?;

    txn.commit().await?;
    Ok(progress)
}

/// All of the owner's goals with up-to-date progress.
pub async fn list_goals(db: &DatabaseConnection, owner: &CurrentUser) -> Result<Vec<GoalProgress>> {
    let today = today();
    let txn = db.begin().await?;

    let goals = SavingsGoal::find()
        .filter(savings_goal::Column::OwnerId.eq(owner.id))
        .order_by_asc(savings_goal::Column::Id)
        .all(&txn)
        .await?;

    let mut refreshed = Vec::with_capacity(goals.len());
    for goal in goals {
        refreshed.push(refresh(&txn, goal, today).await?);
    }

    txn.commit().await?;
    debug!(owner_id = owner.id, count = refreshed.len(), "Listed goals");
    Ok(refreshed)
}

/// Changes a goal's target amount and target date.
///
/// Status is not touched here; the next read recomputes it.
#[instrument(skip(db))]
pub async fn update_goal(
    db: &DatabaseConnection,
    owner: &CurrentUser,
    goal_id: i64,
    target_amount: Decimal,
    target_date: NaiveDate,
) -> Result<savings_goal::Model> {
    let target_amount = validate_amount("target amount", target_amount)?;

    let txn = db.begin().await?;

    let existing = load_owned(&txn, owner, goal_id).await?;
    if target_date <= existing.start_date {
        return Err(Error::validation(format!(
            "target date {target_date} must be after start date {}",
            existing.start_date
        )));
    }

    let mut active: savings_goal::ActiveModel = existing.into();
    active.target_amount_minor = Set(target_amount);
    active.target_date = Set(target_date);
    let updated = active.update(&txn).await?;

    txn.commit().await?;
    info!(goal_id, "Updated savings goal");
    Ok(updated)
}

/// Permanently removes one of the owner's goals.
#[instrument(skip(db))]
pub async fn delete_goal(db: &DatabaseConnection, owner: &CurrentUser, goal_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let existing = load_owned(&txn, owner, goal_id).await?;
    existing.delete(&txn).await?;

    txn.commit().await?;
    debug!(goal_id, "Deleted savings goal");
    Ok(())
}
