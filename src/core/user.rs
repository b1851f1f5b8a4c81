//! Identity context for the ledger core.
//!
//! Every core operation takes a [`CurrentUser`] resolved once per request.
//! Password verification and session storage live outside this crate; the
//! core only records users and checks that an identity was supplied.

use crate::{
    core::non_blank,
    entities::{User, user},
    errors::{Error, Result},
};
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// The user on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CurrentUser {
    /// Id of the owning user
    pub id: i64,
}

impl CurrentUser {
    /// Wraps a resolved user id.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self { id }
    }

    /// Whether a record with `owner_id` belongs to this user.
    #[must_use]
    pub const fn owns(&self, owner_id: i64) -> bool {
        self.id == owner_id
    }
}

/// Records a new user. `password_hash` comes from the credential store.
///
/// Fails with `Conflict` when the username or the phone is already taken.
#[instrument(skip(db, password_hash))]
pub async fn register_user(
    db: &DatabaseConnection,
    name: &str,
    username: &str,
    password_hash: &str,
    phone: &str,
) -> Result<user::Model> {
    let name = non_blank("name", name)?;
    let username = non_blank("username", username)?;
    let phone = non_blank("phone", phone)?;
    if password_hash.is_empty() {
        return Err(Error::validation("password hash cannot be empty"));
    }

    let txn = db.begin().await?;

    if User::find()
        .filter(user::Column::Username.eq(username.as_str()))
        .one(&txn)
        .await?
        .is_some()
    {
        return Err(Error::conflict(format!("username '{username}' is taken")));
    }

    if User::find()
        .filter(user::Column::Phone.eq(phone.as_str()))
        .one(&txn)
        .await?
        .is_some()
    {
        return Err(Error::conflict(format!("phone '{phone}' is already registered")));
    }

    let created = user::ActiveModel {
        name: Set(name),
        username: Set(username),
        password_hash: Set(password_hash.to_string()),
        phone: Set(phone),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!(user_id = created.id, "Registered user");
    Ok(created)
}

/// Looks a user up by login handle.
pub async fn find_user_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Username.eq(username.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Turns the identity attached to a request into a [`CurrentUser`].
///
/// Fails with `Unauthenticated` when no identity is attached or when it
/// points at a user that no longer exists.
pub async fn resolve_current_user(
    db: &DatabaseConnection,
    session_user_id: Option<i64>,
) -> Result<CurrentUser> {
    let id = session_user_id.ok_or(Error::Unauthenticated)?;
    User::find_by_id(id)
        .one(db)
        .await?
        .map(|user| CurrentUser::new(user.id))
        .ok_or(Error::Unauthenticated)
}
