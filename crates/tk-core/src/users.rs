//! User registration and identity resolution.

use chrono::{DateTime, Utc};

use crate::error::{Error, Result, StoreError};
use crate::model::User;
use crate::repository::{Repositories, Store};
use crate::types::{self, UserId, ValidationError, require_text};

const NOT_CONNECTED: &str = "You are not connected";

/// Input for registering a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

fn validate_email(email: &str) -> Result<String, ValidationError> {
    let email = require_text(email, "email")?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(ValidationError::InvalidEmail { value: email }),
    }
}

/// Registers a user created at `now`.
pub fn create_user_at<R: Repositories>(
    repos: &R,
    input: &NewUser,
    now: DateTime<Utc>,
) -> Result<User> {
    let username = require_text(&input.username, "username")?;
    let email = validate_email(&input.email)?;

    if repos.username_exists(&username)? {
        return Err(ValidationError::UsernameTaken.into());
    }
    if repos.email_exists(&email)? {
        return Err(ValidationError::EmailTaken.into());
    }

    let user = User {
        id: UserId::generate(),
        username,
        email,
        first_name: input.first_name.clone().unwrap_or_default(),
        last_name: input.last_name.clone().unwrap_or_default(),
        created_at: now,
    };
    repos.insert_user(&user).map_err(duplicate_user)?;
    Ok(user)
}

/// Maps a rejected user insert to the field that collided, by constraint name.
fn duplicate_user(err: StoreError) -> Error {
    let StoreError::Conflict(constraint) = &err else {
        return err.into();
    };
    let taken = if constraint.contains("users.email") {
        ValidationError::EmailTaken
    } else if constraint.contains("users.username") {
        ValidationError::UsernameTaken
    } else {
        ValidationError::UserExists
    };
    taken.into()
}

/// Registers a user.
pub fn create_user<S: Store>(store: &mut S, input: &NewUser) -> Result<User> {
    let user = store.atomically(|repos| create_user_at(repos, input, types::now()))?;
    tracing::info!(user_id = %user.id, username = %user.username, "user created");
    Ok(user)
}

/// Looks up the acting user by username.
pub fn resolve_user<S: Store>(store: &S, username: &str) -> Result<User> {
    store
        .user_by_username(username.trim())?
        .ok_or_else(|| Error::not_found("User", username))
}

/// Resolves the acting user. A missing or blank username is unauthorized.
pub fn acting_user<S: Store>(store: &S, username: Option<&str>) -> Result<User> {
    let name = username
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| Error::Unauthorized(NOT_CONNECTED.to_string()))?;
    resolve_user(store, name)
}
