use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    dto::RegisterRequest,
    password::{hash_password, verify_password},
    repo_types::{NewUser, User},
};
use crate::{
    error::AppError,
    store::Store,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid");
    }
    EMAIL_RE.is_match(email)
}

/// Create a user. Only the Argon2 digest of the password is persisted.
pub async fn register(store: &dyn Store, payload: RegisterRequest) -> Result<User, AppError> {
    let username = payload.username.unwrap_or_default().trim().to_string();
    let email = payload.email.unwrap_or_default().trim().to_string();
    let password = payload.password.unwrap_or_default();

    if username.is_empty() || email.is_empty() || password.is_empty() {
        return Err(AppError::InvalidInput(
            "Missing username, email, or password".into(),
        ));
    }
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(AppError::InvalidInput("Invalid email".into()));
    }

    let password_hash =
        hash_password(&password).map_err(|e| AppError::internal("Error registering user", e))?;

    // Uniqueness of username/email is decided by the store, not by a lookup here.
    let user = store
        .insert_user(NewUser {
            username,
            email,
            password_hash,
        })
        .await
        .map_err(|e| {
            warn!(error = %e, "user registration rejected");
            AppError::from_repo(e, "Error registering user")
        })?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Resolve `login` (username or email) and check the password.
///
/// Unknown user and wrong password produce the same error.
pub async fn authenticate(store: &dyn Store, login: &str, password: &str) -> Result<i64, AppError> {
    let invalid = || AppError::Unauthorized("Invalid credentials".into());

    let Some(user) = store.find_user_by_login(login).await? else {
        warn!(%login, "login unknown user");
        return Err(invalid());
    };

    let ok = verify_password(password, &user.password_hash)
        .map_err(|e| AppError::internal("Error verifying credentials", e))?;
    if !ok {
        warn!(user_id = user.id, "login invalid password");
        return Err(invalid());
    }

    info!(user_id = user.id, "user logged in");
    Ok(user.id)
}

/// Resolve a token subject to a stored user. A subject whose row is gone is
/// treated like a bad token.
pub async fn current_user(store: &dyn Store, user_id: i64) -> Result<User, AppError> {
    store.find_user(user_id).await?.ok_or_else(|| {
        warn!(user_id, "token subject has no user");
        AppError::Unauthorized("User no longer exists".into())
    })
}
