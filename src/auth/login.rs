//! Credential verification shared by the admin and user login endpoints

use tracing::warn;

use crate::auth::models::{Account, CredentialStore};
use crate::auth::password::PasswordHasher;
use crate::error::ApiError;

/// Look up `login_key` and check the password and account status.
///
/// Unknown key and wrong password fail with the same message; an inactive
/// account fails with a distinct one. Which check failed is only logged.
pub fn authenticate_credentials<A: Account>(
    store: &dyn CredentialStore<A>,
    hasher: &dyn PasswordHasher,
    login_key: &str,
    password: &str,
) -> Result<A, ApiError> {
    let account = match store.find_by_login_key(login_key)? {
        Some(account) => account,
        None => {
            warn!("Login failed - unknown account {}", login_key);
            return Err(ApiError::unauthorized(A::INVALID_CREDENTIALS));
        }
    };

    if !hasher.verify(password, account.password_hash()) {
        warn!("Login failed - password mismatch for {}", login_key);
        return Err(ApiError::unauthorized(A::INVALID_CREDENTIALS));
    }

    if !account.is_active() {
        warn!("Login failed - inactive account {}", login_key);
        return Err(ApiError::unauthorized(A::INACTIVE));
    }

    Ok(account)
}
