//! Authentication Models
//! Mission: Account capabilities, token claims and the request principal

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};

use crate::auth::jwt::TokenClaims;
use crate::db::StoreResult;
use crate::error::ApiError;
use crate::models::{Admin, AdminRole, AdminStatus, User, UserStatus};

pub const ROLE_SUPER_ADMIN: &str = "ROLE_SUPER_ADMIN";
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";
pub const ROLE_USER: &str = "ROLE_USER";

/// What authentication needs from a persisted account.
///
/// Implemented by `Admin` (login key = admin id) and `User` (login key =
/// email); each service's gate and login flow is instantiated for one of
/// them.
pub trait Account: Send + Sync + 'static {
    type Claims: TokenClaims;

    /// Returned for both unknown login key and wrong password
    const INVALID_CREDENTIALS: &'static str;
    const INACTIVE: &'static str;

    fn id(&self) -> i64;
    fn login_key(&self) -> &str;
    fn password_hash(&self) -> &str;
    fn is_active(&self) -> bool;
    fn authority(&self) -> &'static str;
}

/// Lookup side of an account table
pub trait CredentialStore<A: Account>: Send + Sync {
    fn find_by_login_key(&self, login_key: &str) -> StoreResult<Option<A>>;
    fn exists_by_login_key(&self, login_key: &str) -> StoreResult<bool>;
}

/// Admin token payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    #[serde(rename = "adminId")]
    pub admin_id: String,
    pub iat: i64,
    pub exp: i64,
}

impl TokenClaims for AdminClaims {
    fn issue(sub: String, admin_id: String, iat: i64, exp: i64) -> Self {
        Self { sub, admin_id, iat, exp }
    }

    fn subject(&self) -> &str {
        &self.sub
    }

    fn login_key(&self) -> &str {
        &self.admin_id
    }

    fn expires_at(&self) -> i64 {
        self.exp
    }
}

/// End-user token payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

impl TokenClaims for UserClaims {
    fn issue(sub: String, email: String, iat: i64, exp: i64) -> Self {
        Self { sub, email, iat, exp }
    }

    fn subject(&self) -> &str {
        &self.sub
    }

    fn login_key(&self) -> &str {
        &self.email
    }

    fn expires_at(&self) -> i64 {
        self.exp
    }
}

impl Account for Admin {
    type Claims = AdminClaims;

    const INVALID_CREDENTIALS: &'static str = "Invalid admin ID or password";
    const INACTIVE: &'static str = "Admin account is inactive";

    fn id(&self) -> i64 {
        self.id
    }

    fn login_key(&self) -> &str {
        &self.admin_id
    }

    fn password_hash(&self) -> &str {
        &self.password_hash
    }

    fn is_active(&self) -> bool {
        self.status == AdminStatus::Active
    }

    fn authority(&self) -> &'static str {
        match self.role {
            AdminRole::SuperAdmin => ROLE_SUPER_ADMIN,
            AdminRole::Admin => ROLE_ADMIN,
        }
    }
}

impl Account for User {
    type Claims = UserClaims;

    const INVALID_CREDENTIALS: &'static str = "Invalid email or password";
    const INACTIVE: &'static str = "Account is inactive";

    fn id(&self) -> i64 {
        self.id
    }

    fn login_key(&self) -> &str {
        &self.email
    }

    fn password_hash(&self) -> &str {
        &self.password_hash
    }

    fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    fn authority(&self) -> &'static str {
        ROLE_USER
    }
}

/// Authenticated identity of the current request.
///
/// Attached to the request extensions by the gate; handlers take it as an
/// extractor (`Principal` to require it, `Option<Principal>` otherwise).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub login_key: String,
    pub authority: String,
}

impl Principal {
    pub fn from_account<A: Account>(account: &A) -> Self {
        Self {
            id: account.id(),
            login_key: account.login_key().to_string(),
            authority: account.authority().to_string(),
        }
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authority == authority
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}
