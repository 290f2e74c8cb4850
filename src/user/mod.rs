//! User-facing authentication service
//! Mission: Registration, login, availability checks and the caller's own profile

pub mod auth;
pub mod profile;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::auth::{
    authenticate, require_principal, AccessPolicy, JwtHandler, PasswordHasher, PrincipalResolver,
    TokenGate, UserClaims,
};
use crate::db::Database;
use crate::middleware::log_requests;
use crate::models::User;
use crate::server::health;
use crate::store::UserStore;

#[derive(Clone)]
pub struct UserState {
    pub users: UserStore,
    pub jwt: Arc<JwtHandler<UserClaims>>,
    pub hasher: Arc<dyn PasswordHasher>,
}

impl UserState {
    pub fn new(
        db: Database,
        jwt: Arc<JwtHandler<UserClaims>>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            users: UserStore::new(db),
            jwt,
            hasher,
        }
    }
}

/// Routes reachable without a user token
pub fn access_policy() -> AccessPolicy {
    AccessPolicy::new()
        .permit("/api/auth/**")
        .permit("/health")
}

pub fn router(state: UserState) -> Router {
    let resolver: Arc<dyn PrincipalResolver> = Arc::new(TokenGate::<User>::new(
        state.jwt.clone(),
        Arc::new(state.users.clone()),
    ));
    let policy = Arc::new(access_policy());

    Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(auth::post_register))
        .route("/api/auth/login", post(auth::post_login))
        .route("/api/auth/check-email", get(auth::get_check_email))
        .route("/api/auth/check-nickname", get(auth::get_check_nickname))
        .route("/api/users/me", get(profile::get_me).put(profile::put_me))
        .with_state(state)
        .layer(from_fn_with_state(policy, require_principal))
        .layer(from_fn_with_state(resolver, authenticate))
        .layer(from_fn_with_state("user", log_requests))
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    #[test]
    fn test_access_policy_allowlist() {
        let policy = access_policy();

        assert!(policy.is_public(&Method::POST, "/api/auth/register"));
        assert!(policy.is_public(&Method::GET, "/api/auth/check-email"));
        assert!(policy.is_public(&Method::GET, "/health"));
        assert!(!policy.is_public(&Method::GET, "/api/users/me"));
        assert!(!policy.is_public(&Method::GET, "/api-docs/openapi.json"));
        assert!(!policy.is_public(&Method::POST, "/api/admin/auth/login"));
    }
}
