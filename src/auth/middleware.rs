//! Authentication Middleware
//! Mission: Resolve bearer tokens into a request principal and gate protected routes
//!
//! Two layers cooperate. `authenticate` never rejects: it attaches a
//! `Principal` when the bearer token is valid and names an active account,
//! and otherwise lets the request through anonymously. `require_principal`
//! then admits allowlisted routes unconditionally and every other route only
//! when a principal is present.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::auth::jwt::JwtHandler;
use crate::auth::models::{Account, CredentialStore, Principal};
use crate::db::StoreResult;
use crate::error::ApiError;

/// Token from an `Authorization: Bearer <token>` header, if any
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
        .filter(|token| !token.is_empty())
}

/// Turns a raw token into the principal it authenticates
pub trait PrincipalResolver: Send + Sync {
    /// `Ok(None)` for anything that should proceed anonymously; `Err` only
    /// when the credential store itself fails.
    fn resolve(&self, token: &str) -> StoreResult<Option<Principal>>;
}

/// Token verifier plus credential store for one account variant
pub struct TokenGate<A: Account> {
    jwt: Arc<JwtHandler<A::Claims>>,
    store: Arc<dyn CredentialStore<A>>,
}

impl<A: Account> TokenGate<A> {
    pub fn new(jwt: Arc<JwtHandler<A::Claims>>, store: Arc<dyn CredentialStore<A>>) -> Self {
        Self { jwt, store }
    }
}

impl<A: Account> PrincipalResolver for TokenGate<A> {
    fn resolve(&self, token: &str) -> StoreResult<Option<Principal>> {
        if !self.jwt.validate_token(token) {
            return Ok(None);
        }

        let login_key = match self.jwt.login_key(token) {
            Ok(key) => key,
            Err(_) => return Ok(None),
        };

        match self.store.find_by_login_key(&login_key)? {
            None => {
                warn!("Valid token for unknown account {}", login_key);
                Ok(None)
            }
            Some(account) if !account.is_active() => {
                warn!("Valid token for inactive account {}", login_key);
                Ok(None)
            }
            Some(account) => Ok(Some(Principal::from_account(&account))),
        }
    }
}

/// Attach the principal for a valid bearer token; never rejects
pub async fn authenticate(
    State(resolver): State<Arc<dyn PrincipalResolver>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(token) = bearer_token(req.headers()) {
        if let Some(principal) = resolver.resolve(&token)? {
            debug!(
                "Authenticated {} ({}) for {}",
                principal.login_key,
                principal.authority,
                req.uri().path()
            );
            req.extensions_mut().insert(principal);
        }
    }

    Ok(next.run(req).await)
}

#[derive(Debug, Clone)]
struct Rule {
    method: Option<Method>,
    pattern: String,
}

impl Rule {
    fn matches(&self, method: &Method, path: &str) -> bool {
        if let Some(m) = &self.method {
            if m != method {
                return false;
            }
        }

        match self.pattern.strip_suffix("/**") {
            Some(prefix) => {
                path == prefix
                    || (path.starts_with(prefix) && path[prefix.len()..].starts_with('/'))
            }
            None => path == self.pattern,
        }
    }
}

/// Routes reachable without a principal.
///
/// A pattern ending in `/**` matches the prefix and everything below it;
/// any other pattern matches the path exactly.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    rules: Vec<Rule>,
}

impl AccessPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn permit(mut self, pattern: &str) -> Self {
        self.rules.push(Rule {
            method: None,
            pattern: pattern.to_string(),
        });
        self
    }

    pub fn permit_method(mut self, method: Method, pattern: &str) -> Self {
        self.rules.push(Rule {
            method: Some(method),
            pattern: pattern.to_string(),
        });
        self
    }

    pub fn is_public(&self, method: &Method, path: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(method, path))
    }
}

/// Reject non-allowlisted requests that carry no principal
pub async fn require_principal(
    State(policy): State<Arc<AccessPolicy>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let admitted = policy.is_public(req.method(), req.uri().path())
        || req.extensions().get::<Principal>().is_some();

    if !admitted {
        warn!(
            "Rejected unauthenticated {} {}",
            req.method(),
            req.uri().path()
        );
        return Err(ApiError::unauthorized("Authentication required"));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::{AdminClaims, ROLE_ADMIN};
    use crate::models::{Admin, AdminRole, AdminStatus};
    use axum::{
        body::Body,
        http::{header, Request as HttpRequest, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
        Router,
    };
    use chrono::Utc;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use tower::ServiceExt;

    const SECRET: &str = "middleware-test-secret-0123456789abcdef";

    #[derive(Default)]
    struct MemoryStore {
        admins: Mutex<HashMap<String, Admin>>,
    }

    impl MemoryStore {
        fn put(&self, id: i64, admin_id: &str, status: AdminStatus) {
            let now = Utc::now();
            self.admins.lock().insert(
                admin_id.to_string(),
                Admin {
                    id,
                    admin_id: admin_id.to_string(),
                    password_hash: String::new(),
                    name: admin_id.to_string(),
                    role: AdminRole::Admin,
                    status,
                    created_at: now,
                    updated_at: now,
                },
            );
        }
    }

    impl CredentialStore<Admin> for MemoryStore {
        fn find_by_login_key(&self, login_key: &str) -> StoreResult<Option<Admin>> {
            Ok(self.admins.lock().get(login_key).cloned())
        }

        fn exists_by_login_key(&self, login_key: &str) -> StoreResult<bool> {
            Ok(self.admins.lock().contains_key(login_key))
        }
    }

    fn gate() -> (Arc<JwtHandler<AdminClaims>>, Arc<MemoryStore>, TokenGate<Admin>) {
        let jwt = Arc::new(JwtHandler::new(SECRET, 60_000).unwrap());
        let store = Arc::new(MemoryStore::default());
        let gate = TokenGate::new(jwt.clone(), store.clone() as Arc<dyn CredentialStore<Admin>>);
        (jwt, store, gate)
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def.ghi")).as_deref(), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers_with("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_gate_resolves_active_account() {
        let (jwt, store, gate) = gate();
        store.put(4, "ops", AdminStatus::Active);

        let token = jwt.generate_token(4, "ops").unwrap();
        let principal = gate.resolve(&token).unwrap().unwrap();
        assert_eq!(principal.id, 4);
        assert_eq!(principal.login_key, "ops");
        assert_eq!(principal.authority, ROLE_ADMIN);
    }

    #[test]
    fn test_gate_is_anonymous_for_bad_or_orphaned_tokens() {
        let (jwt, store, gate) = gate();
        store.put(4, "ops", AdminStatus::Inactive);

        // Garbage token
        assert!(gate.resolve("not.a.token").unwrap().is_none());

        // Expired token
        let expired = jwt.generate_token_at(4, "ops", 1_000_000).unwrap();
        assert!(gate.resolve(&expired).unwrap().is_none());

        // Account deleted after issuance
        let orphan = jwt.generate_token(9, "ghost").unwrap();
        assert!(gate.resolve(&orphan).unwrap().is_none());

        // Account deactivated after issuance
        let inactive = jwt.generate_token(4, "ops").unwrap();
        assert!(gate.resolve(&inactive).unwrap().is_none());
    }

    #[test]
    fn test_access_policy_patterns() {
        let policy = AccessPolicy::new()
            .permit("/api/admin/auth/**")
            .permit("/health")
            .permit_method(Method::POST, "/api/admin/admins");

        assert!(policy.is_public(&Method::POST, "/api/admin/auth/login"));
        assert!(policy.is_public(&Method::GET, "/api/admin/auth"));
        assert!(!policy.is_public(&Method::GET, "/api/admin/authx"));
        assert!(policy.is_public(&Method::GET, "/health"));
        assert!(!policy.is_public(&Method::GET, "/health/deep"));
        assert!(policy.is_public(&Method::POST, "/api/admin/admins"));
        assert!(!policy.is_public(&Method::GET, "/api/admin/admins"));
        assert!(!policy.is_public(&Method::POST, "/api/admin/admins/1"));
    }

    fn app(gate: TokenGate<Admin>) -> Router {
        let resolver: Arc<dyn PrincipalResolver> = Arc::new(gate);
        let policy = Arc::new(AccessPolicy::new().permit("/open"));

        Router::new()
            .route(
                "/open",
                get(|principal: Option<Principal>| async move {
                    principal.map(|p| p.login_key).unwrap_or_else(|| "anonymous".to_string())
                }),
            )
            .route("/closed", get(|principal: Principal| async move { principal.login_key }))
            .layer(from_fn_with_state(policy, require_principal))
            .layer(from_fn_with_state(resolver, authenticate))
    }

    async fn call(app: Router, path: &str, token: Option<&str>) -> (StatusCode, String) {
        let mut builder = HttpRequest::builder().uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_public_route_passes_anonymous_requests() {
        let (_, _, gate) = gate();
        let (status, body) = call(app(gate), "/open", Some("garbage")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
    }

    #[tokio::test]
    async fn test_protected_route_requires_principal() {
        let (jwt, store, gate) = gate();
        store.put(1, "ops", AdminStatus::Active);
        let token = jwt.generate_token(1, "ops").unwrap();
        let app = app(gate);

        let (status, _) = call(app.clone(), "/closed", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(app.clone(), "/closed", Some("garbage")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = call(app.clone(), "/closed", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ops");

        let (status, body) = call(app, "/open", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ops");
    }
}
