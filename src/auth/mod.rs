//! Authentication Module
//! Mission: Stateless JWT issuance, per-request principal resolution and route gating

pub mod jwt;
pub mod login;
pub mod middleware;
pub mod models;
pub mod password;

pub use jwt::JwtHandler;
pub use login::authenticate_credentials;
pub use middleware::{authenticate, require_principal, AccessPolicy, PrincipalResolver, TokenGate};
pub use models::{Account, AdminClaims, CredentialStore, Principal, UserClaims};
pub use password::{BcryptHasher, PasswordHasher};
