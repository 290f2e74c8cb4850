//! JWT Token Handler
//! Mission: Generate and validate HS256 tokens binding an account id and login key

use anyhow::{bail, Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use tracing::debug;

/// Shortest accepted signing secret (HS256 key size)
pub const MIN_SECRET_LEN: usize = 32;

/// Claim set carried by a token: subject id, login key, iat and exp (seconds)
pub trait TokenClaims: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn issue(subject: String, login_key: String, issued_at: i64, expires_at: i64) -> Self;
    fn subject(&self) -> &str;
    fn login_key(&self) -> &str;
    fn expires_at(&self) -> i64;
}

/// JWT Handler for token operations over one claim shape
pub struct JwtHandler<C> {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiration_ms: i64,
    _claims: PhantomData<fn() -> C>,
}

impl<C: TokenClaims> JwtHandler<C> {
    /// Create a handler. A short secret or non-positive lifetime is a
    /// configuration error.
    pub fn new(secret: &str, expiration_ms: i64) -> Result<Self> {
        if secret.len() < MIN_SECRET_LEN {
            bail!(
                "JWT secret must be at least {} bytes (got {})",
                MIN_SECRET_LEN,
                secret.len()
            );
        }
        if expiration_ms <= 0 {
            bail!("JWT expiration must be positive (got {} ms)", expiration_ms);
        }

        // Expiry is checked against milliseconds in validate_token_at
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiration_ms,
            _claims: PhantomData,
        })
    }

    pub fn expiration_ms(&self) -> i64 {
        self.expiration_ms
    }

    /// Issue a token for `id` / `login_key`, valid from now
    pub fn generate_token(&self, id: i64, login_key: &str) -> Result<String> {
        self.generate_token_at(id, login_key, Utc::now().timestamp_millis())
    }

    /// Issue a token as if the current time were `now_ms`.
    ///
    /// `exp` is floored to whole seconds, so the token never outlives
    /// `now_ms + expiration_ms`.
    pub fn generate_token_at(&self, id: i64, login_key: &str, now_ms: i64) -> Result<String> {
        let issued_at = now_ms.div_euclid(1000);
        let expires_at = (now_ms + self.expiration_ms).div_euclid(1000);
        let claims = C::issue(id.to_string(), login_key.to_string(), issued_at, expires_at);

        debug!(
            "Generating JWT for {} ({}), expires in {}ms",
            login_key, id, self.expiration_ms
        );

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to generate JWT")
    }

    /// True iff the signature verifies and the token has not expired.
    /// Never fails: every parse/signature problem is `false`.
    pub fn validate_token(&self, token: &str) -> bool {
        self.validate_token_at(token, Utc::now().timestamp_millis())
    }

    pub fn validate_token_at(&self, token: &str, now_ms: i64) -> bool {
        match self.claims(token) {
            Ok(claims) => {
                let valid = now_ms < claims.expires_at().saturating_mul(1000);
                if !valid {
                    debug!("Rejected expired JWT for {}", claims.login_key());
                }
                valid
            }
            Err(e) => {
                debug!("Rejected JWT: {:#}", e);
                false
            }
        }
    }

    /// Account id bound to the token. Signature is checked, expiry is not.
    pub fn subject(&self, token: &str) -> Result<i64> {
        let claims = self.claims(token)?;
        claims
            .subject()
            .parse::<i64>()
            .with_context(|| format!("Invalid subject claim: {}", claims.subject()))
    }

    /// Login key bound to the token. Signature is checked, expiry is not.
    pub fn login_key(&self, token: &str) -> Result<String> {
        Ok(self.claims(token)?.login_key().to_string())
    }

    fn claims(&self, token: &str) -> Result<C> {
        let decoded = decode::<C>(token, &self.decoding_key, &self.validation)
            .context("Invalid token")?;
        Ok(decoded.claims)
    }
}
