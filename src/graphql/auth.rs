//! GraphQL authentication: JWT issue/verify and the resolver-side gate
//!
//! The transport layer resolves a bearer token into a [`CurrentUser`] and
//! injects it as request data; a missing or malformed token yields an
//! anonymous context, never a transport error. The failure only happens
//! later, at [`AuthExt::current_user`] inside mutations that require it —
//! the single authorization check in the system.

use async_graphql::{Context, ErrorExtensions, Result};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::errors::CatalogError;

/// Token lifetime: one hour
pub const TOKEN_LIFETIME_SECS: i64 = 60 * 60;

/// Authenticated user resolved from the store, available in resolvers
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
    pub favorite_genre: Option<String>,
}

/// Claims embedded in issued tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id
    pub id: String,
    pub username: String,
    /// Expiration timestamp
    pub exp: i64,
}

/// Sign a token for a user, expiring in [`TOKEN_LIFETIME_SECS`]
pub fn issue_token(
    secret: &str,
    username: &str,
    user_id: &str,
) -> std::result::Result<String, jsonwebtoken::errors::Error> {
    let claims = TokenClaims {
        id: user_id.to_string(),
        username: username.to_string(),
        exp: Utc::now().timestamp() + TOKEN_LIFETIME_SECS,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verify a token and extract its claims
pub fn verify_token(
    secret: &str,
    token: &str,
) -> std::result::Result<TokenClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.validate_aud = false;

    decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
}

/// Strip the bearer prefix from an Authorization header value.
/// The prefix is matched case-insensitively ("bearer x" and "Bearer x" both
/// work); anything else is treated as absent.
pub fn extract_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        Some(token.trim())
    } else {
        None
    }
}

/// Extension trait to get the authenticated user from GraphQL context
pub trait AuthExt {
    /// Get the authenticated user, or fail with `UNAUTHENTICATED_USER`
    fn current_user(&self) -> Result<&CurrentUser>;
}

impl AuthExt for Context<'_> {
    fn current_user(&self) -> Result<&CurrentUser> {
        self.data_opt::<CurrentUser>()
            .ok_or_else(|| CatalogError::Unauthenticated.extend())
    }
}
