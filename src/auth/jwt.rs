/// Token Issuer and Verifier
///
/// Access tokens are signed with `access_token_secret`, refresh tokens with
/// `refresh_token_secret`. Both are HS256 and carry the configured issuer.
/// Verification is pure: signature, issuer and expiry only, no store lookup.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::claims::{AccessClaims, RefreshClaims};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};
use crate::store::User;

/// Tokens minted together at login and on every successful refresh.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

fn sign<T: Serialize>(claims: &T, secret: &str) -> Result<String, AppError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

fn verify<T: DeserializeOwned>(token: &str, secret: &str, issuer: &str) -> Result<T, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[issuer]);
    // expiry is exact; the access window is already short
    validation.leeway = 0;

    decode::<T>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            let kind = match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::TokenSignatureInvalid,
                _ => AuthError::TokenInvalid,
            };
            tracing::debug!(error = %e, kind = ?kind, "JWT validation error");
            kind
        })
}

/// Mint an access token encoding `{ userId }`.
pub fn generate_access_token(user_id: &Uuid, config: &JwtSettings) -> Result<String, AppError> {
    let claims = AccessClaims::new(*user_id, config.access_token_expiry, config.issuer.clone());
    sign(&claims, &config.access_token_secret)
}

/// Mint a refresh token embedding the user's current token version.
pub fn generate_refresh_token(user: &User, config: &JwtSettings) -> Result<String, AppError> {
    let claims = RefreshClaims::new(
        user.id,
        user.token_version,
        config.refresh_token_expiry,
        config.issuer.clone(),
    );
    sign(&claims, &config.refresh_token_secret)
}

pub fn issue_token_pair(user: &User, config: &JwtSettings) -> Result<TokenPair, AppError> {
    Ok(TokenPair {
        access_token: generate_access_token(&user.id, config)?,
        refresh_token: generate_refresh_token(user, config)?,
    })
}

/// Verify an access token's signature, issuer and expiry.
pub fn validate_access_token(token: &str, config: &JwtSettings) -> Result<AccessClaims, AuthError> {
    verify(token, &config.access_token_secret, &config.issuer)
}

/// Verify a refresh token's signature, issuer and expiry.
///
/// The token-version check needs the store and lives in the refresh route.
pub fn validate_refresh_token(
    token: &str,
    config: &JwtSettings,
) -> Result<RefreshClaims, AuthError> {
    verify(token, &config.refresh_token_secret, &config.issuer)
}
