/// JWT Claims structures
///
/// Access and refresh tokens carry different payloads and are signed with
/// different secrets, so one can never be replayed as the other.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AuthError};

/// Payload of a short-lived access token: `{ userId }` plus standard claims.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

/// Payload of a long-lived refresh token: `{ userId, tokenVersion }`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    pub sub: String,
    /// The user's token version at issuance
    pub token_version: i32,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

fn parse_subject(sub: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(sub).map_err(|_| AppError::Auth(AuthError::TokenInvalid))
}

impl AccessClaims {
    pub fn new(user_id: Uuid, expiry_seconds: i64, issuer: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer,
        }
    }

    pub fn user_id(&self) -> Result<Uuid, AppError> {
        parse_subject(&self.sub)
    }
}

impl RefreshClaims {
    pub fn new(user_id: Uuid, token_version: i32, expiry_seconds: i64, issuer: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            token_version,
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer,
        }
    }

    pub fn user_id(&self) -> Result<Uuid, AppError> {
        parse_subject(&self.sub)
    }
}
