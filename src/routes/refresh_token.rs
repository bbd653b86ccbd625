/// Session Refresh Endpoint
///
/// `POST /refresh-token` trades the refresh cookie for a new access token
/// and rotates the cookie. The checks run in a fixed order and the first
/// failure wins:
///
/// 1. cookie present
/// 2. signature and expiry valid
/// 3. subject resolves to a user
/// 4. embedded token version equals the stored one
///
/// Every failure, including store errors, becomes the same
/// `{"success": false, "access_token": ""}` body so callers cannot tell
/// which check tripped. Only the log line says.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{
    issue_token_pair, read_refresh_cookie, refresh_cookie, validate_refresh_token, TokenPair,
};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, DatabaseError, ErrorContext};
use crate::store::{User, UserRepository};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RefreshResponse {
    pub success: bool,
    pub access_token: String,
}

impl RefreshResponse {
    pub fn failure() -> Self {
        Self {
            success: false,
            access_token: String::new(),
        }
    }
}

/// Runs the refresh policy and mints a fresh token pair for the user.
pub async fn exchange_refresh_token(
    token: Option<String>,
    users: &dyn UserRepository,
    config: &JwtSettings,
) -> Result<(User, TokenPair), AppError> {
    let token = token.ok_or(AuthError::TokenMissing)?;
    let claims = validate_refresh_token(&token, config)?;

    let user_id = claims.user_id()?;
    let user = users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("user {}", user_id)))?;

    if user.token_version != claims.token_version {
        return Err(AuthError::TokenVersionMismatch.into());
    }

    let pair = issue_token_pair(&user, config)?;
    Ok((user, pair))
}

/// POST /refresh-token
pub async fn refresh_token(
    req: HttpRequest,
    users: web::Data<dyn UserRepository>,
    jwt_config: web::Data<JwtSettings>,
) -> HttpResponse {
    let context = ErrorContext::new("token_refresh");
    let token = read_refresh_cookie(&req, jwt_config.get_ref());

    match exchange_refresh_token(token, users.get_ref(), jwt_config.get_ref()).await {
        Ok((user, pair)) => {
            let context = context.with_user_id(user.id.to_string());
            tracing::info!(
                request_id = %context.request_id,
                operation = %context.operation,
                user_id = ?context.user_id,
                "Session refreshed"
            );

            HttpResponse::Ok()
                .cookie(refresh_cookie(&pair.refresh_token, jwt_config.get_ref()))
                .json(RefreshResponse {
                    success: true,
                    access_token: pair.access_token,
                })
        }
        Err(e) => {
            match &e {
                AppError::Auth(AuthError::TokenMissing) => tracing::debug!(
                    request_id = %context.request_id,
                    "Refresh attempted without cookie"
                ),
                AppError::Database(DatabaseError::NotFound(_)) | AppError::Auth(_) => {
                    tracing::warn!(
                        request_id = %context.request_id,
                        reason = %e,
                        "Refresh token rejected"
                    )
                }
                _ => tracing::error!(
                    request_id = %context.request_id,
                    error = %e,
                    "Refresh failed"
                ),
            }

            HttpResponse::Ok().json(RefreshResponse::failure())
        }
    }
}
