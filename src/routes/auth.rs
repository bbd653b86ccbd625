/// Authentication Routes
///
/// Signup, login, logout, session revocation and the current-user query.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{
    hash_password, issue_token_pair, refresh_cookie, removal_cookie, verify_password,
    AccessClaims,
};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, DatabaseError, ErrorContext, ValidationError};
use crate::store::{NewUser, UserProfile, UserRepository};
use crate::validators::is_valid_email;

/// Signup and login request body
#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
}

#[derive(Deserialize)]
pub struct RevokeRequest {
    pub user_id: String,
}

/// bcrypt is CPU bound; keep it off the async workers.
async fn run_blocking<F, T>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    web::block(f)
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task failed: {}", e)))?
}

/// POST /auth/signup
///
/// Creates an account with token version 0. Responds `true`.
///
/// # Errors
/// - 400: Invalid email or password length
/// - 409: Email already registered
pub async fn signup(
    form: web::Json<Credentials>,
    users: web::Data<dyn UserRepository>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_signup");
    let Credentials { email, password } = form.into_inner();

    let email = is_valid_email(&email)?;
    if users.find_by_email(&email).await?.is_some() {
        return Err(AuthError::DuplicateAccount.into());
    }

    let cost = jwt_config.bcrypt_cost;
    let password_hash = run_blocking(move || hash_password(&password, cost)).await?;
    let user = users.create(NewUser::new(email, password_hash)).await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        "User signed up"
    );

    Ok(HttpResponse::Created().json(true))
}

/// POST /auth/login
///
/// Returns `{access_token}` in the body and sets the refresh-token cookie.
///
/// # Errors
/// - 400: Malformed email
/// - 401: Unknown email or wrong password (indistinguishable on purpose)
pub async fn login(
    form: web::Json<Credentials>,
    users: web::Data<dyn UserRepository>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");
    let Credentials { email, password } = form.into_inner();

    let email = is_valid_email(&email)?;
    let user = users
        .find_by_email(&email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let password_hash = user.password_hash.clone();
    let password_valid = run_blocking(move || verify_password(&password, &password_hash)).await?;
    if !password_valid {
        return Err(AuthError::InvalidCredentials.into());
    }

    let pair = issue_token_pair(&user, jwt_config.get_ref())?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        token_version = user.token_version,
        "User logged in"
    );

    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie(&pair.refresh_token, jwt_config.get_ref()))
        .json(LoginResponse {
            access_token: pair.access_token,
        }))
}

/// POST /auth/logout
///
/// Clears the refresh cookie on this browser. Other sessions stay valid;
/// use revocation for those.
pub async fn logout(jwt_config: web::Data<JwtSettings>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(removal_cookie(jwt_config.get_ref()))
        .json(true)
}

/// POST /auth/revoke
///
/// Bumps the user's token version, invalidating every refresh token issued
/// so far. Access tokens already out live until they expire.
/// **Requires a valid access token**; callers may only revoke their own sessions.
///
/// # Errors
/// - 400: `user_id` is not a UUID
/// - 403: `user_id` is not the caller
/// - 404: Unknown user
pub async fn revoke_user_session(
    claims: web::ReqData<AccessClaims>,
    body: web::Json<RevokeRequest>,
    users: web::Data<dyn UserRepository>,
) -> Result<HttpResponse, AppError> {
    let caller = claims.user_id()?;
    let target = Uuid::parse_str(body.user_id.trim())
        .map_err(|_| ValidationError::InvalidFormat("user_id"))?;

    if caller != target {
        return Err(AuthError::Forbidden.into());
    }

    let context = ErrorContext::new("revoke_user_session").with_user_id(target.to_string());
    let version = users.increment_token_version(target).await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = ?context.user_id,
        token_version = version,
        "User sessions revoked"
    );

    Ok(HttpResponse::Ok().json(true))
}

/// GET /api/me
///
/// **Requires a valid access token.**
pub async fn get_current_user(
    claims: web::ReqData<AccessClaims>,
    users: web::Data<dyn UserRepository>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;

    let user = users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("user {}", user_id)))?;

    Ok(HttpResponse::Ok().json(UserProfile::from(&user)))
}
