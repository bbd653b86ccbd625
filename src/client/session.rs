/// Client Session Bootstrapper
///
/// The client half of the session flow: on application start, one call to
/// `/refresh-token` decides whether the stored session is still good.
///
/// ```text
/// Unknown --bootstrap--> Authenticated | Unauthenticated
/// Authenticated --logout / terminal 401--> Unauthenticated
/// ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use super::{ClientError, TokenStorage};
use crate::routes::{LoginResponse, RefreshResponse};
use crate::store::UserProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unknown,
    Authenticated,
    Unauthenticated,
}

#[derive(Deserialize)]
struct ExpiryOnly {
    #[allow(dead_code)]
    exp: i64,
}

/// True when `token` decodes and its `exp` is still in the future.
///
/// The signature is not checked: the client does not hold the secret, and
/// the server verifies every token it receives anyway.
pub fn token_is_live(token: &str) -> bool {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_aud = false;
    validation.leeway = 0;

    decode::<ExpiryOnly>(token, &DecodingKey::from_secret(&[]), &validation).is_ok()
}

pub struct SessionClient<S: TokenStorage> {
    base_url: String,
    http: reqwest::Client,
    storage: S,
    /// Client-side cached data; dropped whenever the session ends.
    profile: Mutex<Option<UserProfile>>,
    state: Mutex<SessionState>,
    bootstrapped: AtomicBool,
}

impl<S: TokenStorage> SessionClient<S> {
    pub fn new(base_url: impl Into<String>, storage: S) -> Result<Self, ClientError> {
        // the cookie jar carries the httpOnly refresh cookie between calls
        let http = reqwest::Client::builder().cookie_store(true).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            storage,
            profile: Mutex::new(None),
            state: Mutex::new(SessionState::Unknown),
            bootstrapped: AtomicBool::new(false),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn set_state(&self, state: SessionState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn access_token(&self) -> Option<String> {
        self.storage.load()
    }

    /// Locally authenticated: a stored access token that has not expired.
    pub fn is_authenticated(&self) -> bool {
        self.storage.load().map_or(false, |t| token_is_live(&t))
    }

    pub fn cached_profile(&self) -> Option<UserProfile> {
        self.profile
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn end_session(&self) {
        if let Err(e) = self.storage.clear() {
            tracing::warn!(error = %e, "Failed to clear stored access token");
        }
        self.profile
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.set_state(SessionState::Unauthenticated);
    }

    fn start_session(&self, access_token: &str) -> Result<(), ClientError> {
        self.storage.save(access_token)?;
        self.set_state(SessionState::Authenticated);
        Ok(())
    }

    /// Resolve the session once per app load.
    ///
    /// Any failure (rejected refresh, bad status, unreadable body, network
    /// error) ends in `Unauthenticated` with local credentials cleared. Never
    /// retried; later calls return the state already reached.
    pub async fn bootstrap(&self) -> SessionState {
        if self.bootstrapped.swap(true, Ordering::SeqCst) {
            return self.state();
        }

        match self.request_refresh().await {
            Ok(access_token) => match self.start_session(&access_token) {
                Ok(()) => tracing::info!("Session restored"),
                Err(e) => {
                    tracing::warn!(error = %e, "Could not store access token");
                    self.end_session();
                }
            },
            Err(e) => {
                tracing::info!(reason = %e, "No usable session");
                self.end_session();
            }
        }

        self.state()
    }

    async fn request_refresh(&self) -> Result<String, ClientError> {
        let response = self.http.post(self.url("/refresh-token")).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Api {
                status: response.status().as_u16(),
                message: "refresh endpoint failed".to_string(),
            });
        }

        let body: RefreshResponse = response.json().await?;
        if body.success && !body.access_token.is_empty() {
            Ok(body.access_token)
        } else {
            Err(ClientError::SessionRejected)
        }
    }

    pub async fn signup(&self, email: &str, password: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url("/auth/signup"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        ClientError::check(response).await?;
        Ok(())
    }

    /// Log in; the access token is stored, the refresh cookie lands in the jar.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let body: LoginResponse = ClientError::check(response).await?.json().await?;
        self.start_session(&body.access_token)
    }

    /// Clears the server cookie, then local credentials. Local state is
    /// cleared even if the server call fails.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = match self.http.post(self.url("/auth/logout")).send().await {
            Ok(response) => ClientError::check(response).await.map(|_| ()),
            Err(e) => Err(e.into()),
        };
        self.end_session();
        result
    }

    /// Treat an Auth Gate rejection as terminal.
    pub fn handle_unauthorized(&self) {
        tracing::info!("Access token rejected, ending session");
        self.end_session();
    }

    fn bearer(&self) -> Result<String, ClientError> {
        self.storage
            .load()
            .map(|t| format!("Bearer {}", t))
            .ok_or(ClientError::NotAuthenticated)
    }

    /// Fetch the current user, caching it. A 401 ends the session.
    pub async fn me(&self) -> Result<UserProfile, ClientError> {
        let response = self
            .http
            .get(self.url("/api/me"))
            .header(reqwest::header::AUTHORIZATION, self.bearer()?)
            .send()
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized();
            return Err(ClientError::NotAuthenticated);
        }

        let profile: UserProfile = ClientError::check(response).await?.json().await?;
        *self.profile.lock().unwrap_or_else(PoisonError::into_inner) = Some(profile.clone());
        Ok(profile)
    }

    /// Invalidate every refresh token issued for `user_id` (must be the caller).
    pub async fn revoke_sessions(&self, user_id: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url("/auth/revoke"))
            .header(reqwest::header::AUTHORIZATION, self.bearer()?)
            .json(&json!({ "user_id": user_id }))
            .send()
            .await?;
        ClientError::check(response).await?;
        Ok(())
    }
}
