/// Session client
///
/// What a front end runs against this service: the start-up bootstrapper,
/// login/logout, local token storage and a per-caller debouncer.

mod debounce;
mod session;
mod storage;

use std::fmt;

pub use debounce::{Debouncer, DEFAULT_DEBOUNCE_DELAY};
pub use session::{token_is_live, SessionClient, SessionState};
pub use storage::{FileTokenStorage, InMemoryTokenStorage, TokenStorage};

#[derive(Debug)]
pub enum ClientError {
    /// Transport failure or an unreadable body
    Http(reqwest::Error),
    /// The server answered with an error envelope; `message` is meant for the user
    Api { status: u16, message: String },
    /// `/refresh-token` answered `{success: false}`
    SessionRejected,
    NotAuthenticated,
    Storage(std::io::Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Http(e) => write!(f, "HTTP error: {}", e),
            ClientError::Api { status, message } => write!(f, "{} ({})", message, status),
            ClientError::SessionRejected => write!(f, "Session was rejected"),
            ClientError::NotAuthenticated => write!(f, "Not authenticated"),
            ClientError::Storage(e) => write!(f, "Token storage error: {}", e),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Http(err)
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Storage(err)
    }
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    message: String,
}

impl ClientError {
    /// Pass 2xx responses through; turn anything else into `Api` with the
    /// server's message when it sent one.
    pub(crate) async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string(),
        };
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}
