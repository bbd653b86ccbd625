mod auth;
mod health_check;
mod refresh_token;

pub use auth::{
    get_current_user, login, logout, revoke_user_session, signup, Credentials, LoginResponse,
};
pub use health_check::health_check;
pub use refresh_token::{exchange_refresh_token, refresh_token, RefreshResponse};
