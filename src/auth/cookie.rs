/// Refresh-token cookie: set, read, clear.
///
/// The cookie is httpOnly so page scripts can never read the refresh token.

use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::HttpRequest;

use crate::configuration::JwtSettings;

/// Cookie carrying a (rotated) refresh token. Lives as long as the token.
pub fn refresh_cookie(token: &str, config: &JwtSettings) -> Cookie<'static> {
    Cookie::build(config.cookie_name.clone(), token.to_string())
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::seconds(config.refresh_token_expiry))
        .finish()
}

/// Expired, empty cookie that makes the browser drop the refresh token.
pub fn removal_cookie(config: &JwtSettings) -> Cookie<'static> {
    let mut cookie = Cookie::build(config.cookie_name.clone(), "")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .path("/")
        .finish();
    cookie.make_removal();
    cookie
}

/// The refresh token from the request, if a non-empty cookie is present.
pub fn read_refresh_cookie(req: &HttpRequest, config: &JwtSettings) -> Option<String> {
    req.cookie(&config.cookie_name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}
