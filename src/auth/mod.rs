/// Authentication module
///
/// Token issuing and verification, password hashing and the refresh-cookie
/// helpers.

mod claims;
mod cookie;
mod jwt;
mod password;

pub use claims::{AccessClaims, RefreshClaims};
pub use cookie::{read_refresh_cookie, refresh_cookie, removal_cookie};
pub use jwt::{
    generate_access_token, generate_refresh_token, issue_token_pair, validate_access_token,
    validate_refresh_token, TokenPair,
};
pub use password::{hash_password, verify_password};
