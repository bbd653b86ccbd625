//! Session and authentication service for the Nevernote note-taking app.
//!
//! Access tokens are short-lived and stateless. Refresh tokens live in an
//! httpOnly cookie and stay valid only while the token version they embed
//! matches the user's stored one; revocation bumps that version.

pub mod auth;
pub mod client;
pub mod configuration;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod validators;
