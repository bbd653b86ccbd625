/// Middleware module
///
/// Request logging and the access-token auth gate.

mod auth_gate;
mod logger;

pub use auth_gate::AuthGate;
pub use logger::LoggerMiddleware;
