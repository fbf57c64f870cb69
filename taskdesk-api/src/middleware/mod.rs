/// Middleware for the API server
///
/// - `auth`: JWT bearer authentication
/// - `errors`: Production redaction of server error bodies

pub mod auth;
pub mod errors;
