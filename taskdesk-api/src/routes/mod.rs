/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `users`: Registration, login and password change
/// - `tasks`: Task CRUD for the authenticated user

pub mod health;
pub mod tasks;
pub mod users;
