//! # TaskDesk API Server Library
//!
//! HTTP surface of TaskDesk: per-user task tracking behind JWT bearer
//! authentication.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and the response envelope
//! - `middleware`: Authentication and error redaction
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
