//! # TaskDesk Shared Library
//!
//! This crate contains the domain types, persistence layer and business
//! services used by the TaskDesk API server.
//!
//! ## Module Organization
//!
//! - `models`: Users, tasks and their request payloads
//! - `auth`: Password hashing and JWT issuance/validation
//! - `db`: Connection pool, migrations, datastores, repositories and the unit of work
//! - `services`: User and task services built on the unit of work
//! - `validation`: Field-level request validation
//! - `error`: Service error taxonomy

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod validation;

/// Current version of the TaskDesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
