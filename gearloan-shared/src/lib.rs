//! # GearLoan Shared Library
//!
//! This crate contains the shared types, database access and business logic
//! used by the GearLoan API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `auth`: Authentication and authorization utilities
//! - `db`: Connection pool and migrations
//! - `lending`: Borrow and return workflow

pub mod auth;
pub mod db;
pub mod lending;
pub mod models;

/// Current version of the GearLoan shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
