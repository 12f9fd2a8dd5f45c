//! # Maison Shared Library
//!
//! Domain types, storage access and business rules for the Maison household
//! manager. The HTTP server in `maison-api` is a thin layer over this crate.
//!
//! ## Module Organization
//!
//! - `db`: Connection pool and schema migrations
//! - `models`: Households, members, tasks, inventory and budgets with their CRUD
//! - `auth`: Password hashing, session tokens and the access gate
//! - `invitation`: Issuing and redeeming single-use household invitations

pub mod auth;
pub mod db;
pub mod invitation;
pub mod models;

/// Current version of the Maison shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
