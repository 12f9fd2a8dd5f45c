//! # Maison API Server Library
//!
//! HTTP front end of the household manager: sessions, flash messages and the
//! route handlers. Domain logic lives in `maison_shared`.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration from the environment
//! - `cookies`: Session and flash cookie builders
//! - `error`: Error to redirect/response mapping
//! - `extract`: Authenticated member and validated form extractors
//! - `flash`: One-shot flash messages and JSON pages
//! - `middleware`: Security headers
//! - `routes`: Route handlers

pub mod app;
pub mod config;
pub mod cookies;
pub mod error;
pub mod extract;
pub mod flash;
pub mod middleware;
pub mod routes;
