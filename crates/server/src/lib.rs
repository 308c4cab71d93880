//! Address book server library.
//!
//! HTTP API over the `addresses` collection, exposed as a library so the
//! CLI and the integration tests can reuse it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
