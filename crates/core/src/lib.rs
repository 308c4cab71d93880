//! Address Book Core - Shared types library.
//!
//! This crate provides the types used across all address book components:
//! - `server` - HTTP API for address records
//! - `cli` - Command-line tools for collection setup and programmatic adds
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP. The merge rules for partial updates live here so that
//! every caller applies them identically.
//!
//! # Modules
//!
//! - [`types`] - ID newtypes, the `Address` record, partial updates and pagination

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
