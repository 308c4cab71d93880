//! Business logic services.
//!
//! # Services
//!
//! - `addresses` - Address lookup, merge, listing and deletion

pub mod addresses;

pub use addresses::{AddressError, AddressService, Caller, UserAddress};
