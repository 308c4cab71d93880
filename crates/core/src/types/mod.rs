//! Core types for the address book.

pub mod address;
pub mod id;
pub mod page;

pub use address::{ADDRESS_FIELDS, Address, AddressPatch, INDEXED_FIELDS, text_or_number};
pub use id::*;
pub use page::{Page, PageError};
