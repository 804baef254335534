//! Subify Core - Shared types library.
//!
//! This crate provides common types used across all Subify components:
//! - `storefront` - Client library (session, cart, catalog, checkout)
//! - `cli` - Command-line storefront front end
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs, prices, emails, and payment modes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
