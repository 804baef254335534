//! Subify storefront client library.
//!
//! Everything a storefront front end needs below the presentation layer:
//!
//! - [`context`] - the application state container (session + cart)
//! - [`cart`] - validated cart items and their local persistence
//! - [`session`] - user records and the user/auth service client
//! - [`catalog`] / [`search`] - product catalog access and title search
//! - [`remote_cart`] - the cart kept by the REST API
//! - [`checkout`] / [`geocoder`] - totals, order placement, address lookup
//! - [`state`] - wiring of all of the above from [`config`]

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod context;
pub mod error;
pub mod geocoder;
pub mod notifications;
pub mod remote_cart;
pub mod search;
pub mod session;
pub mod state;
pub mod storage;

pub use context::{AppContext, AppView};
pub use error::{AppError, Result};
pub use state::AppState;
