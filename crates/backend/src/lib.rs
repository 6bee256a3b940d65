//! Sky Deck backend library.
//!
//! The data and auth layer behind the coffee shop site: form submissions,
//! menu/news/content management, pre-orders, and the admin and customer
//! authentication flows.
//!
//! # Layout
//!
//! - [`store`], [`identity`], [`blob`] - ports for the managed backend, each
//!   with an in-memory adapter
//! - [`firebase`] - REST adapters for Firestore, Identity Toolkit and Storage
//! - [`models`] - typed records stored in the document store
//! - [`services`] - the operations UI handlers call
//! - [`session`] - auth session context driven by provider events

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod blob;
pub mod config;
pub mod error;
pub mod firebase;
pub mod identity;
pub mod models;
pub mod services;
pub mod session;
pub mod state;
pub mod store;

pub use error::{Result, ServiceError};
pub use state::AppState;
