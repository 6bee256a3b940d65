//! Sky Deck Core - Shared types library.
//!
//! This crate provides common types used across all Sky Deck components:
//! - `backend` - Document store, identity provider and the services built on them
//! - `cli` - Command-line tools for seeding and content maintenance
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no store access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for document IDs, prices, emails, and statuses
//! - [`envelope`] - The `{success, data|error}` shape returned to callers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod envelope;
pub mod types;

pub use envelope::{Envelope, ErrorBody, ErrorKind};
pub use types::*;
