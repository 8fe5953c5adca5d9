//! Summit Core - Shared types library.
//!
//! This crate provides common types used across all Summit components:
//! - `server` - The conference web application (member and admin surfaces)
//! - `cli` - Command-line tools for migrations and member management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, roles, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
