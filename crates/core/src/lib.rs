//! Vastra Core - Shared types library.
//!
//! This crate provides common types used across all Vastra components:
//! - `storefront` - Customer-facing commerce library (cart, checkout, identity)
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no backend
//! access. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, contact details,
//!   and status enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
