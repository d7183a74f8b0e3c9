//! Customer Identity Core - Shared types library.
//!
//! This crate provides the types used across the customer identity components:
//! - `server` - HTTP service orchestrating the identity provider and the account store
//! - `cli` - Command-line tools for migrations and account management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. CPF validation lives here so every layer agrees on
//! what a normalized tax id is.
//!
//! # Modules
//!
//! - [`types`] - CPF tax id and account ID newtypes
//! - [`account`] - Account records, inputs and credential tokens
//! - [`error`] - Classified errors carrying a transport status hint

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod account;
pub mod error;
pub mod types;

pub use account::{Account, AccountCreated, AccountInput, AccountKind, CredentialToken, TaxIdForm};
pub use error::{ClassifiedError, ErrorKind};
pub use types::*;
