//! Core types for the customer identity service.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cpf;
pub mod id;

pub use cpf::{Cpf, CpfError, normalize, validate};
pub use id::AccountId;
