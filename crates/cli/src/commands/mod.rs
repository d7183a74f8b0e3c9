//! CLI command implementations.

pub mod account;
pub mod cpf;
pub mod migrate;
