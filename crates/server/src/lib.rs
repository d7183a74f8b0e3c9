//! Customer Identity Server library.
//!
//! Orchestrates account creation, update, lookup and login for customers and
//! admin users across a remote identity provider (AWS Cognito) and a local
//! `PostgreSQL` store. Exposed as a library so the CLI and the tests can
//! drive the same services as the HTTP binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod classify;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
