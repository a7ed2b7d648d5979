//! Shared test utilities for the vault-env crates.
//!
//! This crate provides:
//! - An in-memory Vault standing in for the HTTP transport
//! - Test fixtures with the sample bundles used across the test suites
//! - Proptest generators for keys and bundle sets

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use fixtures::bundle;
pub use mocks::MockVault;
