//! Shared library for cross-cutting concerns in the vault-env crates.
//!
//! This crate provides centralized implementations for:
//! - Error types for client construction and I/O
//! - HTTP client configuration, including the TLS verification policy
//! - Tracing subscriber setup

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod tracing_config;

pub use error::PlatformError;
pub use http::{HttpConfig, TlsVerify, build_http_client};
pub use tracing_config::{LogFormat, TracingConfig, init_tracing};
