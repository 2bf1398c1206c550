//! Certificate issuance and verification service.
//!
//! Certificates are posted as JSON, appended to a flat JSON file, and can be
//! looked up by code. Each issued certificate can carry a QR image that links
//! back to its verification URL:
//!
//! ```text
//! POST /add-certificate  {"code":"C1","name":"Alice",...}
//!   -> public/qrcodes/C1.png  (encodes https://<host>/verify?code=C1)
//!   -> certificates.json      (record appended, file rewritten)
//! GET  /verify?code=C1      {"valid":true,"code":"C1","name":"Alice",...}
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`certificate`]: Certificate records and the JSON file store
//! - [`qr`]: Verification QR image generation
//! - [`api`]: HTTP API and static asset serving
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod certificate;
pub mod config;
pub mod error;
pub mod metrics;
pub mod qr;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
