//! Certificate module.
//!
//! This module handles:
//! - Certificate record and request types
//! - Field presence validation
//! - The append-only JSON file store

pub mod store;
pub mod types;

pub use store::CertificateStore;
pub use types::{CertificateRecord, FieldValue, NewCertificate, RequiredField};
