//! QR code generation for certificate verification links.

pub mod generator;

pub use generator::{QrGenerator, QrImage, TEST_QR_CODE};
