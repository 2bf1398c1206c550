//! Unified error types for the certificate registry.

use thiserror::Error;

/// Unified error type for the certificate registry.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Certificate store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// QR generation error.
    #[error("qr error: {0}")]
    Qr(#[from] QrError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Certificate store errors.
///
/// Only the write path reports errors; read failures degrade to an empty store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to write the store file.
    #[error("failed to write {path}: {source}")]
    Io {
        /// Store file path.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize the record list.
    #[error("failed to serialize certificates: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// QR code generation errors.
#[derive(Error, Debug)]
pub enum QrError {
    /// Code cannot be used as an image file name.
    #[error("certificate code cannot name a qr image: {0:?}")]
    InvalidCode(String),

    /// Verification URL could not be built from the base URL.
    #[error("invalid verification url: {0}")]
    Url(#[from] url::ParseError),

    /// Data could not be encoded as a QR symbol.
    #[error("qr encoding failed: {0}")]
    Encode(#[from] qrcode::types::QrError),

    /// PNG encoding or image write failed.
    #[error("image write failed: {0}")]
    Image(#[from] image::ImageError),

    /// Output directory could not be created.
    #[error("failed to prepare {path}: {source}")]
    Io {
        /// Directory path.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The blocking render task panicked or was cancelled.
    #[error("qr render task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;
