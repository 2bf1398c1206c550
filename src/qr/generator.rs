//! Verification QR image generation.

use std::path::PathBuf;

use image::{ImageBuffer, ImageFormat, Luma};
use qrcode::QrCode;
use tracing::{debug, instrument};
use url::form_urlencoded;
use url::Url;

use crate::config::{Config, QR_SUBDIR};
use crate::error::QrError;

/// Sample code rendered by the `/test-qr` diagnostic endpoint.
pub const TEST_QR_CODE: &str = "TEST123";

/// Smallest edge length of a rendered image in pixels.
const MIN_IMAGE_SIZE: u32 = 256;

/// A QR image written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrImage {
    /// Location on disk.
    pub file_path: PathBuf,
    /// Path the image is served at, e.g. `/qrcodes/C1.png`.
    pub web_path: String,
}

/// Renders verification URLs into PNG files named after the certificate code.
#[derive(Debug, Clone)]
pub struct QrGenerator {
    base_url: String,
    output_dir: PathBuf,
}

impl QrGenerator {
    /// Create a generator writing into `output_dir`, linking to `base_url`.
    pub fn new(base_url: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            output_dir: output_dir.into(),
        }
    }

    /// Create a generator from application configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.verification_base(), config.qr_dir())
    }

    /// Link encoded into the QR image for `code`.
    pub fn verification_url(&self, code: &str) -> Result<Url, QrError> {
        let endpoint = format!("{}/verify", self.base_url);
        Ok(Url::parse_with_params(&endpoint, &[("code", code)])?)
    }

    /// Web path an image for `code` is served at.
    ///
    /// The static file service percent-decodes request paths once, so the
    /// `%` escapes already in the file stem are escaped again here.
    pub fn web_path(code: &str) -> String {
        format!("/{}/{}.png", QR_SUBDIR, file_stem(code).replace('%', "%25"))
    }

    /// Render the verification QR for `code` and write it into the output
    /// directory.
    ///
    /// Any code is accepted except the empty one. An existing image for the
    /// same code is overwritten.
    #[instrument(skip(self))]
    pub async fn generate(&self, code: &str) -> Result<QrImage, QrError> {
        if code.is_empty() {
            return Err(QrError::InvalidCode(code.to_string()));
        }

        let url = self.verification_url(code)?;

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| QrError::Io {
                path: self.output_dir.display().to_string(),
                source,
            })?;

        let file_path = self.output_dir.join(format!("{}.png", file_stem(code)));
        let target = file_path.clone();

        tokio::task::spawn_blocking(move || -> Result<(), QrError> {
            render(url.as_str())?.save_with_format(&target, ImageFormat::Png)?;
            Ok(())
        })
        .await??;

        debug!("Wrote QR image {}", file_path.display());

        Ok(QrImage {
            file_path,
            web_path: Self::web_path(code),
        })
    }
}

/// Render `data` as a grayscale QR symbol.
fn render(data: &str) -> Result<ImageBuffer<Luma<u8>, Vec<u8>>, QrError> {
    let symbol = QrCode::new(data.as_bytes())?;
    Ok(symbol
        .render::<Luma<u8>>()
        .min_dimensions(MIN_IMAGE_SIZE, MIN_IMAGE_SIZE)
        .build())
}

/// File stem for `code`: form-urlencoded, so distinct codes get distinct
/// names and path separators never reach the filesystem.
fn file_stem(code: &str) -> String {
    form_urlencoded::byte_serialize(code.as_bytes()).collect()
}
