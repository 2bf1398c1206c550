//! HTTP API handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::certificate::{CertificateRecord, CertificateStore, NewCertificate};
use crate::config::Config;
use crate::metrics;
use crate::qr::{QrGenerator, TEST_QR_CODE};

/// Error reported when any certificate field is missing.
pub const ERR_FIELDS_REQUIRED: &str = "All fields are required";
/// Error reported when the request body is not usable JSON.
pub const ERR_INVALID_BODY: &str = "Invalid request body";
/// Error reported when the QR image could not be produced.
pub const ERR_QR_FAILED: &str = "QR generation failed";
/// Error reported when the store could not be written.
pub const ERR_SAVE_FAILED: &str = "Failed to save certificate";

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<Config>,
    /// Certificate store.
    pub store: Arc<CertificateStore>,
    /// QR image generator.
    pub qr: Arc<QrGenerator>,
    /// Prometheus render handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create app state from configuration.
    pub fn new(config: Config) -> Self {
        let store = CertificateStore::new(config.store_path.clone());
        let qr = QrGenerator::from_config(&config);
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
            qr: Arc::new(qr),
            metrics: None,
        }
    }

    /// Attach a Prometheus handle for the `/metrics` endpoint.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Response to `POST /add-certificate`.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct AddCertificateResponse {
    /// Whether the certificate was stored.
    pub success: bool,
    /// Web path of the generated QR image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr: Option<String>,
    /// Failure reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AddCertificateResponse {
    fn stored(qr: Option<String>) -> Self {
        Self {
            success: true,
            qr,
            error: None,
        }
    }

    fn failed(error: &str) -> Self {
        Self {
            success: false,
            qr: None,
            error: Some(error.to_string()),
        }
    }
}

/// Query string of `GET /verify`.
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    /// Certificate code to look up.
    pub code: Option<String>,
}

/// Response to `GET /verify`; record fields are inlined when valid.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    /// Whether a certificate with the code exists.
    pub valid: bool,
    /// Matching record.
    #[serde(flatten)]
    pub certificate: Option<CertificateRecord>,
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Issue a certificate: validate, render its QR image, then append it to the store.
///
/// Every outcome is answered with status 200; failures carry `success: false`
/// and an error message in the body.
pub async fn add_certificate(
    State(state): State<AppState>,
    payload: Result<Json<NewCertificate>, JsonRejection>,
) -> Json<AddCertificateResponse> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Rejected certificate body: {}", rejection);
            metrics::inc_certificates_rejected();
            return Json(AddCertificateResponse::failed(ERR_INVALID_BODY));
        }
    };

    let mut record = match request.into_record() {
        Ok(record) => record,
        Err(missing) => {
            let names: Vec<String> = missing.iter().map(|f| f.to_string()).collect();
            debug!("Certificate missing fields: {}", names.join(", "));
            metrics::inc_certificates_rejected();
            return Json(AddCertificateResponse::failed(ERR_FIELDS_REQUIRED));
        }
    };

    if state.config.qr_enabled {
        let start = Instant::now();
        match state.qr.generate(&record.code).await {
            Ok(image) => {
                metrics::record_qr_render_latency(start);
                record.qr = Some(image.web_path);
            }
            Err(e) => {
                error!("QR generation failed for {}: {}", record.code, e);
                metrics::inc_qr_failures();
                return Json(AddCertificateResponse::failed(ERR_QR_FAILED));
            }
        }
    }

    let code = record.code.clone();
    let qr = record.qr.clone();

    if let Err(e) = state.store.append(record).await {
        error!("Failed to save certificate {}: {}", code, e);
        metrics::inc_store_write_failures();
        return Json(AddCertificateResponse::failed(ERR_SAVE_FAILED));
    }

    info!("Issued certificate {}", code);
    metrics::inc_certificates_issued();
    Json(AddCertificateResponse::stored(qr))
}

/// Look a certificate up by code.
pub async fn verify(
    State(state): State<AppState>,
    query: Result<Query<VerifyQuery>, QueryRejection>,
) -> Json<VerifyResponse> {
    let code = match query {
        Ok(Query(VerifyQuery { code: Some(code) })) if !code.is_empty() => code,
        Ok(_) => {
            return Json(VerifyResponse {
                valid: false,
                certificate: None,
            })
        }
        Err(rejection) => {
            debug!("Rejected verify query: {}", rejection);
            return Json(VerifyResponse {
                valid: false,
                certificate: None,
            });
        }
    };

    let certificate = state.store.find(&code).await;
    let valid = certificate.is_some();
    debug!("Verify {}: {}", code, if valid { "found" } else { "not found" });
    metrics::inc_verifications(valid);

    Json(VerifyResponse { valid, certificate })
}

/// Diagnostic: render a QR for a fixed sample code and show it.
pub async fn test_qr(State(state): State<AppState>) -> impl IntoResponse {
    match state.qr.generate(TEST_QR_CODE).await {
        Ok(image) => (
            StatusCode::OK,
            Html(format!(
                "<h1>QR Test</h1><p>Code: {}</p><img src=\"{}\" alt=\"QR code for {}\">",
                TEST_QR_CODE, image.web_path, TEST_QR_CODE
            )),
        ),
        Err(e) => {
            error!("Test QR generation failed: {}", e);
            metrics::inc_qr_failures();
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!("<h1>{}</h1>", ERR_QR_FAILED)),
            )
        }
    }
}

/// Prometheus exposition endpoint.
pub async fn metrics_export(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            "metrics recorder not installed".to_string(),
        ),
    }
}
