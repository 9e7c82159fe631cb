//! API request handlers for device enrolment and pairing control

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::models::{EnrolRequest, EnrolResponse, PairingResponse};
use crate::service::EnrolmentService;

/// Shared application state
pub struct AppState {
    pub service: EnrolmentService,
    /// Optional static PIN gating the enable-pairing endpoint
    pub pairing_pin: Option<String>,
}

/// API Error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message
        });

        (self.status, Json(body)).into_response()
    }
}

impl From<broker_common::Error> for ApiError {
    fn from(err: broker_common::Error) -> Self {
        use broker_common::Error::*;

        let status = match &err {
            PairingClosed => StatusCode::FORBIDDEN,
            InvalidIdentifier(_) | InvalidCsr(_) => StatusCode::BAD_REQUEST,
            StagingFailed(_) | SigningFailed(_) | PostSigning(_) | Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        ApiError {
            status,
            message: err.to_string(),
        }
    }
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "enrolment-service"
    }))
}

/// Open the pairing window for its configured duration
pub async fn enable_pairing_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<PairingResponse>, ApiError> {
    if let Some(expected) = &state.pairing_pin {
        let presented = headers.get("x-pairing-pin").and_then(|v| v.to_str().ok());
        if presented != Some(expected.as_str()) {
            warn!("Pairing enable refused: bad or missing PIN");
            return Err(ApiError {
                status: StatusCode::UNAUTHORIZED,
                message: "Invalid pairing PIN".to_string(),
            });
        }
    }

    let window = state.service.pairing().enable();
    let secs = window.as_secs();

    Ok(Json(PairingResponse {
        enabled: true,
        expires_in_secs: Some(secs),
        message: Some(format!("Pairing enabled for {} seconds", secs)),
    }))
}

/// Close the pairing window immediately
pub async fn disable_pairing_handler(
    State(state): State<Arc<AppState>>,
) -> Json<PairingResponse> {
    state.service.pairing().disable();

    Json(PairingResponse {
        enabled: false,
        expires_in_secs: None,
        message: Some("Pairing disabled".to_string()),
    })
}

/// Report the current pairing window state
pub async fn pairing_status_handler(
    State(state): State<Arc<AppState>>,
) -> Json<PairingResponse> {
    let remaining = state.service.pairing().remaining();

    Json(PairingResponse {
        enabled: remaining.is_some(),
        expires_in_secs: remaining.map(|d| d.as_secs()),
        message: None,
    })
}

/// Enrol a device: submit a CSR, receive a signed certificate
pub async fn enrol_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<EnrolRequest>, JsonRejection>,
) -> Result<Json<EnrolResponse>, ApiError> {
    // A missing content-type or unparseable body is the caller's fault,
    // same as a missing parameter
    let Json(payload) = payload.map_err(|e| ApiError {
        status: StatusCode::BAD_REQUEST,
        message: format!("Invalid request body: {}", e),
    })?;

    let (device_id, csr_pem) = match (payload.device_id, payload.csr_pem) {
        (Some(id), Some(csr)) => (id, csr),
        _ => {
            return Err(ApiError {
                status: StatusCode::BAD_REQUEST,
                message: "Missing deviceId or csrPem".to_string(),
            });
        }
    };

    info!("Enrolment requested for device: {}", device_id);

    let issued = state.service.enrol(&device_id, &csr_pem).await?;

    Ok(Json(EnrolResponse {
        cert: issued.cert_pem,
    }))
}
