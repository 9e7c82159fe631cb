//! Data models for the enrolment service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A certificate issued into the device store
#[derive(Debug, Clone, Serialize)]
pub struct IssuedCertificate {
    /// Device the certificate was issued to
    pub device_id: String,

    /// PEM-encoded certificate
    pub cert_pem: String,

    /// When the certificate was delivered
    pub issued_at: DateTime<Utc>,
}

/// Body of `POST /api/enrol`
///
/// Fields are optional so a missing parameter can be reported as a 400
/// rather than a body-rejection error.
#[derive(Debug, Deserialize)]
pub struct EnrolRequest {
    /// Device identifier (constrained grammar)
    #[serde(rename = "deviceId")]
    pub device_id: Option<String>,

    /// PEM-encoded certificate signing request
    #[serde(rename = "csrPem")]
    pub csr_pem: Option<String>,
}

/// Response to a successful enrolment
#[derive(Debug, Serialize)]
pub struct EnrolResponse {
    /// PEM-encoded device certificate
    pub cert: String,
}

/// Response to pairing enable/disable/status calls
#[derive(Debug, Serialize)]
pub struct PairingResponse {
    /// Whether the pairing window is currently open
    pub enabled: bool,

    /// Seconds until the window closes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in_secs: Option<u64>,

    /// Human-readable confirmation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
