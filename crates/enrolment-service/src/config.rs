//! Configuration management for the enrolment service
//!
//! Loads configuration from environment variables with sensible defaults.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server host
    pub host: String,

    /// API server port
    pub port: u16,

    /// CA key/certificate directory (operator-provisioned, only the
    /// signing helper ever reads it)
    pub ca_dir: PathBuf,

    /// Device certificate store directory
    pub devices_dir: PathBuf,

    /// Scratch directory for staged CSRs
    pub staging_dir: PathBuf,

    /// Privileged signing helper executable
    pub signing_helper: PathBuf,

    /// Upper bound on one signing helper invocation
    pub signing_timeout: Duration,

    /// How long one enabled pairing window stays open
    pub pairing_window: Duration,

    /// Optional PIN required to enable pairing
    pub pairing_pin: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let config = Config {
            host: env::var("BROKER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),

            port: env::var("BROKER_PORT")
                .unwrap_or_else(|_| "8443".to_string())
                .parse()
                .context("Invalid BROKER_PORT")?,

            ca_dir: env::var("CA_DIR")
                .unwrap_or_else(|_| "/var/lib/scoring-broker/ca".to_string())
                .into(),

            devices_dir: env::var("DEVICES_DIR")
                .unwrap_or_else(|_| "/var/lib/scoring-broker/devices".to_string())
                .into(),

            staging_dir: env::var("STAGING_DIR")
                .unwrap_or_else(|_| "/var/lib/scoring-broker/staging".to_string())
                .into(),

            signing_helper: env::var("SIGNING_HELPER")
                .unwrap_or_else(|_| "/usr/local/bin/sign-device-cert.sh".to_string())
                .into(),

            signing_timeout: Duration::from_secs(
                env::var("SIGNING_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .context("Invalid SIGNING_TIMEOUT_SECS")?,
            ),

            pairing_window: Duration::from_secs(
                env::var("PAIRING_WINDOW_SECS")
                    .unwrap_or_else(|_| "120".to_string())
                    .parse()
                    .context("Invalid PAIRING_WINDOW_SECS")?,
            ),

            pairing_pin: env::var("PAIRING_PIN").ok().filter(|p| !p.is_empty()),
        };

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("BROKER_PORT must be greater than 0");
        }

        if self.signing_timeout.is_zero() {
            anyhow::bail!("SIGNING_TIMEOUT_SECS must be greater than 0");
        }

        if self.pairing_window.is_zero() {
            anyhow::bail!("PAIRING_WINDOW_SECS must be greater than 0");
        }

        Ok(())
    }

    /// Get the API server address
    pub fn api_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Ensure writable directories exist
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.devices_dir).with_context(|| {
            format!(
                "Failed to create device certificate store: {}",
                self.devices_dir.display()
            )
        })?;

        std::fs::create_dir_all(&self.staging_dir).with_context(|| {
            format!(
                "Failed to create staging directory: {}",
                self.staging_dir.display()
            )
        })?;

        // The CA directory belongs to the signing helper; the broker never
        // reads it, so a missing directory is only worth a warning here.
        if !self.ca_dir.exists() {
            tracing::warn!("CA directory does not exist: {}", self.ca_dir.display());
        }

        Ok(())
    }
}
