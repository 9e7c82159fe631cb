//! Enrolment coordinator
//!
//! Walks one enrolment request through authorization, validation, staging,
//! signing and delivery. The staged CSR and the pending output slot are
//! RAII handles, so every failure exit leaves the scratch area and the
//! store directory free of request debris.

use crate::config::Config;
use crate::models::IssuedCertificate;
use crate::pairing::PairingWindow;
use crate::signer::SigningInvoker;
use crate::staging::StagingArea;
use crate::store::CertificateStore;
use crate::validate;
use broker_common::{Error, Result};
use tracing::info;

/// Core enrolment service shared across request handlers
pub struct EnrolmentService {
    pairing: PairingWindow,
    staging: StagingArea,
    signer: SigningInvoker,
    store: CertificateStore,
}

impl EnrolmentService {
    /// Build the service from configuration
    pub fn new(config: &Config) -> Self {
        Self {
            pairing: PairingWindow::new(config.pairing_window),
            staging: StagingArea::new(config.staging_dir.clone()),
            signer: SigningInvoker::new(config.signing_helper.clone(), config.signing_timeout),
            store: CertificateStore::new(config.devices_dir.clone()),
        }
    }

    /// Pairing window controller
    pub fn pairing(&self) -> &PairingWindow {
        &self.pairing
    }

    /// Certificate store
    pub fn store(&self) -> &CertificateStore {
        &self.store
    }

    /// Enrol a device: check the pairing window, validate input, stage the
    /// CSR, delegate signing and deliver the stored certificate.
    pub async fn enrol(&self, device_id: &str, csr_pem: &str) -> Result<IssuedCertificate> {
        if !self.pairing.is_authorized() {
            return Err(Error::PairingClosed);
        }

        validate::device_id(device_id)?;
        validate::csr_pem(csr_pem)?;

        let staged = self.staging.stage(device_id, csr_pem)?;

        // Serialize signing and store writes per device so overlapping
        // requests for one identifier cannot interleave.
        let _guard = self.store.lock(device_id).await;

        let pending = self.store.pending(device_id)?;
        self.signer.sign(staged.path(), pending.path()).await?;

        let issued = self.store.commit(device_id, pending)?;

        info!("Device {} enrolled successfully", device_id);
        Ok(issued)
    }
}
