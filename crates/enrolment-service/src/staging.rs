//! Request-scoped CSR staging
//!
//! Each enrolment request writes its CSR to a uniquely named file in the
//! scratch directory before the signing helper runs. The handle deletes
//! the file when dropped, which covers every exit path of the request,
//! including panics unwinding through the coordinator.

use broker_common::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// A staged CSR awaiting signing. Removed from disk on drop.
#[derive(Debug)]
pub struct StagedCsr {
    file: NamedTempFile,
}

impl StagedCsr {
    /// Location of the staged CSR file
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Scratch directory for staged CSRs
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Write the CSR to a fresh `<device_id>-<random>.csr` file. The random
    /// suffix keeps concurrent requests for the same device from colliding.
    /// The caller must have validated `device_id` already.
    pub fn stage(&self, device_id: &str, csr_pem: &str) -> Result<StagedCsr> {
        let mut file = tempfile::Builder::new()
            .prefix(&format!("{}-", device_id))
            .suffix(".csr")
            .tempfile_in(&self.dir)
            .map_err(|e| Error::StagingFailed(format!("failed to create staging file: {}", e)))?;

        file.write_all(csr_pem.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| Error::StagingFailed(format!("failed to write CSR: {}", e)))?;

        debug!("Staged CSR for {} at {}", device_id, file.path().display());

        Ok(StagedCsr { file })
    }
}
