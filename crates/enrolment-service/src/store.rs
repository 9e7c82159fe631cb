//! Device certificate store
//!
//! Certificates live in one directory keyed `<device_id>.crt`. The signing
//! helper writes into a uniquely named pending slot inside the store
//! directory; committing renames the slot over the final path, so a reader
//! can never observe a partially written certificate and re-enrolment
//! atomically replaces the previous one. Writes for the same device are
//! additionally serialized through a per-device lock.

use crate::models::IssuedCertificate;
use broker_common::{Error, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use tempfile::NamedTempFile;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::info;

/// Filesystem-backed certificate store
pub struct CertificateStore {
    dir: PathBuf,
    locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CertificateStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            locks: StdMutex::new(HashMap::new()),
        }
    }

    /// Final path of a device's certificate. `device_id` must already have
    /// passed identifier validation.
    pub fn cert_path(&self, device_id: &str) -> PathBuf {
        self.dir.join(format!("{}.crt", device_id))
    }

    /// Acquire the per-device write lock, serializing overlapping
    /// enrolments for the same identifier.
    pub async fn lock(&self, device_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().expect("store lock poisoned");
            // A strong count of 1 means only the map holds the lock: no
            // task owns or awaits it, so the entry can be dropped.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(device_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn lock_count(&self) -> usize {
        self.locks.lock().expect("store lock poisoned").len()
    }

    /// Create a uniquely named pending output slot for the signing helper.
    /// The slot lives inside the store directory so the later rename stays
    /// on one filesystem; it is deleted on drop unless committed.
    pub fn pending(&self, device_id: &str) -> Result<NamedTempFile> {
        tempfile::Builder::new()
            .prefix(&format!(".pending-{}-", device_id))
            .suffix(".crt")
            .tempfile_in(&self.dir)
            .map_err(|e| Error::StagingFailed(format!("failed to create output slot: {}", e)))
    }

    /// Promote a signed pending slot to `<device_id>.crt` and read the
    /// certificate back for delivery. Both steps happen after signing, so
    /// failures here are `PostSigning`.
    pub fn commit(&self, device_id: &str, pending: NamedTempFile) -> Result<IssuedCertificate> {
        let final_path = self.cert_path(device_id);

        pending
            .persist(&final_path)
            .map_err(|e| Error::PostSigning(format!("failed to install certificate: {}", e)))?;

        let cert_pem = std::fs::read_to_string(&final_path)
            .map_err(|e| Error::PostSigning(format!("failed to read back certificate: {}", e)))?;

        info!("Stored certificate for {}", device_id);

        Ok(IssuedCertificate {
            device_id: device_id.to_string(),
            cert_pem,
            issued_at: Utc::now(),
        })
    }

    /// Read a stored certificate, if the device has one
    pub fn read(&self, device_id: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.cert_path(device_id)) {
            Ok(pem) => Ok(Some(pem)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn store_in(dir: &std::path::Path) -> CertificateStore {
        CertificateStore::new(dir.to_path_buf())
    }

    #[test]
    fn test_commit_installs_certificate() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let mut pending = store.pending("dev1").unwrap();
        pending.write_all(b"CERT ONE").unwrap();

        let issued = store.commit("dev1", pending).unwrap();
        assert_eq!(issued.cert_pem, "CERT ONE");
        assert_eq!(store.read("dev1").unwrap().unwrap(), "CERT ONE");
    }

    #[test]
    fn test_recommit_overwrites_previous_certificate() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let mut first = store.pending("dev1").unwrap();
        first.write_all(b"CERT ONE").unwrap();
        store.commit("dev1", first).unwrap();

        let mut second = store.pending("dev1").unwrap();
        second.write_all(b"CERT TWO").unwrap();
        store.commit("dev1", second).unwrap();

        assert_eq!(store.read("dev1").unwrap().unwrap(), "CERT TWO");
        // Only the final certificate remains in the store
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_dropped_pending_slot_is_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let pending = store.pending("dev1").unwrap();
        drop(pending);

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert!(store.read("dev1").unwrap().is_none());
    }

    #[test]
    fn test_commit_over_obstructed_path_is_post_signing_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        // A directory squatting on the final path makes the rename fail
        std::fs::create_dir(store.cert_path("dev1")).unwrap();

        let mut pending = store.pending("dev1").unwrap();
        pending.write_all(b"CERT ONE").unwrap();

        let err = store.commit("dev1", pending).unwrap_err();
        assert!(matches!(err, Error::PostSigning(_)));

        // The failed pending slot is cleaned up, only the obstruction remains
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_idle_device_locks_are_pruned() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let guard = store.lock("dev1").await;
        assert_eq!(store.lock_count(), 1);
        drop(guard);

        // The next acquisition discards the now-idle dev1 entry
        let _guard = store.lock("dev2").await;
        assert_eq!(store.lock_count(), 1);
    }

    #[test]
    fn test_read_missing_device_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(store.read("unknown").unwrap().is_none());
    }
}
