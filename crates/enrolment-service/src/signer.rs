//! Privileged signing delegation
//!
//! The broker never touches the CA key itself. Signing is delegated to a
//! pre-registered helper executable that runs with the privilege needed to
//! read the key, invoked with an explicit two-path argument vector and no
//! shell in between. Request-derived values therefore can never be
//! interpreted as shell directives.

use broker_common::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Invoker for the external CA signing helper
#[derive(Debug, Clone)]
pub struct SigningInvoker {
    helper: PathBuf,
    timeout: Duration,
}

impl SigningInvoker {
    pub fn new(helper: PathBuf, timeout: Duration) -> Self {
        Self { helper, timeout }
    }

    /// Run the helper as `helper <csr_path> <cert_out>`. A non-zero exit or
    /// a run exceeding the timeout yields `SigningFailed` carrying the
    /// helper's stderr; the helper is killed if the timeout elapses.
    pub async fn sign(&self, csr_path: &Path, cert_out: &Path) -> Result<()> {
        debug!(
            "Invoking signing helper {} for {}",
            self.helper.display(),
            csr_path.display()
        );

        let output = Command::new(&self.helper)
            .arg(csr_path)
            .arg(cert_out)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, output).await {
            Ok(result) => result.map_err(|e| {
                Error::SigningFailed(format!(
                    "failed to run signing helper {}: {}",
                    self.helper.display(),
                    e
                ))
            })?,
            Err(_) => {
                warn!(
                    "Signing helper timed out after {}s",
                    self.timeout.as_secs()
                );
                return Err(Error::SigningFailed(format!(
                    "signing helper timed out after {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("Signing helper failed: {}", stderr.trim());
            return Err(Error::SigningFailed(format!(
                "signing helper exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    /// Install an executable helper script in `dir`
    fn fake_helper(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-signer.sh");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "#!/bin/sh").unwrap();
        writeln!(file, "{}", body).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_successful_helper_writes_certificate() {
        let dir = tempfile::tempdir().unwrap();
        let helper = fake_helper(dir.path(), "cp \"$1\" \"$2\"");

        let csr = dir.path().join("dev1.csr");
        std::fs::write(&csr, "csr body").unwrap();
        let out = dir.path().join("dev1.crt");

        let invoker = SigningInvoker::new(helper, Duration::from_secs(5));
        invoker.sign(&csr, &out).await.unwrap();

        assert_eq!(std::fs::read_to_string(&out).unwrap(), "csr body");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_signing_failure_with_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let helper = fake_helper(dir.path(), "echo 'bad csr' >&2; exit 3");

        let csr = dir.path().join("dev1.csr");
        std::fs::write(&csr, "csr body").unwrap();
        let out = dir.path().join("dev1.crt");

        let invoker = SigningInvoker::new(helper, Duration::from_secs(5));
        let err = invoker.sign(&csr, &out).await.unwrap_err();

        match err {
            Error::SigningFailed(msg) => assert!(msg.contains("bad csr")),
            other => panic!("unexpected error: {}", other),
        }
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_slow_helper_hits_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let helper = fake_helper(dir.path(), "sleep 5");

        let csr = dir.path().join("dev1.csr");
        std::fs::write(&csr, "csr body").unwrap();
        let out = dir.path().join("dev1.crt");

        let invoker = SigningInvoker::new(helper, Duration::from_millis(100));
        let err = invoker.sign(&csr, &out).await.unwrap_err();

        match err {
            Error::SigningFailed(msg) => assert!(msg.contains("timed out")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_helper_is_signing_failure() {
        let dir = tempfile::tempdir().unwrap();
        let csr = dir.path().join("dev1.csr");
        std::fs::write(&csr, "csr body").unwrap();

        let invoker = SigningInvoker::new(
            PathBuf::from("/nonexistent/signer"),
            Duration::from_secs(5),
        );
        let err = invoker.sign(&csr, &dir.path().join("dev1.crt")).await;
        assert!(matches!(err, Err(Error::SigningFailed(_))));
    }
}
