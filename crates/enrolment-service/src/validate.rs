//! Input validation for enrolment requests
//!
//! Device identifiers end up as filesystem path components and as signing
//! helper arguments, so this is the sole gate against path traversal and
//! argument injection. Both checks run before anything touches disk.

use broker_common::{Error, Result};

/// Maximum accepted device identifier length
pub const MAX_DEVICE_ID_LEN: usize = 64;

/// Hard cap on CSR payload size
pub const MAX_CSR_BYTES: usize = 16 * 1024;

const CSR_HEADER: &str = "-----BEGIN CERTIFICATE REQUEST-----";
const CSR_FOOTER: &str = "-----END CERTIFICATE REQUEST-----";

/// Validate a candidate device identifier against the allow-list grammar:
/// 1-64 characters, leading ASCII alphanumeric, then alphanumerics,
/// hyphen or underscore.
pub fn device_id(candidate: &str) -> Result<()> {
    if candidate.is_empty() {
        return Err(Error::InvalidIdentifier("empty identifier".to_string()));
    }

    if candidate.len() > MAX_DEVICE_ID_LEN {
        return Err(Error::InvalidIdentifier(format!(
            "identifier exceeds {} characters",
            MAX_DEVICE_ID_LEN
        )));
    }

    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {}
        _ => {
            return Err(Error::InvalidIdentifier(
                "identifier must start with an ASCII letter or digit".to_string(),
            ));
        }
    }

    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(Error::InvalidIdentifier(
            "identifier may only contain ASCII letters, digits, '-' and '_'".to_string(),
        ));
    }

    Ok(())
}

/// Validate that a CSR payload is a plausibly PEM-encoded certificate
/// request: bounded in size and carrying the expected header/footer lines.
pub fn csr_pem(candidate: &str) -> Result<()> {
    if candidate.len() > MAX_CSR_BYTES {
        return Err(Error::InvalidCsr(format!(
            "CSR exceeds {} byte limit",
            MAX_CSR_BYTES
        )));
    }

    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidCsr("empty CSR".to_string()));
    }

    if !trimmed.starts_with(CSR_HEADER) {
        return Err(Error::InvalidCsr(
            "missing PEM certificate request header".to_string(),
        ));
    }

    if !trimmed.ends_with(CSR_FOOTER) {
        return Err(Error::InvalidCsr(
            "missing PEM certificate request footer".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_typical_identifiers() {
        for id in ["piste-3-display", "sensor_07", "DEV42", "a", "0box"] {
            assert!(device_id(id).is_ok(), "rejected {}", id);
        }
    }

    #[test]
    fn test_rejects_path_traversal() {
        for id in ["../etc", "..", "a/b", "a\\b", ".hidden", "/abs"] {
            assert!(device_id(id).is_err(), "accepted {}", id);
        }
    }

    #[test]
    fn test_rejects_shell_metacharacters() {
        for id in ["a;rm -rf /", "a|b", "$(reboot)", "a b", "a&b", "a`b`"] {
            assert!(device_id(id).is_err(), "accepted {}", id);
        }
    }

    #[test]
    fn test_rejects_empty_and_oversized_identifiers() {
        assert!(device_id("").is_err());
        assert!(device_id(&"x".repeat(MAX_DEVICE_ID_LEN)).is_ok());
        assert!(device_id(&"x".repeat(MAX_DEVICE_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_accepts_pem_csr() {
        let csr = "-----BEGIN CERTIFICATE REQUEST-----\nMIIB\n-----END CERTIFICATE REQUEST-----\n";
        assert!(csr_pem(csr).is_ok());
    }

    #[test]
    fn test_rejects_non_pem_payloads() {
        assert!(csr_pem("").is_err());
        assert!(csr_pem("not a csr").is_err());
        assert!(csr_pem("-----BEGIN CERTIFICATE REQUEST-----\ntruncated").is_err());
        // A certificate is not a certificate request
        let cert = "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----";
        assert!(csr_pem(cert).is_err());
    }

    #[test]
    fn test_rejects_oversized_csr() {
        let body = "A".repeat(MAX_CSR_BYTES);
        let csr = format!(
            "-----BEGIN CERTIFICATE REQUEST-----\n{}\n-----END CERTIFICATE REQUEST-----",
            body
        );
        assert!(csr_pem(&csr).is_err());
    }
}
