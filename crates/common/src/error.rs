use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Pairing window closed")]
    PairingClosed,

    #[error("Invalid device identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid CSR: {0}")]
    InvalidCsr(String),

    #[error("CSR staging failed: {0}")]
    StagingFailed(String),

    #[error("Certificate signing failed: {0}")]
    SigningFailed(String),

    #[error("Certificate signed but delivery failed: {0}")]
    PostSigning(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
