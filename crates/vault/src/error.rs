use common::ParseError;
use crypto::GcmError;

/// Top-level error type that the crypto and record layers map into.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("cipher error: {0}")]
    Gcm(GcmError),
    /// The record was altered or belongs to another key, nonce or AAD.
    #[error("record failed authentication")]
    Authentication,
    #[error("nonce counter exhausted for seed {seed:#018x}")]
    NonceExhausted { seed: u64 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<GcmError> for VaultError {
    fn from(e: GcmError) -> Self {
        match e {
            GcmError::AuthenticationFailed => Self::Authentication,
            other => Self::Gcm(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vault_error_from_gcm() {
        assert!(matches!(
            VaultError::from(GcmError::AuthenticationFailed),
            VaultError::Authentication
        ));
        assert!(matches!(
            VaultError::from(GcmError::LengthOverflow),
            VaultError::Gcm(GcmError::LengthOverflow)
        ));
    }

    #[test]
    fn vault_error_display() {
        let e = VaultError::from(ParseError::UnexpectedEof);
        assert_eq!(e.to_string(), "parse error: unexpected end of input");
        let e = VaultError::NonceExhausted { seed: 0xab };
        assert_eq!(e.to_string(), "nonce counter exhausted for seed 0x00000000000000ab");
    }
}
