use thiserror::Error;

/// Main error type for Krill operations
#[derive(Error, Debug)]
pub enum KrillError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt posting block: docids length {docids_len} != freqs length {freqs_len}")]
    BlockLengthMismatch { docids_len: u32, freqs_len: u32 },

    #[error("Varbyte value exceeds 32 bits")]
    VarbyteOverflow,

    #[error("Unexpected end of varbyte stream")]
    VarbyteEof,

    #[error("Index error: {0}")]
    IndexError(String),
}

/// Result type alias for Krill operations
pub type Result<T> = std::result::Result<T, KrillError>;

impl KrillError {
    /// Check if this error means a posting stream is unreadable past this point
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            KrillError::BlockLengthMismatch { .. }
                | KrillError::VarbyteOverflow
                | KrillError::VarbyteEof
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KrillError::BlockLengthMismatch {
            docids_len: 128,
            freqs_len: 64,
        };
        assert_eq!(
            err.to_string(),
            "Corrupt posting block: docids length 128 != freqs length 64"
        );
    }

    #[test]
    fn test_corruption_classification() {
        assert!(KrillError::VarbyteOverflow.is_corruption());
        assert!(KrillError::VarbyteEof.is_corruption());
        assert!(!KrillError::IndexError("x".to_string()).is_corruption());
    }
}
