//! Data integrity utilities
//!
//! Model artifacts can be pinned with a CRC-32 in the configuration; a
//! mismatch means the file on disk is not the one the deployment expects.

use std::fmt;

/// Data integrity error types
#[derive(Debug, Clone, PartialEq)]
pub enum IntegrityError {
    /// CRC mismatch
    CrcMismatch {
        expected: u32,
        actual: u32,
        context: String,
    },
    /// Nothing to check
    EmptyData { context: String },
}

impl fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityError::CrcMismatch { expected, actual, context } => {
                write!(
                    f,
                    "CRC-32 mismatch in {}: expected 0x{:08X}, got 0x{:08X}",
                    context, expected, actual
                )
            }
            IntegrityError::EmptyData { context } => {
                write!(f, "No data to verify in {}", context)
            }
        }
    }
}

impl std::error::Error for IntegrityError {}

/// Result type for integrity operations
pub type IntegrityResult<T> = Result<T, IntegrityError>;

/// Standard CRC-32 (IEEE) of `data`
pub fn calculate_crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Verify `data` against an expected CRC-32
pub fn verify_crc32(data: &[u8], expected: u32, context: &str) -> IntegrityResult<()> {
    if data.is_empty() {
        return Err(IntegrityError::EmptyData {
            context: context.to_string(),
        });
    }

    let actual = calculate_crc32(data);
    if actual != expected {
        return Err(IntegrityError::CrcMismatch {
            expected,
            actual,
            context: context.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_check_value() {
        // Standard CRC-32 check input
        assert_eq!(calculate_crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn test_verify_crc32() {
        let data = br#"{"format":"linear"}"#;
        let crc = calculate_crc32(data);

        assert!(verify_crc32(data, crc, "model").is_ok());

        let err = verify_crc32(data, crc ^ 1, "sys.json").unwrap_err();
        assert!(matches!(err, IntegrityError::CrcMismatch { .. }));
        assert!(err.to_string().contains("sys.json"));
    }

    #[test]
    fn test_empty_data_rejected() {
        assert_eq!(
            verify_crc32(&[], 0, "dys.json"),
            Err(IntegrityError::EmptyData {
                context: "dys.json".to_string()
            })
        );
    }
}
