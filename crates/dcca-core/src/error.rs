use dcca_shared::{
    RESULT_CODE_UNABLE_TO_COMPLY, RESULT_CODE_UNABLE_TO_DELIVER,
};
use thiserror::Error;

/// Main error type for the credit-control endpoints
#[derive(Error, Debug)]
pub enum DccaError {
    // ========================================
    // Protocol Errors
    // ========================================
    #[error("Invalid Diameter packet: {0}")]
    InvalidPacket(String),

    #[error("Missing required AVP: {0}")]
    MissingAvp(u32),

    #[error("Invalid AVP value for code {code}: {reason}")]
    InvalidAvpValue { code: u32, reason: String },

    // ========================================
    // Peer Errors
    // ========================================
    #[error("Capabilities exchange failed: {0}")]
    CapabilitiesExchange(String),

    #[error("Answer timeout after {0}ms")]
    AnswerTimeout(u64),

    #[error("Peer disconnected")]
    Disconnected,

    // ========================================
    // System Errors
    // ========================================
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ========================================
    // Network Errors
    // ========================================
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DccaError {
    /// Convert error to the Result-Code sent back to the peer
    pub fn to_result_code(&self) -> u32 {
        match self {
            // Credit-control answers report every malformed request as UNABLE_TO_COMPLY
            Self::MissingAvp(_) | Self::InvalidAvpValue { .. } => RESULT_CODE_UNABLE_TO_COMPLY,
            Self::InvalidPacket(_) => 3008, // DIAMETER_INVALID_HDR_BITS
            Self::AnswerTimeout(_) | Self::Disconnected => RESULT_CODE_UNABLE_TO_DELIVER,
            _ => RESULT_CODE_UNABLE_TO_COMPLY,
        }
    }

    /// Log level an error is reported at
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::MissingAvp(_) | Self::InvalidAvpValue { .. } => ErrorSeverity::Warning,
            Self::InvalidPacket(_) | Self::AnswerTimeout(_) | Self::Disconnected => {
                ErrorSeverity::Error
            }
            Self::CapabilitiesExchange(_) | Self::ConfigError(_) => ErrorSeverity::Critical,
            Self::Io(_) => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Result type alias for credit-control operations
pub type Result<T> = std::result::Result<T, DccaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_to_result_code() {
        assert_eq!(DccaError::MissingAvp(437).to_result_code(), 5012);
        assert_eq!(
            DccaError::InvalidAvpValue { code: 416, reason: "4".to_string() }.to_result_code(),
            5012
        );
        assert_eq!(DccaError::AnswerTimeout(5000).to_result_code(), 3002);
    }

    #[test]
    fn test_error_severity() {
        assert_eq!(DccaError::MissingAvp(437).severity(), ErrorSeverity::Warning);
        assert_eq!(
            DccaError::CapabilitiesExchange("3010".to_string()).severity(),
            ErrorSeverity::Critical
        );
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(ErrorSeverity::Warning.to_string(), "warning");
        assert_eq!(ErrorSeverity::Critical.to_string(), "critical");
    }
}
