/// Emit a `tracing` event at the level matching an `ErrorSeverity`.
///
/// Warnings go out through `warn!`. Errors and critical failures go out
/// through `error!`, told apart by the `severity` field.
#[macro_export]
macro_rules! log_by_severity {
    ($severity:expr, $($arg:tt)+) => {
        match $severity {
            severity @ $crate::ErrorSeverity::Warning => ::tracing::warn!(%severity, $($arg)+),
            severity => ::tracing::error!(%severity, $($arg)+),
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::ErrorSeverity;
    use dcca_core::DccaError;

    #[test]
    fn test_log_by_severity_accepts_fields() {
        dcca_logging::init_test();
        let peer = "127.0.0.1:3868";

        for e in [
            DccaError::MissingAvp(263),
            DccaError::Disconnected,
            DccaError::ConfigError("no origin".to_string()),
        ] {
            crate::log_by_severity!(e.severity(), %peer, error = %e, "Connection error");
        }
        crate::log_by_severity!(ErrorSeverity::Critical, "Shutting down");
    }
}
