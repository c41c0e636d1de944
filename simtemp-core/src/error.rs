use thiserror::Error;

/// Every failure the device hands back to its callers.
///
/// All variants except [`DeviceError::Startup`] are recoverable by the caller;
/// the read-side ones (`WouldBlock`, `TimedOut`, `TryAgain`, `Interrupted`)
/// are expected steady-state outcomes.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No sample available")]
    WouldBlock,

    #[error("Timed out waiting for a sample")]
    TimedOut,

    #[error("Wait interrupted by cancellation")]
    Interrupted,

    #[error("Sample was consumed by another reader, try again")]
    TryAgain,

    #[error("Permission denied: {0} is read-only")]
    PermissionDenied(&'static str),

    #[error("Device is not running")]
    NotReady,

    #[error("Failed to arm sample generator: {0}")]
    Startup(#[from] std::io::Error),
}

impl DeviceError {
    /// POSIX errno equivalent, for collaborators that speak errno.
    pub fn errno(&self) -> i32 {
        match self {
            DeviceError::InvalidArgument(_) => 22,
            DeviceError::WouldBlock | DeviceError::TryAgain => 11,
            DeviceError::TimedOut => 110,
            DeviceError::Interrupted => 4,
            DeviceError::PermissionDenied(_) => 13,
            DeviceError::NotReady => 19,
            DeviceError::Startup(_) => 5,
        }
    }

    /// Short stable name, used as a metrics label.
    pub fn name(&self) -> &'static str {
        match self {
            DeviceError::InvalidArgument(_) => "invalid_argument",
            DeviceError::WouldBlock => "would_block",
            DeviceError::TimedOut => "timed_out",
            DeviceError::Interrupted => "interrupted",
            DeviceError::TryAgain => "try_again",
            DeviceError::PermissionDenied(_) => "permission_denied",
            DeviceError::NotReady => "not_ready",
            DeviceError::Startup(_) => "startup",
        }
    }

    /// True for read outcomes a caller should simply retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DeviceError::WouldBlock
                | DeviceError::TimedOut
                | DeviceError::TryAgain
                | DeviceError::Interrupted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_read_outcomes() {
        assert!(DeviceError::WouldBlock.is_transient());
        assert!(DeviceError::TryAgain.is_transient());
        assert!(!DeviceError::NotReady.is_transient());
        assert!(!DeviceError::InvalidArgument("x".into()).is_transient());
    }

    #[test]
    fn errno_matches_posix_codes() {
        assert_eq!(DeviceError::WouldBlock.errno(), 11);
        assert_eq!(DeviceError::TimedOut.errno(), 110);
        assert_eq!(DeviceError::PermissionDenied("stats").errno(), 13);
    }
}
