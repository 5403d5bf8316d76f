use std::io;
use thiserror::Error;

/// Failure reported by a driver backend, passed upward untouched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{op} failed: {message} (errno {errno})")]
pub struct DriverError {
    /// Driver call that failed (e.g. "pcm_open", "mixer_get_array")
    pub op: &'static str,
    /// Negative errno as returned by the driver, or -EIO when it gave none
    pub errno: i32,
    pub message: String,
}

impl DriverError {
    pub const EIO: i32 = -5;
    pub const ENOENT: i32 = -2;
    pub const EINVAL: i32 = -22;

    pub fn new(op: &'static str, errno: i32, message: impl Into<String>) -> Self {
        Self {
            op,
            errno,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum HalError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("PCM device {endpoint}: {reason}")]
    OrderingViolation { endpoint: u32, reason: &'static str },

    #[error("PCM device {endpoint}: {source}")]
    Driver {
        endpoint: u32,
        #[source]
        source: DriverError,
    },

    #[error("out of memory: {0}")]
    ResourceExhausted(String),

    #[error("no valid sound endpoint registered yet")]
    DiscoveryRetryable,

    #[error("cannot read PCM enumeration source: {source}")]
    DiscoveryFatal {
        #[source]
        source: io::Error,
    },

    #[error("PCM device {endpoint}: {reason}")]
    ContractViolation { endpoint: u32, reason: &'static str },
}

impl HalError {
    pub fn driver(endpoint: u32, source: DriverError) -> Self {
        HalError::Driver { endpoint, source }
    }

    /// Whether discovery should be attempted again
    pub fn is_retryable(&self) -> bool {
        matches!(self, HalError::DiscoveryRetryable)
    }

    /// Driver errno for pass-through to callers that speak errno
    pub fn errno(&self) -> i32 {
        match self {
            HalError::InvalidArgument(_) | HalError::ContractViolation { .. } => -22,
            HalError::OrderingViolation { .. } => -1,
            HalError::Driver { source, .. } => source.errno,
            HalError::ResourceExhausted(_) => -12,
            HalError::DiscoveryRetryable => -11,
            HalError::DiscoveryFatal { .. } => -19,
        }
    }
}

pub type Result<T> = std::result::Result<T, HalError>;
