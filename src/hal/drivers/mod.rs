//! Native driver backends and backend selection.

#[cfg(all(feature = "alsa", target_os = "linux"))]
pub mod alsa_lib;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::mock::SimulatedDriver;
use super::traits::PcmDriver;

#[cfg(all(feature = "alsa", target_os = "linux"))]
pub use self::alsa_lib::AlsaDriver;

/// Driver backend chosen by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// alsa-lib (`hw:<card>,<pcm>`)
    Alsa,
    /// In-process backend without hardware
    Simulated,
}

impl Default for Backend {
    fn default() -> Self {
        Backend::Alsa
    }
}

/// Instantiate the configured backend
pub fn select(backend: Backend) -> anyhow::Result<Arc<dyn PcmDriver>> {
    match backend {
        Backend::Simulated => Ok(Arc::new(SimulatedDriver::new())),
        #[cfg(all(feature = "alsa", target_os = "linux"))]
        Backend::Alsa => Ok(Arc::new(AlsaDriver::new())),
        #[cfg(not(all(feature = "alsa", target_os = "linux")))]
        Backend::Alsa => anyhow::bail!("alsa backend requested but pcmhal was built without the `alsa` feature"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_simulated() {
        let driver = select(Backend::Simulated).unwrap();
        assert_eq!(driver.driver_id(), "simulated");
    }

    #[test]
    fn test_backend_json_names() {
        assert_eq!(serde_json::to_string(&Backend::Alsa).unwrap(), "\"alsa\"");
        let parsed: Backend = serde_json::from_str("\"simulated\"").unwrap();
        assert_eq!(parsed, Backend::Simulated);
    }
}
