use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::hal::device::{DEFAULT_PERIOD_BUFFER_BYTES, DEFAULT_PERIOD_COUNT};
use crate::hal::drivers::Backend;

/// Discovery retry policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Total discovery attempts before giving up
    pub max_retries: u32,
    pub retry_interval_ms: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 100,
            retry_interval_ms: 1000,
        }
    }
}

impl DiscoveryConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

/// Hardware period sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PcmConfig {
    pub period_buffer_bytes: u32,
    pub period_count: u32,
}

impl Default for PcmConfig {
    fn default() -> Self {
        Self {
            period_buffer_bytes: DEFAULT_PERIOD_BUFFER_BYTES,
            period_count: DEFAULT_PERIOD_COUNT,
        }
    }
}

/// Service configuration file format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Kernel listing of registered PCM endpoints
    pub enumeration_path: PathBuf,
    /// Platform node told about endpoint enable/disable
    pub notification_path: PathBuf,
    pub discovery: DiscoveryConfig,
    pub pcm: PcmConfig,
    pub backend: Backend,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            enumeration_path: PathBuf::from("/proc/asound/pcm"),
            notification_path: PathBuf::from("/sys/kernel/aud_dev/state"),
            discovery: DiscoveryConfig::default(),
            pcm: PcmConfig::default(),
            backend: Backend::default(),
        }
    }
}

impl ServiceConfig {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {:?}", path))?;

        let config: ServiceConfig = serde_json::from_str(&content)
            .context("Failed to parse config JSON")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.discovery.max_retries == 0 {
            anyhow::bail!("discovery.max_retries must be at least 1");
        }
        if self.pcm.period_buffer_bytes == 0 || self.pcm.period_count == 0 {
            anyhow::bail!("pcm period buffer and count must be non-zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_partial_config_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pcmhal.json");
        fs::write(&path, r#"{"backend": "simulated", "discovery": {"max_retries": 3}}"#)
            .await
            .unwrap();

        let config = ServiceConfig::load(&path).await.unwrap();
        assert_eq!(config.backend, Backend::Simulated);
        assert_eq!(config.discovery.max_retries, 3);
        assert_eq!(config.discovery.retry_interval_ms, 1000);
        assert_eq!(config.pcm.period_buffer_bytes, 8192);
        assert_eq!(config.enumeration_path, PathBuf::from("/proc/asound/pcm"));
    }

    #[tokio::test]
    async fn test_load_rejects_zero_retries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pcmhal.json");
        fs::write(&path, r#"{"discovery": {"max_retries": 0}}"#).await.unwrap();

        assert!(ServiceConfig::load(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_load_missing_file_has_context() {
        let dir = tempdir().unwrap();
        let err = ServiceConfig::load(dir.path().join("absent.json")).await.unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
