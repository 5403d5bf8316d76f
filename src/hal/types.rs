use serde::{Deserialize, Serialize};

/// Stream direction of a hardware endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Playback (RX from the DSP's point of view)
    Output,
    /// Capture (TX)
    Input,
}

/// Lifecycle state of a PCM device.
///
/// Declaration order matters: `start` is only legal from `Prepared` or later,
/// which includes `Stopped` so a stopped device restarts without re-preparing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeviceState {
    Closed,
    Opened,
    Prepared,
    Started,
    Stopped,
}

impl Default for DeviceState {
    fn default() -> Self {
        DeviceState::Closed
    }
}

impl DeviceState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Closed => "Closed",
            Self::Opened => "Opened",
            Self::Prepared => "Prepared",
            Self::Started => "Started",
            Self::Stopped => "Stopped",
        }
    }
}

/// Media format requested by the layers above this subsystem.
///
/// Only the PCM variants have a native hardware counterpart; everything else
/// is carried over the link as 16-bit PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaFormat {
    PcmS8,
    PcmS16Le,
    /// 24 valid bits in a 4-byte container
    PcmS24Le,
    /// 24 bits packed in 3 bytes
    PcmS24_3Le,
    PcmS32Le,
    Mp3,
    Aac,
    Flac,
    Vorbis,
}

impl Default for MediaFormat {
    fn default() -> Self {
        MediaFormat::PcmS16Le
    }
}

/// How the payload travels over the PCM link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataFormat {
    FixedPoint,
    CompressedOverPcm,
}

impl Default for DataFormat {
    fn default() -> Self {
        DataFormat::FixedPoint
    }
}

/// Media configuration applied to the hardware on first open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MediaConfig {
    pub channels: u32,
    pub rate: u32,
    pub format: MediaFormat,
    pub data_format: DataFormat,
}

/// External address of a PCM endpoint: `hw:<card>,<pcm>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeviceId {
    pub card: u32,
    pub pcm: u32,
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "hw:{},{}", self.card, self.pcm)
    }
}

/// Summary handed to callers enumerating audio interfaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointInfo {
    pub name: String,
    pub direction: Direction,
}

/// Snapshot of the three reference counts guarding a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefCounts {
    pub open: u32,
    pub prepare: u32,
    pub start: u32,
}

/// Opaque metadata blob attached to a device.
///
/// The bytes are copied in on set and released on replace or teardown.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Metadata {
    bytes: Vec<u8>,
}

impl Metadata {
    pub fn copy_from(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_ordering_allows_restart_from_stopped() {
        assert!(DeviceState::Stopped >= DeviceState::Prepared);
        assert!(DeviceState::Started >= DeviceState::Prepared);
        assert!(DeviceState::Opened < DeviceState::Prepared);
        assert!(DeviceState::Closed < DeviceState::Prepared);
    }

    #[test]
    fn test_device_id_display() {
        let id = DeviceId { card: 0, pcm: 12 };
        assert_eq!(id.to_string(), "hw:0,12");
    }

    #[test]
    fn test_media_config_json_format() {
        let config = MediaConfig {
            channels: 2,
            rate: 48000,
            format: MediaFormat::PcmS24_3Le,
            data_format: DataFormat::FixedPoint,
        };

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"PcmS24_3Le\""));
        let parsed: MediaConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
