use std::sync::{Arc, Mutex};

use log::{debug, error};

use super::device::PcmDevice;
use super::error::{DriverError, HalError, Result};
use super::traits::{Mixer, PcmDriver};

/// Number of entries in a hardware channel map
pub const CHANNEL_MAP_LEN: usize = 16;

/// Suffix appended to the endpoint name to form its control name
pub const CHANNEL_MAP_SUFFIX: &str = "Channel Map";

pub type ChannelMap = [u32; CHANNEL_MAP_LEN];

pub fn control_name(device_name: &str) -> String {
    format!("{} {}", device_name, CHANNEL_MAP_SUFFIX)
}

/// Reads per-endpoint channel layouts through one shared mixer handle.
///
/// The handle is opened by the first query for the registry's card and kept
/// until teardown. A failed open is retried by the next query.
pub struct ChannelMapper {
    driver: Arc<dyn PcmDriver>,
    card: u32,
    mixer: Mutex<Option<Box<dyn Mixer>>>,
}

impl ChannelMapper {
    pub fn new(driver: Arc<dyn PcmDriver>, card: u32) -> Self {
        Self {
            driver,
            card,
            mixer: Mutex::new(None),
        }
    }

    pub fn channel_map(&self, device: &PcmDevice) -> Result<ChannelMap> {
        let mut guard = match self.mixer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mixer = match guard.take() {
            Some(mixer) => mixer,
            None => {
                let opened = self.driver.open_mixer(self.card).map_err(|e| {
                    error!("failed to get mixer handle for card {}: {}", self.card, e);
                    HalError::driver(device.pcm_id(), e)
                })?;
                debug!("opened mixer for card {}", self.card);
                opened
            }
        };
        let mixer = guard.insert(mixer);

        let name = control_name(device.name());
        let control = mixer.lookup(&name).map_err(|e| {
            error!("Invalid mixer control: {}", name);
            HalError::driver(device.pcm_id(), e)
        })?;

        let len = CHANNEL_MAP_LEN * std::mem::size_of::<u32>();
        let bytes = mixer.read_array(&control, len).map_err(|e| {
            error!("Failed to read {} for PCM device {}: {}", name, device.pcm_id(), e);
            HalError::driver(device.pcm_id(), e)
        })?;

        decode(&bytes).ok_or_else(|| {
            error!("{} returned {} bytes, expected {}", name, bytes.len(), len);
            HalError::driver(
                device.pcm_id(),
                DriverError::new(
                    "mixer_ctl_get_array",
                    DriverError::EIO,
                    format!("short read from {}: {} of {} bytes", name, bytes.len(), len),
                ),
            )
        })
    }

    pub fn is_open(&self) -> bool {
        self.mixer
            .lock()
            .map(|mixer| mixer.is_some())
            .unwrap_or(false)
    }

    /// Close the shared handle
    pub fn close(&self) {
        let mut mixer = match self.mixer.lock() {
            Ok(mixer) => mixer,
            Err(poisoned) => poisoned.into_inner(),
        };
        *mixer = None;
    }
}

/// Interpret native-endian bytes as a channel map
fn decode(bytes: &[u8]) -> Option<ChannelMap> {
    if bytes.len() < CHANNEL_MAP_LEN * 4 {
        return None;
    }
    let mut map = [0u32; CHANNEL_MAP_LEN];
    for (slot, chunk) in map.iter_mut().zip(bytes.chunks_exact(4)) {
        *slot = u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    Some(map)
}
