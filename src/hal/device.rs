use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, error, info, warn};

use super::discovery::DiscoveredEndpoint;
use super::endpoint::HwEndpointInfo;
use super::error::{HalError, Result};
use super::format_converter::{period_size, to_pcm_format};
use super::lifecycle::{DeviceLifecycle, Rejected, Step};
use super::notify::{DeviceEvent, NotificationSink};
use super::traits::{PcmDriver, PcmOpenParams, PcmStream};
use super::types::{DeviceId, DeviceState, Direction, MediaConfig, Metadata, RefCounts};

/// Largest period, in bytes, the front-end DAI accepts
pub const DEFAULT_PERIOD_BUFFER_BYTES: u32 = 8192;
pub const DEFAULT_PERIOD_COUNT: u32 = 2;

/// Collaborators shared by every device of one registry
pub struct DeviceContext {
    pub driver: Arc<dyn PcmDriver>,
    pub notifier: NotificationSink,
    pub period_buffer_bytes: u32,
    pub period_count: u32,
}

impl DeviceContext {
    pub fn new(driver: Arc<dyn PcmDriver>, notifier: NotificationSink) -> Self {
        Self {
            driver,
            notifier,
            period_buffer_bytes: DEFAULT_PERIOD_BUFFER_BYTES,
            period_count: DEFAULT_PERIOD_COUNT,
        }
    }
}

#[derive(Default)]
struct DeviceInner {
    lifecycle: DeviceLifecycle,
    media_config: Option<MediaConfig>,
    stream: Option<Box<dyn PcmStream>>,
    params: Option<Vec<u8>>,
    metadata: Option<Metadata>,
}

/// One physical PCM endpoint.
///
/// Identity fields are fixed at discovery. Everything mutable sits behind a
/// single per-device lock held for the whole of each operation, driver call
/// included, so operations on one device serialize while different devices
/// proceed in parallel.
pub struct PcmDevice {
    id: DeviceId,
    name: String,
    hw_ep_info: HwEndpointInfo,
    ctx: Arc<DeviceContext>,
    inner: Mutex<DeviceInner>,
}

impl std::fmt::Debug for PcmDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PcmDevice")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("direction", &self.hw_ep_info.direction)
            .finish()
    }
}

impl PcmDevice {
    pub fn new(endpoint: DiscoveredEndpoint, ctx: Arc<DeviceContext>) -> Self {
        Self {
            id: endpoint.id,
            name: endpoint.name,
            hw_ep_info: endpoint.hw_ep_info,
            ctx,
            inner: Mutex::new(DeviceInner::default()),
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn pcm_id(&self) -> u32 {
        self.id.pcm
    }

    pub fn card_id(&self) -> u32 {
        self.id.card
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.hw_ep_info.direction
    }

    pub fn hw_ep_info(&self) -> &HwEndpointInfo {
        &self.hw_ep_info
    }

    fn lock(&self) -> MutexGuard<'_, DeviceInner> {
        // A panicking holder cannot leave the counts half-updated: every
        // mutation is a single lifecycle call.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn rejected(&self, rejected: Rejected) -> HalError {
        error!("PCM device {} {}", self.id.pcm, rejected.reason());
        match rejected {
            Rejected::NotOpen => HalError::ContractViolation {
                endpoint: self.id.pcm,
                reason: rejected.reason(),
            },
            Rejected::NotOpened | Rejected::NotPrepared => HalError::OrderingViolation {
                endpoint: self.id.pcm,
                reason: rejected.reason(),
            },
        }
    }

    /// Open the hardware on first use; later openers share the stream.
    pub fn open(&self) -> Result<()> {
        let mut inner = self.lock();

        if inner.lifecycle.open() == Step::Shared {
            info!("PCM device {} already opened", self.id.pcm);
            return Ok(());
        }

        let config = inner.media_config.ok_or_else(|| {
            error!("PCM device {} has no media config", self.id.pcm);
            HalError::InvalidArgument(format!("PCM device {} has no media config", self.id.pcm))
        })?;

        let period_size = period_size(self.ctx.period_buffer_bytes, config.channels, config.format)?;
        let params = PcmOpenParams {
            card: self.id.card,
            device: self.id.pcm,
            direction: self.hw_ep_info.direction,
            format: to_pcm_format(config.format),
            rate: config.rate,
            channels: config.channels,
            period_size,
            period_count: self.ctx.period_count,
            start_threshold: period_size / 4,
            stop_threshold: i32::MAX as u32,
        };

        let stream = self.ctx.driver.open_pcm(&params).map_err(|e| {
            error!(
                "Unable to open PCM device {} ({}) rate {} ch {} fmt {:?} period size {}",
                self.id.pcm, e, params.rate, params.channels, params.format, params.period_size
            );
            HalError::driver(self.id.pcm, e)
        })?;

        self.ctx.notifier.notify(self.id.pcm, DeviceEvent::Enabled);
        inner.stream = Some(stream);
        inner.lifecycle.opened();
        Ok(())
    }

    pub fn prepare(&self) -> Result<()> {
        let mut inner = self.lock();

        match inner.lifecycle.prepare() {
            Err(rejected) => return Err(self.rejected(rejected)),
            Ok(Step::Shared) => {
                debug!("PCM device {} already in prepare state", self.id.pcm);
                return Ok(());
            }
            Ok(_) => {}
        }

        let result = match inner.stream.as_mut() {
            Some(stream) => stream.prepare(),
            None => return Err(self.rejected(Rejected::NotOpened)),
        };
        if let Err(e) = result {
            error!("PCM device {} prepare failed: {}", self.id.pcm, e);
            return Err(HalError::driver(self.id.pcm, e));
        }

        inner.lifecycle.prepared();
        Ok(())
    }

    /// Logical start. Data flows once the owning stream reads or writes.
    pub fn start(&self) -> Result<()> {
        let mut inner = self.lock();

        match inner.lifecycle.start() {
            Err(rejected) => Err(self.rejected(rejected)),
            Ok(Step::Shared) => {
                info!("PCM device {} already in start state", self.id.pcm);
                Ok(())
            }
            Ok(_) => Ok(()),
        }
    }

    /// The last stopper halts the hardware. Stopping an idle device succeeds.
    pub fn stop(&self) -> Result<()> {
        let mut inner = self.lock();

        match inner.lifecycle.stop() {
            Step::Noop => {
                debug!("PCM device {} already stopped", self.id.pcm);
                Ok(())
            }
            Step::Shared => Ok(()),
            Step::Driver => {
                let Some(stream) = inner.stream.as_mut() else {
                    return Ok(());
                };
                stream.stop().map_err(|e| {
                    error!("PCM device {} stop failed: {}", self.id.pcm, e);
                    HalError::driver(self.id.pcm, e)
                })
            }
        }
    }

    /// The last closer releases the hardware and resets the lifecycle.
    pub fn close(&self) -> Result<()> {
        let mut inner = self.lock();

        match inner.lifecycle.close() {
            Err(rejected) => Err(self.rejected(rejected)),
            Ok(Step::Driver) => {
                self.ctx.notifier.notify(self.id.pcm, DeviceEvent::Disabled);
                let Some(stream) = inner.stream.take() else {
                    return Ok(());
                };
                stream.close().map_err(|e| {
                    error!("PCM device {} close failed: {}", self.id.pcm, e);
                    HalError::driver(self.id.pcm, e)
                })
            }
            Ok(_) => Ok(()),
        }
    }

    pub fn current_state(&self) -> DeviceState {
        self.lock().lifecycle.state()
    }

    pub fn ref_counts(&self) -> RefCounts {
        self.lock().lifecycle.counts()
    }

    /// Takes effect on the next first open; the caller must not change it
    /// while the hardware is open.
    pub fn set_media_config(&self, config: MediaConfig) {
        let mut inner = self.lock();
        if inner.lifecycle.counts().open > 0 {
            warn!("PCM device {} media config changed while open", self.id.pcm);
        }
        inner.media_config = Some(config);
    }

    pub fn media_config(&self) -> Option<MediaConfig> {
        self.lock().media_config
    }

    /// Replace the metadata blob, releasing the previous one first
    pub fn set_metadata(&self, bytes: &[u8]) {
        self.lock().metadata = Some(Metadata::copy_from(bytes));
    }

    pub fn metadata(&self) -> Option<Metadata> {
        self.lock().metadata.clone()
    }

    /// Replace the parameter blob, releasing the previous one first
    pub fn set_params(&self, payload: &[u8]) -> Result<()> {
        let mut inner = self.lock();
        // A failed allocation leaves the device without params
        inner.params = None;

        let mut params = Vec::new();
        params.try_reserve_exact(payload.len()).map_err(|e| {
            error!("No memory for dev params on dev_id:{}", self.id.pcm);
            HalError::ResourceExhausted(format!(
                "{} bytes of params for PCM device {}: {}",
                payload.len(),
                self.id.pcm,
                e
            ))
        })?;
        params.extend_from_slice(payload);

        inner.params = Some(params);
        Ok(())
    }

    pub fn params(&self) -> Option<Vec<u8>> {
        self.lock().params.clone()
    }

    /// Release everything regardless of reference counts
    pub(crate) fn teardown(&self) {
        let mut inner = self.lock();
        if let Some(stream) = inner.stream.take() {
            warn!(
                "PCM device {} still open ({} users) at teardown, closing",
                self.id.pcm,
                inner.lifecycle.counts().open
            );
            if let Err(e) = stream.close() {
                error!("PCM device {} close failed: {}", self.id.pcm, e);
            }
        }
        inner.lifecycle = DeviceLifecycle::new();
        inner.params = None;
        inner.metadata = None;
    }
}
