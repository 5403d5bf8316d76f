use std::sync::Arc;
use std::thread;

use log::{info, warn};

use crate::config::{DiscoveryConfig, ServiceConfig};

use super::channel_mapper::{ChannelMap, ChannelMapper};
use super::device::{DeviceContext, PcmDevice};
use super::discovery::{discover, DiscoveredEndpoint, EnumerationSource, FileSource};
use super::endpoint::{DaiNameProbe, EndpointProbe};
use super::error::Result;
use super::notify::NotificationSink;
use super::registry::{DeviceRegistry, EndpointQuery};
use super::traits::PcmDriver;
use super::types::DeviceId;

/// Owns every discovered PCM device plus the shared handles they use.
///
/// Built by [`DeviceManager::init`], released by [`DeviceManager::deinit`]
/// (or on drop). The device list never changes in between, so lookups need
/// no locking; each device carries its own lock.
pub struct DeviceManager {
    registry: DeviceRegistry,
    ctx: Arc<DeviceContext>,
    channel_mapper: ChannelMapper,
    torn_down: bool,
}

impl DeviceManager {
    /// Discover endpoints from the configured enumeration file
    pub fn init(config: &ServiceConfig, driver: Arc<dyn PcmDriver>) -> Result<Self> {
        let source = FileSource::new(&config.enumeration_path);
        Self::init_with(config, driver, &source, &DaiNameProbe)
    }

    /// Discover endpoints, retrying while none is registered yet
    pub fn init_with(
        config: &ServiceConfig,
        driver: Arc<dyn PcmDriver>,
        source: &dyn EnumerationSource,
        probe: &dyn EndpointProbe,
    ) -> Result<Self> {
        let endpoints = discover_with_retry(source, probe, &config.discovery)?;

        let mut ctx = DeviceContext::new(
            Arc::clone(&driver),
            NotificationSink::new(&config.notification_path),
        );
        ctx.period_buffer_bytes = config.pcm.period_buffer_bytes;
        ctx.period_count = config.pcm.period_count;
        let ctx = Arc::new(ctx);

        let registry = DeviceRegistry::new(endpoints, Arc::clone(&ctx));
        let card = registry.card_id()?;
        info!(
            "{} PCM endpoints on card {} via {} driver",
            registry.len(),
            card,
            driver.driver_id()
        );

        Ok(Self {
            registry,
            ctx,
            channel_mapper: ChannelMapper::new(driver, card),
            torn_down: false,
        })
    }

    pub fn endpoint_count(&self) -> usize {
        self.registry.len()
    }

    /// Device at `index` in discovery order
    pub fn get_object(&self, index: usize) -> Result<Arc<PcmDevice>> {
        self.registry.get(index)
    }

    pub fn find(&self, id: DeviceId) -> Option<Arc<PcmDevice>> {
        self.registry.find(id)
    }

    /// Capacity 0 returns the endpoint count; otherwise up to `capacity`
    /// endpoint summaries.
    pub fn get_endpoint_info_list(&self, capacity: usize) -> EndpointQuery {
        self.registry.endpoint_info_list(capacity)
    }

    pub fn get_card_id(&self) -> Result<u32> {
        self.registry.card_id()
    }

    pub fn get_channel_map(&self, device: &PcmDevice) -> Result<ChannelMap> {
        self.channel_mapper.channel_map(device)
    }

    pub fn notification_sink(&self) -> &NotificationSink {
        &self.ctx.notifier
    }

    pub fn channel_mapper(&self) -> &ChannelMapper {
        &self.channel_mapper
    }

    /// Release every device, closing still-open streams regardless of users
    pub fn deinit(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        info!("device deinit called");
        for device in self.registry.iter() {
            device.teardown();
        }
        self.ctx.notifier.close();
        self.channel_mapper.close();
        self.torn_down = true;
    }
}

impl Drop for DeviceManager {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Run discovery up to `max_retries` times, sleeping between attempts that
/// found nothing. Fatal errors end the loop at once.
pub fn discover_with_retry(
    source: &dyn EnumerationSource,
    probe: &dyn EndpointProbe,
    policy: &DiscoveryConfig,
) -> Result<Vec<DiscoveredEndpoint>> {
    let attempts = policy.max_retries.max(1);
    let mut attempt = 1;

    loop {
        match discover(source, probe) {
            Err(e) if e.is_retryable() && attempt < attempts => {
                warn!(
                    "no valid snd device found, attempt {}/{}, retrying in {:?}",
                    attempt,
                    attempts,
                    policy.retry_interval()
                );
                thread::sleep(policy.retry_interval());
                attempt += 1;
            }
            result => return result,
        }
    }
}
