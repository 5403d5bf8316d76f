use std::sync::Arc;

use log::error;

use super::device::{DeviceContext, PcmDevice};
use super::discovery::DiscoveredEndpoint;
use super::error::{HalError, Result};
use super::types::{DeviceId, EndpointInfo};

/// Answer to an endpoint listing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointQuery {
    /// Capacity 0 asks for the number of endpoints only
    Count(usize),
    /// Up to `capacity` summaries in discovery order
    Filled(Vec<EndpointInfo>),
}

/// Ordered set of discovered devices, fixed once built
pub struct DeviceRegistry {
    devices: Vec<Arc<PcmDevice>>,
}

impl DeviceRegistry {
    pub fn new(endpoints: Vec<DiscoveredEndpoint>, ctx: Arc<DeviceContext>) -> Self {
        let devices = endpoints
            .into_iter()
            .map(|endpoint| Arc::new(PcmDevice::new(endpoint, Arc::clone(&ctx))))
            .collect();
        Self { devices }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<Arc<PcmDevice>> {
        self.devices.get(index).cloned().ok_or_else(|| {
            error!(
                "Invalid device index {}, endpoints available: {}",
                index,
                self.devices.len()
            );
            HalError::InvalidArgument(format!("device index {} out of range", index))
        })
    }

    pub fn find(&self, id: DeviceId) -> Option<Arc<PcmDevice>> {
        self.devices.iter().find(|device| device.id() == id).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<PcmDevice>> {
        self.devices.iter()
    }

    pub fn endpoint_info_list(&self, capacity: usize) -> EndpointQuery {
        if capacity == 0 {
            return EndpointQuery::Count(self.devices.len());
        }
        EndpointQuery::Filled(
            self.devices
                .iter()
                .take(capacity)
                .map(|device| EndpointInfo {
                    name: device.name().to_string(),
                    direction: device.direction(),
                })
                .collect(),
        )
    }

    /// Card hosting the first endpoint
    pub fn card_id(&self) -> Result<u32> {
        self.devices
            .first()
            .map(|device| device.card_id())
            .ok_or_else(|| HalError::InvalidArgument("no device discovered".to_string()))
    }
}
