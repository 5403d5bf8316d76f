pub mod channel_mapper;
pub mod device;
pub mod device_manager;
pub mod discovery;
pub mod drivers;
pub mod endpoint;
pub mod error;
pub mod format_converter;
pub mod lifecycle;
pub mod mock;
pub mod notify;
pub mod registry;
pub mod traits;
pub mod types;

pub use channel_mapper::{ChannelMap, ChannelMapper, CHANNEL_MAP_LEN};
pub use device::{DeviceContext, PcmDevice};
pub use device_manager::DeviceManager;
pub use discovery::{DiscoveredEndpoint, EnumerationSource, FileSource};
pub use drivers::Backend;
pub use endpoint::{AudioInterface, DaiNameProbe, EndpointProbe, HwEndpointInfo};
pub use error::{DriverError, HalError, Result};
pub use format_converter::{bits_per_sample, period_size, to_pcm_format, PcmFormat};
pub use lifecycle::DeviceLifecycle;
pub use mock::SimulatedDriver;
pub use notify::{DeviceEvent, NotificationSink};
pub use registry::{DeviceRegistry, EndpointQuery};
pub use traits::{ControlId, Mixer, PcmDriver, PcmOpenParams, PcmStream};
pub use types::{
    DataFormat, DeviceId, DeviceState, Direction, EndpointInfo, MediaConfig,
    MediaFormat, Metadata, RefCounts,
};
