use super::error::DriverError;
use super::format_converter::PcmFormat;
use super::types::Direction;

/// Hardware parameters for opening a PCM stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmOpenParams {
    pub card: u32,
    pub device: u32,
    pub direction: Direction,
    pub format: PcmFormat,
    pub rate: u32,
    pub channels: u32,
    /// Frames per period
    pub period_size: u32,
    pub period_count: u32,
    pub start_threshold: u32,
    pub stop_threshold: u32,
}

/// Opaque handle for a mixer control found by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlId(pub String);

/// Trait implemented by driver backends (alsa-lib, simulated)
pub trait PcmDriver: Send + Sync {
    /// Backend identifier for logs (e.g. "alsa", "simulated")
    fn driver_id(&self) -> &str;

    /// Open a PCM stream and apply hardware parameters
    fn open_pcm(&self, params: &PcmOpenParams) -> Result<Box<dyn PcmStream>, DriverError>;

    /// Open the control interface of a sound card
    fn open_mixer(&self, card: u32) -> Result<Box<dyn Mixer>, DriverError>;
}

/// An open PCM stream, exclusively owned by one device object
pub trait PcmStream: Send {
    fn prepare(&mut self) -> Result<(), DriverError>;

    /// Halt the stream, dropping pending frames
    fn stop(&mut self) -> Result<(), DriverError>;

    fn close(self: Box<Self>) -> Result<(), DriverError>;
}

/// Control interface of a sound card
pub trait Mixer: Send {
    /// Find a control by name; a missing control is `ENOENT`
    fn lookup(&self, name: &str) -> Result<ControlId, DriverError>;

    /// Read `len` bytes of array data from a control
    fn read_array(&self, control: &ControlId, len: usize) -> Result<Vec<u8>, DriverError>;
}
