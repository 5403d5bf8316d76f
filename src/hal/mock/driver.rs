use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::hal::channel_mapper::{control_name, ChannelMap};
use crate::hal::error::DriverError;
use crate::hal::traits::{ControlId, Mixer, PcmDriver, PcmOpenParams, PcmStream};

/// Snapshot of the calls a [`SimulatedDriver`] has served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriverStats {
    pub opens: usize,
    pub prepares: usize,
    pub stops: usize,
    pub closes: usize,
    pub mixer_opens: usize,
}

#[derive(Default)]
struct SimulatedState {
    opens: AtomicUsize,
    prepares: AtomicUsize,
    stops: AtomicUsize,
    closes: AtomicUsize,
    mixer_opens: AtomicUsize,
    fail_open: AtomicBool,
    fail_prepare: AtomicBool,
    fail_stop: AtomicBool,
    fail_close: AtomicBool,
    fail_mixer: AtomicBool,
    short_reads: AtomicBool,
    last_open: Mutex<Option<PcmOpenParams>>,
    controls: Mutex<HashMap<String, ChannelMap>>,
}

/// In-process driver backend.
///
/// Serves hosts without sound hardware. Clones share state, so a test can
/// keep one handle while the registry owns another.
#[derive(Clone, Default)]
pub struct SimulatedDriver {
    state: Arc<SimulatedState>,
}

impl SimulatedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> DriverStats {
        DriverStats {
            opens: self.state.opens.load(Ordering::SeqCst),
            prepares: self.state.prepares.load(Ordering::SeqCst),
            stops: self.state.stops.load(Ordering::SeqCst),
            closes: self.state.closes.load(Ordering::SeqCst),
            mixer_opens: self.state.mixer_opens.load(Ordering::SeqCst),
        }
    }

    /// Parameters of the most recent successful open
    pub fn last_open(&self) -> Option<PcmOpenParams> {
        *lock(&self.state.last_open)
    }

    pub fn fail_open(&self, fail: bool) {
        self.state.fail_open.store(fail, Ordering::SeqCst);
    }

    pub fn fail_prepare(&self, fail: bool) {
        self.state.fail_prepare.store(fail, Ordering::SeqCst);
    }

    pub fn fail_stop(&self, fail: bool) {
        self.state.fail_stop.store(fail, Ordering::SeqCst);
    }

    pub fn fail_close(&self, fail: bool) {
        self.state.fail_close.store(fail, Ordering::SeqCst);
    }

    pub fn fail_mixer(&self, fail: bool) {
        self.state.fail_mixer.store(fail, Ordering::SeqCst);
    }

    /// Make control reads return half of the requested bytes
    pub fn short_reads(&self, short: bool) {
        self.state.short_reads.store(short, Ordering::SeqCst);
    }

    /// Publish a `"<name> Channel Map"` control for an endpoint
    pub fn set_channel_map(&self, endpoint_name: &str, map: ChannelMap) {
        lock(&self.state.controls).insert(control_name(endpoint_name), map);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl PcmDriver for SimulatedDriver {
    fn driver_id(&self) -> &str {
        "simulated"
    }

    fn open_pcm(&self, params: &PcmOpenParams) -> Result<Box<dyn PcmStream>, DriverError> {
        if self.state.fail_open.load(Ordering::SeqCst) {
            return Err(DriverError::new("pcm_open", DriverError::EIO, "simulated open failure"));
        }
        self.state.opens.fetch_add(1, Ordering::SeqCst);
        *lock(&self.state.last_open) = Some(*params);
        Ok(Box::new(SimulatedStream {
            state: Arc::clone(&self.state),
        }))
    }

    fn open_mixer(&self, _card: u32) -> Result<Box<dyn Mixer>, DriverError> {
        if self.state.fail_mixer.load(Ordering::SeqCst) {
            return Err(DriverError::new("mixer_open", DriverError::EINVAL, "simulated mixer failure"));
        }
        self.state.mixer_opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SimulatedMixer {
            state: Arc::clone(&self.state),
        }))
    }
}

struct SimulatedStream {
    state: Arc<SimulatedState>,
}

impl PcmStream for SimulatedStream {
    fn prepare(&mut self) -> Result<(), DriverError> {
        if self.state.fail_prepare.load(Ordering::SeqCst) {
            return Err(DriverError::new("pcm_prepare", -32, "simulated prepare failure"));
        }
        self.state.prepares.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), DriverError> {
        self.state.stops.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_stop.load(Ordering::SeqCst) {
            return Err(DriverError::new("pcm_stop", DriverError::EIO, "simulated stop failure"));
        }
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), DriverError> {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_close.load(Ordering::SeqCst) {
            return Err(DriverError::new("pcm_close", DriverError::EIO, "simulated close failure"));
        }
        Ok(())
    }
}

struct SimulatedMixer {
    state: Arc<SimulatedState>,
}

impl Mixer for SimulatedMixer {
    fn lookup(&self, name: &str) -> Result<ControlId, DriverError> {
        if lock(&self.state.controls).contains_key(name) {
            Ok(ControlId(name.to_string()))
        } else {
            Err(DriverError::new(
                "mixer_get_ctl_by_name",
                DriverError::ENOENT,
                format!("no control {:?}", name),
            ))
        }
    }

    fn read_array(&self, control: &ControlId, len: usize) -> Result<Vec<u8>, DriverError> {
        let controls = lock(&self.state.controls);
        let map = controls.get(&control.0).ok_or_else(|| {
            DriverError::new("mixer_ctl_get_array", DriverError::ENOENT, "control vanished")
        })?;
        let mut bytes: Vec<u8> = map.iter().flat_map(|ch| ch.to_ne_bytes()).collect();
        if self.state.short_reads.load(Ordering::SeqCst) {
            bytes.truncate(len / 2);
        } else {
            bytes.truncate(len);
        }
        Ok(bytes)
    }
}
