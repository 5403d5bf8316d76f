use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, error};

/// Width of one record written to the notification path
pub const RECORD_LEN: usize = 9;

/// Whether an endpoint just became active or inactive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    Enabled,
    Disabled,
}

impl DeviceEvent {
    fn flag(self) -> u8 {
        match self {
            DeviceEvent::Enabled => 1,
            DeviceEvent::Disabled => 0,
        }
    }
}

/// Encode `"<pcm-id> <0|1>"` into a zero-padded fixed-width record
pub fn encode_record(pcm_id: u32, event: DeviceEvent) -> [u8; RECORD_LEN] {
    let text = format!("{} {}", pcm_id, event.flag());
    let mut record = [0u8; RECORD_LEN];
    // Last byte stays NUL, like a bounded snprintf
    let len = text.len().min(RECORD_LEN - 1);
    record[..len].copy_from_slice(&text.as_bytes()[..len]);
    record
}

/// Best-effort side channel announcing device enable/disable to the platform.
///
/// The path is opened on first use, not at construction: the node and its
/// permissions show up asynchronously after this service starts. A failed
/// open is retried on the next event.
pub struct NotificationSink {
    path: PathBuf,
    handle: Mutex<Option<File>>,
}

impl NotificationSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            handle: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the platform handle has been opened
    pub fn is_open(&self) -> bool {
        self.handle
            .lock()
            .map(|handle| handle.is_some())
            .unwrap_or(false)
    }

    pub fn notify(&self, pcm_id: u32, event: DeviceEvent) {
        let record = encode_record(pcm_id, event);

        let mut handle = match self.handle.lock() {
            Ok(handle) => handle,
            Err(poisoned) => poisoned.into_inner(),
        };

        if handle.is_none() {
            match OpenOptions::new().write(true).open(&self.path) {
                Ok(file) => *handle = Some(file),
                Err(e) => {
                    error!("invalid notification handle {:?}: {}", self.path, e);
                    return;
                }
            }
        }

        if let Some(file) = handle.as_mut() {
            match file.write_all(&record) {
                Ok(()) => debug!("PCM device {} {:?}", pcm_id, event),
                Err(e) => error!("notification write for PCM device {} failed: {}", pcm_id, e),
            }
        }
    }

    /// Drop the platform handle; the next event reopens it
    pub fn close(&self) {
        let mut handle = match self.handle.lock() {
            Ok(handle) => handle,
            Err(poisoned) => poisoned.into_inner(),
        };
        *handle = None;
    }
}
