//! PCM endpoint discovery from the kernel's enumeration report.
//!
//! Each report line looks like
//! `00-12: CODEC_DMA-LPAIF_WSA-RX-0 (*) :  : playback 1`; only the card id,
//! the pcm id and the first name token matter here.

use std::fs;
use std::io;
use std::path::PathBuf;

use log::{debug, trace, warn};

use super::endpoint::{EndpointProbe, HwEndpointInfo};
use super::error::{HalError, Result};
use super::types::DeviceId;

/// Longest name token taken from a report line
pub const MAX_NAME_LEN: usize = 80;

/// Line-oriented listing of registered PCM endpoints
pub trait EnumerationSource: Send + Sync {
    fn read(&self) -> io::Result<String>;
}

impl<F> EnumerationSource for F
where
    F: Fn() -> io::Result<String> + Send + Sync,
{
    fn read(&self) -> io::Result<String> {
        self()
    }
}

/// Enumeration report backed by a file such as `/proc/asound/pcm`
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl EnumerationSource for FileSource {
    fn read(&self) -> io::Result<String> {
        let bytes = fs::read(&self.path)?;
        Ok(decode_report(&bytes))
    }
}

/// Keep the report lines that are valid UTF-8, dropping the others
pub fn decode_report(bytes: &[u8]) -> String {
    let mut report = String::with_capacity(bytes.len());
    for line in bytes.split(|&b| b == b'\n').filter(|line| !line.is_empty()) {
        match std::str::from_utf8(line) {
            Ok(line) => {
                report.push_str(line);
                report.push('\n');
            }
            Err(e) => warn!(
                "skipping non-UTF-8 pcm line {:?}: {}",
                String::from_utf8_lossy(line),
                e
            ),
        }
    }
    report
}

/// An endpoint that survived parsing and probing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredEndpoint {
    pub id: DeviceId,
    pub name: String,
    pub hw_ep_info: HwEndpointInfo,
}

/// Parse `"%02u-%02u: %80s"`: two ids of at most two digits, then the first
/// whitespace-delimited name token, truncated to [`MAX_NAME_LEN`].
pub fn parse_line(line: &str) -> Option<(DeviceId, String)> {
    let (card, rest) = take_id(line)?;
    let rest = rest.strip_prefix('-')?;
    let (pcm, rest) = take_id(rest)?;
    let rest = rest.strip_prefix(':')?;

    let token = rest.split_whitespace().next()?;
    let name: String = token.chars().take(MAX_NAME_LEN).collect();

    Some((DeviceId { card, pcm }, name))
}

fn take_id(input: &str) -> Option<(u32, &str)> {
    let input = input.trim_start();
    let digits = input
        .bytes()
        .take(2)
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        return None;
    }
    let value = input[..digits].parse().ok()?;
    Some((value, &input[digits..]))
}

/// One discovery pass.
///
/// Lines that do not parse or fail the probe are skipped. An unreadable
/// source is fatal; a source with no usable endpoint is retryable, since the
/// sound card may simply not be registered yet.
pub fn discover(source: &dyn EnumerationSource, probe: &dyn EndpointProbe) -> Result<Vec<DiscoveredEndpoint>> {
    let report = source.read().map_err(|source| HalError::DiscoveryFatal { source })?;

    let capacity = report.lines().count();
    let mut endpoints = Vec::with_capacity(capacity);

    for line in report.lines() {
        trace!("pcm line: {}", line);

        let Some((id, name)) = parse_line(line) else {
            warn!("skipping unparseable pcm line {:?}", line);
            continue;
        };
        debug!("{}:{}:{}", id.card, id.pcm, name);

        match probe.probe(id.card, id.pcm, &name) {
            Some(hw_ep_info) => endpoints.push(DiscoveredEndpoint { id, name, hw_ep_info }),
            None => warn!("hw_ep_info parsing failed {}", name),
        }
    }

    if endpoints.is_empty() {
        return Err(HalError::DiscoveryRetryable);
    }
    Ok(endpoints)
}
