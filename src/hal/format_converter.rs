use super::error::{HalError, Result};
use super::types::MediaFormat;

/// Sample formats understood by the PCM driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PcmFormat {
    S8,
    S16Le,
    /// 24 bits in the low bytes of a 32-bit container
    S24Le,
    S24_3Le,
    S32Le,
}

/// Map a media format onto the driver's native sample format.
///
/// Anything without a PCM counterpart goes over the link as S16_LE.
pub fn to_pcm_format(format: MediaFormat) -> PcmFormat {
    match format {
        MediaFormat::PcmS32Le => PcmFormat::S32Le,
        MediaFormat::PcmS8 => PcmFormat::S8,
        MediaFormat::PcmS24_3Le => PcmFormat::S24_3Le,
        MediaFormat::PcmS24Le => PcmFormat::S24Le,
        MediaFormat::PcmS16Le
        | MediaFormat::Mp3
        | MediaFormat::Aac
        | MediaFormat::Flac
        | MediaFormat::Vorbis => PcmFormat::S16Le,
    }
}

/// Container width in bits, used for period arithmetic only
pub fn bits_per_sample(format: MediaFormat) -> u32 {
    match format {
        MediaFormat::PcmS8 => 8,
        MediaFormat::PcmS24Le => 32,
        MediaFormat::PcmS24_3Le => 24,
        MediaFormat::PcmS32Le => 32,
        _ => 16,
    }
}

pub fn bytes_per_sample(format: MediaFormat) -> u32 {
    bits_per_sample(format) / 8
}

/// Frames per period that fit `buffer_bytes`:
/// `buffer_bytes / (channels * bytes_per_sample)`
pub fn period_size(buffer_bytes: u32, channels: u32, format: MediaFormat) -> Result<u32> {
    let frame_bytes = channels
        .checked_mul(bytes_per_sample(format))
        .filter(|&bytes| bytes > 0)
        .ok_or_else(|| HalError::InvalidArgument(format!("unusable channel count {}", channels)))?;

    let frames = buffer_bytes / frame_bytes;
    if frames == 0 {
        return Err(HalError::InvalidArgument(format!(
            "{} channels of {:?} exceed the {}-byte period budget",
            channels, format, buffer_bytes
        )));
    }
    Ok(frames)
}
