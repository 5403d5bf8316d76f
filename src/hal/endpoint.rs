use serde::{Deserialize, Serialize};

use super::types::Direction;

/// Backend audio interface family behind a PCM endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioInterface {
    CodecDma,
    Mi2s,
    Tdm,
    AuxPcm,
    Slimbus,
    DisplayPort,
    UsbAudio,
    PcmRtProxy,
}

/// Hardware endpoint description derived for each discovered PCM
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HwEndpointInfo {
    pub interface: AudioInterface,
    /// LPAIF block for interfaces routed through one (e.g. "LPAIF_WSA")
    pub lpaif: Option<String>,
    pub direction: Direction,
    pub index: u32,
}

/// Per-endpoint capability probe run during discovery.
///
/// Returning `None` drops the endpoint from the registry.
pub trait EndpointProbe: Send + Sync {
    fn probe(&self, card: u32, pcm: u32, name: &str) -> Option<HwEndpointInfo>;
}

impl<F> EndpointProbe for F
where
    F: Fn(u32, u32, &str) -> Option<HwEndpointInfo> + Send + Sync,
{
    fn probe(&self, card: u32, pcm: u32, name: &str) -> Option<HwEndpointInfo> {
        self(card, pcm, name)
    }
}

/// Derives endpoint info from the backend DAI link name, e.g.
/// `CODEC_DMA-LPAIF_WSA-RX-0`, `TDM-LPAIF-TX-SECONDARY`, `USB_AUDIO-RX`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DaiNameProbe;

impl EndpointProbe for DaiNameProbe {
    fn probe(&self, _card: u32, _pcm: u32, name: &str) -> Option<HwEndpointInfo> {
        parse_dai_name(name)
    }
}

pub fn parse_dai_name(name: &str) -> Option<HwEndpointInfo> {
    let mut parts = name.split('-');
    let head = parts.next()?;
    let rest: Vec<&str> = parts.collect();

    let interface = match head {
        "CODEC_DMA" => AudioInterface::CodecDma,
        "MI2S" => AudioInterface::Mi2s,
        "TDM" => AudioInterface::Tdm,
        "AUXPCM" => AudioInterface::AuxPcm,
        "SLIM" => AudioInterface::Slimbus,
        "DISPLAY_PORT" => AudioInterface::DisplayPort,
        "USB_AUDIO" => AudioInterface::UsbAudio,
        "PCM_RT_PROXY" => AudioInterface::PcmRtProxy,
        _ => return None,
    };

    match interface {
        AudioInterface::CodecDma | AudioInterface::Mi2s | AudioInterface::Tdm | AudioInterface::AuxPcm => {
            let [lpaif, dir, index] = rest.as_slice() else {
                return None;
            };
            if !lpaif.starts_with("LPAIF") {
                return None;
            }
            Some(HwEndpointInfo {
                interface,
                lpaif: Some(lpaif.to_string()),
                direction: parse_direction(dir)?,
                index: parse_index(index)?,
            })
        }
        AudioInterface::Slimbus => {
            let [dev, dir] = rest.as_slice() else {
                return None;
            };
            Some(HwEndpointInfo {
                interface,
                lpaif: None,
                direction: parse_direction(dir)?,
                index: parse_index(dev)?,
            })
        }
        AudioInterface::DisplayPort => {
            let (dir, index) = match rest.as_slice() {
                [dir] => (*dir, 0),
                [dir, index] => (*dir, parse_index(index)?),
                _ => return None,
            };
            // Display port only plays back
            if parse_direction(dir)? != Direction::Output {
                return None;
            }
            Some(HwEndpointInfo {
                interface,
                lpaif: None,
                direction: Direction::Output,
                index,
            })
        }
        AudioInterface::UsbAudio => {
            let [dir] = rest.as_slice() else {
                return None;
            };
            Some(HwEndpointInfo {
                interface,
                lpaif: None,
                direction: parse_direction(dir)?,
                index: 0,
            })
        }
        AudioInterface::PcmRtProxy => {
            let [dir, index] = rest.as_slice() else {
                return None;
            };
            Some(HwEndpointInfo {
                interface,
                lpaif: None,
                direction: parse_direction(dir)?,
                index: parse_index(index)?,
            })
        }
    }
}

fn parse_direction(token: &str) -> Option<Direction> {
    match token {
        "RX" => Some(Direction::Output),
        "TX" => Some(Direction::Input),
        _ => None,
    }
}

fn parse_index(token: &str) -> Option<u32> {
    match token {
        "PRIMARY" => Some(0),
        "SECONDARY" => Some(1),
        "TERTIARY" => Some(2),
        "QUATERNARY" => Some(3),
        "QUINARY" => Some(4),
        "SENARY" => Some(5),
        _ => token.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_dma_name() {
        let info = parse_dai_name("CODEC_DMA-LPAIF_WSA-RX-0").unwrap();
        assert_eq!(info.interface, AudioInterface::CodecDma);
        assert_eq!(info.lpaif.as_deref(), Some("LPAIF_WSA"));
        assert_eq!(info.direction, Direction::Output);
        assert_eq!(info.index, 0);
    }

    #[test]
    fn test_ordinal_index() {
        let info = parse_dai_name("TDM-LPAIF-TX-SECONDARY").unwrap();
        assert_eq!(info.interface, AudioInterface::Tdm);
        assert_eq!(info.direction, Direction::Input);
        assert_eq!(info.index, 1);
    }

    #[test]
    fn test_interfaces_without_lpaif() {
        assert_eq!(
            parse_dai_name("USB_AUDIO-TX").unwrap().direction,
            Direction::Input
        );
        assert_eq!(parse_dai_name("DISPLAY_PORT-RX").unwrap().index, 0);
        assert_eq!(parse_dai_name("DISPLAY_PORT-RX-1").unwrap().index, 1);
        assert_eq!(parse_dai_name("SLIM-7-TX").unwrap().index, 7);
        assert_eq!(
            parse_dai_name("PCM_RT_PROXY-RX-1").unwrap().interface,
            AudioInterface::PcmRtProxy
        );
    }

    #[test]
    fn test_frontend_and_malformed_names_fail() {
        assert!(parse_dai_name("MultiMedia1").is_none());
        assert!(parse_dai_name("CODEC_DMA-LPAIF_WSA-XX-0").is_none());
        assert!(parse_dai_name("CODEC_DMA-RX-0").is_none());
        assert!(parse_dai_name("DISPLAY_PORT-TX").is_none());
        assert!(parse_dai_name("").is_none());
    }
}
