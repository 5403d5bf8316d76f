use std::ffi::CString;

use alsa::ctl::{Ctl, ElemId, ElemIface, ElemType, ElemValue};
use alsa::pcm::{Access, Format, Frames, HwParams, PCM};
use alsa::ValueOr;

use crate::hal::error::DriverError;
use crate::hal::format_converter::PcmFormat;
use crate::hal::traits::{ControlId, Mixer, PcmDriver, PcmOpenParams, PcmStream};
use crate::hal::types::Direction;

/// alsa-lib backend addressing endpoints as `hw:<card>,<pcm>`
#[derive(Debug, Clone, Copy, Default)]
pub struct AlsaDriver;

impl AlsaDriver {
    pub fn new() -> Self {
        Self
    }
}

fn driver_error(op: &'static str, e: alsa::Error) -> DriverError {
    DriverError::new(op, -e.errno(), e.to_string())
}

fn alsa_format(format: PcmFormat) -> Format {
    match format {
        PcmFormat::S32Le => Format::S32LE,
        PcmFormat::S8 => Format::S8,
        PcmFormat::S24_3Le => Format::S243LE,
        PcmFormat::S24Le => Format::S24LE,
        PcmFormat::S16Le => Format::S16LE,
    }
}

impl PcmDriver for AlsaDriver {
    fn driver_id(&self) -> &str {
        "alsa"
    }

    fn open_pcm(&self, params: &PcmOpenParams) -> Result<Box<dyn PcmStream>, DriverError> {
        let name = format!("hw:{},{}", params.card, params.device);
        let direction = match params.direction {
            Direction::Output => alsa::Direction::Playback,
            Direction::Input => alsa::Direction::Capture,
        };

        let pcm = PCM::new(&name, direction, false).map_err(|e| driver_error("snd_pcm_open", e))?;
        {
            let hwp = HwParams::any(&pcm).map_err(|e| driver_error("snd_pcm_hw_params_any", e))?;
            hwp.set_access(Access::RWInterleaved)
                .map_err(|e| driver_error("snd_pcm_hw_params_set_access", e))?;
            hwp.set_format(alsa_format(params.format))
                .map_err(|e| driver_error("snd_pcm_hw_params_set_format", e))?;
            hwp.set_channels(params.channels)
                .map_err(|e| driver_error("snd_pcm_hw_params_set_channels", e))?;
            hwp.set_rate(params.rate, ValueOr::Nearest)
                .map_err(|e| driver_error("snd_pcm_hw_params_set_rate", e))?;
            hwp.set_period_size(params.period_size as Frames, ValueOr::Nearest)
                .map_err(|e| driver_error("snd_pcm_hw_params_set_period_size", e))?;
            hwp.set_periods(params.period_count, ValueOr::Nearest)
                .map_err(|e| driver_error("snd_pcm_hw_params_set_periods", e))?;
            pcm.hw_params(&hwp).map_err(|e| driver_error("snd_pcm_hw_params", e))?;
        }
        {
            let swp = pcm
                .sw_params_current()
                .map_err(|e| driver_error("snd_pcm_sw_params_current", e))?;
            swp.set_start_threshold(params.start_threshold as Frames)
                .map_err(|e| driver_error("snd_pcm_sw_params_set_start_threshold", e))?;
            swp.set_stop_threshold(params.stop_threshold as Frames)
                .map_err(|e| driver_error("snd_pcm_sw_params_set_stop_threshold", e))?;
            pcm.sw_params(&swp).map_err(|e| driver_error("snd_pcm_sw_params", e))?;
        }

        Ok(Box::new(AlsaStream { pcm }))
    }

    fn open_mixer(&self, card: u32) -> Result<Box<dyn Mixer>, DriverError> {
        let name = format!("hw:{}", card);
        let ctl = Ctl::new(&name, false).map_err(|e| driver_error("snd_ctl_open", e))?;
        Ok(Box::new(AlsaMixer { ctl }))
    }
}

struct AlsaStream {
    pcm: PCM,
}

impl PcmStream for AlsaStream {
    fn prepare(&mut self) -> Result<(), DriverError> {
        self.pcm.prepare().map_err(|e| driver_error("snd_pcm_prepare", e))
    }

    fn stop(&mut self) -> Result<(), DriverError> {
        self.pcm.drop().map_err(|e| driver_error("snd_pcm_drop", e))
    }

    fn close(self: Box<Self>) -> Result<(), DriverError> {
        // snd_pcm_close runs when the PCM is dropped
        drop(self);
        Ok(())
    }
}

struct AlsaMixer {
    ctl: Ctl,
}

impl AlsaMixer {
    fn elem_id(name: &str) -> Result<ElemId, DriverError> {
        let cname = CString::new(name).map_err(|_| {
            DriverError::new("snd_ctl_elem_id_set_name", DriverError::EINVAL, format!("bad control name {:?}", name))
        })?;
        let mut id = ElemId::new(ElemIface::Mixer);
        id.set_name(&cname);
        Ok(id)
    }
}

impl Mixer for AlsaMixer {
    fn lookup(&self, name: &str) -> Result<ControlId, DriverError> {
        let id = Self::elem_id(name)?;
        self.ctl
            .elem_info(&id)
            .map_err(|e| driver_error("snd_ctl_elem_info", e))?;
        Ok(ControlId(name.to_string()))
    }

    fn read_array(&self, control: &ControlId, len: usize) -> Result<Vec<u8>, DriverError> {
        let id = Self::elem_id(&control.0)?;
        let info = self
            .ctl
            .elem_info(&id)
            .map_err(|e| driver_error("snd_ctl_elem_info", e))?;

        let mut value = ElemValue::new(info.get_type()).map_err(|e| driver_error("snd_ctl_elem_value_malloc", e))?;
        value.set_id(&id);
        self.ctl
            .elem_read(&mut value)
            .map_err(|e| driver_error("snd_ctl_elem_read", e))?;

        let invalid = |message: String| DriverError::new("snd_ctl_elem_read", DriverError::EINVAL, message);
        let mut bytes = match info.get_type() {
            ElemType::Integer => {
                let mut bytes = Vec::with_capacity(info.get_count() as usize * 4);
                for i in 0..info.get_count() {
                    let entry = value
                        .get_integer(i)
                        .ok_or_else(|| invalid(format!("{} has no integer at {}", control.0, i)))?;
                    bytes.extend_from_slice(&(entry as u32).to_ne_bytes());
                }
                bytes
            }
            ElemType::Bytes => value
                .get_bytes()
                .map(|bytes| bytes.to_vec())
                .ok_or_else(|| invalid(format!("{} has no byte payload", control.0)))?,
            other => return Err(invalid(format!("{} has unsupported type {:?}", control.0, other))),
        };

        if bytes.len() < len {
            return Err(invalid(format!(
                "{} holds {} bytes, expected {}",
                control.0,
                bytes.len(),
                len
            )));
        }
        bytes.truncate(len);
        Ok(bytes)
    }
}
