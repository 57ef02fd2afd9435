//! cpal device enumeration, shared by [`crate::CpalBackend`].

use crate::Result;
use cpal::traits::{DeviceTrait, HostTrait};

/// Audio device information.
#[derive(Debug, Clone)]
pub struct AudioDevice {
    pub name: String,
    pub is_input: bool,
    pub is_output: bool,
    pub default_sample_rate: u32,
}

pub(crate) fn device_name(device: &cpal::Device) -> Result<String> {
    device.name().map_err(|e| Error::from(e))
}

use cpal::DeviceNameError as Error;
impl From<Error> for crate::Error {
    fn from(e: Error) -> Self {
        crate::Error::Stream(e.to_string())
    }
}

/// List all available audio devices.
pub fn list_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    if let Ok(inputs) = host.input_devices() {
        for device in inputs {
            if let Ok(name) = device.name() {
                let sample_rate = device.default_input_config().map(|c| c.sample_rate().0).unwrap_or(48000);
                let is_output = device.default_output_config().is_ok();
                devices.push(AudioDevice { name, is_input: true, is_output, default_sample_rate: sample_rate });
            }
        }
    }

    if let Ok(outputs) = host.output_devices() {
        for device in outputs {
            if let Ok(name) = device.name() {
                if devices.iter().any(|d| d.name == name) {
                    continue;
                }
                let sample_rate = device.default_output_config().map(|c| c.sample_rate().0).unwrap_or(48000);
                devices.push(AudioDevice { name, is_input: false, is_output: true, default_sample_rate: sample_rate });
            }
        }
    }

    Ok(devices)
}

/// Get the default input/output device info.
pub fn default_device() -> Result<(Option<AudioDevice>, Option<AudioDevice>)> {
    let host = cpal::default_host();

    let input = host.default_input_device().and_then(|d| {
        d.name().ok().map(|name| AudioDevice {
            name,
            is_input: true,
            is_output: false,
            default_sample_rate: d.default_input_config().map(|c| c.sample_rate().0).unwrap_or(48000),
        })
    });

    let output = host.default_output_device().and_then(|d| {
        d.name().ok().map(|name| AudioDevice {
            name,
            is_input: false,
            is_output: true,
            default_sample_rate: d.default_output_config().map(|c| c.sample_rate().0).unwrap_or(48000),
        })
    });

    Ok((input, output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_devices() {
        let result = list_devices();
        assert!(result.is_ok());
    }

    #[test]
    fn test_default_device() {
        let result = default_device();
        assert!(result.is_ok());
    }
}
