//! Input device lookup.
//!
//! cpal has no stable device identifier, so device names double as IDs,
//! the same convention external device pickers use.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::Device;

use wavescope_core::CaptureError;

/// Names of every input device the host currently exposes.
pub fn list_input_devices() -> Vec<String> {
    let host = cpal::default_host();
    host.input_devices()
        .map(|devices| devices.filter_map(|d| d.name().ok()).collect())
        .unwrap_or_default()
}

/// Resolve an input device: by name when constrained, the system default
/// otherwise.
pub(crate) fn find_input_device(device_id: Option<&str>) -> Result<Device, CaptureError> {
    let host = cpal::default_host();
    match device_id {
        Some(id) => host
            .input_devices()
            .map_err(|e| CaptureError::StreamError(format!("device enumeration failed: {}", e)))?
            .find(|d| d.name().map(|n| n == id).unwrap_or(false))
            .ok_or(CaptureError::DeviceNotAvailable),
        None => host
            .default_input_device()
            .ok_or(CaptureError::DeviceNotAvailable),
    }
}

/// Whether the host exposes any input device at all.
pub(crate) fn any_input_device() -> bool {
    let host = cpal::default_host();
    host.input_devices()
        .map(|mut devices| devices.next().is_some())
        .unwrap_or(false)
}
