//! Shared cpal input-stream construction.
//!
//! Opens the device at its native format, converts whatever sample format
//! the host delivers to mono f32, and hands each callback quantum to the
//! caller as one chunk.

use cpal::traits::DeviceTrait;
use cpal::{Device, SampleFormat, Stream, StreamConfig};

use wavescope_core::processing::wav_format::downmix_to_mono;
use wavescope_core::CaptureError;

pub(crate) type ChunkFn = Box<dyn FnMut(Vec<f32>) + Send + 'static>;
pub(crate) type StreamErrorFn = Box<dyn FnMut(CaptureError) + Send + 'static>;

/// Negotiated parameters of an opened input stream.
pub(crate) struct OpenedStream {
    pub stream: Stream,
    pub sample_rate: u32,
}

/// Query the rate the device will deliver, without opening a stream.
pub(crate) fn negotiated_sample_rate(device: &Device) -> Result<u32, CaptureError> {
    let supported = device
        .default_input_config()
        .map_err(|e| CaptureError::ConfigurationFailed(format!("no input config: {}", e)))?;
    Ok(supported.sample_rate().0)
}

/// Build an input stream delivering mono f32 chunks at the device's native
/// rate. The stream is not started; call `play()` on it.
pub(crate) fn build_mono_input_stream(
    device: &Device,
    mut on_chunk: ChunkFn,
    mut on_error: StreamErrorFn,
) -> Result<OpenedStream, CaptureError> {
    let supported = device
        .default_input_config()
        .map_err(|e| CaptureError::ConfigurationFailed(format!("no input config: {}", e)))?;
    let sample_format = supported.sample_format();
    let config: StreamConfig = supported.into();
    let sample_rate = config.sample_rate.0;
    let channels = config.channels as usize;

    let err_fn = move |error: cpal::StreamError| {
        on_error(CaptureError::StreamError(error.to_string()));
    };

    let stream = match sample_format {
        SampleFormat::F32 => device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    on_chunk(downmix_to_mono(data, channels));
                },
                err_fn,
                None,
            )
            .map_err(|e| CaptureError::StreamError(e.to_string()))?,
        SampleFormat::I16 => device
            .build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let floats: Vec<f32> = data.iter().map(|&s| s as f32 / 32768.0).collect();
                    on_chunk(downmix_to_mono(&floats, channels));
                },
                err_fn,
                None,
            )
            .map_err(|e| CaptureError::StreamError(e.to_string()))?,
        SampleFormat::U16 => device
            .build_input_stream(
                &config,
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    let floats: Vec<f32> =
                        data.iter().map(|&s| (s as f32 - 32768.0) / 32768.0).collect();
                    on_chunk(downmix_to_mono(&floats, channels));
                },
                err_fn,
                None,
            )
            .map_err(|e| CaptureError::StreamError(e.to_string()))?,
        other => {
            return Err(CaptureError::ConfigurationFailed(format!(
                "unsupported sample format: {:?}",
                other
            )))
        }
    };

    Ok(OpenedStream { stream, sample_rate })
}
