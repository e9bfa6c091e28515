//! WAV container utilities.
//!
//! Generates standard 44-byte RIFF headers for mono 16-bit PCM and provides
//! both a one-shot encoder (used when all float batches are concatenated at
//! stop time) and a streaming `WavEncoder` (used when PCM is appended
//! chunk-by-chunk during capture).

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

const BIT_DEPTH: u16 = 16;
const CHANNELS: u16 = 1;

/// Generate a 44-byte WAV RIFF header for mono 16-bit PCM.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    chunk size = 36 + data_size
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  1 (channel count)
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * 2
/// [32-33]  block_align = 2
/// [34-35]  16 (bits per sample)
/// [36-39]  "data"
/// [40-43]  data_size = sample_count * 2
/// ```
pub fn generate_wav_header(sample_rate: u32, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let byte_rate = sample_rate * CHANNELS as u32 * BIT_DEPTH as u32 / 8;
    let block_align = CHANNELS * BIT_DEPTH / 8;
    let chunk_size = 36 + data_size;

    let mut header = [0u8; WAV_HEADER_SIZE];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&CHANNELS.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&BIT_DEPTH.to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// Convert one normalized float sample to signed 16-bit PCM.
///
/// Clamps to [-1, 1]. Negative samples scale by 32768, non-negative by
/// 32767, so both full-scale extremes map onto representable values.
#[inline]
pub fn sample_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped < 0.0 {
        (clamped * 32768.0) as i16
    } else {
        (clamped * 32767.0) as i16
    }
}

/// Convert f32 samples to 16-bit PCM little-endian bytes.
///
/// Output length = `samples.len() * 2` bytes.
pub fn convert_to_int16_pcm(samples: &[f32]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        data.extend_from_slice(&sample_to_i16(sample).to_le_bytes());
    }
    data
}

/// One-shot encoder: wrap a complete float take in a WAV container.
pub fn encode_wav_mono16(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let data = convert_to_int16_pcm(samples);
    let mut out = Vec::with_capacity(WAV_HEADER_SIZE + data.len());
    out.extend_from_slice(&generate_wav_header(sample_rate, data.len() as u32));
    out.extend_from_slice(&data);
    out
}

/// Downmix interleaved multi-channel audio to mono by averaging channels
/// per frame.
pub fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let frame_count = samples.len() / channels;
    let scale = 1.0 / channels as f32;
    let mut mono = Vec::with_capacity(frame_count);
    for frame in 0..frame_count {
        let mut sum = 0.0f32;
        for ch in 0..channels {
            sum += samples[frame * channels + ch];
        }
        mono.push(sum * scale);
    }
    mono
}

/// Streaming mono 16-bit WAV encoder.
///
/// PCM data is appended chunk-by-chunk as batches arrive; `finalize`
/// assembles the container with the correct sizes. Produces bytes identical
/// to `encode_wav_mono16` over the same samples.
#[derive(Debug, Default)]
pub struct WavEncoder {
    data: Vec<u8>,
}

impl WavEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch of float samples, converting to PCM immediately.
    pub fn push_samples(&mut self, samples: &[f32]) {
        self.data.reserve(samples.len() * 2);
        for &sample in samples {
            self.data.extend_from_slice(&sample_to_i16(sample).to_le_bytes());
        }
    }

    /// Number of samples encoded so far.
    pub fn sample_count(&self) -> u64 {
        (self.data.len() / 2) as u64
    }

    /// Assemble the finished container.
    pub fn finalize(self, sample_rate: u32) -> Vec<u8> {
        let mut out = Vec::with_capacity(WAV_HEADER_SIZE + self.data.len());
        out.extend_from_slice(&generate_wav_header(sample_rate, self.data.len() as u32));
        out.extend_from_slice(&self.data);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_size_is_44_bytes() {
        let header = generate_wav_header(48000, 0);
        assert_eq!(header.len(), 44);
    }

    #[test]
    fn header_riff_magic() {
        let header = generate_wav_header(48000, 0);
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(&header[36..40], b"data");
    }

    #[test]
    fn header_mono_16bit_48khz() {
        let header = generate_wav_header(48000, 10240);

        // Format code = 1 (PCM), fmt chunk size = 16
        assert_eq!(u16::from_le_bytes([header[20], header[21]]), 1);
        assert_eq!(
            u32::from_le_bytes([header[16], header[17], header[18], header[19]]),
            16
        );

        let channels = u16::from_le_bytes([header[22], header[23]]);
        assert_eq!(channels, 1);

        let sample_rate = u32::from_le_bytes([header[24], header[25], header[26], header[27]]);
        assert_eq!(sample_rate, 48000);

        let byte_rate = u32::from_le_bytes([header[28], header[29], header[30], header[31]]);
        assert_eq!(byte_rate, 96000); // 48000 * 2

        let block_align = u16::from_le_bytes([header[32], header[33]]);
        assert_eq!(block_align, 2);

        let bit_depth = u16::from_le_bytes([header[34], header[35]]);
        assert_eq!(bit_depth, 16);

        let data_size = u32::from_le_bytes([header[40], header[41], header[42], header[43]]);
        assert_eq!(data_size, 10240);

        let chunk_size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        assert_eq!(chunk_size, 36 + 10240);
    }

    #[test]
    fn conversion_is_asymmetric_at_full_scale() {
        assert_eq!(sample_to_i16(1.0), 32767);
        assert_eq!(sample_to_i16(-1.0), -32768);
        assert_eq!(sample_to_i16(0.0), 0);
    }

    #[test]
    fn conversion_clamps_out_of_range() {
        assert_eq!(sample_to_i16(2.0), 32767);
        assert_eq!(sample_to_i16(-3.0), -32768);
    }

    #[test]
    fn encode_produces_exact_length() {
        let samples = vec![0.0f32; 100];
        let wav = encode_wav_mono16(&samples, 44100);
        assert_eq!(wav.len(), 44 + 200);
    }

    #[test]
    fn encode_round_trips_within_quantization_error() {
        let samples: Vec<f32> = (0..64).map(|i| (i as f32 / 64.0) * 2.0 - 1.0).collect();
        let wav = encode_wav_mono16(&samples, 48000);

        for (i, original) in samples.iter().enumerate() {
            let off = 44 + i * 2;
            let value = i16::from_le_bytes([wav[off], wav[off + 1]]);
            let decoded = if value < 0 {
                value as f32 / 32768.0
            } else {
                value as f32 / 32767.0
            };
            assert!(
                (decoded - original).abs() <= 1.0 / 32768.0,
                "sample {} decoded {} vs {}",
                i,
                decoded,
                original
            );
        }
    }

    #[test]
    fn streaming_encoder_matches_one_shot() {
        let samples: Vec<f32> = (0..500).map(|i| ((i as f32) * 0.013).sin() * 0.8).collect();

        let mut encoder = WavEncoder::new();
        encoder.push_samples(&samples[..123]);
        encoder.push_samples(&samples[123..400]);
        encoder.push_samples(&samples[400..]);
        assert_eq!(encoder.sample_count(), 500);

        assert_eq!(encoder.finalize(16000), encode_wav_mono16(&samples, 16000));
    }

    #[test]
    fn downmix_stereo_to_mono() {
        let stereo = [0.2, 0.8, 0.4, 0.6];
        let mono = downmix_to_mono(&stereo, 2);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.5).abs() < 1e-6);
        assert!((mono[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn downmix_mono_passthrough() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(downmix_to_mono(&samples, 1), samples);
    }
}
