//! PCM framing into a canonical WAV container
//!
//! The speech service returns bare little-endian 16-bit PCM. Media decoders
//! need a container, so every generation result is wrapped in the canonical
//! 44-byte RIFF/WAVE header followed verbatim by the PCM payload.
//!
//! **Header layout (all integers little-endian):**
//!
//! | Offset | Size | Field |
//! |---|---|---|
//! | 0 | 4 | `RIFF` |
//! | 4 | 4 | chunk size = 36 + data size |
//! | 8 | 4 | `WAVE` |
//! | 12 | 4 | `fmt ` |
//! | 16 | 4 | fmt chunk size = 16 |
//! | 20 | 2 | audio format = 1 (integer PCM) |
//! | 22 | 2 | channel count |
//! | 24 | 4 | sample rate |
//! | 28 | 4 | byte rate |
//! | 32 | 2 | block align |
//! | 34 | 2 | bits per sample |
//! | 36 | 4 | `data` |
//! | 40 | 4 | data size |

use crate::error::{Error, Result};
use std::sync::Arc;

/// Size of the canonical header in bytes
pub const WAV_HEADER_LEN: usize = 44;

/// MIME type of framed containers
pub const MIME_TYPE: &str = "audio/wav";

/// File name offered when a container is downloaded
pub const DOWNLOAD_FILENAME: &str = "speech.wav";

/// Sample rate of the speech model's raw output
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

/// Sample layout of a raw PCM stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channel_count: u16,
    pub bits_per_sample: u16,
}

impl PcmFormat {
    /// Mono 16-bit PCM at the given rate
    pub fn mono_16bit(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channel_count: 1,
            bits_per_sample: 16,
        }
    }

    /// Bytes per sample frame, `None` if it overflows the header field
    pub fn checked_block_align(&self) -> Option<u16> {
        self.channel_count.checked_mul(self.bits_per_sample / 8)
    }

    /// Bytes per second, `None` if it overflows the header field
    pub fn checked_byte_rate(&self) -> Option<u32> {
        self.checked_block_align()
            .and_then(|align| self.sample_rate.checked_mul(u32::from(align)))
    }

    /// Bytes per sample frame (all channels)
    ///
    /// # Panics
    /// Panics if the value cannot be represented in the 16-bit header field.
    pub fn block_align(&self) -> u16 {
        self.checked_block_align().unwrap_or_else(|| {
            panic!(
                "block align of {} channel(s) at {} bits exceeds WAV field limit",
                self.channel_count, self.bits_per_sample
            )
        })
    }

    /// Bytes per second of audio
    ///
    /// # Panics
    /// Panics if the value cannot be represented in the 32-bit header field.
    pub fn byte_rate(&self) -> u32 {
        self.checked_byte_rate().unwrap_or_else(|| {
            panic!(
                "byte rate of {} Hz x {} channel(s) at {} bits exceeds WAV field limit",
                self.sample_rate, self.channel_count, self.bits_per_sample
            )
        })
    }
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self::mono_16bit(DEFAULT_SAMPLE_RATE)
    }
}

/// Raw PCM bytes plus their format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmBuffer {
    pub bytes: Vec<u8>,
    pub format: PcmFormat,
}

impl PcmBuffer {
    /// Create a buffer, rejecting payloads that are not whole sample frames
    pub fn new(bytes: Vec<u8>, format: PcmFormat) -> Result<Self> {
        let block_align = match (format.checked_block_align(), format.checked_byte_rate()) {
            (Some(align), Some(rate)) if align > 0 && rate > 0 => align as usize,
            _ => {
                return Err(Error::InvalidPcm(format!(
                    "unsupported format: {} channel(s) at {} bits, {} Hz",
                    format.channel_count, format.bits_per_sample, format.sample_rate
                )))
            }
        };
        if bytes.len() % block_align != 0 {
            return Err(Error::InvalidPcm(format!(
                "{} bytes is not a whole number of {}-byte frames",
                bytes.len(),
                block_align
            )));
        }
        Ok(Self { bytes, format })
    }

    /// Create a buffer without checking frame alignment
    pub fn new_unchecked(bytes: Vec<u8>, format: PcmFormat) -> Self {
        Self { bytes, format }
    }

    /// Number of complete sample frames
    pub fn frame_count(&self) -> usize {
        match self.format.checked_block_align() {
            Some(0) | None => 0,
            Some(align) => self.bytes.len() / align as usize,
        }
    }
}

/// Typed header of a canonical WAV container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub format: PcmFormat,
    pub data_len: u32,
}

impl WavHeader {
    /// Header for `data_len` bytes of PCM in `format`
    ///
    /// # Panics
    /// Panics if `data_len`, the byte rate or the block align cannot be
    /// represented in their header fields.
    pub fn for_pcm(format: PcmFormat, data_len: usize) -> Self {
        format.byte_rate();
        let data_len = u32::try_from(data_len)
            .ok()
            .filter(|len| len.checked_add(36).is_some())
            .unwrap_or_else(|| panic!("PCM payload of {} bytes exceeds WAV size limit", data_len));
        Self { format, data_len }
    }

    /// RIFF chunk size (file size minus 8)
    pub fn chunk_size(&self) -> u32 {
        36 + self.data_len
    }

    /// Serialize to the 44-byte canonical layout
    pub fn to_bytes(&self) -> [u8; WAV_HEADER_LEN] {
        let mut header = [0u8; WAV_HEADER_LEN];

        // RIFF chunk descriptor
        header[0..4].copy_from_slice(b"RIFF");
        header[4..8].copy_from_slice(&self.chunk_size().to_le_bytes());
        header[8..12].copy_from_slice(b"WAVE");

        // fmt sub-chunk
        header[12..16].copy_from_slice(b"fmt ");
        header[16..20].copy_from_slice(&16u32.to_le_bytes());
        header[20..22].copy_from_slice(&1u16.to_le_bytes());
        header[22..24].copy_from_slice(&self.format.channel_count.to_le_bytes());
        header[24..28].copy_from_slice(&self.format.sample_rate.to_le_bytes());
        header[28..32].copy_from_slice(&self.format.byte_rate().to_le_bytes());
        header[32..34].copy_from_slice(&self.format.block_align().to_le_bytes());
        header[34..36].copy_from_slice(&self.format.bits_per_sample.to_le_bytes());

        // data sub-chunk
        header[36..40].copy_from_slice(b"data");
        header[40..44].copy_from_slice(&self.data_len.to_le_bytes());

        header
    }
}

/// Immutable framed WAV bytes
///
/// Cloning shares the underlying buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioContainer {
    bytes: Arc<[u8]>,
    header: WavHeader,
}

impl AudioContainer {
    /// Complete container bytes (header + payload)
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the container bytes
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn format(&self) -> PcmFormat {
        self.header.format
    }

    /// Payload size in bytes
    pub fn data_len(&self) -> usize {
        self.header.data_len as usize
    }

    /// Playback length implied by the header
    pub fn duration_seconds(&self) -> f64 {
        match self.header.format.byte_rate() {
            0 => 0.0,
            rate => self.header.data_len as f64 / rate as f64,
        }
    }
}

/// Wrap raw PCM in a canonical WAV container
///
/// Pure and deterministic. Frame alignment is not checked here; an odd
/// payload is still framed byte-exact.
pub fn frame(pcm: &PcmBuffer) -> AudioContainer {
    let header = WavHeader::for_pcm(pcm.format, pcm.bytes.len());

    let mut bytes = Vec::with_capacity(WAV_HEADER_LEN + pcm.bytes.len());
    bytes.extend_from_slice(&header.to_bytes());
    bytes.extend_from_slice(&pcm.bytes);

    AudioContainer {
        bytes: bytes.into(),
        header,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn le_u32(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    fn le_u16(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes(bytes[offset..offset + 2].try_into().unwrap())
    }

    #[test]
    fn test_header_fields() {
        let pcm = PcmBuffer::new_unchecked(vec![7u8; 1000], PcmFormat::mono_16bit(22_050));
        let container = frame(&pcm);
        let bytes = container.as_bytes();

        assert_eq!(bytes.len(), 1044);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(le_u32(bytes, 4), 1036);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(le_u32(bytes, 16), 16);
        assert_eq!(le_u16(bytes, 20), 1);
        assert_eq!(le_u16(bytes, 22), 1);
        assert_eq!(le_u32(bytes, 24), 22_050);
        assert_eq!(le_u32(bytes, 28), 44_100);
        assert_eq!(le_u16(bytes, 32), 2);
        assert_eq!(le_u16(bytes, 34), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(le_u32(bytes, 40), 1000);
        assert!(bytes[44..].iter().all(|&b| b == 7));
    }

    #[test]
    fn test_one_second_at_24khz() {
        let pcm = PcmBuffer::new(vec![0u8; 48_000], PcmFormat::mono_16bit(24_000)).unwrap();
        let container = frame(&pcm);
        let bytes = container.as_bytes();

        assert_eq!(container.len(), 48_044);
        assert_eq!(le_u32(bytes, 24), 24_000);
        assert_eq!(le_u32(bytes, 28), 48_000);
        assert_eq!(le_u16(bytes, 32), 2);
        assert_eq!(le_u16(bytes, 34), 16);
        assert_eq!(le_u32(bytes, 40), 48_000);
        assert!((container.duration_seconds() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_silence_is_bare_header() {
        let pcm = PcmBuffer::new(Vec::new(), PcmFormat::default()).unwrap();
        let container = frame(&pcm);

        assert_eq!(container.len(), WAV_HEADER_LEN);
        assert_eq!(le_u32(container.as_bytes(), 4), 36);
        assert_eq!(le_u32(container.as_bytes(), 40), 0);
        assert_eq!(container.duration_seconds(), 0.0);
    }

    #[test]
    fn test_framing_is_deterministic() {
        let payload: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let pcm = PcmBuffer::new(payload, PcmFormat::default()).unwrap();
        assert_eq!(frame(&pcm).as_bytes(), frame(&pcm).as_bytes());
    }

    #[test]
    fn test_odd_payload_is_framed_without_validation() {
        let pcm = PcmBuffer::new_unchecked(vec![1, 2, 3], PcmFormat::default());
        let container = frame(&pcm);

        assert_eq!(container.len(), 47);
        assert_eq!(le_u32(container.as_bytes(), 4), 39);
        assert_eq!(le_u32(container.as_bytes(), 40), 3);
        assert_eq!(&container.as_bytes()[44..], &[1, 2, 3]);
    }

    #[test]
    fn test_validating_constructor_rejects_partial_frames() {
        let result = PcmBuffer::new(vec![0u8; 3], PcmFormat::mono_16bit(24_000));
        assert!(matches!(result, Err(Error::InvalidPcm(_))));

        let stereo = PcmFormat {
            sample_rate: 48_000,
            channel_count: 2,
            bits_per_sample: 16,
        };
        assert!(PcmBuffer::new(vec![0u8; 6], stereo).is_err());
        assert_eq!(PcmBuffer::new(vec![0u8; 8], stereo).unwrap().frame_count(), 2);
    }

    #[test]
    fn test_overflowing_format_is_rejected() {
        let huge_rate = PcmFormat {
            sample_rate: u32::MAX,
            channel_count: 2,
            bits_per_sample: 16,
        };
        assert_eq!(huge_rate.checked_block_align(), Some(4));
        assert_eq!(huge_rate.checked_byte_rate(), None);
        assert!(matches!(
            PcmBuffer::new(vec![0u8; 4], huge_rate),
            Err(Error::InvalidPcm(_))
        ));

        let huge_align = PcmFormat {
            sample_rate: 8_000,
            channel_count: u16::MAX,
            bits_per_sample: 32,
        };
        assert_eq!(huge_align.checked_block_align(), None);
        assert!(PcmBuffer::new(Vec::new(), huge_align).is_err());

        assert!(PcmBuffer::new(Vec::new(), PcmFormat::mono_16bit(0)).is_err());
    }

    #[test]
    #[should_panic(expected = "exceeds WAV field limit")]
    fn test_framing_overflowing_format_panics() {
        let format = PcmFormat {
            sample_rate: u32::MAX,
            channel_count: 1,
            bits_per_sample: 16,
        };
        frame(&PcmBuffer::new_unchecked(vec![0u8; 2], format));
    }

    #[test]
    fn test_stereo_rates() {
        let format = PcmFormat {
            sample_rate: 44_100,
            channel_count: 2,
            bits_per_sample: 16,
        };
        assert_eq!(format.block_align(), 4);
        assert_eq!(format.byte_rate(), 176_400);
    }
}
