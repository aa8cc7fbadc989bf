use crate::error::{BridgeError, Result};

/// Channel layout of a PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Mono,
    Stereo,
}

impl ChannelLayout {
    /// Number of interleaved channels.
    pub const fn count(self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }
}

/// The declared format of the incoming network stream.
///
/// Set exactly once per session by `set_format`; cleared again by
/// `reset_fill` on reconnect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Format {
    pub channels: ChannelLayout,
    pub stream_sample_rate: f64,
}

impl Format {
    pub fn new(channels: ChannelLayout, stream_sample_rate: f64) -> Result<Self> {
        if !stream_sample_rate.is_finite() || stream_sample_rate <= 0.0 {
            return Err(BridgeError::InvalidSampleRate(stream_sample_rate));
        }
        Ok(Self {
            channels,
            stream_sample_rate,
        })
    }

    /// The integral upsampling factor from the stream rate to the native
    /// rate, or an error when the rates don't divide evenly.
    pub fn interpolation_factor(&self, native_rate: f64) -> Result<usize> {
        let ratio = native_rate / self.stream_sample_rate;
        if ratio < 1.0 || ratio.fract() != 0.0 {
            return Err(BridgeError::NonIntegralRatio {
                stream_rate: self.stream_sample_rate,
                native_rate,
            });
        }
        Ok(ratio as usize)
    }
}

/// A unit of interleaved PCM float samples at the declared stream rate,
/// exactly as delivered by one binary transport message.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmFrame {
    data: Vec<f32>,
}

impl PcmFrame {
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.data
    }
}

/// An owned run of interleaved samples at the native output rate.
///
/// Chunks carry the channel layout they were converted under, so chunks
/// queued before a mid-session format change still deinterleave correctly.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeChunk {
    data: Vec<f32>,
    channels: ChannelLayout,
}

impl NativeChunk {
    pub fn new(data: Vec<f32>, channels: ChannelLayout) -> Result<Self> {
        if data.len() % channels.count() != 0 {
            return Err(BridgeError::RaggedFrame {
                len: data.len(),
                channels: channels.count(),
            });
        }
        Ok(Self { data, channels })
    }

    /// Total interleaved sample count.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn channels(&self) -> ChannelLayout {
        self.channels
    }

    /// Number of sample-frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.data.len() / self.channels.count()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_rejects_bad_rates() {
        assert!(Format::new(ChannelLayout::Mono, 0.0).is_err());
        assert!(Format::new(ChannelLayout::Mono, -44100.0).is_err());
        assert!(Format::new(ChannelLayout::Mono, f64::NAN).is_err());
        assert!(Format::new(ChannelLayout::Stereo, 24000.0).is_ok());
    }

    #[test]
    fn test_interpolation_factor_integral() {
        let format = Format::new(ChannelLayout::Stereo, 24000.0).unwrap();
        assert_eq!(format.interpolation_factor(48000.0).unwrap(), 2);

        let identity = Format::new(ChannelLayout::Stereo, 48000.0).unwrap();
        assert_eq!(identity.interpolation_factor(48000.0).unwrap(), 1);
    }

    #[test]
    fn test_interpolation_factor_rejects_non_integral() {
        let format = Format::new(ChannelLayout::Stereo, 44100.0).unwrap();
        assert_eq!(
            format.interpolation_factor(48000.0),
            Err(BridgeError::NonIntegralRatio {
                stream_rate: 44100.0,
                native_rate: 48000.0
            })
        );
        // Downsampling is never supported either.
        let high = Format::new(ChannelLayout::Mono, 96000.0).unwrap();
        assert!(high.interpolation_factor(48000.0).is_err());
    }

    #[test]
    fn test_native_chunk_alignment() {
        assert!(NativeChunk::new(vec![0.0; 4], ChannelLayout::Stereo).is_ok());
        assert!(NativeChunk::new(vec![0.0; 5], ChannelLayout::Stereo).is_err());
        let chunk = NativeChunk::new(vec![0.0; 6], ChannelLayout::Stereo).unwrap();
        assert_eq!(chunk.frames(), 3);
        assert_eq!(chunk.len(), 6);
    }
}
