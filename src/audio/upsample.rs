//! Zero-stuffing sample-rate conversion from the stream rate to the native
//! output rate.
//!
//! Each input sample-frame lands at position `i * factor` of the output per
//! channel; the `factor - 1` slots in between stay zero. The spectral images
//! this creates are removed by a downstream antialiasing filter owned by the
//! platform integration, not by this crate.

use crate::audio::frame::{Format, NativeChunk, PcmFrame};
use crate::error::{BridgeError, Result};

/// Converts [`PcmFrame`]s at the declared stream rate into [`NativeChunk`]s
/// at the native rate by integral zero-stuffing.
#[derive(Debug, Clone)]
pub struct SampleRateBridge {
    format: Format,
    factor: usize,
}

impl SampleRateBridge {
    /// Fails when the native rate is not an integer multiple of the stream
    /// rate; non-integral ratios are a rejected precondition, not a case to
    /// approximate.
    pub fn new(format: Format, native_rate: f64) -> Result<Self> {
        let factor = format.interpolation_factor(native_rate)?;
        Ok(Self { format, factor })
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn factor(&self) -> usize {
        self.factor
    }

    /// Upsample one frame. Output length is `frame.len() * factor`.
    pub fn convert(&self, frame: &PcmFrame) -> Result<NativeChunk> {
        let channels = self.format.channels.count();
        if frame.len() % channels != 0 {
            return Err(BridgeError::RaggedFrame {
                len: frame.len(),
                channels,
            });
        }

        let mut out = vec![0.0f32; frame.len() * self.factor];
        for (i, sample_frame) in frame.data().chunks_exact(channels).enumerate() {
            let base = i * self.factor * channels;
            out[base..base + channels].copy_from_slice(sample_frame);
        }
        NativeChunk::new(out, self.format.channels)
    }
}
