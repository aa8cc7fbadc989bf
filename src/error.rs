//! Session error taxonomy.
//!
//! Errors split into two classes. Fatal errors mean the stream state is
//! unusable and the transport should tear the session down and reconnect.
//! Recoverable errors (overruns, underruns) describe degradation the bridge
//! already compensated for; they are reported outward and playback continues.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BridgeError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    /// Audio data arrived before any stream format was declared.
    #[error("audio data received before a stream format was set")]
    FormatNotSet,

    /// The declared stream sample rate is not a positive finite number.
    #[error("invalid stream sample rate: {0}")]
    InvalidSampleRate(f64),

    /// The native rate is not an integer multiple of the stream rate, so no
    /// zero-stuffing factor exists.
    #[error("native rate {native_rate} is not an integer multiple of stream rate {stream_rate}")]
    NonIntegralRatio { stream_rate: f64, native_rate: f64 },

    /// A frame's sample count is not divisible by the channel count.
    #[error("frame of {len} samples is not a whole number of {channels}-channel frames")]
    RaggedFrame { len: usize, channels: usize },

    /// The transport delivered something the wire protocol does not allow.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Buffered audio was discarded to bound latency.
    #[error("overrun: dropped {dropped} buffered samples")]
    Overrun { dropped: usize },

    /// The queue ran dry mid-stream and output was padded with fill values.
    #[error("underrun: padded {padded} sample frames")]
    Underrun { padded: usize },
}

impl BridgeError {
    /// Whether the session must be torn down, as opposed to a degradation
    /// report the stream plays through.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            BridgeError::Overrun { .. } | BridgeError::Underrun { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality_split() {
        assert!(BridgeError::FormatNotSet.is_fatal());
        assert!(BridgeError::InvalidSampleRate(0.0).is_fatal());
        assert!(
            BridgeError::NonIntegralRatio {
                stream_rate: 44100.0,
                native_rate: 48000.0,
            }
            .is_fatal()
        );
        assert!(BridgeError::RaggedFrame { len: 3, channels: 2 }.is_fatal());
        assert!(BridgeError::Protocol("bad".into()).is_fatal());

        assert!(!BridgeError::Overrun { dropped: 100 }.is_fatal());
        assert!(!BridgeError::Underrun { padded: 4 }.is_fatal());
    }
}
