//! The session's wire-facing protocol surface.
//!
//! Inbound, the transport collaborator delivers one JSON control message
//! declaring the stream format, followed by binary messages of interleaved
//! little-endian 32-bit floats. Those become typed [`Command`]s consumed by
//! the network-side actor. Outbound, the session emits [`SessionEvent`]s:
//! a [`StatusReport`] recomputed after every push and pull, and
//! fire-and-forget error reports.

use crate::audio::frame::{ChannelLayout, PcmFrame};
use crate::error::{BridgeError, Result};
use crossbeam::channel::{Receiver, Sender, bounded};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// JSON control messages understood on the stream, keyed by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    AudioStreamMetadata { signal_type: SignalType },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalType {
    pub kind: SignalKind,
    pub sample_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalKind {
    Mono,
    Stereo,
}

impl SignalKind {
    pub fn channels(self) -> ChannelLayout {
        match self {
            SignalKind::Mono => ChannelLayout::Mono,
            SignalKind::Stereo => ChannelLayout::Stereo,
        }
    }
}

/// Parse a JSON control message from the transport.
pub fn parse_control(text: &str) -> Result<ControlMessage> {
    serde_json::from_str(text).map_err(|e| BridgeError::Protocol(e.to_string()))
}

/// Decode one binary transport message of interleaved little-endian f32
/// samples at the declared stream rate.
pub fn decode_pcm(bytes: &[u8]) -> Result<PcmFrame> {
    if bytes.len() % 4 != 0 {
        return Err(BridgeError::Protocol(format!(
            "binary message of {} bytes is not a whole number of f32 samples",
            bytes.len()
        )));
    }
    let samples = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Ok(PcmFrame::new(samples))
}

/// Network-side operations, in the order the transport issues them.
#[derive(Debug, Clone)]
pub enum Command {
    SetFormat {
        channels: ChannelLayout,
        sample_rate: f64,
    },
    ResetFill,
    Accept(PcmFrame),
}

impl Command {
    /// The command corresponding to a parsed control message.
    pub fn from_control(message: ControlMessage) -> Self {
        match message {
            ControlMessage::AudioStreamMetadata { signal_type } => Command::SetFormat {
                channels: signal_type.kind.channels(),
                sample_rate: signal_type.sample_rate,
            },
        }
    }
}

/// Buffer health, recomputed after every push and pull.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    /// Buffered samples as a fraction of the adaptive target depth.
    pub buffered_fraction: f64,
    /// The adaptive target depth expressed in seconds of audio.
    pub target_seconds: f64,
    /// Whether the start/stop hysteresis currently considers the stream live.
    pub queue_not_empty: bool,
}

/// Everything the session reports outward.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Status(StatusReport),
    Error(BridgeError),
}

/// Non-blocking sender for session events.
///
/// Both execution contexts report through this; a full channel drops the
/// event rather than ever stalling the render thread.
#[derive(Clone)]
pub struct EventSink {
    tx: Sender<SessionEvent>,
}

impl EventSink {
    pub(crate) fn send(&self, event: SessionEvent) {
        if self.tx.try_send(event).is_err() {
            trace!("event channel full, dropping event");
        }
    }
}

/// Create the bounded outward event channel.
pub fn event_channel(capacity: usize) -> (EventSink, Receiver<SessionEvent>) {
    let (tx, rx) = bounded(capacity);
    (EventSink { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stereo_metadata() {
        let text = r#"{"type":"audio_stream_metadata","signal_type":{"kind":"STEREO","sample_rate":24000.0}}"#;
        let message = parse_control(text).unwrap();
        assert_eq!(
            message,
            ControlMessage::AudioStreamMetadata {
                signal_type: SignalType {
                    kind: SignalKind::Stereo,
                    sample_rate: 24000.0,
                }
            }
        );
        match Command::from_control(message) {
            Command::SetFormat {
                channels,
                sample_rate,
            } => {
                assert_eq!(channels, ChannelLayout::Stereo);
                assert_eq!(sample_rate, 24000.0);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_mono_metadata() {
        let text = r#"{"type":"audio_stream_metadata","signal_type":{"kind":"MONO","sample_rate":8000}}"#;
        let message = parse_control(text).unwrap();
        let ControlMessage::AudioStreamMetadata { signal_type } = message;
        assert_eq!(signal_type.kind, SignalKind::Mono);
        assert_eq!(signal_type.sample_rate, 8000.0);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            parse_control("not json"),
            Err(BridgeError::Protocol(_))
        ));
        assert!(matches!(
            parse_control(r#"{"type":"unknown_message"}"#),
            Err(BridgeError::Protocol(_))
        ));
    }

    #[test]
    fn test_decode_pcm_little_endian() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1.5f32.to_le_bytes());
        bytes.extend_from_slice(&(-0.25f32).to_le_bytes());
        let frame = decode_pcm(&bytes).unwrap();
        assert_eq!(frame.data(), &[1.5, -0.25]);
    }

    #[test]
    fn test_decode_pcm_rejects_ragged_bytes() {
        assert!(matches!(
            decode_pcm(&[0, 1, 2]),
            Err(BridgeError::Protocol(_))
        ));
    }

    #[test]
    fn test_event_channel_drops_when_full() {
        let (sink, rx) = event_channel(1);
        sink.send(SessionEvent::Error(BridgeError::Underrun { padded: 1 }));
        sink.send(SessionEvent::Error(BridgeError::Underrun { padded: 2 }));
        assert_eq!(rx.len(), 1);
        assert_eq!(
            rx.recv().unwrap(),
            SessionEvent::Error(BridgeError::Underrun { padded: 1 })
        );
    }
}
