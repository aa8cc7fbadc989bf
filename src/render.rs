//! The real-time pull consumer driven by the host audio clock.
//!
//! [`StreamRenderer`] fully populates two equal-length channel slices on
//! every call, never blocks, and reports degradation only as fire-and-forget
//! events. Underruns are padded by repeating the last produced sample per
//! channel rather than silence, so brief gaps don't click.

use crate::audio::buffers::QueueConsumer;
use crate::error::BridgeError;
use crate::protocol::{EventSink, SessionEvent};
use crate::session::start_stop::StartStopController;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The render-side contract exposed to the platform audio binding.
///
/// Called once per fixed render period with two equal-length mutable channel
/// slices; implementations must fill both completely before returning.
pub trait RenderSource: Send {
    fn produce(&mut self, out_left: &mut [f32], out_right: &mut [f32]);
}

/// Drains the jitter queue into fixed-size render buffers.
pub struct StreamRenderer {
    queue: QueueConsumer,
    start_stop: Arc<StartStopController>,
    events: EventSink,
    check_delay: Duration,
    /// Declick fill values, one per output channel.
    fill: [f32; 2],
    epoch_seen: u64,
    prev_underrun: usize,
    /// Pending start/stop check scheduled by an underrun.
    check_at: Option<Instant>,
}

impl StreamRenderer {
    pub(crate) fn new(
        queue: QueueConsumer,
        start_stop: Arc<StartStopController>,
        events: EventSink,
        check_delay: Duration,
    ) -> Self {
        Self {
            queue,
            start_stop,
            events,
            check_delay,
            fill: [0.0; 2],
            epoch_seen: 0,
            prev_underrun: 0,
            check_at: None,
        }
    }

    /// Unread samples currently buffered ahead of the renderer.
    pub fn buffered_samples(&self) -> usize {
        self.queue.buffered_samples()
    }
}

impl RenderSource for StreamRenderer {
    fn produce(&mut self, out_left: &mut [f32], out_right: &mut [f32]) {
        debug_assert_eq!(out_left.len(), out_right.len());
        let len = out_left.len().min(out_right.len());

        // A fresh start means the old fill values are stale; zero them so a
        // resumed stream can't replay the level it stopped at.
        let epoch = self.start_stop.epoch();
        if epoch != self.epoch_seen {
            self.epoch_seen = epoch;
            self.fill = [0.0; 2];
        }

        let written = self.queue.pop_into(out_left, out_right);
        if written > 0 {
            self.fill = [out_left[written - 1], out_right[written - 1]];
        }
        for i in written..len {
            out_left[i] = self.fill[0];
            out_right[i] = self.fill[1];
        }

        let underrun = len - written;
        // A partial underrun following another underrun is genuine
        // starvation; a full-buffer one is just the stream having stopped.
        if self.prev_underrun != 0 && underrun != 0 && underrun != len {
            self.events
                .send(SessionEvent::Error(BridgeError::Underrun {
                    padded: underrun,
                }));
        }

        let now = Instant::now();
        if underrun > 0 && self.check_at.is_none() {
            self.check_at = Some(now + self.check_delay);
        }
        if let Some(at) = self.check_at {
            if now >= at {
                self.check_at = None;
                if self.queue.buffered_samples() == 0 && self.start_stop.note_drained() {
                    self.queue.emit_status();
                }
            }
        }

        self.prev_underrun = underrun;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::frame::{ChannelLayout, PcmFrame};
    use crate::protocol::StatusReport;
    use crate::session::{BridgeConfig, BridgeSession};
    use crossbeam::channel::Receiver;

    fn underrun_events(rx: &Receiver<SessionEvent>) -> Vec<usize> {
        rx.try_iter()
            .filter_map(|event| match event {
                SessionEvent::Error(BridgeError::Underrun { padded }) => Some(padded),
                _ => None,
            })
            .collect()
    }

    fn statuses(rx: &Receiver<SessionEvent>) -> Vec<StatusReport> {
        rx.try_iter()
            .filter_map(|event| match event {
                SessionEvent::Status(status) => Some(status),
                _ => None,
            })
            .collect()
    }

    /// The identity-rate scenario: 10 kHz in and out, stereo, ten
    /// interleaved samples, pulled four frames at a time.
    #[test]
    fn test_identity_rate_produce_and_declick_fill() {
        let session = BridgeSession::new(BridgeConfig::new(10000.0));
        let (mut input, mut renderer, _events) = session.split();

        input.set_format(ChannelLayout::Stereo, 10000.0).unwrap();
        input
            .accept(PcmFrame::new(vec![
                1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0,
            ]))
            .unwrap();

        let mut left = [0.0; 4];
        let mut right = [0.0; 4];
        renderer.produce(&mut left, &mut right);
        assert_eq!(left, [1.0, 3.0, 5.0, 7.0]);
        assert_eq!(right, [2.0, 4.0, 6.0, 8.0]);

        // Queue exhausts after one more frame; the rest repeats the last
        // real sample per channel.
        renderer.produce(&mut left, &mut right);
        assert_eq!(left, [9.0, 9.0, 9.0, 9.0]);
        assert_eq!(right, [10.0, 10.0, 10.0, 10.0]);
    }

    #[test]
    fn test_empty_queue_pure_fill() {
        let session = BridgeSession::new(BridgeConfig::new(48000.0));
        let (_input, mut renderer, events) = session.split();

        let mut left = [7.0; 128];
        let mut right = [7.0; 128];
        renderer.produce(&mut left, &mut right);
        assert!(left.iter().all(|&s| s == 0.0));
        assert!(right.iter().all(|&s| s == 0.0));

        // A full-buffer underrun with no history is not an error.
        assert!(underrun_events(&events).is_empty());
    }

    #[test]
    fn test_repeated_partial_underrun_is_reported() {
        let session = BridgeSession::new(BridgeConfig::new(48000.0));
        let (mut input, mut renderer, events) = session.split();
        input.set_format(ChannelLayout::Stereo, 48000.0).unwrap();

        let mut left = [0.0; 4];
        let mut right = [0.0; 4];

        // Three frames for a four-frame pull: one frame short.
        input
            .accept(PcmFrame::new(vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0]))
            .unwrap();
        renderer.produce(&mut left, &mut right);
        assert_eq!(left, [1.0, 2.0, 3.0, 3.0]);
        // First underrun: nothing to compare against yet.
        assert!(underrun_events(&events).is_empty());

        input
            .accept(PcmFrame::new(vec![4.0, 4.0, 5.0, 5.0, 6.0, 6.0]))
            .unwrap();
        renderer.produce(&mut left, &mut right);
        assert_eq!(underrun_events(&events), vec![1]);
    }

    #[test]
    fn test_full_underrun_after_partial_not_reported() {
        let session = BridgeSession::new(BridgeConfig::new(48000.0));
        let (mut input, mut renderer, events) = session.split();
        input.set_format(ChannelLayout::Stereo, 48000.0).unwrap();

        let mut left = [0.0; 4];
        let mut right = [0.0; 4];
        input.accept(PcmFrame::new(vec![1.0, 1.0])).unwrap();
        renderer.produce(&mut left, &mut right);
        // Stream stops entirely: full-buffer underruns are a legitimate
        // stop, not starvation.
        renderer.produce(&mut left, &mut right);
        renderer.produce(&mut left, &mut right);
        assert!(underrun_events(&events).is_empty());
        assert_eq!(left, [1.0; 4]);
    }

    #[test]
    fn test_stop_transition_after_check_delay() {
        let mut config = BridgeConfig::new(48000.0);
        config.start_stop_delay = Duration::ZERO;
        let session = BridgeSession::new(config);
        let (mut input, mut renderer, events) = session.split();
        input.set_format(ChannelLayout::Stereo, 48000.0).unwrap();

        input.accept(PcmFrame::new(vec![1.0, 1.0])).unwrap();
        let _ = statuses(&events);

        let mut left = [0.0; 4];
        let mut right = [0.0; 4];
        // Drains the queue, underruns, and with a zero delay the pending
        // check fires within the same call and finds the queue empty.
        renderer.produce(&mut left, &mut right);

        let reported = statuses(&events);
        assert!(!reported.is_empty());
        assert!(!reported.last().unwrap().queue_not_empty);
    }

    #[test]
    fn test_declick_values_zeroed_on_restart() {
        let mut config = BridgeConfig::new(48000.0);
        config.start_stop_delay = Duration::ZERO;
        let session = BridgeSession::new(config);
        let (mut input, mut renderer, _events) = session.split();
        input.set_format(ChannelLayout::Stereo, 48000.0).unwrap();

        let mut left = [0.0; 4];
        let mut right = [0.0; 4];

        // Play something, let the stream stop; fill values are now 5.0.
        input.accept(PcmFrame::new(vec![5.0, 5.0])).unwrap();
        renderer.produce(&mut left, &mut right);
        assert_eq!(left, [5.0; 4]);

        // Reconnect: new data restarts the stream, then the fill is flushed
        // before the renderer gets to it.
        input.accept(PcmFrame::new(vec![8.0, 8.0])).unwrap();
        input.reset_fill();
        renderer.produce(&mut left, &mut right);
        // A stale 5.0 here would be an audible artifact of the old stream.
        assert_eq!(left, [0.0; 4]);
        assert_eq!(right, [0.0; 4]);
    }
}
