//! Hysteresis deciding when the real-time render path is live.
//!
//! Rapid thrash around momentary silence is avoided by only stopping when a
//! delayed check (scheduled by the renderer after an underrun) still finds
//! the queue empty. Each `Stopped -> Started` transition bumps a declick
//! epoch; the renderer zeroes its fill values when it observes a new epoch,
//! so resumption never replays stale sample values.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug)]
pub struct StartStopController {
    running: AtomicBool,
    epoch: AtomicU64,
}

impl StartStopController {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Monotonic count of `Stopped -> Started` transitions.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Producer side: data was pushed into an empty queue.
    /// Returns true on an actual `Stopped -> Started` transition.
    pub(crate) fn note_data_available(&self) -> bool {
        let was_running = self.running.swap(true, Ordering::AcqRel);
        if !was_running {
            self.epoch.fetch_add(1, Ordering::AcqRel);
        }
        !was_running
    }

    /// Render side: the delayed check fired and the queue is still empty.
    /// Returns true on an actual `Started -> Stopped` transition.
    pub(crate) fn note_drained(&self) -> bool {
        self.running.swap(false, Ordering::AcqRel)
    }
}

impl Default for StartStopController {
    fn default() -> Self {
        Self::new()
    }
}
