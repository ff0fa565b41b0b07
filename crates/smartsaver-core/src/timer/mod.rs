mod virtual_clock;

pub use virtual_clock::VirtualTimers;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Handle of a one-shot timer armed through a [`TimerService`].
///
/// When the timer fires, the host hands the handle back to the controller,
/// which ignores handles it no longer owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerHandle(pub u64);

impl std::fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Monotonic one-shot timers.
pub trait TimerService {
    /// Arm a timer that fires once after `delay`.
    fn after(&mut self, delay: Duration) -> TimerHandle;

    /// Disarm a timer. Unknown or already-fired handles are ignored.
    fn cancel(&mut self, handle: TimerHandle);
}
