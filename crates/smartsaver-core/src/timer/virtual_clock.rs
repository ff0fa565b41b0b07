//! Deterministic timers on a virtual clock.
//!
//! Nothing fires on its own: the driver pops due timers with
//! [`VirtualTimers::pop_due`] and hands them to the controller, which makes
//! gesture sequences reproducible to the millisecond.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use super::{TimerHandle, TimerService};

#[derive(Debug, Default)]
struct VirtualClock {
    now_ms: u64,
    next_id: u64,
    /// (deadline_ms, handle), unordered.
    pending: Vec<(u64, TimerHandle)>,
}

/// Virtual-time [`TimerService`]. Clones share the same clock.
#[derive(Debug, Clone, Default)]
pub struct VirtualTimers {
    clock: Rc<RefCell<VirtualClock>>,
}

impl VirtualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.borrow().now_ms
    }

    /// Number of armed timers.
    pub fn armed(&self) -> usize {
        self.clock.borrow().pending.len()
    }

    /// Deadline of `handle`, if it is still armed.
    pub fn deadline(&self, handle: TimerHandle) -> Option<u64> {
        self.clock
            .borrow()
            .pending
            .iter()
            .find(|(_, h)| *h == handle)
            .map(|(deadline, _)| *deadline)
    }

    /// Remove the earliest timer due at or before `until_ms` and move the
    /// clock to its deadline. Ties fire in arming order.
    pub fn pop_due(&self, until_ms: u64) -> Option<(u64, TimerHandle)> {
        let mut clock = self.clock.borrow_mut();
        let (index, &(deadline, handle)) = clock
            .pending
            .iter()
            .enumerate()
            .filter(|(_, (deadline, _))| *deadline <= until_ms)
            .min_by_key(|(_, (deadline, handle))| (*deadline, *handle))?;
        clock.pending.remove(index);
        clock.now_ms = clock.now_ms.max(deadline);
        Some((deadline, handle))
    }

    /// Move the clock forward without firing anything.
    pub fn set_now(&self, now_ms: u64) {
        let mut clock = self.clock.borrow_mut();
        clock.now_ms = clock.now_ms.max(now_ms);
    }
}

impl TimerService for VirtualTimers {
    fn after(&mut self, delay: Duration) -> TimerHandle {
        let mut clock = self.clock.borrow_mut();
        clock.next_id += 1;
        let handle = TimerHandle(clock.next_id);
        let deadline = clock.now_ms + delay.as_millis() as u64;
        clock.pending.push((deadline, handle));
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.clock.borrow_mut().pending.retain(|(_, h)| *h != handle);
    }
}
