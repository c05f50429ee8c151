// Licensed under the Apache-2.0 license

//! Completion events signalled by the interrupt handler and awaited by
//! callers. Each kind has its own flag and condition variable so waking one
//! waiter never disturbs the others.

use crate::error::{DpuError, DpuResult};
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

/// How long a caller blocks for any hardware acknowledgement.
pub const EVENT_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HwEvent {
    Stop,
    Update,
    AllUpdate,
}

impl fmt::Display for HwEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HwEvent::Stop => "stop",
            HwEvent::Update => "update",
            HwEvent::AllUpdate => "all update",
        };
        f.write_str(name)
    }
}

/// A resettable flag with waiters.
#[derive(Default)]
pub struct EventFlag {
    set: Mutex<bool>,
    cond: Condvar,
}

impl EventFlag {
    pub fn signal(&self) {
        *self.lock() = true;
        self.cond.notify_all();
    }

    pub fn clear(&self) {
        *self.lock() = false;
    }

    pub fn is_set(&self) -> bool {
        *self.lock()
    }

    /// Blocks until the flag is set or `timeout` passes. Returns whether the
    /// flag was observed set; the flag itself is left untouched.
    pub fn wait(&self, timeout: Duration) -> bool {
        let guard = self.lock();
        let (guard, _) = self
            .cond
            .wait_timeout_while(guard, timeout, |set| !*set)
            .unwrap_or_else(|e| e.into_inner());
        *guard
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.set.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Default)]
pub struct HwEvents {
    pub stop: EventFlag,
    pub update: EventFlag,
    pub all_update: EventFlag,
}

impl HwEvents {
    pub fn flag(&self, event: HwEvent) -> &EventFlag {
        match event {
            HwEvent::Stop => &self.stop,
            HwEvent::Update => &self.update,
            HwEvent::AllUpdate => &self.all_update,
        }
    }

    pub fn signal(&self, event: HwEvent) {
        self.flag(event).signal();
    }

    /// Waits for `event` without touching the flag first. Callers clear it
    /// before writing the trigger so a fast interrupt is not missed.
    pub fn wait(&self, event: HwEvent) -> DpuResult<()> {
        if self.flag(event).wait(EVENT_TIMEOUT) {
            Ok(())
        } else {
            Err(DpuError::Timeout(event))
        }
    }

    /// Clears the flag and waits for the next signal. A stale signal from an
    /// earlier trigger can therefore never satisfy this wait.
    pub fn wait_fresh(&self, event: HwEvent) -> DpuResult<()> {
        self.flag(event).clear();
        self.wait(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_signal_wakes_waiter() {
        let events = Arc::new(HwEvents::default());
        let signaller = events.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            signaller.signal(HwEvent::Update);
        });
        assert_eq!(events.wait_fresh(HwEvent::Update), Ok(()));
        handle.join().unwrap();
        assert!(events.update.is_set());
        assert!(!events.all_update.is_set());
    }

    #[test]
    fn test_stale_signal_is_discarded() {
        let events = HwEvents::default();
        events.signal(HwEvent::AllUpdate);
        let start = Instant::now();
        assert_eq!(
            events.wait_fresh(HwEvent::AllUpdate),
            Err(DpuError::Timeout(HwEvent::AllUpdate))
        );
        let elapsed = start.elapsed();
        assert!(elapsed >= EVENT_TIMEOUT);
        assert!(elapsed < Duration::from_millis(600));
        assert!(!events.all_update.is_set());
    }

    #[test]
    fn test_plain_wait_sees_existing_signal() {
        let flag = EventFlag::default();
        flag.signal();
        assert!(flag.wait(Duration::from_millis(1)));
        flag.clear();
        assert!(!flag.wait(Duration::from_millis(1)));
    }
}
