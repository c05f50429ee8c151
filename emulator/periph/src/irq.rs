/*++

Licensed under the Apache-2.0 license.

File Name:

    irq.rs

Abstract:

    File contains a level triggered interrupt line and the thread that
    delivers it to a handler.

--*/

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How often the dispatcher rechecks whether it should exit.
const DISPATCH_POLL: Duration = Duration::from_millis(10);

/// A level triggered interrupt line. Clones refer to the same line.
#[derive(Clone, Default)]
pub struct IrqLine {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl IrqLine {
    pub fn set_level(&self, level: bool) {
        *self.lock() = level;
        if level {
            self.inner.1.notify_all();
        }
    }

    pub fn is_asserted(&self) -> bool {
        *self.lock()
    }

    /// Blocks until the line is asserted or `timeout` passes.
    pub fn wait_asserted(&self, timeout: Duration) -> bool {
        let guard = self.lock();
        let (guard, _) = self
            .inner
            .1
            .wait_timeout_while(guard, timeout, |level| !*level)
            .unwrap_or_else(|e| e.into_inner());
        *guard
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.inner.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Calls a handler for as long as an [`IrqLine`] stays asserted. The
/// handler is expected to acknowledge the source, which drops the line.
pub struct IrqDispatcher {
    exit: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl IrqDispatcher {
    pub fn spawn<F>(line: IrqLine, handler: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let exit = Arc::new(AtomicBool::new(false));
        let thread_exit = exit.clone();
        let handle = thread::Builder::new()
            .name("dpu-irq".to_string())
            .spawn(move || {
                while !thread_exit.load(Ordering::SeqCst) {
                    if line.wait_asserted(DISPATCH_POLL) {
                        handler();
                    }
                }
            })
            .map_err(|e| log::error!("failed to start irq dispatcher: {}", e))
            .ok();
        Self { exit, handle }
    }
}

impl Drop for IrqDispatcher {
    fn drop(&mut self) {
        self.exit.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn test_level_wakes_waiter() {
        let line = IrqLine::default();
        let raiser = line.clone();
        let t = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            raiser.set_level(true);
        });
        assert!(line.wait_asserted(Duration::from_secs(1)));
        t.join().unwrap();
        line.set_level(false);
        assert!(!line.wait_asserted(Duration::from_millis(5)));
    }

    #[test]
    fn test_dispatcher_runs_handler_until_acknowledged() {
        let line = IrqLine::default();
        let calls = Arc::new(AtomicU32::new(0));
        let handler_line = line.clone();
        let handler_calls = calls.clone();
        let dispatcher = IrqDispatcher::spawn(line.clone(), move || {
            handler_calls.fetch_add(1, Ordering::SeqCst);
            handler_line.set_level(false);
        });
        line.set_level(true);
        for _ in 0..100 {
            if calls.load(Ordering::SeqCst) > 0 {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        drop(dispatcher);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!line.is_asserted());
    }
}
