// Licensed under the Apache-2.0 license

//! Deferred work scheduled from interrupt context and run on one thread.

use log::{debug, error};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Work {
    WriteBack = 1 << 0,
    CabcTrigger = 1 << 1,
    CabcBacklight = 1 << 2,
    Dvfs = 1 << 3,
}

/// A single worker thread fed by a channel. Scheduling a work item that is
/// already queued and not yet started is a no-op.
pub struct WorkQueue {
    tx: Mutex<Option<Sender<Work>>>,
    pending: Arc<AtomicU8>,
}

impl WorkQueue {
    /// Spawns the worker. `handler` returns `false` once its owner is gone,
    /// which ends the thread.
    pub fn spawn<F>(name: &str, mut handler: F) -> Self
    where
        F: FnMut(Work) -> bool + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Work>();
        let pending = Arc::new(AtomicU8::new(0));
        let worker_pending = pending.clone();
        let spawned = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while let Ok(work) = rx.recv() {
                    worker_pending.fetch_and(!(work as u8), Ordering::SeqCst);
                    debug!("Running work: {:?}", work);
                    if !handler(work) {
                        break;
                    }
                }
            });
        let tx = match spawned {
            Ok(_) => Some(tx),
            Err(e) => {
                error!("failed to start {} worker: {}", name, e);
                None
            }
        };
        Self {
            tx: Mutex::new(tx),
            pending,
        }
    }

    /// Queues `work`. Returns `false` if it was already pending or the queue
    /// has shut down.
    pub fn schedule(&self, work: Work) -> bool {
        let bit = work as u8;
        if self.pending.fetch_or(bit, Ordering::SeqCst) & bit != 0 {
            return false;
        }
        let tx = self.tx.lock().unwrap_or_else(|e| e.into_inner());
        match tx.as_ref().map(|tx| tx.send(work)) {
            Some(Ok(())) => true,
            _ => {
                self.pending.fetch_and(!bit, Ordering::SeqCst);
                false
            }
        }
    }

    pub fn is_pending(&self, work: Work) -> bool {
        self.pending.load(Ordering::SeqCst) & work as u8 != 0
    }

    /// Stops accepting work. The worker drains what is queued and exits.
    pub fn shutdown(&self) {
        self.tx.lock().unwrap_or_else(|e| e.into_inner()).take();
    }
}

impl Drop for WorkQueue {
    fn drop(&mut self) {
        // The last engine reference may be dropped on the worker itself, so
        // the thread is never joined here.
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;
    use std::time::Duration;

    #[test]
    fn test_work_runs_in_order() {
        let (done_tx, done_rx) = channel();
        let queue = WorkQueue::spawn("test-wq", move |work| {
            done_tx.send(work).is_ok()
        });
        assert!(queue.schedule(Work::Dvfs));
        assert!(queue.schedule(Work::WriteBack));
        let timeout = Duration::from_secs(1);
        assert_eq!(done_rx.recv_timeout(timeout), Ok(Work::Dvfs));
        assert_eq!(done_rx.recv_timeout(timeout), Ok(Work::WriteBack));
    }

    #[test]
    fn test_pending_work_is_not_queued_twice() {
        let (gate_tx, gate_rx) = channel::<()>();
        let (done_tx, done_rx) = channel();
        let queue = WorkQueue::spawn("test-wq", move |work| {
            if work == Work::CabcTrigger {
                let _ = gate_rx.recv();
            }
            done_tx.send(work).is_ok()
        });
        assert!(queue.schedule(Work::CabcTrigger));
        // Worker is now parked inside CabcTrigger; Dvfs stays pending.
        assert!(queue.schedule(Work::Dvfs));
        assert!(!queue.schedule(Work::Dvfs));
        assert!(queue.is_pending(Work::Dvfs));
        gate_tx.send(()).unwrap();

        let timeout = Duration::from_secs(1);
        assert_eq!(done_rx.recv_timeout(timeout), Ok(Work::CabcTrigger));
        assert_eq!(done_rx.recv_timeout(timeout), Ok(Work::Dvfs));
        assert!(done_rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn test_shutdown_rejects_work() {
        let queue = WorkQueue::spawn("test-wq", |_| true);
        queue.shutdown();
        assert!(!queue.schedule(Work::WriteBack));
        assert!(!queue.is_pending(Work::WriteBack));
    }
}
