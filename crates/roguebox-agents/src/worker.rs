//! Background decision computation with a single-slot handoff queue.
//!
//! The decision step (choosing which command to send) can be slow -- an
//! LLM call, a deep policy evaluation. [`DecisionWorker`] runs it on a
//! background thread while the orchestrator's surface stays non-blocking:
//!
//! - a bounded channel of capacity 1 carries at most one pending decision
//! - the main loop polls without blocking and performs a no-op step when
//!   nothing is ready
//! - at most one computation may be outstanding per run
//! - on restart, [`drain`](DecisionWorker::drain) must discard any
//!   in-flight result before resuming, so a decision computed against a
//!   previous run's screen is never applied to the new run
//!
//! The worker only ever sees an owned screen snapshot taken at scheduling
//! time; it never reads the orchestrator's live buffers.

use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TryRecvError};
use std::thread::JoinHandle;

use roguebox_types::RogueError;

/// Runs one decision computation at a time on a background thread.
pub struct DecisionWorker {
    tx: SyncSender<String>,
    rx: Receiver<String>,
    handle: Option<JoinHandle<()>>,
    pending: bool,
}

impl DecisionWorker {
    pub fn new() -> Self {
        let (tx, rx) = sync_channel(1);
        Self {
            tx,
            rx,
            handle: None,
            pending: false,
        }
    }

    /// Whether a scheduled decision has not been polled yet.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Schedule a decision computation over an owned screen snapshot.
    ///
    /// Errors if a previous decision is still outstanding: at most one
    /// computation may be in flight per run.
    pub fn schedule<F>(&mut self, screen: Vec<String>, decide: F) -> Result<(), RogueError>
    where
        F: FnOnce(Vec<String>) -> String + Send + 'static,
    {
        if self.pending {
            return Err(RogueError::Worker(
                "a decision computation is already in flight".to_string(),
            ));
        }
        self.join_finished();

        let tx = self.tx.clone();
        self.handle = Some(std::thread::spawn(move || {
            let decision = decide(screen);
            // The receiver only disappears when the worker is dropped;
            // a failed send means the decision is obsolete anyway.
            let _ = tx.send(decision);
        }));
        self.pending = true;
        Ok(())
    }

    /// Non-blocking receive of the pending decision, if it is ready.
    pub fn poll(&mut self) -> Option<String> {
        match self.rx.try_recv() {
            Ok(decision) => {
                self.pending = false;
                self.join_finished();
                Some(decision)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Discard any in-flight decision and empty the handoff queue.
    ///
    /// Must be called on restart: waits for an outstanding computation to
    /// finish, then throws its result away.
    pub fn drain(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        while self.rx.try_recv().is_ok() {}
        self.pending = false;
    }

    fn join_finished(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Default for DecisionWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DecisionWorker {
    fn drop(&mut self) {
        self.drain();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn snapshot() -> Vec<String> {
        vec!["@".to_string()]
    }

    #[test]
    fn schedule_then_poll_delivers_the_decision() {
        let mut worker = DecisionWorker::new();
        worker
            .schedule(snapshot(), |screen| {
                assert_eq!(screen[0], "@");
                "h".to_string()
            })
            .unwrap();

        // the decision arrives eventually; poll never blocks
        let mut decision = None;
        for _ in 0..100 {
            decision = worker.poll();
            if decision.is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(decision.as_deref(), Some("h"));
        assert!(!worker.is_pending());
    }

    #[test]
    fn poll_without_schedule_is_none() {
        let mut worker = DecisionWorker::new();
        assert_eq!(worker.poll(), None);
    }

    #[test]
    fn second_schedule_while_in_flight_is_forbidden() {
        let mut worker = DecisionWorker::new();
        worker
            .schedule(snapshot(), |_| {
                std::thread::sleep(Duration::from_millis(50));
                "h".to_string()
            })
            .unwrap();

        let err = worker.schedule(snapshot(), |_| "j".to_string()).unwrap_err();
        assert!(matches!(err, RogueError::Worker(_)));

        worker.drain();
    }

    #[test]
    fn drain_discards_stale_decisions() {
        let mut worker = DecisionWorker::new();
        worker
            .schedule(snapshot(), |_| "stale".to_string())
            .unwrap();
        worker.drain();

        assert_eq!(worker.poll(), None);
        assert!(!worker.is_pending());

        // the slot is free again after draining
        worker.schedule(snapshot(), |_| "fresh".to_string()).unwrap();
        worker.drain();
    }

    #[test]
    fn slow_decision_leaves_poll_non_blocking() {
        let mut worker = DecisionWorker::new();
        worker
            .schedule(snapshot(), |_| {
                std::thread::sleep(Duration::from_millis(100));
                "h".to_string()
            })
            .unwrap();

        // immediately polling finds nothing; the main loop would perform
        // a no-op step and retry later
        assert_eq!(worker.poll(), None);
        assert!(worker.is_pending());

        worker.drain();
    }
}
