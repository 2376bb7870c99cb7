//! Registry of running connection workers.
//!
//! The manager never joins or restarts workers, but keeps their handles so the
//! set of running subscriptions can be observed or torn down.

use std::path::PathBuf;

use krec_core::Subscription;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::worker::WorkerState;

/// Handle to one spawned [`ConnectionWorker`](crate::worker::ConnectionWorker).
#[derive(Debug)]
pub struct WorkerHandle {
    pub subscription: Subscription,
    pub output_path: PathBuf,
    state: watch::Receiver<WorkerState>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    pub fn new(
        subscription: Subscription,
        output_path: PathBuf,
        state: watch::Receiver<WorkerState>,
        task: JoinHandle<()>,
    ) -> Self {
        Self { subscription, output_path, state, task }
    }

    /// Latest state published by the worker.
    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// All workers started by one manager run.
#[derive(Debug, Default)]
pub struct WorkerRegistry {
    workers: Vec<WorkerHandle>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handle: WorkerHandle) {
        self.workers.push(handle);
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkerHandle> {
        self.workers.iter()
    }

    pub fn get(&self, sub: &Subscription) -> Option<&WorkerHandle> {
        self.workers.iter().find(|w| w.subscription == *sub)
    }

    /// Number of workers currently in `state`.
    pub fn count_in(&self, state: WorkerState) -> usize {
        self.workers.iter().filter(|w| w.state() == state).count()
    }

    /// Abort every worker task. Writers are released as the tasks drop.
    pub fn abort_all(&mut self) {
        for worker in self.workers.drain(..) {
            worker.task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use krec_core::Channel;

    use super::*;

    #[tokio::test]
    async fn tracks_handles_and_states() {
        let mut registry = WorkerRegistry::new();
        assert!(registry.is_empty());

        let sub = Subscription::new("BTC/USD", Channel::Book, 10);
        let (state_tx, state_rx) = watch::channel(WorkerState::Connecting);
        let task = tokio::spawn(std::future::pending::<()>());
        registry.register(WorkerHandle::new(sub.clone(), PathBuf::from("BTC_USD_book.jsonl"), state_rx, task));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.count_in(WorkerState::Connecting), 1);

        state_tx.send_replace(WorkerState::Subscribed);
        assert_eq!(registry.get(&sub).unwrap().state(), WorkerState::Subscribed);
        assert_eq!(registry.count_in(WorkerState::Subscribed), 1);

        registry.abort_all();
        assert!(registry.is_empty());
    }
}
