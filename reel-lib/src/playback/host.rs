//! Host-side integration: executor port and callback set.
//!
//! The engine never assumes anything about the host's threading model. Every
//! callback goes through a [`HostExecutor`], which decides where it runs.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use log::warn;

use super::FrameTick;

/// Unit of work delivered to the host.
pub type HostTask = Box<dyn FnOnce() + Send + 'static>;

/// Port through which callbacks reach the host's event thread.
pub trait HostExecutor: Send + Sync {
    fn execute(&self, task: HostTask);
}

/// Runs every task immediately on the calling (worker) thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl HostExecutor for InlineExecutor {
    fn execute(&self, task: HostTask) {
        task();
    }
}

/// Queues tasks until the host drains them from its own thread.
pub struct QueuedExecutor {
    sender: Mutex<Sender<HostTask>>,
    receiver: Mutex<Receiver<HostTask>>,
}

impl QueuedExecutor {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender: Mutex::new(sender),
            receiver: Mutex::new(receiver),
        }
    }

    /// Run every queued task on the calling thread; returns how many ran.
    pub fn run_pending(&self) -> usize {
        let tasks: Vec<HostTask> = {
            let receiver = self.receiver.lock().unwrap();
            receiver.try_iter().collect()
        };
        let count = tasks.len();
        for task in tasks {
            task();
        }
        count
    }
}

impl Default for QueuedExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl HostExecutor for QueuedExecutor {
    fn execute(&self, task: HostTask) {
        if self.sender.lock().unwrap().send(task).is_err() {
            warn!("host executor queue closed; dropping callback");
        }
    }
}

pub type PositionCallback = Arc<dyn Fn(FrameTick) + Send + Sync>;
pub type LabelCallback = Arc<dyn Fn(Option<String>) + Send + Sync>;
pub type CompleteCallback = Box<dyn FnOnce() + Send>;

/// Callbacks a host registers for one session.
#[derive(Default)]
pub struct HostCallbacks {
    pub(crate) on_position: Option<PositionCallback>,
    pub(crate) on_label: Option<LabelCallback>,
    pub(crate) on_complete: Option<CompleteCallback>,
}

impl HostCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called for every paced frame tick, including ticks past the last
    /// decoded frame while the soundtrack is still playing.
    pub fn on_position(mut self, callback: impl Fn(FrameTick) + Send + Sync + 'static) -> Self {
        self.on_position = Some(Arc::new(callback));
        self
    }

    /// Called whenever the active subtitle changes (`None` clears it).
    pub fn on_label(mut self, callback: impl Fn(Option<String>) + Send + Sync + 'static) -> Self {
        self.on_label = Some(Arc::new(callback));
        self
    }

    /// Called once when a session that was not terminated has fully wound down.
    pub fn on_complete(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }
}
