//! One-shot rendezvous barrier with an anchored grace period.
//!
//! Every session builds fresh barriers sized for the workers it will
//! actually run. Parties either [`Rendezvous::arrive`] (count and move on)
//! or [`Rendezvous::wait`] (count and block until everyone is in).
//!
//! One party, the anchor, starts a grace clock when it arrives. Once that
//! clock runs out the barrier breaks: every waiter is released with
//! [`Crossing::TimedOut`] and late arrivals pass straight through. Without a
//! grace period the barrier waits forever.

use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use log::warn;

/// How a waiter left the barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossing {
    /// All parties arrived.
    Released,
    /// The grace period after the anchor's arrival expired first.
    TimedOut,
}

#[derive(Debug, Default)]
struct BarrierState {
    arrived: usize,
    anchored_at: Option<Instant>,
    released: bool,
    broken: bool,
}

#[derive(Debug)]
pub struct Rendezvous {
    name: &'static str,
    parties: usize,
    grace: Option<Duration>,
    state: Mutex<BarrierState>,
    changed: Condvar,
}

impl Rendezvous {
    pub fn new(name: &'static str, parties: usize, grace: Option<Duration>) -> Self {
        Self {
            name,
            parties: parties.max(1),
            grace,
            state: Mutex::new(BarrierState::default()),
            changed: Condvar::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parties(&self) -> usize {
        self.parties
    }

    pub fn arrived(&self) -> usize {
        self.state.lock().unwrap().arrived
    }

    /// True once the barrier has released, normally or by timing out.
    pub fn is_released(&self) -> bool {
        self.state.lock().unwrap().released
    }

    /// Count an arrival without waiting.
    pub fn arrive(&self) {
        self.register(false);
    }

    /// Count the anchor's arrival without waiting.
    pub fn arrive_as_anchor(&self) {
        self.register(true);
    }

    /// Count an arrival and block until the barrier releases.
    pub fn wait(&self) -> Crossing {
        self.register(false);
        self.block()
    }

    /// Count the anchor's arrival and block until the barrier releases.
    pub fn anchor_and_wait(&self) -> Crossing {
        self.register(true);
        self.block()
    }

    fn register(&self, anchor: bool) {
        let mut state = self.state.lock().unwrap();
        state.arrived += 1;
        if anchor && state.anchored_at.is_none() {
            state.anchored_at = Some(Instant::now());
        }
        if state.arrived >= self.parties && !state.released {
            state.released = true;
        }
        self.changed.notify_all();
    }

    fn block(&self) -> Crossing {
        let mut state = self.state.lock().unwrap();
        loop {
            if state.released {
                return if state.broken {
                    Crossing::TimedOut
                } else {
                    Crossing::Released
                };
            }

            match (self.grace, state.anchored_at) {
                (Some(grace), Some(anchored_at)) => {
                    let deadline = anchored_at + grace;
                    let now = Instant::now();
                    if now >= deadline {
                        warn!(
                            "{} barrier gave up after {:?}: {} of {} parties arrived",
                            self.name, grace, state.arrived, self.parties
                        );
                        state.released = true;
                        state.broken = true;
                        self.changed.notify_all();
                        return Crossing::TimedOut;
                    }
                    state = self.changed.wait_timeout(state, deadline - now).unwrap().0;
                }
                _ => {
                    state = self.changed.wait(state).unwrap();
                }
            }
        }
    }
}
