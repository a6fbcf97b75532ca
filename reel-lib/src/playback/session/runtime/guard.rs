//! Barrier arrival guard for worker threads.

use std::sync::Arc;

use crate::playback::rendezvous::{Crossing, Rendezvous};

/// Guarantees a worker arrives at a barrier exactly once.
///
/// Either the worker calls [`ArrivalGuard::wait`] at the right point, or the
/// guard arrives on drop: on an early error return and on panic unwind
/// alike. The other parties can therefore never be left waiting on a worker
/// that has already exited.
pub(in crate::playback::session) struct ArrivalGuard {
    barrier: Option<Arc<Rendezvous>>,
    anchor: bool,
}

impl ArrivalGuard {
    pub(in crate::playback::session) fn new(barrier: Arc<Rendezvous>) -> Self {
        Self {
            barrier: Some(barrier),
            anchor: false,
        }
    }

    /// Guard for the party whose arrival starts the barrier's grace clock.
    pub(in crate::playback::session) fn anchor(barrier: Arc<Rendezvous>) -> Self {
        Self {
            barrier: Some(barrier),
            anchor: true,
        }
    }

    /// Arrive now and block until the barrier releases.
    pub(in crate::playback::session) fn wait(mut self) -> Crossing {
        match self.barrier.take() {
            Some(barrier) if self.anchor => barrier.anchor_and_wait(),
            Some(barrier) => barrier.wait(),
            None => Crossing::Released,
        }
    }
}

impl Drop for ArrivalGuard {
    fn drop(&mut self) {
        if let Some(barrier) = self.barrier.take() {
            if self.anchor {
                barrier.arrive_as_anchor();
            } else {
                barrier.arrive();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn dropped_guard_counts_as_arrival() {
        let barrier = Arc::new(Rendezvous::new("completion", 2, None));
        drop(ArrivalGuard::new(barrier.clone()));
        assert_eq!(barrier.arrived(), 1);
    }

    #[test]
    fn waited_guard_does_not_arrive_twice() {
        let barrier = Arc::new(Rendezvous::new("start", 1, None));
        assert_eq!(ArrivalGuard::anchor(barrier.clone()).wait(), Crossing::Released);
        assert_eq!(barrier.arrived(), 1);
    }

    #[test]
    fn panicking_worker_still_arrives() {
        let barrier = Arc::new(Rendezvous::new("completion", 2, None));
        let worker = {
            let barrier = barrier.clone();
            thread::spawn(move || {
                let _guard = ArrivalGuard::new(barrier);
                panic!("decoder blew up");
            })
        };
        assert!(worker.join().is_err());
        assert_eq!(barrier.wait(), Crossing::Released);
    }
}
