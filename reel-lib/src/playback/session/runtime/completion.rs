//! Completion waiter.
//!
//! The only part of a session that knows completion has to reach the host
//! through its executor. Decoder workers just drop their completion guards.

use std::sync::Arc;

use log::{debug, warn};

use super::shared::SessionShared;
use crate::playback::host::{CompleteCallback, HostExecutor};
use crate::playback::rendezvous::{Crossing, Rendezvous};

pub(in crate::playback::session) struct CompletionWaiter {
    pub(in crate::playback::session) shared: Arc<SessionShared>,
    pub(in crate::playback::session) barrier: Arc<Rendezvous>,
    pub(in crate::playback::session) executor: Arc<dyn HostExecutor>,
    pub(in crate::playback::session) on_complete: Option<CompleteCallback>,
}

impl CompletionWaiter {
    pub(in crate::playback::session) fn run(self) {
        let CompletionWaiter {
            shared,
            barrier,
            executor,
            on_complete,
        } = self;

        if barrier.wait() == Crossing::TimedOut {
            shared.mark_forced();
            warn!(
                "session '{}' forcing completion: {} of {} parties reached the completion barrier",
                shared.media,
                barrier.arrived(),
                barrier.parties()
            );
        }

        // Finished before the callback runs, so the host may chain a new
        // session or call `wait()` from inside it.
        shared.mark_finished();

        match on_complete {
            Some(on_complete) if !shared.is_terminated() => {
                let marshaled = shared.clone();
                executor.execute(Box::new(move || {
                    // terminate() may have landed while this sat in the host queue.
                    if marshaled.is_terminated() {
                        debug!("session '{}' terminated; completion dropped", marshaled.media);
                        return;
                    }
                    on_complete();
                }));
            }
            Some(_) => debug!("session '{}' terminated; completion suppressed", shared.media),
            None => {}
        }
    }
}
