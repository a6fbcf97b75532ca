//! Worker threads of a playback session and the state they share.

mod audio;
mod completion;
mod guard;
mod shared;
mod video;

use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use log::error;

use crate::error::Result;

pub(in crate::playback::session) use audio::AudioWorker;
pub(in crate::playback::session) use completion::CompletionWaiter;
pub(in crate::playback::session) use guard::ArrivalGuard;
pub(in crate::playback::session) use shared::SessionShared;
pub(in crate::playback::session) use video::VideoWorker;

/// Spawn a named session thread.
///
/// A panic inside `body` is logged instead of propagated. Barrier guards
/// owned by `body` still arrive while it unwinds, so the rest of the session
/// winds down normally.
pub(in crate::playback::session) fn spawn_named(
    name: String,
    body: impl FnOnce() + Send + 'static,
) -> Result<JoinHandle<()>> {
    let label = name.clone();
    let handle = thread::Builder::new().name(name).spawn(move || {
        if panic::catch_unwind(AssertUnwindSafe(body)).is_err() {
            error!("{} panicked", label);
        }
    })?;
    Ok(handle)
}
