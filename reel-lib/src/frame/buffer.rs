use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::video::Raster;

/// Front/back raster pair.
///
/// The renderer only ever sees the front raster, and only through
/// [`FrameBuffer::with_front`]. The producer only ever writes the back
/// raster through [`FrameBuffer::write_back_and_swap`]; the front lock is
/// taken for the pointer exchange alone, never while pixels are produced.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    front: Mutex<Raster>,
    back: Mutex<Raster>,
    swaps: AtomicU64,
}

impl FrameBuffer {
    /// An unallocated buffer; call [`FrameBuffer::init`] once dimensions are known.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate both rasters at `width` x `height`.
    pub fn init(&self, width: u32, height: u32) {
        *relock(&self.back) = Raster::new(width, height);
        *relock(&self.front) = Raster::new(width, height);
        self.swaps.store(0, Ordering::SeqCst);
    }

    pub fn dimensions(&self) -> (u32, u32) {
        let front = relock(&self.front);
        (front.width(), front.height())
    }

    /// Number of swaps published since `init`.
    pub fn swap_count(&self) -> u64 {
        self.swaps.load(Ordering::SeqCst)
    }

    /// Read the front raster while holding the swap lock.
    ///
    /// Keep `read` short: the producer waits on this lock to publish.
    pub fn with_front<T>(&self, read: impl FnOnce(&Raster) -> T) -> T {
        let front = relock(&self.front);
        read(&front)
    }

    /// Copy of the current front raster.
    pub fn snapshot(&self) -> Raster {
        self.with_front(Raster::clone)
    }

    /// Let `write` fill the back raster, then publish it if it returns
    /// `Ok(true)`.
    ///
    /// On `Ok(false)` or an error nothing is published and the front raster
    /// is untouched.
    pub fn write_back_and_swap<E>(
        &self,
        write: impl FnOnce(&mut Raster) -> Result<bool, E>,
    ) -> Result<bool, E> {
        let mut back = relock(&self.back);
        if !write(&mut back)? {
            return Ok(false);
        }

        {
            let mut front = relock(&self.front);
            std::mem::swap(&mut *front, &mut *back);
        }
        self.swaps.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

// A panicking renderer closure must not take the producer down with it.
fn relock(mutex: &Mutex<Raster>) -> MutexGuard<'_, Raster> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
