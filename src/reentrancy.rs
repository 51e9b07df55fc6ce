//! Debug-only lock reentrancy guard.
//!
//! `parking_lot` locks are not reentrant: a thread that already holds a
//! dict's lock and tries to take it again blocks forever. That can only
//! happen through a cycle (a dict nested inside itself and then compared
//! or rendered while its lock is held). In debug builds, each thread tracks
//! the dicts whose locks it is about to take or holds, and entering one
//! twice panics instead of hanging. In release builds this compiles to a
//! zero-cost no-op.

use core::marker::PhantomData;

#[cfg(debug_assertions)]
use core::cell::RefCell;
#[cfg(debug_assertions)]
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(debug_assertions)]
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

#[cfg(debug_assertions)]
thread_local! {
    static HELD: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };
}

/// Per-instance reentrancy tracker. Embed this in structs to guard lock
/// acquisition with `let _g = self.reentrancy.enter();` taken *before* the
/// lock itself.
#[derive(Debug)]
pub struct DebugReentrancy {
    #[cfg(debug_assertions)]
    id: u64,
}

impl DebugReentrancy {
    pub fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Enter a guarded section. In debug builds, panics if this thread is
    /// already inside a guarded section of the same instance.
    #[inline]
    pub fn enter(&self) -> ReentrancyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            HELD.with(|held| {
                let mut held = held.borrow_mut();
                assert!(
                    !held.contains(&self.id),
                    "reentrancy detected: dict locked again by the thread holding it"
                );
                held.push(self.id);
            });
            return ReentrancyGuard {
                owner: self,
                _nosend: PhantomData,
            };
        }

        #[cfg(not(debug_assertions))]
        {
            return ReentrancyGuard { _z: PhantomData };
        }
    }
}

impl Default for DebugReentrancy {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard returned by `DebugReentrancy::enter`. Bound to the entering thread.
pub struct ReentrancyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(debug_assertions)]
    _nosend: PhantomData<*mut ()>,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<(&'a (), *mut ())>,
}

impl<'a> Drop for ReentrancyGuard<'a> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            let id = self.owner.id;
            // The thread-local may already be gone during thread teardown.
            let _ = HELD.try_with(|held| {
                let mut held = held.borrow_mut();
                if let Some(pos) = held.iter().rposition(|&h| h == id) {
                    held.swap_remove(pos);
                }
            });
        }
    }
}
