//! Mutual-exclusion primitives that can guard a queue.
//!
//! A queue is generic over any [`RawMutex`]: `lock` is acquire, `unlock` is
//! release, and nothing more is assumed. In particular guards are not
//! reentrant, so a caller holding a queue's guard must not call back into
//! that queue.

use std::sync::atomic::{AtomicBool, Ordering};

pub use parking_lot::lock_api::RawMutex;
use parking_lot::lock_api::GuardSend;

/// Parking guard used when no other primitive is requested.
pub type DefaultGuard = parking_lot::RawMutex;

/// Busy-waiting guard for contexts that cannot park a thread.
///
/// Critical sections of the queue are bounded (O(1) or one walk), so spinning
/// is acceptable there. Not for use from interrupt handlers.
pub struct SpinGuard {
    locked: AtomicBool,
}

// SAFETY: Acquire on lock and Release on unlock order every access made
// under the guard; only one thread can observe the false -> true transition.
unsafe impl RawMutex for SpinGuard {
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: Self = SpinGuard {
        locked: AtomicBool::new(false),
    };

    type GuardMarker = GuardSend;

    fn lock(&self) {
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            while self.locked.load(Ordering::Relaxed) {
                std::hint::spin_loop();
            }
        }
    }

    fn try_lock(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    unsafe fn unlock(&self) {
        self.locked.store(false, Ordering::Release);
    }

    fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::{RawMutex, SpinGuard};
    use parking_lot::lock_api::Mutex;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn spin_guard_excludes_second_owner() {
        let guard = SpinGuard::INIT;
        guard.lock();
        assert!(guard.is_locked());
        assert!(!guard.try_lock());

        unsafe { guard.unlock() };
        assert!(!guard.is_locked());
        assert!(guard.try_lock());
        unsafe { guard.unlock() };
    }

    #[test]
    fn spin_guard_serializes_increments() {
        let counter = Arc::new(Mutex::<SpinGuard, u64>::new(0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        *counter.lock() += 1;
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*counter.lock(), 4_000);
    }
}
