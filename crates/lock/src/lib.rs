pub mod error;

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use kvgate_common::monotonic_ns;
use tracing::debug;

pub use error::LockError;

/// Blocking exclusive locks addressable by a numeric key, with token-based
/// ownership verification.
///
/// Each entry carries a one-slot rendezvous channel holding at most one
/// permit: `lock` consumes it, `unlock` republishes it. Release requires the
/// session token stamped on acquisition, so only the holder can unlock.
pub struct KeyLockRegistry {
    entries: Mutex<HashMap<u64, Arc<LockEntry>>>,
    /// Documented lifetime for a held lock. Stored for operators and
    /// forward compatibility; the engine itself is timeout-free, so callers
    /// that need a bound must interpose their own timer.
    life_time: Duration,
}

struct LockEntry {
    /// Sender half of the permit channel. Taken and dropped on dispose so
    /// pending `lock` calls observe the disconnect.
    permit_tx: Mutex<Option<Sender<()>>>,
    permit_rx: Receiver<()>,
    /// Current holder's token; 0 means available.
    session: AtomicI64,
    /// Last token handed out, kept so consecutive acquisitions on the same
    /// key never collide even on a coarse clock.
    last_token: AtomicI64,
}

impl LockEntry {
    fn new() -> Arc<LockEntry> {
        let (tx, rx) = bounded(1);
        // Publish the single permit so the first lock call completes
        // immediately.
        let _ = tx.try_send(());
        Arc::new(LockEntry {
            permit_tx: Mutex::new(Some(tx)),
            permit_rx: rx,
            session: AtomicI64::new(0),
            last_token: AtomicI64::new(0),
        })
    }

    fn next_token(&self) -> i64 {
        let now = monotonic_ns();
        let prev = self.last_token.fetch_max(now, Ordering::Relaxed);
        if prev < now {
            now
        } else {
            // Clock tie; take the next free value instead.
            self.last_token.fetch_add(1, Ordering::Relaxed) + 1
        }
    }
}

impl KeyLockRegistry {
    pub fn new(life_time: Duration) -> KeyLockRegistry {
        KeyLockRegistry {
            entries: Mutex::new(HashMap::new()),
            life_time,
        }
    }

    pub fn life_time(&self) -> Duration {
        self.life_time
    }

    fn entry(&self, key: u64) -> Option<Arc<LockEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    /// Creates the entry for `key` and publishes its single permit.
    /// Re-initialising an existing key is undefined: the old entry is
    /// replaced wholesale, and any holder or waiter on it is stranded.
    pub fn init_lock(&self, key: u64) {
        let entry = LockEntry::new();
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, entry);
        debug!(key, "lock initialised");
    }

    /// Acquires the lock, blocking until the permit is available. Returns
    /// the session token identifying this acquisition. There is no timeout
    /// and no cancellation; a disposed entry fails pending callers.
    pub fn lock(&self, key: u64) -> Result<i64, LockError> {
        let entry = self.entry(key).ok_or(LockError::NotInitialised(key))?;
        entry
            .permit_rx
            .recv()
            .map_err(|_| LockError::Closed(key))?;
        let token = entry.next_token();
        entry.session.store(token, Ordering::SeqCst);
        Ok(token)
    }

    /// Releases the lock, but only for the holder: the stored session token
    /// is compare-and-swapped from `session` to 0. On a mismatch nothing is
    /// released and the caller learns it is not the holder.
    pub fn unlock(&self, session: i64, key: u64) -> Result<(), LockError> {
        let entry = self.entry(key).ok_or(LockError::NotInitialised(key))?;
        entry
            .session
            .compare_exchange(session, 0, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| LockError::OwnershipViolation(key))?;
        let guard = entry
            .permit_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = guard.as_ref() {
            // Capacity is 1 and the permit was consumed on acquisition, so
            // this republish cannot fail; a concurrently disposed entry has
            // no sender left and nothing to release.
            let _ = tx.try_send(());
        }
        Ok(())
    }

    /// Removes the entry. An available permit is drained first, then the
    /// channel is disconnected so blocked `lock` callers fail.
    pub fn dispose_lock(&self, key: u64) {
        let removed = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
        let Some(entry) = removed else {
            return;
        };
        if entry.session.load(Ordering::SeqCst) == 0 {
            let _ = entry.permit_rx.try_recv();
        }
        entry
            .permit_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        debug!(key, "lock disposed");
    }
}
