use std::sync::Arc;

use kvgate_common::Datum;
use kvgate_lock::KeyLockRegistry;
use tracing::info;

use crate::dispatcher::MessageHandler;
use crate::envelope::Envelope;
use crate::error::DispatchError;
use crate::protocol::{FIELD_KEY_FOR_LOCK, FIELD_SID_FOR_LOCK};
use crate::transport::ReplyPath;

fn lock_key(envelope: &Envelope) -> Result<u64, DispatchError> {
    envelope
        .reader()
        .uint_of(FIELD_KEY_FOR_LOCK)
        .ok_or(DispatchError::Malformed(FIELD_KEY_FOR_LOCK))
}

pub struct InitLockHandler {
    locks: Arc<KeyLockRegistry>,
}

impl InitLockHandler {
    pub fn new(locks: Arc<KeyLockRegistry>) -> InitLockHandler {
        InitLockHandler { locks }
    }
}

impl MessageHandler for InitLockHandler {
    fn handle(&self, mut envelope: Envelope, reply: &ReplyPath) -> Result<(), DispatchError> {
        let key = lock_key(&envelope)?;
        self.locks.init_lock(key);
        envelope.set_body(Datum::Bool(true));
        reply.send(envelope)?;
        Ok(())
    }
}

pub struct DisposeLockHandler {
    locks: Arc<KeyLockRegistry>,
}

impl DisposeLockHandler {
    pub fn new(locks: Arc<KeyLockRegistry>) -> DisposeLockHandler {
        DisposeLockHandler { locks }
    }
}

impl MessageHandler for DisposeLockHandler {
    fn handle(&self, mut envelope: Envelope, reply: &ReplyPath) -> Result<(), DispatchError> {
        let key = lock_key(&envelope)?;
        self.locks.dispose_lock(key);
        envelope.set_body(Datum::Bool(true));
        reply.send(envelope)?;
        Ok(())
    }
}

pub struct LockKeyHandler {
    locks: Arc<KeyLockRegistry>,
}

impl LockKeyHandler {
    pub fn new(locks: Arc<KeyLockRegistry>) -> LockKeyHandler {
        LockKeyHandler { locks }
    }
}

impl MessageHandler for LockKeyHandler {
    /// Blocks the draining worker until the permit is available; callers
    /// that need a bound interpose their own timer.
    fn handle(&self, mut envelope: Envelope, reply: &ReplyPath) -> Result<(), DispatchError> {
        let key = lock_key(&envelope)?;
        let body = match self.locks.lock(key) {
            Ok(token) => Datum::Int(token),
            Err(err) => {
                info!(key, %err, "lock acquisition failed");
                Datum::Str(err.to_string())
            }
        };
        envelope.set_body(body);
        reply.send(envelope)?;
        Ok(())
    }
}

pub struct UnlockKeyHandler {
    locks: Arc<KeyLockRegistry>,
}

impl UnlockKeyHandler {
    pub fn new(locks: Arc<KeyLockRegistry>) -> UnlockKeyHandler {
        UnlockKeyHandler { locks }
    }
}

impl MessageHandler for UnlockKeyHandler {
    fn handle(&self, mut envelope: Envelope, reply: &ReplyPath) -> Result<(), DispatchError> {
        let key = lock_key(&envelope)?;
        let sid = envelope
            .reader()
            .int_of(FIELD_SID_FOR_LOCK)
            .ok_or(DispatchError::Malformed(FIELD_SID_FOR_LOCK))?;
        let body = match self.locks.unlock(sid, key) {
            Ok(()) => Datum::Bool(true),
            Err(err) => {
                info!(key, sid, %err, "unlock failed");
                Datum::Str(err.to_string())
            }
        };
        envelope.set_body(body);
        reply.send(envelope)?;
        Ok(())
    }
}
