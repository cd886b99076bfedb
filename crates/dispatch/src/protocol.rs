//! Wire-level naming shared with the gateway's clients. The encoding itself
//! is the transport's concern; the field set and type numbers below are the
//! contract.

/// Server-to-server scheme under which every storage message travels.
pub const SCHEME_S2S: i64 = 2;

/// Routing tag of the storage service.
pub const TAG_STORAGE: i64 = 6;

// Reserved envelope fields.
pub const FIELD_SCHEME: &str = "scheme";
pub const FIELD_TAG: &str = "tag";
pub const FIELD_TYPE: &str = "type";
pub const FIELD_BODY: &str = "body";

// Auxiliary fields, named by convention.
pub const FIELD_SQL: &str = "sql";
pub const FIELD_ARGS: &str = "args";
pub const FIELD_ACTIONS: &str = "actions";
pub const FIELD_CMD: &str = "cmd";
pub const FIELD_KEY_FOR_REDIS: &str = "key_for_redis";
pub const FIELD_KEY_FOR_LOCK: &str = "key_for_lock";
pub const FIELD_SID_FOR_LOCK: &str = "sid_for_lock";
pub const FIELD_RESULT: &str = "result";

/// Request types the storage service recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum MessageKind {
    SqlQuery = 0x11,
    SqlExec = 0x12,
    SqlTransaction = 0x13,
    KvOpen = 0x21,
    KvClose = 0x22,
    KvDo = 0x23,
    KvSend = 0x24,
    KvFlush = 0x25,
    KvReceive = 0x26,
    InitLockKey = 0x31,
    DisposeLockKey = 0x32,
    LockKey = 0x33,
    UnlockKey = 0x34,
}

impl MessageKind {
    pub fn as_i64(self) -> i64 {
        self as i64
    }
}

impl TryFrom<i64> for MessageKind {
    type Error = i64;

    fn try_from(raw: i64) -> Result<MessageKind, i64> {
        use MessageKind::*;
        Ok(match raw {
            0x11 => SqlQuery,
            0x12 => SqlExec,
            0x13 => SqlTransaction,
            0x21 => KvOpen,
            0x22 => KvClose,
            0x23 => KvDo,
            0x24 => KvSend,
            0x25 => KvFlush,
            0x26 => KvReceive,
            0x31 => InitLockKey,
            0x32 => DisposeLockKey,
            0x33 => LockKey,
            0x34 => UnlockKey,
            other => return Err(other),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_i64() {
        for kind in [
            MessageKind::SqlQuery,
            MessageKind::SqlExec,
            MessageKind::SqlTransaction,
            MessageKind::KvOpen,
            MessageKind::KvClose,
            MessageKind::KvDo,
            MessageKind::KvSend,
            MessageKind::KvFlush,
            MessageKind::KvReceive,
            MessageKind::InitLockKey,
            MessageKind::DisposeLockKey,
            MessageKind::LockKey,
            MessageKind::UnlockKey,
        ] {
            assert_eq!(MessageKind::try_from(kind.as_i64()), Ok(kind));
        }
        assert_eq!(MessageKind::try_from(0), Err(0));
    }
}
