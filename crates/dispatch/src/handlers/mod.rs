//! One thin adaptor per message type: pull typed fields out of the
//! envelope, call the backing component, write the outcome into `body` and
//! ship the envelope back on its originating transport.

mod kv;
mod lock;
mod sql;

use std::sync::Arc;

use kvgate_lock::KeyLockRegistry;

use crate::backend::{KvBackend, SqlBackend};
use crate::dispatcher::{DispatcherBuilder, MessageHandler};
use crate::protocol::{MessageKind, SCHEME_S2S, TAG_STORAGE};

pub use kv::{KvCloseHandler, KvDoHandler, KvFlushHandler, KvOpenHandler, KvReceiveHandler, KvSendHandler};
pub use lock::{DisposeLockHandler, InitLockHandler, LockKeyHandler, UnlockKeyHandler};
pub use sql::{ExecHandler, QueryHandler, TransactionHandler};

/// Registers the full storage routing table under the server-to-server
/// scheme. Backends that are not linked in simply leave their routes
/// unregistered.
pub fn storage_routes(
    mut builder: DispatcherBuilder,
    sql: Option<Arc<dyn SqlBackend>>,
    kv: Option<Arc<dyn KvBackend>>,
    locks: Arc<KeyLockRegistry>,
) -> DispatcherBuilder {
    let route = |builder: DispatcherBuilder, kind: MessageKind, handler: Arc<dyn MessageHandler>| {
        builder.route(SCHEME_S2S, TAG_STORAGE, kind.as_i64(), handler)
    };

    if let Some(sql) = sql {
        builder = route(
            builder,
            MessageKind::SqlQuery,
            Arc::new(QueryHandler::new(sql.clone())),
        );
        builder = route(
            builder,
            MessageKind::SqlExec,
            Arc::new(ExecHandler::new(sql.clone())),
        );
        builder = route(
            builder,
            MessageKind::SqlTransaction,
            Arc::new(TransactionHandler::new(sql)),
        );
    }

    if let Some(kv) = kv {
        builder = route(builder, MessageKind::KvOpen, Arc::new(KvOpenHandler::new(kv.clone())));
        builder = route(builder, MessageKind::KvClose, Arc::new(KvCloseHandler::new(kv.clone())));
        builder = route(builder, MessageKind::KvDo, Arc::new(KvDoHandler::new(kv.clone())));
        builder = route(builder, MessageKind::KvSend, Arc::new(KvSendHandler::new(kv.clone())));
        builder = route(builder, MessageKind::KvFlush, Arc::new(KvFlushHandler::new(kv.clone())));
        builder = route(builder, MessageKind::KvReceive, Arc::new(KvReceiveHandler::new(kv)));
    }

    builder = route(
        builder,
        MessageKind::InitLockKey,
        Arc::new(InitLockHandler::new(locks.clone())),
    );
    builder = route(
        builder,
        MessageKind::DisposeLockKey,
        Arc::new(DisposeLockHandler::new(locks.clone())),
    );
    builder = route(
        builder,
        MessageKind::LockKey,
        Arc::new(LockKeyHandler::new(locks.clone())),
    );
    builder = route(
        builder,
        MessageKind::UnlockKey,
        Arc::new(UnlockKeyHandler::new(locks)),
    );

    builder
}
