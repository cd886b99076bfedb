use std::sync::Arc;

use kvgate_common::Datum;

use crate::backend::{BackendError, SqlBackend, TxStatement};
use crate::dispatcher::MessageHandler;
use crate::envelope::Envelope;
use crate::error::DispatchError;
use crate::protocol::{FIELD_ACTIONS, FIELD_ARGS, FIELD_SQL};
use crate::transport::ReplyPath;

fn outcome(result: Result<Datum, BackendError>) -> Datum {
    match result {
        Ok(value) => value,
        Err(err) => Datum::Str(err.to_string()),
    }
}

pub struct QueryHandler {
    backend: Arc<dyn SqlBackend>,
}

impl QueryHandler {
    pub fn new(backend: Arc<dyn SqlBackend>) -> QueryHandler {
        QueryHandler { backend }
    }
}

impl MessageHandler for QueryHandler {
    fn handle(&self, mut envelope: Envelope, reply: &ReplyPath) -> Result<(), DispatchError> {
        let body = envelope.body_reader().ok_or(DispatchError::Malformed("body"))?;
        let sql = body
            .str_of(FIELD_SQL)
            .filter(|s| !s.is_empty())
            .ok_or(DispatchError::Malformed(FIELD_SQL))?
            .to_owned();
        let args = body
            .list_of(FIELD_ARGS)
            .ok_or(DispatchError::Malformed(FIELD_ARGS))?
            .to_vec();
        envelope.set_body(outcome(self.backend.query(&sql, &args)));
        reply.send(envelope)?;
        Ok(())
    }
}

pub struct ExecHandler {
    backend: Arc<dyn SqlBackend>,
}

impl ExecHandler {
    pub fn new(backend: Arc<dyn SqlBackend>) -> ExecHandler {
        ExecHandler { backend }
    }
}

impl MessageHandler for ExecHandler {
    fn handle(&self, mut envelope: Envelope, reply: &ReplyPath) -> Result<(), DispatchError> {
        let body = envelope.body_reader().ok_or(DispatchError::Malformed("body"))?;
        let sql = body
            .str_of(FIELD_SQL)
            .filter(|s| !s.is_empty())
            .ok_or(DispatchError::Malformed(FIELD_SQL))?
            .to_owned();
        let args = body
            .list_of(FIELD_ARGS)
            .ok_or(DispatchError::Malformed(FIELD_ARGS))?
            .to_vec();
        envelope.set_body(outcome(self.backend.exec(&sql, &args)));
        reply.send(envelope)?;
        Ok(())
    }
}

pub struct TransactionHandler {
    backend: Arc<dyn SqlBackend>,
}

impl TransactionHandler {
    pub fn new(backend: Arc<dyn SqlBackend>) -> TransactionHandler {
        TransactionHandler { backend }
    }
}

impl MessageHandler for TransactionHandler {
    fn handle(&self, mut envelope: Envelope, reply: &ReplyPath) -> Result<(), DispatchError> {
        let body = envelope.body_reader().ok_or(DispatchError::Malformed("body"))?;
        let sqls = body
            .list_of(FIELD_SQL)
            .ok_or(DispatchError::Malformed(FIELD_SQL))?;
        let args = body
            .list_of(FIELD_ARGS)
            .ok_or(DispatchError::Malformed(FIELD_ARGS))?;
        let actions = body
            .list_of(FIELD_ACTIONS)
            .ok_or(DispatchError::Malformed(FIELD_ACTIONS))?;
        if sqls.len() != args.len() || sqls.len() != actions.len() {
            return Err(DispatchError::Malformed("sql/args/actions lengths differ"));
        }

        let mut statements = Vec::with_capacity(sqls.len());
        for ((sql, arg), action) in sqls.iter().zip(args).zip(actions) {
            let sql = sql
                .as_str()
                .ok_or(DispatchError::Malformed(FIELD_SQL))?
                .to_owned();
            let arg = arg
                .as_list()
                .ok_or(DispatchError::Malformed(FIELD_ARGS))?
                .to_vec();
            let action = action.as_int().ok_or(DispatchError::Malformed(FIELD_ACTIONS))?;
            statements.push(TxStatement { sql, args: arg, action });
        }

        envelope.set_body(outcome(self.backend.transaction(&statements)));
        reply.send(envelope)?;
        Ok(())
    }
}
