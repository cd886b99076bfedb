use std::collections::BTreeMap;
use std::sync::Arc;

use kvgate_common::Datum;

use crate::backend::KvBackend;
use crate::dispatcher::MessageHandler;
use crate::envelope::Envelope;
use crate::error::DispatchError;
use crate::protocol::{FIELD_ARGS, FIELD_CMD, FIELD_KEY_FOR_REDIS, FIELD_RESULT};
use crate::transport::ReplyPath;

/// Successful results travel wrapped in a one-entry map under `result`, so
/// the receiver can tell a value from an error string.
fn wrap_result(value: Datum) -> Datum {
    let mut map = BTreeMap::new();
    map.insert(FIELD_RESULT.to_owned(), value);
    Datum::Map(map)
}

/// The connection key lives in the envelope's top-level fields, not the
/// body; zero is reserved and means the field was missing.
fn conn_key(envelope: &Envelope) -> Result<u64, DispatchError> {
    envelope
        .reader()
        .uint_of(FIELD_KEY_FOR_REDIS)
        .filter(|k| *k != 0)
        .ok_or(DispatchError::Malformed(FIELD_KEY_FOR_REDIS))
}

fn cmd_and_args(envelope: &Envelope) -> Result<(String, Vec<Datum>), DispatchError> {
    let body = envelope.body_reader().ok_or(DispatchError::Malformed("body"))?;
    let cmd = body
        .str_of(FIELD_CMD)
        .filter(|c| !c.is_empty())
        .ok_or(DispatchError::Malformed(FIELD_CMD))?
        .to_owned();
    let args = body
        .list_of(FIELD_ARGS)
        .ok_or(DispatchError::Malformed(FIELD_ARGS))?
        .to_vec();
    Ok((cmd, args))
}

pub struct KvOpenHandler {
    backend: Arc<dyn KvBackend>,
}

impl KvOpenHandler {
    pub fn new(backend: Arc<dyn KvBackend>) -> KvOpenHandler {
        KvOpenHandler { backend }
    }
}

impl MessageHandler for KvOpenHandler {
    fn handle(&self, mut envelope: Envelope, reply: &ReplyPath) -> Result<(), DispatchError> {
        let key = conn_key(&envelope)?;
        let body = if self.backend.open_conn(key) {
            Datum::Bool(true)
        } else {
            Datum::from("cannot open the key-value connection")
        };
        envelope.set_body(body);
        reply.send(envelope)?;
        Ok(())
    }
}

pub struct KvCloseHandler {
    backend: Arc<dyn KvBackend>,
}

impl KvCloseHandler {
    pub fn new(backend: Arc<dyn KvBackend>) -> KvCloseHandler {
        KvCloseHandler { backend }
    }
}

impl MessageHandler for KvCloseHandler {
    fn handle(&self, mut envelope: Envelope, reply: &ReplyPath) -> Result<(), DispatchError> {
        let key = conn_key(&envelope)?;
        self.backend.close_conn(key);
        envelope.set_body(Datum::Bool(true));
        reply.send(envelope)?;
        Ok(())
    }
}

pub struct KvDoHandler {
    backend: Arc<dyn KvBackend>,
}

impl KvDoHandler {
    pub fn new(backend: Arc<dyn KvBackend>) -> KvDoHandler {
        KvDoHandler { backend }
    }
}

impl MessageHandler for KvDoHandler {
    fn handle(&self, mut envelope: Envelope, reply: &ReplyPath) -> Result<(), DispatchError> {
        let (cmd, args) = cmd_and_args(&envelope)?;
        let body = match self.backend.do_command(&cmd, &args) {
            Ok(value) => wrap_result(value),
            Err(err) => Datum::Str(err.to_string()),
        };
        envelope.set_body(body);
        reply.send(envelope)?;
        Ok(())
    }
}

pub struct KvSendHandler {
    backend: Arc<dyn KvBackend>,
}

impl KvSendHandler {
    pub fn new(backend: Arc<dyn KvBackend>) -> KvSendHandler {
        KvSendHandler { backend }
    }
}

impl MessageHandler for KvSendHandler {
    fn handle(&self, mut envelope: Envelope, reply: &ReplyPath) -> Result<(), DispatchError> {
        let key = conn_key(&envelope)?;
        let (cmd, args) = cmd_and_args(&envelope)?;
        let body = match self.backend.send(key, &cmd, &args) {
            Ok(()) => Datum::Bool(true),
            Err(err) => Datum::Str(err.to_string()),
        };
        envelope.set_body(body);
        reply.send(envelope)?;
        Ok(())
    }
}

pub struct KvFlushHandler {
    backend: Arc<dyn KvBackend>,
}

impl KvFlushHandler {
    pub fn new(backend: Arc<dyn KvBackend>) -> KvFlushHandler {
        KvFlushHandler { backend }
    }
}

impl MessageHandler for KvFlushHandler {
    fn handle(&self, mut envelope: Envelope, reply: &ReplyPath) -> Result<(), DispatchError> {
        let key = conn_key(&envelope)?;
        let body = match self.backend.flush(key) {
            Ok(()) => Datum::Bool(true),
            Err(err) => Datum::Str(err.to_string()),
        };
        envelope.set_body(body);
        reply.send(envelope)?;
        Ok(())
    }
}

pub struct KvReceiveHandler {
    backend: Arc<dyn KvBackend>,
}

impl KvReceiveHandler {
    pub fn new(backend: Arc<dyn KvBackend>) -> KvReceiveHandler {
        KvReceiveHandler { backend }
    }
}

impl MessageHandler for KvReceiveHandler {
    fn handle(&self, mut envelope: Envelope, reply: &ReplyPath) -> Result<(), DispatchError> {
        let key = conn_key(&envelope)?;
        let body = match self.backend.receive(key) {
            Ok(value) => wrap_result(value),
            Err(err) => Datum::Str(err.to_string()),
        };
        envelope.set_body(body);
        reply.send(envelope)?;
        Ok(())
    }
}
