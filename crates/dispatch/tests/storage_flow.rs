use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use kvgate_common::Datum;
use kvgate_dispatch::handlers::storage_routes;
use kvgate_dispatch::protocol::{
    FIELD_ARGS, FIELD_BODY, FIELD_CMD, FIELD_KEY_FOR_LOCK, FIELD_KEY_FOR_REDIS, FIELD_RESULT,
    FIELD_SCHEME, FIELD_SID_FOR_LOCK, FIELD_SQL, FIELD_TAG, FIELD_TYPE, SCHEME_S2S, TAG_STORAGE,
};
use kvgate_dispatch::{
    BackendError, DatagramSender, DispatcherBuilder, Envelope, MessageKind, SqlBackend,
    TransportError, TxStatement,
};
use kvgate_engine::Store;
use kvgate_lock::KeyLockRegistry;

#[derive(Default)]
struct RecordingDatagram(Mutex<Vec<(String, Datum)>>);

impl RecordingDatagram {
    fn drain(&self) -> Vec<(String, Datum)> {
        std::mem::take(&mut *self.0.lock().expect("recorder lock"))
    }

    fn wait_one(&self) -> Datum {
        for _ in 0..200 {
            let mut sent = self.0.lock().expect("recorder lock");
            if let Some((_, payload)) = sent.pop() {
                return payload;
            }
            drop(sent);
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("timed out waiting for a reply");
    }
}

impl DatagramSender for RecordingDatagram {
    fn send_to(&self, addr: &str, payload: &Datum) -> Result<(), TransportError> {
        self.0
            .lock()
            .expect("recorder lock")
            .push((addr.to_owned(), payload.clone()));
        Ok(())
    }
}

struct EchoSql;

impl SqlBackend for EchoSql {
    fn query(&self, sql: &str, _args: &[Datum]) -> Result<Datum, BackendError> {
        Ok(Datum::List(vec![Datum::from(sql)]))
    }

    fn exec(&self, _sql: &str, args: &[Datum]) -> Result<Datum, BackendError> {
        Ok(Datum::Int(args.len() as i64))
    }

    fn transaction(&self, statements: &[TxStatement]) -> Result<Datum, BackendError> {
        Ok(Datum::Int(statements.len() as i64))
    }
}

fn base_fields(kind: MessageKind) -> BTreeMap<String, Datum> {
    let mut fields = BTreeMap::new();
    fields.insert(FIELD_SCHEME.to_owned(), Datum::Int(SCHEME_S2S));
    fields.insert(FIELD_TAG.to_owned(), Datum::Int(TAG_STORAGE));
    fields.insert(FIELD_TYPE.to_owned(), Datum::Int(kind.as_i64()));
    fields
}

fn kv_do(cmd: &str, args: Vec<Datum>) -> BTreeMap<String, Datum> {
    let mut body = BTreeMap::new();
    body.insert(FIELD_CMD.to_owned(), Datum::from(cmd));
    body.insert(FIELD_ARGS.to_owned(), Datum::List(args));
    let mut fields = base_fields(MessageKind::KvDo);
    fields.insert(FIELD_KEY_FOR_REDIS.to_owned(), Datum::Int(1));
    fields.insert(FIELD_BODY.to_owned(), Datum::Map(body));
    fields
}

fn body_of(payload: &Datum) -> &Datum {
    payload
        .as_map()
        .and_then(|m| m.get(FIELD_BODY))
        .expect("reply carries a body")
}

fn result_of(payload: &Datum) -> &Datum {
    body_of(payload)
        .as_map()
        .and_then(|m| m.get(FIELD_RESULT))
        .expect("body wraps a result")
}

struct Gateway {
    dispatcher: kvgate_dispatch::Dispatcher,
    unix: Arc<RecordingDatagram>,
}

impl Gateway {
    fn start() -> Gateway {
        let unix = Arc::new(RecordingDatagram::default());
        let store = Store::new();
        let locks = Arc::new(KeyLockRegistry::new(Duration::from_secs(600)));
        let builder = DispatcherBuilder::new()
            .unix_sender(unix.clone())
            .workers(4);
        let builder = storage_routes(
            builder,
            Some(Arc::new(EchoSql)),
            Some(Arc::new(store)),
            locks,
        );
        Gateway {
            dispatcher: builder.start(),
            unix,
        }
    }

    fn request(&self, fields: BTreeMap<String, Datum>) -> Datum {
        self.dispatcher
            .queue()
            .send(Envelope::from_datagram(fields, "/tmp/client.sock"))
            .expect("queue accepts envelopes");
        self.unix.wait_one()
    }
}

#[test]
fn kv_do_round_trip_wraps_results() {
    let gw = Gateway::start();

    let reply = gw.request(kv_do("set", vec![Datum::from("k"), Datum::from("v")]));
    assert_eq!(result_of(&reply), &Datum::from("OK"));

    let reply = gw.request(kv_do("get", vec![Datum::from("k")]));
    assert_eq!(result_of(&reply), &Datum::from("v"));

    gw.dispatcher.shutdown();
}

#[test]
fn kv_do_errors_stringify_into_body() {
    let gw = Gateway::start();

    let reply = gw.request(kv_do("zadd", vec![Datum::from("k")]));
    assert_eq!(body_of(&reply), &Datum::from("unsupported command 'zadd'"));

    let reply = gw.request(kv_do("get", vec![Datum::from("missing")]));
    assert_eq!(body_of(&reply), &Datum::from("no data found for this key"));

    gw.dispatcher.shutdown();
}

#[test]
fn kv_connection_family_acknowledges() {
    let gw = Gateway::start();

    let mut open = base_fields(MessageKind::KvOpen);
    open.insert(FIELD_KEY_FOR_REDIS.to_owned(), Datum::Int(7));
    assert_eq!(body_of(&gw.request(open)), &Datum::Bool(true));

    let mut close = base_fields(MessageKind::KvClose);
    close.insert(FIELD_KEY_FOR_REDIS.to_owned(), Datum::Int(7));
    assert_eq!(body_of(&gw.request(close)), &Datum::Bool(true));

    let mut flush = base_fields(MessageKind::KvFlush);
    flush.insert(FIELD_KEY_FOR_REDIS.to_owned(), Datum::Int(7));
    assert_eq!(body_of(&gw.request(flush)), &Datum::Bool(true));

    let mut receive = base_fields(MessageKind::KvReceive);
    receive.insert(FIELD_KEY_FOR_REDIS.to_owned(), Datum::Int(7));
    assert_eq!(result_of(&gw.request(receive)), &Datum::Null);

    gw.dispatcher.shutdown();
}

#[test]
fn malformed_kv_envelope_gets_no_reply() {
    let gw = Gateway::start();

    // Connection key 0 is reserved: the handler refuses the envelope and no
    // reply is shipped.
    let mut open = base_fields(MessageKind::KvOpen);
    open.insert(FIELD_KEY_FOR_REDIS.to_owned(), Datum::Int(0));
    gw.dispatcher
        .queue()
        .send(Envelope::from_datagram(open, "/tmp/client.sock"))
        .expect("queue accepts envelopes");

    // A well-formed request afterwards still works, proving the worker
    // survived.
    let reply = gw.request(kv_do("set", vec![Datum::from("a"), Datum::Int(1)]));
    assert_eq!(result_of(&reply), &Datum::from("OK"));
    assert!(gw.unix.drain().is_empty());

    gw.dispatcher.shutdown();
}

#[test]
fn lock_family_full_cycle() {
    let gw = Gateway::start();

    let mut init = base_fields(MessageKind::InitLockKey);
    init.insert(FIELD_KEY_FOR_LOCK.to_owned(), Datum::Int(9));
    assert_eq!(body_of(&gw.request(init)), &Datum::Bool(true));

    let mut lock = base_fields(MessageKind::LockKey);
    lock.insert(FIELD_KEY_FOR_LOCK.to_owned(), Datum::Int(9));
    let token = match body_of(&gw.request(lock.clone())) {
        Datum::Int(token) => *token,
        other => panic!("expected a session token, got {other:?}"),
    };
    assert!(token > 0);

    // Wrong-session unlock reports the violation as an error string.
    let mut bad_unlock = base_fields(MessageKind::UnlockKey);
    bad_unlock.insert(FIELD_KEY_FOR_LOCK.to_owned(), Datum::Int(9));
    bad_unlock.insert(FIELD_SID_FOR_LOCK.to_owned(), Datum::Int(token + 1));
    assert_eq!(
        body_of(&gw.request(bad_unlock)),
        &Datum::from("unlock 9 called by another holder")
    );

    let mut unlock = base_fields(MessageKind::UnlockKey);
    unlock.insert(FIELD_KEY_FOR_LOCK.to_owned(), Datum::Int(9));
    unlock.insert(FIELD_SID_FOR_LOCK.to_owned(), Datum::Int(token));
    assert_eq!(body_of(&gw.request(unlock)), &Datum::Bool(true));

    // Re-acquire proves the release went through, with a fresh token.
    let second = match body_of(&gw.request(lock)) {
        Datum::Int(token) => *token,
        other => panic!("expected a session token, got {other:?}"),
    };
    assert_ne!(second, token);

    let mut dispose = base_fields(MessageKind::DisposeLockKey);
    dispose.insert(FIELD_KEY_FOR_LOCK.to_owned(), Datum::Int(9));
    assert_eq!(body_of(&gw.request(dispose)), &Datum::Bool(true));

    gw.dispatcher.shutdown();
}

#[test]
fn lock_before_init_reports_the_error_in_body() {
    let gw = Gateway::start();

    let mut lock = base_fields(MessageKind::LockKey);
    lock.insert(FIELD_KEY_FOR_LOCK.to_owned(), Datum::Int(42));
    assert_eq!(
        body_of(&gw.request(lock)),
        &Datum::from("lock 42 is not initialised")
    );

    gw.dispatcher.shutdown();
}

#[test]
fn sql_family_round_trip() {
    let gw = Gateway::start();

    let mut body = BTreeMap::new();
    body.insert(FIELD_SQL.to_owned(), Datum::from("select 1"));
    body.insert(FIELD_ARGS.to_owned(), Datum::List(vec![]));
    let mut query = base_fields(MessageKind::SqlQuery);
    query.insert(FIELD_BODY.to_owned(), Datum::Map(body));
    assert_eq!(
        body_of(&gw.request(query)),
        &Datum::List(vec![Datum::from("select 1")])
    );

    let mut body = BTreeMap::new();
    body.insert(
        FIELD_SQL.to_owned(),
        Datum::List(vec![Datum::from("insert"), Datum::from("update")]),
    );
    body.insert(
        FIELD_ARGS.to_owned(),
        Datum::List(vec![
            Datum::List(vec![Datum::Int(1)]),
            Datum::List(vec![Datum::Int(2)]),
        ]),
    );
    body.insert(
        "actions".to_owned(),
        Datum::List(vec![Datum::Int(0), Datum::Int(1)]),
    );
    let mut tx = base_fields(MessageKind::SqlTransaction);
    tx.insert(FIELD_BODY.to_owned(), Datum::Map(body));
    assert_eq!(body_of(&gw.request(tx)), &Datum::Int(2));

    gw.dispatcher.shutdown();
}
