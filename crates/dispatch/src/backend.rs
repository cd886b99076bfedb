use kvgate_common::Datum;
use kvgate_engine::{CommandError, Store};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("{0}")]
    Remote(String),
}

/// One statement of a SQL transaction; `action` is an application-defined
/// discriminator carried through unchanged.
#[derive(Debug, Clone)]
pub struct TxStatement {
    pub sql: String,
    pub args: Vec<Datum>,
    pub action: i64,
}

/// The relational backend as the handlers see it. The pooled client behind
/// it is provided by the embedding application.
pub trait SqlBackend: Send + Sync {
    fn query(&self, sql: &str, args: &[Datum]) -> Result<Datum, BackendError>;
    fn exec(&self, sql: &str, args: &[Datum]) -> Result<Datum, BackendError>;
    fn transaction(&self, statements: &[TxStatement]) -> Result<Datum, BackendError>;
}

/// The key-value backend as the handlers see it: either a remote client or
/// the in-process engine. Connection bookkeeping is keyed by an opaque
/// client-chosen number.
pub trait KvBackend: Send + Sync {
    fn open_conn(&self, key: u64) -> bool;
    fn close_conn(&self, key: u64);
    fn do_command(&self, cmd: &str, args: &[Datum]) -> Result<Datum, BackendError>;
    fn send(&self, key: u64, cmd: &str, args: &[Datum]) -> Result<(), BackendError>;
    fn flush(&self, key: u64) -> Result<(), BackendError>;
    fn receive(&self, key: u64) -> Result<Datum, BackendError>;
}

/// The in-process engine serves the whole connection-oriented surface from
/// one shared pool: opens always succeed, and the pipelining trio are
/// accepted no-ops since there is no wire to batch over.
impl KvBackend for Store {
    fn open_conn(&self, _key: u64) -> bool {
        true
    }

    fn close_conn(&self, _key: u64) {}

    fn do_command(&self, cmd: &str, args: &[Datum]) -> Result<Datum, BackendError> {
        Ok(self.execute(cmd, args)?)
    }

    fn send(&self, _key: u64, _cmd: &str, _args: &[Datum]) -> Result<(), BackendError> {
        Ok(())
    }

    fn flush(&self, _key: u64) -> Result<(), BackendError> {
        Ok(())
    }

    fn receive(&self, _key: u64) -> Result<Datum, BackendError> {
        Ok(Datum::Null)
    }
}
