use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("wrong number of arguments for '{0}' command")]
    Arity(String),
    #[error("no data found for this key")]
    KeyNotFound,
    #[error("operation against a key holding the wrong kind of value")]
    TypeMismatch,
    #[error("value is not an integer or out of range")]
    NotInteger,
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("unsupported command '{0}'")]
    UnsupportedCommand(String),
}
