use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("envelope has no reply route")]
    NoRoute,
    #[error("failed to send reply: {0}")]
    SendFailure(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("malformed envelope: missing or mistyped '{0}'")]
    Malformed(&'static str),
    #[error(transparent)]
    Transport(#[from] TransportError),
}
