use std::sync::Arc;

use kvgate_common::Datum;

use crate::envelope::Envelope;
use crate::error::TransportError;

/// Sender half of the unix datagram transport; the transport implementation
/// itself lives outside this crate.
pub trait DatagramSender: Send + Sync {
    fn send_to(&self, addr: &str, payload: &Datum) -> Result<(), TransportError>;
}

/// Handle to one accepted stream connection, owned by the stream transport.
pub trait ConnectionController: Send + Sync {
    fn send(&self, payload: &Datum) -> Result<(), TransportError>;
}

/// Resolves which transport a reply goes back on: the datagram reply-to
/// address when the envelope carries one, the connection controller
/// otherwise.
#[derive(Clone, Default)]
pub struct ReplyPath {
    unix: Option<Arc<dyn DatagramSender>>,
}

impl ReplyPath {
    pub fn new(unix: Option<Arc<dyn DatagramSender>>) -> ReplyPath {
        ReplyPath { unix }
    }

    /// Ships the envelope verbatim to its originating transport.
    pub fn send(&self, envelope: Envelope) -> Result<(), TransportError> {
        let (fields, unix_source, controller) = envelope.into_parts();
        let payload = Datum::Map(fields);
        if let Some(addr) = unix_source {
            let unix = self.unix.as_ref().ok_or(TransportError::NoRoute)?;
            return unix.send_to(&addr, &payload);
        }
        match controller {
            Some(conn) => conn.send(&payload),
            None => Err(TransportError::NoRoute),
        }
    }
}
