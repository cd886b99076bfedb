use std::collections::BTreeMap;
use std::sync::Arc;

use kvgate_common::Datum;

use crate::protocol::{FIELD_BODY, FIELD_SCHEME, FIELD_TAG, FIELD_TYPE};
use crate::transport::ConnectionController;

/// One decoded message plus its reply route. The decoded map keeps both the
/// reserved routing fields and the auxiliary fields; a handler overwrites
/// `body` with its result and the whole map ships back verbatim.
#[derive(Clone)]
pub struct Envelope {
    fields: BTreeMap<String, Datum>,
    unix_source: Option<String>,
    controller: Option<Arc<dyn ConnectionController>>,
}

impl Envelope {
    /// Envelope decoded off the unix datagram transport; `source` is the
    /// datagram's reply-to address.
    pub fn from_datagram(fields: BTreeMap<String, Datum>, source: impl Into<String>) -> Envelope {
        Envelope {
            fields,
            unix_source: Some(source.into()),
            controller: None,
        }
    }

    /// Envelope decoded off a stream connection.
    pub fn from_stream(
        fields: BTreeMap<String, Datum>,
        controller: Arc<dyn ConnectionController>,
    ) -> Envelope {
        Envelope {
            fields,
            unix_source: None,
            controller: Some(controller),
        }
    }

    pub fn scheme(&self) -> i64 {
        self.int_field(FIELD_SCHEME).unwrap_or(0)
    }

    pub fn tag(&self) -> i64 {
        self.int_field(FIELD_TAG).unwrap_or(0)
    }

    pub fn kind(&self) -> i64 {
        self.int_field(FIELD_TYPE).unwrap_or(0)
    }

    pub fn body(&self) -> Option<&Datum> {
        self.fields.get(FIELD_BODY)
    }

    /// The request body viewed as a map, which is the shape every payload-
    /// carrying request uses.
    pub fn body_reader(&self) -> Option<MapReader<'_>> {
        self.body().and_then(Datum::as_map).map(MapReader)
    }

    /// Reader over the envelope's own (top-level) fields.
    pub fn reader(&self) -> MapReader<'_> {
        MapReader(&self.fields)
    }

    pub fn set_body(&mut self, body: Datum) {
        self.fields.insert(FIELD_BODY.to_owned(), body);
    }

    pub fn int_field(&self, name: &str) -> Option<i64> {
        self.fields.get(name).and_then(Datum::as_int)
    }

    pub fn unix_source(&self) -> Option<&str> {
        self.unix_source.as_deref()
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        BTreeMap<String, Datum>,
        Option<String>,
        Option<Arc<dyn ConnectionController>>,
    ) {
        (self.fields, self.unix_source, self.controller)
    }
}

/// Typed accessors over a decoded field map.
#[derive(Clone, Copy)]
pub struct MapReader<'a>(pub &'a BTreeMap<String, Datum>);

impl<'a> MapReader<'a> {
    pub fn str_of(&self, name: &str) -> Option<&'a str> {
        self.0.get(name).and_then(Datum::as_str)
    }

    pub fn int_of(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(Datum::as_int)
    }

    pub fn uint_of(&self, name: &str) -> Option<u64> {
        self.0.get(name).and_then(Datum::as_uint)
    }

    pub fn list_of(&self, name: &str) -> Option<&'a [Datum]> {
        self.0.get(name).and_then(Datum::as_list)
    }
}
