//! Two-level decoder for the stats document.
//!
//! The document has no discriminator field: at the root and inside each
//! pool, a key is either one of the fixed fields of that level or the
//! name of a child. Decoding therefore works on a generic JSON object,
//! pops the fixed keys by name, and decodes everything that is left as
//! children of the next level down.
//!
//! ```text
//! root    { service, source, ..., curr_connections, <pool>: {...}, ... }
//! pool    { client_eof, ..., fragments, <server>: {...}, ... }
//! server  { server_eof, ..., out_queue_bytes }          (no children)
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Value};

use crate::error::{DecodeError, DecodeResult};
use crate::fields::{PoolField, RootField, ServerField};
use crate::snapshot::{PoolSnapshot, ServerSnapshot, StatsSnapshot};

/// Decode a stats document from raw bytes.
///
/// A key repeated inside the root, a pool or a server is rejected as
/// malformed; a parsed [`Value`] would keep only its last occurrence.
pub fn decode(bytes: &[u8]) -> DecodeResult<StatsSnapshot> {
    let malformed = |e: serde_json::Error| DecodeError::Malformed(e.to_string());

    UniqueKeys::ROOT
        .deserialize(&mut serde_json::Deserializer::from_slice(bytes))
        .map_err(malformed)?;
    let value: Value = serde_json::from_slice(bytes).map_err(malformed)?;
    decode_value(value)
}

/// Decode an already parsed stats document. Repeated keys have already
/// been collapsed by the parser at this point.
pub fn decode_value(value: Value) -> DecodeResult<StatsSnapshot> {
    let mut doc = Document::from_value("stats root".to_string(), value)?;

    let service = doc.take_string(RootField::Service.key())?;
    let source = doc.take_string(RootField::Source.key())?;
    let version = doc.take_string(RootField::Version.key())?;
    let uptime = doc.take_f64(RootField::Uptime.key())?;
    let timestamp = doc.take_f64(RootField::Timestamp.key())?;
    let total_connections = doc.take_f64(RootField::TotalConnections.key())?;
    let curr_connections = doc.take_f64(RootField::CurrConnections.key())?;

    let pools = doc.into_children(|pool| format!("pool {pool:?}"), decode_pool)?;

    Ok(StatsSnapshot {
        service,
        source,
        version,
        uptime,
        timestamp,
        total_connections,
        curr_connections,
        pools,
    })
}

fn decode_pool(mut doc: Document, pool: &str) -> DecodeResult<PoolSnapshot> {
    let client_eof = doc.take_f64(PoolField::ClientEof.key())?;
    let client_err = doc.take_f64(PoolField::ClientErr.key())?;
    let client_connections = doc.take_f64(PoolField::ClientConnections.key())?;
    let server_ejects = doc.take_f64(PoolField::ServerEjects.key())?;
    let forward_error = doc.take_f64(PoolField::ForwardError.key())?;
    let fragments = doc.take_f64(PoolField::Fragments.key())?;

    let servers = doc.into_children(
        |server| format!("server {pool:?}/{server:?}"),
        |server_doc, _| decode_server(server_doc),
    )?;

    Ok(PoolSnapshot {
        client_eof,
        client_err,
        client_connections,
        server_ejects,
        forward_error,
        fragments,
        servers,
    })
}

fn decode_server(mut doc: Document) -> DecodeResult<ServerSnapshot> {
    let mut snapshot = ServerSnapshot::default();
    for field in ServerField::ALL {
        *server_slot(&mut snapshot, field) = doc.take_f64(field.key())?;
    }

    // Servers are the leaf level: nothing may be left over.
    if let Some(key) = doc.entries.keys().next() {
        return Err(DecodeError::UnexpectedField {
            scope: doc.scope,
            key: key.clone(),
        });
    }

    Ok(snapshot)
}

fn server_slot(snapshot: &mut ServerSnapshot, field: ServerField) -> &mut f64 {
    match field {
        ServerField::ServerEof => &mut snapshot.server_eof,
        ServerField::ServerErr => &mut snapshot.server_err,
        ServerField::ServerTimedout => &mut snapshot.server_timedout,
        ServerField::ServerConnections => &mut snapshot.server_connections,
        ServerField::ServerEjectedAt => &mut snapshot.server_ejected_at,
        ServerField::Requests => &mut snapshot.requests,
        ServerField::RequestBytes => &mut snapshot.request_bytes,
        ServerField::Responses => &mut snapshot.responses,
        ServerField::ResponseBytes => &mut snapshot.response_bytes,
        ServerField::InQueue => &mut snapshot.in_queue,
        ServerField::InQueueBytes => &mut snapshot.in_queue_bytes,
        ServerField::OutQueue => &mut snapshot.out_queue,
        ServerField::OutQueueBytes => &mut snapshot.out_queue_bytes,
    }
}

/// A JSON object being consumed key by key.
struct Document {
    /// Human-readable location, used in errors.
    scope: String,
    entries: Map<String, Value>,
}

impl Document {
    fn from_value(scope: String, value: Value) -> DecodeResult<Self> {
        match value {
            Value::Object(entries) => Ok(Self { scope, entries }),
            _ => Err(DecodeError::FieldTypeMismatch {
                scope,
                field: "<root>".to_string(),
                expected: "object",
            }),
        }
    }

    fn take(&mut self, key: &str) -> DecodeResult<Value> {
        self.entries
            .remove(key)
            .ok_or_else(|| DecodeError::MissingField {
                scope: self.scope.clone(),
                field: key.to_string(),
            })
    }

    fn take_f64(&mut self, key: &str) -> DecodeResult<f64> {
        match self.take(key)? {
            Value::Number(n) => n.as_f64().ok_or_else(|| self.mismatch(key, "number")),
            _ => Err(self.mismatch(key, "number")),
        }
    }

    fn take_string(&mut self, key: &str) -> DecodeResult<String> {
        match self.take(key)? {
            Value::String(s) => Ok(s),
            _ => Err(self.mismatch(key, "string")),
        }
    }

    fn mismatch(&self, key: &str, expected: &'static str) -> DecodeError {
        DecodeError::FieldTypeMismatch {
            scope: self.scope.clone(),
            field: key.to_string(),
            expected,
        }
    }

    /// Decode every remaining entry as a child object. Call only after
    /// all fixed fields of this level have been taken.
    fn into_children<T, S, F>(
        self,
        child_scope: S,
        mut decode_child: F,
    ) -> DecodeResult<BTreeMap<String, T>>
    where
        S: Fn(&str) -> String,
        F: FnMut(Document, &str) -> DecodeResult<T>,
    {
        let mut children = BTreeMap::new();
        for (name, value) in self.entries {
            let Value::Object(entries) = value else {
                return Err(DecodeError::FieldTypeMismatch {
                    scope: self.scope,
                    field: name,
                    expected: "object",
                });
            };
            let child = Document {
                scope: child_scope(&name),
                entries,
            };
            let decoded = decode_child(child, &name)?;
            children.insert(name, decoded);
        }
        Ok(children)
    }
}

/// Walks the raw document down to server level, failing on the first key
/// that repeats within one object. Values below that level are skipped.
#[derive(Clone, Copy)]
struct UniqueKeys {
    depth: usize,
}

impl UniqueKeys {
    const ROOT: Self = Self { depth: 0 };
    /// Root, pool and server objects.
    const LEVELS: usize = 3;
}

impl<'de> DeserializeSeed<'de> for UniqueKeys {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        if self.depth < Self::LEVELS {
            deserializer.deserialize_any(self)
        } else {
            deserializer.deserialize_ignored_any(IgnoredAny).map(|_| ())
        }
    }
}

impl<'de> Visitor<'de> for UniqueKeys {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        let mut seen = HashSet::new();
        while let Some(key) = map.next_key::<String>()? {
            if !seen.insert(key.clone()) {
                return Err(de::Error::custom(format!("duplicate key {key:?}")));
            }
            map.next_value_seed(UniqueKeys {
                depth: self.depth + 1,
            })?;
        }
        Ok(())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<(), A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(())
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<(), E> {
        Ok(())
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<(), E> {
        Ok(())
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<(), E> {
        Ok(())
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<(), E> {
        Ok(())
    }

    fn visit_str<E: de::Error>(self, _: &str) -> Result<(), E> {
        Ok(())
    }

    fn visit_unit<E: de::Error>(self) -> Result<(), E> {
        Ok(())
    }
}
