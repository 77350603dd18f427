//! Datastore connection parameters.
//!
//! The catalog transports a store's backend configuration as an ordered list of
//! `{"@key": k, "$": v}` entries. This module maps that list to and from [`DatabaseParams`].

use std::fmt;

use observability_deps::tracing::debug;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, wire::one_or_many};

pub const HOST: &str = "host";
pub const PORT: &str = "port";
pub const DATABASE: &str = "database";
pub const SCHEMA: &str = "schema";
pub const USER: &str = "user";
/// Wire key of the password entry
pub const PASSWORD: &str = "passwd";
/// Key of the file location entry of file based vector stores
pub const URL: &str = "url";

const DBTYPE: &str = "dbtype";
const POSTGIS_DBTYPE: &str = "postgis";

/// Keys exposed when a store is read. The password is withheld.
pub const READ_KEYS: &[&str] = &[HOST, PORT, DATABASE, SCHEMA, USER];

/// Keys carried through a read-modify-write of a store
pub const WRITE_KEYS: &[&str] = &[HOST, PORT, DATABASE, SCHEMA, USER, PASSWORD];

/// One `{"@key": k, "$": v}` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamEntry {
    #[serde(rename = "@key")]
    pub key: String,
    #[serde(rename = "$", default)]
    pub value: String,
}

impl ParamEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// The `connectionParameters` member of a store document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamList {
    #[serde(default, deserialize_with = "one_or_many")]
    pub entry: Vec<ParamEntry>,
}

impl ParamList {
    /// Value of the first entry with `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entry
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    /// Replace the value of `key` in place, or append it
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.entry.iter_mut().find(|e| e.key == key) {
            Some(entry) => entry.value = value,
            None => self.entry.push(ParamEntry::new(key, value)),
        }
    }
}

/// PostGIS connection settings
///
/// Every field is optional so the same record describes a full configuration, a partial
/// update, or a read result with the password withheld.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct DatabaseParams {
    pub host: Option<String>,
    pub port: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for DatabaseParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl DatabaseParams {
    /// Build a record from arbitrary key/value pairs. Unrecognized keys are dropped.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            match params.slot_mut(key.as_ref()) {
                Some(slot) => *slot = Some(value.into()),
                None => debug!(key = key.as_ref(), "ignoring unrecognized connection parameter"),
            }
        }
        params
    }

    /// Value stored under a wire key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.slot(key).and_then(|v| v.as_deref())
    }

    /// The same record with the password withheld
    pub fn without_password(self) -> Self {
        Self {
            password: None,
            ..self
        }
    }

    pub fn is_empty(&self) -> bool {
        WRITE_KEYS.iter().all(|key| self.get(key).is_none())
    }

    fn slot(&self, key: &str) -> Option<&Option<String>> {
        match key {
            HOST => Some(&self.host),
            PORT => Some(&self.port),
            DATABASE => Some(&self.database),
            SCHEMA => Some(&self.schema),
            USER => Some(&self.user),
            PASSWORD => Some(&self.password),
            _ => None,
        }
    }

    fn slot_mut(&mut self, key: &str) -> Option<&mut Option<String>> {
        match key {
            HOST => Some(&mut self.host),
            PORT => Some(&mut self.port),
            DATABASE => Some(&mut self.database),
            SCHEMA => Some(&mut self.schema),
            USER => Some(&mut self.user),
            PASSWORD => Some(&mut self.password),
            _ => None,
        }
    }
}

/// Decode the entries whose key is in `schema`; everything else is ignored.
///
/// Keys outside `schema` are skipped on purpose so newer catalogs that emit more parameters
/// keep working. Empty values count as absent.
pub fn decode(entries: &[ParamEntry], schema: &[&str]) -> DatabaseParams {
    let mut params = DatabaseParams::default();
    for entry in entries {
        if entry.value.is_empty() || !schema.contains(&entry.key.as_str()) {
            continue;
        }
        if let Some(slot) = params.slot_mut(&entry.key) {
            *slot = Some(entry.value.clone());
        }
    }
    params
}

/// Overlay `partial` onto `existing`: keys set in `partial` win, all others keep their value
pub fn merge(existing: &DatabaseParams, partial: &DatabaseParams) -> DatabaseParams {
    let mut merged = existing.clone();
    for key in WRITE_KEYS {
        if let Some(value) = partial.get(key) {
            if let Some(slot) = merged.slot_mut(key) {
                *slot = Some(value.to_string());
            }
        }
    }
    merged
}

/// Encode `params` into the entry list written to the catalog.
///
/// Present fields are emitted in a fixed order, the password only when set, and the list
/// always ends with `dbtype=postgis`.
pub fn encode(params: &DatabaseParams) -> ParamList {
    let mut entry: Vec<ParamEntry> = WRITE_KEYS
        .iter()
        .filter_map(|key| params.get(key).map(|value| ParamEntry::new(*key, value)))
        .collect();
    entry.push(ParamEntry::new(DBTYPE, POSTGIS_DBTYPE));
    ParamList { entry }
}

/// Like [`encode`], but entries of `existing` that `params` has no value for are carried over,
/// ahead of the trailing `dbtype`.
///
/// That covers keys [`DatabaseParams`] does not model (timeouts, pool sizes, ...) as well as
/// modelled keys stored with an empty value, which [`decode`] reads as absent.
pub fn encode_onto(params: &DatabaseParams, existing: &ParamList) -> ParamList {
    let mut encoded = encode(params);
    let extras: Vec<_> = existing
        .entry
        .iter()
        .filter(|e| e.key != DBTYPE && params.get(&e.key).is_none())
        .cloned()
        .collect();
    let tail = encoded.entry.len() - 1;
    encoded.entry.splice(tail..tail, extras);
    encoded
}

/// Encode the connection parameters of a store that is about to be created.
///
/// Creation needs every field, the password included.
pub fn encode_for_create(name: &str, params: &DatabaseParams) -> Result<ParamList> {
    for key in WRITE_KEYS {
        if params.get(key).is_none_or(|v| v.trim().is_empty()) {
            return Err(Error::Validation {
                field: *key,
                reason: format!("required to create PostGIS datastore '{name}'"),
            });
        }
    }
    Ok(encode(params))
}
