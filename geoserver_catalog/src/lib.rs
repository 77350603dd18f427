//! A typed, cross-referenced model of a remote GeoServer catalog.
//!
//! The catalog's state lives on the server. [`GeoServer`] and the entities it hands out
//! ([`Workspace`], [`Datastore`], [`Layer`], [`LayerGroup`], [`Style`]) are snapshots taken at
//! fetch time. Each of them keeps the [`GeoServer`] handle it was fetched through and uses it
//! for operations scoped to itself.
//!
//! Mutations are read-modify-write against the server without any concurrency token: a second
//! writer racing with this one can silently lose an update.

pub mod datastore;
pub mod geoserver;
pub mod layer;
pub mod layer_group;
pub mod name;
pub mod params;
pub mod remote;
pub mod style;
pub mod wire;
pub mod workspace;

#[cfg(test)]
mod test_util;

pub use datastore::{Datastore, StoreKind, StoreSpec, StoreType};
pub use geoserver::GeoServer;
pub use layer::Layer;
pub use layer_group::LayerGroup;
pub use name::NameError;
pub use params::DatabaseParams;
pub use remote::CatalogClient;
pub use style::Style;
pub use workspace::Workspace;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid name: {0}")]
    InvalidName(#[from] NameError),

    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("datastore '{name}' is a {actual} store, expected a {expected} store")]
    StoreKind {
        name: String,
        expected: &'static str,
        actual: StoreType,
    },

    #[error("catalog resource not found: {path}")]
    NotFound { path: String },

    #[error("catalog resource already exists: {path}")]
    Conflict { path: String },

    #[error("catalog request failed: {0}")]
    Transport(#[from] geoserver_client::Error),

    #[error("unexpected document at {path}: {source}")]
    Document {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("document at {path} has no '{member}' member")]
    MissingMember { path: String, member: &'static str },

    #[error("creating {resource} failed, partial resource removed: {source}")]
    Compensated {
        resource: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub(crate) fn document(path: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Document {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
