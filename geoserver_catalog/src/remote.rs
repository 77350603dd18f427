//! The logical operations the catalog model needs from the server.

use std::fmt::Debug;

use async_trait::async_trait;
use geoserver_client::{Client, StatusCode};
use observability_deps::tracing::debug;
use serde_json::Value;

use crate::{
    Error, Result,
    wire::{LinkStub, parse_collection},
};

/// Fetch and mutate documents of the remote catalog.
///
/// Paths are relative to the REST root, or absolute `href`s taken from link stubs. Any failure
/// other than [`Error::NotFound`] and [`Error::Conflict`] is surfaced as [`Error::Transport`]
/// and never retried.
#[async_trait]
pub trait CatalogClient: Debug + Send + Sync + 'static {
    /// Fetch a JSON document
    async fn fetch(&self, path: &str) -> Result<Value>;

    /// Fetch a raw text resource, such as an SLD body
    async fn fetch_text(&self, path: &str) -> Result<String>;

    /// Add `document` to the collection at `path`
    async fn create(&self, path: &str, document: &Value) -> Result<()>;

    /// Replace the document at `path` with `document`
    async fn update(&self, path: &str, document: &Value) -> Result<()>;

    /// Replace the raw body at `path`
    async fn update_raw(&self, path: &str, content_type: &'static str, body: String)
    -> Result<()>;

    async fn delete(&self, path: &str) -> Result<()>;

    /// Trigger a server side action such as `reload`
    async fn trigger(&self, path: &str) -> Result<()>;

    /// Absolute link to `path`, as the server itself would write it in an `href`
    fn href(&self, path: &str) -> String;

    /// [`Self::fetch`], with [`Error::NotFound`] turned into `None`
    async fn fetch_or_none(&self, path: &str) -> Result<Option<Value>> {
        match self.fetch(path).await {
            Ok(document) => Ok(Some(document)),
            Err(Error::NotFound { .. }) => {
                debug!(path, "catalog resource not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch the collection at `path` and return its member stubs
    async fn list(&self, path: &str) -> Result<Vec<LinkStub>> {
        let document = self.fetch(path).await?;
        parse_collection(path, document)
    }
}

fn classify(path: &str, err: geoserver_client::Error) -> Error {
    match err.status() {
        Some(StatusCode::NOT_FOUND) => Error::NotFound {
            path: path.to_string(),
        },
        Some(StatusCode::CONFLICT) => Error::Conflict {
            path: path.to_string(),
        },
        _ => Error::Transport(err),
    }
}

#[async_trait]
impl CatalogClient for Client {
    async fn fetch(&self, path: &str) -> Result<Value> {
        self.get_json(path).await.map_err(|e| classify(path, e))
    }

    async fn fetch_text(&self, path: &str) -> Result<String> {
        self.get_text(path).await.map_err(|e| classify(path, e))
    }

    async fn create(&self, path: &str, document: &Value) -> Result<()> {
        self.post_json(path, document)
            .await
            .map_err(|e| classify(path, e))
    }

    async fn update(&self, path: &str, document: &Value) -> Result<()> {
        self.put_json(path, document)
            .await
            .map_err(|e| classify(path, e))
    }

    async fn update_raw(
        &self,
        path: &str,
        content_type: &'static str,
        body: String,
    ) -> Result<()> {
        self.put_raw(path, content_type, body)
            .await
            .map_err(|e| classify(path, e))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        Client::delete(self, path)
            .await
            .map_err(|e| classify(path, e))
    }

    async fn trigger(&self, path: &str) -> Result<()> {
        self.post_empty(path).await.map_err(|e| classify(path, e))
    }

    fn href(&self, path: &str) -> String {
        match self.base_url().join(path) {
            Ok(url) => format!("{url}.json"),
            Err(_) => format!("{}{path}.json", self.base_url()),
        }
    }
}
