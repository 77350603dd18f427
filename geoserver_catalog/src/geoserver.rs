//! The catalog root.

use std::sync::Arc;

use geoserver_client::SLD_CONTENT_TYPE;
use observability_deps::tracing::{debug, info, warn};
use serde::Deserialize;
use serde_json::json;

use crate::{
    CatalogClient, Datastore, Error, Layer, LayerGroup, Result, Style, Workspace,
    layer_group, name,
    wire::{LayerDocument, LinkStub, NamespaceDocument, unwrap_document, wrap_document},
};

/// Handle on a remote catalog.
///
/// Cloning is cheap; clones share the underlying client and compare equal.
#[derive(Debug, Clone)]
pub struct GeoServer {
    client: Arc<dyn CatalogClient>,
}

impl PartialEq for GeoServer {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.client, &other.client)
    }
}

impl Eq for GeoServer {}

impl GeoServer {
    pub fn new(client: impl CatalogClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn from_client(client: Arc<dyn CatalogClient>) -> Self {
        Self { client }
    }

    pub(crate) fn client(&self) -> &dyn CatalogClient {
        self.client.as_ref()
    }

    /// All workspaces, each joined with the namespace of the same name
    pub async fn get_workspaces(&self) -> Result<Vec<Workspace>> {
        let workspaces = self.client.list("workspaces").await?;
        let namespaces = self.client.list("namespaces").await?;

        let mut result = Vec::with_capacity(workspaces.len());
        for stub in workspaces {
            let namespace = match namespaces.iter().find(|ns| ns.name == stub.name) {
                Some(ns) => self.namespace_uri(ns).await?,
                None => {
                    debug!(workspace = %stub.name, "workspace has no namespace");
                    None
                }
            };
            result.push(Workspace::new(stub.name, namespace, self.clone()));
        }
        Ok(result)
    }

    pub async fn get_workspace(&self, name: &str) -> Result<Option<Workspace>> {
        name::split(name)?;
        if self
            .client
            .fetch_or_none(&format!("workspaces/{name}"))
            .await?
            .is_none()
        {
            return Ok(None);
        }
        let namespace = self
            .namespace_uri(&LinkStub {
                name: name.to_string(),
                href: None,
            })
            .await?;
        Ok(Some(Workspace::new(name, namespace, self.clone())))
    }

    async fn namespace_uri(&self, stub: &LinkStub) -> Result<Option<String>> {
        let path = stub
            .href
            .clone()
            .unwrap_or_else(|| format!("namespaces/{}", stub.name));
        match self.client.fetch_or_none(&path).await? {
            Some(document) => {
                let namespace: NamespaceDocument = unwrap_document(&path, document, "namespace")?;
                Ok(namespace.uri)
            }
            None => Ok(None),
        }
    }

    /// Create a workspace and assign its namespace URI.
    ///
    /// If the namespace cannot be set the new workspace is deleted again.
    pub async fn create_workspace(&self, name: &str, namespace_uri: &str) -> Result<Workspace> {
        if name::split(name)?.0.is_some() {
            return Err(Error::validation(
                "workspace name",
                format!("'{name}' must not contain a workspace prefix"),
            ));
        }
        if namespace_uri.trim().is_empty() {
            return Err(Error::validation("namespace", "must not be empty"));
        }

        self.client
            .create("workspaces", &json!({"workspace": {"name": name}}))
            .await?;
        info!(workspace = name, "created workspace");

        let mut workspace = Workspace::new(name, None, self.clone());
        if let Err(e) = workspace.set_namespace(namespace_uri).await {
            self.discard(&format!("workspaces/{name}")).await;
            return Err(Error::Compensated {
                resource: format!("workspace '{name}'"),
                source: Box::new(e),
            });
        }
        Ok(workspace)
    }

    pub async fn get_datastores(&self, workspace: &str) -> Result<Vec<Datastore>> {
        match self.get_workspace(workspace).await? {
            Some(ws) => ws.get_datastores().await,
            None => {
                debug!(workspace, "no such workspace, no datastores");
                Ok(vec![])
            }
        }
    }

    pub async fn get_datastore(&self, name: &str, workspace: &str) -> Result<Option<Datastore>> {
        match self.get_workspace(workspace).await? {
            Some(ws) => ws.get_datastore(name).await,
            None => Ok(None),
        }
    }

    pub async fn get_layers(&self) -> Result<Vec<Layer>> {
        let mut layers = vec![];
        for stub in self.client.list("layers").await? {
            let path = stub
                .href
                .unwrap_or_else(|| format!("layers/{}", stub.name));
            if let Some(layer) = self.layer_at(&path).await? {
                layers.push(layer);
            }
        }
        Ok(layers)
    }

    /// Look a layer up by qualified or unqualified name
    pub async fn get_layer(&self, name: &str) -> Result<Option<Layer>> {
        name::split(name)?;
        self.layer_at(&format!("layers/{name}")).await
    }

    /// Build the layer whose document lives at `path`
    pub(crate) async fn layer_at(&self, path: &str) -> Result<Option<Layer>> {
        match self.client.fetch_or_none(path).await? {
            Some(document) => {
                let document: LayerDocument = unwrap_document(path, document, "layer")?;
                Layer::from_document(self, path, document).await
            }
            None => Ok(None),
        }
    }

    pub async fn get_layergroups(&self) -> Result<Vec<LayerGroup>> {
        Ok(self
            .client
            .list("layergroups")
            .await?
            .into_iter()
            .map(|stub| LayerGroup::new(stub.name, self.clone()))
            .collect())
    }

    pub async fn get_layergroup(&self, name: &str) -> Result<Option<LayerGroup>> {
        if name.is_empty() {
            return Ok(None);
        }
        Ok(self
            .client
            .fetch_or_none(&format!("layergroups/{name}"))
            .await?
            .map(|_| LayerGroup::new(name, self.clone())))
    }

    /// Create a layer group from `layers`, in order, each without a style override.
    ///
    /// With a `workspace` the member names are qualified against it.
    pub async fn create_layergroup(
        &self,
        name: &str,
        layers: &[impl AsRef<str>],
        workspace: Option<&str>,
    ) -> Result<LayerGroup> {
        if name.trim().is_empty() {
            return Err(Error::validation("layer group name", "must not be empty"));
        }
        let members = layers
            .iter()
            .map(|layer| {
                let layer = layer.as_ref();
                match workspace {
                    Some(ws) => name::qualify(ws, layer),
                    None => name::split(layer).map(|_| layer.to_string()),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let document = layer_group::new_document(name, members);
        self.client
            .create("layergroups", &wrap_document("layerGroup", &document)?)
            .await?;
        info!(layer_group = name, "created layer group");
        Ok(LayerGroup::new(name, self.clone()))
    }

    pub async fn get_styles(&self) -> Result<Vec<Style>> {
        Ok(self
            .client
            .list("styles")
            .await?
            .into_iter()
            .map(|stub| Style::new(stub.name, self.clone()))
            .collect())
    }

    pub async fn get_style(&self, name: &str) -> Result<Option<Style>> {
        if name.is_empty() {
            return Ok(None);
        }
        let path = Style::path_for(name)?;
        Ok(self
            .client
            .fetch_or_none(&path)
            .await?
            .map(|_| Style::new(name, self.clone())))
    }

    /// Create a style and upload its SLD body.
    ///
    /// The catalog takes the metadata and the body in two requests. When the upload fails the
    /// metadata is deleted again and the upload error is returned wrapped in
    /// [`Error::Compensated`].
    pub async fn create_style(&self, name: &str, sld: &str) -> Result<Style> {
        if name.trim().is_empty() {
            return Err(Error::validation("style name", "must not be empty"));
        }
        let path = Style::path_for(name)?;
        let (collection, local) = path.rsplit_once('/').unwrap_or(("styles", name));

        self.client
            .create(
                collection,
                &json!({"style": {"name": local, "filename": format!("{local}.sld")}}),
            )
            .await?;

        if let Err(e) = self
            .client
            .update_raw(&path, SLD_CONTENT_TYPE, sld.to_string())
            .await
        {
            self.discard(&path).await;
            return Err(Error::Compensated {
                resource: format!("style '{name}'"),
                source: Box::new(e),
            });
        }
        info!(style = name, "created style");
        Ok(Style::new(name, self.clone()))
    }

    /// Best effort removal of a partially created resource
    async fn discard(&self, path: &str) {
        if let Err(e) = self.client.delete(path).await {
            warn!(path, error = %e, "failed to clean up partially created resource");
        }
    }

    pub async fn reload(&self) -> Result<()> {
        self.client.trigger("reload").await
    }

    pub async fn reset(&self) -> Result<()> {
        self.client.trigger("reset").await
    }

    /// Font families available to the server's renderer
    pub async fn fonts(&self) -> Result<Vec<String>> {
        #[derive(Deserialize)]
        struct Fonts {
            #[serde(default)]
            fonts: Vec<String>,
        }

        let document = self.client.fetch("fonts").await?;
        let fonts: Fonts =
            serde_json::from_value(document).map_err(|source| Error::document("fonts", source))?;
        Ok(fonts.fonts)
    }
}
