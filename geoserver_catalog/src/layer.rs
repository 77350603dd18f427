use observability_deps::tracing::{info, warn};
use serde_json::Map;

use crate::{
    Datastore, Error, GeoServer, Result, Style, Workspace, name,
    wire::{LayerDocument, NamedLink, ResourceDocument, unwrap_document, wrap_document},
};

/// Resource kinds a layer can be built from; cascaded WMS/WMTS layers are not among them
const RESOURCE_MEMBERS: [&str; 2] = ["featureType", "coverage"];

/// A published layer, always named `workspace:local`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    name: String,
    datastore: Datastore,
    default_style: Style,
}

impl Layer {
    /// Resolve the references of a layer document.
    ///
    /// The layer's resource document names the namespace and the store it belongs to. A layer
    /// whose workspace or store cannot be resolved is skipped with a warning.
    pub(crate) async fn from_document(
        geoserver: &GeoServer,
        path: &str,
        document: LayerDocument,
    ) -> Result<Option<Self>> {
        let style = document
            .default_style
            .as_ref()
            .map(|link| link.name.as_str())
            .ok_or_else(|| Error::MissingMember {
                path: path.to_string(),
                member: "defaultStyle",
            })?;
        let resource_path = document
            .resource
            .href
            .as_deref()
            .ok_or_else(|| Error::MissingMember {
                path: path.to_string(),
                member: "resource",
            })?;

        let resource = geoserver.client().fetch(resource_path).await?;
        let Some(member) = RESOURCE_MEMBERS
            .iter()
            .copied()
            .find(|member| resource.get(member).is_some())
        else {
            warn!(
                layer = %document.name,
                resource = resource_path,
                "skipping layer of unsupported resource kind"
            );
            return Ok(None);
        };
        let resource: ResourceDocument = unwrap_document(resource_path, resource, member)?;

        let Some(workspace) = geoserver.get_workspace(&resource.namespace.name).await? else {
            warn!(
                layer = %document.name,
                workspace = %resource.namespace.name,
                "layer workspace not found"
            );
            return Ok(None);
        };
        let Some(datastore) = workspace.get_datastore(&resource.store.name).await? else {
            warn!(layer = %document.name, store = %resource.store.name, "layer store not found");
            return Ok(None);
        };

        Ok(Some(Self {
            name: name::qualify(workspace.name(), &document.name)?,
            default_style: Style::new(style, geoserver.clone()),
            datastore,
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geoserver(&self) -> &GeoServer {
        self.datastore.geoserver()
    }

    pub fn get_workspace(&self) -> &Workspace {
        self.datastore.get_workspace()
    }

    pub fn get_datastore(&self) -> &Datastore {
        &self.datastore
    }

    pub fn get_default_style(&self) -> &Style {
        &self.default_style
    }

    fn path(&self) -> String {
        format!("layers/{}", self.name)
    }

    /// Make the existing style `style` the default style of this layer
    pub async fn set_default_style(&mut self, style: &str) -> Result<()> {
        let Some(style) = self.geoserver().get_style(style).await? else {
            return Err(Error::validation(
                "style",
                format!("'{style}' does not exist"),
            ));
        };

        let path = self.path();
        let client = self.geoserver().client();
        let mut document: LayerDocument =
            unwrap_document(&path, client.fetch(&path).await?, "layer")?;
        let other = document
            .default_style
            .take()
            .map(|link| link.other)
            .unwrap_or_else(Map::new);
        document.default_style = Some(NamedLink {
            name: style.name().to_string(),
            href: Some(client.href(&Style::path_for(style.name())?)),
            other,
        });
        client
            .update(&path, &wrap_document("layer", &document)?)
            .await?;
        info!(layer = %self.name, style = style.name(), "set default style");

        self.default_style = style;
        Ok(())
    }

    /// Delete this layer and reload the catalog
    pub async fn delete(self) -> Result<()> {
        self.geoserver().client().delete(&self.path()).await?;
        info!(layer = %self.name, "deleted layer");
        self.geoserver().reload().await
    }
}
