use observability_deps::tracing::{debug, info};
use serde_json::json;

use crate::{
    Datastore, Error, GeoServer, Result, StoreSpec,
    datastore::file_url,
    name, params,
    wire::{StoreDocument, WorkspaceDocument, unwrap_document},
};

/// The two store collections of a workspace: path segment and document member
const STORE_COLLECTIONS: [(&str, &str); 2] = [
    ("datastores", "dataStore"),
    ("coveragestores", "coverageStore"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    name: String,
    namespace: Option<String>,
    geoserver: GeoServer,
}

impl Workspace {
    pub(crate) fn new(
        name: impl Into<String>,
        namespace: Option<String>,
        geoserver: GeoServer,
    ) -> Self {
        Self {
            name: name.into(),
            namespace,
            geoserver,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geoserver(&self) -> &GeoServer {
        &self.geoserver
    }

    /// URI of the namespace paired with this workspace, if there is one
    pub fn get_namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub async fn set_namespace(&mut self, uri: &str) -> Result<()> {
        if uri.trim().is_empty() {
            return Err(Error::validation("namespace", "must not be empty"));
        }
        self.geoserver
            .client()
            .update(
                &format!("namespaces/{}", self.name),
                &json!({"namespace": {"prefix": self.name, "uri": uri}}),
            )
            .await?;
        info!(workspace = %self.name, uri, "set namespace");
        self.namespace = Some(uri.to_string());
        Ok(())
    }

    pub async fn delete(self) -> Result<()> {
        self.geoserver
            .client()
            .delete(&format!("workspaces/{}", self.name))
            .await?;
        info!(workspace = %self.name, "deleted workspace");
        Ok(())
    }

    /// Vector stores first, then raster stores. Stores of unrecognized kind are left out.
    pub async fn get_datastores(&self) -> Result<Vec<Datastore>> {
        let client = self.geoserver.client();
        let path = format!("workspaces/{}", self.name);
        let workspace: WorkspaceDocument =
            unwrap_document(&path, client.fetch(&path).await?, "workspace")?;

        let links = [workspace.data_stores, workspace.coverage_stores];
        let mut stores = vec![];
        for ((collection, member), link) in STORE_COLLECTIONS.into_iter().zip(links) {
            let collection_path = link.unwrap_or_else(|| format!("{path}/{collection}"));
            for stub in client.list(&collection_path).await? {
                let store_path = stub
                    .href
                    .unwrap_or_else(|| format!("{path}/{collection}/{}", stub.name));
                let document: StoreDocument =
                    unwrap_document(&store_path, client.fetch(&store_path).await?, member)?;
                stores.extend(Datastore::from_document(self, &document));
            }
        }
        debug!(workspace = %self.name, count = stores.len(), "fetched datastores");
        Ok(stores)
    }

    /// Look a store up by `name` or `workspace:name`.
    ///
    /// Vector stores take precedence over raster stores of the same name.
    pub async fn get_datastore(&self, name: &str) -> Result<Option<Datastore>> {
        let qualified = name::qualify(&self.name, name)?;
        let local = name::unqualify(&qualified)?;
        let client = self.geoserver.client();

        for (collection, member) in STORE_COLLECTIONS {
            let path = format!("workspaces/{}/{collection}/{local}", self.name);
            if let Some(document) = client.fetch_or_none(&path).await? {
                let document: StoreDocument = unwrap_document(&path, document, member)?;
                return Ok(Datastore::from_document(self, &document));
            }
        }
        Ok(None)
    }

    /// Create a store in this workspace.
    ///
    /// Names and parameters are validated before anything is sent to the catalog.
    pub async fn create_datastore(&self, name: &str, spec: StoreSpec) -> Result<Datastore> {
        let qualified = name::qualify(&self.name, name)?;
        let local = name::unqualify(&qualified)?;

        let (collection, document) = match &spec {
            StoreSpec::Shapefile(path) => {
                let mut entries = vec![params::ParamEntry::new(params::URL, file_url(path)?)];
                if let Some(namespace) = &self.namespace {
                    entries.push(params::ParamEntry::new("namespace", namespace.as_str()));
                }
                let parameters = params::ParamList { entry: entries };
                (
                    "datastores",
                    json!({"dataStore": {
                        "name": local,
                        "type": "Shapefile",
                        "enabled": true,
                        "connectionParameters": parameters,
                    }}),
                )
            }
            StoreSpec::GeoTiff(path) => (
                "coveragestores",
                json!({"coverageStore": {
                    "name": local,
                    "type": "GeoTIFF",
                    "enabled": true,
                    "workspace": {"name": self.name},
                    "url": file_url(path)?,
                }}),
            ),
            StoreSpec::PostGis(db) => {
                let parameters = params::encode_for_create(local, db)?;
                (
                    "datastores",
                    json!({"dataStore": {
                        "name": local,
                        "type": "PostGIS",
                        "enabled": true,
                        "connectionParameters": parameters,
                    }}),
                )
            }
        };

        self.geoserver
            .client()
            .create(&format!("workspaces/{}/{collection}", self.name), &document)
            .await?;
        info!(
            workspace = %self.name,
            store = local,
            kind = %spec.store_type(),
            "created datastore"
        );

        self.get_datastore(local)
            .await?
            .ok_or_else(|| Error::NotFound {
                path: format!("workspaces/{}/{collection}/{local}", self.name),
            })
    }
}
