//! Datastores and coverage stores.
//!
//! The catalog does not tag a store with the variant this crate cares about. The kind is
//! derived by probing the store document with the classifiers in [`CLASSIFIERS`], in order;
//! the first one that recognises the document decides. A new kind of store means one more
//! classifier.

use std::fmt;

use observability_deps::tracing::{info, warn};
use serde_json::json;

use crate::{
    DatabaseParams, Error, GeoServer, Layer, Result, Workspace, name,
    params::{self, READ_KEYS, WRITE_KEYS},
    wire::{StoreDocument, unwrap_document, wrap_document},
};

/// The variant of a store together with its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    /// A file based vector store, e.g. a shapefile directory
    VectorFile { file: String },
    /// A file based raster store, e.g. a GeoTIFF
    RasterFile { file: String },
    /// A PostGIS database; the password is never part of a read
    PostGis { params: DatabaseParams },
}

impl StoreKind {
    pub fn store_type(&self) -> StoreType {
        match self {
            Self::VectorFile { .. } => StoreType::Shapefile,
            Self::RasterFile { .. } => StoreType::GeoTiff,
            Self::PostGis { .. } => StoreType::PostGis,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreType {
    Shapefile,
    GeoTiff,
    PostGis,
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shapefile => write!(f, "shapefile"),
            Self::GeoTiff => write!(f, "GeoTIFF"),
            Self::PostGis => write!(f, "PostGIS"),
        }
    }
}

/// What to create with [`Workspace::create_datastore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSpec {
    Shapefile(String),
    GeoTiff(String),
    /// Every field, the password included, is required
    PostGis(DatabaseParams),
}

impl StoreSpec {
    pub fn store_type(&self) -> StoreType {
        match self {
            Self::Shapefile(_) => StoreType::Shapefile,
            Self::GeoTiff(_) => StoreType::GeoTiff,
            Self::PostGis(_) => StoreType::PostGis,
        }
    }
}

type Classifier = fn(&StoreDocument) -> Option<StoreKind>;

/// Store classifiers, tried in order
const CLASSIFIERS: &[Classifier] = &[vector_file, raster_file, postgis];

/// A `url` connection parameter marks a file based vector store
fn vector_file(document: &StoreDocument) -> Option<StoreKind> {
    let file = document
        .connection_parameters
        .as_ref()?
        .get(params::URL)
        .filter(|url| !url.is_empty())?;
    Some(StoreKind::VectorFile {
        file: file.to_string(),
    })
}

/// A top level `url` marks a file based raster store
fn raster_file(document: &StoreDocument) -> Option<StoreKind> {
    let file = document.url.as_deref().filter(|url| !url.is_empty())?;
    Some(StoreKind::RasterFile {
        file: file.to_string(),
    })
}

fn postgis(document: &StoreDocument) -> Option<StoreKind> {
    if document.store_type.as_deref() != Some("PostGIS") {
        return None;
    }
    let entries = document
        .connection_parameters
        .as_ref()
        .map(|list| list.entry.as_slice())
        .unwrap_or_default();
    Some(StoreKind::PostGis {
        params: params::decode(entries, READ_KEYS),
    })
}

pub(crate) fn classify(document: &StoreDocument) -> Option<StoreKind> {
    CLASSIFIERS.iter().find_map(|classifier| classifier(document))
}

/// Prefix a bare path with the `file:` scheme the catalog expects
pub(crate) fn file_url(path: &str) -> Result<String> {
    let path = path.trim();
    if path.is_empty() || path == "file:" {
        return Err(Error::validation("file", "must not be empty"));
    }
    Ok(if path.starts_with("file:") {
        path.to_string()
    } else {
        format!("file:{path}")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datastore {
    name: String,
    workspace: Workspace,
    kind: StoreKind,
}

impl Datastore {
    /// Build a datastore from its document, or `None` if no classifier recognises it
    pub(crate) fn from_document(workspace: &Workspace, document: &StoreDocument) -> Option<Self> {
        match classify(document) {
            Some(kind) => Some(Self {
                name: document.name.clone(),
                workspace: workspace.clone(),
                kind,
            }),
            None => {
                warn!(
                    workspace = workspace.name(),
                    store = %document.name,
                    store_type = ?document.store_type,
                    "skipping store of unrecognized kind"
                );
                None
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn geoserver(&self) -> &GeoServer {
        self.workspace.geoserver()
    }

    pub fn kind(&self) -> &StoreKind {
        &self.kind
    }

    pub fn store_type(&self) -> StoreType {
        self.kind.store_type()
    }

    /// Location of a file based store
    pub fn file(&self) -> Result<&str> {
        match &self.kind {
            StoreKind::VectorFile { file } | StoreKind::RasterFile { file } => Ok(file),
            StoreKind::PostGis { .. } => Err(self.wrong_kind("file based")),
        }
    }

    /// Connection settings of a PostGIS store, without the password
    pub fn database_params(&self) -> Result<&DatabaseParams> {
        match &self.kind {
            StoreKind::PostGis { params } => Ok(params),
            _ => Err(self.wrong_kind("PostGIS")),
        }
    }

    fn wrong_kind(&self, expected: &'static str) -> Error {
        Error::StoreKind {
            name: self.name.clone(),
            expected,
            actual: self.store_type(),
        }
    }

    fn is_raster(&self) -> bool {
        matches!(self.kind, StoreKind::RasterFile { .. })
    }

    /// Path of the store document and the member it is wrapped in
    fn path(&self) -> (String, &'static str) {
        let (collection, member) = if self.is_raster() {
            ("coveragestores", "coverageStore")
        } else {
            ("datastores", "dataStore")
        };
        (
            format!(
                "workspaces/{}/{collection}/{}",
                self.workspace.name(),
                self.name
            ),
            member,
        )
    }

    /// Path of the feature type or coverage collection published from this store
    fn resources_path(&self) -> (String, &'static str) {
        let (path, _) = self.path();
        if self.is_raster() {
            (format!("{path}/coverages"), "coverage")
        } else {
            (format!("{path}/featuretypes"), "featureType")
        }
    }

    pub async fn delete(self) -> Result<()> {
        let (path, _) = self.path();
        self.geoserver().client().delete(&path).await?;
        info!(store = %self.name, workspace = self.workspace.name(), "deleted datastore");
        Ok(())
    }

    /// The layers publishing a resource of this store
    pub async fn get_layers(&self) -> Result<Vec<Layer>> {
        let (path, _) = self.resources_path();
        let mut layers = vec![];
        for stub in self.geoserver().client().list(&path).await? {
            let qualified = name::qualify(self.workspace.name(), &stub.name)?;
            if let Some(layer) = self.geoserver().get_layer(&qualified).await? {
                layers.push(layer);
            }
        }
        Ok(layers)
    }

    /// Look a layer up by name within this store's workspace.
    ///
    /// A layer of the same workspace published from another store yields `None`.
    pub async fn get_layer(&self, name: &str) -> Result<Option<Layer>> {
        let qualified = name::qualify(self.workspace.name(), name)?;
        Ok(self
            .geoserver()
            .get_layer(&qualified)
            .await?
            .filter(|layer| layer.get_datastore().name() == self.name))
    }

    /// Apply a partial update to the connection settings of a PostGIS store.
    ///
    /// Keys not set in `partial` keep their remote value, the stored password included.
    pub async fn set_database_params(&mut self, partial: &DatabaseParams) -> Result<()> {
        self.database_params()?;
        let (path, member) = self.path();
        let client = self.geoserver().client();

        let mut document: StoreDocument =
            unwrap_document(&path, client.fetch(&path).await?, member)?;
        let existing_list = document.connection_parameters.take().unwrap_or_default();
        let existing = params::decode(&existing_list.entry, WRITE_KEYS);
        let merged = params::merge(&existing, partial);

        document.connection_parameters = Some(params::encode_onto(&merged, &existing_list));
        client
            .update(&path, &wrap_document(member, &document)?)
            .await?;
        info!(
            store = %self.name,
            workspace = self.workspace.name(),
            "updated connection parameters"
        );

        self.kind = StoreKind::PostGis {
            params: merged.without_password(),
        };
        Ok(())
    }

    /// Point a file based store at another location
    pub async fn set_file(&mut self, file: &str) -> Result<()> {
        self.file()?;
        let file = file_url(file)?;
        let (path, member) = self.path();
        let client = self.geoserver().client();

        let mut document: StoreDocument =
            unwrap_document(&path, client.fetch(&path).await?, member)?;
        if self.is_raster() {
            document.url = Some(file.clone());
        } else {
            document
                .connection_parameters
                .get_or_insert_with(Default::default)
                .set(params::URL, file.clone());
        }
        client
            .update(&path, &wrap_document(member, &document)?)
            .await?;
        info!(store = %self.name, file = %file, "updated datastore file");

        self.kind = if self.is_raster() {
            StoreKind::RasterFile { file }
        } else {
            StoreKind::VectorFile { file }
        };
        Ok(())
    }

    /// Publish the resource `name` of this store as a layer.
    ///
    /// With a `style`, it becomes the layer's default style. The style is checked before
    /// anything is published.
    pub async fn create_layer(&self, name: &str, style: Option<&str>) -> Result<Layer> {
        let qualified = name::qualify(self.workspace.name(), name)?;
        let local = name::unqualify(&qualified)?;
        if let Some(style) = style {
            if self.geoserver().get_style(style).await?.is_none() {
                return Err(Error::validation(
                    "style",
                    format!("'{style}' does not exist"),
                ));
            }
        }

        let (path, member) = self.resources_path();
        self.geoserver()
            .client()
            .create(&path, &json!({ member: {"name": local, "nativeName": local} }))
            .await?;
        info!(layer = %qualified, store = %self.name, "published layer");

        let mut layer = self
            .geoserver()
            .get_layer(&qualified)
            .await?
            .ok_or_else(|| Error::NotFound {
                path: format!("layers/{qualified}"),
            })?;
        if let Some(style) = style {
            layer.set_default_style(style).await?;
        }
        Ok(layer)
    }
}
