use geoserver_client::SLD_CONTENT_TYPE;
use observability_deps::tracing::info;

use crate::{
    Error, GeoServer, Result, name,
    wire::{StyleDocument, unwrap_document},
};

/// A style; the SLD body is fetched on demand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    name: String,
    geoserver: GeoServer,
}

impl Style {
    pub(crate) fn new(name: impl Into<String>, geoserver: GeoServer) -> Self {
        Self {
            name: name.into(),
            geoserver,
        }
    }

    /// Catalog path of the style `name`, which may be workspace qualified
    pub(crate) fn path_for(name: &str) -> Result<String> {
        Ok(match name::split(name)? {
            (Some(workspace), local) => format!("workspaces/{workspace}/styles/{local}"),
            (None, local) => format!("styles/{local}"),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geoserver(&self) -> &GeoServer {
        &self.geoserver
    }

    pub async fn get_sld(&self) -> Result<String> {
        let path = Self::path_for(&self.name)?;
        let client = self.geoserver.client();
        let document: StyleDocument = unwrap_document(&path, client.fetch(&path).await?, "style")?;
        let filename = document.filename.ok_or_else(|| Error::MissingMember {
            path: path.clone(),
            member: "filename",
        })?;

        let directory = path.rsplit_once('/').map_or("styles", |(dir, _)| dir);
        client
            .fetch_text(&format!("resource/{directory}/{filename}"))
            .await
    }

    pub async fn set_sld(&self, sld: &str) -> Result<()> {
        if sld.trim().is_empty() {
            return Err(Error::validation("sld", "must not be empty"));
        }
        let path = Self::path_for(&self.name)?;
        self.geoserver
            .client()
            .update_raw(&path, SLD_CONTENT_TYPE, sld.to_string())
            .await?;
        info!(style = %self.name, "updated style body");
        Ok(())
    }

    pub async fn delete(self) -> Result<()> {
        self.geoserver
            .client()
            .delete(&Self::path_for(&self.name)?)
            .await?;
        info!(style = %self.name, "deleted style");
        Ok(())
    }
}
