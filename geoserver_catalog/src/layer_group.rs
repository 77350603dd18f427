//! Layer groups.
//!
//! On the wire a group lists its members in `publishables.published` and the per member style
//! overrides in a separate `styles.style` array, related only by index. Here the two are zipped
//! into one sequence of [`Member`]s as soon as a document is read and only split again when it
//! is written back, so an edit can never move one without the other.

use std::mem;

use observability_deps::tracing::{debug, info};
use serde_json::{Map, Value};

use crate::{
    GeoServer, Layer, Result, name,
    wire::{
        LayerGroupDocument, Publishables, Published, StyleOverrides, unwrap_document,
        wrap_document,
    },
};

/// How the catalog writes "no style override" in a group's style list
const UNSET_STYLE: &str = "";

const LAYER: &str = "layer";

/// A published entry paired with its style override
#[derive(Debug, Clone, PartialEq)]
struct Member {
    published: Published,
    style: Value,
}

impl Member {
    fn layer(name: &str) -> Self {
        Self {
            published: Published {
                kind: LAYER.to_string(),
                name: name.to_string(),
                href: None,
                other: Map::new(),
            },
            style: Value::String(UNSET_STYLE.to_string()),
        }
    }

    /// Local part of the member name, or the name as stored if it is malformed
    fn local_name(&self) -> &str {
        let stored = self.published.name.as_str();
        name::unqualify(stored).unwrap_or(stored)
    }
}

/// Take the members out of `document`.
///
/// A style list shorter than the member list is padded with unset overrides; surplus styles
/// have no member to belong to and are dropped.
fn take_members(document: &mut LayerGroupDocument) -> Vec<Member> {
    let published = mem::take(&mut document.publishables.published);
    let mut styles = mem::take(&mut document.styles.style).into_iter();
    published
        .into_iter()
        .map(|published| Member {
            published,
            style: styles
                .next()
                .unwrap_or_else(|| Value::String(UNSET_STYLE.to_string())),
        })
        .collect()
}

fn put_members(document: &mut LayerGroupDocument, members: Vec<Member>) {
    let (published, styles): (Vec<_>, Vec<_>) = members
        .into_iter()
        .map(|m| (m.published, m.style))
        .unzip();
    document.publishables.published = published;
    document.styles.style = styles;
}

/// Toggle the membership of every name in `toggles`, given as `(name, local name)`.
///
/// A name whose local part matches a member removes the first such member, together with its
/// style override. Every other name is appended with an unset style.
fn toggle(members: &mut Vec<Member>, toggles: &[(&str, &str)]) {
    let mut additions = vec![];
    for (raw, local) in toggles {
        match members.iter().position(|m| m.local_name() == *local) {
            Some(index) => {
                members.remove(index);
            }
            None => additions.push(Member::layer(raw)),
        }
    }
    members.extend(additions);
}

/// Document of a new group listing `members` in order, none with a style override
pub(crate) fn new_document(name: &str, members: Vec<String>) -> LayerGroupDocument {
    let mut document = LayerGroupDocument {
        name: name.to_string(),
        publishables: Publishables::default(),
        styles: StyleOverrides::default(),
        other: Map::new(),
    };
    put_members(
        &mut document,
        members.iter().map(|m| Member::layer(m)).collect(),
    );
    document
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerGroup {
    name: String,
    geoserver: GeoServer,
}

impl LayerGroup {
    pub(crate) fn new(name: impl Into<String>, geoserver: GeoServer) -> Self {
        Self {
            name: name.into(),
            geoserver,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geoserver(&self) -> &GeoServer {
        &self.geoserver
    }

    fn path(&self) -> String {
        format!("layergroups/{}", self.name)
    }

    async fn fetch(&self) -> Result<LayerGroupDocument> {
        let path = self.path();
        let document = self.geoserver.client().fetch(&path).await?;
        unwrap_document(&path, document, "layerGroup")
    }

    /// The member layers, in group order
    pub async fn get_layers(&self) -> Result<Vec<Layer>> {
        let document = self.fetch().await?;
        let mut layers = vec![];
        for published in document.publishables.published {
            if published.kind != LAYER {
                debug!(
                    group = %self.name,
                    member = %published.name,
                    kind = %published.kind,
                    "skipping non layer member"
                );
                continue;
            }
            let path = published
                .href
                .unwrap_or_else(|| format!("layers/{}", published.name));
            if let Some(layer) = self.geoserver.layer_at(&path).await? {
                layers.push(layer);
            }
        }
        Ok(layers)
    }

    /// Add or remove layers: a listed layer already in the group is removed, any other is
    /// appended.
    ///
    /// Names may be qualified or not; membership is decided on the local part. Every name is
    /// checked before the group is read, and the whole document is written back in one update.
    pub async fn set_layers(&self, layers: &[impl AsRef<str>]) -> Result<()> {
        let toggles = layers
            .iter()
            .map(|layer| {
                let layer = layer.as_ref();
                name::unqualify(layer).map(|local| (layer, local))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let path = self.path();
        let mut document = self.fetch().await?;
        let mut members = take_members(&mut document);
        toggle(&mut members, &toggles);
        let count = members.len();
        put_members(&mut document, members);

        self.geoserver
            .client()
            .update(&path, &wrap_document("layerGroup", &document)?)
            .await?;
        info!(group = %self.name, members = count, "updated layer group members");
        Ok(())
    }

    /// Delete this group and reload the catalog
    pub async fn delete(self) -> Result<()> {
        self.geoserver.client().delete(&self.path()).await?;
        info!(group = %self.name, "deleted layer group");
        self.geoserver.reload().await
    }
}
