//! An in-memory catalog for tests.
//!
//! [`MemoryCatalog`] keeps one JSON document per REST path and reproduces the catalog's
//! behaviour closely enough for the entity model: collections hold link stubs with absolute
//! `href`s, creating a resource adds it to its collection, deleting it removes it, publishing
//! a feature type or coverage publishes a layer, and an emptied collection reads back as `""`.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use geoserver_client::StatusCode;
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::{CatalogClient, Error, GeoServer, Result};

pub(crate) const BASE: &str = "http://localhost:8080/geoserver/rest/";

pub(crate) const BURG_SLD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<StyledLayerDescriptor version="1.0.0" xmlns="http://www.opengis.net/sld">
  <NamedLayer>
    <Name>burg</Name>
    <UserStyle>
      <Title>A small red flag</Title>
      <FeatureTypeStyle>
        <Rule>
          <PointSymbolizer>
            <Graphic>
              <ExternalGraphic>
                <OnlineResource xlink:type="simple" xlink:href="burg02.svg" xmlns:xlink="http://www.w3.org/1999/xlink"/>
                <Format>image/svg+xml</Format>
              </ExternalGraphic>
              <Size>20</Size>
            </Graphic>
          </PointSymbolizer>
        </Rule>
      </FeatureTypeStyle>
    </UserStyle>
  </NamedLayer>
</StyledLayerDescriptor>
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Method {
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Debug, Default)]
struct State {
    documents: BTreeMap<String, Value>,
    resources: BTreeMap<String, String>,
    failures: Vec<(Method, String)>,
    journal: Vec<(Method, String)>,
}

#[derive(Debug, Default)]
pub(crate) struct MemoryCatalog {
    state: Mutex<State>,
}

/// Strip the base URL, the `.json` suffix and any query from a path or href
fn normalize(path: &str) -> String {
    let path = path.strip_prefix(BASE).unwrap_or(path);
    let path = path.split('?').next().unwrap_or(path);
    path.strip_suffix(".json").unwrap_or(path).to_string()
}

fn href(path: &str) -> String {
    format!("{BASE}{path}.json")
}

fn link(path: &str, name: &str) -> Value {
    json!({"name": name, "href": href(path)})
}

/// The single `{"member": {...}}` entry of a document
fn member_of(document: &Value) -> Option<(&str, &Value)> {
    document
        .as_object()
        .and_then(|o| o.iter().next())
        .map(|(k, v)| (k.as_str(), v))
}

/// Append a stub to the collection document at `collection`, creating it if needed
fn push_stub(state: &mut State, collection: &str, member: &str, name: &str) {
    let outer = format!("{member}s");
    let stub = link(&format!("{collection}/{name}"), name);
    let document = state
        .documents
        .entry(collection.to_string())
        .or_insert_with(|| json!({ outer.as_str(): "" }));
    let slot = &mut document[outer.as_str()];
    let mut members = match slot.take() {
        Value::Object(mut inner) => match inner.remove(member) {
            Some(Value::Array(items)) => items,
            Some(item @ Value::Object(_)) => vec![item],
            _ => vec![],
        },
        _ => vec![],
    };
    members.push(stub);
    *slot = json!({ member: members });
}

/// Remove the stub `name` from the collection document at `collection`
fn remove_stub(state: &mut State, collection: &str, name: &str) {
    let Some(Value::Object(document)) = state.documents.get_mut(collection) else {
        return;
    };
    for slot in document.values_mut() {
        let Value::Object(inner) = slot else {
            continue;
        };
        let mut emptied = false;
        for members in inner.values_mut() {
            if let Value::Array(items) = members {
                items.retain(|item| item["name"] != name);
                emptied = items.is_empty();
            } else if members["name"] == name {
                emptied = true;
            }
        }
        if emptied {
            *slot = Value::String(String::new());
        }
    }
}

fn collection_of(path: &str) -> (&str, &str) {
    path.rsplit_once('/').unwrap_or(("", path))
}

/// Emulate the catalog publishing a layer for a new feature type or coverage
fn publish(state: &mut State, workspace: &str, store: &str, name: &str, style: &str) {
    let vector_path = format!("workspaces/{workspace}/datastores/{store}");
    let (store_path, member, collection, class, layer_type) =
        if state.documents.contains_key(&vector_path) {
            (vector_path, "featureType", "featuretypes", "dataStore", "VECTOR")
        } else {
            (
                format!("workspaces/{workspace}/coveragestores/{store}"),
                "coverage",
                "coverages",
                "coverageStore",
                "RASTER",
            )
        };
    let resource_path = format!("{store_path}/{collection}/{name}");
    let qualified = format!("{workspace}:{name}");

    state.documents.insert(
        resource_path.clone(),
        json!({ member: {
            "name": name,
            "nativeName": name,
            "namespace": link(&format!("namespaces/{workspace}"), workspace),
            "store": {
                "@class": class,
                "name": format!("{workspace}:{store}"),
                "href": href(&store_path),
            },
            "enabled": true,
        }}),
    );
    state.documents.insert(
        format!("layers/{qualified}"),
        json!({"layer": {
            "name": name,
            "type": layer_type,
            "defaultStyle": link(&format!("styles/{style}"), style),
            "resource": {
                "@class": member,
                "name": qualified,
                "href": href(&resource_path),
            },
            "attribution": {"logoWidth": 0, "logoHeight": 0},
        }}),
    );
    push_stub(state, "layers", "layer", &qualified);
}

impl MemoryCatalog {
    /// Look at the stored document at `path`, bypassing the request journal
    pub(crate) fn document(&self, path: &str) -> Option<Value> {
        self.state.lock().documents.get(&normalize(path)).cloned()
    }

    /// Make every `method` request on `path` fail with a server error
    pub(crate) fn fail(&self, method: Method, path: &str) {
        self.state.lock().failures.push((method, normalize(path)));
    }

    /// Requests served so far, with normalised paths
    pub(crate) fn requests(&self) -> Vec<(Method, String)> {
        self.state.lock().journal.clone()
    }

    fn serve(&self, method: Method, path: &str) -> Result<String> {
        let path = normalize(path);
        let mut state = self.state.lock();
        state.journal.push((method, path.clone()));
        if state.failures.contains(&(method, path.clone())) {
            return Err(Error::Transport(geoserver_client::Error::ApiError {
                code: StatusCode::INTERNAL_SERVER_ERROR,
                message: format!("injected failure for {method:?} {path}"),
            }));
        }
        Ok(path)
    }

    pub(crate) fn add_workspace(&self, name: &str, namespace: Option<&str>) {
        let mut state = self.state.lock();
        let path = format!("workspaces/{name}");
        state.documents.insert(
            path.clone(),
            json!({"workspace": {
                "name": name,
                "isolated": false,
                "dataStores": href(&format!("{path}/datastores")),
                "coverageStores": href(&format!("{path}/coveragestores")),
                "wmsStores": href(&format!("{path}/wmsstores")),
            }}),
        );
        state
            .documents
            .insert(format!("{path}/datastores"), json!({"dataStores": ""}));
        state.documents.insert(
            format!("{path}/coveragestores"),
            json!({"coverageStores": ""}),
        );
        push_stub(&mut state, "workspaces", "workspace", name);

        state
            .documents
            .entry("namespaces".to_string())
            .or_insert_with(|| json!({"namespaces": ""}));
        if let Some(uri) = namespace {
            state.documents.insert(
                format!("namespaces/{name}"),
                json!({"namespace": {"prefix": name, "uri": uri, "isolated": false}}),
            );
            push_stub(&mut state, "namespaces", "namespace", name);
        }
    }

    fn add_store(&self, workspace: &str, collection: &str, member: &str, store: Value) {
        let mut state = self.state.lock();
        let name = store["name"].as_str().unwrap_or_default().to_string();
        let path = format!("workspaces/{workspace}/{collection}/{name}");
        let (resources, outer) = if member == "dataStore" {
            ("featuretypes", "featureTypes")
        } else {
            ("coverages", "coverages")
        };

        let mut store = store;
        store["workspace"] = link(&format!("workspaces/{workspace}"), workspace);
        store[outer] = Value::String(href(&format!("{path}/{resources}")));
        state
            .documents
            .insert(format!("{path}/{resources}"), json!({ outer: "" }));
        state.documents.insert(path, json!({ member: store }));
        push_stub(
            &mut state,
            &format!("workspaces/{workspace}/{collection}"),
            member,
            &name,
        );
    }

    pub(crate) fn add_vector_store(&self, workspace: &str, name: &str, file: &str) {
        let namespace = format!("http://{workspace}.example.com");
        self.add_store(
            workspace,
            "datastores",
            "dataStore",
            json!({
                "name": name,
                "type": "Shapefile",
                "enabled": true,
                "connectionParameters": {"entry": [
                    {"@key": "url", "$": file},
                    {"@key": "namespace", "$": namespace},
                ]},
                "_default": false,
            }),
        );
    }

    pub(crate) fn add_raster_store(&self, workspace: &str, name: &str, file: &str) {
        self.add_store(
            workspace,
            "coveragestores",
            "coverageStore",
            json!({
                "name": name,
                "type": "GeoTIFF",
                "enabled": true,
                "url": file,
                "_default": false,
            }),
        );
    }

    pub(crate) fn add_postgis_store(&self, workspace: &str, name: &str) {
        self.add_store(
            workspace,
            "datastores",
            "dataStore",
            json!({
                "name": name,
                "type": "PostGIS",
                "enabled": true,
                "connectionParameters": {"entry": [
                    {"@key": "host", "$": "localhost"},
                    {"@key": "port", "$": "5432"},
                    {"@key": "database", "$": "gis"},
                    {"@key": "schema", "$": "public"},
                    {"@key": "user", "$": "docker"},
                    {"@key": "passwd", "$": "crypt1:dG9wc2VjcmV0"},
                    {"@key": "Expose primary keys", "$": "false"},
                    {"@key": "dbtype", "$": "postgis"},
                ]},
                "_default": false,
            }),
        );
    }

    /// A store none of the classifiers recognise
    pub(crate) fn add_wfs_store(&self, workspace: &str, name: &str) {
        self.add_store(
            workspace,
            "datastores",
            "dataStore",
            json!({
                "name": name,
                "type": "Web Feature Server (NG)",
                "enabled": true,
                "connectionParameters": {"entry": [
                    {
                        "@key": "WFSDataStoreFactory:GET_CAPABILITIES_URL",
                        "$": "http://example.com/wfs",
                    },
                ]},
            }),
        );
    }

    /// Publish `name` from `store` with its default `style`
    pub(crate) fn add_layer(&self, workspace: &str, store: &str, name: &str, style: &str) {
        let mut state = self.state.lock();
        let vector = state
            .documents
            .contains_key(&format!("workspaces/{workspace}/datastores/{store}"));
        let (collection, member) = if vector {
            (format!("workspaces/{workspace}/datastores/{store}/featuretypes"), "featureType")
        } else {
            (format!("workspaces/{workspace}/coveragestores/{store}/coverages"), "coverage")
        };
        push_stub(&mut state, &collection, member, name);
        publish(&mut state, workspace, store, name, style);
    }

    pub(crate) fn add_style(&self, name: &str, sld: &str) {
        let mut state = self.state.lock();
        state.documents.insert(
            format!("styles/{name}"),
            json!({"style": {
                "name": name,
                "format": "sld",
                "languageVersion": {"version": "1.0.0"},
                "filename": format!("{name}.sld"),
            }}),
        );
        state
            .resources
            .insert(format!("resource/styles/{name}.sld"), sld.to_string());
        push_stub(&mut state, "styles", "style", name);
    }

    /// A group of `(layer, style override)` members
    pub(crate) fn add_layer_group(&self, name: &str, members: &[(&str, Option<&str>)]) {
        let mut state = self.state.lock();
        let published: Vec<_> = members
            .iter()
            .map(|(layer, _)| {
                json!({"@type": "layer", "name": layer, "href": href(&format!("layers/{layer}"))})
            })
            .collect();
        let styles: Vec<_> = members
            .iter()
            .map(|(_, style)| match style {
                Some(style) => link(&format!("styles/{style}"), style),
                None => json!(""),
            })
            .collect();
        state.documents.insert(
            format!("layergroups/{name}"),
            json!({"layerGroup": {
                "name": name,
                "mode": "SINGLE",
                "publishables": {"published": published},
                "styles": {"style": styles},
                "bounds": {
                    "minx": 143.83482400000003,
                    "maxx": 148.47914100000003,
                    "miny": -43.648056,
                    "maxy": -39.573891,
                    "crs": "EPSG:4326",
                },
            }}),
        );
        push_stub(&mut state, "layergroups", "layerGroup", name);
    }

    /// The demo catalog a fresh server install ships with, trimmed to what the tests use
    pub(crate) fn demo() -> Self {
        let catalog = Self::default();
        catalog.state.lock().documents.insert(
            "fonts".to_string(),
            json!({"fonts": ["DejaVu Sans", "Lucida Sans", "Verdana"]}),
        );
        catalog
            .state
            .lock()
            .documents
            .insert("layergroups".to_string(), json!({"layerGroups": ""}));

        for style in [
            "burg",
            "capitals",
            "dem",
            "giant_polygon",
            "line",
            "point",
            "poi",
            "poly_landmarks",
            "polygon",
            "raster",
            "simple_roads",
            "tiger_roads",
        ] {
            catalog.add_style(style, &BURG_SLD.replace("burg", style));
        }

        catalog.add_workspace("cite", None);
        catalog.add_workspace("tiger", Some("http://www.census.gov"));
        catalog.add_workspace("nurc", Some("http://www.nurc.nato.int"));
        catalog.add_workspace("sf", Some("http://www.openplans.org/spearfish"));
        catalog.add_workspace("topp", Some("http://www.openplans.org/topp"));

        catalog.add_vector_store("tiger", "nyc", "file:data/nyc");
        for layer in ["giant_polygon", "poi", "poly_landmarks", "tiger_roads"] {
            catalog.add_layer("tiger", "nyc", layer, layer);
        }

        catalog.add_raster_store(
            "nurc",
            "arcGridSample",
            "file:coverages/arc_sample/precip30min.asc",
        );
        catalog.add_raster_store("nurc", "mosaic", "file:coverages/mosaic_sample/mosaic.shp");
        catalog.add_layer("nurc", "arcGridSample", "Arc_Sample", "raster");
        catalog.add_layer("nurc", "mosaic", "mosaic", "raster");

        catalog.add_vector_store("sf", "sf", "file:data/sf");
        catalog.add_raster_store("sf", "sfdem", "file:data/sf/sfdem.tif");
        catalog.add_layer("sf", "sf", "roads", "simple_roads");
        catalog.add_layer("sf", "sfdem", "sfdem", "dem");

        catalog.add_vector_store("topp", "states_shapefile", "file:data/shapefiles/states.shp");
        catalog.add_vector_store("topp", "taz_shapes", "file:data/taz_shapes");
        catalog.add_postgis_store("topp", "postgis");
        catalog.add_wfs_store("topp", "remote_wfs");
        catalog.add_layer("topp", "states_shapefile", "states", "polygon");
        for (layer, style) in [
            ("tasmania_cities", "capitals"),
            ("tasmania_roads", "simple_roads"),
            ("tasmania_state_boundaries", "polygon"),
            ("tasmania_water_bodies", "polygon"),
        ] {
            catalog.add_layer("topp", "taz_shapes", layer, style);
        }

        catalog.add_layer_group(
            "tasmania",
            &[
                ("topp:tasmania_state_boundaries", Some("polygon")),
                ("topp:tasmania_water_bodies", None),
                ("topp:tasmania_roads", Some("simple_roads")),
                ("topp:tasmania_cities", None),
            ],
        );
        catalog.add_layer_group("spearfish", &[("sf:sfdem", None), ("sf:roads", None)]);
        catalog
    }
}

/// A demo catalog and a handle on it
pub(crate) fn demo() -> (Arc<MemoryCatalog>, GeoServer) {
    let catalog = Arc::new(MemoryCatalog::demo());
    let geoserver = GeoServer::from_client(Arc::clone(&catalog) as Arc<dyn CatalogClient>);
    (catalog, geoserver)
}

#[async_trait]
impl CatalogClient for MemoryCatalog {
    async fn fetch(&self, path: &str) -> Result<Value> {
        let path = self.serve(Method::Get, path)?;
        self.state
            .lock()
            .documents
            .get(&path)
            .cloned()
            .ok_or(Error::NotFound { path })
    }

    async fn fetch_text(&self, path: &str) -> Result<String> {
        let path = self.serve(Method::Get, path)?;
        self.state
            .lock()
            .resources
            .get(&path)
            .cloned()
            .ok_or(Error::NotFound { path })
    }

    async fn create(&self, path: &str, document: &Value) -> Result<()> {
        let path = self.serve(Method::Post, path)?;
        let (member, inner) = member_of(document).ok_or_else(|| Error::MissingMember {
            path: path.clone(),
            member: "document",
        })?;
        let name = inner["name"].as_str().ok_or_else(|| Error::MissingMember {
            path: path.clone(),
            member: "name",
        })?;

        let key = format!("{path}/{name}");
        let mut state = self.state.lock();
        if state.documents.contains_key(&key) {
            return Err(Error::Conflict { path: key });
        }
        state.documents.insert(key, document.clone());
        push_stub(&mut state, &path, member, name);

        let segments: Vec<_> = path.split('/').collect();
        if let ["workspaces", workspace, _, store, "featuretypes" | "coverages"] = segments[..] {
            let style = if member == "coverage" { "raster" } else { "polygon" };
            publish(&mut state, workspace, store, name, style);
        }
        Ok(())
    }

    async fn update(&self, path: &str, document: &Value) -> Result<()> {
        let path = self.serve(Method::Put, path)?;
        self.state.lock().documents.insert(path, document.clone());
        Ok(())
    }

    async fn update_raw(
        &self,
        path: &str,
        _content_type: &'static str,
        body: String,
    ) -> Result<()> {
        let path = self.serve(Method::Put, path)?;
        let mut state = self.state.lock();
        let filename = state
            .documents
            .get(&path)
            .and_then(member_of)
            .and_then(|(_, inner)| inner["filename"].as_str())
            .map(ToString::to_string);
        let resource = match filename {
            Some(filename) => format!("resource/{}/{filename}", collection_of(&path).0),
            None => path,
        };
        state.resources.insert(resource, body);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let path = self.serve(Method::Delete, path)?;
        let mut state = self.state.lock();
        if state.documents.remove(&path).is_none() {
            return Err(Error::NotFound { path });
        }
        let (collection, name) = collection_of(&path);
        remove_stub(&mut state, collection, name);
        Ok(())
    }

    async fn trigger(&self, path: &str) -> Result<()> {
        self.serve(Method::Post, path)?;
        Ok(())
    }

    fn href(&self, path: &str) -> String {
        href(path)
    }
}
