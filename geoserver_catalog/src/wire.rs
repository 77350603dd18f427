//! JSON document shapes of the catalog REST API.
//!
//! Collections come back as link stubs (`name` + `href`); every entity has to be fetched on
//! its own. The catalog also serialises an empty collection as `""` and a one element
//! collection as a bare object, so list members are read through [`one_or_many`].
//!
//! Documents that are written back after a local edit keep every member this crate does not
//! model in a flattened `other` map, so a read-modify-write never drops fields.

use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{Error, Result, params::ParamList};

/// A collection member: a name and the path of the full document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStub {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// Accept a list, a single member, `""` or `null` as a list
pub(crate) fn one_or_many<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
        Blank(String),
        Null(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(items) => items,
        OneOrMany::One(item) => vec![item],
        OneOrMany::Blank(_) | OneOrMany::Null(()) => vec![],
    })
}

/// Like [`one_or_many`] for raw values, where a lone `""` is a member rather than an empty list
fn values<'de, D>(deserializer: D) -> std::result::Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => vec![],
        item => vec![item],
    })
}

/// Parse a collection document such as `{"workspaces": {"workspace": [...]}}` into its stubs
pub(crate) fn parse_collection(path: &str, document: Value) -> Result<Vec<LinkStub>> {
    #[derive(Deserialize)]
    struct Members(#[serde(deserialize_with = "one_or_many")] Vec<LinkStub>);

    let Value::Object(outer) = document else {
        return Err(Error::MissingMember {
            path: path.to_string(),
            member: "collection",
        });
    };
    match outer.into_iter().next().map(|(_, inner)| inner) {
        None | Some(Value::Null) | Some(Value::String(_)) => Ok(vec![]),
        Some(Value::Object(inner)) => match inner.into_iter().next() {
            None => Ok(vec![]),
            Some((_, members)) => serde_json::from_value::<Members>(members)
                .map(|m| m.0)
                .map_err(|source| Error::document(path, source)),
        },
        Some(_) => Err(Error::MissingMember {
            path: path.to_string(),
            member: "collection",
        }),
    }
}

/// Take the `member` object out of a `{"member": {...}}` document and deserialize it
pub(crate) fn unwrap_document<T: DeserializeOwned>(
    path: &str,
    mut document: Value,
    member: &'static str,
) -> Result<T> {
    let inner = document
        .get_mut(member)
        .map(Value::take)
        .ok_or_else(|| Error::MissingMember {
            path: path.to_string(),
            member,
        })?;
    serde_json::from_value(inner).map_err(|source| Error::document(path, source))
}

/// Wrap a serialisable body as `{"member": body}`
pub(crate) fn wrap_document<T: Serialize>(member: &str, body: &T) -> Result<Value> {
    let body = serde_json::to_value(body).map_err(|source| Error::document(member, source))?;
    let mut document = Map::new();
    document.insert(member.to_string(), body);
    Ok(Value::Object(document))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WorkspaceDocument {
    #[serde(default)]
    pub(crate) data_stores: Option<String>,
    #[serde(default)]
    pub(crate) coverage_stores: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct NamespaceDocument {
    pub(crate) prefix: String,
    #[serde(default)]
    pub(crate) uri: Option<String>,
}

/// A `dataStore` or `coverageStore` document
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoreDocument {
    pub(crate) name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub(crate) store_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) connection_parameters: Option<ParamList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) feature_types: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) coverages: Option<String>,
    #[serde(flatten)]
    pub(crate) other: Map<String, Value>,
}

/// A reference by name to another entity, e.g. a layer's `defaultStyle`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub(crate) struct NamedLink {
    pub(crate) name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) href: Option<String>,
    #[serde(flatten)]
    pub(crate) other: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LayerDocument {
    pub(crate) name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) default_style: Option<NamedLink>,
    pub(crate) resource: NamedLink,
    #[serde(flatten)]
    pub(crate) other: Map<String, Value>,
}

/// The `featureType` or `coverage` a layer publishes
#[derive(Debug, Deserialize)]
pub(crate) struct ResourceDocument {
    pub(crate) namespace: LinkStub,
    pub(crate) store: LinkStub,
}

/// One `published` entry of a layer group
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub(crate) struct Published {
    #[serde(rename = "@type")]
    pub(crate) kind: String,
    pub(crate) name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) href: Option<String>,
    #[serde(flatten)]
    pub(crate) other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub(crate) struct Publishables {
    #[serde(default, deserialize_with = "one_or_many")]
    pub(crate) published: Vec<Published>,
    #[serde(flatten)]
    pub(crate) other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub(crate) struct StyleOverrides {
    #[serde(default, deserialize_with = "values")]
    pub(crate) style: Vec<Value>,
    #[serde(flatten)]
    pub(crate) other: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub(crate) struct LayerGroupDocument {
    pub(crate) name: String,
    #[serde(default, deserialize_with = "blank_as_default")]
    pub(crate) publishables: Publishables,
    #[serde(default, deserialize_with = "blank_as_default")]
    pub(crate) styles: StyleOverrides,
    #[serde(flatten)]
    pub(crate) other: Map<String, Value>,
}

/// Read `""` or `null` as `T::default()`
fn blank_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OrBlank<T> {
        Value(T),
        Blank(String),
        Null(()),
    }

    Ok(match OrBlank::deserialize(deserializer)? {
        OrBlank::Value(value) => value,
        OrBlank::Blank(_) | OrBlank::Null(()) => T::default(),
    })
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub(crate) struct StyleDocument {
    pub(crate) name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) filename: Option<String>,
    #[serde(flatten)]
    pub(crate) other: Map<String, Value>,
}
