//! HTTP transport for the GeoServer REST API.
//!
//! The [`Client`] knows nothing about workspaces, stores or layers. It sends a request with a
//! method, a path relative to the REST root, and an optional body, then checks the response
//! status against the code expected for that kind of request.

use observability_deps::tracing::debug;
use reqwest::{
    IntoUrl, Method,
    header::{ACCEPT, CONTENT_TYPE},
};
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use serde_json::Value;
use url::Url;

pub use reqwest::StatusCode;

/// Content type used when uploading SLD documents
pub const SLD_CONTENT_TYPE: &str = "application/vnd.ogc.sld+xml";

const JSON_CONTENT_TYPE: &str = "application/json";

/// Primary error type for the [`Client`]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("base URL error: {0}")]
    BaseUrl(#[source] reqwest::Error),

    #[error("request URL error: {0}")]
    RequestUrl(#[from] url::ParseError),

    #[error("failed to serialize request body: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to parse JSON response: {0}")]
    Json(#[source] reqwest::Error),

    #[error("failed to parse plaintext response: {0}")]
    Text(#[source] reqwest::Error),

    #[error("server responded with error [{code}]: {message}")]
    ApiError { code: StatusCode, message: String },

    #[error("failed to send {method} {url} request: {source}")]
    RequestSend {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl Error {
    fn request_send(method: Method, url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::RequestSend {
            method,
            url: url.into(),
            source,
        }
    }

    /// The status code the server answered with, if the request got that far
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::ApiError { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Body of an outgoing request
enum RequestBody {
    Json(Vec<u8>),
    Raw {
        content_type: &'static str,
        body: String,
    },
}

/// The GeoServer REST client
///
/// For programmatic access to the `/rest` API of a running GeoServer
#[derive(Debug, Clone)]
pub struct Client {
    /// The REST root, e.g. `http://localhost:8080/geoserver/rest/`
    base_url: Url,
    /// User name and password sent as HTTP basic auth on each request
    credentials: Option<(String, Secret<String>)>,
    /// A [`reqwest::Client`] for handling HTTP requests
    http_client: reqwest::Client,
}

impl Client {
    /// Create a new [`Client`]
    ///
    /// A trailing `/` is added to the base URL when missing so that relative paths resolve
    /// below the REST root instead of replacing its last segment.
    pub fn new<U: IntoUrl>(base_url: U) -> Result<Self> {
        let mut base_url = base_url.into_url().map_err(Error::BaseUrl)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            credentials: None,
            http_client: reqwest::Client::new(),
        })
    }

    /// Set the credentials sent as HTTP basic auth with each request to the server
    ///
    /// # Example
    /// ```
    /// # use geoserver_client::Client;
    /// # fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    /// let client = Client::new("http://localhost:8080/geoserver/rest")?
    ///     .with_basic_auth("admin", "geoserver");
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_basic_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((user.into(), Secret::new(password.into())));
        self
    }

    /// The REST root every relative path is resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET` a JSON document; expects `200 OK`
    pub async fn get_json(&self, path: &str) -> Result<Value> {
        let resp = self
            .send(Method::GET, path, None, &[StatusCode::OK])
            .await?;
        resp.json().await.map_err(Error::Json)
    }

    /// `GET` a raw text resource; expects `200 OK`
    pub async fn get_text(&self, path: &str) -> Result<String> {
        let resp = self
            .send_accepting(Method::GET, path, None, &[StatusCode::OK], "*/*")
            .await?;
        resp.text().await.map_err(Error::Text)
    }

    /// `POST` a JSON document into a collection; expects `201 Created`
    pub async fn post_json<B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<()> {
        let body = serde_json::to_vec(body).map_err(Error::Serialize)?;
        self.send(
            Method::POST,
            path,
            Some(RequestBody::Json(body)),
            &[StatusCode::CREATED],
        )
        .await?;
        Ok(())
    }

    /// `POST` without a body to trigger an action such as `reload`; expects `200 OK`
    pub async fn post_empty(&self, path: &str) -> Result<()> {
        self.send(Method::POST, path, None, &[StatusCode::OK])
            .await?;
        Ok(())
    }

    /// `PUT` a full JSON document; expects `200 OK` or `204 No Content`
    pub async fn put_json<B: Serialize + Sync + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let body = serde_json::to_vec(body).map_err(Error::Serialize)?;
        self.send(
            Method::PUT,
            path,
            Some(RequestBody::Json(body)),
            &[StatusCode::OK, StatusCode::NO_CONTENT],
        )
        .await?;
        Ok(())
    }

    /// `PUT` a raw body with the given content type; expects `200 OK` or `204 No Content`
    pub async fn put_raw(
        &self,
        path: &str,
        content_type: &'static str,
        body: impl Into<String> + Send,
    ) -> Result<()> {
        self.send(
            Method::PUT,
            path,
            Some(RequestBody::Raw {
                content_type,
                body: body.into(),
            }),
            &[StatusCode::OK, StatusCode::NO_CONTENT],
        )
        .await?;
        Ok(())
    }

    /// `DELETE` a resource; expects `200 OK` or `204 No Content`
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(
            Method::DELETE,
            path,
            None,
            &[StatusCode::OK, StatusCode::NO_CONTENT],
        )
        .await?;
        Ok(())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        expected: &[StatusCode],
    ) -> Result<reqwest::Response> {
        self.send_accepting(method, path, body, expected, JSON_CONTENT_TYPE)
            .await
    }

    async fn send_accepting(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        expected: &[StatusCode],
        accept: &'static str,
    ) -> Result<reqwest::Response> {
        let url = self.base_url.join(path)?;
        debug!(%method, %url, "sending catalog request");
        let mut req = self
            .http_client
            .request(method.clone(), url.clone())
            .header(ACCEPT, accept);
        if let Some((user, password)) = &self.credentials {
            req = req.basic_auth(user, Some(password.expose_secret()));
        }
        req = match body {
            Some(RequestBody::Json(bytes)) => {
                req.header(CONTENT_TYPE, JSON_CONTENT_TYPE).body(bytes)
            }
            Some(RequestBody::Raw { content_type, body }) => {
                req.header(CONTENT_TYPE, content_type).body(body)
            }
            None => req,
        };
        let resp = req
            .send()
            .await
            .map_err(|src| Error::request_send(method, url.as_str(), src))?;
        let status = resp.status();
        if expected.contains(&status) {
            Ok(resp)
        } else {
            Err(Error::ApiError {
                code: status,
                message: resp.text().await.map_err(Error::Text)?,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};
    use reqwest::StatusCode;
    use serde_json::json;

    use crate::{Client, Error, SLD_CONTENT_TYPE};

    const AUTH: &str = "Basic YWRtaW46Z2Vvc2VydmVy";

    #[tokio::test]
    async fn get_json() {
        let body = r#"{"workspace": {"name": "tiger"}}"#;

        let mut mock_server = Server::new_async().await;
        let mock = mock_server
            .mock("GET", "/geoserver/rest/workspaces/tiger")
            .match_header("Authorization", AUTH)
            .match_header("Accept", "application/json")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let client = Client::new(format!("{}/geoserver/rest", mock_server.url()))
            .expect("create client")
            .with_basic_auth("admin", "geoserver");

        let doc = client
            .get_json("workspaces/tiger")
            .await
            .expect("send get request");

        assert_eq!(doc, json!({"workspace": {"name": "tiger"}}));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn get_json_follows_absolute_href() {
        let mut mock_server = Server::new_async().await;
        let mock = mock_server
            .mock("GET", "/geoserver/rest/workspaces/tiger/datastores.json")
            .with_status(200)
            .with_body(r#"{"dataStores": ""}"#)
            .create_async()
            .await;

        let client = Client::new(format!("{}/geoserver/rest/", mock_server.url()))
            .expect("create client");
        let href = format!(
            "{}/geoserver/rest/workspaces/tiger/datastores.json",
            mock_server.url()
        );

        let doc = client.get_json(&href).await.expect("send get request");
        assert_eq!(doc, json!({"dataStores": ""}));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unexpected_status_is_an_api_error() {
        let mut mock_server = Server::new_async().await;
        let mock = mock_server
            .mock("GET", "/rest/layers/invalid")
            .with_status(404)
            .with_body("No such layer: invalid")
            .create_async()
            .await;

        let client = Client::new(format!("{}/rest", mock_server.url())).expect("create client");

        let err = client
            .get_json("layers/invalid")
            .await
            .expect_err("lookup of a missing layer fails");
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        match err {
            Error::ApiError { message, .. } => assert_eq!(message, "No such layer: invalid"),
            other => panic!("unexpected error: {other}"),
        }

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn post_json_expects_created() {
        let mut mock_server = Server::new_async().await;
        let created = mock_server
            .mock("POST", "/rest/workspaces")
            .match_header("Content-Type", "application/json")
            .match_body(Matcher::Json(json!({"workspace": {"name": "new_ws"}})))
            .with_status(201)
            .create_async()
            .await;
        let client = Client::new(format!("{}/rest", mock_server.url())).expect("create client");

        client
            .post_json("workspaces", &json!({"workspace": {"name": "new_ws"}}))
            .await
            .expect("create workspace");
        created.assert_async().await;

        let ok_is_not_created = mock_server
            .mock("POST", "/rest/styles")
            .with_status(200)
            .create_async()
            .await;
        let err = client
            .post_json("styles", &json!({"style": {"name": "s"}}))
            .await
            .expect_err("200 is not a successful creation");
        assert_eq!(err.status(), Some(StatusCode::OK));
        ok_is_not_created.assert_async().await;
    }

    #[tokio::test]
    async fn put_raw_sends_content_type() {
        let sld = "<StyledLayerDescriptor/>";
        let mut mock_server = Server::new_async().await;
        let mock = mock_server
            .mock("PUT", "/rest/styles/burg")
            .match_header("Content-Type", SLD_CONTENT_TYPE)
            .match_body(sld)
            .with_status(200)
            .create_async()
            .await;
        let client = Client::new(format!("{}/rest", mock_server.url())).expect("create client");

        client
            .put_raw("styles/burg", SLD_CONTENT_TYPE, sld)
            .await
            .expect("upload sld");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn delete_accepts_no_content() {
        let mut mock_server = Server::new_async().await;
        let mock = mock_server
            .mock("DELETE", "/rest/layergroups/tasmania")
            .with_status(204)
            .create_async()
            .await;
        let client = Client::new(format!("{}/rest", mock_server.url())).expect("create client");

        client
            .delete("layergroups/tasmania")
            .await
            .expect("delete layer group");

        mock.assert_async().await;
    }
}
