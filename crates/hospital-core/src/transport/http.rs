//! REST transport over `reqwest`.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::time::Duration;
use tracing::debug;

use super::provider::EntityTransport;
use crate::entity::Entity;
use crate::envelope::{Alert, Envelope, PageRequest};
use crate::{Error, Result};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport that talks to the entity's REST resource.
///
/// Endpoints, relative to the base URL:
///
/// | operation | request                                  |
/// |-----------|------------------------------------------|
/// | find      | `GET /api/{resource}/{id}`               |
/// | create    | `POST /api/{resource}`                   |
/// | update    | `PUT /api/{resource}`                    |
/// | query     | `GET /api/{resource}?page=&size=&sort=`  |
/// | search    | `GET /api/_search/{resource}?query=...`  |
/// | delete    | `DELETE /api/{resource}/{id}`            |
pub struct HttpTransport<E> {
    client: Client,
    base_url: Url,
    app_name: String,
    token: Option<String>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> HttpTransport<E> {
    /// Creates a transport with the default timeout.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Backend root, e.g. `http://localhost:8080`
    /// * `app_name` - Application name used in alert headers (`X-{app}-alert`)
    pub fn new(base_url: &str, app_name: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, app_name, DEFAULT_TIMEOUT)
    }

    /// Creates a transport with an explicit request timeout.
    pub fn with_timeout(
        base_url: &str,
        app_name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::transport_with_source("Failed to build HTTP client", e))?;
        Self::with_client(base_url, app_name, client)
    }

    /// Creates a transport on a preconfigured client (proxies, TLS roots).
    pub fn with_client(
        base_url: &str,
        app_name: impl Into<String>,
        client: Client,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::config(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            base_url,
            app_name: app_name.into(),
            token: None,
            _entity: PhantomData,
        })
    }

    /// Sets a bearer token sent with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// The backend root this transport talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::config(format!("base URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    fn paged(mut url: Url, page: &PageRequest, search: Option<&str>) -> Url {
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(query) = search {
                pairs.append_pair("query", query);
            }
            for (key, value) in page.to_query() {
                pairs.append_pair(key, &value);
            }
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, label: &str, request: RequestBuilder) -> Result<Response> {
        debug!("{label}");
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| Error::transport_with_source(format!("{label} failed"), e))?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(status_error(response).await)
        }
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<Envelope<T>> {
        let status = response.status().as_u16();
        let total_count = total_count(response.headers());
        let alert = self.alert(response.headers());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::transport_with_source("Failed to read response body", e))?;
        let body = if bytes.is_empty() {
            None
        } else {
            Some(serde_json::from_slice(&bytes)?)
        };

        Ok(Envelope {
            status,
            body,
            total_count,
            alert,
        })
    }

    fn alert(&self, headers: &HeaderMap) -> Option<Alert> {
        let message = header_str(headers, &format!("X-{}-alert", self.app_name))?;
        let param = header_str(headers, &format!("X-{}-params", self.app_name));
        Some(Alert {
            message: message.to_string(),
            param: param.map(str::to_string),
        })
    }
}

#[async_trait]
impl<E: Entity> EntityTransport<E> for HttpTransport<E> {
    async fn find(&self, id: &E::Id) -> Result<Envelope<E>> {
        let url = self.endpoint(&[E::RESOURCE, &id.to_string()])?;
        let response = self
            .send(&format!("GET {url}"), self.client.get(url))
            .await?;
        self.decode(response).await
    }

    async fn create(&self, entity: &E) -> Result<Envelope<E>> {
        let url = self.endpoint(&[E::RESOURCE])?;
        let response = self
            .send(&format!("POST {url}"), self.client.post(url).json(entity))
            .await?;
        self.decode(response).await
    }

    async fn update(&self, entity: &E) -> Result<Envelope<E>> {
        let url = self.endpoint(&[E::RESOURCE])?;
        let response = self
            .send(&format!("PUT {url}"), self.client.put(url).json(entity))
            .await?;
        self.decode(response).await
    }

    async fn query(&self, page: &PageRequest) -> Result<Envelope<Vec<E>>> {
        let url = Self::paged(self.endpoint(&[E::RESOURCE])?, page, None);
        let response = self
            .send(&format!("GET {url}"), self.client.get(url))
            .await?;
        self.decode(response).await
    }

    async fn search(&self, query: &str, page: &PageRequest) -> Result<Envelope<Vec<E>>> {
        let url = Self::paged(self.endpoint(&["_search", E::RESOURCE])?, page, Some(query));
        let response = self
            .send(&format!("GET {url}"), self.client.get(url))
            .await?;
        self.decode(response).await
    }

    async fn delete(&self, id: &E::Id) -> Result<Envelope<()>> {
        let url = self.endpoint(&[E::RESOURCE, &id.to_string()])?;
        let response = self
            .send(&format!("DELETE {url}"), self.client.delete(url))
            .await?;
        Ok(Envelope {
            status: response.status().as_u16(),
            body: None,
            total_count: None,
            alert: self.alert(response.headers()),
        })
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn total_count(headers: &HeaderMap) -> Option<u64> {
    header_str(headers, "X-Total-Count").and_then(|v| v.trim().parse().ok())
}

/// Turn a non-success response into [`Error::Status`], reading the problem
/// body (`title`, `detail`, `message`, `errorKey`) when there is one.
async fn status_error(response: Response) -> Error {
    let status = response.status();
    let fallback = status.canonical_reason().unwrap_or("Unknown error").to_string();
    let problem: Option<serde_json::Value> = match response.bytes().await {
        Ok(bytes) => serde_json::from_slice(&bytes).ok(),
        Err(_) => None,
    };

    let field = |name: &str| {
        problem
            .as_ref()
            .and_then(|p| p.get(name))
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
    };

    Error::Status {
        status: status.as_u16(),
        message: field("title")
            .or_else(|| field("detail"))
            .or_else(|| field("message"))
            .unwrap_or(fallback),
        error_key: field("errorKey"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entity::Hospital;
    use crate::envelope::Direction;

    #[test]
    fn test_endpoint_joins_resource() {
        let transport = HttpTransport::<Hospital>::new("http://localhost:8080", "amachouApp").unwrap();
        let url = transport.endpoint(&[Hospital::RESOURCE, "42"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/hospitals/42");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let transport = HttpTransport::<Hospital>::new("http://host/admin/", "amachouApp").unwrap();
        let url = transport.endpoint(&[Hospital::RESOURCE]).unwrap();
        assert_eq!(url.as_str(), "http://host/admin/api/hospitals");
    }

    #[test]
    fn test_paged_search_url() {
        let transport = HttpTransport::<Hospital>::new("http://localhost:8080", "amachouApp").unwrap();
        let base = transport.endpoint(&["_search", Hospital::RESOURCE]).unwrap();
        let page = PageRequest::page(1).with_size(5).sorted_by("name", Direction::Asc);
        let url = HttpTransport::<Hospital>::paged(base, &page, Some("mary"));
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/_search/hospitals?query=mary&page=1&size=5&sort=name%2Casc"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpTransport::<Hospital>::new("not a url", "amachouApp").err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }
}
