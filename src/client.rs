// Copyright 2024 Dmitry Tantsur <dtantsur@protonmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Authenticated HTTP client and request builder.

use std::collections::HashMap;
use std::convert::TryFrom;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "stream")]
use futures::Stream;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Error as HttpError;
use log::{debug, trace};
use reqwest::{
    Body, Client, Method, RequestBuilder as HttpRequestBuilder, Response, StatusCode, Url,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use static_assertions::assert_eq_size;

use super::identity::Access;
use super::page::{Next, Page, PaginatedResource};
use super::services::VersionedService;
#[cfg(feature = "stream")]
use super::stream::paginated;
use super::{ApiVersion, AuthType, EndpointFilters, Error, ErrorKind};

/// Path of the endpoint itself, e.g. the account of Object Storage.
///
/// ```rust,no_run
/// # async fn example() -> Result<(), oscloud::Error> {
/// let session = oscloud::Session::from_env().await?;
/// let account = session
///     .head(oscloud::services::OBJECT_STORAGE, oscloud::client::NO_PATH)
///     .await?
///     .send()
///     .await?;
/// println!("{:?}", account.headers().get("x-account-object-count"));
/// # Ok(()) }
/// # #[tokio::main]
/// # async fn main() { example().await.unwrap(); }
/// ```
pub const NO_PATH: Option<&'static str> = None;

/// Headers that carry the request ID, in the order they are checked.
const REQUEST_ID_HEADERS: &[&str] = &[
    "x-openstack-request-id",
    "x-compute-request-id",
    "x-trans-id",
    "x-response-id",
];

/// An HTTP client paired with an authentication plugin.
///
/// Clones share the plugin, and with it the token cache.
#[derive(Debug, Clone)]
pub struct AuthenticatedClient {
    client: Client,
    auth: Arc<dyn AuthType>,
}

assert_eq_size!(AuthenticatedClient, Option<AuthenticatedClient>);

impl AuthenticatedClient {
    /// Create a client, authenticating immediately.
    pub async fn new<Auth: AuthType + 'static>(
        client: Client,
        auth_type: Auth,
    ) -> Result<AuthenticatedClient, Error> {
        auth_type.refresh(&client).await?;
        Ok(AuthenticatedClient::new_internal(
            client,
            Arc::new(auth_type),
        ))
    }

    #[inline]
    pub(crate) fn new_internal(client: Client, auth: Arc<dyn AuthType>) -> AuthenticatedClient {
        AuthenticatedClient { client, auth }
    }

    /// Authentication plugin in use.
    #[inline]
    pub fn auth_type(&self) -> &dyn AuthType {
        self.auth.as_ref()
    }

    /// Current token and catalog (if the plugin has them).
    #[inline]
    pub async fn access(&self) -> Result<Option<Access>, Error> {
        self.auth.access(&self.client).await
    }

    /// Find the endpoint of a service.
    #[inline]
    pub async fn get_endpoint(
        &self,
        service_type: &str,
        filters: &EndpointFilters,
    ) -> Result<Url, Error> {
        self.auth
            .get_endpoint(&self.client, service_type, filters)
            .await
    }

    /// The underlying unauthenticated client.
    #[inline]
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Renew the authentication for this client and all its clones.
    #[inline]
    pub async fn refresh(&self) -> Result<(), Error> {
        self.auth.refresh(&self.client).await
    }

    /// Replace the authentication plugin (not affecting the existing clones).
    #[inline]
    pub fn set_auth_type<Auth: AuthType + 'static>(&mut self, auth_type: Auth) {
        self.auth = Arc::new(auth_type);
    }

    /// Replace the underlying unauthenticated client.
    #[inline]
    pub fn set_inner(&mut self, client: Client) {
        self.client = client;
    }

    /// Start an authenticated request to an arbitrary URL.
    #[inline]
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.request_service((), method, url)
    }

    pub(crate) fn request_service<S>(
        &self,
        service: S,
        method: Method,
        url: Url,
    ) -> RequestBuilder<S> {
        RequestBuilder {
            inner: self.client.request(method, url),
            client: self.clone(),
            service,
        }
    }

    async fn execute(&self, request: HttpRequestBuilder) -> Result<Response, Error> {
        let request = self
            .auth
            .authenticate(&self.client, request)
            .await?
            .build()?;
        trace!("HTTP {} {}", request.method(), request.url());
        Ok(self.client.execute(request).await?)
    }

    #[cfg(test)]
    pub(crate) async fn new_noauth(endpoint: &str) -> AuthenticatedClient {
        AuthenticatedClient::new(Client::new(), crate::NoAuth::new(endpoint).unwrap())
            .await
            .unwrap()
    }
}

impl From<AuthenticatedClient> for Client {
    fn from(value: AuthenticatedClient) -> Client {
        value.client
    }
}

/// Builder of an authenticated request.
///
/// With a service as the type parameter `S`, API versions can be requested.
#[derive(Debug)]
#[must_use = "preparing a request is not enough to run it"]
pub struct RequestBuilder<S = ()> {
    inner: HttpRequestBuilder,
    client: AuthenticatedClient,
    service: S,
}

/// Error body as returned by various services.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fault {
    message: Option<String>,
    faultstring: Option<String>,
    title: Option<String>,
    // Rackspace services put a human-readable explanation here.
    details: Option<String>,
    validation_errors: Option<ValidationErrors>,
}

#[derive(Debug, Default, Deserialize)]
struct ValidationErrors {
    #[serde(default)]
    messages: Vec<String>,
}

impl Fault {
    fn into_message(self) -> Option<String> {
        let mut extra: Vec<String> = self
            .details
            .into_iter()
            .filter(|d| !d.is_empty())
            .collect();
        if let Some(validation) = self.validation_errors {
            extra.extend(validation.messages);
        }
        match self.message.or(self.faultstring).or(self.title) {
            Some(message) => {
                extra.retain(|x| x != &message);
                if extra.is_empty() {
                    Some(message)
                } else {
                    Some(format!("{} ({})", message, extra.join("; ")))
                }
            }
            None if extra.is_empty() => None,
            None => Some(extra.join("; ")),
        }
    }
}

/// Human-readable error message from an error body, falling back to the body itself.
///
/// The fault is either the body itself or wrapped into an object with a single key, e.g.
/// `{"itemNotFound": {"message": "...", "code": 404}}`.
fn extract_message(text: String) -> String {
    serde_json::from_str::<Fault>(&text)
        .ok()
        .and_then(Fault::into_message)
        .or_else(|| {
            serde_json::from_str::<HashMap<String, Fault>>(&text)
                .ok()
                .and_then(|map| map.into_values().find_map(Fault::into_message))
        })
        .unwrap_or(text)
}

fn request_id(response: &Response) -> Option<&str> {
    REQUEST_ID_HEADERS
        .iter()
        .find_map(|name| response.headers().get(*name))
        .and_then(|value| value.to_str().ok())
}

/// Convert an error status into an `Error`.
pub async fn check(response: Response) -> Result<Response, Error> {
    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        trace!("HTTP {} from {}", status, response.url());
        return Ok(response);
    }

    let request_id = request_id(&response).map(String::from);
    let text = response.text().await?;
    let message = if text.trim().is_empty() {
        status.canonical_reason().unwrap_or("Unknown error").to_string()
    } else {
        extract_message(text)
    };
    debug!(
        "HTTP {} (request ID {}): {}",
        status,
        request_id.as_deref().unwrap_or("unknown"),
        message
    );
    Err(Error::new(status.into(), message).with_status(status))
}

impl<S> RequestBuilder<S> {
    #[inline]
    fn map<F>(self, f: F) -> RequestBuilder<S>
    where
        F: FnOnce(HttpRequestBuilder) -> HttpRequestBuilder,
    {
        RequestBuilder {
            inner: f(self.inner),
            ..self
        }
    }

    /// Add a body to the request.
    pub fn body<T: Into<Body>>(self, body: T) -> RequestBuilder<S> {
        self.map(|inner| inner.body(body))
    }

    /// Add a header to the request.
    pub fn header<K, V>(self, key: K, value: V) -> RequestBuilder<S>
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<HttpError>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<HttpError>,
    {
        self.map(|inner| inner.header(key, value))
    }

    /// Add several headers to the request.
    pub fn headers(self, headers: HeaderMap) -> RequestBuilder<S> {
        self.map(|inner| inner.headers(headers))
    }

    /// Add a JSON body to the request.
    pub fn json<T: Serialize + ?Sized>(self, json: &T) -> RequestBuilder<S> {
        self.map(|inner| inner.json(json))
    }

    /// Add query parameters to the request.
    pub fn query<T: Serialize + ?Sized>(self, query: &T) -> RequestBuilder<S> {
        self.map(|inner| inner.query(query))
    }

    /// Override the client timeout for this request.
    pub fn timeout(self, timeout: Duration) -> RequestBuilder<S> {
        self.map(|inner| inner.timeout(timeout))
    }

    /// Forget the service of the request.
    pub fn into_untyped(self) -> RequestBuilder {
        RequestBuilder {
            inner: self.inner,
            client: self.client,
            service: (),
        }
    }

    /// Replace the URL (including the query) keeping everything else.
    pub(crate) fn with_url(self, url: Url) -> Result<RequestBuilder<S>, Error> {
        let (client, request) = self.inner.build_split();
        let mut request = request?;
        *request.url_mut() = url;
        Ok(RequestBuilder {
            inner: HttpRequestBuilder::from_parts(client, request),
            ..self
        })
    }

    /// Send the request and parse the JSON response.
    pub async fn fetch_json<T>(self) -> Result<T, Error>
    where
        T: DeserializeOwned + Send,
    {
        Ok(self.send().await?.json::<T>().await?)
    }

    /// Send the request and convert error statuses into errors.
    ///
    /// On HTTP 401 the authentication is refreshed and the request is repeated once, unless
    /// it has a streaming body.
    pub async fn send(self) -> Result<Response, Error> {
        let RequestBuilder { inner, client, .. } = self;
        let retry = inner.try_clone();
        let response = client.execute(inner).await?;
        match retry {
            Some(retry) if response.status() == StatusCode::UNAUTHORIZED => {
                debug!(
                    "Token rejected by {}, re-authenticating and retrying once",
                    response.url()
                );
                client.refresh().await?;
                check(client.execute(retry).await?).await
            }
            _ => check(response).await,
        }
    }

    /// Send the request, leaving the status to the caller.
    pub async fn send_unchecked(self) -> Result<Response, Error> {
        self.client.execute(self.inner).await
    }

    /// Send the request and receive the first page of resources.
    ///
    /// The [Page](../struct.Page.html) knows how to request the next one.
    pub async fn fetch_page<T>(
        self,
        limit: Option<usize>,
        marker: Option<<T as PaginatedResource>::Id>,
    ) -> Result<Page<T>, Error>
    where
        T: PaginatedResource,
    {
        Page::fetch(self.into_untyped(), limit, marker.map(Next::Marker)).await
    }

    /// Stream resources from all pages, requesting them lazily.
    ///
    /// ```rust,no_run
    /// # async fn example() -> Result<(), oscloud::Error> {
    /// use futures::pin_mut;
    /// use futures::stream::TryStreamExt;
    /// use serde::Deserialize;
    ///
    /// #[derive(Debug, Deserialize, oscloud::PaginatedResource)]
    /// #[collection_name = "loadBalancers"]
    /// pub struct LoadBalancer {
    ///     #[resource_id]
    ///     pub id: u64,
    ///     pub name: String,
    /// }
    ///
    /// let session = oscloud::Session::from_env().await?;
    /// let balancers = session
    ///     .get(oscloud::services::LOAD_BALANCER, &["loadbalancers"])
    ///     .await?
    ///     .fetch_paginated::<LoadBalancer>(Some(50), None);
    ///
    /// pin_mut!(balancers);
    /// while let Some(lb) = balancers.try_next().await? {
    ///     println!("{} {}", lb.id, lb.name);
    /// }
    /// # Ok(()) }
    /// # #[tokio::main]
    /// # async fn main() { example().await.unwrap(); }
    /// ```
    ///
    /// Iteration fails with `InvalidInput` if the request has a streaming body.
    #[cfg(feature = "stream")]
    pub fn fetch_paginated<T>(
        self,
        limit: Option<usize>,
        marker: Option<<T as PaginatedResource>::Id>,
    ) -> impl Stream<Item = Result<T, Error>>
    where
        T: PaginatedResource,
    {
        paginated(self.into_untyped(), limit, marker)
    }
}

impl<S: VersionedService> RequestBuilder<S> {
    /// Request an API version (microversion) of the service.
    pub fn api_version<A: Into<ApiVersion>>(self, version: A) -> RequestBuilder<S> {
        let header = self.service.version_header();
        let value = version.into().to_string();
        self.map(|inner| inner.header(header, value))
    }

    /// Request an API version in place.
    pub fn set_api_version<A: Into<ApiVersion>>(&mut self, version: A) {
        take_mut::take(self, |rb| rb.api_version(version));
    }
}

impl<S: Clone> RequestBuilder<S> {
    /// Clone the request, failing with `InvalidInput` for streaming bodies.
    pub fn try_clone(&self) -> Result<RequestBuilder<S>, Error> {
        let inner = self.inner.try_clone().ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidInput,
                "Requests with a streaming body cannot be repeated",
            )
        })?;
        Ok(RequestBuilder {
            inner,
            client: self.client.clone(),
            service: self.service.clone(),
        })
    }
}

#[cfg(test)]
mod test {
    use http::Method;
    use reqwest::Url;

    use super::{extract_message, AuthenticatedClient};
    use crate::services;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_api_version() {
        let client = AuthenticatedClient::new_noauth("http://127.0.0.1").await;
        let rb = client
            .request_service(services::COMPUTE, Method::GET, url("http://127.0.0.1"))
            .api_version((2, 42));
        let req = rb.inner.build().unwrap();
        assert_eq!(req.headers()["x-openstack-nova-api-version"], "2.42");

        let mut rb =
            client.request_service(services::COMPUTE, Method::GET, url("http://127.0.0.1"));
        rb.set_api_version((2, 1));
        let req = rb.inner.build().unwrap();
        assert_eq!(req.headers()["x-openstack-nova-api-version"], "2.1");
    }

    #[tokio::test]
    async fn test_with_url_keeps_headers() {
        let rb = AuthenticatedClient::new_noauth("http://127.0.0.1")
            .await
            .request(Method::GET, url("http://127.0.0.1/v1.0/123/domains"))
            .query(&[("limit", 2)])
            .header("x-test", "value")
            .with_url(url(
                "http://127.0.0.1/v1.0/123/domains?limit=2&offset=2",
            ))
            .unwrap();
        let req = rb.inner.build().unwrap();
        assert_eq!(
            req.url().as_str(),
            "http://127.0.0.1/v1.0/123/domains?limit=2&offset=2"
        );
        assert_eq!(req.headers()["x-test"], "value");
    }

    #[tokio::test]
    async fn test_try_clone() {
        let rb = AuthenticatedClient::new_noauth("http://127.0.0.1")
            .await
            .request(Method::PUT, url("http://127.0.0.1/v1/AUTH_1/c/o"))
            .body("static body");
        assert!(rb.try_clone().is_ok());
    }

    #[test]
    fn test_extract_message() {
        let cases = [
            (
                "<html><body>I failed</body></html>",
                "<html><body>I failed</body></html>",
            ),
            (r#"{"message": "I failed"}"#, "I failed"),
            (r#"{"faultstring": "I failed"}"#, "I failed"),
            (
                r#"{"itemNotFound": {"message": "Server not found", "code": 404}}"#,
                "Server not found",
            ),
            (
                r#"{"message": "Validation Failure", "code": 400,
                    "details": "Must provide at least one virtual IP"}"#,
                "Validation Failure (Must provide at least one virtual IP)",
            ),
            (
                r#"{"validationErrors": {"messages": ["Port must be between 1 and 65535"]},
                    "message": "Validation Failure", "code": 400, "details": ""}"#,
                "Validation Failure (Port must be between 1 and 65535)",
            ),
            (r#"{"code": 500}"#, r#"{"code": 500}"#),
        ];
        for (body, expected) in cases.iter() {
            assert_eq!(extract_message(body.to_string()), *expected);
        }
    }
}
