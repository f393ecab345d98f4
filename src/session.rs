// Copyright 2019 Dmitry Tantsur <divius.inside@gmail.com>
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

//! Session structure definition.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use log::trace;
use reqwest::{Client, Method, Url};

use super::cache::EndpointCache;
use super::client::{AuthenticatedClient, RequestBuilder};
use super::loading;
use super::protocol::ServiceInfo;
use super::services::ServiceType;
use super::url;
use super::{Adapter, ApiVersion, AuthType, EndpointFilters, Error, InterfaceType};

/// An authenticated session with a cloud.
///
/// The session object serves as a wrapper around an [authentication type](trait.AuthType.html),
/// providing convenient methods to make HTTP requests and work with microversions.
///
/// # Note
///
/// All clones of one session share the same authentication and endpoint cache. Use
/// [with_auth_type](#method.with_auth_type) to detach a session.
#[derive(Debug, Clone)]
pub struct Session {
    client: AuthenticatedClient,
    endpoint_cache: Arc<EndpointCache>,
}

impl Session {
    /// Create a new session with a given authentication plugin.
    ///
    /// The resulting session will use the default endpoint interface (usually,
    /// public).
    pub async fn new<Auth: AuthType + 'static>(auth_type: Auth) -> Result<Session, Error> {
        let client = AuthenticatedClient::new(Client::new(), auth_type).await?;
        Ok(Session::new_with_authenticated_client(client))
    }

    /// Create a new session with a given authenticated client.
    pub fn new_with_authenticated_client(client: AuthenticatedClient) -> Session {
        Session {
            client,
            endpoint_cache: Arc::new(EndpointCache::new()),
        }
    }

    /// Create a new session with a given authentication plugin and an HTTP client.
    ///
    /// The resulting session will use the default endpoint interface (usually,
    /// public).
    pub async fn new_with_client<Auth: AuthType + 'static>(
        client: Client,
        auth_type: Auth,
    ) -> Result<Session, Error> {
        let client = AuthenticatedClient::new(client, auth_type).await?;
        Ok(Session::new_with_authenticated_client(client))
    }

    /// Create a `Session` from a `clouds.yaml` configuration file.
    ///
    /// See [openstacksdk
    /// documentation](https://docs.openstack.org/openstacksdk/latest/user/guides/connect_from_config.html)
    /// for detailed information on the format of the configuration file.
    ///
    /// The `cloud_name` argument is a name of the cloud entry to use.
    ///
    /// Supported authentication types are `password`, `v3token`, `v2password`, `v2apikey`,
    /// `v2accesskey`, `v2token` and `none`.
    #[inline]
    pub async fn from_config<S: AsRef<str>>(cloud_name: S) -> Result<Session, Error> {
        loading::from_config(cloud_name)?.create_session().await
    }

    /// Create a `Session` from environment variables.
    ///
    /// Supports the same authentication types as [from_config](#method.from_config).
    ///
    /// Understands the following variables:
    /// * `OS_CLOUD` (equivalent to calling [from_config](#method.from_config) with the given cloud).
    /// * `OS_AUTH_TYPE` (defaults to `v3token` if `OS_TOKEN` is provided otherwise to `password`
    ///   or to `v2password`/`v2apikey` for Rackspace and HP).
    /// * `OS_AUTH_URL` for all authentication types except for `none`.
    /// * `OS_ENDPOINT` for `none` authentication.
    /// * `OS_USERNAME` and `OS_PASSWORD` for password authentication, `OS_API_KEY` for API key
    ///   authentication.
    /// * `OS_USER_ID`, `OS_USER_DOMAIN_NAME`, `OS_PROJECT_ID`, `OS_PROJECT_NAME`,
    ///   `OS_PROJECT_DOMAIN_ID`, `OS_PROJECT_DOMAIN_NAME` for Identity V3.
    /// * `OS_TENANT_ID`, `OS_TENANT_NAME` for Identity V2.
    /// * `OS_TOKEN` for token authentication.
    /// * `OS_REGION_NAME` and `OS_INTERFACE` for endpoint selection.
    /// * `OS_VENDOR` (`openstack`, `rackspace` or `hp`), `OS_PROXY` and `OS_CACERT`.
    #[inline]
    pub async fn from_env() -> Result<Session, Error> {
        loading::from_env()?.create_session().await
    }

    /// Create a `Session` from a named entry of a JSON credentials file.
    ///
    /// See [CredentialsFile](struct.CredentialsFile.html) for the format.
    #[inline]
    pub async fn from_credentials_file<P, S>(path: P, name: S) -> Result<Session, Error>
    where
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        loading::CredentialsFile::from_file(path)?
            .get(name)?
            .create_session()
            .await
    }

    /// Create an adapter for the specific service type.
    ///
    /// The new `Adapter` will share the same authentication and will initially use the same
    /// endpoint interface (although it can be changed later without affecting the `Session`).
    ///
    /// If you don't need the `Session` any more, using [into_adapter](#method.into_adapter) is a
    /// bit more efficient.
    ///
    /// ```rust,no_run
    /// # async fn example() -> Result<(), oscloud::Error> {
    /// let session = oscloud::Session::from_env().await?;
    /// let adapter = session.adapter(oscloud::services::COMPUTE);
    /// # Ok(()) }
    /// # #[tokio::main]
    /// # async fn main() { example().await.unwrap(); }
    /// ```
    #[inline]
    pub fn adapter<Srv>(&self, service: Srv) -> Adapter<Srv> {
        Adapter::from_session(self.clone(), service)
    }

    /// Create an adapter for the specific service type.
    ///
    /// The new `Adapter` will share the same authentication and will initially use the same
    /// endpoint interface (although it can be changed later without affecting the `Session`).
    #[inline]
    pub fn into_adapter<Srv>(self, service: Srv) -> Adapter<Srv> {
        Adapter::from_session(self, service)
    }

    /// Get a reference to the authentication type in use.
    #[inline]
    pub fn auth_type(&self) -> &dyn AuthType {
        self.client.auth_type()
    }

    /// Get a reference to the authenticated client in use.
    #[inline]
    pub fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    /// Endpoint filters in use.
    #[inline]
    pub fn endpoint_filters(&self) -> &EndpointFilters {
        &self.endpoint_cache.filters
    }

    /// Modify endpoint filters.
    ///
    /// This call clears the cached service information for this `Session`.
    /// It does not, however, affect clones of this `Session`.
    pub fn endpoint_filters_mut(&mut self) -> &mut EndpointFilters {
        &mut self.reset_cache().filters
    }

    /// Endpoint overrides in use.
    #[inline]
    pub fn endpoint_overrides(&self) -> &HashMap<String, Url> {
        &self.endpoint_cache.overrides
    }

    /// Modify endpoint overrides.
    ///
    /// This call clears the cached service information for this `Session`.
    /// It does not, however, affect clones of this `Session`.
    pub fn endpoint_overrides_mut(&mut self) -> &mut HashMap<String, Url> {
        &mut self.reset_cache().overrides
    }

    /// Update the authentication and purges cached endpoint information.
    ///
    /// # Warning
    ///
    /// Authentication will also be updated for clones of this `Session`, since they share the same
    /// authentication object.
    #[inline]
    pub async fn refresh(&mut self) -> Result<(), Error> {
        let _ = self.reset_cache();
        self.client.refresh().await
    }

    /// Set a new authentication for this `Session`.
    ///
    /// This call clears the cached service information for this `Session`.
    /// It does not, however, affect clones of this `Session`.
    #[inline]
    pub fn set_auth_type<Auth: AuthType + 'static>(&mut self, auth_type: Auth) {
        let _ = self.reset_cache();
        self.client.set_auth_type(auth_type);
    }

    /// A convenience call to set an endpoint interface.
    ///
    /// This call clears the cached service information for this `Session`.
    /// It does not, however, affect clones of this `Session`.
    #[inline]
    pub fn set_endpoint_interface(&mut self, endpoint_interface: InterfaceType) {
        self.endpoint_filters_mut()
            .set_interfaces(endpoint_interface);
    }

    /// Set endpoint filters.
    ///
    /// This call clears the cached service information for this `Session`.
    /// It does not, however, affect clones of this `Session`.
    #[inline]
    pub fn set_endpoint_filters(&mut self, filters: EndpointFilters) {
        *self.endpoint_filters_mut() = filters;
    }

    /// Set an override for the endpoint of the service type (or one of its aliases).
    ///
    /// This call clears the cached service information for this `Session`.
    /// It does not, however, affect clones of this `Session`.
    #[inline]
    pub fn set_endpoint_override<S: Into<String>>(&mut self, service_type: S, url: Url) {
        let _ = self
            .endpoint_overrides_mut()
            .insert(service_type.into(), url);
    }

    /// A convenience call to set a region.
    ///
    /// This call clears the cached service information for this `Session`.
    /// It does not, however, affect clones of this `Session`.
    #[inline]
    pub fn set_region<T: Into<String>>(&mut self, region: T) {
        self.endpoint_filters_mut().set_region(region);
    }

    /// Convert this session into one using the given authentication.
    #[inline]
    pub fn with_auth_type<Auth: AuthType + 'static>(mut self, auth_method: Auth) -> Session {
        self.set_auth_type(auth_method);
        self
    }

    /// Convert this session into one using the given endpoint interface.
    #[inline]
    pub fn with_endpoint_interface(mut self, endpoint_interface: InterfaceType) -> Session {
        self.set_endpoint_interface(endpoint_interface);
        self
    }

    /// Convert this session into one using the given endpoint filters.
    #[inline]
    pub fn with_endpoint_filters(mut self, filters: EndpointFilters) -> Session {
        self.set_endpoint_filters(filters);
        self
    }

    /// Convert this session into one using the given endpoint override.
    #[inline]
    pub fn with_endpoint_override<S: Into<String>>(mut self, service_type: S, url: Url) -> Session {
        self.set_endpoint_override(service_type, url);
        self
    }

    /// Convert this session into one using the given region.
    #[inline]
    pub fn with_region<T: Into<String>>(mut self, region: T) -> Session {
        self.set_region(region);
        self
    }

    /// Get minimum/maximum API (micro)version information.
    ///
    /// Returns `None` if the range cannot be determined, which usually means
    /// that microversioning is not supported.
    ///
    /// ```rust,no_run
    /// # async fn example() -> Result<(), oscloud::Error> {
    /// let session = oscloud::Session::from_env().await?;
    /// let maybe_versions = session
    ///     .get_api_versions(oscloud::services::COMPUTE)
    ///     .await?;
    /// if let Some((min, max)) = maybe_versions {
    ///     println!("The compute service supports versions {} to {}", min, max);
    /// } else {
    ///     println!("The compute service does not support microversioning");
    /// }
    /// # Ok(()) }
    /// # #[tokio::main]
    /// # async fn main() { example().await.unwrap(); }
    /// ```
    pub async fn get_api_versions<Srv: ServiceType + Sync>(
        &self,
        service: Srv,
    ) -> Result<Option<(ApiVersion, ApiVersion)>, Error> {
        self.extract_service_info(&service, |info| {
            match (info.minimum_version, info.current_version) {
                (Some(min), Some(max)) => Some((min, max)),
                _ => None,
            }
        })
        .await
    }

    /// Construct an endpoint for the given service from the path.
    ///
    /// You won't need to use this call most of the time, since all request calls can fetch the
    /// endpoint automatically.
    #[inline]
    pub async fn get_endpoint<Srv, I>(&self, service: Srv, path: I) -> Result<Url, Error>
    where
        Srv: ServiceType + Sync,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.endpoint_for(&service, path).await
    }

    /// Get the currently used major version from the given service.
    ///
    /// Can return `None` if the service does not support API version discovery at all.
    pub async fn get_major_version<Srv: ServiceType + Sync>(
        &self,
        service: Srv,
    ) -> Result<Option<ApiVersion>, Error> {
        self.extract_service_info(&service, |info| info.major_version)
            .await
    }

    /// Pick the highest API version supported by the service.
    ///
    /// Returns `None` if none of the requested versions are available.
    ///
    /// ```rust,no_run
    /// # async fn example() -> Result<(), oscloud::Error> {
    /// let session = oscloud::Session::from_env().await?;
    /// let candidates = vec![oscloud::ApiVersion(2, 1), oscloud::ApiVersion(2, 42)];
    /// let maybe_version = session
    ///     .pick_api_version(oscloud::services::COMPUTE, candidates)
    ///     .await?;
    ///
    /// let request = session.get(oscloud::services::COMPUTE, &["servers"]).await?;
    /// let response = if let Some(version) = maybe_version {
    ///     println!("Using version {}", version);
    ///     request.api_version(version)
    /// } else {
    ///     println!("Using the base version");
    ///     request
    /// }.send().await?;
    /// # Ok(()) }
    /// # #[tokio::main]
    /// # async fn main() { example().await.unwrap(); }
    /// ```
    pub async fn pick_api_version<Srv, I>(
        &self,
        service: Srv,
        versions: I,
    ) -> Result<Option<ApiVersion>, Error>
    where
        Srv: ServiceType + Sync,
        I: IntoIterator<Item = ApiVersion>,
        I::IntoIter: Send,
    {
        let vers = versions.into_iter();
        if vers.size_hint().1 == Some(0) {
            return Ok(None);
        }
        self.extract_service_info(&service, |info| {
            vers.filter(|item| info.supports_api_version(*item)).max()
        })
        .await
    }

    /// Check if the service supports the API version.
    pub async fn supports_api_version<Srv: ServiceType + Sync>(
        &self,
        service: Srv,
        version: ApiVersion,
    ) -> Result<bool, Error> {
        self.pick_api_version(service, Some(version))
            .await
            .map(|x| x.is_some())
    }

    /// Make an HTTP request to the given service.
    ///
    /// The `service` argument is an object implementing the
    /// [ServiceType](services/trait.ServiceType.html) trait. Some known service types are available
    /// in the [services](services/index.html) module.
    ///
    /// The `path` argument is a URL path without the service endpoint (e.g. `/servers/1234`).
    /// Path components are percent-encoded.
    ///
    /// The result is a `RequestBuilder` that can be customized further.
    ///
    /// ```rust,no_run
    /// # async fn example() -> Result<(), oscloud::Error> {
    /// use reqwest::Method;
    ///
    /// let session = oscloud::Session::from_env().await?;
    /// let response = session
    ///     .request(oscloud::services::COMPUTE, Method::HEAD, &["servers", "1234"])
    ///     .await?
    ///     .send()
    ///     .await?;
    /// println!("Response: {:?}", response);
    /// # Ok(()) }
    /// # #[tokio::main]
    /// # async fn main() { example().await.unwrap(); }
    /// ```
    ///
    /// This is the most generic call to make a request. You may prefer to use more specific `get`,
    /// `post`, `put` or `delete` calls instead.
    pub async fn request<Srv, I>(
        &self,
        service: Srv,
        method: Method,
        path: I,
    ) -> Result<RequestBuilder<Srv>, Error>
    where
        Srv: ServiceType + Sync,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let url = self.endpoint_for(&service, path).await?;
        trace!(
            "Sending HTTP {} request to {} for service {}",
            method,
            url,
            service.catalog_type()
        );
        Ok(self.client.request_service(service, method, url))
    }

    /// Start a GET request.
    ///
    /// See [request](#method.request) for an explanation of the parameters.
    #[inline]
    pub async fn get<Srv, I>(&self, service: Srv, path: I) -> Result<RequestBuilder<Srv>, Error>
    where
        Srv: ServiceType + Sync,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.request(service, Method::GET, path).await
    }

    /// Start a HEAD request.
    ///
    /// See [request](#method.request) for an explanation of the parameters.
    #[inline]
    pub async fn head<Srv, I>(&self, service: Srv, path: I) -> Result<RequestBuilder<Srv>, Error>
    where
        Srv: ServiceType + Sync,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.request(service, Method::HEAD, path).await
    }

    /// Start a POST request.
    ///
    /// See [request](#method.request) for an explanation of the parameters.
    #[inline]
    pub async fn post<Srv, I>(&self, service: Srv, path: I) -> Result<RequestBuilder<Srv>, Error>
    where
        Srv: ServiceType + Sync,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.request(service, Method::POST, path).await
    }

    /// Start a PUT request.
    ///
    /// See [request](#method.request) for an explanation of the parameters.
    #[inline]
    pub async fn put<Srv, I>(&self, service: Srv, path: I) -> Result<RequestBuilder<Srv>, Error>
    where
        Srv: ServiceType + Sync,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.request(service, Method::PUT, path).await
    }

    /// Start a PATCH request.
    ///
    /// See [request](#method.request) for an explanation of the parameters.
    #[inline]
    pub async fn patch<Srv, I>(&self, service: Srv, path: I) -> Result<RequestBuilder<Srv>, Error>
    where
        Srv: ServiceType + Sync,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.request(service, Method::PATCH, path).await
    }

    /// Start a DELETE request.
    ///
    /// See [request](#method.request) for an explanation of the parameters.
    #[inline]
    pub async fn delete<Srv, I>(&self, service: Srv, path: I) -> Result<RequestBuilder<Srv>, Error>
    where
        Srv: ServiceType + Sync,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.request(service, Method::DELETE, path).await
    }

    async fn endpoint_for<Srv, I>(&self, service: &Srv, path: I) -> Result<Url, Error>
    where
        Srv: ServiceType + Sync,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let endpoint = self
            .extract_service_info(service, |info| info.root_url.clone())
            .await?;
        url::extend(endpoint, path)
    }

    /// Detach the endpoint cache from clones and drop the cached service information.
    fn reset_cache(&mut self) -> &mut EndpointCache {
        Arc::make_mut(&mut self.endpoint_cache).clear()
    }

    #[inline]
    async fn extract_service_info<Srv, F, T>(&self, service: &Srv, filter: F) -> Result<T, Error>
    where
        Srv: ServiceType + Sync,
        F: FnOnce(&ServiceInfo) -> T + Send,
        T: Send,
    {
        self.endpoint_cache
            .extract_service_info(&self.client, service, filter)
            .await
    }
}
