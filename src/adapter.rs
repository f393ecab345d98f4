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

//! Adapter for a specific service.

use reqwest::{Method, Url};

use super::client::RequestBuilder;
use super::services::ServiceType;
use super::{ApiVersion, AuthType, EndpointFilters, Error, InterfaceType, Session};

/// Adapter for a specific service.
///
/// An `Adapter` is very similar to a [Session](struct.Session.html), but is tied to a specific
/// service, and thus does not require passing a `service` argument to all calls.
///
/// Service clients wrap an adapter, so its `with_region`, `with_endpoint_interface` and
/// `with_auth_type` calls are how per-call region and identity overrides are expressed.
#[derive(Debug, Clone)]
pub struct Adapter<Srv> {
    service: Srv,
    session: Session,
    default_api_version: Option<ApiVersion>,
}

impl<Srv> From<Adapter<Srv>> for Session {
    fn from(value: Adapter<Srv>) -> Session {
        value.session
    }
}

impl<Srv> Adapter<Srv> {
    /// Create a new adapter with a given authentication plugin.
    pub async fn new<Auth: AuthType + 'static>(
        auth_type: Auth,
        service: Srv,
    ) -> Result<Adapter<Srv>, Error> {
        Ok(Session::new(auth_type).await?.into_adapter(service))
    }

    /// Create a new adapter from a `Session`.
    #[inline]
    pub fn from_session(session: Session, service: Srv) -> Adapter<Srv> {
        Adapter {
            service,
            session,
            default_api_version: None,
        }
    }

    /// Create a new adapter from a `clouds.yaml` configuration file.
    ///
    /// See [Session::from_config](struct.Session.html#method.from_config) for details.
    #[inline]
    pub async fn from_config<S: AsRef<str>>(
        cloud_name: S,
        service: Srv,
    ) -> Result<Adapter<Srv>, Error> {
        Ok(Session::from_config(cloud_name).await?.into_adapter(service))
    }

    /// Create a new adapter with information from environment variables.
    ///
    /// See [Session::from_env](struct.Session.html#method.from_env) for details.
    #[inline]
    pub async fn from_env(service: Srv) -> Result<Adapter<Srv>, Error> {
        Ok(Session::from_env().await?.into_adapter(service))
    }

    /// Get a reference to the authentication type in use.
    #[inline]
    pub fn auth_type(&self) -> &dyn AuthType {
        self.session.auth_type()
    }

    /// Default API version used when no version is specified.
    #[inline]
    pub fn default_api_version(&self) -> Option<ApiVersion> {
        self.default_api_version
    }

    /// Endpoint filters in use.
    #[inline]
    pub fn endpoint_filters(&self) -> &EndpointFilters {
        self.session.endpoint_filters()
    }

    /// Modify endpoint filters.
    ///
    /// This call clears the cached service information for this `Adapter`.
    /// It does not, however, affect clones of this `Adapter`.
    #[inline]
    pub fn endpoint_filters_mut(&mut self) -> &mut EndpointFilters {
        self.session.endpoint_filters_mut()
    }

    /// Update the authentication and purges cached endpoint information.
    ///
    /// # Warning
    ///
    /// Authentication will also be updated for clones of this `Adapter` and its parent `Session`,
    /// since they share the same authentication object.
    #[inline]
    pub async fn refresh(&mut self) -> Result<(), Error> {
        self.session.refresh().await
    }

    /// Session used for this adapter.
    #[inline]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Service the adapter is bound to.
    #[inline]
    pub fn service(&self) -> &Srv {
        &self.service
    }

    /// Set a new authentication for this `Adapter`.
    ///
    /// This call clears the cached service information for this `Adapter`.
    /// It does not, however, affect clones of this `Adapter`.
    #[inline]
    pub fn set_auth_type<Auth: AuthType + 'static>(&mut self, auth_type: Auth) {
        self.session.set_auth_type(auth_type)
    }

    /// Set the default API version.
    ///
    /// This version will be used when no version is specified. No checks are done against this
    /// version inside of this call. If it is not valid, the subsequent `request` calls will fail.
    #[inline]
    pub fn set_default_api_version(&mut self, api_version: Option<ApiVersion>) {
        self.default_api_version = api_version;
    }

    /// A convenience call to set an endpoint interface.
    ///
    /// This call clears the cached service information for this `Adapter`.
    /// It does not, however, affect clones of this `Adapter`.
    #[inline]
    pub fn set_endpoint_interface(&mut self, endpoint_interface: InterfaceType) {
        self.session.set_endpoint_interface(endpoint_interface);
    }

    /// Set an override for the endpoint of this service.
    ///
    /// This call clears the cached service information for this `Adapter`.
    /// It does not, however, affect clones of this `Adapter`.
    #[inline]
    pub fn set_endpoint_override(&mut self, url: Url)
    where
        Srv: ServiceType,
    {
        let catalog_type = self.service.catalog_type();
        self.session.set_endpoint_override(catalog_type, url);
    }

    /// A convenience call to set a region.
    ///
    /// This call clears the cached service information for this `Adapter`.
    /// It does not, however, affect clones of this `Adapter`.
    #[inline]
    pub fn set_region<T: Into<String>>(&mut self, region: T) {
        self.session.set_region(region);
    }

    /// Convert this adapter into one using the given authentication.
    #[inline]
    pub fn with_auth_type<Auth: AuthType + 'static>(mut self, auth_method: Auth) -> Self {
        self.set_auth_type(auth_method);
        self
    }

    /// Convert this adapter into one using the given default API version.
    #[inline]
    pub fn with_default_api_version(mut self, api_version: Option<ApiVersion>) -> Self {
        self.set_default_api_version(api_version);
        self
    }

    /// Convert this adapter into one using the given endpoint interface.
    #[inline]
    pub fn with_endpoint_interface(mut self, endpoint_interface: InterfaceType) -> Self {
        self.set_endpoint_interface(endpoint_interface);
        self
    }

    /// Convert this adapter into one using the given endpoint override.
    #[inline]
    pub fn with_endpoint_override(mut self, url: Url) -> Self
    where
        Srv: ServiceType,
    {
        self.set_endpoint_override(url);
        self
    }

    /// Convert this adapter into one using the given region.
    #[inline]
    pub fn with_region<T: Into<String>>(mut self, region: T) -> Self {
        self.set_region(region);
        self
    }
}

impl<Srv> Adapter<Srv>
where
    Srv: ServiceType + Clone + Sync,
{
    /// Get minimum/maximum API (micro)version information.
    ///
    /// Returns `None` if the range cannot be determined, which usually means
    /// that microversioning is not supported.
    #[inline]
    pub async fn get_api_versions(&self) -> Result<Option<(ApiVersion, ApiVersion)>, Error> {
        self.session.get_api_versions(self.service.clone()).await
    }

    /// Construct an endpoint from the path.
    ///
    /// You won't need to use this call most of the time, since all request calls can fetch the
    /// endpoint automatically.
    #[inline]
    pub async fn get_endpoint<I>(&self, path: I) -> Result<Url, Error>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.session.get_endpoint(self.service.clone(), path).await
    }

    /// Get the currently used major version from the given service.
    ///
    /// Can return `None` if the service does not support API version discovery at all.
    #[inline]
    pub async fn get_major_version(&self) -> Result<Option<ApiVersion>, Error> {
        self.session.get_major_version(self.service.clone()).await
    }

    /// Pick the highest API version supported by the service.
    ///
    /// Returns `None` if none of the requested versions are available.
    #[inline]
    pub async fn pick_api_version<I>(&self, versions: I) -> Result<Option<ApiVersion>, Error>
    where
        I: IntoIterator<Item = ApiVersion>,
        I::IntoIter: Send,
    {
        self.session
            .pick_api_version(self.service.clone(), versions)
            .await
    }

    /// Check if the service supports the API version.
    #[inline]
    pub async fn supports_api_version(&self, version: ApiVersion) -> Result<bool, Error> {
        self.session
            .supports_api_version(self.service.clone(), version)
            .await
    }

    /// Make an HTTP request.
    ///
    /// The `path` argument is a URL path without the service endpoint (e.g. `/servers/1234`).
    ///
    /// If the service supports API versions and a default version is set, it is sent with the
    /// request. It can be overridden by calling `api_version` on the resulting builder.
    pub async fn request<I>(&self, method: Method, path: I) -> Result<RequestBuilder<Srv>, Error>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let builder = self
            .session
            .request(self.service.clone(), method, path)
            .await?;
        Ok(
            match (self.default_api_version, self.service.api_version_header()) {
                (Some(version), Some(header)) => builder.header(header, version.to_string()),
                _ => builder,
            },
        )
    }

    /// Start a GET request.
    #[inline]
    pub async fn get<I>(&self, path: I) -> Result<RequestBuilder<Srv>, Error>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.request(Method::GET, path).await
    }

    /// Start a HEAD request.
    #[inline]
    pub async fn head<I>(&self, path: I) -> Result<RequestBuilder<Srv>, Error>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.request(Method::HEAD, path).await
    }

    /// Start a POST request.
    #[inline]
    pub async fn post<I>(&self, path: I) -> Result<RequestBuilder<Srv>, Error>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.request(Method::POST, path).await
    }

    /// Start a PUT request.
    #[inline]
    pub async fn put<I>(&self, path: I) -> Result<RequestBuilder<Srv>, Error>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.request(Method::PUT, path).await
    }

    /// Start a PATCH request.
    #[inline]
    pub async fn patch<I>(&self, path: I) -> Result<RequestBuilder<Srv>, Error>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.request(Method::PATCH, path).await
    }

    /// Start a DELETE request.
    #[inline]
    pub async fn delete<I>(&self, path: I) -> Result<RequestBuilder<Srv>, Error>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.request(Method::DELETE, path).await
    }
}

#[cfg(test)]
pub(crate) mod test {
    use reqwest::Url;

    use crate::services::{COMPUTE, OBJECT_STORAGE};
    use crate::session::test::new_session;
    use crate::ApiVersion;

    #[tokio::test]
    async fn test_adapter_get_endpoint() {
        let adapter = new_session("http://127.0.0.1/v1/AUTH_test")
            .await
            .into_adapter(OBJECT_STORAGE);
        let ep = adapter.get_endpoint(&["container"]).await.unwrap();
        assert_eq!(ep.as_str(), "http://127.0.0.1/v1/AUTH_test/container");
    }

    #[tokio::test]
    async fn test_adapter_override() {
        let adapter = new_session("http://127.0.0.1/v1/AUTH_test")
            .await
            .adapter(OBJECT_STORAGE)
            .with_endpoint_override(Url::parse("http://other/v1/AUTH_x").unwrap());
        let ep = adapter.get_endpoint(&["c"]).await.unwrap();
        assert_eq!(ep.as_str(), "http://other/v1/AUTH_x/c");
    }

    #[tokio::test]
    async fn test_adapter_default_version() {
        let adapter = new_session("http://127.0.0.1/v2.1")
            .await
            .into_adapter(COMPUTE)
            .with_default_api_version(Some(ApiVersion(2, 10)));
        assert_eq!(adapter.default_api_version(), Some(ApiVersion(2, 10)));
        let adapter = adapter.with_region("DFW");
        assert_eq!(adapter.endpoint_filters().region.as_deref(), Some("DFW"));
    }
}
