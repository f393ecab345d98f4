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

//! Authentication using Identity API V2.
//!
//! Identity V2 is deprecated upstream but remains the only option for Rackspace and HP clouds.

use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, IntoUrl, RequestBuilder, Url};

use super::internal::{AuthBody, Internal};
use super::protocol::{AuthV2, AuthV2Root, CredentialsV2};
use super::{Access, Identity};
use crate::{AuthType, EndpointFilters, Error, ErrorKind, Vendor};

/// Credentials for Identity V2.
#[derive(Clone)]
pub enum Credentials {
    /// User name and password.
    Password {
        /// User name.
        username: String,
        /// Password.
        password: String,
    },
    /// User name and API key (Rackspace).
    ApiKey {
        /// User name.
        username: String,
        /// API key.
        api_key: String,
    },
    /// Access key and secret key (HP).
    AccessKey {
        /// Access key.
        access_key: String,
        /// Secret key.
        secret_key: String,
    },
    /// An existing token.
    Token(String),
}

impl Credentials {
    /// User name and password.
    pub fn password<S1: Into<String>, S2: Into<String>>(username: S1, password: S2) -> Credentials {
        Credentials::Password {
            username: username.into(),
            password: password.into(),
        }
    }

    /// User name and API key.
    pub fn api_key<S1: Into<String>, S2: Into<String>>(username: S1, api_key: S2) -> Credentials {
        Credentials::ApiKey {
            username: username.into(),
            api_key: api_key.into(),
        }
    }

    /// Access key and secret key.
    pub fn access_key<S1: Into<String>, S2: Into<String>>(
        access_key: S1,
        secret_key: S2,
    ) -> Credentials {
        Credentials::AccessKey {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// An existing token.
    pub fn token<S: Into<String>>(token: S) -> Credentials {
        Credentials::Token(token.into())
    }

    /// The vendor these credentials are specific to (if any).
    fn implied_vendor(&self) -> Option<Vendor> {
        match self {
            Credentials::ApiKey { .. } => Some(Vendor::Rackspace),
            Credentials::AccessKey { .. } => Some(Vendor::Hp),
            _ => None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Credentials::Password { ref username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .finish_non_exhaustive(),
            Credentials::ApiKey { ref username, .. } => f
                .debug_struct("ApiKey")
                .field("username", username)
                .finish_non_exhaustive(),
            Credentials::AccessKey { ref access_key, .. } => f
                .debug_struct("AccessKey")
                .field("access_key", access_key)
                .finish_non_exhaustive(),
            Credentials::Token(..) => f.write_str("Token(..)"),
        }
    }
}

impl From<Credentials> for CredentialsV2 {
    fn from(value: Credentials) -> CredentialsV2 {
        match value {
            Credentials::Password { username, password } => {
                CredentialsV2::Password { username, password }
            }
            Credentials::ApiKey { username, api_key } => {
                CredentialsV2::ApiKey { username, api_key }
            }
            Credentials::AccessKey {
                access_key,
                secret_key,
            } => CredentialsV2::AccessKey {
                access_key,
                secret_key,
            },
            Credentials::Token(id) => CredentialsV2::Token { id },
        }
    }
}

/// Authentication using Identity API V2.
///
/// ```rust,no_run
/// # async fn example() -> Result<(), oscloud::Error> {
/// use oscloud::identity::v2::{CloudIdentity, Credentials};
///
/// let auth = CloudIdentity::new(
///     "https://identity.api.rackspacecloud.com/v2.0",
///     Credentials::api_key("joe", "0123456789abcdef"),
/// )?;
/// let session = oscloud::Session::new(auth).await?;
/// # Ok(()) }
/// ```
///
/// Rackspace reports a default region for every user, which is used when neither the session
/// nor the authentication have a region set. HP requires a tenant name or ID.
#[derive(Debug, Clone)]
pub struct CloudIdentity {
    inner: Internal,
    vendor: Vendor,
}

impl Identity for CloudIdentity {
    fn auth_url(&self) -> &Url {
        self.inner.auth_url()
    }
}

impl CloudIdentity {
    /// Create an authentication, detecting the vendor from the kind of credentials.
    ///
    /// API keys imply Rackspace, access keys imply HP, other credentials default to OpenStack.
    pub fn new<U: IntoUrl>(auth_url: U, credentials: Credentials) -> Result<CloudIdentity, Error> {
        let vendor = credentials.implied_vendor().unwrap_or_default();
        CloudIdentity::new_for_vendor(auth_url, credentials, vendor)
    }

    /// Create an authentication for the given vendor.
    ///
    /// Fails with `InvalidConfig` if the vendor does not accept this kind of credentials.
    pub fn new_for_vendor<U: IntoUrl>(
        auth_url: U,
        credentials: Credentials,
        vendor: Vendor,
    ) -> Result<CloudIdentity, Error> {
        let supported = match credentials {
            Credentials::ApiKey { .. } => vendor.supports_api_key(),
            Credentials::AccessKey { .. } => vendor.supports_access_key(),
            _ => true,
        };
        if !supported {
            return Err(Error::new(
                ErrorKind::InvalidConfig,
                format!("{:?} credentials are not supported by {}", credentials, vendor),
            ));
        }

        let auth_url = auth_url.into_url()?;
        let body = AuthV2Root {
            auth: AuthV2 {
                credentials: credentials.into(),
                tenant_name: None,
                tenant_id: None,
            },
        };
        let mut inner = Internal::new(auth_url, AuthBody::V2(body))?;
        inner.use_user_region = vendor.reports_default_region();
        Ok(CloudIdentity { inner, vendor })
    }

    /// The vendor of the cloud.
    #[inline]
    pub fn vendor(&self) -> Vendor {
        self.vendor
    }

    /// Region used when the session has none.
    #[inline]
    pub fn region(&self) -> Option<&str> {
        self.inner.region.as_deref()
    }

    /// Tenant name (if set).
    pub fn tenant_name(&self) -> Option<&str> {
        match self.inner.body() {
            AuthBody::V2(body) => body.auth.tenant_name.as_deref(),
            _ => None,
        }
    }

    /// Tenant ID (if set).
    pub fn tenant_id(&self) -> Option<&str> {
        match self.inner.body() {
            AuthBody::V2(body) => body.auth.tenant_id.as_deref(),
            _ => None,
        }
    }

    /// Set the region to use when the session has none.
    #[inline]
    pub fn set_region<S: Into<String>>(&mut self, region: S) {
        self.inner.region = Some(region.into());
    }

    /// Scope the token to the tenant with the given ID.
    pub fn set_tenant_id<S: Into<String>>(&mut self, tenant_id: S) {
        if let AuthBody::V2(body) = self.inner.body_mut() {
            body.auth.tenant_id = Some(tenant_id.into());
        }
    }

    /// Scope the token to the tenant with the given name.
    pub fn set_tenant_name<S: Into<String>>(&mut self, tenant_name: S) {
        if let AuthBody::V2(body) = self.inner.body_mut() {
            body.auth.tenant_name = Some(tenant_name.into());
        }
    }

    /// Set the region to use when the session has none.
    #[inline]
    pub fn with_region<S: Into<String>>(mut self, region: S) -> Self {
        self.set_region(region);
        self
    }

    /// Scope the token to the tenant with the given ID.
    #[inline]
    pub fn with_tenant_id<S: Into<String>>(mut self, tenant_id: S) -> Self {
        self.set_tenant_id(tenant_id);
        self
    }

    /// Scope the token to the tenant with the given name.
    #[inline]
    pub fn with_tenant_name<S: Into<String>>(mut self, tenant_name: S) -> Self {
        self.set_tenant_name(tenant_name);
        self
    }

    fn check_tenant(&self) -> Result<(), Error> {
        if self.vendor.requires_tenant() && self.tenant_id().is_none() && self.tenant_name().is_none()
        {
            Err(Error::new(
                ErrorKind::InvalidConfig,
                format!("A tenant name or ID is required for {}", self.vendor),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AuthType for CloudIdentity {
    async fn authenticate(
        &self,
        client: &Client,
        request: RequestBuilder,
    ) -> Result<RequestBuilder, Error> {
        self.check_tenant()?;
        self.inner.authenticate(client, request).await
    }

    async fn get_endpoint(
        &self,
        client: &Client,
        service_type: &str,
        filters: &EndpointFilters,
    ) -> Result<Url, Error> {
        self.check_tenant()?;
        self.inner.get_endpoint(client, service_type, filters).await
    }

    async fn refresh(&self, client: &Client) -> Result<(), Error> {
        self.check_tenant()?;
        self.inner.refresh(client, true).await
    }

    async fn access(&self, client: &Client) -> Result<Option<Access>, Error> {
        self.check_tenant()?;
        self.inner.access(client).await.map(Some)
    }
}

#[cfg(test)]
pub mod test {
    use reqwest::Client;

    use super::{CloudIdentity, Credentials};
    use crate::identity::Identity;
    use crate::{AuthType, ErrorKind, Vendor};

    #[test]
    fn test_vendor_detection() {
        let id = CloudIdentity::new(
            "https://identity.api.rackspacecloud.com/v2.0/",
            Credentials::api_key("joe", "k3y"),
        )
        .unwrap();
        assert_eq!(id.vendor(), Vendor::Rackspace);
        assert_eq!(
            id.auth_url().as_str(),
            "https://identity.api.rackspacecloud.com/v2.0"
        );
        assert_eq!(
            id.inner.token_endpoint(),
            "https://identity.api.rackspacecloud.com/v2.0/tokens"
        );

        let id =
            CloudIdentity::new("http://127.0.0.1:5000", Credentials::password("joe", "pw")).unwrap();
        assert_eq!(id.vendor(), Vendor::OpenStack);
        assert_eq!(id.inner.token_endpoint(), "http://127.0.0.1:5000/v2.0/tokens");
    }

    #[test]
    fn test_unsupported_credentials() {
        let err = CloudIdentity::new_for_vendor(
            "http://127.0.0.1:5000",
            Credentials::api_key("joe", "k3y"),
            Vendor::OpenStack,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
        assert!(!err.to_string().contains("k3y"));
    }

    #[test]
    fn test_tenant() {
        let id = CloudIdentity::new("http://127.0.0.1:5000", Credentials::token("t0k3n"))
            .unwrap()
            .with_tenant_name("demo")
            .with_region("RegionOne");
        assert_eq!(id.tenant_name(), Some("demo"));
        assert_eq!(id.tenant_id(), None);
        assert_eq!(id.region(), Some("RegionOne"));
    }

    #[tokio::test]
    async fn test_hp_requires_tenant() {
        let id = CloudIdentity::new(
            "https://region-a.geo-1.identity.hpcloudsvc.com:35357/v2.0",
            Credentials::access_key("ak", "sk"),
        )
        .unwrap();
        assert_eq!(id.vendor(), Vendor::Hp);
        let err = id.refresh(&Client::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }

    #[test]
    fn test_credentials_debug() {
        let creds = format!("{:?}", Credentials::password("joe", "s3cr3t"));
        assert!(creds.contains("joe"));
        assert!(!creds.contains("s3cr3t"));
    }
}
