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

//! Authentication plugins.

use std::fmt::Debug;

use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::{Client, RequestBuilder, Url};
use static_assertions::{assert_impl_all, assert_obj_safe};

use super::identity::Access;
use super::{EndpointFilters, Error, ErrorKind};

/// Header carrying the token for both Identity V2 and V3 clouds.
pub(crate) const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// An authentication plugin.
///
/// A plugin decorates outgoing requests with credentials (normally a cached token) and
/// resolves service types into endpoint URLs, normally using the service catalog received
/// together with the token.
#[async_trait]
pub trait AuthType: Debug + Sync + Send {
    /// Add credentials to a request, renewing the token if it is about to expire.
    async fn authenticate(
        &self,
        client: &Client,
        request: RequestBuilder,
    ) -> Result<RequestBuilder, Error>;

    /// Find the endpoint of a service.
    async fn get_endpoint(
        &self,
        client: &Client,
        service_type: &str,
        filters: &EndpointFilters,
    ) -> Result<Url, Error>;

    /// Unconditionally renew the credentials.
    ///
    /// Called when a service rejects the current token with HTTP 401.
    async fn refresh(&self, client: &Client) -> Result<(), Error>;

    /// The current token and service catalog, for plugins that have them.
    async fn access(&self, _client: &Client) -> Result<Option<Access>, Error> {
        Ok(None)
    }
}

assert_obj_safe!(AuthType);

/// Plugin for clouds without an identity service.
///
/// All services share one fixed endpoint (or none, in which case every service needs an
/// endpoint override). A pre-issued token can be attached to every request:
///
/// ```rust,no_run
/// # async fn example() -> Result<(), oscloud::Error> {
/// let auth = oscloud::NoAuth::new("https://storage101.dfw1.clouddrive.com/v1/MossoCloudFS_1")?
///     .with_token("0123456789abcdef")?;
/// let session = oscloud::Session::new(auth).await?;
/// # Ok(()) }
/// ```
#[derive(Clone, Debug)]
pub struct NoAuth {
    endpoint: Option<Url>,
    token: Option<HeaderValue>,
}

assert_impl_all!(NoAuth: Send, Sync);

impl NoAuth {
    /// Use a fixed endpoint for every service.
    pub fn new<U: AsRef<str>>(endpoint: U) -> Result<NoAuth, Error> {
        let endpoint = Url::parse(endpoint.as_ref()).map_err(|e| {
            Error::new(
                ErrorKind::InvalidInput,
                format!("Invalid endpoint {}: {}", endpoint.as_ref(), e),
            )
        })?;
        Ok(NoAuth {
            endpoint: Some(endpoint),
            token: None,
        })
    }

    /// Rely on endpoint overrides for every service.
    #[inline]
    pub fn new_without_endpoint() -> NoAuth {
        NoAuth {
            endpoint: None,
            token: None,
        }
    }

    /// Send this token with every request.
    ///
    /// The token is never renewed, so a 401 response is final.
    pub fn with_token<S: AsRef<str>>(mut self, token: S) -> Result<NoAuth, Error> {
        let mut value = HeaderValue::from_str(token.as_ref())?;
        value.set_sensitive(true);
        self.token = Some(value);
        Ok(self)
    }
}

#[async_trait]
impl AuthType for NoAuth {
    async fn authenticate(
        &self,
        _client: &Client,
        request: RequestBuilder,
    ) -> Result<RequestBuilder, Error> {
        Ok(match self.token {
            Some(ref token) => request.header(AUTH_TOKEN_HEADER, token.clone()),
            None => request,
        })
    }

    async fn get_endpoint(
        &self,
        _client: &Client,
        service_type: &str,
        _filters: &EndpointFilters,
    ) -> Result<Url, Error> {
        self.endpoint.clone().ok_or_else(|| {
            Error::new(
                ErrorKind::EndpointNotFound,
                format!(
                    "No endpoint configured, an override is required for {}",
                    service_type
                ),
            )
        })
    }

    async fn refresh(&self, _client: &Client) -> Result<(), Error> {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use reqwest::Client;

    use super::{AuthType, NoAuth, AUTH_TOKEN_HEADER};
    use crate::ErrorKind;

    #[tokio::test]
    async fn test_noauth_endpoint() {
        let client = Client::new();
        let auth = NoAuth::new("http://127.0.0.1:8080/v1/MossoCloudFS_1").unwrap();
        for service in &["object-store", "rax:dns"] {
            let url = auth
                .get_endpoint(&client, service, &Default::default())
                .await
                .unwrap();
            assert_eq!(url.port(), Some(8080));
            assert_eq!(url.path(), "/v1/MossoCloudFS_1");
        }
        assert!(auth.access(&client).await.unwrap().is_none());
        auth.refresh(&client).await.unwrap();
    }

    #[test]
    fn test_noauth_invalid_endpoint() {
        let err = NoAuth::new("not a url").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = NoAuth::new_without_endpoint()
            .with_token("bad\ntoken")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_noauth_without_endpoint() {
        let err = NoAuth::new_without_endpoint()
            .get_endpoint(&Client::new(), "rax:dns", &Default::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EndpointNotFound);
    }

    #[tokio::test]
    async fn test_noauth_token() {
        let client = Client::new();
        let plain = NoAuth::new_without_endpoint();
        let request = plain
            .authenticate(&client, client.get("http://127.0.0.1/"))
            .await
            .unwrap()
            .build()
            .unwrap();
        assert!(request.headers().get(AUTH_TOKEN_HEADER).is_none());

        let with_token = plain.with_token("abcdef").unwrap();
        let request = with_token
            .authenticate(&client, client.get("http://127.0.0.1/"))
            .await
            .unwrap()
            .build()
            .unwrap();
        let header = request.headers().get(AUTH_TOKEN_HEADER).unwrap();
        assert_eq!(header, "abcdef");
        assert!(header.is_sensitive());
    }
}
