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

//! Authentication using Identity API V3.

use async_trait::async_trait;
use reqwest::{Client, IntoUrl, RequestBuilder, Url};

use super::internal::{AuthBody, Internal};
use super::protocol::{Auth, AuthRoot, Identity as IdentityBody, UserAndPassword};
use super::{Access, IdOrName, Identity, Scope};
use crate::{AuthType, EndpointFilters, Error};

/// Builder methods and plugin glue shared by the V3 plugins.
macro_rules! v3_plugin {
    ($name:ident) => {
        impl Identity for $name {
            fn auth_url(&self) -> &Url {
                self.inner.auth_url()
            }
        }

        impl $name {
            fn from_body(auth_url: Url, identity: IdentityBody) -> Result<$name, Error> {
                let body = AuthRoot {
                    auth: Auth {
                        identity,
                        scope: None,
                    },
                };
                Ok($name {
                    inner: Internal::new(auth_url, AuthBody::V3(body))?,
                })
            }

            /// Scope the token (normally to a project).
            #[inline]
            pub fn set_scope(&mut self, scope: Scope) {
                self.inner.set_scope(scope);
            }

            /// Scope the token to a project.
            #[inline]
            pub fn set_project_scope(
                &mut self,
                project: IdOrName,
                domain: impl Into<Option<IdOrName>>,
            ) {
                self.set_scope(Scope::Project {
                    project,
                    domain: domain.into(),
                });
            }

            /// Set the region used when the session has none.
            #[inline]
            pub fn set_region<S: Into<String>>(&mut self, region: S) {
                self.inner.region = Some(region.into());
            }

            /// Scope the token (normally to a project).
            #[inline]
            pub fn with_scope(mut self, scope: Scope) -> Self {
                self.set_scope(scope);
                self
            }

            /// Scope the token to a project.
            #[inline]
            pub fn with_project_scope(
                mut self,
                project: IdOrName,
                domain: impl Into<Option<IdOrName>>,
            ) -> Self {
                self.set_project_scope(project, domain);
                self
            }

            /// Set the region used when the session has none.
            #[inline]
            pub fn with_region<S: Into<String>>(mut self, region: S) -> Self {
                self.set_region(region);
                self
            }

            /// Project the token is scoped to.
            #[inline]
            pub fn project(&self) -> Option<&IdOrName> {
                self.inner.project()
            }

            /// Region used when the session has none.
            #[inline]
            pub fn region(&self) -> Option<&str> {
                self.inner.region.as_deref()
            }
        }

        #[async_trait]
        impl AuthType for $name {
            async fn authenticate(
                &self,
                client: &Client,
                request: RequestBuilder,
            ) -> Result<RequestBuilder, Error> {
                self.inner.authenticate(client, request).await
            }

            async fn get_endpoint(
                &self,
                client: &Client,
                service_type: &str,
                filters: &EndpointFilters,
            ) -> Result<Url, Error> {
                self.inner.get_endpoint(client, service_type, filters).await
            }

            async fn refresh(&self, client: &Client) -> Result<(), Error> {
                self.inner.refresh(client, true).await
            }

            async fn access(&self, client: &Client) -> Result<Option<Access>, Error> {
                self.inner.access(client).await.map(Some)
            }
        }
    };
}

/// Password authentication.
///
/// Users are identified by name within a domain or by a globally unique ID. Tokens are
/// normally scoped to a project:
///
/// ```rust,no_run
/// # async fn example() -> Result<(), oscloud::Error> {
/// use oscloud::common::IdOrName;
/// let auth = oscloud::identity::Password::new(
///     "https://keystone.example.com:5000",
///     "admin",
///     "pa$$w0rd",
///     "Default",
/// )?
/// .with_project_scope(IdOrName::from_name("demo"), IdOrName::from_id("default"))
/// .with_region("RegionOne");
///
/// let session = oscloud::Session::new(auth).await?;
/// # Ok(()) }
/// ```
///
/// The token is cached until it is about to expire or a service rejects it.
/// Clones start with an empty cache.
#[derive(Debug, Clone)]
pub struct Password {
    inner: Internal,
}

v3_plugin!(Password);

impl Password {
    /// Authenticate a user given by name in the domain given by name.
    pub fn new<U, S1, S2, S3>(
        auth_url: U,
        user_name: S1,
        password: S2,
        user_domain_name: S3,
    ) -> Result<Password, Error>
    where
        U: IntoUrl,
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Password::new_with_user(
            auth_url,
            IdOrName::Name(user_name.into()),
            password,
            Some(IdOrName::Name(user_domain_name.into())),
        )
    }

    /// Authenticate a user given by ID or name.
    ///
    /// The domain is only optional for users given by ID.
    pub fn new_with_user<U, S>(
        auth_url: U,
        user: IdOrName,
        password: S,
        user_domain: Option<IdOrName>,
    ) -> Result<Password, Error>
    where
        U: IntoUrl,
        S: Into<String>,
    {
        let credentials = UserAndPassword {
            user,
            password: password.into(),
            domain: user_domain,
        };
        Password::from_body(auth_url.into_url()?, IdentityBody::Password(credentials))
    }

    /// User name or ID.
    #[inline]
    pub fn user(&self) -> Option<&IdOrName> {
        self.inner.user()
    }
}

/// Exchange of an existing token for a new one, normally scoped to a project.
///
/// ```rust,no_run
/// # async fn example() -> Result<(), oscloud::Error> {
/// use oscloud::common::IdOrName;
/// let auth = oscloud::identity::Token::new("https://keystone.example.com:5000", "<token>")?
///     .with_project_scope(IdOrName::from_name("demo"), IdOrName::from_id("default"));
///
/// let session = oscloud::Session::new(auth).await?;
/// # Ok(()) }
/// ```
#[derive(Debug, Clone)]
pub struct Token {
    inner: Internal,
}

v3_plugin!(Token);

impl Token {
    /// Use an existing token.
    pub fn new<U, S>(auth_url: U, token: S) -> Result<Token, Error>
    where
        U: IntoUrl,
        S: Into<String>,
    {
        Token::from_body(auth_url.into_url()?, IdentityBody::Token(token.into()))
    }
}

#[cfg(test)]
mod test {
    use super::{Password, Token};
    use crate::identity::{IdOrName, Identity};

    const TOKENS: &str = "http://127.0.0.1:5000/identity/v3/auth/tokens";

    #[test]
    fn test_password() {
        let id = Password::new("http://127.0.0.1:5000/identity", "admin", "pa$$w0rd", "Default")
            .unwrap()
            .with_project_scope(
                IdOrName::from_name("cool project"),
                IdOrName::from_name("example.com"),
            )
            .with_region("RegionTwo");
        assert_eq!(id.auth_url().as_str(), "http://127.0.0.1:5000/identity");
        assert_eq!(id.inner.token_endpoint(), TOKENS);
        assert_eq!(id.user(), Some(&IdOrName::from_name("admin")));
        assert_eq!(id.project(), Some(&IdOrName::from_name("cool project")));
        assert_eq!(id.region(), Some("RegionTwo"));
    }

    #[test]
    fn test_password_by_user_id() {
        let id = Password::new_with_user(
            "http://127.0.0.1:5000/identity/v3/",
            IdOrName::from_id("u1"),
            "pa$$w0rd",
            None,
        )
        .unwrap();
        assert_eq!(id.auth_url().as_str(), "http://127.0.0.1:5000/identity/v3");
        assert_eq!(id.inner.token_endpoint(), TOKENS);
        assert_eq!(id.user(), Some(&IdOrName::from_id("u1")));
        assert!(id.project().is_none());
        assert!(id.region().is_none());
    }

    #[test]
    fn test_invalid_auth_url() {
        assert!(Password::new("http://127.0.0.1 5000/", "admin", "pa$$w0rd", "Default").is_err());
        assert!(Token::new("not a url", "abcdef").is_err());
    }

    #[test]
    fn test_token() {
        let id = Token::new("http://127.0.0.1:5000/identity/", "abcdef")
            .unwrap()
            .with_project_scope(IdOrName::from_id("p1"), IdOrName::from_id("default"));
        assert_eq!(id.auth_url().as_str(), "http://127.0.0.1:5000/identity");
        assert_eq!(id.inner.token_endpoint(), TOKENS);
        assert_eq!(id.project(), Some(&IdOrName::from_id("p1")));
    }
}
