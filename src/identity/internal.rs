// Copyright 2019 Dmitry Tantsur <dtantsur@protonmail.com>
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

//! Token cache shared by all identity authentication types.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;

use chrono::{Duration, Local};
use log::{debug, error, trace};
use reqwest::{Client, RequestBuilder, Response, Url};
use tokio::sync::{RwLock, RwLockReadGuard};

use super::protocol;
use super::{Access, AccessToken, IdOrName, Role, Scope, Tenant, UserAccess};
use crate::catalog::{self, ServiceCatalogEntry};
use crate::client::check;
use crate::{url, EndpointFilters, Error, ErrorKind};

const MISSING_SUBJECT_HEADER: &str = "Missing X-Subject-Token header";
const INVALID_SUBJECT_HEADER: &str = "Invalid X-Subject-Token header";
// Required validity time in minutes. Here we refresh the token if it expires
// in 10 minutes or less.
const TOKEN_MIN_VALIDITY: i64 = 10;
const V3_TOKENS_PATH: &[&str] = &["auth", "tokens"];
const V2_TOKENS_PATH: &[&str] = &["tokens"];

/// Authentication request in one of the supported API versions.
#[derive(Clone)]
pub(crate) enum AuthBody {
    V3(protocol::AuthRoot),
    V2(protocol::AuthV2Root),
}

/// Token value together with the access information.
#[derive(Clone)]
struct CachedToken {
    value: String,
    access: Access,
}

impl fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut hasher = DefaultHasher::new();
        self.value.hash(&mut hasher);
        write!(
            f,
            "CachedToken {{ value: hash({}), expires: {} }}",
            hasher.finish(),
            self.access.token.expires
        )
    }
}

/// Internal identity authentication object.
pub(crate) struct Internal {
    auth_url: Url,
    body: AuthBody,
    token_endpoint: Url,
    cached_token: RwLock<Option<CachedToken>>,
    pub region: Option<String>,
    pub use_user_region: bool,
}

impl fmt::Debug for Internal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Internal")
            .field("auth_url", &self.auth_url.as_str())
            .field("token_endpoint", &self.token_endpoint.as_str())
            .field("cached_token", &self.cached_token)
            .field("region", &self.region)
            .field("use_user_region", &self.use_user_region)
            .finish()
    }
}

impl Internal {
    /// Create a new implementation.
    pub fn new(mut auth_url: Url, body: AuthBody) -> Result<Internal, Error> {
        let _ = auth_url
            .path_segments_mut()
            .map_err(|_| Error::new(ErrorKind::InvalidConfig, "Invalid auth_url: wrong schema?"))?
            .pop_if_empty();

        let (version, path) = match body {
            AuthBody::V3(..) => ("v3", V3_TOKENS_PATH),
            AuthBody::V2(..) => ("v2.0", V2_TOKENS_PATH),
        };
        let versioned = auth_url.path_segments().and_then(|s| s.last()) == Some(version);
        let token_endpoint = if versioned {
            url::extend(auth_url.clone(), path)?
        } else {
            url::extend(auth_url.clone(), std::iter::once(&version).chain(path))?
        };

        Ok(Internal {
            auth_url,
            body,
            token_endpoint,
            cached_token: RwLock::new(None),
            region: None,
            use_user_region: true,
        })
    }

    /// Access to the auth URL.
    #[inline]
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    #[inline]
    pub fn body(&self) -> &AuthBody {
        &self.body
    }

    #[inline]
    pub fn body_mut(&mut self) -> &mut AuthBody {
        &mut self.body
    }

    /// Add a scope to the V3 authentication.
    ///
    /// Identity V2 uses tenants instead of scopes, so the call has no effect there.
    pub fn set_scope(&mut self, scope: Scope) {
        if let AuthBody::V3(ref mut body) = self.body {
            body.auth.scope = Some(match scope {
                Scope::Project { project, domain } => {
                    protocol::Scope::Project(protocol::Project { project, domain })
                }
            });
        }
    }

    /// User name or ID.
    #[inline]
    pub fn user(&self) -> Option<&IdOrName> {
        match self.body {
            AuthBody::V3(ref body) => match body.auth.identity {
                protocol::Identity::Password(ref pw) => Some(&pw.user),
                _ => None,
            },
            _ => None,
        }
    }

    /// Project name or ID (if project scoped).
    #[inline]
    pub fn project(&self) -> Option<&IdOrName> {
        match self.body {
            AuthBody::V3(ref body) => match body.auth.scope {
                Some(protocol::Scope::Project(ref prj)) => Some(&prj.project),
                _ => None,
            },
            _ => None,
        }
    }

    /// Access information of the current token.
    pub async fn access(&self, client: &Client) -> Result<Access, Error> {
        let token = self.cached_token(client).await?;
        Ok(token.access.clone())
    }

    /// Add the authentication token to the request.
    pub async fn authenticate(
        &self,
        client: &Client,
        request: RequestBuilder,
    ) -> Result<RequestBuilder, Error> {
        let token = self.cached_token(client).await?;
        Ok(request.header(crate::auth::AUTH_TOKEN_HEADER, token.value.as_str()))
    }

    /// Get a URL for the requested service.
    ///
    /// When the filters have no region, the configured region or the default region of the user
    /// is used. The auth URL itself serves as the identity endpoint if the catalog has none.
    pub async fn get_endpoint(
        &self,
        client: &Client,
        service_type: &str,
        filters: &EndpointFilters,
    ) -> Result<Url, Error> {
        let token = self.cached_token(client).await?;
        let mut real_filters = filters.clone();
        if real_filters.region.is_none() {
            real_filters.region = self.region.clone().or_else(|| {
                token
                    .access
                    .user
                    .as_ref()
                    .filter(|_| self.use_user_region)
                    .and_then(|user| user.default_region.clone())
            });
        }
        debug!(
            "Requesting a catalog endpoint for service '{}', filters {:?}",
            service_type, real_filters
        );

        match catalog::extract_url(&token.access.catalog, service_type, &real_filters) {
            Err(err) if err.kind() == ErrorKind::EndpointNotFound && service_type == "identity" => {
                debug!("Using {} as the identity endpoint", self.auth_url);
                Ok(self.auth_url.clone())
            }
            other => other,
        }
    }

    /// Refresh the token (if needed or forced).
    pub async fn refresh(&self, client: &Client, force: bool) -> Result<(), Error> {
        // This is executed every request at least once, so it's important to start with a read
        // lock. We expect to hit this branch most of the time.
        if !force && token_alive(&self.cached_token.read().await) {
            return Ok(());
        }

        let mut lock = self.cached_token.write().await;
        // Additonal check in case another task has updated the token while we were waiting for
        // the write lock.
        if !force && token_alive(&lock) {
            return Ok(());
        }

        debug!("Requesting a new token from {}", self.token_endpoint);
        let request = client.post(self.token_endpoint.clone());
        let request = match self.body {
            AuthBody::V3(ref body) => request.json(body),
            AuthBody::V2(ref body) => request.json(body),
        };
        let resp = check(request.send().await?).await?;
        let token = match self.body {
            AuthBody::V3(..) => token_from_v3(resp).await?,
            AuthBody::V2(..) => token_from_v2(resp).await?,
        };
        debug!("Received a token expiring at {}", token.access.token.expires);
        *lock = Some(token);
        Ok(())
    }

    async fn cached_token(
        &self,
        client: &Client,
    ) -> Result<RwLockReadGuard<'_, CachedToken>, Error> {
        self.refresh(client, false).await?;
        let guard = self.cached_token.read().await;
        RwLockReadGuard::try_map(guard, |opt| opt.as_ref()).map_err(|_| {
            Error::new(
                ErrorKind::AuthenticationFailed,
                "No token is available after authentication",
            )
        })
    }

    #[cfg(test)]
    pub fn token_endpoint(&self) -> &str {
        self.token_endpoint.as_str()
    }
}

impl Clone for Internal {
    fn clone(&self) -> Internal {
        Internal {
            auth_url: self.auth_url.clone(),
            body: self.body.clone(),
            token_endpoint: self.token_endpoint.clone(),
            cached_token: RwLock::new(None),
            region: self.region.clone(),
            use_user_region: self.use_user_region,
        }
    }
}

#[inline]
fn token_alive(token: &impl Deref<Target = Option<CachedToken>>) -> bool {
    if let Some(value) = token.deref() {
        let validity_time_left = value
            .access
            .token
            .expires
            .signed_duration_since(Local::now());
        trace!("Token is valid for {:?}", validity_time_left);
        validity_time_left > Duration::minutes(TOKEN_MIN_VALIDITY)
    } else {
        false
    }
}

async fn token_from_v3(resp: Response) -> Result<CachedToken, Error> {
    let value = match resp.headers().get("x-subject-token") {
        Some(hdr) => match hdr.to_str() {
            Ok(s) => Ok(s.to_string()),
            Err(e) => {
                error!(
                    "Invalid X-Subject-Token {:?} received from {}: {}",
                    hdr,
                    resp.url(),
                    e
                );
                Err(Error::new(
                    ErrorKind::InvalidResponse,
                    INVALID_SUBJECT_HEADER,
                ))
            }
        },
        None => {
            error!("No X-Subject-Token header received from {}", resp.url());
            Err(Error::new(
                ErrorKind::InvalidResponse,
                MISSING_SUBJECT_HEADER,
            ))
        }
    }?;

    let token = resp.json::<protocol::TokenV3Root>().await?.token;
    trace!("Received catalog: {:?}", token.catalog);
    let tenant = token.project.map(|project| Tenant {
        id: project.id,
        name: project.name,
        description: None,
        enabled: None,
    });
    let user = token.user.map(|user| UserAccess {
        id: user.id,
        name: user.name,
        roles: token
            .roles
            .into_iter()
            .map(|role| Role {
                id: role.id,
                name: role.name,
                description: None,
                tenant_id: None,
            })
            .collect(),
        default_region: None,
    });
    Ok(CachedToken {
        access: Access {
            token: AccessToken {
                id: value.clone(),
                expires: token.expires_at,
                tenant,
            },
            user,
            catalog: token.catalog,
        },
        value,
    })
}

async fn token_from_v2(resp: Response) -> Result<CachedToken, Error> {
    let access = resp.json::<protocol::AccessV2Root>().await?.access;
    trace!("Received catalog: {:?}", access.catalog);
    let catalog: Vec<ServiceCatalogEntry> = access.catalog.into_iter().map(From::from).collect();
    let user = access.user.map(|user| UserAccess {
        id: user.id,
        name: user.name,
        roles: user
            .roles
            .into_iter()
            .map(|role| Role {
                id: role.id,
                name: role.name,
                description: role.description,
                tenant_id: role.tenant_id,
            })
            .collect(),
        default_region: user.default_region,
    });
    let tenant = access.token.tenant.map(|tenant| Tenant {
        id: tenant.id,
        name: tenant.name,
        description: None,
        enabled: None,
    });
    Ok(CachedToken {
        value: access.token.id.clone(),
        access: Access {
            token: AccessToken {
                id: access.token.id,
                expires: access.token.expires,
                tenant,
            },
            user,
            catalog,
        },
    })
}
