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

//! Authentication using the Identity API and the Identity service itself.
//!
//! Identity V3 is supported through [Password](struct.Password.html) and
//! [Token](struct.Token.html). Identity V2, still used by Rackspace and HP clouds, is supported
//! through [v2::CloudIdentity](v2/struct.CloudIdentity.html).
//!
//! All identity authentication types cache the token and refresh it when it is about to expire.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, FixedOffset};
use reqwest::{Method, Url};
use serde::Deserialize;

use super::client::{RequestBuilder, NO_PATH};
use super::services::{GenericService, IDENTITY};
use super::{url, Adapter, Error, ErrorKind, Page, PaginatedResource, ResourceCollection};

mod internal;
mod protocol;
pub mod v2;
mod v3;

pub use self::v3::{Password, Token};
pub use crate::catalog::{CatalogEndpoint, ServiceCatalogEntry};
pub use crate::common::IdOrName;

/// A scope of a token.
///
/// Only project scopes are currently supported.
#[derive(Debug)]
pub enum Scope {
    /// A token scoped to a project.
    Project {
        /// Project ID or name.
        project: IdOrName,
        /// ID or name of the project domain.
        domain: Option<IdOrName>,
    },
}

/// Generic trait for authentication using the Identity API.
pub trait Identity {
    /// Get a reference to the auth URL.
    fn auth_url(&self) -> &Url;
}

/// Access information of the current token.
///
/// The catalog is a read-only snapshot taken when the token was issued.
#[derive(Clone, Debug)]
pub struct Access {
    /// The token itself.
    pub token: AccessToken,
    /// The user owning the token (if reported).
    pub user: Option<UserAccess>,
    /// Service catalog.
    pub catalog: Vec<ServiceCatalogEntry>,
}

/// An authentication token.
#[derive(Clone)]
pub struct AccessToken {
    /// Token value.
    pub id: String,
    /// Expiration date and time.
    pub expires: DateTime<FixedOffset>,
    /// Tenant (project) the token is scoped to.
    pub tenant: Option<Tenant>,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut hasher = DefaultHasher::new();
        self.id.hash(&mut hasher);
        f.debug_struct("AccessToken")
            .field("id", &format_args!("hash({})", hasher.finish()))
            .field("expires", &self.expires)
            .field("tenant", &self.tenant)
            .finish()
    }
}

/// A user and their roles.
#[derive(Clone, Debug)]
pub struct UserAccess {
    /// User ID.
    pub id: String,
    /// User name.
    pub name: Option<String>,
    /// Roles of the user.
    pub roles: Vec<Role>,
    /// Default region (reported by Rackspace).
    pub default_region: Option<String>,
}

/// A role assigned to a user.
#[derive(Clone, Debug)]
pub struct Role {
    /// Role ID.
    pub id: Option<String>,
    /// Role name.
    pub name: String,
    /// Role description.
    pub description: Option<String>,
    /// Tenant the role is limited to.
    pub tenant_id: Option<String>,
}

/// A tenant (called a project in Identity V3).
#[derive(Clone, Debug, Deserialize, PaginatedResource)]
pub struct Tenant {
    /// Tenant ID.
    #[resource_id]
    pub id: String,
    /// Tenant name.
    #[serde(default)]
    pub name: Option<String>,
    /// Tenant description.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the tenant is enabled.
    #[serde(default)]
    pub enabled: Option<bool>,
}

/// An Identity API extension.
#[derive(Clone, Debug, Deserialize)]
pub struct Extension {
    /// Extension name.
    pub name: String,
    /// Short alias.
    pub alias: String,
    /// Namespace of the extension.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Last update time as reported by the server.
    #[serde(default)]
    pub updated: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Extensions {
    Wrapped { values: Vec<Extension> },
    Plain(Vec<Extension>),
}

#[derive(Debug, Deserialize)]
struct ExtensionsRoot {
    extensions: Extensions,
}

/// A project available to the current token.
#[derive(Clone, Debug, Deserialize)]
pub struct Project {
    /// Project ID.
    pub id: String,
    /// Project name.
    pub name: String,
    /// Domain of the project.
    #[serde(default)]
    pub domain_id: Option<String>,
    /// Project description.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the project is enabled.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Deserialize, Default)]
struct ProjectLinks {
    #[serde(default)]
    next: Option<Url>,
}

/// Response of a projects listing.
#[derive(Debug, Deserialize)]
pub struct ProjectsRoot {
    projects: Vec<Project>,
    #[serde(default)]
    links: ProjectLinks,
}

impl ResourceCollection<Project> for ProjectsRoot {
    fn into_items(self) -> Vec<Project> {
        self.projects
    }

    fn next_link(&self) -> Option<Url> {
        self.links.next.clone()
    }
}

impl PaginatedResource for Project {
    type Id = String;
    type Root = ProjectsRoot;
    const SUPPORTS_MARKER: bool = false;

    fn resource_id(&self) -> String {
        self.id.clone()
    }
}

const V2: &str = "v2.0";
const V3: &str = "v3";

async fn versioned_request(
    adapter: &Adapter<GenericService>,
    version: &str,
    path: &[&str],
) -> Result<RequestBuilder, Error> {
    let mut base = adapter.get_endpoint(NO_PATH).await?;
    let last = base
        .path_segments()
        .and_then(|segments| segments.filter(|x| !x.is_empty()).last())
        .map(String::from);
    base = match last.as_deref() {
        Some(last) if last == version => base,
        Some(V2) | Some(V3) => url::extend(url::pop(base, false)?, &[version])?,
        _ => url::extend(base, &[version])?,
    };
    let url = url::extend(base, path)?;
    Ok(adapter.session().client().request(Method::GET, url))
}

async fn current_access(adapter: &Adapter<GenericService>) -> Result<Access, Error> {
    adapter.session().client().access().await?.ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidInput,
            "The authentication type in use does not provide tokens",
        )
    })
}

/// Identity V2 service client.
///
/// ```rust,no_run
/// # async fn example() -> Result<(), oscloud::Error> {
/// let session = oscloud::Session::from_env().await?;
/// let identity = oscloud::identity::IdentityV2::new(&session);
/// for tenant in identity.list_tenants(None, None).await?.all_pages().await? {
///     println!("{}", tenant.id);
/// }
/// # Ok(()) }
/// # #[tokio::main]
/// # async fn main() { example().await.unwrap(); }
/// ```
#[derive(Debug, Clone)]
pub struct IdentityV2 {
    adapter: Adapter<GenericService>,
}

service_client!(IdentityV2: GenericService = IDENTITY);

impl IdentityV2 {
    /// Access information of the current token.
    pub async fn get_access(&self) -> Result<Access, Error> {
        current_access(&self.adapter).await
    }

    /// The current user and their roles.
    pub async fn get_user_access(&self) -> Result<UserAccess, Error> {
        self.get_access().await?.user.ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidResponse,
                "Access information does not contain a user",
            )
        })
    }

    /// List extensions of the Identity service.
    pub async fn list_extensions(&self) -> Result<Vec<Extension>, Error> {
        let root: ExtensionsRoot = versioned_request(&self.adapter, V2, &["extensions"])
            .await?
            .fetch_json()
            .await?;
        Ok(match root.extensions {
            Extensions::Wrapped { values } => values,
            Extensions::Plain(values) => values,
        })
    }

    /// List tenants available to the current user.
    pub async fn list_tenants(
        &self,
        limit: Option<usize>,
        marker: Option<String>,
    ) -> Result<Page<Tenant>, Error> {
        versioned_request(&self.adapter, V2, &["tenants"])
            .await?
            .fetch_page(limit, marker)
            .await
    }
}

/// Identity V3 service client.
#[derive(Debug, Clone)]
pub struct IdentityV3 {
    adapter: Adapter<GenericService>,
}

service_client!(IdentityV3: GenericService = IDENTITY);

impl IdentityV3 {
    /// Access information of the current token.
    pub async fn get_access(&self) -> Result<Access, Error> {
        current_access(&self.adapter).await
    }

    /// List projects available to the current token.
    pub async fn list_projects(&self) -> Result<Page<Project>, Error> {
        versioned_request(&self.adapter, V3, &["auth", "projects"])
            .await?
            .fetch_page(None, None)
            .await
    }
}
