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

//! Asynchronous typed bindings for OpenStack and Rackspace clouds.
//!
//! The entry point is a [Session](struct.Session.html): an authenticated HTTP client together
//! with an endpoint cache. Sessions are created from an authentication type (Identity V3
//! [Password](identity/struct.Password.html), Identity V2
//! [CloudIdentity](identity/v2/struct.CloudIdentity.html) or [NoAuth](struct.NoAuth.html)), from
//! `clouds.yaml`, from `OS_*` environment variables or from a credentials file.
//!
//! Service clients wrap a session and provide typed operations:
//!
//! * [objectstorage](objectstorage/index.html) - Object Storage and its CDN extension,
//! * [networking](networking/index.html) - Networking V2,
//! * [cdn](cdn/index.html) - Content Delivery V1,
//! * [compute](compute/index.html) - Compute V2,
//! * [blockstorage](blockstorage/index.html) - Block Storage V2,
//! * [loadbalancer](loadbalancer/index.html) - Rackspace Cloud Load Balancers,
//! * [dns](dns/index.html) - Rackspace Cloud DNS,
//! * [identity](identity/index.html) - Identity V2 and V3.
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), oscloud::Error> {
//! let session = oscloud::Session::from_env().await?;
//! let storage = oscloud::objectstorage::ObjectStorage::new(&session);
//! let page = storage.list_containers(Default::default(), Some(100), None).await?;
//! for container in page.iter() {
//!     println!("{} has {} objects", container.name, container.count);
//! }
//! # Ok(()) }
//! # #[tokio::main]
//! # async fn main() { example().await.unwrap(); }
//! ```

#![crate_name = "oscloud"]
#![crate_type = "lib"]
// NOTE: we do not use generic deny(warnings) to avoid breakages with new
// versions of the compiler. Add more warnings here as you discover them.
// Taken from https://github.com/rust-unofficial/patterns/
#![deny(
    improper_ctypes,
    missing_copy_implementations,
    missing_debug_implementations,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    trivial_numeric_casts,
    unconditional_recursion,
    unsafe_code,
    unused_allocation,
    unused_comparisons,
    unused_doc_comments,
    unused_parens,
    while_true
)]
#![warn(missing_docs, unused)]
#![allow(
    clippy::new_ret_no_self,
    clippy::should_implement_trait,
    clippy::wrong_self_convention
)]

// Derived implementations refer to the crate by name.
extern crate self as oscloud;

#[macro_use]
mod macros;

mod adapter;
mod apiversion;
mod auth;
pub mod blockstorage;
mod cache;
mod catalog;
pub mod cdn;
pub mod client;
pub mod common;
pub mod compute;
pub mod dns;
mod endpointfilters;
mod error;
pub mod identity;
pub mod loadbalancer;
mod loading;
pub mod networking;
pub mod objectstorage;
mod page;
mod protocol;
mod query;
pub mod services;
mod session;
#[cfg(feature = "stream")]
mod stream;
mod url;
mod utils;
mod vendor;

pub use reqwest::Url;

pub use crate::adapter::Adapter;
pub use crate::apiversion::ApiVersion;
pub use crate::auth::{AuthType, NoAuth};
pub use crate::catalog::{CatalogEndpoint, ServiceCatalogEntry};
pub use crate::endpointfilters::{EndpointFilters, InterfaceType, ValidInterfaces};
pub use crate::error::{Error, ErrorKind};
pub use crate::loading::{CloudConfig, CredentialsFile};
pub use crate::page::{Page, PaginatedResource, ResourceCollection};
pub use crate::protocol::ServiceInfo;
pub use crate::query::{Query, QueryItem};
pub use crate::session::Session;
pub use crate::vendor::Vendor;

pub use oscloud_derive::{PaginatedResource, QueryItem};
