// Copyright 2018 Dmitry Tantsur <divius.inside@gmail.com>
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

//! Compute V2 API with microversions.
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), oscloud::Error> {
//! use oscloud::compute::Compute;
//! use oscloud::ApiVersion;
//!
//! let session = oscloud::Session::from_env().await?;
//! let compute = Compute::new(&session)
//!     .negotiate_api_version(vec![ApiVersion(2, 1), ApiVersion(2, 42)])
//!     .await?;
//! for server in compute.list_servers(Default::default(), None, None).await?.iter() {
//!     println!("{}: {}", server.id, server.name);
//! }
//! # Ok(()) }
//! # #[tokio::main]
//! # async fn main() { example().await.unwrap(); }
//! ```

use std::collections::HashMap;
use std::time::Duration;

use log::{debug, trace};

use super::services::{ComputeService, COMPUTE};
use super::utils;
use super::{Adapter, ApiVersion, Error, ErrorKind, Page, Query};

mod protocol;

use self::protocol::{
    FlavorRoot, ImageRoot, KeyPairRoot, KeyPairsRoot, MetadataRoot, NewKeyPair, RebootAction,
    ResizeAction, ServerAction, ServerNameUpdate, ServerRoot,
};
pub use self::protocol::{
    AddressType, CreatedServer, Flavor, FlavorSummary, Image, ImageStatus, KeyPair, NewServer,
    RebootType, Server, ServerAddress, ServerFault, ServerNetwork, ServerPowerState, ServerStatus,
    ServerSummary,
};

/// Query for listing servers.
#[derive(Debug, Clone, crate::QueryItem)]
#[non_exhaustive]
pub enum ServerQuery {
    /// Servers with names matching the regular expression.
    Name(String),
    /// Servers with this status.
    Status(ServerStatus),
    /// Servers with this flavor ID.
    Flavor(String),
    /// Servers with this image ID.
    Image(String),
    /// Servers with IPv4 addresses matching the regular expression.
    #[query_item = "ip"]
    IpAddress(String),
    /// Servers changed since the ISO 8601 timestamp.
    #[query_item = "changes-since"]
    ChangesSince(String),
}

/// Query for listing images.
#[derive(Debug, Clone, crate::QueryItem)]
#[non_exhaustive]
pub enum ImageQuery {
    /// Images with this name.
    Name(String),
    /// Images with this status.
    Status(ImageStatus),
    /// Snapshots of this server.
    Server(String),
}

/// Compute service client.
#[derive(Debug, Clone)]
pub struct Compute {
    adapter: Adapter<ComputeService>,
}

service_client!(Compute: ComputeService = COMPUTE);

impl Compute {
    /// Pick the highest of the API versions supported by the server.
    pub async fn pick_api_version<I>(&self, versions: I) -> Result<Option<ApiVersion>, Error>
    where
        I: IntoIterator<Item = ApiVersion>,
        I::IntoIter: Send,
    {
        self.adapter.pick_api_version(versions).await
    }

    /// Use the API version for all requests of this client.
    pub fn with_api_version(self, version: ApiVersion) -> Compute {
        Compute {
            adapter: self.adapter.with_default_api_version(Some(version)),
        }
    }

    /// Use the highest of the API versions supported by the server.
    ///
    /// Fails with `IncompatibleApiVersion` if none of them is supported.
    pub async fn negotiate_api_version<I>(self, versions: I) -> Result<Compute, Error>
    where
        I: IntoIterator<Item = ApiVersion>,
        I::IntoIter: Send,
    {
        match self.pick_api_version(versions).await? {
            Some(version) => {
                debug!("Using Compute API version {}", version);
                Ok(self.with_api_version(version))
            }
            None => Err(Error::new(
                ErrorKind::IncompatibleApiVersion,
                "None of the requested Compute API versions is supported",
            )),
        }
    }

    /// List summaries of servers.
    pub async fn list_servers(
        &self,
        query: Query<ServerQuery>,
        limit: Option<usize>,
        marker: Option<String>,
    ) -> Result<Page<ServerSummary>, Error> {
        trace!("Listing servers with {:?}", query);
        self.adapter
            .get(&["servers"])
            .await?
            .query(&query)
            .fetch_page(limit, marker)
            .await
    }

    /// List servers with details.
    pub async fn list_servers_detail(
        &self,
        query: Query<ServerQuery>,
        limit: Option<usize>,
        marker: Option<String>,
    ) -> Result<Page<Server>, Error> {
        trace!("Listing server details with {:?}", query);
        self.adapter
            .get(&["servers", "detail"])
            .await?
            .query(&query)
            .fetch_page(limit, marker)
            .await
    }

    /// Get a server by its ID.
    pub async fn get_server<S: AsRef<str>>(&self, id: S) -> Result<Server, Error> {
        let root: ServerRoot<Server> = self
            .adapter
            .get(&["servers", id.as_ref()])
            .await?
            .fetch_json()
            .await?;
        trace!("Received {:?}", root.server);
        Ok(root.server)
    }

    /// Start creating a server.
    ///
    /// Use [wait_for_server_status](#method.wait_for_server_status) to wait for it to become
    /// active.
    pub async fn create_server(&self, request: &NewServer) -> Result<CreatedServer, Error> {
        if request.image.is_none() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "An image is required to create a server",
            ));
        }
        let root: ServerRoot<CreatedServer> = self
            .adapter
            .post(&["servers"])
            .await?
            .json(&ServerRoot { server: request })
            .fetch_json()
            .await?;
        debug!("Requested creation of server {}", root.server.id);
        Ok(root.server)
    }

    /// Rename a server.
    pub async fn update_server<S, N>(&self, id: S, name: N) -> Result<Server, Error>
    where
        S: AsRef<str>,
        N: AsRef<str>,
    {
        let update = ServerNameUpdate {
            name: name.as_ref(),
        };
        let root: ServerRoot<Server> = self
            .adapter
            .put(&["servers", id.as_ref()])
            .await?
            .json(&ServerRoot { server: update })
            .fetch_json()
            .await?;
        Ok(root.server)
    }

    /// Start deleting a server.
    pub async fn delete_server<S: AsRef<str>>(&self, id: S) -> Result<(), Error> {
        let _ = self
            .adapter
            .delete(&["servers", id.as_ref()])
            .await?
            .send()
            .await?;
        debug!("Requested deletion of server {}", id.as_ref());
        Ok(())
    }

    async fn action(&self, id: &str, action: ServerAction<'_>) -> Result<(), Error> {
        trace!("Running {:?} on server {}", action, id);
        let _ = self
            .adapter
            .post(&["servers", id, "action"])
            .await?
            .json(&action)
            .send()
            .await?;
        Ok(())
    }

    /// Reboot a server.
    pub async fn reboot_server<S: AsRef<str>>(
        &self,
        id: S,
        reboot_type: RebootType,
    ) -> Result<(), Error> {
        self.action(id.as_ref(), ServerAction::Reboot(RebootAction { reboot_type }))
            .await
    }

    /// Start resizing a server to another flavor.
    pub async fn resize_server<S, F>(&self, id: S, flavor: F) -> Result<(), Error>
    where
        S: AsRef<str>,
        F: AsRef<str>,
    {
        let resize = ResizeAction {
            flavor: flavor.as_ref(),
        };
        self.action(id.as_ref(), ServerAction::Resize(resize)).await
    }

    /// Confirm a finished resize.
    pub async fn confirm_resize<S: AsRef<str>>(&self, id: S) -> Result<(), Error> {
        self.action(id.as_ref(), ServerAction::ConfirmResize(()))
            .await
    }

    /// Revert a finished resize.
    pub async fn revert_resize<S: AsRef<str>>(&self, id: S) -> Result<(), Error> {
        self.action(id.as_ref(), ServerAction::RevertResize(()))
            .await
    }

    /// Get metadata of a server.
    pub async fn get_server_metadata<S: AsRef<str>>(
        &self,
        id: S,
    ) -> Result<HashMap<String, String>, Error> {
        let root: MetadataRoot = self
            .adapter
            .get(&["servers", id.as_ref(), "metadata"])
            .await?
            .fetch_json()
            .await?;
        Ok(root.metadata)
    }

    /// Replace all metadata of a server.
    pub async fn set_server_metadata<S: AsRef<str>>(
        &self,
        id: S,
        metadata: HashMap<String, String>,
    ) -> Result<HashMap<String, String>, Error> {
        let root: MetadataRoot = self
            .adapter
            .put(&["servers", id.as_ref(), "metadata"])
            .await?
            .json(&MetadataRoot { metadata })
            .fetch_json()
            .await?;
        Ok(root.metadata)
    }

    /// List summaries of flavors.
    pub async fn list_flavors(
        &self,
        limit: Option<usize>,
        marker: Option<String>,
    ) -> Result<Page<FlavorSummary>, Error> {
        self.adapter
            .get(&["flavors"])
            .await?
            .fetch_page(limit, marker)
            .await
    }

    /// List flavors with details.
    pub async fn list_flavors_detail(
        &self,
        limit: Option<usize>,
        marker: Option<String>,
    ) -> Result<Page<Flavor>, Error> {
        self.adapter
            .get(&["flavors", "detail"])
            .await?
            .fetch_page(limit, marker)
            .await
    }

    /// Get a flavor by its ID.
    pub async fn get_flavor<S: AsRef<str>>(&self, id: S) -> Result<Flavor, Error> {
        let root: FlavorRoot = self
            .adapter
            .get(&["flavors", id.as_ref()])
            .await?
            .fetch_json()
            .await?;
        Ok(root.flavor)
    }

    /// List images with details.
    pub async fn list_images(
        &self,
        query: Query<ImageQuery>,
        limit: Option<usize>,
        marker: Option<String>,
    ) -> Result<Page<Image>, Error> {
        self.adapter
            .get(&["images", "detail"])
            .await?
            .query(&query)
            .fetch_page(limit, marker)
            .await
    }

    /// Get an image by its ID.
    pub async fn get_image<S: AsRef<str>>(&self, id: S) -> Result<Image, Error> {
        let root: ImageRoot = self
            .adapter
            .get(&["images", id.as_ref()])
            .await?
            .fetch_json()
            .await?;
        Ok(root.image)
    }

    /// Delete an image.
    pub async fn delete_image<S: AsRef<str>>(&self, id: S) -> Result<(), Error> {
        let _ = self
            .adapter
            .delete(&["images", id.as_ref()])
            .await?
            .send()
            .await?;
        debug!("Deleted image {}", id.as_ref());
        Ok(())
    }

    /// List key pairs of the current user.
    pub async fn list_key_pairs(&self) -> Result<Vec<KeyPair>, Error> {
        let root: KeyPairsRoot = self
            .adapter
            .get(&["os-keypairs"])
            .await?
            .fetch_json()
            .await?;
        Ok(root.keypairs.into_iter().map(|item| item.keypair).collect())
    }

    async fn post_key_pair(&self, request: NewKeyPair<'_>) -> Result<KeyPair, Error> {
        let root: KeyPairRoot<KeyPair> = self
            .adapter
            .post(&["os-keypairs"])
            .await?
            .json(&KeyPairRoot { keypair: request })
            .fetch_json()
            .await?;
        debug!("Created key pair {}", root.keypair.name);
        Ok(root.keypair)
    }

    /// Generate a new key pair.
    ///
    /// The private key is only available in the result of this call.
    pub async fn create_key_pair<S: AsRef<str>>(&self, name: S) -> Result<KeyPair, Error> {
        self.post_key_pair(NewKeyPair {
            name: name.as_ref(),
            public_key: None,
        })
        .await
    }

    /// Import an existing public key.
    pub async fn import_key_pair<S, K>(&self, name: S, public_key: K) -> Result<KeyPair, Error>
    where
        S: AsRef<str>,
        K: AsRef<str>,
    {
        self.post_key_pair(NewKeyPair {
            name: name.as_ref(),
            public_key: Some(public_key.as_ref()),
        })
        .await
    }

    /// Delete a key pair.
    pub async fn delete_key_pair<S: AsRef<str>>(&self, name: S) -> Result<(), Error> {
        let _ = self
            .adapter
            .delete(&["os-keypairs", name.as_ref()])
            .await?
            .send()
            .await?;
        debug!("Deleted key pair {}", name.as_ref());
        Ok(())
    }

    /// Wait for a server to reach the status.
    ///
    /// Fails with `OperationFailed` if the server goes into the `ERROR` status instead.
    pub async fn wait_for_server_status<S: AsRef<str>>(
        &self,
        id: S,
        status: ServerStatus,
        timeout: Duration,
        delay: Duration,
    ) -> Result<Server, Error> {
        let id = id.as_ref();
        let description = format!("server {} to reach status {}", id, status);
        let status = &status;
        utils::wait_for(timeout, delay, &description, move || async move {
            let server = self.get_server(id).await?;
            if &server.status == status {
                Ok(Some(server))
            } else if server.status == ServerStatus::Error {
                let reason = server
                    .fault
                    .as_ref()
                    .map(|fault| fault.message.as_str())
                    .unwrap_or("unknown reason");
                Err(Error::new(
                    ErrorKind::OperationFailed,
                    format!("Server {} went into ERROR state: {}", id, reason),
                ))
            } else {
                Ok(None)
            }
        })
        .await
    }
}

#[cfg(test)]
mod test {
    use super::{ImageQuery, ImageStatus, ServerQuery, ServerStatus};
    use crate::Query;

    #[test]
    fn test_server_query() {
        let query: Query<ServerQuery> = vec![
            ServerQuery::Status(ServerStatus::ShutOff),
            ServerQuery::ChangesSince("2024-01-01T00:00:00Z".into()),
            ServerQuery::IpAddress("10.0.0.".into()),
        ]
        .into();
        assert_eq!(
            serde_urlencoded::to_string(query).unwrap(),
            "status=SHUTOFF&changes-since=2024-01-01T00%3A00%3A00Z&ip=10.0.0."
        );
    }

    #[test]
    fn test_image_query() {
        let query = Query::default().with(ImageQuery::Status(ImageStatus::Active));
        assert_eq!(serde_urlencoded::to_string(query).unwrap(), "status=ACTIVE");
    }
}
