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

//! Block Storage API.

use std::time::Duration;

use log::{debug, trace};

use super::services::{GenericService, BLOCK_STORAGE};
use super::utils;
use super::{Adapter, Error, ErrorKind, Page, Query};

mod protocol;

use self::protocol::{SnapshotRoot, VolumeRoot, VolumeTypeRoot, VolumeTypesRoot};
pub use self::protocol::{
    NewSnapshot, NewVolume, Snapshot, SnapshotStatus, Volume, VolumeAttachment, VolumeSortKey,
    VolumeStatus, VolumeType, VolumeUpdate,
};

/// Query for listing volumes.
#[derive(Debug, Clone, crate::QueryItem)]
#[non_exhaustive]
pub enum VolumeQuery {
    /// Volumes with this name.
    Name(String),
    /// Volumes with this status.
    Status(VolumeStatus),
    /// Sort by this key.
    SortKey(VolumeSortKey),
    /// List volumes of all tenants (admin only).
    AllTenants(bool),
}

/// Query for listing snapshots.
#[derive(Debug, Clone, crate::QueryItem)]
#[non_exhaustive]
pub enum SnapshotQuery {
    /// Snapshots with this name.
    Name(String),
    /// Snapshots with this status.
    Status(SnapshotStatus),
    /// Snapshots of this volume.
    VolumeId(String),
}

/// Block Storage service client.
#[derive(Debug, Clone)]
pub struct BlockStorage {
    adapter: Adapter<GenericService>,
}

service_client!(BlockStorage: GenericService = BLOCK_STORAGE);

impl BlockStorage {
    /// List volumes with details.
    pub async fn list_volumes(
        &self,
        query: Query<VolumeQuery>,
        limit: Option<usize>,
        marker: Option<String>,
    ) -> Result<Page<Volume>, Error> {
        trace!("Listing volumes with {:?}", query);
        self.adapter
            .get(&["volumes", "detail"])
            .await?
            .query(&query)
            .fetch_page(limit, marker)
            .await
    }

    /// Get a volume by its ID.
    pub async fn get_volume<S: AsRef<str>>(&self, id: S) -> Result<Volume, Error> {
        let root: VolumeRoot<Volume> = self
            .adapter
            .get(&["volumes", id.as_ref()])
            .await?
            .fetch_json()
            .await?;
        trace!("Received {:?}", root.volume);
        Ok(root.volume)
    }

    /// Start creating a volume.
    pub async fn create_volume(&self, request: &NewVolume) -> Result<Volume, Error> {
        if request.size == 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Volume size must be positive",
            ));
        }
        let root: VolumeRoot<Volume> = self
            .adapter
            .post(&["volumes"])
            .await?
            .json(&VolumeRoot { volume: request })
            .fetch_json()
            .await?;
        debug!("Requested creation of volume {}", root.volume.id);
        Ok(root.volume)
    }

    /// Update a volume.
    pub async fn update_volume<S: AsRef<str>>(
        &self,
        id: S,
        update: &VolumeUpdate,
    ) -> Result<Volume, Error> {
        let root: VolumeRoot<Volume> = self
            .adapter
            .put(&["volumes", id.as_ref()])
            .await?
            .json(&VolumeRoot { volume: update })
            .fetch_json()
            .await?;
        Ok(root.volume)
    }

    /// Start deleting a volume.
    pub async fn delete_volume<S: AsRef<str>>(&self, id: S) -> Result<(), Error> {
        let _ = self
            .adapter
            .delete(&["volumes", id.as_ref()])
            .await?
            .send()
            .await?;
        debug!("Requested deletion of volume {}", id.as_ref());
        Ok(())
    }

    /// List snapshots with details.
    pub async fn list_snapshots(
        &self,
        query: Query<SnapshotQuery>,
        limit: Option<usize>,
        marker: Option<String>,
    ) -> Result<Page<Snapshot>, Error> {
        trace!("Listing snapshots with {:?}", query);
        self.adapter
            .get(&["snapshots", "detail"])
            .await?
            .query(&query)
            .fetch_page(limit, marker)
            .await
    }

    /// Get a snapshot by its ID.
    pub async fn get_snapshot<S: AsRef<str>>(&self, id: S) -> Result<Snapshot, Error> {
        let root: SnapshotRoot<Snapshot> = self
            .adapter
            .get(&["snapshots", id.as_ref()])
            .await?
            .fetch_json()
            .await?;
        Ok(root.snapshot)
    }

    /// Start creating a snapshot.
    pub async fn create_snapshot(&self, request: &NewSnapshot) -> Result<Snapshot, Error> {
        let root: SnapshotRoot<Snapshot> = self
            .adapter
            .post(&["snapshots"])
            .await?
            .json(&SnapshotRoot { snapshot: request })
            .fetch_json()
            .await?;
        debug!(
            "Requested snapshot {} of volume {}",
            root.snapshot.id, root.snapshot.volume_id
        );
        Ok(root.snapshot)
    }

    /// Start deleting a snapshot.
    pub async fn delete_snapshot<S: AsRef<str>>(&self, id: S) -> Result<(), Error> {
        let _ = self
            .adapter
            .delete(&["snapshots", id.as_ref()])
            .await?
            .send()
            .await?;
        debug!("Requested deletion of snapshot {}", id.as_ref());
        Ok(())
    }

    /// List volume types.
    pub async fn list_volume_types(&self) -> Result<Vec<VolumeType>, Error> {
        let root: VolumeTypesRoot = self
            .adapter
            .get(&["types"])
            .await?
            .fetch_json()
            .await?;
        Ok(root.volume_types)
    }

    /// Get a volume type by its ID.
    pub async fn get_volume_type<S: AsRef<str>>(&self, id: S) -> Result<VolumeType, Error> {
        let root: VolumeTypeRoot = self
            .adapter
            .get(&["types", id.as_ref()])
            .await?
            .fetch_json()
            .await?;
        Ok(root.volume_type)
    }

    /// Wait for a volume to reach the status.
    ///
    /// Fails with `OperationFailed` if the volume reaches an error status instead.
    pub async fn wait_for_volume_status<S: AsRef<str>>(
        &self,
        id: S,
        status: VolumeStatus,
        timeout: Duration,
        delay: Duration,
    ) -> Result<Volume, Error> {
        let id = id.as_ref();
        let description = format!("volume {} to reach status {}", id, status);
        let status = &status;
        utils::wait_for(timeout, delay, &description, move || async move {
            let volume = self.get_volume(id).await?;
            if &volume.status == status {
                Ok(Some(volume))
            } else if volume.status.is_error() {
                Err(Error::new(
                    ErrorKind::OperationFailed,
                    format!("Volume {} reached error status {}", id, volume.status),
                ))
            } else {
                Ok(None)
            }
        })
        .await
    }

    /// Wait for a snapshot to reach the status.
    pub async fn wait_for_snapshot_status<S: AsRef<str>>(
        &self,
        id: S,
        status: SnapshotStatus,
        timeout: Duration,
        delay: Duration,
    ) -> Result<Snapshot, Error> {
        let id = id.as_ref();
        let description = format!("snapshot {} to reach status {}", id, status);
        let status = &status;
        utils::wait_for(timeout, delay, &description, move || async move {
            let snapshot = self.get_snapshot(id).await?;
            if &snapshot.status == status {
                Ok(Some(snapshot))
            } else if snapshot.status.is_error() {
                Err(Error::new(
                    ErrorKind::OperationFailed,
                    format!("Snapshot {} reached error status {}", id, snapshot.status),
                ))
            } else {
                Ok(None)
            }
        })
        .await
    }

    /// Wait for a volume to disappear.
    pub async fn wait_for_volume_deleted<S: AsRef<str>>(
        &self,
        id: S,
        timeout: Duration,
        delay: Duration,
    ) -> Result<(), Error> {
        let id = id.as_ref();
        let description = format!("volume {} to be deleted", id);
        utils::wait_for(timeout, delay, &description, move || async move {
            match self.get_volume(id).await {
                Ok(volume) if volume.status == VolumeStatus::ErrorDeleting => Err(Error::new(
                    ErrorKind::OperationFailed,
                    format!("Failed to delete volume {}", id),
                )),
                Ok(_) => Ok(None),
                Err(err) if err.kind() == ErrorKind::ResourceNotFound => Ok(Some(())),
                Err(err) => Err(err),
            }
        })
        .await
    }
}

#[cfg(test)]
mod test {
    use super::{SnapshotQuery, VolumeQuery, VolumeSortKey, VolumeStatus};
    use crate::Query;

    #[test]
    fn test_queries() {
        let query: Query<VolumeQuery> = vec![
            VolumeQuery::Status(VolumeStatus::InUse),
            VolumeQuery::SortKey(VolumeSortKey::Name),
            VolumeQuery::AllTenants(true),
        ]
        .into();
        assert_eq!(
            serde_urlencoded::to_string(query).unwrap(),
            "status=in-use&sort_key=name&all_tenants=true"
        );
        let query = Query::default().with(SnapshotQuery::VolumeId("v1".into()));
        assert_eq!(serde_urlencoded::to_string(query).unwrap(), "volume_id=v1");
    }
}
