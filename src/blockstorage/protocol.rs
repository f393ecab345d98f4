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

//! JSON structures and protocol bits for the Block Storage API.

#![allow(missing_docs)]

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::de::{Error as DeserError, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};

protocol_enum! {
    #[doc = "Possible volume statuses."]
    enum VolumeStatus(Other) {
        Creating = "creating",
        Available = "available",
        Reserved = "reserved",
        Attaching = "attaching",
        Detaching = "detaching",
        InUse = "in-use",
        Maintenance = "maintenance",
        Deleting = "deleting",
        AwaitingTransfer = "awaiting-transfer",
        Error = "error",
        ErrorDeleting = "error_deleting",
        BackingUp = "backing-up",
        RestoringBackup = "restoring-backup",
        ErrorBackingUp = "error_backing-up",
        ErrorRestoring = "error_restoring",
        ErrorExtending = "error_extending",
        Downloading = "downloading",
        Uploading = "uploading",
        Retyping = "retyping",
        Extending = "extending"
    }
}

impl VolumeStatus {
    /// Whether the status is one of the error statuses.
    pub fn is_error(&self) -> bool {
        self.as_str().starts_with("error")
    }
}

protocol_enum! {
    #[doc = "Possible snapshot statuses."]
    enum SnapshotStatus(Other) {
        Creating = "creating",
        Available = "available",
        BackingUp = "backing-up",
        Deleting = "deleting",
        Error = "error",
        Deleted = "deleted",
        Unmanaging = "unmanaging",
        Restoring = "restoring",
        ErrorDeleting = "error_deleting"
    }
}

impl SnapshotStatus {
    /// Whether the status is one of the error statuses.
    pub fn is_error(&self) -> bool {
        self.as_str().starts_with("error")
    }
}

protocol_enum! {
    #[doc = "Available sort keys."]
    enum VolumeSortKey {
        CreatedAt = "created_at",
        Id = "id",
        Name = "name",
        UpdatedAt = "updated_at"
    }
}

impl Default for VolumeSortKey {
    fn default() -> VolumeSortKey {
        VolumeSortKey::CreatedAt
    }
}

/// Cinder reports some flags as strings.
fn bool_or_string<'de, D>(des: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Str(String),
    }

    match Flag::deserialize(des)? {
        Flag::Bool(value) => Ok(value),
        Flag::Str(value) => match value.to_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(D::Error::invalid_value(
                Unexpected::Str(&value),
                &"true or false",
            )),
        },
    }
}

/// An attachment of a volume to a server.
#[derive(Clone, Debug, Deserialize)]
pub struct VolumeAttachment {
    /// Attachment ID.
    #[serde(default)]
    pub attachment_id: Option<String>,
    /// Server the volume is attached to.
    pub server_id: String,
    /// Device name on the server.
    #[serde(default)]
    pub device: Option<String>,
}

/// A volume.
#[derive(Clone, Debug, Deserialize, crate::PaginatedResource)]
pub struct Volume {
    /// Volume ID.
    #[resource_id]
    pub id: String,
    /// Volume name.
    #[serde(default)]
    pub name: Option<String>,
    /// Volume description.
    #[serde(default)]
    pub description: Option<String>,
    /// Volume status.
    pub status: VolumeStatus,
    /// Size in GiB.
    pub size: u64,
    /// Volume type name.
    #[serde(default)]
    pub volume_type: Option<String>,
    /// Availability zone.
    #[serde(default)]
    pub availability_zone: Option<String>,
    /// Whether the volume is bootable.
    #[serde(default, deserialize_with = "bool_or_string")]
    pub bootable: bool,
    /// Whether the volume is encrypted.
    #[serde(default)]
    pub encrypted: bool,
    /// Whether the volume can be attached to several servers.
    #[serde(default)]
    pub multiattach: bool,
    /// Attachments.
    #[serde(default)]
    pub attachments: Vec<VolumeAttachment>,
    /// Snapshot the volume was created from.
    #[serde(default)]
    pub snapshot_id: Option<String>,
    /// Volume the volume was cloned from.
    #[serde(default)]
    pub source_volid: Option<String>,
    /// Volume metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Creation time.
    pub created_at: NaiveDateTime,
    /// Last update time.
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

/// A volume snapshot.
#[derive(Clone, Debug, Deserialize, crate::PaginatedResource)]
pub struct Snapshot {
    /// Snapshot ID.
    #[resource_id]
    pub id: String,
    /// Snapshot name.
    #[serde(default)]
    pub name: Option<String>,
    /// Snapshot description.
    #[serde(default)]
    pub description: Option<String>,
    /// Snapshot status.
    pub status: SnapshotStatus,
    /// Size in GiB.
    pub size: u64,
    /// Source volume.
    pub volume_id: String,
    /// Snapshot metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Creation time.
    pub created_at: NaiveDateTime,
}

/// A volume type.
#[derive(Clone, Debug, Deserialize)]
pub struct VolumeType {
    /// Type ID.
    pub id: String,
    /// Type name.
    pub name: String,
    /// Type description.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the type is public.
    #[serde(default = "default_true", rename = "os-volume-type-access:is_public")]
    pub is_public: bool,
    /// Extra specifications.
    #[serde(default)]
    pub extra_specs: HashMap<String, String>,
}

fn default_true() -> bool {
    true
}

/// Request to create a volume.
#[derive(Clone, Debug, Serialize)]
pub struct NewVolume {
    /// Size in GiB.
    pub size: u64,
    /// Volume name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Volume description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Volume type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_type: Option<String>,
    /// Availability zone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    /// Snapshot to create the volume from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    /// Volume to clone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_volid: Option<String>,
    /// Image to create the volume from.
    #[serde(rename = "imageRef", skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    /// Volume metadata.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl NewVolume {
    /// Start a request for a volume of the given size.
    pub fn new(size: u64) -> NewVolume {
        NewVolume {
            size,
            name: None,
            description: None,
            volume_type: None,
            availability_zone: None,
            snapshot_id: None,
            source_volid: None,
            image_id: None,
            metadata: HashMap::new(),
        }
    }
}

/// Request to update a volume.
#[derive(Clone, Debug, Default, Serialize)]
pub struct VolumeUpdate {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
}

/// Request to create a snapshot.
#[derive(Clone, Debug, Serialize)]
pub struct NewSnapshot {
    /// Volume to snapshot.
    pub volume_id: String,
    /// Snapshot name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Snapshot description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Allow snapshots of attached volumes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
    /// Snapshot metadata.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl NewSnapshot {
    /// Start a request for a snapshot of the volume.
    pub fn new<S: Into<String>>(volume_id: S) -> NewSnapshot {
        NewSnapshot {
            volume_id: volume_id.into(),
            name: None,
            description: None,
            force: None,
            metadata: HashMap::new(),
        }
    }
}

/// A volume root.
#[derive(Debug, Serialize, Deserialize)]
pub struct VolumeRoot<T> {
    pub volume: T,
}

/// A snapshot root.
#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotRoot<T> {
    pub snapshot: T,
}

/// A volume type root.
#[derive(Debug, Deserialize)]
pub struct VolumeTypeRoot {
    pub volume_type: VolumeType,
}

/// A list of volume types.
#[derive(Debug, Deserialize)]
pub struct VolumeTypesRoot {
    pub volume_types: Vec<VolumeType>,
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::common::test::compare;

    #[test]
    fn test_volume_parse() {
        let root: VolumeRoot<Volume> = serde_json::from_str(
            r#"{"volume": {
                "id": "6edbc2f4-1507-44f8-ac0d-eed1d2608d38",
                "name": null,
                "status": "in-use",
                "size": 10,
                "bootable": "true",
                "attachments": [{"server_id": "f4fda93b", "attachment_id": "a1",
                                 "device": "/dev/vdb"}],
                "metadata": {"readonly": "False"},
                "created_at": "2016-05-17T09:46:49.000000"
            }}"#,
        )
        .unwrap();
        let volume = root.volume;
        assert_eq!(volume.status, VolumeStatus::InUse);
        assert!(volume.bootable);
        assert!(volume.name.is_none());
        assert_eq!(volume.attachments[0].device.as_deref(), Some("/dev/vdb"));
    }

    #[test]
    fn test_statuses() {
        assert!(VolumeStatus::ErrorExtending.is_error());
        assert!(VolumeStatus::from("error_managing").is_error());
        assert!(!VolumeStatus::Available.is_error());
        assert!(SnapshotStatus::ErrorDeleting.is_error());
    }

    #[test]
    fn test_bad_bootable() {
        let result: Result<Volume, _> = serde_json::from_str(
            r#"{"id": "1", "status": "available", "size": 1, "bootable": "maybe",
                "created_at": "2016-05-17T09:46:49.000000"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_new_volume_serialize() {
        let mut volume = NewVolume::new(20);
        volume.name = Some("data".into());
        compare(
            r#"{"volume": {"size": 20, "name": "data"}}"#,
            VolumeRoot { volume: &volume },
        );
    }
}
