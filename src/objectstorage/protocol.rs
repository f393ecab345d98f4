// Copyright 2022 Dmitry Tantsur <dtantsur@protonmail.com>
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

//! JSON structures and protocol bits for the Object Storage API.

#![allow(missing_docs)]

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use http::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE, ETAG, LAST_MODIFIED};
use serde::{Deserialize, Serialize};

use super::Metadata;

pub(crate) const ACCOUNT_META: &str = "x-account-meta-";
pub(crate) const CONTAINER_META: &str = "x-container-meta-";
pub(crate) const OBJECT_META: &str = "x-object-meta-";

pub(crate) fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

pub(crate) fn header_parse<T: FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    header_str(headers, name).and_then(|value| value.trim().parse().ok())
}

fn header_bool(headers: &HeaderMap, name: &str) -> bool {
    header_str(headers, name)
        .map(|value| value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn header_date(headers: &HeaderMap, name: impl AsRef<str>) -> Option<DateTime<FixedOffset>> {
    header_str(headers, name.as_ref()).and_then(|value| DateTime::parse_from_rfc2822(value).ok())
}

/// Account information.
#[derive(Debug, Clone)]
pub struct AccountInfo {
    /// Number of containers.
    pub container_count: u64,
    /// Total number of objects.
    pub object_count: u64,
    /// Total size of all objects.
    pub bytes_used: u64,
    /// Custom account metadata.
    pub metadata: Metadata,
}

impl AccountInfo {
    pub(crate) fn from_headers(headers: &HeaderMap) -> AccountInfo {
        AccountInfo {
            container_count: header_parse(headers, "x-account-container-count").unwrap_or(0),
            object_count: header_parse(headers, "x-account-object-count").unwrap_or(0),
            bytes_used: header_parse(headers, "x-account-bytes-used").unwrap_or(0),
            metadata: Metadata::from_headers(headers, ACCOUNT_META),
        }
    }
}

/// A container as returned by a listing.
#[derive(Debug, Clone, Deserialize, Serialize, crate::PaginatedResource)]
#[flat_collection]
pub struct Container {
    /// Container name.
    #[resource_id]
    pub name: String,
    /// Number of objects.
    #[serde(default)]
    pub count: u64,
    /// Total size of objects.
    #[serde(default)]
    pub bytes: u64,
    /// Last modification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<NaiveDateTime>,
}

/// Detailed information about a container.
#[derive(Debug, Clone)]
pub struct ContainerInfo {
    /// Container name.
    pub name: String,
    /// Number of objects.
    pub object_count: u64,
    /// Total size of objects.
    pub bytes_used: u64,
    /// Read access control list.
    pub read_acl: Option<String>,
    /// Write access control list.
    pub write_acl: Option<String>,
    /// Custom container metadata.
    pub metadata: Metadata,
}

impl ContainerInfo {
    pub(crate) fn from_headers(name: String, headers: &HeaderMap) -> ContainerInfo {
        ContainerInfo {
            name,
            object_count: header_parse(headers, "x-container-object-count").unwrap_or(0),
            bytes_used: header_parse(headers, "x-container-bytes-used").unwrap_or(0),
            read_acl: header_str(headers, "x-container-read").map(From::from),
            write_acl: header_str(headers, "x-container-write").map(From::from),
            metadata: Metadata::from_headers(headers, CONTAINER_META),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListingEntry {
    Object {
        name: String,
        hash: String,
        bytes: u64,
        content_type: Option<String>,
        last_modified: Option<NaiveDateTime>,
    },
    Directory {
        subdir: String,
    },
}

/// An object (or a pseudo-directory) as returned by a listing.
#[derive(Debug, Clone, Deserialize, crate::PaginatedResource)]
#[serde(from = "ListingEntry")]
#[flat_collection]
pub struct ContainerObject {
    /// Object name (or a prefix for pseudo-directories).
    #[resource_id]
    pub name: String,
    /// MD5 hash of the content (empty for pseudo-directories).
    pub hash: String,
    /// Object size.
    pub bytes: u64,
    /// Content type.
    pub content_type: Option<String>,
    /// Last modification time.
    pub last_modified: Option<NaiveDateTime>,
    /// Whether the entry is a pseudo-directory returned when using a delimiter.
    pub is_directory: bool,
}

impl From<ListingEntry> for ContainerObject {
    fn from(value: ListingEntry) -> ContainerObject {
        match value {
            ListingEntry::Object {
                name,
                hash,
                bytes,
                content_type,
                last_modified,
            } => ContainerObject {
                name,
                hash,
                bytes,
                content_type,
                last_modified,
                is_directory: false,
            },
            ListingEntry::Directory { subdir } => ContainerObject {
                name: subdir,
                hash: String::new(),
                bytes: 0,
                content_type: None,
                last_modified: None,
                is_directory: true,
            },
        }
    }
}

/// Information about an object, taken from its headers.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    /// Object size.
    pub content_length: u64,
    /// Content type.
    pub content_type: Option<String>,
    /// Entity tag (usually MD5 of the content).
    pub etag: Option<String>,
    /// Last modification time.
    pub last_modified: Option<DateTime<FixedOffset>>,
    /// Unix timestamp when the object is scheduled for deletion.
    pub delete_at: Option<u64>,
    /// Manifest of a dynamic large object.
    pub manifest: Option<String>,
    /// Custom object metadata.
    pub metadata: Metadata,
}

impl ObjectInfo {
    pub(crate) fn from_headers(headers: &HeaderMap) -> ObjectInfo {
        ObjectInfo {
            content_length: header_parse(headers, CONTENT_LENGTH.as_str()).unwrap_or(0),
            content_type: header_str(headers, CONTENT_TYPE.as_str()).map(From::from),
            etag: header_str(headers, ETAG.as_str()).map(|x| x.trim_matches('"').to_string()),
            last_modified: header_date(headers, LAST_MODIFIED),
            delete_at: header_parse(headers, "x-delete-at"),
            manifest: header_str(headers, "x-object-manifest").map(From::from),
            metadata: Metadata::from_headers(headers, OBJECT_META),
        }
    }
}

/// CDN settings of a container.
#[derive(Debug, Clone, Deserialize, crate::PaginatedResource)]
#[flat_collection]
pub struct CdnContainer {
    /// Container name.
    #[resource_id]
    pub name: String,
    /// Whether the container is published.
    #[serde(default)]
    pub cdn_enabled: bool,
    /// Cache time-to-live in seconds.
    #[serde(default)]
    pub ttl: u64,
    /// Whether access logs are retained.
    #[serde(default)]
    pub log_retention: bool,
    /// HTTP URI.
    #[serde(default)]
    pub cdn_uri: Option<String>,
    /// HTTPS URI.
    #[serde(default)]
    pub cdn_ssl_uri: Option<String>,
    /// Streaming URI.
    #[serde(default)]
    pub cdn_streaming_uri: Option<String>,
    /// iOS streaming URI.
    #[serde(default)]
    pub cdn_ios_uri: Option<String>,
}

impl CdnContainer {
    pub(crate) fn from_headers(name: String, headers: &HeaderMap) -> CdnContainer {
        CdnContainer {
            name,
            cdn_enabled: header_bool(headers, "x-cdn-enabled"),
            ttl: header_parse(headers, "x-ttl").unwrap_or(0),
            log_retention: header_bool(headers, "x-log-retention"),
            cdn_uri: header_str(headers, "x-cdn-uri").map(From::from),
            cdn_ssl_uri: header_str(headers, "x-cdn-ssl-uri").map(From::from),
            cdn_streaming_uri: header_str(headers, "x-cdn-streaming-uri").map(From::from),
            cdn_ios_uri: header_str(headers, "x-cdn-ios-uri").map(From::from),
        }
    }
}

/// Result of a bulk delete operation.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkDeleteResult {
    /// Number of deleted items.
    #[serde(rename = "Number Deleted", default)]
    pub deleted: u64,
    /// Number of items that did not exist.
    #[serde(rename = "Number Not Found", default)]
    pub not_found: u64,
    /// Status of the whole operation (e.g. `200 OK`).
    #[serde(rename = "Response Status", default)]
    pub status: String,
    /// Failed items as pairs of paths and statuses.
    #[serde(rename = "Errors", default)]
    pub errors: Vec<(String, String)>,
}

impl BulkDeleteResult {
    /// Whether all items were deleted (or were already missing).
    #[inline]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod test {
    use http::header::{HeaderMap, HeaderValue};

    use super::*;

    #[test]
    fn test_container_listing() {
        let items: Vec<Container> = serde_json::from_str(
            r#"[{"count": 3, "bytes": 1024, "name": "photos",
                 "last_modified": "2016-02-05T16:14:38.542930"},
                {"count": 0, "bytes": 0, "name": "empty"}]"#,
        )
        .unwrap();
        assert_eq!(items[0].name, "photos");
        assert_eq!(items[0].count, 3);
        assert!(items[0].last_modified.is_some());
        assert!(items[1].last_modified.is_none());
    }

    #[test]
    fn test_object_listing_with_directories() {
        let items: Vec<ContainerObject> = serde_json::from_str(
            r#"[{"subdir": "logs/"},
                {"hash": "d41d8cd98f00b204e9800998ecf8427e", "last_modified":
                 "2014-01-15T16:37:43.427570", "bytes": 0, "name": "readme.txt",
                 "content_type": "text/plain"}]"#,
        )
        .unwrap();
        assert!(items[0].is_directory);
        assert_eq!(items[0].name, "logs/");
        assert!(!items[1].is_directory);
        assert_eq!(items[1].content_type.as_deref(), Some("text/plain"));
    }

    #[test]
    fn test_object_info() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert("content-length", HeaderValue::from_static("42"));
        let _ = headers.insert("etag", HeaderValue::from_static("\"abcd\""));
        let _ = headers.insert(
            "last-modified",
            HeaderValue::from_static("Thu, 16 Jan 2014 21:12:31 GMT"),
        );
        let _ = headers.insert("x-delete-at", HeaderValue::from_static("1700000000"));
        let _ = headers.insert("x-object-meta-color", HeaderValue::from_static("blue"));
        let info = ObjectInfo::from_headers(&headers);
        assert_eq!(info.content_length, 42);
        assert_eq!(info.etag.as_deref(), Some("abcd"));
        assert!(info.last_modified.is_some());
        assert_eq!(info.delete_at, Some(1_700_000_000));
        assert_eq!(info.metadata.get("Color"), Some("blue"));
    }

    #[test]
    fn test_cdn_container() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert("x-cdn-enabled", HeaderValue::from_static("True"));
        let _ = headers.insert("x-ttl", HeaderValue::from_static("259200"));
        let _ = headers.insert("x-log-retention", HeaderValue::from_static("False"));
        let _ = headers.insert(
            "x-cdn-uri",
            HeaderValue::from_static("http://abc.r1.cf1.rackcdn.com"),
        );
        let cdn = CdnContainer::from_headers("photos".into(), &headers);
        assert!(cdn.cdn_enabled);
        assert!(!cdn.log_retention);
        assert_eq!(cdn.ttl, 259_200);
        assert!(cdn.cdn_ssl_uri.is_none());
    }

    #[test]
    fn test_bulk_delete_result() {
        let result: BulkDeleteResult = serde_json::from_str(
            r#"{"Number Not Found": 1, "Response Status": "400 Bad Request",
                "Errors": [["/c/o", "409 Conflict"]], "Number Deleted": 2,
                "Response Body": ""}"#,
        )
        .unwrap();
        assert_eq!(result.deleted, 2);
        assert!(!result.is_success());
    }
}
