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

//! Object Storage API and its Rackspace CDN extension.
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), oscloud::Error> {
//! use oscloud::objectstorage::{ContainerCreated, ObjectOptions, ObjectStorage};
//!
//! let session = oscloud::Session::from_env().await?;
//! let storage = ObjectStorage::new(&session);
//! if storage.create_container("photos").await? == ContainerCreated::AlreadyExists {
//!     println!("Reusing existing container");
//! }
//! let options = ObjectOptions::new().with_content_type("text/plain");
//! storage
//!     .create_object("photos", "readme.txt", "Hello!", options)
//!     .await?;
//! # Ok(()) }
//! # #[tokio::main]
//! # async fn main() { example().await.unwrap(); }
//! ```

use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, FixedOffset};
use http::header::{HeaderMap, HeaderName, HeaderValue};
use log::{debug, trace};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::{Method, StatusCode};

use super::client::{RequestBuilder, NO_PATH};
use super::services::{GenericService, OBJECT_CDN, OBJECT_STORAGE};
use super::{Adapter, Error, ErrorKind, Page, Query};

mod metadata;
mod protocol;

pub use self::metadata::{validate_key, validate_value, Metadata};
pub use self::protocol::{
    AccountInfo, BulkDeleteResult, CdnContainer, Container, ContainerInfo, ContainerObject,
    ObjectInfo,
};

/// Characters to escape in object paths passed in headers and bulk requests.
const PATH_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'?')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}');

const MAX_CONTAINER_NAME: usize = 256;
const MAX_OBJECT_NAME: usize = 1024;

/// Query for listing containers.
#[derive(Debug, Clone, crate::QueryItem)]
#[non_exhaustive]
pub enum ContainerQuery {
    /// Only containers with names starting with the prefix.
    Prefix(String),
    /// Only containers with names before this one.
    EndMarker(String),
}

/// Query for listing objects.
#[derive(Debug, Clone, crate::QueryItem)]
#[non_exhaustive]
pub enum ObjectQuery {
    /// Only objects with names starting with the prefix.
    Prefix(String),
    /// Roll up names after the prefix into pseudo-directories using the delimiter.
    Delimiter(char),
    /// Only objects nested in the pseudo-directory.
    Path(String),
    /// Only objects with names before this one.
    EndMarker(String),
}

/// Outcome of creating a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerCreated {
    /// The container was created (HTTP 201).
    Created,
    /// The container already existed (HTTP 202).
    AlreadyExists,
}

/// Result of uploading an object.
#[derive(Debug, Clone)]
pub struct ObjectCreated {
    /// Entity tag of the new content.
    pub etag: Option<String>,
    /// Modification time reported by the server.
    pub last_modified: Option<DateTime<FixedOffset>>,
}

/// An object with its content.
#[derive(Debug, Clone)]
pub struct Object {
    /// Object headers.
    pub info: ObjectInfo,
    /// Object content.
    pub data: Bytes,
}

/// Options for uploading an object.
#[derive(Debug, Clone, Default)]
pub struct ObjectOptions {
    content_type: Option<String>,
    content_encoding: Option<String>,
    content_disposition: Option<String>,
    etag: Option<String>,
    if_none_match: bool,
    delete_after: Option<Duration>,
    delete_at: Option<u64>,
    metadata: Metadata,
}

impl ObjectOptions {
    /// Default options.
    #[inline]
    pub fn new() -> ObjectOptions {
        ObjectOptions::default()
    }

    /// Set the content type.
    pub fn with_content_type<S: Into<String>>(mut self, value: S) -> ObjectOptions {
        self.content_type = Some(value.into());
        self
    }

    /// Set the content encoding.
    pub fn with_content_encoding<S: Into<String>>(mut self, value: S) -> ObjectOptions {
        self.content_encoding = Some(value.into());
        self
    }

    /// Set the content disposition.
    pub fn with_content_disposition<S: Into<String>>(mut self, value: S) -> ObjectOptions {
        self.content_disposition = Some(value.into());
        self
    }

    /// Expected MD5 of the content, verified by the server.
    pub fn with_etag<S: Into<String>>(mut self, value: S) -> ObjectOptions {
        self.etag = Some(value.into());
        self
    }

    /// Fail with `PreconditionFailed` if the object already exists.
    pub fn with_if_none_match(mut self) -> ObjectOptions {
        self.if_none_match = true;
        self
    }

    /// Delete the object after the given time.
    pub fn with_delete_after(mut self, value: Duration) -> ObjectOptions {
        self.delete_after = Some(value);
        self
    }

    /// Delete the object at the given Unix timestamp.
    pub fn with_delete_at(mut self, value: u64) -> ObjectOptions {
        self.delete_at = Some(value);
        self
    }

    /// Add custom metadata.
    pub fn with_metadata(mut self, value: Metadata) -> ObjectOptions {
        self.metadata.extend(value);
        self
    }

    fn into_headers(self) -> Result<HeaderMap, Error> {
        let mut headers = self.metadata.to_headers("X-Object-Meta-")?;
        let strings = [
            (http::header::CONTENT_TYPE, self.content_type),
            (http::header::CONTENT_ENCODING, self.content_encoding),
            (http::header::CONTENT_DISPOSITION, self.content_disposition),
            (http::header::ETAG, self.etag),
        ];
        for (name, value) in strings {
            if let Some(value) = value {
                let _ = headers.insert(name, HeaderValue::from_str(&value)?);
            }
        }
        if self.if_none_match {
            let _ = headers.insert(http::header::IF_NONE_MATCH, HeaderValue::from_static("*"));
        }
        if let Some(value) = self.delete_after {
            let _ = headers.insert(
                HeaderName::from_static("x-delete-after"),
                HeaderValue::from(value.as_secs()),
            );
        }
        if let Some(value) = self.delete_at {
            let _ = headers.insert(
                HeaderName::from_static("x-delete-at"),
                HeaderValue::from(value),
            );
        }
        Ok(headers)
    }
}

/// CDN settings to apply to a container.
#[derive(Debug, Clone, Copy, Default)]
pub struct CdnOptions {
    /// Cache time-to-live.
    pub ttl: Option<Duration>,
    /// Whether to retain access logs.
    pub log_retention: Option<bool>,
}

impl CdnOptions {
    fn headers(&self, enabled: Option<bool>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let flags = [
            ("x-cdn-enabled", enabled),
            ("x-log-retention", self.log_retention),
        ];
        for (name, value) in flags {
            if let Some(value) = value {
                let _ = headers.insert(
                    HeaderName::from_static(name),
                    HeaderValue::from_static(if value { "True" } else { "False" }),
                );
            }
        }
        if let Some(ttl) = self.ttl {
            let _ = headers.insert(
                HeaderName::from_static("x-ttl"),
                HeaderValue::from(ttl.as_secs()),
            );
        }
        headers
    }
}

fn check_container(name: &str) -> Result<(), Error> {
    if name.is_empty() || name.len() > MAX_CONTAINER_NAME || name.contains('/') {
        Err(Error::new(
            ErrorKind::InvalidInput,
            format!("Invalid container name {:?}", name),
        ))
    } else {
        Ok(())
    }
}

fn check_object(name: &str) -> Result<(), Error> {
    if name.is_empty() || name.len() > MAX_OBJECT_NAME {
        Err(Error::new(
            ErrorKind::InvalidInput,
            format!("Invalid object name {:?}", name),
        ))
    } else {
        Ok(())
    }
}

fn object_path(container: &str, object: &str) -> String {
    format!(
        "/{}/{}",
        utf8_percent_encode(container, PATH_ESCAPE),
        utf8_percent_encode(object, PATH_ESCAPE)
    )
}

fn removal_headers<I, K>(prefix: &str, keys: I) -> Result<HeaderMap, Error>
where
    I: IntoIterator<Item = K>,
    K: AsRef<str>,
{
    let mut headers = HeaderMap::new();
    for key in keys {
        let key = key.as_ref();
        validate_key(key)?;
        let name = HeaderName::from_bytes(format!("{}{}", prefix, key).as_bytes())?;
        let _ = headers.insert(name, HeaderValue::from_static("x"));
    }
    Ok(headers)
}

/// Object Storage service client.
#[derive(Debug, Clone)]
pub struct ObjectStorage {
    adapter: Adapter<GenericService>,
}

service_client!(ObjectStorage: GenericService = OBJECT_STORAGE);

impl ObjectStorage {
    async fn object_request(
        &self,
        method: Method,
        container: &str,
        object: &str,
    ) -> Result<RequestBuilder<GenericService>, Error> {
        check_container(container)?;
        check_object(object)?;
        self.adapter
            .request(method, std::iter::once(container).chain(object.split('/')))
            .await
    }

    async fn container_request(
        &self,
        method: Method,
        container: &str,
    ) -> Result<RequestBuilder<GenericService>, Error> {
        check_container(container)?;
        self.adapter.request(method, &[container]).await
    }

    async fn cdn_request<I>(
        &self,
        method: Method,
        path: I,
    ) -> Result<RequestBuilder<GenericService>, Error>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.adapter
            .session()
            .request(OBJECT_CDN, method, path)
            .await
    }

    /// Get account information and metadata.
    pub async fn get_account(&self) -> Result<AccountInfo, Error> {
        let response = self.adapter.head(NO_PATH).await?.send().await?;
        Ok(AccountInfo::from_headers(response.headers()))
    }

    /// Add or update account metadata.
    pub async fn update_account_metadata(&self, metadata: &Metadata) -> Result<(), Error> {
        let headers = metadata.to_headers("X-Account-Meta-")?;
        let _ = self
            .adapter
            .post(NO_PATH)
            .await?
            .headers(headers)
            .send()
            .await?;
        Ok(())
    }

    /// Remove account metadata with the given keys.
    pub async fn delete_account_metadata<I, K>(&self, keys: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let headers = removal_headers("X-Remove-Account-Meta-", keys)?;
        let _ = self
            .adapter
            .post(NO_PATH)
            .await?
            .headers(headers)
            .send()
            .await?;
        Ok(())
    }

    /// List containers.
    pub async fn list_containers(
        &self,
        query: Query<ContainerQuery>,
        limit: Option<usize>,
        marker: Option<String>,
    ) -> Result<Page<Container>, Error> {
        trace!("Listing containers with {:?}", query);
        self.adapter
            .get(NO_PATH)
            .await?
            .query(&[("format", "json")])
            .query(&query)
            .fetch_page(limit, marker)
            .await
    }

    /// Create a container.
    ///
    /// Creating an existing container is not an error.
    pub async fn create_container<S: AsRef<str>>(
        &self,
        name: S,
    ) -> Result<ContainerCreated, Error> {
        let name = name.as_ref();
        let response = self
            .container_request(Method::PUT, name)
            .await?
            .send()
            .await?;
        let result = if response.status() == StatusCode::CREATED {
            ContainerCreated::Created
        } else {
            ContainerCreated::AlreadyExists
        };
        debug!("Container {}: {:?}", name, result);
        Ok(result)
    }

    /// Delete an empty container.
    ///
    /// Fails with `Conflict` if the container is not empty.
    pub async fn delete_container<S: AsRef<str>>(&self, name: S) -> Result<(), Error> {
        let name = name.as_ref();
        let _ = self
            .container_request(Method::DELETE, name)
            .await?
            .send()
            .await?;
        debug!("Deleted container {}", name);
        Ok(())
    }

    /// Get container information and metadata.
    pub async fn get_container<S: AsRef<str>>(&self, name: S) -> Result<ContainerInfo, Error> {
        let name = name.as_ref();
        let response = self
            .container_request(Method::HEAD, name)
            .await?
            .send()
            .await?;
        Ok(ContainerInfo::from_headers(
            name.to_string(),
            response.headers(),
        ))
    }

    /// Add or update container metadata.
    pub async fn update_container_metadata<S: AsRef<str>>(
        &self,
        name: S,
        metadata: &Metadata,
    ) -> Result<(), Error> {
        let headers = metadata.to_headers("X-Container-Meta-")?;
        let _ = self
            .container_request(Method::POST, name.as_ref())
            .await?
            .headers(headers)
            .send()
            .await?;
        Ok(())
    }

    /// Remove container metadata with the given keys.
    pub async fn delete_container_metadata<S, I, K>(&self, name: S, keys: I) -> Result<(), Error>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let headers = removal_headers("X-Remove-Container-Meta-", keys)?;
        let _ = self
            .container_request(Method::POST, name.as_ref())
            .await?
            .headers(headers)
            .send()
            .await?;
        Ok(())
    }

    /// List objects in a container.
    ///
    /// When using `ObjectQuery::Delimiter`, pseudo-directories are returned as objects with
    /// `is_directory` set.
    pub async fn list_objects<S: AsRef<str>>(
        &self,
        container: S,
        query: Query<ObjectQuery>,
        limit: Option<usize>,
        marker: Option<String>,
    ) -> Result<Page<ContainerObject>, Error> {
        trace!("Listing objects in {} with {:?}", container.as_ref(), query);
        self.container_request(Method::GET, container.as_ref())
            .await?
            .query(&[("format", "json")])
            .query(&query)
            .fetch_page(limit, marker)
            .await
    }

    /// Upload an object.
    ///
    /// With `ObjectOptions::with_if_none_match` the call fails with `PreconditionFailed` if the
    /// object already exists.
    pub async fn create_object<C, O, B>(
        &self,
        container: C,
        name: O,
        body: B,
        options: ObjectOptions,
    ) -> Result<ObjectCreated, Error>
    where
        C: AsRef<str>,
        O: AsRef<str>,
        B: Into<Bytes>,
    {
        let headers = options.into_headers()?;
        let response = self
            .object_request(Method::PUT, container.as_ref(), name.as_ref())
            .await?
            .headers(headers)
            .body(body.into())
            .send()
            .await?;
        let info = ObjectInfo::from_headers(response.headers());
        debug!(
            "Uploaded object {} to container {}",
            name.as_ref(),
            container.as_ref()
        );
        Ok(ObjectCreated {
            etag: info.etag,
            last_modified: info.last_modified,
        })
    }

    /// Download an object.
    pub async fn get_object<C, O>(&self, container: C, name: O) -> Result<Object, Error>
    where
        C: AsRef<str>,
        O: AsRef<str>,
    {
        let response = self
            .object_request(Method::GET, container.as_ref(), name.as_ref())
            .await?
            .send()
            .await?;
        let info = ObjectInfo::from_headers(response.headers());
        let data = response.bytes().await?;
        Ok(Object { info, data })
    }

    /// Get object headers and metadata.
    pub async fn get_object_info<C, O>(&self, container: C, name: O) -> Result<ObjectInfo, Error>
    where
        C: AsRef<str>,
        O: AsRef<str>,
    {
        let response = self
            .object_request(Method::HEAD, container.as_ref(), name.as_ref())
            .await?
            .send()
            .await?;
        Ok(ObjectInfo::from_headers(response.headers()))
    }

    async fn replace_object_metadata(
        &self,
        container: &str,
        name: &str,
        metadata: &Metadata,
    ) -> Result<(), Error> {
        let headers = metadata.to_headers("X-Object-Meta-")?;
        let _ = self
            .object_request(Method::POST, container, name)
            .await?
            .headers(headers)
            .send()
            .await?;
        Ok(())
    }

    /// Add or update object metadata.
    ///
    /// The server replaces all object metadata on update, so the existing metadata is fetched
    /// and merged first.
    pub async fn update_object_metadata<C, O>(
        &self,
        container: C,
        name: O,
        metadata: &Metadata,
    ) -> Result<(), Error>
    where
        C: AsRef<str>,
        O: AsRef<str>,
    {
        for (key, value) in metadata {
            validate_key(key)?;
            validate_value(value)?;
        }
        let (container, name) = (container.as_ref(), name.as_ref());
        let mut current = self.get_object_info(container, name).await?.metadata;
        current.extend(metadata.clone());
        self.replace_object_metadata(container, name, &current)
            .await
    }

    /// Remove object metadata with the given keys.
    pub async fn delete_object_metadata<C, O, I, K>(
        &self,
        container: C,
        name: O,
        keys: I,
    ) -> Result<(), Error>
    where
        C: AsRef<str>,
        O: AsRef<str>,
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let keys = keys
            .into_iter()
            .map(|key| validate_key(key.as_ref()).map(|_| key))
            .collect::<Result<Vec<_>, _>>()?;
        let (container, name) = (container.as_ref(), name.as_ref());
        let mut current = self.get_object_info(container, name).await?.metadata;
        for key in keys {
            let _ = current.remove(key);
        }
        self.replace_object_metadata(container, name, &current)
            .await
    }

    /// Delete an object.
    pub async fn delete_object<C, O>(&self, container: C, name: O) -> Result<(), Error>
    where
        C: AsRef<str>,
        O: AsRef<str>,
    {
        let _ = self
            .object_request(Method::DELETE, container.as_ref(), name.as_ref())
            .await?
            .send()
            .await?;
        debug!(
            "Deleted object {} from container {}",
            name.as_ref(),
            container.as_ref()
        );
        Ok(())
    }

    /// Copy an object on the server side.
    pub async fn copy_object<C1, O1, C2, O2>(
        &self,
        source_container: C1,
        source_name: O1,
        container: C2,
        name: O2,
    ) -> Result<ObjectCreated, Error>
    where
        C1: AsRef<str>,
        O1: AsRef<str>,
        C2: AsRef<str>,
        O2: AsRef<str>,
    {
        let (source_container, source_name) = (source_container.as_ref(), source_name.as_ref());
        check_container(source_container)?;
        check_object(source_name)?;
        let response = self
            .object_request(Method::PUT, container.as_ref(), name.as_ref())
            .await?
            .header("X-Copy-From", object_path(source_container, source_name))
            .header(http::header::CONTENT_LENGTH, "0")
            .send()
            .await?;
        let info = ObjectInfo::from_headers(response.headers());
        Ok(ObjectCreated {
            etag: info.etag,
            last_modified: info.last_modified,
        })
    }

    /// Move an object by copying it and deleting the source.
    pub async fn move_object<C1, O1, C2, O2>(
        &self,
        source_container: C1,
        source_name: O1,
        container: C2,
        name: O2,
    ) -> Result<ObjectCreated, Error>
    where
        C1: AsRef<str>,
        O1: AsRef<str>,
        C2: AsRef<str>,
        O2: AsRef<str>,
    {
        let result = self
            .copy_object(
                source_container.as_ref(),
                source_name.as_ref(),
                container,
                name,
            )
            .await?;
        self.delete_object(source_container, source_name).await?;
        Ok(result)
    }

    /// Upload segments and a manifest of a dynamic large object.
    ///
    /// Segments are stored in `segment_container` as `<name>/<index>` with zero-padded indexes,
    /// the manifest is stored as `name` in `container`.
    pub async fn create_dynamic_large_object<C, O, S, I>(
        &self,
        container: C,
        name: O,
        segment_container: S,
        segments: I,
        options: ObjectOptions,
    ) -> Result<ObjectCreated, Error>
    where
        C: AsRef<str>,
        O: AsRef<str>,
        S: AsRef<str>,
        I: IntoIterator,
        I::Item: Into<Bytes>,
    {
        let (name, segment_container) = (name.as_ref(), segment_container.as_ref());
        check_container(segment_container)?;
        let headers = options.into_headers()?;
        let mut count = 0usize;
        for (index, segment) in segments.into_iter().enumerate() {
            let segment_name = format!("{}/{:08}", name, index);
            let _ = self
                .create_object(segment_container, &segment_name, segment, ObjectOptions::new())
                .await?;
            count += 1;
        }
        debug!(
            "Uploaded {} segments of {} to container {}",
            count, name, segment_container
        );

        let manifest = format!(
            "{}/{}/",
            utf8_percent_encode(segment_container, PATH_ESCAPE),
            utf8_percent_encode(name, PATH_ESCAPE)
        );
        let response = self
            .object_request(Method::PUT, container.as_ref(), name)
            .await?
            .headers(headers)
            .header("X-Object-Manifest", manifest)
            .body(Bytes::new())
            .send()
            .await?;
        let info = ObjectInfo::from_headers(response.headers());
        Ok(ObjectCreated {
            etag: info.etag,
            last_modified: info.last_modified,
        })
    }

    /// Delete many objects (or empty containers) in one request.
    ///
    /// An empty object name refers to the container itself.
    pub async fn bulk_delete<I, C, O>(&self, items: I) -> Result<BulkDeleteResult, Error>
    where
        I: IntoIterator<Item = (C, O)>,
        C: AsRef<str>,
        O: AsRef<str>,
    {
        let mut body = String::new();
        for (container, object) in items {
            let (container, object) = (container.as_ref(), object.as_ref());
            check_container(container)?;
            if object.is_empty() {
                body.push('/');
                body.extend(utf8_percent_encode(container, PATH_ESCAPE));
            } else {
                body.push_str(&object_path(container, object));
            }
            body.push('\n');
        }

        let result: BulkDeleteResult = self
            .adapter
            .post(NO_PATH)
            .await?
            .query(&[("bulk-delete", "true")])
            .header(http::header::CONTENT_TYPE, "text/plain")
            .header(http::header::ACCEPT, "application/json")
            .body(body)
            .fetch_json()
            .await?;
        debug!(
            "Bulk delete: {} deleted, {} not found, status {}",
            result.deleted, result.not_found, result.status
        );
        Ok(result)
    }

    /// List containers known to the CDN service.
    pub async fn list_cdn_containers(
        &self,
        limit: Option<usize>,
        marker: Option<String>,
    ) -> Result<Page<CdnContainer>, Error> {
        self.cdn_request(Method::GET, NO_PATH)
            .await?
            .query(&[("format", "json")])
            .fetch_page(limit, marker)
            .await
    }

    /// Get CDN settings of a container.
    pub async fn get_cdn_container<S: AsRef<str>>(&self, name: S) -> Result<CdnContainer, Error> {
        let name = name.as_ref();
        check_container(name)?;
        let response = self.cdn_request(Method::HEAD, &[name]).await?.send().await?;
        Ok(CdnContainer::from_headers(
            name.to_string(),
            response.headers(),
        ))
    }

    /// Publish a container via CDN.
    pub async fn enable_cdn<S: AsRef<str>>(
        &self,
        name: S,
        options: CdnOptions,
    ) -> Result<CdnContainer, Error> {
        let name = name.as_ref();
        check_container(name)?;
        let response = self
            .cdn_request(Method::PUT, &[name])
            .await?
            .headers(options.headers(Some(true)))
            .send()
            .await?;
        debug!("Enabled CDN for container {}", name);
        Ok(CdnContainer::from_headers(
            name.to_string(),
            response.headers(),
        ))
    }

    /// Stop publishing a container via CDN.
    pub async fn disable_cdn<S: AsRef<str>>(&self, name: S) -> Result<(), Error> {
        let name = name.as_ref();
        check_container(name)?;
        let _ = self
            .cdn_request(Method::POST, &[name])
            .await?
            .headers(CdnOptions::default().headers(Some(false)))
            .send()
            .await?;
        debug!("Disabled CDN for container {}", name);
        Ok(())
    }

    /// Update CDN settings of a published container.
    pub async fn update_cdn<S: AsRef<str>>(
        &self,
        name: S,
        options: CdnOptions,
    ) -> Result<(), Error> {
        let name = name.as_ref();
        check_container(name)?;
        let _ = self
            .cdn_request(Method::POST, &[name])
            .await?
            .headers(options.headers(None))
            .send()
            .await?;
        Ok(())
    }

    /// Remove an object from the CDN edge caches.
    ///
    /// A notification is sent to the email addresses if provided.
    pub async fn purge_cdn_object<C, O>(
        &self,
        container: C,
        name: O,
        emails: &[&str],
    ) -> Result<(), Error>
    where
        C: AsRef<str>,
        O: AsRef<str>,
    {
        let (container, name) = (container.as_ref(), name.as_ref());
        check_container(container)?;
        check_object(name)?;
        let mut builder = self
            .cdn_request(
                Method::DELETE,
                std::iter::once(container).chain(name.split('/')),
            )
            .await?;
        if !emails.is_empty() {
            builder = builder.header("X-Purge-Email", emails.join(", "));
        }
        let _ = builder.send().await?;
        debug!("Purged object {} of container {} from CDN", name, container);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::{
        check_container, check_object, object_path, removal_headers, CdnOptions, ContainerQuery,
        Metadata, ObjectOptions, ObjectQuery,
    };
    use crate::{ErrorKind, Query};

    #[test]
    fn test_names() {
        check_container("photos").unwrap();
        assert!(check_container("").is_err());
        assert!(check_container("a/b").is_err());
        check_object("a/b/c.txt").unwrap();
        assert!(check_object("").is_err());
    }

    #[test]
    fn test_object_path() {
        assert_eq!(object_path("c 1", "a/b?.txt"), "/c%201/a/b%3F.txt");
    }

    #[test]
    fn test_object_options() {
        let headers = ObjectOptions::new()
            .with_content_type("text/plain")
            .with_if_none_match()
            .with_delete_after(Duration::from_secs(3600))
            .with_metadata(Metadata::new().with("Color", "blue"))
            .into_headers()
            .unwrap();
        assert_eq!(headers.get("content-type").unwrap(), "text/plain");
        assert_eq!(headers.get("if-none-match").unwrap(), "*");
        assert_eq!(headers.get("x-delete-after").unwrap(), "3600");
        assert_eq!(headers.get("x-object-meta-color").unwrap(), "blue");
    }

    #[test]
    fn test_object_options_invalid_metadata() {
        let err = ObjectOptions::new()
            .with_metadata(Metadata::new().with("bad key", "value"))
            .into_headers()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_cdn_options() {
        let options = CdnOptions {
            ttl: Some(Duration::from_secs(900)),
            log_retention: Some(false),
        };
        let headers = options.headers(Some(true));
        assert_eq!(headers.get("x-cdn-enabled").unwrap(), "True");
        assert_eq!(headers.get("x-log-retention").unwrap(), "False");
        assert_eq!(headers.get("x-ttl").unwrap(), "900");
        assert!(CdnOptions::default().headers(None).is_empty());
    }

    #[test]
    fn test_removal_headers() {
        let headers = removal_headers("X-Remove-Container-Meta-", ["Color"]).unwrap();
        assert!(headers.contains_key("x-remove-container-meta-color"));
        assert!(removal_headers("X-Remove-Container-Meta-", ["a_b"]).is_err());
    }

    #[test]
    fn test_queries() {
        let query: Query<ObjectQuery> = vec![
            ObjectQuery::Prefix("logs/".into()),
            ObjectQuery::Delimiter('/'),
        ]
        .into();
        assert_eq!(
            serde_urlencoded::to_string(query).unwrap(),
            "prefix=logs%2F&delimiter=%2F"
        );
        let query = Query::default().with(ContainerQuery::EndMarker("z".into()));
        assert_eq!(serde_urlencoded::to_string(query).unwrap(), "end_marker=z");
    }
}
