// Copyright 2021 Dmitry Tantsur <dtantsur@protonmail.com>
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

//! Pages of resources.

use std::fmt::Debug;
use std::ops::Deref;

#[cfg(feature = "stream")]
use futures::Stream;
use log::trace;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::client::RequestBuilder;
use super::Error;

/// A single resource that can be listed page by page.
///
/// This trait can normally be derived. You need to add a `#[resource_id]` attribute to the field
/// that serves as a pagination marker. You may also need to add a
/// `#[collection_name = "resources"]` attribute to the structure with the name of the field that
/// is returned in the collection (e.g. "servers" for Compute servers) or `#[flat_collection]`
/// if the response is a plain list (e.g. Object Storage containers).
pub trait PaginatedResource: Sized {
    /// Type of an ID.
    type Id: Clone + Debug + Serialize + Send + Sync;

    /// Root type of the listing.
    type Root: ResourceCollection<Self>;

    /// Whether the service accepts a `marker` query parameter.
    ///
    /// Services that do not support markers are only paginated using links.
    const SUPPORTS_MARKER: bool = true;

    /// Retrieve a copy of the ID.
    fn resource_id(&self) -> Self::Id;
}

/// A collection of resources as returned by a listing call.
pub trait ResourceCollection<T>: DeserializeOwned + Send {
    /// Extract the items.
    fn into_items(self) -> Vec<T>;

    /// A link to the next page (if provided by the service).
    fn next_link(&self) -> Option<Url> {
        None
    }
}

impl<T> ResourceCollection<T> for Vec<T>
where
    T: DeserializeOwned + Send,
{
    fn into_items(self) -> Vec<T> {
        self
    }
}

/// Way to get to the next page.
#[derive(Debug, Clone)]
pub(crate) enum Next<Id> {
    Marker(Id),
    Link(Url),
}

#[derive(Debug, Serialize)]
struct PageQuery<'m, Id> {
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    marker: Option<&'m Id>,
}

/// Information required to fetch the next page.
#[derive(Debug)]
pub(crate) struct Cursor<Id> {
    base: RequestBuilder,
    limit: Option<usize>,
    next: Next<Id>,
}

/// One page of resources.
///
/// Dereferences to a slice of items. The next page is fetched by following an explicit `next`
/// link when the service returns one, otherwise by using the ID of the last item as a marker.
#[derive(Debug)]
pub struct Page<T: PaginatedResource> {
    items: Vec<T>,
    cursor: Option<Cursor<T::Id>>,
}

impl<T> Page<T>
where
    T: PaginatedResource,
{
    /// Fetch a page using the base request and the optional marker or link.
    pub(crate) async fn fetch(
        base: RequestBuilder,
        limit: Option<usize>,
        next: Option<Next<T::Id>>,
    ) -> Result<Page<T>, Error> {
        let request = base.try_clone()?;
        let request = match next {
            Some(Next::Link(ref url)) => request.with_url(url.clone())?,
            Some(Next::Marker(ref marker)) => request.query(&PageQuery {
                limit,
                marker: Some(marker),
            }),
            None => request.query(&PageQuery::<T::Id> {
                limit,
                marker: None,
            }),
        };

        let body = request.send().await?.bytes().await?;
        // Object Storage answers HTTP 204 with no body for empty listings.
        let root: T::Root = if body.iter().all(u8::is_ascii_whitespace) {
            serde_json::from_slice(b"[]")?
        } else {
            serde_json::from_slice(&body)?
        };

        let link = root.next_link();
        let items = root.into_items();
        let next = match link {
            Some(url) => Some(Next::Link(url)),
            None if T::SUPPORTS_MARKER => match items.last() {
                Some(last) if limit.map(|l| items.len() >= l).unwrap_or(true) => {
                    Some(Next::Marker(last.resource_id()))
                }
                _ => None,
            },
            None => None,
        };
        trace!(
            "Received a page of {} items, next page via {:?}",
            items.len(),
            next
        );

        Ok(Page {
            items,
            cursor: next.map(|next| Cursor { base, limit, next }),
        })
    }

    /// Items on this page.
    #[inline]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Convert into the items on this page, discarding the pagination information.
    #[inline]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Whether the next page may exist.
    ///
    /// Fetching the next page may still yield an empty page.
    #[inline]
    pub fn has_next_page(&self) -> bool {
        self.cursor.is_some()
    }

    /// Fetch the next page.
    ///
    /// Returns `None` when this page is the last one.
    pub async fn next_page(&self) -> Result<Option<Page<T>>, Error> {
        match self.cursor {
            Some(ref cursor) => Page::fetch(
                cursor.base.try_clone()?,
                cursor.limit,
                Some(cursor.next.clone()),
            )
            .await
            .map(Some),
            None => Ok(None),
        }
    }

    /// Fetch all remaining pages and return all items (including the items on this page).
    pub async fn all_pages(self) -> Result<Vec<T>, Error> {
        let mut next = self.next_page().await?;
        let mut result = self.items;
        while let Some(page) = next {
            if page.items.is_empty() {
                break;
            }
            next = page.next_page().await?;
            result.extend(page.items);
        }
        Ok(result)
    }

    /// Convert into a stream of items starting with this page.
    #[cfg(feature = "stream")]
    pub fn into_stream(self) -> impl Stream<Item = Result<T, Error>> {
        super::stream::items(self)
    }

    pub(crate) fn into_parts(self) -> (Vec<T>, Option<Cursor<T::Id>>) {
        (self.items, self.cursor)
    }
}

impl<Id> Cursor<Id>
where
    Id: Clone + Debug + Serialize + Send + Sync,
{
    #[cfg(feature = "stream")]
    pub(crate) async fn fetch<T>(self) -> Result<Page<T>, Error>
    where
        T: PaginatedResource<Id = Id>,
    {
        Page::fetch(self.base, self.limit, Some(self.next)).await
    }
}

impl<T> Deref for Page<T>
where
    T: PaginatedResource,
{
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> IntoIterator for Page<T>
where
    T: PaginatedResource,
{
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
pub mod test {
    use serde::Deserialize;

    use super::{PaginatedResource, ResourceCollection};

    #[derive(Debug, Deserialize, crate::PaginatedResource)]
    #[collection_name = "networks"]
    struct Network {
        #[resource_id]
        id: String,
    }

    #[derive(Debug, Deserialize)]
    struct Record {
        id: String,
    }

    #[derive(Debug, Deserialize)]
    struct RecordRoot {
        records: Vec<Record>,
    }

    impl ResourceCollection<Record> for RecordRoot {
        fn into_items(self) -> Vec<Record> {
            self.records
        }
    }

    impl PaginatedResource for Record {
        type Id = String;
        type Root = RecordRoot;
        const SUPPORTS_MARKER: bool = false;
        fn resource_id(&self) -> String {
            self.id.clone()
        }
    }

    #[test]
    fn test_derived_root() {
        let root: <Network as PaginatedResource>::Root = serde_json::from_str(
            r#"{"networks": [{"id": "n1"}],
                "networks_links": [{"rel": "next", "href": "http://x/v2.0/networks?marker=n1"}]}"#,
        )
        .unwrap();
        assert!(root.next_link().is_some());
        assert_eq!(root.into_items()[0].resource_id(), "n1");
        assert!(Network::SUPPORTS_MARKER);
    }

    #[test]
    fn test_custom_root() {
        let root: RecordRoot = serde_json::from_str(r#"{"records": [{"id": "r1"}]}"#).unwrap();
        assert!(root.next_link().is_none());
        assert!(!Record::SUPPORTS_MARKER);
        assert_eq!(root.into_items().len(), 1);
    }
}
