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

//! A stream of resources.

use async_stream::try_stream;
use futures::pin_mut;
use futures::stream::{Stream, TryStreamExt};

use super::client::RequestBuilder;
use super::page::{Page, PaginatedResource};
use super::Error;

/// Stream of items starting with the provided page.
pub(crate) fn items<T>(first: Page<T>) -> impl Stream<Item = Result<T, Error>>
where
    T: PaginatedResource,
{
    try_stream! {
        let mut current = Some(first);
        while let Some(page) = current.take() {
            let (items, cursor) = page.into_parts();
            if items.is_empty() {
                break;
            }
            for item in items {
                yield item;
            }
            if let Some(cursor) = cursor {
                current = Some(cursor.fetch::<T>().await?);
            }
        }
    }
}

/// Creates a paginated resource stream.
///
/// Iteration fails with `InvalidInput` if the request builder has a streaming body.
pub(crate) fn paginated<T>(
    builder: RequestBuilder,
    limit: Option<usize>,
    starting_with: Option<T::Id>,
) -> impl Stream<Item = Result<T, Error>>
where
    T: PaginatedResource,
{
    try_stream! {
        let first = builder.fetch_page::<T>(limit, starting_with).await?;
        let iter = items(first);
        pin_mut!(iter);
        while let Some(item) = iter.try_next().await? {
            yield item;
        }
    }
}
