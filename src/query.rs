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

//! Typed query strings for listing calls.

use std::borrow::Cow;
use std::ops::{Deref, DerefMut};

use serde::ser::Error as SerError;
use serde::{Serialize, Serializer};

use crate::Error;

/// A filter that can be converted into a `key=value` query parameter.
///
/// Usually derived, see [Query](struct.Query.html).
pub trait QueryItem {
    /// The key and the value of the parameter.
    fn query_item(&self) -> Result<(&str, Cow<str>), Error>;
}

/// An ordered list of query items, serialized as a query string.
///
/// Keys may repeat. Listing calls accept a `Query` of their own filter enum:
///
/// ```rust
/// use oscloud::{Query, QueryItem};
///
/// #[derive(Debug, QueryItem)]
/// enum ListingFilter {
///     Prefix(String),
///     Delimiter(char),
///     #[query_item = "format"]
///     Format(String),
/// }
///
/// let query = Query::default()
///     .with(ListingFilter::Prefix("photos/2024/".into()))
///     .with(ListingFilter::Delimiter('/'))
///     .with(ListingFilter::Format("json".into()));
/// assert_eq!(
///     serde_urlencoded::to_string(&query).unwrap(),
///     "prefix=photos%2F2024%2F&delimiter=%2F&format=json"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Query<T>(pub Vec<T>);

impl<T> Default for Query<T> {
    fn default() -> Query<T> {
        Query(Vec::new())
    }
}

impl<T> Query<T> {
    /// Append a query item.
    #[inline]
    pub fn with(mut self, item: T) -> Self {
        self.0.push(item);
        self
    }
}

impl<T: QueryItem> Query<T> {
    /// Render the items as key-value pairs in insertion order.
    pub fn pairs(&self) -> Result<Vec<(&str, Cow<str>)>, Error> {
        self.0.iter().map(QueryItem::query_item).collect()
    }
}

impl<T> From<Vec<T>> for Query<T> {
    fn from(value: Vec<T>) -> Query<T> {
        Query(value)
    }
}

impl<T> FromIterator<T> for Query<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Query<T> {
        Query(iter.into_iter().collect())
    }
}

impl<T> Deref for Query<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        &self.0
    }
}

impl<T> DerefMut for Query<T> {
    fn deref_mut(&mut self) -> &mut Vec<T> {
        &mut self.0
    }
}

impl<T: QueryItem> Serialize for Query<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let pairs = self.pairs().map_err(SerError::custom)?;
        serializer.collect_seq(pairs)
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::ErrorKind;

    #[derive(Debug)]
    enum Manual {
        Name(String),
        Enabled(bool),
        Broken,
    }

    impl QueryItem for Manual {
        fn query_item(&self) -> Result<(&str, Cow<str>), Error> {
            match self {
                Manual::Name(s) => Ok(("name", Cow::Borrowed(s))),
                Manual::Enabled(b) => Ok(("enabled", b.to_string().into())),
                Manual::Broken => Err(Error::new(ErrorKind::InvalidInput, "broken item")),
            }
        }
    }

    #[test]
    fn test_query_repeated_keys() {
        let mut q = Query::default();
        q.push(Manual::Enabled(true));
        q.push(Manual::Name("www".into()));
        q.push(Manual::Name("mail".into()));
        assert_eq!(
            q.pairs().unwrap(),
            vec![
                ("enabled", Cow::Borrowed("true")),
                ("name", Cow::Borrowed("www")),
                ("name", Cow::Borrowed("mail")),
            ]
        );
        let s = serde_urlencoded::to_string(q).unwrap();
        assert_eq!(&s, "enabled=true&name=www&name=mail");
    }

    #[test]
    fn test_query_item_failure() {
        let q = Query::from(vec![Manual::Name("x".into()), Manual::Broken]);
        assert_eq!(q.pairs().unwrap_err().kind(), ErrorKind::InvalidInput);
        assert!(serde_urlencoded::to_string(q).is_err());
    }

    #[test]
    fn test_query_empty() {
        let q: Query<Manual> = Query::default();
        assert_eq!(serde_urlencoded::to_string(q).unwrap(), "");
    }
}
