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

//! Object Storage metadata.

use std::collections::btree_map::{self, BTreeMap};

use http::header::{HeaderMap, HeaderName, HeaderValue};

use crate::{Error, ErrorKind};

/// Characters that are not allowed in HTTP tokens.
const SEPARATORS: &[char] = &[
    '(', ')', '<', '>', '@', ',', ';', ':', '\\', '"', '/', '[', ']', '?', '=', '{', '}', ' ',
    '\t',
];

/// Custom metadata of an account, a container or an object.
///
/// Keys are case-insensitive and are stored in lower case, the way they are returned by the
/// server. Keys and values are validated before they are sent.
///
/// ```rust
/// let mut meta = oscloud::objectstorage::Metadata::new();
/// meta.insert("Color", "blue");
/// assert_eq!(meta.get("color"), Some("blue"));
/// assert_eq!(meta.get("COLOR"), Some("blue"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    items: BTreeMap<String, String>,
}

impl Metadata {
    /// Create empty metadata.
    #[inline]
    pub fn new() -> Metadata {
        Metadata::default()
    }

    /// Get a value by its key.
    pub fn get<K: AsRef<str>>(&self, key: K) -> Option<&str> {
        self.items
            .get(&key.as_ref().to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Whether the key is present.
    #[inline]
    pub fn contains_key<K: AsRef<str>>(&self, key: K) -> bool {
        self.get(key).is_some()
    }

    /// Insert a value, returning the previous one.
    pub fn insert<K: AsRef<str>, V: Into<String>>(&mut self, key: K, value: V) -> Option<String> {
        self.items
            .insert(key.as_ref().to_ascii_lowercase(), value.into())
    }

    /// Remove a value.
    pub fn remove<K: AsRef<str>>(&mut self, key: K) -> Option<String> {
        self.items.remove(&key.as_ref().to_ascii_lowercase())
    }

    /// Add a value, builder style.
    #[inline]
    pub fn with<K: AsRef<str>, V: Into<String>>(mut self, key: K, value: V) -> Metadata {
        let _ = self.insert(key, value);
        self
    }

    /// Iterate over keys and values.
    #[inline]
    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.items.iter()
    }

    /// Iterate over keys.
    #[inline]
    pub fn keys(&self) -> btree_map::Keys<'_, String, String> {
        self.items.keys()
    }

    /// Number of items.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no items.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Merge other metadata into this one, overwriting existing keys.
    pub fn extend(&mut self, other: Metadata) {
        self.items.extend(other.items);
    }

    /// Extract metadata from response headers with the given prefix (e.g. `x-object-meta-`).
    pub(crate) fn from_headers(headers: &HeaderMap, prefix: &str) -> Metadata {
        headers
            .iter()
            .filter_map(|(name, value)| {
                name.as_str().strip_prefix(prefix).and_then(|key| {
                    std::str::from_utf8(value.as_bytes())
                        .ok()
                        .map(|value| (key.to_string(), value.to_string()))
                })
            })
            .collect()
    }

    /// Convert into request headers with the given prefix (e.g. `X-Object-Meta-`).
    pub(crate) fn to_headers(&self, prefix: &str) -> Result<HeaderMap, Error> {
        let mut result = HeaderMap::with_capacity(self.len());
        for (key, value) in self.iter() {
            validate_key(key)?;
            validate_value(value)?;
            let name = HeaderName::from_bytes(format!("{}{}", prefix, key).as_bytes())?;
            let _ = result.insert(name, HeaderValue::from_str(value)?);
        }
        Ok(result)
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Metadata {
        let mut result = Metadata::new();
        for (key, value) in iter {
            let _ = result.insert(key, value);
        }
        result
    }
}

impl IntoIterator for Metadata {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'m> IntoIterator for &'m Metadata {
    type Item = (&'m String, &'m String);
    type IntoIter = btree_map::Iter<'m, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Check that the metadata key can be used.
///
/// Keys must be non-empty HTTP tokens made of 7-bit ASCII characters. Underscores are rejected
/// since proxies in front of Object Storage silently drop such headers.
pub fn validate_key(key: &str) -> Result<(), Error> {
    if key.is_empty() {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "Metadata key cannot be empty",
        ));
    }

    if let Some(c) = key
        .chars()
        .find(|c| !c.is_ascii() || c.is_ascii_control() || *c == '_' || SEPARATORS.contains(c))
    {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            format!("Metadata key {:?} contains invalid character {:?}", key, c),
        ));
    }

    Ok(())
}

/// Check that the metadata value can be used.
///
/// Values must fit into one header line and must not have surrounding whitespace.
pub fn validate_value(value: &str) -> Result<(), Error> {
    if let Some(c) = value.chars().find(|c| c.is_control()) {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            format!("Metadata value {:?} contains invalid character {:?}", value, c),
        ));
    }

    if value.trim() != value {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            format!("Metadata value {:?} has leading or trailing whitespace", value),
        ));
    }

    Ok(())
}
