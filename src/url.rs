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

//! Handy primitives for working with URLs.

use reqwest::Url;

use super::{Error, ErrorKind};

#[inline]
fn not_a_base(url: &Url) -> Error {
    Error::new(
        ErrorKind::InvalidInput,
        format!("URL {} cannot be used as a base", url),
    )
}

/// Whether the URL has no path components.
#[inline]
pub fn is_root(url: &Url) -> bool {
    url.path_segments()
        .map(|mut segments| segments.all(|x| x.is_empty()))
        .unwrap_or(true)
}

/// Append path segments to the URL, percent-encoding them.
#[allow(unused_results)]
pub fn extend<I>(mut url: Url, segments: I) -> Result<Url, Error>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    if url.cannot_be_a_base() {
        return Err(not_a_base(&url));
    }
    if let Ok(mut current) = url.path_segments_mut() {
        current.pop_if_empty().extend(segments);
    }
    Ok(url)
}

/// Remove the last path segment.
#[allow(unused_results)]
pub fn pop(mut url: Url, keep_slash: bool) -> Result<Url, Error> {
    if url.cannot_be_a_base() {
        return Err(not_a_base(&url));
    }
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().pop();
        if keep_slash {
            segments.pop_if_empty().push("");
        }
    }
    Ok(url)
}

/// Make sure the URL path ends with a slash, so that joining keeps the last segment.
#[allow(unused_results)]
pub fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push("");
        }
    }
    url
}

#[cfg(test)]
pub mod test {
    use reqwest::Url;

    use super::*;

    #[test]
    fn test_is_root() {
        assert!(is_root(&Url::parse("https://example.com").unwrap()));
        assert!(is_root(&Url::parse("https://example.com/").unwrap()));
        assert!(!is_root(&Url::parse("https://example.com/v1").unwrap()));
    }

    #[test]
    fn test_extend() {
        let url = Url::parse("https://example.com/v1/").unwrap();
        let url = extend(url, &["AUTH_abc", "my container", "a/b"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/v1/AUTH_abc/my%20container/a%2Fb"
        );
    }

    #[test]
    fn test_extend_not_a_base() {
        let url = Url::parse("mailto:admin@example.com").unwrap();
        let err = extend(url, &["x"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_pop() {
        let url = Url::parse("https://example.com/identity/v3/").unwrap();
        assert_eq!(
            pop(url.clone(), true).unwrap().as_str(),
            "https://example.com/identity/"
        );
        assert_eq!(
            pop(url, false).unwrap().as_str(),
            "https://example.com/identity"
        );
    }

    #[test]
    fn test_with_trailing_slash() {
        let url = Url::parse("https://example.com/v2.0").unwrap();
        assert_eq!(
            with_trailing_slash(url).as_str(),
            "https://example.com/v2.0/"
        );
    }
}
