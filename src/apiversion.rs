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

//! API versions and microversions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Error, ErrorKind};

/// API version as a (major, minor) pair.
///
/// Parsed from the forms found in version documents: `v2.0`, `2.42` or just `v1`.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Eq, Ord, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiVersion(pub u16, pub u16);

impl ApiVersion {
    /// The major component.
    #[inline]
    pub fn major(&self) -> u16 {
        self.0
    }

    /// Whether the version lies within the inclusive range.
    #[inline]
    pub fn is_within(&self, min: ApiVersion, max: ApiVersion) -> bool {
        min <= *self && *self <= max
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.0, self.1)
    }
}

impl From<(u16, u16)> for ApiVersion {
    fn from((major, minor): (u16, u16)) -> ApiVersion {
        ApiVersion(major, minor)
    }
}

impl From<ApiVersion> for String {
    fn from(value: ApiVersion) -> String {
        value.to_string()
    }
}

impl TryFrom<String> for ApiVersion {
    type Error = Error;

    fn try_from(value: String) -> Result<ApiVersion, Error> {
        value.parse()
    }
}

impl FromStr for ApiVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<ApiVersion, Error> {
        let invalid = || {
            Error::new(
                ErrorKind::InvalidResponse,
                format!("Invalid API version {:?}, expected X.Y or X", s),
            )
        };

        let trimmed = s.strip_prefix(['v', 'V']).unwrap_or(s);
        let (major, minor) = match trimmed.split_once('.') {
            Some((major, minor)) => (major, Some(minor)),
            None => (trimmed, None),
        };

        let major = major.parse().map_err(|_| invalid())?;
        let minor = match minor {
            Some(minor) => minor.parse().map_err(|_| invalid())?,
            None => 0,
        };
        Ok(ApiVersion(major, minor))
    }
}

#[cfg(test)]
pub mod test {
    use serde::Deserialize;

    use super::ApiVersion;

    #[test]
    fn test_apiversion_parse() {
        assert_eq!("v2.0".parse::<ApiVersion>().unwrap(), ApiVersion(2, 0));
        assert_eq!("2.42".parse::<ApiVersion>().unwrap(), ApiVersion(2, 42));
        assert_eq!("v1".parse::<ApiVersion>().unwrap(), ApiVersion(1, 0));
        for s in &["", "v", "latest", "1.x", "x.1", "1.2.3"] {
            assert!(s.parse::<ApiVersion>().is_err(), "{} parsed", s);
        }
    }

    #[test]
    fn test_apiversion_ordering() {
        let v = ApiVersion::from((2, 42));
        assert_eq!(v.to_string(), "2.42");
        assert_eq!(v.major(), 2);
        assert!(v > ApiVersion(2, 9));
        assert!(v.is_within(ApiVersion(2, 1), ApiVersion(2, 42)));
        assert!(!v.is_within(ApiVersion(2, 1), ApiVersion(2, 38)));
    }

    #[derive(Debug, Deserialize)]
    struct NovaVersion {
        id: ApiVersion,
        version: ApiVersion,
        min_version: Option<ApiVersion>,
    }

    #[test]
    fn test_apiversion_serde() {
        let ver: NovaVersion = serde_json::from_str(
            r#"{"id": "v2.1", "version": "2.79", "min_version": "2.1"}"#,
        )
        .unwrap();
        assert_eq!(ver.id, ApiVersion(2, 1));
        assert_eq!(ver.version, ApiVersion(2, 79));
        assert_eq!(ver.min_version, Some(ApiVersion(2, 1)));
        assert_eq!(
            serde_json::to_string(&ApiVersion(1, 0)).unwrap(),
            "\"1.0\""
        );
        assert!(serde_json::from_str::<ApiVersion>("\"two\"").is_err());
    }
}
