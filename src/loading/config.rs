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

//! Support for `clouds.yaml`, `clouds-public.yaml` and `secure.yaml`.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use log::{debug, warn};
use serde::Deserialize;
use serde_yaml::mapping::Entry;
use serde_yaml::{Mapping, Value};

use super::CloudConfig;
use crate::{Error, ErrorKind, Vendor};

#[derive(Debug, Deserialize)]
struct Root {
    clouds: HashMap<String, CloudConfig>,
}

/// What to do with scalar keys present on both sides of a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conflict {
    /// The incoming value wins (secrets from `secure.yaml`).
    Overwrite,
    /// The existing value wins (profiles from `clouds-public.yaml`).
    KeepExisting,
}

/// Recursively merge `src` into `dest`.
fn merge(src: Mapping, dest: &mut Mapping, conflict: Conflict) {
    for (key, value) in src {
        match dest.entry(key) {
            Entry::Vacant(entry) => {
                let _ = entry.insert(value);
            }
            Entry::Occupied(mut entry) => match (entry.get_mut(), value) {
                (Value::Mapping(existing), Value::Mapping(incoming)) => {
                    merge(incoming, existing, conflict)
                }
                (existing, incoming @ Value::Mapping(_)) => {
                    warn!(
                        "Replacing {:?} with a mapping while merging configuration",
                        existing
                    );
                    *existing = incoming;
                }
                (existing, incoming) => {
                    if conflict == Conflict::Overwrite {
                        *existing = incoming;
                    }
                }
            },
        }
    }
}

fn invalid<S: Into<String>>(message: S) -> Error {
    Error::new(ErrorKind::InvalidConfig, message)
}

fn mapping_at<'m>(root: &'m mut Mapping, key: &str, file: &str) -> Result<&'m mut Mapping, Error> {
    match root.get_mut(key) {
        Some(Value::Mapping(map)) => Ok(map),
        Some(other) => Err(invalid(format!(
            "{} in {} must be a mapping, got {:?}",
            key, file, other
        ))),
        None => Err(invalid(format!("{} must contain a {} object", file, key))),
    }
}

/// Profile that applies when `clouds-public.yaml` does not define the requested one.
///
/// Known vendor names act as profiles that only set the vendor.
fn builtin_profile(name: &str) -> Option<Mapping> {
    match name.parse::<Vendor>() {
        Ok(Vendor::OpenStack) | Err(_) => None,
        Ok(vendor) => {
            let mut result = Mapping::with_capacity(1);
            let _ = result.insert("vendor".into(), vendor.as_str().into());
            Some(result)
        }
    }
}

/// Merge the profiles referenced by cloud entries into them.
fn inject_profiles(clouds_public: &mut Mapping, clouds: &mut Mapping) -> Result<(), Error> {
    let profiles = mapping_at(clouds_public, "public-clouds", "clouds-public.yaml")?;
    let clouds = mapping_at(clouds, "clouds", "clouds.yaml")?;

    for (cloud_name, cloud) in clouds.iter_mut() {
        let cloud = match cloud.as_mapping_mut() {
            Some(cloud) => cloud,
            None => {
                warn!("Cloud record {:?} is not a mapping, ignoring", cloud_name);
                continue;
            }
        };

        let profile_name = match cloud.get("profile") {
            Some(Value::String(name)) => name.clone(),
            Some(other) => {
                return Err(invalid(format!(
                    "Profile name {:?} is not a string",
                    other
                )))
            }
            None => continue,
        };

        let profile = match profiles.get(profile_name.as_str()) {
            Some(Value::Mapping(profile)) => profile.clone(),
            Some(other) => {
                return Err(invalid(format!(
                    "Profile {} must be a mapping, got {:?}",
                    profile_name, other
                )))
            }
            None => builtin_profile(&profile_name).ok_or_else(|| {
                invalid(format!(
                    "Missing profile {} in clouds-public.yaml",
                    profile_name
                ))
            })?,
        };

        debug!("Applying profile {} to cloud {:?}", profile_name, cloud_name);
        merge(profile, cloud, Conflict::KeepExisting);
    }

    Ok(())
}

/// Locations to look for a configuration file, in order of preference.
fn candidates(filename: &str) -> impl Iterator<Item = PathBuf> + '_ {
    let home = dirs::home_dir().map(|mut home| {
        home.push(".config");
        home.push("openstack");
        home.push(filename);
        home
    });
    if home.is_none() {
        warn!("Cannot find home directory");
    }

    std::iter::once(PathBuf::from(filename))
        .chain(home)
        .chain(std::iter::once(
            PathBuf::from("/etc/openstack").join(filename),
        ))
}

fn find_config(filename: &str) -> Option<PathBuf> {
    candidates(filename).find(|path| path.is_file())
}

/// Read a YAML file, falling back to `{default_root: {}}` if it is optional and missing.
fn read_yaml(filename: &str, default_root: Option<&str>) -> Result<Mapping, Error> {
    let path = match (find_config(filename), default_root) {
        (Some(path), _) => path,
        (None, Some(root)) => {
            let mut result = Mapping::with_capacity(1);
            let _ = result.insert(root.into(), Value::Mapping(Mapping::new()));
            return Ok(result);
        }
        (None, None) => {
            return Err(invalid(format!(
                "{} was not found in any location",
                filename
            )))
        }
    };

    debug!("Reading {}", path.display());
    let content = fs::read_to_string(&path)
        .map_err(|e| invalid(format!("Cannot read {}: {}", path.display(), e)))?;
    match serde_yaml::from_str(&content)
        .map_err(|e| invalid(format!("Cannot parse {}: {}", path.display(), e)))?
    {
        Value::Mapping(mapping) => Ok(mapping),
        other => Err(invalid(format!(
            "Root of {} is {:?}, not a mapping",
            path.display(),
            other
        ))),
    }
}

fn from_files(
    name: &str,
    mut clouds: Mapping,
    mut clouds_public: Mapping,
    secure: Mapping,
) -> Result<CloudConfig, Error> {
    merge(secure, &mut clouds, Conflict::Overwrite);
    inject_profiles(&mut clouds_public, &mut clouds)?;

    let mut root: Root = serde_yaml::from_value(Value::Mapping(clouds))
        .map_err(|e| invalid(format!("Cannot parse the merged cloud configuration: {}", e)))?;

    let cloud = root
        .clouds
        .remove(name)
        .ok_or_else(|| invalid(format!("No such cloud: {}", name)))?;
    debug!(
        "Loaded cloud {} (vendor {}) from clouds.yaml",
        name,
        cloud.vendor()
    );
    Ok(cloud)
}

/// Load a cloud configuration from a `clouds.yaml` configuration file.
///
/// `clouds-public.yaml` profiles and `secure.yaml` secrets are merged in.
pub fn from_config<S: AsRef<str>>(cloud_name: S) -> Result<CloudConfig, Error> {
    let clouds = read_yaml("clouds.yaml", None)?;
    let clouds_public = read_yaml("clouds-public.yaml", Some("public-clouds"))?;
    let secure = read_yaml("secure.yaml", Some("clouds"))?;

    from_files(cloud_name.as_ref(), clouds, clouds_public, secure)
}

#[cfg(test)]
mod test {
    use std::convert::TryFrom;

    use serde_yaml::{Mapping, Value};

    use super::{find_config, from_files, inject_profiles, merge, read_yaml, Conflict};
    use crate::common::IdOrName;
    use crate::identity::v2::CloudIdentity;
    use crate::identity::Password;
    use crate::{ErrorKind, NoAuth, Vendor};

    fn to_yaml(source: &str) -> Mapping {
        match serde_yaml::from_str(source).unwrap() {
            Value::Mapping(map) => map,
            other => panic!("Unexpected {:?}", other),
        }
    }

    fn lookup<'m>(root: &'m Mapping, path: &[&str]) -> &'m Value {
        let (last, parents) = path.split_last().unwrap();
        let mut current = root;
        for key in parents {
            current = current.get(*key).unwrap().as_mapping().unwrap();
        }
        current.get(*last).unwrap()
    }

    fn clouds_only(clouds: &str, name: &str) -> Result<crate::CloudConfig, crate::Error> {
        from_files(
            name,
            to_yaml(clouds),
            to_yaml("public-clouds: {}"),
            to_yaml("clouds: {}"),
        )
    }

    #[test]
    fn test_merge_overwrite() {
        let mut dest = to_yaml(
            r#"
clouds:
  rax:
    auth:
      username: alice
      auth_url: https://identity.api.rackspacecloud.com/v2.0
    region_name: DFW"#,
        );
        let src = to_yaml(
            r#"
clouds:
  rax:
    auth:
      username: bob
      api_key: k3y
    region_name: ORD
  other:
    region_name: IAD"#,
        );

        merge(src, &mut dest, Conflict::Overwrite);
        assert_eq!(lookup(&dest, &["clouds", "rax", "region_name"]), "ORD");
        assert_eq!(lookup(&dest, &["clouds", "rax", "auth", "username"]), "bob");
        assert_eq!(lookup(&dest, &["clouds", "rax", "auth", "api_key"]), "k3y");
        assert!(lookup(&dest, &["clouds", "rax", "auth", "auth_url"])
            .as_str()
            .unwrap()
            .starts_with("https://identity"));
        assert_eq!(lookup(&dest, &["clouds", "other", "region_name"]), "IAD");
    }

    #[test]
    fn test_merge_keep_existing() {
        let mut dest = to_yaml("region_name: DFW\nauth: 42");
        let src = to_yaml("region_name: ORD\ninterface: internal\nauth:\n  username: bob");

        merge(src, &mut dest, Conflict::KeepExisting);
        assert_eq!(lookup(&dest, &["region_name"]), "DFW");
        assert_eq!(lookup(&dest, &["interface"]), "internal");
        // A mapping always replaces a scalar.
        assert_eq!(lookup(&dest, &["auth", "username"]), "bob");
    }

    #[test]
    fn test_from_config() {
        let clouds = to_yaml(
            r#"clouds:
  cloud_name:
    auth:
      auth_url: http://url1
      username: user1
    profile: test_profile"#,
        );
        let clouds_public = to_yaml(
            r#"public-clouds:
  test_profile:
    region_name: region1"#,
        );
        let secure = to_yaml(
            r#"clouds:
  cloud_name:
    auth:
      password: password1"#,
        );

        let cfg = from_files("cloud_name", clouds, clouds_public, secure).unwrap();
        assert_eq!(cfg.region_name(), Some("region1"));
        let auth = cfg.auth.as_ref().unwrap();
        assert_eq!(auth.username.as_deref(), Some("user1"));
        assert_eq!(auth.password.as_deref(), Some("password1"));
        let _ = cfg.create_session_config().unwrap();
    }

    #[test]
    fn test_from_config_password() {
        let cfg = clouds_only(
            r#"clouds:
  cloud_name:
    auth_type: password
    auth:
      auth_url: http://url1
      username: user1
      password: password1
    region_name: region1"#,
            "cloud_name",
        )
        .unwrap();
        let id = Password::try_from(cfg).unwrap();
        assert_eq!(id.user(), Some(&IdOrName::from_name("user1")));
    }

    #[test]
    fn test_from_config_rackspace() {
        let cfg = clouds_only(
            r#"clouds:
  rax:
    vendor: rackspace
    auth:
      auth_url: https://identity.api.rackspacecloud.com/v2.0
      username: user1
      api_key: k3y
    proxy: http://proxy.local:3128"#,
            "rax",
        )
        .unwrap();
        assert_eq!(cfg.vendor(), Vendor::Rackspace);
        assert_eq!(cfg.proxy.as_deref(), Some("http://proxy.local:3128"));
        let id = CloudIdentity::try_from(cfg).unwrap();
        assert_eq!(id.vendor(), Vendor::Rackspace);
    }

    #[test]
    fn test_from_config_builtin_profile() {
        // No auth_url: the vendor's identity endpoint is used.
        let cfg = clouds_only(
            r#"clouds:
  rax:
    profile: rackspace
    auth:
      username: user1
      api_key: k3y"#,
            "rax",
        )
        .unwrap();
        assert_eq!(cfg.vendor(), Vendor::Rackspace);
        let id = CloudIdentity::try_from(cfg).unwrap();
        assert_eq!(id.vendor(), Vendor::Rackspace);
    }

    #[test]
    fn test_from_config_hp_access_key() {
        let cfg = clouds_only(
            r#"clouds:
  hp:
    vendor: hp
    auth_type: v2accesskey
    auth:
      access_key: ak
      secret_key: sk
      tenant_id: "1234""#,
            "hp",
        )
        .unwrap();
        let id = CloudIdentity::try_from(cfg).unwrap();
        assert_eq!(id.vendor(), Vendor::Hp);
        assert_eq!(id.tenant_id(), Some("1234"));
    }

    #[test]
    fn test_from_config_errors() {
        let e = clouds_only("clouds:\n  c:\n    vendor: banana", "c").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidConfig);

        let e = clouds_only("clouds:\n  c:\n    auth_type: none", "other").unwrap_err();
        assert_eq!(
            "clouds.yaml or credentials file is invalid: No such cloud: other",
            e.to_string()
        );

        let e = clouds_only("other: {}", "c").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidConfig);
    }

    #[test]
    fn test_from_config_none() {
        let cfg = clouds_only(
            r#"clouds:
  cloud_name:
    auth_type: none
    auth:
      endpoint: http://url1"#,
            "cloud_name",
        )
        .unwrap();
        let _ = NoAuth::try_from(cfg).unwrap();

        let cfg = clouds_only("clouds:\n  c:\n    auth_type: none", "c").unwrap();
        let _ = cfg.create_session_config().unwrap();
    }

    #[test]
    fn test_from_config_endpoint_overrides() {
        let cfg = clouds_only(
            r#"clouds:
  cloud_name:
    auth_type: none
    object_store_endpoint_override: http://swift/v1
    rax_load_balancer_endpoint_override: http://lb/"#,
            "cloud_name",
        )
        .unwrap();
        let sscfg = cfg.create_session_config().unwrap();
        assert_eq!(
            "http://swift/v1",
            sscfg.endpoint_overrides["object-store"].as_str()
        );
        assert_eq!(
            "http://lb/",
            sscfg.endpoint_overrides["rax-load-balancer"].as_str()
        );
    }

    #[test]
    fn test_from_config_cacert_not_found() {
        let cfg = clouds_only(
            "clouds:\n  c:\n    auth_type: none\n    cacert: /I/do/not/exist",
            "c",
        )
        .unwrap();
        let e = cfg.create_session_config().unwrap_err();
        if cfg!(any(feature = "native-tls", feature = "rustls")) {
            assert!(e.to_string().contains("Cannot open cacert file"));
        } else {
            assert!(e.to_string().contains("TLS support is disabled"));
        }
    }

    #[test]
    fn test_inject_profiles() {
        let mut clouds = to_yaml(
            r#"
clouds:
  cloud_name:
    auth:
      username: user1
      password: password1
    profile: test_profile"#,
        );
        let mut public = to_yaml(
            r#"
public-clouds:
  test_profile:
    auth:
      username: user2
      auth_url: url2
    region_name: region2"#,
        );

        inject_profiles(&mut public, &mut clouds).unwrap();
        let cloud = lookup(&clouds, &["clouds", "cloud_name"]).as_mapping().unwrap();
        assert_eq!(lookup(cloud, &["region_name"]), "region2");
        assert_eq!(lookup(cloud, &["auth", "username"]), "user1");
        assert_eq!(lookup(cloud, &["auth", "password"]), "password1");
        assert_eq!(lookup(cloud, &["auth", "auth_url"]), "url2");
    }

    #[test]
    fn test_inject_profiles_missing() {
        let mut clouds = to_yaml("clouds:\n  c:\n    profile: test_profile");
        let mut public = to_yaml("public-clouds:\n  other_profile:\n    region_name: r");

        let err = inject_profiles(&mut public, &mut clouds).unwrap_err();
        assert_eq!(ErrorKind::InvalidConfig, err.kind());
        assert_eq!(
            "clouds.yaml or credentials file is invalid: Missing profile test_profile in clouds-public.yaml",
            err.to_string()
        );
    }

    #[test]
    fn test_missing_files() {
        let e = read_yaml("doesnt_exist", None).unwrap_err();
        assert_eq!(
            "clouds.yaml or credentials file is invalid: doesnt_exist was not found in any location",
            e.to_string()
        );
        let empty = read_yaml("doesnt_exist", Some("clouds")).unwrap();
        assert!(lookup(&empty, &["clouds"]).as_mapping().unwrap().is_empty());
        assert_eq!(find_config("shouldnt_exist"), None);
    }
}
