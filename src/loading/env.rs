// Copyright 2020 Dmitry Tantsur <dtantsur@protonmail.com>
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

//! Support for `OS_` environment variables.

use std::env;

use super::cloud::Auth;
use super::{from_config, CloudConfig};
use crate::{Error, ErrorKind, Vendor};

// This is only used for unit testing.
trait Environment {
    fn get(&self, name: &'static str) -> Result<String, Error>;
}

#[derive(Debug, Clone, Copy)]
struct RealEnvironment;

impl Environment for RealEnvironment {
    fn get(&self, name: &'static str) -> Result<String, Error> {
        env::var(name).map_err(|_| {
            Error::new(
                ErrorKind::InvalidInput,
                format!("Required environment variable {} is not provided", name),
            )
        })
    }
}

#[inline]
fn _from_env<E: Environment>(env: E) -> Result<CloudConfig, Error> {
    if let Ok(cloud_name) = env.get("OS_CLOUD") {
        return from_config(cloud_name);
    }

    let vendor = env
        .get("OS_VENDOR")
        .ok()
        .map(|v| v.parse::<Vendor>())
        .transpose()?;

    let auth = Auth {
        access_key: env.get("OS_ACCESS_KEY").ok(),
        api_key: env.get("OS_API_KEY").ok(),
        auth_url: env.get("OS_AUTH_URL").ok(),
        endpoint: env.get("OS_ENDPOINT").ok(),
        password: env.get("OS_PASSWORD").ok(),
        project_id: env.get("OS_PROJECT_ID").ok(),
        project_name: env.get("OS_PROJECT_NAME").ok(),
        project_domain_id: env.get("OS_PROJECT_DOMAIN_ID").ok(),
        project_domain_name: env.get("OS_PROJECT_DOMAIN_NAME").ok(),
        secret_key: env.get("OS_SECRET_KEY").ok(),
        tenant_id: env.get("OS_TENANT_ID").ok(),
        tenant_name: env.get("OS_TENANT_NAME").ok(),
        token: env.get("OS_TOKEN").ok(),
        user_id: env.get("OS_USER_ID").ok(),
        username: env.get("OS_USERNAME").ok(),
        user_domain_id: env.get("OS_USER_DOMAIN_ID").ok(),
        user_domain_name: env.get("OS_USER_DOMAIN_NAME").ok(),
    };

    Ok(CloudConfig {
        auth: Some(auth),
        auth_type: env.get("OS_AUTH_TYPE").ok(),
        cacert: env.get("OS_CACERT").ok(),
        interface: env.get("OS_INTERFACE").ok(),
        proxy: env.get("OS_PROXY").ok(),
        region_name: env.get("OS_REGION_NAME").ok(),
        vendor,
        ..CloudConfig::default()
    })
}

/// Load a cloud configuration from environment variables.
///
/// If `OS_CLOUD` is set, the configuration is loaded from `clouds.yaml` instead.
pub fn from_env() -> Result<CloudConfig, Error> {
    _from_env(RealEnvironment)
}

#[cfg(test)]
pub mod test {
    use std::collections::HashMap;
    use std::convert::TryFrom;

    use maplit::hashmap;

    use super::{Environment, _from_env};
    use crate::common::IdOrName;
    use crate::identity::v2::CloudIdentity;
    use crate::identity::{Password, Token};
    use crate::{Error, ErrorKind, InterfaceType, NoAuth, Vendor};

    impl Environment for HashMap<&'static str, &'static str> {
        fn get(&self, name: &'static str) -> Result<String, Error> {
            self.get(name)
                .cloned()
                .map(From::from)
                .ok_or_else(|| Error::new(ErrorKind::InvalidInput, name))
        }
    }

    #[test]
    fn test_password_no_domains() {
        let env = hashmap! {
            "OS_AUTH_URL" => "http://example.com",
            "OS_USERNAME" => "admin",
            "OS_PASSWORD" => "password",
            "OS_PROJECT_NAME" => "admin",
        };

        let id = Password::try_from(_from_env(env).unwrap()).unwrap();
        assert_eq!(id.user(), Some(&IdOrName::from_name("admin")));
        assert_eq!(id.project(), Some(&IdOrName::from_name("admin")));
    }

    #[test]
    fn test_password_with_domains() {
        let env = hashmap! {
            "OS_AUTH_URL" => "http://example.com",
            "OS_USERNAME" => "admin",
            "OS_PASSWORD" => "password",
            "OS_PROJECT_NAME" => "admin",
            "OS_USER_DOMAIN_NAME" => "Default",
            "OS_PROJECT_DOMAIN_NAME" => "Default",
            "OS_REGION_NAME" => "RegionOne",
            "OS_INTERFACE" => "servicenet,public",
        };

        let sscfg = _from_env(env).unwrap().create_session_config().unwrap();
        assert_eq!(sscfg.region_name.as_deref(), Some("RegionOne"));
        assert_eq!(
            sscfg.interface,
            Some(vec![InterfaceType::Internal, InterfaceType::Public].into())
        );
    }

    #[test]
    fn test_password_missing() {
        let env = hashmap! {
            "OS_AUTH_URL" => "http://example.com",
            "OS_USERNAME" => "admin",
        };

        let err = _from_env(env).unwrap().create_session_config().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }

    #[test]
    fn test_token_with_type() {
        let env = hashmap! {
            "OS_AUTH_TYPE" => "v3token",
            "OS_AUTH_URL" => "http://example.com",
            "OS_TOKEN" => "abcdef",
            "OS_PROJECT_NAME" => "admin",
            "OS_PROJECT_DOMAIN_NAME" => "Default",
        };

        let id = Token::try_from(_from_env(env).unwrap()).unwrap();
        assert_eq!(id.project(), Some(&IdOrName::from_name("admin")));
    }

    #[test]
    fn test_rackspace_api_key() {
        let env = hashmap! {
            "OS_VENDOR" => "rackspace",
            "OS_AUTH_URL" => "https://identity.api.rackspacecloud.com/v2.0",
            "OS_USERNAME" => "admin",
            "OS_API_KEY" => "k3y",
            "OS_TENANT_ID" => "123456",
            "OS_PROXY" => "http://proxy.local:3128",
        };

        let cfg = _from_env(env).unwrap();
        assert_eq!(cfg.vendor(), Vendor::Rackspace);
        let id = CloudIdentity::try_from(cfg).unwrap();
        assert_eq!(id.tenant_id(), Some("123456"));
    }

    #[test]
    fn test_v2_password_with_type() {
        let env = hashmap! {
            "OS_AUTH_TYPE" => "v2password",
            "OS_AUTH_URL" => "http://example.com/v2.0",
            "OS_USERNAME" => "admin",
            "OS_PASSWORD" => "password",
            "OS_TENANT_NAME" => "admin",
        };

        let id = CloudIdentity::try_from(_from_env(env).unwrap()).unwrap();
        assert_eq!(id.vendor(), Vendor::OpenStack);
        assert_eq!(id.tenant_name(), Some("admin"));
    }

    #[test]
    fn test_unknown_vendor() {
        let env = hashmap! {
            "OS_VENDOR" => "banana",
            "OS_AUTH_URL" => "http://example.com",
        };

        assert!(_from_env(env).is_err());
    }

    #[test]
    fn test_none() {
        let env = hashmap! {
            "OS_AUTH_TYPE" => "none",
            "OS_ENDPOINT" => "http://example.com",
        };

        let _ = NoAuth::try_from(_from_env(env).unwrap()).unwrap();
    }
}
