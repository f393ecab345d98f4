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

//! Loading cloud configurations from `clouds.yaml`, `OS_*` variables and credentials files.

#[cfg(any(feature = "native-tls", feature = "rustls"))]
use std::fs;
use std::time::Duration;

#[cfg(any(feature = "native-tls", feature = "rustls"))]
use log::warn;
#[cfg(any(feature = "native-tls", feature = "rustls"))]
use reqwest::Certificate;
use reqwest::{Client, Proxy};

use crate::{Error, ErrorKind};

mod cloud;
mod config;
mod env;
mod live;

pub use cloud::CloudConfig;
pub use config::from_config;
pub use env::from_env;
pub use live::CredentialsFile;

/// HTTP settings of a cloud entry.
#[derive(Debug, Clone, Default)]
struct HttpOptions {
    cacert: Option<String>,
    insecure: bool,
    proxy: Option<String>,
    timeout: Option<Duration>,
}

fn config_error<S: Into<String>>(message: S) -> Error {
    Error::new(ErrorKind::InvalidConfig, message)
}

#[cfg(any(feature = "native-tls", feature = "rustls"))]
fn load_cacert(path: &str) -> Result<Certificate, Error> {
    let content = fs::read(path)
        .map_err(|e| config_error(format!("Cannot open cacert file {}: {}", path, e)))?;
    Certificate::from_pem(&content)
        .map_err(|e| config_error(format!("Cannot parse {} as PEM: {}", path, e)))
}

impl HttpOptions {
    #[allow(unused_mut)] // mut builder unused with --no-default-features
    fn into_client(self) -> Result<Client, Error> {
        let mut builder = Client::builder();

        #[cfg(any(feature = "native-tls", feature = "rustls"))]
        {
            if let Some(ref path) = self.cacert {
                builder = builder.add_root_certificate(load_cacert(path)?);
            }
            if self.insecure {
                warn!("TLS certificate verification is disabled");
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        #[cfg(not(any(feature = "native-tls", feature = "rustls")))]
        if self.cacert.is_some() || self.insecure {
            return Err(config_error("TLS support is disabled"));
        }

        if let Some(ref proxy) = self.proxy {
            let proxy = Proxy::all(proxy)
                .map_err(|e| config_error(format!("Invalid proxy {}: {}", proxy, e)))?;
            builder = builder.proxy(proxy);
        }

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        builder
            .build()
            .map_err(|e| config_error(format!("Cannot initialize HTTP backend: {}", e)))
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::HttpOptions;
    use crate::ErrorKind;

    #[test]
    fn test_client_with_proxy_and_timeout() {
        let options = HttpOptions {
            proxy: Some("http://proxy.local:3128".into()),
            timeout: Some(Duration::from_secs(30)),
            ..HttpOptions::default()
        };
        let _client = options.into_client().unwrap();
    }

    #[test]
    fn test_client_invalid_proxy() {
        let options = HttpOptions {
            proxy: Some("http://[::1".into()),
            ..HttpOptions::default()
        };
        let err = options.into_client().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }

    #[test]
    fn test_client_missing_cacert() {
        let options = HttpOptions {
            cacert: Some("/I/do/not/exist".into()),
            ..HttpOptions::default()
        };
        let err = options.into_client().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }
}
