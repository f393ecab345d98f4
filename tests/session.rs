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

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};

use oscloud::objectstorage::ObjectStorage;
use oscloud::{AuthType, EndpointFilters, Error, ErrorKind, Session};

use common::{MockServer, Reply};

/// Issues a new token on every refresh.
#[derive(Debug)]
struct CountingAuth {
    endpoint: Url,
    refreshes: Arc<AtomicUsize>,
}

#[async_trait]
impl AuthType for CountingAuth {
    async fn authenticate(
        &self,
        _client: &Client,
        request: RequestBuilder,
    ) -> Result<RequestBuilder, Error> {
        let token = format!("token-{}", self.refreshes.load(Ordering::SeqCst));
        Ok(request.header("x-auth-token", token))
    }

    async fn get_endpoint(
        &self,
        _client: &Client,
        _service_type: &str,
        _filters: &EndpointFilters,
    ) -> Result<Url, Error> {
        Ok(self.endpoint.clone())
    }

    async fn refresh(&self, _client: &Client) -> Result<(), Error> {
        let _ = self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

async fn counting_session(server: &MockServer) -> (Session, Arc<AtomicUsize>) {
    let refreshes = Arc::new(AtomicUsize::new(0));
    let auth = CountingAuth {
        endpoint: Url::parse(&server.url("/v1/AUTH_test")).unwrap(),
        refreshes: refreshes.clone(),
    };
    let session = Session::new(auth).await.unwrap();
    (session, refreshes)
}

#[tokio::test]
async fn test_unauthorized_refreshes_once() {
    let server = MockServer::start().await;
    let (session, refreshes) = counting_session(&server).await;
    assert_eq!(refreshes.load(Ordering::SeqCst), 1);

    let _ = server
        .reply(Reply::status(401))
        .reply(Reply::status(204).with_header("x-account-container-count", "3"));

    let storage = ObjectStorage::new(&session);
    let account = storage.get_account().await.unwrap();
    assert_eq!(account.container_count, 3);
    assert_eq!(refreshes.load(Ordering::SeqCst), 2);

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].header("x-auth-token"), Some("token-1"));
    assert_eq!(requests[1].header("x-auth-token"), Some("token-2"));
}

#[tokio::test]
async fn test_unauthorized_twice_fails() {
    let server = MockServer::start().await;
    let (session, refreshes) = counting_session(&server).await;

    let _ = server
        .reply(Reply::status(401))
        .reply(Reply::status(401).with_body("Unauthorized"));

    let storage = ObjectStorage::new(&session);
    let err = storage.get_account().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
    assert_eq!(refreshes.load(Ordering::SeqCst), 2);
    assert_eq!(server.requests().len(), 2);
}

#[tokio::test]
async fn test_error_message_from_body() {
    let server = MockServer::start().await;
    let session = server.session("/v1/AUTH_test").await;
    let _ = server.reply(Reply::json(serde_json::json!({
        "badRequest": {"code": 400, "message": "Invalid input for field 'name'"}
    }))
    .with_status(400));

    let storage = ObjectStorage::new(&session);
    let err = storage.get_account().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(err.status().map(|s| s.as_u16()), Some(400));
}

#[tokio::test]
async fn test_server_error() {
    let server = MockServer::start().await;
    let session = server.session("/v1/AUTH_test").await;
    let _ = server.reply(Reply::status(503));
    let storage = ObjectStorage::new(&session);
    let err = storage.get_account().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InternalServerError);
}

#[tokio::test]
async fn test_endpoint_override() {
    let server = MockServer::start().await;
    let session = oscloud::Session::new(oscloud::NoAuth::new_without_endpoint())
        .await
        .unwrap()
        .with_endpoint_override(
            "object-store",
            Url::parse(&server.url("/override/v1")).unwrap(),
        );
    let _ = server.reply(Reply::status(204));
    let storage = ObjectStorage::new(&session);
    let _ = storage.get_account().await.unwrap();
    assert_eq!(server.last_request().path, "/override/v1");
}

#[tokio::test]
async fn test_fixed_token() {
    let server = MockServer::start().await;
    let auth = oscloud::NoAuth::new(server.url("/v1/MossoCloudFS_1"))
        .unwrap()
        .with_token("0123456789abcdef")
        .unwrap();
    let session = Session::new(auth).await.unwrap();

    let _ = server.reply(Reply::status(401)).reply(Reply::status(401));
    let storage = ObjectStorage::new(&session);
    let err = storage.get_account().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);

    // Nothing to renew, the retry repeats the same token.
    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    for request in requests {
        assert_eq!(request.header("x-auth-token"), Some("0123456789abcdef"));
    }
}

#[tokio::test]
async fn test_validation_errors() {
    let server = MockServer::start().await;
    let session = server.session("/v1/AUTH_test").await;
    let _ = server.reply(
        Reply::json(serde_json::json!({
            "validationErrors": {"messages": ["Name must be at most 128 characters"]},
            "message": "Validation Failure",
            "code": 400
        }))
        .with_status(400)
        .with_header("x-trans-id", "tx123"),
    );

    let storage = ObjectStorage::new(&session);
    let err = storage
        .list_containers(Default::default(), None, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(
        err.message(),
        Some("Validation Failure (Name must be at most 128 characters)")
    );
}
