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

use axum::http::Method;
use chrono::{Duration, Utc};
use serde_json::json;

use oscloud::client::NO_PATH;
use oscloud::identity::v2::{CloudIdentity, Credentials};
use oscloud::identity::{IdOrName, IdentityV2, Password, Token};
use oscloud::objectstorage::ObjectStorage;
use oscloud::services::OBJECT_STORAGE;
use oscloud::{ErrorKind, Session};

use common::{MockServer, Reply};

fn expires_in(minutes: i64) -> String {
    (Utc::now() + Duration::minutes(minutes)).to_rfc3339()
}

fn v3_token(server: &MockServer, token: &str) -> Reply {
    Reply::json(json!({
        "token": {
            "expires_at": expires_in(60),
            "catalog": [{
                "type": "object-store",
                "name": "swift",
                "endpoints": [
                    {"interface": "public", "region": "RegionOne", "url": server.url("/v1/AUTH_p1")},
                    {"interface": "internal", "region": "RegionOne", "url": "http://10.0.0.1/v1/AUTH_p1"}
                ]
            }],
            "project": {"id": "p1", "name": "demo"},
            "user": {"id": "u1", "name": "admin"},
            "roles": [{"id": "r1", "name": "member"}]
        }
    }))
    .with_status(201)
    .with_header("x-subject-token", token)
}

fn v2_access(server: &MockServer, token: &str, expires: String) -> Reply {
    Reply::json(json!({
        "access": {
            "token": {
                "id": token,
                "expires": expires,
                "tenant": {"id": "123456", "name": "123456"}
            },
            "serviceCatalog": [
                {
                    "type": "object-store",
                    "name": "cloudFiles",
                    "endpoints": [{
                        "region": "DFW",
                        "publicURL": server.url("/dfw/v1/MossoCloudFS_1"),
                        "internalURL": "http://snet.dfw/v1/MossoCloudFS_1"
                    }]
                },
                {
                    "type": "object-store",
                    "name": "cloudFilesOrd",
                    "endpoints": [{
                        "region": "ORD",
                        "publicURL": server.url("/ord/v1/MossoCloudFS_1")
                    }]
                }
            ],
            "user": {
                "id": "u1",
                "name": "joe",
                "RAX-AUTH:defaultRegion": "ORD",
                "roles": [
                    {"id": "3", "name": "identity:default", "description": "Default Role."},
                    {"id": "5", "name": "object-store:default", "tenantId": "MossoCloudFS_1"}
                ]
            }
        }
    }))
}

#[tokio::test]
async fn test_v3_password() {
    let server = MockServer::start().await;
    let _ = server
        .reply(v3_token(&server, "v3-token"))
        .reply(Reply::status(204).with_header("x-account-container-count", "2"));

    let auth = Password::new(server.url("/v3"), "admin", "secret", "Default")
        .unwrap()
        .with_project_scope(IdOrName::from_name("demo"), IdOrName::from_id("default"));
    let session = Session::new(auth).await.unwrap();

    let access = session.client().access().await.unwrap().unwrap();
    assert_eq!(access.token.id, "v3-token");
    assert_eq!(access.token.tenant.unwrap().id, "p1");
    assert_eq!(access.user.unwrap().roles[0].name, "member");

    let account = ObjectStorage::new(&session).get_account().await.unwrap();
    assert_eq!(account.container_count, 2);

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, Method::POST);
    assert_eq!(requests[0].path, "/v3/auth/tokens");
    assert!(requests[0].header("x-auth-token").is_none());
    let body = requests[0].json();
    assert_eq!(body["auth"]["identity"]["methods"], json!(["password"]));
    assert_eq!(
        body["auth"]["identity"]["password"]["user"],
        json!({"name": "admin", "password": "secret", "domain": {"name": "Default"}})
    );
    assert_eq!(
        body["auth"]["scope"]["project"],
        json!({"name": "demo", "domain": {"id": "default"}})
    );

    assert_eq!(requests[1].method, Method::HEAD);
    assert_eq!(requests[1].path, "/v1/AUTH_p1");
    assert_eq!(requests[1].header("x-auth-token"), Some("v3-token"));
}

#[tokio::test]
async fn test_v3_token_without_subject_header() {
    let server = MockServer::start().await;
    let _ = server.reply(
        Reply::json(json!({"token": {"expires_at": expires_in(60)}})).with_status(201),
    );

    let auth = Token::new(server.url("/identity/v3"), "old-token").unwrap();
    let err = Session::new(auth).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidResponse);

    let request = server.last_request();
    assert_eq!(request.path, "/identity/v3/auth/tokens");
    assert_eq!(
        request.json()["auth"]["identity"],
        json!({"methods": ["token"], "token": {"id": "old-token"}})
    );
}

#[tokio::test]
async fn test_v2_api_key_default_region() {
    let server = MockServer::start().await;
    let _ = server.reply(v2_access(&server, "rax-token", expires_in(60)));

    let auth = CloudIdentity::new(server.url("/v2.0"), Credentials::api_key("joe", "0123abcd"))
        .unwrap();
    let session = Session::new(auth).await.unwrap();

    let request = server.last_request();
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.path, "/v2.0/tokens");
    assert_eq!(
        request.json(),
        json!({"auth": {"RAX-KSKEY:apiKeyCredentials": {"username": "joe", "apiKey": "0123abcd"}}})
    );

    // ORD is only listed in the second catalog entry of the type.
    let endpoint = session.get_endpoint(OBJECT_STORAGE, NO_PATH).await.unwrap();
    assert_eq!(endpoint.as_str(), server.url("/ord/v1/MossoCloudFS_1"));
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn test_v2_explicit_region() {
    let server = MockServer::start().await;
    let _ = server
        .reply(v2_access(&server, "rax-token", expires_in(60)))
        .reply(Reply::status(204));

    let auth = CloudIdentity::new(server.url("/v2.0/"), Credentials::api_key("joe", "0123abcd"))
        .unwrap()
        .with_region("DFW");
    let session = Session::new(auth).await.unwrap();
    let _ = ObjectStorage::new(&session).get_account().await.unwrap();

    let request = server.last_request();
    assert_eq!(request.path, "/dfw/v1/MossoCloudFS_1");
    assert_eq!(request.header("x-auth-token"), Some("rax-token"));
}

#[tokio::test]
async fn test_v2_expiring_token_renewed() {
    let server = MockServer::start().await;
    let _ = server
        .reply(v2_access(&server, "short-lived", expires_in(5)))
        .reply(v2_access(&server, "fresh", expires_in(60)))
        .reply(Reply::status(204));

    let auth =
        CloudIdentity::new(server.url("/v2.0"), Credentials::password("joe", "pa$$")).unwrap();
    let session = Session::new(auth).await.unwrap();
    let _ = ObjectStorage::new(&session).get_account().await.unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 3);
    for request in &requests[..2] {
        assert_eq!(request.path, "/v2.0/tokens");
        assert_eq!(
            request.json()["auth"]["passwordCredentials"],
            json!({"username": "joe", "password": "pa$$"})
        );
    }
    assert_eq!(requests[2].method, Method::HEAD);
    assert_eq!(requests[2].header("x-auth-token"), Some("fresh"));
}

#[tokio::test]
async fn test_v2_unauthorized_reauthenticates_once() {
    let server = MockServer::start().await;
    let _ = server
        .reply(v2_access(&server, "revoked", expires_in(60)))
        .reply(Reply::status(401))
        .reply(v2_access(&server, "renewed", expires_in(60)))
        .reply(Reply::status(204).with_header("x-account-object-count", "7"));

    let auth = CloudIdentity::new(server.url("/v2.0"), Credentials::api_key("joe", "0123abcd"))
        .unwrap();
    let session = Session::new(auth).await.unwrap();
    let account = ObjectStorage::new(&session).get_account().await.unwrap();
    assert_eq!(account.object_count, 7);

    let requests = server.requests();
    let summary: Vec<(Method, &str, Option<&str>)> = requests
        .iter()
        .map(|r| (r.method.clone(), r.path.as_str(), r.header("x-auth-token")))
        .collect();
    assert_eq!(
        summary,
        vec![
            (Method::POST, "/v2.0/tokens", None),
            (Method::HEAD, "/ord/v1/MossoCloudFS_1", Some("revoked")),
            (Method::POST, "/v2.0/tokens", None),
            (Method::HEAD, "/ord/v1/MossoCloudFS_1", Some("renewed")),
        ]
    );
}

#[tokio::test]
async fn test_v2_rejected_credentials() {
    let server = MockServer::start().await;
    let _ = server.reply(
        Reply::json(json!({"unauthorized": {"code": 401, "message": "Username or api key is invalid."}}))
            .with_status(401),
    );

    let auth = CloudIdentity::new(server.url("/v2.0"), Credentials::api_key("joe", "wrong"))
        .unwrap();
    let err = Session::new(auth).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn test_identity_v2_client() {
    let server = MockServer::start().await;
    let _ = server
        .reply(v2_access(&server, "rax-token", expires_in(60)))
        .reply(Reply::json(json!({
            "tenants": [
                {"id": "123456", "name": "123456", "enabled": true},
                {"id": "MossoCloudFS_1", "name": "MossoCloudFS_1", "enabled": true}
            ],
            "tenants_links": []
        })));

    let auth = CloudIdentity::new(server.url("/v2.0"), Credentials::api_key("joe", "0123abcd"))
        .unwrap();
    let session = Session::new(auth).await.unwrap();
    let identity = IdentityV2::new(&session);

    let user = identity.get_user_access().await.unwrap();
    assert_eq!(user.name.as_deref(), Some("joe"));
    assert_eq!(user.default_region.as_deref(), Some("ORD"));
    let roles: Vec<&str> = user.roles.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(roles, vec!["identity:default", "object-store:default"]);
    assert_eq!(user.roles[1].tenant_id.as_deref(), Some("MossoCloudFS_1"));

    let tenants = identity.list_tenants(None, None).await.unwrap();
    let ids: Vec<&str> = tenants.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["123456", "MossoCloudFS_1"]);

    let request = server.last_request();
    assert_eq!(request.method, Method::GET);
    assert_eq!(request.path, "/v2.0/tenants");
    assert_eq!(request.header("x-auth-token"), Some("rax-token"));
    assert_eq!(server.requests().len(), 2);
}
