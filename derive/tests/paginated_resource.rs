use serde::Deserialize;

use oscloud::{PaginatedResource, ResourceCollection};
use oscloud_derive::PaginatedResource;

#[derive(Debug, Deserialize, PaginatedResource)]
struct FloatingIp {
    #[resource_id]
    id: String,
    #[allow(dead_code)]
    floating_ip_address: String,
}

#[derive(Debug, Deserialize, PaginatedResource)]
#[collection_name = "loadBalancers"]
struct LoadBalancer {
    #[resource_id]
    id: u64,
}

#[derive(Debug, Deserialize, PaginatedResource)]
#[collection_name = "domains"]
#[link_only]
struct Domain {
    #[resource_id]
    id: u64,
}

#[derive(Debug, Deserialize, PaginatedResource)]
#[flat_collection]
struct Container {
    #[resource_id]
    name: String,
}

#[test]
fn test_default_collection_name() {
    let json = r#"{
        "floating_ips": [
            {"id": "f1", "floating_ip_address": "172.24.4.228"},
            {"id": "f2", "floating_ip_address": "172.24.4.229"}
        ],
        "floating_ips_links": [
            {"href": "http://127.0.0.1:9696/v2.0/floatingips?marker=f2&limit=2", "rel": "next"}
        ]
    }"#;
    let root: <FloatingIp as PaginatedResource>::Root = serde_json::from_str(json).unwrap();
    assert_eq!(
        root.next_link().unwrap().query(),
        Some("marker=f2&limit=2")
    );
    let items = root.into_items();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].resource_id(), "f2");
    assert!(FloatingIp::SUPPORTS_MARKER);
}

#[test]
fn test_renamed_collection_with_plain_links() {
    let json = r#"{
        "loadBalancers": [{"id": 71}, {"id": 72}],
        "links": [{"href": "http://127.0.0.1/v1.0/1/loadbalancers?marker=72", "rel": "next"}]
    }"#;
    let root: <LoadBalancer as PaginatedResource>::Root = serde_json::from_str(json).unwrap();
    assert!(root.next_link().is_some());
    let ids: Vec<u64> = root.into_items().iter().map(|lb| lb.resource_id()).collect();
    assert_eq!(ids, vec![71, 72]);
}

#[test]
fn test_collection_and_plain_links() {
    let json = r#"{
        "loadBalancers": [{"id": 73}],
        "loadBalancers_links": [{"href": "http://127.0.0.1/v1.0/1/loadbalancers?marker=73", "rel": "next"}],
        "links": [{"href": "http://127.0.0.1/v1.0/1/loadbalancers", "rel": "self"}]
    }"#;
    let root: <LoadBalancer as PaginatedResource>::Root = serde_json::from_str(json).unwrap();
    assert_eq!(root.next_link().unwrap().query(), Some("marker=73"));

    let json = r#"{
        "loadBalancers": [{"id": 74}],
        "loadBalancers_links": [],
        "links": [{"href": "http://127.0.0.1/v1.0/1/loadbalancers?offset=1", "rel": "next"}]
    }"#;
    let root: <LoadBalancer as PaginatedResource>::Root = serde_json::from_str(json).unwrap();
    assert_eq!(root.next_link().unwrap().query(), Some("offset=1"));
}

#[test]
fn test_link_only() {
    assert!(!Domain::SUPPORTS_MARKER);
    let root: <Domain as PaginatedResource>::Root =
        serde_json::from_str(r#"{"domains": [{"id": 1}], "totalEntries": 1}"#).unwrap();
    assert!(root.next_link().is_none());
    assert_eq!(root.into_items()[0].resource_id(), 1);
}

#[test]
fn test_flat_collection() {
    let json = r#"[{"name": "backups"}, {"name": "images"}]"#;
    let root: <Container as PaginatedResource>::Root = serde_json::from_str(json).unwrap();
    assert_eq!(root.len(), 2);
    assert_eq!(root[0].resource_id(), "backups");
}
