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

//! JSON structures and protocol bits for the Cloud DNS API.

use chrono::{DateTime, FixedOffset};
use serde::de::{DeserializeOwned, Error as DeError};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{Error, ErrorKind};

protocol_enum! {
    #[doc = "DNS record types."]
    enum RecordType(Other) {
        A = "A",
        Aaaa = "AAAA",
        Cname = "CNAME",
        Mx = "MX",
        Ns = "NS",
        Ptr = "PTR",
        Srv = "SRV",
        Txt = "TXT"
    }
}

protocol_enum! {
    #[doc = "Status of an asynchronous job."]
    enum JobStatus(Other) {
        Initialized = "INITIALIZED",
        Running = "RUNNING",
        Completed = "COMPLETED",
        Error = "ERROR"
    }
}

/// The service uses offsets without a colon (`+0000`).
fn deserialize_timestamp<'de, D>(des: D) -> Result<Option<DateTime<FixedOffset>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Deserialize::deserialize(des)?;
    value
        .map(|s| DateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f%z").map_err(D::Error::custom))
        .transpose()
}

/// A DNS domain (zone).
#[derive(Clone, Debug, Deserialize, crate::PaginatedResource)]
#[serde(rename_all = "camelCase")]
#[collection_name = "domains"]
#[link_only]
pub struct Domain {
    /// Domain ID.
    #[resource_id]
    pub id: u64,
    /// Domain name.
    pub name: String,
    /// Owning account.
    #[serde(default)]
    pub account_id: Option<u64>,
    /// Contact e-mail.
    #[serde(default)]
    pub email_address: Option<String>,
    /// Default TTL.
    #[serde(default)]
    pub ttl: Option<u32>,
    /// Comment.
    #[serde(default)]
    pub comment: Option<String>,
    /// Creation time.
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created: Option<DateTime<FixedOffset>>,
    /// Last update time.
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub updated: Option<DateTime<FixedOffset>>,
}

/// A DNS record.
#[derive(Clone, Debug, Deserialize, crate::PaginatedResource)]
#[collection_name = "records"]
#[link_only]
pub struct Record {
    /// Record ID (e.g. `A-1234`).
    #[resource_id]
    pub id: String,
    /// Fully qualified name.
    pub name: String,
    /// Record type.
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Record data.
    pub data: String,
    /// TTL.
    #[serde(default)]
    pub ttl: Option<u32>,
    /// Priority (MX and SRV only).
    #[serde(default)]
    pub priority: Option<u16>,
    /// Comment.
    #[serde(default)]
    pub comment: Option<String>,
    /// Creation time.
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created: Option<DateTime<FixedOffset>>,
    /// Last update time.
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub updated: Option<DateTime<FixedOffset>>,
}

/// Details of a failed job.
#[derive(Clone, Debug, Deserialize)]
pub struct JobError {
    /// HTTP-like error code.
    #[serde(default)]
    pub code: Option<u16>,
    /// Error message.
    #[serde(default)]
    pub message: Option<String>,
    /// Error details.
    #[serde(default)]
    pub details: Option<String>,
}

/// An asynchronous job started by a modifying call.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsJob {
    /// Job ID.
    pub job_id: String,
    /// Current status.
    pub status: JobStatus,
    /// HTTP verb of the original request.
    #[serde(default)]
    pub verb: Option<String>,
    /// URL of the original request.
    #[serde(default)]
    pub request_url: Option<String>,
    /// URL to poll for the job status.
    #[serde(default)]
    pub callback_url: Option<String>,
    /// Response of the original request (only for completed jobs).
    #[serde(default)]
    pub response: Option<serde_json::Value>,
    /// Error (only for failed jobs).
    #[serde(default)]
    pub error: Option<JobError>,
}

#[derive(Debug, Deserialize)]
struct DomainList {
    domains: Vec<Domain>,
}

#[derive(Debug, Deserialize)]
struct RecordList {
    records: Vec<Record>,
}

impl DnsJob {
    /// Whether the job has finished (successfully or not).
    pub fn is_finished(&self) -> bool {
        self.status == JobStatus::Completed || self.status == JobStatus::Error
    }

    fn parse_response<T: DeserializeOwned>(&self) -> Result<T, Error> {
        match self.response {
            Some(ref value) => Ok(serde_json::from_value(value.clone())?),
            None => Err(Error::new(
                ErrorKind::InvalidResponse,
                format!("Job {} has no response (status {})", self.job_id, self.status),
            )),
        }
    }

    /// Domains created by a completed job.
    pub fn domains(&self) -> Result<Vec<Domain>, Error> {
        self.parse_response::<DomainList>().map(|list| list.domains)
    }

    /// Records created by a completed job.
    pub fn records(&self) -> Result<Vec<Record>, Error> {
        self.parse_response::<RecordList>().map(|list| list.records)
    }
}

/// A record to add.
#[derive(Clone, Debug, Serialize)]
pub struct NewRecord {
    /// Record name.
    pub name: String,
    /// Record type.
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Record data.
    pub data: String,
    /// TTL (at least 300).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    /// Priority (MX and SRV only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    /// Comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl NewRecord {
    /// A new record without optional fields.
    pub fn new<N, D>(name: N, record_type: RecordType, data: D) -> NewRecord
    where
        N: Into<String>,
        D: Into<String>,
    {
        NewRecord {
            name: name.into(),
            record_type,
            data: data.into(),
            ttl: None,
            priority: None,
            comment: None,
        }
    }
}

/// Changes to a record.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RecordUpdate {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// New TTL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    /// New priority.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    /// New comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct NewRecordList<'r> {
    pub records: &'r [NewRecord],
}

/// A domain to create.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDomain {
    /// Domain name.
    pub name: String,
    /// Contact e-mail.
    pub email_address: String,
    /// Default TTL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    /// Comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Initial records.
    #[serde(rename = "recordsList", skip_serializing_if = "Option::is_none")]
    pub records: Option<NewRecordsList>,
}

/// Initial records of a new domain.
#[derive(Clone, Debug, Default, Serialize)]
pub struct NewRecordsList {
    /// Records.
    pub records: Vec<NewRecord>,
}

impl NewDomain {
    /// A new domain without records.
    pub fn new<N, E>(name: N, email_address: E) -> NewDomain
    where
        N: Into<String>,
        E: Into<String>,
    {
        NewDomain {
            name: name.into(),
            email_address: email_address.into(),
            ttl: None,
            comment: None,
            records: None,
        }
    }

    /// Add an initial record.
    pub fn with_record(mut self, record: NewRecord) -> NewDomain {
        self.records
            .get_or_insert_with(Default::default)
            .records
            .push(record);
        self
    }
}

/// Changes to a domain.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainUpdate {
    /// New contact e-mail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    /// New default TTL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    /// New comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct NewDomainList<'d> {
    pub domains: &'d [NewDomain],
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::common::test::compare;
    use crate::{PaginatedResource, ResourceCollection};

    #[test]
    fn test_domains_parse() {
        let root: <Domain as PaginatedResource>::Root = serde_json::from_str(
            r#"{"domains": [{"name": "example.com", "id": 2725233,
                             "accountId": 1234, "emailAddress": "admin@example.com",
                             "updated": "2011-06-24T01:23:15.000+0000",
                             "created": "2011-06-24T01:12:51.000+0000"}],
                "totalEntries": 114,
                "links": [{"href": "https://dns.api.rackspacecloud.com/v1.0/1234/domains?limit=1&offset=1",
                           "rel": "next"}]}"#,
        )
        .unwrap();
        let next = root.next_link().unwrap();
        assert_eq!(next.query(), Some("limit=1&offset=1"));
        let domains = root.into_items();
        assert_eq!(domains[0].id, 2725233);
        assert_eq!(domains[0].account_id, Some(1234));
        assert!(domains[0].created.is_some());
        assert!(!Domain::SUPPORTS_MARKER);
    }

    #[test]
    fn test_record_parse() {
        let record: Record = serde_json::from_str(
            r#"{"name": "example.com", "id": "MX-4582", "type": "MX",
                "data": "mail.example.com", "priority": 5, "ttl": 3600}"#,
        )
        .unwrap();
        assert_eq!(record.record_type, RecordType::Mx);
        assert_eq!(record.priority, Some(5));
        assert!(record.created.is_none());

        let record: Record = serde_json::from_str(
            r#"{"name": "example.com", "id": "CAA-1", "type": "CAA", "data": "0 issue x"}"#,
        )
        .unwrap();
        assert!(record.record_type.is_unknown());
        assert_eq!(record.record_type.as_str(), "CAA");
    }

    #[test]
    fn test_job_parse() {
        let job: DnsJob = serde_json::from_str(
            r#"{"status": "COMPLETED", "verb": "POST",
                "jobId": "852a1e4a-b1b6-4d37-9a1c-c3b7f8a3fc6e",
                "callbackUrl": "https://dns.api.rackspacecloud.com/v1.0/1234/status/852a1e4a",
                "response": {"domains": [{"name": "example.com", "id": 1}]}}"#,
        )
        .unwrap();
        assert!(job.is_finished());
        assert_eq!(job.domains().unwrap()[0].name, "example.com");
        assert!(job.records().is_err());

        let job: DnsJob = serde_json::from_str(
            r#"{"status": "ERROR", "jobId": "x",
                "error": {"code": 409, "message": "Conflict", "details": "Domain already exists"}}"#,
        )
        .unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.error.unwrap().code, Some(409));
    }

    #[test]
    fn test_new_domain_serialize() {
        let domain = NewDomain::new("example.com", "admin@example.com")
            .with_record(NewRecord::new("www.example.com", RecordType::A, "192.0.2.1"));
        compare(
            r#"{"domains": [{"name": "example.com", "emailAddress": "admin@example.com",
                             "recordsList": {"records": [
                                {"name": "www.example.com", "type": "A", "data": "192.0.2.1"}
                             ]}}]}"#,
            NewDomainList {
                domains: &[domain],
            },
        );
    }
}
