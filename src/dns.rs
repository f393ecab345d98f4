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

//! Rackspace Cloud DNS API.
//!
//! Modifying calls are asynchronous: they return a [DnsJob](struct.DnsJob.html) that can be
//! polled with [wait_for_job](struct.Dns.html#method.wait_for_job).

use std::time::Duration;

use log::{debug, trace};
use reqwest::Method;

use super::client::RequestBuilder;
use super::services::{GenericService, DNS};
use super::utils;
use super::{Adapter, Error, ErrorKind, Page, Query};

mod protocol;

use self::protocol::{NewDomainList, NewRecordList};
pub use self::protocol::{
    DnsJob, Domain, DomainUpdate, JobError, JobStatus, NewDomain, NewRecord, NewRecordsList,
    Record, RecordType, RecordUpdate,
};

/// Query for listing domains.
#[derive(Debug, Clone, crate::QueryItem)]
#[non_exhaustive]
pub enum DomainQuery {
    /// Domains containing this name.
    Name(String),
}

/// Query for listing records.
#[derive(Debug, Clone, crate::QueryItem)]
#[non_exhaustive]
pub enum RecordQuery {
    /// Records of this type.
    Type(RecordType),
    /// Records with this name.
    Name(String),
    /// Records with this data.
    Data(String),
}

/// Cloud DNS service client.
#[derive(Debug, Clone)]
pub struct Dns {
    adapter: Adapter<GenericService>,
}

service_client!(Dns: GenericService = DNS);

impl Dns {
    async fn domain_request(
        &self,
        method: Method,
        id: u64,
        rest: &[&str],
    ) -> Result<RequestBuilder<GenericService>, Error> {
        let id = id.to_string();
        let path = ["domains", id.as_str()]
            .iter()
            .chain(rest.iter())
            .copied()
            .collect::<Vec<_>>();
        self.adapter.request(method, path).await
    }

    async fn fetch_job(request: RequestBuilder<GenericService>) -> Result<DnsJob, Error> {
        let job: DnsJob = request.fetch_json().await?;
        debug!("Started DNS job {} ({})", job.job_id, job.status);
        Ok(job)
    }

    /// List domains.
    ///
    /// Pagination is offset-based: the next pages are fetched by following links.
    pub async fn list_domains(
        &self,
        query: Query<DomainQuery>,
        limit: Option<usize>,
    ) -> Result<Page<Domain>, Error> {
        trace!("Listing domains with {:?}", query);
        self.adapter
            .get(&["domains"])
            .await?
            .query(&query)
            .fetch_page(limit, None)
            .await
    }

    /// Get a domain by its ID.
    pub async fn get_domain(&self, id: u64) -> Result<Domain, Error> {
        let domain: Domain = self
            .domain_request(Method::GET, id, &[])
            .await?
            .query(&[("showRecords", "false"), ("showSubdomains", "false")])
            .fetch_json()
            .await?;
        trace!("Received {:?}", domain);
        Ok(domain)
    }

    /// Start creating domains.
    ///
    /// Use [DnsJob::domains](struct.DnsJob.html#method.domains) on the completed job to get the
    /// created domains.
    pub async fn create_domains(&self, domains: &[NewDomain]) -> Result<DnsJob, Error> {
        if domains.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "At least one domain is required",
            ));
        }
        let request = self
            .adapter
            .post(&["domains"])
            .await?
            .json(&NewDomainList { domains });
        Dns::fetch_job(request).await
    }

    /// Start creating a domain.
    pub async fn create_domain(&self, domain: NewDomain) -> Result<DnsJob, Error> {
        self.create_domains(&[domain]).await
    }

    /// Start updating a domain.
    pub async fn update_domain(&self, id: u64, update: &DomainUpdate) -> Result<DnsJob, Error> {
        let request = self
            .domain_request(Method::PUT, id, &[])
            .await?
            .json(update);
        Dns::fetch_job(request).await
    }

    /// Start deleting a domain.
    pub async fn delete_domain(&self, id: u64, delete_subdomains: bool) -> Result<DnsJob, Error> {
        let request = self
            .domain_request(Method::DELETE, id, &[])
            .await?
            .query(&[("deleteSubdomains", delete_subdomains)]);
        Dns::fetch_job(request).await
    }

    /// List records of a domain.
    pub async fn list_records(
        &self,
        domain_id: u64,
        query: Query<RecordQuery>,
        limit: Option<usize>,
    ) -> Result<Page<Record>, Error> {
        trace!("Listing records of domain {} with {:?}", domain_id, query);
        self.domain_request(Method::GET, domain_id, &["records"])
            .await?
            .query(&query)
            .fetch_page(limit, None)
            .await
    }

    /// Get a record by its ID.
    pub async fn get_record<S: AsRef<str>>(
        &self,
        domain_id: u64,
        record_id: S,
    ) -> Result<Record, Error> {
        self.domain_request(Method::GET, domain_id, &["records", record_id.as_ref()])
            .await?
            .fetch_json()
            .await
    }

    /// Start adding records to a domain.
    ///
    /// Use [DnsJob::records](struct.DnsJob.html#method.records) on the completed job to get the
    /// created records.
    pub async fn add_records(&self, domain_id: u64, records: &[NewRecord]) -> Result<DnsJob, Error> {
        if records.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "At least one record is required",
            ));
        }
        let request = self
            .domain_request(Method::POST, domain_id, &["records"])
            .await?
            .json(&NewRecordList { records });
        Dns::fetch_job(request).await
    }

    /// Start updating a record.
    pub async fn update_record<S: AsRef<str>>(
        &self,
        domain_id: u64,
        record_id: S,
        update: &RecordUpdate,
    ) -> Result<DnsJob, Error> {
        let request = self
            .domain_request(Method::PUT, domain_id, &["records", record_id.as_ref()])
            .await?
            .json(update);
        Dns::fetch_job(request).await
    }

    /// Start removing a record.
    pub async fn remove_record<S: AsRef<str>>(
        &self,
        domain_id: u64,
        record_id: S,
    ) -> Result<DnsJob, Error> {
        let request = self
            .domain_request(Method::DELETE, domain_id, &["records", record_id.as_ref()])
            .await?;
        Dns::fetch_job(request).await
    }

    /// Get the current state of a job.
    pub async fn get_job<S: AsRef<str>>(&self, job_id: S) -> Result<DnsJob, Error> {
        self.adapter
            .get(&["status", job_id.as_ref()])
            .await?
            .query(&[("showDetails", "true")])
            .fetch_json()
            .await
    }

    /// Wait for a job to complete.
    ///
    /// Fails with `OperationFailed` if the job ends with an error.
    pub async fn wait_for_job(
        &self,
        job: &DnsJob,
        timeout: Duration,
        delay: Duration,
    ) -> Result<DnsJob, Error> {
        let job_id = job.job_id.as_str();
        let description = format!("DNS job {} to complete", job_id);
        utils::wait_for(timeout, delay, &description, move || async move {
            let job = self.get_job(job_id).await?;
            match job.status {
                JobStatus::Completed => Ok(Some(job)),
                JobStatus::Error => {
                    let message = job
                        .error
                        .as_ref()
                        .and_then(|e| e.details.clone().or_else(|| e.message.clone()))
                        .unwrap_or_else(|| "unknown error".into());
                    Err(Error::new(
                        ErrorKind::OperationFailed,
                        format!("DNS job {} failed: {}", job_id, message),
                    ))
                }
                _ => Ok(None),
            }
        })
        .await
    }
}
