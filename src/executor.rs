//! Batch fetching: satisfy a requested result count larger than the
//! server's page cap by issuing paged requests and merging the pages.
//!
//! A query naming several resources by a comma-separated id is split by id
//! instead, at most [MAX_IDS_PER_REQUEST] ids per request.

use crate::config::ClientConfiguration;
use crate::decoder::{decode, Decoded};
use crate::errors::OpencgaError;
use crate::models::RestResponse;
use crate::query::{usize_param, LogicalQuery, Method, LIMIT, SKIP, TIMEOUT};
use crate::transport::{Request, Transport};
use crate::types::HostUrl;
use itertools::Itertools;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Most ids the server accepts in one path segment.
pub const MAX_IDS_PER_REQUEST: usize = 100;

/// Paging state of one logical query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cursor {
    /// Offset already consumed.
    pub skip: usize,
    /// Page size of the next request. Never more than `batch_cap`.
    pub limit: usize,
    /// Number of results the caller asked for.
    pub requested_total: usize,
    pub batch_cap: usize,
}

impl Cursor {
    pub fn new(skip: usize, requested_total: usize, batch_cap: usize) -> Self {
        let batch_cap = batch_cap.max(1);
        Self {
            skip,
            limit: requested_total.min(batch_cap),
            requested_total,
            batch_cap,
        }
    }

    /// Whether to stop after receiving a page of `page_count` elements,
    /// having accumulated `total` so far.
    pub fn is_done(&self, page_count: usize, total: usize) -> bool {
        page_count == 0 || page_count < self.limit || total >= self.requested_total
    }

    /// Move past a full page. The last page is shrunk to the remainder.
    pub fn advance(&mut self, page_count: usize, total: usize) {
        self.skip += page_count;
        self.limit = if self.skip + self.batch_cap < self.requested_total {
            self.batch_cap
        } else {
            self.requested_total.saturating_sub(total).min(self.batch_cap)
        };
    }

    /// The ids of the next request.
    fn window<'a>(&self, ids: &[&'a str]) -> Vec<&'a str> {
        let end = (self.skip + self.limit).min(ids.len());
        ids[self.skip.min(end)..end].to_vec()
    }
}

/// Executes [LogicalQuery] against a [Transport], one page at a time.
pub struct BatchExecutor {
    transport: Box<dyn Transport + Send + Sync>,
    host: HostUrl,
    timeout: u64,
    batch_query_size: usize,
    default_limit: usize,
}

impl BatchExecutor {
    pub fn new<T: Transport + Send + Sync + 'static>(
        config: &ClientConfiguration,
        transport: T,
    ) -> Self {
        Self {
            transport: Box::new(transport),
            host: config.rest.host.clone(),
            timeout: config.rest.timeout,
            batch_query_size: config.rest.query.batch_query_size,
            default_limit: config.rest.query.limit,
        }
    }

    pub fn host(&self) -> &HostUrl {
        &self.host
    }

    /// Run a query to completion, merging every page into the first one.
    ///
    /// `limit` and `skip` are taken from the query parameters, defaulting to
    /// the configured limit and 0. When the query's id is a comma-separated
    /// list, they are ignored: every id is fetched, in batches of
    /// [MAX_IDS_PER_REQUEST].
    ///
    /// If any page fails, the pages already received are discarded and the
    /// error is returned. With `throw_on_error`, a page with an unsuccessful
    /// HTTP status or an ERROR event is such a failure.
    pub fn execute<T: DeserializeOwned>(
        &self,
        query: &LogicalQuery,
        token: Option<&str>,
        throw_on_error: bool,
    ) -> Result<RestResponse<T>, OpencgaError> {
        let ids = query.id_list();
        let mut cursor = match &ids {
            Some(ids) => Cursor::new(0, ids.len(), MAX_IDS_PER_REQUEST),
            None => Cursor::new(
                usize_param(&query.params, SKIP).unwrap_or(0),
                usize_param(&query.params, LIMIT).unwrap_or(self.default_limit),
                self.batch_query_size,
            ),
        };
        let mut merged: Option<RestResponse<T>> = None;

        loop {
            let mut params = query.params.clone();
            let url = match &ids {
                Some(ids) => {
                    params.remove(SKIP);
                    let batch = cursor.window(ids).join(",");
                    query.url_with_id(&self.host, Some(batch.as_str()))?
                }
                None => {
                    params.insert(SKIP.to_string(), cursor.skip.into());
                    query.url(&self.host)?
                }
            };
            params.insert(LIMIT.to_string(), cursor.limit.into());
            params.insert(TIMEOUT.to_string(), self.timeout.into());
            let request = Request {
                method: query.method,
                url,
                params,
                token: token.map(String::from),
            };
            let page: RestResponse<T> = self.round_trip(&request, throw_on_error)?;
            let page_count = page.result_count();
            log::debug!(
                "{} skip={} limit={} received={}",
                request.url.path(),
                cursor.skip,
                cursor.limit,
                page_count
            );

            match merged.as_mut() {
                None => merged = Some(page),
                Some(m) => m.merge_first_page(page),
            }
            let total = merged
                .as_ref()
                .and_then(RestResponse::first_page)
                .map(|p| p.num_results)
                .unwrap_or(0);

            if cursor.is_done(page_count, total) {
                break;
            }
            cursor.advance(page_count, total);
        }
        Ok(merged.unwrap_or_default())
    }

    /// Fetch one resource into `destination`, returning the number of bytes
    /// written. Nothing is paged.
    pub fn download(
        &self,
        query: &LogicalQuery,
        token: Option<&str>,
        destination: &Path,
    ) -> Result<u64, OpencgaError> {
        let mut params = query.params.clone();
        params.insert(TIMEOUT.to_string(), self.timeout.into());
        let request = Request {
            method: Method::Download,
            url: query.url(&self.host)?,
            params,
            token: token.map(String::from),
        };
        let written = self.transport.download(&request, destination)?;
        log::debug!("{} wrote {} bytes to {:?}", request.url.path(), written, destination);
        Ok(written)
    }

    fn round_trip<T: DeserializeOwned>(
        &self,
        request: &Request,
        throw_on_error: bool,
    ) -> Result<RestResponse<T>, OpencgaError> {
        let raw = self.transport.dispatch(request)?;
        let page = match decode(&raw.body)? {
            Decoded::Envelope(r) => r,
            Decoded::GatewayTimeout(r) => {
                log::warn!("{} timed out behind the gateway", request.url);
                r
            }
        };
        match check_errors(&page, raw.status) {
            Err(e) if throw_on_error => Err(e),
            Err(e) => {
                log::debug!("{} {}: {}", request.url, raw.status, e);
                Ok(page)
            }
            Ok(()) => Ok(page),
        }
    }
}

/// An unsuccessful status, with the messages of any ERROR events, or else
/// the first ERROR event.
fn check_errors<T>(page: &RestResponse<T>, status: StatusCode) -> Result<(), OpencgaError> {
    if !status.is_success() {
        let mut message = format!("Unsuccessful HTTP status {}", status);
        let errors = page.error_messages().join(",");
        if !errors.is_empty() {
            message.push_str(&format!(" [{}]", errors));
        }
        return Err(OpencgaError::Server(message));
    }
    match page.first_error_message() {
        Some(message) => Err(OpencgaError::Server(message)),
        None => Ok(()),
    }
}
