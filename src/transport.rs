//! One HTTP round trip: GET, POST, multipart upload, DELETE, or a download
//! streamed to a local file.

use crate::config::ClientConfiguration;
use crate::errors::OpencgaError;
use crate::query::{Method, Params, BODY, FILE};
use itertools::Itertools;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// A fully-resolved request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub params: Params,
    pub token: Option<String>,
}

/// Status and undecoded body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Something which can send a [Request]. Calls block until the response
/// arrives.
pub trait Transport {
    fn dispatch(&self, request: &Request) -> Result<RawResponse, OpencgaError>;

    /// Write the response body to `destination`, returning the number of
    /// bytes written. An unsuccessful status is an error and leaves
    /// `destination` untouched.
    ///
    /// The provided implementation reads the whole body through
    /// [Transport::dispatch] first.
    fn download(&self, request: &Request, destination: &Path) -> Result<u64, OpencgaError> {
        let raw = self.dispatch(request)?;
        check_download_status(raw.status, &request.url)?;
        fs_err::write(destination, &raw.body).map_err(|e| download_error(destination, e))?;
        Ok(raw.body.len() as u64)
    }
}

/// [Transport] over a blocking [reqwest] client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    transfer_timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &ClientConfiguration) -> Result<Self, reqwest::Error> {
        if config.rest.tls_allow_invalid_certificates {
            log::debug!("accepting invalid TLS certificates");
        }
        let client = Client::builder()
            .default_headers(accept_json())
            .connect_timeout(config.connect_timeout())
            .timeout(config.read_timeout())
            .danger_accept_invalid_certs(config.rest.tls_allow_invalid_certificates)
            .build()?;
        Ok(Self {
            client,
            transfer_timeout: config.transfer_timeout(),
        })
    }

    fn build(&self, request: &Request) -> Result<RequestBuilder, OpencgaError> {
        let url = request.url.clone();
        let builder = match request.method {
            Method::Get => self
                .client
                .get(url)
                .query(&query_pairs(&request.params, &[BODY])),
            Method::Delete => self
                .client
                .delete(url)
                .query(&query_pairs(&request.params, &[BODY])),
            Method::Post => {
                let builder = self
                    .client
                    .post(url)
                    .query(&query_pairs(&request.params, &[BODY]));
                match request.params.get(BODY) {
                    Some(body) => builder.json(body),
                    None => builder,
                }
            }
            Method::Upload => {
                let form = UploadForm::from_params(&request.params)?.into_form()?;
                self.client
                    .post(url)
                    .multipart(form)
                    .timeout(self.transfer_timeout)
            }
            Method::Download => self
                .client
                .get(url)
                .query(&query_pairs(&request.params, &[BODY]))
                .timeout(self.transfer_timeout),
        };
        Ok(match &request.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }
}

impl Transport for HttpTransport {
    fn dispatch(&self, request: &Request) -> Result<RawResponse, OpencgaError> {
        log::debug!("{:?} {}", request.method, request.url);
        let res = self.build(request)?.send()?;
        let status = res.status();
        if !status.is_success() {
            log::debug!("{} responded with {}", request.url, status);
        }
        let body = res.text()?;
        Ok(RawResponse { status, body })
    }

    fn download(&self, request: &Request, destination: &Path) -> Result<u64, OpencgaError> {
        log::debug!("{:?} {} to {:?}", request.method, request.url, destination);
        let mut res = self.build(request)?.send()?;
        check_download_status(res.status(), &request.url)?;
        let write_error = |source| download_error(destination, source);
        let mut file = fs_err::File::create(destination).map_err(write_error)?;
        std::io::copy(&mut res, &mut file).map_err(write_error)
    }
}

fn check_download_status(status: StatusCode, url: &Url) -> Result<(), OpencgaError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(OpencgaError::Server(format!(
            "download of {} failed with HTTP status {}",
            url, status
        )))
    }
}

fn download_error(destination: &Path, source: std::io::Error) -> OpencgaError {
    OpencgaError::DownloadFile {
        path: destination.to_string_lossy().into_owned(),
        source,
    }
}

fn accept_json() -> HeaderMap {
    HeaderMap::from_iter([(ACCEPT, HeaderValue::from_static("application/json"))])
}

/// Query string representation of a parameter value. `null` is omitted.
fn param_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => Some(items.iter().filter_map(param_to_string).join(",")),
        Value::Object(_) => Some(value.to_string()),
    }
}

/// Every parameter except the excluded keys, as query string pairs.
pub(crate) fn query_pairs(params: &Params, exclude: &[&str]) -> Vec<(String, String)> {
    params
        .iter()
        .filter(|(k, _)| !exclude.contains(&k.as_str()))
        .filter_map(|(k, v)| param_to_string(v).map(|v| (k.clone(), v)))
        .collect()
}

/// Parts of a multipart upload: the local file, and every other parameter
/// except `body` as a form field.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct UploadForm {
    pub file: PathBuf,
    pub fields: Vec<(String, String)>,
}

impl UploadForm {
    pub fn from_params(params: &Params) -> Result<Self, OpencgaError> {
        let file = params
            .get(FILE)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| OpencgaError::client("upload requires a \"file\" parameter"))?;
        Ok(Self {
            file: PathBuf::from(file),
            fields: query_pairs(params, &[FILE, BODY]),
        })
    }

    /// Open the file and build the form. The file is closed when the form
    /// is dropped, i.e. when the request completes or fails.
    pub fn into_form(self) -> Result<Form, OpencgaError> {
        let upload_error = |source| OpencgaError::UploadFile {
            path: self.file.to_string_lossy().into_owned(),
            source,
        };
        let file = fs_err::File::open(&self.file).map_err(upload_error)?;
        let length = file.metadata().map_err(upload_error)?.len();
        let filename = self
            .file
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| FILE.to_string());
        let part = Part::reader_with_length(file, length).file_name(filename);
        let form = self
            .fields
            .into_iter()
            .fold(Form::new().part(FILE, part), |form, (k, v)| form.text(k, v));
        Ok(form)
    }
}
