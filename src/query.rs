//! Description of a single logical call to the web services.

use crate::types::HostUrl;
use serde_json::{Map, Value};
use url::Url;

/// Parameters of a query. Values may be any JSON value.
pub type Params = Map<String, Value>;

/// Reserved parameter carrying the JSON entity of a write operation.
pub const BODY: &str = "body";
/// Reserved parameter naming the local file of an upload.
pub const FILE: &str = "file";

pub const SKIP: &str = "skip";
pub const LIMIT: &str = "limit";
pub const TIMEOUT: &str = "timeout";

/// Path prefix of every REST endpoint, relative to the host.
pub(crate) const REST_PREFIX: [&str; 3] = ["webservices", "rest", "v1"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Upload,
    Delete,
    /// A GET whose body is written to a local file.
    Download,
}

/// Up to two `(category, id)` path segments, an action, and parameters.
///
/// e.g. `files/upload`, `samples/S1,S2/info`, `studies/1000G/acl/user1/update`
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalQuery {
    pub category: String,
    pub id: Option<String>,
    pub category2: Option<String>,
    pub id2: Option<String>,
    pub action: String,
    pub params: Params,
    pub method: Method,
}

impl LogicalQuery {
    pub fn new(category: impl Into<String>, action: impl Into<String>, method: Method) -> Self {
        Self {
            category: category.into(),
            id: None,
            category2: None,
            id2: None,
            action: action.into(),
            params: Default::default(),
            method,
        }
    }

    pub fn get(category: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(category, action, Method::Get)
    }

    pub fn post(category: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(category, action, Method::Post)
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Nested resource, e.g. the `acl` of a study.
    pub fn sub(mut self, category2: impl Into<String>, id2: Option<String>) -> Self {
        self.category2 = Some(category2.into());
        self.id2 = id2;
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params.extend(params);
        self
    }

    /// JSON entity of a POST.
    pub fn body(self, body: impl Into<Value>) -> Self {
        self.param(BODY, body)
    }

    /// The first-level id as a list, if it names more than one resource.
    pub fn id_list(&self) -> Option<Vec<&str>> {
        let id = self.id.as_deref()?;
        if !id.contains(',') {
            return None;
        }
        Some(id.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
    }

    /// Path segments after the REST prefix. Empty ids are omitted.
    pub fn segments(&self) -> Vec<&str> {
        self.segments_with_id(self.id.as_deref())
    }

    fn segments_with_id<'a>(&'a self, id: Option<&'a str>) -> Vec<&'a str> {
        [
            Some(self.category.as_str()),
            id,
            self.category2.as_deref(),
            self.id2.as_deref(),
            Some(self.action.as_str()),
        ]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect()
    }

    /// Full endpoint URL: `{host}/webservices/rest/v1/{category}[/{id}][/{category2}][/{id2}]/{action}`
    pub fn url(&self, host: &HostUrl) -> Result<Url, url::ParseError> {
        self.url_with_id(host, self.id.as_deref())
    }

    /// Endpoint URL with the first-level id replaced, e.g. by one batch of
    /// an id list.
    pub(crate) fn url_with_id(
        &self,
        host: &HostUrl,
        id: Option<&str>,
    ) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(host.as_str())?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?;
            path.pop_if_empty()
                .extend(REST_PREFIX)
                .extend(self.segments_with_id(id));
        }
        Ok(url)
    }
}

/// Read a non-negative integer parameter which may have been given as a
/// number or as a string.
pub(crate) fn usize_param(params: &Params, key: &str) -> Option<usize> {
    match params.get(key)? {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
