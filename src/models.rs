//! Response envelope returned by the OpenCGA web services.
//!
//! A [RestResponse] holds one or more [ResultPage]. After a batch fetch,
//! all elements are merged into the first page.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Info,
    Warning,
    Error,
}

/// Something the server wants the caller to know about.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Event {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            event_type: EventType::Error,
            code: None,
            id: None,
            name: None,
            message: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.event_type == EventType::Error
    }
}

/// One response's worth of elements.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultPage<T> {
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub events: Vec<Event>,
    /// Number of elements in `results`, as reported by the server.
    #[serde(default)]
    pub num_results: usize,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_type: Option<String>,
    /// Total number of matches on the server, if it was counted.
    #[serde(default)]
    pub num_matches: i64,
    #[serde(default)]
    pub num_inserted: i64,
    #[serde(default)]
    pub num_updated: i64,
    #[serde(default)]
    pub num_deleted: i64,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl<T> Default for ResultPage<T> {
    fn default() -> Self {
        Self {
            time: 0,
            events: vec![],
            num_results: 0,
            results: vec![],
            result_type: None,
            num_matches: -1,
            num_inserted: 0,
            num_updated: 0,
            num_deleted: 0,
            attributes: Default::default(),
        }
    }
}

/// The paged envelope: everything the server said in response to a query.
///
/// An envelope without any pages is the "no data" response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RestResponse<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default = "Vec::new")]
    pub responses: Vec<ResultPage<T>>,
}

impl<T> Default for RestResponse<T> {
    fn default() -> Self {
        Self {
            api_version: None,
            time: 0,
            events: vec![],
            params: Default::default(),
            responses: vec![],
        }
    }
}

impl<T> RestResponse<T> {
    /// The "no data" envelope.
    pub fn empty() -> Self {
        Default::default()
    }

    pub fn first_page(&self) -> Option<&ResultPage<T>> {
        self.responses.first()
    }

    pub(crate) fn first_page_mut(&mut self) -> Option<&mut ResultPage<T>> {
        self.responses.first_mut()
    }

    pub fn first_result(&self) -> Option<&T> {
        self.first_page().and_then(|p| p.results.first())
    }

    /// Number of elements in the first page.
    pub fn result_count(&self) -> usize {
        self.first_page().map(|p| p.results.len()).unwrap_or(0)
    }

    /// Elements of every page, in order.
    pub fn all_results(&self) -> impl Iterator<Item = &T> + '_ {
        self.responses.iter().flat_map(|p| p.results.iter())
    }

    pub fn into_results(self) -> Vec<T> {
        self.responses.into_iter().flat_map(|p| p.results).collect()
    }

    /// Every ERROR event, both envelope-level and page-level.
    pub fn error_events(&self) -> impl Iterator<Item = &Event> + '_ {
        self.events
            .iter()
            .chain(self.responses.iter().flat_map(|p| p.events.iter()))
            .filter(|e| e.is_error())
    }

    /// Messages of every ERROR event, falling back to the event's name or id.
    pub fn error_messages(&self) -> impl Iterator<Item = String> + '_ {
        self.error_events().map(|e| {
            e.message
                .clone()
                .or_else(|| e.name.clone())
                .or_else(|| e.id.clone())
                .unwrap_or_else(|| "unknown error".to_string())
        })
    }

    /// Message of the first ERROR event, if any.
    pub fn first_error_message(&self) -> Option<String> {
        self.error_messages().next()
    }

    /// Append the elements and events of the first page of `other` to the
    /// first page of `self`, and its envelope-level events to those of
    /// `self`. The reported count becomes the merged length.
    pub(crate) fn merge_first_page(&mut self, other: RestResponse<T>) {
        self.events.extend(other.events);
        let Some(incoming) = other.responses.into_iter().next() else {
            return;
        };
        if self.responses.is_empty() {
            self.responses.push(ResultPage::default());
        }
        let page = &mut self.responses[0];
        page.results.extend(incoming.results);
        page.num_results = page.results.len();
        page.events.extend(incoming.events);
    }
}

/// Tokens returned by `users/login`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationResponse {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_envelope() {
        let body = json!({
            "apiVersion": "v1",
            "time": 12,
            "events": [{"type": "WARNING", "message": "deprecated"}],
            "params": {"limit": 2},
            "responses": [{
                "time": 3,
                "numResults": 2,
                "results": [{"id": "S1"}, {"id": "S2"}],
                "resultType": "org.opencb.opencga.core.models.sample.Sample",
                "numMatches": 40
            }]
        });
        let res: RestResponse<Value> = serde_json::from_value(body).unwrap();
        assert_eq!(res.api_version.as_deref(), Some("v1"));
        assert_eq!(res.events[0].event_type, EventType::Warning);
        assert_eq!(res.result_count(), 2);
        assert_eq!(res.first_page().unwrap().num_matches, 40);
        assert_eq!(res.first_result(), Some(&json!({"id": "S1"})));
        assert!(res.first_error_message().is_none());
    }

    #[test]
    fn test_missing_fields_default() {
        let res: RestResponse<Value> = serde_json::from_str("{}").unwrap();
        assert!(res.responses.is_empty());
        assert_eq!(res.result_count(), 0);
    }

    #[test]
    fn test_first_error_message_looks_in_pages() {
        let mut res: RestResponse<Value> = RestResponse::empty();
        let page = ResultPage {
            events: vec![Event::error("Permission denied")],
            ..Default::default()
        };
        res.responses.push(page);
        assert_eq!(res.first_error_message().unwrap(), "Permission denied");
    }

    #[test]
    fn test_merge_first_page() {
        let page = |results: Vec<u32>| ResultPage {
            num_results: results.len(),
            results,
            ..Default::default()
        };
        let mut merged = RestResponse {
            responses: vec![page(vec![1, 2])],
            ..Default::default()
        };
        merged.merge_first_page(RestResponse {
            responses: vec![page(vec![3])],
            ..Default::default()
        });
        merged.merge_first_page(RestResponse::empty());
        assert_eq!(merged.responses.len(), 1);
        assert_eq!(merged.responses[0].results, vec![1, 2, 3]);
        assert_eq!(merged.responses[0].num_results, 3);
    }

    #[test]
    fn test_merge_keeps_events_of_empty_pages() {
        let mut merged: RestResponse<u32> = RestResponse {
            events: vec![Event {
                event_type: EventType::Info,
                code: None,
                id: None,
                name: None,
                message: Some("first".to_string()),
            }],
            responses: vec![ResultPage {
                num_results: 2,
                results: vec![1, 2],
                ..Default::default()
            }],
            ..Default::default()
        };
        merged.merge_first_page(RestResponse {
            events: vec![Event::error("504 Gateway Time-out")],
            responses: vec![ResultPage::default()],
            ..Default::default()
        });
        merged.merge_first_page(RestResponse {
            responses: vec![ResultPage {
                events: vec![Event::error("Permission denied")],
                ..Default::default()
            }],
            ..Default::default()
        });
        assert_eq!(merged.events.len(), 2);
        assert_eq!(merged.responses[0].results, vec![1, 2]);
        assert_eq!(merged.responses[0].num_results, 2);
        assert_eq!(merged.responses[0].events.len(), 1);
        assert_eq!(merged.error_events().count(), 2);
        assert_eq!(merged.first_error_message().unwrap(), "504 Gateway Time-out");
    }

    #[test]
    fn test_merge_into_no_data() {
        let mut merged: RestResponse<u32> = RestResponse::empty();
        merged.merge_first_page(RestResponse {
            responses: vec![ResultPage {
                num_results: 1,
                results: vec![7],
                events: vec![Event::error("late")],
                ..Default::default()
            }],
            ..Default::default()
        });
        assert_eq!(merged.responses.len(), 1);
        assert_eq!(merged.result_count(), 1);
        assert_eq!(merged.error_events().count(), 1);
    }
}
