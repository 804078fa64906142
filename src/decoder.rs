//! Turns response bodies into [RestResponse].

use crate::errors::OpencgaError;
use crate::models::{Event, RestResponse, ResultPage};
use serde::de::DeserializeOwned;

const GATEWAY_TIMEOUT: &str = "504 Gateway Time-out";
const EXCERPT_LEN: usize = 120;

/// Outcome of decoding a body which was not a transport failure.
#[derive(Debug)]
pub enum Decoded<T> {
    /// The body was a valid envelope (or empty).
    Envelope(RestResponse<T>),
    /// A proxy in front of the service gave up waiting. Carries a
    /// zero-result envelope with an ERROR event.
    GatewayTimeout(RestResponse<T>),
}

impl<T> Decoded<T> {
    pub fn into_envelope(self) -> RestResponse<T> {
        match self {
            Decoded::Envelope(r) => r,
            Decoded::GatewayTimeout(r) => r,
        }
    }
}

/// Decode a response body.
///
/// An empty body is the "no data" envelope. A body which does not parse but
/// looks like an HTML gateway timeout page is degraded into a one-page
/// envelope with zero results and an ERROR event.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<Decoded<T>, OpencgaError> {
    if body.trim().is_empty() {
        return Ok(Decoded::Envelope(RestResponse::empty()));
    }
    match serde_json::from_str(body) {
        Ok(envelope) => Ok(Decoded::Envelope(envelope)),
        Err(_) if is_gateway_timeout(body) => {
            Ok(Decoded::GatewayTimeout(gateway_timeout_envelope()))
        }
        Err(source) => Err(OpencgaError::Decode {
            source,
            excerpt: body.chars().take(EXCERPT_LEN).collect(),
        }),
    }
}

fn is_gateway_timeout(body: &str) -> bool {
    body.trim_start().starts_with('<') && body.contains(GATEWAY_TIMEOUT)
}

fn gateway_timeout_envelope<T>() -> RestResponse<T> {
    RestResponse {
        events: vec![Event::error(format!(
            "{}: the server took too long to respond, try narrowing the query",
            GATEWAY_TIMEOUT
        ))],
        responses: vec![ResultPage::default()],
        ..Default::default()
    }
}
