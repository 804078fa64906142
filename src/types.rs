//! NewTypes for values used when first connecting and authenticating with OpenCGA.

use crate::errors::InvalidHostUrl;
use aliri_braid::braid;

/// A [HostUrl] is the base URL of an OpenCGA installation, e.g.
/// `https://ws.opencb.org/opencga-prod`
///
/// The REST prefix `webservices/rest/v1` is appended by the client.
#[braid(validator, serde)]
pub struct HostUrl(String);

impl aliri_braid::Validator for HostUrl {
    type Error = InvalidHostUrl;

    fn validate(s: &str) -> Result<(), Self::Error> {
        if !(s.starts_with("http://") || s.starts_with("https://")) {
            Err(InvalidHostUrl::Protocol(s.to_string()))
        } else if s.contains('?') || s.contains('#') {
            Err(InvalidHostUrl::Suffix(s.to_string()))
        } else {
            Ok(())
        }
    }
}

/// OpenCGA user ID, i.e. the subject of an access token.
#[braid(serde)]
pub struct UserId;
