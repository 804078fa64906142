//! Tokens and user of the current session.
//!
//! The user ID is read from the `sub` claim of the access token. The
//! token's signature is **not** verified: the client trusts whatever the
//! server (over its transport) handed it, and only the server ever
//! validates tokens. Do not use [TokenClaims] for authorization decisions.

use crate::errors::OpencgaError;
use crate::types::UserId;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Payload of a JWT access token, decoded without verifying its signature.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub sub: UserId,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub aud: Option<String>,
}

impl TokenClaims {
    /// Decode the payload segment of `token`.
    pub fn unverified(token: &str) -> Result<Self, OpencgaError> {
        let payload = token
            .split('.')
            .nth(1)
            .ok_or_else(|| OpencgaError::client("access token is not a JWT"))?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| OpencgaError::client(format!("access token payload: {}", e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| OpencgaError::client(format!("access token claims: {}", e)))
    }
}

/// Mutable session state. Changed only by login, refresh, logout, and
/// setting a token.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user_id: Option<UserId>,
    token: Option<String>,
    refresh_token: Option<String>,
}

impl Session {
    /// A session resumed from a previously obtained token pair.
    pub fn with_tokens(token: String, refresh_token: Option<String>) -> Self {
        let mut session = Self::default();
        session.set_token(Some(token));
        session.refresh_token = refresh_token;
        session
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    /// The user ID, or an error if there is none.
    pub fn require_user_id(&self) -> Result<&UserId, OpencgaError> {
        self.user_id
            .as_ref()
            .ok_or_else(|| OpencgaError::client("no user ID, please log in"))
    }

    /// Replace the access token. The user ID is re-derived from it, and
    /// cleared if the token cannot be decoded.
    pub fn set_token(&mut self, token: Option<String>) {
        self.user_id = token.as_deref().and_then(|t| match TokenClaims::unverified(t) {
            Ok(claims) => Some(claims.sub),
            Err(e) => {
                log::warn!("Could not read user from token: {}", e);
                None
            }
        });
        self.token = token;
    }

    /// Store the tokens of a successful login or refresh. Unlike
    /// [Session::set_token], an undecodable access token is an error.
    pub(crate) fn authenticated(
        &mut self,
        token: String,
        refresh_token: Option<String>,
    ) -> Result<&UserId, OpencgaError> {
        let claims = TokenClaims::unverified(&token)?;
        self.token = Some(token);
        if refresh_token.is_some() {
            self.refresh_token = refresh_token;
        }
        Ok(self.user_id.insert(claims.sub))
    }

    /// Forget the access token and user. No request is made.
    pub fn clear(&mut self) {
        self.user_id = None;
        self.token = None;
        self.refresh_token = None;
    }
}
