use super::{ClientContext, SubClient};
use crate::errors::OpencgaError;
use crate::models::{AuthenticationResponse, RestResponse};
use crate::query::{LogicalQuery, Params};
use serde_json::{json, Value};

const USERS: &str = "users";

/// Users: authentication and account information.
pub struct UserClient {
    context: ClientContext,
}

impl SubClient for UserClient {
    fn new(context: ClientContext) -> Self {
        Self { context }
    }

    fn context(&self) -> &ClientContext {
        &self.context
    }

    fn context_mut(&mut self) -> &mut ClientContext {
        &mut self.context
    }
}

impl UserClient {
    /// Exchange a user ID and password for tokens. No token is sent.
    pub fn login(
        &self,
        user: &str,
        password: &str,
    ) -> Result<RestResponse<AuthenticationResponse>, OpencgaError> {
        let query = LogicalQuery::post(USERS, "login").body(json!({
            "user": user,
            "password": password,
        }));
        self.context.execute_anonymous(query)
    }

    /// Exchange a refresh token for new tokens.
    pub fn refresh(
        &self,
        refresh_token: &str,
    ) -> Result<RestResponse<AuthenticationResponse>, OpencgaError> {
        let query = LogicalQuery::post(USERS, "login").body(json!({
            "refreshToken": refresh_token,
        }));
        self.context.execute_anonymous(query)
    }

    pub fn info(&self, user: &str, params: Params) -> Result<RestResponse<Value>, OpencgaError> {
        let query = LogicalQuery::get(USERS, "info").id(user).params(params);
        self.context.execute(query)
    }
}
