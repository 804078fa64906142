use crate::errors::OpencgaError;
use crate::executor::BatchExecutor;
use crate::models::RestResponse;
use crate::query::LogicalQuery;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

/// What every resource client needs: the executor, the current token, and
/// whether ERROR events and unsuccessful statuses should be returned as
/// [OpencgaError::Server].
#[derive(Clone)]
pub struct ClientContext {
    executor: Arc<BatchExecutor>,
    token: Option<String>,
    throw_on_error: bool,
}

impl ClientContext {
    pub(crate) fn new(
        executor: Arc<BatchExecutor>,
        token: Option<String>,
        throw_on_error: bool,
    ) -> Self {
        Self {
            executor,
            token,
            throw_on_error,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn throw_on_error(&self) -> bool {
        self.throw_on_error
    }

    pub(crate) fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub(crate) fn set_throw_on_error(&mut self, throw_on_error: bool) {
        self.throw_on_error = throw_on_error;
    }

    /// Execute a query with this context's token.
    pub fn execute<T: DeserializeOwned>(
        &self,
        query: LogicalQuery,
    ) -> Result<RestResponse<T>, OpencgaError> {
        self.executor.execute(&query, self.token(), self.throw_on_error)
    }

    /// Execute a query without a token, leaving ERROR events and HTTP
    /// statuses to the caller.
    pub(crate) fn execute_anonymous<T: DeserializeOwned>(
        &self,
        query: LogicalQuery,
    ) -> Result<RestResponse<T>, OpencgaError> {
        self.executor.execute(&query, None, false)
    }

    /// Write the response to a query into a local file.
    pub fn download(&self, query: LogicalQuery, destination: &Path) -> Result<u64, OpencgaError> {
        self.executor.download(&query, self.token(), destination)
    }
}

/// A client for one family of resources. It only builds [LogicalQuery]
/// values and hands them to its [ClientContext].
pub trait SubClient: 'static {
    fn new(context: ClientContext) -> Self
    where
        Self: Sized;

    fn context(&self) -> &ClientContext;

    fn context_mut(&mut self) -> &mut ClientContext;

    fn token(&self) -> Option<&str> {
        self.context().token()
    }
}
