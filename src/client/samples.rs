use super::{ClientContext, SubClient};
use crate::errors::OpencgaError;
use crate::models::RestResponse;
use crate::query::{LogicalQuery, Params};
use serde_json::Value;

const SAMPLES: &str = "samples";

pub struct SampleClient {
    context: ClientContext,
}

impl SubClient for SampleClient {
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

impl SampleClient {
    pub fn search(&self, params: Params) -> Result<RestResponse<Value>, OpencgaError> {
        self.context
            .execute(LogicalQuery::get(SAMPLES, "search").params(params))
    }

    /// Get samples by comma-separated IDs.
    pub fn info(&self, samples: &str, params: Params) -> Result<RestResponse<Value>, OpencgaError> {
        self.context
            .execute(LogicalQuery::get(SAMPLES, "info").id(samples).params(params))
    }

    /// Create a sample from its JSON description.
    pub fn create(&self, sample: Value, params: Params) -> Result<RestResponse<Value>, OpencgaError> {
        let query = LogicalQuery::post(SAMPLES, "create")
            .params(params)
            .body(sample);
        self.context.execute(query)
    }
}
