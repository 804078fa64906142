//! Blocking client for the _OpenCGA_ REST web services.
//!
//! Results larger than the server's page cap are fetched in batches and
//! merged transparently, see [BatchExecutor]. Start with [OpencgaClient].

mod client;
pub mod config;
pub mod decoder;
pub mod errors;
pub mod executor;
pub mod models;
pub mod query;
mod registry;
pub mod session;
pub mod transport;
pub mod types;

pub use client::files::FileClient;
pub use client::opencga::OpencgaClient;
pub use client::samples::SampleClient;
pub use client::users::UserClient;
pub use client::{ClientContext, SubClient};
pub use config::ClientConfiguration;
pub use errors::OpencgaError;
pub use executor::BatchExecutor;
pub use models::{AuthenticationResponse, Event, EventType, RestResponse, ResultPage};
pub use query::{LogicalQuery, Method, Params};
pub use registry::Registry;
pub use session::{Session, TokenClaims};
