pub(crate) mod context;
pub(crate) mod files;
pub(crate) mod opencga;
pub(crate) mod samples;
pub(crate) mod users;

pub use context::{ClientContext, SubClient};
