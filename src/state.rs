//! opencga CLI state: the client configuration and the session of the
//! last login, saved with confy under the application name `opencga`.

use color_eyre::eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

use opencga_client::{ClientConfiguration, OpencgaClient, Session};

const APP_NAME: &str = "opencga";

#[derive(Serialize, Deserialize, Default)]
pub struct CliState {
    #[serde(default)]
    pub config: ClientConfiguration,
    #[serde(default)]
    session: Option<Session>,
}

impl CliState {
    pub fn load() -> Result<Self> {
        confy::load(APP_NAME, None).wrap_err("Could not read the opencga configuration file")
    }

    /// Create a client, resuming the saved session if there is one.
    pub fn client(&self) -> Result<OpencgaClient> {
        let client = OpencgaClient::new(self.config.clone())?;
        Ok(match &self.session {
            Some(session) => client.with_session(session.clone()),
            None => client,
        })
    }

    /// Remember the client's session, or forget it if logged out.
    pub fn save_session(&mut self, client: &OpencgaClient) -> Result<()> {
        self.session = Some(client.session().clone()).filter(Session::is_logged_in);
        confy::store(APP_NAME, None, &*self).wrap_err("Could not save the opencga session")
    }
}
