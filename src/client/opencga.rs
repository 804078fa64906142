use super::files::FileClient;
use super::samples::SampleClient;
use super::users::UserClient;
use super::{ClientContext, SubClient};
use crate::config::ClientConfiguration;
use crate::errors::OpencgaError;
use crate::executor::BatchExecutor;
use crate::models::{AuthenticationResponse, RestResponse};
use crate::query::LogicalQuery;
use crate::registry::Registry;
use crate::session::Session;
use crate::transport::{HttpTransport, Transport};
use crate::types::UserId;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// _OpenCGA_ client: owns the session and hands out resource clients which
/// always carry the session's current token.
///
/// Not internally synchronized. Share between threads only behind a lock.
pub struct OpencgaClient {
    config: ClientConfiguration,
    executor: Arc<BatchExecutor>,
    session: Session,
    throw_on_error: bool,
    registry: Registry,
}

impl OpencgaClient {
    /// Create a client which talks HTTP to the configured host.
    pub fn new(config: ClientConfiguration) -> Result<Self, OpencgaError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }

    /// Create a client over any [Transport].
    pub fn with_transport<T: Transport + Send + Sync + 'static>(
        config: ClientConfiguration,
        transport: T,
    ) -> Self {
        let executor = Arc::new(BatchExecutor::new(&config, transport));
        Self {
            config,
            executor,
            session: Default::default(),
            throw_on_error: false,
            registry: Default::default(),
        }
    }

    /// Resume a previous session.
    pub fn with_session(mut self, session: Session) -> Self {
        self.registry.set_token(session.token());
        self.session = session;
        self
    }

    pub fn config(&self) -> &ClientConfiguration {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.session.user_id()
    }

    pub fn token(&self) -> Option<&str> {
        self.session.token()
    }

    pub fn throw_on_error(&self) -> bool {
        self.throw_on_error
    }

    /// Get the memoized client of type `C`, creating it on first access.
    pub fn get<C: SubClient>(&mut self) -> &mut C {
        let Self {
            executor,
            session,
            throw_on_error,
            registry,
            ..
        } = self;
        registry.get(|| {
            ClientContext::new(
                Arc::clone(executor),
                session.token().map(String::from),
                *throw_on_error,
            )
        })
    }

    pub fn users(&mut self) -> &mut UserClient {
        self.get()
    }

    pub fn files(&mut self) -> &mut FileClient {
        self.get()
    }

    pub fn samples(&mut self) -> &mut SampleClient {
        self.get()
    }

    /// Execute any query with the session's token, e.g. for resources
    /// without a dedicated client.
    pub fn execute<T: DeserializeOwned>(
        &self,
        query: LogicalQuery,
    ) -> Result<RestResponse<T>, OpencgaError> {
        let context = ClientContext::new(
            Arc::clone(&self.executor),
            self.session.token().map(String::from),
            self.throw_on_error,
        );
        context.execute(query)
    }

    /// Replace the access token, here and in every resource client.
    pub fn set_token(&mut self, token: Option<String>) {
        self.session.set_token(token);
        self.registry.set_token(self.session.token());
    }

    /// Whether ERROR events and unsuccessful HTTP statuses are returned as
    /// errors, here and in every resource client.
    pub fn set_throw_exception_on_error(&mut self, throw_on_error: bool) {
        self.throw_on_error = throw_on_error;
        self.registry.set_throw_on_error(throw_on_error);
    }

    /// Log in. On success the tokens and user ID are stored and given to
    /// every resource client.
    pub fn login(
        &mut self,
        user: &str,
        password: &str,
    ) -> Result<AuthenticationResponse, OpencgaError> {
        let res = self.users().login(user, password)?;
        self.authenticate(res)
    }

    /// Get new tokens using the refresh token.
    pub fn refresh(&mut self) -> Result<AuthenticationResponse, OpencgaError> {
        let refresh_token = self
            .session
            .refresh_token()
            .ok_or_else(|| OpencgaError::client("cannot refresh: no refresh token"))?
            .to_string();
        let res = self.users().refresh(&refresh_token)?;
        self.authenticate(res)
    }

    /// Forget the tokens and user. Takes effect locally, no request is made.
    pub fn logout(&mut self) {
        if let Some(user) = self.session.user_id() {
            log::info!("Logging out {}", user);
        }
        self.session.clear();
        self.registry.set_token(None);
    }

    fn authenticate(
        &mut self,
        res: RestResponse<AuthenticationResponse>,
    ) -> Result<AuthenticationResponse, OpencgaError> {
        if let Some(message) = res.first_error_message() {
            return Err(OpencgaError::Client(message));
        }
        let auth = res
            .into_results()
            .into_iter()
            .next()
            .ok_or_else(|| OpencgaError::client("authentication response has no token"))?;
        let user = self
            .session
            .authenticated(auth.token.clone(), auth.refresh_token.clone())?;
        log::info!("Logged in as {}", user);
        self.registry.set_token(self.session.token());
        Ok(auth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Event, ResultPage};
    use crate::query::Method;
    use crate::session::tests::jwt;
    use crate::transport::{RawResponse, Request};
    use reqwest::StatusCode;
    use rstest::*;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Answers `users/login` with the next canned envelope, anything else
    /// with an empty page, and records every request.
    #[derive(Clone, Default)]
    struct AuthStub {
        logins: Arc<Mutex<Vec<String>>>,
        requests: Arc<Mutex<Vec<Request>>>,
    }

    impl AuthStub {
        fn answering(bodies: &[Value]) -> Self {
            let stub = Self::default();
            stub.logins
                .lock()
                .unwrap()
                .extend(bodies.iter().rev().map(Value::to_string));
            stub
        }

        fn requests(&self) -> Vec<Request> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for AuthStub {
        fn dispatch(&self, request: &Request) -> Result<RawResponse, OpencgaError> {
            self.requests.lock().unwrap().push(request.clone());
            let body = if request.url.path().ends_with("users/login") {
                self.logins.lock().unwrap().pop().unwrap_or_default()
            } else {
                r#"{"responses": [{"numResults": 0, "results": []}]}"#.to_string()
            };
            Ok(RawResponse {
                status: StatusCode::OK,
                body,
            })
        }
    }

    fn tokens(token: &str, refresh_token: &str) -> Value {
        json!({"responses": [{
            "numResults": 1,
            "results": [{"token": token, "refreshToken": refresh_token}]
        }]})
    }

    fn client(stub: &AuthStub) -> OpencgaClient {
        OpencgaClient::with_transport(ClientConfiguration::default(), stub.clone())
    }

    #[rstest]
    fn test_set_token_reaches_memoized_clients() {
        let mut client = client(&AuthStub::default());
        client.set_token(Some("T1".to_string()));
        assert_eq!(client.files().token(), Some("T1"));
        assert_eq!(client.samples().token(), Some("T1"));

        client.set_token(Some("T2".to_string()));
        assert_eq!(client.files().token(), Some("T2"));
        assert_eq!(client.samples().token(), Some("T2"));
        assert_eq!(client.token(), Some("T2"));
    }

    #[rstest]
    fn test_new_client_gets_current_token() {
        let mut client = client(&AuthStub::default());
        client.set_token(Some("T3".to_string()));
        assert_eq!(client.users().token(), Some("T3"));
    }

    #[rstest]
    fn test_get_is_memoized() {
        let mut client = client(&AuthStub::default());
        let first: *const FileClient = client.files();
        let second: *const FileClient = client.files();
        assert!(std::ptr::eq(first, second));
    }

    #[rstest]
    fn test_throw_flag_reaches_memoized_clients() {
        let mut client = client(&AuthStub::default());
        assert!(!client.samples().context().throw_on_error());
        client.set_throw_exception_on_error(true);
        assert!(client.samples().context().throw_on_error());
        assert!(client.files().context().throw_on_error());
    }

    #[rstest]
    fn test_login_stores_tokens_and_user() {
        let token = jwt("pfurio");
        let stub = AuthStub::answering(&[tokens(&token, "R1")]);
        let mut client = client(&stub);
        let samples_token_before = client.samples().token().map(String::from);
        assert!(samples_token_before.is_none());

        let auth = client.login("pfurio", "secret").unwrap();
        assert_eq!(auth.token, token);
        assert_eq!(client.user_id().unwrap().as_str(), "pfurio");
        assert_eq!(client.session().refresh_token(), Some("R1"));
        assert_eq!(client.samples().token(), Some(token.as_str()));

        let login = &stub.requests()[0];
        assert_eq!(login.method, Method::Post);
        assert!(login.token.is_none());
        assert_eq!(
            login.params.get("body"),
            Some(&json!({"user": "pfurio", "password": "secret"}))
        );
    }

    #[rstest]
    fn test_login_error_event_is_client_error() {
        let refused = RestResponse::<Value> {
            events: vec![Event::error("Incorrect user or password.")],
            responses: vec![ResultPage::default()],
            ..Default::default()
        };
        let stub = AuthStub::answering(&[serde_json::to_value(refused).unwrap()]);
        let mut client = client(&stub);
        match client.login("pfurio", "wrong").unwrap_err() {
            OpencgaError::Client(message) => assert_eq!(message, "Incorrect user or password."),
            e => panic!("unexpected error: {:?}", e),
        }
        assert!(client.token().is_none());
    }

    #[rstest]
    fn test_refresh_without_refresh_token() {
        let stub = AuthStub::default();
        let mut client = client(&stub);
        assert!(matches!(client.refresh().unwrap_err(), OpencgaError::Client(_)));
        assert!(stub.requests().is_empty());
    }

    #[rstest]
    fn test_refresh_replaces_tokens() {
        let first = jwt("imedina");
        let second = jwt("imedina2");
        let stub = AuthStub::answering(&[tokens(&first, "R1"), tokens(&second, "R2")]);
        let mut client = client(&stub);
        client.login("imedina", "pass").unwrap();
        let files_token_before = client.files().token().map(String::from);
        assert_eq!(files_token_before.as_deref(), Some(first.as_str()));

        client.refresh().unwrap();
        assert_eq!(client.token(), Some(second.as_str()));
        assert_eq!(client.files().token(), Some(second.as_str()));
        assert_eq!(client.session().refresh_token(), Some("R2"));
        assert_eq!(
            stub.requests()[1].params.get("body"),
            Some(&json!({"refreshToken": "R1"}))
        );
    }

    #[rstest]
    fn test_logout_clears_everything() {
        let stub = AuthStub::answering(&[tokens(&jwt("pfurio"), "R1")]);
        let mut client = client(&stub);
        client.login("pfurio", "secret").unwrap();
        client.samples();
        client.logout();
        assert!(client.token().is_none());
        assert!(client.user_id().is_none());
        assert!(client.samples().token().is_none());
        assert!(stub.requests().len() == 1);
    }

    #[rstest]
    fn test_throw_on_error_turns_events_into_errors() {
        struct Denied;
        impl Transport for Denied {
            fn dispatch(&self, _: &Request) -> Result<RawResponse, OpencgaError> {
                Ok(RawResponse {
                    status: StatusCode::FORBIDDEN,
                    body: r#"{"events": [{"type": "ERROR", "message": "Permission denied"}]}"#
                        .to_string(),
                })
            }
        }
        let mut client = OpencgaClient::with_transport(Default::default(), Denied);
        let res = client.samples().search(Default::default()).unwrap();
        assert_eq!(res.first_error_message().as_deref(), Some("Permission denied"));

        client.set_throw_exception_on_error(true);
        let err = client.samples().search(Default::default()).unwrap_err();
        assert!(matches!(
            err,
            OpencgaError::Server(m)
                if m == "Unsuccessful HTTP status 403 Forbidden [Permission denied]"
        ));
    }

    #[rstest]
    fn test_throw_on_error_turns_failed_status_into_error() {
        struct Failing;
        impl Transport for Failing {
            fn dispatch(&self, _: &Request) -> Result<RawResponse, OpencgaError> {
                Ok(RawResponse {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: String::new(),
                })
            }
        }
        let mut client = OpencgaClient::with_transport(Default::default(), Failing);
        let res = client.files().search(Default::default()).unwrap();
        assert_eq!(res.result_count(), 0);

        client.set_throw_exception_on_error(true);
        let err = client.files().search(Default::default()).unwrap_err();
        assert!(matches!(err, OpencgaError::Server(m) if m.contains("500")));
        let err = client
            .execute::<Value>(LogicalQuery::get("projects", "search"))
            .unwrap_err();
        assert!(matches!(err, OpencgaError::Server(_)));
    }

    #[rstest]
    fn test_with_session_resumes() {
        let token = jwt("pfurio");
        let session = Session::with_tokens(token.clone(), Some("R".to_string()));
        let mut client = client(&AuthStub::default()).with_session(session);
        assert_eq!(client.user_id().unwrap().as_str(), "pfurio");
        assert_eq!(client.files().token(), Some(token.as_str()));
    }
}
