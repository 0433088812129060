//! API client with bearer auth and one refresh-and-retry on 401
//!
//! Every call goes through [`ApiClient::execute`] (JSON) or
//! [`ApiClient::execute_blob`] (binary). Each attempt runs under the
//! configured deadline and can be aborted through the request's
//! cancellation token.

use std::future::Future;
use std::sync::Arc;

use fleetdesk_core::auth::{RefreshCoordinator, SessionStore};
use fleetdesk_domain::{ApiConfig, ListPayload, Page};
use reqwest::header::ACCEPT;
use reqwest::{Client as ReqwestClient, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use super::errors::ApiError;
use super::request::{ApiRequest, MultipartBody, RequestBody};
use super::response::{backend_error, decode_json, Blob};
use crate::http::HttpClient;
use crate::observability::ClientMetrics;

const REQUEST_ID_HEADER: &str = "x-request-id";
const ACCEPT_JSON: &str = "application/json";
const ACCEPT_ANY: &str = "*/*";

/// Result of a single HTTP attempt
///
/// 401 is its own outcome so the refresh path never goes through the
/// error channel. A success carries the attempt's deadline, which still
/// bounds reading the body.
enum AttemptOutcome {
    Success { response: Response, deadline: Instant },
    Unauthorized,
    Failure(ApiError),
}

/// Authenticated client for the fleet backend
pub struct ApiClient {
    http: HttpClient,
    config: ApiConfig,
    sessions: Arc<dyn SessionStore>,
    coordinator: RefreshCoordinator,
    metrics: Arc<ClientMetrics>,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// `coordinator` must share `sessions` with every other client talking
    /// to the same backend so concurrent 401s collapse into one refresh.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the transport cannot be built.
    pub fn new(
        config: ApiConfig,
        sessions: Arc<dyn SessionStore>,
        coordinator: RefreshCoordinator,
    ) -> Result<Self, ApiError> {
        let http = HttpClient::builder()
            .user_agent(config.user_agent.clone())
            .max_attempts(2)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HttpClient: {}", e)))?;

        Ok(Self { http, config, sessions, coordinator, metrics: Arc::new(ClientMetrics::new()) })
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Connection settings this client was built with
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Counters and latency samples for every attempt
    pub fn metrics(&self) -> &Arc<ClientMetrics> {
        &self.metrics
    }

    /// Store the bearer token is read from
    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Refresh coordinator shared with the other clients of this session
    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// Send `request` and deserialize the JSON response
    ///
    /// # Errors
    /// - `Timeout` when an attempt or the body read outlives the deadline
    /// - `Cancelled` when the request's token fires
    /// - `SessionExpired` when the session could not be renewed; the session
    ///   has been signed out by then
    /// - `Backend` for any other non-2xx status
    #[instrument(
        skip_all,
        fields(request_id = %request.id(), method = %request.method(), path = %request.path())
    )]
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let (response, deadline) = self.dispatch(&request, ACCEPT_JSON).await?;
        self.bounded(&request, deadline, decode_json(response)).await
    }

    /// Send `request` and return the raw body
    ///
    /// # Errors
    /// Same as [`ApiClient::execute`], minus JSON decoding.
    #[instrument(
        skip_all,
        fields(request_id = %request.id(), method = %request.method(), path = %request.path())
    )]
    pub async fn execute_blob(&self, request: ApiRequest) -> Result<Blob, ApiError> {
        let (response, deadline) = self.dispatch(&request, ACCEPT_ANY).await?;
        self.bounded(&request, deadline, Blob::from_response(response)).await
    }

    /// GET `path` and decode the JSON body
    ///
    /// # Errors
    /// See [`ApiClient::execute`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(ApiRequest::get(path)).await
    }

    /// POST `body` as JSON to `path`
    ///
    /// # Errors
    /// `Encode` when `body` cannot be serialized; otherwise see
    /// [`ApiClient::execute`].
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(ApiRequest::post(path).json(body)?).await
    }

    /// PUT `body` as JSON to `path`
    ///
    /// # Errors
    /// Same as [`ApiClient::post`].
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(ApiRequest::put(path).json(body)?).await
    }

    /// PATCH `path` with a JSON `body`
    ///
    /// # Errors
    /// Same as [`ApiClient::post`].
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(ApiRequest::patch(path).json(body)?).await
    }

    /// DELETE `path`; an empty response decodes from `null`
    ///
    /// # Errors
    /// See [`ApiClient::execute`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(ApiRequest::delete(path)).await
    }

    /// Multipart POST
    ///
    /// The form is rebuilt for the retry after a token refresh.
    ///
    /// # Errors
    /// See [`ApiClient::execute`].
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        body: MultipartBody,
    ) -> Result<T, ApiError> {
        self.execute(ApiRequest::post(path).multipart(body)).await
    }

    /// GET `path` as raw bytes
    ///
    /// # Errors
    /// See [`ApiClient::execute_blob`].
    pub async fn download(&self, path: &str) -> Result<Blob, ApiError> {
        self.execute_blob(ApiRequest::get(path)).await
    }

    /// GET a collection, accepting either a bare array or a paged envelope
    ///
    /// # Errors
    /// `Decode` when the body is neither shape; otherwise see
    /// [`ApiClient::execute`].
    pub async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Page<T>, ApiError> {
        let payload: ListPayload<T> = self.get(path).await?;
        Ok(payload.normalize())
    }

    /// Run the request, refreshing the token and retrying once on 401
    ///
    /// Returns the response together with the deadline of the attempt that
    /// produced it.
    async fn dispatch(
        &self,
        request: &ApiRequest,
        accept: &str,
    ) -> Result<(Response, Instant), ApiError> {
        let token = self.sessions.current_session().await.map(|session| session.access_token);

        match self.attempt(request, token.as_deref(), accept).await {
            AttemptOutcome::Success { response, deadline } => return Ok((response, deadline)),
            AttemptOutcome::Failure(err) => return Err(self.note_failure(err)),
            AttemptOutcome::Unauthorized => {}
        }

        debug!("access token rejected, requesting a fresh one");
        let refreshed = self
            .cancellable(request, async {
                Ok::<_, ApiError>(
                    self.coordinator.fresh_token(token.as_deref().unwrap_or_default()).await,
                )
            })
            .await?;

        let fresh = match refreshed {
            Ok(fresh) => fresh,
            Err(err) => {
                warn!(error = %err, "could not renew session");
                self.metrics.record_session_expired();
                return Err(ApiError::SessionExpired);
            }
        };

        self.metrics.record_retry_after_refresh();
        match self.attempt(request, Some(&fresh), accept).await {
            AttemptOutcome::Success { response, deadline } => Ok((response, deadline)),
            AttemptOutcome::Failure(err) => Err(self.note_failure(err)),
            AttemptOutcome::Unauthorized => {
                warn!("request still unauthorized after refresh, signing out");
                self.coordinator
                    .forced_logout()
                    .execute("access token rejected after refresh")
                    .await;
                self.metrics.record_session_expired();
                Err(ApiError::SessionExpired)
            }
        }
    }

    async fn attempt(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
        accept: &str,
    ) -> AttemptOutcome {
        let url = self.config.url_for(request.path());
        let started = Instant::now();
        let deadline = started + self.config.timeout();

        let outcome = self
            .bounded(request, deadline, async {
                let response = self
                    .http
                    .send_with(|client| {
                        Some(build_request(client, &url, request, token, accept))
                    })
                    .await
                    .map_err(ApiError::from)?;

                let status = response.status();
                debug!(%status, "received response");
                if status == StatusCode::UNAUTHORIZED {
                    Ok(AttemptOutcome::Unauthorized)
                } else if status.is_success() {
                    Ok(AttemptOutcome::Success { response, deadline })
                } else {
                    Ok(AttemptOutcome::Failure(backend_error(response).await))
                }
            })
            .await;

        self.metrics.record_attempt(started.elapsed());
        outcome.unwrap_or_else(AttemptOutcome::Failure)
    }

    fn note_failure(&self, err: ApiError) -> ApiError {
        if let ApiError::Backend { status, message } = &err {
            debug!(status, message = %message, "backend returned an error");
            self.metrics.record_backend_error();
        }
        err
    }

    /// Apply the attempt deadline and the request's cancellation to `fut`
    async fn bounded<T, F>(
        &self,
        request: &ApiRequest,
        deadline: Instant,
        fut: F,
    ) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        let timeout = self.config.timeout();
        let timed = async {
            match tokio::time::timeout_at(deadline, fut).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(?timeout, "request timed out");
                    self.metrics.record_timeout();
                    Err(ApiError::Timeout(timeout))
                }
            }
        };
        self.cancellable(request, timed).await
    }

    async fn cancellable<T, F>(&self, request: &ApiRequest, fut: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        match request.cancellation() {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!("request cancelled by caller");
                    Err(ApiError::Cancelled)
                }
                result = fut => result,
            },
            None => fut.await,
        }
    }
}

fn build_request(
    client: &ReqwestClient,
    url: &str,
    request: &ApiRequest,
    token: Option<&str>,
    accept: &str,
) -> RequestBuilder {
    let mut builder = client
        .request(request.method().clone(), url)
        .header(REQUEST_ID_HEADER, request.id().to_string())
        .headers(request.headers().clone());

    if let Some(token) = token {
        builder = builder.bearer_auth(token);
    }

    match request.body() {
        RequestBody::Empty => builder.header(ACCEPT, accept),
        RequestBody::Json(value) => builder.header(ACCEPT, accept).json(value),
        RequestBody::Multipart(body) => builder.header(ACCEPT, accept).multipart(body.to_form()),
    }
}

/// Builder for API client
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ApiConfig>,
    sessions: Option<Arc<dyn SessionStore>>,
    coordinator: Option<RefreshCoordinator>,
}

impl ApiClientBuilder {
    /// Set the API configuration
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the session store
    pub fn sessions(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Set the refresh coordinator
    pub fn coordinator(mut self, coordinator: RefreshCoordinator) -> Self {
        self.coordinator = Some(coordinator);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    /// Returns `ApiError::Config` if a required part is missing or the
    /// transport cannot be built.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config.ok_or_else(|| ApiError::Config("API config not set".into()))?;
        let sessions =
            self.sessions.ok_or_else(|| ApiError::Config("Session store not set".into()))?;
        let coordinator = self
            .coordinator
            .ok_or_else(|| ApiError::Config("Refresh coordinator not set".into()))?;

        ApiClient::new(config, sessions, coordinator)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use fleetdesk_core::auth::{
        ForcedLogout, InMemorySessionStore, RefreshError, TokenRefresher,
    };
    use fleetdesk_domain::{RefreshedTokens, Session, UserIdentity};
    use serde::Deserialize;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio_util::sync::CancellationToken;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    use super::*;

    struct NeverRefresher;

    #[async_trait]
    impl TokenRefresher for NeverRefresher {
        async fn refresh(&self, _refresh_token: &str) -> Result<RefreshedTokens, RefreshError> {
            Err(RefreshError::Rejected("not expected in this test".into()))
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: i64,
        name: String,
    }

    fn client_for(server: &MockServer, timeout_secs: u64) -> (ApiClient, Arc<InMemorySessionStore>) {
        client_at(&server.uri(), timeout_secs)
    }

    fn client_at(base_url: &str, timeout_secs: u64) -> (ApiClient, Arc<InMemorySessionStore>) {
        let store = Arc::new(InMemorySessionStore::with_session(Session::new(
            "test-token",
            Some("refresh-token".to_string()),
            UserIdentity { id: 1, email: "ops@example.com".into(), name: None, role: None },
        )));
        let logout = Arc::new(ForcedLogout::new(store.clone(), "/login"));
        let coordinator =
            RefreshCoordinator::new(store.clone(), Arc::new(NeverRefresher), logout);

        let mut config = ApiConfig::new(base_url);
        config.timeout_secs = timeout_secs;

        let client = ApiClient::builder()
            .config(config)
            .sessions(store.clone())
            .coordinator(coordinator)
            .build()
            .unwrap();
        (client, store)
    }

    #[tokio::test]
    async fn sends_bearer_token_and_request_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/companies/1"))
            .and(header("Authorization", "Bearer test-token"))
            .and(header("Accept", "application/json"))
            .and(header_exists("x-request-id"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 1, "name": "Acme"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = client_for(&server, 10);
        let item: Item = client.get("/companies/1").await.unwrap();

        assert_eq!(item, Item { id: 1, name: "Acme".into() });
        assert_eq!(client.metrics().snapshot().requests, 1);
        assert_eq!(client.coordinator().refresh_count(), 0);
    }

    #[tokio::test]
    async fn no_content_deserializes_unit() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/tires/3"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/tires/3/reset"))
            .respond_with(ResponseTemplate::new(205))
            .mount(&server)
            .await;

        let (client, _) = client_for(&server, 10);

        let deleted: Result<(), ApiError> = client.delete("/tires/3").await;
        assert!(deleted.is_ok());
        let reset: Option<Item> = client.post("/tires/3/reset", &serde_json::json!({})).await.unwrap();
        assert!(reset.is_none());
    }

    #[tokio::test]
    async fn no_content_into_struct_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let (client, _) = client_for(&server, 10);
        let result: Result<Item, ApiError> = client.get("/companies/1").await;

        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn backend_errors_keep_status_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/equipment"))
            .respond_with(
                ResponseTemplate::new(409)
                    .set_body_json(serde_json::json!({"message": "Plate already registered"})),
            )
            .mount(&server)
            .await;

        let (client, store) = client_for(&server, 10);
        let result: Result<Item, ApiError> =
            client.post("/equipment", &serde_json::json!({"code": "TRK-1"})).await;

        match result {
            Err(ApiError::Backend { status, message }) => {
                assert_eq!(status, 409);
                assert_eq!(message, "Plate already registered");
            }
            other => panic!("expected backend error, got {:?}", other),
        }
        assert!(store.current_session().await.is_some());
        assert_eq!(client.metrics().snapshot().backend_errors, 1);
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let (client, _) = client_for(&server, 1);
        let result: Result<serde_json::Value, ApiError> = client.get("/slow").await;

        assert!(matches!(result, Err(ApiError::Timeout(d)) if d == Duration::from_secs(1)));
        assert_eq!(client.metrics().snapshot().timeouts, 1);
    }

    /// Serves one response whose headers and body are each delayed by `gap`
    async fn trickling_server(gap: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;

            let body = br#"{"a":1}"#;
            tokio::time::sleep(gap).await;
            let head = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();

            tokio::time::sleep(gap).await;
            let _ = socket.write_all(body).await;
            let _ = socket.flush().await;
            tokio::time::sleep(Duration::from_secs(2)).await;
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn deadline_covers_headers_and_body_together() {
        let base_url = trickling_server(Duration::from_millis(600)).await;
        let (client, _) = client_at(&base_url, 1);

        let started = Instant::now();
        let result: Result<serde_json::Value, ApiError> = client.get("/slow").await;

        assert!(matches!(result, Err(ApiError::Timeout(d)) if d == Duration::from_secs(1)));
        assert!(started.elapsed() < Duration::from_millis(1150));
        assert_eq!(client.metrics().snapshot().timeouts, 1);
    }

    #[tokio::test]
    async fn blob_deadline_covers_body() {
        let base_url = trickling_server(Duration::from_millis(600)).await;
        let (client, _) = client_at(&base_url, 1);

        let result = client.download("/documents/1/download").await;

        assert!(matches!(result, Err(ApiError::Timeout(_))));
    }

    #[tokio::test]
    async fn cancelled_request_returns_cancelled() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let (client, _) = client_for(&server, 10);
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let result: Result<serde_json::Value, ApiError> =
            client.execute(ApiRequest::get("/slow").cancel_on(token)).await;

        assert!(matches!(result, Err(ApiError::Cancelled)));
    }

    #[tokio::test]
    async fn multipart_upload_uses_form_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/documents"))
            .respond_with(|request: &Request| {
                let content_type = request
                    .headers
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                if content_type.starts_with("multipart/form-data; boundary=") {
                    ResponseTemplate::new(201)
                        .set_body_json(serde_json::json!({"id": 9, "name": "manual.pdf"}))
                } else {
                    ResponseTemplate::new(415)
                }
            })
            .mount(&server)
            .await;

        let (client, _) = client_for(&server, 10);
        let body = MultipartBody::new().file(
            "file",
            "manual.pdf",
            b"%PDF-1.7".to_vec(),
            Some("application/pdf".into()),
        );
        let created: Item = client.upload("/documents", body).await.unwrap();

        assert_eq!(created.id, 9);
    }

    #[tokio::test]
    async fn builder_requires_all_parts() {
        let result = ApiClient::builder().config(ApiConfig::new("http://localhost")).build();
        assert!(matches!(result, Err(ApiError::Config(_))));
    }
}
