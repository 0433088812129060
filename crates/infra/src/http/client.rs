use std::time::Duration;

use fleetdesk_domain::FleetDeskError;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;

use crate::errors::InfraError;

/// When to resend a request that never reached the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: usize,
    /// Delay before the first retry; doubles per retry
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 1, base_backoff: Duration::from_millis(100) }
    }
}

impl RetryPolicy {
    fn delay_before(&self, retry_number: usize) -> Duration {
        let shift = retry_number.saturating_sub(1).min(8) as u32;
        self.base_backoff.saturating_mul(1u32 << shift)
    }

    fn should_retry(&self, attempt: usize, err: &reqwest::Error) -> bool {
        attempt < self.max_attempts.max(1) && is_connect_failure(err)
    }
}

/// reqwest transport shared by the API and auth clients
///
/// Only connect failures are retried, so any method (uploads included) is
/// safe to resend. Status codes come back untouched; the caller decides
/// what a 401 or 5xx means. Deadlines are applied by the caller.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    retry: RetryPolicy,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Send a request whose body can be cloned for retries.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, FleetDeskError> {
        self.send_with(|_| builder.try_clone()).await
    }

    /// Send a request rebuilt by `make` for every attempt.
    ///
    /// Multipart forms cannot be cloned, so callers holding one rebuild it
    /// here. `make` returning `None` fails with `FleetDeskError::Internal`.
    pub async fn send_with<F>(&self, make: F) -> Result<Response, FleetDeskError>
    where
        F: Fn(&ReqwestClient) -> Option<RequestBuilder>,
    {
        let mut attempt = 1;

        loop {
            let request = make(&self.client)
                .ok_or_else(|| {
                    FleetDeskError::Internal("request body cannot be rebuilt for retry".into())
                })?
                .build()
                .map_err(to_domain)?;

            let method = request.method().clone();
            let url = request.url().clone();
            debug!(attempt, %method, %url, "sending HTTP request");

            match self.client.execute(request).await {
                Ok(response) => return Ok(response),
                Err(err) if self.retry.should_retry(attempt, &err) => {
                    let delay = self.retry.delay_before(attempt);
                    debug!(attempt, %method, %url, error = %err, ?delay, "connect failed, retrying");
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(err) => {
                    debug!(attempt, %method, %url, error = %err, "HTTP request failed");
                    return Err(to_domain(err));
                }
            }
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug, Default)]
pub struct HttpClientBuilder {
    retry: RetryPolicy,
    user_agent: Option<String>,
}

impl HttpClientBuilder {
    /// Configure the total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.retry.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.retry.base_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<HttpClient, FleetDeskError> {
        let mut builder = ReqwestClient::builder().no_proxy();
        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(to_domain)?;
        Ok(HttpClient { client, retry: self.retry })
    }
}

fn to_domain(err: reqwest::Error) -> FleetDeskError {
    InfraError::from(err).into()
}

fn is_connect_failure(err: &reqwest::Error) -> bool {
    #[cfg(not(target_arch = "wasm32"))]
    {
        err.is_connect()
    }
    #[cfg(target_arch = "wasm32")]
    {
        let _ = err;
        false
    }
}
