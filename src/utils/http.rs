// src/utils/http.rs

//! HTTP transport with timeout, retry-with-jitter, throttling and user-agent rotation.
//!
//! The [`Transport`] trait is the only network seam the pipeline sees. The
//! production implementation is [`HttpTransport`] over a [`ReqwestConnector`];
//! the connector performs exactly one attempt and the transport layers the
//! retry, throttle and header policies on top of it.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::{AppError, Result};
use crate::models::{HttpMethod, ScraperConfig};

/// Lower and upper bound (seconds) of the jitter added to every retry pause.
const JITTER_RANGE: std::ops::Range<f64> = 0.1..1.0;

/// An outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    /// Query string parameters
    pub params: Vec<(String, String)>,
    /// Urlencoded body fields (POST only)
    pub form: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: Vec::new(),
            params: Vec::new(),
            form: Vec::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn form_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A successful (2xx) response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// Final URL after redirects
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// Issues requests on behalf of the pipeline.
///
/// An `Err` means "no data available for this request"; callers skip the
/// affected page or candidate rather than aborting.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, request: &HttpRequest) -> Result<RawResponse>;
}

/// Performs a single request attempt with no retry.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn execute(&self, request: &HttpRequest) -> Result<RawResponse>;
}

/// `reqwest`-backed connector.
pub struct ReqwestConnector {
    client: reqwest::Client,
}

impl ReqwestConnector {
    /// Create a connector whose client applies the configured timeout.
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Connector for ReqwestConnector {
    async fn execute(&self, request: &HttpRequest) -> Result<RawResponse> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url).form(&request.form),
        };
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await?.error_for_status()?;
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let body = response.text().await?;

        Ok(RawResponse { url, status, body })
    }
}

/// Source of `User-Agent` values.
#[derive(Debug, Clone)]
pub struct UserAgentPool {
    agents: Vec<String>,
    fallback: String,
    rotate: bool,
}

impl UserAgentPool {
    pub fn new(agents: Vec<String>, fallback: impl Into<String>, rotate: bool) -> Self {
        let agents = agents
            .into_iter()
            .filter(|a| !a.trim().is_empty())
            .collect();
        Self {
            agents,
            fallback: fallback.into(),
            rotate,
        }
    }

    /// Random pool entry when rotating, otherwise (or with an empty pool) the fallback agent.
    pub fn pick(&self) -> &str {
        if !self.rotate {
            return &self.fallback;
        }
        self.agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(&self.fallback)
    }
}

/// Retrying, throttled transport.
pub struct HttpTransport<C = ReqwestConnector> {
    connector: C,
    agents: UserAgentPool,
    default_headers: Vec<(String, String)>,
    max_attempts: u32,
    retry_delay: Duration,
    throttle: Option<Duration>,
}

impl HttpTransport<ReqwestConnector> {
    /// Build the production transport from configuration.
    pub fn from_config(config: &ScraperConfig) -> Result<Self> {
        Ok(Self::with_connector(ReqwestConnector::new(config)?, config))
    }
}

impl<C: Connector> HttpTransport<C> {
    /// Layer the configured policies over an arbitrary connector.
    pub fn with_connector(connector: C, config: &ScraperConfig) -> Self {
        let throttle = config
            .rate_limit
            .as_ref()
            .filter(|r| r.requests_per_minute > 0)
            .map(|r| Duration::from_secs_f64(60.0 / f64::from(r.requests_per_minute)));

        Self {
            connector,
            agents: UserAgentPool::new(
                config.user_agents.clone(),
                config.fallback_user_agent.clone(),
                config.user_agent_rotation,
            ),
            default_headers: config
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            max_attempts: config.max_retries.max(1),
            // Negative, NaN or infinite delays fall back to no fixed pause.
            retry_delay: Duration::try_from_secs_f64(config.retry_delay).unwrap_or_default(),
            throttle,
        }
    }

    /// Merge default headers under the request's own and resolve the `User-Agent`.
    fn prepare(&self, request: &HttpRequest) -> HttpRequest {
        let mut prepared = request.clone();
        let mut headers: Vec<(String, String)> = self
            .default_headers
            .iter()
            .filter(|(name, _)| request.header_value(name).is_none())
            .cloned()
            .collect();
        headers.append(&mut prepared.headers);

        let has_agent = headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("user-agent"));
        if !has_agent {
            headers.push(("User-Agent".to_string(), self.agents.pick().to_string()));
        }

        prepared.headers = headers;
        prepared
    }

    /// Fixed delay plus uniform jitter.
    fn retry_pause(&self) -> Duration {
        let jitter = rand::thread_rng().gen_range(JITTER_RANGE);
        self.retry_delay + Duration::from_secs_f64(jitter)
    }
}

#[async_trait]
impl<C: Connector> Transport for HttpTransport<C> {
    async fn request(&self, request: &HttpRequest) -> Result<RawResponse> {
        if let Some(throttle) = self.throttle {
            tokio::time::sleep(throttle).await;
        }

        let prepared = self.prepare(request);
        let mut attempt = 1;
        loop {
            match self.connector.execute(&prepared).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    log::warn!(
                        "Request failed (attempt {}/{}) {} {}: {}",
                        attempt,
                        self.max_attempts,
                        prepared.method,
                        prepared.url,
                        e
                    );
                    if attempt >= self.max_attempts {
                        log::error!("Max retries reached for URL: {}", prepared.url);
                        return Err(AppError::transport(
                            &prepared.url,
                            format!("gave up after {} attempts: {}", attempt, e),
                        ));
                    }

                    let pause = self.retry_pause();
                    log::info!("Retrying in {:.2} seconds...", pause.as_secs_f64());
                    tokio::time::sleep(pause).await;
                    attempt += 1;
                }
            }
        }
    }
}
