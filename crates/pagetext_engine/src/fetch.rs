use std::time::Duration;

use engine_logging::{engine_debug, sanitize_for_log};
use futures_util::StreamExt;
use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONNECTION, CONTENT_TYPE, USER_AGENT};

use crate::decode::decode_html;
use crate::{EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput, ItemIndex, ItemProgress, Stage};

pub const DEFAULT_ENDPOINT: &str = "http://api.scraperapi.com";

pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:89.0) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 14_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/90.0.4430.212 Safari/537.36",
];

#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Proxy base URL; the target is passed as the `url` query parameter.
    pub endpoint: String,
    pub api_key: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    /// Sent on every request, overriding the defaults (including User-Agent).
    pub extra_headers: Vec<(String, String)>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: String::new(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            extra_headers: Vec::new(),
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn emit(&self, _event: EngineEvent) {}
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(
        &self,
        index: ItemIndex,
        url: &str,
        timeout: Duration,
        sink: &dyn ProgressSink,
    ) -> Result<FetchOutput, FetchError>;
}

/// Fetches pages through the scraping proxy with one shared client.
#[derive(Debug, Clone)]
pub struct ProxyFetcher {
    settings: FetchSettings,
    client: reqwest::Client,
    endpoint: reqwest::Url,
}

impl ProxyFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let endpoint = reqwest::Url::parse(&settings.endpoint)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, format!("proxy endpoint: {err}")))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .build()
            .map_err(|err| FetchError::new(FailureKind::Unexpected, err.to_string()))?;
        Ok(Self {
            settings,
            client,
            endpoint,
        })
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// `<endpoint>?api_key=<key>&url=<target>`, percent-encoded.
    pub fn proxy_url(&self, target: &str) -> reqwest::Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("api_key", &self.settings.api_key)
            .append_pair("url", target);
        url
    }

    fn headers(&self) -> Result<HeaderMap, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(random_user_agent()));
        headers.insert(HeaderName::from_static("dnt"), HeaderValue::from_static("1"));
        headers.insert(CONNECTION, HeaderValue::from_static("close"));
        for (name, value) in &self.settings.extra_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| FetchError::new(FailureKind::Unexpected, format!("header name {name}: {err}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|err| FetchError::new(FailureKind::Unexpected, format!("header value: {err}")))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

#[async_trait::async_trait]
impl Fetcher for ProxyFetcher {
    async fn fetch(
        &self,
        index: ItemIndex,
        url: &str,
        timeout: Duration,
        sink: &dyn ProgressSink,
    ) -> Result<FetchOutput, FetchError> {
        let headers = self.headers()?;
        engine_debug!(
            "Fetching item {} url={} user_agent={:?}",
            index,
            sanitize_for_log(url),
            headers.get(USER_AGENT)
        );

        let response = self
            .client
            .get(self.proxy_url(url))
            .headers(headers)
            .timeout(timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let max_bytes = self.settings.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        sink.emit(EngineEvent::Progress(ItemProgress {
            index,
            stage: Stage::Downloading,
            attempt: None,
            bytes: Some(0),
        }));

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
            sink.emit(EngineEvent::Progress(ItemProgress {
                index,
                stage: Stage::Downloading,
                attempt: None,
                bytes: Some(bytes.len() as u64),
            }));
        }

        let decoded = decode_html(&bytes, content_type.as_deref())
            .map_err(|err| FetchError::new(FailureKind::Unexpected, err.to_string()))?;
        engine_debug!(
            "Fetched item {} url={} bytes={} encoding={}",
            index,
            sanitize_for_log(url),
            bytes.len(),
            decoded.encoding_label
        );

        Ok(FetchOutput {
            body: decoded.html,
            metadata: FetchMetadata {
                target_url: url.to_string(),
                status: status.as_u16(),
                content_type,
                byte_len: bytes.len() as u64,
                encoding: decoded.encoding_label,
            },
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    // Strip the proxy URL (it carries the API key) from the message.
    let err = err.without_url();
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    if err.is_connect() || err.is_request() || err.is_body() || err.is_decode() {
        return FetchError::new(FailureKind::Network, err.to_string());
    }
    FetchError::new(FailureKind::Unexpected, err.to_string())
}
