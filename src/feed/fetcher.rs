use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::model::FeedSnapshot;
use super::parser::FeedExtractor;

pub const DEFAULT_ENDPOINT: &str = "https://www.mountainproject.com/rss/new";
pub const DEFAULT_USER_AGENT: &str = "MountainProjectFeedViewer/1.0";

const MAX_RETRIES: u32 = 3;
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while fetching a feed document.
///
/// Display strings are shown verbatim in the UI error state.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Configured endpoint is not a valid URL
    #[error("Invalid feed endpoint: {0}")]
    InvalidEndpoint(String),
    /// HTTP response with non-2xx status code
    #[error("Failed to fetch feed: {0}")]
    HttpStatus(u16),
    /// Request exceeded the timeout
    #[error("Request timed out")]
    Timeout,
    /// Server returned 429 Too Many Requests after max retries
    #[error("Rate limited after {0} retries")]
    RateLimited(u32),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// Body was not a readable feed
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Upstream selection: which area, and which entry kinds to include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeedQuery {
    pub area_id: u64,
    pub routes: bool,
    pub areas: bool,
    pub comments: bool,
    pub photos: bool,
}

impl FeedQuery {
    /// Query for `area_id` with every kind included.
    pub fn all(area_id: u64) -> Self {
        Self {
            area_id,
            routes: true,
            areas: true,
            comments: true,
            photos: true,
        }
    }

    pub fn with_area(self, area_id: u64) -> Self {
        Self { area_id, ..self }
    }

    /// Appends the query parameters to `endpoint`.
    pub fn to_url(&self, endpoint: &str) -> Result<Url, FetchError> {
        let mut url =
            Url::parse(endpoint).map_err(|e| FetchError::InvalidEndpoint(e.to_string()))?;
        let flag = |on: bool| if on { "on" } else { "off" };
        url.query_pairs_mut()
            .append_pair("selectedIds", &self.area_id.to_string())
            .append_pair("routes", flag(self.routes))
            .append_pair("areas", flag(self.areas))
            .append_pair("comments", flag(self.comments))
            .append_pair("photos", flag(self.photos));
        Ok(url)
    }
}

/// Where and how to fetch.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub endpoint: String,
    pub user_agent: String,
    pub timeout: Duration,
    /// Base delay of the exponential backoff (1x, 2x, 4x).
    pub backoff_base: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: REQUEST_TIMEOUT,
            backoff_base: Duration::from_secs(1),
        }
    }
}

/// Fetches the raw feed document for `query`.
///
/// # Behavior
///
/// - Sends the configured `User-Agent`
/// - Each attempt is bounded by `settings.timeout`
/// - 429 and 5xx responses are retried up to 3 times with exponential backoff
/// - Other non-2xx responses fail immediately with [`FetchError::HttpStatus`]
/// - Bodies over 10MB fail with [`FetchError::ResponseTooLarge`]
pub async fn fetch_feed(
    client: &reqwest::Client,
    settings: &FetchSettings,
    query: &FeedQuery,
) -> Result<String, FetchError> {
    let url = query.to_url(&settings.endpoint)?;
    let mut retry_count = 0;

    let bytes = loop {
        let request = client
            .get(url.clone())
            .header(reqwest::header::USER_AGENT, settings.user_agent.as_str())
            .send();
        let response = tokio::time::timeout(settings.timeout, request)
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(FetchError::Network)?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            if retry_count >= MAX_RETRIES {
                return Err(if status.is_server_error() {
                    FetchError::HttpStatus(status.as_u16())
                } else {
                    FetchError::RateLimited(MAX_RETRIES)
                });
            }

            let delay = settings.backoff_base * 2u32.pow(retry_count);
            tracing::warn!(
                area_id = query.area_id,
                status = %status,
                retry = retry_count,
                delay_ms = delay.as_millis() as u64,
                "Feed request failed, backing off"
            );
            tokio::time::sleep(delay).await;
            retry_count += 1;
            continue;
        }

        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        match read_limited_bytes(response, MAX_FEED_SIZE).await {
            Ok(bytes) => break bytes,
            Err(FetchError::IncompleteResponse { expected, received })
                if retry_count < MAX_RETRIES =>
            {
                tracing::debug!(
                    area_id = query.area_id,
                    expected,
                    received,
                    attempt = retry_count + 1,
                    "Retrying incomplete download"
                );
                tokio::time::sleep(settings.backoff_base * 2u32.pow(retry_count)).await;
                retry_count += 1;
            }
            Err(e) => return Err(e),
        }
    };

    tracing::debug!(area_id = query.area_id, bytes = bytes.len(), "Fetched feed");
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Fetches and extracts in one step. Malformed documents map to [`FetchError::Parse`].
pub async fn load_feed(
    client: &reqwest::Client,
    settings: &FetchSettings,
    query: &FeedQuery,
    extractor: &FeedExtractor,
) -> Result<FeedSnapshot, FetchError> {
    let raw = fetch_feed(client, settings, query).await?;
    extractor
        .extract(&raw)
        .map_err(|e| FetchError::Parse(e.to_string()))
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
