//! HTTP download of apio bundles.
//!
//! Redirects are followed manually so the redirect budget is explicit and a
//! redirect without a `Location` header is reported instead of being
//! mistaken for a final response. The response body is streamed straight to
//! the destination file.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{ACCEPT, LOCATION, USER_AGENT};
use reqwest::StatusCode;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::errors::ProvisionError;

/// Default number of redirects a download may follow.
pub const DEFAULT_MAX_REDIRECTS: u32 = 5;

/// User-Agent header for HTTP requests.
pub const USER_AGENT_VALUE: &str = concat!("apio-launcher/", env!("CARGO_PKG_VERSION"));

/// Connect timeout in seconds. There is no whole-request timeout.
const CONNECT_TIMEOUT_SECS: u64 = 30;

const REDIRECT_STATUSES: [StatusCode; 5] = [
    StatusCode::MOVED_PERMANENTLY,
    StatusCode::FOUND,
    StatusCode::SEE_OTHER,
    StatusCode::TEMPORARY_REDIRECT,
    StatusCode::PERMANENT_REDIRECT,
];

/// HTTP client configured for bundle downloads.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a client with automatic redirects disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be built.
    pub fn new() -> Result<Self, ProvisionError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(ProvisionError::Client)?;
        Ok(Self { client })
    }
}

/// Outcome of a successful download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSummary {
    /// The URL the body was finally served from.
    pub final_url: String,
    /// Number of redirects followed.
    pub redirects: u32,
    /// Bytes written to the destination.
    pub bytes: u64,
}

/// Downloads `url` to `dest`, following at most `max_redirects` redirects.
///
/// The destination is created or truncated. A partially written file is
/// removed when the body stream fails.
///
/// # Errors
///
/// Returns an error if:
/// - The connection fails
/// - A redirect lacks a `Location` header or points to an invalid URL
/// - More than `max_redirects` redirects are needed
/// - The final status is not 200
/// - Writing the destination file fails
pub async fn download_file(
    fetcher: &HttpFetcher,
    url: &str,
    dest: &Path,
    max_redirects: u32,
) -> Result<DownloadSummary, ProvisionError> {
    let mut current = Url::parse(url).map_err(|source| ProvisionError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;

    for redirects in 0..=max_redirects {
        let response = fetcher
            .client
            .get(current.clone())
            .header(USER_AGENT, USER_AGENT_VALUE)
            .header(ACCEPT, "application/octet-stream")
            .send()
            .await
            .map_err(|source| ProvisionError::Network {
                url: current.to_string(),
                source,
            })?;

        let status = response.status();
        tracing::debug!(url = %current, status = status.as_u16(), "HTTP response");

        if REDIRECT_STATUSES.contains(&status) {
            current = redirect_target(&current, &response)?;
            tracing::debug!(location = %current, "following redirect");
            continue;
        }

        if status != StatusCode::OK {
            return Err(ProvisionError::HttpStatus {
                status: status.as_u16(),
                url: current.to_string(),
            });
        }

        let bytes = match stream_to_file(response, &current, dest).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = tokio::fs::remove_file(dest).await;
                return Err(e);
            }
        };
        tracing::info!(dest = %dest.display(), bytes, "download complete");

        return Ok(DownloadSummary {
            final_url: current.to_string(),
            redirects,
            bytes,
        });
    }

    Err(ProvisionError::TooManyRedirects {
        url: url.to_string(),
        limit: max_redirects,
    })
}

/// Resolves the `Location` header of a redirect against the current URL.
fn redirect_target(current: &Url, response: &reqwest::Response) -> Result<Url, ProvisionError> {
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ProvisionError::RedirectWithoutLocation {
            status: response.status().as_u16(),
            url: current.to_string(),
        })?;

    current
        .join(location)
        .map_err(|source| ProvisionError::InvalidRedirect {
            location: location.to_string(),
            url: current.to_string(),
            source,
        })
}

async fn stream_to_file(
    response: reqwest::Response,
    url: &Url,
    dest: &Path,
) -> Result<u64, ProvisionError> {
    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| ProvisionError::io(format!("Failed to create file: {}", dest.display()), e))?;

    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| ProvisionError::Network {
            url: url.to_string(),
            source,
        })?;
        file.write_all(&chunk)
            .await
            .map_err(|e| ProvisionError::io(format!("Failed to write to {}", dest.display()), e))?;
        written += chunk.len() as u64;
    }

    file.flush()
        .await
        .map_err(|e| ProvisionError::io(format!("Failed to flush {}", dest.display()), e))?;

    Ok(written)
}
