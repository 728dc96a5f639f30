use std::collections::HashMap;
use std::time::Duration;

use log::{debug, info, warn};
use miette::Diagnostic;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use thiserror::Error;
use tokio::time::sleep;

use crate::rate_limiter::RateLimiter;

/// Network/5xx/429/timeout are transient and retried internally; everything
/// else is surfaced once.
#[derive(Debug, Error, Diagnostic)]
pub enum FetchError {
    #[error("request to {url} failed after exhausting retries")]
    Transient {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("upstream returned {status} for {url}")]
    Permanent { url: String, status: StatusCode },
    #[error("rate limited by upstream for {url} and retries were exhausted")]
    RateLimited { url: String },
    #[error("error building request for {url}")]
    Build {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to decode response body from {url} as JSON")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("local I/O error handling {url}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

/// Which header profile to send. The stats API expects JSON; the reference
/// site expects HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    Json,
    Html,
}

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub max_retries: u32,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub proxy: Option<String>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            proxy: None,
        }
    }
}

/// Retrying request executor. One `Fetcher` owns one rate limiter and is
/// meant to be shared (behind an `Arc`) across all source clients for a
/// single process, since the rate limiter is a process-lifetime singleton.
pub struct Fetcher {
    client: reqwest::Client,
    limiter: RateLimiter,
    max_retries: u32,
}

impl Fetcher {
    pub fn new(config: FetcherConfig, rate_limit: f64) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .gzip(true);

        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy).map_err(|source| FetchError::Build {
                url: proxy.clone(),
                source,
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(|source| FetchError::Build {
            url: "<client construction>".to_string(),
            source,
        })?;

        Ok(Self {
            client,
            limiter: RateLimiter::new(rate_limit),
            max_retries: config.max_retries,
        })
    }

    /// Builds a `Fetcher` straight from `NBA_API_RATE_LIMIT`,
    /// `NBA_API_TIMEOUT`, `NBA_API_PROXY`, `NBA_API_MAX_RETRIES`, falling
    /// back to `FetcherConfig::default`'s values for anything unset or
    /// unparseable. Connect timeout isn't one of these four variables and
    /// always takes the default.
    pub fn from_env() -> Result<Self, FetchError> {
        use std::env;

        let defaults = FetcherConfig::default();

        let rate_limit = env::var("NBA_API_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5.0);
        let request_timeout = env::var("NBA_API_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);
        let max_retries = env::var("NBA_API_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_retries);
        let proxy = env::var("NBA_API_PROXY").ok();

        Self::new(
            FetcherConfig {
                max_retries,
                request_timeout,
                connect_timeout: defaults.connect_timeout,
                proxy,
            },
            rate_limit,
        )
    }

    /// Fetches `url` with `params` as the query string, returning the raw
    /// response body and headers. Retries transient failures with
    /// exponential backoff, honoring `Retry-After` on 429.
    pub async fn get(
        &self,
        url: &str,
        params: &[(&str, &str)],
        accept: Accept,
    ) -> Result<(Vec<u8>, HeaderMap), FetchError> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            self.limiter.acquire().await;

            let jitter = rand::thread_rng().gen_range(0.0..0.5);
            sleep(Duration::from_secs_f64(jitter)).await;

            debug!("fetching {url} (attempt {attempt}/{})", self.max_retries);

            let request = self
                .client
                .get(url)
                .query(params)
                .headers(browser_headers(accept))
                .build()
                .map_err(|source| FetchError::Build {
                    url: url.to_string(),
                    source,
                })?;

            let result = self.client.execute(request).await;

            match result {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let headers = response.headers().clone();
                        let bytes = response
                            .bytes()
                            .await
                            .map_err(|source| FetchError::Transient {
                                url: url.to_string(),
                                source,
                            })?;
                        return Ok((bytes.to_vec(), headers));
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = retry_after_seconds(response.headers());
                        if let Some(seconds) = retry_after {
                            info!("429 for {url}, honoring Retry-After: {seconds}s");
                            sleep(Duration::from_secs(seconds)).await;
                        }
                        if attempt >= self.max_retries {
                            return Err(FetchError::RateLimited {
                                url: url.to_string(),
                            });
                        }
                        self.backoff_sleep(attempt).await;
                        continue;
                    }

                    if status.is_server_error() {
                        if attempt >= self.max_retries {
                            return Err(FetchError::Permanent {
                                url: url.to_string(),
                                status,
                            });
                        }
                        warn!("{status} for {url}, retrying (attempt {attempt})");
                        self.backoff_sleep(attempt).await;
                        continue;
                    }

                    // 4xx other than 429: not retried.
                    return Err(FetchError::Permanent {
                        url: url.to_string(),
                        status,
                    });
                }
                Err(source) => {
                    if attempt >= self.max_retries {
                        return Err(FetchError::Transient {
                            url: url.to_string(),
                            source,
                        });
                    }
                    warn!("network error for {url}: {source} (attempt {attempt})");
                    self.backoff_sleep(attempt).await;
                    continue;
                }
            }
        }
    }

    async fn backoff_sleep(&self, attempt: u32) {
        let base = 0.5_f64 * 2f64.powi(attempt as i32 - 1);
        let backoff = base.clamp(0.5, 10.0);
        sleep(Duration::from_secs_f64(backoff)).await;
    }
}

fn retry_after_seconds(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
}

/// Browser-like headers matching what a real browser sends for each content
/// type, split between JSON (stats API) and HTML (reference site) Accept
/// values.
fn browser_headers(accept: Accept) -> HeaderMap {
    let mut map = HeaderMap::new();
    let pairs: HashMap<&str, &str> = HashMap::from([
        (
            "Accept",
            match accept {
                Accept::Json => "application/json, text/plain, */*",
                Accept::Html => "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            },
        ),
        ("Accept-Encoding", "gzip, deflate, br"),
        ("Accept-Language", "en-US,en;q=0.9"),
        ("Cache-Control", "no-cache"),
        ("Connection", "keep-alive"),
        ("DNT", "1"),
        ("Pragma", "no-cache"),
        ("Referer", "https://www.nba.com/"),
        (
            "sec-ch-ua",
            "\"Google Chrome\";v=\"120\", \"Not A;Brand\";v=\"99\", \"Chromium\";v=\"120\"",
        ),
        ("sec-ch-ua-mobile", "?0"),
        ("sec-ch-ua-platform", "\"macOS\""),
        ("Sec-Fetch-Dest", "empty"),
        ("Sec-Fetch-Mode", "cors"),
        ("Sec-Fetch-Site", "same-site"),
        (
            "User-Agent",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        ),
    ]);

    for (name, value) in pairs {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            map.insert(name, value);
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_after_parses_integer_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::RETRY_AFTER, HeaderValue::from_static("12"));
        assert_eq!(retry_after_seconds(&headers), Some(12));
    }

    #[test]
    fn retry_after_ignores_http_date_form() {
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after_seconds(&headers), None);
    }

    #[test]
    fn json_and_html_accept_headers_differ() {
        let json = browser_headers(Accept::Json);
        let html = browser_headers(Accept::Html);
        assert_ne!(json.get("Accept"), html.get("Accept"));
    }
}
