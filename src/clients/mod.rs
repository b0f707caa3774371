//! Clients for the upstream identification and taxonomy web services.
//!
//! All three services are consumed over plain blocking HTTP through the
//! [`Transport`] seam, so the clients can be exercised in tests without a
//! network. [`HttpTransport`] is the reqwest-backed implementation used by
//! the CLI. Transient failures against services that tolerate retrying
//! (WoRMS) run under a bounded-exponential-backoff [`RetryPolicy`].

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Url;
use thiserror::Error;
use tracing::debug;

pub mod blast;
pub mod bold;
pub mod worms;

const USER_AGENT: &str = concat!("spps-id/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("could not build {service} request: {detail}")]
    InvalidRequest { service: &'static str, detail: String },

    #[error("malformed {service} response: {detail}")]
    Malformed { service: &'static str, detail: String },

    #[error("{service} still failing after {attempts} attempts: {source}")]
    RetriesExhausted {
        service: &'static str,
        attempts: u32,
        #[source]
        source: TransportError,
    },

    #[error("timed out after {elapsed:?} waiting for BLAST job {rid}")]
    PollTimeout { rid: String, elapsed: Duration },
}

/// Blocking fetch of a URL as text.
pub trait Transport {
    fn get(&self, url: &Url) -> Result<String, TransportError>;
}

/// reqwest-backed transport with connect and request timeouts.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns the underlying reqwest error if the TLS backend cannot be
    /// initialized.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(300))
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &Url) -> Result<String, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| TransportError::Request {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.text().map_err(|e| TransportError::Request {
            url: url.to_string(),
            source: e,
        })
    }
}

/// Bounded retry with exponential backoff for transient transport failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds or `max_attempts` transport failures.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::RetriesExhausted` wrapping the last transport
    /// error once the attempt budget is spent.
    pub fn run<T>(
        &self,
        service: &'static str,
        mut op: impl FnMut() -> Result<T, TransportError>,
    ) -> Result<T, ClientError> {
        let mut delay = self.initial_delay;
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(source) if attempt >= self.max_attempts => {
                    return Err(ClientError::RetriesExhausted {
                        service,
                        attempts: attempt,
                        source,
                    });
                }
                Err(err) => {
                    debug!(
                        "{service} request failed (attempt {attempt}/{}): {err}",
                        self.max_attempts
                    );
                    thread::sleep(delay);
                    delay = (delay * 2).min(self.max_delay);
                    attempt += 1;
                }
            }
        }
    }

    /// Zero-delay policy for tests.
    #[cfg(test)]
    pub(crate) fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }
}
