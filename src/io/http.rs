//! Blocking HTTP transport abstraction for testability.
//!
//! The catalog client never lets the transport follow redirects: a redirect response is
//! handed back as-is so the caller can re-issue the request with its bearer header.
use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, LOCATION};
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to create HTTP client: {0}")]
    Client(String),
    #[error("Request to {url} failed: {reason}")]
    Request { url: String, reason: String },
}

/// Status, redirect target and streaming body of one HTTP exchange
pub struct HttpResponse {
    pub status: u16,
    pub location: Option<String>,
    pub body: Box<dyn Read + Send>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.status, 301 | 302 | 303 | 307)
    }

    /// Drain the body into a string.
    pub fn text(mut self) -> std::io::Result<String> {
        let mut text = String::new();
        self.body.read_to_string(&mut text)?;
        Ok(text)
    }
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("location", &self.location)
            .finish()
    }
}

/// Trait for blocking HTTP operations.
///
/// Allows dependency injection of mock transports in tests.
pub trait HttpTransport: Send + Sync {
    /// POST an `application/x-www-form-urlencoded` body.
    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpResponse, TransportError>;

    /// GET `url` with query parameters, authenticated with a bearer token.
    fn get_with_bearer(
        &self,
        url: &str,
        query: &[(&str, String)],
        bearer_token: &str,
    ) -> Result<HttpResponse, TransportError>;
}

/// Real transport using reqwest with redirect following disabled.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport").finish()
    }
}

impl ReqwestTransport {
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("s2water/", env!("CARGO_PKG_VERSION")));
        // reqwest's blocking client defaults to a 30 s timeout; clear it unless asked for one
        builder = builder.timeout(timeout);
        let client = builder
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    fn wrap(response: reqwest::blocking::Response) -> HttpResponse {
        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        HttpResponse {
            status,
            location,
            body: Box::new(response),
        }
    }
}

impl HttpTransport for ReqwestTransport {
    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpResponse, TransportError> {
        trace!("POST {}", url);
        let response =
            self.client
                .post(url)
                .form(form)
                .send()
                .map_err(|e| TransportError::Request {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
        Ok(Self::wrap(response))
    }

    fn get_with_bearer(
        &self,
        url: &str,
        query: &[(&str, String)],
        bearer_token: &str,
    ) -> Result<HttpResponse, TransportError> {
        trace!("GET {}", url);
        let response = self
            .client
            .get(url)
            .query(query)
            .header(AUTHORIZATION, format!("Bearer {}", bearer_token))
            .send()
            .map_err(|e| TransportError::Request {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self::wrap(response))
    }
}
