//! HTTP transport seam.
//!
//! The client never talks to the network directly: every operation builds an
//! [`HttpRequest`] and hands it to a [`Transport`]. The default transport is a
//! blocking reqwest client; tests plug in an [`FnTransport`] that answers
//! from a closure.

use crate::error::BoxError;
use reqwest::blocking::Client as HttpClient;
use reqwest::{Method, StatusCode};
use std::fmt;
use std::io::{Cursor, Read};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Request body: nothing, or a reader drained by the transport.
pub enum RequestBody {
    Empty,
    Reader(Box<dyn Read + Send>),
}

impl RequestBody {
    /// Drain the body into memory. Handy for fake transports.
    pub fn into_bytes(self) -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let RequestBody::Reader(mut reader) = self {
            reader.read_to_end(&mut buf)?;
        }
        Ok(buf)
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Empty => f.write_str("Empty"),
            RequestBody::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

/// One outgoing request.
#[derive(Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub body: RequestBody,
}

impl HttpRequest {
    pub fn get(url: Url) -> Self {
        HttpRequest {
            method: Method::GET,
            url,
            body: RequestBody::Empty,
        }
    }

    pub fn post(url: Url, body: RequestBody) -> Self {
        HttpRequest {
            method: Method::POST,
            url,
            body,
        }
    }
}

/// One response. The body is read at most once and released when the
/// response is dropped.
pub struct HttpResponse {
    pub status: u16,
    /// Canonical reason phrase for `status`, e.g. `Bad Gateway`.
    pub reason: String,
    pub body: Box<dyn Read + Send>,
}

impl HttpResponse {
    /// Build a response from a status code and an in-memory body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        let reason = StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or_default()
            .to_string();
        HttpResponse {
            status,
            reason,
            body: Box::new(Cursor::new(body.into())),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `502 Bad Gateway` style status line.
    pub fn status_line(&self) -> String {
        if self.reason.is_empty() {
            self.status.to_string()
        } else {
            format!("{} {}", self.status, self.reason)
        }
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

/// Send one request, receive one response, or fail.
///
/// Implementations decide about timeouts and connection reuse; the client
/// never retries. They must be safe to share between threads.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, BoxError>;
}

/// Blocking reqwest client.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    client: HttpClient,
}

impl ReqwestTransport {
    pub fn new(client: HttpClient) -> Self {
        ReqwestTransport { client }
    }

    /// Client whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = HttpClient::builder().timeout(timeout).build()?;
        Ok(ReqwestTransport { client })
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
        debug!(method = %request.method, url = %request.url, "sending request");
        let mut builder = self.client.request(request.method, request.url);
        if matches!(request.body, RequestBody::Reader(_)) {
            // Sized body so the request carries Content-Length.
            builder = builder.body(request.body.into_bytes()?);
        }
        let response = builder.send()?;
        let status = response.status();
        debug!(status = status.as_u16(), "received response");
        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body: Box::new(response),
        })
    }
}

/// Transport backed by a closure.
pub struct FnTransport<F>(pub F);

impl<F> Transport for FnTransport<F>
where
    F: Fn(HttpRequest) -> Result<HttpResponse, BoxError> + Send + Sync,
{
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
        (self.0)(request)
    }
}

impl<F> fmt::Debug for FnTransport<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnTransport(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_status_line_uses_canonical_reason() {
        let resp = HttpResponse::new(502, Vec::new());
        assert_eq!(resp.status_line(), "502 Bad Gateway");
        assert!(!resp.is_success());
        assert!(HttpResponse::new(204, Vec::new()).is_success());
    }

    #[test]
    fn unknown_status_has_bare_status_line() {
        assert_eq!(HttpResponse::new(599, Vec::new()).status_line(), "599");
    }

    #[test]
    fn fn_transport_sees_request() {
        let transport = FnTransport(|req: HttpRequest| -> Result<HttpResponse, BoxError> {
            assert_eq!(req.method, Method::POST);
            let body = req.body.into_bytes()?;
            Ok(HttpResponse::new(200, body))
        });
        let url = Url::parse("http://localhost/echo").unwrap();
        let body = RequestBody::Reader(Box::new(Cursor::new(b"ping".to_vec())));
        let mut resp = transport.send(HttpRequest::post(url, body)).unwrap();
        let mut out = String::new();
        resp.body.read_to_string(&mut out).unwrap();
        assert_eq!(out, "ping");
    }
}
