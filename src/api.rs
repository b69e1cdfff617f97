// API client module: one method per playground operation.
//
// Each operation follows the same shape: normalize the source, resolve the
// endpoint, build the request, hand it to the transport, decode the reply.
// Responses are owned values and are released when they go out of scope,
// whichever way the method returns.

use crate::config::{ClientConfig, Endpoint, PROTOCOL_VERSION};
use crate::download::canonicalize_download_target;
use crate::error::{ClientError, Result};
use crate::source::SourceInput;
use crate::transport::{HttpRequest, HttpResponse, RequestBody};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::io::{Read, Write};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Outcome of compiling and running a program.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct RunResult {
    /// Compile or runtime error reported by the playground, empty if none.
    #[serde(default, alias = "errors")]
    pub errors: String,
    /// Output events, in the order they have to be replayed.
    #[serde(default, alias = "events", deserialize_with = "null_as_empty")]
    pub events: Vec<RunEvent>,
}

/// One chunk of program output.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct RunEvent {
    pub message: String,
    pub kind: EventKind,
    /// Time to wait after the previous event before printing this one.
    /// Nanoseconds on the wire.
    #[serde(default, with = "duration_nanos")]
    pub delay: Duration,
}

/// Channel an event was written to. Kinds this client does not know are
/// kept verbatim and skipped on replay.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Stdout,
    Stderr,
    Other(String),
}

impl From<String> for EventKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "stdout" => EventKind::Stdout,
            "stderr" => EventKind::Stderr,
            _ => EventKind::Other(kind),
        }
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Stdout => "stdout".to_string(),
            EventKind::Stderr => "stderr".to_string(),
            EventKind::Other(kind) => kind,
        }
    }
}

/// Outcome of formatting. `error` is empty when `body` holds the result.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct FormatResult {
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub error: String,
}

/// Where a shared snippet can be viewed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareResult {
    pub url: Url,
}

impl fmt::Display for ShareResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Go version the playground runs.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct VersionResult {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub release: String,
    #[serde(default)]
    pub name: String,
}

/// Playground client. Cheap to clone; holds nothing but its configuration.
#[derive(Clone, Debug, Default)]
pub struct Client {
    config: ClientConfig,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Client { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Compile and run `src`.
    pub fn run(&self, src: impl Into<SourceInput>) -> Result<RunResult> {
        let endpoint = Endpoint::Compile;
        let body = source_text(&endpoint, src.into())?;
        let query = [("version", PROTOCOL_VERSION), ("body", body.as_str())];
        let url = self.endpoint_url(&endpoint, &query)?;
        let response = self.send(&endpoint, HttpRequest::post(url, RequestBody::Empty))?;
        self.decode_json(&endpoint, response)
    }

    /// Format `src` with gofmt, or goimports when `imports` is set.
    pub fn format(&self, src: impl Into<SourceInput>, imports: bool) -> Result<FormatResult> {
        let endpoint = Endpoint::Format;
        let body = source_text(&endpoint, src.into())?;
        let mut query = vec![("body", body.as_str())];
        if imports {
            query.push(("imports", "true"));
        }
        let url = self.endpoint_url(&endpoint, &query)?;
        let response = self.send(&endpoint, HttpRequest::post(url, RequestBody::Empty))?;
        self.decode_json(&endpoint, response)
    }

    /// Store `src` on the playground and return its share URL.
    ///
    /// With a non-default backend the URL carries `v=<backend>` so the
    /// snippet opens on the same toolchain.
    pub fn share(&self, src: impl Into<SourceInput>) -> Result<ShareResult> {
        let endpoint = Endpoint::Share;
        let url = self.endpoint_url(&endpoint, &[])?;
        let body = RequestBody::Reader(src.into().into_reader());
        let response = self.send(&endpoint, HttpRequest::post(url, body))?;
        let response = self.expect_success(&endpoint, response)?;

        let id = read_text(endpoint.operation(), response)?;
        let link = format!("{}/p/{}", self.config.service_root(), id.trim());
        let mut url = Url::parse(&link)
            .map_err(|err| ClientError::invalid_url(endpoint.operation(), link, err))?;
        let backend = self.config.backend();
        if !backend.is_default() {
            url.query_pairs_mut().append_pair("v", backend.as_str());
        }
        Ok(ShareResult { url })
    }

    /// Fetch the raw source behind a hash or share URL and copy it verbatim
    /// into `out`. Returns the number of bytes written.
    pub fn download<W: Write + ?Sized>(&self, out: &mut W, hash_or_url: &str) -> Result<u64> {
        let target = canonicalize_download_target(&self.config, hash_or_url);
        let endpoint = target.endpoint();
        let url = self.endpoint_url(&endpoint, &[])?;
        let mut response = self.send(&endpoint, HttpRequest::get(url))?;
        if response.status != 200 {
            return Err(ClientError::UnexpectedStatus {
                operation: endpoint.operation(),
                url: target.into_string(),
                status: response.status,
                status_line: response.status_line(),
            });
        }
        std::io::copy(&mut response.body, out)
            .map_err(|err| ClientError::io(endpoint.operation(), err))
    }

    /// Version and release tag of the Go toolchain behind the playground.
    pub fn version(&self) -> Result<VersionResult> {
        let endpoint = Endpoint::Version;
        let url = self.endpoint_url(&endpoint, &[])?;
        let response = self.send(&endpoint, HttpRequest::get(url))?;
        self.decode_json(&endpoint, response)
    }

    fn endpoint_url(&self, endpoint: &Endpoint, query: &[(&str, &str)]) -> Result<Url> {
        let raw = self.config.resolve(endpoint);
        let mut url = Url::parse(&raw)
            .map_err(|err| ClientError::invalid_url(endpoint.operation(), raw, err))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn send(&self, endpoint: &Endpoint, request: HttpRequest) -> Result<HttpResponse> {
        debug!(
            operation = endpoint.operation(),
            method = %request.method,
            path = request.url.path(),
            "dispatching playground request"
        );
        self.config
            .transport()
            .send(request)
            .map_err(|err| ClientError::transport(endpoint.operation(), err))
    }

    fn expect_success(&self, endpoint: &Endpoint, response: HttpResponse) -> Result<HttpResponse> {
        if response.is_success() {
            return Ok(response);
        }
        Err(ClientError::UnexpectedStatus {
            operation: endpoint.operation(),
            url: self.config.resolve(endpoint),
            status: response.status,
            status_line: response.status_line(),
        })
    }

    /// Decode a JSON reply. A body that does not decode on an error status
    /// is reported as that status rather than as a decoding failure.
    fn decode_json<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        response: HttpResponse,
    ) -> Result<T> {
        let status_line = response.status_line();
        let HttpResponse { status, body, .. } = response;
        match serde_json::from_reader(body) {
            Ok(value) => Ok(value),
            Err(_) if !(200..300).contains(&status) => Err(ClientError::UnexpectedStatus {
                operation: endpoint.operation(),
                url: self.config.resolve(endpoint),
                status,
                status_line,
            }),
            Err(err) => Err(ClientError::decode(endpoint.operation(), err)),
        }
    }
}

fn source_text(endpoint: &Endpoint, src: SourceInput) -> Result<String> {
    src.into_string()
        .map_err(|err| ClientError::read_source(endpoint.operation(), err))
}

fn read_text(operation: &'static str, mut response: HttpResponse) -> Result<String> {
    let mut text = String::new();
    response
        .body
        .read_to_string(&mut text)
        .map_err(|err| ClientError::io(operation, err))?;
    Ok(text)
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

mod duration_nanos {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(delay: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(delay.as_nanos()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let nanos = i64::deserialize(deserializer)?;
        Ok(Duration::from_nanos(u64::try_from(nanos).unwrap_or(0)))
    }
}
