//! Client configuration and endpoint resolution.

use crate::error::{ClientError, Result};
use crate::transport::{ReqwestTransport, Transport};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use url::Url;

/// Default root of the playground API.
pub const DEFAULT_SERVICE_ROOT: &str = "https://play.golang.org";
/// Default root of the playground web front-end (share links).
pub const DEFAULT_FRONTEND_ROOT: &str = "https://go.dev/play";
/// Version of the compile protocol sent with every run.
pub const PROTOCOL_VERSION: &str = "2";
/// Extension of raw source files served under `/p/`.
pub const SOURCE_EXTENSION: &str = ".go";

/// Shared reqwest transport for configs that were not given one. Built on
/// first use.
static DEFAULT_TRANSPORT: OnceLock<ReqwestTransport> = OnceLock::new();

/// Go toolchain the playground runs the program with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Latest release.
    #[default]
    Default,
    /// Development branch, served from a `gotip`-prefixed host.
    Gotip,
}

impl Backend {
    /// Identifier used as host prefix and `v=` share parameter. Empty for
    /// the default backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Default => "",
            Backend::Gotip => "gotip",
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Backend::Default
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unexpected backend: {0}")]
pub struct UnknownBackend(pub String);

impl FromStr for Backend {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "default" | "release" => Ok(Backend::Default),
            "gotip" => Ok(Backend::Gotip),
            other => Err(UnknownBackend(other.to_string())),
        }
    }
}

/// The service endpoints, one per operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Compile,
    Format,
    Share,
    /// Raw source of a shared snippet, by id.
    Download(String),
    Version,
}

impl Endpoint {
    /// Path appended to the service root.
    pub fn path(&self) -> String {
        match self {
            Endpoint::Compile => "/compile".to_string(),
            Endpoint::Format => "/fmt".to_string(),
            Endpoint::Share => "/share".to_string(),
            Endpoint::Download(id) => format!("/p/{}", with_source_extension(id)),
            Endpoint::Version => "/version".to_string(),
        }
    }

    /// Operation name used in error messages.
    pub fn operation(&self) -> &'static str {
        match self {
            Endpoint::Compile => "run",
            Endpoint::Format => "format",
            Endpoint::Share => "share",
            Endpoint::Download(_) => "download",
            Endpoint::Version => "version",
        }
    }
}

/// Append [`SOURCE_EXTENSION`] unless `id` already ends with it.
fn with_source_extension(id: &str) -> String {
    if id.ends_with(SOURCE_EXTENSION) {
        id.to_string()
    } else {
        format!("{id}{SOURCE_EXTENSION}")
    }
}

/// Everything a [`crate::api::Client`] needs to reach the playground.
///
/// Built once per invocation with the `with_*` methods and never mutated
/// afterwards. Roots are absolute URLs stored without a trailing slash.
#[derive(Clone)]
pub struct ClientConfig {
    service_root: String,
    frontend_root: String,
    backend: Backend,
    /// `None` until a caller supplies one; requests then go through
    /// [`DEFAULT_TRANSPORT`].
    transport: Option<Arc<dyn Transport>>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            service_root: DEFAULT_SERVICE_ROOT.to_string(),
            frontend_root: DEFAULT_FRONTEND_ROOT.to_string(),
            backend: Backend::Default,
            transport: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("service_root", &self.service_root)
            .field("frontend_root", &self.frontend_root)
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the API root. Fails unless `root` is an absolute URL with a
    /// host.
    pub fn with_service_root(mut self, root: &str) -> Result<Self> {
        self.service_root = normalize_root(root)?;
        Ok(self)
    }

    /// Override the front-end root used to recognise share links.
    pub fn with_frontend_root(mut self, root: &str) -> Result<Self> {
        self.frontend_root = normalize_root(root)?;
        Ok(self)
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_transport(self, transport: impl Transport + 'static) -> Self {
        self.with_shared_transport(Arc::new(transport))
    }

    pub fn with_shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn frontend_root(&self) -> &str {
        &self.frontend_root
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        match &self.transport {
            Some(transport) => transport.as_ref(),
            None => DEFAULT_TRANSPORT.get_or_init(ReqwestTransport::default),
        }
    }

    /// API root with the backend variant applied.
    ///
    /// A non-default backend is prepended to the host
    /// (`play.golang.org` becomes `gotipplay.golang.org`); scheme, port and
    /// path are kept. A root that cannot be rewritten is returned as is.
    pub fn service_root(&self) -> String {
        if self.backend.is_default() {
            return self.service_root.clone();
        }
        let Ok(mut url) = Url::parse(&self.service_root) else {
            return self.service_root.clone();
        };
        let Some(host) = url.host_str() else {
            return self.service_root.clone();
        };
        let prefixed = format!("{}{}", self.backend.as_str(), host);
        if url.set_host(Some(&prefixed)).is_err() {
            return self.service_root.clone();
        }
        url.as_str().trim_end_matches('/').to_string()
    }

    /// Fully qualified URL of `endpoint`. Pure: no I/O, same answer for the
    /// same inputs.
    pub fn resolve(&self, endpoint: &Endpoint) -> String {
        format!("{}{}", self.service_root(), endpoint.path())
    }
}

/// Operation name for errors raised while building a config.
const CONFIGURE: &str = "configure";

fn normalize_root(root: &str) -> Result<String> {
    let trimmed = root.trim().trim_end_matches('/');
    let url =
        Url::parse(trimmed).map_err(|err| ClientError::invalid_url(CONFIGURE, trimmed, err))?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ClientError::invalid_url(
            CONFIGURE,
            trimmed,
            url::ParseError::EmptyHost,
        ));
    }
    Ok(trimmed.to_string())
}
