// Library root
// -----------
// This crate exposes the Go Playground client used by the `gp` binary.
//
// Module responsibilities:
// - `api`: one method per playground operation (run, format, share,
//   download, version) and the result types they decode.
// - `config`: client configuration and endpoint resolution.
// - `download`: turns a hash or share link into the raw source URL.
// - `source`: the program text in its accepted shapes.
// - `transport`: the HTTP seam; reqwest in production, closures in tests.
// - `error`: the error taxonomy of the client.
// - `txtar`: multi-file bundles as stored by the playground.
// - `settings`: config file and flag layering for the CLI.
// - `ui`: terminal flows for each subcommand.
pub mod api;
pub mod config;
pub mod download;
pub mod error;
pub mod settings;
pub mod source;
pub mod transport;
pub mod txtar;
pub mod ui;

pub use api::{Client, EventKind, FormatResult, RunEvent, RunResult, ShareResult, VersionResult};
pub use config::{Backend, ClientConfig, Endpoint};
pub use download::{canonicalize_download_target, DownloadTarget};
pub use error::{BoxError, ClientError};
pub use source::SourceInput;
pub use transport::{FnTransport, HttpRequest, HttpResponse, RequestBody, ReqwestTransport, Transport};
