// Download target resolution.
//
// Users paste one of three things: a raw API link (`<root>/p/<id>.go`), a
// front-end share link (`https://go.dev/play/p/<id>`), or a bare id. All of
// them end up as the raw source URL under the API root.

use crate::config::{ClientConfig, Endpoint, SOURCE_EXTENSION};
use std::fmt;
use url::Url;

/// Snippet id together with the absolute URL its raw source is fetched from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadTarget {
    id: String,
    url: String,
}

impl DownloadTarget {
    fn new(config: &ClientConfig, id: &str) -> Self {
        let id = id.strip_suffix(SOURCE_EXTENSION).unwrap_or(id).to_string();
        let url = config.resolve(&Endpoint::Download(id.clone()));
        DownloadTarget { id, url }
    }

    /// Snippet id, without the source extension.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The download endpoint for this snippet.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::Download(self.id.clone())
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn into_string(self) -> String {
        self.url
    }
}

impl fmt::Display for DownloadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Resolve a hash or share URL to the raw source URL. First match wins:
///
/// 1. already a raw link under the API root: keep it, adding `.go` if
///    missing;
/// 2. a front-end share link: rebuild from its last path segment;
/// 3. anything else is taken as a bare id.
pub fn canonicalize_download_target(config: &ClientConfig, hash_or_url: &str) -> DownloadTarget {
    let input = hash_or_url.trim();

    let raw_prefix = format!("{}/p/", config.service_root());
    if let Some(id) = input.strip_prefix(&raw_prefix) {
        return DownloadTarget::new(config, id);
    }

    if input.starts_with(&format!("{}/p/", config.frontend_root())) {
        if let Some(id) = share_id(input) {
            return DownloadTarget::new(config, &id);
        }
    }

    DownloadTarget::new(config, input)
}

/// Last non-empty path segment of a share link.
fn share_id(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    let id = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
    Some(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Backend;

    fn canonical(config: &ClientConfig, input: &str) -> String {
        canonicalize_download_target(config, input).into_string()
    }

    #[test]
    fn bare_hash() {
        let config = ClientConfig::new();
        assert_eq!(canonical(&config, "abc123"), "https://play.golang.org/p/abc123.go");
    }

    #[test]
    fn frontend_link() {
        let config = ClientConfig::new();
        assert_eq!(
            canonical(&config, "https://go.dev/play/p/abc123"),
            "https://play.golang.org/p/abc123.go"
        );
    }

    #[test]
    fn frontend_link_with_extension_query_and_slash() {
        let config = ClientConfig::new();
        assert_eq!(
            canonical(&config, "https://go.dev/play/p/abc123.go"),
            "https://play.golang.org/p/abc123.go"
        );
        assert_eq!(
            canonical(&config, "https://go.dev/play/p/abc123?v=gotip"),
            "https://play.golang.org/p/abc123.go"
        );
        assert_eq!(
            canonical(&config, "https://go.dev/play/p/abc123/"),
            "https://play.golang.org/p/abc123.go"
        );
    }

    #[test]
    fn raw_link_is_completed() {
        let config = ClientConfig::new();
        assert_eq!(
            canonical(&config, "https://play.golang.org/p/abc123"),
            "https://play.golang.org/p/abc123.go"
        );
    }

    #[test]
    fn canonical_form_is_a_fixed_point() {
        let config = ClientConfig::new();
        for input in ["abc123", "https://go.dev/play/p/abc123", "abc123.go"] {
            let once = canonical(&config, input);
            assert_eq!(once, "https://play.golang.org/p/abc123.go");
            assert_eq!(canonical(&config, &once), once);
        }
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let config = ClientConfig::new();
        assert_eq!(canonical(&config, "  abc123\n"), "https://play.golang.org/p/abc123.go");
    }

    #[test]
    fn gotip_backend_downloads_from_prefixed_host() {
        let config = ClientConfig::new().with_backend(Backend::Gotip);
        assert_eq!(
            canonical(&config, "https://go.dev/play/p/abc123"),
            "https://gotipplay.golang.org/p/abc123.go"
        );
        assert_eq!(
            canonical(&config, "https://gotipplay.golang.org/p/abc123"),
            "https://gotipplay.golang.org/p/abc123.go"
        );
    }

    #[test]
    fn every_form_resolves_through_the_download_endpoint() {
        for config in [
            ClientConfig::new(),
            ClientConfig::new().with_backend(Backend::Gotip),
        ] {
            let raw_link = format!("{}/p/abc123", config.service_root());
            for input in [
                "abc123",
                "abc123.go",
                "https://go.dev/play/p/abc123",
                "https://go.dev/play/p/abc123.go?v=gotip",
                raw_link.as_str(),
            ] {
                let target = canonicalize_download_target(&config, input);
                assert_eq!(target.id(), "abc123", "{input}");
                assert_eq!(target.endpoint(), Endpoint::Download("abc123".into()));
                assert_eq!(
                    target.as_str(),
                    config.resolve(&Endpoint::Download("abc123".into())),
                    "{input}"
                );
            }
        }
    }

    #[test]
    fn custom_frontend_root() {
        let config = ClientConfig::new()
            .with_frontend_root("https://play.example.com/")
            .unwrap();
        assert_eq!(
            canonical(&config, "https://play.example.com/p/xyz"),
            "https://play.golang.org/p/xyz.go"
        );
    }
}
