//! Destination URL construction.
//!
//! Turns a raw destination pattern from the directory into the URL a request
//! is forwarded to. Patterns follow `[scheme"://"]host[":"port][path][?query]`
//! and may contain the `{}` placeholder anywhere:
//!
//! ```text
//! "example.com"                     → http://example.com:<default port>
//! "http://example.com:9999"         → http://example.com:9999
//! "http://example.com/target?q=foo" → http://example.com:<default port>/target?q=foo
//! "http://example.com/{}/path"      → http://example.com:<default port>/<tenant>/path
//! ```
//!
//! The inbound path replaces the pattern's path whenever it is not `/`. That
//! happens before placeholder substitution, so a placeholder in the pattern's
//! path only survives for requests to `/`.

use std::fmt;

use axum::http::Uri;

use crate::directory::Directory;
use crate::error::ResolveError;

/// Token replaced by the tenant key.
pub const PLACEHOLDER: &str = "{}";

/// A destination split into the parts the router cares about.
///
/// Components are kept exactly as written: no normalization, no decoding.
/// `host` includes the port when there is one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationUrl {
    scheme: String,
    host: String,
    path: String,
    query: String,
}

impl DestinationUrl {
    /// Parse an absolute `scheme://host[:port][path][?query]` string.
    /// A `#fragment` is discarded.
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let invalid = |reason: &str| ResolveError::DestinationParse {
            url: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.chars().any(|c| c.is_ascii_control() || c == ' ') {
            return Err(invalid("invalid control character or space in URL"));
        }

        let (scheme, rest) = raw
            .split_once("://")
            .ok_or_else(|| invalid("missing protocol scheme"))?;
        if !is_valid_scheme(scheme) {
            return Err(invalid("invalid protocol scheme"));
        }

        let rest = rest.split_once('#').map_or(rest, |(before, _)| before);
        let authority_end = rest.find(|c: char| c == '/' || c == '?').unwrap_or(rest.len());
        let (authority, remainder) = rest.split_at(authority_end);
        let (path, query) = remainder.split_once('?').unwrap_or((remainder, ""));

        // Userinfo is never forwarded.
        let host = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
        validate_host(host).map_err(invalid)?;

        Ok(Self {
            scheme: scheme.to_ascii_lowercase(),
            host: host.to_string(),
            path: path.to_string(),
            query: query.to_string(),
        })
    }

    /// Host, including `:port` when present. Userinfo is not kept.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Path as written; empty when the URL has none.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the host already carries a port.
    pub fn has_port(&self) -> bool {
        self.host.contains(':')
    }

    /// Origin-form request target: the path (at least `/`) plus the query.
    pub fn request_target(&self) -> String {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        if self.query.is_empty() {
            path.to_string()
        } else {
            format!("{}?{}", path, self.query)
        }
    }

    /// Absolute URI for the outbound request, with `target` as path and query.
    pub fn to_uri(&self, target: &str) -> Result<Uri, ResolveError> {
        let invalid = |reason: String| ResolveError::DestinationParse {
            url: self.to_string(),
            reason,
        };

        if self.host.is_empty() || self.host.starts_with(':') {
            return Err(invalid("missing host".to_string()));
        }

        Uri::builder()
            .scheme(self.scheme.as_str())
            .authority(self.host.as_str())
            .path_and_query(target)
            .build()
            .map_err(|e| invalid(e.to_string()))
    }

    fn set_path(&mut self, path: &str) {
        // Braces in an inbound path must not turn into placeholders.
        let escaped = path.replace('{', "%7B").replace('}', "%7D");
        self.path = if escaped.starts_with('/') || escaped.is_empty() {
            escaped
        } else {
            format!("/{escaped}")
        };
    }
}

impl fmt::Display for DestinationUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.host, self.path)?;
        if !self.query.is_empty() {
            write!(f, "?{}", self.query)?;
        }
        Ok(())
    }
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

/// Checks the optional port of `host[:port]`.
fn validate_host(host: &str) -> Result<(), &'static str> {
    let port = if host.starts_with('[') {
        let end = host.find(']').ok_or("missing ']' in host")?;
        &host[end + 1..]
    } else {
        host.rfind(':').map_or("", |i| &host[i..])
    };

    if port.is_empty() {
        return Ok(());
    }
    match port.strip_prefix(':') {
        Some(digits) if digits.bytes().all(|b| b.is_ascii_digit()) => Ok(()),
        _ => Err("invalid port after host"),
    }
}

/// Build the final destination from a raw pattern.
///
/// Pure: the same inputs always produce the same URL.
pub fn build_destination(
    raw_dest: &str,
    tenant: &str,
    original_path: &str,
    default_port: u16,
) -> Result<DestinationUrl, ResolveError> {
    let mut dest = if raw_dest.contains("://") {
        raw_dest.to_string()
    } else {
        format!("http://{raw_dest}")
    };

    if original_path != "/" {
        let mut url = DestinationUrl::parse(&dest)?;
        url.set_path(original_path);
        dest = url.to_string();
    }

    let substituted = dest.replace(PLACEHOLDER, tenant);
    let parsed = DestinationUrl::parse(&substituted)?;

    let host_port = if parsed.has_port() {
        parsed.host.clone()
    } else {
        format!("{}:{}", parsed.host, default_port)
    };

    let mut assembled = format!("{}://{}{}", parsed.scheme, host_port, parsed.path);
    if !parsed.query.is_empty() {
        assembled.push('?');
        assembled.push_str(&parsed.query);
    }

    let resolved = DestinationUrl::parse(&assembled)?;
    resolved.to_uri(&resolved.request_target())?;
    Ok(resolved)
}

/// Look up `tenant` in the directory and build its destination.
pub async fn resolve_destination(
    tenant: &str,
    directory: &dyn Directory,
    original_path: &str,
    default_port: u16,
) -> Result<DestinationUrl, ResolveError> {
    let raw_dest = directory
        .get(tenant)
        .await
        .map_err(|source| ResolveError::UpstreamLookup {
            key: tenant.to_string(),
            source,
        })?;

    if raw_dest.is_empty() {
        return Err(ResolveError::NoUpstream {
            key: tenant.to_string(),
        });
    }

    build_destination(&raw_dest, tenant, original_path, default_port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::MemoryDirectory;

    fn build(raw: &str, tenant: &str, path: &str, port: u16) -> String {
        build_destination(raw, tenant, path, port).unwrap().to_string()
    }

    #[test]
    fn test_default_port_appended() {
        assert_eq!(
            build("http://example.com", "Virtual.Host.Name", "/", 9999),
            "http://example.com:9999"
        );
    }

    #[test]
    fn test_scheme_defaults_to_http() {
        assert_eq!(build("example.com", "t", "/", 9999), "http://example.com:9999");
        assert_eq!(build("https://example.com", "t", "/", 443), "https://example.com:443");
    }

    #[test]
    fn test_explicit_port_kept() {
        assert_eq!(
            build("http://example.com:5555", "Virtual.Host.Name", "/", 9999),
            "http://example.com:5555"
        );
        let dest = build_destination("example.com:5555", "t", "/", 9999).unwrap();
        assert_eq!(dest.host(), "example.com:5555");
    }

    #[test]
    fn test_query_preserved_without_path() {
        let dest = build_destination("http://example.com?q1=foo&q2=bar", "t", "/", 9999).unwrap();
        assert_eq!(dest.to_string(), "http://example.com:9999?q1=foo&q2=bar");
        assert_eq!(dest.path(), "");
        assert_eq!(dest.request_target(), "/?q1=foo&q2=bar");
    }

    #[test]
    fn test_every_placeholder_replaced() {
        assert_eq!(
            build("http://example.com/{}/foo/{}", "Virtual.Host.Name", "/", 9999),
            "http://example.com:9999/Virtual.Host.Name/foo/Virtual.Host.Name"
        );
        let dest = build_destination("example.com/{}/foo/{}", "x", "/", 9999).unwrap();
        assert_eq!(dest.path(), "/x/foo/x");
    }

    #[test]
    fn test_placeholder_in_host() {
        assert_eq!(build("{}.internal:8080", "app", "/", 80), "http://app.internal:8080");
    }

    #[test]
    fn test_inbound_path_overrides_pattern_path() {
        assert_eq!(
            build("example.com:9999/target", "t", "/hello/world", 80),
            "http://example.com:9999/hello/world"
        );
        assert_eq!(
            build("example.com?q=1", "t", "/x", 9999),
            "http://example.com:9999/x?q=1"
        );
    }

    #[test]
    fn test_path_override_discards_pattern_placeholder() {
        assert_eq!(
            build("example.com/{}/foo", "tenant", "/bar", 9999),
            "http://example.com:9999/bar"
        );
    }

    #[test]
    fn test_inbound_braces_are_not_placeholders() {
        assert_eq!(build("example.com", "tenant", "/{}", 9999), "http://example.com:9999/%7B%7D");
    }

    #[test]
    fn test_bracketed_ipv6_counts_as_having_port() {
        assert_eq!(build("http://[::1]", "t", "/", 9999), "http://[::1]");
    }

    #[test]
    fn test_userinfo_dropped_before_port_default() {
        assert_eq!(build("http://user:pw@example.com", "t", "/", 9999), "http://example.com:9999");
        assert_eq!(build("http://user@example.com", "t", "/", 9999), "http://example.com:9999");
        assert_eq!(
            build("user:pw@example.com:5555/{}", "t", "/", 9999),
            "http://example.com:5555/t"
        );

        let dest = build_destination("http://user:pw@example.com", "t", "/x", 9999).unwrap();
        assert_eq!(dest.host(), "example.com:9999");
        assert!(!dest.to_string().contains("pw"));
    }

    #[test]
    fn test_invalid_destinations() {
        let invalid = [
            "http://example.com:abc",
            "1http://example.com",
            "http://exa mple.com",
            "http://",
            "http://[::1",
        ];
        for raw in invalid {
            let err = build_destination(raw, "t", "/", 80).unwrap_err();
            assert!(
                matches!(err, ResolveError::DestinationParse { .. }),
                "{raw} should fail to parse, got {err:?}"
            );
        }
    }

    #[test]
    fn test_parse_error_names_offending_url() {
        let err = build_destination("http://example.com:abc", "t", "/", 80).unwrap_err();
        assert!(err.to_string().contains("http://example.com:abc"));
    }

    #[test]
    fn test_to_uri_uses_target() {
        let dest = build_destination("example.com/a?b=c", "t", "/", 8080).unwrap();
        let uri = dest.to_uri(&dest.request_target()).unwrap();
        assert_eq!(uri.to_string(), "http://example.com:8080/a?b=c");

        let uri = dest.to_uri("/").unwrap();
        assert_eq!(uri.to_string(), "http://example.com:8080/");
    }

    #[tokio::test]
    async fn test_resolve_existing_key() {
        let directory = MemoryDirectory::with_entries("", [("exist", "http://example.com:9999")]);
        let dest = resolve_destination("exist", &directory, "/", 80).await.unwrap();
        assert_eq!(dest.to_string(), "http://example.com:9999");
    }

    #[tokio::test]
    async fn test_resolve_falls_back_to_default() {
        let directory = MemoryDirectory::new("http://example.com:9999");
        let dest = resolve_destination("missing", &directory, "/", 80).await.unwrap();
        assert_eq!(dest.to_string(), "http://example.com:9999");
    }

    #[tokio::test]
    async fn test_resolve_placeholder_uses_tenant() {
        let directory =
            MemoryDirectory::with_entries("", [("exist", "http://example.com:9999/{}/foo/{}")]);
        let dest = resolve_destination("exist", &directory, "/", 80).await.unwrap();
        assert_eq!(dest.to_string(), "http://example.com:9999/exist/foo/exist");
    }

    #[tokio::test]
    async fn test_resolve_without_upstream() {
        let directory = MemoryDirectory::new("");
        let err = resolve_destination("missing", &directory, "/", 80).await.unwrap_err();
        assert!(matches!(err, ResolveError::NoUpstream { ref key } if key == "missing"));
    }

    #[tokio::test]
    async fn test_resolve_lookup_failure() {
        let directory = MemoryDirectory::new("example.com");
        directory.close().await.unwrap();
        let err = resolve_destination("app", &directory, "/", 80).await.unwrap_err();
        assert!(matches!(err, ResolveError::UpstreamLookup { ref key, .. } if key == "app"));
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent() {
        let directory = MemoryDirectory::with_entries("", [("app", "example.com/{}?x=1")]);
        let first = resolve_destination("app", &directory, "/", 8080).await.unwrap();
        let second = resolve_destination("app", &directory, "/", 8080).await.unwrap();
        assert_eq!(first.to_string(), second.to_string());
        assert_eq!(first, second);
    }
}
