//! Virtual host name splitting.
//!
//! # Responsibilities
//! - Drop the port from a `host:port` Host header
//! - Strip the configured base domain to recover the tenant key
//!
//! # Design Decisions
//! - Byte-literal comparison, no case folding
//! - A host outside the base domain is used unchanged as the tenant key;
//!   the directory's `default` fallback then decides where it goes

use crate::error::ResolveError;

/// Extract the tenant key from a Host header value.
///
/// ```text
/// host:        example.foo.bar.127.0.0.1.xip.io:3344
/// base domain:                 127.0.0.1.xip.io
/// tenant:      example.foo.bar
/// ```
pub fn split_virtual_host(host_header: &str, base_domain: &str) -> Result<String, ResolveError> {
    let host = if host_header.contains(':') {
        let (host, _port) =
            split_host_port(host_header).map_err(|reason| ResolveError::HostParse {
                host: host_header.to_string(),
                reason,
            })?;
        host
    } else {
        host_header
    };

    let suffix = format!(".{base_domain}");
    Ok(host.strip_suffix(suffix.as_str()).unwrap_or(host).to_string())
}

/// Split `host:port`, `[ipv6]:port` or `:port` into host and port.
///
/// The port may be empty. Brackets are removed from IPv6 literals.
pub fn split_host_port(hostport: &str) -> Result<(&str, &str), &'static str> {
    let colon = hostport.rfind(':').ok_or("missing port in address")?;

    let (host, host_start, port_search_start) = if hostport.starts_with('[') {
        let end = hostport.find(']').ok_or("missing ']' in address")?;
        if end + 1 == hostport.len() {
            return Err("missing port in address");
        }
        if end + 1 != colon {
            return Err(if hostport.as_bytes()[end + 1] == b':' {
                "too many colons in address"
            } else {
                "missing port in address"
            });
        }
        (&hostport[1..end], 1, end + 1)
    } else {
        let host = &hostport[..colon];
        if host.contains(':') {
            return Err("too many colons in address");
        }
        (host, 0, 0)
    };

    if hostport[host_start..].contains('[') {
        return Err("unexpected '[' in address");
    }
    if hostport[port_search_start..].contains(']') {
        return Err("unexpected ']' in address");
    }

    Ok((host, &hostport[colon + 1..]))
}
