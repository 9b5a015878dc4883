//! LRU-encoded URL prefixes.
//!
//! An LRU is a hierarchically ordered rendition of a URL: scheme first,
//! then host labels from the TLD inward, then port, path segments, query
//! and fragment. Written this way, "is this page inside this web
//! entity" becomes a plain string-prefix test.
//!
//! `http://example.org/blog/` encodes as `s:http|h:org|h:example|p:blog|`.

use crate::error::{CoreError, Result};
use url::Url;

/// Encode a URL into its LRU prefix form.
pub fn lru_from_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw.trim())
        .map_err(|e| CoreError::validation("prefix", format!("invalid URL: {}", e)))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(CoreError::validation(
                "prefix",
                format!("unsupported scheme: {}", other),
            ));
        }
    }

    let host = url
        .host_str()
        .ok_or_else(|| CoreError::validation("prefix", "URL has no host"))?;

    let mut lru = String::new();
    lru.push_str(&format!("s:{}|", url.scheme()));
    for label in host.split('.').rev() {
        if !label.is_empty() {
            lru.push_str(&format!("h:{}|", label));
        }
    }
    if let Some(port) = url.port() {
        lru.push_str(&format!("t:{}|", port));
    }
    for segment in url.path().split('/') {
        if !segment.is_empty() {
            lru.push_str(&format!("p:{}|", segment));
        }
    }
    if let Some(query) = url.query() {
        lru.push_str(&format!("q:{}|", query));
    }
    if let Some(fragment) = url.fragment() {
        lru.push_str(&format!("f:{}|", fragment));
    }

    Ok(lru)
}

/// Revert an LRU back to a plain URL. Returns None when the input is
/// not a well-formed LRU (missing scheme or host stanzas).
pub fn url_from_lru(lru: &str) -> Option<String> {
    let mut scheme = None;
    let mut host_labels: Vec<&str> = Vec::new();
    let mut port = None;
    let mut path_segments: Vec<&str> = Vec::new();
    let mut query = None;
    let mut fragment = None;

    for stanza in lru.split('|').filter(|s| !s.is_empty()) {
        let (marker, value) = stanza.split_once(':')?;
        match marker {
            "s" => scheme = Some(value),
            "h" => host_labels.push(value),
            "t" => port = Some(value),
            "p" => path_segments.push(value),
            "q" => query = Some(value),
            "f" => fragment = Some(value),
            _ => return None,
        }
    }

    let scheme = scheme?;
    if host_labels.is_empty() {
        return None;
    }
    host_labels.reverse();

    let mut url = format!("{}://{}", scheme, host_labels.join("."));
    if let Some(port) = port {
        url.push_str(&format!(":{}", port));
    }
    url.push('/');
    if !path_segments.is_empty() {
        url.push_str(&path_segments.join("/"));
        url.push('/');
    }
    if let Some(query) = query {
        url.push_str(&format!("?{}", query));
    }
    if let Some(fragment) = fragment {
        url.push_str(&format!("#{}", fragment));
    }

    Some(url)
}

/// Accept either a plain URL or an already-encoded LRU, returning the
/// LRU form. Used by CLI/TUI entry points so curators can paste either.
pub fn coerce_to_lru(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.starts_with("s:") {
        // Looks like an LRU already; make sure it reverts.
        if url_from_lru(trimmed).is_none() {
            return Err(CoreError::validation("prefix", "malformed LRU"));
        }
        return Ok(trimmed.to_string());
    }
    lru_from_url(trimmed)
}

/// Prefix containment on the LRU form.
pub fn is_prefix_of(prefix: &str, lru: &str) -> bool {
    lru.starts_with(prefix)
}
