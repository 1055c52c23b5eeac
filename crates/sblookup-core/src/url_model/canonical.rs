//! URL canonicalization before lookup.

use url::{Host, Url};

use super::UrlError;

/// Returns the canonical form of a raw input URL.
///
/// Surrounding whitespace and embedded tab/CR/LF are dropped, a missing scheme
/// defaults to `http://`, only http(s) with a non-empty host is accepted. The
/// host is lowercased with stray dots removed, the path has its dot-segments
/// resolved, and any fragment is stripped.
pub fn canonicalize(raw: &str) -> Result<String, UrlError> {
    let cleaned = clean(raw);
    if cleaned.is_empty() {
        return Err(UrlError::Empty);
    }

    let with_scheme = if has_scheme(&cleaned) {
        cleaned
    } else {
        format!("http://{}", cleaned)
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| UrlError::Parse(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlError::UnsupportedScheme(other.to_string())),
    }

    let domain = match url.host() {
        None => return Err(UrlError::MissingHost),
        Some(Host::Domain(d)) => Some(normalize_host(d)),
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => None,
    };
    if let Some(domain) = domain {
        if domain.is_empty() {
            return Err(UrlError::MissingHost);
        }
        url.set_host(Some(&domain))
            .map_err(|e| UrlError::Parse(e.to_string()))?;
    }

    url.set_fragment(None);
    Ok(url.to_string())
}

/// Trims the line and drops embedded tab, CR and LF.
pub(super) fn clean(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !matches!(c, '\t' | '\r' | '\n'))
        .collect()
}

/// True when `s` starts with `scheme://`. A `://` later in the path or query
/// (redirect parameters and the like) does not count.
fn has_scheme(s: &str) -> bool {
    let Some((scheme, _)) = s.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Lowercases, trims leading/trailing dots and collapses runs of dots.
fn normalize_host(host: &str) -> String {
    host.split('.')
        .filter(|label| !label.is_empty())
        .collect::<Vec<_>>()
        .join(".")
        .to_ascii_lowercase()
}
