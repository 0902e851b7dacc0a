use url::Url;

/// A URL reduced to the two fields the classifier actually needs:
/// the canonical (lowercase, punycoded, port-stripped) host, and the
/// canonical URL string used verbatim as the subject of regex matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalUrl {
    pub host: String,
    pub url: String,
}

/// Parse and canonicalize `raw`. Returns `None` for anything that isn't
/// a URL with a host component (relative paths, `mailto:`, malformed
/// input) — callers treat `None` as "safe".
pub fn canonicalize(raw: &str) -> Option<CanonicalUrl> {
    let parsed = Url::parse(raw).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    if host.is_empty() {
        return None;
    }
    Some(CanonicalUrl {
        host,
        url: parsed.as_str().to_string(),
    })
}
