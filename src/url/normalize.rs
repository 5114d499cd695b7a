use crate::UrlError;
use url::Url;

/// Normalizes a URL for frontier identity
///
/// Work items are deduplicated by exact URL string, so every URL entering the
/// frontier goes through the same normalization:
///
/// 1. Parse; reject if malformed
/// 2. Reject non-http(s) schemes
/// 3. Reject URLs without a host
/// 4. Strip the fragment
///
/// The path and query are kept as-is; the host is lowercased by the parser.
///
/// # Examples
///
/// ```
/// use leadtrawl::url::normalize_url;
///
/// let url = normalize_url("https://Example.com/About#team").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/About");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    Ok(url)
}

/// Resolves a link found on a page to an absolute, normalized URL
///
/// Relative hrefs are joined against the page URL. Links that are malformed,
/// non-http(s), or resolve back to the page itself are dropped.
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let absolute = match Url::parse(href) {
        Ok(url) => url,
        Err(_) => base.join(href).ok()?,
    };

    let mut resolved = normalize_url(absolute.as_str()).ok()?;
    resolved.set_fragment(None);

    if resolved == *base {
        return None;
    }

    Some(resolved)
}
