use url::Url;

/// Extracts the domain from a URL
///
/// Returns the lowercase host portion, which is what work items carry as
/// their origin domain and what internal/external link classification
/// compares against.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use leadtrawl::url::extract_domain;
///
/// let url = Url::parse("https://blog.example.com/post").unwrap();
/// assert_eq!(extract_domain(&url), Some("blog.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
