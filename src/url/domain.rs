use url::Url;

/// Extracts the domain from a URL
///
/// The host portion of the URL is returned in lowercase. If the URL has no
/// host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use portal_scout::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.go.kr/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.go.kr".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Strips a leading `www.` so `www.example.go.kr` and `example.go.kr` compare equal
fn site_host(url: &Url) -> Option<String> {
    extract_domain(url).map(|host| match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    })
}

/// Returns true if both URLs belong to the same site
///
/// Hosts are compared case-insensitively and a leading `www.` is ignored.
/// Scheme and port are not part of the comparison.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use portal_scout::url::is_same_site;
///
/// let a = Url::parse("https://www.example.go.kr/").unwrap();
/// let b = Url::parse("http://example.go.kr/board").unwrap();
/// let c = Url::parse("https://other.go.kr/").unwrap();
/// assert!(is_same_site(&a, &b));
/// assert!(!is_same_site(&a, &c));
/// ```
pub fn is_same_site(a: &Url, b: &Url) -> bool {
    match (site_host(a), site_host(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Deduplication key for a normalized URL
///
/// Same as the URL string except that a leading `www.` on the host is dropped,
/// so `https://www.example.go.kr/b` and `https://example.go.kr/b` share a key.
pub fn site_key(url: &Url) -> String {
    let Some(host) = url.host_str() else {
        return url.as_str().to_string();
    };
    let Some(rest) = host.strip_prefix("www.") else {
        return url.as_str().to_string();
    };
    let mut folded = url.clone();
    match folded.set_host(Some(rest)) {
        Ok(()) => folded.into(),
        Err(_) => url.as_str().to_string(),
    }
}

/// Returns the origin (`scheme://host[:port]`) of a URL, used as the robots.txt cache key
pub fn origin_of(url: &Url) -> Option<String> {
    let origin = url.origin();
    if origin.is_tuple() {
        Some(origin.ascii_serialization())
    } else {
        None
    }
}

/// Builds the robots.txt URL for the origin of the given URL
pub fn robots_url(url: &Url) -> Option<Url> {
    let origin = origin_of(url)?;
    Url::parse(&format!("{}/robots.txt", origin)).ok()
}
