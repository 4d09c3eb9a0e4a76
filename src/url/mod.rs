//! URL handling module for Portal-Scout
//!
//! This module provides URL normalization, site-scope checks and origin
//! resolution used by the crawler, the fetch executor and the governor.

mod domain;
mod normalize;

pub use domain::{extract_domain, is_same_site, origin_of, robots_url, site_key};
pub use normalize::normalize_url;

use ::url::Url;

/// File extensions treated as assets rather than navigable pages
const ASSET_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "svg", "webp", "ico", "mp3", "mp4", "avi", "mov", "wmv",
    "woff", "woff2", "ttf", "otf", "eot", "css", "js", "pdf", "hwp", "hwpx", "doc", "docx",
    "xls", "xlsx", "ppt", "pptx", "zip", "rar", "7z", "txt", "csv",
];

/// Returns the lowercase file extension of the URL's last path segment, if any
pub fn path_extension(url: &Url) -> Option<String> {
    let last = url.path_segments()?.last()?;
    let (_, ext) = last.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_lowercase())
    }
}

/// Returns true if the URL points at an asset (image, media, font, document, archive)
///
/// # Examples
///
/// ```
/// use url::Url;
/// use portal_scout::url::is_asset_url;
///
/// assert!(is_asset_url(&Url::parse("https://example.go.kr/files/report.PDF").unwrap()));
/// assert!(!is_asset_url(&Url::parse("https://example.go.kr/board/list.do").unwrap()));
/// ```
pub fn is_asset_url(url: &Url) -> bool {
    path_extension(url)
        .map(|ext| ASSET_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}
