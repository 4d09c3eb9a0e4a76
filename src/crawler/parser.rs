//! DOM analysis of a rendered page
//!
//! This module extracts from a page snapshot:
//! - the title and outbound links
//! - the page type (list, search, category, homepage, content)
//! - metadata (breadcrumb, last-modified date, content flags, language)
//!
//! Everything here is synchronous: `scraper::Html` is not `Send`, so a parsed
//! document must never be held across an await point.

use crate::crawler::detect_language;
use crate::state::{PageMetadata, PageType};
use crate::url::{is_asset_url, is_same_site, normalize_url, path_extension, site_key};
use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

/// Extensions of downloadable documents and archives
pub(crate) const ATTACHMENT_EXTENSIONS: &[&str] = &[
    "pdf", "hwp", "hwpx", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "zip", "rar", "7z", "txt",
    "csv", "odt",
];

const LIST_SELECTORS: &str = ".board-list, .board_list, .boardList, .bbs-list, .bbs_list, \
     .bbsList, table.board, table.bbs, .list-board, .tbl-board";

const SEARCH_SELECTORS: &str = ".search-result, .search_result, .searchResult, #searchResult, \
     main form[role='search'], main input[type='search'], #content input[type='search'], \
     #contents input[type='search']";

const NAVIGATION_LINKS: &str =
    "nav a, .lnb a, .snb a, .sub-menu a, .submenu a, .side-menu a, .sitemap a";

const ARTICLE_SELECTORS: &str = "article, .article, #article, .view, .board-view, .board_view, \
     .bbs-view, .bbs_view, .view-content, .content-view";

const BREADCRUMB_SELECTORS: &str = ".breadcrumb, .breadcrumbs, .location, #location, \
     nav[aria-label='breadcrumb'], .path";

pub(crate) const ATTACHMENT_CONTAINERS: &str = ".attach, .attachment, .file, .file-list, .fileList, .add-file";

/// Paragraph text at or above this length counts as article content
const ARTICLE_TEXT_CHARS: usize = 200;

/// Navigation links needed before a page without article content is a category
const CATEGORY_MIN_NAV_LINKS: usize = 3;

/// Information extracted from one page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// `<title>`, falling back to the first `<h1>`
    pub title: Option<String>,

    /// Absolute http(s) links in document order, not yet normalized
    pub links: Vec<Url>,

    pub page_type: PageType,
    pub metadata: PageMetadata,

    /// Visible body text with whitespace collapsed
    pub text: String,
}

/// Which discovered links a crawl may follow
#[derive(Debug, Clone, Copy)]
pub struct LinkScope<'a> {
    /// Any URL of the crawled site; links are compared against its host
    pub site: &'a Url,
    pub follow_external: bool,
    pub include_assets: bool,
}

pub(crate) fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Collapses runs of whitespace into single spaces
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Parses a page snapshot
///
/// # Example
///
/// ```
/// use portal_scout::crawler::parse_page;
/// use portal_scout::PageType;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let url = Url::parse("https://example.go.kr/").unwrap();
/// let parsed = parse_page(html, &url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links[0].as_str(), "https://example.go.kr/page");
/// assert_eq!(parsed.page_type, PageType::Homepage);
/// ```
pub fn parse_page(html: &str, page_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);
    let text = visible_text(&document);

    ParsedPage {
        title: extract_title(&document),
        links: extract_links(&document, page_url),
        page_type: determine_page_type(&document, page_url),
        metadata: extract_metadata(&document, page_url, &text),
        text,
    }
}

/// Extracts the page title from `<title>`, else the first `<h1>`
pub fn extract_title(document: &Html) -> Option<String> {
    ["title", "h1"].iter().find_map(|css| {
        let sel = selector(css)?;
        document
            .select(&sel)
            .next()
            .map(element_text)
            .filter(|s| !s.is_empty())
    })
}

/// Text of the body, skipping script, style and template content
pub fn visible_text(document: &Html) -> String {
    collapse_whitespace(&raw_visible_text(document))
}

/// Like `visible_text`, with the original whitespace of each text node kept
pub(crate) fn raw_visible_text(document: &Html) -> String {
    let Some(body_sel) = selector("body") else {
        return String::new();
    };
    let Some(body) = document.select(&body_sel).next() else {
        return String::new();
    };

    let mut parts = Vec::new();
    for node in body.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .map(|e| matches!(e.name(), "script" | "style" | "noscript" | "template"))
                .unwrap_or(false)
        });
        if !hidden {
            parts.push(&**text);
        }
    }

    parts.join(" ").trim().to_string()
}

/// Extracts all followable links from the document
///
/// **Include:** `<a href>` anywhere and `<link rel="canonical">`.
///
/// **Exclude:** `download` anchors, `javascript:`, `mailto:`, `tel:` and
/// `data:` links, fragment-only links, and anything that does not resolve to
/// http(s).
pub fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut links = Vec::new();

    if let Some(a_selector) = selector("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }
            if let Some(url) = element.value().attr("href").and_then(|h| resolve_link(h, base_url)) {
                links.push(url);
            }
        }
    }

    if let Some(canonical) = selector("link[rel='canonical'][href]") {
        for element in document.select(&canonical) {
            if let Some(url) = element.value().attr("href").and_then(|h| resolve_link(h, base_url)) {
                links.push(url);
            }
        }
    }

    links
}

/// Resolves a link href against the base URL
pub(crate) fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute),
        _ => None,
    }
}

/// Normalizes links and keeps the in-scope ones, first occurrence wins
pub fn discover_links(links: &[Url], scope: &LinkScope<'_>) -> Vec<Url> {
    let mut seen = HashSet::new();
    let mut discovered = Vec::new();

    for link in links {
        let normalized = match normalize_url(link.as_str()) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Failed to normalize URL {}: {}", link, e);
                continue;
            }
        };

        if !scope.follow_external && !is_same_site(scope.site, &normalized) {
            continue;
        }
        if !scope.include_assets && is_asset_url(&normalized) {
            continue;
        }
        if seen.insert(site_key(&normalized)) {
            discovered.push(normalized);
        }
    }

    discovered
}

/// Classifies a page
///
/// Checks run in order and the first match wins: board/list markup, search
/// page, navigation without article content, site root, and content for
/// everything else.
pub fn determine_page_type(document: &Html, url: &Url) -> PageType {
    if is_list_page(document) {
        PageType::List
    } else if is_search_page(document, url) {
        PageType::Search
    } else if is_category_page(document) {
        PageType::Category
    } else if is_homepage(url) {
        PageType::Homepage
    } else {
        PageType::Content
    }
}

fn has_match(document: &Html, css: &str) -> bool {
    selector(css)
        .map(|sel| document.select(&sel).next().is_some())
        .unwrap_or(false)
}

fn count_matches(document: &Html, css: &str) -> usize {
    selector(css)
        .map(|sel| document.select(&sel).count())
        .unwrap_or(0)
}

fn is_list_page(document: &Html) -> bool {
    if has_match(document, LIST_SELECTORS) {
        return true;
    }

    // A table whose header has a title column and at least two data rows
    let (Some(table_sel), Some(th_sel), Some(row_sel)) =
        (selector("table"), selector("th"), selector("tr"))
    else {
        return false;
    };
    let Some(td_sel) = selector("td") else {
        return false;
    };

    document.select(&table_sel).any(|table| {
        let titled = table.select(&th_sel).any(|th| {
            let text = element_text(th).to_lowercase();
            text == "제목" || text == "title"
        });
        let data_rows = table
            .select(&row_sel)
            .filter(|row| row.select(&td_sel).next().is_some())
            .count();
        titled && data_rows >= 2
    })
}

fn is_search_page(document: &Html, url: &Url) -> bool {
    url.path().to_lowercase().contains("search") || has_match(document, SEARCH_SELECTORS)
}

fn is_category_page(document: &Html) -> bool {
    if count_matches(document, NAVIGATION_LINKS) < CATEGORY_MIN_NAV_LINKS {
        return false;
    }
    !has_article_content(document)
}

fn has_article_content(document: &Html) -> bool {
    if has_match(document, ARTICLE_SELECTORS) {
        return true;
    }
    let Some(p_sel) = selector("p") else {
        return false;
    };
    let paragraph_chars: usize = document
        .select(&p_sel)
        .map(|p| element_text(p).chars().count())
        .sum();
    paragraph_chars >= ARTICLE_TEXT_CHARS
}

fn is_homepage(url: &Url) -> bool {
    matches!(url.path(), "" | "/")
}

/// Extracts page metadata; `text` is the page's visible text
pub fn extract_metadata(document: &Html, page_url: &Url, text: &str) -> PageMetadata {
    let breadcrumb = extract_breadcrumb(document);
    let category = if breadcrumb.len() >= 2 {
        breadcrumb.get(breadcrumb.len() - 2).cloned()
    } else {
        None
    };

    PageMetadata {
        category,
        breadcrumb,
        last_modified: extract_last_modified(document, text),
        content_length: Some(text.chars().count()),
        has_images: has_match(document, "body img[src]"),
        has_attachments: has_attachments(document, page_url),
        has_table: has_match(document, "table td"),
        language: detect_language(text),
    }
}

/// Breadcrumb items from the first breadcrumb container
///
/// List items are used when present; otherwise the container text is split on
/// the usual separators.
pub fn extract_breadcrumb(document: &Html) -> Vec<String> {
    let Some(container_sel) = selector(BREADCRUMB_SELECTORS) else {
        return Vec::new();
    };
    let Some(container) = document.select(&container_sel).next() else {
        return Vec::new();
    };

    let items: Vec<String> = match selector("li") {
        Some(li) if container.select(&li).next().is_some() => {
            container.select(&li).map(element_text).collect()
        }
        _ => element_text(container)
            .split(['>', '›', '»', '/', '＞'])
            .map(collapse_whitespace)
            .collect(),
    };

    let mut breadcrumb: Vec<String> = Vec::new();
    for item in items.into_iter().filter(|i| !i.is_empty()) {
        if breadcrumb.last() != Some(&item) {
            breadcrumb.push(item);
        }
    }
    breadcrumb
}

fn labeled_date_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(?:최종\s*수정일|수정일|등록일|작성일|게시일|last\s*modified|last\s*updated|updated|modified|posted)\s*[:：]?\s*(\d{4})\s*[.\-/년]\s*(\d{1,2})\s*[.\-/월]\s*(\d{1,2})",
        )
        .ok()
    })
    .as_ref()
}

fn date_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{4})[.\-/](\d{1,2})[.\-/](\d{1,2})").ok())
        .as_ref()
}

fn date_from_captures(caps: &regex::Captures<'_>) -> Option<NaiveDate> {
    let year = caps.get(1)?.as_str().parse().ok()?;
    let month = caps.get(2)?.as_str().parse().ok()?;
    let day = caps.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Best-effort last-modified date
///
/// The first date following a modified/registered label in the text wins;
/// otherwise a `last-modified` style meta tag is used.
pub fn extract_last_modified(document: &Html, text: &str) -> Option<NaiveDate> {
    if let Some(date) = labeled_date_regex()
        .and_then(|re| re.captures_iter(text).find_map(|c| date_from_captures(&c)))
    {
        return Some(date);
    }

    let meta_sel = selector(
        "meta[name='last-modified'], meta[http-equiv='last-modified'], \
         meta[property='article:modified_time'], meta[name='date']",
    )?;
    let re = date_regex()?;
    document
        .select(&meta_sel)
        .filter_map(|m| m.value().attr("content"))
        .find_map(|content| re.captures(content).and_then(|c| date_from_captures(&c)))
}

/// Whether a URL points at a downloadable document or archive
pub fn is_attachment_url(url: &Url) -> bool {
    path_extension(url)
        .map(|ext| ATTACHMENT_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

fn has_attachments(document: &Html, page_url: &Url) -> bool {
    if has_match(document, ATTACHMENT_CONTAINERS) {
        return true;
    }
    let Some(a_sel) = selector("a[href]") else {
        return false;
    };
    document.select(&a_sel).any(|a| {
        a.value()
            .attr("href")
            .and_then(|h| resolve_link(h, page_url))
            .map(|u| is_attachment_url(&u))
            .unwrap_or(false)
    })
}
