//! Document extraction from a page snapshot
//!
//! Builds a `ScrapedDocument` from rendered HTML, reusing the crawler's page
//! analysis for title, page type and metadata, and adds the content the
//! crawler never needs: full text, images, attachments, tables and the next
//! pagination link.

use crate::config::ScrapeOptions;
use crate::crawler::{
    collapse_whitespace, determine_page_type, element_text, extract_links, extract_metadata,
    extract_title, is_attachment_url, raw_visible_text, resolve_link, selector,
    ATTACHMENT_CONTAINERS,
};
use crate::state::{Attachment, ImageRef, Language, ScrapedDocument, Table};
use crate::url::{normalize_url, path_extension};
use chrono::Utc;
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use url::Url;

/// Anchor texts that label a "next page" link
const NEXT_LABELS: &[&str] = &["다음", "다음 페이지", "다음페이지", "next", "next page", ">"];

const NEXT_CLASS_SELECTORS: &str =
    "a.next, a.btn_next, a.pg_next, a.btn-next, .next > a, .pagination .next a, .paging .next a";

/// One extracted page and where pagination continues
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    pub document: ScrapedDocument,

    /// Next page on the same host, when pagination is followed
    pub next_page: Option<Url>,
}

/// Extracts a document from `html` served at `page_url`
pub fn extract_document(html: &str, page_url: &Url, options: &ScrapeOptions) -> ExtractedPage {
    let document = Html::parse_document(html);

    let raw_text = raw_visible_text(&document);
    let text = collapse_whitespace(&raw_text);
    let mut metadata = extract_metadata(&document, page_url, &text);

    let content = if options.process_korean_text {
        text
    } else {
        metadata.language = Language::Unknown;
        raw_text
    };

    let mut seen = HashSet::new();
    let links = extract_links(&document, page_url)
        .iter()
        .filter_map(|link| normalize_url(link.as_str()).ok())
        .map(|link| link.to_string())
        .filter(|link| seen.insert(link.clone()))
        .collect();

    let scraped = ScrapedDocument {
        url: page_url.to_string(),
        title: extract_title(&document).unwrap_or_else(|| page_url.to_string()),
        content,
        page_type: determine_page_type(&document, page_url),
        metadata,
        links,
        images: if options.include_images {
            extract_images(&document, page_url)
        } else {
            Vec::new()
        },
        attachments: if options.include_attachments {
            extract_attachments(&document, page_url)
        } else {
            Vec::new()
        },
        tables: if options.extract_tables {
            extract_tables(&document)
        } else {
            Vec::new()
        },
        page_count: 1,
        scraped_at: Utc::now(),
    };

    let next_page = if options.follow_pagination {
        find_next_page(&document, page_url)
    } else {
        None
    };

    ExtractedPage {
        document: scraped,
        next_page,
    }
}

/// Images in the body with absolute sources, first occurrence wins
pub fn extract_images(document: &Html, page_url: &Url) -> Vec<ImageRef> {
    let Some(img_sel) = selector("body img[src]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    document
        .select(&img_sel)
        .filter_map(|img| {
            let src = resolve_link(img.value().attr("src")?, page_url)?.to_string();
            if !seen.insert(src.clone()) {
                return None;
            }
            let alt = img
                .value()
                .attr("alt")
                .map(collapse_whitespace)
                .filter(|alt| !alt.is_empty());
            Some(ImageRef { src, alt })
        })
        .collect()
}

/// Links to downloadable files
///
/// A link counts when its target has a document or archive extension, when it
/// carries a `download` attribute, or when it sits in an attachment container.
pub fn extract_attachments(document: &Html, page_url: &Url) -> Vec<Attachment> {
    let Some(a_sel) = selector("a[href]") else {
        return Vec::new();
    };

    let mut in_container = HashSet::new();
    if let Some(container_sel) = selector(ATTACHMENT_CONTAINERS) {
        for container in document.select(&container_sel) {
            for anchor in container.select(&a_sel) {
                in_container.insert(anchor.id());
            }
        }
    }

    let mut seen = HashSet::new();
    let mut attachments = Vec::new();

    for anchor in document.select(&a_sel) {
        let Some(url) = anchor
            .value()
            .attr("href")
            .and_then(|href| resolve_link(href, page_url))
        else {
            continue;
        };

        let is_file = is_attachment_url(&url)
            || anchor.value().attr("download").is_some()
            || in_container.contains(&anchor.id());
        if !is_file || !seen.insert(url.to_string()) {
            continue;
        }

        attachments.push(Attachment {
            name: attachment_name(anchor, &url),
            extension: path_extension(&url),
            url: url.to_string(),
        });
    }

    attachments
}

fn attachment_name(anchor: ElementRef<'_>, url: &Url) -> String {
    let text = element_text(anchor);
    if !text.is_empty() {
        return text;
    }
    if let Some(name) = anchor.value().attr("download").filter(|d| !d.is_empty()) {
        return name.to_string();
    }
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .unwrap_or(url.as_str())
        .to_string()
}

/// Tables with at least one header or data row
///
/// Header cells come from `thead`, or from a first row made only of `th`.
/// Nested tables are extracted on their own and not merged into the parent.
pub fn extract_tables(document: &Html) -> Vec<Table> {
    let (Some(table_sel), Some(tr_sel), Some(cell_sel), Some(caption_sel)) = (
        selector("table"),
        selector("tr"),
        selector("th, td"),
        selector("caption"),
    ) else {
        return Vec::new();
    };

    let mut tables = Vec::new();

    for table in document.select(&table_sel) {
        let caption = table
            .select(&caption_sel)
            .next()
            .map(element_text)
            .filter(|c| !c.is_empty());

        let mut headers = Vec::new();
        let mut rows = Vec::new();

        for row in table
            .select(&tr_sel)
            .filter(|row| nearest(*row, "table") == Some(table))
        {
            let cells: Vec<ElementRef<'_>> = row
                .select(&cell_sel)
                .filter(|cell| nearest(*cell, "tr") == Some(row))
                .collect();
            if cells.is_empty() {
                continue;
            }
            let texts: Vec<String> = cells.iter().map(|c| element_text(*c)).collect();

            let header_row = in_thead(row)
                || (headers.is_empty()
                    && rows.is_empty()
                    && cells.iter().all(|c| c.value().name() == "th"));
            if header_row {
                headers.extend(texts);
            } else {
                rows.push(texts);
            }
        }

        if !headers.is_empty() || !rows.is_empty() {
            tables.push(Table {
                caption,
                headers,
                rows,
            });
        }
    }

    tables
}

/// Closest ancestor element named `name`
fn nearest<'a>(element: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == name)
}

fn in_thead(row: ElementRef<'_>) -> bool {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .take_while(|el| el.value().name() != "table")
        .any(|el| el.value().name() == "thead")
}

/// Finds the link to the next page of a paginated listing
///
/// Tries `rel="next"`, then anchors labelled "다음"/"next", then common
/// next-button classes. Only links on the page's own host that lead somewhere
/// else are returned.
pub fn find_next_page(document: &Html, page_url: &Url) -> Option<Url> {
    let current = normalize_url(page_url.as_str()).ok()?;
    let usable = |href: &str| -> Option<Url> {
        let url = normalize_url(resolve_link(href, page_url)?.as_str()).ok()?;
        (url.host_str() == page_url.host_str() && url != current).then_some(url)
    };

    if let Some(rel_sel) = selector("link[rel='next'][href], a[rel='next'][href]") {
        if let Some(url) = document
            .select(&rel_sel)
            .filter_map(|el| el.value().attr("href"))
            .find_map(&usable)
        {
            return Some(url);
        }
    }

    let a_sel = selector("a[href]")?;
    let labelled = document.select(&a_sel).find_map(|anchor| {
        let is_next = [
            Some(element_text(anchor)),
            anchor.value().attr("title").map(collapse_whitespace),
            anchor.value().attr("aria-label").map(collapse_whitespace),
        ]
        .into_iter()
        .flatten()
        .any(|label| NEXT_LABELS.contains(&label.to_lowercase().as_str()));

        if is_next {
            anchor.value().attr("href").and_then(&usable)
        } else {
            None
        }
    });
    if labelled.is_some() {
        return labelled;
    }

    let class_sel = selector(NEXT_CLASS_SELECTORS)?;
    document
        .select(&class_sel)
        .filter_map(|el| el.value().attr("href"))
        .find_map(&usable)
}

/// Appends a continuation page to the first page's document
pub fn merge_page(target: &mut ScrapedDocument, page: ScrapedDocument) {
    if !page.content.is_empty() {
        if !target.content.is_empty() {
            target.content.push_str("\n\n");
        }
        target.content.push_str(&page.content);
    }

    let known: HashSet<String> = target.links.iter().cloned().collect();
    target
        .links
        .extend(page.links.into_iter().filter(|l| !known.contains(l)));

    let known: HashSet<String> = target.images.iter().map(|i| i.src.clone()).collect();
    target
        .images
        .extend(page.images.into_iter().filter(|i| !known.contains(&i.src)));

    let known: HashSet<String> = target.attachments.iter().map(|a| a.url.clone()).collect();
    target
        .attachments
        .extend(page.attachments.into_iter().filter(|a| !known.contains(&a.url)));

    target.tables.extend(page.tables);

    let meta = &mut target.metadata;
    meta.has_images |= page.metadata.has_images;
    meta.has_attachments |= page.metadata.has_attachments;
    meta.has_table |= page.metadata.has_table;
    meta.content_length = Some(target.content.chars().count());

    target.page_count += 1;
}
