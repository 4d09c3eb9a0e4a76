//! State module: the records a crawl or fetch produces
//!
//! # Components
//!
//! - `CrawlStatus`: lifecycle of a URL within one crawl session
//! - `NavigationNode`: durable record of one visited URL
//! - `ScrapeResult`: outcome of one fetch executor invocation

mod crawl_status;
mod node;
mod scrape;

pub use crawl_status::CrawlStatus;
pub use node::{node_id_for, Language, NavigationNode, PageMetadata, PageType};
pub use scrape::{Attachment, ImageRef, ScrapeResult, ScrapedDocument, Table};
