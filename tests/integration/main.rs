//! Integration tests for Portal-Scout
//!
//! These tests run the crawler, the fetch executor and the politeness
//! governor against wiremock servers over real HTTP.

mod common;
mod crawl_tests;
mod fetch_tests;
mod robots_tests;
