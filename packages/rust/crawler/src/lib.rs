//! Daily-listing crawler for arXiv category pages.
//!
//! This crate provides:
//! - [`category`] — Category-code extraction from loosely structured subject text
//! - [`listing`] — Anchor resolution and per-entry filtering on a listing page
//! - [`engine`] — The per-category listing fetcher ([`Crawler`])
//! - [`metadata`] — Abstract-page metadata fetching ([`MetadataFetcher`])

pub mod category;
pub mod engine;
pub mod listing;
pub mod metadata;

pub use category::{codes_in_subject_text, extract_category_code, primary_subject_fragment};
pub use engine::{Crawler, CrawlSummary, DEFAULT_BASE_URL};
pub use listing::{extract_anchors, parse_listing};
pub use metadata::{MetadataFetcher, parse_abstract_page};
