//! Listing crawler: one page per configured category.
//!
//! Fetches `<base>/list/<category>/new` for each target category and runs
//! the listing parser over the result. Pages are independent; a fetch
//! failure abandons that category's page and the crawl moves on.

use std::time::Duration;

use reqwest::Client;
use scraper::Html;
use tracing::{info, instrument, warn};

use arxivdigest_shared::{ArxivDigestError, PaperRecord, Result};

use crate::listing::parse_listing;

/// User-Agent string for crawl requests.
const USER_AGENT: &str = concat!("arxivdigest/", env!("CARGO_PKG_VERSION"));

/// Default listing host.
pub const DEFAULT_BASE_URL: &str = "https://arxiv.org";

/// Summary of a completed crawl across all categories.
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    /// Number of listing pages successfully fetched.
    pub pages_fetched: usize,
    /// Number of records emitted (before downstream dedup).
    pub records_emitted: usize,
    /// Fetch errors encountered (category, error message).
    pub errors: Vec<(String, String)>,
}

/// Fetches and filters the daily listing pages for a set of categories.
pub struct Crawler {
    client: Client,
    base_url: String,
    categories: Vec<String>,
}

impl Crawler {
    /// Create a new crawler targeting the given categories. The category
    /// list defines both the fetch order and the acceptance predicate.
    pub fn new(categories: Vec<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ArxivDigestError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            categories,
        })
    }

    /// Override the listing host (for integration tests with mock servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Crawl every configured category listing once, in order.
    ///
    /// Records are returned in page-traversal order, categories in
    /// configuration order. Not deduplicated; a paper cross-listed in two
    /// target categories appears twice (downstream dedups by id).
    #[instrument(skip_all, fields(categories = ?self.categories))]
    pub async fn crawl(&self) -> Result<(CrawlSummary, Vec<PaperRecord>)> {
        let mut records = Vec::new();
        let mut errors = Vec::new();
        let mut pages_fetched = 0usize;

        info!(category_count = self.categories.len(), "starting listing crawl");

        for category in &self.categories {
            let url = format!("{}/list/{category}/new", self.base_url);

            let body = match self.fetch_page(&url).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(category = %category, error = %e, "listing fetch failed, skipping page");
                    errors.push((category.clone(), e.to_string()));
                    continue;
                }
            };
            pages_fetched += 1;

            let doc = Html::parse_document(&body);
            let page_records = parse_listing(&doc, &self.categories);

            info!(
                category = %category,
                records = page_records.len(),
                "listing page processed"
            );
            records.extend(page_records);
        }

        let summary = CrawlSummary {
            pages_fetched,
            records_emitted: records.len(),
            errors,
        };

        info!(
            pages_fetched = summary.pages_fetched,
            records = summary.records_emitted,
            errors = summary.errors.len(),
            "crawl completed"
        );

        Ok((summary, records))
    }

    /// Fetch one page body, failing on non-success status.
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ArxivDigestError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArxivDigestError::Network(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| ArxivDigestError::Network(format!("{url}: body read failed: {e}")))
    }
}

#[cfg(test)]
mod crawler_tests {
    use super::*;

    const LISTING_CS_CL: &str = r#"<html><body><div id="dlpage">
        <ul>
            <li><a href="/list/cs.CL/new#item1">New submissions</a></li>
            <li><a href="/list/cs.CL/new#item3">Cross-lists</a></li>
        </ul>
        <dl>
            <dt>
                <a name="item1">[1]</a>
                <a href="/abs/2301.00001" title="Abstract">arXiv:2301.00001</a>
            </dt>
            <dd>
                <div class="list-subjects">
                    <span class="primary-subject">Computation and Language (cs.CL)</span>
                </div>
            </dd>
            <dt>
                <a name="item2">[2]</a>
                <a href="/abs/2301.00002" title="Abstract">arXiv:2301.00002</a>
            </dt>
            <dd>
                <div class="list-subjects">
                    <span class="primary-subject">Computer Vision (cs.CV)</span>
                </div>
            </dd>
            <dt>
                <a name="item3">[3]</a>
                <a href="/abs/2212.09999" title="Abstract">arXiv:2212.09999</a>
            </dt>
            <dd>
                <div class="list-subjects">
                    <span class="primary-subject">Computation and Language (cs.CL)</span>
                </div>
            </dd>
        </dl>
    </div></body></html>"#;

    #[tokio::test]
    async fn crawl_with_mock_server() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/list/cs.CL/new"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(LISTING_CS_CL))
            .mount(&server)
            .await;

        let crawler = Crawler::new(vec!["cs.CL".into()])
            .unwrap()
            .with_base_url(server.uri());

        let (summary, records) = crawler.crawl().await.unwrap();

        assert_eq!(summary.pages_fetched, 1);
        assert!(summary.errors.is_empty());
        // item3 matches the category but sits at the last anchor boundary.
        assert_eq!(
            records,
            vec![PaperRecord {
                id: "2301.00001".into()
            }]
        );
    }

    #[tokio::test]
    async fn crawl_continues_past_failed_category() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/list/cs.CV/new"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&server)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/list/cs.CL/new"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(LISTING_CS_CL))
            .mount(&server)
            .await;

        let crawler = Crawler::new(vec!["cs.CV".into(), "cs.CL".into()])
            .unwrap()
            .with_base_url(server.uri());

        let (summary, records) = crawler.crawl().await.unwrap();

        assert_eq!(summary.pages_fetched, 1);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].0, "cs.CV");
        // cs.CV entry on the cs.CL page now passes the filter too.
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2301.00001", "2301.00002"]);
    }

    #[tokio::test]
    async fn empty_listing_is_not_an_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/list/cs.CL/new"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string("<html><body><div id=\"dlpage\"></div></body></html>"),
            )
            .mount(&server)
            .await;

        let crawler = Crawler::new(vec!["cs.CL".into()])
            .unwrap()
            .with_base_url(server.uri());

        let (summary, records) = crawler.crawl().await.unwrap();
        assert_eq!(summary.pages_fetched, 1);
        assert!(records.is_empty());
    }
}
