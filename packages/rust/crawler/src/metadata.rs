//! Paper metadata from the abstract page.
//!
//! For each accepted record the pipeline fetches `<base>/abs/<id>` and
//! pulls out title, authors, abstract text, and the full category list
//! (primary first) for enrichment and rendering.

use std::sync::LazyLock;
use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, instrument};

use arxivdigest_shared::{ArxivDigestError, PaperMeta, Result};

use crate::category::codes_in_subject_text;

static TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1.title").expect("valid selector"));

static AUTHORS_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.authors a").expect("valid selector"));

static ABSTRACT_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("blockquote.abstract").expect("valid selector"));

static SUBJECTS_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.tablecell.subjects").expect("valid selector"));

static SUBHEADER_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.subheader").expect("valid selector"));

/// Fetches and parses abstract pages.
pub struct MetadataFetcher {
    client: Client,
    base_url: String,
}

impl MetadataFetcher {
    /// Create a fetcher against the default arXiv host.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("arxivdigest/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ArxivDigestError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: crate::engine::DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Override the host (for integration tests with mock servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch and parse the abstract page for one paper id.
    #[instrument(skip(self))]
    pub async fn fetch(&self, id: &str) -> Result<PaperMeta> {
        let url = format!("{}/abs/{id}", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ArxivDigestError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArxivDigestError::Network(format!("{url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ArxivDigestError::Network(format!("{url}: body read failed: {e}")))?;

        let meta = parse_abstract_page(id, &url, &body)?;
        debug!(paper_id = %id, title = %meta.title, "metadata fetched");
        Ok(meta)
    }
}

/// Parse an abstract page body into [`PaperMeta`].
pub fn parse_abstract_page(id: &str, url: &str, body: &str) -> Result<PaperMeta> {
    let doc = Html::parse_document(body);

    let title = doc
        .select(&TITLE_SEL)
        .next()
        .map(|el| strip_label(&element_text(&el), "Title:"))
        .ok_or_else(|| ArxivDigestError::parse(format!("{id}: no title on abstract page")))?;

    let authors: Vec<String> = doc
        .select(&AUTHORS_SEL)
        .map(|el| element_text(&el))
        .filter(|name| !name.is_empty())
        .collect();

    let summary = doc
        .select(&ABSTRACT_SEL)
        .next()
        .map(|el| strip_label(&element_text(&el), "Abstract:"))
        .ok_or_else(|| ArxivDigestError::parse(format!("{id}: no abstract on page")))?;

    // Some page variants carry the subjects in the subheader instead of
    // the metadata table.
    let categories = doc
        .select(&SUBJECTS_SEL)
        .next()
        .or_else(|| doc.select(&SUBHEADER_SEL).next())
        .map(|el| codes_in_subject_text(&element_text(&el)))
        .unwrap_or_default();

    Ok(PaperMeta {
        id: id.to_string(),
        title,
        authors,
        summary,
        abs: url.to_string(),
        categories,
    })
}

fn element_text(el: &scraper::ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn strip_label(text: &str, label: &str) -> String {
    text.strip_prefix(label).unwrap_or(text).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABS_PAGE: &str = r#"<html><body><div id="abs">
        <h1 class="title mathjax"><span class="descriptor">Title:</span>Attention Is Not Enough</h1>
        <div class="authors">
            <span class="descriptor">Authors:</span>
            <a href="/a/one">Ada Lovelace</a>, <a href="/a/two">Alan Turing</a>
        </div>
        <blockquote class="abstract mathjax">
            <span class="descriptor">Abstract:</span>
            We revisit attention mechanisms and find them wanting.
        </blockquote>
        <table>
            <tr>
                <td class="tablecell label">Subjects:</td>
                <td class="tablecell subjects">
                    <span class="primary-subject">Computation and Language (cs.CL)</span>;
                    Machine Learning (cs.LG)
                </td>
            </tr>
        </table>
    </div></body></html>"#;

    #[test]
    fn parses_full_abstract_page() {
        let meta =
            parse_abstract_page("2301.00001", "https://arxiv.org/abs/2301.00001", ABS_PAGE)
                .unwrap();

        assert_eq!(meta.id, "2301.00001");
        assert_eq!(meta.title, "Attention Is Not Enough");
        assert_eq!(meta.authors, vec!["Ada Lovelace", "Alan Turing"]);
        assert!(meta.summary.starts_with("We revisit attention"));
        assert_eq!(meta.categories, vec!["cs.CL", "cs.LG"]);
        assert_eq!(meta.primary_category(), Some("cs.CL"));
    }

    #[test]
    fn missing_title_is_parse_error() {
        let body = "<html><body><p>Not an abstract page</p></body></html>";
        let err = parse_abstract_page("x", "https://arxiv.org/abs/x", body).unwrap_err();
        assert!(err.to_string().contains("no title"));
    }

    #[test]
    fn subheader_subjects_used_when_table_missing() {
        let body = r#"<html><body>
            <div class="subheader">
                <h1>Computation and Language (cs.CL); Machine Learning (cs.LG)</h1>
            </div>
            <h1 class="title">Title: Subheader Page</h1>
            <blockquote class="abstract">Abstract: Something.</blockquote>
        </body></html>"#;
        let meta = parse_abstract_page("x", "https://arxiv.org/abs/x", body).unwrap();
        assert_eq!(meta.categories, vec!["cs.CL", "cs.LG"]);
        assert_eq!(meta.primary_category(), Some("cs.CL"));
    }

    #[test]
    fn missing_subjects_leaves_categories_empty() {
        let body = r#"<html><body>
            <h1 class="title">Title: Bare Page</h1>
            <blockquote class="abstract">Abstract: Something.</blockquote>
        </body></html>"#;
        let meta = parse_abstract_page("x", "https://arxiv.org/abs/x", body).unwrap();
        assert!(meta.categories.is_empty());
        assert_eq!(meta.title, "Bare Page");
        assert_eq!(meta.summary, "Something.");
    }

    #[tokio::test]
    async fn fetch_with_mock_server() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/abs/2301.00001"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(ABS_PAGE))
            .mount(&server)
            .await;

        let fetcher = MetadataFetcher::new().unwrap().with_base_url(server.uri());
        let meta = fetcher.fetch("2301.00001").await.unwrap();
        assert_eq!(meta.title, "Attention Is Not Enough");

        let missing = fetcher.fetch("2301.99999").await;
        assert!(missing.is_err());
    }
}
