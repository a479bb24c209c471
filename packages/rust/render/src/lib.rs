//! Markdown report generation for enhanced papers.
//!
//! Groups papers by primary category, ranks categories by the configured
//! preference list, and renders a table of contents plus one back-linked
//! section per category through the paper template.

pub mod template;

use std::collections::HashMap;

use tracing::{debug, instrument, warn};

use arxivdigest_shared::EnhancedPaper;

pub use template::{DEFAULT_TEMPLATE, load_template, render_paper};

/// Settings for one report render.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Category preference list; earlier entries rank higher in the report.
    pub preference: Vec<String>,
    /// Paper template with `{placeholder}` markers.
    pub template: String,
}

impl RenderOptions {
    /// Options using the built-in template.
    pub fn with_default_template(preference: Vec<String>) -> Self {
        Self {
            preference,
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

/// Render the full categorized report.
///
/// Papers without a primary category are dropped with a warning. Paper
/// numbering is continuous across categories.
#[instrument(skip_all, fields(papers = papers.len()))]
pub fn render_report(papers: &[EnhancedPaper], opts: &RenderOptions) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for paper in papers {
        match paper.meta.primary_category() {
            Some(cate) => *counts.entry(cate).or_insert(0) += 1,
            None => warn!(paper_id = %paper.meta.id, "paper has no primary category, dropped"),
        }
    }

    let mut categories: Vec<&str> = counts.keys().copied().collect();
    categories.sort_by_key(|cate| (rank(cate, &opts.preference), cate.to_string()));

    debug!(categories = categories.len(), "rendering report");

    let mut markdown = String::from("<div id=toc></div>\n\n# Table of Contents\n\n");
    for cate in &categories {
        markdown.push_str(&format!(
            "- [{cate}](#{cate}) [Total: {}]\n",
            counts[cate]
        ));
    }

    let mut idx = 0usize;
    for cate in &categories {
        markdown.push_str(&format!("\n\n<div id='{cate}'></div>\n\n"));
        markdown.push_str(&format!("# {cate} [[Back]](#toc)\n\n"));

        let items: Vec<String> = papers
            .iter()
            .filter(|p| p.meta.primary_category() == Some(*cate))
            .map(|paper| {
                idx += 1;
                let link = assistant_link(paper);
                render_paper(&opts.template, paper, idx, &link)
            })
            .collect();

        markdown.push_str(&items.join("\n\n"));
    }

    markdown
}

/// Rank of a category in the preference list; unknown categories sort last.
fn rank(cate: &str, preference: &[String]) -> usize {
    preference
        .iter()
        .position(|p| p == cate)
        .unwrap_or(preference.len())
}

/// Markdown link opening a prefilled assistant chat about the paper.
fn assistant_link(paper: &EnhancedPaper) -> String {
    let meta = &paper.meta;
    let mut parts = Vec::new();

    if !meta.title.is_empty() {
        parts.push(format!("The paper to discuss is {}", quote_plus(&meta.title)));
    }
    if !meta.abs.is_empty() {
        parts.push(format!("its link is {}", quote_plus(&meta.abs)));
    }
    if !meta.id.is_empty() {
        parts.push(format!(
            "an existing FAQ is at https://papers.cool/arxiv/kimi?paper={}",
            quote_plus(&meta.id)
        ));
    }

    let prompt = parts.join(", ");
    format!(
        "[Discuss with assistant](https://kimi.moonshot.cn/_prefill_chat?prefill_prompt={prompt}&send_immediately=true&force_search=false)"
    )
}

/// Form-urlencode a query value (spaces become `+`).
fn quote_plus(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}
