//! Core domain types for the arxivdigest pipeline.

use serde::{Deserialize, Serialize};

/// The minimal identity record emitted by the crawler, one per accepted
/// listing entry. Written as JSONL; downstream stages add fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    /// arXiv identifier, e.g. `"2301.00001"`.
    pub id: String,
}

/// Full paper metadata, populated from the abstract page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperMeta {
    /// arXiv identifier.
    pub id: String,
    /// Paper title.
    pub title: String,
    /// Author names in listing order.
    pub authors: Vec<String>,
    /// Abstract text.
    pub summary: String,
    /// Abstract page URL.
    pub abs: String,
    /// Category codes, primary first.
    pub categories: Vec<String>,
}

impl PaperMeta {
    /// The paper's primary category, if any was extracted.
    pub fn primary_category(&self) -> Option<&str> {
        self.categories.first().map(String::as_str)
    }
}

/// Structured digest produced by the LLM for one paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Digest {
    /// One-sentence takeaway.
    pub tldr: String,
    /// Why the problem matters.
    pub motivation: String,
    /// What the paper does.
    pub method: String,
    /// What was found.
    pub result: String,
    /// What it means.
    pub conclusion: String,
}

impl Digest {
    /// Placeholder digest used when enrichment fails for a paper.
    /// The paper still flows through the pipeline.
    pub fn error() -> Self {
        Self {
            tldr: "Error".into(),
            motivation: "Error".into(),
            method: "Error".into(),
            result: "Error".into(),
            conclusion: "Error".into(),
        }
    }
}

/// A paper with its metadata and AI digest, as written to the enhanced JSONL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancedPaper {
    #[serde(flatten)]
    pub meta: PaperMeta,
    /// The digest, under the `AI` key for output compatibility.
    #[serde(rename = "AI")]
    pub ai: Digest,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_to_id_only() {
        let record = PaperRecord {
            id: "2301.00001".into(),
        };
        let json = serde_json::to_string(&record).expect("serialize");
        assert_eq!(json, r#"{"id":"2301.00001"}"#);
    }

    #[test]
    fn enhanced_paper_roundtrip() {
        let paper = EnhancedPaper {
            meta: PaperMeta {
                id: "2301.00001".into(),
                title: "A Paper".into(),
                authors: vec!["Ada Lovelace".into()],
                summary: "We study things.".into(),
                abs: "https://arxiv.org/abs/2301.00001".into(),
                categories: vec!["cs.CL".into(), "cs.LG".into()],
            },
            ai: Digest::error(),
        };

        let json = serde_json::to_string(&paper).expect("serialize");
        assert!(json.contains(r#""AI":{"#));
        assert!(json.contains(r#""id":"2301.00001""#));

        let parsed: EnhancedPaper = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.meta.primary_category(), Some("cs.CL"));
        assert_eq!(parsed.ai.tldr, "Error");
    }

    #[test]
    fn primary_category_empty() {
        let meta = PaperMeta {
            id: "x".into(),
            title: String::new(),
            authors: vec![],
            summary: String::new(),
            abs: String::new(),
            categories: vec![],
        };
        assert_eq!(meta.primary_category(), None);
    }
}
