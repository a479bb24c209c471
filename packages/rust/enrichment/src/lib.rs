//! LLM digest generation via an OpenAI-compatible chat-completions API.
//!
//! For each paper the enricher sends the abstract plus the output language
//! to the configured endpoint, forcing a single function call whose
//! JSON-schema parameters mirror [`Digest`]. Per-paper failures degrade to
//! [`Digest::error`] so one bad response never aborts the batch.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use arxivdigest_shared::{ArxivDigestError, Digest, EnhancedPaper, PaperMeta, Result};

/// Name of the forced tool call.
const TOOL_NAME: &str = "record_digest";

/// System prompt establishing the summarizer role.
const SYSTEM_PROMPT: &str = "You are a research assistant who distills academic \
paper abstracts into short structured digests. Be precise and concrete; never \
invent results that are not stated in the abstract.";

/// User prompt template. `{language}` and `{content}` are substituted.
const USER_TEMPLATE: &str = "Read the following paper abstract and produce a \
digest in {language}. Keep each field to one or two sentences.\n\n\
Abstract:\n{content}";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Runtime settings for the enrichment client.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    /// Base URL of the OpenAI-compatible endpoint (no trailing slash).
    pub base_url: String,
    /// Bearer token for the endpoint.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Output language for the digest fields.
    pub language: String,
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for batch enrichment.
pub trait EnrichProgress: Send + Sync {
    /// Called once per paper as it completes (successfully or not).
    fn paper_done(&self, current: usize, total: usize, id: &str);
}

/// No-op progress for headless/test usage.
pub struct SilentEnrichProgress;

impl EnrichProgress for SilentEnrichProgress {
    fn paper_done(&self, _current: usize, _total: usize, _id: &str) {}
}

// ---------------------------------------------------------------------------
// Result sink
// ---------------------------------------------------------------------------

/// Receives each enhanced paper as soon as its digest completes, before
/// the next LLM call starts. Lets callers persist partial batches so an
/// interrupted run keeps the digests already paid for.
pub trait EnrichSink {
    /// Persist one enhanced paper. An error aborts the batch.
    fn accept(&mut self, paper: &EnhancedPaper) -> Result<()>;
}

/// Sink that keeps nothing; callers use the returned batch instead.
pub struct DiscardSink;

impl EnrichSink for DiscardSink {
    fn accept(&mut self, _paper: &EnhancedPaper) -> Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wire types (chat-completions response subset)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    arguments: String,
}

// ---------------------------------------------------------------------------
// Enricher
// ---------------------------------------------------------------------------

/// Chat-completions client producing one [`Digest`] per paper.
pub struct Enricher {
    client: Client,
    config: EnrichConfig,
}

impl Enricher {
    /// Build an enricher for the given endpoint settings.
    pub fn new(config: EnrichConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("arxivdigest/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| {
                ArxivDigestError::Enrichment(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    /// Generate a digest for one paper's abstract.
    #[instrument(skip_all, fields(paper_id = %meta.id))]
    pub async fn digest(&self, meta: &PaperMeta) -> Result<Digest> {
        let prompt = USER_TEMPLATE
            .replace("{language}", &self.config.language)
            .replace("{content}", &meta.summary);

        let request = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
            "tools": [{
                "type": "function",
                "function": {
                    "name": TOOL_NAME,
                    "description": "Record the structured digest of a paper abstract.",
                    "parameters": digest_schema(),
                },
            }],
            "tool_choice": {
                "type": "function",
                "function": { "name": TOOL_NAME },
            },
        });

        let url = format!("{}/chat/completions", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ArxivDigestError::Enrichment(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArxivDigestError::Enrichment(format!(
                "{url}: HTTP {status}"
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ArxivDigestError::Enrichment(format!("invalid response body: {e}")))?;

        let arguments = body
            .choices
            .first()
            .and_then(|c| c.message.tool_calls.first())
            .map(|t| t.function.arguments.as_str())
            .ok_or_else(|| {
                ArxivDigestError::Enrichment("response contains no tool call".into())
            })?;

        let digest: Digest = serde_json::from_str(arguments).map_err(|e| {
            ArxivDigestError::Enrichment(format!("tool arguments failed validation: {e}"))
        })?;

        debug!(tldr = %digest.tldr, "digest generated");
        Ok(digest)
    }

    /// Enrich a batch of papers, one LLM call each.
    ///
    /// Papers with an empty abstract are skipped with a warning. A failed
    /// call yields the error digest, so no LLM failure aborts the batch.
    /// Each completed paper is handed to `sink` before the next call
    /// starts; only a sink failure stops the run.
    #[instrument(skip_all, fields(papers = papers.len()))]
    pub async fn enhance_all(
        &self,
        papers: &[PaperMeta],
        sink: &mut dyn EnrichSink,
        progress: &dyn EnrichProgress,
    ) -> Result<Vec<EnhancedPaper>> {
        let total = papers.len();
        let mut enhanced = Vec::with_capacity(total);

        for (i, meta) in papers.iter().enumerate() {
            if meta.summary.trim().is_empty() {
                warn!(paper_id = %meta.id, "paper has no abstract, skipping enrichment");
                progress.paper_done(i + 1, total, &meta.id);
                continue;
            }

            let ai = match self.digest(meta).await {
                Ok(digest) => digest,
                Err(e) => {
                    warn!(paper_id = %meta.id, error = %e, "enrichment failed, using error digest");
                    Digest::error()
                }
            };

            let paper = EnhancedPaper {
                meta: meta.clone(),
                ai,
            };
            sink.accept(&paper)?;
            enhanced.push(paper);
            progress.paper_done(i + 1, total, &meta.id);
        }

        info!(
            enhanced = enhanced.len(),
            skipped = total - enhanced.len(),
            "enrichment batch complete"
        );
        Ok(enhanced)
    }
}

/// JSON schema for the digest tool parameters, mirroring [`Digest`].
fn digest_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "tldr": { "type": "string", "description": "One-sentence takeaway." },
            "motivation": { "type": "string", "description": "Why the problem matters." },
            "method": { "type": "string", "description": "What the paper does." },
            "result": { "type": "string", "description": "What was found." },
            "conclusion": { "type": "string", "description": "What it means." },
        },
        "required": ["tldr", "motivation", "method", "result", "conclusion"],
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
