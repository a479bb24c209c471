//! End-to-end pipeline: crawl listings, dedup, fetch metadata, generate
//! digests, render the markdown report.
//!
//! Every stage hands the next one a plain vector, and the intermediate
//! results are persisted as JSONL so individual stages can be re-run from
//! the CLI against yesterday's files.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, instrument, warn};

use arxivdigest_crawler::{Crawler, MetadataFetcher};
use arxivdigest_enrichment::{EnrichConfig, EnrichProgress, EnrichSink, Enricher};
use arxivdigest_render::{RenderOptions, load_template, render_report};
use arxivdigest_shared::{ArxivDigestError, EnhancedPaper, PaperMeta, PaperRecord, Result};

use crate::jsonl::{JsonlWriter, read_jsonl, write_jsonl};

/// Settings for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Target categories, in priority order.
    pub categories: Vec<String>,
    /// Output language for the AI digests.
    pub language: String,
    /// Directory the JSONL and markdown outputs are written into.
    pub output_dir: PathBuf,
    /// File stem for outputs, typically the UTC date (`2026-08-30`).
    pub name: String,
    /// LLM endpoint settings.
    pub llm: EnrichConfig,
    /// Optional paper template file; the built-in template otherwise.
    pub template_path: Option<PathBuf>,
    /// Override for the arXiv host (mock servers in tests).
    pub base_url: Option<String>,
}

impl RunConfig {
    /// Output file stem for today's run.
    pub fn default_name() -> String {
        chrono::Utc::now().format("%Y-%m-%d").to_string()
    }

    /// Path of the raw metadata JSONL (`<dir>/<name>.jsonl`).
    pub fn meta_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.jsonl", self.name))
    }

    /// Path of the enhanced JSONL (`<dir>/<name>_AI_enhanced_<Language>.jsonl`).
    pub fn enhanced_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_AI_enhanced_{}.jsonl", self.name, self.language))
    }

    /// Path of the markdown report (`<dir>/<name>.md`).
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.md", self.name))
    }
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Records emitted by the crawl, before dedup.
    pub records: usize,
    /// Unique paper ids after dedup.
    pub unique: usize,
    /// Papers that made it into the enhanced output.
    pub enhanced: usize,
    /// Where the markdown report was written.
    pub report_path: PathBuf,
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Callbacks for user-facing progress (spinner, plain prints, nothing).
pub trait ProgressReporter: Send + Sync {
    /// A new pipeline phase started.
    fn phase(&self, name: &str);
    /// One item within the current phase finished.
    fn item_done(&self, current: usize, total: usize, detail: &str);
}

/// No-op reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn item_done(&self, _current: usize, _total: usize, _detail: &str) {}
}

/// Adapts a [`ProgressReporter`] to the enrichment crate's callback.
struct EnrichProgressAdapter<'a>(&'a dyn ProgressReporter);

impl EnrichProgress for EnrichProgressAdapter<'_> {
    fn paper_done(&self, current: usize, total: usize, id: &str) {
        self.0.item_done(current, total, id);
    }
}

/// Streams each enhanced paper to the JSONL file as its digest completes,
/// so an interrupted batch keeps the digests already generated.
struct JsonlSink<'a>(&'a mut JsonlWriter);

impl EnrichSink for JsonlSink<'_> {
    fn accept(&mut self, paper: &EnhancedPaper) -> Result<()> {
        self.0.append(paper)
    }
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Drop duplicate ids, keeping the first occurrence of each.
pub fn dedup_by_id(records: Vec<PaperRecord>) -> Vec<PaperRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect()
}

/// Fetch abstract-page metadata for each record.
///
/// A paper whose page cannot be fetched or parsed is dropped with a
/// warning; the rest of the batch proceeds.
pub async fn fetch_all_metadata(
    fetcher: &MetadataFetcher,
    records: &[PaperRecord],
    progress: &dyn ProgressReporter,
) -> Vec<PaperMeta> {
    let total = records.len();
    let mut metas = Vec::with_capacity(total);

    for (i, record) in records.iter().enumerate() {
        match fetcher.fetch(&record.id).await {
            Ok(meta) => metas.push(meta),
            Err(e) => {
                warn!(paper_id = %record.id, error = %e, "metadata fetch failed, dropping paper");
            }
        }
        progress.item_done(i + 1, total, &record.id);
    }

    metas
}

/// Enrich papers from a metadata JSONL file and write the enhanced JSONL.
pub async fn enhance_file(config: &RunConfig, progress: &dyn ProgressReporter) -> Result<usize> {
    let metas: Vec<PaperMeta> = read_jsonl(&config.meta_path())?;
    let metas = dedup_metas(metas);

    progress.phase("Generating digests");
    let enricher = Enricher::new(config.llm.clone())?;
    let mut writer = JsonlWriter::create(&config.enhanced_path())?;
    let enhanced = enricher
        .enhance_all(
            &metas,
            &mut JsonlSink(&mut writer),
            &EnrichProgressAdapter(progress),
        )
        .await?;

    Ok(enhanced.len())
}

/// Render the report from an enhanced JSONL file and write the markdown.
pub fn render_file(config: &RunConfig, progress: &dyn ProgressReporter) -> Result<PathBuf> {
    let papers: Vec<EnhancedPaper> = read_jsonl(&config.enhanced_path())?;

    progress.phase("Rendering report");
    let opts = render_options(config)?;
    let markdown = render_report(&papers, &opts);

    let report_path = config.report_path();
    std::fs::write(&report_path, markdown).map_err(|e| ArxivDigestError::io(&report_path, e))?;
    Ok(report_path)
}

/// Crawl listings, fetch metadata, and write the metadata JSONL. This is
/// the standalone crawl command; the written file is what `enhance` reads.
pub async fn crawl_to_file(config: &RunConfig, progress: &dyn ProgressReporter) -> Result<usize> {
    progress.phase("Crawling listings");
    let (_, records) = build_crawler(config)?.crawl().await?;
    let unique = dedup_by_id(records);

    progress.phase("Fetching paper metadata");
    let fetcher = build_fetcher(config)?;
    let metas = fetch_all_metadata(&fetcher, &unique, progress).await;

    std::fs::create_dir_all(&config.output_dir)
        .map_err(|e| ArxivDigestError::io(&config.output_dir, e))?;
    write_jsonl(&config.meta_path(), &metas)?;
    Ok(metas.len())
}

// ---------------------------------------------------------------------------
// Full run
// ---------------------------------------------------------------------------

/// Run the whole pipeline and write all three output files.
#[instrument(skip_all, fields(name = %config.name))]
pub async fn run(config: &RunConfig, progress: &dyn ProgressReporter) -> Result<RunResult> {
    let started = Instant::now();

    progress.phase("Crawling listings");
    let (summary, records) = build_crawler(config)?.crawl().await?;
    let unique = dedup_by_id(records);

    info!(
        records = summary.records_emitted,
        unique = unique.len(),
        failed_pages = summary.errors.len(),
        "crawl stage done"
    );

    progress.phase("Fetching paper metadata");
    let fetcher = build_fetcher(config)?;
    let metas = fetch_all_metadata(&fetcher, &unique, progress).await;

    std::fs::create_dir_all(&config.output_dir)
        .map_err(|e| ArxivDigestError::io(&config.output_dir, e))?;
    write_jsonl(&config.meta_path(), &metas)?;

    progress.phase("Generating digests");
    let enricher = Enricher::new(config.llm.clone())?;
    let mut writer = JsonlWriter::create(&config.enhanced_path())?;
    let enhanced = enricher
        .enhance_all(
            &metas,
            &mut JsonlSink(&mut writer),
            &EnrichProgressAdapter(progress),
        )
        .await?;

    progress.phase("Rendering report");
    let opts = render_options(config)?;
    let markdown = render_report(&enhanced, &opts);
    let report_path = config.report_path();
    std::fs::write(&report_path, markdown).map_err(|e| ArxivDigestError::io(&report_path, e))?;

    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        report = %report_path.display(),
        "pipeline run complete"
    );

    Ok(RunResult {
        records: summary.records_emitted,
        unique: unique.len(),
        enhanced: enhanced.len(),
        report_path,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn build_crawler(config: &RunConfig) -> Result<Crawler> {
    let crawler = Crawler::new(config.categories.clone())?;
    Ok(match &config.base_url {
        Some(url) => crawler.with_base_url(url.clone()),
        None => crawler,
    })
}

fn build_fetcher(config: &RunConfig) -> Result<MetadataFetcher> {
    let fetcher = MetadataFetcher::new()?;
    Ok(match &config.base_url {
        Some(url) => fetcher.with_base_url(url.clone()),
        None => fetcher,
    })
}

fn render_options(config: &RunConfig) -> Result<RenderOptions> {
    let template = match &config.template_path {
        Some(path) => load_template(path)?,
        None => arxivdigest_render::DEFAULT_TEMPLATE.to_string(),
    };
    Ok(RenderOptions {
        preference: config.categories.clone(),
        template,
    })
}

/// Same first-occurrence-wins dedup, keyed on metadata records. The
/// enhance command reads files that may concatenate several crawls.
fn dedup_metas(metas: Vec<PaperMeta>) -> Vec<PaperMeta> {
    let mut seen = HashSet::new();
    metas
        .into_iter()
        .filter(|m| seen.insert(m.id.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
