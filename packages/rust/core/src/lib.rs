//! Pipeline orchestration for arxivdigest.
//!
//! Wires the crawler, enrichment, and render crates into the daily run
//! and the stage-at-a-time commands, persisting intermediate results as
//! JSONL between stages.

pub mod jsonl;
pub mod pipeline;

pub use jsonl::{JsonlWriter, read_jsonl, write_jsonl};
pub use pipeline::{
    ProgressReporter, RunConfig, RunResult, SilentProgress, crawl_to_file, dedup_by_id,
    enhance_file, fetch_all_metadata, render_file, run,
};
