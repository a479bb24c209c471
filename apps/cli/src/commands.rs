//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use arxivdigest_core::{ProgressReporter, RunConfig};
use arxivdigest_enrichment::EnrichConfig;
use arxivdigest_shared::{
    AppConfig, init_config, load_config, resolve_categories, validate_api_key,
};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// arxivdigest — daily arXiv listings into an AI-digested markdown report.
#[derive(Parser)]
#[command(
    name = "arxivdigest",
    version,
    about = "Crawl daily arXiv listings, digest them with an LLM, and render a markdown report.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Comma-separated category codes (overrides CATEGORIES and config).
    #[arg(short, long, global = true)]
    pub categories: Option<String>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the full pipeline: crawl, enrich, and render today's report.
    Run {
        /// Output directory (defaults to config).
        #[arg(short, long)]
        out: Option<String>,

        /// File stem for outputs (defaults to today's UTC date).
        #[arg(short, long)]
        name: Option<String>,

        /// Digest language (defaults to config).
        #[arg(short, long)]
        language: Option<String>,

        /// Markdown template file for paper sections.
        #[arg(short, long)]
        template: Option<String>,
    },

    /// Crawl listings and write paper metadata JSONL without enrichment.
    Crawl {
        /// Output directory (defaults to config).
        #[arg(short, long)]
        out: Option<String>,

        /// File stem for the output (defaults to today's UTC date).
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Enrich an existing metadata JSONL file with LLM digests.
    Enhance {
        /// Metadata JSONL file produced by crawl (e.g. 2026-08-30.jsonl).
        #[arg(long)]
        data: String,

        /// Digest language (defaults to config).
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Render the markdown report from an enhanced JSONL file.
    Render {
        /// Enhanced JSONL file produced by enhance.
        #[arg(long)]
        data: String,

        /// Markdown template file for paper sections.
        #[arg(short, long)]
        template: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(cli.verbose)));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

/// One directive per workspace crate. `EnvFilter` targets match whole
/// path segments, so `arxivdigest` alone would not cover the library
/// crates (`arxivdigest_crawler`, ...).
fn filter_directives(verbose: u8) -> String {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    [
        "arxivdigest",
        "arxivdigest_core",
        "arxivdigest_crawler",
        "arxivdigest_enrichment",
        "arxivdigest_render",
        "arxivdigest_shared",
    ]
    .map(|target| format!("{target}={level}"))
    .join(",")
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let categories_flag = cli.categories.clone();

    match cli.command {
        Command::Run {
            out,
            name,
            language,
            template,
        } => {
            cmd_run(
                categories_flag.as_deref(),
                out.as_deref(),
                name.as_deref(),
                language.as_deref(),
                template.as_deref(),
            )
            .await
        }
        Command::Crawl { out, name } => {
            cmd_crawl(categories_flag.as_deref(), out.as_deref(), name.as_deref()).await
        }
        Command::Enhance { data, language } => {
            cmd_enhance(categories_flag.as_deref(), &data, language.as_deref()).await
        }
        Command::Render { data, template } => {
            cmd_render(categories_flag.as_deref(), &data, template.as_deref()).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(
    categories: Option<&str>,
    out: Option<&str>,
    name: Option<&str>,
    language: Option<&str>,
    template: Option<&str>,
) -> Result<()> {
    let config = load_config()?;
    validate_api_key(&config)?;

    let run_config = build_run_config(&config, categories, out, name, language, template)?;

    info!(
        categories = ?run_config.categories,
        name = %run_config.name,
        "starting pipeline run"
    );

    let reporter = CliProgress::new();
    let result = arxivdigest_core::run(&run_config, &reporter).await?;
    reporter.finish();

    println!();
    println!("  Digest complete!");
    println!("  Crawled:  {} records", result.records);
    println!("  Unique:   {} papers", result.unique);
    println!("  Enhanced: {} papers", result.enhanced);
    println!("  Report:   {}", result.report_path.display());
    println!();

    Ok(())
}

async fn cmd_crawl(categories: Option<&str>, out: Option<&str>, name: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let run_config = build_run_config(&config, categories, out, name, None, None)?;

    info!(categories = ?run_config.categories, "starting crawl");

    let reporter = CliProgress::new();
    let count = arxivdigest_core::crawl_to_file(&run_config, &reporter).await?;
    reporter.finish();

    println!("Wrote {count} papers to {}", run_config.meta_path().display());
    Ok(())
}

async fn cmd_enhance(categories: Option<&str>, data: &str, language: Option<&str>) -> Result<()> {
    let config = load_config()?;
    validate_api_key(&config)?;

    let data_path = Path::new(data);
    let (out_dir, name) = split_data_path(data_path)?;

    let mut run_config = build_run_config(&config, categories, None, Some(&name), language, None)?;
    run_config.output_dir = out_dir;

    info!(data, language = %run_config.language, "enhancing papers");

    let reporter = CliProgress::new();
    let count = arxivdigest_core::enhance_file(&run_config, &reporter).await?;
    reporter.finish();

    println!(
        "Enhanced {count} papers into {}",
        run_config.enhanced_path().display()
    );
    Ok(())
}

async fn cmd_render(categories: Option<&str>, data: &str, template: Option<&str>) -> Result<()> {
    let config = load_config()?;

    let data_path = Path::new(data);
    let (out_dir, stem) = split_data_path(data_path)?;

    // Enhanced files are named <name>_AI_enhanced_<Language>.jsonl; recover
    // both parts so the report lands next to its inputs as <name>.md.
    let (name, language) = match stem.split_once("_AI_enhanced_") {
        Some((name, language)) => (name.to_string(), Some(language.to_string())),
        None => (stem, None),
    };

    let mut run_config = build_run_config(
        &config,
        categories,
        None,
        Some(&name),
        language.as_deref(),
        template,
    )?;
    run_config.output_dir = out_dir;

    info!(data, "rendering report");

    let reporter = CliProgress::new();
    let report_path = arxivdigest_core::render_file(&run_config, &reporter)?;
    reporter.finish();

    println!("Report written to {}", report_path.display());
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Config assembly
// ---------------------------------------------------------------------------

/// Build a [`RunConfig`] from the loaded config plus CLI overrides.
fn build_run_config(
    config: &AppConfig,
    categories: Option<&str>,
    out: Option<&str>,
    name: Option<&str>,
    language: Option<&str>,
    template: Option<&str>,
) -> Result<RunConfig> {
    let categories = resolve_categories(categories, config);
    if categories.is_empty() {
        return Err(eyre!("no target categories configured"));
    }

    let language = language
        .map(String::from)
        .unwrap_or_else(|| config.defaults.language.clone());

    let api_key = std::env::var(&config.llm.api_key_env).unwrap_or_default();

    Ok(RunConfig {
        categories,
        language: language.clone(),
        output_dir: PathBuf::from(
            out.map(String::from)
                .unwrap_or_else(|| config.defaults.output_dir.clone()),
        ),
        name: name
            .map(String::from)
            .unwrap_or_else(RunConfig::default_name),
        llm: EnrichConfig {
            base_url: config.llm.base_url.clone(),
            api_key,
            model: config.llm.model.clone(),
            language,
        },
        template_path: template.map(PathBuf::from),
        base_url: None,
    })
}

/// Split a data file path into its directory and file stem.
fn split_data_path(path: &Path) -> Result<(PathBuf, String)> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| eyre!("invalid data file path '{}'", path.display()))?;

    Ok((dir, stem.to_string()))
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn item_done(&self, current: usize, total: usize, detail: &str) {
        self.spinner
            .set_message(format!("[{current}/{total}] {detail}"));
    }
}
