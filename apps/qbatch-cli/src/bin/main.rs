use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use qbatch_core::config::{AppConfig, Config};
use qbatch_embed::get_default_embedder;
use qbatch_runner::{BatchRunner, BatchSettings};
use qbatch_text::TantivyIndexService;

/// Run every query file of a directory against a pre-built index and write
/// the matching document paths to one output file per query file.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Index directory
    #[arg(long)]
    index: Option<String>,
    /// Default search field
    #[arg(long)]
    field: Option<String>,
    /// Directory of query files
    #[arg(long)]
    queries: Option<String>,
    /// Directory the output files are written to
    #[arg(long)]
    output: Option<String>,
    /// Hits per page
    #[arg(long)]
    paging: Option<usize>,
    /// Nearest neighbours OR-ed into every query (0 disables)
    #[arg(long = "knn-vector")]
    knn: Option<usize>,
    /// Log doc ids and scores instead of writing paths
    #[arg(long)]
    raw: bool,
    /// Time this many repeated searches per query
    #[arg(long)]
    repeat: Option<usize>,
    /// Word-vector dictionary (defaults to <index>/knn-dict)
    #[arg(long)]
    vector_dict: Option<String>,
}

impl Args {
    fn apply(self, app: &mut AppConfig) {
        if let Some(v) = self.index { app.index.path = v; }
        if let Some(v) = self.vector_dict { app.index.vector_dict = Some(v); }
        if let Some(v) = self.field { app.search.field = v; }
        if let Some(v) = self.paging { app.search.page_size = v; }
        if let Some(v) = self.knn { app.search.knn = v; }
        if let Some(v) = self.repeat { app.search.repeat = v; }
        if self.raw { app.search.raw = true; }
        if let Some(v) = self.queries { app.batch.query_dir = v; }
        if let Some(v) = self.output { app.batch.output_dir = v; }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    let mut app = Config::load().context("loading configuration")?.app().context("reading configuration")?;
    args.apply(&mut app);
    app.validate().context("invalid command line")?;

    let base = std::env::current_dir().context("resolving working directory")?;
    let index_path = app.index_path(&base);
    let index = TantivyIndexService::open(&index_path).with_context(|| format!("opening index {}", index_path.display()))?;
    info!(index = %index_path.display(), docs = index.num_docs(), "index opened");

    let embedder = if app.search.knn > 0 {
        let dict: PathBuf = app.vector_dict_path(&base);
        Some(get_default_embedder(&dict).with_context(|| format!("loading vector dictionary {}", dict.display()))?)
    } else {
        None
    };

    let settings = BatchSettings::from_config(&app, &base);
    let runner = BatchRunner::new(settings, &index, embedder.as_deref())?;
    let report = runner.run()?;

    if report.has_failures() {
        for file in report.files.iter().filter(|f| f.failed()) {
            error!(file = %file.name, error = file.error.as_deref().unwrap_or_default(), "failed");
        }
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}
