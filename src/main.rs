//! nodedocs: generate, consolidate and publish node reference documentation.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use nodedocs::config::{Settings, DEFAULT_CONFIG_FILE};
use nodedocs::consolidate::consolidate;
use nodedocs::generate::Generator;
use nodedocs::render::{RenderService, SnapshotDirRenderer};
use nodedocs::source::catalog::SnapshotCatalog;
use nodedocs::source::snapshot::ModelSnapshot;
use nodedocs::toolchain::Toolchain;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "nodedocs",
    about = "Generate a documentation site for a visual scripting node library"
)]
struct Cli {
    /// Settings file. Missing files fall back to defaults.
    #[arg(short = 'c', long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Stage directory for intermediate documents
    #[arg(short = 's', long, global = true)]
    stage: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write intermediate documents for every node in the model
    Generate(GenerateArgs),
    /// Resolve intermediate documents into consolidated.json
    Consolidate(OutputArgs),
    /// Run the converter and site builder on consolidated.json
    Build(OutputArgs),
    /// Generate, consolidate and build in one go
    Run {
        #[command(flatten)]
        generate: GenerateArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// Model snapshot files (glob patterns supported). Later files override earlier ones.
    #[arg(short = 'm', long = "model", required = true)]
    models: Vec<String>,

    /// Output format: json, xml. Can be specified multiple times.
    #[arg(short = 'f', long = "format")]
    formats: Vec<String>,

    /// Documentation title
    #[arg(long)]
    title: Option<String>,

    /// Only document source objects under this path
    #[arg(long)]
    content_path: Option<String>,

    /// Directory of pre-captured node snapshots (<class>/<node>.png)
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Worker threads (0 = one per core)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Echo diagnostics as TeamCity service messages
    #[arg(long)]
    teamcity: bool,
}

#[derive(Args)]
struct OutputArgs {
    /// Output directory for images and the built site
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

impl GenerateArgs {
    fn apply(&self, settings: &mut Settings) {
        if !self.formats.is_empty() {
            settings.formats = self.formats.clone();
        }
        if let Some(title) = &self.title {
            settings.title = title.clone();
        }
        if let Some(path) = &self.content_path {
            settings.content_path = path.clone();
        }
        if let Some(dir) = &self.snapshot_dir {
            settings.render.snapshot_dir = Some(dir.clone());
        }
        if let Some(threads) = self.threads {
            settings.threads = threads;
        }
        settings.diagnostics.teamcity |= self.teamcity;
    }
}

impl OutputArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(output) = &self.output {
            settings.output_dir = output.clone();
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal()),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::load(&cli.config)
        .with_context(|| format!("failed to load settings from {}", cli.config.display()))?;
    if let Some(stage) = &cli.stage {
        settings.stage_dir = stage.clone();
    }

    match &cli.command {
        Command::Generate(args) => {
            args.apply(&mut settings);
            generate(&settings, &args.models)
        }
        Command::Consolidate(args) => {
            args.apply(&mut settings);
            run_consolidate(&settings)
        }
        Command::Build(args) => {
            args.apply(&mut settings);
            build(&settings)
        }
        Command::Run { generate: g, output } => {
            g.apply(&mut settings);
            output.apply(&mut settings);
            generate(&settings, &g.models)?;
            run_consolidate(&settings)?;
            build(&settings)
        }
    }
}

/// Expand glob patterns into a sorted, deduplicated list of files.
/// Plain paths are kept as given so a missing file reports a read error.
fn expand_globs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        if !pattern.contains(['*', '?', '[']) {
            files.push(PathBuf::from(pattern));
            continue;
        }
        let mut matches: Vec<_> = glob::glob(pattern)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matches.is_empty() {
            warn!("no files matched: {}", pattern);
        }
        matches.sort();
        files.extend(matches);
    }
    files.dedup();
    Ok(files)
}

fn generate(settings: &Settings, models: &[String]) -> Result<()> {
    let files = expand_globs(models)?;
    if files.is_empty() {
        bail!("no model snapshots to document");
    }
    let model = ModelSnapshot::load_all(&files).context("failed to load model snapshots")?;
    let options = settings.generator_options()?;

    // Declared before the generator so its handle is dropped first.
    let service = settings
        .render
        .snapshot_dir
        .as_ref()
        .map(|dir| RenderService::spawn(SnapshotDirRenderer::new(dir)));

    let mut generator = Generator::init(&model, &settings.stage_dir, options)?;
    if let Some(service) = &service {
        generator = generator.with_renderer(service.handle());
    }
    let mut catalog = SnapshotCatalog::new(&model, &settings.content_path);
    generator.run(&mut catalog).context("generation failed")?;
    let report = generator
        .finalize(&settings.stage_dir)
        .context("failed to write intermediate documents")?;

    info!(
        "{} nodes documented, {} items skipped, {} diagnostics",
        report.nodes,
        report.skipped,
        report.diagnostics.len()
    );
    Ok(())
}

fn run_consolidate(settings: &Settings) -> Result<()> {
    consolidate(&settings.stage_dir, &settings.output_dir).with_context(|| {
        format!(
            "failed to consolidate {}",
            settings.stage_dir.display()
        )
    })?;
    info!(
        "Wrote {}",
        settings.stage_dir.join("consolidated.json").display()
    );
    Ok(())
}

fn build(settings: &Settings) -> Result<()> {
    let toolchain = Toolchain::new(settings.toolchain_config());
    toolchain
        .convert(&settings.stage_dir)
        .context("conversion failed")?;
    toolchain
        .build_site(&settings.stage_dir, &settings.output_dir)
        .context("site build failed")?;
    Ok(())
}
