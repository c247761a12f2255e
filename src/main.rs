//! cdtag CLI: headless front-end for change-detection polygon tagging.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use cdtag::config::AppConfig;
use cdtag::message::{handle_editor_message, parse_script};
use cdtag::scheduler::PairScheduler;
use cdtag::session::{AnnotationSession, LoadOutcome, SaveOutcome, SavedPair};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "cdtag")]
#[command(about = "Tag change regions between co-registered image pairs")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the user config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    dirs: DirArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides for the configured batch directories.
#[derive(Debug, Clone, Args)]
struct DirArgs {
    /// Directory of reference (earlier) images.
    #[arg(long, global = true)]
    reference_dir: Option<PathBuf>,

    /// Directory of target (later) images.
    #[arg(long, global = true)]
    target_dir: Option<PathBuf>,

    /// Directory of result records.
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every pair as done, pending or unknown.
    Scan {
        /// Print every pair, not just the summary.
        #[arg(long)]
        list: bool,
    },

    /// Show the next pending pair.
    Next,

    /// Mark the next pending pair as skipped.
    Skip,

    /// Replay an annotation script on a pair and save the result.
    Annotate(AnnotateArgs),

    /// Render the difference map of one result record.
    Preview {
        /// Result record to render.
        #[arg(long)]
        record: PathBuf,

        /// Target image the record belongs to.
        #[arg(long)]
        target: PathBuf,

        /// PNG file to write.
        #[arg(long)]
        out: PathBuf,
    },

    /// Render difference maps of every finished pair.
    PreviewAll {
        /// Directory to write PNG files into.
        #[arg(long)]
        out_dir: PathBuf,
    },

    /// Manage the configuration file.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Clone, Args)]
struct AnnotateArgs {
    /// JSON array of editor messages.
    #[arg(long)]
    events: PathBuf,

    /// Target image to annotate instead of the next pending pair.
    #[arg(long)]
    target: Option<PathBuf>,

    /// Reference image shown next to a manually chosen target.
    #[arg(long, requires = "target")]
    reference: Option<PathBuf>,

    /// Record path for a manually chosen target.
    #[arg(long, requires = "target")]
    output: Option<PathBuf>,

    /// Write the difference map of the saved result to this PNG file.
    #[arg(long)]
    preview: Option<PathBuf>,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Write a default configuration file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration.
    Show,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    let (mut config, config_error) = match AppConfig::load_or_new(cli.config.as_deref()) {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::new(), Some(e)),
    };
    apply_dir_overrides(&mut config, &cli.dirs);

    env_logger::Builder::new()
        .filter_level(config.preferences.log_level.to_level_filter())
        .parse_default_env()
        .init();

    if let Some(e) = config_error {
        log::warn!("Using default configuration: {}", e);
    }

    match cli.command {
        Commands::Scan { list } => run_scan(&config, list),
        Commands::Next => run_next(&config),
        Commands::Skip => run_skip(&config),
        Commands::Annotate(args) => run_annotate(&config, &args),
        Commands::Preview {
            record,
            target,
            out,
        } => run_preview(&config, &record, &target, &out),
        Commands::PreviewAll { out_dir } => run_preview_all(&config, &out_dir),
        Commands::Config(cmd) => run_config(&config, cli.config.as_deref(), cmd),
    }
}

fn apply_dir_overrides(config: &mut AppConfig, dirs: &DirArgs) {
    if let Some(dir) = &dirs.reference_dir {
        config.directories.reference_dir = dir.clone();
    }
    if let Some(dir) = &dirs.target_dir {
        config.directories.target_dir = dir.clone();
    }
    if let Some(dir) = &dirs.output_dir {
        config.directories.output_dir = dir.clone();
    }
}

fn run_scan(config: &AppConfig, list: bool) -> CliResult<()> {
    let scheduler = PairScheduler::on_disk(config.pair_dirs(), config.naming_tags());
    let report = scheduler.scan()?;

    if list {
        for pair in report.pairs() {
            println!("{:<8} {}", pair.status.name(), pair.reference.display());
        }
    }
    println!("{}", report.summary());
    Ok(())
}

fn run_next(config: &AppConfig) -> CliResult<()> {
    let scheduler = PairScheduler::on_disk(config.pair_dirs(), config.naming_tags());
    match scheduler.next_pending()? {
        Some(pair) => {
            println!("reference: {}", pair.reference.display());
            println!("target:    {}", pair.target.display());
            println!("output:    {}", pair.output.display());
        }
        None => println!("Nothing left to annotate"),
    }
    Ok(())
}

fn run_skip(config: &AppConfig) -> CliResult<()> {
    let mut session = AnnotationSession::from_config(config)?;
    if !load_next_pair(&mut session)? {
        return Ok(());
    }
    let outcome = session.skip()?;
    report_outcome(&outcome, None)
}

fn run_annotate(config: &AppConfig, args: &AnnotateArgs) -> CliResult<()> {
    let messages = parse_script(&std::fs::read_to_string(&args.events)?)?;
    let mut session = AnnotationSession::from_config(config)?;

    if let Some(target) = &args.target {
        session.set_auto_advance(false);
        if let Some(reference) = &args.reference {
            session.select_reference(reference)?;
        }
        session.select_target(target)?;
        let output = args.output.clone().or_else(|| session.default_output_path());
        session.set_output_path(output);
    } else if !load_next_pair(&mut session)? {
        return Ok(());
    }

    let palette = session.palette().clone();
    for msg in messages {
        handle_editor_message(msg, session.editor_mut(), &palette)?;
    }

    let outcome = session.save()?;
    report_outcome(&outcome, args.preview.as_deref())
}

/// Load the next pending pair, reporting pairs that could not be read.
fn load_next_pair(session: &mut AnnotationSession) -> CliResult<bool> {
    let outcome = session.load_next()?;
    report_load_failures(&outcome);
    if outcome.pair.is_none() {
        println!("Nothing left to annotate");
    }
    Ok(outcome.pair.is_some())
}

fn report_load_failures(outcome: &LoadOutcome) {
    for (pair, err) in &outcome.failures {
        eprintln!("unreadable {}: {}", pair.target.display(), err);
    }
}

fn report_outcome(outcome: &SaveOutcome, preview_path: Option<&Path>) -> CliResult<()> {
    let SaveOutcome::Saved(saved) = outcome else {
        return Err("No output path for the selected target".into());
    };

    let SavedPair {
        path,
        result,
        preview,
        advance,
        errors,
    } = saved;

    if result.is_skipped() {
        println!("Skipped: {}", path.display());
    } else {
        println!(
            "Saved {} with {} polygons",
            path.display(),
            result.polygon_count()
        );
    }

    for err in errors {
        eprintln!("warning: {}", err);
    }

    if let (Some(raster), Some(out)) = (preview, preview_path) {
        raster.save_png(out)?;
        println!("Preview: {}", out.display());
    }

    if let Some(outcome) = advance {
        report_load_failures(outcome);
    }
    if let Some(next) = saved.next() {
        println!("Next: {}", next.reference.display());
    }
    Ok(())
}

fn run_preview(config: &AppConfig, record: &Path, target: &Path, out: &Path) -> CliResult<()> {
    let session = AnnotationSession::from_config(config)?;
    match session.preview_pair(record, target)? {
        Some(raster) => {
            raster.save_png(out)?;
            println!("Preview: {}", out.display());
        }
        None => println!("Skipped by annotator: {}", record.display()),
    }
    Ok(())
}

fn run_preview_all(config: &AppConfig, out_dir: &Path) -> CliResult<()> {
    let session = AnnotationSession::from_config(config)?;
    let batch = session.preview_all()?;
    std::fs::create_dir_all(out_dir)?;

    for (pair, raster) in &batch.rendered {
        let Some(raster) = raster else {
            println!("skipped  {}", pair.output.display());
            continue;
        };
        let stem = pair
            .output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let out = out_dir.join(format!("{stem}.png"));
        raster.save_png(&out)?;
        println!("rendered {}", out.display());
    }

    for (pair, err) in &batch.failures {
        eprintln!("failed   {}: {}", pair.output.display(), err);
    }

    println!(
        "{} rendered, {} failed",
        batch.rendered.len(),
        batch.failures.len()
    );
    Ok(())
}

fn run_config(config: &AppConfig, path: Option<&Path>, cmd: ConfigCommand) -> CliResult<()> {
    match cmd {
        ConfigCommand::Init { force } => {
            let path = match path {
                Some(p) => p.to_path_buf(),
                None => AppConfig::default_path().ok_or("Could not determine config directory")?,
            };
            if path.exists() && !force {
                return Err(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )
                .into());
            }
            config.save(&path)?;
            println!("Wrote {}", path.display());
        }
        ConfigCommand::Show => println!("{}", config.to_json()?),
    }
    Ok(())
}
