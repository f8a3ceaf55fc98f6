use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nano_index::catalog::Catalog;
use nano_index::config::{ConfigLoader, DEFAULT_OUT_NAME, ResolvedConfig};
use nano_index::crawler::{CrawlOptions, Crawler};
use nano_index::domain::{LayoutMode, McVersionPolicy, RemotePath};
use nano_index::error::IndexError;
use nano_index::layout::detect_layout;
use nano_index::listing::XrdfsLister;
use nano_index::output::{JsonOutput, LayoutResult, OutputMode, SummaryResult, TextOutput};
use nano_index::store::CatalogStore;

#[derive(Parser)]
#[command(name = "nano-index")]
#[command(about = "Index privately produced NanoAOD files on an XRootD store")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[arg(long, global = true, help = "JSON config file (default: ./nano-index.json if present)")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Crawl the store and write {out-name}_{year}.json catalogs")]
    Crawl(CrawlArgs),
    #[command(about = "Detect the directory layout used by a user")]
    Layout(LayoutArgs),
    #[command(about = "Summarize existing catalog files")]
    Summary(SummaryArgs),
}

#[derive(Args, Clone)]
struct RemoteArgs {
    #[arg(long, help = "Base XRootD redirector")]
    redirector: Option<String>,

    #[arg(long, help = "Base directory for the XRootD search")]
    base_dir: Option<String>,

    #[arg(long, num_args = 1.., help = "Which years to index. By default searches all.")]
    years: Option<Vec<String>>,
}

#[derive(Args, Clone)]
struct CrawlArgs {
    #[command(flatten)]
    remote: RemoteArgs,

    #[arg(long, default_value = DEFAULT_OUT_NAME, help = "Output JSON name (year and .json are appended)")]
    out_name: String,

    #[arg(long, overrides_with = "no_append", help = "Append to existing JSON files (default)")]
    append: bool,

    #[arg(long, overrides_with = "append", help = "Overwrite existing JSON files")]
    no_append: bool,

    #[arg(long, help = "Overwrite an existing sample list in the JSON")]
    overwrite_sample: bool,

    #[arg(long, num_args = 1.., help = "Which users' directories. By default searches all.")]
    users: Option<Vec<String>>,

    #[arg(long, num_args = 1.., help = "Which samples to index. By default searches all.")]
    samples: Option<Vec<String>>,

    #[arg(long, num_args = 1.., help = "Which subsamples to index. By default searches all.")]
    subsamples: Option<Vec<String>>,

    #[arg(long, help = "File suffix to index")]
    suffix: Option<String>,

    #[arg(long, help = "Skip layout detection")]
    layout: Option<LayoutMode>,

    #[arg(long, help = "Dataset-version directories kept per MC subsample")]
    mc_versions: Option<McVersionPolicy>,

    #[arg(long, help = "Crawl (user, year, data|mc) branches in parallel")]
    jobs: Option<usize>,

    #[arg(long, help = "Crawl without writing catalog files")]
    dry_run: bool,
}

#[derive(Args)]
struct LayoutArgs {
    user: String,

    #[command(flatten)]
    remote: RemoteArgs,
}

#[derive(Args)]
struct SummaryArgs {
    #[arg(long, default_value = DEFAULT_OUT_NAME)]
    out_name: String,

    #[arg(long, num_args = 1..)]
    years: Option<Vec<String>>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<IndexError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &IndexError) -> u8 {
    match error {
        IndexError::Classification { .. } => 2,
        IndexError::NotFound { .. } | IndexError::Listing(_) | IndexError::MissingTool(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };
    let resolved = ConfigLoader::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Crawl(args) => run_crawl(args, resolved, output_mode),
        Commands::Layout(args) => run_layout(args, resolved, output_mode),
        Commands::Summary(args) => run_summary(args, resolved, output_mode),
    }
}

fn run_crawl(
    args: CrawlArgs,
    resolved: ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let append = args.append || !args.no_append;
    let dry_run = args.dry_run;
    let store = CatalogStore::new(args.out_name.clone());
    let options = build_options(args, resolved);

    let mut catalog = if append {
        store.load(&options.years)?
    } else {
        Catalog::new()
    };

    let lister = XrdfsLister::new(options.redirector.clone());
    let crawler = Crawler::new(lister, options);
    let report = crawler.crawl(&mut catalog)?;

    if dry_run {
        info!("dry run, not writing catalogs");
    } else {
        store.save(&catalog)?;
    }

    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_report(&report).into_diagnostic(),
        OutputMode::Interactive => {
            TextOutput::print_report(&report);
            Ok(())
        }
    }
}

fn build_options(args: CrawlArgs, resolved: ResolvedConfig) -> CrawlOptions {
    CrawlOptions {
        redirector: args.remote.redirector.unwrap_or(resolved.redirector),
        base_dir: RemotePath::new(args.remote.base_dir.unwrap_or(resolved.base_dir)),
        users: args.users,
        years: args.remote.years.unwrap_or(resolved.years),
        samples: args.samples,
        subsamples: args.subsamples,
        overwrite_sample: args.overwrite_sample,
        suffix: args.suffix.unwrap_or(resolved.suffix),
        data_samples: resolved.data_samples,
        layout: args.layout.or(resolved.layout),
        mc_versions: args.mc_versions.unwrap_or(resolved.mc_versions),
        jobs: args.jobs.unwrap_or(resolved.jobs).max(1),
    }
}

fn run_layout(
    args: LayoutArgs,
    resolved: ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let redirector = args.remote.redirector.unwrap_or(resolved.redirector);
    let base_dir = RemotePath::new(args.remote.base_dir.unwrap_or(resolved.base_dir));
    let years = args.remote.years.unwrap_or(resolved.years);

    let lister = XrdfsLister::new(redirector);
    let layout = detect_layout(&lister, &base_dir, &args.user, &years)?;
    let result = LayoutResult {
        user: args.user,
        layout,
    };

    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_layout(&result).into_diagnostic(),
        OutputMode::Interactive => {
            TextOutput::print_layout(&result);
            Ok(())
        }
    }
}

fn run_summary(
    args: SummaryArgs,
    resolved: ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let years = args.years.unwrap_or(resolved.years);
    let catalog = CatalogStore::new(args.out_name).load(&years)?;
    let result = SummaryResult::from_catalog(&catalog);

    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_summary(&result).into_diagnostic(),
        OutputMode::Interactive => {
            TextOutput::print_summary(&result);
            Ok(())
        }
    }
}
