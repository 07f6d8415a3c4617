use std::path::PathBuf;

use clap::{Parser, Subcommand};
use export_docs::bootstrap::{self, Page, RenderRequest};
use export_docs::config::Config;
use export_docs::graph::ContainmentGraph;
use export_docs::io::source::{DefaultFetcher, SourceSpec, load_schema};
use export_docs::render::{RenderContext, ViewMode, csv_table};
use export_docs::validate::{self, FieldIndex};
use export_docs::{Result, ToolError, logging, sync};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    logging::init(cli.verbose)?;
    let config = Config::load(cli.config.as_deref())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match cli.command {
        Command::Render(args) => runtime.block_on(execute_render(&config, args)),
        Command::Nav(args) => runtime.block_on(execute_nav(&config, args)),
        Command::Validate(args) => runtime.block_on(execute_validate(&config, args)),
        Command::Sync(args) => execute_sync(args),
    }
}

async fn execute_render(config: &Config, args: RenderArgs) -> Result<()> {
    let request = RenderRequest {
        source: args.source.resolve(config),
        mode: args.mode,
        prefix: args.prefix.clone(),
        sheets_override: args.source.sheets.as_deref().map(|s| config.resolve_sheet(s)),
    };
    let mut page = Page::with_anchors(&args.prefix);
    let outcome =
        bootstrap::init_export_docs(&request, &config.render_settings(), &mut page, &DefaultFetcher::new())
            .await;

    // The page is written even when loading failed so it shows the error.
    std::fs::write(&args.output, page.to_html(&args.title))?;
    outcome
}

async fn execute_nav(config: &Config, args: NavArgs) -> Result<()> {
    let settings = config.render_settings();
    let source = args.source.effective(config);
    let schema = load_schema(&source, &DefaultFetcher::new(), &settings.load).await?;
    let graph = ContainmentGraph::build(&schema, settings.roots.clone());
    let ctx = RenderContext::new(&schema, &graph, &settings.render);
    std::fs::write(&args.output, csv_table::render_csv_nav(&ctx))?;
    Ok(())
}

async fn execute_validate(config: &Config, args: ValidateArgs) -> Result<()> {
    if !args.fixtures.exists() {
        return Err(ToolError::MissingInput(args.fixtures));
    }
    let settings = config.render_settings();
    let source = args.source.effective(config);
    let schema = load_schema(&source, &DefaultFetcher::new(), &settings.load).await?;
    let index = FieldIndex::build(&schema);
    println!(
        "Documented CSV columns: {}\nDocumented JSON objects: {}",
        index.csv_columns.len(),
        index.json_fields.len()
    );

    let reports = validate::validate_fixture_dir(&args.fixtures, &index, &settings.roots)?;
    let mut error_count = 0;
    for report in &reports {
        let name = report
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if report.is_ok() {
            println!("  {name}: OK");
        } else {
            println!("{name}:");
            for error in &report.errors {
                println!("  - {error}");
            }
            error_count += report.errors.len();
        }
    }

    if error_count > 0 {
        return Err(ToolError::ValidationFailed(error_count));
    }
    println!("All fixtures validated successfully!");
    Ok(())
}

fn execute_sync(args: SyncArgs) -> Result<()> {
    if !args.schema_dir.exists() {
        return Err(ToolError::MissingInput(args.schema_dir));
    }
    let summaries = sync::sync_to_workbook(&args.schema_dir, &args.output, args.dry_run)?;
    let verb = if args.dry_run { "Would write" } else { "Wrote" };
    for summary in summaries {
        println!(
            "{verb} {} rows to sheet '{}'",
            summary.rows, summary.sheet_name
        );
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Render, validate and sync export schema documentation."
)]
struct Cli {
    /// Configuration file (defaults to ./export-docs.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render one documentation view into an HTML page.
    Render(RenderArgs),
    /// Render the CSV section navigation bar.
    Nav(NavArgs),
    /// Check export fixtures against the documented schema.
    Validate(ValidateArgs),
    /// Write the schema CSVs into one workbook.
    Sync(SyncArgs),
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Directory, base URL, `.xlsx` workbook or `sheets:<id>`.
    #[arg(long)]
    source: Option<String>,

    /// Spreadsheet id, or a spreadsheet name declared in the configuration,
    /// replacing the source.
    #[arg(long)]
    sheets: Option<String>,
}

impl SourceArgs {
    fn resolve(&self, config: &Config) -> SourceSpec {
        let raw = self
            .source
            .clone()
            .or_else(|| config.source.base.clone())
            .unwrap_or_default();
        match raw.parse::<SourceSpec>() {
            Ok(spec) => spec,
            Err(never) => match never {},
        }
    }

    fn effective(&self, config: &Config) -> SourceSpec {
        match &self.sheets {
            Some(sheet) => SourceSpec::SpreadsheetId(config.resolve_sheet(sheet)),
            None => self.resolve(config),
        }
    }
}

#[derive(clap::Args)]
struct RenderArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// View to render.
    #[arg(long, value_enum)]
    mode: ViewMode,

    /// Prefix of the `<prefix>-loading` and `<prefix>-content` elements.
    #[arg(long, default_value = "docs")]
    prefix: String,

    /// Output HTML file.
    #[arg(long)]
    output: PathBuf,

    /// Title of the generated page.
    #[arg(long, default_value = "Export documentation")]
    title: String,
}

#[derive(clap::Args)]
struct NavArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Output HTML fragment.
    #[arg(long)]
    output: PathBuf,
}

#[derive(clap::Args)]
struct ValidateArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Directory holding `*.csv` and `*.json` export fixtures.
    #[arg(long)]
    fixtures: PathBuf,
}

#[derive(clap::Args)]
struct SyncArgs {
    /// Directory holding objects.csv, fields.csv and enum_values.csv.
    #[arg(long)]
    schema_dir: PathBuf,

    /// Output workbook path.
    #[arg(long)]
    output: PathBuf,

    /// Only report what would be written.
    #[arg(long)]
    dry_run: bool,
}
