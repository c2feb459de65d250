use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use serde::Serialize;
use submittal_engine::{build_report, merge_rows_with_summary, MergeSummary, ReportRequest};
use submittal_model::import::{read_csv_rows, read_workbook_rows, ImportOptions};
use submittal_model::{
    documents_from_rows, workflows_from_rows, ColumnMap, KeyedRow, MergedRecord,
};
use submittal_storage::{ProjectStore, UploadKind};

#[derive(Debug, Parser)]
#[command(name = "submittal")]
#[command(about = "Merge document/workflow exports and derive submittal dashboard reports.")]
struct Cli {
    /// Log at debug level (RUST_LOG still wins when set).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Merge two exports and print the merged records as JSON.
    Merge(MergeArgs),
    /// Compute the dashboard report from exports or a saved project.
    Report(ReportArgs),
    /// Merge two exports and save them as a project.
    Save(SaveArgs),
    /// List saved projects.
    List(DbArgs),
}

#[derive(Debug, Args)]
struct ExportArgs {
    /// Document register export (CSV or workbook).
    #[arg(long)]
    documents: PathBuf,

    /// Workflow export (CSV or workbook).
    #[arg(long)]
    workflows: PathBuf,

    /// Banner rows to skip before the header row in both exports [default: 0].
    #[arg(long)]
    skip_rows: Option<usize>,

    /// Override `--skip-rows` for the workflow export.
    #[arg(long)]
    workflow_skip_rows: Option<usize>,

    /// CSV field delimiter [default: ','].
    #[arg(long)]
    delimiter: Option<char>,

    /// Worksheet to read from workbook exports (first sheet when omitted).
    #[arg(long)]
    sheet: Option<String>,
}

#[derive(Debug, Args)]
struct DbArgs {
    /// SQLite project store.
    #[arg(long)]
    db: PathBuf,
}

#[derive(Debug, Args)]
struct MergeArgs {
    #[command(flatten)]
    exports: ExportArgs,

    /// Report/merge configuration (JSON); only the `merge` section is used here.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Args)]
struct ReportArgs {
    /// Document register export; pair with `--workflows`.
    #[arg(long, requires = "workflows", conflicts_with = "db")]
    documents: Option<PathBuf>,

    /// Workflow export; pair with `--documents`.
    #[arg(long, requires = "documents", conflicts_with = "db")]
    workflows: Option<PathBuf>,

    #[arg(long)]
    skip_rows: Option<usize>,

    #[arg(long)]
    workflow_skip_rows: Option<usize>,

    #[arg(long)]
    delimiter: Option<char>,

    #[arg(long)]
    sheet: Option<String>,

    /// Read records from this store instead of exports (requires `--project`).
    #[arg(long, requires = "project")]
    db: Option<PathBuf>,

    #[arg(long, requires = "db")]
    project: Option<String>,

    /// Report configuration (JSON).
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    pretty: bool,
}

impl ReportArgs {
    /// The export pair, when records come from files rather than the store.
    fn exports(&self) -> Option<ExportArgs> {
        let (documents, workflows) = (self.documents.clone()?, self.workflows.clone()?);
        Some(ExportArgs {
            documents,
            workflows,
            skip_rows: self.skip_rows,
            workflow_skip_rows: self.workflow_skip_rows,
            delimiter: self.delimiter,
            sheet: self.sheet.clone(),
        })
    }
}

#[derive(Debug, Args)]
struct SaveArgs {
    #[command(flatten)]
    exports: ExportArgs,

    #[command(flatten)]
    db: DbArgs,

    #[arg(long)]
    project: String,

    /// Display name; defaults to the project number.
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveOutput {
    project_number: String,
    project_name: String,
    summary: MergeSummary,
    document_upload: i64,
    workflow_upload: i64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Merge(args) => {
            let request = load_request(args.config.as_deref())?;
            let (records, _) = merge_exports(&args.exports, &request)?.merged;
            print_json(&records, args.pretty)
        }
        Command::Report(args) => {
            let request = load_request(args.config.as_deref())?;
            let records = match (&args.db, &args.project, args.exports()) {
                (Some(db), Some(project), _) => {
                    let store = open_store(db)?;
                    store
                        .get(project)
                        .with_context(|| format!("load project {project}"))?
                        .records
                }
                (None, _, Some(exports)) => merge_exports(&exports, &request)?.merged.0,
                _ => bail!("pass either --documents/--workflows or --db with --project"),
            };
            let report = build_report(&records, &request);
            print_json(&report, args.pretty)
        }
        Command::Save(args) => {
            let request = load_request(args.config.as_deref())?;
            let imported = merge_exports(&args.exports, &request)?;
            let (records, summary) = imported.merged;
            let name = args.name.unwrap_or_else(|| args.project.clone());

            let store = open_store(&args.db.db)?;
            store
                .save(&args.project, &records, &name)
                .with_context(|| format!("save project {}", args.project))?;
            let document_upload = store
                .append_upload(&args.project, UploadKind::Documents, &imported.documents)
                .context("store document upload")?;
            let workflow_upload = store
                .append_upload(&args.project, UploadKind::Workflows, &imported.workflows)
                .context("store workflow upload")?;

            print_json(
                &SaveOutput {
                    project_number: args.project,
                    project_name: name,
                    summary,
                    document_upload,
                    workflow_upload,
                },
                false,
            )
        }
        Command::List(args) => {
            let store = open_store(&args.db)?;
            print_json(&store.list().context("list projects")?, false)
        }
    }
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    });
    // RUST_LOG overrides the flag.
    builder.parse_default_env();
    let _ = builder.try_init();
}

fn load_request(path: Option<&Path>) -> Result<ReportRequest> {
    let Some(path) = path else {
        return Ok(ReportRequest::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse config {}", path.display()))
}

fn open_store(path: &Path) -> Result<ProjectStore> {
    ProjectStore::open_path(path).with_context(|| format!("open project store {}", path.display()))
}

struct Imported {
    documents: Vec<KeyedRow>,
    workflows: Vec<KeyedRow>,
    merged: (Vec<MergedRecord>, MergeSummary),
}

fn merge_exports(args: &ExportArgs, request: &ReportRequest) -> Result<Imported> {
    let delimiter = args.delimiter.unwrap_or(',');
    let delimiter = u8::try_from(delimiter)
        .with_context(|| format!("delimiter {delimiter:?} is not a single byte"))?;
    let skip_rows = args.skip_rows.unwrap_or(0);
    let base = ImportOptions {
        skip_rows,
        delimiter,
        sheet: args.sheet.clone(),
        ..ImportOptions::default()
    };
    let workflow_options = ImportOptions {
        skip_rows: args.workflow_skip_rows.unwrap_or(skip_rows),
        ..base.clone()
    };

    let documents = read_rows(&args.documents, &base)?;
    let workflows = read_rows(&args.workflows, &workflow_options)?;
    let document_rows = documents_from_rows(&documents, &ColumnMap::documents());
    let workflow_rows = workflows_from_rows(&workflows, &ColumnMap::workflows());
    if document_rows.is_empty() && workflow_rows.is_empty() {
        log::warn!("neither export contained a row with a document number");
    }

    let merged = merge_rows_with_summary(&document_rows, &workflow_rows, &request.merge);
    log::info!(
        "merged {} records ({} matched, {} document-only, {} orphan workflow)",
        merged.0.len(),
        merged.1.matched,
        merged.1.document_only,
        merged.1.orphan_workflow
    );
    Ok(Imported {
        documents,
        workflows,
        merged,
    })
}

fn read_rows(path: &Path, options: &ImportOptions) -> Result<Vec<KeyedRow>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let rows = match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook_rows(path, options),
        _ => {
            let file =
                File::open(path).with_context(|| format!("open export {}", path.display()))?;
            read_csv_rows(BufReader::new(file), options)
        }
    };
    let rows = rows.with_context(|| format!("read export {}", path.display()))?;
    log::debug!("read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn print_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("serialize output")?;
    println!("{json}");
    Ok(())
}
