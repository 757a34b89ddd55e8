mod commands;
mod logging;
mod progress;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, FilterArgs, Strategy};
use dotenv::dotenv;
use folder_scanner_core::compare::{self, ComparisonSummary};
use folder_scanner_core::dupes::{self, DuplicateStrategy};
use folder_scanner_core::{
    export, model, replicate, scanner, AppConfig, CancelFlag, ScanFilter,
};
use progress::CliReporter;
use tracing::{error, info, warn};

/// Exit status after Ctrl-C, as shells report an interrupted command.
const EXIT_CANCELLED: i32 = 130;

fn main() {
    dotenv().ok();

    let config = match folder_scanner_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{} {}", "Error loading configuration:".red(), err);
            process::exit(1);
        }
    };

    let guard = logging::init_logger(&config.logging);

    let args = Cli::parse();

    let cancel = CancelFlag::new();
    let handler_flag = cancel.clone();
    if let Err(err) = ctrlc::set_handler(move || handler_flag.cancel()) {
        warn!("Ctrl-C will not cancel the running operation: {}", err);
    }
    let session = Session {
        cancel,
        status_batch: config.status_batch,
    };

    let result = match args.command {
        Some(Commands::Catalog {
            root,
            filter,
            output,
        }) => run_catalog(&session, &root, build_filter(&config, &filter), output.output),
        Some(Commands::Duplicates {
            root,
            strategy,
            filter,
            output,
        }) => run_duplicates(
            &session,
            &root,
            strategy,
            build_filter(&config, &filter),
            output.output,
        ),
        Some(Commands::Compare {
            left,
            right,
            output,
        }) => run_compare(&session, &left, &right, output.output),
        Some(Commands::Replicate {
            source,
            destination,
            filter,
            output,
        }) => run_replicate(
            &session,
            &source,
            &destination,
            build_filter(&config, &filter),
            output.output,
        ),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    let code = match result {
        Err(err) => {
            error!("Error: {:#}", err);
            1
        }
        Ok(()) if session.cancel.is_set() => {
            warn!("Cancelled; results above are partial");
            println!("{}", "Cancelled by user, results are partial".yellow());
            EXIT_CANCELLED
        }
        Ok(()) => 0,
    };

    // Flush the file log before exiting.
    drop(guard);
    process::exit(code);
}

/// State shared by every subcommand: the Ctrl-C flag and status cadence.
struct Session {
    cancel: CancelFlag,
    status_batch: usize,
}

impl Session {
    fn reporter(&self) -> CliReporter {
        CliReporter::new(self.status_batch)
    }
}

/// Command-line values win; configuration fills in whatever was not given.
fn build_filter(config: &AppConfig, args: &FilterArgs) -> ScanFilter {
    let extensions = if args.extensions.is_empty() {
        &config.extensions
    } else {
        &args.extensions
    };
    let excluded = if args.excluded_folders.is_empty() {
        &config.excluded_folders
    } else {
        &args.excluded_folders
    };

    ScanFilter::all()
        .include_files(args.files || config.include_files)
        .with_extensions(extensions)
        .with_excluded_folders(excluded)
}

fn write_report<T: serde::Serialize>(output: Option<PathBuf>, rows: &[T]) -> anyhow::Result<()> {
    if let Some(path) = output {
        export::write_csv(&path, rows)
            .with_context(|| format!("writing report to {}", path.display()))?;
        println!("Report saved to {}", path.display().to_string().green());
    }
    Ok(())
}

fn run_catalog(
    session: &Session,
    root: &Path,
    filter: ScanFilter,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let reporter = session.reporter();
    let entries = scanner::scan(root, &filter, &session.cancel.attach(&reporter));
    reporter.finish();
    let entries = entries?;

    let folders = entries.iter().filter(|e| e.is_folder()).count();
    info!(
        "{} folders, {} files",
        format!("{}", folders).cyan(),
        format!("{}", entries.len() - folders).cyan(),
    );
    write_report(output, &model::catalog_rows(&entries))
}

fn run_duplicates(
    session: &Session,
    root: &Path,
    strategy: Strategy,
    filter: ScanFilter,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let strategy = match strategy {
        Strategy::Content => DuplicateStrategy::Content,
        Strategy::Name => DuplicateStrategy::Name,
    };

    let reporter = session.reporter();
    let cancellable = session.cancel.attach(&reporter);
    let groups = scanner::scan(root, &filter.include_files(true), &cancellable)
        .map(|entries| dupes::find_duplicates(&entries, strategy, &cancellable));
    reporter.finish();
    let groups = groups?;

    let stats = dupes::statistics(&groups);
    info!(
        "{} duplicate groups, {} files with duplicates, {} bytes ({} MB) wasted",
        format!("{}", stats.total_groups).red(),
        format!("{}", stats.total_duplicate_files).red(),
        format!("{}", stats.wasted_bytes).red(),
        format!("{:.2}", stats.wasted_megabytes()).red(),
    );
    write_report(output, &dupes::format_for_export(&groups))
}

fn run_compare(
    session: &Session,
    left: &Path,
    right: &Path,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let reporter = session.reporter();
    let records = compare::compare(left, right, &session.cancel.attach(&reporter));
    reporter.finish();
    let records = records?;

    print_summary(&compare::summarize(&records));
    write_report(output, &compare::comparison_rows(&records))
}

fn print_summary(summary: &ComparisonSummary) {
    println!("Total items:    {}", summary.total);
    println!("Same:           {}", format!("{}", summary.same).green());
    println!("Modified:       {}", format!("{}", summary.modified).yellow());
    println!("Only in left:   {}", format!("{}", summary.only_in_left).cyan());
    println!("Only in right:  {}", format!("{}", summary.only_in_right).cyan());
    println!("Type mismatch:  {}", format!("{}", summary.type_mismatch).red());
}

fn run_replicate(
    session: &Session,
    source: &Path,
    destination: &Path,
    filter: ScanFilter,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let reporter = session.reporter();
    let records = replicate::replicate(
        source,
        destination,
        &filter,
        &session.cancel.attach(&reporter),
    );
    reporter.finish();
    let records = records?;

    let failed = records.iter().filter(|r| r.status.is_failure()).count();
    info!(
        "{} items replicated, {} failed",
        format!("{}", records.len() - failed).green(),
        format!("{}", failed).red(),
    );
    write_report(output, &replicate::replication_rows(&records))
}
