use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "folder-scanner")]
#[command(about = "Inventory, compare, deduplicate and replicate folder trees", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the folders (and optionally files) under a root
    Catalog {
        /// Folder to scan
        root: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Find duplicate files under a root
    Duplicates {
        /// Folder to scan
        root: PathBuf,
        /// How files are judged identical
        #[arg(long, value_enum, default_value_t = Strategy::Content)]
        strategy: Strategy,
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Compare two folder trees entry by entry
    Compare {
        left: PathBuf,
        right: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Recreate a folder tree under a destination
    Replicate {
        source: PathBuf,
        destination: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Include files, not only folders
    #[arg(long)]
    pub files: bool,
    /// Only include files ending with one of these suffixes (e.g. .pdf)
    #[arg(long = "ext", value_delimiter = ',')]
    pub extensions: Vec<String>,
    /// Folder names to skip along with everything below them
    #[arg(long = "exclude", value_delimiter = ',')]
    pub excluded_folders: Vec<String>,
}

#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Write the report to this CSV file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Identical bytes (BLAKE3 digest)
    Content,
    /// Same file name, ignoring case
    Name,
}
