pub mod compare;
pub mod config;
pub mod dupes;
pub mod error;
pub mod export;
pub mod hasher;
pub mod model;
pub mod progress;
pub mod replicate;
pub mod scanner;
pub mod utils;

pub use config::AppConfig;
pub use error::Error;
pub use model::{Entry, EntryKind};
pub use progress::{CancelFlag, ProgressReporter, SilentReporter};
pub use scanner::ScanFilter;
