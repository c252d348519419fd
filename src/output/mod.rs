//! Console reporting, progress bars and file output

mod console;
mod file;
mod progress;

pub use console::{print_banner, ConsoleReporter, MemoryReporter, Reporter, SilentReporter};
pub use file::{BucketSummary, FileWriter, RunSummary};
pub use progress::ProgressTracker;
