//! The five-phase enumeration pipeline and its configuration

mod orchestrator;
mod tools;

pub use orchestrator::Pipeline;
pub use tools::Toolbox;

use clap::ValueEnum;
use std::path::PathBuf;

/// Phase-1 enumeration sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Source {
    /// Passive enumeration with subfinder
    Subfinder,
    /// Enumeration with amass
    Amass,
    /// Wordlist x target domain cross product
    SubGenerator,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::Subfinder, Source::Amass, Source::SubGenerator];

    /// Name used for the source's artifact (`<name>.out`) and in reports
    pub fn name(self) -> &'static str {
        match self {
            Source::Subfinder => "subfinder",
            Source::Amass => "amass",
            Source::SubGenerator => "sub-generator",
        }
    }
}

/// Commands invoking the external tools.
///
/// Each value is spliced verbatim at the start of the tool's command line, so it may carry
/// an interpreter or extra flags (`python3 /opt/dnsgen.py`). Quote paths with spaces.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub amass: String,
    pub subfinder: String,
    pub puredns: String,
    pub dnsgen: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            amass: "amass".to_string(),
            subfinder: "subfinder".to_string(),
            puredns: "puredns".to_string(),
            dnsgen: "dnsgen".to_string(),
        }
    }
}

/// Everything a pipeline run needs to know
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub program: String,
    pub programs_dir: PathBuf,
    /// Run directory name, `MM-DD-YYYY`
    pub date: String,
    pub sources: Vec<Source>,
    pub wordlist: PathBuf,
    pub resolvers: PathBuf,
    pub chunks: usize,
    /// Minutes
    pub amass_timeout: u64,
    pub wildcard: bool,
    /// Abort on the first bucket failure instead of isolating the bucket
    pub fail_fast: bool,
    /// Upper bound on concurrent per-bucket tool runs; `None` runs every bucket at once
    pub parallelism: Option<usize>,
    pub tools: ToolPaths,
    pub shell: String,
    pub show_progress: bool,
}

impl PipelineConfig {
    /// Defaults for `program` under `./Programs`, dated today
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            programs_dir: PathBuf::from("./Programs"),
            date: today(),
            sources: Source::ALL.to_vec(),
            wordlist: PathBuf::from("./wordlists/httparchive_subdomains_2022_12_28.txt"),
            resolvers: PathBuf::from("./wordlists/resolvers.txt"),
            chunks: 20,
            amass_timeout: 45,
            wildcard: false,
            fail_fast: false,
            parallelism: None,
            tools: ToolPaths::default(),
            shell: "bash".to_string(),
            show_progress: true,
        }
    }
}

/// Today's date as a run directory name
pub fn today() -> String {
    chrono::Local::now().format("%m-%d-%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_names_match_cli_values() {
        for source in Source::ALL {
            let value = source.to_possible_value().unwrap();
            assert_eq!(value.get_name(), source.name());
        }
    }

    #[test]
    fn today_is_month_day_year() {
        let date = today();
        let parts: Vec<&str> = date.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 2);
        assert_eq!(parts[1].len(), 2);
        assert_eq!(parts[2].len(), 4);
    }
}
