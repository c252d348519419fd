//! CLI argument definitions using clap derive

use crate::pipeline::{today, PipelineConfig, Source, ToolPaths};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "subrecon",
    version,
    about = "Subdomain enumeration pipeline: enumerate, classify, resolve, permute, re-resolve",
    long_about = None,
    after_help = "SETUP:\n   mkdir -p ./Programs/<PROGRAM>/recon-data\n   \
                  echo example.com > ./Programs/<PROGRAM>/recon-data/domains.txt\n   \
                  subrecon <PROGRAM>"
)]
pub struct Cli {
    /// Program name; domains are read from <PROGRAMS_DIR>/<PROGRAM>/recon-data/domains.txt
    #[arg(value_name = "PROGRAM")]
    pub program: String,

    /// Directory holding one folder per program
    #[arg(long, default_value = "./Programs", value_name = "DIR")]
    pub programs_dir: PathBuf,

    /// Run date directory name (default: today, MM-DD-YYYY)
    #[arg(long, value_name = "DATE")]
    pub date: Option<String>,

    /// Comma-separated enumeration sources
    #[arg(
        long,
        value_enum,
        value_delimiter = ',',
        default_values = ["subfinder", "amass", "sub-generator"],
        value_name = "TOOLS"
    )]
    pub tools: Vec<Source>,

    /// Maximum runtime for amass, in minutes
    #[arg(long = "amass-timeout", default_value = "45", value_name = "MINUTES")]
    pub amass_timeout: u64,

    /// Run puredns with wildcard filtering (slow)
    #[arg(long)]
    pub wildcard: bool,

    /// Wordlist for the subdomain generator
    #[arg(
        short,
        long,
        default_value = "./wordlists/httparchive_subdomains_2022_12_28.txt",
        value_name = "FILE"
    )]
    pub wordlist: PathBuf,

    /// Trusted resolvers passed to puredns
    #[arg(short, long, default_value = "./wordlists/resolvers.txt", value_name = "FILE")]
    pub resolvers: PathBuf,

    /// Number of wordlist chunks generated in parallel
    #[arg(long, default_value = "20", value_name = "N",
          value_parser = clap::value_parser!(u64).range(1..))]
    pub chunks: u64,

    /// Maximum concurrent per-domain tool runs (default: all domains at once)
    #[arg(short, long, value_name = "N",
          value_parser = clap::value_parser!(u64).range(1..))]
    pub threads: Option<u64>,

    /// Abort the whole run when any domain fails instead of skipping that domain
    #[arg(long)]
    pub fail_fast: bool,

    /// Command used to invoke amass
    #[arg(long, default_value = "amass", value_name = "PATH")]
    pub amass_path: String,

    /// Command used to invoke subfinder
    #[arg(long, default_value = "subfinder", value_name = "PATH")]
    pub subfinder_path: String,

    /// Command used to invoke puredns
    #[arg(long, default_value = "puredns", value_name = "PATH")]
    pub puredns_path: String,

    /// Command used to invoke dnsgen
    #[arg(long, default_value = "dnsgen", value_name = "PATH")]
    pub dnsgen_path: String,

    /// Shell used to run the tools
    #[arg(long, default_value = "bash", value_name = "SHELL")]
    pub shell: String,

    /// Suppress banner and informational output
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose diagnostics (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable progress bars
    #[arg(short = 'z', long)]
    pub no_progress: bool,

    /// No color output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Enumeration sources in the given order, without repeats
    pub fn parse_sources(&self) -> Vec<Source> {
        let mut sources = Vec::with_capacity(self.tools.len());
        for source in &self.tools {
            if !sources.contains(source) {
                sources.push(*source);
            }
        }
        sources
    }

    pub fn to_config(&self) -> PipelineConfig {
        PipelineConfig {
            program: self.program.clone(),
            programs_dir: self.programs_dir.clone(),
            date: self.date.clone().unwrap_or_else(today),
            sources: self.parse_sources(),
            wordlist: self.wordlist.clone(),
            resolvers: self.resolvers.clone(),
            chunks: self.chunks as usize,
            amass_timeout: self.amass_timeout,
            wildcard: self.wildcard,
            fail_fast: self.fail_fast,
            parallelism: self.threads.map(|t| t as usize),
            tools: ToolPaths {
                amass: self.amass_path.clone(),
                subfinder: self.subfinder_path.clone(),
                puredns: self.puredns_path.clone(),
                dnsgen: self.dnsgen_path.clone(),
            },
            shell: self.shell.clone(),
            show_progress: !(self.quiet || self.no_progress),
        }
    }
}
