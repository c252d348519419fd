//! Adapters for the external tools: enumeration sources, bulk resolver, permutation generator

use super::{PipelineConfig, ToolPaths};
use crate::core::{shell_quote, write_lines, Capture, Invocation, ToolRunner};
use crate::error::Result;
use std::path::{Path, PathBuf};

/// Builds tool command lines and runs them
#[derive(Debug, Clone)]
pub struct Toolbox {
    runner: ToolRunner,
    paths: ToolPaths,
    resolvers: PathBuf,
    amass_timeout: u64,
    wildcard: bool,
}

impl Toolbox {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            runner: ToolRunner::new(config.shell.clone()),
            paths: config.tools.clone(),
            resolvers: config.resolvers.clone(),
            amass_timeout: config.amass_timeout,
            wildcard: config.wildcard,
        }
    }

    pub fn amass(&self, domains_file: &Path, output: &Path) -> Invocation {
        Invocation::new(
            "amass",
            format!(
                "{} enum -timeout {} -df {} -o {}",
                self.paths.amass,
                self.amass_timeout,
                quote_path(domains_file),
                quote_path(output)
            ),
        )
    }

    pub fn subfinder(&self, domains_file: &Path, output: &Path) -> Invocation {
        Invocation::new(
            "subfinder",
            format!(
                "{} -dL {} -o {}",
                self.paths.subfinder,
                quote_path(domains_file),
                quote_path(output)
            ),
        )
    }

    pub fn puredns(&self, input: &Path) -> Invocation {
        let wildcard_flag = if self.wildcard {
            "--wildcard-batch 1500000"
        } else {
            "--skip-wildcard-filter"
        };
        Invocation::new(
            "puredns",
            format!(
                "{} resolve {} --rate-limit-trusted 1000 {} -r {}",
                self.paths.puredns,
                quote_path(input),
                wildcard_flag,
                quote_path(&self.resolvers)
            ),
        )
    }

    /// dnsgen streams to stdout and tees into `output`; `pipefail` keeps its exit status
    pub fn dnsgen(&self, input: &Path, output: &Path) -> Invocation {
        Invocation::new(
            "dnsgen",
            format!(
                "set -o pipefail; {} {} | tee {}",
                self.paths.dnsgen,
                quote_path(input),
                quote_path(output)
            ),
        )
    }

    /// Run an enumeration source that writes its own output file; returns streamed line count
    pub async fn enumerate<F>(&self, invocation: &Invocation, on_first_line: F) -> Result<usize>
    where
        F: FnOnce() + Send + 'static,
    {
        let output = self.runner.run(invocation, Capture::Count, on_first_line).await?;
        Ok(output.lines)
    }

    /// Bulk-resolve `input`, writing the lower-cased survivors to `output`
    pub async fn resolve(&self, input: &Path, output: &Path) -> Result<usize> {
        let result = self
            .runner
            .run(&self.puredns(input), Capture::Lowercase, || {})
            .await?;
        write_lines(output, &result.captured).await?;
        Ok(result.lines)
    }

    /// Generate permutations of `input` into `output`; returns the number generated
    pub async fn permute(&self, input: &Path, output: &Path) -> Result<usize> {
        let result = self
            .runner
            .run(&self.dnsgen(input, output), Capture::Count, || {})
            .await?;
        Ok(result.lines)
    }
}

fn quote_path(path: &Path) -> String {
    shell_quote(&path.to_string_lossy())
}
