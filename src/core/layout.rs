//! On-disk layout of a program's recon runs

use crate::error::{ReconError, Result};
use std::path::{Path, PathBuf};

/// Per-bucket artifacts, one per pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    /// Classified candidates
    Subdomains,
    /// First bulk resolution
    Resolved,
    /// Permutations of the resolved names
    Permutations,
    /// Bulk resolution of the permutations
    ResolvedPermutations,
}

impl Artifact {
    fn suffix(self) -> &'static str {
        match self {
            Artifact::Subdomains => "subdomains",
            Artifact::Resolved => "puredns",
            Artifact::Permutations => "dnsgen",
            Artifact::ResolvedPermutations => "dnsgen-puredns",
        }
    }
}

/// Paths for one program and run date:
///
/// ```text
/// <programs>/<program>/recon-data/domains.txt
/// <programs>/<program>/<date>/...
/// <programs>/<program>/<date>/top-level-domains/<domain>/<domain>-<stage>.out
/// ```
#[derive(Debug, Clone)]
pub struct RunLayout {
    program_dir: PathBuf,
    run_dir: PathBuf,
}

impl RunLayout {
    pub fn new(programs_dir: &Path, program: &str, date: &str) -> Self {
        let program_dir = programs_dir.join(program);
        let run_dir = program_dir.join(date);
        Self {
            program_dir,
            run_dir,
        }
    }

    pub fn domains_file(&self) -> PathBuf {
        self.program_dir.join("recon-data").join("domains.txt")
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn top_level_domains_dir(&self) -> PathBuf {
        self.run_dir.join("top-level-domains")
    }

    /// Output of a named enumeration source, e.g. `amass.out`
    pub fn source_output(&self, name: &str) -> PathBuf {
        self.run_dir.join(format!("{}.out", name))
    }

    pub fn combined(&self) -> PathBuf {
        self.run_dir.join("all_enumerated_subdomains_combined.txt")
    }

    pub fn combined_unique(&self) -> PathBuf {
        self.run_dir.join("all_enumerated_subdomains_combined_unique.txt")
    }

    pub fn bucket_dir(&self, domain: &str) -> PathBuf {
        self.top_level_domains_dir().join(domain)
    }

    pub fn bucket_artifact(&self, domain: &str, artifact: Artifact) -> PathBuf {
        self.bucket_dir(domain)
            .join(format!("{}-{}.out", domain, artifact.suffix()))
    }

    pub fn final_list(&self) -> PathBuf {
        self.run_dir.join("final_list.out")
    }

    pub fn final_list_unique(&self) -> PathBuf {
        self.run_dir.join("final_list_unique.out")
    }

    pub fn summary(&self) -> PathBuf {
        self.run_dir.join("summary.json")
    }

    /// Create the run directory tree
    pub async fn create_run_dirs(&self) -> Result<()> {
        let dir = self.top_level_domains_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ReconError::write(dir, e))
    }

    /// Create one bucket directory per working domain
    pub async fn create_bucket_dirs(&self, domains: &[String]) -> Result<()> {
        for domain in domains {
            let dir = self.bucket_dir(domain);
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| ReconError::write(dir, e))?;
        }
        Ok(())
    }
}
