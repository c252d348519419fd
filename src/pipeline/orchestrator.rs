//! Pipeline orchestrator: generate -> consolidate -> resolve -> permute -> re-resolve -> finalize
//!
//! Each phase fans out its tasks and joins them before the next phase starts. Phase 1,
//! consolidation and finalization are all-or-nothing. The three per-bucket phases isolate
//! failures: a failed bucket is reported, recorded and skipped from then on, unless
//! `fail_fast` is set.

use super::{PipelineConfig, Source, Toolbox};
use crate::core::{
    classify, combine_and_dedup, dedup, generate_candidates, load_wordlist, normalize_domain,
    resolve_redundancies, split_into_chunks, write_lines, Artifact, Invocation, RunLayout,
};
use crate::error::{ReconError, Result};
use crate::output::{BucketSummary, FileWriter, ProgressTracker, Reporter, RunSummary};
use futures::future::{self, BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// The per-bucket phases, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Resolve,
    Permute,
    ResolvePermutations,
}

impl Stage {
    fn input(self) -> Artifact {
        match self {
            Stage::Resolve => Artifact::Subdomains,
            Stage::Permute => Artifact::Resolved,
            Stage::ResolvePermutations => Artifact::Permutations,
        }
    }

    fn output(self) -> Artifact {
        match self {
            Stage::Resolve => Artifact::Resolved,
            Stage::Permute => Artifact::Permutations,
            Stage::ResolvePermutations => Artifact::ResolvedPermutations,
        }
    }

    fn tool(self) -> &'static str {
        match self {
            Stage::Resolve | Stage::ResolvePermutations => "puredns",
            Stage::Permute => "dnsgen",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Stage::Resolve => "Starting reverse DNS bruteforcing",
            Stage::Permute => "Starting permutation generation via dnsgen",
            Stage::ResolvePermutations => {
                "Starting second round of reverse DNS bruteforcing against the dnsgen output"
            }
        }
    }

    fn record(self, bucket: &mut BucketSummary, count: usize) {
        match self {
            Stage::Resolve => bucket.resolved = count,
            Stage::Permute => bucket.permutations = count,
            Stage::ResolvePermutations => bucket.resolved_permutations = count,
        }
    }
}

/// Progress of one working domain through the per-bucket phases
struct BucketRun {
    summary: BucketSummary,
    completed: Option<Stage>,
}

impl BucketRun {
    fn is_active(&self) -> bool {
        self.summary.error.is_none()
    }

    fn has_completed(&self, stage: Stage) -> bool {
        self.completed.is_some_and(|done| done >= stage)
    }
}

/// Runs the whole pipeline for one program
pub struct Pipeline {
    config: PipelineConfig,
    layout: RunLayout,
    tools: Toolbox,
    reporter: Arc<dyn Reporter>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, reporter: Arc<dyn Reporter>) -> Self {
        let layout = RunLayout::new(&config.programs_dir, &config.program, &config.date);
        let tools = Toolbox::new(&config);
        Self {
            config,
            layout,
            tools,
            reporter,
        }
    }

    pub fn layout(&self) -> &RunLayout {
        &self.layout
    }

    /// Run every phase in order and write the run summary
    pub async fn run(&self) -> Result<RunSummary> {
        let started = Instant::now();

        let targets = self.setup().await?;
        let mut summary = RunSummary {
            program: self.config.program.clone(),
            date: self.config.date.clone(),
            target_domains: targets.clone(),
            ..Default::default()
        };

        // Phase 1
        summary.generated = self.enumerate(&targets).await?;

        // Phase 2
        let mut buckets = self.consolidate(&targets, &mut summary).await?;

        // Phases 3-5
        for stage in [Stage::Resolve, Stage::Permute, Stage::ResolvePermutations] {
            self.run_stage(stage, &mut buckets).await?;
        }

        // Phase 6
        summary.final_count = self.finalize(&buckets).await?;
        summary.buckets = buckets.into_iter().map(|b| b.summary).collect();
        summary.elapsed_secs = started.elapsed().as_secs_f64();
        summary.write(&self.layout.summary()).await?;

        let failed = summary.failed_buckets();
        if failed > 0 {
            self.reporter.warn(&format!(
                "{} of {} domains failed; see {}",
                failed,
                summary.buckets.len(),
                self.layout.summary().display()
            ));
        }
        self.reporter.success(&format!(
            "Run complete for {}! Finished in {:.2?}, {} unique subdomains ({}).",
            self.config.program,
            started.elapsed(),
            summary.final_count,
            self.layout.final_list_unique().display()
        ));

        Ok(summary)
    }

    /// Validate inputs, then create the run directory. Nothing is created on failure.
    async fn setup(&self) -> Result<Vec<String>> {
        if self.config.sources.is_empty() {
            return Err(ReconError::Setup("no enumeration sources selected".to_string()));
        }

        // Load target domains
        let domains_file = self.layout.domains_file();
        let targets = load_wordlist(&domains_file).await.map_err(|e| {
            ReconError::Setup(format!(
                "Did you add a domains.txt file to {}? ({})",
                domains_file.display(),
                e
            ))
        })?;
        if targets.is_empty() {
            return Err(ReconError::Setup(format!(
                "{} contains no domains",
                domains_file.display()
            )));
        }

        // Validate and canonicalize every target before anything touches the disk
        let targets = targets
            .iter()
            .map(|t| normalize_domain(t))
            .collect::<Result<Vec<_>>>()?;
        let targets = dedup(targets);

        // Check the input lists the selected tools need
        let mut required = vec![&self.config.resolvers];
        if self.config.sources.contains(&Source::SubGenerator) {
            required.push(&self.config.wordlist);
        }
        for path in required {
            if !file_exists(path).await? {
                return Err(ReconError::Setup(format!(
                    "required file {} does not exist",
                    path.display()
                )));
            }
        }

        self.reporter.section("Domains to be tested");
        for target in &targets {
            self.reporter.info(target);
        }

        // Create output folders
        self.layout.create_run_dirs().await?;
        self.reporter.info(&format!(
            "Created an output folder for {} ({})",
            self.config.program,
            self.layout.run_dir().display()
        ));

        Ok(targets)
    }

    /// Phase 1: run every selected source concurrently; returns generated candidate count
    async fn enumerate(&self, targets: &[String]) -> Result<usize> {
        self.reporter.section(&format!(
            "Starting subdomain enumeration & generating potential subdomains for {}",
            self.config.program
        ));

        let domains_file = self.layout.domains_file();
        let jobs: Vec<BoxFuture<'_, Result<(Source, usize)>>> = self
            .config
            .sources
            .iter()
            .map(|&source| {
                let output = self.layout.source_output(source.name());
                match source {
                    Source::SubGenerator => self
                        .generate(targets, output)
                        .map(move |r| r.map(|n| (source, n)))
                        .boxed(),
                    Source::Amass => {
                        let invocation = self.tools.amass(&domains_file, &output);
                        self.run_source(source, invocation, output).boxed()
                    }
                    Source::Subfinder => {
                        let invocation = self.tools.subfinder(&domains_file, &output);
                        self.run_source(source, invocation, output).boxed()
                    }
                }
            })
            .collect();

        let results = future::try_join_all(jobs).await?;
        let generated = results
            .iter()
            .filter(|(source, _)| *source == Source::SubGenerator)
            .map(|(_, n)| *n)
            .sum();

        Ok(generated)
    }

    async fn generate(&self, targets: &[String], output: PathBuf) -> Result<usize> {
        self.reporter.info(&format!(
            "Generating potential subdomains from file {}",
            self.config.wordlist.display()
        ));
        let started = Instant::now();

        // Load wordlist
        let words = load_wordlist(&self.config.wordlist).await?;
        let chunks = split_into_chunks(&words, self.config.chunks);

        // Create output writer and progress tracker
        let writer = Arc::new(FileWriter::create(&output).await?);
        let progress = ProgressTracker::new(
            (targets.len() * chunks.len()) as u64,
            !self.config.show_progress,
            "sub-generator",
        );

        let total = generate_candidates(targets, chunks, writer, &progress).await?;
        progress.finish();

        self.reporter.success(&format!(
            "Generating potential subdomains complete! Finished in {:.2?}, generating {} subdomains.",
            started.elapsed(),
            total
        ));
        Ok(total)
    }

    async fn run_source(
        &self,
        source: Source,
        invocation: Invocation,
        output: PathBuf,
    ) -> Result<(Source, usize)> {
        self.reporter.info(&format!(
            "Executing {} against {}",
            source.name(),
            self.config.program
        ));
        let started = Instant::now();

        let reporter = Arc::clone(&self.reporter);
        let message = format!(
            "{} identified first subdomain for {} successfully.",
            source.name(),
            self.config.program
        );
        let count = self
            .tools
            .enumerate(&invocation, move || reporter.info(&message))
            .await?;

        // Some tools skip the output file when they find nothing
        if !file_exists(&output).await? {
            self.reporter.warn(&format!(
                "{} produced no output file; continuing with an empty {}",
                source.name(),
                output.display()
            ));
            FileWriter::create(&output).await?;
        }

        self.reporter.success(&format!(
            "{} enumeration complete! Finished in {:.2?}, enumerating {} subdomains.",
            source.name(),
            started.elapsed(),
            count
        ));
        Ok((source, count))
    }

    /// Phase 2: merge and dedup source output, resolve redundancies, write one bucket per domain
    async fn consolidate(
        &self,
        targets: &[String],
        summary: &mut RunSummary,
    ) -> Result<Vec<BucketRun>> {
        self.reporter.section(
            "Beginning subdomain separation (separating enumerated subdomains into folders by domain)",
        );
        let started = Instant::now();

        // Merge every source's output
        let inputs: Vec<PathBuf> = self
            .config
            .sources
            .iter()
            .map(|s| self.layout.source_output(s.name()))
            .collect();
        let pool = combine_and_dedup(
            &inputs,
            &self.layout.combined(),
            &self.layout.combined_unique(),
        )
        .await?;
        summary.candidates = pool.len();
        self.reporter.info(&format!(
            "Combined enumeration output into {} unique candidates ({})",
            pool.len(),
            self.layout.combined_unique().display()
        ));

        // Drop targets already covered by a shorter one
        let working = resolve_redundancies(targets);
        tracing::debug!(?working, "working domain set");
        self.layout.create_bucket_dirs(&working).await?;

        // Hand each candidate to the first working domain that owns it
        let classification = classify(&working, pool)?;
        summary.working_domains = working;
        summary.unclaimed = classification.unclaimed.len();

        // Write bucket files
        let mut buckets = Vec::with_capacity(classification.buckets.len());
        for bucket in classification.buckets {
            let path = self.layout.bucket_artifact(&bucket.domain, Artifact::Subdomains);
            write_lines(&path, &bucket.members).await?;
            self.reporter.info(&format!(
                "Extracted {} subdomains for {} ({})",
                bucket.members.len(),
                bucket.domain,
                path.display()
            ));
            buckets.push(BucketRun {
                summary: BucketSummary {
                    domain: bucket.domain,
                    candidates: bucket.members.len(),
                    ..Default::default()
                },
                completed: None,
            });
        }

        if summary.unclaimed > 0 {
            self.reporter.warn(&format!(
                "{} candidates matched no working domain and were dropped",
                summary.unclaimed
            ));
        }
        self.reporter.success(&format!(
            "Separating subdomains done! Finished in {:.2?}.",
            started.elapsed()
        ));
        Ok(buckets)
    }

    /// Phases 3-5: one task per still-active bucket, joined before returning
    async fn run_stage(&self, stage: Stage, buckets: &mut [BucketRun]) -> Result<()> {
        self.reporter
            .section(&format!("{} for {}", stage.title(), self.config.program));
        let started = Instant::now();

        // Only buckets that have not failed yet
        let jobs: Vec<(usize, String)> = buckets
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_active())
            .map(|(idx, b)| (idx, b.summary.domain.clone()))
            .collect();
        if jobs.is_empty() {
            self.reporter.warn("No domains left to process");
            return Ok(());
        }

        // Run the tool for every bucket concurrently
        let limit = self.config.parallelism.unwrap_or(jobs.len()).max(1);
        let progress = ProgressTracker::new(jobs.len() as u64, !self.config.show_progress, stage.tool());

        let results: Vec<(usize, String, Result<usize>)> = stream::iter(jobs)
            .map(|(idx, domain)| {
                let input = self.layout.bucket_artifact(&domain, stage.input());
                let output = self.layout.bucket_artifact(&domain, stage.output());
                let tools = self.tools.clone();
                let progress = progress.clone();
                self.reporter
                    .info(&format!("Executing {} against {}", stage.tool(), domain));

                async move {
                    let handle = tokio::spawn(async move {
                        match stage {
                            Stage::Resolve | Stage::ResolvePermutations => {
                                tools.resolve(&input, &output).await
                            }
                            Stage::Permute => tools.permute(&input, &output).await,
                        }
                    });
                    let result = handle.await.unwrap_or_else(|e| Err(e.into()));
                    progress.inc();
                    (idx, domain, result)
                }
            })
            .buffer_unordered(limit)
            .collect()
            .await;
        progress.finish();

        // Record counts, isolate failures
        for (idx, domain, result) in results {
            let bucket = &mut buckets[idx];
            match result {
                Ok(count) => {
                    stage.record(&mut bucket.summary, count);
                    bucket.completed = Some(stage);
                    self.reporter.info(&format!(
                        "{} complete for {}. {} subdomains.",
                        stage.tool(),
                        domain,
                        count
                    ));
                }
                Err(e) if self.config.fail_fast => return Err(e),
                Err(e) => {
                    tracing::warn!(%domain, stage = ?stage, error = %e, "bucket failed");
                    self.reporter.error(&format!(
                        "{} failed for {}: {}. Skipping this domain in later phases.",
                        stage.tool(),
                        domain,
                        e
                    ));
                    bucket.summary.error = Some(e.to_string());
                }
            }
        }

        self.reporter.success(&format!(
            "{} done! Finished in {:.2?}.",
            stage.tool(),
            started.elapsed()
        ));
        Ok(())
    }

    /// Phase 6: union of every completed resolution artifact, deduplicated
    async fn finalize(&self, buckets: &[BucketRun]) -> Result<usize> {
        self.reporter.section(&format!(
            "All enumeration and reverse DNS bruteforcing complete. Creating output files for {}",
            self.config.program
        ));

        let mut inputs = Vec::new();
        for bucket in buckets {
            for stage in [Stage::Resolve, Stage::ResolvePermutations] {
                if bucket.has_completed(stage) {
                    inputs.push(
                        self.layout
                            .bucket_artifact(&bucket.summary.domain, stage.output()),
                    );
                }
            }
        }

        let unique = combine_and_dedup(
            &inputs,
            &self.layout.final_list(),
            &self.layout.final_list_unique(),
        )
        .await?;

        self.reporter.info(&format!(
            "Created unique final list of subdomains for {} ({})",
            self.config.program,
            self.layout.final_list_unique().display()
        ));
        Ok(unique.len())
    }
}

/// Whether `path` exists; errors other than "not found" are reported as read failures
async fn file_exists(path: &Path) -> Result<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| ReconError::read(path, e))
}
