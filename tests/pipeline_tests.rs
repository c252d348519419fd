//! End-to-end pipeline runs against shell-script stand-ins for the external tools.

#![cfg(unix)]

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use subrecon::core::{shell_quote, Artifact};
use subrecon::output::{MemoryReporter, SilentReporter};
use subrecon::pipeline::ToolPaths;
use subrecon::{Pipeline, PipelineConfig, ReconError, Source};
use tempfile::TempDir;

/// Echoes the input file upper-cased, so lower-casing by the runner is observable
const FAKE_PUREDNS: &str = r#"
# puredns resolve <file> ...
case "$2" in
  *broken.org*) echo "resolver exploded" >&2; exit 1 ;;
esac
tr 'a-z' 'A-Z' < "$2"
"#;

/// Emits one permutation and then dies for badperm.net, behind the `| tee` pipeline
const FAKE_DNSGEN: &str = r#"
case "$1" in
  *badperm.net*) echo "dev-www.badperm.net"; echo "boom" >&2; exit 4 ;;
esac
sed 's/^/dev-/' "$1"
"#;

const FAKE_SUBFINDER: &str = r#"
while [ $# -gt 0 ]; do
  case "$1" in
    -dL) in="$2"; shift 2 ;;
    -o) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
while read -r d; do echo "sf.$d"; done < "$in" | tee "$out"
"#;

const FAKE_AMASS_FAILING: &str = r#"
echo "amass: no config" >&2
exit 1
"#;

struct Fixture {
    dir: TempDir,
    config: PipelineConfig,
}

impl Fixture {
    fn new(domains: &str, words: &[&str]) -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        let programs = root.join("Programs");
        let recon_data = programs.join("acme").join("recon-data");
        fs::create_dir_all(&recon_data).unwrap();
        fs::write(recon_data.join("domains.txt"), domains).unwrap();

        let wordlist = root.join("words.txt");
        fs::write(&wordlist, words.join("\n")).unwrap();
        let resolvers = root.join("resolvers.txt");
        fs::write(&resolvers, "1.1.1.1\n8.8.8.8\n").unwrap();

        let tools = root.join("tools");
        fs::create_dir_all(&tools).unwrap();
        let script = |name: &str, body: &str| -> String {
            let path = tools.join(name);
            fs::write(&path, body).unwrap();
            format!("sh {}", shell_quote(&path.to_string_lossy()))
        };

        let mut config = PipelineConfig::new("acme");
        config.programs_dir = programs;
        config.date = "01-25-2023".to_string();
        config.sources = vec![Source::SubGenerator];
        config.wordlist = wordlist;
        config.resolvers = resolvers;
        config.chunks = 2;
        config.show_progress = false;
        config.tools = ToolPaths {
            amass: script("amass.sh", FAKE_AMASS_FAILING),
            subfinder: script("subfinder.sh", FAKE_SUBFINDER),
            puredns: script("puredns.sh", FAKE_PUREDNS),
            dnsgen: script("dnsgen.sh", FAKE_DNSGEN),
        };

        Self { dir, config }
    }

    fn run_dir(&self) -> PathBuf {
        self.config.programs_dir.join("acme").join("01-25-2023")
    }

    fn pipeline(&self) -> Pipeline {
        Pipeline::new(self.config.clone(), Arc::new(SilentReporter))
    }
}

fn read_set(path: &Path) -> HashSet<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

fn set(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn full_run_produces_final_list() {
    let fx = Fixture::new("example.com\ntest.org\n", &["www", "api", "mail"]);
    let pipeline = fx.pipeline();

    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.generated, 6);
    assert_eq!(summary.candidates, 6);
    assert_eq!(summary.unclaimed, 0);
    assert_eq!(summary.working_domains, vec!["test.org", "example.com"]);
    assert_eq!(summary.failed_buckets(), 0);
    assert_eq!(summary.final_count, 12);
    for bucket in &summary.buckets {
        assert_eq!(bucket.candidates, 3);
        assert_eq!(bucket.resolved, 3);
        assert_eq!(bucket.permutations, 3);
        assert_eq!(bucket.resolved_permutations, 3);
    }

    let layout = pipeline.layout();
    assert_eq!(
        read_set(&layout.bucket_artifact("example.com", Artifact::Subdomains)),
        set(&["www.example.com", "api.example.com", "mail.example.com"])
    );
    // Resolver output is lower-cased before it is written
    assert_eq!(
        read_set(&layout.bucket_artifact("test.org", Artifact::Resolved)),
        set(&["www.test.org", "api.test.org", "mail.test.org"])
    );
    assert_eq!(
        read_set(&layout.bucket_artifact("test.org", Artifact::Permutations)),
        set(&["dev-www.test.org", "dev-api.test.org", "dev-mail.test.org"])
    );

    let final_list = read_set(&layout.final_list_unique());
    assert_eq!(final_list.len(), 12);
    assert!(final_list.contains("dev-mail.example.com"));
    assert!(final_list.contains("api.test.org"));

    let summary_json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(layout.summary()).unwrap()).unwrap();
    assert_eq!(summary_json["final_count"], 12);
    assert_eq!(summary_json["program"], "acme");
}

#[tokio::test]
async fn redundant_domains_share_one_bucket() {
    let fx = Fixture::new("foo.google.com\ngoogle.com\n", &["x"]);

    let summary = fx.pipeline().run().await.unwrap();

    // Candidates are generated for both targets, but only google.com owns a bucket
    assert_eq!(summary.generated, 2);
    assert_eq!(summary.working_domains, vec!["google.com"]);
    assert_eq!(summary.buckets.len(), 1);
    assert_eq!(summary.buckets[0].candidates, 2);

    let tld_dir = fx.run_dir().join("top-level-domains");
    assert!(tld_dir.join("google.com").is_dir());
    assert!(!tld_dir.join("foo.google.com").exists());
    assert_eq!(
        read_set(&tld_dir.join("google.com").join("google.com-subdomains.out")),
        set(&["x.google.com", "x.foo.google.com"])
    );
}

#[tokio::test]
async fn failing_bucket_is_isolated() {
    let fx = Fixture::new("example.com\nbroken.org\n", &["www", "api", "mail"]);
    let reporter = Arc::new(MemoryReporter::new());
    let pipeline = Pipeline::new(fx.config.clone(), reporter.clone());

    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.failed_buckets(), 1);
    let broken = summary
        .buckets
        .iter()
        .find(|b| b.domain == "broken.org")
        .unwrap();
    let error = broken.error.as_deref().unwrap();
    assert!(error.contains("resolver exploded"), "{}", error);
    assert_eq!(broken.permutations, 0);

    // The healthy domain ran all the way through
    assert_eq!(summary.final_count, 6);
    let final_list = read_set(&pipeline.layout().final_list_unique());
    assert!(final_list.iter().all(|d| d.ends_with("example.com")));

    // Later phases skipped the failed bucket
    assert!(!pipeline
        .layout()
        .bucket_artifact("broken.org", Artifact::Permutations)
        .exists());
    assert!(reporter
        .at_level("error")
        .iter()
        .any(|m| m.contains("broken.org")));
}

#[tokio::test]
async fn failing_permutation_tool_is_observed_through_tee() {
    let fx = Fixture::new("example.com\nbadperm.net\n", &["www", "api", "mail"]);
    let pipeline = fx.pipeline();

    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.failed_buckets(), 1);
    let bad = summary
        .buckets
        .iter()
        .find(|b| b.domain == "badperm.net")
        .unwrap();
    let error = bad.error.as_deref().unwrap();
    assert!(error.starts_with("dnsgen exited with"), "{}", error);
    assert!(error.contains("boom"), "{}", error);
    assert_eq!(bad.resolved, 3);
    assert_eq!(bad.resolved_permutations, 0);

    // The failed bucket never reaches the second resolution round
    let layout = pipeline.layout();
    assert!(!layout
        .bucket_artifact("badperm.net", Artifact::ResolvedPermutations)
        .exists());

    // Its first-round resolutions still count; the healthy bucket contributes both rounds
    assert_eq!(summary.final_count, 9);
    let final_list = read_set(&layout.final_list_unique());
    assert!(final_list.contains("www.badperm.net"));
    assert!(!final_list.contains("dev-www.badperm.net"));
    assert!(final_list.contains("dev-api.example.com"));
}

#[tokio::test]
async fn targets_are_canonicalized_before_generation() {
    let fx = Fixture::new("Example.com\nexample.org.\nEXAMPLE.COM\n", &["www", "api", "mail"]);
    let pipeline = fx.pipeline();

    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.target_domains, vec!["example.com", "example.org"]);
    assert_eq!(summary.generated, 6);
    assert_eq!(summary.unclaimed, 0);
    assert_eq!(summary.working_domains, vec!["example.com", "example.org"]);
    for bucket in &summary.buckets {
        assert_eq!(bucket.candidates, 3, "{}", bucket.domain);
    }
    assert_eq!(summary.final_count, 12);

    let tld_dir = fx.run_dir().join("top-level-domains");
    assert!(tld_dir.join("example.com").is_dir());
    assert!(tld_dir.join("example.org").is_dir());
    assert!(!tld_dir.join("Example.com").exists());
    assert!(!tld_dir.join("example.org.").exists());
    assert_eq!(
        read_set(&pipeline.layout().bucket_artifact("example.org", Artifact::Subdomains)),
        set(&["www.example.org", "api.example.org", "mail.example.org"])
    );
}

#[tokio::test]
async fn fail_fast_aborts_on_bucket_failure() {
    let mut fx = Fixture::new("example.com\nbroken.org\n", &["www"]);
    fx.config.fail_fast = true;

    let err = fx.pipeline().run().await.unwrap_err();

    assert!(matches!(err, ReconError::ToolFailed { .. }), "{}", err);
    assert!(!fx.run_dir().join("final_list_unique.out").exists());
}

#[tokio::test]
async fn enumeration_sources_are_combined() {
    let mut fx = Fixture::new("example.com\n", &["www"]);
    fx.config.sources = vec![Source::SubGenerator, Source::Subfinder];

    let summary = fx.pipeline().run().await.unwrap();

    assert_eq!(
        read_set(&fx.run_dir().join("subfinder.out")),
        set(&["sf.example.com"])
    );
    assert_eq!(
        read_set(&fx.run_dir().join("all_enumerated_subdomains_combined_unique.txt")),
        set(&["www.example.com", "sf.example.com"])
    );
    assert_eq!(summary.candidates, 2);
    assert_eq!(summary.final_count, 4);
}

#[tokio::test]
async fn failing_enumeration_source_is_fatal() {
    let mut fx = Fixture::new("example.com\n", &["www"]);
    fx.config.sources = vec![Source::SubGenerator, Source::Amass];

    let err = fx.pipeline().run().await.unwrap_err();

    match err {
        ReconError::ToolFailed { tool, stderr, .. } => {
            assert_eq!(tool, "amass");
            assert_eq!(stderr, vec!["amass: no config"]);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(!fx
        .run_dir()
        .join("all_enumerated_subdomains_combined.txt")
        .exists());
}

#[tokio::test]
async fn empty_domain_file_is_setup_error() {
    let fx = Fixture::new("\n  \n", &["www"]);

    let err = fx.pipeline().run().await.unwrap_err();

    assert!(matches!(err, ReconError::Setup(_)), "{}", err);
    assert!(!fx.run_dir().exists());
}

#[tokio::test]
async fn missing_domain_file_is_setup_error() {
    let fx = Fixture::new("example.com\n", &["www"]);
    let mut config = fx.config.clone();
    config.program = "nobody".to_string();

    let err = Pipeline::new(config, Arc::new(SilentReporter))
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, ReconError::Setup(_)), "{}", err);
    assert!(!fx.dir.path().join("Programs").join("nobody").exists());
}

#[tokio::test]
async fn malformed_domain_is_fatal_before_any_directory() {
    let fx = Fixture::new("example.com\nnot a domain\n", &["www"]);

    let err = fx.pipeline().run().await.unwrap_err();

    assert!(matches!(err, ReconError::InvalidDomain { .. }), "{}", err);
    assert!(!fx.run_dir().exists());
}

#[tokio::test]
async fn missing_wordlist_is_setup_error() {
    let mut fx = Fixture::new("example.com\n", &["www"]);
    fx.config.wordlist = fx.dir.path().join("no-such-words.txt");

    let err = fx.pipeline().run().await.unwrap_err();

    assert!(matches!(err, ReconError::Setup(_)), "{}", err);
    assert!(!fx.run_dir().exists());
}
