//! Core building blocks: lists, domains, classification, generation and tool runs

pub mod artifacts;
pub mod classifier;
pub mod domains;
pub mod generator;
pub mod layout;
pub mod runner;
pub mod wordlist;

pub use artifacts::{combine_and_dedup, combine_files, dedup, write_lines};
pub use classifier::{classify, Bucket, Classification};
pub use domains::{normalize_domain, resolve_redundancies, DomainParts, OwnershipPattern};
pub use generator::generate_candidates;
pub use layout::{Artifact, RunLayout};
pub use runner::{shell_quote, Capture, Invocation, ToolOutput, ToolRunner};
pub use wordlist::{load_wordlist, parse_lines, split_into_chunks};
