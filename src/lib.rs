//! subrecon: multi-stage subdomain enumeration.
//!
//! Enumeration sources and a wordlist generator feed one candidate pool. The pool is
//! deduplicated, split into one bucket per working domain, bulk-resolved, permuted and
//! resolved again, and every confirmed name ends up in one deduplicated final list.

pub mod cli;
pub mod core;
pub mod error;
pub mod output;
pub mod pipeline;

pub use error::{ReconError, Result};
pub use pipeline::{Pipeline, PipelineConfig, Source};
