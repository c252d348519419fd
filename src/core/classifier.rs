//! Partition the candidate pool into per-domain buckets

use crate::core::domains::OwnershipPattern;
use crate::error::Result;
use std::collections::VecDeque;

/// Candidates owned by one working domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub domain: String,
    pub members: Vec<String>,
}

/// Result of classifying a candidate pool
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub buckets: Vec<Bucket>,
    /// Candidates no working domain claimed
    pub unclaimed: Vec<String>,
}

impl Classification {
    pub fn classified(&self) -> usize {
        self.buckets.iter().map(|b| b.members.len()).sum()
    }
}

/// Classify `pool` against the working domains, in the order given.
///
/// The pool is consumed as a rotating queue. For each domain, exactly
/// `len(pool at pass start)` elements are popped from the front: matches move to that
/// domain's bucket, the rest go to the back. A candidate is therefore tested once per
/// pass and claimed by at most one bucket, the first whose pattern matches it.
pub fn classify(working_domains: &[String], pool: Vec<String>) -> Result<Classification> {
    let patterns = working_domains
        .iter()
        .map(|d| OwnershipPattern::for_domain(d))
        .collect::<Result<Vec<_>>>()?;

    Ok(classify_with_patterns(&patterns, pool))
}

/// Classify against already-built ownership patterns
pub fn classify_with_patterns(patterns: &[OwnershipPattern], pool: Vec<String>) -> Classification {
    let mut queue: VecDeque<String> = pool.into();
    let mut buckets = Vec::with_capacity(patterns.len());

    for pattern in patterns {
        let members = drain_matching(&mut queue, pattern);
        tracing::debug!(
            domain = pattern.domain(),
            regex = pattern.as_str(),
            claimed = members.len(),
            remaining = queue.len(),
            "classified bucket"
        );
        buckets.push(Bucket {
            domain: pattern.domain().to_string(),
            members,
        });
    }

    Classification {
        buckets,
        unclaimed: queue.into(),
    }
}

/// One rotation pass: pop every element once, keep matches, requeue the rest
fn drain_matching(queue: &mut VecDeque<String>, pattern: &OwnershipPattern) -> Vec<String> {
    let mut claimed = Vec::new();

    for _ in 0..queue.len() {
        let Some(candidate) = queue.pop_front() else {
            break;
        };
        if pattern.is_match(&candidate) {
            claimed.push(candidate);
        } else {
            queue.push_back(candidate);
        }
    }

    claimed
}
