//! Target domain handling: redundancy elimination and ownership patterns

use crate::error::{ReconError, Result};
use regex::Regex;
use url::{Host, Url};

/// Public suffixes spanning two labels. Anything else is treated as a single-label suffix.
const COMPOUND_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "ac.uk", "gov.uk", "me.uk", "ltd.uk", "plc.uk", "co.jp", "ne.jp",
    "or.jp", "co.kr", "co.nz", "org.nz", "co.za", "co.in", "co.id", "co.il", "com.au",
    "net.au", "org.au", "edu.au", "gov.au", "com.br", "net.br", "com.mx", "com.cn",
    "net.cn", "com.tw", "com.hk", "com.sg", "com.tr", "com.ar", "com.co",
];

/// A host name split into subdomain labels, registrable label and public suffix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainParts {
    pub subdomain: String,
    pub domain: String,
    pub suffix: String,
}

impl DomainParts {
    /// Parse a target domain such as `walt.disney.com` into its components
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim().trim_end_matches('.');
        if trimmed.is_empty() {
            return Err(ReconError::invalid_domain(input, "empty domain"));
        }

        let url = Url::parse(&format!("https://{}/", trimmed))
            .map_err(|e| ReconError::invalid_domain(input, e.to_string()))?;

        let host = match url.host() {
            Some(Host::Domain(host)) => host.to_ascii_lowercase(),
            Some(_) => return Err(ReconError::invalid_domain(input, "IP addresses are not domains")),
            None => return Err(ReconError::invalid_domain(input, "missing host")),
        };

        // Anything after the host (port, path, credentials) means this was not a bare domain
        if url.port().is_some() || url.path() != "/" || !url.username().is_empty() {
            return Err(ReconError::invalid_domain(input, "not a bare host name"));
        }

        let labels: Vec<&str> = host.split('.').collect();
        if labels.iter().any(|l| l.is_empty()) {
            return Err(ReconError::invalid_domain(input, "empty label"));
        }

        let suffix_len = if labels.len() >= 3
            && COMPOUND_SUFFIXES.contains(&labels[labels.len() - 2..].join(".").as_str())
        {
            2
        } else {
            1
        };

        if labels.len() <= suffix_len {
            return Err(ReconError::invalid_domain(
                input,
                "no registrable label before the public suffix",
            ));
        }

        let domain_idx = labels.len() - suffix_len - 1;
        Ok(Self {
            subdomain: labels[..domain_idx].join("."),
            domain: labels[domain_idx].to_string(),
            suffix: labels[domain_idx + 1..].join("."),
        })
    }

    pub fn has_subdomain(&self) -> bool {
        !self.subdomain.is_empty()
    }

    /// The lower-cased host name, without a trailing dot
    pub fn host(&self) -> String {
        if self.has_subdomain() {
            format!("{}.{}.{}", self.subdomain, self.domain, self.suffix)
        } else {
            format!("{}.{}", self.domain, self.suffix)
        }
    }
}

/// Validate `input` as a target domain and return its canonical spelling.
///
/// Generated candidates, bucket directories and ownership patterns are all keyed by this
/// form, so `Example.com.` and `example.com` name the same target.
pub fn normalize_domain(input: &str) -> Result<String> {
    DomainParts::parse(input).map(|parts| parts.host())
}

/// Collapse the target domain list so no entry embeds another.
///
/// Domains are ordered by length (ties broken lexically, so the result does not depend on
/// input order), then scanned shortest first: every later domain that contains the current
/// one as a substring is dropped. Given `google.com` and `foo.google.com`, only
/// `google.com` survives. Exact duplicates collapse to one entry.
pub fn resolve_redundancies(domains: &[String]) -> Vec<String> {
    let mut sorted: Vec<String> = domains.to_vec();
    sorted.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

    let mut i = 0;
    while i < sorted.len() {
        let (head, tail) = sorted.split_at(i + 1);
        let current = &head[i];
        let kept: Vec<String> = tail
            .iter()
            .filter(|d| !d.contains(current.as_str()))
            .cloned()
            .collect();
        sorted.truncate(i + 1);
        sorted.extend(kept);
        i += 1;
    }

    sorted
}

/// Regular expression deciding which candidates belong to one working domain's bucket
#[derive(Debug, Clone)]
pub struct OwnershipPattern {
    domain: String,
    regex: Regex,
}

impl OwnershipPattern {
    /// Build the pattern `^.*\.<subdomain>\.<domain>\.<suffix>$` (subdomain part only when
    /// the working domain carries one)
    pub fn for_domain(working_domain: &str) -> Result<Self> {
        let parts = DomainParts::parse(working_domain)?;

        let owner = if parts.has_subdomain() {
            format!(
                r"{}\.{}\.{}",
                regex::escape(&parts.subdomain),
                regex::escape(&parts.domain),
                regex::escape(&parts.suffix)
            )
        } else {
            format!(
                r"{}\.{}",
                regex::escape(&parts.domain),
                regex::escape(&parts.suffix)
            )
        };

        let regex = Regex::new(&format!(r"^.*\.{}$", owner))?;
        Ok(Self {
            domain: parts.host(),
            regex,
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }
}
