//! Candidate generation: every `word.domain` pair from a chunked wordlist

use crate::error::Result;
use crate::output::{FileWriter, ProgressTracker};
use std::sync::Arc;

/// Write `word.domain` for every domain and every word into `writer`.
///
/// One task runs per (domain, chunk) pair. Each task formats its lines into a local
/// buffer and hands the whole block to the writer once, so the shared file is locked
/// for a single write per task. Returns the number of candidates written.
pub async fn generate_candidates(
    domains: &[String],
    chunks: Vec<Vec<String>>,
    writer: Arc<FileWriter>,
    progress: &ProgressTracker,
) -> Result<usize> {
    let chunks: Vec<Arc<Vec<String>>> = chunks.into_iter().map(Arc::new).collect();
    let mut handles = Vec::with_capacity(domains.len() * chunks.len());

    for domain in domains {
        for chunk in &chunks {
            let domain = domain.clone();
            let chunk = Arc::clone(chunk);
            let writer = Arc::clone(&writer);
            let progress = progress.clone();

            handles.push(tokio::spawn(async move {
                let mut block = String::with_capacity(chunk.len() * (domain.len() + 16));
                for word in chunk.iter() {
                    block.push_str(word);
                    block.push('.');
                    block.push_str(&domain);
                    block.push('\n');
                }
                writer.write_block(&block).await?;
                progress.inc();
                Ok::<usize, crate::error::ReconError>(chunk.len())
            }));
        }
    }

    let mut total = 0;
    for result in futures::future::join_all(handles).await {
        total += result??;
    }

    writer.finalize().await?;
    Ok(total)
}
