//! Advice document cache
//!
//! One advice document per user, generated lazily from the current snapshot
//! and cached to disk. A cached document is returned verbatim on every
//! subsequent read; the cache key is the user identity alone, so a newer
//! upload does not invalidate previously cached advice (explicit saves are
//! the only overwrite path).

pub mod generator;

pub use generator::{AdviceGenerator, GeneratorError, WebhookAdviceClient};

use crate::storage::{SnapshotStore, StorageError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Instruction line prepended to the per-region severity lines
const PROMPT_PREAMBLE: &str =
    "Provide acne care guidance and reference resources based on the following analysis results:";

/// Advice lookup errors
#[derive(Debug, Error)]
pub enum AdviceError {
    /// User has no result snapshot to generate advice from
    #[error("No analysis results for user {0}")]
    NoResults(String),

    /// Snapshot or advice file access failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Cache-or-generate access to per-user advice documents
#[derive(Clone)]
pub struct AdviceCache {
    store: SnapshotStore,
    generator: Arc<dyn AdviceGenerator>,
}

impl AdviceCache {
    pub fn new(store: SnapshotStore, generator: Arc<dyn AdviceGenerator>) -> Self {
        Self { store, generator }
    }

    /// Current snapshot plus its advice document
    ///
    /// Returns the cached advice when present. On a cache miss the prompt is
    /// built from the snapshot and sent to the generator; a successful reply
    /// is cached and returned, a failed generation returns an inline notice
    /// that is deliberately NOT cached so the next request retries.
    pub async fn results_with_advice(
        &self,
        user_id: &str,
    ) -> Result<(serde_json::Value, String), AdviceError> {
        let results = self
            .store
            .read_snapshot(user_id)?
            .ok_or_else(|| AdviceError::NoResults(user_id.to_string()))?;

        if let Some(cached) = self.store.read_advice(user_id)? {
            return Ok((results, cached));
        }

        let prompt = build_prompt(&results);
        let advice = match self.generator.generate(&prompt).await {
            Ok(reply) => {
                if let Err(e) = self.store.write_advice(user_id, &reply) {
                    // Best-effort cache: the reply is still returned.
                    warn!(user_id, error = %e, "Failed to cache advice document");
                } else {
                    info!(user_id, "Advice document generated and cached");
                }
                reply
            }
            Err(e) => {
                warn!(user_id, error = %e, "Advice generation failed");
                format!("<p>Failed to generate care advice: {e}</p>")
            }
        };

        Ok((results, advice))
    }

    /// Explicit overwrite with caller-supplied text
    ///
    /// The saved text replaces the cached document, so subsequent reads
    /// return it verbatim; generation is bypassed entirely.
    pub fn save(&self, user_id: &str, advice: &str) -> Result<(), AdviceError> {
        self.store.save_advice(user_id, advice)?;
        info!(user_id, "Advice document saved");
        Ok(())
    }
}

/// Build the generation prompt from the snapshot, in batch order
fn build_prompt(results: &serde_json::Value) -> String {
    let mut lines = vec![PROMPT_PREAMBLE.to_string()];
    if let Some(entries) = results.as_array() {
        for entry in entries {
            let face_part = entry["face_part"].as_str().unwrap_or("unknown");
            let severity = entry["severity"].as_str().unwrap_or("unknown");
            lines.push(format!("{face_part} face: {severity}"));
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prompt_lists_regions_in_snapshot_order() {
        let results = json!([
            {"face_part": "left", "severity": "Grade I: Mild acne with comedones."},
            {"face_part": "middle", "severity": "Grade II: Moderate acne with papules."},
            {"face_part": "right", "severity": "Grade I: Mild acne with comedones."},
        ]);
        let prompt = build_prompt(&results);
        let lines: Vec<&str> = prompt.lines().collect();
        assert_eq!(lines[0], PROMPT_PREAMBLE);
        assert_eq!(lines[1], "left face: Grade I: Mild acne with comedones.");
        assert_eq!(lines[2], "middle face: Grade II: Moderate acne with papules.");
        assert_eq!(lines[3], "right face: Grade I: Mild acne with comedones.");
    }

    #[test]
    fn prompt_tolerates_malformed_snapshot_entries() {
        let prompt = build_prompt(&json!([{"face_part": "left"}]));
        assert!(prompt.ends_with("left face: unknown"));
    }
}
