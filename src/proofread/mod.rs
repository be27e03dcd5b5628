//! Proofreader: deterministic prefilter plus an optional remote LLM stage.
//!
//! The prefilter always runs. When an API key is configured, the text is
//! noise-masked (length-preserving), chunked, and sent to the model with
//! at most three chunks in flight; returned items are re-anchored and
//! filtered with the same real-word rules. If the remote stage exhausts
//! its retries the proofreader degrades to prefilter-only results rather
//! than failing the analysis.

pub mod llm;
pub mod prefilter;
pub mod words;

use crate::config::LlmConfig;
use crate::error::Error;
use crate::findings::SpellingIssue;
pub use llm::{HttpLlmClient, LlmClient};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Maximum concurrent outbound LLM calls per document.
pub const MAX_CONCURRENT_CHUNKS: usize = 3;

/// Cooperative cancellation flag shared across a request.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of a proofreading pass.
#[derive(Debug, Default)]
pub struct ProofreadOutcome {
    /// Anchored issues, ordered by position.
    pub issues: Vec<SpellingIssue>,
    /// Whether a remote stage was attempted at all.
    pub remote_attempted: bool,
    /// Whether the remote stage failed and results degraded to
    /// prefilter-only.
    pub degraded: bool,
}

/// Two-stage proofreader.
pub struct Proofreader {
    client: Option<Box<dyn LlmClient>>,
}

impl Proofreader {
    /// Build from configuration; the remote stage is enabled only when an
    /// API key is present.
    pub fn from_config(config: &LlmConfig) -> Self {
        let client = if config.remote_enabled() {
            match HttpLlmClient::new(config.clone()) {
                Ok(c) => Some(Box::new(c) as Box<dyn LlmClient>),
                Err(e) => {
                    log::warn!("LLM client unavailable: {}", e);
                    None
                },
            }
        } else {
            None
        };
        Self { client }
    }

    /// Prefilter-only proofreader.
    pub fn deterministic() -> Self {
        Self { client: None }
    }

    /// Inject a custom client (tests).
    pub fn with_client(client: Box<dyn LlmClient>) -> Self {
        Self {
            client: Some(client),
        }
    }

    /// Run both stages over the projection text.
    pub fn proofread(&self, text: &str, cancel: &CancelToken) -> ProofreadOutcome {
        let pre = prefilter::prefilter(text);
        let Some(client) = &self.client else {
            return ProofreadOutcome {
                issues: postfilter(pre),
                remote_attempted: false,
                degraded: false,
            };
        };

        let masked = llm::mask_noise(text);
        let chunks = llm::chunk_text(&masked);
        let mut remote_issues: Vec<SpellingIssue> = Vec::new();
        let mut degraded = false;

        'waves: for wave in chunks.chunks(MAX_CONCURRENT_CHUNKS) {
            if cancel.is_cancelled() {
                break;
            }
            let results: Vec<Result<Vec<SpellingIssue>, Error>> =
                std::thread::scope(|scope| {
                    let handles: Vec<_> = wave
                        .iter()
                        .map(|&(chunk_start, chunk)| {
                            let suspects: Vec<&SpellingIssue> = pre
                                .iter()
                                .filter(|i| {
                                    i.start_index
                                        .map(|s| {
                                            s >= chunk_start && s < chunk_start + chunk.len()
                                        })
                                        .unwrap_or(false)
                                })
                                .collect();
                            let prompt = llm::build_prompt(chunk, &suspects);
                            scope.spawn(move || {
                                client
                                    .complete(&prompt)
                                    .map(|raw| llm::parse_response(chunk_start, chunk, &raw))
                            })
                        })
                        .collect();
                    handles
                        .into_iter()
                        .map(|h| h.join().unwrap_or_else(|_| {
                            Err(Error::Internal("proofreader worker panicked".to_string()))
                        }))
                        .collect()
                });
            if cancel.is_cancelled() {
                // In-flight calls ran to completion; their results are
                // discarded per the cancellation contract.
                break;
            }
            for result in results {
                match result {
                    Ok(issues) => remote_issues.extend(issues),
                    Err(e) => {
                        log::warn!("LLM stage degraded: {}", e);
                        degraded = true;
                        break 'waves;
                    },
                }
            }
        }

        let mut combined = pre;
        if !degraded {
            combined.extend(filter_remote(remote_issues, text));
        }
        ProofreadOutcome {
            issues: postfilter(combined),
            remote_attempted: true,
            degraded,
        }
    }
}

/// Real-word filtering for model-returned items.
fn filter_remote(issues: Vec<SpellingIssue>, original: &str) -> Vec<SpellingIssue> {
    issues
        .into_iter()
        .filter(|issue| {
            // The mask is length-preserving, so offsets map 1:1; drop
            // items whose error landed on masked noise rather than text.
            if let (Some(start), Some(end)) = (issue.start_index, issue.end_index) {
                if original.is_char_boundary(start)
                    && original.is_char_boundary(end)
                    && end <= original.len()
                {
                    let at = &original[start..end];
                    if at != issue.error && issue.error.contains('0') {
                        return false;
                    }
                }
            }
            true
        })
        .collect()
}

/// Shared postfilter: real-word rules plus deduplication.
fn postfilter(issues: Vec<SpellingIssue>) -> Vec<SpellingIssue> {
    let mut seen: HashSet<(String, String, String, String)> = HashSet::new();
    let mut kept = Vec::new();
    for issue in issues {
        // A single-token correction must itself be a real word
        let correction_tokens: Vec<&str> = issue.correction.split_whitespace().collect();
        if correction_tokens.len() == 1
            && issue.correction.chars().all(|c| c.is_alphabetic())
            && !words::is_real_word(&issue.correction)
            && !words::is_stopword(&issue.correction)
        {
            continue;
        }
        // Never merge several valid words into one token
        let error_tokens: Vec<&str> = issue.error.split_whitespace().collect();
        if correction_tokens.len() == 1
            && error_tokens.len() >= 2
            && error_tokens
                .iter()
                .all(|t| words::is_real_word(t) || words::is_stopword(t))
        {
            continue;
        }
        let key = (
            issue.error.clone(),
            issue.correction.clone(),
            normalize_context(&issue.context_before),
            normalize_context(&issue.context_after),
        );
        if !seen.insert(key) {
            continue;
        }
        kept.push(issue);
    }
    kept.sort_by(|a, b| {
        a.start_index
            .unwrap_or(usize::MAX)
            .cmp(&b.start_index.unwrap_or(usize::MAX))
            .then_with(|| a.error.cmp(&b.error))
    });
    kept
}

fn normalize_context(context: &str) -> String {
    context
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
