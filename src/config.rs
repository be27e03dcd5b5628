//! Configuration for document sanitization.

use serde::{Deserialize, Serialize};

/// What to do with drawings and pictures during cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DrawPolicy {
    /// Leave all drawings in place.
    #[default]
    None,
    /// Remove ink annotations and legacy VML shapes; keep regular drawings.
    Auto,
    /// Remove all drawings and purge the media folder.
    All,
}

/// How PDFs are processed during cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PdfMode {
    /// Clear metadata, annotations, and attachments; keep content untouched.
    #[default]
    Sanitize,
    /// Reserved for text-only export.
    TextOnly,
}

/// Cleaning feature flags and caller-approved selections.
///
/// Selection vectors carry finding ids returned by a prior `analyze` run;
/// an empty vector means "nothing selected" for that family.
#[derive(Debug, Clone, Default)]
pub struct CleanOptions {
    /// Strip document properties (core/app/custom, or the PDF info dictionary).
    pub remove_metadata: bool,
    /// Remove comment parts and inline comment markers.
    pub remove_comments: bool,
    /// Accept tracked changes: drop deletions, keep inserted text.
    pub accept_track_changes: bool,
    /// Remove hidden text, hidden sheets, hidden rows/columns.
    pub remove_hidden_content: bool,
    /// Remove embedded OLE objects.
    pub remove_embedded_objects: bool,
    /// Remove VBA macro blobs.
    pub remove_macros: bool,
    /// Apply approved spelling corrections.
    pub correct_spelling: bool,
    /// Replace formulas with their cached values (XLSX).
    pub flatten_formulas: bool,
    /// Drawing removal policy.
    pub draw_policy: DrawPolicy,
    /// PDF processing mode.
    pub pdf_mode: PdfMode,
    /// Convert PDFs to DOCX after cleaning (unsupported; reserved).
    pub pdf_to_docx: bool,
    /// Ids of spelling issues approved for application.
    pub approved_spelling: Vec<String>,
    /// Ids of sensitive-data findings approved for redaction.
    pub redact_sensitive: Vec<String>,
    /// Ids of hidden-content findings approved for removal.
    pub hidden_to_clean: Vec<String>,
    /// Ids of visual-object findings approved for removal.
    pub visuals_to_clean: Vec<String>,
}

impl CleanOptions {
    /// All removal flags enabled, no selections.
    pub fn all() -> Self {
        Self {
            remove_metadata: true,
            remove_comments: true,
            accept_track_changes: true,
            remove_hidden_content: true,
            remove_embedded_objects: true,
            remove_macros: true,
            correct_spelling: true,
            ..Default::default()
        }
    }

    /// No removals at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// Set the drawing policy.
    pub fn with_draw_policy(mut self, policy: DrawPolicy) -> Self {
        self.draw_policy = policy;
        self
    }

    /// Approve a set of sensitive-data findings for redaction.
    pub fn with_redactions(mut self, ids: Vec<String>) -> Self {
        self.redact_sensitive = ids;
        self
    }

    /// Approve a set of spelling issues for application.
    pub fn with_spelling(mut self, ids: Vec<String>) -> Self {
        self.correct_spelling = true;
        self.approved_spelling = ids;
        self
    }
}

/// Connection settings for the proofreader's LLM stage.
///
/// The provider is abstracted behind [`crate::proofread::LlmClient`]; this
/// struct only carries wire-level settings. A missing API key disables the
/// remote stage entirely (the deterministic prefilter still runs).
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Provider label (informational; one provider is currently wired).
    pub provider: String,
    /// API key. `None` disables the remote stage.
    pub api_key: Option<String>,
    /// Model identifier sent with each request.
    pub model: String,
    /// Retry attempts for retriable failures (timeouts, 429, 5xx).
    pub max_retries: u32,
    /// Per-call deadline in milliseconds.
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            max_retries: 4,
            timeout_ms: 60_000,
        }
    }
}

impl LlmConfig {
    /// Read configuration from `LLM_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            provider: std::env::var("LLM_PROVIDER").unwrap_or(defaults.provider),
            api_key: std::env::var("LLM_API_KEY").ok().filter(|k| !k.is_empty()),
            model: std::env::var("LLM_MODEL").unwrap_or(defaults.model),
            max_retries: std::env::var("LLM_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_retries),
            timeout_ms: std::env::var("LLM_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_ms),
        }
    }

    /// Whether the remote stage can run at all.
    pub fn remote_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_options_all() {
        let opts = CleanOptions::all();
        assert!(opts.remove_metadata);
        assert!(opts.remove_macros);
        assert!(opts.approved_spelling.is_empty());
        assert_eq!(opts.draw_policy, DrawPolicy::None);
    }

    #[test]
    fn test_clean_options_none() {
        let opts = CleanOptions::none();
        assert!(!opts.remove_metadata);
        assert!(!opts.correct_spelling);
    }

    #[test]
    fn test_llm_config_defaults() {
        let config = LlmConfig::default();
        assert_eq!(config.max_retries, 4);
        assert_eq!(config.timeout_ms, 60_000);
        assert!(!config.remote_enabled());
    }

    #[test]
    fn test_draw_policy_serde() {
        assert_eq!(serde_json::to_string(&DrawPolicy::Auto).unwrap(), "\"auto\"");
        assert_eq!(serde_json::to_string(&PdfMode::TextOnly).unwrap(), "\"text-only\"");
    }
}
