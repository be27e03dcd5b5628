// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::manual_find)]
#![allow(clippy::match_like_matches_macro)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # docshield
//!
//! Document sanitization toolkit: inspect, risk-score, and clean business
//! documents (DOCX, PPTX, XLSX, PDF) before they leave the building.
//!
//! ## What it does
//!
//! - **Detection**: metadata, comments, tracked changes, hidden content,
//!   hidden sheets and columns, sensitive formulas, embedded objects,
//!   macros, PII/financial patterns, broken links, spelling damage
//! - **Risk scoring**: a table-driven technical score plus a deterministic
//!   five-category business-risk classification with a client-ready gate
//! - **Cleaning**: selective, format-preserving removal with before/after
//!   scores; anchored spelling correction that survives run fragmentation
//! - **Reporting**: a stable JSON schema and a self-contained HTML report,
//!   packaged with the cleaned binary into one archive
//!
//! ## Quick start
//!
//! ```ignore
//! use docshield::{CancelToken, CleanOptions, DocumentFormat, Sanitizer};
//!
//! # fn main() -> docshield::Result<()> {
//! let bytes = std::fs::read("proposal.docx")?;
//! let sanitizer = Sanitizer::new();
//!
//! // Inspect
//! let analysis = sanitizer.analyze(
//!     &bytes,
//!     DocumentFormat::Docx,
//!     "proposal.docx",
//!     &CancelToken::new(),
//! )?;
//! println!("risk score: {}", analysis.summary.risk_score);
//!
//! // Clean everything and write the output archive
//! let outcome = sanitizer.clean(
//!     &bytes,
//!     DocumentFormat::Docx,
//!     "proposal.docx",
//!     &CleanOptions::all(),
//!     &CancelToken::new(),
//! )?;
//! std::fs::write("proposal.cleaned.docx", &outcome.cleaned)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Scope notes
//!
//! PDF handling covers the info dictionary, page annotations, and
//! embedded files; page content streams pass through untouched and are
//! never treated as sanitized. The proofreader's remote stage is optional
//! and degrades to deterministic-only results when unreachable.

#![warn(missing_docs)]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Format containers
pub mod container;

// Text projection
pub mod extract;

// Finding types
pub mod findings;

// Detector framework
pub mod detectors;

// Sensitive-pattern library
pub mod patterns;

// Proofreader (prefilter + optional LLM stage)
pub mod proofread;

// Anchored text applier
pub mod apply;

// Per-format cleaners
pub mod clean;

// Technical scorer and business risk engine
pub mod risk;

// Report assembly (JSON + HTML)
pub mod report;

// Orchestration
pub mod pipeline;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports
pub use apply::{ApplyStats, EditOp};
pub use clean::CleanStats;
pub use config::{CleanOptions, DrawPolicy, LlmConfig, PdfMode};
pub use container::{Document, DocumentFormat};
pub use error::{Error, Result};
pub use findings::{Finding, FindingCategory, Severity, SpellingIssue};
pub use pipeline::{package, AnalyzeOutcome, CleanOutcome, Sanitizer};
pub use proofread::CancelToken;
pub use report::Report;
pub use risk::scorer::{RiskLevel, Summary};
pub use risk::{BusinessCategory, BusinessFlag, BusinessLevel, BusinessRisk};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
