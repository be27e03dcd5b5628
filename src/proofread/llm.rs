//! Remote LLM stage of the proofreader.
//!
//! The provider sits behind [`LlmClient`] so tests can inject canned
//! responses. The HTTP client is synchronous; the proofreader bounds
//! concurrency by running at most three chunk calls at a time.

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::findings::{Severity, SpellingIssue};
use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use std::time::Duration;

/// Target chunk size in characters.
pub const CHUNK_SIZE: usize = 5000;

/// A provider-neutral completion call.
pub trait LlmClient: Send + Sync {
    /// Send one prompt, return the raw model text.
    fn complete(&self, prompt: &str) -> Result<String>;
}

/// Chat-completions client over HTTP.
pub struct HttpLlmClient {
    config: LlmConfig,
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpLlmClient {
    /// Build a client from config. Fails when no API key is present.
    pub fn new(config: LlmConfig) -> Result<Self> {
        if config.api_key.is_none() {
            return Err(Error::RemoteUnavailable("no API key configured".to_string()));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::Internal(format!("http client: {}", e)))?;
        // One provider is wired today; the trait is the extension seam.
        let endpoint = "https://api.openai.com/v1/chat/completions".to_string();
        Ok(Self {
            config,
            client,
            endpoint,
        })
    }

    fn try_send(&self, prompt: &str) -> std::result::Result<String, (bool, String)> {
        let body = serde_json::json!({
            "model": self.config.model,
            "temperature": 0,
            "messages": [{"role": "user", "content": prompt}],
        });
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.config.api_key.as_deref().unwrap_or_default())
            .json(&body)
            .send()
            .map_err(|e| (e.is_timeout() || e.is_connect(), e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            return Err((true, format!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err((false, format!("HTTP {}", status)));
        }
        let value: serde_json::Value = response
            .json()
            .map_err(|e| (false, format!("bad response body: {}", e)))?;
        value["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| (false, "response missing content".to_string()))
    }
}

impl LlmClient for HttpLlmClient {
    fn complete(&self, prompt: &str) -> Result<String> {
        let mut last_error = String::new();
        for attempt in 0..self.config.max_retries {
            match self.try_send(prompt) {
                Ok(text) => return Ok(text),
                Err((retriable, msg)) => {
                    last_error = msg;
                    if !retriable {
                        return Err(Error::RemoteUnavailable(last_error));
                    }
                    if attempt + 1 < self.config.max_retries {
                        let base = Duration::from_secs(1 << attempt);
                        let jitter =
                            Duration::from_millis(rand::thread_rng().gen_range(0..=400));
                        log::warn!(
                            "LLM call failed ({}), retry {} in {:?}",
                            last_error,
                            attempt + 1,
                            base + jitter
                        );
                        std::thread::sleep(base + jitter);
                    }
                },
            }
        }
        Err(Error::RemoteUnavailable(last_error))
    }
}

lazy_static! {
    static ref RE_DIGIT_RUN: Regex = Regex::new(r"\d{5,}").unwrap();
    static ref RE_CODE_TOKEN: Regex = Regex::new(r"\b[A-Za-z0-9_-]{6,}\b").unwrap();
}

/// Replace long digit runs and code-like tokens with zeros, preserving
/// character count so offsets survive the round trip.
pub fn mask_noise(text: &str) -> String {
    let mut masked = RE_DIGIT_RUN
        .replace_all(text, |caps: &regex::Captures| "0".repeat(caps[0].len()))
        .into_owned();
    let ranges: Vec<(usize, usize)> = RE_CODE_TOKEN
        .find_iter(&masked)
        .filter(|m| {
            let s = m.as_str();
            s.chars().any(|c| c.is_ascii_digit()) && s.chars().any(|c| c.is_ascii_alphabetic())
        })
        .map(|m| (m.start(), m.end()))
        .collect();
    let mut bytes = masked.into_bytes();
    for (start, end) in ranges {
        for b in &mut bytes[start..end] {
            *b = b'0';
        }
    }
    masked = String::from_utf8(bytes).expect("ascii masking preserves utf-8");
    masked
}

/// Split text into non-overlapping chunks of about [`CHUNK_SIZE`] chars,
/// breaking at whitespace when one is near the boundary.
pub fn chunk_text(text: &str) -> Vec<(usize, &str)> {
    let mut chunks = Vec::new();
    let mut start = 0usize;
    while start < text.len() {
        if text.len() - start <= CHUNK_SIZE {
            chunks.push((start, &text[start..]));
            break;
        }
        let mut end = start + CHUNK_SIZE;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        // Prefer a whitespace break within the last 200 chars of the window
        if let Some(ws) = text[..end]
            .char_indices()
            .rev()
            .take(200)
            .find(|(i, c)| c.is_whitespace() && *i > start)
        {
            end = ws.0 + ws.1.len_utf8();
        }
        chunks.push((start, &text[start..end]));
        start = end;
    }
    chunks
}

/// Build the per-chunk prompt: instructions, the chunk, and the prefilter
/// suspects falling inside it.
pub fn build_prompt(chunk: &str, suspects: &[&SpellingIssue]) -> String {
    let mut prompt = String::with_capacity(chunk.len() + 1024);
    prompt.push_str(
        "You are a spelling corrector for business documents. Find spelling \
         errors and words wrongly split or merged. Respond with ONLY a JSON \
         array; each item: {\"error\": \"exact substring\", \"correction\": \
         \"replacement\", \"startIndex\": n, \"endIndex\": n, \"message\": \
         \"short reason\"}. Copy the error substring exactly, including \
         whitespace. Do not rephrase, translate, or touch numbers.\n",
    );
    if !suspects.is_empty() {
        prompt.push_str("Candidate issues already detected:\n");
        for issue in suspects.iter().take(50) {
            prompt.push_str(&format!(
                "- {:?} -> {:?}\n",
                issue.error, issue.correction
            ));
        }
    }
    prompt.push_str("\nText:\n");
    prompt.push_str(chunk);
    prompt
}

/// Parse one chunk's model response into anchored issues.
///
/// Offsets returned by the model are verified against the chunk; when they
/// do not point at the literal error the issue is relocated by unique
/// substring search, and dropped when the substring is absent or ambiguous.
pub fn parse_response(chunk_start: usize, chunk: &str, raw: &str) -> Vec<SpellingIssue> {
    let Some(json) = extract_json_array(raw) else {
        log::warn!("LLM response contained no JSON array");
        return Vec::new();
    };
    let Ok(items) = serde_json::from_str::<Vec<serde_json::Value>>(&json) else {
        log::warn!("LLM response JSON did not parse");
        return Vec::new();
    };
    let mut issues = Vec::new();
    for item in items {
        let Some(error) = item["error"].as_str() else { continue };
        let Some(correction) = item["correction"].as_str() else {
            continue;
        };
        if error.is_empty() || error == correction {
            continue;
        }
        let declared = item["startIndex"]
            .as_u64()
            .zip(item["endIndex"].as_u64())
            .map(|(s, e)| (s as usize, e as usize));
        let located = match declared {
            Some((s, e))
                if e <= chunk.len()
                    && s < e
                    && chunk.is_char_boundary(s)
                    && chunk.is_char_boundary(e)
                    && &chunk[s..e] == error =>
            {
                Some((s, e))
            },
            _ => {
                // Relocate by unique substring search
                let mut found = chunk.match_indices(error).map(|(i, _)| i);
                match (found.next(), found.next()) {
                    (Some(at), None) => Some((at, at + error.len())),
                    _ => None,
                }
            },
        };
        let Some((start, end)) = located else { continue };
        let message = item["message"].as_str().unwrap_or("Spelling error");
        let before_from = chunk[..start]
            .char_indices()
            .rev()
            .take(30)
            .last()
            .map(|(i, _)| i)
            .unwrap_or(start);
        let after_to = chunk[end..]
            .char_indices()
            .nth(30)
            .map(|(i, _)| end + i)
            .unwrap_or(chunk.len());
        let mut issue = SpellingIssue::new(
            error,
            correction,
            "llm",
            message,
            &chunk[before_from..start],
            &chunk[end..after_to],
        )
        .with_offsets(chunk_start + start, chunk_start + end);
        issue.severity = Severity::Medium;
        issues.push(issue);
    }
    issues
}

fn extract_json_array(raw: &str) -> Option<String> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    (end > start).then(|| raw[start..=end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_noise_preserves_length() {
        let text = "order 1234567 ref AB12CD99 done";
        let masked = mask_noise(text);
        assert_eq!(masked.len(), text.len());
        assert!(masked.contains("0000000"));
        assert!(!masked.contains("AB12CD99"));
        assert!(masked.contains("done"));
    }

    #[test]
    fn test_mask_noise_keeps_plain_words() {
        assert_eq!(mask_noise("plain words only"), "plain words only");
    }

    #[test]
    fn test_chunk_text_covers_everything() {
        let text = "word ".repeat(3000);
        let chunks = chunk_text(&text);
        assert!(chunks.len() >= 3);
        let total: usize = chunks.iter().map(|(_, c)| c.len()).sum();
        assert_eq!(total, text.len());
        for window in chunks.windows(2) {
            assert_eq!(window[0].0 + window[0].1.len(), window[1].0);
        }
    }

    #[test]
    fn test_parse_response_with_offsets() {
        let chunk = "the socal media team";
        let raw = r#"[{"error": "socal", "correction": "social", "startIndex": 4, "endIndex": 9}]"#;
        let issues = parse_response(100, chunk, raw);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].start_index, Some(104));
        assert_eq!(issues[0].end_index, Some(109));
    }

    #[test]
    fn test_parse_response_relocates_bad_offsets() {
        let chunk = "the socal media team";
        let raw = r#"[{"error": "socal", "correction": "social", "startIndex": 0, "endIndex": 5}]"#;
        let issues = parse_response(0, chunk, raw);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].start_index, Some(4));
    }

    #[test]
    fn test_parse_response_rejects_ambiguous() {
        let chunk = "aa bb aa";
        let raw = r#"[{"error": "aa", "correction": "ab"}]"#;
        assert!(parse_response(0, chunk, raw).is_empty());
    }

    #[test]
    fn test_parse_response_with_fences() {
        let chunk = "bad wrd here";
        let raw = "```json\n[{\"error\": \"wrd\", \"correction\": \"word\"}]\n```";
        let issues = parse_response(0, chunk, raw);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].correction, "word");
    }
}
