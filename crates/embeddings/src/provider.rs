use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding request failed: {0}")]
    Request(String),
    #[error("embedding provider returned malformed response: {0}")]
    Malformed(String),
}

/// Text → fixed-dimensionality vector. Implementations truncate input at a
/// word boundary before the request; callers that get an `Err` back must
/// store the decision with its embedding absent and let the startup
/// backfill retry later (§4.1) — this trait never panics and never blocks
/// indefinitely (the HTTP-backed implementations carry a request timeout).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    fn dimensions(&self) -> usize;
}

/// Truncates `text` to at most `char_budget` characters without splitting a
/// word or a UTF-8 codepoint. Falls back to a hard character cut only when
/// the budget is smaller than the first word.
pub fn truncate_at_word_boundary(text: &str, char_budget: usize) -> &str {
    if text.chars().count() <= char_budget {
        return text;
    }

    let mut byte_end = 0;
    let mut last_boundary = None;
    for (count, (idx, ch)) in text.char_indices().enumerate() {
        if count >= char_budget {
            break;
        }
        byte_end = idx + ch.len_utf8();
        if ch.is_whitespace() {
            last_boundary = Some(idx);
        }
    }

    match last_boundary {
        Some(boundary) if boundary > 0 => &text[..boundary],
        _ => &text[..byte_end],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_short_text_is_unchanged() {
        assert_eq!(truncate_at_word_boundary("hello world", 100), "hello world");
    }

    #[test]
    fn truncate_cuts_at_last_whitespace_within_budget() {
        let truncated = truncate_at_word_boundary("the quick brown fox jumps", 12);
        assert_eq!(truncated, "the quick");
    }

    #[test]
    fn truncate_never_splits_a_codepoint() {
        let text = "caf\u{e9}s and caf\u{e9}s repeated many times over";
        let truncated = truncate_at_word_boundary(text, 6);
        assert!(truncated.chars().count() <= 6 || truncated.ends_with("caf\u{e9}"));
        assert!(std::str::from_utf8(truncated.as_bytes()).is_ok());
    }

    #[test]
    fn truncate_falls_back_to_hard_cut_without_whitespace() {
        let truncated = truncate_at_word_boundary("abcdefghijklmnop", 5);
        assert_eq!(truncated, "abcde");
    }
}
