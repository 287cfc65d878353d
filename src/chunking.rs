//! Two-phase greedy chunking: a paragraph pass, then sentence regrouping.
//!
//! Phase one accepts whole paragraphs while they fit the character budget.
//! The first paragraph that exceeds the budget stops the pass; it and every
//! paragraph after it (short ones included) fall through to phase two, which
//! re-splits the remainder into sentences and greedily packs them into
//! budget-sized groups. Sentences are never split across two chunks; a single
//! sentence longer than the budget is emitted whole as an oversized chunk.

use std::sync::LazyLock;

use regex::Regex;

/// One or more blank lines separate paragraphs.
static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\n+").expect("paragraph break regex"));

/// Candidate sentence boundary: terminator followed by a whitespace run.
/// The boundary only counts when the next character is lowercase, which
/// deliberately treats abbreviations ("Dr. Smith") and capitalized sentence
/// starts as non-boundaries. A known limitation of the heuristic, not a bug.
static SENTENCE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.?!]\s+").expect("sentence boundary regex"));

/// Chunking parameters.
#[derive(Clone, Debug)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub max_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { max_chars: 250 }
    }
}

/// Splits `text` into an ordered sequence of chunks no longer than the budget,
/// except when a single paragraph or sentence alone exceeds it.
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let budget = config.max_chars;

    let paragraphs: Vec<&str> = PARAGRAPH_BREAK
        .split(text)
        .filter(|candidate| !candidate.trim().is_empty())
        .collect();

    let mut chunks: Vec<String> = Vec::new();
    let mut accepted = 0usize;
    for paragraph in &paragraphs {
        if paragraph.chars().count() > budget {
            // First oversized paragraph ends the pass; it and everything
            // after it is re-split by sentence instead.
            break;
        }
        chunks.push((*paragraph).to_string());
        accepted += 1;
    }

    if accepted == paragraphs.len() {
        return chunks;
    }

    // Rejoin the deferred tail with its original separators restored.
    let remaining = paragraphs[accepted..].join("\n\n");

    let mut group: Vec<String> = Vec::new();
    let mut group_len = 0usize;
    for sentence in split_sentences(&remaining) {
        let sentence_len = sentence.chars().count();
        let joined_len = if group.is_empty() {
            sentence_len
        } else {
            group_len + 1 + sentence_len
        };
        if joined_len <= budget || group.is_empty() {
            group.push(sentence);
            group_len = joined_len;
        } else {
            chunks.push(group.join(" "));
            group = vec![sentence];
            group_len = sentence_len;
        }
    }
    if !group.is_empty() {
        chunks.push(group.join(" "));
    }

    chunks
}

/// Splits text into sentences at `[.?!]` + whitespace + lowercase boundaries.
///
/// The terminator stays with the preceding sentence, the whitespace run is
/// dropped, and the lowercase letter opens the next sentence.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0usize;

    for boundary in SENTENCE_BOUNDARY.find_iter(text) {
        let follows_lowercase = text[boundary.end()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_lowercase());
        if !follows_lowercase {
            continue;
        }
        // The terminator is a single ASCII byte, so start + 1 is a char boundary.
        let end = boundary.start() + 1;
        sentences.push(text[start..end].to_string());
        start = boundary.end();
    }
    if start < text.len() {
        sentences.push(text[start..].to_string());
    }

    sentences
        .into_iter()
        .filter(|sentence| !sentence.trim().is_empty())
        .collect()
}
