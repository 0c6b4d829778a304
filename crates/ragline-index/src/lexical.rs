//! BM25 lexical index over passage text.

use std::collections::HashMap;

const K1: f32 = 1.2;
const B: f32 = 0.75;

/// Lowercased whitespace tokenization with leading and trailing
/// non-alphanumeric characters stripped from each token. Deterministic;
/// no stemming.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|token| !token.is_empty())
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct Posting {
    doc: usize,
    tf: u32,
}

/// Inverted term-frequency index with BM25 scoring.
///
/// Documents are identified by position: the first appended text is
/// document 0. Document frequency and average length are derived at
/// scoring time, so appending documents one batch at a time produces
/// exactly the same scores as rebuilding from the full document set.
#[derive(Debug, Clone, Default)]
pub struct LexicalIndex {
    postings: HashMap<String, Vec<Posting>>,
    doc_lengths: Vec<u32>,
    total_tokens: u64,
}

impl LexicalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index over an initial set of texts.
    pub fn build<'a, I>(texts: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut index = Self::new();
        index.append(texts);
        index
    }

    /// Append texts, assigning them the next sequential document ids.
    pub fn append<'a, I>(&mut self, texts: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for text in texts {
            let doc = self.doc_lengths.len();
            let tokens = tokenize(text);
            let mut counts: HashMap<&str, u32> = HashMap::new();
            for token in &tokens {
                *counts.entry(token.as_str()).or_insert(0) += 1;
            }
            for (term, tf) in counts {
                self.postings
                    .entry(term.to_string())
                    .or_default()
                    .push(Posting { doc, tf });
            }
            self.doc_lengths.push(tokens.len() as u32);
            self.total_tokens += tokens.len() as u64;
        }
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.doc_lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_lengths.is_empty()
    }

    /// BM25 scores for the given query tokens.
    ///
    /// Only documents containing at least one query term receive an
    /// entry. A repeated query token contributes once per occurrence.
    pub fn score(&self, query_tokens: &[String]) -> HashMap<usize, f32> {
        let n = self.doc_lengths.len();
        if n == 0 {
            return HashMap::new();
        }
        let avgdl = self.total_tokens as f32 / n as f32;

        let mut scores: HashMap<usize, f32> = HashMap::new();
        for token in query_tokens {
            let Some(postings) = self.postings.get(token) else {
                continue;
            };
            let df = postings.len() as f32;
            let idf = (1.0 + (n as f32 - df + 0.5) / (df + 0.5)).ln();
            for posting in postings {
                let tf = posting.tf as f32;
                let dl = self.doc_lengths[posting.doc] as f32;
                let norm = tf + K1 * (1.0 - B + B * dl / avgdl);
                *scores.entry(posting.doc).or_insert(0.0) += idf * tf * (K1 + 1.0) / norm;
            }
        }
        scores
    }
}
