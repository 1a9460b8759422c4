use std::collections::{HashMap, HashSet};

use crate::constants::{BM25_B, BM25_K1};

/// Function words ignored by the lexical judge and the stripped query variant.
pub const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "could", "should", "may", "might", "must", "can", "to",
    "of", "in", "for", "on", "with", "at", "by", "from", "as", "into", "about", "than", "then",
    "here", "there", "when", "where", "why", "how", "all", "each", "some", "such", "no", "not",
    "only", "so", "too", "very", "just", "and", "but", "if", "or", "because", "while", "what",
    "which", "who", "whom", "this", "that", "these", "those", "am", "it", "its", "me", "my", "i",
    "tell", "please",
];

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Lowercased alphanumeric tokens. `%` stays attached so "ts%" survives.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '%'))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Term statistics for BM25, built once alongside the vectors.
#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    term_freqs: Vec<HashMap<String, u32>>,
    doc_lens: Vec<u32>,
    doc_freqs: HashMap<String, u32>,
    avg_len: f32,
}

impl KeywordIndex {
    pub fn build<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        let mut index = Self::default();

        for text in texts {
            let mut tf: HashMap<String, u32> = HashMap::new();
            let tokens = tokenize(text);
            index.doc_lens.push(tokens.len() as u32);
            for token in tokens {
                *tf.entry(token).or_default() += 1;
            }
            for term in tf.keys() {
                *index.doc_freqs.entry(term.clone()).or_default() += 1;
            }
            index.term_freqs.push(tf);
        }

        let total: u64 = index.doc_lens.iter().map(|&l| l as u64).sum();
        index.avg_len = if index.doc_lens.is_empty() {
            0.0
        } else {
            total as f32 / index.doc_lens.len() as f32
        };

        index
    }

    pub fn len(&self) -> usize {
        self.doc_lens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_lens.is_empty()
    }

    pub fn document_frequency(&self, term: &str) -> u32 {
        self.doc_freqs.get(term).copied().unwrap_or(0)
    }

    fn idf(&self, term: &str) -> f32 {
        let n = self.len() as f32;
        let df = self.document_frequency(term) as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    /// Raw BM25 score of one document for a deduplicated term set.
    pub fn score(&self, doc: usize, terms: &HashSet<String>) -> f32 {
        let Some(tf) = self.term_freqs.get(doc) else {
            return 0.0;
        };
        let len = self.doc_lens[doc] as f32;
        let avg = if self.avg_len > 0.0 { self.avg_len } else { 1.0 };

        terms
            .iter()
            .filter_map(|term| tf.get(term).map(|&f| (term, f as f32)))
            .map(|(term, f)| {
                let denom = f + BM25_K1 * (1.0 - BM25_B + BM25_B * len / avg);
                self.idf(term) * f * (BM25_K1 + 1.0) / denom
            })
            .sum()
    }

    /// Scores for every document, divided by the best score so the top match is 1.0.
    /// All zeros when nothing matches.
    pub fn normalized_scores(&self, terms: &HashSet<String>) -> Vec<f32> {
        let raw: Vec<f32> = (0..self.len()).map(|doc| self.score(doc, terms)).collect();
        let max = raw.iter().copied().fold(0.0f32, f32::max);
        if max <= 0.0 {
            return vec![0.0; raw.len()];
        }
        raw.into_iter().map(|s| s / max).collect()
    }
}
