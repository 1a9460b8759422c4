//! Retrieval query shaping.
//!
//! The transformer keeps the whole question so concept words ("effective", "playmaker")
//! keep driving the embedding; entity names from structured rows are only appended.

use crate::constants::MAX_EXPANSIONS;
use crate::corpus::{is_stop_word, tokenize};
use crate::services::StructuredRows;

/// Abbreviation → spelled-out phrase.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("ppg", "points per game"),
    ("rpg", "rebounds per game"),
    ("apg", "assists per game"),
    ("spg", "steals per game"),
    ("bpg", "blocks per game"),
    ("mpg", "minutes per game"),
    ("ts%", "true shooting percentage"),
    ("fg%", "field goal percentage"),
    ("ft%", "free throw percentage"),
    ("3pt", "three point"),
    ("mvp", "most valuable player"),
    ("dpoy", "defensive player of the year"),
    ("roy", "rookie of the year"),
    ("goat", "greatest of all time"),
    ("ot", "overtime"),
];

/// Words after "per" that make it a rate ("per game") rather than the efficiency stat.
const RATE_WORDS: &[&str] = &[
    "game", "games", "minute", "minutes", "36", "48", "100", "possession", "possessions",
    "season", "night",
];

/// Concept → related wording used in community posts.
const SYNONYMS: &[(&str, &[&str])] = &[
    ("playmaker", &["passer", "facilitator", "assists"]),
    ("playmaking", &["passing", "vision", "assists"]),
    ("scorer", &["scoring", "buckets"]),
    ("defender", &["defense", "defensive"]),
    ("defense", &["defensive", "stops"]),
    ("clutch", &["late game", "fourth quarter"]),
    ("effective", &["efficient", "impact"]),
    ("elite", &["best", "top tier"]),
    ("exciting", &["fun", "entertaining"]),
    ("shooter", &["shooting", "threes"]),
    ("rebounder", &["rebounding", "boards"]),
    ("injury", &["injured", "hurt"]),
    ("trade", &["traded", "deal"]),
];

#[derive(Debug, Clone, Default)]
pub struct QueryTransformer {
    max_entity_terms: usize,
}

impl QueryTransformer {
    pub fn new(max_entity_terms: usize) -> Self {
        Self { max_entity_terms }
    }

    /// The full question plus up to `max_entity_terms` entity names from `rows` that it
    /// does not already mention.
    pub fn transform(&self, question: &str, rows: Option<&StructuredRows>) -> String {
        let question = question.trim();
        let Some(rows) = rows else {
            return question.to_string();
        };

        let lower = question.to_lowercase();
        let extra: Vec<String> = rows
            .entity_names(self.max_entity_terms + 4)
            .into_iter()
            .filter(|name| !lower.contains(&name.to_lowercase()))
            .take(self.max_entity_terms)
            .collect();

        if extra.is_empty() {
            question.to_string()
        } else {
            format!("{question} {}", extra.join(" "))
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryExpander;

impl QueryExpander {
    pub fn new() -> Self {
        Self
    }

    /// `query` first, then abbreviation, synonym, cleaned and stop-word-stripped variants,
    /// deduplicated, at most `max_expansions` (and never more than [`MAX_EXPANSIONS`]).
    pub fn expand(&self, query: &str, max_expansions: usize) -> Vec<String> {
        let limit = max_expansions.clamp(1, MAX_EXPANSIONS);
        let tokens = tokenize(query);

        let candidates = [
            Some(query.to_string()),
            expand_abbreviations(query, &tokens),
            expand_synonyms(&tokens),
            collapse_repeats(query),
            strip_stop_words(&tokens),
        ];

        let mut variants: Vec<String> = Vec::with_capacity(limit);
        for variant in candidates.into_iter().flatten() {
            if variants.len() >= limit {
                break;
            }
            if !variant.trim().is_empty() && !variants.iter().any(|v| v.eq_ignore_ascii_case(&variant)) {
                variants.push(variant);
            }
        }
        variants
    }
}

fn expand_abbreviations(query: &str, tokens: &[String]) -> Option<String> {
    // same split as `tokenize`, case kept
    let raw: Vec<&str> = query
        .split(|c: char| !(c.is_alphanumeric() || c == '%'))
        .filter(|t| !t.is_empty())
        .collect();

    let mut changed = false;
    let words: Vec<&str> = tokens
        .iter()
        .enumerate()
        .map(|(i, t)| {
            if is_efficiency_rating(&raw, tokens, i) {
                changed = true;
                return "player efficiency rating";
            }
            match ABBREVIATIONS.iter().find(|(abbr, _)| *abbr == t.as_str()) {
                Some((_, full)) => {
                    changed = true;
                    *full
                }
                None => t.as_str(),
            }
        })
        .collect();
    changed.then(|| words.join(" "))
}

/// Only an upper-case "PER" that does not start a rate phrase.
fn is_efficiency_rating(raw: &[&str], tokens: &[String], i: usize) -> bool {
    raw.get(i) == Some(&"PER")
        && tokens
            .get(i + 1)
            .is_none_or(|next| !RATE_WORDS.contains(&next.as_str()))
}

fn expand_synonyms(tokens: &[String]) -> Option<String> {
    let related: Vec<&str> = tokens
        .iter()
        .filter_map(|t| SYNONYMS.iter().find(|(word, _)| *word == t.as_str()))
        .flat_map(|(_, alts)| alts.iter().copied())
        .collect();
    if related.is_empty() {
        return None;
    }
    let content: Vec<&str> = tokens
        .iter()
        .map(String::as_str)
        .filter(|t| !is_stop_word(t))
        .collect();
    Some(format!("{} {}", content.join(" "), related.join(" ")))
}

/// "sooooo goooood" → "soo good". Only returned when something changed.
fn collapse_repeats(query: &str) -> Option<String> {
    let mut out = String::with_capacity(query.len());
    let mut prev = None;
    let mut run = 0usize;
    for c in query.chars() {
        if Some(c) == prev && c.is_alphabetic() {
            run += 1;
            if run >= 2 {
                continue;
            }
        } else {
            prev = Some(c);
            run = 0;
        }
        out.push(c);
    }
    (out != query).then_some(out)
}

fn strip_stop_words(tokens: &[String]) -> Option<String> {
    let content: Vec<&str> = tokens
        .iter()
        .map(String::as_str)
        .filter(|t| !is_stop_word(t))
        .collect();
    (!content.is_empty() && content.len() < tokens.len()).then(|| content.join(" "))
}
