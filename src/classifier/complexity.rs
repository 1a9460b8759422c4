//! Complexity and category estimation.
//!
//! Both are lexical: complexity picks the retrieval breadth, category picks how many
//! query variants the expander may generate.

use regex::Regex;

use super::error::ClassifierError;
use super::types::{ComplexityClass, QueryCategory};

const ANALYTICAL_PATTERN: &str = r"(?i)\b(?:why|explain|explains|analy[sz]e|analysis|trends?|trending|over time|over the (?:years|seasons)|how (?:did|has|have|does|do)|what factors|factors|evolved?|evolution|impact of|led to|cause[sd]?)\b";
const COMPARATIVE_PATTERN: &str = r"(?i)\b(?:compare|compared|comparing|comparison|versus|vs\.?|difference between|differ|better than|worse than|similar to|head[- ]to[- ]head)\b";
const MODERATE_PATTERN: &str = r"(?i)\b(?:list|top \d+|rank|ranked|ranking|which (?:players?|teams?)|describe|tell me about|overview|summari[sz]e|breakdown)\b";

const SLANG_PATTERN: &str =
    r"(?i)\b(?:lol|lmao|bruh|ngl|tbh|smh|idk|wtf|omg|pls|plz|u|ur|gonna|wanna|dude|yo)\b";
const CONVERSATIONAL_PATTERN: &str = r"(?i)\b(?:you|your|you're|yours|let's|i think|i feel|i guess|i wonder|btw|by the way|anyway|honestly|curious|just wondering)\b";

const COMPLEX_WORD_COUNT: usize = 20;
const FRAGMENT_WORD_COUNT: usize = 3;
const NOISY_PUNCTUATION_RATIO: f32 = 0.3;
const NOISY_REPEAT_RUN: usize = 3;

#[derive(Debug, Clone)]
pub struct ComplexityEstimator {
    analytical: Regex,
    comparative: Regex,
    moderate: Regex,
    slang: Regex,
    conversational: Regex,
}

impl ComplexityEstimator {
    pub fn new() -> Result<Self, ClassifierError> {
        Ok(Self {
            analytical: compile("analytical", ANALYTICAL_PATTERN)?,
            comparative: compile("comparative", COMPARATIVE_PATTERN)?,
            moderate: compile("moderate", MODERATE_PATTERN)?,
            slang: compile("slang", SLANG_PATTERN)?,
            conversational: compile("conversational", CONVERSATIONAL_PATTERN)?,
        })
    }

    /// Highest matching class wins.
    pub fn complexity(&self, query: &str) -> ComplexityClass {
        if self.analytical.is_match(query) {
            ComplexityClass::Analytical
        } else if self.comparative.is_match(query) {
            ComplexityClass::Comparative
        } else if self.moderate.is_match(query) {
            ComplexityClass::Moderate
        } else {
            ComplexityClass::Lookup
        }
    }

    pub fn category(&self, query: &str, complexity: ComplexityClass) -> QueryCategory {
        if self.is_noisy(query) {
            QueryCategory::Noisy
        } else if self.conversational.is_match(query) {
            QueryCategory::Conversational
        } else if complexity >= ComplexityClass::Comparative
            || query.split_whitespace().count() > COMPLEX_WORD_COUNT
        {
            QueryCategory::Complex
        } else {
            QueryCategory::Simple
        }
    }

    fn is_noisy(&self, query: &str) -> bool {
        if self.slang.is_match(query) || has_repeated_run(query, NOISY_REPEAT_RUN) {
            return true;
        }

        let visible: Vec<char> = query.chars().filter(|c| !c.is_whitespace()).collect();
        if visible.is_empty() {
            return false;
        }
        let punctuation = visible.iter().filter(|c| c.is_ascii_punctuation()).count();
        if punctuation as f32 / visible.len() as f32 > NOISY_PUNCTUATION_RATIO {
            return true;
        }

        // terse lowercase fragments like "lebron ppg"
        let words = query.split_whitespace().count();
        words <= FRAGMENT_WORD_COUNT
            && !query.contains('?')
            && !query.chars().any(|c| c.is_uppercase())
    }
}

fn compile(name: &str, pattern: &str) -> Result<Regex, ClassifierError> {
    Regex::new(pattern).map_err(|e| ClassifierError::InvalidPattern {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

/// `regex` has no backreferences, so runs like "sooooo" are found by hand.
fn has_repeated_run(text: &str, run: usize) -> bool {
    let mut prev = None;
    let mut len = 0usize;
    for c in text.chars() {
        if !c.is_alphabetic() {
            prev = None;
            len = 0;
            continue;
        }
        let c = c.to_ascii_lowercase();
        if Some(c) == prev {
            len += 1;
            if len >= run {
                return true;
            }
        } else {
            prev = Some(c);
            len = 1;
        }
    }
    false
}
