//! Declarative signal table.
//!
//! Every detector the classifier uses is a `{name, weight, matcher}` record compiled once
//! into a [`SignalLibrary`]. Classification is a fold over this table; there is no
//! detector logic outside it apart from the definitional guard.

use std::collections::HashSet;

use regex::Regex;

use super::error::ClassifierError;
use super::types::OverrideKind;

/// Which part of the table a group belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalSet {
    Statistical,
    Contextual,
    Connector,
}

/// Uncompiled table row.
#[derive(Debug, Clone, Copy)]
pub struct PatternSpec {
    pub name: &'static str,
    pub set: SignalSet,
    pub weight: f32,
    pub pattern: &'static str,
    /// Vocabulary groups score but do not signal statistical *intent*.
    pub vocabulary: bool,
}

impl PatternSpec {
    pub const fn stat(name: &'static str, weight: f32, pattern: &'static str) -> Self {
        Self {
            name,
            set: SignalSet::Statistical,
            weight,
            pattern,
            vocabulary: false,
        }
    }

    pub const fn stat_vocabulary(name: &'static str, weight: f32, pattern: &'static str) -> Self {
        Self {
            name,
            set: SignalSet::Statistical,
            weight,
            pattern,
            vocabulary: true,
        }
    }

    pub const fn ctx(name: &'static str, weight: f32, pattern: &'static str) -> Self {
        Self {
            name,
            set: SignalSet::Contextual,
            weight,
            pattern,
            vocabulary: false,
        }
    }

    pub const fn connector(name: &'static str, pattern: &'static str) -> Self {
        Self {
            name,
            set: SignalSet::Connector,
            weight: 0.0,
            pattern,
            vocabulary: false,
        }
    }
}

/// Uncompiled override detector.
#[derive(Debug, Clone, Copy)]
pub struct OverrideSpec {
    pub kind: OverrideKind,
    pub pattern: &'static str,
}

pub const STATISTICAL_SIGNALS: &[PatternSpec] = &[
    PatternSpec::stat(
        "superlative",
        2.0,
        r"(?i)\b(?:most|least|highest|lowest|fewest|leading|leaders?|top|best|worst)\b",
    ),
    PatternSpec::stat_vocabulary(
        "stat_vocabulary",
        2.0,
        r"(?i)\b(?:points?|pts|rebounds?|assists?|steals?|blocks?|turnovers?|ppg|rpg|apg|spg|bpg|per|mpg|3pt|3pm|threes|three[- ]pointers?|field goals?|free throws?|minutes|double[- ]doubles?|triple[- ]doubles?|plus[- ]minus|win shares|usage rate|stats?|statistics)\b|\b(?:ts|fg|efg|ft|3p)%",
    ),
    PatternSpec::stat(
        "aggregation",
        1.5,
        r"(?i)\b(?:how many|how much|total|totals|average|averages|averaged|averaging|sum|count|number of|per game|percentage|career high|season high)\b",
    ),
    PatternSpec::stat(
        "numeric_comparison",
        1.0,
        r"(?i)\b(?:more than|less than|greater than|fewer than|at least|at most|over|under|above|below)\s+\d+",
    ),
    PatternSpec::stat(
        "season_scope",
        1.0,
        r"(?i)\b(?:this season|last season|next season|seasons?|career|playoffs?|postseason|regular season|last \d+ games|this year|last year|(?:19|20)\d{2}(?:-\d{2})?)\b",
    ),
    PatternSpec::stat(
        "ranking",
        1.5,
        r"(?i)\b(?:rank|ranked|ranks|ranking|rankings|leaderboard|standings|top \d+|list (?:of|the|all)|win[- ]loss|record)\b",
    ),
    PatternSpec::stat(
        "stat_action",
        1.0,
        r"(?i)\b(?:scored|scores|grabbed|dished|recorded|shot|shooting|averaged)\b",
    ),
    PatternSpec::stat("numeric_literal", 0.5, r"\b\d+(?:\.\d+)?\b"),
    PatternSpec::stat_vocabulary(
        "team_name",
        1.0,
        r"(?i)\b(?:lakers|celtics|warriors|bulls|heat|knicks|nets|76ers|sixers|raptors|bucks|cavaliers|cavs|pistons|pacers|hawks|hornets|magic|wizards|nuggets|timberwolves|wolves|thunder|trail blazers|blazers|jazz|suns|kings|clippers|mavericks|mavs|rockets|grizzlies|pelicans|spurs)\b",
    ),
];

pub const CONTEXTUAL_SIGNALS: &[PatternSpec] = &[
    PatternSpec::ctx(
        "explanation",
        2.0,
        r"(?i)\b(?:why|how come|explain|explains|explaining|explanation|reasons?|because)\b",
    ),
    PatternSpec::ctx(
        "qualitative",
        2.0,
        r"(?i)\b(?:what makes|what made|style|playstyle|approach|strategy|impact|effective|elite|exciting|special|unique|legacy|reputation|mentality|leadership)\b",
    ),
    PatternSpec::ctx(
        "community_voice",
        1.5,
        r"(?i)\b(?:fans?|reddit|community|people|discussions?|narratives?|debates?|consensus|hype|sentiment|saying|talking about)\b",
    ),
    PatternSpec::ctx(
        "descriptive",
        1.5,
        r"(?i)\b(?:tell me about|describe|description|overview|story|history|background|known for)\b",
    ),
    PatternSpec::ctx(
        "sentiment",
        1.0,
        r"(?i)\b(?:love|loved|hate|hated|frustrat\w*|disappoint\w*|amazing|incredible|clutch|fun|boring)\b",
    ),
    PatternSpec::ctx(
        "analysis",
        1.0,
        r"(?i)\b(?:analy[sz]e|analysis|breakdown|break down|insights?|evaluate|evaluation|assessment|role|fit|chemistry)\b",
    ),
];

pub const CONNECTOR_SIGNALS: &[PatternSpec] = &[
    PatternSpec::connector(
        "and_explain",
        r"(?i)\band\s+(?:explain|why|how|what makes|tell me|describe)\b",
    ),
    PatternSpec::connector("dash_explain", r"(?i)(?:\s-{1,2}|[–—])\s*(?:explain|why|how)\b"),
];

/// Override detectors in priority order; the first match wins.
pub const OVERRIDE_DETECTORS: &[OverrideSpec] = &[
    OverrideSpec {
        kind: OverrideKind::Greeting,
        pattern: r"(?i)^\s*(?:hi|hello|hey|hiya|yo|sup|howdy|greetings|good (?:morning|afternoon|evening)|what'?s up|thanks|thank you|thx)(?:\s+(?:there|all|everyone|folks))?[\s!.,?]*$",
    },
    OverrideSpec {
        kind: OverrideKind::Opinion,
        pattern: r"(?i)\b(?:overrated|underrated|goat|favou?rite|in your opinion|do you think|who(?:'s|\s+is)\s+better|would you rather|your take|hot take|better player)\b",
    },
    OverrideSpec {
        kind: OverrideKind::Biographical,
        pattern: r"\b(?i:who(?:'s|\s+is|\s+was)|tell me about|what makes|what made)\s+\p{Lu}",
    },
    OverrideSpec {
        kind: OverrideKind::Definitional,
        pattern: r"(?i)^\s*(?:what\s+(?:is|are|does|do)\s+(?:an?\s+|the\s+)?[\w%+.-]+(?:\s+[\w%+.-]+){0,3}\s+(?:mean|stand\s+for)|what(?:'s|\s+is|\s+are)\s+(?:an?\s+|the\s+)?[\w%+.-]+(?:\s+[\w%+.-]+){0,2}|define\s+.+|(?:the\s+)?(?:meaning|definition)\s+of\s+.+)\s*\??\s*$",
    },
];

/// Vocabulary groups that name an entity rather than a concept.
pub const ENTITY_GROUPS: &[&str] = &["team_name"];

fn is_proper_noun(word: &str) -> bool {
    let word = word.trim_matches(|c: char| !c.is_alphanumeric());
    let mut chars = word.chars();
    chars.next().is_some_and(char::is_uppercase) && chars.any(char::is_lowercase)
}

/// A compiled signal group.
#[derive(Debug, Clone)]
pub struct PatternGroup {
    pub name: String,
    pub set: SignalSet,
    pub weight: f32,
    pub vocabulary: bool,
    matcher: Regex,
}

impl PatternGroup {
    pub fn compile(spec: &PatternSpec) -> Result<Self, ClassifierError> {
        if spec.weight < 0.0 {
            return Err(ClassifierError::NegativeWeight {
                name: spec.name.to_string(),
                weight: spec.weight,
            });
        }

        let matcher = Regex::new(spec.pattern).map_err(|e| ClassifierError::InvalidPattern {
            name: spec.name.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            name: spec.name.to_string(),
            set: spec.set,
            weight: spec.weight,
            vocabulary: spec.vocabulary,
            matcher,
        })
    }

    /// Boolean by construction, so a group contributes at most once per query.
    pub fn matches(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }
}

#[derive(Debug, Clone)]
pub struct OverrideDetector {
    pub kind: OverrideKind,
    matcher: Regex,
}

impl OverrideDetector {
    pub fn compile(spec: &OverrideSpec) -> Result<Self, ClassifierError> {
        let matcher = Regex::new(spec.pattern).map_err(|e| ClassifierError::InvalidPattern {
            name: format!("{:?}", spec.kind),
            reason: e.to_string(),
        })?;
        Ok(Self {
            kind: spec.kind,
            matcher,
        })
    }

    pub fn matches(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }
}

/// Compiled detector table, indexed by [`SignalSet`].
#[derive(Debug, Clone)]
pub struct SignalLibrary {
    groups: Vec<PatternGroup>,
    overrides: Vec<OverrideDetector>,
}

impl SignalLibrary {
    /// Compiles a library from table rows. Group names must be unique.
    pub fn new(specs: &[PatternSpec], overrides: &[OverrideSpec]) -> Result<Self, ClassifierError> {
        let mut seen = HashSet::new();
        let mut groups = Vec::with_capacity(specs.len());
        for spec in specs {
            if !seen.insert(spec.name) {
                return Err(ClassifierError::DuplicateGroup {
                    name: spec.name.to_string(),
                });
            }
            groups.push(PatternGroup::compile(spec)?);
        }

        let overrides = overrides
            .iter()
            .map(OverrideDetector::compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { groups, overrides })
    }

    /// The built-in basketball statistics / community discussion table.
    pub fn standard() -> Result<Self, ClassifierError> {
        let specs: Vec<PatternSpec> = STATISTICAL_SIGNALS
            .iter()
            .chain(CONTEXTUAL_SIGNALS)
            .chain(CONNECTOR_SIGNALS)
            .copied()
            .collect();
        Self::new(&specs, OVERRIDE_DETECTORS)
    }

    pub fn groups(&self, set: SignalSet) -> impl Iterator<Item = &PatternGroup> {
        self.groups.iter().filter(move |g| g.set == set)
    }

    pub fn overrides(&self) -> &[OverrideDetector] {
        &self.overrides
    }

    pub fn connector_present(&self, text: &str) -> bool {
        self.groups(SignalSet::Connector).any(|g| g.matches(text))
    }

    /// True if a non-vocabulary statistical group fires.
    pub fn has_statistical_intent(&self, text: &str) -> bool {
        self.groups(SignalSet::Statistical)
            .filter(|g| !g.vocabulary)
            .any(|g| g.matches(text))
    }

    /// True if the text names a team or a person-like proper noun ("LeBron", "Jokic").
    /// All-caps abbreviations ("PER", "TS%") and the leading word do not count.
    pub fn mentions_entity(&self, text: &str) -> bool {
        self.groups(SignalSet::Statistical)
            .filter(|g| ENTITY_GROUPS.contains(&g.name.as_str()))
            .any(|g| g.matches(text))
            || text.split_whitespace().skip(1).any(is_proper_noun)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
