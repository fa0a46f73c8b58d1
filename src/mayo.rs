//! Mayo state machine
//!
//! Finds the endoscopic Mayo subscore. Reports tend to list the whole Mayo
//! breakdown in prose ("Mayo: stool frequency 1, rectal bleeding 0, endoscopic
//! subscore 2, physician global 1, total 4"), so the machine tracks all four
//! subcomponents plus an explicit total and resolves to the mucosal-appearance
//! value.
//!
//! States
//!
//!     Entry ──keyword──▶ Prelude(kind) ──value──▶ Ready ──keyword──▶ Prelude(kind)
//!       │                (or TotalPrelude)
//!       └──subscore──▶ AtStandaloneScore
//!
//!     Terminal: TooManySkips, AtStopWord, AtStandaloneScore.
//!
//! Rules per token:
//!     - A keyword (stop word, subscore keyword, `total`) resets the skip
//!       counter and moves to AtStopWord or the matching prelude, from any
//!       live state.
//!     - Only in Entry, a token that is itself a valid subscore ends the run
//!       as a standalone score. This is a precision risk: nothing confirms the
//!       number is the mucosal subscore, it merely follows `mayo` directly.
//!     - In a prelude, a token passing that prelude's validator is cached,
//!       resets the counter and moves to Ready.
//!     - Anything else is a skip. Once `max_skips` skips have accumulated since
//!       the last reset, the next one ends the run with TooManySkips.
//!
//! A run is started at every occurrence of the anchor token in the report;
//! the report's score is the maximum of the runs that resolved to a value.
use crate::config::{EndoscoreConfig, MayoConfig, TokenizerConfig};
use crate::lexing::{indices_of, Normalizer};
use crate::outcome::{most_severe, settle, Extraction, ScanError};
use crate::validation::{subscore, total_score};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

const MACHINE: &str = "mayo";

/// The four Mayo subcomponents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Subscore {
    StoolFrequency,
    RectalBleeding,
    MucosalAppearance,
    PhysicianGlobal,
}

/// Machine states. The last three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MayoState {
    Entry,
    Ready,
    Prelude(Subscore),
    TotalPrelude,
    TooManySkips,
    AtStopWord,
    AtStandaloneScore(u8),
}

impl fmt::Display for MayoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MayoState::Entry => f.write_str("ENTRY"),
            MayoState::Ready => f.write_str("READY"),
            MayoState::Prelude(Subscore::StoolFrequency) => f.write_str("SF_PRELUDE"),
            MayoState::Prelude(Subscore::RectalBleeding) => f.write_str("RB_PRELUDE"),
            MayoState::Prelude(Subscore::MucosalAppearance) => f.write_str("MA_PRELUDE"),
            MayoState::Prelude(Subscore::PhysicianGlobal) => f.write_str("MD_PRELUDE"),
            MayoState::TotalPrelude => f.write_str("TOTAL_PRELUDE"),
            MayoState::TooManySkips => f.write_str("TOO_MANY_SKIPS"),
            MayoState::AtStopWord => f.write_str("AT_STOP_WORD"),
            MayoState::AtStandaloneScore(value) => write!(f, "AT_STANDALONE_SCORE({})", value),
        }
    }
}

/// Keyword classes that move the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Stop,
    Subscore(Subscore),
    Total,
}

impl Keyword {
    fn target(self) -> MayoState {
        match self {
            Keyword::Stop => MayoState::AtStopWord,
            Keyword::Subscore(kind) => MayoState::Prelude(kind),
            Keyword::Total => MayoState::TotalPrelude,
        }
    }
}

/// Per-run evidence: at most one value per subcomponent, plus the skip counter.
///
/// Created fresh for every anchor occurrence and dropped with its run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MayoCache {
    pub stool_frequency: Option<u8>,
    pub rectal_bleeding: Option<u8>,
    pub mucosal_appearance: Option<u8>,
    pub physician_global: Option<u8>,
    pub total: Option<u8>,
    pub skips: usize,
}

impl MayoCache {
    pub fn get(&self, kind: Subscore) -> Option<u8> {
        match kind {
            Subscore::StoolFrequency => self.stool_frequency,
            Subscore::RectalBleeding => self.rectal_bleeding,
            Subscore::MucosalAppearance => self.mucosal_appearance,
            Subscore::PhysicianGlobal => self.physician_global,
        }
    }

    fn save(&mut self, kind: Subscore, value: u8) {
        let slot = match kind {
            Subscore::StoolFrequency => &mut self.stool_frequency,
            Subscore::RectalBleeding => &mut self.rectal_bleeding,
            Subscore::MucosalAppearance => &mut self.mucosal_appearance,
            Subscore::PhysicianGlobal => &mut self.physician_global,
        };
        *slot = Some(value);
    }
}

/// Keyword sets and budget driving the machine.
#[derive(Debug, Clone)]
pub struct MayoVocabulary {
    anchor: String,
    max_skips: usize,
    stop_words: HashSet<String>,
    stool_frequency: HashSet<String>,
    rectal_bleeding: HashSet<String>,
    mucosal_appearance: HashSet<String>,
    physician_global: HashSet<String>,
    total: String,
}

impl MayoVocabulary {
    pub fn new(config: &MayoConfig) -> Self {
        let set = |words: &[String]| words.iter().cloned().collect::<HashSet<_>>();
        Self {
            anchor: config.anchor.clone(),
            max_skips: config.max_skips,
            stop_words: set(&config.stop_words),
            stool_frequency: set(&config.stool_frequency),
            rectal_bleeding: set(&config.rectal_bleeding),
            mucosal_appearance: set(&config.mucosal_appearance),
            physician_global: set(&config.physician_global),
            total: config.total.clone(),
        }
    }

    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    /// Keyword class of `token`, if it moves the machine. Stop words win over
    /// subscore keywords, which win over `total`.
    pub fn classify(&self, token: &str) -> Option<Keyword> {
        if self.stop_words.contains(token) {
            Some(Keyword::Stop)
        } else if self.stool_frequency.contains(token) {
            Some(Keyword::Subscore(Subscore::StoolFrequency))
        } else if self.rectal_bleeding.contains(token) {
            Some(Keyword::Subscore(Subscore::RectalBleeding))
        } else if self.mucosal_appearance.contains(token) {
            Some(Keyword::Subscore(Subscore::MucosalAppearance))
        } else if self.physician_global.contains(token) {
            Some(Keyword::Subscore(Subscore::PhysicianGlobal))
        } else if token == self.total {
            Some(Keyword::Total)
        } else {
            None
        }
    }
}

impl Default for MayoVocabulary {
    fn default() -> Self {
        Self::new(&MayoConfig::default())
    }
}

/// Count a non-advancing token against the budget.
fn skip(
    stay: MayoState,
    mut cache: MayoCache,
    vocabulary: &MayoVocabulary,
) -> (MayoState, MayoCache) {
    if cache.skips >= vocabulary.max_skips {
        (MayoState::TooManySkips, cache)
    } else {
        cache.skips += 1;
        (stay, cache)
    }
}

fn follow(keyword: Keyword, mut cache: MayoCache) -> (MayoState, MayoCache) {
    cache.skips = 0;
    (keyword.target(), cache)
}

/// The transition function: `(state, token, cache) -> (state, cache)`.
///
/// Driving a terminal state is an invariant violation.
pub fn transition(
    state: MayoState,
    token: &str,
    cache: MayoCache,
    vocabulary: &MayoVocabulary,
) -> Result<(MayoState, MayoCache), ScanError> {
    let keyword = vocabulary.classify(token);
    let next = match state {
        MayoState::Entry => {
            if let Some(value) = subscore(token) {
                (MayoState::AtStandaloneScore(value), cache)
            } else if let Some(keyword) = keyword {
                follow(keyword, cache)
            } else {
                skip(MayoState::Entry, cache, vocabulary)
            }
        }
        MayoState::Ready => match keyword {
            Some(keyword) => follow(keyword, cache),
            None => skip(MayoState::Ready, cache, vocabulary),
        },
        MayoState::Prelude(kind) => match (keyword, subscore(token)) {
            (Some(keyword), _) => follow(keyword, cache),
            (None, Some(value)) => {
                let mut cache = cache;
                cache.save(kind, value);
                cache.skips = 0;
                (MayoState::Ready, cache)
            }
            (None, None) => skip(state, cache, vocabulary),
        },
        MayoState::TotalPrelude => match (keyword, total_score(token)) {
            (Some(keyword), _) => follow(keyword, cache),
            (None, Some(value)) => {
                let mut cache = cache;
                cache.total = Some(value);
                cache.skips = 0;
                (MayoState::Ready, cache)
            }
            (None, None) => skip(state, cache, vocabulary),
        },
        MayoState::TooManySkips | MayoState::AtStopWord | MayoState::AtStandaloneScore(_) => {
            return Err(ScanError::InvariantViolation {
                machine: MACHINE,
                state: state.to_string(),
                token: token.to_string(),
            });
        }
    };
    tracing::trace!(machine = MACHINE, token, from = %state, to = %next.0, skips = next.1.skips);
    Ok(next)
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MayoEnd {
    TooManySkips,
    AtStopWord,
    AtStandaloneScore(u8),
    /// Tokens ran out before a terminal state.
    Exhausted,
}

/// One completed run over one anchor occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MayoRun {
    pub end: MayoEnd,
    pub cache: MayoCache,
    pub consumed: usize,
}

impl MayoRun {
    /// Standalone score if the run ended on one, otherwise the cached
    /// mucosal-appearance value.
    pub fn resolve(&self) -> Extraction<u8> {
        match self.end {
            MayoEnd::AtStandaloneScore(value) => Extraction::Found(value),
            _ => self.cache.mucosal_appearance.into(),
        }
    }

    pub fn breakdown(&self) -> MayoBreakdown {
        MayoBreakdown {
            endoscopic: self.resolve(),
            stool_frequency: self.cache.stool_frequency,
            rectal_bleeding: self.cache.rectal_bleeding,
            mucosal_appearance: self.cache.mucosal_appearance,
            physician_global: self.cache.physician_global,
            total: self.cache.total,
            end: self.end,
        }
    }
}

/// Everything a run learned, for callers that want more than the subscore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MayoBreakdown {
    pub endoscopic: Extraction<u8>,
    pub stool_frequency: Option<u8>,
    pub rectal_bleeding: Option<u8>,
    pub mucosal_appearance: Option<u8>,
    pub physician_global: Option<u8>,
    pub total: Option<u8>,
    pub end: MayoEnd,
}

/// Walk `tokens` from the Entry state until a terminal state or the end.
pub fn run(tokens: &[String], vocabulary: &MayoVocabulary) -> Result<MayoRun, ScanError> {
    let mut state = MayoState::Entry;
    let mut cache = MayoCache::default();

    for (i, token) in tokens.iter().enumerate() {
        (state, cache) = transition(state, token, cache, vocabulary)?;
        let end = match state {
            MayoState::TooManySkips => Some(MayoEnd::TooManySkips),
            MayoState::AtStopWord => Some(MayoEnd::AtStopWord),
            MayoState::AtStandaloneScore(value) => Some(MayoEnd::AtStandaloneScore(value)),
            _ => None,
        };
        if let Some(end) = end {
            return Ok(MayoRun {
                end,
                cache,
                consumed: i + 1,
            });
        }
    }

    Ok(MayoRun {
        end: MayoEnd::Exhausted,
        cache,
        consumed: tokens.len(),
    })
}

/// Report-level Mayo extraction.
#[derive(Debug, Clone)]
pub struct MayoExtractor {
    vocabulary: MayoVocabulary,
    normalizer: Normalizer,
}

impl MayoExtractor {
    pub fn new(config: &MayoConfig, tokenizer: &TokenizerConfig) -> Self {
        Self {
            vocabulary: MayoVocabulary::new(config),
            normalizer: Normalizer::new()
                .with_lowercase(tokenizer.lowercase)
                .with_splitters(config.splitters.iter().cloned()),
        }
    }

    pub fn from_config(config: &EndoscoreConfig) -> Self {
        Self::new(&config.mayo, &config.tokenizer)
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.normalizer.tokenize(text)
    }

    /// One run per anchor occurrence, each starting at the anchor token.
    pub fn scan(&self, text: &str) -> Vec<Result<MayoRun, ScanError>> {
        let tokens = self.tokenize(text);
        indices_of(&tokens, self.vocabulary.anchor())
            .into_iter()
            .map(|start| {
                let result = run(&tokens[start..], &self.vocabulary);
                tracing::debug!(machine = MACHINE, start, ?result, "run finished");
                result
            })
            .collect()
    }

    /// Maximum subscore across all anchor runs.
    pub fn extract(&self, text: &str) -> Extraction<u8> {
        most_severe(
            self.scan(text)
                .into_iter()
                .map(|result| settle(MACHINE, result.map(|run| run.resolve()))),
        )
    }

    /// Breakdown of the run that supplied the reported score, if any did.
    pub fn breakdown(&self, text: &str) -> Option<MayoBreakdown> {
        let runs: Vec<MayoRun> = self
            .scan(text)
            .into_iter()
            .filter_map(|result| settle(MACHINE, result.map(Extraction::Found)).found())
            .collect();
        let best = most_severe(runs.iter().map(MayoRun::resolve)).found()?;
        runs.into_iter()
            .find(|run| run.resolve() == Extraction::Found(best))
            .map(|run| run.breakdown())
    }
}

impl Default for MayoExtractor {
    fn default() -> Self {
        Self::new(&MayoConfig::default(), &TokenizerConfig::default())
    }
}
