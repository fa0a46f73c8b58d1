//! SES-CD state machine
//!
//! The Simple Endoscopic Score for Crohn's Disease is usually reported as a
//! total after per-region subscores ("SES-CD: ileum 2, right colon 1, rectum 0,
//! total 3"). The machine must pick the total and never a regional number.
//!
//! It runs over a bounded window of tokens after each anchor phrase. The window
//! length is the only noise budget; there is no skip counter.
//!
//!     JustEntered   integer          -> PertinentScore (number right after anchor)
//!                   total/aggregate  -> PertinentPrelude
//!                   region name      -> SubscorePrelude
//!     Ready         total/aggregate  -> PertinentPrelude
//!                   region name      -> SubscorePrelude
//!                   integer          -> ignored
//!     SubscorePrelude  integer       -> Ready (regional value, discarded)
//!     PertinentPrelude integer       -> PertinentScore
//!                      skip words, keywords of either class are absorbed
//!
//! PertinentScore and Unknown are terminal. Unknown is entered when a number
//! is expected but the digits do not fit any score (overflow); the window then
//! resolves to not found. Totals are held as `u32`, so a digit run longer than
//! that is never read as a score even though it is a well-formed integer.
//!
//! Per field, anchors are tried in configured order and the first window that
//! yields a score wins. Findings are tried before the impression.
use crate::config::{ConfigError, EndoscoreConfig, SesCdConfig, TokenizerConfig};
use crate::lexing::{AnchorHit, AnchorLocator, Normalizer};
use crate::outcome::{first_found, settle, Extraction, ScanError};
use crate::validation::ses_cd_score;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

const MACHINE: &str = "ses-cd";

static DEFAULT_EXTRACTOR: Lazy<SesCdExtractor> = Lazy::new(|| {
    SesCdExtractor::new(&SesCdConfig::default(), &TokenizerConfig::default())
        .expect("default SES-CD anchors must compile")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SesCdState {
    JustEntered,
    Ready,
    SubscorePrelude,
    PertinentPrelude,
    PertinentScore(u32),
    Unknown,
}

impl fmt::Display for SesCdState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SesCdState::JustEntered => f.write_str("JUST_ENTERED"),
            SesCdState::Ready => f.write_str("READY"),
            SesCdState::SubscorePrelude => f.write_str("SUBSCORE_PRELUDE"),
            SesCdState::PertinentPrelude => f.write_str("PERTINENT_PRELUDE"),
            SesCdState::PertinentScore(value) => write!(f, "PERTINENT_SCORE({})", value),
            SesCdState::Unknown => f.write_str("UNKNOWN"),
        }
    }
}

/// Token classes the machine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Integer(u32),
    /// All digits, but too large to be read as a score.
    Unreadable,
    SkipWord,
    PertinentPrelude,
    SubscorePrelude,
    Other,
}

/// Keyword classes for the SES-CD machine.
#[derive(Debug, Clone)]
pub struct SesCdVocabulary {
    skip_words: HashSet<String>,
    pertinent_preludes: HashSet<String>,
    subscore_preludes: HashSet<String>,
}

impl SesCdVocabulary {
    pub fn new(config: &SesCdConfig) -> Self {
        let set = |words: &[String]| words.iter().cloned().collect::<HashSet<_>>();
        Self {
            skip_words: set(&config.skip_words),
            pertinent_preludes: set(&config.pertinent_preludes),
            subscore_preludes: set(&config.subscore_preludes),
        }
    }

    pub fn classify(&self, token: &str) -> TokenClass {
        if let Some(value) = ses_cd_score(token) {
            TokenClass::Integer(value)
        } else if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
            TokenClass::Unreadable
        } else if self.skip_words.contains(token) {
            TokenClass::SkipWord
        } else if self.pertinent_preludes.contains(token) {
            TokenClass::PertinentPrelude
        } else if self.subscore_preludes.contains(token) {
            TokenClass::SubscorePrelude
        } else {
            TokenClass::Other
        }
    }
}

impl Default for SesCdVocabulary {
    fn default() -> Self {
        Self::new(&SesCdConfig::default())
    }
}

/// The transition function. Driving a terminal state is an invariant violation.
pub fn transition(
    state: SesCdState,
    token: &str,
    vocabulary: &SesCdVocabulary,
) -> Result<SesCdState, ScanError> {
    use TokenClass as C;

    let class = vocabulary.classify(token);
    let next = match (state, class) {
        (SesCdState::PertinentScore(_) | SesCdState::Unknown, _) => {
            return Err(ScanError::InvariantViolation {
                machine: MACHINE,
                state: state.to_string(),
                token: token.to_string(),
            });
        }

        (SesCdState::JustEntered, C::Integer(value)) => SesCdState::PertinentScore(value),
        (SesCdState::JustEntered, C::Unreadable) => SesCdState::Unknown,
        (SesCdState::JustEntered | SesCdState::Ready, C::PertinentPrelude) => {
            SesCdState::PertinentPrelude
        }
        (SesCdState::JustEntered | SesCdState::Ready, C::SubscorePrelude) => {
            SesCdState::SubscorePrelude
        }
        (SesCdState::JustEntered | SesCdState::Ready, _) => state,

        (SesCdState::SubscorePrelude, C::Integer(_) | C::Unreadable) => SesCdState::Ready,
        (SesCdState::SubscorePrelude, _) => SesCdState::SubscorePrelude,

        (SesCdState::PertinentPrelude, C::Integer(value)) => SesCdState::PertinentScore(value),
        (SesCdState::PertinentPrelude, C::Unreadable) => SesCdState::Unknown,
        (SesCdState::PertinentPrelude, _) => SesCdState::PertinentPrelude,
    };
    tracing::trace!(machine = MACHINE, token, from = %state, to = %next);
    Ok(next)
}

/// How a window ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SesCdEnd {
    PertinentScore(u32),
    Unknown,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SesCdRun {
    pub end: SesCdEnd,
    pub consumed: usize,
}

impl SesCdRun {
    pub fn resolve(&self) -> Extraction<u32> {
        match self.end {
            SesCdEnd::PertinentScore(value) => Extraction::Found(value),
            SesCdEnd::Unknown | SesCdEnd::Exhausted => Extraction::NotFound,
        }
    }
}

/// Walk one window from JustEntered until a terminal state or its end.
pub fn run(window: &[String], vocabulary: &SesCdVocabulary) -> Result<SesCdRun, ScanError> {
    let mut state = SesCdState::JustEntered;
    for (i, token) in window.iter().enumerate() {
        state = transition(state, token, vocabulary)?;
        let end = match state {
            SesCdState::PertinentScore(value) => Some(SesCdEnd::PertinentScore(value)),
            SesCdState::Unknown => Some(SesCdEnd::Unknown),
            _ => None,
        };
        if let Some(end) = end {
            return Ok(SesCdRun {
                end,
                consumed: i + 1,
            });
        }
    }
    Ok(SesCdRun {
        end: SesCdEnd::Exhausted,
        consumed: window.len(),
    })
}

/// Which report section a score came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Findings,
    Impression,
}

/// A found SES-CD total and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SesCdHit {
    pub score: u32,
    pub field: Field,
    pub anchor: String,
}

/// Report-level SES-CD extraction.
#[derive(Debug, Clone)]
pub struct SesCdExtractor {
    vocabulary: SesCdVocabulary,
    anchors: AnchorLocator,
    normalizer: Normalizer,
    window: usize,
}

impl SesCdExtractor {
    pub fn new(config: &SesCdConfig, tokenizer: &TokenizerConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            vocabulary: SesCdVocabulary::new(config),
            anchors: AnchorLocator::new(config.anchors.iter().cloned())?,
            normalizer: Normalizer::new().with_lowercase(tokenizer.lowercase),
            window: config.window,
        })
    }

    pub fn from_config(config: &EndoscoreConfig) -> Result<Self, ConfigError> {
        Self::new(&config.ses_cd, &config.tokenizer)
    }

    /// The token window following one anchor hit.
    pub fn window_after(&self, text: &str, hit: &AnchorHit) -> Vec<String> {
        self.normalizer
            .tokenize_window(&text[hit.offset..], self.window)
    }

    /// First anchor window in `text` that yields a score.
    pub fn scan_field(&self, text: &str) -> Option<(u32, AnchorHit)> {
        self.anchors.locate(text).into_iter().find_map(|hit| {
            let window = self.window_after(text, &hit);
            let result = run(&window, &self.vocabulary);
            tracing::debug!(machine = MACHINE, anchor = %hit.phrase, offset = hit.offset, ?result, "window finished");
            settle(MACHINE, result.map(|finished| finished.resolve()))
                .found()
                .map(|score| (score, hit))
        })
    }

    /// Try the findings, then the impression. First hit wins.
    pub fn extract(&self, findings: &str, impression: &str) -> Extraction<SesCdHit> {
        first_found(
            [(Field::Findings, findings), (Field::Impression, impression)]
                .into_iter()
                .map(|(field, text)| {
                    Extraction::from(self.scan_field(text)).map(|(score, hit)| SesCdHit {
                        score,
                        field,
                        anchor: hit.phrase,
                    })
                }),
        )
    }
}

impl Default for SesCdExtractor {
    fn default() -> Self {
        DEFAULT_EXTRACTOR.clone()
    }
}
