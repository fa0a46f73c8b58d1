//! Anchor locator
//!
//! Anchors are marker phrases (`ses-cd`, `simple endoscopic score for crohn's
//! disease`) that mark where a score is likely to follow. The locator searches
//! the raw text case-insensitively and reports, per phrase, the byte offset just
//! past its first occurrence.
//!
//! Only the first occurrence of each phrase is located. Results keep the order
//! of the phrase list, not the order of appearance in the text; phrases that do
//! not occur contribute nothing.
use crate::config::ConfigError;
use regex::{Regex, RegexBuilder};

/// Offset just past an anchor phrase, plus the phrase that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorHit {
    pub phrase: String,
    pub offset: usize,
}

/// Precompiled case-insensitive matchers for an ordered list of phrases.
#[derive(Debug, Clone)]
pub struct AnchorLocator {
    anchors: Vec<(String, Regex)>,
}

impl AnchorLocator {
    pub fn new<I, S>(phrases: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let anchors = phrases
            .into_iter()
            .map(Into::into)
            .filter(|phrase: &String| !phrase.is_empty())
            .map(|phrase| {
                let regex = RegexBuilder::new(&regex::escape(&phrase))
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| ConfigError::InvalidPattern {
                        pattern: phrase.clone(),
                        message: e.to_string(),
                    })?;
                Ok((phrase, regex))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self { anchors })
    }

    /// First-occurrence hits, one per phrase found, in phrase-list order.
    pub fn locate(&self, text: &str) -> Vec<AnchorHit> {
        self.anchors
            .iter()
            .filter_map(|(phrase, regex)| {
                regex.find(text).map(|m| AnchorHit {
                    phrase: phrase.clone(),
                    offset: m.end(),
                })
            })
            .collect()
    }

    /// Just the trailing offsets of [locate](Self::locate).
    pub fn offsets(&self, text: &str) -> Vec<usize> {
        self.locate(text).into_iter().map(|hit| hit.offset).collect()
    }
}
