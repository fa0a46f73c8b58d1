//! Rutgeerts grade extractor
//!
//! Unlike Mayo and SES-CD this is not a token machine. Rutgeerts grades are
//! short and formulaic ("Rutgeerts score i2", "rutgeerts was 3"), so one
//! structural pattern over the raw text is enough:
//!
//!     marker  (rutgeerts | rutgeert | rutgers)
//!     then up to `max_connectors` connector words (score, was, is, of)
//!     then a grade 0-4, optionally prefixed with `i`
//!
//! Matching is case-insensitive and spans line breaks. Every non-overlapping
//! mention is collected and the most severe grade wins; equal grades keep the
//! first mention. Grades are always reported with the `i` prefix.
use crate::config::{ConfigError, EndoscoreConfig, RutgeertsConfig};
use crate::outcome::{most_severe, Extraction};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::Range;

static DEFAULT_EXTRACTOR: Lazy<RutgeertsExtractor> = Lazy::new(|| {
    RutgeertsExtractor::new(&RutgeertsConfig::default())
        .expect("default Rutgeerts pattern must compile")
});

/// Highest grade on the Rutgeerts scale.
pub const MAX_GRADE: u8 = 4;

/// A Rutgeerts grade, `i0` through `i4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RutgeertsGrade(u8);

impl RutgeertsGrade {
    pub fn new(value: u8) -> Option<Self> {
        (value <= MAX_GRADE).then_some(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Parse `2`, `i2` or `I2`.
    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.to_ascii_lowercase();
        let digits = lowered.strip_prefix('i').unwrap_or(&lowered);
        digits.parse::<u8>().ok().and_then(Self::new)
    }
}

impl fmt::Display for RutgeertsGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.0)
    }
}

impl Serialize for RutgeertsGrade {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One matched mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RutgeertsMention {
    pub grade: RutgeertsGrade,
    /// Byte range of the whole mention in the source text.
    pub span: Range<usize>,
}

/// Compiled Rutgeerts pattern.
#[derive(Debug, Clone)]
pub struct RutgeertsExtractor {
    pattern: Regex,
}

impl RutgeertsExtractor {
    pub fn new(config: &RutgeertsConfig) -> Result<Self, ConfigError> {
        let source = build_pattern(config);
        let pattern = Regex::new(&source).map_err(|e| ConfigError::InvalidPattern {
            pattern: source.clone(),
            message: e.to_string(),
        })?;
        Ok(Self { pattern })
    }

    pub fn from_config(config: &EndoscoreConfig) -> Result<Self, ConfigError> {
        Self::new(&config.rutgeerts)
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Every non-overlapping mention, in text order.
    pub fn mentions(&self, text: &str) -> Vec<RutgeertsMention> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let grade = RutgeertsGrade::parse(caps.name("grade")?.as_str())?;
                Some(RutgeertsMention {
                    grade,
                    span: whole.range(),
                })
            })
            .collect()
    }

    /// Most severe grade mentioned anywhere in the text.
    pub fn extract(&self, text: &str) -> Extraction<RutgeertsGrade> {
        let mentions = self.mentions(text);
        tracing::debug!(machine = "rutgeerts", ?mentions, "mentions collected");
        most_severe(mentions.into_iter().map(|m| Extraction::Found(m.grade)))
    }
}

impl Default for RutgeertsExtractor {
    fn default() -> Self {
        DEFAULT_EXTRACTOR.clone()
    }
}

fn alternation(words: &[String]) -> String {
    words
        .iter()
        .filter(|w| !w.is_empty())
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|")
}

fn build_pattern(config: &RutgeertsConfig) -> String {
    let markers = alternation(&config.markers);
    let connectors = alternation(&config.connectors);
    let grade = format!(r"(?P<grade>i?[0-{}])", MAX_GRADE);
    if connectors.is_empty() || config.max_connectors == 0 {
        format!(r"(?is)(?:{})\s*{}", markers, grade)
    } else {
        format!(
            r"(?is)(?:{})\s*(?:(?:{})\s*){{0,{}}}{}",
            markers, connectors, config.max_connectors, grade
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn extract(text: &str) -> Extraction<String> {
        RutgeertsExtractor::default()
            .extract(text)
            .map(|grade| grade.to_string())
    }

    #[test]
    fn test_default_pattern_shape() {
        assert_eq!(
            RutgeertsExtractor::default().pattern(),
            r"(?is)(?:rutgeerts|rutgeert|rutgers)\s*(?:(?:score|was|is|of)\s*){0,4}(?P<grade>i?[0-4])"
        );
    }

    #[test]
    fn test_most_severe_wins() {
        let text = "Prior rutgeerts score i2. Today rutgeerts was 3.";
        assert_eq!(extract(text), Extraction::Found("i3".to_string()));
    }

    #[test]
    fn test_no_marker() {
        assert_eq!(extract("Anastomosis without ulceration."), Extraction::NotFound);
        assert_eq!(extract(""), Extraction::NotFound);
    }

    #[rstest]
    #[case("Rutgeerts i0", "i0")]
    #[case("RUTGEERTS SCORE I4", "i4")]
    #[case("rutgeert score is 1", "i1")]
    #[case("Rutgers score of i2", "i2")]
    #[case("rutgeerts\nscore\nwas\ni3", "i3")]
    #[case("rutgeerts score score score score 2", "i2")]
    fn test_grades(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(extract(text), Extraction::Found(expected.to_string()));
    }

    #[rstest]
    #[case("rutgeerts score score score score score 2")]
    #[case("rutgeerts grade i2")]
    #[case("rutgeerts score 5")]
    fn test_outside_pattern(#[case] text: &str) {
        assert_eq!(extract(text), Extraction::NotFound);
    }

    #[test]
    fn test_mentions_in_text_order() {
        let text = "Rutgeerts i1 then Rutgeerts i4 then rutgers 2";
        let grades: Vec<u8> = RutgeertsExtractor::default()
            .mentions(text)
            .iter()
            .map(|m| m.grade.value())
            .collect();
        assert_eq!(grades, vec![1, 4, 2]);
    }

    #[test]
    fn test_mention_span() {
        let text = "Impression: Rutgeerts i2.";
        let mentions = RutgeertsExtractor::default().mentions(text);
        assert_eq!(mentions.len(), 1);
        assert_eq!(&text[mentions[0].span.clone()], "Rutgeerts i2");
    }

    #[test]
    fn test_grade_parse_and_display() {
        assert_eq!(RutgeertsGrade::parse("I3").map(|g| g.to_string()), Some("i3".into()));
        assert_eq!(RutgeertsGrade::parse("2").map(|g| g.value()), Some(2));
        assert_eq!(RutgeertsGrade::parse("i5"), None);
        assert_eq!(RutgeertsGrade::new(5), None);
    }

    #[test]
    fn test_custom_connector_cap() {
        let config = RutgeertsConfig {
            max_connectors: 1,
            ..RutgeertsConfig::default()
        };
        let extractor = RutgeertsExtractor::new(&config).unwrap();
        assert_eq!(
            extractor.extract("rutgeerts score i2").map(|g| g.value()),
            Extraction::Found(2)
        );
        assert_eq!(
            extractor.extract("rutgeerts score was i2"),
            Extraction::NotFound
        );
    }
}
