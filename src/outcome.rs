//! Extraction outcomes and the scan error taxonomy.
//!
//! Absence of evidence is not an error: it is [Extraction::NotFound], a normal
//! value every extractor may return. Failed range checks never surface at all;
//! they only steer state transitions. [ScanError] is reserved for input that is
//! not text and for logic defects inside a machine, and it is always kept
//! distinct from `NotFound` until a report-level driver logs it and drops the
//! run.
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Sentinel written in place of a score when none was found.
pub const NOT_FOUND: &str = "NOT FOUND";

/// Sentinel written when a scan failed. Never a score, never `NOT_FOUND`.
pub const ERROR: &str = "ERROR";

/// A validated score, or the explicit absence of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extraction<T> {
    Found(T),
    NotFound,
}

impl<T> Extraction<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Extraction::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Extraction::Found(value) => Some(value),
            Extraction::NotFound => None,
        }
    }

    pub fn as_ref(&self) -> Extraction<&T> {
        match self {
            Extraction::Found(value) => Extraction::Found(value),
            Extraction::NotFound => Extraction::NotFound,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Extraction<U> {
        match self {
            Extraction::Found(value) => Extraction::Found(f(value)),
            Extraction::NotFound => Extraction::NotFound,
        }
    }
}

impl<T> From<Option<T>> for Extraction<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Extraction::Found(value),
            None => Extraction::NotFound,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Extraction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extraction::Found(value) => write!(f, "{}", value),
            Extraction::NotFound => f.write_str(NOT_FOUND),
        }
    }
}

impl<T: Serialize> Serialize for Extraction<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Extraction::Found(value) => value.serialize(serializer),
            Extraction::NotFound => serializer.serialize_str(NOT_FOUND),
        }
    }
}

/// Errors a scan can raise. Neither variant means "no score in the text".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// Input that is not text was handed to the tokenizer.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A machine was driven somewhere it can never legally go.
    #[error("{machine} machine: token {token:?} received in {state}")]
    InvariantViolation {
        machine: &'static str,
        state: String,
        token: String,
    },
}

/// Reduce one run's result to a plain extraction for aggregation.
///
/// Errors are logged and contribute nothing, so a defective run can never
/// masquerade as a score nor silently vanish from the logs.
pub fn settle<T: fmt::Debug>(
    machine: &'static str,
    result: Result<Extraction<T>, ScanError>,
) -> Extraction<T> {
    match result {
        Ok(extraction) => extraction,
        Err(error) => {
            tracing::warn!(machine, %error, "run discarded after scan error");
            Extraction::NotFound
        }
    }
}

/// Maximum (most severe) found value. Ties keep the first occurrence.
pub fn most_severe<T, I>(candidates: I) -> Extraction<T>
where
    T: Ord,
    I: IntoIterator<Item = Extraction<T>>,
{
    candidates
        .into_iter()
        .filter_map(Extraction::found)
        .fold(None, |best: Option<T>, value| match best {
            Some(current) if current >= value => Some(current),
            _ => Some(value),
        })
        .into()
}

/// First found value in iteration order.
pub fn first_found<T, I>(candidates: I) -> Extraction<T>
where
    I: IntoIterator<Item = Extraction<T>>,
{
    candidates
        .into_iter()
        .find(Extraction::is_found)
        .unwrap_or(Extraction::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_sentinel() {
        assert_eq!(Extraction::Found(3).to_string(), "3");
        assert_eq!(Extraction::<u8>::NotFound.to_string(), "NOT FOUND");
    }

    #[test]
    fn test_serialize_keeps_sentinel_distinct() {
        let found = serde_json::to_string(&Extraction::Found(2u8)).unwrap();
        let missing = serde_json::to_string(&Extraction::<u8>::NotFound).unwrap();
        assert_eq!(found, "2");
        assert_eq!(missing, "\"NOT FOUND\"");
    }

    #[test]
    fn test_most_severe() {
        let runs = vec![
            Extraction::Found(2),
            Extraction::NotFound,
            Extraction::Found(3),
            Extraction::Found(1),
        ];
        assert_eq!(most_severe(runs), Extraction::Found(3));
        assert_eq!(most_severe(Vec::<Extraction<u8>>::new()), Extraction::NotFound);
        assert_eq!(
            most_severe(vec![Extraction::<u8>::NotFound, Extraction::NotFound]),
            Extraction::NotFound
        );
    }

    #[test]
    fn test_first_found() {
        let runs = vec![Extraction::NotFound, Extraction::Found(7), Extraction::Found(9)];
        assert_eq!(first_found(runs), Extraction::Found(7));
        assert_eq!(first_found(Vec::<Extraction<u8>>::new()), Extraction::NotFound);
    }

    #[test]
    fn test_settle_discards_errors() {
        let error: Result<Extraction<u8>, ScanError> = Err(ScanError::InvariantViolation {
            machine: "mayo",
            state: "AtStopWord".to_string(),
            token: "2".to_string(),
        });
        assert_eq!(settle("mayo", error), Extraction::NotFound);
        assert_eq!(settle("mayo", Ok(Extraction::Found(1u8))), Extraction::Found(1));
    }
}
