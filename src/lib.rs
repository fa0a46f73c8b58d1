//! # endoscore
//!
//! Extracts endoscopic severity scores embedded as prose in unstructured
//! procedure reports:
//!
//! - endoscopic Mayo subscore, see [mayo]
//! - SES-CD total, see [ses_cd]
//! - Rutgeerts grade, see [rutgeerts]
//!
//! Every extractor is deterministic and pure. It either returns a validated
//! value or [Extraction::NotFound]; it never guesses.
//!
//! Pipeline
//!
//!     raw text -> [lexing] (normalized word tokens, anchor offsets)
//!              -> per-anchor state machine run
//!              -> [outcome] aggregation (max severity / first hit)
//!
//!     Batch processing of many reports lives in [processor], and the
//!     tunable vocabularies and budgets live in [config].

pub mod config;
pub mod lexing;
pub mod mayo;
pub mod outcome;
pub mod processor;
pub mod rutgeerts;
pub mod ses_cd;
pub mod validation;

pub use outcome::{Extraction, ScanError, ERROR, NOT_FOUND};

/// Endoscopic Mayo subscore for a report, using the default vocabulary.
pub fn extract_mayo(report_text: &str) -> Extraction<u8> {
    mayo::MayoExtractor::default().extract(report_text)
}

/// SES-CD total for a report, trying `findings` before `impression`.
pub fn extract_ses_cd(findings_text: &str, impression_text: &str) -> Extraction<u32> {
    ses_cd::SesCdExtractor::default()
        .extract(findings_text, impression_text)
        .map(|hit| hit.score)
}

/// Most severe Rutgeerts grade mentioned in a report, rendered as `iN`.
pub fn extract_rutgeerts(report_text: &str) -> Extraction<String> {
    rutgeerts::RutgeertsExtractor::default()
        .extract(report_text)
        .map(|grade| grade.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_entry_points() {
        assert_eq!(
            extract_mayo("Mayo endoscopic subscore 2, total score 6."),
            Extraction::Found(2)
        );
        assert_eq!(
            extract_ses_cd("SES-CD total score was 4.", ""),
            Extraction::Found(4)
        );
        assert_eq!(
            extract_rutgeerts("Rutgeerts score i2."),
            Extraction::Found("i2".to_string())
        );
        assert_eq!(extract_rutgeerts("No score."), Extraction::NotFound);
    }
}
