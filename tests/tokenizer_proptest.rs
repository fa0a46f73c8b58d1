//! Property-based tests for tokenization and the extractors
//!
//! These tests ensure that arbitrary report text never panics the pipeline
//! and that the normalizer, anchor locator and extractors keep their output
//! contracts on any input.

use endoscore::lexing::{AnchorLocator, Normalizer};
use endoscore::mayo::MayoExtractor;
use endoscore::rutgeerts::RutgeertsExtractor;
use endoscore::{extract_mayo, extract_ses_cd, Extraction};
use proptest::prelude::*;

fn report_text() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<String>(),
        prop::collection::vec(
            prop_oneof![
                Just("mayo".to_string()),
                Just("Mayo:".to_string()),
                Just("endoscopic".to_string()),
                Just("SF=1".to_string()),
                Just("total".to_string()),
                Just("SES-CD".to_string()),
                Just("rutgeerts".to_string()),
                Just("i2".to_string()),
                Just("score".to_string()),
                Just("hb".to_string()),
                Just(",".to_string()),
                "[0-9]{1,3}\\.?",
                "[a-zA-Z]{1,8}",
            ],
            0..60,
        )
        .prop_map(|words| words.join(" ")),
    ]
}

proptest! {
    #[test]
    fn tokens_are_never_empty_or_lone_punctuation(text in report_text()) {
        let normalizer = Normalizer::new().with_splitters([":", "-", "=", "/"]);
        for token in normalizer.tokenize(&text) {
            prop_assert!(!token.is_empty());
            let mut chars = token.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                prop_assert!(!c.is_ascii_punctuation(), "lone punctuation {:?}", token);
            }
            prop_assert!(!token.ends_with('.'), "trailing period kept in {:?}", token);
        }
    }

    #[test]
    fn window_is_prefix_of_full_tokenization(text in report_text(), limit in 0usize..40) {
        let normalizer = Normalizer::new().with_splitters([":", "-"]);
        let full = normalizer.tokenize(&text);
        let window = normalizer.tokenize_window(&text, limit);
        prop_assert_eq!(&window[..], &full[..limit.min(full.len())]);
    }

    #[test]
    fn anchor_offset_follows_phrase(
        prefix in "[b-l ]{0,20}",
        suffix in "[a-z ]{0,20}",
        upper in any::<[bool; 4]>(),
    ) {
        let anchor: String = "mayo"
            .chars()
            .zip(upper)
            .map(|(c, up)| if up { c.to_ascii_uppercase() } else { c })
            .collect();
        let text = format!("{}#{}#{}", prefix, anchor, suffix);
        let locator = AnchorLocator::new(["mayo"]).unwrap();
        let hits = locator.locate(&text);
        prop_assert_eq!(hits.len(), 1);
        prop_assert_eq!(hits[0].offset, prefix.len() + 1 + anchor.len());
    }

    #[test]
    fn mayo_score_is_deterministic_and_in_range(text in report_text()) {
        let extractor = MayoExtractor::default();
        let first = extractor.extract(&text);
        prop_assert_eq!(first, extractor.extract(&text));
        if let Extraction::Found(score) = first {
            prop_assert!(score <= 3);
        }
        prop_assert_eq!(first, extract_mayo(&text));
    }

    #[test]
    fn ses_cd_never_panics(findings in report_text(), impression in report_text()) {
        let first = extract_ses_cd(&findings, &impression);
        prop_assert_eq!(first, extract_ses_cd(&findings, &impression));
    }

    #[test]
    fn rutgeerts_grade_in_range(text in report_text()) {
        if let Extraction::Found(grade) = RutgeertsExtractor::default().extract(&text) {
            prop_assert!(grade.value() <= 4);
            prop_assert!(grade.to_string().starts_with('i'));
        }
    }
}
