//! Report-level extraction over realistic procedure notes.

use endoscore::mayo::MayoExtractor;
use endoscore::ses_cd::{Field, SesCdExtractor};
use endoscore::{extract_mayo, extract_rutgeerts, extract_ses_cd, Extraction};
use rstest::rstest;

#[rstest]
#[case(
    "Colonoscopy to the cecum. Mayo endoscopic subscore 2, total Mayo score 6.",
    Extraction::Found(2)
)]
#[case("Impression: Ulcerative colitis, Mayo 1.", Extraction::Found(1))]
#[case(
    "Pancolitis. Mayo score 1 in the sigmoid. Rectum with Mayo 3 changes.",
    Extraction::Found(3)
)]
#[case(
    "Partial Mayo: SF 2, RB 1, PGA 2. Endoscopic appearance deferred.",
    Extraction::NotFound
)]
#[case(
    "Mayo score, HB index 7, endoscopic 2",
    Extraction::NotFound
)]
#[case("Mayo:ma=2/md=1", Extraction::Found(2))]
#[case("Patient's Mayo's endoscopic subscore was 2.", Extraction::Found(2))]
#[case("No inflammation. Normal terminal ileum.", Extraction::NotFound)]
fn mayo_reports(#[case] report: &str, #[case] expected: Extraction<u8>) {
    assert_eq!(extract_mayo(report), expected);
}

#[test]
fn mayo_noise_beyond_budget_loses_score() {
    let filler = "word ".repeat(25);
    let report = format!("Mayo {} endoscopic 2", filler);
    assert_eq!(extract_mayo(&report), Extraction::NotFound);

    let close = format!("Mayo endoscopic {} 2", "word ".repeat(19));
    assert_eq!(extract_mayo(&close), Extraction::Found(2));
}

#[test]
fn mayo_breakdown_for_full_score() {
    let report = "Mayo score: stool 2, bleeding 1, endoscopic 3, physician 2, total 8.";
    let breakdown = MayoExtractor::default()
        .breakdown(report)
        .expect("breakdown");
    assert_eq!(breakdown.endoscopic, Extraction::Found(3));
    assert_eq!(breakdown.stool_frequency, Some(2));
    assert_eq!(breakdown.rectal_bleeding, Some(1));
    assert_eq!(breakdown.physician_global, Some(2));
    assert_eq!(breakdown.total, Some(8));
}

#[rstest]
#[case("SES-CD total score was 11.", "", Extraction::Found(11))]
#[case("SES-CD: 4", "", Extraction::Found(4))]
#[case(
    "SES-CD ileum 3, right colon 1, rectum 0",
    "",
    Extraction::NotFound
)]
#[case(
    "SES-CD ileum 3, right colon 1, rectum 0",
    "Overall SES-CD aggregate score 4.",
    Extraction::Found(4)
)]
#[case(
    "",
    "Simple Endoscopic Score for Crohn's Disease was 6",
    Extraction::Found(6)
)]
#[case("Crohn's ileitis.", "Active disease.", Extraction::NotFound)]
fn ses_cd_reports(
    #[case] findings: &str,
    #[case] impression: &str,
    #[case] expected: Extraction<u32>,
) {
    assert_eq!(extract_ses_cd(findings, impression), expected);
}

#[test]
fn ses_cd_findings_win_over_impression() {
    let hit = SesCdExtractor::default()
        .extract("SES-CD total 5.", "SES-CD total 12.")
        .found()
        .expect("hit");
    assert_eq!(hit.score, 5);
    assert_eq!(hit.field, Field::Findings);
    assert_eq!(hit.anchor, "ses-cd");
}

#[test]
fn ses_cd_total_outside_window() {
    let filler = "segment ".repeat(40);
    let findings = format!("SES-CD {} total 9", filler);
    assert_eq!(extract_ses_cd(&findings, ""), Extraction::NotFound);
}

#[rstest]
#[case("Neoterminal ileum: Rutgeerts i1.", "i1")]
#[case("Rutgeerts score of 4 at the anastomosis.", "i4")]
#[case("Prior rutgeerts i3; today rutgeerts score is i1.", "i3")]
#[case("Rutgers 0", "i0")]
fn rutgeerts_reports(#[case] report: &str, #[case] expected: &str) {
    assert_eq!(
        extract_rutgeerts(report),
        Extraction::Found(expected.to_string())
    );
}

#[test]
fn rutgeerts_absent() {
    assert_eq!(
        extract_rutgeerts("Ileocolonic anastomosis, no ulceration."),
        Extraction::NotFound
    );
}

#[test]
fn not_found_renders_as_sentinel() {
    assert_eq!(extract_mayo("").to_string(), endoscore::NOT_FOUND);
    assert_eq!(
        serde_json::to_string(&extract_ses_cd("", "")).unwrap(),
        "\"NOT FOUND\""
    );
}
