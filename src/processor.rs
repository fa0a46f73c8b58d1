//! Batch processing API
//!
//! Drives the extractors over many reports at once. Input is JSON Lines, one
//! report per line:
//!
//! ```text
//! {"id": "r-17", "text": "...", "findings": "...", "impression": "...", "proc_date": "2019-04-02"}
//! ```
//!
//! Only `id` is required. Mayo and Rutgeerts read `text` (falling back to
//! findings and impression joined); SES-CD reads `findings` (falling back to
//! `text`) and then `impression`. Every other key is carried through to the
//! output untouched, and the report text itself is never echoed back. Input
//! keys that collide with a computed field ([ScoreRecord::OWNED_KEYS]) are
//! dropped so the computed value always wins.
//!
//! Output is one [ScoreRecord] per input record, in input order. Each selected
//! score is either a value, `"NOT FOUND"`, or `"ERROR"` when the field holding
//! the report was not text.
//!
//! Reports are independent, so the batch is processed in parallel with one
//! rayon task per report and no shared state.
use crate::config::{ConfigError, EndoscoreConfig};
use crate::mayo::{MayoBreakdown, MayoExtractor};
use crate::outcome::{Extraction, ScanError, ERROR};
use crate::rutgeerts::{RutgeertsExtractor, RutgeertsGrade};
use crate::ses_cd::{Field, SesCdExtractor};
use rayon::prelude::*;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::io::BufRead;
use thiserror::Error;

/// Errors from reading, processing or rendering a batch
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("invalid score kind '{0}' (expected mayo, ses-cd, rutgeerts or all)")]
    InvalidScoreKind(String),

    #[error("invalid output format '{0}' (expected jsonl or simple)")]
    InvalidFormat(String),

    #[error("line {line}: {message}")]
    InvalidRecord { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Which score to extract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreKind {
    Mayo,
    SesCd,
    Rutgeerts,
}

impl ScoreKind {
    pub const ALL: [ScoreKind; 3] = [ScoreKind::Mayo, ScoreKind::SesCd, ScoreKind::Rutgeerts];

    pub fn name(&self) -> &'static str {
        match self {
            ScoreKind::Mayo => "mayo",
            ScoreKind::SesCd => "ses-cd",
            ScoreKind::Rutgeerts => "rutgeerts",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ScoreKind::Mayo => "Endoscopic Mayo subscore (0-3), max over every 'mayo' mention",
            ScoreKind::SesCd => "SES-CD total, first anchor window that yields one",
            ScoreKind::Rutgeerts => "Rutgeerts grade (i0-i4), most severe mention",
        }
    }

    /// Parse a comma-separated selection such as `"mayo,ses-cd"` or `"all"`.
    pub fn parse_selection(selection: &str) -> Result<Vec<ScoreKind>, ProcessingError> {
        let mut kinds = Vec::new();
        for part in selection.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let parsed = match part {
                "all" => Self::ALL.to_vec(),
                "mayo" => vec![ScoreKind::Mayo],
                "ses-cd" | "ses_cd" | "sescd" => vec![ScoreKind::SesCd],
                "rutgeerts" => vec![ScoreKind::Rutgeerts],
                other => return Err(ProcessingError::InvalidScoreKind(other.to_string())),
            };
            for kind in parsed {
                if !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
        }
        if kinds.is_empty() {
            return Err(ProcessingError::InvalidScoreKind(selection.to_string()));
        }
        Ok(kinds)
    }
}

impl fmt::Display for ScoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Represents the output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    JsonLines,
    Simple,
}

impl OutputFormat {
    pub fn from_string(format: &str) -> Result<Self, ProcessingError> {
        match format {
            "jsonl" | "json" => Ok(OutputFormat::JsonLines),
            "simple" => Ok(OutputFormat::Simple),
            other => Err(ProcessingError::InvalidFormat(other.to_string())),
        }
    }
}

/// One report as handed over by the retrieval side.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReportRecord {
    pub id: Value,
    #[serde(default)]
    pub text: Option<Value>,
    #[serde(default)]
    pub findings: Option<Value>,
    #[serde(default)]
    pub impression: Option<Value>,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

fn as_text<'a>(field: &'static str, value: Option<&'a Value>) -> Result<Option<&'a str>, ScanError> {
    match value {
        None => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(other) => Err(ScanError::MalformedInput(format!(
            "field '{}' is not text: {}",
            field, other
        ))),
    }
}

impl ReportRecord {
    /// Text scanned by the whole-report extractors (Mayo, Rutgeerts).
    pub fn report_text(&self) -> Result<String, ScanError> {
        if let Some(text) = as_text("text", self.text.as_ref())? {
            return Ok(text.to_string());
        }
        let sections: Vec<&str> = [
            as_text("findings", self.findings.as_ref())?,
            as_text("impression", self.impression.as_ref())?,
        ]
        .into_iter()
        .flatten()
        .collect();
        Ok(sections.join("\n"))
    }

    /// `(findings, impression)` for the SES-CD extractor.
    pub fn sections(&self) -> Result<(String, String), ScanError> {
        let findings = match as_text("findings", self.findings.as_ref())? {
            Some(findings) => findings,
            None => as_text("text", self.text.as_ref())?.unwrap_or_default(),
        };
        let impression = as_text("impression", self.impression.as_ref())?.unwrap_or_default();
        Ok((findings.to_string(), impression.to_string()))
    }
}

/// A score slot in the output: a value, `NOT FOUND`, or `ERROR`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell<T> {
    Score(Extraction<T>),
    Error,
}

impl<T: Serialize> Serialize for Cell<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Score(extraction) => extraction.serialize(serializer),
            Cell::Error => serializer.serialize_str(ERROR),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Cell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Score(extraction) => write!(f, "{}", extraction),
            Cell::Error => f.write_str(ERROR),
        }
    }
}

/// One output row, ready for the storage side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRecord {
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mayo: Option<Cell<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mayo_breakdown: Option<MayoBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ses_cd: Option<Cell<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ses_cd_field: Option<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rutgeerts: Option<Cell<RutgeertsGrade>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl ScoreRecord {
    /// Keys written by the scorer itself. Input metadata never shadows them.
    pub const OWNED_KEYS: [&'static str; 7] = [
        "id",
        "mayo",
        "mayo_breakdown",
        "ses_cd",
        "ses_cd_field",
        "rutgeerts",
        "errors",
    ];

    fn new(record: &ReportRecord) -> Self {
        let metadata = record
            .metadata
            .iter()
            .filter(|(key, _)| !Self::OWNED_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Self {
            id: record.id.clone(),
            mayo: None,
            mayo_breakdown: None,
            ses_cd: None,
            ses_cd_field: None,
            rutgeerts: None,
            errors: Vec::new(),
            metadata,
        }
    }

    fn cells(&self) -> Vec<(ScoreKind, String)> {
        let mut cells = Vec::new();
        if let Some(cell) = &self.mayo {
            cells.push((ScoreKind::Mayo, cell.to_string()));
        }
        if let Some(cell) = &self.ses_cd {
            cells.push((ScoreKind::SesCd, cell.to_string()));
        }
        if let Some(cell) = &self.rutgeerts {
            cells.push((ScoreKind::Rutgeerts, cell.to_string()));
        }
        cells
    }
}

/// Runs the selected extractors over report records.
#[derive(Debug, Clone)]
pub struct Processor {
    kinds: Vec<ScoreKind>,
    breakdown: bool,
    mayo: MayoExtractor,
    ses_cd: SesCdExtractor,
    rutgeerts: RutgeertsExtractor,
}

impl Processor {
    pub fn new(config: &EndoscoreConfig, kinds: Vec<ScoreKind>) -> Result<Self, ConfigError> {
        Ok(Self {
            kinds,
            breakdown: false,
            mayo: MayoExtractor::from_config(config),
            ses_cd: SesCdExtractor::from_config(config)?,
            rutgeerts: RutgeertsExtractor::from_config(config)?,
        })
    }

    /// Also emit the full Mayo breakdown of the winning run.
    pub fn with_breakdown(mut self, breakdown: bool) -> Self {
        self.breakdown = breakdown;
        self
    }

    /// Extract every selected score from one record.
    pub fn process(&self, record: &ReportRecord) -> ScoreRecord {
        let mut out = ScoreRecord::new(record);

        for kind in &self.kinds {
            match kind {
                ScoreKind::Mayo => match record.report_text() {
                    Ok(text) => {
                        out.mayo = Some(Cell::Score(self.mayo.extract(&text)));
                        if self.breakdown {
                            out.mayo_breakdown = self.mayo.breakdown(&text);
                        }
                    }
                    Err(error) => out.fail(*kind, error, |o| o.mayo = Some(Cell::Error)),
                },
                ScoreKind::SesCd => match record.sections() {
                    Ok((findings, impression)) => {
                        let hit = self.ses_cd.extract(&findings, &impression);
                        out.ses_cd_field = hit.as_ref().found().map(|hit| hit.field);
                        out.ses_cd = Some(Cell::Score(hit.map(|hit| hit.score)));
                    }
                    Err(error) => out.fail(*kind, error, |o| o.ses_cd = Some(Cell::Error)),
                },
                ScoreKind::Rutgeerts => match record.report_text() {
                    Ok(text) => out.rutgeerts = Some(Cell::Score(self.rutgeerts.extract(&text))),
                    Err(error) => out.fail(*kind, error, |o| o.rutgeerts = Some(Cell::Error)),
                },
            }
        }

        out
    }

    /// Process a batch in parallel, one task per report. Output keeps input order.
    pub fn process_all(&self, records: &[ReportRecord]) -> Vec<ScoreRecord> {
        records.par_iter().map(|record| self.process(record)).collect()
    }
}

impl ScoreRecord {
    fn fail(&mut self, kind: ScoreKind, error: ScanError, mark: impl FnOnce(&mut Self)) {
        tracing::warn!(id = %self.id, score = %kind, %error, "report skipped");
        self.errors.push(format!("{}: {}", kind, error));
        mark(self);
    }
}

/// Read JSON Lines records. Blank lines are skipped.
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<ReportRecord>, ProcessingError> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|e| ProcessingError::InvalidRecord {
            line: index + 1,
            message: e.to_string(),
        })?;
        records.push(record);
    }
    Ok(records)
}

fn render_id(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render output records, one line each.
pub fn render(records: &[ScoreRecord], format: OutputFormat) -> Result<String, ProcessingError> {
    let mut out = String::new();
    for record in records {
        match format {
            OutputFormat::JsonLines => out.push_str(&serde_json::to_string(record)?),
            OutputFormat::Simple => {
                out.push_str(&render_id(&record.id));
                for (kind, value) in record.cells() {
                    out.push('\t');
                    out.push_str(&format!("{}={}", kind, value));
                }
            }
        }
        out.push('\n');
    }
    Ok(out)
}
