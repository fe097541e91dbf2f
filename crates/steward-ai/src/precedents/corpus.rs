use serde::{Deserialize, Deserializer, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// One historical incident from the precedent dataset.
///
/// Records are normalized once at load time: the searchable text is
/// precomputed and the fault value is kept only when it lies in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentRecord {
    pub title: String,
    pub reason: String,
    pub ruling: String,
    pub fault_pct_driver_a: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread: Option<String>,
    #[serde(skip)]
    searchable: String,
}

impl IncidentRecord {
    /// Returns `None` when both title and reason are blank.
    pub fn new(
        title: impl Into<String>,
        reason: impl Into<String>,
        ruling: impl Into<String>,
        fault_pct_driver_a: Option<f32>,
    ) -> Option<Self> {
        let title = title.into().trim().to_string();
        let reason = reason.into().trim().to_string();
        let ruling = ruling.into().trim().to_string();

        if title.is_empty() && reason.is_empty() {
            return None;
        }

        let searchable = format!("{title} {reason} {ruling}").to_lowercase();
        Some(Self {
            title,
            reason,
            ruling,
            fault_pct_driver_a: fault_pct_driver_a.filter(|value| is_valid_fault(*value)),
            thread: None,
            searchable,
        })
    }

    pub fn with_thread(mut self, thread: impl Into<String>) -> Self {
        let thread = thread.into();
        self.thread = (!thread.trim().is_empty()).then_some(thread);
        self
    }

    /// Lowercased `title reason ruling`.
    pub fn searchable_text(&self) -> &str {
        &self.searchable
    }
}

fn is_valid_fault(value: f32) -> bool {
    value.is_finite() && (0.0..=100.0).contains(&value)
}

fn parse_fault(raw: &str) -> Option<f32> {
    raw.trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|value| is_valid_fault(*value))
}

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("failed to read precedent dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid precedent CSV data: {0}")]
    Csv(#[from] csv::Error),
}

/// Immutable, in-memory precedent dataset shared across requests.
#[derive(Debug, Clone, Default)]
pub struct IncidentCorpus {
    records: Vec<IncidentRecord>,
    skipped_rows: usize,
}

impl IncidentCorpus {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<IncidentRecord>) -> Self {
        Self {
            records,
            skipped_rows: 0,
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CorpusError> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    /// Parses a CSV with at least `title`, `reason`, `ruling` and
    /// `fault_pct_driver_a` columns. Rows that fail to deserialize or lack
    /// both title and reason are skipped; only I/O failures abort the load.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CorpusError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut records = Vec::new();
        let mut skipped_rows = 0;

        for (index, row) in csv_reader.deserialize::<CorpusRow>().enumerate() {
            let row = match row {
                Ok(row) => row,
                Err(err) if err.is_io_error() => return Err(err.into()),
                Err(err) => {
                    debug!(row = index + 1, error = %err, "skipping malformed precedent row");
                    skipped_rows += 1;
                    continue;
                }
            };

            match row.into_record() {
                Some(record) => records.push(record),
                None => skipped_rows += 1,
            }
        }

        Ok(Self {
            records,
            skipped_rows,
        })
    }

    /// Loads the dataset, degrading to an empty corpus when it is missing or
    /// unreadable.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::from_path(path) {
            Ok(corpus) => {
                info!(
                    path = %path.display(),
                    records = corpus.len(),
                    skipped = corpus.skipped_rows,
                    "precedent corpus loaded"
                );
                corpus
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "precedent corpus unavailable, continuing without precedents"
                );
                Self::empty()
            }
        }
    }

    pub fn records(&self) -> &[IncidentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }
}

#[derive(Debug, Deserialize)]
struct CorpusRow {
    #[serde(default)]
    title: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    ruling: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    fault_pct_driver_a: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    thread: Option<String>,
}

impl CorpusRow {
    fn into_record(self) -> Option<IncidentRecord> {
        let fault = self.fault_pct_driver_a.as_deref().and_then(parse_fault);
        let record = IncidentRecord::new(self.title, self.reason, self.ruling, fault)?;
        Some(match self.thread {
            Some(thread) => record.with_thread(thread),
            None => record,
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
