use crate::precedents::{query_terms, IncidentKind};
use rand::Rng;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_TIP: &str = "Both drivers can improve situational awareness.";

#[derive(Debug, Clone, PartialEq, Eq)]
struct TipEntry {
    text: String,
    line: String,
}

/// Coaching tips, one `tip | tag, tag` entry per line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TipBook {
    entries: Vec<TipEntry>,
}

impl TipBook {
    pub fn from_text(text: &str) -> Self {
        let entries = text
            .lines()
            .filter_map(|line| {
                let (tip, _tags) = line.split_once('|')?;
                let tip = tip.trim();
                if tip.is_empty() {
                    return None;
                }
                Some(TipEntry {
                    text: tip.to_string(),
                    line: line.to_lowercase(),
                })
            })
            .collect();
        Self { entries }
    }

    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        fs::read_to_string(path).map(|text| Self::from_text(&text))
    }

    /// Missing tip files are not fatal; every pick then falls back to the
    /// default tip.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::from_path(path) {
            Ok(book) => {
                info!(path = %path.display(), tips = book.len(), "tip book loaded");
                book
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "tip book unavailable");
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tips whose line mentions the incident key or the first note term.
    /// When nothing matches, every tip is a candidate.
    pub fn candidates(&self, kind: Option<IncidentKind>, notes: Option<&str>) -> Vec<&str> {
        let first_term = notes.and_then(|notes| query_terms(notes).into_iter().next());

        let filtered: Vec<&str> = self
            .entries
            .iter()
            .filter(|entry| {
                kind.is_some_and(|kind| entry.line.contains(kind.key()))
                    || first_term
                        .as_deref()
                        .is_some_and(|term| entry.line.contains(term))
            })
            .map(|entry| entry.text.as_str())
            .collect();

        if filtered.is_empty() {
            self.entries.iter().map(|entry| entry.text.as_str()).collect()
        } else {
            filtered
        }
    }

    pub fn pick<R: Rng + ?Sized>(
        &self,
        kind: Option<IncidentKind>,
        notes: Option<&str>,
        rng: &mut R,
    ) -> String {
        let candidates = self.candidates(kind, notes);
        if candidates.is_empty() {
            return DEFAULT_TIP.to_string();
        }
        candidates[rng.random_range(0..candidates.len())].to_string()
    }
}
