//! profiles.index reader
//!
//! Maps model numbers to profile numbers (and priorities) so history rows
//! and profile files can be cross-referenced.

use crate::config::IndexLayout;
use crate::numeric::parse_value;
use crate::reader::{is_skippable, TextSource};
use crate::types::{MesaError, Result};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// One line of the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub model_number: i64,
    pub priority: i64,
    pub profile_number: i64,
}

/// Parsed profiles.index, sorted by model number.
///
/// The sort is stable, so if a model number appears twice the entry that
/// came first in the file is the one lookups return.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileIndex {
    path: PathBuf,
    layout: IndexLayout,
    entries: Vec<IndexEntry>,
}

impl ProfileIndex {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, IndexLayout::default())
    }

    pub fn open_with<P: AsRef<Path>>(path: P, layout: IndexLayout) -> Result<Self> {
        let mut index = ProfileIndex {
            path: path.as_ref().to_path_buf(),
            layout,
            entries: Vec::new(),
        };
        index.reload()?;
        Ok(index)
    }

    /// Re-read the index file
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn reload(&mut self) -> Result<()> {
        let source = TextSource::open(&self.path)?;
        self.entries = parse_index(&source, &self.layout)?;
        info!(profiles = self.entries.len(), "Profile index loaded");
        Ok(())
    }

    pub fn file_name(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> &IndexLayout {
        &self.layout
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Model numbers in ascending order
    pub fn model_numbers(&self) -> Vec<i64> {
        self.entries.iter().map(|e| e.model_number).collect()
    }

    /// Profile numbers in order of their model numbers
    pub fn profile_numbers(&self) -> Vec<i64> {
        self.entries.iter().map(|e| e.profile_number).collect()
    }

    pub fn priorities(&self) -> Vec<i64> {
        self.entries.iter().map(|e| e.priority).collect()
    }

    /// Column by its configured name
    pub fn data(&self, key: &str) -> Result<Vec<i64>> {
        if key == self.layout.model_number_name() {
            Ok(self.model_numbers())
        } else if key == self.layout.priority_name() {
            Ok(self.priorities())
        } else if key == self.layout.profile_number_name() {
            Ok(self.profile_numbers())
        } else {
            Err(MesaError::KeyNotFound {
                key: key.to_string(),
            })
        }
    }

    pub fn have_profile_with_model_number(&self, model_number: i64) -> bool {
        self.entries.iter().any(|e| e.model_number == model_number)
    }

    pub fn have_profile_with_profile_number(&self, profile_number: i64) -> bool {
        self.entries.iter().any(|e| e.profile_number == profile_number)
    }

    pub fn profile_with_model_number(&self, model_number: i64) -> Result<i64> {
        self.entries
            .iter()
            .find(|e| e.model_number == model_number)
            .map(|e| e.profile_number)
            .ok_or(MesaError::ProfileNotFound { model_number })
    }

    pub fn model_with_profile_number(&self, profile_number: i64) -> Result<i64> {
        self.entries
            .iter()
            .find(|e| e.profile_number == profile_number)
            .map(|e| e.model_number)
            .ok_or(MesaError::ProfileNumberNotFound { profile_number })
    }

    /// Entry with the largest model number
    pub fn last(&self) -> Option<&IndexEntry> {
        self.entries.last()
    }
}

fn parse_index(source: &TextSource, layout: &IndexLayout) -> Result<Vec<IndexEntry>> {
    let path = source.path();
    let lines = source.lines();
    let end = layout
        .end_line
        .map_or(lines.len(), |last| last.min(lines.len()));

    let mut entries = Vec::new();
    for (i, line) in lines
        .iter()
        .enumerate()
        .take(end)
        .skip(layout.start_line.saturating_sub(1))
    {
        if is_skippable(line) {
            continue;
        }
        let fields: Vec<i64> = line
            .split_whitespace()
            .map(|t| parse_value(t).as_i64())
            .collect::<Option<Vec<i64>>>()
            .ok_or_else(|| MesaError::Parse {
                path: path.to_path_buf(),
                line: i + 1,
                reason: "index entries must be integers".into(),
            })?;
        match fields.as_slice() {
            &[model_number, priority, profile_number] => entries.push(IndexEntry {
                model_number,
                priority,
                profile_number,
            }),
            other => {
                return Err(MesaError::Parse {
                    path: path.to_path_buf(),
                    line: i + 1,
                    reason: format!("expected 3 index fields, found {}", other.len()),
                })
            }
        }
    }

    entries.sort_by_key(|e| e.model_number);
    Ok(entries)
}
