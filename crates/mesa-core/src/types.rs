//! Common types, errors, and constants for MESA file operations

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Column whose presence marks a table as a history (time series)
pub const MODEL_NUMBER: &str = "model_number";

/// Implicit first column of a model file, holding the zone index
pub const ZONE: &str = "zone";

/// Header column holding the stellar age in years
pub const STAR_AGE: &str = "star_age";

/// Line numbers (1-based) for current MESA history/profile output
pub const DEFAULT_HEADER_NAMES_LINE: usize = 2;
pub const DEFAULT_BULK_NAMES_LINE: usize = 6;

/// Line numbers (1-based) for output written without column-number rows
pub const LEGACY_HEADER_NAMES_LINE: usize = 1;
pub const LEGACY_BULK_NAMES_LINE: usize = 4;

/// First data line (1-based) of a profiles.index file
pub const DEFAULT_INDEX_START_LINE: usize = 2;

pub const LOG_SUFFIXES: [&str; 2] = ["data", "log"];
pub const MODEL_SUFFIX: &str = "mod";

// ============================================================================
// Enums
// ============================================================================

/// Shape of a MESA output file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// History or profile output (`.data`, `.log`)
    Log,
    /// Saved model (`.mod`)
    Model,
}

impl FileKind {
    /// Detect the file kind from the path's extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if LOG_SUFFIXES.contains(&ext) => Ok(FileKind::Log),
            Some(MODEL_SUFFIX) => Ok(FileKind::Model),
            _ => Err(MesaError::UnknownFileFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Log => write!(f, "log"),
            FileKind::Model => write!(f, "model"),
        }
    }
}

/// A single header datum
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Numeric view of the value, `None` for text
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Text(_) => None,
        }
    }

    /// Integer view of the value; floats qualify only when integral
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Column data - integers, floats, or (rarely) text
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Int(Vec<i64>),
    Float(Vec<f64>),
    Text(Vec<String>),
}

impl Column {
    /// Get the length of the column
    pub fn len(&self) -> usize {
        match self {
            Column::Int(v) => v.len(),
            Column::Float(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `index`, if in range
    pub fn get(&self, index: usize) -> Option<Value> {
        match self {
            Column::Int(v) => v.get(index).map(|&x| Value::Int(x)),
            Column::Float(v) => v.get(index).map(|&x| Value::Float(x)),
            Column::Text(v) => v.get(index).map(|s| Value::Text(s.clone())),
        }
    }

    /// Numeric copy of the column as f64, `None` for text
    pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
        match self {
            Column::Int(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Column::Float(v) => Some(v.clone()),
            Column::Text(_) => None,
        }
    }

    /// Get as float slice (only for float columns)
    pub fn as_float(&self) -> Option<&[f64]> {
        match self {
            Column::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Get as integer slice (only for integer columns)
    pub fn as_int(&self) -> Option<&[i64]> {
        match self {
            Column::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Get as text slice (only for text columns)
    pub fn as_text(&self) -> Option<&[String]> {
        match self {
            Column::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Drop the rows at `sorted_indices` (ascending, unique), keeping order
    pub(crate) fn remove_rows(&mut self, sorted_indices: &[usize]) {
        fn retain<T>(v: &mut Vec<T>, drop: &[usize]) {
            let mut next = drop.iter().peekable();
            let mut i = 0;
            v.retain(|_| {
                let remove = next.peek() == Some(&&i);
                if remove {
                    next.next();
                }
                i += 1;
                !remove
            });
        }
        match self {
            Column::Int(v) => retain(v, sorted_indices),
            Column::Float(v) => retain(v, sorted_indices),
            Column::Text(v) => retain(v, sorted_indices),
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Error type for MESA reading operations
#[derive(Error, Debug)]
pub enum MesaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bad path {path}: {reason}")]
    BadPath { path: PathBuf, reason: String },

    #[error("Unknown file type for file {path}")]
    UnknownFileFormat { path: PathBuf },

    #[error("'{key}' is not a valid data type")]
    KeyNotFound { key: String },

    #[error("'{key}' is not a valid header name")]
    HeaderKeyNotFound { key: String },

    #[error("'{key}' is neither a data column nor a header name")]
    UnknownAttribute { key: String },

    #[error("Column '{key}' is not numeric and cannot be transformed")]
    NonNumericColumn { key: String },

    #[error("Can't get data at model number because {path} isn't a history file")]
    NotHistory { path: PathBuf },

    #[error("Couldn't find any entries with model number {model_number} in {path}")]
    ModelNumberNotFound { model_number: i64, path: PathBuf },

    #[error("Found {count} entries where model number is {model_number} in {path}")]
    ModelNumberNotUnique {
        model_number: i64,
        count: usize,
        path: PathBuf,
    },

    #[error("No profile with model number {model_number}")]
    ProfileNotFound { model_number: i64 },

    #[error("No profile with profile number {profile_number}")]
    ProfileNumberNotFound { profile_number: i64 },

    #[error("Profile index {path} lists no profiles")]
    EmptyIndex { path: PathBuf },

    #[error("Parse error in {path} at line {line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("File {path} ended before {expected}")]
    Truncated {
        path: PathBuf,
        expected: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, MesaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind_from_path() {
        assert_eq!(
            FileKind::from_path(Path::new("LOGS/history.data")).unwrap(),
            FileKind::Log
        );
        assert_eq!(
            FileKind::from_path(Path::new("run/out.log")).unwrap(),
            FileKind::Log
        );
        assert_eq!(
            FileKind::from_path(Path::new("final.mod")).unwrap(),
            FileKind::Model
        );
        assert!(matches!(
            FileKind::from_path(Path::new("profiles.index")),
            Err(MesaError::UnknownFileFormat { .. })
        ));
        assert!(FileKind::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_remove_rows() {
        let mut col = Column::Int(vec![10, 11, 12, 13, 14]);
        col.remove_rows(&[1, 3]);
        assert_eq!(col, Column::Int(vec![10, 12, 14]));

        let mut col = Column::Text(vec!["a".into(), "b".into(), "c".into()]);
        col.remove_rows(&[0]);
        assert_eq!(col.as_text().unwrap(), &["b", "c"]);
        assert!(col.as_int().is_none());
        col.remove_rows(&[]);
        assert_eq!(col.len(), 2);
    }

    #[test]
    fn test_value_views() {
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::Float(4.0).as_i64(), Some(4));
        assert_eq!(Value::Float(4.5).as_i64(), None);
        assert_eq!(Value::Text("x".into()).as_str(), Some("x"));
        assert_eq!(Value::Text("x".into()).as_f64(), None);
    }
}
