//! Layout and directory configuration
//!
//! Line numbers are 1-based, matching how they appear in an editor.

use crate::types::{
    FileKind, DEFAULT_BULK_NAMES_LINE, DEFAULT_HEADER_NAMES_LINE, DEFAULT_INDEX_START_LINE,
    LEGACY_BULK_NAMES_LINE, LEGACY_HEADER_NAMES_LINE,
};
use std::path::{Path, PathBuf};

/// Where the header and bulk sections sit in a history/profile file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLayout {
    /// Line holding header names; header values are on the next data line
    pub header_names_line: usize,
    /// Line holding bulk column names
    pub bulk_names_line: usize,
    /// Last line (inclusive) of bulk data, `None` reads to end of file
    pub bulk_end_line: Option<usize>,
}

impl Default for LogLayout {
    fn default() -> Self {
        Self {
            header_names_line: DEFAULT_HEADER_NAMES_LINE,
            bulk_names_line: DEFAULT_BULK_NAMES_LINE,
            bulk_end_line: None,
        }
    }
}

impl LogLayout {
    /// Layout of files without the column-number rows (names on lines 1 and 4)
    pub fn legacy() -> Self {
        Self {
            header_names_line: LEGACY_HEADER_NAMES_LINE,
            bulk_names_line: LEGACY_BULK_NAMES_LINE,
            bulk_end_line: None,
        }
    }

    pub fn with_header_names_line(mut self, line: usize) -> Self {
        self.header_names_line = line.max(1);
        self
    }

    pub fn with_bulk_names_line(mut self, line: usize) -> Self {
        self.bulk_names_line = line.max(1);
        self
    }

    pub fn with_bulk_end_line(mut self, line: Option<usize>) -> Self {
        self.bulk_end_line = line;
        self
    }
}

/// Layout of a profiles.index file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexLayout {
    /// First line of index data
    pub start_line: usize,
    /// Last line (inclusive) of index data, `None` reads to end of file
    pub end_line: Option<usize>,
    /// Names for the model number, priority and profile number columns
    pub names: [String; 3],
}

impl Default for IndexLayout {
    fn default() -> Self {
        Self {
            start_line: DEFAULT_INDEX_START_LINE,
            end_line: None,
            names: [
                "model_numbers".to_string(),
                "priorities".to_string(),
                "profile_numbers".to_string(),
            ],
        }
    }
}

impl IndexLayout {
    pub fn with_rows(mut self, start_line: usize, end_line: Option<usize>) -> Self {
        self.start_line = start_line.max(1);
        self.end_line = end_line;
        self
    }

    pub fn with_names(mut self, names: [String; 3]) -> Self {
        self.names = names;
        self
    }

    pub fn model_number_name(&self) -> &str {
        &self.names[0]
    }

    pub fn priority_name(&self) -> &str {
        &self.names[1]
    }

    pub fn profile_number_name(&self) -> &str {
        &self.names[2]
    }
}

/// Options for reading a single file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Force a file kind instead of detecting it from the extension
    pub kind: Option<FileKind>,
    pub layout: LogLayout,
}

impl ReadOptions {
    pub fn with_kind(mut self, kind: FileKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_layout(mut self, layout: LogLayout) -> Self {
        self.layout = layout;
        self
    }
}

/// Configuration of a MESA LOGS directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDirConfig {
    pub log_path: PathBuf,
    pub profile_prefix: String,
    pub profile_suffix: String,
    pub history_file: String,
    pub index_file: String,
    /// Keep parsed profiles around for repeated access
    pub memoize_profiles: bool,
    pub log_layout: LogLayout,
    pub index_layout: IndexLayout,
}

impl Default for LogDirConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("LOGS"),
            profile_prefix: "profile".to_string(),
            profile_suffix: "data".to_string(),
            history_file: "history.data".to_string(),
            index_file: "profiles.index".to_string(),
            memoize_profiles: true,
            log_layout: LogLayout::default(),
            index_layout: IndexLayout::default(),
        }
    }
}

impl LogDirConfig {
    pub fn new<P: AsRef<Path>>(log_path: P) -> Self {
        Self {
            log_path: log_path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn with_profile_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.profile_prefix = prefix.into();
        self
    }

    pub fn with_profile_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.profile_suffix = suffix.into();
        self
    }

    pub fn with_history_file(mut self, name: impl Into<String>) -> Self {
        self.history_file = name.into();
        self
    }

    pub fn with_index_file(mut self, name: impl Into<String>) -> Self {
        self.index_file = name.into();
        self
    }

    pub fn with_memoize_profiles(mut self, memoize: bool) -> Self {
        self.memoize_profiles = memoize;
        self
    }

    pub fn with_log_layout(mut self, layout: LogLayout) -> Self {
        self.log_layout = layout;
        self
    }

    pub fn with_index_layout(mut self, layout: IndexLayout) -> Self {
        self.index_layout = layout;
        self
    }

    pub fn history_path(&self) -> PathBuf {
        self.log_path.join(&self.history_file)
    }

    pub fn index_path(&self) -> PathBuf {
        self.log_path.join(&self.index_file)
    }

    /// Path of `{prefix}{number}.{suffix}` inside the log directory
    pub fn profile_path(&self, profile_number: i64) -> PathBuf {
        self.log_path.join(format!(
            "{}{}.{}",
            self.profile_prefix, profile_number, self.profile_suffix
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_layout_presets() {
        let modern = LogLayout::default();
        assert_eq!((modern.header_names_line, modern.bulk_names_line), (2, 6));
        let legacy = LogLayout::legacy();
        assert_eq!((legacy.header_names_line, legacy.bulk_names_line), (1, 4));
        assert_eq!(LogLayout::default().with_header_names_line(0).header_names_line, 1);
    }

    #[test]
    fn test_profile_path() {
        let config = LogDirConfig::new("run/LOGS")
            .with_profile_prefix("prof")
            .with_profile_suffix("log");
        assert_eq!(config.profile_path(12), PathBuf::from("run/LOGS/prof12.log"));
        assert_eq!(config.history_path(), PathBuf::from("run/LOGS/history.data"));
        assert_eq!(config.index_path(), PathBuf::from("run/LOGS/profiles.index"));
    }
}
