//! Memory-mapped text source and line classification
//!
//! MESA output is plain text. Files are mapped once, decoded as UTF-8
//! (lossy), and handed to the parsers as a list of lines.

use crate::types::{MesaError, Result};
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Comment marker recognized at the start of a line (after whitespace)
pub const COMMENT_MARKER: char = '#';

/// True if the line holds only whitespace
#[inline]
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// True if the line starts with optional whitespace then `#`
#[inline]
pub fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with(COMMENT_MARKER)
}

/// True for lines that carry no data at all
#[inline]
pub fn is_skippable(line: &str) -> bool {
    is_blank(line) || is_comment(line)
}

/// Whole file contents, mapped and decoded
pub struct TextSource {
    path: PathBuf,
    text: String,
}

impl TextSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        let text = String::from_utf8_lossy(&mmap).into_owned();
        Ok(Self {
            path: path.to_path_buf(),
            text,
        })
    }

    #[cfg(test)]
    pub fn from_text(path: &str, text: &str) -> Self {
        Self {
            path: PathBuf::from(path),
            text: text.to_string(),
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All lines, without terminators
    pub fn lines(&self) -> Vec<&str> {
        self.text.lines().collect()
    }

    /// Byte length of the decoded text
    #[inline]
    pub fn len(&self) -> usize {
        self.text.len()
    }
}

/// Forward-only cursor over lines, used for blank-delimited sections
pub struct LineCursor<'a> {
    lines: Vec<&'a str>,
    pos: usize,
    path: &'a Path,
}

impl<'a> LineCursor<'a> {
    pub fn new(source: &'a TextSource) -> Self {
        Self {
            lines: source.lines(),
            pos: 0,
            path: source.path(),
        }
    }

    /// 1-based number of the line under the cursor
    #[inline]
    pub fn line_number(&self) -> usize {
        self.pos + 1
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.pos >= self.lines.len()
    }

    /// Line under the cursor, or `Truncated` naming what was expected
    pub fn current(&self, expected: &'static str) -> Result<&'a str> {
        self.lines
            .get(self.pos)
            .copied()
            .ok_or_else(|| MesaError::Truncated {
                path: self.path.to_path_buf(),
                expected,
            })
    }

    #[inline]
    pub fn advance(&mut self) {
        self.pos += 1;
    }

    /// Move to the first blank line at or after the cursor
    pub fn seek_blank(&mut self, expected: &'static str) -> Result<()> {
        while !is_blank(self.current(expected)?) {
            self.advance();
        }
        Ok(())
    }

    /// Move past a run of blank lines onto the next non-blank one
    pub fn skip_blank_run(&mut self, expected: &'static str) -> Result<()> {
        while is_blank(self.current(expected)?) {
            self.advance();
        }
        Ok(())
    }

    /// Take the current line if it is non-blank; end of file also ends the block
    pub fn next_in_block(&mut self) -> Option<&'a str> {
        let line = *self.lines.get(self.pos)?;
        if is_blank(line) {
            return None;
        }
        self.pos += 1;
        Some(line)
    }
}
