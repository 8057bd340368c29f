//! `MesaData`: parsed contents of one history, profile or model file

use crate::config::{LogLayout, ReadOptions};
use crate::history::superseded_rows;
use crate::model_parser::parse_model;
use crate::parser::{parse_log, RawTable};
use crate::reader::TextSource;
use crate::resolver::{derive, resolve, Resolution, Transform};
use crate::types::*;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Result of attribute-style lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Field<'a> {
    /// A data column, stored or derived
    Data(Cow<'a, Column>),
    /// A header scalar
    Header(&'a Value),
}

impl Field<'_> {
    /// Single value view: the header scalar, or the only row of a column
    pub fn scalar(&self) -> Option<Value> {
        match self {
            Field::Header(v) => Some((*v).clone()),
            Field::Data(col) if col.len() == 1 => col.get(0),
            Field::Data(_) => None,
        }
    }
}

/// Data from a MESA output file.
///
/// Holds the header (names in file order plus their values) and the bulk
/// columns. Data keys go through derived-field resolution, so `L` is
/// available whenever `log_L` is, and `log_T` whenever `T` is.
#[derive(Debug, Clone, PartialEq)]
pub struct MesaData {
    path: PathBuf,
    kind: FileKind,
    layout: LogLayout,
    header_names: Vec<String>,
    header: HashMap<String, Value>,
    bulk_names: Vec<String>,
    columns: Vec<Column>,
    column_index: HashMap<String, usize>,
}

impl MesaData {
    /// Read a file, detecting its kind from the extension
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, &ReadOptions::default())
    }

    /// Read a file with an explicit kind and/or layout
    pub fn open_with<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<Self> {
        let path = path.as_ref();
        let kind = match options.kind {
            Some(kind) => kind,
            None => FileKind::from_path(path)?,
        };
        let mut data = MesaData {
            path: path.to_path_buf(),
            kind,
            layout: options.layout,
            header_names: Vec::new(),
            header: HashMap::new(),
            bulk_names: Vec::new(),
            columns: Vec::new(),
            column_index: HashMap::new(),
        };
        data.reload()?;
        Ok(data)
    }

    /// Re-read the file, replacing all contents.
    ///
    /// History files are scrubbed of backups again afterwards.
    #[instrument(skip(self), fields(path = %self.path.display(), kind = %self.kind))]
    pub fn reload(&mut self) -> Result<()> {
        let source = TextSource::open(&self.path)?;
        let raw = match self.kind {
            FileKind::Log => parse_log(&source, &self.layout)?,
            FileKind::Model => parse_model(&source)?,
        };
        self.install(raw);

        info!(
            bytes = source.len(),
            columns = self.bulk_names.len(),
            rows = self.num_rows(),
            "File loaded"
        );

        self.remove_backups();
        Ok(())
    }

    fn install(&mut self, raw: RawTable) {
        self.column_index = raw
            .bulk_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        self.header_names = raw.header_names;
        self.header = raw.header;
        self.bulk_names = raw.bulk_names;
        self.columns = raw.columns;
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn file_name(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn layout(&self) -> &LogLayout {
        &self.layout
    }

    /// Header names in file order
    pub fn header_names(&self) -> &[String] {
        &self.header_names
    }

    /// Bulk column names in file order
    pub fn bulk_names(&self) -> &[String] {
        &self.bulk_names
    }

    /// Number of rows (models for a history, zones for a profile)
    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// True if `key` is a stored column (no resolution)
    pub fn in_data(&self, key: &str) -> bool {
        self.column_index.contains_key(key)
    }

    pub fn in_header(&self, key: &str) -> bool {
        self.header.contains_key(key)
    }

    /// True if `key` is a column or can be derived from one
    pub fn has(&self, key: &str) -> bool {
        self.resolution(key).is_some()
    }

    /// A history file is one with a `model_number` column
    pub fn is_history(&self) -> bool {
        self.in_data(MODEL_NUMBER)
    }

    fn resolution(&self, key: &str) -> Option<Resolution> {
        resolve(key, |name| self.column_index.contains_key(name))
    }

    fn column(&self, name: &str) -> Option<&Column> {
        self.column_index.get(name).map(|&i| &self.columns[i])
    }

    /// Stored column by exact name
    pub fn raw_column(&self, key: &str) -> Option<&Column> {
        self.column(key)
    }

    /// Data column for `key`, derived if necessary
    pub fn data(&self, key: &str) -> Result<Cow<'_, Column>> {
        let Resolution { source, transform } =
            self.resolution(key).ok_or_else(|| MesaError::KeyNotFound {
                key: key.to_string(),
            })?;
        let column = self
            .column(&source)
            .ok_or_else(|| MesaError::KeyNotFound {
                key: key.to_string(),
            })?;
        if transform != Transform::Identity {
            debug!(key, source = %source, ?transform, "Derived column");
        }
        derive(key, column, transform)
    }

    /// Header value for `key`
    pub fn header(&self, key: &str) -> Result<&Value> {
        self.header
            .get(key)
            .ok_or_else(|| MesaError::HeaderKeyNotFound {
                key: key.to_string(),
            })
    }

    /// Attribute-style lookup: data (with resolution) first, then header
    pub fn attribute(&self, key: &str) -> Result<Field<'_>> {
        if self.has(key) {
            return self.data(key).map(Field::Data);
        }
        if let Some(value) = self.header.get(key) {
            return Ok(Field::Header(value));
        }
        Err(MesaError::UnknownAttribute {
            key: key.to_string(),
        })
    }

    // ------------------------------------------------------------------
    // Model-number indexing (history files)
    // ------------------------------------------------------------------

    /// Row index where `model_number == m_num`
    pub fn index_of_model_number(&self, m_num: i64) -> Result<usize> {
        let column = self
            .column(MODEL_NUMBER)
            .ok_or_else(|| MesaError::NotHistory {
                path: self.path.clone(),
            })?;
        let matches: Vec<usize> = match column {
            Column::Int(v) => positions(v, |&x| x == m_num),
            Column::Float(v) => positions(v, |&x| x == m_num as f64),
            Column::Text(_) => Vec::new(),
        };
        match matches.as_slice() {
            [index] => Ok(*index),
            [] => Err(MesaError::ModelNumberNotFound {
                model_number: m_num,
                path: self.path.clone(),
            }),
            many => Err(MesaError::ModelNumberNotUnique {
                model_number: m_num,
                count: many.len(),
                path: self.path.clone(),
            }),
        }
    }

    /// Value of `key` at the row whose model number is `m_num`
    pub fn data_at_model_number(&self, key: &str, m_num: i64) -> Result<Value> {
        let Resolution { source, transform } =
            self.resolution(key).ok_or_else(|| MesaError::KeyNotFound {
                key: key.to_string(),
            })?;
        let index = self.index_of_model_number(m_num)?;
        let value = self
            .column(&source)
            .and_then(|c| c.get(index))
            .ok_or_else(|| MesaError::KeyNotFound {
                key: key.to_string(),
            })?;
        if transform == Transform::Identity {
            return Ok(value);
        }
        value
            .as_f64()
            .map(|x| Value::Float(transform.apply(x)))
            .ok_or_else(|| MesaError::NonNumericColumn {
                key: key.to_string(),
            })
    }

    /// Drop history rows superseded by a backup or restart.
    ///
    /// Returns the number of removed rows. Does nothing for tables that are
    /// not histories.
    pub fn remove_backups(&mut self) -> usize {
        let Some(model_numbers) = self.column(MODEL_NUMBER).and_then(|c| c.to_f64_vec()) else {
            return 0;
        };
        let to_remove = superseded_rows(&model_numbers);
        if to_remove.is_empty() {
            debug!("History already clean");
            return 0;
        }
        debug!(rows = to_remove.len(), "Removing backup rows from history");
        for column in &mut self.columns {
            column.remove_rows(&to_remove);
        }
        to_remove.len()
    }

    // ------------------------------------------------------------------
    // Ordering
    // ------------------------------------------------------------------

    fn star_age(&self) -> Option<f64> {
        self.attribute(STAR_AGE).ok()?.scalar()?.as_f64()
    }

    /// Order by star age when both carry one, otherwise by file name
    pub fn cmp_by_age(&self, other: &MesaData) -> Ordering {
        match (self.star_age(), other.star_age()) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => self.path.cmp(&other.path),
        }
    }
}

fn positions<T>(values: &[T], pred: impl Fn(&T) -> bool) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| pred(v))
        .map(|(i, _)| i)
        .collect()
}

/// `%.{precision}g`: fixed notation for exponents in `-4..precision`,
/// otherwise scientific with a signed two-digit exponent. Trailing zeros
/// are dropped either way.
fn format_general(x: f64, precision: usize) -> String {
    let precision = precision.max(1);
    if x == 0.0 || !x.is_finite() {
        return x.to_string();
    }
    let sci = format!("{:.*e}", precision - 1, x);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    if exp < -4 || exp >= precision as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exp.abs())
    } else {
        let decimals = (precision as i32 - 1 - exp) as usize;
        trim_fraction(&format!("{:.*}", decimals, x)).to_string()
    }
}

fn trim_fraction(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}

/// `MESA model # {model_number:6}, t = {star_age:20.10g} yr` when both are
/// known, otherwise the file path.
impl fmt::Display for MesaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let model_number = self
            .attribute(MODEL_NUMBER)
            .ok()
            .and_then(|field| field.scalar())
            .and_then(|v| v.as_i64());
        match (model_number, self.star_age()) {
            (Some(m), Some(age)) => write!(
                f,
                "MESA model # {:6}, t = {:>20} yr",
                m,
                format_general(age, 10)
            ),
            _ => write!(f, "{}", self.path.display()),
        }
    }
}
