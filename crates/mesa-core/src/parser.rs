//! History/profile (log) file parser
//!
//! A log file has a one-line header block (names, then values) followed by
//! a bulk table (one names line, then one row per model or zone). Line
//! positions come from [`LogLayout`].

use crate::config::LogLayout;
use crate::numeric::{infer_column, parse_value};
use crate::reader::{is_comment, is_skippable, TextSource};
use crate::types::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, instrument};

/// Parsed contents shared by the log and model parsers
#[derive(Debug, Default)]
pub(crate) struct RawTable {
    pub header_names: Vec<String>,
    pub header: HashMap<String, Value>,
    pub bulk_names: Vec<String>,
    pub columns: Vec<Column>,
}

/// Make names unique: a repeated `name` becomes `name_1`, `name_2`, ...
pub(crate) fn dedup_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::new();
    for name in names {
        let name = name.into();
        let count = seen.entry(name.clone()).or_insert(0);
        if *count == 0 {
            out.push(name);
        } else {
            out.push(format!("{}_{}", name, count));
        }
        *count += 1;
    }
    out
}

/// Split data rows into per-column token lists, checking row width
pub(crate) fn collect_columns<'a, I>(
    path: &Path,
    num_columns: usize,
    rows: I,
) -> Result<Vec<Column>>
where
    I: IntoIterator<Item = (usize, &'a str)>,
{
    let mut tokens: Vec<Vec<&'a str>> = vec![Vec::new(); num_columns];
    for (line_number, line) in rows {
        let mut width = 0;
        for (i, token) in line.split_whitespace().enumerate() {
            if let Some(col) = tokens.get_mut(i) {
                col.push(token);
            }
            width = i + 1;
        }
        if width != num_columns {
            return Err(MesaError::Parse {
                path: path.to_path_buf(),
                line: line_number,
                reason: format!("expected {} values, found {}", num_columns, width),
            });
        }
    }
    Ok(tokens.iter().map(|t| infer_column(t)).collect())
}

/// Parse the header names line and the values line that follows it
fn parse_header_block(
    path: &Path,
    lines: &[&str],
    layout: &LogLayout,
) -> Result<(Vec<String>, HashMap<String, Value>)> {
    let names_idx = layout.header_names_line.saturating_sub(1);
    let names_line = lines.get(names_idx).ok_or_else(|| MesaError::Truncated {
        path: path.to_path_buf(),
        expected: "header names",
    })?;
    let names: Vec<String> = names_line.split_whitespace().map(String::from).collect();

    let (values_idx, values_line) = lines
        .iter()
        .enumerate()
        .skip(names_idx + 1)
        .find(|(_, line)| !is_comment(line))
        .ok_or_else(|| MesaError::Truncated {
            path: path.to_path_buf(),
            expected: "header values",
        })?;
    let values: Vec<Value> = values_line.split_whitespace().map(parse_value).collect();

    if values.len() != names.len() {
        return Err(MesaError::Parse {
            path: path.to_path_buf(),
            line: values_idx + 1,
            reason: format!(
                "{} header names but {} header values",
                names.len(),
                values.len()
            ),
        });
    }

    let header = names.iter().cloned().zip(values).collect();
    Ok((names, header))
}

/// Parse a history or profile file
#[instrument(skip_all, fields(path = %source.path().display()))]
pub(crate) fn parse_log(source: &TextSource, layout: &LogLayout) -> Result<RawTable> {
    let path = source.path();
    let lines = source.lines();

    let (header_names, header) = parse_header_block(path, &lines, layout)?;

    // Bulk section runs to end of file unless bounded
    let end = layout
        .bulk_end_line
        .map_or(lines.len(), |last| last.min(lines.len()));
    let start = layout.bulk_names_line.saturating_sub(1);

    let mut bulk = lines
        .iter()
        .enumerate()
        .take(end)
        .skip(start)
        .filter(|(_, line)| !is_skippable(line))
        .map(|(i, line)| (i + 1, *line));

    let (_, names_line) = bulk.next().ok_or_else(|| MesaError::Truncated {
        path: path.to_path_buf(),
        expected: "bulk column names",
    })?;
    let bulk_names = dedup_names(names_line.split_whitespace());
    let columns = collect_columns(path, bulk_names.len(), bulk)?;

    debug!(
        header_fields = header_names.len(),
        columns = bulk_names.len(),
        rows = columns.first().map(|c| c.len()).unwrap_or(0),
        "Log file parsed"
    );

    Ok(RawTable {
        header_names,
        header,
        bulk_names,
        columns,
    })
}
