//! MESA saved-model (.mod) file parser
//!
//! Model files are free-form and only delimited by blank lines:
//!
//! - comment/preamble lines, then one or more blank lines
//! - `name value` header lines, then one or more blank lines
//! - one line of column names
//! - numeric rows (zone index followed by doubles), ended by a blank line
//! - everything after that is ignored

use crate::numeric::parse_value;
use crate::parser::{collect_columns, dedup_names, RawTable};
use crate::reader::{LineCursor, TextSource};
use crate::types::{MesaError, Result, ZONE};
use std::collections::HashMap;
use tracing::{debug, instrument, trace};

/// Parse a model file
#[instrument(skip_all, fields(path = %source.path().display()))]
pub(crate) fn parse_model(source: &TextSource) -> Result<RawTable> {
    let path = source.path();
    let mut cursor = LineCursor::new(source);

    // Preamble runs up to the first blank line
    cursor.seek_blank("end of preamble")?;
    cursor.skip_blank_run("header block")?;
    trace!(line = cursor.line_number(), "Header block start");

    let mut header_names = Vec::new();
    let mut header = HashMap::new();
    loop {
        let line_number = cursor.line_number();
        let line = match cursor.next_in_block() {
            Some(line) => line,
            None if cursor.at_end() => {
                return Err(MesaError::Truncated {
                    path: path.to_path_buf(),
                    expected: "end of header block",
                })
            }
            None => break,
        };
        let mut tokens = line.split_whitespace();
        let (name, value) = match (tokens.next(), tokens.next()) {
            (Some(name), Some(value)) => (name, value),
            _ => {
                return Err(MesaError::Parse {
                    path: path.to_path_buf(),
                    line: line_number,
                    reason: "header line needs a name and a value".into(),
                })
            }
        };
        header_names.push(name.to_string());
        header.insert(name.to_string(), parse_value(value));
    }

    cursor.skip_blank_run("column names")?;
    let names_line = cursor.current("column names")?;
    cursor.advance();
    trace!(line = cursor.line_number(), "Bulk data start");

    let bulk_names = dedup_names(std::iter::once(ZONE).chain(names_line.split_whitespace()));

    let mut rows = Vec::new();
    let mut line_number = cursor.line_number();
    while let Some(line) = cursor.next_in_block() {
        rows.push((line_number, line));
        line_number += 1;
    }
    let columns = collect_columns(path, bulk_names.len(), rows)?;

    debug!(
        header_fields = header_names.len(),
        columns = bulk_names.len(),
        zones = columns.first().map(|c| c.len()).unwrap_or(0),
        "Model file parsed"
    );

    Ok(RawTable {
        header_names,
        header,
        bulk_names,
        columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Column, Value};

    const MODEL: &str = "\
! note: saved model
! another comment line

                  version_number   'r23.05.1'
                          M/Msun      1.0000000000000000D+00
                    model_number      295
                        star_age      4.5670000000000000D+09
                         n_shells      3


                lnd                lnT                 lnR
    1    -1.2D+00   1.5D+01   2.4D+01
    2    -1.0D+00   1.6D+01   2.3D+01
    3     5.0d-01   1.7D+01   2.1D+01

previous model
  1  2  3
";

    #[test]
    fn test_parse_model() {
        let source = TextSource::from_text("final.mod", MODEL);
        let table = parse_model(&source).unwrap();

        assert_eq!(
            table.header_names,
            vec!["version_number", "M/Msun", "model_number", "star_age", "n_shells"]
        );
        assert_eq!(table.header["version_number"], Value::Text("r23.05.1".into()));
        assert_eq!(table.header["M/Msun"], Value::Float(1.0));
        assert_eq!(table.header["model_number"], Value::Int(295));
        assert_eq!(table.header["star_age"], Value::Float(4.567e9));

        assert_eq!(table.bulk_names, vec!["zone", "lnd", "lnT", "lnR"]);
        assert_eq!(table.columns[0], Column::Int(vec![1, 2, 3]));
        assert_eq!(table.columns[1], Column::Float(vec![-1.2, -1.0, 0.5]));
        assert_eq!(table.columns[3], Column::Float(vec![24.0, 23.0, 21.0]));
    }

    #[test]
    fn test_model_data_may_end_at_eof() {
        let text = "pre\n\na 1\n\nx\n1 2.0\n2 3.0";
        let source = TextSource::from_text("eof.mod", text);
        let table = parse_model(&source).unwrap();
        assert_eq!(table.columns[1], Column::Float(vec![2.0, 3.0]));
    }

    #[test]
    fn test_model_missing_sections() {
        let source = TextSource::from_text("short.mod", "pre\n\nname 1\n");
        let err = parse_model(&source).unwrap_err();
        assert!(matches!(err, MesaError::Truncated { .. }));

        let source = TextSource::from_text("short.mod", "only a preamble\n");
        let err = parse_model(&source).unwrap_err();
        assert!(matches!(
            err,
            MesaError::Truncated {
                expected: "end of preamble",
                ..
            }
        ));

        let source = TextSource::from_text("short.mod", "pre\n\nname 1\n\n\n");
        let err = parse_model(&source).unwrap_err();
        assert!(matches!(
            err,
            MesaError::Truncated {
                expected: "column names",
                ..
            }
        ));
    }

    #[test]
    fn test_model_bad_header_line() {
        let source = TextSource::from_text("bad.mod", "pre\n\nlonely\n\nx\n1 2\n");
        let err = parse_model(&source).unwrap_err();
        assert!(matches!(err, MesaError::Parse { line: 3, .. }));
    }
}
