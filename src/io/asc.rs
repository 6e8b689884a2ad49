//! Parser for the dilatometer's ASCII export (`.asc`).
//!
//! Layout:
//!
//! ```text
//! #C:\data\run01.asc                         <- location comment
//! #Time.s - Temperature/dL.pct/Nominal Temperature
//! 0.0   20.1   0.000   20.0
//! ...
//! ```
//!
//! - the second line holds two `-`-separated groups; the first group is one
//!   column name, the second is split on `/` into the remaining names
//! - a synthesized `index` column is prepended (the data rows carry it)
//! - names are trimmed and lowercased
//! - data rows are whitespace-separated floats; a row is kept only if every
//!   token parses and the count equals the number of columns

use std::io::BufRead;

use log::debug;

use crate::data::Table;
use crate::error::AppError;

/// Parsed `.asc` file.
#[derive(Debug, Clone)]
pub struct AscFile {
    /// Location comment from the first line (without the leading `#`).
    pub location: String,
    pub table: Table,
    /// Non-blank data lines that were dropped as malformed.
    pub skipped_lines: usize,
}

/// Parse an `.asc` export from a reader.
///
/// Invalid UTF-8 is replaced rather than rejected.
pub fn parse_asc<R: BufRead>(mut reader: R) -> Result<AscFile, AppError> {
    let mut next_line = |what: &str| -> Result<String, AppError> {
        let mut buf = Vec::new();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| AppError::new(2, format!("Failed to read {what}: {e}")))?;
        if n == 0 {
            return Err(AppError::new(2, format!("Unexpected end of file while reading {what}.")));
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    };

    let location = next_line("location line")?
        .trim()
        .trim_matches('#')
        .trim()
        .to_string();
    let header = next_line("column header line")?;
    let names = parse_header(&header)?;
    let ncol = names.len();

    let mut rows = Vec::new();
    let mut skipped_lines = 0usize;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| AppError::new(2, format!("Failed to read data line: {e}")))?;
        if n == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        if line.trim().is_empty() {
            continue;
        }
        match parse_row(&line, ncol) {
            Some(row) => rows.push(row),
            None => skipped_lines += 1,
        }
    }

    debug!(
        "asc: columns={names:?}, rows={}, skipped={skipped_lines}",
        rows.len()
    );

    let table = Table::from_rows(names, &rows).map_err(|e| AppError::new(2, e.to_string()))?;
    Ok(AscFile {
        location,
        table,
        skipped_lines,
    })
}

fn parse_header(line: &str) -> Result<Vec<String>, AppError> {
    let line = line.trim().trim_matches('#').trim();
    let groups: Vec<&str> = line.split('-').collect();
    if groups.len() < 2 {
        return Err(AppError::new(
            2,
            format!("Column header line has no '-' separator: '{line}'"),
        ));
    }

    let mut names = vec!["index".to_string(), normalize_name(groups[0])];
    names.extend(groups[1].split('/').map(normalize_name));
    Ok(names)
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn parse_row(line: &str, ncol: usize) -> Option<Vec<f64>> {
    let values: Vec<f64> = line
        .split_whitespace()
        .map(str::parse::<f64>)
        .collect::<Result<_, _>>()
        .ok()?;
    (values.len() == ncol).then_some(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "#C:\\data\\run01.asc\r\n\
#Time.s - Temperature/dL.pct/Nominal Temperature\r\n\
0 0.0 20.0 0.000 20.0\r\n\
1 0.5 25.0 0.010 25.0\r\n\
garbage line here\r\n\
2 1.0 30.0 0.020\r\n\
\r\n\
3 1.5 35.0 0.030 35.0\r\n";

    #[test]
    fn parses_header_and_rows() {
        let asc = parse_asc(SAMPLE.as_bytes()).unwrap();
        assert_eq!(asc.location, "C:\\data\\run01.asc");
        assert_eq!(
            asc.table.names(),
            &["index", "time.s", "temperature", "dl.pct", "nominal temperature"]
        );
        assert_eq!(asc.table.n_rows(), 3);
        assert_eq!(asc.table.column("index"), Some(&[0.0, 1.0, 3.0][..]));
        assert_eq!(asc.skipped_lines, 2);
    }

    #[test]
    fn tolerates_invalid_utf8() {
        let mut bytes = b"#loc\xff\n#Time - Temperature\n0 1.0 2.0\n".to_vec();
        bytes.extend_from_slice(b"1 \xfe 2.0\n");
        let asc = parse_asc(&bytes[..]).unwrap();
        assert_eq!(asc.table.n_rows(), 1);
        assert_eq!(asc.table.names(), &["index", "time", "temperature"]);
    }

    #[test]
    fn header_without_separator_fails() {
        let err = parse_asc("#loc\n#Time/Temperature\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let err = parse_asc("#loc only\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
