// CSV input plumbing.
//
// The calculation core never touches files; it consumes the RawTable this
// module produces.
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::types::RawTable;

/// Pick the separator by counting candidates in the header line. Field
/// exports come with either `;` or `,`.
fn sniff_delimiter(header_line: &str) -> u8 {
    if header_line.matches(';').count() > header_line.matches(',').count() {
        b';'
    } else {
        b','
    }
}

/// Load the raw table from a CSV file.
///
/// Rows are decoded lossily so a stray latin-1 export does not kill the
/// run; header names are trimmed once here.
pub fn load(path: &Path) -> Result<RawTable> {
    if !path.exists() {
        return Err(PipelineError::InputNotFound(path.display().to_string()));
    }

    let first_line = {
        let mut line = String::new();
        BufReader::new(File::open(path)?).read_line(&mut line)?;
        line
    };
    let delimiter = sniff_delimiter(&first_line);

    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = rdr
        .byte_headers()?
        .iter()
        .map(|h| String::from_utf8_lossy(h).trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in rdr.byte_records() {
        let record = record?;
        let fields: Vec<String> = record
            .iter()
            .map(|f| String::from_utf8_lossy(f).into_owned())
            .collect();
        rows.push(StringRecord::from(fields));
    }

    info!(
        rows = rows.len(),
        columns = headers.len(),
        delimiter = %(delimiter as char),
        "input loaded"
    );

    Ok(RawTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn sniffs_semicolon_headers() {
        assert_eq!(sniff_delimiter("Equipe;Despachada;Liberada"), b';');
        assert_eq!(sniff_delimiter("Equipe,Despachada,Liberada"), b',');
    }

    #[test]
    fn loads_semicolon_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.csv");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "Equipe;Despachada").unwrap();
        writeln!(f, "T01;01/03/2024 08:10").unwrap();
        writeln!(f, "T02;").unwrap();
        drop(f);

        let table = load(&path).unwrap();
        assert_eq!(table.headers, vec!["Equipe", "Despachada"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].get(0), Some("T01"));
        assert_eq!(table.rows[1].get(1), Some(""));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load(Path::new("does/not/exist.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::InputNotFound(_)));
    }
}
