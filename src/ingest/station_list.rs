use crate::ingest::error::IngestError;
use crate::ingest::parser::{parse_decimal, parse_station_id};
use crate::types::station::StationId;
use log::{debug, warn};
use polars::prelude::*;
use std::path::Path;

/// One row of a category's `messstellen_alle.csv`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationRecord {
    pub id: StationId,
    pub x: f64,
    pub y: f64,
}

fn find_column<'a>(df: &'a DataFrame, name: &str, path: &Path) -> Result<&'a Column, IngestError> {
    df.get_columns()
        .iter()
        .find(|c| c.name().trim().trim_start_matches('\u{feff}') == name)
        .ok_or_else(|| IngestError::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })
}

/// Reads a station list: semicolon separated, Latin-1, decimal commas.
///
/// All columns are read as text, then `x`, `y` and `hzbnr01` are parsed by hand.
/// Rows with unparseable coordinates or ids are dropped.
pub fn read_station_list(path: &Path) -> Result<Vec<StationRecord>, IngestError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|options| {
            options
                .with_separator(b';')
                .with_encoding(CsvEncoding::LossyUtf8)
                .with_truncate_ragged_lines(true)
        })
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|e| IngestError::StationListRead {
            path: path.to_path_buf(),
            source: e,
        })?;

    let ids = find_column(&df, "hzbnr01", path)?.str()?;
    let xs = find_column(&df, "x", path)?.str()?;
    let ys = find_column(&df, "y", path)?.str()?;

    let mut records = Vec::with_capacity(df.height());
    let mut dropped = 0usize;
    for ((id, x), y) in ids.into_iter().zip(xs).zip(ys) {
        let parsed = (
            id.and_then(parse_station_id),
            x.and_then(parse_decimal),
            y.and_then(parse_decimal),
        );
        match parsed {
            (Some(id), Some(x), Some(y)) if x.is_finite() && y.is_finite() => {
                records.push(StationRecord { id, x, y })
            }
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        warn!(
            "Dropped {} rows without usable coordinates from {}",
            dropped,
            path.display()
        );
    }
    debug!("Read {} stations from {}", records.len(), path.display());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn reads_decimal_comma_coordinates() {
        let mut file = NamedTempFile::new().unwrap();
        let content = "dbmsnr;hzbnr01;x;y;Messstelle\n\
            1;300111;123456,5;456789,25;Wien Mühlgasse\n\
            2;300112;;456789,0;ohne x\n\
            3;300113;100,0;200,0;B\n";
        let bytes: Vec<u8> = content.chars().map(|c| c as u32 as u8).collect();
        file.write_all(&bytes).unwrap();
        file.flush().unwrap();

        let records = read_station_list(file.path()).unwrap();
        assert_eq!(
            records,
            vec![
                StationRecord {
                    id: 300111,
                    x: 123456.5,
                    y: 456789.25
                },
                StationRecord {
                    id: 300113,
                    x: 100.0,
                    y: 200.0
                },
            ]
        );
    }

    #[test]
    fn missing_column_is_reported() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"hzbnr01;x\n1;2,0\n").unwrap();
        file.flush().unwrap();
        let err = read_station_list(file.path()).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn { ref column, .. } if column == "y"));
    }
}
