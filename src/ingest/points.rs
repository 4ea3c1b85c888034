use crate::ingest::error::IngestError;
use crate::ingest::parser::parse_station_id;
use crate::types::station::StationId;
use log::warn;
use polars::prelude::*;
use std::collections::BTreeSet;
use std::path::Path;

/// Reads the requested groundwater stations from a points file.
///
/// The file is a comma separated table whose header names the stations: every
/// column after the first is a station id. Only the header is used.
pub fn read_points_file(path: &Path) -> Result<BTreeSet<StationId>, IngestError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|e| IngestError::PointsRead {
            path: path.to_path_buf(),
            source: e,
        })?;

    let mut points = BTreeSet::new();
    for name in df.get_column_names().into_iter().skip(1) {
        match parse_station_id(name) {
            Some(id) => {
                points.insert(id);
            }
            None => warn!("Ignoring non-numeric point '{}' in {}", name, path.display()),
        }
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn header_columns_after_first_are_points() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"date,300111,300112,foo\n2022-01-01,,,\n").unwrap();
        file.flush().unwrap();
        let points = read_points_file(file.path()).unwrap();
        assert_eq!(points.into_iter().collect::<Vec<_>>(), vec![300111, 300112]);
    }
}
