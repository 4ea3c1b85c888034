//! Parser for the eHYD per-station export format.
//!
//! Each export starts with a free-text metadata block, followed by a line
//! starting with `Werte:` and then one `date;value` row per observation. Files are
//! Latin-1 encoded and use German decimal commas. Gaps are written as `Lücke`,
//! flagged values carry `F` or `K` markers.

use crate::types::station::StationId;
use chrono::{NaiveDate, NaiveDateTime};

const VALUE_SECTION_MARKER: &str = "Werte:";
const GAP_MARKER: &str = "Lücke";
const REJECTED_VALUE_MARKERS: [&str; 3] = ["F", "K", "rekonstruiert aus Version 3->"];
const DATE_FORMATS: [&str; 2] = ["%d.%m.%Y %H:%M:%S", "%d.%m.%Y %H:%M"];

/// Why a measurement file produced no series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No line starts with `Werte:`.
    NoValueSection,
    /// The `Werte:` line is marked invalid.
    InvalidHeader,
    /// The value section held no usable rows.
    NoData,
}

/// Decodes ISO-8859-1 bytes. Every byte maps to the code point of the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Parses a number written with a decimal comma (`"1.234,5"` is not expected, only `"1234,5"`).
pub fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim().replace(',', ".").parse::<f64>().ok()
}

/// Parses a station number that may have been exported as a float (`"300111.0"`).
pub fn parse_station_id(raw: &str) -> Option<StationId> {
    let raw = raw.trim();
    raw.parse::<StationId>().ok().or_else(|| {
        parse_decimal(raw)
            .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0 && *v <= StationId::MAX as f64)
            .map(|v| v as StationId)
    })
}

/// Station id encoded in an export file name: the six characters before `.csv`.
///
/// # Examples
///
/// ```
/// use ehyd::station_id_from_file_name;
///
/// assert_eq!(station_id_from_file_name("Grundwasserstand-Monatsmittel-300111.csv"), Some(300111));
/// assert_eq!(station_id_from_file_name("readme.txt"), None);
/// ```
pub fn station_id_from_file_name(file_name: &str) -> Option<StationId> {
    let stem = file_name.strip_suffix(".csv")?;
    let chars: Vec<char> = stem.chars().collect();
    if chars.len() < 6 {
        return None;
    }
    let key: String = chars[chars.len() - 6..].iter().collect();
    if !key.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    key.parse().ok()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}

fn parse_value(raw: &str) -> Option<f64> {
    let raw = raw.trim().replace(GAP_MARKER, "NaN");
    if REJECTED_VALUE_MARKERS.iter().any(|m| raw.contains(m)) {
        return None;
    }
    parse_decimal(&raw)
}

/// Parses the value section of a decoded export file.
///
/// Rows with an unparseable date or value, or with a flagged value, are skipped.
/// A row without a `;` separator ends the section. The last parsed row is dropped
/// because exports close with the first day after the reporting period.
pub fn parse_measurements(text: &str) -> Result<Vec<(NaiveDate, f64)>, SkipReason> {
    let mut lines = text.lines();
    let header = lines
        .by_ref()
        .find(|line| line.starts_with(VALUE_SECTION_MARKER))
        .ok_or(SkipReason::NoValueSection)?;
    if header.contains("Invalid") {
        return Err(SkipReason::InvalidHeader);
    }

    let mut observations = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split(';');
        let (Some(date_field), Some(value_field)) = (fields.next(), fields.next()) else {
            break;
        };
        let Some(date) = parse_date(date_field) else {
            continue;
        };
        let Some(value) = parse_value(value_field) else {
            continue;
        };
        observations.push((date, value));
    }

    observations.pop();
    if observations.is_empty() {
        return Err(SkipReason::NoData);
    }
    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latin1(text: &str) -> Vec<u8> {
        text.chars().map(|c| c as u32 as u8).collect()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const EXPORT: &str = "Messstelle:;Wien\n\
        HZB-Nummer:;300111\n\
        Werte:\n\
        01.01.2021 00:00:00;   245,12   ;\n\
        01.02.2021 00:00;245,30;\n\
        \n\
        01.03.2021 00:00:00;Lücke;\n\
        01.04.2021 00:00:00;246,0 F;\n\
        xx.05.2021 00:00:00;246,1;\n\
        01.06.2021 00:00:00;rekonstruiert aus Version 3->;\n\
        01.07.2021 00:00:00;K;\n\
        01.08.2021 00:00:00;247,5;\n\
        01.01.2022 00:00:00;0,0;\n";

    #[test]
    fn parses_value_section() {
        let text = decode_latin1(&latin1(EXPORT));
        let obs = parse_measurements(&text).unwrap();
        assert_eq!(obs.len(), 4);
        assert_eq!(obs[0], (date(2021, 1, 1), 245.12));
        assert_eq!(obs[1], (date(2021, 2, 1), 245.30));
        assert_eq!(obs[2].0, date(2021, 3, 1));
        assert!(obs[2].1.is_nan());
        // The closing 2022-01-01 row is dropped.
        assert_eq!(obs[3], (date(2021, 8, 1), 247.5));
    }

    #[test]
    fn row_without_separator_ends_section() {
        let text = "Werte:\n01.01.2000 00:00:00;1,0\n01.02.2000 00:00:00;2,0\nEnde\n01.03.2000 00:00:00;3,0\n";
        let obs = parse_measurements(text).unwrap();
        assert_eq!(obs, vec![(date(2000, 1, 1), 1.0)]);
    }

    #[test]
    fn skips_files_without_usable_values() {
        assert_eq!(
            parse_measurements("Kopf\nnichts\n"),
            Err(SkipReason::NoValueSection)
        );
        assert_eq!(
            parse_measurements("Werte: Invalid\n01.01.2000 00:00:00;1,0\n"),
            Err(SkipReason::InvalidHeader)
        );
        assert_eq!(
            parse_measurements("Werte:\n01.01.2000 00:00:00;1,0\n"),
            Err(SkipReason::NoData)
        );
    }

    #[test]
    fn decodes_latin1_umlauts() {
        assert_eq!(decode_latin1(&[0x4c, 0xfc, 0x63, 0x6b, 0x65]), "Lücke");
    }

    #[test]
    fn station_ids() {
        assert_eq!(station_id_from_file_name("N-Tagessummen-105445.csv"), Some(105445));
        assert_eq!(station_id_from_file_name("abc.csv"), None);
        assert_eq!(station_id_from_file_name("messstellen-abcdef.csv"), None);
        assert_eq!(parse_station_id("300111"), Some(300111));
        assert_eq!(parse_station_id(" 300111,0 "), Some(300111));
        assert_eq!(parse_station_id("x"), None);
        assert_eq!(parse_decimal("12,5"), Some(12.5));
    }
}
