#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CSV parsing for the administrative bulk-import endpoints.
//!
//! Both importers are lenient about presentation (header casing and
//! whitespace, extra columns, varying field counts) and strict about
//! content: a row that fails validation is skipped and counted, never
//! imported half-parsed. Callers decide what to do when nothing valid
//! remains.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

use crimewatch_database_models::{NewCrime, NewLocation};

/// Errors that can occur while reading an import file.
///
/// Per-row validation failures are not errors; they increment
/// [`CsvImport::skipped`] instead.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The CSV structure could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is missing from the header row.
    #[error("Missing required column '{column}'")]
    MissingColumn {
        /// Name of the absent column.
        column: &'static str,
    },
}

/// Outcome of parsing one import file.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvImport<T> {
    /// Rows that passed validation, in file order.
    pub rows: Vec<T>,
    /// Number of rows dropped by validation.
    pub skipped: usize,
}

/// Parses a location import file.
///
/// Expected columns: `name`, `latitude`, `longitude`, `map_url`. A row is
/// valid when the name and map URL are non-blank and both coordinates
/// parse as floats within their degree ranges.
///
/// # Errors
///
/// Returns [`IngestError`] when the CSV cannot be read or a required
/// column is absent.
pub fn parse_locations_csv(bytes: &[u8]) -> Result<CsvImport<NewLocation>, IngestError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);
    let headers = normalized_headers(&mut reader)?;

    let name_col = require_column(&headers, "name")?;
    let latitude_col = require_column(&headers, "latitude")?;
    let longitude_col = require_column(&headers, "longitude")?;
    let map_url_col = require_column(&headers, "map_url")?;

    let mut rows = Vec::new();
    let mut skipped = 0;

    for result in reader.records() {
        let record = result?;
        let name = field(&record, name_col);
        let map_url = field(&record, map_url_col);
        let latitude: Option<f64> = field(&record, latitude_col).parse().ok();
        let longitude: Option<f64> = field(&record, longitude_col).parse().ok();

        let coords = latitude.zip(longitude).filter(|&(lat, lon)| {
            crimewatch_geo::is_valid_latitude(lat) && crimewatch_geo::is_valid_longitude(lon)
        });

        match coords {
            Some((latitude, longitude)) if !name.is_empty() && !map_url.is_empty() => {
                rows.push(NewLocation {
                    name: name.to_string(),
                    latitude,
                    longitude,
                    map_url: Some(map_url.to_string()),
                });
            }
            _ => skipped += 1,
        }
    }

    log::debug!(
        "Parsed location import: {} valid, {skipped} skipped",
        rows.len()
    );
    Ok(CsvImport { rows, skipped })
}

/// Parses a crime-report import file.
///
/// Expected columns: `location_id`, `category`, `occurred_at`, and an
/// optional `description`. A row is valid when the location id is an
/// integer, the category is non-blank, and the timestamp parses as
/// RFC 3339, `YYYY-MM-DD HH:MM:SS`, or `YYYY-MM-DD` (midnight).
///
/// # Errors
///
/// Returns [`IngestError`] when the CSV cannot be read or a required
/// column is absent.
pub fn parse_crimes_csv(bytes: &[u8]) -> Result<CsvImport<NewCrime>, IngestError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);
    let headers = normalized_headers(&mut reader)?;

    let location_col = require_column(&headers, "location_id")?;
    let category_col = require_column(&headers, "category")?;
    let occurred_col = require_column(&headers, "occurred_at")?;
    let description_col = find_column(&headers, "description");

    let mut rows = Vec::new();
    let mut skipped = 0;

    for result in reader.records() {
        let record = result?;
        let location_id: Option<i64> = field(&record, location_col).parse().ok();
        let category = field(&record, category_col);
        let occurred_at = parse_timestamp(field(&record, occurred_col));

        match location_id.zip(occurred_at) {
            Some((location_id, occurred_at)) if !category.is_empty() => {
                let description = description_col
                    .map(|col| field(&record, col))
                    .filter(|text| !text.is_empty())
                    .map(ToString::to_string);
                rows.push(NewCrime {
                    location_id,
                    category: category.to_string(),
                    occurred_at,
                    description,
                });
            }
            _ => skipped += 1,
        }
    }

    log::debug!(
        "Parsed crime import: {} valid, {skipped} skipped",
        rows.len()
    );
    Ok(CsvImport { rows, skipped })
}

/// Parses an import timestamp in any of the three accepted formats.
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(DateTime::from_naive_utc_and_offset(dt, Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
}

/// Reads the header row, trimmed and lowercased.
fn normalized_headers<R: std::io::Read>(
    reader: &mut csv::Reader<R>,
) -> Result<Vec<String>, IngestError> {
    Ok(reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect())
}

fn find_column(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn require_column(headers: &[String], name: &'static str) -> Result<usize, IngestError> {
    find_column(headers, name).ok_or(IngestError::MissingColumn { column: name })
}

fn field<'r>(record: &'r csv::StringRecord, index: usize) -> &'r str {
    record.get(index).unwrap_or("").trim()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    #[test]
    fn parses_valid_location_rows() {
        let csv = b"name,latitude,longitude,map_url\n\
            Malioboro,-7.7929,110.3658,https://maps.example.com/place/malioboro\n\
            Alun-Alun Kidul,-7.8110,110.3621,https://maps.example.com/place/aak\n";

        let import = parse_locations_csv(csv).unwrap();

        assert_eq!(import.skipped, 0);
        assert_eq!(import.rows.len(), 2);
        assert_eq!(import.rows[0].name, "Malioboro");
        assert!((import.rows[0].latitude - -7.7929).abs() < 1e-9);
        assert_eq!(
            import.rows[1].map_url.as_deref(),
            Some("https://maps.example.com/place/aak")
        );
    }

    #[test]
    fn skips_invalid_location_rows() {
        let csv = b"name,latitude,longitude,map_url\n\
            ,-7.79,110.36,https://maps.example.com/a\n\
            NoLatitude,not-a-number,110.36,https://maps.example.com/b\n\
            OutOfRange,-7.79,200.0,https://maps.example.com/c\n\
            NoUrl,-7.79,110.36,\n\
            Valid,-7.79,110.36,https://maps.example.com/d\n";

        let import = parse_locations_csv(csv).unwrap();

        assert_eq!(import.rows.len(), 1);
        assert_eq!(import.rows[0].name, "Valid");
        assert_eq!(import.skipped, 4);
    }

    #[test]
    fn location_headers_tolerate_case_and_whitespace() {
        let csv = b" Name , LATITUDE ,Longitude, Map_URL \n\
            Tugu,-7.7828,110.3671,https://maps.example.com/tugu\n";

        let import = parse_locations_csv(csv).unwrap();

        assert_eq!(import.rows.len(), 1);
        assert_eq!(import.rows[0].name, "Tugu");
    }

    #[test]
    fn missing_location_column_is_an_error() {
        let csv = b"name,latitude,longitude\nX,-7.79,110.36\n";

        let err = parse_locations_csv(csv).unwrap_err();

        assert!(matches!(
            err,
            IngestError::MissingColumn { column: "map_url" }
        ));
    }

    #[test]
    fn parses_crime_rows_in_all_timestamp_formats() {
        let csv = b"location_id,category,occurred_at,description\n\
            1,theft,2025-01-15T20:30:00Z,Phone stolen\n\
            1,fraud,2025-01-16 09:15:00,\n\
            2,vandalism,2025-01-17,Broken window\n";

        let import = parse_crimes_csv(csv).unwrap();

        assert_eq!(import.skipped, 0);
        assert_eq!(import.rows.len(), 3);
        assert_eq!(
            import.rows[0].occurred_at,
            Utc.with_ymd_and_hms(2025, 1, 15, 20, 30, 0).unwrap()
        );
        assert_eq!(
            import.rows[1].occurred_at,
            Utc.with_ymd_and_hms(2025, 1, 16, 9, 15, 0).unwrap()
        );
        assert_eq!(
            import.rows[2].occurred_at,
            Utc.with_ymd_and_hms(2025, 1, 17, 0, 0, 0).unwrap()
        );
        assert_eq!(import.rows[0].description.as_deref(), Some("Phone stolen"));
        assert_eq!(import.rows[1].description, None);
    }

    #[test]
    fn skips_invalid_crime_rows() {
        let csv = b"location_id,category,occurred_at\n\
            abc,theft,2025-01-15\n\
            2,,2025-01-15\n\
            3,theft,sometime\n\
            4,theft,2025-01-15\n";

        let import = parse_crimes_csv(csv).unwrap();

        assert_eq!(import.rows.len(), 1);
        assert_eq!(import.rows[0].location_id, 4);
        assert_eq!(import.skipped, 3);
    }

    #[test]
    fn description_column_is_optional() {
        let csv = b"location_id,category,occurred_at\n1,theft,2025-01-15\n";

        let import = parse_crimes_csv(csv).unwrap();

        assert_eq!(import.rows.len(), 1);
        assert_eq!(import.rows[0].description, None);
    }

    #[test]
    fn header_only_file_yields_nothing() {
        let import = parse_locations_csv(b"name,latitude,longitude,map_url\n").unwrap();

        assert!(import.rows.is_empty());
        assert_eq!(import.skipped, 0);
    }

    #[test]
    fn extra_columns_are_ignored() {
        let csv = b"id,name,latitude,longitude,map_url,notes\n\
            9,Prambanan,-7.7520,110.4915,https://maps.example.com/p,ancient temple\n";

        let import = parse_locations_csv(csv).unwrap();

        assert_eq!(import.rows.len(), 1);
        assert_eq!(import.rows[0].name, "Prambanan");
    }

    #[test]
    fn timestamp_rejects_garbage() {
        assert!(parse_timestamp("2025-01-15T20:30:00Z").is_some());
        assert!(parse_timestamp("2025-13-40").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
