//! CSV candle ingestion.
//!
//! Expected header: `time,open,high,low,close,volume`. `time` is either epoch
//! seconds or an RFC 3339 timestamp. Rows are returned as read; ordering and
//! sanity are checked later by the validator.

use chrono::DateTime;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use trailwatch_core::Candle;

/// Errors from the CSV loader.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: unrecognized time '{value}' (expected epoch seconds or RFC 3339)")]
    BadTime { row: usize, value: String },
}

#[derive(Debug, Deserialize)]
struct CandleRow {
    time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

/// Parse epoch seconds or RFC 3339 into epoch seconds.
pub fn parse_time(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<i64>() {
        return Some(secs);
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.timestamp())
}

/// Read candles from any CSV source with a header row.
pub fn read_candles<R: Read>(reader: R) -> Result<Vec<Candle>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut candles = Vec::new();
    for (i, row) in rdr.deserialize::<CandleRow>().enumerate() {
        let row = row?;
        // header is line 1
        let time = parse_time(&row.time).ok_or_else(|| LoadError::BadTime {
            row: i + 2,
            value: row.time.clone(),
        })?;
        candles.push(Candle::new(time, row.open, row.high, row.low, row.close, row.volume));
    }
    Ok(candles)
}

/// Load candles from a CSV file.
pub fn load_csv(path: &Path) -> Result<Vec<Candle>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_candles(std::io::BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_epoch_and_rfc3339() {
        let data = "time,open,high,low,close,volume\n\
                    60,100,101,99,100.5,10\n\
                    1970-01-01T00:02:00Z, 100.5, 102, 100, 101.5, 12\n";
        let candles = read_candles(data.as_bytes()).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0], Candle::new(60, 100.0, 101.0, 99.0, 100.5, 10.0));
        assert_eq!(candles[1].time, 120);
        assert_eq!(candles[1].close, 101.5);
    }

    #[test]
    fn rfc3339_offsets_normalize_to_utc() {
        assert_eq!(parse_time("2024-01-01T01:00:00+01:00"), Some(1_704_067_200));
        assert_eq!(parse_time("not a time"), None);
    }

    #[test]
    fn bad_time_reports_row() {
        let data = "time,open,high,low,close,volume\n60,1,1,1,1,1\nyesterday,1,1,1,1,1\n";
        match read_candles(data.as_bytes()) {
            Err(LoadError::BadTime { row, value }) => {
                assert_eq!(row, 3);
                assert_eq!(value, "yesterday");
            }
            other => panic!("expected BadTime, got {other:?}"),
        }
    }

    #[test]
    fn bad_number_is_csv_error() {
        let data = "time,open,high,low,close,volume\n60,abc,1,1,1,1\n";
        assert!(matches!(read_candles(data.as_bytes()), Err(LoadError::Csv(_))));
    }

    #[test]
    fn load_csv_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "time,open,high,low,close,volume").unwrap();
        writeln!(file, "0,10,11,9,10.5,100").unwrap();
        let candles = load_csv(file.path()).unwrap();
        assert_eq!(candles.len(), 1);

        assert!(matches!(
            load_csv(Path::new("/definitely/not/here.csv")),
            Err(LoadError::Io { .. })
        ));
    }
}
