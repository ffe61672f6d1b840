use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use csv::StringRecord;
use thiserror::Error;

use crate::data::{PriceBar, PriceSeries};

const PRICE_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];

const TIME_FORMATS: [&str; 3] = ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("no price rows found")]
    NoRows,

    #[error("line {line}: cannot read a timestamp from '{value}'")]
    Timestamp { line: u64, value: String },

    #[error("line {line}: '{value}' is not a number for the {column} column")]
    Number {
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("malformed CSV input")]
    Csv(#[from] csv::Error),
}

/// Load and validate a series. Rows are kept in file order; ordering or
/// duplicate problems surface as a [`crate::data::SeriesError`].
pub fn load_series<P: AsRef<Path>>(path: P, tz: Tz) -> Result<PriceSeries> {
    let path_ref = path.as_ref();
    let bars = load_bars_from_csv(path_ref, tz)?;
    PriceSeries::new(bars).with_context(|| format!("{:?} is not a valid price series", path_ref))
}

pub fn load_bars_from_csv<P: AsRef<Path>>(path: P, tz: Tz) -> Result<Vec<PriceBar>> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref).with_context(|| format!("failed to open {:?}", path_ref))?;
    Ok(read_bars(file, tz)?)
}

/// Parse `datetime,o,h,l,c,v` or `date,time,o,h,l,c,v` rows. Timestamps are
/// local to `tz`. Header rows and rows with too few fields are skipped.
pub fn read_bars<R: Read>(input: R, tz: Tz) -> Result<Vec<PriceBar>, LoaderError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input);

    let mut bars = Vec::new();
    for record in reader.records() {
        if let Some(bar) = parse_record(&record?, tz)? {
            bars.push(bar);
        }
    }

    if bars.is_empty() {
        return Err(LoaderError::NoRows);
    }
    Ok(bars)
}

fn parse_record(record: &StringRecord, tz: Tz) -> Result<Option<PriceBar>, LoaderError> {
    if is_header(record) {
        return Ok(None);
    }

    let fields: Vec<&str> = record.iter().filter(|field| !field.is_empty()).collect();
    if fields.len() < 6 {
        return Ok(None);
    }

    let line = record.position().map_or(0, |pos| pos.line());
    let (naive, prices) = if fields.len() >= 7 {
        let naive = parse_date(fields[0])
            .zip(parse_time(fields[1]))
            .map(|(date, time)| date.and_time(time));
        (naive, &fields[2..])
    } else {
        (parse_datetime(fields[0]), &fields[1..])
    };
    let naive = naive.ok_or_else(|| LoaderError::Timestamp {
        line,
        value: fields[..fields.len() - prices.len()].join(" "),
    })?;

    let mut values = [0.0; 5];
    for ((slot, column), raw) in values.iter_mut().zip(PRICE_COLUMNS).zip(prices) {
        *slot = parse_number(raw, column, line)?;
    }
    let [open, high, low, close, volume] = values;

    Ok(Some(PriceBar::new(
        localize(naive, tz),
        open,
        high,
        low,
        close,
        volume,
    )))
}

fn is_header(record: &StringRecord) -> bool {
    record.get(0).is_some_and(|first| {
        matches!(
            first.to_ascii_lowercase().as_str(),
            "date" | "datetime" | "timestamp" | "time"
        )
    })
}

/// Gaps resolve as UTC; repeated wall-clock times take the earlier instant.
fn localize(naive: NaiveDateTime, tz: Tz) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt,
        LocalResult::None => tz.from_utc_datetime(&naive),
    }
}

/// Thousands separators are stripped before parsing.
fn parse_number(raw: &str, column: &'static str, line: u64) -> Result<f64, LoaderError> {
    raw.replace(',', "")
        .parse::<f64>()
        .map_err(|_| LoaderError::Number {
            line,
            column,
            value: raw.to_string(),
        })
}

fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        // Daily files carry a bare date; anchor it at midnight.
        .or_else(|| parse_date(value).and_then(|date| date.and_hms_opt(0, 0, 0)))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(value, format).ok())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::Timelike;
    use chrono_tz::Asia::Kolkata;

    use super::*;
    use crate::data::SeriesError;

    #[test]
    fn reads_headed_datetime_layout() {
        let csv = "datetime,open,high,low,close,volume\n\
                   2024-01-02 09:15:00,100,101,99,100.5,1200\n\
                   2024-01-02 09:30:00,100.5,102,100,101.5,\"1,500\"\n";
        let bars = read_bars(csv.as_bytes(), Kolkata).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp.hour(), 9);
        assert_eq!(bars[0].timestamp.minute(), 15);
        assert_eq!(bars[1].volume, 1500.0);
    }

    #[test]
    fn reads_split_date_and_time_columns() {
        let csv = "2024-01-02,09:15,100,101,99,100.5,1200\n";
        let bars = read_bars(csv.as_bytes(), Kolkata).unwrap();
        assert_eq!(bars[0].close, 100.5);
        assert_eq!(bars[0].timestamp.minute(), 15);
    }

    #[test]
    fn reads_daily_bare_dates() {
        let csv = "2024-01-02,100,101,99,100.5,1200\n2024-01-03,100,102,99,101,900\n";
        let bars = read_bars(csv.as_bytes(), Kolkata).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].timestamp.hour(), 0);
    }

    #[test]
    fn bad_number_names_line_and_column() {
        let csv = "2024-01-02 09:15:00,100,101,99,100.5,1200\n\
                   2024-01-02 09:30:00,abc,101,99,100.5,1200\n";
        let err = read_bars(csv.as_bytes(), Kolkata).unwrap_err();
        match err {
            LoaderError::Number {
                line,
                column,
                value,
            } => {
                assert_eq!(line, 2);
                assert_eq!(column, "open");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unreadable_timestamp_is_reported() {
        let csv = "yesterday,100,101,99,100.5,1200\n";
        let err = read_bars(csv.as_bytes(), Kolkata).unwrap_err();
        assert!(matches!(
            err,
            LoaderError::Timestamp { line: 1, ref value } if value == "yesterday"
        ));
    }

    #[test]
    fn header_only_input_has_no_rows() {
        let err = read_bars("date,open,high,low,close,volume\n".as_bytes(), Kolkata).unwrap_err();
        assert!(matches!(err, LoaderError::NoRows));
    }

    #[test]
    fn out_of_order_file_is_rejected_not_sorted() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "2024-01-02 09:30:00,100,101,99,100,10").unwrap();
        writeln!(file, "2024-01-02 09:15:00,100,101,99,100,10").unwrap();

        let err = load_series(file.path(), Kolkata).unwrap_err();
        assert_eq!(
            err.downcast_ref::<SeriesError>(),
            Some(&SeriesError::NonIncreasingTimestamp { index: 1 })
        );
    }
}
