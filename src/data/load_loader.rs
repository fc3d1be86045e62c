use std::fs::File;
use std::io::Read;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;

// Column names of the system operator's demand export
const COL_DATE: &str = "SETTLEMENT_DATE";
const COL_PERIOD: &str = "PERIOD";
const COL_ENERGY: &str = "SYSTEMENERGY";

#[derive(Debug)]
pub enum LoadDataError {
    IoError(std::io::Error),
    CsvError(csv::Error),
    MissingColumn(String),
    InvalidTimestamp(String),
    InvalidValue(String),
    NoDataForYear(i32),
}

impl From<std::io::Error> for LoadDataError {
    fn from(err: std::io::Error) -> Self {
        LoadDataError::IoError(err)
    }
}

impl From<csv::Error> for LoadDataError {
    fn from(err: csv::Error) -> Self {
        LoadDataError::CsvError(err)
    }
}

impl std::fmt::Display for LoadDataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadDataError::IoError(e) => write!(f, "IO error: {}", e),
            LoadDataError::CsvError(e) => write!(f, "CSV error: {}", e),
            LoadDataError::MissingColumn(c) => write!(f, "Missing column: {}", c),
            LoadDataError::InvalidTimestamp(s) => write!(f, "Invalid timestamp: {}", s),
            LoadDataError::InvalidValue(s) => write!(f, "Invalid value: {}", s),
            LoadDataError::NoDataForYear(y) => write!(f, "No demand data for year {}", y),
        }
    }
}

impl std::error::Error for LoadDataError {}

/// The national hourly demand profile of one historical year.
#[derive(Debug, Clone)]
pub struct LoadSeries {
    pub timestamps: Vec<NaiveDateTime>,
    pub values_mw: Vec<f64>,
}

fn parse_settlement_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .ok()
}

pub fn parse_system_demand(
    contents: &str,
    historical_year: i32,
) -> Result<LoadSeries, LoadDataError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(contents.as_bytes());

    let headers = reader.headers()?.clone();
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| LoadDataError::MissingColumn(name.to_string()))
    };
    let date_idx = find(COL_DATE)?;
    let period_idx = find(COL_PERIOD)?;
    let energy_idx = find(COL_ENERGY)?;

    let mut entries: Vec<(NaiveDateTime, f64)> = Vec::new();
    for result in reader.records() {
        let record = result?;
        let raw_date = record.get(date_idx).unwrap_or("");
        let date = parse_settlement_date(raw_date)
            .ok_or_else(|| LoadDataError::InvalidTimestamp(raw_date.to_string()))?;

        let raw_period = record.get(period_idx).unwrap_or("");
        let hour: u32 = raw_period
            .trim()
            .parse()
            .map_err(|_| LoadDataError::InvalidValue(format!("period {}", raw_period)))?;
        let timestamp = date
            .and_hms_opt(hour, 0, 0)
            .ok_or_else(|| LoadDataError::InvalidValue(format!("period {}", raw_period)))?;

        let raw_energy = record.get(energy_idx).unwrap_or("");
        let value: f64 = raw_energy
            .trim()
            .parse()
            .map_err(|_| LoadDataError::InvalidValue(format!("energy {}", raw_energy)))?;

        if date.year() == historical_year {
            entries.push((timestamp, value));
        }
    }

    if entries.is_empty() {
        return Err(LoadDataError::NoDataForYear(historical_year));
    }

    entries.sort_by_key(|(t, _)| *t);
    let (timestamps, values_mw) = entries.into_iter().unzip();
    Ok(LoadSeries {
        timestamps,
        values_mw,
    })
}

pub fn load_system_demand(
    path: &str,
    historical_year: i32,
) -> Result<LoadSeries, LoadDataError> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    parse_system_demand(&contents, historical_year)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
SETTLEMENT_DATE,PERIOD,SYSTEMENERGY
2017-01-01,0,25000
2017-01-01,1,24500
2016-12-31,23,26000
2017-01-01,2,24000
";

    #[test]
    fn parses_and_filters_historical_year() {
        let series = parse_system_demand(SAMPLE, 2017).unwrap();
        assert_eq!(series.timestamps.len(), 3);
        assert_eq!(series.values_mw, vec![25000.0, 24500.0, 24000.0]);
        assert_eq!(
            series.timestamps[0],
            NaiveDate::from_ymd_opt(2017, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn accepts_day_first_dates() {
        let sample = "SETTLEMENT_DATE,PERIOD,SYSTEMENERGY\n01/01/2017,5,1000\n";
        let series = parse_system_demand(sample, 2017).unwrap();
        assert_eq!(series.timestamps[0].format("%H").to_string(), "05");
    }

    #[test]
    fn missing_column_is_reported() {
        let sample = "SETTLEMENT_DATE,SYSTEMENERGY\n2017-01-01,1000\n";
        match parse_system_demand(sample, 2017) {
            Err(LoadDataError::MissingColumn(c)) => assert_eq!(c, "PERIOD"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn out_of_range_period_is_rejected() {
        let sample = "SETTLEMENT_DATE,PERIOD,SYSTEMENERGY\n2017-01-01,24,1000\n";
        assert!(matches!(
            parse_system_demand(sample, 2017),
            Err(LoadDataError::InvalidValue(_))
        ));
    }

    #[test]
    fn year_without_rows_is_an_error() {
        assert!(matches!(
            parse_system_demand(SAMPLE, 2019),
            Err(LoadDataError::NoDataForYear(2019))
        ));
    }

    #[test]
    fn rows_are_sorted_by_timestamp() {
        let sample = "\
SETTLEMENT_DATE,PERIOD,SYSTEMENERGY
2017-01-01,2,3
2017-01-01,0,1
2017-01-01,1,2
";
        let series = parse_system_demand(sample, 2017).unwrap();
        assert_eq!(series.values_mw, vec![1.0, 2.0, 3.0]);
    }
}
