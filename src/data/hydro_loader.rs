use std::fs::File;
use std::io::Read;

use chrono::{Datelike, NaiveDateTime};
use csv::ReaderBuilder;

#[derive(Debug)]
pub enum HydroLoadError {
    IoError(std::io::Error),
    CsvError(csv::Error),
    InvalidTimestamp(String),
    InvalidValue(String),
}

impl From<std::io::Error> for HydroLoadError {
    fn from(err: std::io::Error) -> Self {
        HydroLoadError::IoError(err)
    }
}

impl From<csv::Error> for HydroLoadError {
    fn from(err: csv::Error) -> Self {
        HydroLoadError::CsvError(err)
    }
}

impl std::fmt::Display for HydroLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HydroLoadError::IoError(e) => write!(f, "IO error: {}", e),
            HydroLoadError::CsvError(e) => write!(f, "CSV error: {}", e),
            HydroLoadError::InvalidTimestamp(s) => write!(f, "Invalid timestamp: {}", s),
            HydroLoadError::InvalidValue(s) => write!(f, "Invalid value: {}", s),
        }
    }
}

impl std::error::Error for HydroLoadError {}

/// Natural hydro inflow in MW, one column per country code.
#[derive(Debug, Clone)]
pub struct InflowTable {
    pub timestamps: Vec<NaiveDateTime>,
    pub countries: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl InflowTable {
    pub fn column(&self, country: &str) -> Option<Vec<f64>> {
        let idx = self.countries.iter().position(|c| c == country)?;
        Some(self.rows.iter().map(|row| row[idx]).collect())
    }

    /// Inflow for one country aligned to the given snapshots, zero where the
    /// data has gaps.
    pub fn aligned_column(&self, country: &str, snapshots: &[NaiveDateTime]) -> Vec<f64> {
        match self.column(country) {
            Some(values) => snapshots
                .iter()
                .map(|t| {
                    self.timestamps
                        .binary_search(t)
                        .map(|i| values[i])
                        .unwrap_or(0.0)
                })
                .collect(),
            None => vec![0.0; snapshots.len()],
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M"))
        .ok()
}

pub fn load_hydro_inflow(
    path: &str,
    historical_year: i32,
) -> Result<InflowTable, HydroLoadError> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    parse_hydro_inflow(&contents, historical_year)
}

pub fn parse_hydro_inflow(
    contents: &str,
    historical_year: i32,
) -> Result<InflowTable, HydroLoadError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(contents.as_bytes());

    let headers = reader.headers()?.clone();
    let countries: Vec<String> = headers.iter().skip(1).map(|h| h.to_string()).collect();

    let mut timestamps = Vec::new();
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let raw_ts = record.get(0).unwrap_or("");
        let timestamp = parse_timestamp(raw_ts)
            .ok_or_else(|| HydroLoadError::InvalidTimestamp(raw_ts.to_string()))?;
        if timestamp.year() != historical_year {
            continue;
        }
        let mut values = Vec::with_capacity(countries.len());
        for i in 0..countries.len() {
            let raw = record.get(i + 1).unwrap_or("");
            let value: f64 = raw
                .trim()
                .parse()
                .map_err(|_| HydroLoadError::InvalidValue(format!("inflow {}", raw)))?;
            values.push(value.max(0.0));
        }
        timestamps.push(timestamp);
        rows.push(values);
    }

    Ok(InflowTable {
        timestamps,
        countries,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_country_columns() {
        let sample = "\
t,ZA,MZ
2017-01-01 00:00,120,800
2017-01-01 01:00,110,790
";
        let table = parse_hydro_inflow(sample, 2017).unwrap();
        assert_eq!(table.countries, vec!["ZA", "MZ"]);
        assert_eq!(table.column("ZA").unwrap(), vec![120.0, 110.0]);
        assert_eq!(table.column("MZ").unwrap(), vec![800.0, 790.0]);
    }

    #[test]
    fn negative_inflow_is_floored_at_zero() {
        let sample = "t,ZA\n2017-01-01 00:00,-5\n";
        let table = parse_hydro_inflow(sample, 2017).unwrap();
        assert_eq!(table.column("ZA").unwrap(), vec![0.0]);
    }

    #[test]
    fn other_years_are_skipped() {
        let sample = "t,ZA\n2015-06-01 00:00,50\n2017-01-01 00:00,60\n";
        let table = parse_hydro_inflow(sample, 2017).unwrap();
        assert_eq!(table.timestamps.len(), 1);
    }
}
