use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;

use chrono::{Datelike, NaiveDateTime, Timelike};
use csv::ReaderBuilder;

#[derive(Debug)]
pub enum RenewablesLoadError {
    IoError(std::io::Error),
    CsvError(csv::Error),
    MissingColumn(String),
    InvalidTimestamp(String),
    InvalidValue(String),
}

impl From<std::io::Error> for RenewablesLoadError {
    fn from(err: std::io::Error) -> Self {
        RenewablesLoadError::IoError(err)
    }
}

impl From<csv::Error> for RenewablesLoadError {
    fn from(err: csv::Error) -> Self {
        RenewablesLoadError::CsvError(err)
    }
}

impl std::fmt::Display for RenewablesLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenewablesLoadError::IoError(e) => write!(f, "IO error: {}", e),
            RenewablesLoadError::CsvError(e) => write!(f, "CSV error: {}", e),
            RenewablesLoadError::MissingColumn(c) => write!(f, "Missing column: {}", c),
            RenewablesLoadError::InvalidTimestamp(s) => write!(f, "Invalid timestamp: {}", s),
            RenewablesLoadError::InvalidValue(s) => write!(f, "Invalid value: {}", s),
        }
    }
}

impl std::error::Error for RenewablesLoadError {}

/// Available installation area per supply region.
#[derive(Debug, Clone)]
pub struct AreaRecord {
    pub region: String,
    pub available_area: f64,
}

/// Per-unit availability profiles, one column per supply region.
#[derive(Debug, Clone)]
pub struct ProfileTable {
    pub timestamps: Vec<NaiveDateTime>,
    pub regions: Vec<String>,
    /// Row-major values, one row per timestamp.
    pub rows: Vec<Vec<f64>>,
}

impl ProfileTable {
    pub fn column(&self, region: &str) -> Option<Vec<f64>> {
        let idx = self.regions.iter().position(|r| r == region)?;
        Some(self.rows.iter().map(|row| row[idx]).collect())
    }

    /// Series for one region aligned to the given snapshots; timestamps the
    /// profile does not cover are filled with zero availability.
    pub fn aligned_column(&self, region: &str, snapshots: &[NaiveDateTime]) -> Vec<f64> {
        // Timestamps are sorted, so each lookup can bisect.
        let column = self.column(region);
        match column {
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

/// Regions with a strictly positive available area.
pub fn load_available_areas(path: &str) -> Result<Vec<AreaRecord>, RenewablesLoadError> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    parse_available_areas(&contents)
}

pub fn parse_available_areas(contents: &str) -> Result<Vec<AreaRecord>, RenewablesLoadError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(contents.as_bytes());

    let mut areas = Vec::new();
    for result in reader.records() {
        let record = result?;
        let region = record
            .get(0)
            .ok_or_else(|| RenewablesLoadError::MissingColumn("region".to_string()))?
            .to_string();
        let raw_area = record.get(1).unwrap_or("");
        let available_area: f64 = raw_area
            .trim()
            .parse()
            .map_err(|_| RenewablesLoadError::InvalidValue(format!("area {}", raw_area)))?;
        if available_area > 0.0 {
            areas.push(AreaRecord {
                region,
                available_area,
            });
        }
    }
    Ok(areas)
}

fn parse_profile_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// Read an availability profile file, aggregate sub-hourly rows to hourly
/// means, restrict to the historical year and clip to the unit interval.
pub fn load_availability_profiles(
    path: &str,
    historical_year: i32,
) -> Result<ProfileTable, RenewablesLoadError> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    parse_availability_profiles(&contents, historical_year)
}

pub fn parse_availability_profiles(
    contents: &str,
    historical_year: i32,
) -> Result<ProfileTable, RenewablesLoadError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(contents.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.len() < 2 {
        return Err(RenewablesLoadError::MissingColumn(
            "profile columns".to_string(),
        ));
    }
    let regions: Vec<String> = headers.iter().skip(1).map(|h| h.to_string()).collect();

    // Aggregate into hour buckets; BTreeMap keeps the timestamps ordered.
    let mut buckets: BTreeMap<NaiveDateTime, (Vec<f64>, usize)> = BTreeMap::new();
    for result in reader.records() {
        let record = result?;
        let raw_ts = record.get(0).unwrap_or("");
        let timestamp = parse_profile_timestamp(raw_ts)
            .ok_or_else(|| RenewablesLoadError::InvalidTimestamp(raw_ts.to_string()))?;
        if timestamp.year() != historical_year {
            continue;
        }
        let hour = timestamp
            .with_minute(0)
            .and_then(|t| t.with_second(0))
            .unwrap_or(timestamp);

        let mut values = Vec::with_capacity(regions.len());
        for i in 0..regions.len() {
            let raw = record.get(i + 1).unwrap_or("");
            let value: f64 = raw
                .trim()
                .parse()
                .map_err(|_| RenewablesLoadError::InvalidValue(format!("profile {}", raw)))?;
            values.push(value);
        }

        let entry = buckets
            .entry(hour)
            .or_insert_with(|| (vec![0.0; regions.len()], 0));
        for (acc, v) in entry.0.iter_mut().zip(values) {
            *acc += v;
        }
        entry.1 += 1;
    }

    let mut timestamps = Vec::with_capacity(buckets.len());
    let mut rows = Vec::with_capacity(buckets.len());
    for (hour, (sums, count)) in buckets {
        timestamps.push(hour);
        rows.push(
            sums.into_iter()
                .map(|s| (s / count as f64).clamp(0.0, 1.0))
                .collect(),
        );
    }

    Ok(ProfileTable {
        timestamps,
        regions,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn drops_regions_without_area() {
        let sample = "region,available_area\nKAROO,120.5\nCOASTAL,0\nHIGHVELD,-3\n";
        let areas = parse_available_areas(sample).unwrap();
        assert_eq!(areas.len(), 1);
        assert_eq!(areas[0].region, "KAROO");
    }

    #[test]
    fn aggregates_half_hours_to_hourly_means() {
        let sample = "\
t,KAROO
2017-01-01 00:00,0.4
2017-01-01 00:30,0.6
2017-01-01 01:00,0.2
";
        let table = parse_availability_profiles(sample, 2017).unwrap();
        assert_eq!(table.timestamps.len(), 2);
        assert_eq!(table.column("KAROO").unwrap(), vec![0.5, 0.2]);
    }

    #[test]
    fn clips_to_unit_interval() {
        let sample = "t,KAROO\n2017-01-01 00:00,1.4\n2017-01-01 01:00,-0.2\n";
        let table = parse_availability_profiles(sample, 2017).unwrap();
        assert_eq!(table.column("KAROO").unwrap(), vec![1.0, 0.0]);
    }

    #[test]
    fn other_years_are_excluded() {
        let sample = "t,KAROO\n2016-12-31 23:00,0.5\n2017-01-01 00:00,0.7\n";
        let table = parse_availability_profiles(sample, 2017).unwrap();
        assert_eq!(table.timestamps.len(), 1);
    }

    #[test]
    fn aligned_column_zero_fills_missing_hours() {
        let sample = "t,KAROO\n2017-01-01 00:00,0.5\n";
        let table = parse_availability_profiles(sample, 2017).unwrap();
        let snapshots = vec![
            NaiveDate::from_ymd_opt(2017, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            NaiveDate::from_ymd_opt(2017, 1, 1)
                .unwrap()
                .and_hms_opt(1, 0, 0)
                .unwrap(),
        ];
        assert_eq!(table.aligned_column("KAROO", &snapshots), vec![0.5, 0.0]);
        assert_eq!(table.aligned_column("UNKNOWN", &snapshots), vec![0.0, 0.0]);
    }
}
