use crate::data::bar::PriceBar;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CsvRecord {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

//loads daily bars from a csv file with columns date,open,high,low,close,volume
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Vec<PriceBar>> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .context(format!("Failed to open CSV file: {:?}", path))?;

    let mut bars = Vec::new();

    for (index, result) in reader.deserialize().enumerate() {
        let record: CsvRecord =
            result.context(format!("Failed to parse CSV record at line {}", index + 2))?;

        //parse iso date (yyyy-mm-dd)
        let date = NaiveDate::parse_from_str(&record.date, "%Y-%m-%d").context(format!(
            "Failed to parse date '{}' at line {}",
            record.date,
            index + 2
        ))?;

        bars.push(PriceBar::new_unchecked(
            date,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        ));
    }

    //sort by date to ensure chronological order
    bars.sort_by(|a, b| a.date.cmp(&b.date));

    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_and_sorts_bars() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "date,open,high,low,close,volume").unwrap();
        writeln!(file, "2020-01-03,101,103,100,102,1200").unwrap();
        writeln!(file, "2020-01-02,100,102,99,101,1100").unwrap();
        file.flush().unwrap();

        let bars = load_csv(file.path()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
        assert_eq!(bars[1].close, 102.0);
    }

    #[test]
    fn bad_date_reports_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "date,open,high,low,close,volume").unwrap();
        writeln!(file, "not-a-date,100,102,99,101,1100").unwrap();
        file.flush().unwrap();

        let err = load_csv(file.path()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn missing_file_fails() {
        assert!(load_csv("/nonexistent/prices.csv").is_err());
    }
}
