//! CSV file market data adapter.
//!
//! Expects one `<SYMBOL>.csv` per symbol under a base directory, with a
//! header row and `date,close` records in `%Y-%m-%d` format.

use crate::domain::error::MarketlabError;
use crate::domain::series::{PricePoint, PriceSeries};
use crate::ports::data_port::MarketDataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }

    fn read_all(&self, symbol: &str) -> Result<Vec<PricePoint>, MarketlabError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| MarketlabError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut points = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| MarketlabError::DataSource {
                reason: format!("CSV parse error: {e}"),
            })?;

            let date_str = record.get(0).ok_or_else(|| MarketlabError::DataSource {
                reason: "missing date column".into(),
            })?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                MarketlabError::DataSource {
                    reason: format!("invalid date format: {e}"),
                }
            })?;

            let close: f64 = record
                .get(1)
                .ok_or_else(|| MarketlabError::DataSource {
                    reason: "missing close column".into(),
                })?
                .parse()
                .map_err(|e| MarketlabError::DataSource {
                    reason: format!("invalid close value: {e}"),
                })?;

            points.push(PricePoint { date, close });
        }

        Ok(points)
    }
}

impl MarketDataPort for CsvAdapter {
    fn fetch_historical(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, MarketlabError> {
        let series = PriceSeries::new(self.read_all(symbol)?)?;
        Ok(series.window(start_date, end_date))
    }

    fn fetch_current_price(&self, symbol: &str) -> Result<f64, MarketlabError> {
        let points = self.read_all(symbol)?;
        points
            .last()
            .map(|p| p.close)
            .ok_or_else(|| MarketlabError::NoData {
                symbol: symbol.to_string(),
            })
    }

    fn list_symbols(&self) -> Result<Vec<String>, MarketlabError> {
        let mut symbols = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    symbols.push(stem.to_string());
                }
            }
        }
        symbols.sort();
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir, symbol: &str, rows: &[(&str, f64)]) {
        let path = dir.path().join(format!("{symbol}.csv"));
        let mut file = fs::File::create(path).unwrap();
        writeln!(file, "date,close").unwrap();
        for (date, close) in rows {
            writeln!(file, "{date},{close}").unwrap();
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn fetch_historical_filters_range() {
        let dir = TempDir::new().unwrap();
        write_csv(
            &dir,
            "RXRX",
            &[
                ("2024-01-02", 10.0),
                ("2024-01-03", 11.0),
                ("2024-01-04", 12.0),
                ("2024-01-05", 13.0),
            ],
        );
        let adapter = CsvAdapter::new(dir.path().to_path_buf());

        let series = adapter
            .fetch_historical("RXRX", date(2024, 1, 3), date(2024, 1, 4))
            .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.first().unwrap().close, 11.0);
    }

    #[test]
    fn fetch_historical_missing_file() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let err = adapter
            .fetch_historical("NOPE", date(2024, 1, 1), date(2024, 1, 31))
            .unwrap_err();
        assert!(matches!(err, MarketlabError::DataSource { .. }));
    }

    #[test]
    fn fetch_historical_empty_range_is_empty_series() {
        let dir = TempDir::new().unwrap();
        write_csv(&dir, "RXRX", &[("2024-01-02", 10.0)]);
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let series = adapter
            .fetch_historical("RXRX", date(2024, 2, 1), date(2024, 2, 28))
            .unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn fetch_historical_rejects_bad_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("BAD.csv");
        fs::write(&path, "date,close\nnot-a-date,10.0\n").unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        assert!(adapter
            .fetch_historical("BAD", date(2024, 1, 1), date(2024, 12, 31))
            .is_err());
    }

    #[test]
    fn fetch_historical_rejects_non_positive_close() {
        let dir = TempDir::new().unwrap();
        write_csv(
            &dir,
            "NEG",
            &[("2024-01-02", 100.0), ("2024-01-03", -10.0)],
        );
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        assert!(adapter
            .fetch_historical("NEG", date(2024, 1, 1), date(2024, 1, 31))
            .is_err());
    }

    #[test]
    fn current_price_is_last_close() {
        let dir = TempDir::new().unwrap();
        write_csv(&dir, "IONQ", &[("2024-01-02", 10.0), ("2024-01-03", 12.5)]);
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        assert_eq!(adapter.fetch_current_price("IONQ").unwrap(), 12.5);
    }

    #[test]
    fn current_price_empty_file_is_no_data() {
        let dir = TempDir::new().unwrap();
        write_csv(&dir, "EMPTY", &[]);
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        assert!(matches!(
            adapter.fetch_current_price("EMPTY").unwrap_err(),
            MarketlabError::NoData { .. }
        ));
    }

    #[test]
    fn list_symbols_sorted() {
        let dir = TempDir::new().unwrap();
        write_csv(&dir, "IONQ", &[("2024-01-02", 10.0)]);
        write_csv(&dir, "RXRX", &[("2024-01-02", 10.0)]);
        write_csv(&dir, "ACHR", &[("2024-01-02", 10.0)]);
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        assert_eq!(adapter.list_symbols().unwrap(), vec!["ACHR", "IONQ", "RXRX"]);
    }
}
