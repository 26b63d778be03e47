use csv::ReaderBuilder;
use chrono::NaiveDate;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::InputError;
use crate::models::Investment;
use crate::utils::parse_currency;

/// One row of a `Symbol, Date Invested, Amount Invested` file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvestmentRow {
    pub symbol: String,
    pub investment: Investment,
}

#[derive(Debug)]
struct ColumnMapping {
    symbol: usize,
    date: usize,
    amount: usize,
}

fn find_columns(headers: &csv::StringRecord) -> Result<ColumnMapping, InputError> {
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| InputError::Validation(format!("column '{}' not found", name)))
    };

    Ok(ColumnMapping {
        symbol: find("Symbol")?,
        date: find("Date Invested")?,
        amount: find("Amount Invested")?,
    })
}

/// Read an investments CSV.
///
/// Rows with an unparseable date are skipped with a warning; a bad amount on a
/// row with a valid date is an error naming the line.
pub fn parse_investments_csv<P: AsRef<Path>>(file_path: P) -> Result<Vec<InvestmentRow>, InputError> {
    let path = file_path.as_ref();
    if !path.exists() {
        return Err(InputError::FileNotFound(path.display().to_string()));
    }
    info!("Parsing investments CSV file: {:?}", path);

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| InputError::Validation(format!("failed to open CSV file: {}", e)))?;

    let headers = reader
        .headers()
        .map_err(|e| InputError::Validation(format!("failed to read CSV headers: {}", e)))?
        .clone();
    let columns = find_columns(&headers)?;
    debug!("Column mapping: {:?}", columns);

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // Header is line 1
        let line = idx + 2;
        let record = result.map_err(|e| InputError::Parse {
            line,
            message: e.to_string(),
        })?;

        let symbol = record.get(columns.symbol).unwrap_or("").trim().to_uppercase();
        if symbol.is_empty() {
            warn!("Skipping row {}: no symbol", line);
            continue;
        }

        let date_text = record.get(columns.date).unwrap_or("");
        let Ok(date) = NaiveDate::parse_from_str(date_text, "%Y-%m-%d") else {
            warn!("Skipping row {}: invalid date '{}'", line, date_text);
            continue;
        };

        let amount = parse_currency(record.get(columns.amount).unwrap_or("")).map_err(|e| {
            InputError::Parse {
                line,
                message: format!("invalid amount: {:#}", e),
            }
        })?;

        rows.push(InvestmentRow {
            symbol,
            investment: Investment::new(date, amount),
        });
    }

    info!("Parsed {} investments from CSV", rows.len());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_parse_investments() {
        let file = write_csv(
            "Symbol,Date Invested,Amount Invested\n\
             aapl,2023-05-01,\"1,000.00\"\n\
             MSFT , 2022-01-03 , 500\n",
        );
        let rows = parse_investments_csv(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].symbol, "AAPL");
        assert_eq!(rows[0].investment.amount, dec!(1000.00));
        assert_eq!(
            rows[1].investment.purchase_date,
            NaiveDate::from_ymd_opt(2022, 1, 3).unwrap()
        );
    }

    #[test]
    fn test_bad_dates_are_skipped() {
        let file = write_csv("Symbol,Date Invested,Amount Invested\nAAPL,yesterday,10\nKO,2024-02-01,20\n");
        let rows = parse_investments_csv(file.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].symbol, "KO");
    }

    #[test]
    fn test_bad_amount_names_line() {
        let file = write_csv("Symbol,Date Invested,Amount Invested\nKO,2024-02-01,lots\n");
        assert!(matches!(
            parse_investments_csv(file.path()),
            Err(InputError::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_missing_column() {
        let file = write_csv("Ticker,Date Invested,Amount Invested\nKO,2024-02-01,1\n");
        assert!(matches!(
            parse_investments_csv(file.path()),
            Err(InputError::Validation(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            parse_investments_csv("/no/such/investments.csv"),
            Err(InputError::FileNotFound(_))
        ));
    }
}
