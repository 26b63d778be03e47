// Reports module - console tables and CSV files for breakeven and comparison runs

pub mod breakeven;
pub mod comparison;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tabled::{
    builder::Builder,
    settings::{object::Columns, Alignment, Style},
};
use tracing::info;

pub use breakeven::{breakeven_table, Projection};
pub use comparison::{
    comparison_table, failure_table, growth_table, performance_table, top_and_bottom,
    yearly_table,
};

/// Placeholder filling every cell of a separator row
pub const SEPARATOR: &str = "---";

/// Headers plus rows of display strings, rendered either as a console table
/// or as CSV.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// A row with `---` in every column
    pub fn push_separator(&mut self) {
        self.push_filled(SEPARATOR);
    }

    /// A row with `fill` in every column
    pub fn push_filled(&mut self, fill: &str) {
        self.rows.push(vec![fill.to_string(); self.headers.len()]);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Only the first `n` rows
    pub fn truncated(&self, n: usize) -> Self {
        Self {
            headers: self.headers.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Console rendering; every column but the first is right-aligned
    pub fn render(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.headers.clone());
        for row in &self.rows {
            builder.push_record(row.clone());
        }
        let mut table = builder.build();
        table.with(Style::modern());
        table.modify(Columns::new(1..), Alignment::right());
        table.to_string()
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        CsvReport::new(self).write(writer)
    }
}

/// One primary table followed by titled sections, separated by a blank row.
pub struct CsvReport<'a> {
    primary: &'a ReportTable,
    sections: Vec<(String, &'a ReportTable)>,
}

impl<'a> CsvReport<'a> {
    pub fn new(primary: &'a ReportTable) -> Self {
        Self {
            primary,
            sections: Vec::new(),
        }
    }

    pub fn section(mut self, title: impl Into<String>, table: &'a ReportTable) -> Self {
        self.sections.push((title.into(), table));
        self
    }

    pub fn write<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = WriterBuilder::new().flexible(true).from_writer(writer);
        write_table(&mut csv, self.primary)?;
        for (title, table) in &self.sections {
            csv.write_record(vec![""; self.primary.headers.len()])?;
            csv.write_record([title.as_str()])?;
            write_table(&mut csv, table)?;
        }
        csv.flush()?;
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        self.write(file)?;
        info!("Wrote report {}", path.display());
        Ok(())
    }
}

fn write_table<W: Write>(csv: &mut csv::Writer<W>, table: &ReportTable) -> Result<()> {
    csv.write_record(&table.headers)?;
    for row in &table.rows {
        csv.write_record(row)?;
    }
    Ok(())
}

/// `<prefix>_YYYYmmdd_HHMMSS.csv`
pub fn timestamped_filename(prefix: &str, now: NaiveDateTime) -> String {
    format!("{}_{}.csv", prefix, now.format("%Y%m%d_%H%M%S"))
}

/// Path for a timestamped report inside `dir`
pub fn report_path(dir: &Path, prefix: &str, now: NaiveDateTime) -> PathBuf {
    dir.join(timestamped_filename(prefix, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> ReportTable {
        let mut table = ReportTable::new(["Symbol", "Value"]);
        table.push_row(vec!["AAPL".to_string(), "$1,200.00".to_string()]);
        table.push_separator();
        table
    }

    #[test]
    fn test_render_contains_cells() {
        let rendered = sample().render();
        assert!(rendered.contains("Symbol"));
        assert!(rendered.contains("$1,200.00"));
        assert!(rendered.contains("---"));
    }

    #[test]
    fn test_csv_sections() {
        let primary = sample();
        let mut bench = ReportTable::new(["Symbol", "Percent Change"]);
        bench.push_row(vec!["SPY".to_string(), "20.00%".to_string()]);

        let mut out = Vec::new();
        CsvReport::new(&primary)
            .section("Benchmarks used: SPY", &bench)
            .write(&mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Symbol,Value");
        assert_eq!(lines[1], "AAPL,\"$1,200.00\"");
        assert_eq!(lines[2], "---,---");
        assert_eq!(lines[3], ",");
        assert_eq!(lines[4], "Benchmarks used: SPY");
        assert_eq!(lines[5], "Symbol,Percent Change");
    }

    #[test]
    fn test_timestamped_filename() {
        let now = NaiveDate::from_ymd_opt(2025, 5, 7)
            .unwrap()
            .and_hms_opt(14, 3, 9)
            .unwrap();
        assert_eq!(
            timestamped_filename("breakeven_output", now),
            "breakeven_output_20250507_140309.csv"
        );
    }

    #[test]
    fn test_truncated() {
        assert_eq!(sample().truncated(1).rows.len(), 1);
    }
}
