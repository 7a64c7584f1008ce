//! Diagnostic CSV dump of a metrics table, one file per (region, ownership)
//! pair. Tooling for inspection, not part of the report contract; the
//! destination directory is always injected by the caller.

use super::metrics::{Metric, MetricsTable};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write metrics csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn metrics_csv_path(dir: &Path, region: &str, ownership: &str) -> PathBuf {
    dir.join(format!("{region} {ownership} metrics.csv"))
}

/// Writes the table with one row per period. Each metric contributes a value
/// column and a YoY companion column; undefined cells stay blank.
pub fn write_metrics_csv<W: Write>(table: &MetricsTable, writer: W) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec!["Period".to_string()];
    for metric in Metric::ordered() {
        header.push(metric.label().to_string());
        header.push(format!("{} YoY % Change", metric.label()));
    }
    csv_writer.write_record(&header)?;

    for period in table.periods() {
        let mut line = vec![period.label()];
        for metric in Metric::ordered() {
            line.push(cell(table.value(period, metric)));
            line.push(cell(table.yoy(period, metric)));
        }
        csv_writer.write_record(&line)?;
    }

    csv_writer.flush()?;
    Ok(())
}

fn cell(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{value}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::metrics::generate_metrics;

    #[test]
    fn empty_dataset_exports_blank_cells() {
        let table = generate_metrics(&[], 2022, None, None);
        let mut buffer = Vec::new();
        write_metrics_csv(&table, &mut buffer).expect("export succeeds");

        let text = String::from_utf8(buffer).expect("valid utf8");
        let mut lines = text.lines();
        let header = lines.next().expect("header row");
        assert!(header.starts_with("Period,Active Listings,Active Listings YoY % Change"));
        assert_eq!(lines.clone().count(), 26, "two annual plus 24 monthly rows");

        let first = lines.next().expect("first data row");
        assert!(first.starts_with("2022,"));
        assert!(
            first.split(',').skip(1).all(str::is_empty),
            "no listings means every cell is undefined"
        );
    }

    #[test]
    fn path_is_built_from_region_and_ownership() {
        let path = metrics_csv_path(Path::new("/tmp/out"), "Bethesda", "Condominiums");
        assert_eq!(
            path,
            Path::new("/tmp/out/Bethesda Condominiums metrics.csv")
        );
    }
}
