//! CSV export of cycle-length samples.

use crate::{CycleLengthSample, Result};
use std::fs::File;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    anchor_date: String,
    length: i64,
    is_outlier: bool,
}

impl From<&CycleLengthSample> for CsvRow {
    fn from(sample: &CycleLengthSample) -> Self {
        CsvRow {
            anchor_date: sample.anchor_date.to_string(),
            length: sample.length,
            is_outlier: sample.is_outlier,
        }
    }
}

/// Write samples to `csv_path`, replacing any existing file
///
/// The file is fsynced before returning. Returns the number of rows written.
pub fn export_cycle_samples(samples: &[CycleLengthSample], csv_path: &Path) -> Result<usize> {
    if let Some(parent) = csv_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(csv_path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(file);

    for sample in samples {
        writer.serialize(CsvRow::from(sample))?;
    }

    // Headers are only emitted with the first row
    if samples.is_empty() {
        writer.write_record(["anchor_date", "length", "is_outlier"])?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Exported {} cycle samples to {:?}", samples.len(), csv_path);
    Ok(samples.len())
}
