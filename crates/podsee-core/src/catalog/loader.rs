//! Dataset loading.
//!
//! The dataset is a workbook with a `centres` sheet and an `offerings`
//! sheet, exported as `centres.csv` and `offerings.csv` in one directory.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use super::Catalog;
use crate::models::{CentreRow, OfferingRow};

/// Centres sheet file name within the dataset directory
pub const CENTRES_SHEET: &str = "centres.csv";

/// Offerings sheet file name within the dataset directory
pub const OFFERINGS_SHEET: &str = "offerings.csv";

/// Read every row of a sheet. Rows that fail to parse are logged and skipped.
fn read_sheet<T: DeserializeOwned, R: Read>(reader: R, sheet: &str) -> Result<Vec<T>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    // Surface a missing or unreadable header row as an error
    csv_reader
        .headers()
        .with_context(|| format!("Failed to read header row of sheet: {}", sheet))?;

    let mut rows = Vec::new();
    for (line, record) in csv_reader.deserialize::<T>().enumerate() {
        match record {
            Ok(row) => rows.push(row),
            Err(e) => warn!(sheet, row = line + 2, error = %e, "Skipping malformed row"),
        }
    }
    Ok(rows)
}

impl Catalog {
    /// Load the catalog from a dataset directory.
    pub fn load(dir: &Path) -> Result<Self> {
        let centres_path = dir.join(CENTRES_SHEET);
        let offerings_path = dir.join(OFFERINGS_SHEET);

        let centres = std::fs::File::open(&centres_path)
            .with_context(|| format!("Failed to open {}", centres_path.display()))?;
        let offerings = std::fs::File::open(&offerings_path)
            .with_context(|| format!("Failed to open {}", offerings_path.display()))?;

        let catalog = Self::from_readers(centres, offerings)?;
        info!(dir = %dir.display(), centres = catalog.len(), "Loaded centre catalog");
        Ok(catalog)
    }

    /// Build the catalog from any pair of CSV sources.
    pub fn from_readers<C: Read, O: Read>(centres: C, offerings: O) -> Result<Self> {
        let centre_rows: Vec<CentreRow> = read_sheet(centres, "centres")?;
        let offering_rows: Vec<OfferingRow> = read_sheet(offerings, "offerings")?;
        Ok(Self::from_rows(centre_rows, offering_rows))
    }
}
