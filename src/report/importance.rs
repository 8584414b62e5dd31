//! Feature-importance table.

use crate::ensemble::FeatureImportance;
use crate::error::Result;
use std::io::Write;
use std::path::Path;

/// Writes `Feature, Importance` rows in the given order.
///
/// # Errors
///
/// Returns `Csv` or `Io` errors from the writer.
pub fn write_importances<W: Write>(importances: &[FeatureImportance], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["Feature", "Importance"])?;
    for imp in importances {
        wtr.write_record([imp.feature.clone(), imp.importance.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the importance table to `path`.
///
/// # Errors
///
/// See [`write_importances`].
pub fn save_importances<P: AsRef<Path>>(importances: &[FeatureImportance], path: P) -> Result<()> {
    write_importances(importances, std::fs::File::create(path)?)
}
