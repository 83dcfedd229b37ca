//! Writers for long-format correlation output.

use super::{COMMA, open_writer};
use crate::correlation::{CorrelationRecord, GROUND_TRUTH, PairedPredictions};
use crate::error::DeconError;
use std::path::Path;

/// Write `Method,Cell_type,Correlation` rows, one per record.
pub fn write_correlation_records<P: AsRef<Path>>(
    records: &[CorrelationRecord],
    path: P,
) -> anyhow::Result<()> {
    let mut writer = open_writer(path.as_ref(), COMMA)?;
    writer
        .write_record(["Method", "Cell_type", "Correlation"])
        .map_err(DeconError::from)?;

    for record in records {
        writer
            .write_record([
                record.method.as_str(),
                record.category.as_str(),
                record.correlation.to_string().as_str(),
            ])
            .map_err(DeconError::from)?;
    }

    writer.flush().map_err(DeconError::from)?;
    Ok(())
}

/// Write paired predictions with the header `Sample,<method>,Ground truth,Cell type`.
pub fn write_paired_predictions<P: AsRef<Path>>(
    paired: &PairedPredictions,
    path: P,
) -> anyhow::Result<()> {
    let mut writer = open_writer(path.as_ref(), COMMA)?;
    writer
        .write_record(["Sample", paired.method.as_str(), GROUND_TRUTH, "Cell type"])
        .map_err(DeconError::from)?;

    for row in &paired.rows {
        writer
            .write_record([
                row.sample.as_str(),
                row.estimate.to_string().as_str(),
                row.truth.to_string().as_str(),
                row.category.as_str(),
            ])
            .map_err(DeconError::from)?;
    }

    writer.flush().map_err(DeconError::from)?;
    Ok(())
}
