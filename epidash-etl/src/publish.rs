//! View snapshot publication
//!
//! Each aggregate view is exported as one flat CSV file named after the
//! view. The file is written to a temporary sibling and renamed into
//! place, so the dashboard never reads a half-written snapshot.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::EtlResult;

/// Write one view snapshot.
///
/// `headers` is the view's documented column order and is written even
/// when the view is empty; row structs must serialize their fields in the
/// same order.
pub fn write_snapshot<T: Serialize>(
    dir: &Path,
    view: &str,
    headers: &[&str],
    rows: &[T],
) -> EtlResult<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let final_path = dir.join(format!("{}.csv", view));
    let tmp_path = dir.join(format!(".{}.csv.tmp", view));

    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&tmp_path)?;
        writer.write_record(headers)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }

    std::fs::rename(&tmp_path, &final_path)?;

    info!(view = view, rows = rows.len(), path = %final_path.display(), "published snapshot");

    Ok(final_path)
}
