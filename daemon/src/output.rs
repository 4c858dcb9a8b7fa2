//! JSON result files.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::DaemonError;

pub fn weights_file_name(cycle: u64, token: &str) -> String {
    format!("rings_cycle_{cycle}_{token}_beets.json")
}

pub fn points_file_name(cycle: u64, token: &str) -> String {
    format!("rings_cycle_{cycle}_{token}_beets_points.json")
}

pub fn pool_weights_file_name(cycle: u64, token: &str) -> String {
    format!("rings_cycle_{cycle}_{token}_pool_weights.json")
}

/// Write `records` as a compact JSON array to `dir/file_name`.
///
/// The file is written next to its final path and renamed into place, so a
/// reader never sees a partial array.
pub fn write_records<T: Serialize>(
    dir: &Path,
    file_name: &str,
    records: &[T],
) -> Result<PathBuf, DaemonError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    let tmp = dir.join(format!(".{file_name}.tmp"));
    std::fs::write(&tmp, serde_json::to_vec(records)?)?;
    std::fs::rename(&tmp, &path)?;
    tracing::info!(path = %path.display(), records = records.len(), "file created");
    Ok(path)
}
