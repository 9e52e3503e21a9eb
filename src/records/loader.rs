//! Data Loader
//!
//! Loads the per-system CSV files from a data directory. Every file named
//! `system_<id>.csv` becomes the record set for system `<id>`, so a fourth
//! source system is a new file plus a catalog edit, never a code change.

use crate::error::Result;
use crate::records::csv_connector::parse_csv;
use crate::records::record::RecordSet;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// All loaded record sets, keyed by source-system id.
pub type SystemData = BTreeMap<String, RecordSet>;

pub fn load_system_data(dir: &Path) -> Result<SystemData> {
    let mut data = SystemData::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if !is_csv {
            continue;
        }

        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        let Some(system_id) = stem.strip_prefix("system_") else {
            continue;
        };
        if system_id.is_empty() {
            continue;
        }

        let text = fs::read_to_string(&path)?;
        let set = parse_csv(system_id, &text)?;
        info!(
            "loaded {} records for system '{}' from {}",
            set.len(),
            system_id,
            path.display()
        );
        data.insert(system_id.to_string(), set);
    }

    if data.is_empty() {
        warn!("no system_<id>.csv files found in {}", dir.display());
    }

    Ok(data)
}
