//! On-disk persistence of regridding weights.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use wx_common::WxResult;

use crate::types::WeightKey;
use crate::weights::RegridWeights;

/// Directory of persisted weight files.
///
/// Files are named `weights_{method}_{nlat}x{nlon}_to_{nlat}x{nlon}.json`.
/// Each file records the full [`WeightKey`] it was built for; a file whose
/// key does not match the request is treated as stale.
#[derive(Debug, Clone)]
pub struct WeightStore {
    dir: PathBuf,
}

#[derive(Serialize, Deserialize)]
struct StoredWeights {
    key: WeightKey,
    weights: RegridWeights,
}

impl WeightStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File that holds (or would hold) the weights for `key`.
    pub fn path_for(&self, key: &WeightKey) -> PathBuf {
        let (sl, sn) = key.source.shape();
        let (tl, tn) = key.target.shape();
        self.dir.join(format!(
            "weights_{}_{}x{}_to_{}x{}.json",
            key.method, sl, sn, tl, tn
        ))
    }

    /// Load weights for `key` if a matching artifact exists.
    ///
    /// Missing, unreadable, mismatched or inconsistent files yield `None`.
    pub fn load(&self, key: &WeightKey) -> Option<RegridWeights> {
        let path = self.path_for(key);
        if !path.exists() {
            debug!(path = %path.display(), "No stored weights");
            return None;
        }

        let stored: StoredWeights = match File::open(&path)
            .map_err(|e| e.to_string())
            .and_then(|f| serde_json::from_reader(BufReader::new(f)).map_err(|e| e.to_string()))
        {
            Ok(stored) => stored,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable weight file, rebuilding");
                return None;
            }
        };

        if stored.key != *key {
            info!(path = %path.display(), "Stored weights were built for a different grid, rebuilding");
            return None;
        }

        if let Err(e) = stored.weights.validate() {
            warn!(path = %path.display(), error = %e, "Inconsistent weight file, rebuilding");
            return None;
        }

        info!(path = %path.display(), nnz = stored.weights.nnz(), "Reusing stored weights");
        Some(stored.weights)
    }

    /// Persist weights for `key`, replacing any existing file.
    pub fn save(&self, key: &WeightKey, weights: &RegridWeights) -> WxResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);

        let stored = StoredWeights {
            key: *key,
            weights: weights.clone(),
        };
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer(&mut writer, &stored)?;
        writer.flush()?;

        info!(path = %path.display(), nnz = weights.nnz(), "Saved weights");
        Ok(path)
    }
}
