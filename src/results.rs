use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::app_dirs::AppDirs;
use crate::device::DeviceClass;

#[derive(Debug, Error)]
pub enum ResultsError {
    #[error("results log i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("results log csv: {0}")]
    Csv(#[from] csv::Error),
}

/// One finished round, as stored in the results log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub date: String,
    pub song_id: String,
    pub song_title: String,
    pub device: DeviceClass,
    pub score: u32,
}

impl RoundResult {
    pub fn new(song_id: &str, song_title: &str, device: DeviceClass, score: u32) -> Self {
        Self {
            date: Local::now().format("%c").to_string(),
            song_id: song_id.to_string(),
            song_title: song_title.to_string(),
            device,
            score,
        }
    }
}

/// Append-only CSV of finished rounds
#[derive(Debug, Clone)]
pub struct ResultsLog {
    path: PathBuf,
}

impl ResultsLog {
    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    /// The log in the user's state directory
    pub fn open_default() -> Option<Self> {
        AppDirs::results_path().map(Self::with_path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, result: &RoundResult) -> Result<(), ResultsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // a fresh file needs a header row
        let needs_header = !self.path.exists();

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(result)?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_all(&self) -> Result<Vec<RoundResult>, ResultsError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut results = Vec::new();
        for record in reader.deserialize() {
            results.push(record?);
        }
        Ok(results)
    }

    pub fn best_score(&self, song_id: &str) -> Result<Option<u32>, ResultsError> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|r| r.song_id == song_id)
            .map(|r| r.score)
            .max())
    }
}
