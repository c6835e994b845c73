use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::score::Difficulty;

static SONG_DIR: Dir = include_dir!("src/songs");

#[derive(Debug, Error)]
pub enum SongError {
    #[error("failed to read song file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("song file {name} is not valid UTF-8")]
    NotUtf8 { name: String },
    #[error("failed to parse song {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One timed hand-sign cue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongEntry {
    #[serde(alias = "duration")]
    pub duration_ms: u64,
    pub prompt: String,
    #[serde(alias = "asl")]
    pub expected_sign: String,
    #[serde(default, alias = "lyrics")]
    pub lyric_fragment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    #[serde(alias = "var_name")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default, alias = "song_duration")]
    pub duration_ms: i64,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub entries: Vec<SongEntry>,
}

impl Song {
    /// Stand-in for a song that could not be found: no entries and no time,
    /// so a round built from it ends on its first tick.
    pub fn placeholder(id: &str) -> Self {
        Self {
            id: id.to_string(),
            title: id.to_string(),
            author: String::new(),
            duration_ms: 0,
            difficulty: Difficulty::default(),
            entries: Vec::new(),
        }
    }

    pub fn from_json(name: &str, json: &str) -> Result<Self, SongError> {
        serde_json::from_str(json).map_err(|source| SongError::Parse {
            name: name.to_string(),
            source,
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SongError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| SongError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&path.display().to_string(), &json)
    }

    /// Sum of all entry durations
    pub fn choreography_ms(&self) -> u64 {
        self.entries.iter().map(|e| e.duration_ms).sum()
    }
}

/// Read-only set of playable songs, keyed by id
#[derive(Debug, Clone, Default)]
pub struct SongLibrary {
    songs: Vec<Song>,
}

impl SongLibrary {
    /// Songs compiled into the binary, sorted by id
    pub fn bundled() -> Result<Self, SongError> {
        let mut songs = Vec::new();
        for file in SONG_DIR.files() {
            let name = file.path().display().to_string();
            if !name.ends_with(".json") {
                continue;
            }
            let json = file
                .contents_utf8()
                .ok_or_else(|| SongError::NotUtf8 { name: name.clone() })?;
            songs.push(Song::from_json(&name, json)?);
        }
        songs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(Self { songs })
    }

    pub fn get(&self, id: &str) -> Option<&Song> {
        self.songs.iter().find(|s| s.id == id)
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }
}
