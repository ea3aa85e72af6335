//! Core data models for discography normalization.
//!
//! This module contains the source row shape, the decoded record the two
//! load passes share, the fixed role set and the run statistics.

use serde::{Deserialize, Serialize};

// ============================================================================
// Source Models
// ============================================================================

/// One raw row of the discography export.
///
/// Every field is optional: an empty cell (or a pandas-style NA marker, see
/// `source::clean_cell`) is `None`. Numeric columns stay as text; SQLite's
/// INTEGER affinity converts them on insert.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SongRow {
    pub category: Option<String>,
    pub album_title: Option<String>,
    pub album_url: Option<String>,
    pub song_title: Option<String>,
    pub album_track_number: Option<String>,
    pub song_url: Option<String>,
    pub song_release_date: Option<String>,
    pub song_page_views: Option<String>,
    pub song_lyrics: Option<String>,
    pub song_artists: Option<String>,
    pub song_writers: Option<String>,
    pub song_producers: Option<String>,
    pub song_tags: Option<String>,
}

/// A source row with its list cells decoded once.
///
/// Both the dimension pass and the fact pass read from this, so a malformed
/// cell is decoded (and counted) exactly once.
#[derive(Clone, Debug, Default)]
pub struct SongRecord {
    pub category: Option<String>,
    pub album_title: Option<String>,
    pub album_url: Option<String>,
    pub song_title: Option<String>,
    pub track_number: Option<String>,
    pub song_url: Option<String>,
    pub release_date: Option<String>,
    pub page_views: Option<String>,
    pub lyrics: Option<String>,
    pub artists: Vec<String>,
    pub writers: Vec<String>,
    pub producers: Vec<String>,
    pub tags: Vec<String>,
}

impl SongRecord {
    /// Names credited under `role`, untrimmed, in source order.
    pub fn credits(&self, role: Role) -> &[String] {
        match role {
            Role::Artist => &self.artists,
            Role::Writer => &self.writers,
            Role::Producer => &self.producers,
        }
    }
}

// ============================================================================
// Roles
// ============================================================================

/// The closed set of roles a person can hold on a song.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Artist,
    Writer,
    Producer,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Artist, Role::Writer, Role::Producer];

    /// Value stored in `Roles.role_name`
    pub fn name(self) -> &'static str {
        match self {
            Role::Artist => "Artist",
            Role::Writer => "Writer",
            Role::Producer => "Producer",
        }
    }

    pub fn from_name(name: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|r| r.name() == name)
    }
}

// ============================================================================
// Statistics (Instrumentation)
// ============================================================================

/// Per-run load statistics.
#[derive(Default, Debug, Clone, Serialize)]
pub struct LoadStats {
    // Row source
    pub rows_read: usize,
    pub malformed_cells: usize,

    // Dimension pass
    pub eras: usize,
    pub people: usize,
    pub tags: usize,
    pub roles: usize,

    // Fact pass
    pub albums: usize,
    pub album_cache_hits: usize,
    pub songs: usize,
    pub person_links: usize,
    pub tag_links: usize,
    pub duplicate_links: usize,
    pub unresolved_people: usize,
    pub unresolved_tags: usize,

    // Timing
    pub elapsed_seconds: f64,
}

impl LoadStats {
    /// Log stats to stderr in JSON format
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            eprintln!("[STATS:{}]\n{}", phase, json);
        }
    }

    /// Write stats to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn total_links(&self) -> usize {
        self.person_links + self.tag_links
    }
}
