//! Fact pass: albums, songs and the two junction tables.
//!
//! Each record goes through `resolve album -> insert song -> person links ->
//! tag links`. Albums are deduplicated by title only, within one loader.

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use rustc_hash::FxHashMap;

use crate::dimensions::DimensionLookups;
use crate::models::{LoadStats, Role, SongRecord};

/// Loads fact rows against a fixed set of dimension lookups.
///
/// The album cache lives here, so two loaders never share album ids.
pub struct FactLoader<'a> {
    lookups: &'a DimensionLookups,
    /// Album title -> album_id. A missing title is its own key.
    albums: FxHashMap<Option<String>, i64>,
}

impl<'a> FactLoader<'a> {
    pub fn new(lookups: &'a DimensionLookups) -> Self {
        Self {
            lookups,
            albums: FxHashMap::default(),
        }
    }

    /// Number of distinct albums created so far.
    pub fn album_count(&self) -> usize {
        self.albums.len()
    }

    /// Load one record. Returns the new song_id.
    pub fn load_record(
        &mut self,
        conn: &Connection,
        record: &SongRecord,
        stats: &mut LoadStats,
    ) -> Result<i64> {
        let album_id = self.resolve_album(conn, record, stats)?;
        let song_id = insert_song(conn, album_id, record)?;
        stats.songs += 1;

        for role in Role::ALL {
            self.insert_person_links(conn, song_id, role, record.credits(role), stats)?;
        }
        self.insert_tag_links(conn, song_id, &record.tags, stats)?;

        Ok(song_id)
    }

    fn resolve_album(
        &mut self,
        conn: &Connection,
        record: &SongRecord,
        stats: &mut LoadStats,
    ) -> Result<i64> {
        if let Some(&album_id) = self.albums.get(&record.album_title) {
            stats.album_cache_hits += 1;
            return Ok(album_id);
        }

        let era_id = record
            .category
            .as_deref()
            .and_then(|category| self.lookups.era_id(category));

        let mut stmt =
            conn.prepare_cached("INSERT INTO Albums (title, url, era_id) VALUES (?1, ?2, ?3)")?;
        stmt.execute(params![record.album_title, record.album_url, era_id])
            .with_context(|| format!("Failed to insert album {:?}", record.album_title))?;
        let album_id = conn.last_insert_rowid();

        self.albums.insert(record.album_title.clone(), album_id);
        stats.albums += 1;
        Ok(album_id)
    }

    fn insert_person_links(
        &self,
        conn: &Connection,
        song_id: i64,
        role: Role,
        names: &[String],
        stats: &mut LoadStats,
    ) -> Result<()> {
        let Some(role_id) = self.lookups.role_id(role) else {
            stats.unresolved_people += names.len();
            return Ok(());
        };

        let mut stmt = conn.prepare_cached(
            "INSERT OR IGNORE INTO Song_People (song_id, person_id, role_id) VALUES (?1, ?2, ?3)",
        )?;
        for name in names {
            let Some(person_id) = self.lookups.person_id(name) else {
                stats.unresolved_people += 1;
                continue;
            };
            match stmt.execute(params![song_id, person_id, role_id])? {
                0 => stats.duplicate_links += 1,
                _ => stats.person_links += 1,
            }
        }
        Ok(())
    }

    fn insert_tag_links(
        &self,
        conn: &Connection,
        song_id: i64,
        tags: &[String],
        stats: &mut LoadStats,
    ) -> Result<()> {
        let mut stmt = conn
            .prepare_cached("INSERT OR IGNORE INTO Song_Tags (song_id, tag_id) VALUES (?1, ?2)")?;
        for tag in tags {
            let Some(tag_id) = self.lookups.tag_id(tag) else {
                stats.unresolved_tags += 1;
                continue;
            };
            match stmt.execute(params![song_id, tag_id])? {
                0 => stats.duplicate_links += 1,
                _ => stats.tag_links += 1,
            }
        }
        Ok(())
    }
}

/// Scalar fields go in verbatim; numeric text is left to INTEGER affinity.
fn insert_song(conn: &Connection, album_id: i64, record: &SongRecord) -> Result<i64> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO Songs (album_id, title, track_number, url, release_date, page_views, lyrics)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    stmt.execute(params![
        album_id,
        record.song_title,
        record.track_number,
        record.song_url,
        record.release_date,
        record.page_views,
        record.lyrics,
    ])
    .with_context(|| format!("Failed to insert song {:?}", record.song_title))?;
    Ok(conn.last_insert_rowid())
}
