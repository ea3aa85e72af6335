//! Normalized target schema.
//!
//! Six reference/fact tables and two junction tables. The schema is always
//! built from scratch: the previous store file is removed, or the tables are
//! dropped when reusing a connection.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

pub struct Table {
    pub name: &'static str,
    pub schema: &'static str,
}

const ERAS: Table = Table {
    name: "Eras",
    schema: "CREATE TABLE Eras (
        era_id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT UNIQUE
    )",
};

const ALBUMS: Table = Table {
    name: "Albums",
    schema: "CREATE TABLE Albums (
        album_id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT,
        url TEXT,
        era_id INTEGER,
        FOREIGN KEY (era_id) REFERENCES Eras(era_id)
    )",
};

const PEOPLE: Table = Table {
    name: "People",
    schema: "CREATE TABLE People (
        person_id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT UNIQUE
    )",
};

const ROLES: Table = Table {
    name: "Roles",
    schema: "CREATE TABLE Roles (
        role_id INTEGER PRIMARY KEY AUTOINCREMENT,
        role_name TEXT UNIQUE
    )",
};

const TAGS: Table = Table {
    name: "Tags",
    schema: "CREATE TABLE Tags (
        tag_id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT UNIQUE
    )",
};

const SONGS: Table = Table {
    name: "Songs",
    schema: "CREATE TABLE Songs (
        song_id INTEGER PRIMARY KEY AUTOINCREMENT,
        album_id INTEGER,
        title TEXT,
        track_number INTEGER,
        url TEXT,
        release_date TEXT,
        page_views INTEGER,
        lyrics TEXT,
        FOREIGN KEY (album_id) REFERENCES Albums(album_id)
    )",
};

/// Who did what on a song
const SONG_PEOPLE: Table = Table {
    name: "Song_People",
    schema: "CREATE TABLE Song_People (
        song_id INTEGER,
        person_id INTEGER,
        role_id INTEGER,
        PRIMARY KEY (song_id, person_id, role_id),
        FOREIGN KEY (song_id) REFERENCES Songs(song_id),
        FOREIGN KEY (person_id) REFERENCES People(person_id),
        FOREIGN KEY (role_id) REFERENCES Roles(role_id)
    )",
};

const SONG_TAGS: Table = Table {
    name: "Song_Tags",
    schema: "CREATE TABLE Song_Tags (
        song_id INTEGER,
        tag_id INTEGER,
        PRIMARY KEY (song_id, tag_id),
        FOREIGN KEY (song_id) REFERENCES Songs(song_id),
        FOREIGN KEY (tag_id) REFERENCES Tags(tag_id)
    )",
};

/// All tables in creation order (referenced tables first).
pub const TABLES: &[Table] = &[ERAS, ALBUMS, PEOPLE, ROLES, TAGS, SONGS, SONG_PEOPLE, SONG_TAGS];

/// Drop every table (dependents first) and create the schema again.
pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    for table in TABLES.iter().rev() {
        conn.execute_batch(&format!("DROP TABLE IF EXISTS {};", table.name))
            .with_context(|| format!("Failed to drop table {}", table.name))?;
    }
    for table in TABLES {
        conn.execute_batch(table.schema)
            .with_context(|| format!("Failed to create table {}", table.name))?;
    }
    Ok(())
}

/// Remove any previous store at `path` and open a new one with the schema in place.
pub fn open_fresh_store(path: &Path) -> Result<Connection> {
    if path.exists() {
        println!("Removing existing output file: {:?}", path);
        std::fs::remove_file(path).context("Failed to remove existing output file")?;
    }

    let conn = Connection::open(path).context("Failed to create output database")?;
    conn.execute_batch(
        "PRAGMA synchronous = NORMAL;
         PRAGMA temp_store = MEMORY;",
    )?;
    create_schema(&conn)?;
    Ok(conn)
}

/// Row count per table, in creation order.
pub fn table_counts(conn: &Connection) -> Result<Vec<(&'static str, i64)>> {
    TABLES
        .iter()
        .map(|table| {
            let sql = format!("SELECT COUNT(*) FROM {}", table.name);
            let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
            Ok((table.name, count))
        })
        .collect()
}
