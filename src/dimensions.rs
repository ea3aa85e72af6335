//! Dimension pass: distinct eras, people and tags.
//!
//! Runs over every record before any fact row exists. Each distinct value is
//! inserted once, then the `name -> id` maps are read back into
//! [`DimensionLookups`], which stays read-only for the rest of the run.

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::models::{Role, SongRecord};

/// Distinct dimension values found in the source.
#[derive(Debug, Default)]
pub struct DimensionSet {
    pub eras: FxHashSet<String>,
    pub people: FxHashSet<String>,
    pub tags: FxHashSet<String>,
}

impl DimensionSet {
    /// Collect distinct values. Person and tag names are trimmed; eras are kept verbatim.
    pub fn collect(records: &[SongRecord]) -> Self {
        let mut set = DimensionSet::default();
        for record in records {
            if let Some(category) = &record.category {
                set.eras.insert(category.clone());
            }
            for role in Role::ALL {
                for name in record.credits(role) {
                    set.people.insert(name.trim().to_string());
                }
            }
            for tag in &record.tags {
                set.tags.insert(tag.trim().to_string());
            }
        }
        set
    }
}

/// Read-only surrogate key lookups for the fact pass.
#[derive(Debug, Default)]
pub struct DimensionLookups {
    eras: FxHashMap<String, i64>,
    people: FxHashMap<String, i64>,
    tags: FxHashMap<String, i64>,
    roles: FxHashMap<Role, i64>,
}

impl DimensionLookups {
    pub fn era_id(&self, name: &str) -> Option<i64> {
        self.eras.get(name).copied()
    }

    /// Looks up the trimmed name
    pub fn person_id(&self, name: &str) -> Option<i64> {
        self.people.get(name.trim()).copied()
    }

    /// Looks up the trimmed tag
    pub fn tag_id(&self, name: &str) -> Option<i64> {
        self.tags.get(name.trim()).copied()
    }

    pub fn role_id(&self, role: Role) -> Option<i64> {
        self.roles.get(&role).copied()
    }

    pub fn era_count(&self) -> usize {
        self.eras.len()
    }

    pub fn person_count(&self) -> usize {
        self.people.len()
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    pub fn role_count(&self) -> usize {
        self.roles.len()
    }
}

/// Sorted for deterministic ids; nothing downstream depends on the order.
fn sorted(values: &FxHashSet<String>) -> Vec<&str> {
    let mut sorted: Vec<&str> = values.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted
}

fn insert_names(conn: &Connection, sql: &str, names: &[&str]) -> Result<()> {
    let mut stmt = conn.prepare_cached(sql)?;
    for name in names {
        stmt.execute(params![name])?;
    }
    Ok(())
}

/// Insert every dimension value with `INSERT OR IGNORE`. Re-running is a no-op.
pub fn insert_dimensions(conn: &Connection, set: &DimensionSet) -> Result<()> {
    insert_names(conn, "INSERT OR IGNORE INTO Eras (name) VALUES (?1)", &sorted(&set.eras))
        .context("Failed to insert eras")?;

    let roles: Vec<&str> = Role::ALL.iter().map(|r| r.name()).collect();
    insert_names(conn, "INSERT OR IGNORE INTO Roles (role_name) VALUES (?1)", &roles)
        .context("Failed to insert roles")?;

    insert_names(conn, "INSERT OR IGNORE INTO People (name) VALUES (?1)", &sorted(&set.people))
        .context("Failed to insert people")?;

    insert_names(conn, "INSERT OR IGNORE INTO Tags (name) VALUES (?1)", &sorted(&set.tags))
        .context("Failed to insert tags")?;

    Ok(())
}

fn load_map(conn: &Connection, sql: &str) -> Result<FxHashMap<String, i64>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
    let mut map = FxHashMap::default();
    for row in rows {
        let (name, id) = row?;
        map.insert(name, id);
    }
    Ok(map)
}

/// Build lookups from what is stored, not from what was inserted.
pub fn load_lookups(conn: &Connection) -> Result<DimensionLookups> {
    let eras = load_map(conn, "SELECT name, era_id FROM Eras WHERE name IS NOT NULL")?;
    let people = load_map(conn, "SELECT name, person_id FROM People WHERE name IS NOT NULL")?;
    let tags = load_map(conn, "SELECT name, tag_id FROM Tags WHERE name IS NOT NULL")?;
    let roles = load_map(conn, "SELECT role_name, role_id FROM Roles WHERE role_name IS NOT NULL")?
        .into_iter()
        .filter_map(|(name, id)| Role::from_name(&name).map(|role| (role, id)))
        .collect();

    Ok(DimensionLookups {
        eras,
        people,
        tags,
        roles,
    })
}

/// Collect, insert and read back all dimensions.
pub fn resolve_dimensions(conn: &Connection, records: &[SongRecord]) -> Result<DimensionLookups> {
    let set = DimensionSet::collect(records);
    insert_dimensions(conn, &set)?;
    load_lookups(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::create_schema;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn sample_records() -> Vec<SongRecord> {
        vec![
            SongRecord {
                category: Some("Fearless".to_string()),
                artists: strings(&["Taylor Swift", " Colbie Caillat"]),
                writers: strings(&["Taylor Swift ", "Colbie Caillat"]),
                producers: strings(&["Nathan Chapman"]),
                tags: strings(&["Country", " Pop "]),
                ..Default::default()
            },
            SongRecord {
                category: Some("Fearless".to_string()),
                artists: strings(&["Taylor Swift"]),
                tags: strings(&["Pop"]),
                ..Default::default()
            },
            SongRecord {
                category: None,
                producers: strings(&["Jack Antonoff"]),
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_collect_trims_and_dedupes_across_columns() {
        let set = DimensionSet::collect(&sample_records());
        assert_eq!(set.eras.len(), 1);
        assert!(set.eras.contains("Fearless"));
        assert_eq!(set.people.len(), 4);
        assert!(set.people.contains("Colbie Caillat"));
        assert!(set.people.contains("Jack Antonoff"));
        assert_eq!(set.tags.len(), 2);
        assert!(set.tags.contains("Pop"));
    }

    #[test]
    fn test_resolve_dimensions_persists_each_value_once() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();

        let lookups = resolve_dimensions(&conn, &sample_records()).unwrap();
        assert_eq!(lookups.era_count(), 1);
        assert_eq!(lookups.person_count(), 4);
        assert_eq!(lookups.tag_count(), 2);
        assert_eq!(lookups.role_count(), 3);

        let people: i64 = conn.query_row("SELECT COUNT(*) FROM People", [], |r| r.get(0)).unwrap();
        assert_eq!(people, 4);
    }

    #[test]
    fn test_insert_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();

        let first = resolve_dimensions(&conn, &sample_records()).unwrap();
        let second = resolve_dimensions(&conn, &sample_records()).unwrap();

        assert_eq!(first.person_id("Taylor Swift"), second.person_id("Taylor Swift"));
        assert_eq!(first.role_id(Role::Producer), second.role_id(Role::Producer));
        let roles: i64 = conn.query_row("SELECT COUNT(*) FROM Roles", [], |r| r.get(0)).unwrap();
        assert_eq!(roles, 3);
    }

    #[test]
    fn test_lookups_trim_names() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();
        let lookups = resolve_dimensions(&conn, &sample_records()).unwrap();

        assert!(lookups.person_id("  Colbie Caillat ").is_some());
        assert_eq!(lookups.person_id(" Taylor Swift"), lookups.person_id("Taylor Swift"));
        assert!(lookups.tag_id(" Pop ").is_some());
        assert!(lookups.person_id("Max Martin").is_none());
        assert!(lookups.era_id("Red").is_none());
    }

    #[test]
    fn test_sorted_insertion_gives_deterministic_ids() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();
        let lookups = resolve_dimensions(&conn, &sample_records()).unwrap();

        // Alphabetical: Colbie Caillat, Jack Antonoff, Nathan Chapman, Taylor Swift
        assert_eq!(lookups.person_id("Colbie Caillat"), Some(1));
        assert_eq!(lookups.person_id("Taylor Swift"), Some(4));
        assert_eq!(lookups.role_id(Role::Artist), Some(1));
    }
}
