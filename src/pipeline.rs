//! End-to-end load: TSV export in, normalized SQLite store out.
//!
//! Phases run strictly in order. There are two commit points: after the
//! dimension tables, and after all fact and junction rows.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::PathBuf;
use std::time::Instant;

use crate::dimensions::resolve_dimensions;
use crate::facts::FactLoader;
use crate::log_only;
use crate::models::{LoadStats, SongRecord};
use crate::progress::{create_progress_bar, create_spinner, log_progress};
use crate::safety::validate_output_path;
use crate::schema::{open_fresh_store, table_counts};
use crate::source::{decode_records, read_rows_from_path};

/// Log a fact-pass progress line every this many rows (log-only mode)
const LOG_INTERVAL: u64 = 500;

#[derive(Debug, Clone)]
pub struct LoadConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub log_only: bool,
    pub optimize: bool,
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub stats: LoadStats,
    pub table_counts: Vec<(&'static str, i64)>,
}

/// Run the whole load.
pub fn run(config: &LoadConfig) -> Result<LoadOutcome> {
    let start = Instant::now();
    let log_only = config.log_only;

    // Safety check: the store is deleted before it is rebuilt
    validate_output_path(&config.output, &[config.input.as_path()])?;

    let mut stats = LoadStats::default();

    println!("Phase 1: Reading {:?}", config.input);
    let spinner = create_spinner("Phase 1: Reading rows", log_only);
    let rows = read_rows_from_path(&config.input)?;
    stats.rows_read = rows.len();
    let records = decode_records(rows, &mut stats, log_only);
    spinner.finish_with_message(format!("Phase 1: Read {} rows", records.len()));
    if stats.malformed_cells > 0 {
        println!("  {} malformed list cells treated as empty", stats.malformed_cells);
    }

    println!("Phase 2: Creating output database: {:?}", config.output);
    let mut conn = open_fresh_store(&config.output)?;

    load_records(&mut conn, &records, &mut stats, log_only)?;

    if config.optimize {
        optimize_database(&conn, log_only)?;
    }

    let counts = table_counts(&conn)?;
    stats.elapsed_seconds = start.elapsed().as_secs_f64();
    if log_only {
        stats.log_phase("FINAL");
    }

    Ok(LoadOutcome {
        stats,
        table_counts: counts,
    })
}

/// Dimension pass, commit, fact pass, commit.
pub fn load_records(
    conn: &mut Connection,
    records: &[SongRecord],
    stats: &mut LoadStats,
    log_only: bool,
) -> Result<()> {
    println!("Phase 3: Inserting reference data (eras, people, roles, tags)...");
    let tx = conn.transaction()?;
    let lookups = resolve_dimensions(&tx, records)?;
    tx.commit().context("Failed to commit reference data")?;

    stats.eras = lookups.era_count();
    stats.people = lookups.person_count();
    stats.tags = lookups.tag_count();
    stats.roles = lookups.role_count();
    println!(
        "  {} eras, {} people, {} tags, {} roles",
        stats.eras, stats.people, stats.tags, stats.roles
    );
    log_only!(
        log_only,
        "[DIMENSIONS] eras={} people={} tags={} roles={}",
        stats.eras,
        stats.people,
        stats.tags,
        stats.roles
    );

    println!("Phase 4: Inserting songs and relationships...");
    let total = records.len() as u64;
    let pb = create_progress_bar(total, "Phase 4: Loading songs", log_only);
    let tx = conn.transaction()?;
    let mut loader = FactLoader::new(&lookups);
    for (index, record) in records.iter().enumerate() {
        loader.load_record(&tx, record, stats)?;
        pb.inc(1);
        log_progress("FACTS", index as u64 + 1, total, LOG_INTERVAL, log_only);
    }
    tx.commit().context("Failed to commit songs")?;
    pb.finish_with_message(format!("Phase 4: Loaded {} songs", stats.songs));

    println!(
        "  {} albums, {} songs, {} links ({} duplicates ignored)",
        stats.albums,
        stats.songs,
        stats.total_links(),
        stats.duplicate_links
    );
    Ok(())
}

fn optimize_database(conn: &Connection, log_only: bool) -> Result<()> {
    let spinner = create_spinner("Phase 5: Optimizing database", log_only);

    conn.execute_batch("ANALYZE; VACUUM;")?;

    spinner.finish_with_message("Phase 5: Database optimized");
    Ok(())
}
