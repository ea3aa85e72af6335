//! Row source: reads the tab-separated discography export.
//!
//! Rows are read whole into memory; the load runs two passes over them.

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::list_decoder::decode_list;
use crate::log_only;
use crate::models::{LoadStats, SongRecord, SongRow};

/// Columns the export must carry. Extra columns are ignored.
pub const REQUIRED_COLUMNS: [&str; 13] = [
    "category",
    "album_title",
    "album_url",
    "song_title",
    "album_track_number",
    "song_url",
    "song_release_date",
    "song_page_views",
    "song_lyrics",
    "song_artists",
    "song_writers",
    "song_producers",
    "song_tags",
];

/// Cell values that mean "missing", as pandas' `read_csv` treats them by default.
static MISSING_MARKERS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
        "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
    ]
    .into_iter()
    .collect()
});

/// Map missing-value markers to `None`, keep everything else verbatim.
pub fn clean_cell(cell: Option<String>) -> Option<String> {
    cell.filter(|v| !MISSING_MARKERS.contains(v.as_str()))
}

fn clean_row(row: SongRow) -> SongRow {
    SongRow {
        category: clean_cell(row.category),
        album_title: clean_cell(row.album_title),
        album_url: clean_cell(row.album_url),
        song_title: clean_cell(row.song_title),
        album_track_number: clean_cell(row.album_track_number),
        song_url: clean_cell(row.song_url),
        song_release_date: clean_cell(row.song_release_date),
        song_page_views: clean_cell(row.song_page_views),
        song_lyrics: clean_cell(row.song_lyrics),
        song_artists: clean_cell(row.song_artists),
        song_writers: clean_cell(row.song_writers),
        song_producers: clean_cell(row.song_producers),
        song_tags: clean_cell(row.song_tags),
    }
}

/// Read every row from a TSV stream with a header line.
pub fn read_rows<R: Read>(input: R) -> Result<Vec<SongRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let headers = reader.headers().context("Failed to read header line")?.clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        bail!("Input is missing required columns: {}", missing.join(", "));
    }

    let mut rows = Vec::new();
    for (index, result) in reader.deserialize::<SongRow>().enumerate() {
        // Line numbers are 1-based and the header takes line 1
        let row = result.with_context(|| format!("Failed to parse row at line {}", index + 2))?;
        rows.push(clean_row(row));
    }
    Ok(rows)
}

pub fn read_rows_from_path(path: &Path) -> Result<Vec<SongRow>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open input file {}", path.display()))?;
    read_rows(file)
}

/// Decode one list cell. A malformed cell counts as empty.
fn decode_cell(
    cell: Option<&str>,
    column: &str,
    line: usize,
    stats: &mut LoadStats,
    log_only: bool,
) -> Vec<String> {
    match decode_list(cell) {
        Ok(items) => items,
        Err(err) => {
            stats.malformed_cells += 1;
            log_only!(log_only, "[DECODE] line {} {}: {}", line, column, err);
            Vec::new()
        }
    }
}

/// Decode the list cells of every row once.
pub fn decode_records(
    rows: Vec<SongRow>,
    stats: &mut LoadStats,
    log_only: bool,
) -> Vec<SongRecord> {
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            let line = index + 2;
            let mut decode = |cell: &Option<String>, column: &str| {
                decode_cell(cell.as_deref(), column, line, stats, log_only)
            };
            let artists = decode(&row.song_artists, "song_artists");
            let writers = decode(&row.song_writers, "song_writers");
            let producers = decode(&row.song_producers, "song_producers");
            let tags = decode(&row.song_tags, "song_tags");

            SongRecord {
                category: row.category,
                album_title: row.album_title,
                album_url: row.album_url,
                song_title: row.song_title,
                track_number: row.album_track_number,
                song_url: row.song_url,
                release_date: row.song_release_date,
                page_views: row.song_page_views,
                lyrics: row.song_lyrics,
                artists,
                writers,
                producers,
                tags,
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const HEADER: &str = concat!(
        "category\talbum_title\talbum_url\tsong_title\talbum_track_number\tsong_url\t",
        "song_release_date\tsong_page_views\tsong_lyrics\tsong_artists\tsong_writers\t",
        "song_producers\tsong_tags",
    );

    /// Build a TSV line with the given cells in `REQUIRED_COLUMNS` order.
    pub(crate) fn tsv_line(cells: [&str; 13]) -> String {
        cells.join("\t")
    }

    #[test]
    fn test_read_rows_basic() {
        let input = format!(
            "{}\n{}\n",
            HEADER,
            tsv_line([
                "Fearless",
                "Fearless",
                "https://genius.com/albums/fearless",
                "Love Story",
                "3",
                "https://genius.com/love-story",
                "2008-09-12",
                "1000",
                "We were both young",
                "['Taylor Swift']",
                "['Taylor Swift']",
                "['Nathan Chapman', 'Taylor Swift']",
                "['Country', 'Pop']",
            ])
        );
        let rows = read_rows(input.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.album_title.as_deref(), Some("Fearless"));
        assert_eq!(row.album_track_number.as_deref(), Some("3"));
        assert_eq!(row.song_tags.as_deref(), Some("['Country', 'Pop']"));
    }

    #[test]
    fn test_empty_and_na_cells_are_missing() {
        let input = format!(
            "{}\n{}\n",
            HEADER,
            tsv_line(["NaN", "Lover", "", "ME!", "", "", "", "", "", "", "N/A", "null", ""])
        );
        let rows = read_rows(input.as_bytes()).unwrap();
        let row = &rows[0];
        assert_eq!(row.category, None);
        assert_eq!(row.album_title.as_deref(), Some("Lover"));
        assert_eq!(row.album_url, None);
        assert_eq!(row.song_writers, None);
        assert_eq!(row.song_producers, None);
        assert_eq!(row.song_tags, None);
    }

    #[test]
    fn test_extra_columns_ignored_and_order_free() {
        let header = format!("extra\t{}", HEADER);
        let line = format!("ignored\t{}", tsv_line(["Folklore"; 13]));
        let rows = read_rows(format!("{}\n{}\n", header, line).as_bytes()).unwrap();
        assert_eq!(rows[0].category.as_deref(), Some("Folklore"));
    }

    #[test]
    fn test_missing_columns_rejected() {
        let input = "category\talbum_title\nA\tB\n";
        let err = read_rows(input.as_bytes()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("missing required columns"));
        assert!(msg.contains("song_tags"));
        assert!(!msg.contains("album_title,"));
    }

    #[test]
    fn test_quoted_lyrics_with_tabs_and_newlines() {
        let input = format!(
            "{}\n{}\n",
            HEADER,
            tsv_line(["", "", "", "", "", "", "", "", "\"line one\nline\ttwo\"", "", "", "", ""])
        );
        let rows = read_rows(input.as_bytes()).unwrap();
        assert_eq!(rows[0].song_lyrics.as_deref(), Some("line one\nline\ttwo"));
    }

    #[test]
    fn test_decode_records_counts_malformed_cells() {
        let rows = vec![SongRow {
            song_artists: Some("['Taylor Swift', 'Ed Sheeran']".to_string()),
            song_writers: Some("['Taylor Swift'".to_string()),
            song_producers: None,
            song_tags: Some("not a list".to_string()),
            ..Default::default()
        }];
        let mut stats = LoadStats::default();
        let records = decode_records(rows, &mut stats, false);
        assert_eq!(records[0].artists, vec!["Taylor Swift", "Ed Sheeran"]);
        assert!(records[0].writers.is_empty());
        assert!(records[0].producers.is_empty());
        assert!(records[0].tags.is_empty());
        assert_eq!(stats.malformed_cells, 2);
    }
}
