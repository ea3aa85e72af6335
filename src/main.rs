use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use discography_normalize::pipeline::{run, LoadConfig};
use discography_normalize::progress::format_duration;

#[derive(Parser)]
#[command(name = "discography-normalize")]
#[command(about = "Load a flat discography TSV export into a normalized SQLite database")]
struct Args {
    #[arg(default_value = "ts_discography.tsv")]
    input: PathBuf,

    /// Output database, removed and rebuilt on every run
    #[arg(default_value = "taylor_swift.db")]
    output: PathBuf,

    /// Hide progress bars and print tail-friendly progress lines to stderr
    #[arg(long)]
    log_only: bool,

    /// Write run statistics as JSON to this path
    #[arg(long)]
    stats: Option<PathBuf>,

    /// Skip the final ANALYZE/VACUUM phase
    #[arg(long)]
    skip_optimize: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = LoadConfig {
        input: args.input,
        output: args.output,
        log_only: args.log_only,
        optimize: !args.skip_optimize,
    };

    let outcome = run(&config)?;
    let stats = &outcome.stats;

    if let Some(path) = &args.stats {
        stats
            .write_to_file(path)
            .with_context(|| format!("Failed to write stats to {}", path.display()))?;
    }

    let file_size = std::fs::metadata(&config.output)
        .with_context(|| format!("Failed to read metadata of {}", config.output.display()))?
        .len();

    println!("\n{:=<60}", "");
    println!("Success! Database {:?} created and populated.", config.output);
    for (table, count) in &outcome.table_counts {
        println!("  {:<12} {}", table, count);
    }
    if stats.malformed_cells > 0 || stats.unresolved_people > 0 || stats.unresolved_tags > 0 {
        println!(
            "  Skipped: {} malformed cells, {} unresolved people, {} unresolved tags",
            stats.malformed_cells, stats.unresolved_people, stats.unresolved_tags
        );
    }
    println!("  Output size: {:.2} MB", file_size as f64 / 1_048_576.0);
    println!(
        "  Elapsed: {}",
        format_duration(Duration::from_secs_f64(stats.elapsed_seconds))
    );
    println!("{:=<60}", "");

    Ok(())
}
