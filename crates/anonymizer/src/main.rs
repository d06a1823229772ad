//! Batch anonymizer - Main Entry Point
//!
//! Usage: `anonymize <input.json> <output.json> [config-file]`

use anonymizer::{init_logging, io, Anonymizer, AnonymizerConfig};
use anyhow::{bail, Context};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, Level};

fn main() -> anyhow::Result<()> {
    let level = std::env::var("ANONYMIZER_LOG")
        .ok()
        .and_then(|l| Level::from_str(&l).ok())
        .unwrap_or(Level::INFO);
    init_logging(level)?;

    let mut args = std::env::args().skip(1);
    let (Some(input), Some(output)) = (args.next(), args.next()) else {
        bail!("usage: anonymize <input.json> <output.json> [config-file]");
    };
    let config_path = args.next().map(PathBuf::from);

    info!("=== Anonymizer v{} ===", env!("CARGO_PKG_VERSION"));

    let config = AnonymizerConfig::load(config_path.as_deref())
        .context("loading configuration")?;
    let anonymizer = Anonymizer::new(config)?;

    let reader = BufReader::new(File::open(&input).with_context(|| format!("opening {input}"))?);
    let table = io::read_table(reader)?;
    let result = anonymizer.run_table(&table)?;

    let writer = BufWriter::new(File::create(&output).with_context(|| format!("creating {output}"))?);
    io::write_records(writer, &result.records)?;

    let report = &result.report;
    info!(
        "Wrote {} synthetic records from {} inputs in {} clusters to {}",
        report.synthetic_records,
        report.input_records,
        report.cluster_sizes.len(),
        output
    );
    if let Some(audit) = &report.audit {
        info!(
            "Target profile matches: {} source, {} released",
            audit.source_matches, audit.synthetic_matches
        );
    }

    Ok(())
}
