// P2P Testdata - CLI entry point
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # P2P Testdata CLI
//!
//! Generates a labeled 3-way match training dataset.
//!
//! ## Usage
//!
//! ```bash
//! # Default quotas, JSON artifact only
//! p2p-testdata --seed 42 --outdir data_full/gold
//!
//! # Custom quotas plus per-document wire-format files
//! p2p-testdata --quotas "NORMAL=100,SHORT_SHIP=20" --write-wire-format
//! ```

use clap::Parser;
use p2p_testdata::dataset::DATASET_FILE_NAME;
use p2p_testdata::{
    extract_from_reference_dir, parse_quotas, write_wire_files, DatasetAssembler, Dist, GenConfig,
};
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

const DEFAULT_QUOTAS: &str = "NORMAL=8000,THREE_WAY_QTY_MISMATCH=1200,THREE_WAY_PRICE_MISMATCH=1200,LATE_SHIPMENT=900,SHORT_SHIP=900,OVERBILL=900,CHARGES_ANOMALY=800,MISSING_DOC=600,DUPLICATE_DOC=500";

/// P2P Testdata - labeled 3-way match dataset generator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Random seed for reproducibility
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Directory of reference purchase orders for distribution extraction
    #[arg(long)]
    reference_dir: Option<PathBuf>,

    /// Per-label quotas, comma separated (LABEL=count)
    #[arg(long, default_value = DEFAULT_QUOTAS)]
    quotas: String,

    /// Output directory for the JSON dataset
    #[arg(long, default_value = "data_full/gold")]
    outdir: PathBuf,

    /// Also write every document as a wire-format file
    #[arg(long)]
    write_wire_format: bool,

    /// Directory for wire-format documents
    #[arg(long, default_value = "data_full/bronze")]
    wire_format_dir: PathBuf,

    /// Override the generation anchor timestamp (milliseconds since epoch)
    #[arg(long)]
    anchor_ms: Option<i64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("P2P Testdata v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(args) {
        error!("Generation failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> p2p_testdata::Result<()> {
    let mut cfg = GenConfig::default();
    if let Some(anchor_ms) = args.anchor_ms {
        cfg = cfg.with_anchor_time_ms(anchor_ms);
    }

    // fail fast on bad quota specs, before any generation
    let quotas = parse_quotas(&args.quotas)?;

    let dist = match &args.reference_dir {
        Some(dir) => extract_from_reference_dir(dir, &cfg),
        None => {
            info!("No reference directory given, using default distributions");
            Dist::defaults(&cfg)
        }
    };
    info!(
        "dist: avg_lines={} qty_mean={:.2} qty_std={:.2} price_mean={:.2} price_std={:.2}",
        dist.avg_lines, dist.qty_mean, dist.qty_std, dist.price_mean, dist.price_std
    );

    let assembler = DatasetAssembler::new(cfg, dist, args.seed);
    let dataset = assembler.build(&quotas);

    let out_path = args.outdir.join(DATASET_FILE_NAME);
    dataset.write_json(&out_path)?;
    info!("Wrote: {}", out_path.display());
    info!(
        "counts: pos={} asns={} invoices={} labels={}",
        dataset.pos.len(),
        dataset.asns.len(),
        dataset.invoices.len(),
        dataset.labels.len()
    );

    if args.write_wire_format {
        info!("Writing wire-format docs to: {}", args.wire_format_dir.display());
        write_wire_files(&dataset, &args.wire_format_dir)?;
        info!("Wire-format output done.");
    }

    Ok(())
}
