// P2P Testdata - Labeled 3-way match dataset generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # P2P Testdata
//!
//! Synthetic procure-to-pay document generator for training 3-way match
//! exception classifiers.
//!
//! The generator builds internally-consistent (purchase order, advance
//! ship notice, invoice) triplets in a minimal EDI-like wire format,
//! injects labeled discrepancies beyond per-supplier tolerance profiles,
//! and writes one JSON artifact with documents, links, labels and oracle
//! flags:
//!
//! - **Segment codec**: lex/extract the wire format (850/856/810)
//! - **Distribution extraction**: statistics from a reference corpus
//! - **Master data**: deterministic suppliers, buyers, items, contracts
//! - **Triplet generation**: consistent NORMAL baselines
//! - **Anomaly injection**: per-label mutations with reason codes,
//!   dollar impact, risk score and severity
//! - **Wire rendering**: envelope encoding with run-unique control numbers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use p2p_testdata::{parse_quotas, DatasetAssembler, Dist, GenConfig};
//!
//! let cfg = GenConfig::default();
//! let dist = Dist::defaults(&cfg);
//! let quotas = parse_quotas("NORMAL=100,SHORT_SHIP=20").unwrap();
//!
//! let dataset = DatasetAssembler::new(cfg, dist, 42).build(&quotas);
//! dataset.write_json(std::path::Path::new("gold/training_dataset_full.json")).unwrap();
//! ```
//!
//! Identical (seed, quotas, reference corpus) inputs reproduce the artifact
//! byte for byte; every clock read is anchored to
//! [`config::DEFAULT_ANCHOR_TIME_MS`].

pub mod anomalies;
pub mod codec;
pub mod config;
pub mod dataset;
pub mod distributions;
pub mod documents;
pub mod error;
pub mod generator;
pub mod master;
pub mod render;

// Re-exports for convenience
pub use anomalies::{AnomalyInjector, Label, LabelPayload, Severity};
pub use config::{GenConfig, ToleranceProfile};
pub use dataset::{parse_quotas, write_wire_files, DatasetAssembler, TrainingDataset};
pub use distributions::{extract_from_reference_dir, Dist};
pub use documents::{Asn, Invoice, PurchaseOrder, Triplet};
pub use error::{Result, TestdataError};
pub use generator::TripletGenerator;
pub use master::{build_master, MasterData};
pub use render::DocumentRenderer;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
