// P2P Testdata - Distribution extraction
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Quantity/price/line-count statistics estimated from a reference corpus.
//!
//! A directory of sample purchase orders parameterizes the synthetic
//! generator. Extraction never fails: unreadable files are skipped with a
//! warning and an empty corpus falls back to the configured defaults.

use crate::codec;
use crate::config::GenConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Extracted (or default) generation statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dist {
    pub avg_lines: usize,
    pub qty_mean: f64,
    pub qty_std: f64,
    pub price_mean: f64,
    pub price_std: f64,
}

impl Dist {
    /// Fallback statistics from configuration.
    pub fn defaults(cfg: &GenConfig) -> Self {
        Self {
            avg_lines: cfg.avg_line_items,
            qty_mean: cfg.qty_mean,
            qty_std: cfg.qty_std,
            price_mean: cfg.price_mean,
            price_std: cfg.price_std,
        }
    }
}

// binary formats that are never wire documents
const SKIP_EXTENSIONS: [&str; 4] = ["pdf", "png", "jpg", "jpeg"];

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot read reference directory {}: {}", dir.display(), e);
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, out);
        } else {
            out.push(path);
        }
    }
}

fn skip_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SKIP_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn safe_positive(raw: &Option<String>) -> Option<f64> {
    raw.as_deref()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| *v > 0.0)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64], mean: f64) -> f64 {
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Estimate statistics from a directory of reference purchase orders.
///
/// Only 850 transactions contribute. Files that fail to parse are skipped;
/// a missing or empty corpus yields [`Dist::defaults`] with a warning.
pub fn extract_from_reference_dir(dir: &Path, cfg: &GenConfig) -> Dist {
    if !dir.exists() {
        warn!(
            "Reference dir not found: {}. Using default distributions.",
            dir.display()
        );
        return Dist::defaults(cfg);
    }

    let mut files = Vec::new();
    collect_files(dir, &mut files);
    files.sort();
    if files.is_empty() {
        warn!(
            "No reference files under: {}. Using default distributions.",
            dir.display()
        );
        return Dist::defaults(cfg);
    }

    let mut line_counts: Vec<f64> = Vec::new();
    let mut qtys: Vec<f64> = Vec::new();
    let mut prices: Vec<f64> = Vec::new();

    for file in &files {
        if skip_extension(file) {
            continue;
        }
        let content = match fs::read(file) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                warn!("Skipping unreadable reference file {}: {}", file.display(), e);
                continue;
            }
        };
        let segments = codec::parse_segments(&content);
        if codec::transaction_type(&segments) != Some("850") {
            continue;
        }
        let Some(po) = codec::extract_po(&segments) else {
            continue;
        };
        line_counts.push(po.line_items.len() as f64);
        for item in &po.line_items {
            if let Some(q) = safe_positive(&item.quantity) {
                qtys.push(q);
            }
            if let Some(p) = safe_positive(&item.unit_price) {
                prices.push(p);
            }
        }
    }

    if line_counts.is_empty() {
        warn!(
            "No parseable purchase orders under: {}. Using default distributions.",
            dir.display()
        );
        return Dist::defaults(cfg);
    }

    let avg_lines = mean(&line_counts).clamp(1.0, cfg.line_items_max as f64) as usize;

    let qty_mean = if qtys.is_empty() {
        cfg.qty_mean
    } else {
        mean(&qtys)
    };
    let qty_std = if qtys.is_empty() {
        cfg.qty_std
    } else {
        std_dev(&qtys, qty_mean)
    };
    let price_mean = if prices.is_empty() {
        cfg.price_mean
    } else {
        mean(&prices)
    };
    let price_std = if prices.is_empty() {
        cfg.price_std
    } else {
        std_dev(&prices, price_mean)
    };

    Dist {
        avg_lines,
        qty_mean: qty_mean.clamp(1.0, cfg.qty_max as f64),
        qty_std: qty_std.clamp(1.0, cfg.qty_max as f64),
        price_mean: price_mean.clamp(1.0, cfg.price_max),
        price_std: price_std.clamp(0.5, cfg.price_max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SAMPLE_850: &str = "ST*850*0001~BEG*00*SA*PO-REF-1*20250810~PO1*1*100*EA*10.00****SKU-10001~PO1*2*300*EA*30.00****SKU-20002~SE*5*0001~";

    #[test]
    fn test_defaults_from_config() {
        let cfg = GenConfig::default();
        let dist = Dist::defaults(&cfg);
        assert_eq!(dist.avg_lines, 6);
        assert_eq!(dist.qty_mean, 120.0);
    }

    #[test]
    fn test_missing_dir_falls_back() {
        let cfg = GenConfig::default();
        let dist = extract_from_reference_dir(Path::new("/no/such/dir"), &cfg);
        assert_eq!(dist, Dist::defaults(&cfg));
    }

    #[test]
    fn test_empty_dir_falls_back() {
        let cfg = GenConfig::default();
        let dir = tempfile::tempdir().unwrap();
        let dist = extract_from_reference_dir(dir.path(), &cfg);
        assert_eq!(dist, Dist::defaults(&cfg));
    }

    #[test]
    fn test_extracts_from_sample_corpus() {
        let cfg = GenConfig::default();
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("po1.850"), SAMPLE_850).unwrap();
        // non-850 and binary-extension files are ignored
        fs::write(dir.path().join("note.png"), "not a document").unwrap();
        fs::write(dir.path().join("asn.856"), "ST*856*0002~BSN*00*A*20250101*0000~").unwrap();

        let dist = extract_from_reference_dir(dir.path(), &cfg);
        assert_eq!(dist.avg_lines, 2);
        assert!((dist.qty_mean - 200.0).abs() < 1e-9);
        assert!((dist.price_mean - 20.0).abs() < 1e-9);
        // population std of {100, 300} is 100
        assert!((dist.qty_std - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_unparseable_numbers_are_skipped() {
        let cfg = GenConfig::default();
        let dir = tempfile::tempdir().unwrap();
        let doc = "ST*850*0001~BEG*00*SA*PO-REF-2*20250810~PO1*1*abc*EA*xyz****SKU-10001~SE*4*0001~";
        fs::write(dir.path().join("po.850"), doc).unwrap();

        let dist = extract_from_reference_dir(dir.path(), &cfg);
        // line count still observed, numeric fields fall back to defaults
        assert_eq!(dist.avg_lines, 1);
        assert_eq!(dist.qty_mean, cfg.qty_mean);
        assert_eq!(dist.price_mean, cfg.price_mean);
    }
}
