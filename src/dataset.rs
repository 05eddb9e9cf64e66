// P2P Testdata - Dataset assembly
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Dataset assembly and artifact I/O.
//!
//! The assembler drives the full pipeline under a per-label quota map:
//! baseline triplets, anomaly injection, the duplicate-document resample
//! pass, cross-document links, oracle flags, and the JSON artifact.

use crate::anomalies::{severity_for_risk, AnomalyInjector, Label, LabelPayload};
use crate::config::GenConfig;
use crate::distributions::Dist;
use crate::documents::{doc_id, Asn, Invoice, PurchaseOrder};
use crate::error::{Result, TestdataError};
use crate::generator::TripletGenerator;
use crate::master::{build_master, MasterData};
use crate::render::DocumentRenderer;
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;
use xxhash_rust::xxh64::xxh64;

/// Name of the JSON artifact written under the output directory.
pub const DATASET_FILE_NAME: &str = "training_dataset_full.json";

/// Cross-document linkage for one purchase order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub po_number: String,
    pub po_id: String,
    pub asn_numbers: Vec<String>,
    pub invoice_numbers: Vec<String>,
}

/// Data-quality signals computed independently of the training label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleFlags {
    pub missing_asn: bool,
    pub missing_invoice: bool,
    pub po_signature: String,
    pub asn_count: usize,
    pub invoice_count: usize,
}

/// Oracle entry for one purchase order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleRecord {
    pub oracle_flags: OracleFlags,
    pub oracle_label_version: String,
}

/// The full dataset artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingDataset {
    pub mode: String,
    pub generator_version: String,
    pub seed: u64,
    pub dist: Dist,
    pub cfg: GenConfig,
    pub label_set: Vec<Label>,
    pub master_data: MasterData,

    // canonical documents
    pub pos: Vec<PurchaseOrder>,
    pub asns: Vec<Asn>,
    pub invoices: Vec<Invoice>,

    // linkage and labels
    pub links: Vec<LinkRecord>,
    pub labels: BTreeMap<String, LabelPayload>,
    pub oracle_flags: BTreeMap<String, OracleRecord>,
}

impl TrainingDataset {
    /// Write the artifact as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Number of PO records carrying the given final label.
    pub fn label_count(&self, label: Label) -> usize {
        self.labels.values().filter(|p| p.label == label).count()
    }
}

/// Parse a `LABEL=count,...` quota specification.
///
/// Every label in the fixed set is initialized to 0 when unspecified; an
/// unknown label name is a hard error raised before any generation.
pub fn parse_quotas(raw: &str) -> Result<BTreeMap<Label, usize>> {
    let mut quotas = BTreeMap::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (name, count) = part
            .split_once('=')
            .ok_or_else(|| TestdataError::InvalidQuota(part.to_string()))?;
        let label: Label = name.trim().parse()?;
        let count: usize = count
            .trim()
            .parse()
            .map_err(|_| TestdataError::InvalidQuota(part.to_string()))?;
        quotas.insert(label, count);
    }
    for label in Label::ALL {
        quotas.entry(label).or_insert(0);
    }
    Ok(quotas)
}

/// Orchestrates distribution stats, master data, triplet generation,
/// anomaly injection and artifact assembly for one run.
pub struct DatasetAssembler {
    cfg: GenConfig,
    seed: u64,
    dist: Dist,
}

impl DatasetAssembler {
    /// Create an assembler.
    pub fn new(cfg: GenConfig, dist: Dist, seed: u64) -> Self {
        Self { cfg, seed, dist }
    }

    /// Generate the dataset for the given quotas.
    pub fn build(&self, quotas: &BTreeMap<Label, usize>) -> TrainingDataset {
        let master = build_master(&self.dist, &self.cfg, self.seed);
        let gen = TripletGenerator::new(self.cfg.clone(), self.dist.clone(), master.clone());
        let injector = AnomalyInjector::new(self.cfg.clone());
        // the generation stream: second fixed reseed point of the run
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut pos: Vec<PurchaseOrder> = Vec::new();
        let mut asns: Vec<Asn> = Vec::new();
        let mut invoices: Vec<Invoice> = Vec::new();
        let mut links: Vec<LinkRecord> = Vec::new();
        let mut labels: BTreeMap<String, LabelPayload> = BTreeMap::new();

        // NORMAL triplets with both follower documents, eligible for the
        // duplicate-document pass
        let mut normal_pool: Vec<(String, Asn, Invoice)> = Vec::new();

        let mut index = 0usize;
        info!("Building triplets...");

        for (&label, &count) in quotas {
            if count == 0 || label == Label::DuplicateDoc {
                continue;
            }
            info!("{}: {}", label, count);

            for _ in 0..count {
                let mut triplet = gen.build_triplet(index, &mut rng);
                index += 1;

                // rare benign missingness only in the NORMAL class
                if label == Label::Normal {
                    if rng.gen::<f64>() < self.cfg.p_missing_asn {
                        triplet.asn = None;
                    }
                    if rng.gen::<f64>() < self.cfg.p_missing_invoice {
                        triplet.invoice = None;
                    }
                }

                let payload = injector.apply(&mut triplet, label, &mut rng);

                let po_number = triplet.po.po_number.clone();
                links.push(LinkRecord {
                    po_number: po_number.clone(),
                    po_id: triplet.po.po_id.clone(),
                    asn_numbers: triplet
                        .asn
                        .as_ref()
                        .map(|a| vec![a.asn_number.clone()])
                        .unwrap_or_default(),
                    invoice_numbers: triplet
                        .invoice
                        .as_ref()
                        .map(|v| vec![v.invoice_number.clone()])
                        .unwrap_or_default(),
                });
                labels.insert(po_number.clone(), payload);

                if label == Label::Normal {
                    if let (Some(asn), Some(invoice)) = (&triplet.asn, &triplet.invoice) {
                        normal_pool.push((po_number, asn.clone(), invoice.clone()));
                    }
                }

                pos.push(triplet.po);
                if let Some(asn) = triplet.asn {
                    asns.push(asn);
                }
                if let Some(invoice) = triplet.invoice {
                    invoices.push(invoice);
                }
            }
        }

        self.resample_duplicates(
            quotas.get(&Label::DuplicateDoc).copied().unwrap_or(0),
            &normal_pool,
            &mut asns,
            &mut invoices,
            &mut links,
            &mut labels,
            &mut rng,
        );

        let oracle_flags = build_oracle_flags(&pos, &asns, &invoices);

        TrainingDataset {
            mode: "optionB_po_asn_invoice_3way".to_string(),
            generator_version: "optionB_v1".to_string(),
            seed: self.seed,
            dist: self.dist.clone(),
            cfg: self.cfg.clone(),
            label_set: Label::ALL.to_vec(),
            master_data: master,
            pos,
            asns,
            invoices,
            links,
            labels,
            oracle_flags,
        }
    }

    /// Satisfy the DUPLICATE_DOC quota by cloning follower documents of
    /// already-accumulated NORMAL triplets.
    ///
    /// Sampling is without replacement, so the final DUPLICATE_DOC count is
    /// exact up to pool availability (and the NORMAL count shrinks by the
    /// same amount).
    #[allow(clippy::too_many_arguments)]
    fn resample_duplicates(
        &self,
        dup_n: usize,
        normal_pool: &[(String, Asn, Invoice)],
        asns: &mut Vec<Asn>,
        invoices: &mut Vec<Invoice>,
        links: &mut [LinkRecord],
        labels: &mut BTreeMap<String, LabelPayload>,
        rng: &mut StdRng,
    ) {
        if dup_n == 0 || normal_pool.is_empty() {
            return;
        }
        let amount = dup_n.min(normal_pool.len());
        info!("Adding duplicate-doc instances: {}", amount);

        let picks = rand::seq::index::sample(rng, normal_pool.len(), amount);
        for idx in picks.iter() {
            let (po_number, src_asn, src_invoice) = &normal_pool[idx];
            let link = links.iter_mut().find(|l| &l.po_number == po_number);
            let mut dup_asn_number = None;
            let mut dup_invoice_number = None;

            if rng.gen::<f64>() < 0.6 {
                let mut dup = src_asn.clone();
                dup.asn_number = format!("{}-D{}", src_asn.asn_number, rng.gen_range(10..=999));
                dup.asn_id = doc_id("asn", &dup.asn_number);
                dup_asn_number = Some(dup.asn_number.clone());
                asns.push(dup);
            }
            if rng.gen::<f64>() < 0.6 {
                let mut dup = src_invoice.clone();
                dup.invoice_number =
                    format!("{}-D{}", src_invoice.invoice_number, rng.gen_range(10..=999));
                dup.invoice_id = doc_id("inv", &dup.invoice_number);
                dup_invoice_number = Some(dup.invoice_number.clone());
                invoices.push(dup);
            }

            if let Some(link) = link {
                link.asn_numbers.extend(dup_asn_number);
                link.invoice_numbers.extend(dup_invoice_number);
            }

            if let Some(payload) = labels.get_mut(po_number) {
                payload.label = Label::DuplicateDoc;
                let code = "DUPLICATE_DOCUMENT_PATTERN".to_string();
                if !payload.reason_codes.contains(&code) {
                    payload.reason_codes.push(code);
                }
                payload.owner_team = "OPERATIONS".to_string();
                payload.recommended_action = "DEDUPE_AND_CONFIRM_VALID_DOC".to_string();
                payload.risk_score = (payload.risk_score + 0.10).clamp(0.0, 1.0);
                payload.severity = severity_for_risk(payload.risk_score, &self.cfg);
            }
        }
    }
}

/// Build oracle flags per purchase order.
///
/// These are presence/signature signals for auditing, not training labels.
pub fn build_oracle_flags(
    pos: &[PurchaseOrder],
    asns: &[Asn],
    invoices: &[Invoice],
) -> BTreeMap<String, OracleRecord> {
    let mut asn_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for asn in asns {
        *asn_counts.entry(asn.po_number.as_str()).or_insert(0) += 1;
    }
    let mut invoice_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for invoice in invoices {
        *invoice_counts.entry(invoice.po_number.as_str()).or_insert(0) += 1;
    }

    let mut out = BTreeMap::new();
    for po in pos {
        let asn_count = asn_counts.get(po.po_number.as_str()).copied().unwrap_or(0);
        let invoice_count = invoice_counts
            .get(po.po_number.as_str())
            .copied()
            .unwrap_or(0);

        out.insert(
            po.po_number.clone(),
            OracleRecord {
                oracle_flags: OracleFlags {
                    missing_asn: asn_count == 0,
                    missing_invoice: invoice_count == 0,
                    po_signature: po_signature(po),
                    asn_count,
                    invoice_count,
                },
                oracle_label_version: "optionB_flags_only_v1".to_string(),
            },
        );
    }
    out
}

// content signature over buyer, supplier and the sorted line items
fn po_signature(po: &PurchaseOrder) -> String {
    let mut lines: Vec<String> = po
        .line_items
        .iter()
        .map(|li| format!("{}|{}|{:.2}", li.sku, li.quantity, li.unit_price))
        .collect();
    lines.sort();
    let material = format!(
        "{}||{}||{}",
        po.buyer_code,
        po.supplier_code,
        lines.join("||")
    );
    format!("{:016x}", xxh64(material.as_bytes(), 0))
}

/// Render every document into one wire-format file per document.
pub fn write_wire_files(dataset: &TrainingDataset, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    let mut renderer = DocumentRenderer::new(&dataset.cfg);

    for po in &dataset.pos {
        fs::write(
            dir.join(format!("{}.850", po.po_number)),
            renderer.render_po(po),
        )?;
    }
    for asn in &dataset.asns {
        fs::write(
            dir.join(format!("{}.856", asn.asn_number)),
            renderer.render_asn(asn),
        )?;
    }
    for invoice in &dataset.invoices {
        fs::write(
            dir.join(format!("{}.810", invoice.invoice_number)),
            renderer.render_invoice(invoice),
        )?;
    }
    Ok(())
}
