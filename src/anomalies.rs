// P2P Testdata - Anomaly injection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Label-driven anomaly injection for 3-way match triplets.
//!
//! Given a baseline triplet and a target label, the injector mutates one
//! or more documents until the label holds beyond the supplier's tolerance
//! profile, then derives the reason-code/impact/risk/severity payload the
//! training pipeline consumes.

use crate::config::GenConfig;
use crate::documents::{round2, Triplet};
use crate::error::TestdataError;
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Exception label assigned to a purchase order.
///
/// The declaration order is the canonical label-set order; quota iteration
/// and the artifact's `label_set` both follow it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Label {
    Normal,
    /// Missing ASN or invoice.
    MissingDoc,
    /// PO vs ASN vs invoice quantity disagreement.
    ThreeWayQtyMismatch,
    /// PO vs invoice unit-price disagreement.
    ThreeWayPriceMismatch,
    /// ASN ship date late vs PO expectation.
    LateShipment,
    /// ASN quantity below PO beyond tolerance.
    ShortShip,
    /// Invoice price/quantity overbills beyond tolerance.
    Overbill,
    /// Freight/discount/tax outside the charge profile.
    ChargesAnomaly,
    /// Duplicate ASN/invoice patterns.
    DuplicateDoc,
}

impl Label {
    /// All labels in canonical order.
    pub const ALL: [Label; 9] = [
        Label::Normal,
        Label::MissingDoc,
        Label::ThreeWayQtyMismatch,
        Label::ThreeWayPriceMismatch,
        Label::LateShipment,
        Label::ShortShip,
        Label::Overbill,
        Label::ChargesAnomaly,
        Label::DuplicateDoc,
    ];

    /// Wire name of the label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Normal => "NORMAL",
            Label::MissingDoc => "MISSING_DOC",
            Label::ThreeWayQtyMismatch => "THREE_WAY_QTY_MISMATCH",
            Label::ThreeWayPriceMismatch => "THREE_WAY_PRICE_MISMATCH",
            Label::LateShipment => "LATE_SHIPMENT",
            Label::ShortShip => "SHORT_SHIP",
            Label::Overbill => "OVERBILL",
            Label::ChargesAnomaly => "CHARGES_ANOMALY",
            Label::DuplicateDoc => "DUPLICATE_DOC",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = TestdataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Label::ALL
            .iter()
            .find(|l| l.as_str() == s)
            .copied()
            .ok_or_else(|| TestdataError::UnknownLabel(s.to_string()))
    }
}

/// Severity tier derived from the risk score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Med,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Med => "MED",
            Severity::High => "HIGH",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a risk score onto a severity tier.
pub fn severity_for_risk(risk: f64, cfg: &GenConfig) -> Severity {
    if risk <= cfg.sev_low_risk_max {
        Severity::Low
    } else if risk <= cfg.sev_med_risk_max {
        Severity::Med
    } else {
        Severity::High
    }
}

/// Per-PO label payload, derived once after injection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelPayload {
    pub label: Label,
    pub severity: Severity,
    pub risk_score: f64,
    pub estimated_dollar_impact: f64,
    pub reason_codes: Vec<String>,
    pub owner_team: String,
    pub recommended_action: String,
    pub tolerance_profile_id: String,
}

/// Mutates triplets to realize a requested label beyond tolerance.
pub struct AnomalyInjector {
    cfg: GenConfig,
}

impl AnomalyInjector {
    /// Create an injector over the given configuration.
    pub fn new(cfg: GenConfig) -> Self {
        Self { cfg }
    }

    /// Apply the requested label to a triplet, mutating documents in place.
    ///
    /// Labels whose precondition document is absent substitute MISSING_DOC
    /// (bounded: MISSING_DOC itself never substitutes further).
    pub fn apply(&self, triplet: &mut Triplet, label: Label, rng: &mut StdRng) -> LabelPayload {
        let effective = match label {
            Label::LateShipment | Label::ShortShip | Label::ThreeWayQtyMismatch
                if triplet.asn.is_none() =>
            {
                Label::MissingDoc
            }
            Label::Overbill | Label::ThreeWayPriceMismatch | Label::ChargesAnomaly
                if triplet.invoice.is_none() =>
            {
                Label::MissingDoc
            }
            other => other,
        };

        let tol = self
            .cfg
            .tol_profile(&triplet.po.tolerance_profile_id)
            .clone();
        let base_total = triplet.po.total();

        match effective {
            Label::Normal => self.payload(
                effective,
                Vec::new(),
                "OPERATIONS",
                "REVIEW",
                0.0,
                triplet,
            ),

            Label::MissingDoc => {
                // drop exactly one of the two follower documents
                if rng.gen::<f64>() < 0.55 {
                    triplet.asn = None;
                    self.payload(
                        effective,
                        vec!["MISSING_ASN".to_string()],
                        "LOGISTICS",
                        "REQUEST_ASN_PROOF",
                        base_total * 0.15,
                        triplet,
                    )
                } else {
                    triplet.invoice = None;
                    self.payload(
                        effective,
                        vec!["MISSING_INVOICE".to_string()],
                        "AP",
                        "REQUEST_INVOICE",
                        base_total * 0.15,
                        triplet,
                    )
                }
            }

            Label::LateShipment => {
                let late_days = rng.gen_range(3..=18);
                if let Some(asn) = triplet.asn.as_mut() {
                    asn.ship_date =
                        triplet.po.expected_ship_date + chrono::Duration::days(late_days);
                }
                self.payload(
                    effective,
                    vec![format!("LATE_SHIP_{}D", late_days)],
                    "LOGISTICS",
                    "EXPEDITE_OR_ESCALATE",
                    base_total * (0.02 * late_days as f64).min(0.30),
                    triplet,
                )
            }

            Label::ShortShip | Label::ThreeWayQtyMismatch => {
                self.inject_qty_mismatch(triplet, effective, &tol, base_total, rng)
            }

            Label::Overbill | Label::ThreeWayPriceMismatch => {
                self.inject_price_mismatch(triplet, effective, &tol, base_total, rng)
            }

            Label::ChargesAnomaly => self.inject_charges_anomaly(triplet, effective, base_total, rng),

            Label::DuplicateDoc => self.payload(
                effective,
                vec!["DUPLICATE_DOCUMENT_PATTERN".to_string()],
                "OPERATIONS",
                "DEDUPE_AND_CONFIRM_VALID_DOC",
                base_total * 0.10,
                triplet,
            ),
        }
    }

    fn inject_qty_mismatch(
        &self,
        triplet: &mut Triplet,
        effective: Label,
        tol: &crate::config::ToleranceProfile,
        base_total: f64,
        rng: &mut StdRng,
    ) -> LabelPayload {
        let cfg = &self.cfg;
        // precondition checked by the caller
        let asn = triplet.asn.as_ref().expect("qty mismatch requires an ASN");

        let k = rng.gen_range(0..asn.line_items.len());
        let sku = asn.line_items[k].sku.clone();
        let Some(po_line) = triplet.po.line_items.iter().find(|li| li.sku == sku) else {
            return self.payload(
                effective,
                vec!["QTY_MISMATCH".to_string()],
                "LOGISTICS",
                "RECONCILE_QTY",
                base_total * 0.10,
                triplet,
            );
        };
        let q_po = po_line.quantity;
        let unit_price = po_line.unit_price;

        let mult = rng.gen_range(cfg.anom_qty_mult_min..cfg.anom_qty_mult_max);
        let short = effective == Label::ShortShip || rng.gen::<f64>() < 0.65;

        let (mut q_asn, reason, owner, action) = if short {
            (
                ((q_po as f64 / mult).round() as i64).max(0),
                "SHORT_SHIP_BEYOND_TOL",
                "LOGISTICS",
                "FILE_SHORTAGE_CLAIM",
            )
        } else {
            (
                (q_po as f64 * mult).round() as i64,
                "OVER_SHIP_BEYOND_TOL",
                "RECEIVING",
                "VERIFY_RECEIPT",
            )
        };

        // integer rounding can pull the delta back inside tolerance; push it
        // strictly beyond
        let min_delta = (tol.qty_pct * q_po as f64).floor() as i64 + 1;
        if (q_po - q_asn).abs() < min_delta {
            q_asn = if short {
                (q_po - min_delta).max(0)
            } else {
                q_po + min_delta
            };
        }
        if let Some(asn) = triplet.asn.as_mut() {
            asn.line_items[k].ship_qty = q_asn;
        }

        let mut reason_codes = vec![reason.to_string()];

        // the invoice follows ASN quantities in NORMAL; under a mismatch it
        // sometimes follows the PO instead, yielding three-way disagreement
        if let Some(invoice) = triplet.invoice.as_mut() {
            if let Some(li) = invoice.line_items.iter_mut().find(|li| li.sku == sku) {
                if rng.gen::<f64>() < 0.55 {
                    li.quantity = q_po;
                    reason_codes.push("INV_QTY_MATCHES_PO_NOT_ASN".to_string());
                } else {
                    li.quantity = q_asn;
                }
            }
            invoice.recompute_totals();
        }

        let impact = ((q_po - q_asn).abs() as f64 * unit_price).max(base_total * 0.05);
        self.payload(effective, reason_codes, owner, action, impact, triplet)
    }

    fn inject_price_mismatch(
        &self,
        triplet: &mut Triplet,
        effective: Label,
        tol: &crate::config::ToleranceProfile,
        base_total: f64,
        rng: &mut StdRng,
    ) -> LabelPayload {
        let cfg = &self.cfg;
        let invoice = triplet
            .invoice
            .as_ref()
            .expect("price mismatch requires an invoice");

        let k = rng.gen_range(0..invoice.line_items.len());
        let sku = invoice.line_items[k].sku.clone();
        let quantity = invoice.line_items[k].quantity;
        let Some(po_line) = triplet.po.line_items.iter().find(|li| li.sku == sku) else {
            return self.payload(
                effective,
                vec!["PRICE_MISMATCH".to_string()],
                "AP",
                "HOLD_PAYMENT",
                base_total * 0.10,
                triplet,
            );
        };
        let p_po = po_line.unit_price;

        let mut mult = rng.gen_range(cfg.anom_price_mult_min..cfg.anom_price_mult_max);
        if mult < 1.0 + tol.price_pct + 0.002 {
            mult = 1.0 + tol.price_pct + 0.02 + rng.gen::<f64>() * 0.05;
        }

        let mut new_price = round2(p_po * mult);
        // cent rounding can land back inside tolerance for small prices
        if p_po > 0.0 && (new_price - p_po) / p_po <= tol.price_pct {
            new_price = round2(p_po * (1.0 + tol.price_pct)) + 0.01;
        }

        if let Some(invoice) = triplet.invoice.as_mut() {
            invoice.line_items[k].unit_price = new_price;
            invoice.recompute_totals();
        }

        let impact = ((new_price - p_po) * quantity as f64).max(0.0);
        self.payload(
            effective,
            vec!["INVOICE_UNIT_PRICE_ABOVE_TOL".to_string()],
            "AP",
            "DISPUTE_INVOICE_OR_REQUEST_CREDIT_MEMO",
            impact,
            triplet,
        )
    }

    fn inject_charges_anomaly(
        &self,
        triplet: &mut Triplet,
        effective: Label,
        base_total: f64,
        rng: &mut StdRng,
    ) -> LabelPayload {
        let cfg = &self.cfg;
        let invoice = triplet
            .invoice
            .as_mut()
            .expect("charges anomaly requires an invoice");

        let mult = rng.gen_range(cfg.anom_charge_mult_min..cfg.anom_charge_mult_max);
        let which = ["freight", "tax", "discount", "combo"].choose(rng).unwrap();

        let mut reason_codes = Vec::new();
        if matches!(*which, "freight" | "combo") {
            invoice.freight_amount = round2(invoice.freight_amount * mult + 10.0);
            reason_codes.push("FREIGHT_OUTSIDE_PROFILE".to_string());
        }
        if matches!(*which, "tax" | "combo") {
            invoice.tax_amount = round2(invoice.tax_amount * mult + 5.0);
            reason_codes.push("TAX_OUTSIDE_PROFILE".to_string());
        }
        if matches!(*which, "discount" | "combo") {
            invoice.discount_amount = round2(invoice.discount_amount * mult);
            reason_codes.push("DISCOUNT_OUTSIDE_PROFILE".to_string());
        }
        invoice.recompute_totals();

        let impact = (invoice.total_amount - base_total).max(0.0);
        self.payload(
            effective,
            reason_codes,
            "AP",
            "RECONCILE_CHARGES_WITH_CONTRACT",
            impact,
            triplet,
        )
    }

    // risk = clip(1 - exp(-impact/scale) + 0.05 * min(6, reasons), 0, 1)
    fn payload(
        &self,
        label: Label,
        reason_codes: Vec<String>,
        owner_team: &str,
        recommended_action: &str,
        impact: f64,
        triplet: &Triplet,
    ) -> LabelPayload {
        let impact = impact.max(0.0);
        let mut risk = 1.0 - (-impact / self.cfg.risk_impact_scale).exp();
        risk += 0.05 * (reason_codes.len().min(6) as f64);
        let risk = risk.clamp(0.0, 1.0);

        LabelPayload {
            label,
            severity: severity_for_risk(risk, &self.cfg),
            risk_score: risk,
            estimated_dollar_impact: impact,
            reason_codes,
            owner_team: owner_team.to_string(),
            recommended_action: recommended_action.to_string(),
            tolerance_profile_id: triplet.po.tolerance_profile_id.clone(),
        }
    }
}
