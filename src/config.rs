// P2P Testdata - Generator configuration
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Generator configuration and fixed reference catalogues.
//!
//! All tunable constants live in [`GenConfig`]; the full struct is
//! snapshotted into the dataset artifact so a run can be audited later.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Default segment terminator for the wire format.
pub const DEFAULT_SEGMENT_TERMINATOR: char = '~';
/// Default element separator for the wire format.
pub const DEFAULT_ELEMENT_SEPARATOR: char = '*';
/// Composite element separator for the wire format.
pub const COMPOSITE_SEPARATOR: char = ':';

/// Pinned generation anchor: 2025-09-01 00:00:00 UTC.
///
/// Every clock read (order-date backdating, contract validity windows,
/// envelope date/time fields, control numbers) derives from this anchor so
/// that two runs with identical inputs are byte-identical.
pub const DEFAULT_ANCHOR_TIME_MS: i64 = 1_756_684_800_000;

/// Supplier codes used to seed master data.
pub const SUPPLIERS: [&str; 8] = [
    "SUPPLIER001",
    "SUPP_ACE_MFG",
    "WIDGET_CO",
    "ACME_PARTS",
    "INDUSTRIAL_GOODS_LTD",
    "TECH_SUPPLY_INT",
    "LOGISTICS_PLUS",
    "PREMIUM_GOODS",
];

/// Buyer codes used to seed master data.
pub const BUYERS: [&str; 5] = [
    "BUYER_RETAIL_A",
    "BUYER_DISTRIB_B",
    "BUYER_WAREHOUSE_C",
    "BUYER_CHAIN_D",
    "BUYER_ECOMM_E",
];

/// SKU catalogue.
pub const SKUS: [&str; 10] = [
    "SKU-10001",
    "SKU-10002",
    "SKU-10003",
    "SKU-20001",
    "SKU-20002",
    "SKU-30001",
    "PART-XYZ-100",
    "PART-ABC-200",
    "WIDGET-BLUE-SM",
    "WIDGET-RED-LG",
];

/// Units of measure.
pub const UNITS_OF_MEASURE: [&str; 6] = ["EA", "CS", "DZ", "BOX", "PLT", "CT"];

/// Payment terms.
pub const PAYMENT_TERMS: [&str; 4] = ["NET30", "NET45", "NET60", "2%10NET30"];

/// Carrier codes.
pub const CARRIERS: [&str; 6] = ["UPS", "FEDEX", "DHL", "XPO", "OLD_DOMINION", "JB_HUNT"];

/// Currency codes.
pub const CURRENCY_CODES: [&str; 1] = ["USD"];

/// Named bundle of fractional tolerances for a supplier.
///
/// Deviations at or below these fractions count as normal variation;
/// injected anomalies are pushed strictly beyond them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToleranceProfile {
    /// Profile identifier (STRICT / STANDARD / LOOSE).
    pub id: String,
    /// Allowed quantity deviation as a fraction of ordered quantity.
    pub qty_pct: f64,
    /// Allowed unit-price deviation as a fraction of PO price.
    pub price_pct: f64,
    /// Allowed charge deviation as a fraction of expected charges.
    pub charge_pct: f64,
}

impl ToleranceProfile {
    fn new(id: &str, qty_pct: f64, price_pct: f64, charge_pct: f64) -> Self {
        Self {
            id: id.to_string(),
            qty_pct,
            price_pct,
            charge_pct,
        }
    }
}

/// Generator configuration.
///
/// Field groups mirror the stages of the pipeline: volume/drift knobs for
/// the triplet generator, fallback distributions for when no reference
/// corpus is available, shipping and invoicing behavior, charge fractions,
/// benign missingness rates, the tolerance catalogue, anomaly magnitudes,
/// and the risk/severity mapping constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenConfig {
    // volume / drift
    pub history_days: i64,
    pub recent_days: i64,
    pub recent_qty_mult: f64,

    // base distributions (fallback if no reference corpus parsed)
    pub avg_line_items: usize,
    pub line_items_max: usize,
    pub qty_mean: f64,
    pub qty_std: f64,
    pub qty_max: i64,
    pub price_mean: f64,
    pub price_std: f64,
    pub price_max: f64,

    // lead time + shipping behavior
    pub supplier_lead_days_min: i64,
    pub supplier_lead_days_max: i64,
    pub ship_jitter_mean: f64,
    pub ship_jitter_std: f64,
    pub ship_jitter_min: i64,
    pub ship_jitter_max: i64,

    // invoice timing
    pub invoice_after_ship_days_min: i64,
    pub invoice_after_ship_days_max: i64,

    // charges (fraction of subtotal)
    pub freight_pct_mean: f64,
    pub freight_pct_std: f64,
    pub discount_pct_mean: f64,
    pub discount_pct_std: f64,
    pub tax_pct_mean: f64,
    pub tax_pct_std: f64,

    // benign missingness (NORMAL label only)
    pub p_missing_asn: f64,
    pub p_missing_invoice: f64,

    // tolerance profiles
    pub tol_profiles: Vec<ToleranceProfile>,

    // anomaly magnitudes (beyond tolerance)
    pub anom_qty_mult_min: f64,
    pub anom_qty_mult_max: f64,
    pub anom_price_mult_min: f64,
    pub anom_price_mult_max: f64,
    pub anom_charge_mult_min: f64,
    pub anom_charge_mult_max: f64,

    // severity mapping knobs
    pub sev_low_risk_max: f64,
    pub sev_med_risk_max: f64,
    pub risk_impact_scale: f64,

    /// Reference "now" for every clock read, in milliseconds since epoch.
    pub anchor_time_ms: i64,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            history_days: 120,
            recent_days: 21,
            recent_qty_mult: 1.10,

            avg_line_items: 6,
            line_items_max: 14,
            qty_mean: 120.0,
            qty_std: 70.0,
            qty_max: 6000,
            price_mean: 50.0,
            price_std: 18.0,
            price_max: 2500.0,

            supplier_lead_days_min: 2,
            supplier_lead_days_max: 14,
            ship_jitter_mean: 0.0,
            ship_jitter_std: 1.2,
            ship_jitter_min: -2,
            ship_jitter_max: 4,

            invoice_after_ship_days_min: 0,
            invoice_after_ship_days_max: 10,

            freight_pct_mean: 0.028,
            freight_pct_std: 0.012,
            discount_pct_mean: 0.015,
            discount_pct_std: 0.010,
            tax_pct_mean: 0.020,
            tax_pct_std: 0.008,

            p_missing_asn: 0.03,
            p_missing_invoice: 0.02,

            tol_profiles: vec![
                ToleranceProfile::new("STRICT", 0.01, 0.005, 0.01),
                ToleranceProfile::new("STANDARD", 0.02, 0.01, 0.02),
                ToleranceProfile::new("LOOSE", 0.05, 0.02, 0.04),
            ],

            anom_qty_mult_min: 1.05,
            anom_qty_mult_max: 1.40,
            anom_price_mult_min: 1.02,
            anom_price_mult_max: 1.25,
            anom_charge_mult_min: 1.6,
            anom_charge_mult_max: 4.0,

            sev_low_risk_max: 0.35,
            sev_med_risk_max: 0.70,
            risk_impact_scale: 2500.0,

            anchor_time_ms: DEFAULT_ANCHOR_TIME_MS,
        }
    }
}

impl GenConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the generation anchor timestamp.
    pub fn with_anchor_time_ms(mut self, anchor_time_ms: i64) -> Self {
        self.anchor_time_ms = anchor_time_ms;
        self
    }

    /// The anchor as a naive UTC datetime.
    pub fn anchor(&self) -> NaiveDateTime {
        DateTime::from_timestamp_millis(self.anchor_time_ms)
            .map(|dt| dt.naive_utc())
            .unwrap_or(DateTime::UNIX_EPOCH.naive_utc())
    }

    /// Look up a tolerance profile by id, falling back to STANDARD.
    pub fn tol_profile(&self, id: &str) -> &ToleranceProfile {
        self.tol_profiles
            .iter()
            .find(|t| t.id == id)
            .or_else(|| self.tol_profiles.iter().find(|t| t.id == "STANDARD"))
            .unwrap_or(&self.tol_profiles[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = GenConfig::default();
        assert_eq!(cfg.history_days, 120);
        assert_eq!(cfg.line_items_max, 14);
        assert_eq!(cfg.tol_profiles.len(), 3);
        assert_eq!(cfg.sev_low_risk_max, 0.35);
        assert_eq!(cfg.sev_med_risk_max, 0.70);
    }

    #[test]
    fn test_anchor_is_pinned() {
        let cfg = GenConfig::default();
        let anchor = cfg.anchor();
        assert_eq!(anchor.format("%Y-%m-%d %H:%M:%S").to_string(), "2025-09-01 00:00:00");
    }

    #[test]
    fn test_tol_profile_lookup() {
        let cfg = GenConfig::default();
        assert_eq!(cfg.tol_profile("LOOSE").qty_pct, 0.05);
        // unknown ids fall back to STANDARD
        assert_eq!(cfg.tol_profile("NO_SUCH").id, "STANDARD");
    }
}
