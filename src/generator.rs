// P2P Testdata - Triplet generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Baseline (PO, ASN, Invoice) triplet construction.
//!
//! Every triplet produced here is internally consistent: the ship notice
//! mirrors ordered quantities and the invoice traces shipped quantities at
//! PO prices. Discrepancies are introduced afterwards by
//! [`crate::anomalies::AnomalyInjector`].

use crate::config::{GenConfig, CURRENCY_CODES, UNITS_OF_MEASURE};
use crate::distributions::Dist;
use crate::documents::{
    doc_id, round2, Asn, AsnLineItem, Invoice, InvoiceLineItem, PoLineItem, PurchaseOrder, Triplet,
};
use crate::master::MasterData;
use chrono::{Duration, NaiveDateTime};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Normal, Poisson};
use std::collections::HashMap;

/// Builds internally-consistent document triplets from master data.
pub struct TripletGenerator {
    cfg: GenConfig,
    dist: Dist,
    master: MasterData,
    anchor: NaiveDateTime,
}

impl TripletGenerator {
    /// Create a generator over the given configuration and master data.
    pub fn new(cfg: GenConfig, dist: Dist, master: MasterData) -> Self {
        let anchor = cfg.anchor();
        Self {
            cfg,
            dist,
            master,
            anchor,
        }
    }

    /// Borrow the master data.
    pub fn master(&self) -> &MasterData {
        &self.master
    }

    /// Build a full NORMAL triplet for the given running index.
    pub fn build_triplet(&self, index: usize, rng: &mut StdRng) -> Triplet {
        let po = self.build_po(index, rng);
        let asn = self.build_asn_from_po(&po, rng);
        let invoice = self.build_invoice_from_po_asn(&po, Some(&asn), rng);
        Triplet {
            po,
            asn: Some(asn),
            invoice: Some(invoice),
        }
    }

    /// Build one purchase order.
    pub fn build_po(&self, index: usize, rng: &mut StdRng) -> PurchaseOrder {
        let cfg = &self.cfg;

        let poisson = Poisson::new(self.dist.avg_lines as f64).unwrap();
        let n_lines = (poisson.sample(rng) as i64).clamp(1, cfg.line_items_max as i64) as usize;

        let buyer = self.master.buyer_master.choose(rng).unwrap();
        let supplier = self.master.supplier_master.choose(rng).unwrap();

        // spread orders across the history window; the recent slice carries
        // a demand-drift quantity multiplier
        let order_date = self.anchor - Duration::days(rng.gen_range(0..=cfg.history_days));
        let is_recent = order_date > self.anchor - Duration::days(cfg.recent_days);
        let qty_mult = if is_recent { cfg.recent_qty_mult } else { 1.0 };

        let jitter_dist = Normal::new(cfg.ship_jitter_mean, cfg.ship_jitter_std).unwrap();
        let jitter = jitter_dist
            .sample(rng)
            .clamp(cfg.ship_jitter_min as f64, cfg.ship_jitter_max as f64)
            as i64;
        let expected_ship_date =
            order_date + Duration::days((supplier.lead_time_days + jitter).max(1));

        let po_number = format!("PO-{}-{}", cfg.anchor_time_ms % 1_000_000, index);

        let qty_dist = Normal::new(
            self.dist.qty_mean * qty_mult,
            self.dist.qty_std.max(5.0),
        )
        .unwrap();

        let mut line_items = Vec::with_capacity(n_lines);
        let mut subtotal = 0.0;
        for line_number in 1..=n_lines {
            let sku = *crate::config::SKUS.choose(rng).unwrap();
            let (contract_price, discount_pct) =
                match self.master.contract(&supplier.supplier_code, sku) {
                    Some(c) => (c.contract_unit_price, c.discount_pct),
                    None => (self.dist.price_mean, 0.0),
                };

            let quantity =
                (qty_dist.sample(rng).clamp(1.0, cfg.qty_max as f64)) as i64;
            let price_dist =
                Normal::new(contract_price, (contract_price * 0.05).max(0.5)).unwrap();
            let raw_price = price_dist.sample(rng).clamp(0.01, cfg.price_max);
            let unit_price = round2(raw_price * (1.0 - discount_pct));

            subtotal += quantity as f64 * unit_price;
            line_items.push(PoLineItem {
                line_number,
                sku: sku.to_string(),
                quantity,
                unit_of_measure: UNITS_OF_MEASURE.choose(rng).unwrap().to_string(),
                unit_price,
                contract_unit_price: round2(contract_price),
                discount_pct,
            });
        }

        let (freight_amount, discount_amount, tax_amount) = self.derive_charges(subtotal, rng);

        PurchaseOrder {
            po_id: doc_id("po", &po_number),
            po_number: po_number.clone(),
            buyer_code: buyer.buyer_code.clone(),
            supplier_code: supplier.supplier_code.clone(),
            order_date,
            expected_ship_date,
            ship_to_location: buyer.default_ship_to.clone(),
            bill_to_location: buyer.default_bill_to.clone(),
            payment_terms: supplier.default_payment_terms.clone(),
            currency: CURRENCY_CODES.choose(rng).unwrap().to_string(),
            carrier_code: supplier.preferred_carrier.clone(),
            tolerance_profile_id: supplier.default_tol_profile.clone(),
            line_items,
            freight_amount,
            discount_amount,
            tax_amount,
        }
    }

    /// Build the baseline ship notice: full quantities on or near the
    /// expected ship date.
    pub fn build_asn_from_po(&self, po: &PurchaseOrder, rng: &mut StdRng) -> Asn {
        let ship_date = po.expected_ship_date + Duration::days(rng.gen_range(-1..=2));
        let asn_number = format!("ASN-{}", po.po_number);

        Asn {
            asn_id: doc_id("asn", &asn_number),
            asn_number,
            po_number: po.po_number.clone(),
            buyer_code: po.buyer_code.clone(),
            supplier_code: po.supplier_code.clone(),
            ship_date,
            carrier_code: po.carrier_code.clone(),
            ship_to_location: po.ship_to_location.clone(),
            line_items: po
                .line_items
                .iter()
                .map(|li| AsnLineItem {
                    line_number: li.line_number,
                    sku: li.sku.clone(),
                    ship_qty: li.quantity,
                    unit_of_measure: li.unit_of_measure.clone(),
                })
                .collect(),
        }
    }

    /// Build the baseline invoice: shipped quantities at PO prices.
    pub fn build_invoice_from_po_asn(
        &self,
        po: &PurchaseOrder,
        asn: Option<&Asn>,
        rng: &mut StdRng,
    ) -> Invoice {
        let cfg = &self.cfg;
        let ship_date = asn.map(|a| a.ship_date).unwrap_or(po.expected_ship_date);
        let invoice_date = ship_date
            + Duration::days(
                rng.gen_range(cfg.invoice_after_ship_days_min..=cfg.invoice_after_ship_days_max),
            );
        let invoice_number = format!("INV-{}", po.po_number);

        let asn_qty: HashMap<&str, i64> = asn
            .map(|a| {
                a.line_items
                    .iter()
                    .map(|li| (li.sku.as_str(), li.ship_qty))
                    .collect()
            })
            .unwrap_or_default();

        let line_items: Vec<InvoiceLineItem> = po
            .line_items
            .iter()
            .map(|li| InvoiceLineItem {
                line_number: li.line_number,
                sku: li.sku.clone(),
                quantity: if asn.is_some() {
                    asn_qty.get(li.sku.as_str()).copied().unwrap_or(li.quantity)
                } else {
                    li.quantity
                },
                unit_of_measure: li.unit_of_measure.clone(),
                unit_price: round2(li.unit_price),
            })
            .collect();

        let mut invoice = Invoice {
            invoice_id: doc_id("inv", &invoice_number),
            invoice_number,
            po_number: po.po_number.clone(),
            buyer_code: po.buyer_code.clone(),
            supplier_code: po.supplier_code.clone(),
            invoice_date,
            currency: po.currency.clone(),
            line_items,
            freight_amount: po.freight_amount,
            discount_amount: po.discount_amount,
            tax_amount: po.tax_amount,
            subtotal_amount: 0.0,
            total_amount: 0.0,
        };
        invoice.recompute_totals();
        invoice
    }

    // charge amounts as clamped-normal fractions of the subtotal
    fn derive_charges(&self, subtotal: f64, rng: &mut StdRng) -> (f64, f64, f64) {
        let cfg = &self.cfg;
        let subtotal = subtotal.max(0.01);

        let freight_pct = Normal::new(cfg.freight_pct_mean, cfg.freight_pct_std)
            .unwrap()
            .sample(rng)
            .clamp(0.0, 0.25);
        let discount_pct = Normal::new(cfg.discount_pct_mean, cfg.discount_pct_std)
            .unwrap()
            .sample(rng)
            .clamp(0.0, 0.35);
        let tax_pct = Normal::new(cfg.tax_pct_mean, cfg.tax_pct_std)
            .unwrap()
            .sample(rng)
            .clamp(0.0, 0.25);

        (
            round2(subtotal * freight_pct),
            round2(subtotal * discount_pct),
            round2(subtotal * tax_pct),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::master::build_master;

    fn generator() -> TripletGenerator {
        let cfg = GenConfig::default();
        let dist = Dist::defaults(&cfg);
        let master = build_master(&dist, &cfg, 42);
        TripletGenerator::new(cfg, dist, master)
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_po_shape() {
        let gen = generator();
        let cfg = GenConfig::default();
        let mut rng = rng();
        for i in 0..50 {
            let po = gen.build_po(i, &mut rng);
            assert!(!po.line_items.is_empty());
            assert!(po.line_items.len() <= cfg.line_items_max);
            assert!(po.expected_ship_date > po.order_date);
            for li in &po.line_items {
                assert!(li.quantity >= 1 && li.quantity <= cfg.qty_max);
                assert!(li.unit_price >= 0.0 && li.unit_price <= cfg.price_max);
            }
            assert!(po.freight_amount >= 0.0);
        }
    }

    #[test]
    fn test_po_numbers_unique() {
        let gen = generator();
        let mut rng = rng();
        let a = gen.build_po(0, &mut rng);
        let b = gen.build_po(1, &mut rng);
        assert_ne!(a.po_number, b.po_number);
        assert_ne!(a.po_id, b.po_id);
    }

    #[test]
    fn test_asn_mirrors_po() {
        let gen = generator();
        let mut rng = rng();
        let po = gen.build_po(0, &mut rng);
        let asn = gen.build_asn_from_po(&po, &mut rng);

        assert_eq!(asn.po_number, po.po_number);
        assert_eq!(asn.line_items.len(), po.line_items.len());
        for (a, p) in asn.line_items.iter().zip(po.line_items.iter()) {
            assert_eq!(a.sku, p.sku);
            assert_eq!(a.ship_qty, p.quantity);
        }
        let offset = asn.ship_date - po.expected_ship_date;
        assert!(offset >= Duration::days(-1) && offset <= Duration::days(2));
    }

    #[test]
    fn test_invoice_follows_asn_and_po_price() {
        let gen = generator();
        let mut rng = rng();
        let po = gen.build_po(0, &mut rng);
        let asn = gen.build_asn_from_po(&po, &mut rng);
        let inv = gen.build_invoice_from_po_asn(&po, Some(&asn), &mut rng);

        assert_eq!(inv.line_items.len(), po.line_items.len());
        for (i, p) in inv.line_items.iter().zip(po.line_items.iter()) {
            assert_eq!(i.unit_price, p.unit_price);
        }
        let expected = round2(
            inv.subtotal_amount + inv.freight_amount + inv.tax_amount - inv.discount_amount,
        );
        assert_eq!(inv.total_amount, expected);
        assert!(inv.invoice_date >= asn.ship_date);
    }

    #[test]
    fn test_invoice_without_asn_follows_po() {
        let gen = generator();
        let mut rng = rng();
        let po = gen.build_po(0, &mut rng);
        let inv = gen.build_invoice_from_po_asn(&po, None, &mut rng);
        for (i, p) in inv.line_items.iter().zip(po.line_items.iter()) {
            assert_eq!(i.quantity, p.quantity);
        }
        assert!(inv.invoice_date >= po.expected_ship_date);
    }

    #[test]
    fn test_reproducibility() {
        let gen = generator();
        let mut rng_a = rng();
        let mut rng_b = rng();
        let a = gen.build_triplet(0, &mut rng_a);
        let b = gen.build_triplet(0, &mut rng_b);
        assert_eq!(a, b);
    }
}
