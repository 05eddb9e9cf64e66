// P2P Testdata - Document records
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Typed purchase order, ship notice and invoice records.
//!
//! These are the canonical in-memory forms; the wire encoding lives in
//! [`crate::render`] and the JSON artifact serializes them as-is.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

/// Round to cents.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Round to four decimal places (discount fractions).
pub fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Opaque, deterministic document id derived from the business number.
pub fn doc_id(kind: &str, number: &str) -> String {
    format!("{}-{:016x}", kind, xxh64(number.as_bytes(), 0))
}

/// One purchase-order line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoLineItem {
    pub line_number: usize,
    pub sku: String,
    pub quantity: i64,
    pub unit_of_measure: String,
    pub unit_price: f64,
    pub contract_unit_price: f64,
    pub discount_pct: f64,
}

/// A purchase order (850).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub po_id: String,
    pub po_number: String,
    pub buyer_code: String,
    pub supplier_code: String,
    pub order_date: NaiveDateTime,
    pub expected_ship_date: NaiveDateTime,
    pub ship_to_location: String,
    pub bill_to_location: String,
    pub payment_terms: String,
    pub currency: String,
    pub carrier_code: String,
    pub tolerance_profile_id: String,
    pub line_items: Vec<PoLineItem>,
    pub freight_amount: f64,
    pub discount_amount: f64,
    pub tax_amount: f64,
}

impl PurchaseOrder {
    /// Sum of quantity x unit price over all line items.
    pub fn subtotal(&self) -> f64 {
        self.line_items
            .iter()
            .map(|li| li.quantity as f64 * li.unit_price)
            .sum::<f64>()
            .max(0.0)
    }

    /// subtotal + freight + tax - discount, floored at zero.
    pub fn total(&self) -> f64 {
        (self.subtotal() + self.freight_amount + self.tax_amount - self.discount_amount).max(0.0)
    }
}

/// One ship-notice line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsnLineItem {
    pub line_number: usize,
    pub sku: String,
    pub ship_qty: i64,
    pub unit_of_measure: String,
}

/// An advance ship notice (856).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asn {
    pub asn_id: String,
    pub asn_number: String,
    pub po_number: String,
    pub buyer_code: String,
    pub supplier_code: String,
    pub ship_date: NaiveDateTime,
    pub carrier_code: String,
    pub ship_to_location: String,
    pub line_items: Vec<AsnLineItem>,
}

/// One invoice line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    pub line_number: usize,
    pub sku: String,
    pub quantity: i64,
    pub unit_of_measure: String,
    pub unit_price: f64,
}

/// An invoice (810).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: String,
    pub invoice_number: String,
    pub po_number: String,
    pub buyer_code: String,
    pub supplier_code: String,
    pub invoice_date: NaiveDateTime,
    pub currency: String,
    pub line_items: Vec<InvoiceLineItem>,
    pub freight_amount: f64,
    pub discount_amount: f64,
    pub tax_amount: f64,
    pub subtotal_amount: f64,
    pub total_amount: f64,
}

impl Invoice {
    /// Recompute subtotal and total from line items and charges.
    ///
    /// Must be called after any line or charge mutation so that
    /// `total = subtotal + freight + tax - discount` keeps holding.
    pub fn recompute_totals(&mut self) {
        let subtotal: f64 = self
            .line_items
            .iter()
            .map(|li| li.quantity as f64 * li.unit_price)
            .sum();
        self.subtotal_amount = round2(subtotal);
        self.total_amount = round2(
            self.subtotal_amount + self.freight_amount + self.tax_amount - self.discount_amount,
        );
    }
}

/// One linked (PO, ASN, Invoice) document family.
///
/// ASN and invoice are optional: missing-document scenarios drop one of
/// them while the purchase order always survives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triplet {
    pub po: PurchaseOrder,
    pub asn: Option<Asn>,
    pub invoice: Option<Invoice>,
}
