// P2P Testdata - Wire-format renderer
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Serializes documents into wire-format segments.
//!
//! Emits a minimal, internally-consistent envelope (interchange, group,
//! transaction) around document-specific body segments. Control numbers
//! come from an explicit [`ControlNumberFactory`] owned by the renderer;
//! the counter is monotonic for the lifetime of a run and must not be
//! reset mid-run.

use crate::config::GenConfig;
use crate::documents::{Asn, Invoice, PurchaseOrder};
use chrono::NaiveDateTime;
use crc::{Crc, CRC_32_ISO_HDLC};

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Interchange / group / transaction control numbers for one envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlNumbers {
    pub interchange: String,
    pub group: String,
    pub transaction: String,
}

/// Derives unique control numbers from a monotonic counter, the run anchor
/// and a stable hash of the document's business key.
#[derive(Debug)]
pub struct ControlNumberFactory {
    anchor_ms: i64,
    counter: u64,
}

impl ControlNumberFactory {
    /// Create a factory anchored to the run timestamp.
    pub fn new(anchor_ms: i64) -> Self {
        Self {
            anchor_ms,
            counter: 0,
        }
    }

    /// Issue the next control-number set for a business key.
    pub fn next_for(&mut self, business_key: &str) -> ControlNumbers {
        self.counter += 1;
        let base = self.anchor_ms as u64
            + CRC32.checksum(business_key.as_bytes()) as u64
            + self.counter % 1_000_000;
        ControlNumbers {
            interchange: format!("{:09}", base % 1_000_000_000),
            group: format!("{}", (base / 10) % 100_000),
            transaction: format!("{:04}", (base / 100) % 10_000),
        }
    }
}

/// Renders purchase orders, ship notices and invoices as wire documents.
#[derive(Debug)]
pub struct DocumentRenderer {
    anchor: NaiveDateTime,
    controls: ControlNumberFactory,
}

impl DocumentRenderer {
    /// Create a renderer for a run.
    pub fn new(cfg: &GenConfig) -> Self {
        Self {
            anchor: cfg.anchor(),
            controls: ControlNumberFactory::new(cfg.anchor_time_ms),
        }
    }

    /// Render a purchase order as an 850 document.
    pub fn render_po(&mut self, po: &PurchaseOrder) -> String {
        let ctrl = self.controls.next_for(&po.po_number);

        let mut tx = Vec::new();
        tx.push(format!("ST*850*{}", ctrl.transaction));
        tx.push(format!(
            "BEG*00*SA*{}*{}",
            po.po_number,
            po.order_date.format("%Y%m%d")
        ));
        tx.push(format!("N1*BY*{}", po.buyer_code));
        tx.push(format!("N1*SU*{}", po.supplier_code));
        tx.push(format!("ITD*01******{}", po.payment_terms));

        push_charge_segments(
            &mut tx,
            po.freight_amount,
            po.discount_amount,
            po.tax_amount,
        );

        for (i, li) in po.line_items.iter().enumerate() {
            tx.push(format!(
                "PO1*{}*{}*{}*{:.2}****{}",
                i + 1,
                li.quantity,
                li.unit_of_measure,
                li.unit_price,
                li.sku
            ));
        }

        tx.push(format!("CTT*{}", po.line_items.len()));
        let se_count = tx.len() + 1;
        tx.push(format!("SE*{}*{}", se_count, ctrl.transaction));

        self.envelope("PO", &ctrl, tx)
    }

    /// Render a ship notice as an 856 document.
    pub fn render_asn(&mut self, asn: &Asn) -> String {
        let ctrl = self.controls.next_for(&asn.asn_number);
        let ship_date = asn.ship_date.format("%Y%m%d");

        let mut tx = Vec::new();
        tx.push(format!("ST*856*{}", ctrl.transaction));
        tx.push(format!(
            "BSN*00*{}*{}*{}",
            asn.asn_number,
            ship_date,
            self.anchor.format("%H%M")
        ));
        tx.push(format!("DTM*011*{}", ship_date));
        tx.push(format!("TD5*****{}", asn.carrier_code));

        for (i, li) in asn.line_items.iter().enumerate() {
            tx.push(format!("HL*{}**I", i + 1));
            tx.push(format!("LIN**BP*{}", li.sku));
            tx.push(format!("SN1**{}*{}", li.ship_qty, li.unit_of_measure));
        }

        tx.push(format!("CTT*{}", asn.line_items.len()));
        let se_count = tx.len() + 1;
        tx.push(format!("SE*{}*{}", se_count, ctrl.transaction));

        self.envelope("SH", &ctrl, tx)
    }

    /// Render an invoice as an 810 document.
    pub fn render_invoice(&mut self, invoice: &Invoice) -> String {
        let ctrl = self.controls.next_for(&invoice.invoice_number);

        let mut tx = Vec::new();
        tx.push(format!("ST*810*{}", ctrl.transaction));
        tx.push(format!(
            "BIG*{}*{}",
            invoice.invoice_date.format("%Y%m%d"),
            invoice.invoice_number
        ));
        tx.push(format!("N1*BY*{}", invoice.buyer_code));
        tx.push(format!("N1*SU*{}", invoice.supplier_code));

        push_charge_segments(
            &mut tx,
            invoice.freight_amount,
            invoice.discount_amount,
            invoice.tax_amount,
        );

        for (i, li) in invoice.line_items.iter().enumerate() {
            tx.push(format!(
                "IT1*{}*{}*{}*{:.2}**BP*{}",
                i + 1,
                li.quantity,
                li.unit_of_measure,
                li.unit_price,
                li.sku
            ));
        }

        // total monetary amount in cents
        tx.push(format!(
            "TDS*{}",
            (invoice.total_amount * 100.0).round() as i64
        ));
        let se_count = tx.len() + 1;
        tx.push(format!("SE*{}*{}", se_count, ctrl.transaction));

        self.envelope("IN", &ctrl, tx)
    }

    fn envelope(&self, functional_code: &str, ctrl: &ControlNumbers, tx: Vec<String>) -> String {
        let isa_date = self.anchor.format("%y%m%d");
        let isa_time = self.anchor.format("%H%M");

        let mut lines = Vec::with_capacity(tx.len() + 4);
        lines.push(format!(
            "ISA*00*          *00*          *ZZ*SENDER_ID       *ZZ*RECEIVER_ID     *{}*{}*U*00400*{}*0*P*:",
            isa_date, isa_time, ctrl.interchange
        ));
        lines.push(format!(
            "GS*{}*SENDER*RECEIVER*{}*{}*{}*X*004010",
            functional_code,
            self.anchor.format("%Y%m%d"),
            self.anchor.format("%H%M"),
            ctrl.group
        ));
        lines.extend(tx);
        lines.push(format!("GE*1*{}", ctrl.group));
        lines.push(format!("IEA*1*{}", ctrl.interchange));

        let mut out = lines.join("~");
        out.push('~');
        out
    }
}

fn push_charge_segments(tx: &mut Vec<String>, freight: f64, discount: f64, tax: f64) {
    tx.push(format!("SAC*C*FREIGHT***{:.2}", freight));
    if discount > 0.0 {
        tx.push(format!("SAC*A*DISCOUNT***{:.2}", discount));
    }
    if tax > 0.0 {
        tx.push(format!("SAC*C*TAX***{:.2}", tax));
    }
}
