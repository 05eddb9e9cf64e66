// P2P Testdata - Segment codec
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Wire-format segment codec.
//!
//! Lexes delimiter-separated documents into tagged segments and extracts
//! the three transaction types (850 purchase order, 856 ship notice,
//! 810 invoice). Extraction is positional and lenient: a file that is not
//! a valid document of the requested type yields `None`, never an error.

use crate::config::{DEFAULT_ELEMENT_SEPARATOR, DEFAULT_SEGMENT_TERMINATOR};

/// One tagged wire segment. `elements[0]` is the tag itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub tag: String,
    pub elements: Vec<String>,
}

impl Segment {
    /// Element at position `idx`, trimmed; `None` when absent.
    pub fn el(&self, idx: usize) -> Option<&str> {
        self.elements.get(idx).map(|s| s.trim())
    }

    /// Element at position `idx` when present and non-blank.
    pub fn el_nonblank(&self, idx: usize) -> Option<&str> {
        self.el(idx).filter(|s| !s.is_empty())
    }
}

/// Detect the segment terminator and element separator of a document.
///
/// The element separator is the 4th byte of an `ISA` prefix by convention.
/// Terminator candidates (`~`, newline) are scored by marker-token presence
/// and segment count over the first 50 segments.
pub fn detect_format(text: &str) -> (char, char) {
    let content = text.trim();

    let mut elem_sep = DEFAULT_ELEMENT_SEPARATOR;
    if content.starts_with("ISA") {
        if let Some(c) = content.chars().nth(3) {
            elem_sep = c;
        }
    }

    let candidates = ['~', '\n'];
    let mut best = DEFAULT_SEGMENT_TERMINATOR;
    let mut best_score = -1i32;
    for cand in candidates {
        let segs: Vec<&str> = content.split(cand).collect();
        let joined = segs[..segs.len().min(50)].join(" ");
        let mut score = 0;
        if joined.contains("GS") {
            score += 2;
        }
        if joined.contains("ST") {
            score += 2;
        }
        if segs.len() > 10 {
            score += 1;
        }
        if score > best_score {
            best_score = score;
            best = cand;
        }
    }

    (best, elem_sep)
}

/// Split a document into raw segments, discarding blank ones.
pub fn split_segments(text: &str) -> Vec<String> {
    let content = text.trim();
    let raw: Vec<&str> = if content.contains('~') {
        content.split('~').collect()
    } else {
        content.split(|c| c == '\r' || c == '\n').collect()
    };
    raw.iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Lex a document into tagged segments. Segments with no tag are dropped.
pub fn parse_segments(text: &str) -> Vec<Segment> {
    let (_, elem_sep) = detect_format(text);
    let mut out = Vec::new();
    for raw in split_segments(text) {
        let elements: Vec<String> = raw.split(elem_sep).map(|e| e.to_string()).collect();
        let tag = elements
            .first()
            .map(|e| e.trim().to_string())
            .unwrap_or_default();
        if !tag.is_empty() {
            out.push(Segment { tag, elements });
        }
    }
    out
}

/// Transaction-set code from the `ST` segment, if any.
pub fn transaction_type(segments: &[Segment]) -> Option<&str> {
    segments
        .iter()
        .find(|s| s.tag == "ST")
        .and_then(|s| s.el_nonblank(1))
}

/// Purchase order fields recovered from an 850 document.
#[derive(Debug, Clone, Default)]
pub struct ParsedPo {
    pub po_number: String,
    pub line_items: Vec<ParsedPoLine>,
}

/// One 850 line item, fields kept as raw strings.
#[derive(Debug, Clone, Default)]
pub struct ParsedPoLine {
    pub sku: String,
    pub quantity: Option<String>,
    pub unit_price: Option<String>,
}

/// Ship notice fields recovered from an 856 document.
#[derive(Debug, Clone, Default)]
pub struct ParsedAsn {
    pub asn_number: Option<String>,
    pub ship_date: Option<String>,
    pub line_items: Vec<ParsedAsnLine>,
}

/// One 856 line item.
#[derive(Debug, Clone, Default)]
pub struct ParsedAsnLine {
    pub sku: String,
    pub ship_qty: Option<String>,
    pub unit_of_measure: Option<String>,
}

/// Invoice fields recovered from an 810 document.
#[derive(Debug, Clone, Default)]
pub struct ParsedInvoice {
    pub invoice_number: String,
    pub line_items: Vec<ParsedInvoiceLine>,
}

/// One 810 line item.
#[derive(Debug, Clone, Default)]
pub struct ParsedInvoiceLine {
    pub sku: String,
    pub quantity: Option<String>,
    pub unit_price: Option<String>,
}

// SKU identifier qualifiers accepted on LIN / IT1 segments.
const SKU_QUALIFIERS: [&str; 3] = ["BP", "SK", "VP"];

fn qualified_sku(seg: &Segment) -> Option<String> {
    for i in 1..seg.elements.len().saturating_sub(1) {
        if SKU_QUALIFIERS.contains(&seg.elements[i].trim()) {
            return seg.el_nonblank(i + 1).map(|s| s.to_string());
        }
    }
    None
}

/// Extract a purchase order from parsed segments.
///
/// `BEG` element 3 is the PO number; `PO1` carries quantity at element 2,
/// price at element 4, SKU at element 8 with a fallback to element 7.
/// Returns `None` when the header or all line items are absent.
pub fn extract_po(segments: &[Segment]) -> Option<ParsedPo> {
    let mut po_number = None;
    let mut line_items = Vec::new();

    for seg in segments {
        match seg.tag.as_str() {
            "BEG" => {
                if let Some(n) = seg.el_nonblank(3) {
                    po_number = Some(n.to_string());
                }
            }
            "PO1" => {
                let quantity = seg.el_nonblank(2).map(|s| s.to_string());
                let unit_price = seg.el_nonblank(4).map(|s| s.to_string());
                let sku = seg
                    .el_nonblank(8)
                    .or_else(|| seg.el_nonblank(7))
                    .map(|s| s.to_string());
                if let Some(sku) = sku {
                    line_items.push(ParsedPoLine {
                        sku,
                        quantity,
                        unit_price,
                    });
                }
            }
            _ => {}
        }
    }

    match (po_number, line_items.is_empty()) {
        (Some(po_number), false) => Some(ParsedPo {
            po_number,
            line_items,
        }),
        _ => None,
    }
}

/// Extract a ship notice from parsed segments.
///
/// `BSN` element 2 is the ASN number, `DTM` with qualifier 011/017 the ship
/// date; each `LIN` sets the current SKU (qualifier scan over BP/SK/VP) and
/// each `SN1` closes a line with quantity at element 2, unit at element 3.
pub fn extract_asn(segments: &[Segment]) -> Option<ParsedAsn> {
    let mut asn_number = None;
    let mut ship_date = None;
    let mut line_items = Vec::new();
    let mut current_sku: Option<String> = None;

    for seg in segments {
        match seg.tag.as_str() {
            "BSN" => {
                if let Some(n) = seg.el_nonblank(2) {
                    asn_number = Some(n.to_string());
                }
            }
            "DTM" => {
                if matches!(seg.el(1), Some("011") | Some("017")) {
                    if let Some(d) = seg.el_nonblank(2) {
                        ship_date = Some(d.to_string());
                    }
                }
            }
            "LIN" => {
                if let Some(sku) = qualified_sku(seg) {
                    current_sku = Some(sku);
                }
            }
            "SN1" => {
                if let Some(sku) = current_sku.clone() {
                    line_items.push(ParsedAsnLine {
                        sku,
                        ship_qty: seg.el_nonblank(2).map(|s| s.to_string()),
                        unit_of_measure: seg.el_nonblank(3).map(|s| s.to_string()),
                    });
                }
            }
            _ => {}
        }
    }

    if line_items.is_empty() {
        return None;
    }
    Some(ParsedAsn {
        asn_number,
        ship_date,
        line_items,
    })
}

/// Extract an invoice from parsed segments.
///
/// `BIG` element 2 is the invoice number; `IT1` carries quantity at element
/// 2, price at element 4 and the SKU behind a BP/SK/VP qualifier.
pub fn extract_invoice(segments: &[Segment]) -> Option<ParsedInvoice> {
    let mut invoice_number = None;
    let mut line_items = Vec::new();

    for seg in segments {
        match seg.tag.as_str() {
            "BIG" => {
                if let Some(n) = seg.el_nonblank(2) {
                    invoice_number = Some(n.to_string());
                }
            }
            "IT1" => {
                if let Some(sku) = qualified_sku(seg) {
                    line_items.push(ParsedInvoiceLine {
                        sku,
                        quantity: seg.el_nonblank(2).map(|s| s.to_string()),
                        unit_price: seg.el_nonblank(4).map(|s| s.to_string()),
                    });
                }
            }
            _ => {}
        }
    }

    match (invoice_number, line_items.is_empty()) {
        (Some(invoice_number), false) => Some(ParsedInvoice {
            invoice_number,
            line_items,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_850: &str = "ISA*00*          *00*          *ZZ*SENDER_ID       *ZZ*RECEIVER_ID     *250901*0000*U*00400*000000001*0*P*:~GS*PO*SENDER*RECEIVER*20250901*0000*1*X*004010~ST*850*0001~BEG*00*SA*PO-123456-0*20250815~N1*BY*BUYER_RETAIL_A~N1*SU*SUPPLIER001~PO1*1*100*EA*12.50****SKU-10001~PO1*2*40*CS*8.00****SKU-20002~CTT*2~SE*8*0001~GE*1*1~IEA*1*000000001~";

    #[test]
    fn test_detect_format() {
        let (term, sep) = detect_format(SAMPLE_850);
        assert_eq!(term, '~');
        assert_eq!(sep, '*');
    }

    #[test]
    fn test_detect_format_newline_fallback() {
        let text = "ST*850*0001\nBEG*00*SA*PO-1*20250101\nGS*PO*A*B\nPO1*1*5*EA*1.00****X\nCTT*1\nSE*5*0001\nGE*1*1\nIEA*1*1\nDTM*011*20250101\nREF*DP*X\nN1*BY*Y\nN1*SU*Z";
        let (term, _) = detect_format(text);
        assert_eq!(term, '\n');
    }

    #[test]
    fn test_split_segments_drops_blanks() {
        let segs = split_segments("A*1~~B*2~  ~");
        assert_eq!(segs, vec!["A*1".to_string(), "B*2".to_string()]);
    }

    #[test]
    fn test_parse_segments() {
        let segs = parse_segments(SAMPLE_850);
        assert_eq!(segs[0].tag, "ISA");
        assert_eq!(transaction_type(&segs), Some("850"));
    }

    #[test]
    fn test_extract_po() {
        let segs = parse_segments(SAMPLE_850);
        let po = extract_po(&segs).unwrap();
        assert_eq!(po.po_number, "PO-123456-0");
        assert_eq!(po.line_items.len(), 2);
        assert_eq!(po.line_items[0].sku, "SKU-10001");
        assert_eq!(po.line_items[0].quantity.as_deref(), Some("100"));
        assert_eq!(po.line_items[0].unit_price.as_deref(), Some("12.50"));
    }

    #[test]
    fn test_extract_po_sku_fallback_element() {
        // SKU at element 7 when element 8 is blank
        let text = "ST*850*0001~BEG*00*SA*PO-9*20250101~PO1*1*10*EA*2.00***PART-ABC-200~SE*4*0001~";
        let po = extract_po(&parse_segments(text)).unwrap();
        assert_eq!(po.line_items[0].sku, "PART-ABC-200");
    }

    #[test]
    fn test_extract_po_missing_header() {
        let text = "ST*850*0001~PO1*1*10*EA*2.00****SKU-10001~SE*3*0001~";
        assert!(extract_po(&parse_segments(text)).is_none());
    }

    #[test]
    fn test_extract_po_no_lines() {
        let text = "ST*850*0001~BEG*00*SA*PO-9*20250101~SE*3*0001~";
        assert!(extract_po(&parse_segments(text)).is_none());
    }

    #[test]
    fn test_extract_asn() {
        let text = "ST*856*0002~BSN*00*ASN-PO-1*20250902*1200~DTM*011*20250902~TD5*****UPS~HL*1**I~LIN**BP*SKU-10001~SN1**100*EA~CTT*1~SE*9*0002~";
        let asn = extract_asn(&parse_segments(text)).unwrap();
        assert_eq!(asn.asn_number.as_deref(), Some("ASN-PO-1"));
        assert_eq!(asn.ship_date.as_deref(), Some("20250902"));
        assert_eq!(asn.line_items.len(), 1);
        assert_eq!(asn.line_items[0].ship_qty.as_deref(), Some("100"));
    }

    #[test]
    fn test_extract_invoice() {
        let text = "ST*810*0003~BIG*20250905*INV-PO-1~N1*BY*B~N1*SU*S~IT1*1*100*EA*12.50**BP*SKU-10001~TDS*125000~SE*7*0003~";
        let inv = extract_invoice(&parse_segments(text)).unwrap();
        assert_eq!(inv.invoice_number, "INV-PO-1");
        assert_eq!(inv.line_items[0].sku, "SKU-10001");
        assert_eq!(inv.line_items[0].unit_price.as_deref(), Some("12.50"));
    }

    #[test]
    fn test_extract_wrong_type_is_none() {
        let segs = parse_segments(SAMPLE_850);
        assert!(extract_asn(&segs).is_none());
        assert!(extract_invoice(&segs).is_none());
    }
}
