// P2P Testdata - Master data
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Deterministic synthesis of reference data.
//!
//! Suppliers, buyers, items, pricing contracts and locations are derived
//! from (statistics, seed) alone; identical inputs reproduce identical
//! master data byte for byte.

use crate::config::{
    GenConfig, ToleranceProfile, BUYERS, CARRIERS, PAYMENT_TERMS, SKUS, SUPPLIERS,
};
use crate::distributions::Dist;
use crate::documents::{round2, round4};
use chrono::{Duration, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

/// Supplier reference record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub supplier_code: String,
    pub supplier_name: String,
    pub lead_time_days: i64,
    pub default_payment_terms: String,
    pub preferred_carrier: String,
    pub default_tol_profile: String,
}

/// Buyer reference record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Buyer {
    pub buyer_code: String,
    pub buyer_name: String,
    pub default_ship_to: String,
    pub default_bill_to: String,
}

/// Item reference record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub sku: String,
    pub description: String,
}

/// Pricing contract keyed on (supplier, SKU).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingContract {
    pub supplier_code: String,
    pub sku: String,
    pub contract_unit_price: f64,
    pub discount_pct: f64,
    pub currency: String,
    pub effective_start: NaiveDate,
    pub effective_end: NaiveDate,
}

/// Warehouse/distribution-center location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub location_code: String,
    pub name: String,
    pub city: String,
    pub state: String,
    pub timezone: String,
}

/// The full master-data bundle embedded into the dataset artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterData {
    pub supplier_master: Vec<Supplier>,
    pub buyer_master: Vec<Buyer>,
    pub item_master: Vec<Item>,
    pub pricing_contracts: Vec<PricingContract>,
    pub location_master: Vec<Location>,
    pub tol_profiles: Vec<ToleranceProfile>,
}

impl MasterData {
    /// Supplier by code.
    pub fn supplier(&self, code: &str) -> Option<&Supplier> {
        self.supplier_master.iter().find(|s| s.supplier_code == code)
    }

    /// Buyer by code.
    pub fn buyer(&self, code: &str) -> Option<&Buyer> {
        self.buyer_master.iter().find(|b| b.buyer_code == code)
    }

    /// Pricing contract for (supplier, SKU).
    pub fn contract(&self, supplier_code: &str, sku: &str) -> Option<&PricingContract> {
        self.pricing_contracts
            .iter()
            .find(|p| p.supplier_code == supplier_code && p.sku == sku)
    }
}

/// Fixed warehouse catalogue.
pub fn location_catalogue() -> Vec<Location> {
    let seed = [
        ("WH-NE-01", "Northeast DC", "Newark", "NJ", "America/New_York"),
        ("WH-SE-01", "Southeast DC", "Atlanta", "GA", "America/New_York"),
        ("WH-MW-01", "Midwest DC", "Chicago", "IL", "America/Chicago"),
        ("WH-W-01", "West DC", "Reno", "NV", "America/Los_Angeles"),
    ];
    seed.iter()
        .map(|(code, name, city, state, tz)| Location {
            location_code: code.to_string(),
            name: name.to_string(),
            city: city.to_string(),
            state: state.to_string(),
            timezone: tz.to_string(),
        })
        .collect()
}

// "SUPP_ACE_MFG" -> "Supp Ace Mfg"
fn title_case(code: &str, sep: char) -> String {
    code.split(sep)
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build master data from statistics and a seed.
///
/// Reseeds its own random source, making this a fixed reseed point of the
/// reproducibility contract.
pub fn build_master(dist: &Dist, cfg: &GenConfig, seed: u64) -> MasterData {
    let mut rng = StdRng::seed_from_u64(seed);
    let locations = location_catalogue();
    let anchor_date = cfg.anchor().date();

    let supplier_master: Vec<Supplier> = SUPPLIERS
        .iter()
        .map(|code| Supplier {
            supplier_code: code.to_string(),
            supplier_name: title_case(code, '_'),
            lead_time_days: rng
                .gen_range(cfg.supplier_lead_days_min..=cfg.supplier_lead_days_max),
            default_payment_terms: PAYMENT_TERMS.choose(&mut rng).unwrap().to_string(),
            preferred_carrier: CARRIERS.choose(&mut rng).unwrap().to_string(),
            default_tol_profile: cfg.tol_profiles.choose(&mut rng).unwrap().id.clone(),
        })
        .collect();

    let buyer_master: Vec<Buyer> = BUYERS
        .iter()
        .map(|code| Buyer {
            buyer_code: code.to_string(),
            buyer_name: title_case(code, '_'),
            default_ship_to: locations.choose(&mut rng).unwrap().location_code.clone(),
            default_bill_to: locations.choose(&mut rng).unwrap().location_code.clone(),
        })
        .collect();

    let item_master: Vec<Item> = SKUS
        .iter()
        .map(|sku| Item {
            sku: sku.to_string(),
            description: title_case(sku, '-'),
        })
        .collect();

    let price_std = (dist.price_mean * 0.20).max(1.0);
    let price_dist = Normal::new(dist.price_mean, price_std).unwrap();
    let discount_dist = Normal::new(0.03f64, 0.02).unwrap();

    let mut pricing_contracts = Vec::with_capacity(SUPPLIERS.len() * SKUS.len());
    for supplier in SUPPLIERS.iter() {
        for sku in SKUS.iter() {
            let base_price = price_dist.sample(&mut rng).clamp(1.0, cfg.price_max);
            let discount_pct: f64 = discount_dist.sample(&mut rng).clamp(0.0, 0.15);
            pricing_contracts.push(PricingContract {
                supplier_code: supplier.to_string(),
                sku: sku.to_string(),
                contract_unit_price: round2(base_price),
                discount_pct: round4(discount_pct),
                currency: "USD".to_string(),
                effective_start: anchor_date - Duration::days(180),
                effective_end: anchor_date + Duration::days(180),
            });
        }
    }

    MasterData {
        supplier_master,
        buyer_master,
        item_master,
        pricing_contracts,
        location_master: locations,
        tol_profiles: cfg.tol_profiles.clone(),
    }
}
