//! Count suggestions: which products deserve a count next.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockforge_core::ProductId;
use stockforge_products::{AbcCurve, Product};

use crate::count::{InventoryCount, ItemStatus};

/// Points awarded per signal. The maxima are reached at the caps below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionWeights {
    pub out_of_stock: f64,
    pub curve_a: f64,
    pub curve_b: f64,
    /// Awarded in full when the product was never counted or not for `staleness_cap_days`.
    pub staleness: f64,
    pub staleness_cap_days: i64,
    /// Scaled by the share of finalized counts in which the product diverged.
    pub divergence_rate: f64,
    pub critical_sector: f64,
    /// Address prefixes of critical sectors.
    pub critical_sectors: Vec<String>,
}

impl Default for SuggestionWeights {
    fn default() -> Self {
        Self {
            out_of_stock: 40.0,
            curve_a: 30.0,
            curve_b: 15.0,
            staleness: 20.0,
            staleness_cap_days: 90,
            divergence_rate: 25.0,
            critical_sector: 10.0,
            critical_sectors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountSuggestion {
    pub product_id: ProductId,
    pub product_code: String,
    pub description: String,
    pub address: String,
    pub score: f64,
    pub reasons: Vec<String>,
}

#[derive(Default)]
struct History {
    last_counted: Option<DateTime<Utc>>,
    counted: u32,
    diverged: u32,
}

fn history(counts: &[InventoryCount]) -> HashMap<ProductId, History> {
    let mut out: HashMap<ProductId, History> = HashMap::new();
    for count in counts.iter().filter(|c| c.status.is_finalized()) {
        let when = count.completed_at.unwrap_or(count.created_at);
        for item in count.items.iter().filter(|i| i.is_counted()) {
            let entry = out.entry(item.product_id).or_default();
            entry.counted += 1;
            if matches!(item.status, ItemStatus::Divergente | ItemStatus::Ajustado) {
                entry.diverged += 1;
            }
            if entry.last_counted.is_none_or(|last| when > last) {
                entry.last_counted = Some(when);
            }
        }
    }
    out
}

/// Rank `products` for counting. Products in a planned or running count are skipped,
/// as are products with no signal at all.
pub fn rank<'a>(
    products: impl IntoIterator<Item = &'a Product>,
    counts: &[InventoryCount],
    weights: &SuggestionWeights,
    limit: usize,
    as_of: DateTime<Utc>,
) -> Vec<CountSuggestion> {
    let busy: HashSet<ProductId> = counts
        .iter()
        .filter(|c| c.status.is_active())
        .flat_map(|c| c.items.iter().map(|i| i.product_id))
        .collect();
    let history = history(counts);
    let cap = weights.staleness_cap_days.max(1);

    let mut suggestions: Vec<CountSuggestion> = products
        .into_iter()
        .filter(|p| !busy.contains(&p.id))
        .filter_map(|product| {
            let mut score = 0.0;
            let mut reasons = Vec::new();

            if product.is_out_of_stock() {
                score += weights.out_of_stock;
                reasons.push("out of stock".to_string());
            }
            match product.abc_curve {
                Some(AbcCurve::A) => {
                    score += weights.curve_a;
                    reasons.push("curve A".to_string());
                }
                Some(AbcCurve::B) => {
                    score += weights.curve_b;
                    reasons.push("curve B".to_string());
                }
                _ => {}
            }

            let seen = history.get(&product.id);
            match seen.and_then(|h| h.last_counted) {
                None => {
                    score += weights.staleness;
                    reasons.push("never counted".to_string());
                }
                Some(last) => {
                    let days = (as_of - last).num_days().clamp(0, cap);
                    if days > 0 {
                        score += weights.staleness * days as f64 / cap as f64;
                        reasons.push(format!("not counted for {days} days"));
                    }
                }
            }

            if let Some(h) = seen.filter(|h| h.diverged > 0) {
                score += weights.divergence_rate * f64::from(h.diverged) / f64::from(h.counted);
                reasons.push(format!("diverged in {} of {} counts", h.diverged, h.counted));
            }

            if let Some(sector) = weights
                .critical_sectors
                .iter()
                .find(|s| product.in_sector(s))
            {
                score += weights.critical_sector;
                reasons.push(format!("critical sector {sector}"));
            }

            (score > 0.0).then(|| CountSuggestion {
                product_id: product.id,
                product_code: product.code.clone(),
                description: product.description.clone(),
                address: product.address.clone(),
                score: (score * 10.0).round() / 10.0,
                reasons,
            })
        })
        .collect();

    suggestions.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.product_code.cmp(&b.product_code))
    });
    suggestions.truncate(limit);
    suggestions
}
