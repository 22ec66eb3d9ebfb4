//! Enriched-category selection for categorical biomarkers.

use crate::error::CutoffFailure;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Response counts for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRate {
    pub category: String,
    pub n: usize,
    pub n_responders: usize,
    pub response_rate: f64,
}

/// Per-category response rates and the enriched category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalCutoff {
    /// One entry per observed category, in vocabulary order.
    pub rates: Vec<CategoryRate>,
    pub enriched_category: String,
    /// Share of responders in the enriched category.
    pub sensitivity: f64,
    /// Share of non-responders outside the enriched category.
    pub specificity: f64,
    /// Response rate inside the enriched category.
    pub response_rate_in: f64,
    /// Response rate among all other categories.
    pub response_rate_out: f64,
}

/// Pick the category with the highest response rate among those holding at
/// least one responder and one non-responder.
///
/// Ties go to the larger category, then to the lexicographically smaller
/// label.
pub fn enriched_category(
    codes: &[usize],
    categories: &[String],
    responders: &[bool],
) -> Result<CategoricalCutoff, CutoffFailure> {
    let k = categories.len();
    let mut n = vec![0usize; k];
    let mut r = vec![0usize; k];
    for (&c, &resp) in codes.iter().zip(responders) {
        n[c] += 1;
        if resp {
            r[c] += 1;
        }
    }

    let rates: Vec<CategoryRate> = (0..k)
        .filter(|&c| n[c] > 0)
        .map(|c| CategoryRate {
            category: categories[c].clone(),
            n: n[c],
            n_responders: r[c],
            response_rate: r[c] as f64 / n[c] as f64,
        })
        .collect();

    if rates.len() < 2 {
        return Err(CutoffFailure::InsufficientDistinctValues {
            n_distinct: rates.len(),
        });
    }
    let n_pos = responders.iter().filter(|&&x| x).count();
    let n_neg = responders.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(CutoffFailure::SingleOutcomeClass {
            responders: n_pos,
            non_responders: n_neg,
        });
    }

    let best = rates
        .iter()
        .filter(|c| c.n_responders > 0 && c.n_responders < c.n)
        .min_by(|a, b| compare_enrichment(a, b))
        .ok_or(CutoffFailure::NoQualifyingCategory)?;

    let in_resp = best.n_responders;
    let in_non = best.n - best.n_responders;
    let out_n = responders.len() - best.n;
    let out_resp = n_pos - in_resp;

    Ok(CategoricalCutoff {
        enriched_category: best.category.clone(),
        sensitivity: in_resp as f64 / n_pos as f64,
        specificity: (n_neg - in_non) as f64 / n_neg as f64,
        response_rate_in: best.response_rate,
        response_rate_out: if out_n > 0 {
            out_resp as f64 / out_n as f64
        } else {
            f64::NAN
        },
        rates: rates.clone(),
    })
}

/// Better enrichment sorts first.
fn compare_enrichment(a: &CategoryRate, b: &CategoryRate) -> Ordering {
    // Compare r_a/n_a with r_b/n_b exactly.
    let lhs = a.n_responders as u128 * b.n as u128;
    let rhs = b.n_responders as u128 * a.n as u128;
    rhs.cmp(&lhs)
        .then_with(|| b.n.cmp(&a.n))
        .then_with(|| a.category.cmp(&b.category))
}
