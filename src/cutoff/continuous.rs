//! Youden-optimal thresholds for continuous biomarkers.

use crate::error::CutoffFailure;
use serde::{Deserialize, Serialize};

/// Which side of the threshold is classified positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// `value ≥ threshold`
    AtLeast,
    /// `value < threshold`
    Below,
}

/// Optimal split of a continuous biomarker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuousCutoff {
    pub threshold: f64,
    pub direction: Direction,
    pub sensitivity: f64,
    pub specificity: f64,
    pub youden: f64,
    /// Response rate among patients with value ≥ threshold.
    pub response_rate_above: f64,
    /// Response rate among patients with value < threshold.
    pub response_rate_below: f64,
    pub n_above: usize,
    pub n_below: usize,
}

/// Sweep every distinct observed value as a candidate threshold and keep
/// the one maximizing Youden's J.
///
/// Among thresholds with equal J the one enrolling the most patients wins:
/// the smallest threshold for [`Direction::AtLeast`], the largest for
/// [`Direction::Below`].
pub fn youden_cutoff(
    values: &[f64],
    responders: &[bool],
    direction: Direction,
) -> Result<ContinuousCutoff, CutoffFailure> {
    let n_pos = responders.iter().filter(|&&r| r).count();
    let n_neg = responders.len() - n_pos;

    let mut pairs: Vec<(f64, bool)> = values.iter().copied().zip(responders.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    // Distinct values with responder / non-responder counts at each.
    let mut groups: Vec<(f64, usize, usize)> = Vec::new();
    for (v, r) in pairs {
        match groups.last_mut() {
            Some(last) if last.0 == v => {
                if r {
                    last.1 += 1;
                } else {
                    last.2 += 1;
                }
            }
            _ => groups.push((v, usize::from(r), usize::from(!r))),
        }
    }

    if groups.len() < 2 {
        return Err(CutoffFailure::InsufficientDistinctValues {
            n_distinct: groups.len(),
        });
    }
    if n_pos == 0 || n_neg == 0 {
        return Err(CutoffFailure::SingleOutcomeClass {
            responders: n_pos,
            non_responders: n_neg,
        });
    }

    // below[k] = (responders, non-responders) with value < groups[k].0
    let mut below = Vec::with_capacity(groups.len());
    let (mut r_acc, mut n_acc) = (0usize, 0usize);
    for &(_, r, n) in &groups {
        below.push((r_acc, n_acc));
        r_acc += r;
        n_acc += n;
    }

    // J = tp/P + tn/N - 1 is ordered like tp*N + tn*P, compared exactly.
    let score = |k: usize| -> (u128, usize, usize) {
        let (r_below, n_below) = below[k];
        let (tp, tn) = match direction {
            Direction::AtLeast => (n_pos - r_below, n_below),
            Direction::Below => (r_below, n_neg - n_below),
        };
        ((tp as u128) * (n_neg as u128) + (tn as u128) * (n_pos as u128), tp, tn)
    };

    let order: Box<dyn Iterator<Item = usize>> = match direction {
        Direction::AtLeast => Box::new(0..groups.len()),
        Direction::Below => Box::new((0..groups.len()).rev()),
    };
    let mut best: Option<(usize, u128)> = None;
    for k in order {
        let (s, _, _) = score(k);
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((k, s));
        }
    }
    let Some((k, _)) = best else {
        return Err(CutoffFailure::InsufficientDistinctValues { n_distinct: 0 });
    };

    let (_, tp, tn) = score(k);
    let sensitivity = tp as f64 / n_pos as f64;
    let specificity = tn as f64 / n_neg as f64;

    let (r_below, nr_below) = below[k];
    let n_below = r_below + nr_below;
    let n_above = responders.len() - n_below;
    let rate = |r: usize, n: usize| if n > 0 { r as f64 / n as f64 } else { f64::NAN };

    Ok(ContinuousCutoff {
        threshold: groups[k].0,
        direction,
        sensitivity,
        specificity,
        youden: sensitivity + specificity - 1.0,
        response_rate_above: rate(n_pos - r_below, n_above),
        response_rate_below: rate(r_below, n_below),
        n_above,
        n_below,
    })
}
