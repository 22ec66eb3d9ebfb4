//! Rank-based area under the ROC curve.

use std::cmp::Ordering;

/// Area under the ROC curve via the Mann–Whitney U statistic.
///
/// Probability that a randomly drawn responder scores higher than a randomly
/// drawn non-responder, ties counting one half. Returns `None` when either
/// class is empty or the inputs differ in length.
pub fn auc(scores: &[f64], responders: &[bool]) -> Option<f64> {
    if scores.len() != responders.len() {
        return None;
    }
    let n_pos = responders.iter().filter(|&&r| r).count();
    let n_neg = responders.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let ranks = average_ranks(scores);
    let rank_sum: f64 = ranks
        .iter()
        .zip(responders)
        .filter(|(_, &r)| r)
        .map(|(rank, _)| rank)
        .sum();

    let n_pos_f = n_pos as f64;
    let u = rank_sum - n_pos_f * (n_pos_f + 1.0) / 2.0;
    Some(u / (n_pos_f * n_neg as f64))
}

/// 1-based ranks with ties sharing their average rank.
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // Positions i..=j share ranks i+1..=j+1.
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg;
        }
        i = j + 1;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_perfect_separation() {
        let scores = vec![0.1, 0.2, 0.3, 0.8, 0.9, 1.0];
        let labels = vec![false, false, false, true, true, true];
        assert_eq!(auc(&scores, &labels), Some(1.0));
    }

    #[test]
    fn test_inverse_separation() {
        let scores = vec![0.8, 0.9, 1.0, 0.1, 0.2, 0.3];
        let labels = vec![false, false, false, true, true, true];
        assert_eq!(auc(&scores, &labels), Some(0.0));
    }

    #[test]
    fn test_all_tied() {
        let scores = vec![1.0; 6];
        let labels = vec![true, false, true, false, false, true];
        assert_relative_eq!(auc(&scores, &labels).unwrap(), 0.5);
    }

    #[test]
    fn test_partial_ties() {
        // Pairs (pos, neg): (2,1)=1 (2,2)=0.5 (3,1)=1 (3,2)=1 -> 3.5/4
        let scores = vec![1.0, 2.0, 2.0, 3.0];
        let labels = vec![false, false, true, true];
        assert_relative_eq!(auc(&scores, &labels).unwrap(), 0.875);
    }

    #[test]
    fn test_single_class() {
        assert!(auc(&[1.0, 2.0], &[true, true]).is_none());
        assert!(auc(&[1.0, 2.0], &[true]).is_none());
    }

    #[test]
    fn test_average_ranks() {
        let ranks = average_ranks(&[10.0, 20.0, 10.0, 30.0]);
        assert_eq!(ranks, vec![1.5, 3.0, 1.5, 4.0]);
    }
}
