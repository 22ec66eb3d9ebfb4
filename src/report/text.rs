//! Plain-text rendering of analysis results.

use crate::data::DatasetSummary;
use crate::impact::EnrollmentCriteria;
use crate::report::{CutoffRow, RankingRow};
use crate::select::{SelectionStatus, StepDecision};
use std::fmt;

/// `<0.001` for very small p-values, three decimals otherwise.
pub fn format_p_value(p: f64) -> String {
    if p.is_nan() {
        "NA".to_string()
    } else if p < 0.001 {
        "<0.001".to_string()
    } else {
        format!("{:.3}", p)
    }
}

/// `***` p < 0.001, `**` p < 0.01, `*` p < 0.05, `-` otherwise.
pub fn significance_stars(p: f64) -> &'static str {
    if p < 0.001 {
        "***"
    } else if p < 0.01 {
        "**"
    } else if p < 0.05 {
        "*"
    } else {
        "-"
    }
}

fn opt(v: Option<f64>, precision: usize) -> String {
    v.map_or_else(|| "NA".to_string(), |x| format!("{:.*}", precision, x))
}

fn truncate(s: &str, width: usize) -> String {
    s.chars().take(width).collect()
}

/// Ranking table, one line per biomarker.
pub fn render_ranking(rows: &[RankingRow]) -> String {
    RankingTable(rows).to_string()
}

struct RankingTable<'a>(&'a [RankingRow]);

impl fmt::Display for RankingTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<20} {:>4} {:>8} {:>17} {:>8} {:>6} {:>4}  {}",
            "Biomarker", "Rank", "OR", "95% CI", "p-value", "AUC", "Sig", "Status"
        )?;
        writeln!(f, "{}", "-".repeat(86))?;
        for r in self.0 {
            let ci = match (r.ci_lower, r.ci_upper) {
                (Some(lo), Some(hi)) => format!("[{:.2} - {:.2}]", lo, hi),
                _ => "NA".to_string(),
            };
            let status = match (&r.reason, r.eligible) {
                (Some(reason), _) => format!("{} ({})", r.status, reason),
                (None, true) => "eligible".to_string(),
                (None, false) => r.eligibility.clone(),
            };
            writeln!(
                f,
                "{:<20} {:>4} {:>8} {:>17} {:>8} {:>6} {:>4}  {}",
                truncate(&r.biomarker, 20),
                r.rank.map_or_else(|| "-".to_string(), |k| k.to_string()),
                opt(r.odds_ratio, 2),
                ci,
                r.p_value.map_or_else(|| "NA".to_string(), format_p_value),
                opt(r.auc, 2),
                r.p_value.map_or("", significance_stars),
                status
            )?;
        }
        Ok(())
    }
}

/// Cutoff table, one line per eligible biomarker.
pub fn render_cutoffs(rows: &[CutoffRow]) -> String {
    CutoffTable(rows).to_string()
}

struct CutoffTable<'a>(&'a [CutoffRow]);

impl fmt::Display for CutoffTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<20} {:>14} {:>11} {:>11} {:>8} {:>8} {:>8}",
            "Biomarker", "Cutoff", "Sensitivity", "Specificity", "Youden J", "RR in", "RR out"
        )?;
        writeln!(f, "{}", "-".repeat(86))?;
        for r in self.0 {
            let cutoff = match &r.threshold_or_category {
                Some(t) if r.operator == "∈" => format!("∈ {{{}}}", t),
                Some(t) => format!("{} {}", r.operator, t),
                None => "undefined".to_string(),
            };
            let (rr_in, rr_out) = if r.operator == "<" {
                (r.response_rate_below, r.response_rate_above)
            } else {
                (r.response_rate_above, r.response_rate_below)
            };
            write!(
                f,
                "{:<20} {:>14} {:>11} {:>11} {:>8} {:>8} {:>8}",
                truncate(&r.biomarker, 20),
                truncate(&cutoff, 14),
                opt(r.sensitivity, 2),
                opt(r.specificity, 2),
                opt(r.youden_index, 2),
                opt(rr_in, 2),
                opt(rr_out, 2)
            )?;
            if let Some(reason) = &r.reason {
                write!(f, "  {}", reason)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn percent(v: Option<f64>) -> String {
    v.map_or_else(|| "undefined".to_string(), |x| format!("{:.1}%", x * 100.0))
}

/// Recommended criteria with their impact.
pub fn render_criteria(criteria: &EnrollmentCriteria) -> String {
    CriteriaReport(criteria).to_string()
}

struct CriteriaReport<'a>(&'a EnrollmentCriteria);

impl fmt::Display for CriteriaReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let criteria = self.0;
        let impact = &criteria.impact;

        writeln!(f, "RECOMMENDED INCLUSION CRITERIA")?;
        writeln!(f, "==============================")?;
        writeln!(f)?;
        match criteria.status {
            SelectionStatus::Selected => {
                for (i, c) in criteria.criteria.iter().enumerate() {
                    writeln!(f, "  {}. {}", i + 1, c)?;
                }
            }
            SelectionStatus::ConstraintUnsatisfiable => {
                writeln!(
                    f,
                    "  None: every candidate criterion leaves too few eligible patients."
                )?;
                writeln!(f, "  The unenriched population is reported below.")?;
            }
            SelectionStatus::NoEligibleBiomarkers => {
                writeln!(f, "  None: no eligible biomarker with a defined cutoff.")?;
            }
        }

        let rejected: Vec<&str> = criteria
            .steps
            .iter()
            .filter(|s| s.decision == StepDecision::Rejected)
            .filter_map(|s| s.criterion.as_deref())
            .collect();
        if !rejected.is_empty() {
            writeln!(f)?;
            writeln!(f, "  Rejected (eligible fraction too low):")?;
            for c in rejected {
                writeln!(f, "    - {}", c)?;
            }
        }

        let enriched = impact.response_rate_enriched.value();
        writeln!(f)?;
        writeln!(f, "ENRICHMENT IMPACT")?;
        writeln!(f, "=================")?;
        writeln!(
            f,
            "  Unenriched response rate:   {}",
            percent(Some(impact.response_rate_unenriched))
        )?;
        write!(f, "  Enriched response rate:     {}", percent(enriched))?;
        if let Some(e) = enriched {
            write!(f, " ({:+.1}pp)", (e - impact.response_rate_unenriched) * 100.0)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "  Eligible patients:          {}/{} ({:.1}% of screened)",
            impact.n_eligible,
            impact.n_total,
            impact.eligible_fraction * 100.0
        )?;
        writeln!(
            f,
            "  Enrichment factor:          {}",
            impact
                .enrichment_factor
                .value()
                .map_or_else(|| "undefined".to_string(), |x| format!("{:.2}x", x))
        )?;
        writeln!(
            f,
            "  Number needed to screen:    {}",
            impact
                .number_needed_to_screen
                .value()
                .map_or_else(|| "undefined".to_string(), |n| format!("{:.1}", n))
        )
    }
}

/// Dataset summary block.
pub fn render_summary(summary: &DatasetSummary) -> String {
    summary.to_string()
}
