//! Outcome label canonicalization.

use crate::data::{Outcome, RawValue};

const RESPONDER_LABELS: &[&str] = &["responder", "1", "yes"];
const NON_RESPONDER_LABELS: &[&str] = &["non_responder", "0", "no"];

/// Map a raw outcome cell to a canonical outcome.
///
/// Accepts `responder`/`non_responder`, `1`/`0` and `yes`/`no`, ignoring case.
/// Returns `None` for any other non-missing label and for missing cells.
pub fn canonicalize_outcome(value: &RawValue) -> Option<Outcome> {
    match value {
        RawValue::Number(v) if *v == 1.0 => Some(Outcome::Responder),
        RawValue::Number(v) if *v == 0.0 => Some(Outcome::NonResponder),
        RawValue::Number(_) | RawValue::Missing => None,
        RawValue::Text(s) => {
            let lower = s.trim().to_lowercase();
            if RESPONDER_LABELS.contains(&lower.as_str()) {
                Some(Outcome::Responder)
            } else if NON_RESPONDER_LABELS.contains(&lower.as_str()) {
                Some(Outcome::NonResponder)
            } else {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_pairs() {
        for (label, expected) in [
            ("responder", Outcome::Responder),
            ("NON_RESPONDER", Outcome::NonResponder),
            ("Yes", Outcome::Responder),
            ("no", Outcome::NonResponder),
            ("1", Outcome::Responder),
            ("0", Outcome::NonResponder),
        ] {
            assert_eq!(
                canonicalize_outcome(&RawValue::parse(label)),
                Some(expected),
                "label {label}"
            );
        }
    }

    #[test]
    fn test_numeric_codes() {
        assert_eq!(canonicalize_outcome(&RawValue::Number(1.0)), Some(Outcome::Responder));
        assert_eq!(canonicalize_outcome(&RawValue::Number(0.0)), Some(Outcome::NonResponder));
        assert_eq!(canonicalize_outcome(&RawValue::Number(2.0)), None);
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(canonicalize_outcome(&RawValue::parse("partial")), None);
        assert_eq!(canonicalize_outcome(&RawValue::parse("true")), None);
        assert_eq!(canonicalize_outcome(&RawValue::Missing), None);
    }
}
