//! # Compliance Predicates
//!
//! The six predicate kinds composable (by AND) into a domain's ruleset.
//! Evaluation is fail-closed everywhere: a missing field, an unparseable
//! date, or a non-numeric count makes the predicate false — it never makes
//! the circuit guess.
//!
//! Structural patterns are validated with explicit character checks, not a
//! regex engine: the patterns are fixed (country code, LEI, CIN, IEC) and
//! their shapes are part of the verification contract.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use provara_core::Timestamp;

/// Values treated as "empty/placeholder" by non-empty and exclusion checks.
const PLACEHOLDER_VALUES: &[&str] = &["", "-", "n/a", "na", "null", "unknown"];

/// Whether a revealed value is an empty or placeholder marker.
pub fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim().to_lowercase();
    PLACEHOLDER_VALUES.contains(&trimmed.as_str())
}

/// A fixed structural pattern for identifier fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldPattern {
    /// ISO 3166-1 alpha-2 country code: two ASCII uppercase letters.
    CountryCode,
    /// Legal Entity Identifier: 20 uppercase alphanumerics, last two digits.
    Lei,
    /// Corporate Identification Number: 21 uppercase alphanumerics starting
    /// with the listing marker `L` or `U`.
    Cin,
    /// Import-Export Code: 10 uppercase alphanumerics.
    Iec,
}

impl FieldPattern {
    /// Whether `value` matches this pattern.
    pub fn matches(&self, value: &str) -> bool {
        let v = value.trim();
        match self {
            Self::CountryCode => {
                v.len() == 2 && v.bytes().all(|b| b.is_ascii_uppercase())
            }
            Self::Lei => {
                v.len() == 20
                    && v.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
                    && v.bytes().rev().take(2).all(|b| b.is_ascii_digit())
            }
            Self::Cin => {
                v.len() == 21
                    && matches!(v.as_bytes().first(), Some(b'L') | Some(b'U'))
                    && v.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
            }
            Self::Iec => {
                v.len() == 10
                    && v.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
            }
        }
    }

    /// The pattern's identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CountryCode => "country_code",
            Self::Lei => "lei",
            Self::Cin => "cin",
            Self::Iec => "iec",
        }
    }
}

/// One compliance predicate over revealed fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Predicate {
    /// The field must equal one canonical value (e.g. `"ACTIVE"`).
    StatusEquals {
        /// The revealed field evaluated.
        field: String,
        /// The required canonical value.
        expected: String,
    },
    /// The field must not equal a forbidden value, and must not be empty.
    StatusExcludes {
        /// The revealed field evaluated.
        field: String,
        /// The forbidden value.
        forbidden: String,
    },
    /// The evaluation time must fall within `[start, end]` parsed from two
    /// revealed date fields. Fails closed if either date is missing or
    /// unparseable.
    TemporalWindow {
        /// Field holding the window start date.
        start_field: String,
        /// Field holding the window end date.
        end_field: String,
    },
    /// The field must be present and not an empty/placeholder value.
    NonEmpty {
        /// The revealed field evaluated.
        field: String,
    },
    /// The numeric field (count or magnitude) must be at least `minimum`.
    CountAtLeast {
        /// The revealed field evaluated.
        field: String,
        /// The inclusive lower bound.
        minimum: u64,
    },
    /// The field must match a fixed structural pattern.
    PatternMatch {
        /// The revealed field evaluated.
        field: String,
        /// The required pattern.
        pattern: FieldPattern,
    },
}

impl Predicate {
    /// The revealed field names this predicate evaluates.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::StatusEquals { field, .. }
            | Self::StatusExcludes { field, .. }
            | Self::NonEmpty { field }
            | Self::CountAtLeast { field, .. }
            | Self::PatternMatch { field, .. } => vec![field],
            Self::TemporalWindow {
                start_field,
                end_field,
            } => vec![start_field, end_field],
        }
    }

    /// Evaluate this predicate over the revealed field map at `now`.
    ///
    /// Missing fields evaluate to `false` — never to a default value.
    pub fn evaluate(&self, revealed: &BTreeMap<String, String>, now: Timestamp) -> bool {
        match self {
            Self::StatusEquals { field, expected } => {
                revealed.get(field).is_some_and(|v| v.trim() == expected)
            }
            Self::StatusExcludes { field, forbidden } => revealed
                .get(field)
                .is_some_and(|v| !is_placeholder(v) && v.trim() != forbidden),
            Self::TemporalWindow {
                start_field,
                end_field,
            } => {
                let start = revealed.get(start_field).and_then(|v| parse_moment(v));
                let end = revealed.get(end_field).and_then(|v| parse_moment(v));
                match (start, end) {
                    (Some(start), Some(end)) => start <= now && now <= end,
                    _ => false,
                }
            }
            Self::NonEmpty { field } => {
                revealed.get(field).is_some_and(|v| !is_placeholder(v))
            }
            Self::CountAtLeast { field, minimum } => revealed
                .get(field)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .is_some_and(|n| n >= *minimum),
            Self::PatternMatch { field, pattern } => {
                revealed.get(field).is_some_and(|v| pattern.matches(v))
            }
        }
    }
}

/// Parse a revealed date field as a moment in time.
///
/// Accepts bare `YYYY-MM-DD` dates (pinned to UTC midnight) and full
/// RFC 3339 timestamps with any offset. Anything else is `None`, which the
/// temporal-window predicate treats as failure.
fn parse_moment(value: &str) -> Option<Timestamp> {
    Timestamp::parse_date(value)
        .or_else(|_| Timestamp::parse_lenient(value))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn noon() -> Timestamp {
        Timestamp::parse("2026-06-15T12:00:00Z").unwrap()
    }

    // ---- status-equality ----

    #[test]
    fn test_status_equals() {
        let p = Predicate::StatusEquals {
            field: "entity_status".into(),
            expected: "ACTIVE".into(),
        };
        assert!(p.evaluate(&fields(&[("entity_status", "ACTIVE")]), noon()));
        assert!(!p.evaluate(&fields(&[("entity_status", "INACTIVE")]), noon()));
        assert!(!p.evaluate(&fields(&[]), noon()));
    }

    // ---- status-exclusion ----

    #[test]
    fn test_status_excludes_forbidden_value() {
        let p = Predicate::StatusExcludes {
            field: "conformity_flag".into(),
            forbidden: "NON_CONFORMING".into(),
        };
        assert!(p.evaluate(&fields(&[("conformity_flag", "CONFORMING")]), noon()));
        assert!(!p.evaluate(&fields(&[("conformity_flag", "NON_CONFORMING")]), noon()));
    }

    #[test]
    fn test_status_excludes_fails_on_empty() {
        let p = Predicate::StatusExcludes {
            field: "conformity_flag".into(),
            forbidden: "NON_CONFORMING".into(),
        };
        assert!(!p.evaluate(&fields(&[("conformity_flag", "")]), noon()));
        assert!(!p.evaluate(&fields(&[("conformity_flag", "N/A")]), noon()));
        assert!(!p.evaluate(&fields(&[]), noon()));
    }

    // ---- temporal-window ----

    #[test]
    fn test_temporal_window_inside() {
        let p = Predicate::TemporalWindow {
            start_field: "issue_date".into(),
            end_field: "expiry_date".into(),
        };
        let f = fields(&[("issue_date", "2025-01-01"), ("expiry_date", "2027-01-01")]);
        assert!(p.evaluate(&f, noon()));
    }

    #[test]
    fn test_temporal_window_expired() {
        let p = Predicate::TemporalWindow {
            start_field: "issue_date".into(),
            end_field: "expiry_date".into(),
        };
        let f = fields(&[("issue_date", "2020-01-01"), ("expiry_date", "2021-01-01")]);
        assert!(!p.evaluate(&f, noon()));
    }

    #[test]
    fn test_temporal_window_not_yet_valid() {
        let p = Predicate::TemporalWindow {
            start_field: "issue_date".into(),
            end_field: "expiry_date".into(),
        };
        let f = fields(&[("issue_date", "2027-01-01"), ("expiry_date", "2028-01-01")]);
        assert!(!p.evaluate(&f, noon()));
    }

    #[test]
    fn test_temporal_window_fails_closed() {
        let p = Predicate::TemporalWindow {
            start_field: "issue_date".into(),
            end_field: "expiry_date".into(),
        };
        // Missing end date.
        assert!(!p.evaluate(&fields(&[("issue_date", "2025-01-01")]), noon()));
        // Unparseable start date.
        let f = fields(&[("issue_date", "01/01/2025"), ("expiry_date", "2027-01-01")]);
        assert!(!p.evaluate(&f, noon()));
        // Empty values.
        let f = fields(&[("issue_date", ""), ("expiry_date", "")]);
        assert!(!p.evaluate(&f, noon()));
    }

    #[test]
    fn test_temporal_window_accepts_rfc3339() {
        let p = Predicate::TemporalWindow {
            start_field: "start".into(),
            end_field: "end".into(),
        };
        let f = fields(&[
            ("start", "2026-06-15T00:00:00Z"),
            ("end", "2026-06-15T23:59:59Z"),
        ]);
        assert!(p.evaluate(&f, noon()));
    }

    #[test]
    fn test_temporal_window_boundary_inclusive() {
        let p = Predicate::TemporalWindow {
            start_field: "start".into(),
            end_field: "end".into(),
        };
        let f = fields(&[
            ("start", "2026-06-15T12:00:00Z"),
            ("end", "2026-06-15T12:00:00Z"),
        ]);
        assert!(p.evaluate(&f, noon()));
    }

    // ---- non-empty ----

    #[test]
    fn test_non_empty() {
        let p = Predicate::NonEmpty {
            field: "legal_name".into(),
        };
        assert!(p.evaluate(&fields(&[("legal_name", "Acme Exports")]), noon()));
        assert!(!p.evaluate(&fields(&[("legal_name", "")]), noon()));
        assert!(!p.evaluate(&fields(&[("legal_name", "  ")]), noon()));
        assert!(!p.evaluate(&fields(&[("legal_name", "N/A")]), noon()));
        assert!(!p.evaluate(&fields(&[("legal_name", "-")]), noon()));
        assert!(!p.evaluate(&fields(&[]), noon()));
    }

    // ---- count-threshold ----

    #[test]
    fn test_count_at_least() {
        let p = Predicate::CountAtLeast {
            field: "containers".into(),
            minimum: 1,
        };
        assert!(p.evaluate(&fields(&[("containers", "2")]), noon()));
        assert!(p.evaluate(&fields(&[("containers", "1")]), noon()));
        assert!(!p.evaluate(&fields(&[("containers", "0")]), noon()));
        assert!(!p.evaluate(&fields(&[("containers", "many")]), noon()));
        assert!(!p.evaluate(&fields(&[]), noon()));
    }

    // ---- pattern-match ----

    #[test]
    fn test_country_code_pattern() {
        let p = FieldPattern::CountryCode;
        assert!(p.matches("IN"));
        assert!(p.matches("AE"));
        assert!(!p.matches("IND"));
        assert!(!p.matches("in"));
        assert!(!p.matches("1N"));
        assert!(!p.matches(""));
    }

    #[test]
    fn test_lei_pattern() {
        let p = FieldPattern::Lei;
        assert!(p.matches("549300EXAMPLE00LEI00"));
        assert!(!p.matches("549300EXAMPLE00LEI0")); // 19 chars
        assert!(!p.matches("549300example00lei00")); // lowercase
        assert!(!p.matches("549300EXAMPLE00LEIXX")); // non-digit checksum
    }

    #[test]
    fn test_cin_pattern() {
        let p = FieldPattern::Cin;
        assert!(p.matches("U01119TZ1994PTC016225"));
        assert!(p.matches("L17110MH1973PLC019786"));
        assert!(!p.matches("X01119TZ1994PTC016225")); // bad listing marker
        assert!(!p.matches("U01119TZ1994PTC01622")); // 20 chars
    }

    #[test]
    fn test_iec_pattern() {
        let p = FieldPattern::Iec;
        assert!(p.matches("0596001234"));
        assert!(p.matches("AAACC1206D"));
        assert!(!p.matches("059600123")); // 9 chars
        assert!(!p.matches("0596-01234")); // separator
    }

    #[test]
    fn test_pattern_match_predicate_missing_field() {
        let p = Predicate::PatternMatch {
            field: "lei".into(),
            pattern: FieldPattern::Lei,
        };
        assert!(!p.evaluate(&fields(&[]), noon()));
    }

    // ---- field listing ----

    #[test]
    fn test_fields_listed() {
        let p = Predicate::TemporalWindow {
            start_field: "a".into(),
            end_field: "b".into(),
        };
        assert_eq!(p.fields(), vec!["a", "b"]);
        let q = Predicate::NonEmpty { field: "x".into() };
        assert_eq!(q.fields(), vec!["x"]);
    }

    #[test]
    fn test_serde_roundtrip() {
        let p = Predicate::CountAtLeast {
            field: "lcr_percent".into(),
            minimum: 100,
        };
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("count_at_least"));
        let parsed: Predicate = serde_json::from_str(&json).unwrap();
        assert_eq!(p, parsed);
    }
}
