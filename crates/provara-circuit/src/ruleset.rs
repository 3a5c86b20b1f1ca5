//! # Per-Domain Predicate Sets
//!
//! One table-driven ruleset per attestation domain, replacing the
//! hand-written-circuit-per-document-type pattern. A ruleset splits into:
//!
//! - **Core** predicates: every one must pass for the entity to be
//!   compliant in this domain.
//! - **Enhanced** predicates: evaluated and reported as a separate pass
//!   count; they never block core compliance.
//!
//! The field vocabulary matches the standard layouts in
//! `provara-document`: a ruleset's fields name the slots a prover must
//! reveal.

use serde::{Deserialize, Serialize};

use provara_core::AttestationDomain;

use crate::predicate::{FieldPattern, Predicate};

/// The predicate set for one attestation domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredicateSet {
    /// The domain this ruleset evaluates.
    pub domain: AttestationDomain,
    /// Predicates that must all pass for core compliance.
    pub core: Vec<Predicate>,
    /// Additional predicates reported without blocking core compliance.
    pub enhanced: Vec<Predicate>,
}

impl PredicateSet {
    /// The standard ruleset for a domain.
    pub fn standard(domain: AttestationDomain) -> Self {
        match domain {
            AttestationDomain::CorporateRegistration => corporate_registration(),
            AttestationDomain::TradeLicense => trade_license(),
            AttestationDomain::LegalEntity => legal_entity(),
            AttestationDomain::ShippingDocument => shipping_document(),
            AttestationDomain::LiquidityRisk => liquidity_risk(),
        }
    }

    /// The fields a prover must reveal: every field referenced by a core
    /// predicate, sorted and deduplicated.
    ///
    /// These are the mandatory fields of the circuit's final gate — a
    /// proof attempt that fails to reveal one of them is refused with the
    /// complete gap list, the same failure the document builder raises for
    /// absent mandatory source fields.
    pub fn mandatory_fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = self
            .core
            .iter()
            .flat_map(|p| p.fields())
            .map(|f| f.to_string())
            .collect();
        fields.sort();
        fields.dedup();
        fields
    }

    /// Every field referenced by any predicate in this set.
    pub fn all_fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = self
            .core
            .iter()
            .chain(self.enhanced.iter())
            .flat_map(|p| p.fields())
            .map(|f| f.to_string())
            .collect();
        fields.sort();
        fields.dedup();
        fields
    }
}

fn corporate_registration() -> PredicateSet {
    PredicateSet {
        domain: AttestationDomain::CorporateRegistration,
        core: vec![
            Predicate::NonEmpty {
                field: "company_name".into(),
            },
            Predicate::PatternMatch {
                field: "cin".into(),
                pattern: FieldPattern::Cin,
            },
            Predicate::StatusEquals {
                field: "registration_status".into(),
                expected: "ACTIVE".into(),
            },
        ],
        enhanced: vec![
            Predicate::CountAtLeast {
                field: "directors".into(),
                minimum: 2,
            },
            Predicate::NonEmpty {
                field: "contact_email".into(),
            },
        ],
    }
}

fn trade_license() -> PredicateSet {
    PredicateSet {
        domain: AttestationDomain::TradeLicense,
        core: vec![
            Predicate::NonEmpty {
                field: "entity_name".into(),
            },
            Predicate::PatternMatch {
                field: "iec".into(),
                pattern: FieldPattern::Iec,
            },
            Predicate::StatusEquals {
                field: "license_status".into(),
                expected: "ISSUED".into(),
            },
            Predicate::TemporalWindow {
                start_field: "issue_date".into(),
                end_field: "expiry_date".into(),
            },
        ],
        enhanced: vec![Predicate::CountAtLeast {
            field: "export_categories".into(),
            minimum: 1,
        }],
    }
}

fn legal_entity() -> PredicateSet {
    PredicateSet {
        domain: AttestationDomain::LegalEntity,
        core: vec![
            Predicate::NonEmpty {
                field: "legal_name".into(),
            },
            Predicate::PatternMatch {
                field: "lei".into(),
                pattern: FieldPattern::Lei,
            },
            Predicate::StatusEquals {
                field: "entity_status".into(),
                expected: "ACTIVE".into(),
            },
            Predicate::StatusEquals {
                field: "registration_status".into(),
                expected: "ISSUED".into(),
            },
        ],
        // An empty conformity flag fails the exclusion check without
        // blocking core compliance.
        enhanced: vec![
            Predicate::StatusExcludes {
                field: "conformity_flag".into(),
                forbidden: "NON_CONFORMING".into(),
            },
            Predicate::PatternMatch {
                field: "legal_jurisdiction".into(),
                pattern: FieldPattern::CountryCode,
            },
        ],
    }
}

fn shipping_document() -> PredicateSet {
    PredicateSet {
        domain: AttestationDomain::ShippingDocument,
        core: vec![
            Predicate::NonEmpty {
                field: "shipper_name".into(),
            },
            Predicate::NonEmpty {
                field: "bol_number".into(),
            },
            Predicate::StatusEquals {
                field: "document_status".into(),
                expected: "ISSUED".into(),
            },
            Predicate::PatternMatch {
                field: "origin_country".into(),
                pattern: FieldPattern::CountryCode,
            },
            Predicate::PatternMatch {
                field: "destination_country".into(),
                pattern: FieldPattern::CountryCode,
            },
        ],
        enhanced: vec![Predicate::CountAtLeast {
            field: "containers".into(),
            minimum: 1,
        }],
    }
}

fn liquidity_risk() -> PredicateSet {
    PredicateSet {
        domain: AttestationDomain::LiquidityRisk,
        core: vec![
            Predicate::NonEmpty {
                field: "institution_name".into(),
            },
            Predicate::NonEmpty {
                field: "reporting_period".into(),
            },
            Predicate::CountAtLeast {
                field: "lcr_percent".into(),
                minimum: 100,
            },
        ],
        enhanced: vec![
            Predicate::CountAtLeast {
                field: "nsfr_percent".into(),
                minimum: 100,
            },
            Predicate::StatusEquals {
                field: "basel_compliant".into(),
                expected: "true".into(),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_rulesets_exist_for_all_domains() {
        for domain in AttestationDomain::all_domains() {
            let set = PredicateSet::standard(*domain);
            assert_eq!(set.domain, *domain);
            assert!(!set.core.is_empty(), "{domain} has no core predicates");
        }
    }

    #[test]
    fn test_mandatory_fields_sorted_unique() {
        let set = PredicateSet::standard(AttestationDomain::TradeLicense);
        let fields = set.mandatory_fields();
        let mut sorted = fields.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(fields, sorted);
        assert!(fields.contains(&"iec".to_string()));
        assert!(fields.contains(&"issue_date".to_string()));
        assert!(fields.contains(&"expiry_date".to_string()));
    }

    #[test]
    fn test_legal_entity_conformity_is_enhanced_only() {
        let set = PredicateSet::standard(AttestationDomain::LegalEntity);
        assert!(!set
            .mandatory_fields()
            .contains(&"conformity_flag".to_string()));
        assert!(set.all_fields().contains(&"conformity_flag".to_string()));
    }

    #[test]
    fn test_ruleset_fields_exist_in_standard_layouts() {
        // Every field a ruleset references must be openable under the
        // domain's standard layout, or provers could never satisfy it.
        use provara_document::LayoutRegistry;
        let registry = LayoutRegistry::builtin();
        for domain in AttestationDomain::all_domains() {
            let layout = registry.layout(*domain).unwrap();
            let set = PredicateSet::standard(*domain);
            for field in set.all_fields() {
                assert!(
                    layout.slot_by_name(&field).is_some(),
                    "{domain} ruleset references {field:?} which the layout does not declare"
                );
            }
        }
    }

    #[test]
    fn test_serde_roundtrip() {
        let set = PredicateSet::standard(AttestationDomain::LiquidityRisk);
        let json = serde_json::to_string(&set).unwrap();
        let parsed: PredicateSet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.core, set.core);
        assert_eq!(parsed.enhanced, set.enhanced);
    }
}
