//! # Attestation Domain — Single Source of Truth
//!
//! Defines the `AttestationDomain` enum covering every document type the
//! engine can attest. This is the ONE definition used across the entire
//! workspace: field layouts, oracle key rings, predicate rulesets, and
//! composition plans all match on it exhaustively — adding a new domain
//! forces every consumer to handle it at compile time.
//!
//! ## Key Scoping
//!
//! Each domain corresponds to exactly one oracle signing authority and one
//! Ed25519 keypair. A signature produced under one domain's key can never
//! validate an attestation for another domain, because the attestation
//! message is domain-tagged before signing.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ProvaraError;

/// The document types (and matching oracle authorities) the engine attests.
///
/// | # | Domain | Source record |
/// |---|--------|---------------|
/// | 1 | CorporateRegistration | corporate registry entry (CIN-keyed) |
/// | 2 | TradeLicense | export/import license record (IEC-keyed) |
/// | 3 | LegalEntity | legal-entity identifier record (LEI-keyed) |
/// | 4 | ShippingDocument | bill of lading / shipping manifest |
/// | 5 | LiquidityRisk | liquidity-coverage reporting dataset |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttestationDomain {
    /// Corporate registry entry: incorporation, registration status, directors.
    CorporateRegistration,
    /// Trade/export license record: IEC validity, license window.
    TradeLicense,
    /// Legal-entity identifier record: LEI status and conformity.
    LegalEntity,
    /// Shipping document: bill of lading, cargo manifest, routing.
    ShippingDocument,
    /// Liquidity-risk dataset: coverage ratios, reporting period.
    LiquidityRisk,
}

/// Total number of attestation domains. Used for compile-time assertions.
pub const ATTESTATION_DOMAIN_COUNT: usize = 5;

impl AttestationDomain {
    /// Returns all domains in canonical composition order.
    pub fn all_domains() -> &'static [AttestationDomain] {
        &[
            Self::CorporateRegistration,
            Self::TradeLicense,
            Self::LegalEntity,
            Self::ShippingDocument,
            Self::LiquidityRisk,
        ]
    }

    /// Returns the snake_case string identifier for this domain.
    ///
    /// This must match the serde serialization format — layouts, archive
    /// keys, and composed-proof score maps all use this identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CorporateRegistration => "corporate_registration",
            Self::TradeLicense => "trade_license",
            Self::LegalEntity => "legal_entity",
            Self::ShippingDocument => "shipping_document",
            Self::LiquidityRisk => "liquidity_risk",
        }
    }

    /// The named signing authority whose key attests roots for this domain.
    pub fn authority(&self) -> &'static str {
        match self {
            Self::CorporateRegistration => "corporate-registration-authority",
            Self::TradeLicense => "trade-authority",
            Self::LegalEntity => "legal-entity-authority",
            Self::ShippingDocument => "shipping-document-authority",
            Self::LiquidityRisk => "liquidity-risk-authority",
        }
    }
}

impl std::fmt::Display for AttestationDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttestationDomain {
    type Err = ProvaraError;

    /// Parse a domain from its snake_case identifier.
    ///
    /// Accepts the same identifiers produced by [`AttestationDomain::as_str()`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "corporate_registration" => Ok(Self::CorporateRegistration),
            "trade_license" => Ok(Self::TradeLicense),
            "legal_entity" => Ok(Self::LegalEntity),
            "shipping_document" => Ok(Self::ShippingDocument),
            "liquidity_risk" => Ok(Self::LiquidityRisk),
            other => Err(ProvaraError::Validation(format!(
                "unknown attestation domain: {other:?}"
            ))),
        }
    }
}
