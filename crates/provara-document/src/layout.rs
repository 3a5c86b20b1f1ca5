//! # Field Layout Registry
//!
//! The fixed mapping from semantic field name to tree slot index, shared by
//! the document builder (which hashes values into slots) and every witness
//! consumer (which must open the same slots). One layout per document type.
//!
//! ## Append-Only Invariant
//!
//! Changing an existing `(document_type, field_name) → slot_index` mapping
//! for a live document type would silently invalidate every historical
//! proof built against it. The registry therefore refuses any
//! re-registration that moves or removes an existing field
//! ([`LayoutError::LayoutFrozen`]); new fields may claim unused slots, and
//! each accepted extension increments the layout version.
//!
//! ## Bundles
//!
//! Related fields (e.g. the components of a postal address) may share one
//! slot as a bundle: their normalized values are joined and hashed as a
//! unit. A bundle is opened as a unit — individual components are not
//! independently provable once bundled.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use provara_core::{AttestationDomain, SlotIndex};
use provara_crypto::slot_tree::MAX_TREE_DEPTH;

/// Error in layout construction or registry maintenance.
#[derive(Error, Debug)]
pub enum LayoutError {
    /// Layout depth outside the supported range.
    #[error("layout depth must be between 1 and {MAX_TREE_DEPTH}, got {0}")]
    DepthOutOfRange(u8),

    /// A slot index at or beyond `2^depth`.
    #[error("slot {index} out of range for depth-{depth} layout")]
    SlotOutOfRange {
        /// The offending slot index.
        index: u16,
        /// The layout depth.
        depth: u8,
    },

    /// Two slot specs claimed the same index.
    #[error("duplicate slot index {0} in layout")]
    DuplicateSlot(u16),

    /// Two slot specs claimed the same field name.
    #[error("duplicate field name {0:?} in layout")]
    DuplicateField(String),

    /// An attempt to move or remove an existing field mapping.
    #[error("layout for {document_type} is frozen: field {field:?} is mapped to slot {existing} and cannot move to {requested}")]
    LayoutFrozen {
        /// The document type whose layout is live.
        document_type: String,
        /// The field whose mapping was being changed.
        field: String,
        /// The live slot index.
        existing: u16,
        /// The rejected new slot index.
        requested: u16,
    },

    /// A re-registration must carry a strictly newer version.
    #[error("layout for {document_type} version {submitted} does not supersede live version {live}")]
    StaleVersion {
        /// The document type whose layout is live.
        document_type: String,
        /// The live version.
        live: u32,
        /// The rejected submitted version.
        submitted: u32,
    },

    /// No layout is registered for the document type.
    #[error("no layout registered for document type {0}")]
    UnknownDocumentType(String),
}

/// How a field's raw value is normalized and later evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldEncoding {
    /// A string that must match a structural pattern (country code, LEI, CIN).
    Pattern,
    /// A string drawn from a closed status vocabulary ("ACTIVE", "ISSUED").
    Enum,
    /// A boolean flag.
    Boolean,
    /// A numeric magnitude or array length, evaluated against thresholds.
    Count,
    /// Free-form content hashed without further interpretation.
    Opaque,
}

/// One field within a layout: where it comes from in the parsed document,
/// how it normalizes, and whether its absence is a hard failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// The semantic field name used by predicates and disclosure requests.
    pub name: String,
    /// Dotted path into the parsed document (`"entity.legalName"`).
    pub path: String,
    /// Normalization and evaluation encoding.
    pub encoding: FieldEncoding,
    /// Whether the builder must refuse documents lacking this field.
    pub mandatory: bool,
}

impl FieldSpec {
    /// Construct a field spec.
    pub fn new(name: &str, path: &str, encoding: FieldEncoding, mandatory: bool) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            encoding,
            mandatory,
        }
    }
}

/// What a slot holds: a single field, or a bundle of related fields hashed
/// as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotSpec {
    /// One field in one slot.
    Field(FieldSpec),
    /// Several related fields joined into one slot.
    Bundle {
        /// The name under which the bundle is revealed and opened.
        name: String,
        /// The component fields, in joining order.
        members: Vec<FieldSpec>,
    },
}

impl SlotSpec {
    /// The name under which this slot is revealed.
    pub fn name(&self) -> &str {
        match self {
            Self::Field(f) => &f.name,
            Self::Bundle { name, .. } => name,
        }
    }

    /// The mandatory component fields of this slot.
    pub fn mandatory_fields(&self) -> Vec<&FieldSpec> {
        match self {
            Self::Field(f) if f.mandatory => vec![f],
            Self::Field(_) => vec![],
            Self::Bundle { members, .. } => members.iter().filter(|m| m.mandatory).collect(),
        }
    }
}

/// The slot table for one document type.
///
/// # Invariants
///
/// - `index → name` is a bijection (enforced at construction).
/// - Every index is below `2^depth`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentLayout {
    /// The document type this layout encodes.
    pub domain: AttestationDomain,
    /// Tree depth; the layout addresses `2^depth` slots.
    pub depth: u8,
    /// Layout version, incremented by accepted extensions.
    pub version: u32,
    slots: BTreeMap<SlotIndex, SlotSpec>,
}

impl DocumentLayout {
    /// Construct a validated layout.
    pub fn new(
        domain: AttestationDomain,
        depth: u8,
        version: u32,
        entries: Vec<(SlotIndex, SlotSpec)>,
    ) -> Result<Self, LayoutError> {
        if depth == 0 || depth > MAX_TREE_DEPTH {
            return Err(LayoutError::DepthOutOfRange(depth));
        }
        let capacity = 1usize << depth;
        let mut slots = BTreeMap::new();
        let mut names = std::collections::BTreeSet::new();
        for (index, spec) in entries {
            if index.as_usize() >= capacity {
                return Err(LayoutError::SlotOutOfRange {
                    index: index.0,
                    depth,
                });
            }
            if !names.insert(spec.name().to_string()) {
                return Err(LayoutError::DuplicateField(spec.name().to_string()));
            }
            if slots.insert(index, spec).is_some() {
                return Err(LayoutError::DuplicateSlot(index.0));
            }
        }
        Ok(Self {
            domain,
            depth,
            version,
            slots,
        })
    }

    /// The number of addressable slots (`2^depth`).
    pub fn capacity(&self) -> usize {
        1usize << self.depth
    }

    /// Iterate declared slots in index order.
    pub fn slots(&self) -> impl Iterator<Item = (&SlotIndex, &SlotSpec)> {
        self.slots.iter()
    }

    /// The spec at a slot index, if declared.
    pub fn slot(&self, index: SlotIndex) -> Option<&SlotSpec> {
        self.slots.get(&index)
    }

    /// Look up a slot by its revealed name.
    pub fn slot_by_name(&self, name: &str) -> Option<(SlotIndex, &SlotSpec)> {
        self.slots
            .iter()
            .find(|(_, spec)| spec.name() == name)
            .map(|(idx, spec)| (*idx, spec))
    }

    /// The name → index mapping, used for freeze checks.
    fn name_map(&self) -> BTreeMap<String, SlotIndex> {
        self.slots
            .iter()
            .map(|(idx, spec)| (spec.name().to_string(), *idx))
            .collect()
    }
}

/// The versioned, append-only table of layouts, one per document type.
#[derive(Debug, Clone, Default)]
pub struct LayoutRegistry {
    layouts: BTreeMap<AttestationDomain, DocumentLayout>,
}

impl LayoutRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the standard layout for every domain.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for layout in standard_layouts() {
            registry
                .register(layout)
                .expect("standard layouts are internally consistent");
        }
        registry
    }

    /// The live layout for a document type.
    pub fn layout(&self, domain: AttestationDomain) -> Result<&DocumentLayout, LayoutError> {
        self.layouts
            .get(&domain)
            .ok_or_else(|| LayoutError::UnknownDocumentType(domain.to_string()))
    }

    /// Register a layout, or supersede a live one.
    ///
    /// Superseding is append-only: every live `(field_name → slot)` mapping
    /// must be preserved exactly, new fields may only claim unused slots,
    /// and the version must strictly increase.
    pub fn register(&mut self, layout: DocumentLayout) -> Result<(), LayoutError> {
        if let Some(live) = self.layouts.get(&layout.domain) {
            if layout.version <= live.version {
                return Err(LayoutError::StaleVersion {
                    document_type: layout.domain.to_string(),
                    live: live.version,
                    submitted: layout.version,
                });
            }
            let new_map = layout.name_map();
            for (name, live_idx) in live.name_map() {
                match new_map.get(&name) {
                    Some(idx) if *idx == live_idx => {}
                    Some(idx) => {
                        return Err(LayoutError::LayoutFrozen {
                            document_type: layout.domain.to_string(),
                            field: name,
                            existing: live_idx.0,
                            requested: idx.0,
                        });
                    }
                    None => {
                        return Err(LayoutError::LayoutFrozen {
                            document_type: layout.domain.to_string(),
                            field: name,
                            existing: live_idx.0,
                            requested: live_idx.0,
                        });
                    }
                }
            }
        }
        self.layouts.insert(layout.domain, layout);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Standard layouts
// ---------------------------------------------------------------------------

/// The standard layouts for the five supported document types.
///
/// Field names here are the vocabulary the predicate rulesets evaluate;
/// paths follow the shapes the external document adapters deliver.
pub fn standard_layouts() -> Vec<DocumentLayout> {
    vec![
        corporate_registration_layout(),
        trade_license_layout(),
        legal_entity_layout(),
        shipping_document_layout(),
        liquidity_risk_layout(),
    ]
}

fn field(name: &str, path: &str, encoding: FieldEncoding, mandatory: bool) -> SlotSpec {
    SlotSpec::Field(FieldSpec::new(name, path, encoding, mandatory))
}

fn corporate_registration_layout() -> DocumentLayout {
    use FieldEncoding::*;
    DocumentLayout::new(
        AttestationDomain::CorporateRegistration,
        6,
        1,
        vec![
            (
                SlotIndex(0),
                field("company_name", "company.name", Opaque, true),
            ),
            (SlotIndex(1), field("cin", "company.cin", Pattern, true)),
            (
                SlotIndex(2),
                field("registration_status", "company.status", Enum, true),
            ),
            (
                SlotIndex(3),
                field("incorporation_date", "company.incorporationDate", Opaque, false),
            ),
            (
                SlotIndex(4),
                SlotSpec::Bundle {
                    name: "registered_address".to_string(),
                    members: vec![
                        FieldSpec::new("address_street", "address.street", Opaque, false),
                        FieldSpec::new("address_city", "address.city", Opaque, false),
                        FieldSpec::new("address_region", "address.region", Opaque, false),
                        FieldSpec::new("address_postal_code", "address.postalCode", Opaque, false),
                        FieldSpec::new("address_country", "address.country", Pattern, false),
                    ],
                },
            ),
            (SlotIndex(5), field("directors", "company.directors", Count, false)),
            (
                SlotIndex(6),
                field("company_category", "company.category", Enum, false),
            ),
            (
                SlotIndex(7),
                field("contact_email", "company.email", Opaque, false),
            ),
        ],
    )
    .expect("corporate registration layout is well-formed")
}

fn trade_license_layout() -> DocumentLayout {
    use FieldEncoding::*;
    DocumentLayout::new(
        AttestationDomain::TradeLicense,
        6,
        1,
        vec![
            (SlotIndex(0), field("entity_name", "entity.name", Opaque, true)),
            (SlotIndex(1), field("iec", "license.iec", Pattern, true)),
            (
                SlotIndex(2),
                field("license_status", "license.status", Enum, true),
            ),
            (
                SlotIndex(3),
                field("issue_date", "license.issueDate", Opaque, true),
            ),
            (
                SlotIndex(4),
                field("expiry_date", "license.expiryDate", Opaque, true),
            ),
            (
                SlotIndex(5),
                field("export_categories", "license.categories", Count, false),
            ),
            (
                SlotIndex(6),
                field("port_of_registration", "license.port", Opaque, false),
            ),
            (
                SlotIndex(7),
                SlotSpec::Bundle {
                    name: "issuing_office".to_string(),
                    members: vec![
                        FieldSpec::new("office_name", "office.name", Opaque, false),
                        FieldSpec::new("office_city", "office.city", Opaque, false),
                        FieldSpec::new("office_country", "office.country", Pattern, false),
                    ],
                },
            ),
        ],
    )
    .expect("trade license layout is well-formed")
}

fn legal_entity_layout() -> DocumentLayout {
    use FieldEncoding::*;
    DocumentLayout::new(
        AttestationDomain::LegalEntity,
        6,
        1,
        vec![
            (
                SlotIndex(0),
                field("legal_name", "entity.legalName", Opaque, true),
            ),
            (SlotIndex(1), field("lei", "lei", Pattern, true)),
            (
                SlotIndex(2),
                field("entity_status", "entity.status", Enum, true),
            ),
            (
                SlotIndex(3),
                field("registration_status", "registration.status", Enum, true),
            ),
            (
                SlotIndex(4),
                field("conformity_flag", "registration.conformityFlag", Enum, false),
            ),
            (
                SlotIndex(5),
                SlotSpec::Bundle {
                    name: "legal_address".to_string(),
                    members: vec![
                        FieldSpec::new("legal_street", "entity.legalAddress.street", Opaque, false),
                        FieldSpec::new("legal_city", "entity.legalAddress.city", Opaque, false),
                        FieldSpec::new("legal_region", "entity.legalAddress.region", Opaque, false),
                        FieldSpec::new(
                            "legal_country",
                            "entity.legalAddress.country",
                            Pattern,
                            false,
                        ),
                    ],
                },
            ),
            (
                SlotIndex(6),
                SlotSpec::Bundle {
                    name: "headquarters_address".to_string(),
                    members: vec![
                        FieldSpec::new("hq_street", "entity.hqAddress.street", Opaque, false),
                        FieldSpec::new("hq_city", "entity.hqAddress.city", Opaque, false),
                        FieldSpec::new("hq_country", "entity.hqAddress.country", Pattern, false),
                    ],
                },
            ),
            (
                SlotIndex(7),
                field("legal_jurisdiction", "entity.jurisdiction", Pattern, false),
            ),
            (
                SlotIndex(8),
                field("next_renewal_date", "registration.nextRenewalDate", Opaque, false),
            ),
        ],
    )
    .expect("legal entity layout is well-formed")
}

fn shipping_document_layout() -> DocumentLayout {
    use FieldEncoding::*;
    DocumentLayout::new(
        AttestationDomain::ShippingDocument,
        6,
        1,
        vec![
            (SlotIndex(0), field("shipper_name", "shipper.name", Opaque, true)),
            (SlotIndex(1), field("bol_number", "bolNumber", Opaque, true)),
            (SlotIndex(2), field("document_status", "status", Enum, true)),
            (
                SlotIndex(3),
                field("origin_country", "route.originCountry", Pattern, true),
            ),
            (
                SlotIndex(4),
                field("destination_country", "route.destinationCountry", Pattern, true),
            ),
            (SlotIndex(5), field("containers", "cargo.containers", Count, false)),
            (
                SlotIndex(6),
                SlotSpec::Bundle {
                    name: "vessel".to_string(),
                    members: vec![
                        FieldSpec::new("vessel_name", "vessel.name", Opaque, false),
                        FieldSpec::new("vessel_imo", "vessel.imo", Opaque, false),
                    ],
                },
            ),
            (SlotIndex(7), field("issue_date", "issueDate", Opaque, false)),
            (SlotIndex(8), field("carrier_name", "carrier.name", Opaque, false)),
        ],
    )
    .expect("shipping document layout is well-formed")
}

fn liquidity_risk_layout() -> DocumentLayout {
    use FieldEncoding::*;
    DocumentLayout::new(
        AttestationDomain::LiquidityRisk,
        6,
        1,
        vec![
            (
                SlotIndex(0),
                field("institution_name", "institution.name", Opaque, true),
            ),
            (
                SlotIndex(1),
                field("reporting_period", "report.period", Opaque, true),
            ),
            (SlotIndex(2), field("lcr_percent", "report.lcr", Count, true)),
            (SlotIndex(3), field("nsfr_percent", "report.nsfr", Count, false)),
            (
                SlotIndex(4),
                field("period_start", "report.periodStart", Opaque, true),
            ),
            (SlotIndex(5), field("period_end", "report.periodEnd", Opaque, true)),
            (SlotIndex(6), field("currency", "report.currency", Opaque, false)),
            (
                SlotIndex(7),
                field("basel_compliant", "report.baselCompliant", Boolean, false),
            ),
        ],
    )
    .expect("liquidity risk layout is well-formed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_layouts_cover_all_domains() {
        let layouts = standard_layouts();
        assert_eq!(layouts.len(), AttestationDomain::all_domains().len());
        for domain in AttestationDomain::all_domains() {
            assert!(
                layouts.iter().any(|l| l.domain == *domain),
                "no standard layout for {domain}"
            );
        }
    }

    #[test]
    fn test_builtin_registry_resolves_all_domains() {
        let registry = LayoutRegistry::builtin();
        for domain in AttestationDomain::all_domains() {
            assert!(registry.layout(*domain).is_ok());
        }
    }

    #[test]
    fn test_unknown_document_type() {
        let registry = LayoutRegistry::new();
        assert!(matches!(
            registry.layout(AttestationDomain::LegalEntity),
            Err(LayoutError::UnknownDocumentType(_))
        ));
    }

    #[test]
    fn test_duplicate_slot_rejected() {
        let result = DocumentLayout::new(
            AttestationDomain::LegalEntity,
            4,
            1,
            vec![
                (SlotIndex(0), field("a", "a", FieldEncoding::Opaque, false)),
                (SlotIndex(0), field("b", "b", FieldEncoding::Opaque, false)),
            ],
        );
        assert!(matches!(result, Err(LayoutError::DuplicateSlot(0))));
    }

    #[test]
    fn test_duplicate_field_name_rejected() {
        let result = DocumentLayout::new(
            AttestationDomain::LegalEntity,
            4,
            1,
            vec![
                (SlotIndex(0), field("a", "x", FieldEncoding::Opaque, false)),
                (SlotIndex(1), field("a", "y", FieldEncoding::Opaque, false)),
            ],
        );
        assert!(matches!(result, Err(LayoutError::DuplicateField(_))));
    }

    #[test]
    fn test_slot_out_of_range_rejected() {
        let result = DocumentLayout::new(
            AttestationDomain::LegalEntity,
            2,
            1,
            vec![(SlotIndex(4), field("a", "a", FieldEncoding::Opaque, false))],
        );
        assert!(matches!(result, Err(LayoutError::SlotOutOfRange { .. })));
    }

    #[test]
    fn test_extension_with_new_field_accepted() {
        let mut registry = LayoutRegistry::builtin();
        let live = registry.layout(AttestationDomain::LiquidityRisk).unwrap();
        let mut entries: Vec<(SlotIndex, SlotSpec)> =
            live.slots().map(|(i, s)| (*i, s.clone())).collect();
        entries.push((
            SlotIndex(9),
            field("hqla_total", "report.hqla", FieldEncoding::Count, false),
        ));
        let extended =
            DocumentLayout::new(AttestationDomain::LiquidityRisk, 6, 2, entries).unwrap();
        assert!(registry.register(extended).is_ok());
        let live = registry.layout(AttestationDomain::LiquidityRisk).unwrap();
        assert_eq!(live.version, 2);
        assert!(live.slot_by_name("hqla_total").is_some());
    }

    #[test]
    fn test_moving_live_field_rejected() {
        let mut registry = LayoutRegistry::builtin();
        let live = registry.layout(AttestationDomain::LegalEntity).unwrap();
        let mut entries: Vec<(SlotIndex, SlotSpec)> =
            live.slots().map(|(i, s)| (*i, s.clone())).collect();
        // Swap the slot of "lei" (slot 1) to an unused index.
        for (idx, spec) in entries.iter_mut() {
            if spec.name() == "lei" {
                *idx = SlotIndex(20);
            }
        }
        let moved = DocumentLayout::new(AttestationDomain::LegalEntity, 6, 2, entries).unwrap();
        assert!(matches!(
            registry.register(moved),
            Err(LayoutError::LayoutFrozen { .. })
        ));
    }

    #[test]
    fn test_removing_live_field_rejected() {
        let mut registry = LayoutRegistry::builtin();
        let live = registry.layout(AttestationDomain::LegalEntity).unwrap();
        let entries: Vec<(SlotIndex, SlotSpec)> = live
            .slots()
            .filter(|(_, s)| s.name() != "lei")
            .map(|(i, s)| (*i, s.clone()))
            .collect();
        let shrunk = DocumentLayout::new(AttestationDomain::LegalEntity, 6, 2, entries).unwrap();
        assert!(matches!(
            registry.register(shrunk),
            Err(LayoutError::LayoutFrozen { .. })
        ));
    }

    #[test]
    fn test_stale_version_rejected() {
        let mut registry = LayoutRegistry::builtin();
        let live = registry.layout(AttestationDomain::LegalEntity).unwrap().clone();
        assert!(matches!(
            registry.register(live),
            Err(LayoutError::StaleVersion { .. })
        ));
    }

    #[test]
    fn test_bundle_mandatory_fields() {
        let bundle = SlotSpec::Bundle {
            name: "addr".to_string(),
            members: vec![
                FieldSpec::new("street", "a.street", FieldEncoding::Opaque, true),
                FieldSpec::new("city", "a.city", FieldEncoding::Opaque, false),
            ],
        };
        let mandatory = bundle.mandatory_fields();
        assert_eq!(mandatory.len(), 1);
        assert_eq!(mandatory[0].name, "street");
    }
}
