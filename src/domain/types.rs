// ==========================================
// SiteTrak - Domain Type Definitions
// ==========================================
// Responsibility: enumerations shared by the takeoff import pipeline
// Serialization format: SCREAMING_SNAKE_CASE (aligned with the database)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Component Type
// ==========================================
// Fixed enumeration of takeoff item types. Free-text spreadsheet values are
// normalized through `parse` (case-insensitive, tolerates plural forms).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentType {
    Spool,
    Valve,
    Fitting,
    Flange,
    Gasket,
    Support,
    Instrument,
    FieldWeld,
}

impl ComponentType {
    /// All variants in canonical order.
    pub const ALL: [ComponentType; 8] = [
        ComponentType::Spool,
        ComponentType::Valve,
        ComponentType::Fitting,
        ComponentType::Flange,
        ComponentType::Gasket,
        ComponentType::Support,
        ComponentType::Instrument,
        ComponentType::FieldWeld,
    ];

    /// Normalize a free-text type cell against the fixed enumeration.
    ///
    /// # Arguments
    /// - raw: cell value as it appears in the source file
    ///
    /// # Returns
    /// - Some(ComponentType): recognized (case-insensitive, plural tolerated)
    /// - None: not a known component type
    pub fn parse(raw: &str) -> Option<ComponentType> {
        let lowered = raw.trim().to_lowercase();
        let collapsed: String = lowered
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        let singular = collapsed.strip_suffix('s').unwrap_or(&collapsed);

        match singular {
            "spool" => Some(ComponentType::Spool),
            "valve" => Some(ComponentType::Valve),
            "fitting" => Some(ComponentType::Fitting),
            "flange" => Some(ComponentType::Flange),
            "gasket" => Some(ComponentType::Gasket),
            "support" => Some(ComponentType::Support),
            "instrument" => Some(ComponentType::Instrument),
            "fieldweld" | "weld" => Some(ComponentType::FieldWeld),
            _ => None,
        }
    }

    /// Parse the database representation (strict, SCREAMING_SNAKE_CASE).
    pub fn from_db(raw: &str) -> Option<ComponentType> {
        match raw {
            "SPOOL" => Some(ComponentType::Spool),
            "VALVE" => Some(ComponentType::Valve),
            "FITTING" => Some(ComponentType::Fitting),
            "FLANGE" => Some(ComponentType::Flange),
            "GASKET" => Some(ComponentType::Gasket),
            "SUPPORT" => Some(ComponentType::Support),
            "INSTRUMENT" => Some(ComponentType::Instrument),
            "FIELD_WELD" => Some(ComponentType::FieldWeld),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Spool => "SPOOL",
            ComponentType::Valve => "VALVE",
            ComponentType::Fitting => "FITTING",
            ComponentType::Flange => "FLANGE",
            ComponentType::Gasket => "GASKET",
            ComponentType::Support => "SUPPORT",
            ComponentType::Instrument => "INSTRUMENT",
            ComponentType::FieldWeld => "FIELD_WELD",
        }
    }

    /// Whether the commodity code already identifies the item uniquely within
    /// its drawing (tag-numbered items). Such records carry no sequence
    /// suffix in their component id.
    pub fn is_uniquely_tagged(&self) -> bool {
        matches!(
            self,
            ComponentType::Instrument | ComponentType::Spool | ComponentType::FieldWeld
        )
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// Reference Kind
// ==========================================
// The three lookup entities a takeoff row may reference by free text.
// Every per-kind routine must handle all three (exhaustive match).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceKind {
    Area,
    System,
    TestPackage,
}

impl ReferenceKind {
    pub const ALL: [ReferenceKind; 3] = [
        ReferenceKind::Area,
        ReferenceKind::System,
        ReferenceKind::TestPackage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::Area => "AREA",
            ReferenceKind::System => "SYSTEM",
            ReferenceKind::TestPackage => "TEST_PACKAGE",
        }
    }

    /// Table storing this reference kind.
    pub fn table(&self) -> &'static str {
        match self {
            ReferenceKind::Area => "area",
            ReferenceKind::System => "system",
            ReferenceKind::TestPackage => "test_package",
        }
    }

    /// Primary-key column of the kind's table.
    pub fn id_column(&self) -> &'static str {
        match self {
            ReferenceKind::Area => "area_id",
            ReferenceKind::System => "system_id",
            ReferenceKind::TestPackage => "test_package_id",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// Match Confidence
// ==========================================
// Tier that produced a header mapping. Ordered: Exact is the strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchConfidence {
    Exact,
    CaseInsensitive,
    Synonym,
}

impl fmt::Display for MatchConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchConfidence::Exact => write!(f, "EXACT"),
            MatchConfidence::CaseInsensitive => write!(f, "CASE_INSENSITIVE"),
            MatchConfidence::Synonym => write!(f, "SYNONYM"),
        }
    }
}
