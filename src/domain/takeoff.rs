// ==========================================
// SiteTrak - Takeoff Import Domain Model
// ==========================================
// Purpose: structures flowing through the takeoff import pipeline
//          (header mapping -> row parsing -> explosion -> commit)
// Aligned: schema.sql drawing / component / area / system / test_package /
//          import_batch tables
// ==========================================

use crate::domain::types::{ComponentType, MatchConfidence, ReferenceKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Size token used in component ids when the size cell is absent.
pub const NO_SIZE_TOKEN: &str = "NOSIZE";

// ==========================================
// TargetField - Canonical Import Columns
// ==========================================
// The fixed set of columns the pipeline understands. Everything else in a
// source file lands in the per-row unmapped bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetField {
    Drawing,       // drawing number (identity parent)
    ComponentType, // item type, normalized against ComponentType
    Quantity,      // non-negative integer count
    CommodityCode, // commodity / ident code
    Size,          // nominal size, optional
    Spec,          // piping spec, optional
    Description,   // free text, optional
    Comments,      // free text, optional
    Area,          // area reference name, optional
    System,        // system reference name, optional
    TestPackage,   // test package reference name, optional
}

impl TargetField {
    pub const ALL: [TargetField; 11] = [
        TargetField::Drawing,
        TargetField::ComponentType,
        TargetField::Quantity,
        TargetField::CommodityCode,
        TargetField::Size,
        TargetField::Spec,
        TargetField::Description,
        TargetField::Comments,
        TargetField::Area,
        TargetField::System,
        TargetField::TestPackage,
    ];

    /// Canonical header label as printed in templates and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            TargetField::Drawing => "drawing",
            TargetField::ComponentType => "type",
            TargetField::Quantity => "qty",
            TargetField::CommodityCode => "cmdty code",
            TargetField::Size => "size",
            TargetField::Spec => "spec",
            TargetField::Description => "description",
            TargetField::Comments => "comments",
            TargetField::Area => "area",
            TargetField::System => "system",
            TargetField::TestPackage => "test package",
        }
    }

    /// Required fields block the import when no header maps to them.
    pub fn required(&self) -> bool {
        matches!(
            self,
            TargetField::Drawing
                | TargetField::ComponentType
                | TargetField::Quantity
                | TargetField::CommodityCode
        )
    }

    /// Built-in synonym list (matched after normalization).
    pub fn builtin_synonyms(&self) -> &'static [&'static str] {
        match self {
            TargetField::Drawing => &[
                "dwg",
                "dwg no",
                "drawing no",
                "drawing number",
                "iso",
                "iso no",
                "isometric",
            ],
            TargetField::ComponentType => &["component type", "item type", "category", "class"],
            TargetField::Quantity => &["quantity", "count", "qty reqd", "req qty"],
            TargetField::CommodityCode => &[
                "commodity code",
                "ident code",
                "ident",
                "part number",
                "part no",
                "material code",
                "item code",
            ],
            TargetField::Size => &[
                "size 1",
                "main size",
                "nominal size",
                "nps",
                "diameter",
                "dia",
            ],
            TargetField::Spec => &["piping spec", "pipe spec", "spec code", "material spec"],
            TargetField::Description => &[
                "desc",
                "item description",
                "short desc",
                "material description",
            ],
            TargetField::Comments => &["comment", "remarks", "notes", "note"],
            TargetField::Area => &["area code", "unit", "work area", "zone"],
            TargetField::System => &["system code", "system name", "sys", "subsystem"],
            TargetField::TestPackage => &[
                "test pack",
                "test pkg",
                "tp",
                "package",
                "test package no",
                "hydro package",
            ],
        }
    }
}

impl fmt::Display for TargetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ==========================================
// ColumnMapping / MappingResult
// ==========================================
// Output of the column mapper. Pure data so the mapping can be previewed
// without touching the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub source_index: usize,        // 0-based column index in the source file
    pub source_header: String,      // header cell exactly as read
    pub field: TargetField,         // canonical field it maps to
    pub confidence: MatchConfidence, // tier that produced the match
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmappedColumn {
    pub source_index: usize,   // 0-based column index
    pub source_header: String, // header cell exactly as read
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingResult {
    pub mappings: Vec<ColumnMapping>,       // one entry per matched source column
    pub missing_required: Vec<TargetField>, // required fields no header matched
    pub unmapped: Vec<UnmappedColumn>,      // source columns left over
}

impl MappingResult {
    /// Whether every required field found a source column.
    pub fn is_complete(&self) -> bool {
        self.missing_required.is_empty()
    }

    /// Look up the source column index mapped to a field, if any.
    pub fn index_of(&self, field: TargetField) -> Option<usize> {
        self.mappings
            .iter()
            .find(|m| m.field == field)
            .map(|m| m.source_index)
    }
}

// ==========================================
// ParsedRow - Typed Source Row
// ==========================================
// One validated data row. Optional text fields hold None where the source
// cell was empty; the unmapped bag keeps everything the mapper skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedRow {
    pub row_number: usize,            // 1-based data row number (header excluded)
    pub drawing_no: String,           // required
    pub component_type: ComponentType, // required, normalized
    pub quantity: u32,                // required, non-negative integer
    pub commodity_code: String,       // required
    pub size: Option<String>,         // optional
    pub spec: Option<String>,         // optional
    pub description: Option<String>,  // optional
    pub comments: Option<String>,     // optional
    pub area: Option<String>,         // reference name, optional
    pub system: Option<String>,       // reference name, optional
    pub test_package: Option<String>, // reference name, optional
    pub unmapped_fields: BTreeMap<String, String>, // raw header -> raw cell
}

// ==========================================
// RowError - Per-Row Validation Failure
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row_number: usize,      // 1-based data row number
    pub column: Option<String>, // offending column label, if attributable
    pub message: String,        // human-readable reason
}

impl RowError {
    pub fn new(row_number: usize, column: Option<&str>, message: impl Into<String>) -> Self {
        RowError {
            row_number,
            column: column.map(|c| c.to_string()),
            message: message.into(),
        }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.column {
            Some(col) => write!(f, "row {} [{}]: {}", self.row_number, col, self.message),
            None => write!(f, "row {}: {}", self.row_number, self.message),
        }
    }
}

// ==========================================
// ComponentRecord - Exploded Unit Record
// ==========================================
// One physical trackable item produced by quantity explosion. The component
// id is unique within its drawing:
//   <drawing>-<size token>-<commodity code>[-NNN]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub component_id: String,          // identity key within the drawing
    pub drawing_no: String,            // parent drawing number
    pub component_type: ComponentType, // normalized type
    pub size_token: String,            // normalized size or NOSIZE
    pub commodity_code: String,        // commodity / ident code
    pub sequence: Option<u32>,         // 1-based unit number, None for tagged types
    pub area: Option<String>,          // reference name (resolved to id at commit)
    pub system: Option<String>,        // reference name (resolved to id at commit)
    pub test_package: Option<String>,  // reference name (resolved to id at commit)
    pub attributes: ComponentAttributes, // descriptive payload
    pub source_row: usize,             // data row the unit came from
}

// ==========================================
// ComponentAttributes - Descriptive Payload
// ==========================================
// Stored as JSON on the component row. `extra` carries the unmapped bag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentAttributes {
    pub size: Option<String>,        // size cell as entered
    pub spec: Option<String>,        // piping spec
    pub description: Option<String>, // free text
    pub comments: Option<String>,    // free text
    pub source_quantity: u32,        // qty of the originating row
    pub extra: BTreeMap<String, String>, // unmapped source columns
}

// ==========================================
// DuplicateIdentity - Cross-Row Collision
// ==========================================
// Two or more source rows produced the same component id under one drawing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateIdentity {
    pub drawing_no: String,   // drawing scope of the collision
    pub component_id: String, // colliding id
    pub rows: Vec<usize>,     // every source row involved, ascending
}

impl fmt::Display for DuplicateIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on drawing {} (rows {})",
            self.component_id,
            self.drawing_no,
            self.rows
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

// ==========================================
// MetadataReference / MetadataPlan
// ==========================================
// Deduplicated reference names collected from parsed rows, one bucket per
// kind. Discovery resolves each name's state; the commit re-resolves inside
// its transaction, so a stale discovery never corrupts the import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceState {
    /// Name already has a row; `record_id` is its id at discovery time.
    Exists { record_id: String },
    /// No row found; the commit will insert-if-absent.
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataReference {
    pub name: String,          // exact text from the source rows
    pub state: ReferenceState, // discovery outcome
}

impl MetadataReference {
    pub fn missing(name: impl Into<String>) -> Self {
        MetadataReference {
            name: name.into(),
            state: ReferenceState::Missing,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataPlan {
    pub areas: Vec<MetadataReference>,         // distinct area names, first-seen order
    pub systems: Vec<MetadataReference>,       // distinct system names, first-seen order
    pub test_packages: Vec<MetadataReference>, // distinct test package names, first-seen order
}

impl MetadataPlan {
    pub fn names_for(&self, kind: ReferenceKind) -> &[MetadataReference] {
        match kind {
            ReferenceKind::Area => &self.areas,
            ReferenceKind::System => &self.systems,
            ReferenceKind::TestPackage => &self.test_packages,
        }
    }

    pub fn names_for_mut(&mut self, kind: ReferenceKind) -> &mut Vec<MetadataReference> {
        match kind {
            ReferenceKind::Area => &mut self.areas,
            ReferenceKind::System => &mut self.systems,
            ReferenceKind::TestPackage => &mut self.test_packages,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty() && self.systems.is_empty() && self.test_packages.is_empty()
    }

    /// Names discovery could not find (candidates for creation).
    pub fn missing_count(&self, kind: ReferenceKind) -> usize {
        self.names_for(kind)
            .iter()
            .filter(|r| matches!(r.state, ReferenceState::Missing))
            .count()
    }

    /// Name -> id map over the references discovery found.
    pub fn existing_ids(&self, kind: ReferenceKind) -> std::collections::HashMap<String, String> {
        self.names_for(kind)
            .iter()
            .filter_map(|r| match &r.state {
                ReferenceState::Exists { record_id } => {
                    Some((r.name.clone(), record_id.clone()))
                }
                ReferenceState::Missing => None,
            })
            .collect()
    }
}

// ==========================================
// ImportCommit - Transactional Payload
// ==========================================
// Everything the repository needs to persist one import atomically. Its
// serialized size is what the payload ceiling is checked against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportCommit {
    pub batch_id: String,              // UUID of this attempt
    pub project_id: String,            // owning project
    pub file_name: Option<String>,     // source file name, if file-based
    pub imported_by: Option<String>,   // acting user id
    pub drawing_nos: Vec<String>,      // distinct drawings, first-seen order
    pub components: Vec<ComponentRecord>, // exploded unit records
    pub metadata: MetadataPlan,        // reference names to resolve or create
    pub total_rows: usize,             // data rows in the source
    pub error_rows: usize,             // rows with at least one parse error
    pub row_errors: Vec<RowError>,     // parse errors for the audit trail
    pub elapsed_ms: i64,               // pipeline time up to the commit call
}

// ==========================================
// Drawing - Persisted Drawing Row
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drawing {
    pub drawing_id: String,          // UUID
    pub project_id: String,          // owning project
    pub drawing_no: String,          // number unique within the project
    pub last_import_batch_id: Option<String>, // batch that last touched it
    pub created_at: DateTime<Utc>,   // first import time
    pub updated_at: DateTime<Utc>,   // last import time
}

// ==========================================
// ImportBatch - Batch Audit Row
// ==========================================
// One row per commit attempt that reached the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,                   // UUID
    pub project_id: String,                 // owning project
    pub file_name: Option<String>,          // source file name
    pub total_rows: i32,                    // data rows in the source
    pub success_rows: i32,                  // rows that produced components
    pub error_rows: i32,                    // rows rejected during parsing
    pub components_inserted: i32,           // unit records written
    pub drawings_created: i32,              // drawings inserted
    pub drawings_updated: i32,              // drawings already present
    pub imported_at: Option<DateTime<Utc>>, // commit time
    pub imported_by: Option<String>,        // acting user id
    pub elapsed_ms: Option<i32>,            // wall time of the whole attempt
    pub error_report_json: Option<String>,  // row errors, JSON array
}

// ==========================================
// CommitOutcome - Repository Commit Counts
// ==========================================
// What the repository reports back after the transaction lands.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitOutcome {
    pub drawings_created: usize,                    // drawings inserted
    pub drawings_updated: usize,                    // drawings already present
    pub components_inserted: usize,                 // unit records written
    pub metadata_created: BTreeMap<ReferenceKind, usize>, // references inserted, per kind
    pub metadata_reused: BTreeMap<ReferenceKind, usize>,  // references found, per kind
}

// ==========================================
// ImportResult - Import Attempt Summary
// ==========================================
// Returned to the caller after a successful commit (or an empty commit when
// no row survived parsing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResult {
    pub batch_id: String,                // UUID of this attempt
    pub project_id: String,              // owning project
    pub file_name: Option<String>,       // source file name, if file-based
    pub total_rows: usize,               // data rows in the source
    pub valid_rows: usize,               // rows that produced components
    pub error_rows: usize,               // rows rejected during parsing
    pub drawings_created: usize,         // drawings inserted
    pub drawings_updated: usize,         // drawings already present
    pub components_inserted: usize,      // unit records written
    pub components_by_type: BTreeMap<ComponentType, usize>, // insert counts per type
    pub metadata_created: BTreeMap<ReferenceKind, usize>, // references inserted, per kind
    pub metadata_reused: BTreeMap<ReferenceKind, usize>,  // references found, per kind
    pub row_errors: Vec<RowError>,       // per-row failures, ascending row order
    pub elapsed_time: std::time::Duration, // wall time of the whole attempt
}

impl ImportResult {
    /// True when at least one component reached the database.
    pub fn wrote_anything(&self) -> bool {
        self.components_inserted > 0
    }
}
