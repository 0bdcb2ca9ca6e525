// ==========================================
// SiteTrak - Row Parser / Validator
// ==========================================
// Responsibility: stage 2, turn one raw row into a typed ParsedRow using the
// column mappings, or report every field failure for that row
// Red line: a bad row never aborts the file; the caller moves to the next row
// ==========================================

use crate::domain::takeoff::{MappingResult, ParsedRow, RowError, TargetField};
use crate::domain::ComponentType;
use crate::importer::file_reader::RawRow;
use crate::importer::takeoff_importer_trait::RowParser as RowParserTrait;
use std::collections::BTreeMap;

pub struct RowParser;

impl RowParserTrait for RowParser {
    fn parse_row(&self, row: &RawRow, mapping: &MappingResult) -> Result<ParsedRow, Vec<RowError>> {
        let mut errors = Vec::new();

        let drawing_no = self.required_text(row, mapping, TargetField::Drawing, &mut errors);
        let commodity_code =
            self.required_text(row, mapping, TargetField::CommodityCode, &mut errors);

        let component_type = match self.required_text(
            row,
            mapping,
            TargetField::ComponentType,
            &mut errors,
        ) {
            Some(raw) => match ComponentType::parse(&raw) {
                Some(ty) => Some(ty),
                None => {
                    errors.push(RowError::new(
                        row.row_number,
                        Some(TargetField::ComponentType.label()),
                        format!("unknown component type: {}", raw),
                    ));
                    None
                }
            },
            None => None,
        };

        let quantity = match self.cell(row, mapping, TargetField::Quantity) {
            Some(raw) => match coerce_quantity(&raw) {
                Ok(qty) => Some(qty),
                Err(message) => {
                    errors.push(RowError::new(
                        row.row_number,
                        Some(TargetField::Quantity.label()),
                        message,
                    ));
                    None
                }
            },
            None => {
                errors.push(RowError::new(
                    row.row_number,
                    Some(TargetField::Quantity.label()),
                    "qty is required",
                ));
                None
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        // All four required fields are present past this point
        Ok(ParsedRow {
            row_number: row.row_number,
            drawing_no: drawing_no.unwrap_or_default(),
            component_type: component_type.unwrap_or(ComponentType::Spool),
            quantity: quantity.unwrap_or_default(),
            commodity_code: commodity_code.unwrap_or_default(),
            size: self.cell(row, mapping, TargetField::Size),
            spec: self.cell(row, mapping, TargetField::Spec),
            description: self.cell(row, mapping, TargetField::Description),
            comments: self.cell(row, mapping, TargetField::Comments),
            area: self.cell(row, mapping, TargetField::Area),
            system: self.cell(row, mapping, TargetField::System),
            test_package: self.cell(row, mapping, TargetField::TestPackage),
            unmapped_fields: self.collect_unmapped(row, mapping),
        })
    }
}

impl RowParser {
    /// Fetch a mapped cell, trimmed; empty cells and short rows yield None.
    fn cell(&self, row: &RawRow, mapping: &MappingResult, field: TargetField) -> Option<String> {
        let index = mapping.index_of(field)?;
        let value = row.cells.get(index)?.trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }

    /// Fetch a required text cell, recording an error when absent.
    fn required_text(
        &self,
        row: &RawRow,
        mapping: &MappingResult,
        field: TargetField,
        errors: &mut Vec<RowError>,
    ) -> Option<String> {
        match self.cell(row, mapping, field) {
            Some(value) => Some(value),
            None => {
                errors.push(RowError::new(
                    row.row_number,
                    Some(field.label()),
                    format!("{} is required", field.label()),
                ));
                None
            }
        }
    }

    /// Everything the mapper left unmapped, kept verbatim for diagnostics.
    fn collect_unmapped(&self, row: &RawRow, mapping: &MappingResult) -> BTreeMap<String, String> {
        let mut bag = BTreeMap::new();
        for col in &mapping.unmapped {
            if let Some(value) = row.cells.get(col.source_index) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    bag.insert(col.source_header.clone(), trimmed.to_string());
                }
            }
        }
        bag
    }
}

/// Coerce a quantity cell to a non-negative integer. Whole-number floats
/// ("4.0") are accepted since spreadsheet exports often format them that way.
fn coerce_quantity(raw: &str) -> Result<u32, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("qty is required".to_string());
    }
    if let Ok(value) = trimmed.parse::<u32>() {
        return Ok(value);
    }
    if let Ok(value) = trimmed.parse::<f64>() {
        if value < 0.0 {
            return Err(format!("qty must be non-negative: {}", raw));
        }
        if value.fract() == 0.0 && value <= u32::MAX as f64 {
            return Ok(value as u32);
        }
        return Err(format!("qty must be a whole number: {}", raw));
    }
    Err(format!("cannot parse qty: {}", raw))
}
