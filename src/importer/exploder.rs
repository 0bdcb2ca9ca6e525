// ==========================================
// SiteTrak - Identity & Quantity Explosion Engine
// ==========================================
// Responsibility: stage 3, expand each parsed row into quantity unit records
// with deterministic component ids
// Id format: <drawing>-<size token>-<commodity code>[-NNN]
// Red line: cross-row uniqueness is the commit coordinator's job, not this
// stage's; explosion stays a pure per-row function
// ==========================================

use crate::domain::takeoff::{ComponentAttributes, ComponentRecord, ParsedRow, NO_SIZE_TOKEN};
use crate::importer::takeoff_importer_trait::Exploder as ExploderTrait;

/// Resolve the size segment of a component id. Missing or blank sizes all
/// collapse to the same sentinel so they collide with each other, never with
/// a real size.
pub fn size_token(size: Option<&str>) -> String {
    match size {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => NO_SIZE_TOKEN.to_string(),
    }
}

/// Build one component id. Sequence numbers are zero-padded to three digits;
/// quantities past 999 keep counting in four (the padding is a floor, not a
/// ceiling).
pub fn component_id(drawing: &str, size_token: &str, code: &str, seq: Option<u32>) -> String {
    match seq {
        Some(n) => format!("{}-{}-{}-{:03}", drawing, size_token, code, n),
        None => format!("{}-{}-{}", drawing, size_token, code),
    }
}

pub struct Exploder;

impl ExploderTrait for Exploder {
    fn explode(&self, rows: &[ParsedRow]) -> Vec<ComponentRecord> {
        rows.iter().flat_map(|row| self.explode_row(row)).collect()
    }
}

impl Exploder {
    /// Expand one row into `quantity` unit records.
    ///
    /// Tag-numbered types (instrument, spool, field weld) carry no sequence
    /// suffix; a quantity above one for such a type therefore produces
    /// colliding ids, which the commit coordinator rejects.
    pub fn explode_row(&self, row: &ParsedRow) -> Vec<ComponentRecord> {
        let token = size_token(row.size.as_deref());
        let sequenced = !row.component_type.is_uniquely_tagged();

        (1..=row.quantity)
            .map(|seq| {
                let sequence = if sequenced { Some(seq) } else { None };
                ComponentRecord {
                    component_id: component_id(
                        &row.drawing_no,
                        &token,
                        &row.commodity_code,
                        sequence,
                    ),
                    drawing_no: row.drawing_no.clone(),
                    component_type: row.component_type,
                    size_token: token.clone(),
                    commodity_code: row.commodity_code.clone(),
                    sequence,
                    area: row.area.clone(),
                    system: row.system.clone(),
                    test_package: row.test_package.clone(),
                    attributes: ComponentAttributes {
                        size: row.size.clone(),
                        spec: row.spec.clone(),
                        description: row.description.clone(),
                        comments: row.comments.clone(),
                        source_quantity: row.quantity,
                        extra: row.unmapped_fields.clone(),
                    },
                    source_row: row.row_number,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ComponentType;
    use std::collections::BTreeMap;
    use std::collections::HashSet;

    fn parsed_row(
        drawing: &str,
        ty: ComponentType,
        qty: u32,
        code: &str,
        size: Option<&str>,
    ) -> ParsedRow {
        ParsedRow {
            row_number: 1,
            drawing_no: drawing.to_string(),
            component_type: ty,
            quantity: qty,
            commodity_code: code.to_string(),
            size: size.map(|s| s.to_string()),
            spec: Some("CS150".to_string()),
            description: None,
            comments: None,
            area: Some("Unit 100".to_string()),
            system: None,
            test_package: None,
            unmapped_fields: BTreeMap::new(),
        }
    }

    #[test]
    fn test_sequenced_explosion() {
        let row = parsed_row("P-001", ComponentType::Valve, 4, "VBALU-001", Some("2"));
        let records = Exploder.explode_row(&row);

        assert_eq!(records.len(), 4);
        assert_eq!(records[0].component_id, "P-001-2-VBALU-001-001");
        assert_eq!(records[3].component_id, "P-001-2-VBALU-001-004");
        assert_eq!(records[2].sequence, Some(3));
    }

    #[test]
    fn test_tagged_type_has_no_sequence() {
        let row = parsed_row("P-001", ComponentType::Instrument, 1, "ME-55402", Some("2"));
        let records = Exploder.explode_row(&row);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].component_id, "P-001-2-ME-55402");
        assert_eq!(records[0].sequence, None);
    }

    #[test]
    fn test_missing_size_uses_sentinel() {
        let row = parsed_row("P-001", ComponentType::Gasket, 2, "GASK-150", None);
        let records = Exploder.explode_row(&row);

        assert_eq!(records[0].component_id, "P-001-NOSIZE-GASK-150-001");
        assert_eq!(records[0].size_token, "NOSIZE");
    }

    #[test]
    fn test_blank_size_equals_missing_size() {
        assert_eq!(size_token(Some("  ")), size_token(None));
        assert_eq!(size_token(Some(" 2 ")), "2");
    }

    #[test]
    fn test_sized_and_unsized_never_collide() {
        let sized = parsed_row("P-001", ComponentType::Valve, 1, "VBALU-001", Some("2"));
        let r#unsized = parsed_row("P-001", ComponentType::Valve, 1, "VBALU-001", None);

        let a = Exploder.explode_row(&sized);
        let b = Exploder.explode_row(&r#unsized);
        assert_ne!(a[0].component_id, b[0].component_id);
    }

    #[test]
    fn test_quantity_zero_produces_nothing() {
        let row = parsed_row("P-001", ComponentType::Valve, 0, "VBALU-001", Some("2"));
        assert!(Exploder.explode_row(&row).is_empty());
    }

    #[test]
    fn test_large_quantity_dense_and_distinct() {
        let row = parsed_row("P-001", ComponentType::Support, 100, "SUP-7", None);
        let records = Exploder.explode_row(&row);

        assert_eq!(records.len(), 100);
        let ids: HashSet<&str> = records.iter().map(|r| r.component_id.as_str()).collect();
        assert_eq!(ids.len(), 100);
        // Sequence numbers stay dense and ordered
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.sequence, Some(i as u32 + 1));
        }
        assert!(records[99].component_id.ends_with("-100"));
    }

    #[test]
    fn test_sequence_grows_past_padding_width() {
        assert_eq!(component_id("P", "2", "C", Some(7)), "P-2-C-007");
        assert_eq!(component_id("P", "2", "C", Some(999)), "P-2-C-999");
        assert_eq!(component_id("P", "2", "C", Some(1005)), "P-2-C-1005");
    }

    #[test]
    fn test_attributes_copied_through() {
        let mut row = parsed_row("P-001", ComponentType::Valve, 2, "VBALU-001", Some("2"));
        row.unmapped_fields
            .insert("Paint Color".to_string(), "Red".to_string());

        let records = Exploder.explode_row(&row);

        for record in &records {
            assert_eq!(record.attributes.source_quantity, 2);
            assert_eq!(record.attributes.spec.as_deref(), Some("CS150"));
            assert_eq!(
                record.attributes.extra.get("Paint Color"),
                Some(&"Red".to_string())
            );
            assert_eq!(record.area.as_deref(), Some("Unit 100"));
            assert_eq!(record.source_row, 1);
        }
    }

    #[test]
    fn test_multi_row_explosion_preserves_row_order() {
        let rows = vec![
            parsed_row("P-001", ComponentType::Valve, 2, "VBALU-001", Some("2")),
            parsed_row("P-002", ComponentType::Gasket, 1, "GASK-150", Some("3")),
        ];
        let records = Exploder.explode(&rows);

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].drawing_no, "P-001");
        assert_eq!(records[2].drawing_no, "P-002");
    }
}
