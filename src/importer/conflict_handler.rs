// ==========================================
// SiteTrak - Identity Conflict Handler
// ==========================================
// Responsibility: detect duplicate component ids within one import batch,
// scoped per drawing
// Red line: collisions across concurrent batches are the database unique
// constraint's job; this handler only sees its own batch
// ==========================================

use crate::domain::takeoff::{ComponentRecord, DuplicateIdentity};
use crate::importer::takeoff_importer_trait::ConflictHandler as ConflictHandlerTrait;
use std::collections::HashMap;

pub struct ConflictHandler;

impl ConflictHandlerTrait for ConflictHandler {
    /// Scan exploded records for component ids that occur more than once
    /// under the same drawing.
    ///
    /// # Returns
    /// - Vec<DuplicateIdentity>: one entry per colliding id, in first-seen
    ///   order, with the offending source rows listed ascending
    fn detect_duplicates(&self, records: &[ComponentRecord]) -> Vec<DuplicateIdentity> {
        let mut occurrences: HashMap<(String, String), Vec<usize>> = HashMap::new();
        let mut first_seen: Vec<(String, String)> = Vec::new();

        for record in records {
            let key = (record.drawing_no.clone(), record.component_id.clone());
            let rows = occurrences.entry(key.clone()).or_insert_with(|| {
                first_seen.push(key);
                Vec::new()
            });
            rows.push(record.source_row);
        }

        first_seen
            .into_iter()
            .filter_map(|key| {
                let rows = &occurrences[&key];
                if rows.len() < 2 {
                    return None;
                }
                let mut row_list = rows.clone();
                row_list.sort_unstable();
                row_list.dedup();
                Some(DuplicateIdentity {
                    drawing_no: key.0,
                    component_id: key.1,
                    rows: row_list,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::takeoff::ComponentAttributes;
    use crate::domain::ComponentType;

    fn create_test_record(
        drawing: &str,
        component_id: &str,
        source_row: usize,
    ) -> ComponentRecord {
        ComponentRecord {
            component_id: component_id.to_string(),
            drawing_no: drawing.to_string(),
            component_type: ComponentType::Valve,
            size_token: "2".to_string(),
            commodity_code: "VBALU-001".to_string(),
            sequence: Some(1),
            area: None,
            system: None,
            test_package: None,
            attributes: ComponentAttributes::default(),
            source_row,
        }
    }

    #[test]
    fn test_detect_duplicates_none() {
        let handler = ConflictHandler;
        let records = vec![
            create_test_record("P-001", "P-001-2-VBALU-001-001", 1),
            create_test_record("P-001", "P-001-2-VBALU-001-002", 1),
        ];

        let duplicates = handler.detect_duplicates(&records);

        assert!(duplicates.is_empty());
    }

    #[test]
    fn test_detect_duplicates_across_rows() {
        let handler = ConflictHandler;
        let records = vec![
            create_test_record("P-001", "P-001-2-VBALU-001-001", 1),
            create_test_record("P-001", "P-001-2-VBALU-001-001", 4),
        ];

        let duplicates = handler.detect_duplicates(&records);

        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].component_id, "P-001-2-VBALU-001-001");
        assert_eq!(duplicates[0].rows, vec![1, 4]);
    }

    #[test]
    fn test_same_id_on_different_drawings_is_legal() {
        let handler = ConflictHandler;
        let records = vec![
            create_test_record("P-001", "X-1", 1),
            create_test_record("P-002", "X-1", 2),
        ];

        let duplicates = handler.detect_duplicates(&records);

        assert!(duplicates.is_empty());
    }

    #[test]
    fn test_duplicate_within_one_row() {
        // A tagged type with quantity 2 explodes into two identical ids
        let handler = ConflictHandler;
        let records = vec![
            create_test_record("P-001", "P-001-2-ME-55402", 3),
            create_test_record("P-001", "P-001-2-ME-55402", 3),
        ];

        let duplicates = handler.detect_duplicates(&records);

        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].rows, vec![3]);
    }

    #[test]
    fn test_multiple_collisions_reported_in_first_seen_order() {
        let handler = ConflictHandler;
        let records = vec![
            create_test_record("P-001", "B", 1),
            create_test_record("P-001", "A", 2),
            create_test_record("P-001", "B", 3),
            create_test_record("P-001", "A", 4),
        ];

        let duplicates = handler.detect_duplicates(&records);

        assert_eq!(duplicates.len(), 2);
        assert_eq!(duplicates[0].component_id, "B");
        assert_eq!(duplicates[1].component_id, "A");
    }
}
