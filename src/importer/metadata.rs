// ==========================================
// SiteTrak - Metadata Reference Collection
// ==========================================
// Responsibility: stage 4, pull the distinct area / system / test package
// names out of the parsed rows, one bucket per kind
// Red line: dedup happens here, before any database access, so repeating a
// name across ten thousand rows costs one existence check
// ==========================================

use crate::domain::takeoff::{MetadataPlan, MetadataReference, ParsedRow};
use crate::domain::ReferenceKind;
use crate::importer::takeoff_importer_trait::MetadataCollector as MetadataCollectorTrait;
use std::collections::HashSet;

pub struct MetadataCollector;

impl MetadataCollectorTrait for MetadataCollector {
    fn collect(&self, rows: &[ParsedRow]) -> MetadataPlan {
        let mut plan = MetadataPlan::default();
        let mut seen: [HashSet<String>; 3] = Default::default();

        for row in rows {
            for (slot, kind) in ReferenceKind::ALL.iter().enumerate() {
                let value = match kind {
                    ReferenceKind::Area => row.area.as_deref(),
                    ReferenceKind::System => row.system.as_deref(),
                    ReferenceKind::TestPackage => row.test_package.as_deref(),
                };
                if let Some(name) = value {
                    let trimmed = name.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    if seen[slot].insert(trimmed.to_string()) {
                        plan.names_for_mut(*kind)
                            .push(MetadataReference::missing(trimmed));
                    }
                }
            }
        }

        plan
    }
}
