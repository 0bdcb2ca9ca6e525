// ==========================================
// SiteTrak - Column Mapper Implementation
// ==========================================
// Responsibility: stage 1, match arbitrary source headers to the canonical
// takeoff fields with tier-ordered matching (no similarity scoring)
// Tiers: exact normalized -> case-insensitive raw -> synonym
// ==========================================

use crate::domain::takeoff::{ColumnMapping, MappingResult, TargetField, UnmappedColumn};
use crate::domain::MatchConfidence;
use crate::importer::takeoff_importer_trait::ColumnMapper as ColumnMapperTrait;
use std::collections::HashMap;

// ==========================================
// Header Normalization
// ==========================================

/// Normalize a header cell for comparison: trim, lowercase, drop punctuation
/// except slash, collapse whitespace, strip spaces around slashes.
pub fn normalize_header(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();

    // Punctuation becomes whitespace so "cmdty-code" and "cmdty code" meet
    let cleaned: String = lowered
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '/' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    // "size / type" and "size/type" are the same header
    collapsed
        .split('/')
        .map(|part| part.trim())
        .collect::<Vec<_>>()
        .join("/")
}

// ==========================================
// ColumnMapper - Tiered Header Matching
// ==========================================
// Stateless; extra synonyms arrive per call so config changes need no
// rebuild of the pipeline.
pub struct ColumnMapper;

impl ColumnMapperTrait for ColumnMapper {
    fn map_headers(
        &self,
        headers: &[String],
        extra_synonyms: &HashMap<TargetField, Vec<String>>,
    ) -> MappingResult {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
        let mut consumed = vec![false; headers.len()];
        let mut mappings = Vec::new();
        let mut missing_required = Vec::new();

        // Canonical-field order; each source column is consumed at most once
        for field in TargetField::ALL {
            let matched = self
                .match_exact(field, &normalized, &consumed)
                .or_else(|| self.match_case_insensitive(field, headers, &consumed))
                .or_else(|| self.match_synonym(field, &normalized, &consumed, extra_synonyms));

            match matched {
                Some((index, confidence)) => {
                    consumed[index] = true;
                    mappings.push(ColumnMapping {
                        source_index: index,
                        source_header: headers[index].clone(),
                        field,
                        confidence,
                    });
                }
                None => {
                    if field.required() {
                        missing_required.push(field);
                    }
                }
            }
        }

        let unmapped = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| !consumed[*i])
            .map(|(i, h)| UnmappedColumn {
                source_index: i,
                source_header: h.clone(),
            })
            .collect();

        MappingResult {
            mappings,
            missing_required,
            unmapped,
        }
    }
}

impl ColumnMapper {
    /// Tier 1: normalized source equals the normalized canonical label.
    fn match_exact(
        &self,
        field: TargetField,
        normalized: &[String],
        consumed: &[bool],
    ) -> Option<(usize, MatchConfidence)> {
        let target = normalize_header(field.label());
        normalized
            .iter()
            .enumerate()
            .find(|(i, h)| !consumed[*i] && **h == target)
            .map(|(i, _)| (i, MatchConfidence::Exact))
    }

    /// Tier 2: raw source equals the raw canonical label, ignoring case.
    fn match_case_insensitive(
        &self,
        field: TargetField,
        headers: &[String],
        consumed: &[bool],
    ) -> Option<(usize, MatchConfidence)> {
        headers
            .iter()
            .enumerate()
            .find(|(i, h)| !consumed[*i] && h.trim().eq_ignore_ascii_case(field.label()))
            .map(|(i, _)| (i, MatchConfidence::CaseInsensitive))
    }

    /// Tier 3: normalized source equals a normalized synonym (built-in list
    /// first, then config-supplied extras).
    fn match_synonym(
        &self,
        field: TargetField,
        normalized: &[String],
        consumed: &[bool],
        extra_synonyms: &HashMap<TargetField, Vec<String>>,
    ) -> Option<(usize, MatchConfidence)> {
        let mut candidates: Vec<String> = field
            .builtin_synonyms()
            .iter()
            .map(|s| normalize_header(s))
            .collect();
        if let Some(extras) = extra_synonyms.get(&field) {
            candidates.extend(extras.iter().map(|s| normalize_header(s)));
        }

        normalized
            .iter()
            .enumerate()
            .find(|(i, h)| !consumed[*i] && candidates.iter().any(|c| c == *h))
            .map(|(i, _)| (i, MatchConfidence::Synonym))
    }
}
