//! Medication code normalization
//!
//! An admission's prescriptions arrive as an ordered list of raw NDC values.
//! Usable codes are kept once each in first-seen order; every raw value is
//! also resolved to a drug concept when the concept table knows it.

use std::collections::BTreeSet;
use std::time::Instant;

use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::error::Result;
use crate::models::codes::push_unique;
use crate::models::{AdmissionId, MedicationList};
use crate::registry::CodeTable;
use crate::utils::logging::log_stage_complete;
use crate::vocab::{PADDING_CODE, Vocabulary, VocabularyKind, VocabularyStore};

/// Counters and vocabulary sizes from one normalization pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MedicationStats {
    /// Raw values that are known NDC codes
    pub mapped: usize,
    /// Raw values replaced by the sentinel
    pub unmapped: usize,
    /// Entries in the NDC vocabulary
    pub ndc_vocabulary_size: usize,
    /// Entries in the concept vocabulary
    pub concept_vocabulary_size: usize,
}

/// Integer form of a raw NDC value
///
/// Values are read the way a numeric column would hold them, so `"00002"`
/// and `"2.0"` both become `2`. Missing, non-numeric and non-finite values
/// yield `None`.
#[must_use]
pub fn coerce_code(value: Option<&str>) -> Option<i64> {
    let value = value?.trim();
    value.parse::<i64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|number| number.is_finite())
            .map(|number| number.trunc() as i64)
    })
}

/// Deduplicates medication codes and resolves them to concepts
pub struct MedicationNormalizer<'a, S: VocabularyStore> {
    concept_table: &'a CodeTable,
    store: &'a S,
}

impl<'a, S: VocabularyStore> MedicationNormalizer<'a, S> {
    /// Create a normalizer over the NDC-to-concept table, whose keys are the
    /// NDC universe
    pub const fn new(concept_table: &'a CodeTable, store: &'a S) -> Self {
        Self {
            concept_table,
            store,
        }
    }

    /// Normalize one admission's raw values
    ///
    /// # Returns
    /// The medication list and the number of mapped and unmapped values
    #[must_use]
    pub fn normalize_admission(&self, values: &[Option<String>]) -> (MedicationList, usize, usize) {
        let mut list = MedicationList::default();
        let mut seen = FxHashSet::default();
        let (mut mapped, mut unmapped) = (0, 0);

        for value in values {
            let coerced = coerce_code(value.as_deref());
            let key = coerced.map(|code| code.to_string());

            let valid = coerced.is_some_and(|code| code != 0)
                && key.as_deref().is_some_and(|key| self.concept_table.contains(key));

            match (valid, coerced) {
                (true, Some(code)) => {
                    mapped += 1;
                    if seen.insert(code) {
                        list.codes.push(code.to_string());
                    }
                }
                _ => unmapped += 1,
            }

            // Concepts come from the coerced value, independent of validity
            if let Some(concept) = key.as_deref().and_then(|key| self.concept_table.get(key)) {
                if concept != PADDING_CODE {
                    push_unique(&mut list.concepts, concept);
                }
            }
        }

        (list, mapped, unmapped)
    }

    /// Normalize every admission and make sure the NDC and concept vocabularies exist
    ///
    /// Output order follows input order.
    pub fn normalize(
        &self,
        admissions: Vec<(AdmissionId, Vec<Option<String>>)>,
    ) -> Result<(Vec<(AdmissionId, MedicationList)>, MedicationStats)> {
        let start = Instant::now();

        let rows = admissions
            .into_par_iter()
            .map(|(hadm_id, values)| {
                let (list, mapped, unmapped) = self.normalize_admission(&values);
                ((hadm_id, list), mapped, unmapped)
            })
            .collect::<Vec<_>>();

        let mut stats = MedicationStats::default();
        let mut lists = Vec::with_capacity(rows.len());
        for (row, mapped, unmapped) in rows {
            stats.mapped += mapped;
            stats.unmapped += unmapped;
            lists.push(row);
        }

        let ndc = self.store.get_or_create(VocabularyKind::Ndc, || {
            Vocabulary::build(self.concept_table.keys().collect::<BTreeSet<_>>())
        })?;
        let concepts = self.store.get_or_create(VocabularyKind::Concept, || {
            Vocabulary::build(self.concept_table.values().collect::<BTreeSet<_>>())
        })?;
        stats.ndc_vocabulary_size = ndc.vocabulary.len();
        stats.concept_vocabulary_size = concepts.vocabulary.len();

        log::info!(
            "Mapped/unmapped medication values: {}/{}; vocabulary sizes NDC {}, concept {}",
            stats.mapped,
            stats.unmapped,
            stats.ndc_vocabulary_size,
            stats.concept_vocabulary_size
        );
        log_stage_complete("Medication normalization", lists.len(), start.elapsed());

        Ok((lists, stats))
    }
}
