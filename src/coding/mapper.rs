//! ICD code mapping to hierarchy buckets and CCS groups

use std::collections::BTreeSet;
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;

use crate::coding::hierarchy::reduce;
use crate::error::Result;
use crate::models::codes::push_unique;
use crate::models::{AdmissionId, CodedList};
use crate::registry::CodeTable;
use crate::utils::logging::log_stage_complete;
use crate::vocab::{Vocabulary, VocabularyKind, VocabularyStore};

/// Counters and vocabulary sizes from one mapping pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MappingStats {
    /// Codes found in the group table
    pub mapped: usize,
    /// Codes missing from the group table
    pub unmapped: usize,
    /// Entries in the full ICD vocabulary
    pub icd_vocabulary_size: usize,
    /// Entries in the hierarchy vocabulary
    pub hierarchy_vocabulary_size: usize,
    /// Entries in the group vocabulary
    pub group_vocabulary_size: usize,
}

/// Maps ordered ICD code lists to hierarchy and group code lists
pub struct ClinicalCodeMapper<'a, S: VocabularyStore> {
    group_table: &'a CodeTable,
    text_table: &'a CodeTable,
    store: &'a S,
}

impl<'a, S: VocabularyStore> ClinicalCodeMapper<'a, S> {
    /// Create a mapper over the ICD-to-group and ICD-to-text reference tables
    pub const fn new(group_table: &'a CodeTable, text_table: &'a CodeTable, store: &'a S) -> Self {
        Self {
            group_table,
            text_table,
            store,
        }
    }

    /// Derive the hierarchy and group lists of one admission
    ///
    /// # Returns
    /// The coded list and the number of mapped and unmapped codes
    #[must_use]
    pub fn map_admission(&self, icd: Vec<String>) -> (CodedList, usize, usize) {
        let mut coded = CodedList::from_icd(icd);
        let (mut mapped, mut unmapped) = (0, 0);

        for code in &coded.icd {
            push_unique(&mut coded.hierarchy, &reduce(code));
            match self.group_table.get(code) {
                Some(group) => {
                    mapped += 1;
                    push_unique(&mut coded.group, group.trim());
                }
                None => unmapped += 1,
            }
        }

        (coded, mapped, unmapped)
    }

    /// Map every admission's codes and make sure the three ICD vocabularies exist
    ///
    /// Output order follows input order.
    pub fn map(
        &self,
        admissions: Vec<(AdmissionId, Vec<String>)>,
    ) -> Result<(Vec<(AdmissionId, CodedList)>, MappingStats)> {
        let start = Instant::now();

        let mapped_rows = admissions
            .into_par_iter()
            .map(|(hadm_id, icd)| {
                let (coded, mapped, unmapped) = self.map_admission(icd);
                ((hadm_id, coded), mapped, unmapped)
            })
            .collect::<Vec<_>>();

        let mut stats = MappingStats::default();
        let mut lists = Vec::with_capacity(mapped_rows.len());
        for (row, mapped, unmapped) in mapped_rows {
            stats.mapped += mapped;
            stats.unmapped += unmapped;
            lists.push(row);
        }

        self.build_vocabularies(&mut stats)?;

        log::info!(
            "Mapped/unmapped ICD codes: {}/{}; vocabulary sizes ICD {}, hierarchy {}, group {}",
            stats.mapped,
            stats.unmapped,
            stats.icd_vocabulary_size,
            stats.hierarchy_vocabulary_size,
            stats.group_vocabulary_size
        );
        log_stage_complete("ICD code mapping", lists.len(), start.elapsed());

        Ok((lists, stats))
    }

    /// Vocabularies span the full reference universe, not just observed codes
    fn build_vocabularies(&self, stats: &mut MappingStats) -> Result<()> {
        let icd = self.store.get_or_create(VocabularyKind::Icd, || {
            Vocabulary::build(self.text_table.keys().collect::<BTreeSet<_>>())
        })?;

        let hierarchy = self.store.get_or_create(VocabularyKind::IcdHierarchy, || {
            Vocabulary::build(self.text_table.keys().map(reduce).collect::<BTreeSet<_>>())
        })?;

        let group = self.store.get_or_create(VocabularyKind::Group, || {
            Vocabulary::build(
                self.group_table
                    .values()
                    .map(str::trim)
                    .collect::<BTreeSet<_>>(),
            )
        })?;

        stats.icd_vocabulary_size = icd.vocabulary.len();
        stats.hierarchy_vocabulary_size = hierarchy.vocabulary.len();
        stats.group_vocabulary_size = group.vocabulary.len();
        Ok(())
    }
}
