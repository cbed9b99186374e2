//! Balanced train/validation/test splitting
//!
//! The split is planned once per run on labeled admissions and then applied
//! to every note window, so an admission lands in the same split whichever
//! notes represent it. Negatives are downsampled to the number of positives;
//! the negatives left over form a reserve pool from which extra negative
//! admissions are drawn into each window's training set.

use std::time::Instant;

use rand::prelude::*;
use rand::seq::SliceRandom;
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::algorithm::notes::NoteWindow;
use crate::error::{PrepError, Result};
use crate::models::{Admission, AdmissionId, NoteChunk};
use crate::utils::logging::{log_stage_complete, log_warning};

/// Output partition of a note window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitKind {
    /// Training set
    Train,
    /// Validation set
    Val,
    /// Test set
    Test,
}

impl SplitKind {
    /// Every split, in output order
    pub const ALL: [Self; 3] = [Self::Train, Self::Val, Self::Test];

    /// File name of the split inside a window folder
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Train => "train.csv",
            Self::Val => "val.csv",
            Self::Test => "test.csv",
        }
    }
}

/// Admission-level assignment to splits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitPlan {
    /// Training admissions
    pub train: Vec<AdmissionId>,
    /// Validation admissions
    pub val: Vec<AdmissionId>,
    /// Test admissions
    pub test: Vec<AdmissionId>,
    /// Negative admissions not drawn into the balanced sample
    pub reserve: Vec<AdmissionId>,
}

impl SplitPlan {
    /// Admissions of `kind`
    #[must_use]
    pub fn admissions(&self, kind: SplitKind) -> &[AdmissionId] {
        match kind {
            SplitKind::Train => &self.train,
            SplitKind::Val => &self.val,
            SplitKind::Test => &self.test,
        }
    }
}

/// Chunk datasets of one note window
#[derive(Debug, Clone)]
pub struct WindowSplits {
    /// Window the chunks were selected with
    pub window: NoteWindow,
    /// Shuffled training chunks, reserve draw included
    pub train: Vec<NoteChunk>,
    /// Validation chunks
    pub val: Vec<NoteChunk>,
    /// Test chunks
    pub test: Vec<NoteChunk>,
}

impl WindowSplits {
    /// Chunks of `kind`
    #[must_use]
    pub fn chunks(&self, kind: SplitKind) -> &[NoteChunk] {
        match kind {
            SplitKind::Train => &self.train,
            SplitKind::Val => &self.val,
            SplitKind::Test => &self.test,
        }
    }

    /// Per-split chunk counts
    #[must_use]
    pub fn summary(&self) -> WindowSummary {
        WindowSummary {
            window: self.window.dir_name(),
            splits: SplitKind::ALL
                .into_iter()
                .map(|kind| {
                    let chunks = self.chunks(kind);
                    let positive = chunks.iter().filter(|chunk| chunk.label() == 1).count();
                    let admissions: FxHashSet<AdmissionId> =
                        chunks.iter().map(NoteChunk::hadm_id).collect();
                    SplitCounts {
                        split: kind,
                        admissions: admissions.len(),
                        chunks: chunks.len(),
                        positive_chunks: positive,
                        negative_chunks: chunks.len() - positive,
                    }
                })
                .collect(),
        }
    }
}

/// Size of one split of one window
#[derive(Debug, Clone, Serialize)]
pub struct SplitCounts {
    /// Split
    pub split: SplitKind,
    /// Distinct admissions contributing chunks
    pub admissions: usize,
    /// Chunks
    pub chunks: usize,
    /// Chunks labeled readmitted
    pub positive_chunks: usize,
    /// Chunks labeled not readmitted
    pub negative_chunks: usize,
}

/// Sizes of every split of one window
#[derive(Debug, Clone, Serialize)]
pub struct WindowSummary {
    /// Window folder name
    pub window: String,
    /// Train, validation and test counts
    pub splits: Vec<SplitCounts>,
}

/// Seeded sampler producing split plans and window datasets
#[derive(Debug, Clone, Copy)]
pub struct SplitSampler {
    seed: u64,
    val_test_fraction: f64,
    val_fraction: f64,
}

impl SplitSampler {
    /// Create a sampler
    ///
    /// # Arguments
    /// * `seed` - Seed for every draw
    /// * `val_test_fraction` - Share of each class held out for validation and test
    /// * `val_fraction` - Share of the held-out admissions used for validation
    #[must_use]
    pub const fn new(seed: u64, val_test_fraction: f64, val_fraction: f64) -> Self {
        Self {
            seed,
            val_test_fraction,
            val_fraction,
        }
    }

    fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }

    /// Draw `amount` items without replacement, keeping their input order
    fn sample(&self, ids: &[AdmissionId], amount: usize) -> Vec<AdmissionId> {
        let amount = amount.min(ids.len());
        let mut indices: Vec<usize> = (0..ids.len()).collect();
        let mut rng = self.rng();
        let (chosen, _) = indices.partial_shuffle(&mut rng, amount);
        chosen.sort_unstable();
        chosen.iter().map(|&index| ids[index]).collect()
    }

    /// Split `ids` into a draw of `amount` and the rest, both in input order
    fn split_off(&self, ids: &[AdmissionId], amount: usize) -> (Vec<AdmissionId>, Vec<AdmissionId>) {
        let drawn = self.sample(ids, amount);
        let drawn_set: FxHashSet<AdmissionId> = drawn.iter().copied().collect();
        let rest = ids
            .iter()
            .copied()
            .filter(|id| !drawn_set.contains(id))
            .collect();
        (drawn, rest)
    }

    /// Plan the admission-level split
    ///
    /// Positives are kept whole and matched by an equal-size negative sample.
    /// Each class contributes the same fractions to validation and test.
    pub fn plan(&self, admissions: &[Admission]) -> Result<SplitPlan> {
        let start = Instant::now();
        let (positives, negatives): (Vec<&Admission>, Vec<&Admission>) =
            admissions.iter().partition(|admission| admission.readmitted);
        let positives: Vec<AdmissionId> = positives.iter().map(|a| a.hadm_id).collect();
        let negatives: Vec<AdmissionId> = negatives.iter().map(|a| a.hadm_id).collect();

        if negatives.len() < positives.len() {
            return Err(PrepError::InsufficientSamples {
                what: "not-readmitted admissions",
                needed: positives.len(),
                available: negatives.len(),
            });
        }

        let (negatives_used, reserve) = self.split_off(&negatives, positives.len());

        let mut plan = SplitPlan {
            reserve,
            ..SplitPlan::default()
        };
        for class in [&positives, &negatives_used] {
            let (held_out, train) =
                self.split_off(class, fraction_size(self.val_test_fraction, class.len()));
            let (val, test) =
                self.split_off(&held_out, fraction_size(self.val_fraction, held_out.len()));
            plan.train.extend(train);
            plan.val.extend(val);
            plan.test.extend(test);
        }

        log::info!(
            "Split plan: {} positive and {} negative admissions; train {}, val {}, test {}, reserve pool {}",
            positives.len(),
            negatives_used.len(),
            plan.train.len(),
            plan.val.len(),
            plan.test.len(),
            plan.reserve.len()
        );
        log_stage_complete("Split planning", admissions.len(), start.elapsed());
        Ok(plan)
    }

    /// Draw `size` reserve admissions, clamped to the pool size
    #[must_use]
    pub fn draw_reserve(&self, reserve: &[AdmissionId], size: usize) -> Vec<AdmissionId> {
        if size > reserve.len() {
            log_warning(
                &format!(
                    "Requested {size} reserve admissions but only {} are available; using all of them",
                    reserve.len()
                ),
                None,
            );
        }
        self.sample(reserve, size)
    }

    /// Distribute a window's chunks over the planned splits
    ///
    /// Training receives the chunks of the reserve draw followed by the
    /// training chunks, then is shuffled. Validation and test chunks keep
    /// document order and, for windows with a minimum stay, only include
    /// admissions that lasted at least that long.
    #[must_use]
    pub fn assemble(
        &self,
        window: NoteWindow,
        plan: &SplitPlan,
        reserve_size: usize,
        chunks: Vec<NoteChunk>,
    ) -> WindowSplits {
        let reserve: FxHashSet<AdmissionId> = self
            .draw_reserve(&plan.reserve, reserve_size)
            .into_iter()
            .collect();
        let train: FxHashSet<AdmissionId> = plan.train.iter().copied().collect();
        let val: FxHashSet<AdmissionId> = plan.val.iter().copied().collect();
        let test: FxHashSet<AdmissionId> = plan.test.iter().copied().collect();
        let min_duration = window.min_duration_days();
        let long_enough = |chunk: &NoteChunk| {
            min_duration.is_none_or(|days| chunk.record.admission.stayed_at_least(days))
        };

        let mut reserve_chunks = Vec::new();
        let mut splits = WindowSplits {
            window,
            train: Vec::new(),
            val: Vec::new(),
            test: Vec::new(),
        };
        for chunk in chunks {
            let id = chunk.hadm_id();
            if reserve.contains(&id) {
                reserve_chunks.push(chunk);
            } else if train.contains(&id) {
                splits.train.push(chunk);
            } else if val.contains(&id) && long_enough(&chunk) {
                splits.val.push(chunk);
            } else if test.contains(&id) && long_enough(&chunk) {
                splits.test.push(chunk);
            }
        }

        reserve_chunks.append(&mut splits.train);
        splits.train = reserve_chunks;
        splits.train.shuffle(&mut self.rng());

        log::info!(
            "{window} splits: train {}, val {}, test {} chunks",
            splits.train.len(),
            splits.val.len(),
            splits.test.len()
        );
        splits
    }
}

/// Number of items a `fraction` of `len` selects, rounding half to even
fn fraction_size(fraction: f64, len: usize) -> usize {
    let size = (fraction * len as f64).round_ties_even();
    if size <= 0.0 {
        0
    } else {
        (size as usize).min(len)
    }
}
