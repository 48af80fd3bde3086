//! All records of one compound, sorted and grouped into phase segments.

use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tc_core::constants::T_REF_K;
use tc_core::{Tolerances, nearly_equal};
use tracing::{debug, warn};

use crate::continuity::{CorrectionKey, RecordTransitionCorrection};
use crate::error::{ConsistencyWarning, ThermoError, ThermoResult};
use crate::formula::is_pure_element;
use crate::phase::Phase;
use crate::record::DatabaseRecord;

/// Largest Tmax/Tmin mismatch between neighbours not reported as gap or overlap [K].
pub const DEFAULT_ADJACENCY_TOLERANCE_K: f64 = 1e-3;

/// Maximal run of consecutive same-phase records.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSegment {
    phase: Phase,
    t_start: f64,
    t_end: f64,
    indices: Range<usize>,
}

impl PhaseSegment {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Lowest Tmin in the segment [K].
    pub fn t_start(&self) -> f64 {
        self.t_start
    }

    /// Highest Tmax in the segment [K].
    pub fn t_end(&self) -> f64 {
        self.t_end
    }

    /// Indices into [`CompoundRecordSet::records`].
    pub fn record_indices(&self) -> Range<usize> {
        self.indices.clone()
    }

    pub fn first_index(&self) -> usize {
        self.indices.start
    }

    pub fn last_index(&self) -> usize {
        self.indices.end - 1
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn contains_index(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    fn overlaps(&self, lo: f64, hi: f64) -> bool {
        self.t_start <= hi && self.t_end >= lo
    }
}

/// Records of one formula, with derived structure and a correction cache.
///
/// Everything except the correction cache is fixed at construction.
#[derive(Debug)]
pub struct CompoundRecordSet {
    formula: String,
    records: Vec<DatabaseRecord>,
    segments: Vec<PhaseSegment>,
    range: (f64, f64),
    warnings: Vec<ConsistencyWarning>,
    is_elemental: bool,
    corrections: Mutex<HashMap<CorrectionKey, RecordTransitionCorrection>>,
}

impl CompoundRecordSet {
    /// Build with the default adjacency tolerance.
    pub fn new(records: Vec<DatabaseRecord>) -> ThermoResult<Self> {
        Self::with_tolerance(records, DEFAULT_ADJACENCY_TOLERANCE_K)
    }

    pub fn with_tolerance(
        mut records: Vec<DatabaseRecord>,
        adjacency_tolerance_k: f64,
    ) -> ThermoResult<Self> {
        let Some(first) = records.first() else {
            return Err(ThermoError::InvalidParameter {
                what: "record set must contain at least one record".to_string(),
            });
        };
        let formula = first.formula().to_string();

        if let Some(other) = records.iter().find(|r| r.formula() != formula) {
            return Err(ThermoError::InvalidParameter {
                what: format!(
                    "record set mixes formulas '{formula}' and '{}'",
                    other.formula()
                ),
            });
        }
        let mut seen = HashSet::with_capacity(records.len());
        if let Some(dup) = records.iter().find(|r| !seen.insert(r.id())) {
            return Err(ThermoError::InvalidParameter {
                what: format!("duplicate record id {} for {formula}", dup.id()),
            });
        }

        records.sort_by(|a, b| {
            a.t_min()
                .total_cmp(&b.t_min())
                .then(a.t_max().total_cmp(&b.t_max()))
        });

        let warnings = adjacency_warnings(&formula, &records, adjacency_tolerance_k.abs());
        for w in &warnings {
            warn!(formula = %formula, "{w}");
        }

        let segments = build_segments(&records);
        let t_lo = records.iter().map(|r| r.t_min()).fold(f64::INFINITY, f64::min);
        let t_hi = records
            .iter()
            .map(|r| r.t_max())
            .fold(f64::NEG_INFINITY, f64::max);
        let is_elemental = is_pure_element(&formula);

        debug!(
            formula = %formula,
            records = records.len(),
            segments = segments.len(),
            t_min_k = t_lo,
            t_max_k = t_hi,
            "record set built"
        );

        Ok(Self {
            formula,
            records,
            segments,
            range: (t_lo, t_hi),
            warnings,
            is_elemental,
            corrections: Mutex::new(HashMap::new()),
        })
    }

    /// Override the inferred pure-element flag.
    pub fn with_elemental(mut self, is_elemental: bool) -> Self {
        self.is_elemental = is_elemental;
        self
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }

    /// Records sorted by Tmin.
    pub fn records(&self) -> &[DatabaseRecord] {
        &self.records
    }

    pub fn segments(&self) -> &[PhaseSegment] {
        &self.segments
    }

    /// Gap/overlap findings collected at construction.
    pub fn warnings(&self) -> &[ConsistencyWarning] {
        &self.warnings
    }

    pub fn is_elemental(&self) -> bool {
        self.is_elemental
    }

    /// `(min Tmin, max Tmax)` over all records [K].
    pub fn available_range(&self) -> (f64, f64) {
        self.range
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index of the record active at `t`.
    ///
    /// At a shared boundary the incoming record (Tmin == T) is chosen; among
    /// overlapping records the latest-starting one wins.
    pub fn index_at(&self, t: f64) -> ThermoResult<usize> {
        if !t.is_finite() || t <= 0.0 {
            return Err(ThermoError::NonPositiveTemperature { t_k: t });
        }
        let (lo, hi) = self.range;
        let tol = Tolerances::temperature();
        let below = t < lo && !nearly_equal(t, lo, tol);
        let above = t > hi && !nearly_equal(t, hi, tol);
        if below || above {
            return Err(ThermoError::CompoundRange {
                formula: self.formula.clone(),
                t_k: t,
                t_min_k: lo,
                t_max_k: hi,
            });
        }
        self.records
            .iter()
            .rposition(|r| r.covers(t))
            .ok_or_else(|| ThermoError::NoCoveringRecord {
                formula: self.formula.clone(),
                t_k: t,
            })
    }

    pub fn record_at(&self, t: f64) -> ThermoResult<&DatabaseRecord> {
        self.index_at(t).map(|i| &self.records[i])
    }

    /// Segments intersecting `[lo, hi]`, in temperature order.
    pub fn segments_in_range(&self, lo: f64, hi: f64) -> Vec<&PhaseSegment> {
        self.segments.iter().filter(|s| s.overlaps(lo, hi)).collect()
    }

    /// Records intersecting `[lo, hi]`, in temperature order.
    pub fn records_in_range(&self, lo: f64, hi: f64) -> Vec<&DatabaseRecord> {
        self.records
            .iter()
            .filter(|r| r.t_min() <= hi && r.t_max() >= lo)
            .collect()
    }

    /// Segment holding `records[index]`.
    pub fn segment_of(&self, index: usize) -> Option<&PhaseSegment> {
        self.segments.iter().find(|s| s.contains_index(index))
    }

    /// Any two records of the same phase whose ranges intersect by more
    /// than the temperature tolerance.
    pub fn has_overlapping_same_phase_records(&self) -> bool {
        let tol = Tolerances::temperature();
        self.segments.iter().any(|seg| {
            let idx = seg.record_indices();
            idx.clone().any(|i| {
                idx.clone().filter(|&j| j > i).any(|j| {
                    let (a, b) = (&self.records[i], &self.records[j]);
                    let overlap = a.t_max().min(b.t_max()) - a.t_min().max(b.t_min());
                    overlap > 0.0 && !nearly_equal(overlap, 0.0, tol)
                })
            })
        })
    }

    /// The pure-element H298 = 0 convention applies to this reference record.
    ///
    /// Only the standard-state record (the one covering 298.15 K) is
    /// overridden; other-phase baselines keep their stored values.
    pub fn applies_elemental_override(&self, reference_index: usize) -> bool {
        self.is_elemental
            && self
                .records
                .get(reference_index)
                .is_some_and(|r| r.covers(T_REF_K))
    }

    fn corrections(&self) -> MutexGuard<'_, HashMap<CorrectionKey, RecordTransitionCorrection>> {
        self.corrections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn cached_correction(
        &self,
        key: &CorrectionKey,
    ) -> Option<RecordTransitionCorrection> {
        self.corrections().get(key).cloned()
    }

    /// Last writer wins.
    pub(crate) fn store_correction(&self, key: CorrectionKey, value: RecordTransitionCorrection) {
        self.corrections().insert(key, value);
    }

    /// Number of memoized pairwise corrections.
    pub fn cached_corrections(&self) -> usize {
        self.corrections().len()
    }
}

fn adjacency_warnings(
    formula: &str,
    records: &[DatabaseRecord],
    tolerance: f64,
) -> Vec<ConsistencyWarning> {
    records
        .windows(2)
        .filter_map(|pair| {
            let (a, b) = (&pair[0], &pair[1]);
            let diff = b.t_min() - a.t_max();
            let (before, after, t_max_k, next_t_min_k) =
                (a.id(), b.id(), a.t_max(), b.t_min());
            if diff > tolerance {
                Some(ConsistencyWarning::AdjacencyGap {
                    formula: formula.to_string(),
                    before,
                    after,
                    t_max_k,
                    next_t_min_k,
                })
            } else if diff < -tolerance {
                Some(ConsistencyWarning::AdjacencyOverlap {
                    formula: formula.to_string(),
                    before,
                    after,
                    t_max_k,
                    next_t_min_k,
                })
            } else {
                None
            }
        })
        .collect()
}

fn build_segments(records: &[DatabaseRecord]) -> Vec<PhaseSegment> {
    let mut segments: Vec<PhaseSegment> = Vec::new();
    for (i, r) in records.iter().enumerate() {
        match segments.last_mut() {
            Some(seg) if seg.phase == r.phase() => {
                seg.indices.end = i + 1;
                seg.t_start = seg.t_start.min(r.t_min());
                seg.t_end = seg.t_end.max(r.t_max());
            }
            _ => segments.push(PhaseSegment {
                phase: r.phase(),
                t_start: r.t_min(),
                t_end: r.t_max(),
                indices: i..i + 1,
            }),
        }
    }
    segments
}
