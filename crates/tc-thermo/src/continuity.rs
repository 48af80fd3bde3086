//! Offsets that keep H and S continuous across same-phase record switches.
//!
//! Two adjacent records of one phase are fitted independently, so their H and S
//! curves rarely meet exactly at the shared boundary. The corrector measures
//! the mismatch at `T0 = B.Tmin` and accumulates it along the phase run.

use serde::{Deserialize, Serialize};
use tc_core::{RecordId, Tolerances, nearly_equal};
use tracing::{debug, warn};

use crate::error::{ConsistencyWarning, GapSeverity, ThermoResult};
use crate::polynomial::PolynomialPropertyModel;
use crate::properties::ThermodynamicProperties;
use crate::record::DatabaseRecord;
use crate::record_set::{CompoundRecordSet, DEFAULT_ADJACENCY_TOLERANCE_K};
use crate::reference::ReferenceValueSelector;

/// Classification limits for record-switch mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContinuityThresholds {
    /// |ΔH| at or below this is a natural join [J/mol].
    pub natural_h_j_mol: f64,
    /// |ΔS| at or below this is a natural join [J/(mol·K)].
    pub natural_s_j_mol_k: f64,
    /// |ΔH| above this is a significant enthalpy gap [J/mol].
    pub significant_h_j_mol: f64,
    /// |ΔS| above this is a significant entropy gap [J/(mol·K)].
    pub significant_s_j_mol_k: f64,
}

impl Default for ContinuityThresholds {
    fn default() -> Self {
        Self {
            natural_h_j_mol: 1.0,
            natural_s_j_mol_k: 0.01,
            significant_h_j_mol: 1000.0,
            significant_s_j_mol_k: 10.0,
        }
    }
}

/// Coarse grade of a correction's magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionQuality {
    Excellent,
    Good,
    Acceptable,
    Poor,
}

/// ΔH/ΔS to add to record B's values so they join record A's at `t_k`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTransitionCorrection {
    pub from: RecordId,
    pub to: RecordId,
    pub t_k: f64,
    pub delta_h_j_mol: f64,
    pub delta_s_j_mol_k: f64,
    pub warning: Option<ConsistencyWarning>,
    pub is_natural: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct CorrectionKey {
    from: RecordId,
    to: RecordId,
    t_bits: u64,
}

/// Computes and accumulates record-switch corrections.
///
/// Borrows the caller's model so evaluations share its cache.
#[derive(Debug, Clone, Copy)]
pub struct RecordContinuityCorrector<'m> {
    model: &'m PolynomialPropertyModel,
    selector: ReferenceValueSelector,
    thresholds: ContinuityThresholds,
}

impl<'m> RecordContinuityCorrector<'m> {
    pub fn new(model: &'m PolynomialPropertyModel) -> Self {
        Self {
            model,
            selector: ReferenceValueSelector::default(),
            thresholds: ContinuityThresholds::default(),
        }
    }

    pub fn with_selector(mut self, selector: ReferenceValueSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_thresholds(mut self, thresholds: ContinuityThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn model(&self) -> &'m PolynomialPropertyModel {
        self.model
    }

    pub fn selector(&self) -> &ReferenceValueSelector {
        &self.selector
    }

    /// `a` ends where `b` starts, same phase and formula.
    pub fn are_compatible(&self, a: &DatabaseRecord, b: &DatabaseRecord) -> bool {
        let tol = Tolerances {
            abs: DEFAULT_ADJACENCY_TOLERANCE_K,
            rel: 0.0,
        };
        a.formula() == b.formula()
            && a.phase() == b.phase()
            && nearly_equal(a.t_max(), b.t_min(), tol)
    }

    /// Value of `records[index]` at `t` on its own baseline, without offsets.
    pub fn raw_properties(
        &self,
        set: &CompoundRecordSet,
        index: usize,
        t: f64,
        extrapolate: bool,
    ) -> ThermoResult<ThermodynamicProperties> {
        let records = set.records();
        let record = &records[index];
        let ref_index = self.selector.select(records, index).unwrap_or(index);
        let reference = &records[ref_index];
        let elemental = set.applies_elemental_override(ref_index);
        if extrapolate {
            self.model
                .properties_extrapolated(record, t, Some(reference), elemental)
        } else {
            self.model.properties(record, t, Some(reference), elemental)
        }
    }

    /// Raw value shifted by the cumulative offset of its phase run.
    pub fn anchored_properties(
        &self,
        set: &CompoundRecordSet,
        index: usize,
        t: f64,
        extrapolate: bool,
    ) -> ThermoResult<ThermodynamicProperties> {
        let raw = self.raw_properties(set, index, t, extrapolate)?;
        let (dh, ds) = self.cumulative_offset(set, index)?;
        Ok(raw.with_offsets(dh, ds))
    }

    /// Correction joining `records[b]` to `records[a]` at `B.Tmin`.
    pub fn corrections_for(
        &self,
        set: &CompoundRecordSet,
        a: usize,
        b: usize,
    ) -> ThermoResult<RecordTransitionCorrection> {
        let records = set.records();
        let (rec_a, rec_b) = (&records[a], &records[b]);
        let t0 = rec_b.t_min();
        let key = CorrectionKey {
            from: rec_a.id(),
            to: rec_b.id(),
            t_bits: t0.to_bits(),
        };
        if let Some(hit) = set.cached_correction(&key) {
            return Ok(hit);
        }

        let at_a = self.raw_properties(set, a, t0, true)?;
        let at_b = self.raw_properties(set, b, t0, true)?;
        let delta_h = at_a.h_j_mol - at_b.h_j_mol;
        let delta_s = at_a.s_j_mol_k - at_b.s_j_mol_k;

        let th = &self.thresholds;
        let is_natural =
            delta_h.abs() <= th.natural_h_j_mol && delta_s.abs() <= th.natural_s_j_mol_k;
        let warning = (!is_natural).then(|| {
            let severity = if delta_h.abs() > th.significant_h_j_mol {
                GapSeverity::SignificantEnthalpy
            } else if delta_s.abs() > th.significant_s_j_mol_k {
                GapSeverity::SignificantEntropy
            } else {
                GapSeverity::Minor
            };
            ConsistencyWarning::ContinuityGap {
                formula: set.formula().to_string(),
                before: rec_a.id(),
                after: rec_b.id(),
                t_k: t0,
                severity,
                delta_h_j_mol: delta_h,
                delta_s_j_mol_k: delta_s,
            }
        });

        match &warning {
            Some(w) => warn!(formula = %set.formula(), t_k = t0, "{w}"),
            None => debug!(
                formula = %set.formula(),
                from = %rec_a.id(),
                to = %rec_b.id(),
                t_k = t0,
                "natural record join"
            ),
        }

        let correction = RecordTransitionCorrection {
            from: rec_a.id(),
            to: rec_b.id(),
            t_k: t0,
            delta_h_j_mol: delta_h,
            delta_s_j_mol_k: delta_s,
            warning,
            is_natural,
        };
        set.store_correction(key, correction.clone());
        Ok(correction)
    }

    /// Sum of pairwise corrections from the start of `index`'s phase run.
    pub fn cumulative_offset(&self, set: &CompoundRecordSet, index: usize) -> ThermoResult<(f64, f64)> {
        let Some(segment) = set.segment_of(index) else {
            return Ok((0.0, 0.0));
        };
        let mut offset = (0.0, 0.0);
        for j in segment.first_index()..index {
            let c = self.corrections_for(set, j, j + 1)?;
            offset.0 += c.delta_h_j_mol;
            offset.1 += c.delta_s_j_mol_k;
        }
        Ok(offset)
    }

    /// Worse of the enthalpy and entropy grades.
    pub fn quality_of(&self, correction: &RecordTransitionCorrection) -> CorrectionQuality {
        let grade = |v: f64, limits: [f64; 3]| match v.abs() {
            x if x < limits[0] => CorrectionQuality::Excellent,
            x if x < limits[1] => CorrectionQuality::Good,
            x if x < limits[2] => CorrectionQuality::Acceptable,
            _ => CorrectionQuality::Poor,
        };
        grade(correction.delta_h_j_mol, [10.0, 100.0, 1000.0])
            .max(grade(correction.delta_s_j_mol_k, [0.1, 1.0, 10.0]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::Phase;

    fn rec(i: u32, t: (f64, f64), h: f64, s: f64, cp: f64) -> DatabaseRecord {
        DatabaseRecord::builder(RecordId::from_index(i), "Fe", Phase::Solid)
            .range(t.0, t.1)
            .reference(h, s)
            .constant_cp(cp)
            .build()
            .unwrap()
    }

    #[test]
    fn identical_fits_join_naturally() {
        let set = CompoundRecordSet::new(vec![
            rec(0, (298.15, 800.0), 0.0, 27.3, 25.0),
            rec(1, (800.0, 1184.0), 0.0, 0.0, 25.0),
        ])
        .unwrap();
        let model = PolynomialPropertyModel::new();
        let corrector = RecordContinuityCorrector::new(&model);
        let c = corrector.corrections_for(&set, 0, 1).unwrap();
        assert!(c.is_natural);
        assert!(c.warning.is_none());
        assert_eq!(corrector.quality_of(&c), CorrectionQuality::Excellent);
        assert_eq!(set.cached_corrections(), 1);
    }

    #[test]
    fn differing_fits_are_graded_and_offset() {
        let set = CompoundRecordSet::new(vec![
            rec(0, (298.15, 800.0), 0.0, 27.3, 25.0),
            rec(1, (800.0, 1184.0), 0.0, 0.0, 35.0),
        ])
        .unwrap();
        let model = PolynomialPropertyModel::new();
        let corrector = RecordContinuityCorrector::new(&model);
        let c = corrector.corrections_for(&set, 0, 1).unwrap();

        let expected_dh = (25.0 - 35.0) * (800.0 - 298.15);
        assert!((c.delta_h_j_mol - expected_dh).abs() < 1e-6);
        assert!(!c.is_natural);
        assert!(matches!(
            c.warning,
            Some(ConsistencyWarning::ContinuityGap {
                severity: GapSeverity::SignificantEnthalpy,
                ..
            })
        ));
        assert_eq!(corrector.quality_of(&c), CorrectionQuality::Poor);

        let below = corrector.anchored_properties(&set, 0, 800.0, false).unwrap();
        let above = corrector.anchored_properties(&set, 1, 800.0, false).unwrap();
        assert!((below.h_j_mol - above.h_j_mol).abs() < 1e-6);
        assert!((below.s_j_mol_k - above.s_j_mol_k).abs() < 1e-9);
    }

    #[test]
    fn compatibility_requires_shared_boundary_and_phase() {
        let model = PolynomialPropertyModel::new();
        let corrector = RecordContinuityCorrector::new(&model);
        let a = rec(0, (298.15, 800.0), 0.0, 27.3, 25.0);
        let b = rec(1, (800.0, 1184.0), 0.0, 0.0, 25.0);
        let c = rec(2, (900.0, 1184.0), 0.0, 0.0, 25.0);
        assert!(corrector.are_compatible(&a, &b));
        assert!(!corrector.are_compatible(&a, &c));
    }

    #[test]
    fn first_record_has_no_offset() {
        let set = CompoundRecordSet::new(vec![rec(0, (298.15, 800.0), 0.0, 27.3, 25.0)]).unwrap();
        let model = PolynomialPropertyModel::new();
        let corrector = RecordContinuityCorrector::new(&model);
        assert_eq!(corrector.cumulative_offset(&set, 0).unwrap(), (0.0, 0.0));
    }

    fn one_unit_cp_step() -> CompoundRecordSet {
        // ΔH ≈ -501.9 J/mol, ΔS ≈ -0.987 J/(mol·K) at 800 K
        CompoundRecordSet::new(vec![
            rec(0, (298.15, 800.0), 0.0, 27.3, 25.0),
            rec(1, (800.0, 1184.0), 0.0, 0.0, 26.0),
        ])
        .unwrap()
    }

    fn severity(c: &RecordTransitionCorrection) -> Option<GapSeverity> {
        match &c.warning {
            Some(ConsistencyWarning::ContinuityGap { severity, .. }) => Some(*severity),
            _ => None,
        }
    }

    #[test]
    fn small_mismatch_is_a_minor_gap() {
        let set = one_unit_cp_step();
        let model = PolynomialPropertyModel::new();
        let corrector = RecordContinuityCorrector::new(&model);
        let c = corrector.corrections_for(&set, 0, 1).unwrap();

        assert!((c.delta_h_j_mol + (800.0 - 298.15)).abs() < 1e-6);
        assert!((c.delta_s_j_mol_k + (800.0f64 / 298.15).ln()).abs() < 1e-9);
        assert!(!c.is_natural);
        assert_eq!(severity(&c), Some(GapSeverity::Minor));
        assert_eq!(corrector.quality_of(&c), CorrectionQuality::Acceptable);
    }

    #[test]
    fn entropy_threshold_grades_entropy_gap() {
        let set = one_unit_cp_step();
        let model = PolynomialPropertyModel::new();
        let corrector = RecordContinuityCorrector::new(&model).with_thresholds(ContinuityThresholds {
            significant_h_j_mol: 1.0e6,
            significant_s_j_mol_k: 0.5,
            ..ContinuityThresholds::default()
        });
        let c = corrector.corrections_for(&set, 0, 1).unwrap();
        assert_eq!(severity(&c), Some(GapSeverity::SignificantEntropy));
    }

    #[test]
    fn quality_takes_the_worse_grade() {
        let model = PolynomialPropertyModel::new();
        let corrector = RecordContinuityCorrector::new(&model);
        let correction = |dh: f64, ds: f64| RecordTransitionCorrection {
            from: RecordId::from_index(0),
            to: RecordId::from_index(1),
            t_k: 800.0,
            delta_h_j_mol: dh,
            delta_s_j_mol_k: ds,
            warning: None,
            is_natural: false,
        };
        assert_eq!(corrector.quality_of(&correction(5.0, 0.01)), CorrectionQuality::Excellent);
        assert_eq!(corrector.quality_of(&correction(-50.0, 0.05)), CorrectionQuality::Good);
        assert_eq!(corrector.quality_of(&correction(5.0, -0.5)), CorrectionQuality::Good);
        assert_eq!(corrector.quality_of(&correction(500.0, 0.05)), CorrectionQuality::Acceptable);
        assert_eq!(corrector.quality_of(&correction(5.0, 5.0)), CorrectionQuality::Acceptable);
        assert_eq!(corrector.quality_of(&correction(5.0, 12.0)), CorrectionQuality::Poor);
    }
}
