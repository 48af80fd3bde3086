//! Phase transitions derived from per-phase reference values.
//!
//! Sources do not store ΔH of melting or boiling. They are recovered as the
//! difference between the after-phase and before-phase enthalpy at the
//! transition temperature, each side evaluated on its own baseline. When that
//! is impossible or unphysical an empirical estimate is used instead.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::continuity::RecordContinuityCorrector;
use crate::error::{ConsistencyWarning, ThermoError, ThermoResult};
use crate::heuristics;
use crate::phase::Phase;
use crate::polynomial::PolynomialPropertyModel;
use crate::properties::ThermodynamicProperties;
use crate::record_set::CompoundRecordSet;

/// Default window for matching a query temperature to a transition [K].
pub const DEFAULT_TRANSITION_TOLERANCE_K: f64 = 1e-3;

/// Reliability when both sides cover the transition temperature.
const COVERED_RELIABILITY: f64 = 0.8;
/// Reliability when a side had to be extrapolated from the nearest record.
const EXTRAPOLATED_RELIABILITY: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Melting,
    Boiling,
    Sublimation,
}

impl TransitionKind {
    /// `(from, to)` phases.
    pub fn phases(self) -> (Phase, Phase) {
        match self {
            Self::Melting => (Phase::Solid, Phase::Liquid),
            Self::Boiling => (Phase::Liquid, Phase::Gas),
            Self::Sublimation => (Phase::Solid, Phase::Gas),
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Melting => "melting",
            Self::Boiling => "boiling",
            Self::Sublimation => "sublimation",
        })
    }
}

/// How ΔH/ΔS were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMethod {
    Calculated,
    Heuristic,
}

impl fmt::Display for CalculationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Calculated => "calculated",
            Self::Heuristic => "heuristic",
        })
    }
}

/// One first-order transition of a compound.
///
/// Always endothermic: construction rejects ΔH ≤ 0 or ΔS ≤ 0.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseTransition {
    formula: String,
    kind: TransitionKind,
    temperature_k: f64,
    from: Phase,
    to: Phase,
    delta_h_kj_mol: f64,
    delta_s_j_mol_k: f64,
    method: CalculationMethod,
    reliability: f64,
    warning: Option<ConsistencyWarning>,
}

impl PhaseTransition {
    pub fn new(
        formula: impl Into<String>,
        kind: TransitionKind,
        temperature_k: f64,
        delta_h_kj_mol: f64,
        delta_s_j_mol_k: f64,
        method: CalculationMethod,
        reliability: f64,
    ) -> ThermoResult<Self> {
        let (from, to) = kind.phases();
        let invalid = |what: &str| ThermoError::InvalidTransition {
            kind,
            from,
            to,
            t_k: temperature_k,
            what: what.to_string(),
        };
        if !temperature_k.is_finite() || temperature_k <= 0.0 {
            return Err(invalid("temperature must be positive"));
        }
        if !delta_h_kj_mol.is_finite() || delta_h_kj_mol <= 0.0 {
            return Err(invalid("ΔH must be positive"));
        }
        if !delta_s_j_mol_k.is_finite() || delta_s_j_mol_k <= 0.0 {
            return Err(invalid("ΔS must be positive"));
        }
        if !(0.0..=1.0).contains(&reliability) {
            return Err(invalid("reliability must lie in [0, 1]"));
        }
        Ok(Self {
            formula: formula.into(),
            kind,
            temperature_k,
            from,
            to,
            delta_h_kj_mol,
            delta_s_j_mol_k,
            method,
            reliability,
            warning: None,
        })
    }

    pub fn with_warning(mut self, warning: ConsistencyWarning) -> Self {
        self.warning = Some(warning);
        self
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }

    pub fn kind(&self) -> TransitionKind {
        self.kind
    }

    pub fn temperature_k(&self) -> f64 {
        self.temperature_k
    }

    pub fn from_phase(&self) -> Phase {
        self.from
    }

    pub fn to_phase(&self) -> Phase {
        self.to
    }

    /// ΔH [kJ/mol].
    pub fn delta_h_kj_mol(&self) -> f64 {
        self.delta_h_kj_mol
    }

    /// ΔS [J/(mol·K)].
    pub fn delta_s_j_mol_k(&self) -> f64 {
        self.delta_s_j_mol_k
    }

    pub fn method(&self) -> CalculationMethod {
        self.method
    }

    pub fn reliability(&self) -> f64 {
        self.reliability
    }

    pub fn warning(&self) -> Option<&ConsistencyWarning> {
        self.warning.as_ref()
    }

    /// Add the jump to a before-phase state.
    pub fn apply(&self, before: &ThermodynamicProperties) -> ThermodynamicProperties {
        ThermodynamicProperties::new(
            before.temperature_k,
            before.cp_j_mol_k,
            before.h_j_mol + self.delta_h_kj_mol * 1000.0,
            before.s_j_mol_k + self.delta_s_j_mol_k,
            Some(self.to),
        )
    }
}

/// First transition within `tolerance` of `t`.
pub fn detect_at(
    transitions: &[PhaseTransition],
    t: f64,
    tolerance: f64,
) -> Option<&PhaseTransition> {
    transitions
        .iter()
        .find(|tr| (tr.temperature_k - t).abs() <= tolerance)
}

/// Transitions of a record set plus the entry offsets they imply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionAnalysis {
    /// In temperature order.
    pub transitions: Vec<PhaseTransition>,
    /// Per phase `(ΔH [J/mol], ΔS [J/(mol·K)])` added to every value of that
    /// phase. Non-zero only for phases entered through a heuristic jump.
    pub phase_offsets: BTreeMap<Phase, (f64, f64)>,
}

impl TransitionAnalysis {
    pub fn offset(&self, phase: Phase) -> (f64, f64) {
        self.phase_offsets.get(&phase).copied().unwrap_or((0.0, 0.0))
    }
}

/// Which covering record to prefer on one side of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Before,
    After,
}

/// Record of `phase` used at `t`: covering if possible, else nearest by Tmin.
///
/// The bool is true when the record covers `t`.
pub(crate) fn side_record(
    set: &CompoundRecordSet,
    phase: Phase,
    t: f64,
    side: Side,
) -> Option<(usize, bool)> {
    let records = set.records();
    let of_phase = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.phase() == phase);
    let covering = match side {
        Side::Before => of_phase.clone().find(|(_, r)| r.covers(t)),
        Side::After => of_phase.clone().filter(|(_, r)| r.covers(t)).last(),
    };
    if let Some((i, _)) = covering {
        return Some((i, true));
    }
    of_phase
        .min_by(|(_, a), (_, b)| {
            (a.t_min() - t)
                .abs()
                .total_cmp(&(b.t_min() - t).abs())
        })
        .map(|(i, _)| (i, false))
}

/// Derives phase transitions from a record set.
#[derive(Debug, Clone, Copy)]
pub struct TransitionExtractor<'m> {
    corrector: RecordContinuityCorrector<'m>,
}

impl<'m> TransitionExtractor<'m> {
    pub fn new(model: &'m PolynomialPropertyModel) -> Self {
        Self::from_corrector(RecordContinuityCorrector::new(model))
    }

    pub fn from_corrector(corrector: RecordContinuityCorrector<'m>) -> Self {
        Self { corrector }
    }

    /// Transitions only, in temperature order.
    pub fn extract(&self, set: &CompoundRecordSet) -> Vec<PhaseTransition> {
        self.analyze(set).transitions
    }

    pub fn analyze(&self, set: &CompoundRecordSet) -> TransitionAnalysis {
        let mut candidates = candidate_transitions(set);
        candidates.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut analysis = TransitionAnalysis::default();
        for (kind, t) in candidates {
            if let Some((transition, offset)) = self.derive(set, kind, t, &analysis) {
                if offset != (0.0, 0.0) {
                    debug!(
                        formula = %set.formula(),
                        phase = %transition.to_phase(),
                        delta_h_j_mol = offset.0,
                        delta_s_j_mol_k = offset.1,
                        "phase entry offset"
                    );
                }
                analysis.phase_offsets.insert(transition.to_phase(), offset);
                analysis.transitions.push(transition);
            }
        }
        analysis
    }

    fn derive(
        &self,
        set: &CompoundRecordSet,
        kind: TransitionKind,
        t: f64,
        so_far: &TransitionAnalysis,
    ) -> Option<(PhaseTransition, (f64, f64))> {
        let (from, to) = kind.phases();
        let (bi, before_covered) = side_record(set, from, t, Side::Before)?;
        let (ai, after_covered) = side_record(set, to, t, Side::After)?;

        let (off_h, off_s) = so_far.offset(from);
        let before = self
            .corrector
            .anchored_properties(set, bi, t, true)
            .map(|p| p.with_offsets(off_h, off_s));
        let after = self.corrector.anchored_properties(set, ai, t, true);
        let inherited = self.corrector.selector().is_inherited(set.records(), ai);

        let calculated = match (&before, &after) {
            _ if inherited => Err(format!("{to} phase has no reference values of its own")),
            (Err(e), _) | (_, Err(e)) => Err(e.to_string()),
            (Ok(b), Ok(a)) => {
                let dh_kj = (a.h_j_mol - b.h_j_mol) / 1000.0;
                if dh_kj > 0.0 {
                    let reliability = if before_covered && after_covered {
                        COVERED_RELIABILITY
                    } else {
                        EXTRAPOLATED_RELIABILITY
                    };
                    PhaseTransition::new(
                        set.formula(),
                        kind,
                        t,
                        dh_kj,
                        dh_kj * 1000.0 / t,
                        CalculationMethod::Calculated,
                        reliability,
                    )
                    .map_err(|e| e.to_string())
                } else {
                    Err(format!("derived ΔH = {dh_kj:.3} kJ/mol is not positive"))
                }
            }
        };

        let transition = match calculated {
            Ok(tr) => tr,
            Err(reason) => self.heuristic(set, kind, t, reason)?,
        };

        // A heuristic jump does not match the after-phase baseline, so that
        // phase is shifted to continue from the before-phase plus the jump.
        let bridged = inherited || transition.method() == CalculationMethod::Heuristic;
        let offset = match (&before, &after) {
            (Ok(b), Ok(a)) if bridged => (
                b.h_j_mol + transition.delta_h_kj_mol * 1000.0 - a.h_j_mol,
                b.s_j_mol_k + transition.delta_s_j_mol_k - a.s_j_mol_k,
            ),
            _ => (0.0, 0.0),
        };
        Some((transition, offset))
    }

    fn heuristic(
        &self,
        set: &CompoundRecordSet,
        kind: TransitionKind,
        t: f64,
        reason: String,
    ) -> Option<PhaseTransition> {
        let est = heuristics::estimate(kind, set.formula(), t);
        let warning = ConsistencyWarning::HeuristicTransition {
            formula: set.formula().to_string(),
            kind,
            t_k: t,
            reason,
        };
        warn!(formula = %set.formula(), class = %est.class, "{warning}");
        match PhaseTransition::new(
            set.formula(),
            kind,
            t,
            est.delta_h_kj_mol,
            est.delta_s_j_mol_k,
            CalculationMethod::Heuristic,
            est.reliability,
        ) {
            Ok(tr) => Some(tr.with_warning(warning)),
            Err(e) => {
                warn!(formula = %set.formula(), error = %e, "transition dropped");
                None
            }
        }
    }
}

/// `(kind, T_trans)` for every transition the phase inventory implies.
fn candidate_transitions(set: &CompoundRecordSet) -> Vec<(TransitionKind, f64)> {
    let first_segment_start = |phase: Phase| {
        set.segments()
            .iter()
            .find(|s| s.phase() == phase)
            .map(|s| s.t_start())
    };
    let has = |phase: Phase| first_segment_start(phase).is_some();
    let melting_point = set.records().iter().find_map(|r| r.melting_point());
    let boiling_point = set.records().iter().find_map(|r| r.boiling_point());

    let mut out = Vec::new();
    if has(Phase::Solid) && has(Phase::Liquid) {
        if let Some(t) = melting_point.or_else(|| first_segment_start(Phase::Liquid)) {
            out.push((TransitionKind::Melting, t));
        }
    }
    if has(Phase::Liquid) && has(Phase::Gas) {
        if let Some(t) = boiling_point.or_else(|| first_segment_start(Phase::Gas)) {
            out.push((TransitionKind::Boiling, t));
        }
    }
    if has(Phase::Solid) && has(Phase::Gas) && !has(Phase::Liquid) {
        if let Some(t) = boiling_point.or_else(|| first_segment_start(Phase::Gas)) {
            out.push((TransitionKind::Sublimation, t));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DatabaseRecord;
    use tc_core::RecordId;

    fn rec(
        i: u32,
        formula: &str,
        phase: Phase,
        t: (f64, f64),
        h: f64,
        s: f64,
        cp: f64,
    ) -> DatabaseRecord {
        DatabaseRecord::builder(RecordId::from_index(i), formula, phase)
            .range(t.0, t.1)
            .reference(h, s)
            .constant_cp(cp)
            .build()
            .unwrap()
    }

    #[test]
    fn construction_rejects_non_positive_jumps() {
        let ok = PhaseTransition::new(
            "H2O",
            TransitionKind::Boiling,
            373.15,
            40.7,
            109.0,
            CalculationMethod::Calculated,
            0.8,
        );
        assert!(ok.is_ok());
        for (dh, ds) in [(0.0, 10.0), (-1.0, 10.0), (1.0, 0.0), (f64::NAN, 1.0)] {
            let err = PhaseTransition::new(
                "H2O",
                TransitionKind::Melting,
                273.15,
                dh,
                ds,
                CalculationMethod::Calculated,
                0.8,
            );
            assert!(matches!(err, Err(ThermoError::InvalidTransition { .. })));
        }
    }

    #[test]
    fn apply_adds_jump_and_switches_phase() {
        let tr = PhaseTransition::new(
            "X",
            TransitionKind::Melting,
            500.0,
            10.0,
            20.0,
            CalculationMethod::Calculated,
            0.8,
        )
        .unwrap();
        let before = ThermodynamicProperties::new(500.0, 30.0, 1000.0, 50.0, Some(Phase::Solid));
        let after = tr.apply(&before);
        assert_eq!(after.h_j_mol, 11_000.0);
        assert_eq!(after.s_j_mol_k, 70.0);
        assert_eq!(after.g_j_mol, 11_000.0 - 500.0 * 70.0);
        assert_eq!(after.phase, Some(Phase::Liquid));
    }

    #[test]
    fn detect_respects_tolerance() {
        let tr = PhaseTransition::new(
            "X",
            TransitionKind::Boiling,
            400.0,
            30.0,
            75.0,
            CalculationMethod::Calculated,
            0.8,
        )
        .unwrap();
        let list = [tr];
        assert!(detect_at(&list, 400.0005, DEFAULT_TRANSITION_TOLERANCE_K).is_some());
        assert!(detect_at(&list, 400.01, DEFAULT_TRANSITION_TOLERANCE_K).is_none());
    }

    #[test]
    fn inherited_liquid_falls_back_to_heuristic_and_gets_offset() {
        let set = CompoundRecordSet::new(vec![
            rec(0, "NaCl", Phase::Solid, (298.15, 1074.0), -411.12, 72.11, 50.5),
            rec(1, "NaCl", Phase::Liquid, (1074.0, 1700.0), 0.0, 0.0, 66.9),
        ])
        .unwrap();
        let model = PolynomialPropertyModel::new();
        let analysis = TransitionExtractor::new(&model).analyze(&set);

        assert_eq!(analysis.transitions.len(), 1);
        let melt = &analysis.transitions[0];
        assert_eq!(melt.kind(), TransitionKind::Melting);
        assert_eq!(melt.method(), CalculationMethod::Heuristic);
        assert_eq!(melt.delta_s_j_mol_k(), 25.0);
        assert_eq!(melt.reliability(), 0.5);
        assert!(melt.warning().is_some());

        let (dh, _) = analysis.offset(Phase::Liquid);
        assert!(dh != 0.0);
        assert_eq!(analysis.offset(Phase::Solid), (0.0, 0.0));
    }

    #[test]
    fn sublimation_when_no_liquid() {
        let set = CompoundRecordSet::new(vec![
            rec(0, "CO2", Phase::Solid, (150.0, 194.7), -427.4, 51.1, 47.0),
            rec(1, "CO2", Phase::Gas, (194.7, 1200.0), -393.51, 213.79, 37.1),
        ])
        .unwrap();
        let model = PolynomialPropertyModel::new();
        let transitions = TransitionExtractor::new(&model).extract(&set);
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].kind(), TransitionKind::Sublimation);
        assert_eq!(transitions[0].from_phase(), Phase::Solid);
        assert_eq!(transitions[0].to_phase(), Phase::Gas);
        assert!(transitions[0].delta_h_kj_mol() > 0.0);
    }

    #[test]
    fn single_phase_has_no_transitions() {
        let set =
            CompoundRecordSet::new(vec![rec(0, "N2", Phase::Gas, (298.0, 3000.0), 0.0, 191.6, 29.1)])
                .unwrap();
        let model = PolynomialPropertyModel::new();
        assert!(TransitionExtractor::new(&model).extract(&set).is_empty());
    }

    #[test]
    fn heuristic_fallback_shifts_own_baseline_after_phase() {
        // gas baseline sits below the liquid: derived ΔH is negative
        let set = CompoundRecordSet::new(vec![
            rec(0, "C6H6", Phase::Liquid, (250.0, 400.0), -100.0, 70.0, 75.0),
            rec(1, "C6H6", Phase::Gas, (400.0, 1000.0), -200.0, 190.0, 33.6),
        ])
        .unwrap();
        let model = PolynomialPropertyModel::new();
        let extractor = TransitionExtractor::new(&model);
        let analysis = extractor.analyze(&set);

        let boil = &analysis.transitions[0];
        assert_eq!(boil.method(), CalculationMethod::Heuristic);

        let corrector = RecordContinuityCorrector::new(&model);
        let liquid = corrector.anchored_properties(&set, 0, 400.0, true).unwrap();
        let gas = corrector.anchored_properties(&set, 1, 400.0, true).unwrap();
        let (dh, ds) = analysis.offset(Phase::Gas);
        let expected_h = liquid.h_j_mol + boil.delta_h_kj_mol() * 1000.0;
        let expected_s = liquid.s_j_mol_k + boil.delta_s_j_mol_k();
        assert!((gas.h_j_mol + dh - expected_h).abs() < 1e-6);
        assert!((gas.s_j_mol_k + ds - expected_s).abs() < 1e-9);
    }
}
