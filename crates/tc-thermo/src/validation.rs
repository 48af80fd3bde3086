//! Plausibility checks over extracted transitions.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConsistencyWarning;
use crate::transitions::{PhaseTransition, TransitionKind};

/// Accepted entropy ranges [J/(mol·K)], inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationWindows {
    /// Trouton window for boiling.
    pub boiling_entropy: (f64, f64),
    pub melting_entropy: (f64, f64),
}

impl Default for ValidationWindows {
    fn default() -> Self {
        Self {
            boiling_entropy: (75.0, 95.0),
            melting_entropy: (8.0, 35.0),
        }
    }
}

impl ValidationWindows {
    pub fn is_valid(&self) -> bool {
        let ok = |(lo, hi): (f64, f64)| lo.is_finite() && hi.is_finite() && lo < hi;
        ok(self.boiling_entropy) && ok(self.melting_entropy)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransitionValidator {
    windows: ValidationWindows,
}

impl TransitionValidator {
    pub fn new(windows: ValidationWindows) -> Self {
        Self { windows }
    }

    /// Non-fatal findings; sign invariants are already enforced by
    /// [`PhaseTransition::new`].
    pub fn validate(&self, transitions: &[PhaseTransition]) -> Vec<ConsistencyWarning> {
        let mut out = Vec::new();

        for tr in transitions {
            if let Some(w) = tr.warning() {
                out.push(w.clone());
            }
            let ds = tr.delta_s_j_mol_k();
            let outside = |(lo, hi): (f64, f64)| !(lo..=hi).contains(&ds);
            match tr.kind() {
                TransitionKind::Boiling if outside(self.windows.boiling_entropy) => {
                    out.push(ConsistencyWarning::TroutonDeviation {
                        formula: tr.formula().to_string(),
                        t_k: tr.temperature_k(),
                        delta_s_j_mol_k: ds,
                        window: self.windows.boiling_entropy,
                    });
                }
                TransitionKind::Melting if outside(self.windows.melting_entropy) => {
                    out.push(ConsistencyWarning::MeltingEntropyDeviation {
                        formula: tr.formula().to_string(),
                        t_k: tr.temperature_k(),
                        delta_s_j_mol_k: ds,
                        window: self.windows.melting_entropy,
                    });
                }
                _ => {}
            }
        }

        let of_kind = |kind| transitions.iter().filter(move |t| t.kind() == kind);
        for melt in of_kind(TransitionKind::Melting) {
            for boil in of_kind(TransitionKind::Boiling) {
                if melt.formula() == boil.formula() && melt.temperature_k() > boil.temperature_k() {
                    out.push(ConsistencyWarning::TransitionOrder {
                        formula: melt.formula().to_string(),
                        melting_k: melt.temperature_k(),
                        boiling_k: boil.temperature_k(),
                    });
                }
            }
        }

        for w in &out {
            if !matches!(w, ConsistencyWarning::HeuristicTransition { .. }) {
                warn!("{w}");
            }
        }
        out
    }
}

/// [`TransitionValidator::validate`] with the default windows.
pub fn validate_consistency(transitions: &[PhaseTransition]) -> Vec<ConsistencyWarning> {
    TransitionValidator::default().validate(transitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transitions::CalculationMethod;

    fn tr(kind: TransitionKind, t: f64, ds: f64) -> PhaseTransition {
        PhaseTransition::new(
            "X",
            kind,
            t,
            ds * t / 1000.0,
            ds,
            CalculationMethod::Calculated,
            0.8,
        )
        .unwrap()
    }

    #[test]
    fn values_inside_windows_pass() {
        let list = [
            tr(TransitionKind::Melting, 300.0, 20.0),
            tr(TransitionKind::Boiling, 500.0, 88.0),
        ];
        assert!(validate_consistency(&list).is_empty());
    }

    #[test]
    fn trouton_and_melting_deviations() {
        let list = [
            tr(TransitionKind::Melting, 300.0, 50.0),
            tr(TransitionKind::Boiling, 500.0, 110.0),
        ];
        let warnings = validate_consistency(&list);
        assert_eq!(warnings.len(), 2);
        assert!(matches!(warnings[0], ConsistencyWarning::MeltingEntropyDeviation { .. }));
        assert!(matches!(warnings[1], ConsistencyWarning::TroutonDeviation { .. }));
        assert!(warnings[1].to_string().contains("Trouton"));
    }

    #[test]
    fn melting_above_boiling_is_flagged() {
        let list = [
            tr(TransitionKind::Melting, 600.0, 20.0),
            tr(TransitionKind::Boiling, 500.0, 85.0),
        ];
        let warnings = validate_consistency(&list);
        assert!(matches!(
            warnings.as_slice(),
            [ConsistencyWarning::TransitionOrder { .. }]
        ));
    }

    #[test]
    fn windows_validity() {
        assert!(ValidationWindows::default().is_valid());
        let inverted = ValidationWindows {
            boiling_entropy: (95.0, 75.0),
            ..ValidationWindows::default()
        };
        assert!(!inverted.is_valid());
    }
}
