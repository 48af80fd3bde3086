//! Empirical transition estimates used when records cannot give ΔH.

use crate::formula::{self, CompoundClass};
use crate::transitions::TransitionKind;

/// Trouton's rule: boiling entropy of most liquids [J/(mol·K)].
pub const TROUTON_ENTROPY_J_MOL_K: f64 = 87.0;

/// Reliability assigned to melting and boiling estimates.
pub const HEURISTIC_RELIABILITY: f64 = 0.5;
/// Sublimation stacks two estimates.
pub const SUBLIMATION_RELIABILITY: f64 = 0.4;

/// Typical melting entropy for a compound class [J/(mol·K)].
pub fn melting_entropy(class: CompoundClass) -> f64 {
    match class {
        CompoundClass::Metal => 10.0,
        CompoundClass::Salt => 25.0,
        CompoundClass::Oxide => 20.0,
        CompoundClass::Molecular => 15.0,
    }
}

/// Estimated ΔH/ΔS for one transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicEstimate {
    pub delta_h_kj_mol: f64,
    pub delta_s_j_mol_k: f64,
    pub reliability: f64,
    pub class: CompoundClass,
}

/// ΔS from the empirical rules, ΔH = ΔS·T.
pub fn estimate(kind: TransitionKind, formula: &str, t_k: f64) -> HeuristicEstimate {
    let class = formula::classify(formula);
    let (delta_s, reliability) = match kind {
        TransitionKind::Melting => (melting_entropy(class), HEURISTIC_RELIABILITY),
        TransitionKind::Boiling => (TROUTON_ENTROPY_J_MOL_K, HEURISTIC_RELIABILITY),
        TransitionKind::Sublimation => (
            melting_entropy(class) + TROUTON_ENTROPY_J_MOL_K,
            SUBLIMATION_RELIABILITY,
        ),
    };
    HeuristicEstimate {
        delta_h_kj_mol: delta_s * t_k / 1000.0,
        delta_s_j_mol_k: delta_s,
        reliability,
        class,
    }
}
