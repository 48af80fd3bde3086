//! Thermodynamic property values at one temperature.

use serde::Serialize;
use tc_core::units::{MolarEnergy, MolarHeatCapacity, Temperature, j_per_mol, j_per_mol_k, j_to_kj, k};

use crate::phase::Phase;

/// Cp, H, S and G of a compound at one temperature.
///
/// Produced per call and never mutated; adjustments (continuity offsets,
/// transition jumps) build a new value and recompute G = H − T·S.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThermodynamicProperties {
    /// Temperature [K]
    pub temperature_k: f64,
    /// Heat capacity [J/(mol·K)]
    pub cp_j_mol_k: f64,
    /// Enthalpy [J/mol]
    pub h_j_mol: f64,
    /// Entropy [J/(mol·K)]
    pub s_j_mol_k: f64,
    /// Gibbs energy [J/mol]
    pub g_j_mol: f64,
    /// Active phase, when the value came from a phase-resolved record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
}

impl ThermodynamicProperties {
    pub fn new(temperature_k: f64, cp: f64, h: f64, s: f64, phase: Option<Phase>) -> Self {
        Self {
            temperature_k,
            cp_j_mol_k: cp,
            h_j_mol: h,
            s_j_mol_k: s,
            g_j_mol: h - temperature_k * s,
            phase,
        }
    }

    /// Same state shifted by enthalpy/entropy offsets.
    pub fn with_offsets(&self, delta_h_j_mol: f64, delta_s_j_mol_k: f64) -> Self {
        if delta_h_j_mol == 0.0 && delta_s_j_mol_k == 0.0 {
            return *self;
        }
        Self::new(
            self.temperature_k,
            self.cp_j_mol_k,
            self.h_j_mol + delta_h_j_mol,
            self.s_j_mol_k + delta_s_j_mol_k,
            self.phase,
        )
    }

    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn temperature(&self) -> Temperature {
        k(self.temperature_k)
    }

    pub fn enthalpy(&self) -> MolarEnergy {
        j_per_mol(self.h_j_mol)
    }

    pub fn gibbs_energy(&self) -> MolarEnergy {
        j_per_mol(self.g_j_mol)
    }

    pub fn entropy(&self) -> MolarHeatCapacity {
        j_per_mol_k(self.s_j_mol_k)
    }

    pub fn heat_capacity(&self) -> MolarHeatCapacity {
        j_per_mol_k(self.cp_j_mol_k)
    }

    /// Enthalpy in the database convention [kJ/mol].
    pub fn h_kj_mol(&self) -> f64 {
        j_to_kj(self.h_j_mol)
    }

    /// Gibbs energy [kJ/mol].
    pub fn g_kj_mol(&self) -> f64 {
        j_to_kj(self.g_j_mol)
    }

    /// Return a summary string of all contained properties (for debugging).
    pub fn summary(&self) -> String {
        let phase = self.phase.map(|p| p.code()).unwrap_or("-");
        format!(
            "Props(T={:.2}K,phase={},Cp={:.3}J/mol·K,H={:.3}kJ/mol,S={:.3}J/mol·K,G={:.3}kJ/mol)",
            self.temperature_k,
            phase,
            self.cp_j_mol_k,
            self.h_kj_mol(),
            self.s_j_mol_k,
            self.g_kj_mol()
        )
    }
}
