// tc-core/src/units.rs

use uom::si::f64::{
    MolarEnergy as UomMolarEnergy, MolarHeatCapacity as UomMolarHeatCapacity,
    ThermodynamicTemperature as UomThermodynamicTemperature,
};

// Public canonical unit types (SI, f64). Hot paths stay in plain f64 J/mol
// and J/(mol·K); these lift values into uom at API edges.
pub type MolarEnergy = UomMolarEnergy;
pub type MolarHeatCapacity = UomMolarHeatCapacity;
pub type Temperature = UomThermodynamicTemperature;

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn kelvin_of(t: Temperature) -> f64 {
    use uom::si::thermodynamic_temperature::kelvin;
    t.get::<kelvin>()
}

#[inline]
pub fn j_per_mol(v: f64) -> MolarEnergy {
    use uom::si::molar_energy::joule_per_mole;
    MolarEnergy::new::<joule_per_mole>(v)
}

#[inline]
pub fn j_per_mol_k(v: f64) -> MolarHeatCapacity {
    use uom::si::molar_heat_capacity::joule_per_kelvin_mole;
    MolarHeatCapacity::new::<joule_per_kelvin_mole>(v)
}

/// kJ/mol (database convention for H298) to J/mol.
#[inline]
pub fn kj_to_j(v_kj: f64) -> f64 {
    v_kj * 1000.0
}

/// J/mol to kJ/mol.
#[inline]
pub fn j_to_kj(v_j: f64) -> f64 {
    v_j / 1000.0
}

pub mod constants {
    /// Standard reference temperature [K].
    pub const T_REF_K: f64 = 298.15;
}
