//! Temperature grids and property tables.

use tc_core::{Tolerances, nearly_equal};

use crate::error::{ThermoError, ThermoResult};
use crate::properties::ThermodynamicProperties;
use crate::record::DatabaseRecord;
use crate::record_set::CompoundRecordSet;

/// Smallest allowed grid step [K].
pub const MIN_STEP_K: f64 = 25.0;
/// Largest allowed grid step [K].
pub const MAX_STEP_K: f64 = 250.0;

/// Evenly stepped temperatures from `t_min` up to exactly `t_max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureGrid {
    t_min: f64,
    t_max: f64,
    step: f64,
}

impl TemperatureGrid {
    pub fn new(t_min: f64, t_max: f64, step: f64) -> ThermoResult<Self> {
        if !t_min.is_finite() || !t_max.is_finite() || t_min >= t_max {
            return Err(ThermoError::InvalidParameter {
                what: format!("temperature range [{t_min}, {t_max}] K must be finite and ascending"),
            });
        }
        if !(MIN_STEP_K..=MAX_STEP_K).contains(&step) {
            return Err(ThermoError::InvalidParameter {
                what: format!("step {step} K must lie in [{MIN_STEP_K}, {MAX_STEP_K}] K"),
            });
        }
        Ok(Self { t_min, t_max, step })
    }

    pub fn t_min(&self) -> f64 {
        self.t_min
    }

    pub fn t_max(&self) -> f64 {
        self.t_max
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Fresh iterator over the grid points; callable any number of times.
    ///
    /// A stepped point within temperature tolerance of `t_max` is replaced by
    /// `t_max` itself.
    pub fn points(&self) -> impl Iterator<Item = f64> + '_ {
        let tol = Tolerances::temperature();
        let interior = (0u32..)
            .map(move |i| self.t_min + f64::from(i) * self.step)
            .take_while(move |&t| t < self.t_max && !nearly_equal(t, self.t_max, tol));
        interior.chain(std::iter::once(self.t_max))
    }

    pub fn len(&self) -> usize {
        self.points().count()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// What a table is evaluated over.
#[derive(Debug, Clone, Copy)]
pub enum TableSource<'a> {
    Record(&'a DatabaseRecord),
    Compound(&'a CompoundRecordSet),
}

impl TableSource<'_> {
    pub fn formula(&self) -> &str {
        match self {
            Self::Record(r) => r.formula(),
            Self::Compound(set) => set.formula(),
        }
    }
}

impl<'a> From<&'a DatabaseRecord> for TableSource<'a> {
    fn from(r: &'a DatabaseRecord) -> Self {
        Self::Record(r)
    }
}

impl<'a> From<&'a CompoundRecordSet> for TableSource<'a> {
    fn from(set: &'a CompoundRecordSet) -> Self {
        Self::Compound(set)
    }
}

/// Ordered property rows over a grid.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyTable {
    formula: String,
    grid: TemperatureGrid,
    rows: Vec<ThermodynamicProperties>,
}

impl PropertyTable {
    pub(crate) fn new(
        formula: impl Into<String>,
        grid: TemperatureGrid,
        rows: Vec<ThermodynamicProperties>,
    ) -> Self {
        Self {
            formula: formula.into(),
            grid,
            rows,
        }
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }

    pub fn grid(&self) -> &TemperatureGrid {
        &self.grid
    }

    pub fn rows(&self) -> &[ThermodynamicProperties] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ThermodynamicProperties> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn temperatures(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.temperature_k).collect()
    }

    pub fn enthalpies(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.h_j_mol).collect()
    }

    pub fn entropies(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.s_j_mol_k).collect()
    }

    pub fn gibbs_energies(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.g_j_mol).collect()
    }
}

impl<'a> IntoIterator for &'a PropertyTable {
    type Item = &'a ThermodynamicProperties;
    type IntoIter = std::slice::Iter<'a, ThermodynamicProperties>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
