//! Source-database records.
//!
//! A record is one phase and temperature sub-range of a compound, carrying the
//! reference values at 298.15 K and the six heat-capacity coefficients valid
//! over `[Tmin, Tmax]`. Records are immutable once built; every constructor
//! (builder or deserialization) goes through the same validation.

use serde::{Deserialize, Serialize};
use tc_core::{RecordId, Tolerances, nearly_equal};

use crate::error::{ThermoError, ThermoResult};
use crate::phase::Phase;

/// Default reliability class when the source does not state one.
pub const DEFAULT_RELIABILITY_CLASS: u8 = 1;

/// Six heat-capacity coefficients `f1..f6`.
///
/// ```text
/// Cp(T) = f1 + f2·T·1e-3 + f3·1e5/T² + f4·T²·1e-6 + f5·1e3/T³ + f6·T³·1e-9
/// ```
///
/// Missing coefficients are zero; the defaulting happens once here.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HeatCapacityCoefficients {
    #[serde(default)]
    pub f1: f64,
    #[serde(default)]
    pub f2: f64,
    #[serde(default)]
    pub f3: f64,
    #[serde(default)]
    pub f4: f64,
    #[serde(default)]
    pub f5: f64,
    #[serde(default)]
    pub f6: f64,
}

impl HeatCapacityCoefficients {
    pub const fn new(coeffs: [f64; 6]) -> Self {
        let [f1, f2, f3, f4, f5, f6] = coeffs;
        Self {
            f1,
            f2,
            f3,
            f4,
            f5,
            f6,
        }
    }

    /// Temperature-independent Cp.
    pub const fn constant(cp: f64) -> Self {
        Self::new([cp, 0.0, 0.0, 0.0, 0.0, 0.0])
    }

    pub fn as_array(&self) -> [f64; 6] {
        [self.f1, self.f2, self.f3, self.f4, self.f5, self.f6]
    }

    fn all_finite(&self) -> bool {
        self.as_array().iter().all(|c| c.is_finite())
    }
}

/// One database record. See the module docs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RecordRow", into = "RecordRow")]
pub struct DatabaseRecord {
    id: RecordId,
    formula: String,
    phase: Phase,
    t_min: f64,
    t_max: f64,
    h298_kj: f64,
    s298: f64,
    coeffs: HeatCapacityCoefficients,
    melting_point: Option<f64>,
    boiling_point: Option<f64>,
    reliability_class: u8,
}

impl DatabaseRecord {
    /// Start building a record.
    pub fn builder(id: RecordId, formula: impl Into<String>, phase: Phase) -> RecordBuilder {
        RecordBuilder {
            id,
            formula: formula.into(),
            phase,
            t_range: None,
            h298_kj: 0.0,
            s298: 0.0,
            coeffs: HeatCapacityCoefficients::default(),
            melting_point: None,
            boiling_point: None,
            reliability_class: DEFAULT_RELIABILITY_CLASS,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Lower validity bound [K].
    pub fn t_min(&self) -> f64 {
        self.t_min
    }

    /// Upper validity bound [K].
    pub fn t_max(&self) -> f64 {
        self.t_max
    }

    /// Standard enthalpy at 298.15 K [kJ/mol].
    pub fn h298_kj(&self) -> f64 {
        self.h298_kj
    }

    /// Standard entropy at 298.15 K [J/(mol·K)].
    pub fn s298(&self) -> f64 {
        self.s298
    }

    pub fn coefficients(&self) -> &HeatCapacityCoefficients {
        &self.coeffs
    }

    /// Melting point [K], `None` when the source leaves it blank or zero.
    pub fn melting_point(&self) -> Option<f64> {
        self.melting_point
    }

    /// Boiling point [K], `None` when the source leaves it blank or zero.
    pub fn boiling_point(&self) -> Option<f64> {
        self.boiling_point
    }

    /// 1 is the most reliable class.
    pub fn reliability_class(&self) -> u8 {
        self.reliability_class
    }

    /// Whether `t` lies in `[Tmin, Tmax]`, tolerating float noise at the bounds.
    pub fn covers(&self, t: f64) -> bool {
        let tol = Tolerances::temperature();
        (t > self.t_min || nearly_equal(t, self.t_min, tol))
            && (t < self.t_max || nearly_equal(t, self.t_max, tol))
    }

    /// Midpoint of the validity range, handy for diagnostics.
    pub fn t_mid(&self) -> f64 {
        0.5 * (self.t_min + self.t_max)
    }
}

/// Builder for [`DatabaseRecord`]; `build` validates.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    id: RecordId,
    formula: String,
    phase: Phase,
    t_range: Option<(f64, f64)>,
    h298_kj: f64,
    s298: f64,
    coeffs: HeatCapacityCoefficients,
    melting_point: Option<f64>,
    boiling_point: Option<f64>,
    reliability_class: u8,
}

impl RecordBuilder {
    pub fn range(mut self, t_min: f64, t_max: f64) -> Self {
        self.t_range = Some((t_min, t_max));
        self
    }

    /// H298 in kJ/mol and S298 in J/(mol·K).
    pub fn reference(mut self, h298_kj: f64, s298: f64) -> Self {
        self.h298_kj = h298_kj;
        self.s298 = s298;
        self
    }

    pub fn coefficients(mut self, coeffs: [f64; 6]) -> Self {
        self.coeffs = HeatCapacityCoefficients::new(coeffs);
        self
    }

    pub fn constant_cp(mut self, cp: f64) -> Self {
        self.coeffs = HeatCapacityCoefficients::constant(cp);
        self
    }

    pub fn melting_point(mut self, t: f64) -> Self {
        self.melting_point = Some(t);
        self
    }

    pub fn boiling_point(mut self, t: f64) -> Self {
        self.boiling_point = Some(t);
        self
    }

    pub fn reliability_class(mut self, class: u8) -> Self {
        self.reliability_class = class;
        self
    }

    pub fn build(self) -> ThermoResult<DatabaseRecord> {
        let invalid = |what: String| ThermoError::InvalidRecord { id: self.id, what };

        if self.formula.trim().is_empty() {
            return Err(invalid("formula must not be empty".to_string()));
        }

        let (t_min, t_max) = self
            .t_range
            .ok_or_else(|| invalid("temperature range is required".to_string()))?;
        if !t_min.is_finite() || !t_max.is_finite() {
            return Err(invalid(format!(
                "temperature range must be finite, got [{t_min}, {t_max}]"
            )));
        }
        if t_min < 0.0 || t_max <= 0.0 {
            return Err(invalid(format!(
                "temperatures must be positive, got [{t_min}, {t_max}]"
            )));
        }
        if t_min >= t_max {
            return Err(invalid(format!("Tmin {t_min} K must be below Tmax {t_max} K")));
        }
        if !self.h298_kj.is_finite() || !self.s298.is_finite() {
            return Err(invalid("reference values must be finite".to_string()));
        }
        if !self.coeffs.all_finite() {
            return Err(invalid("heat-capacity coefficients must be finite".to_string()));
        }
        if !(1..=9).contains(&self.reliability_class) {
            return Err(invalid(format!(
                "reliability class must be 1..=9, got {}",
                self.reliability_class
            )));
        }

        Ok(DatabaseRecord {
            id: self.id,
            formula: self.formula.trim().to_string(),
            phase: self.phase,
            t_min,
            t_max,
            h298_kj: self.h298_kj,
            s298: self.s298,
            coeffs: self.coeffs,
            melting_point: known_temperature(self.melting_point),
            boiling_point: known_temperature(self.boiling_point),
            reliability_class: self.reliability_class,
        })
    }
}

/// The source stores "unknown" transition temperatures as 0 or NULL.
fn known_temperature(t: Option<f64>) -> Option<f64> {
    t.filter(|v| v.is_finite() && *v > 0.0)
}

/// Flat row layout as delivered by the search layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecordRow {
    id: RecordId,
    formula: String,
    phase: Phase,
    #[serde(alias = "tmin")]
    t_min: f64,
    #[serde(alias = "tmax")]
    t_max: f64,
    #[serde(default)]
    h298: f64,
    #[serde(default)]
    s298: f64,
    #[serde(flatten)]
    coeffs: HeatCapacityCoefficients,
    #[serde(default, alias = "tmelt")]
    melting_point: Option<f64>,
    #[serde(default, alias = "tboil")]
    boiling_point: Option<f64>,
    #[serde(default = "default_reliability_class")]
    reliability_class: u8,
}

fn default_reliability_class() -> u8 {
    DEFAULT_RELIABILITY_CLASS
}

impl TryFrom<RecordRow> for DatabaseRecord {
    type Error = ThermoError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let mut builder = DatabaseRecord::builder(row.id, row.formula, row.phase)
            .range(row.t_min, row.t_max)
            .reference(row.h298, row.s298)
            .coefficients(row.coeffs.as_array())
            .reliability_class(row.reliability_class);
        if let Some(t) = row.melting_point {
            builder = builder.melting_point(t);
        }
        if let Some(t) = row.boiling_point {
            builder = builder.boiling_point(t);
        }
        builder.build()
    }
}

impl From<DatabaseRecord> for RecordRow {
    fn from(r: DatabaseRecord) -> Self {
        Self {
            id: r.id,
            formula: r.formula,
            phase: r.phase,
            t_min: r.t_min,
            t_max: r.t_max,
            h298: r.h298_kj,
            s298: r.s298,
            coeffs: r.coeffs,
            melting_point: r.melting_point,
            boiling_point: r.boiling_point,
            reliability_class: r.reliability_class,
        }
    }
}
