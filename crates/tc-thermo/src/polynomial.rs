//! Six-coefficient heat-capacity law and its exact integrals.
//!
//! ```text
//! Cp(T)   = f1 + f2·1e-3·T + f3·1e5/T² + f4·1e-6·T² + f5·1e3/T³ + f6·1e-9·T³
//! ∫Cp dT  = f1·T + f2·1e-3·T²/2 − f3·1e5/T + f4·1e-6·T³/3 − f5·1e3/(2T²) + f6·1e-9·T⁴/4
//! ∫Cp/T dT = f1·ln T + f2·1e-3·T − f3·1e5/(2T²) + f4·1e-6·T²/2 − f5·1e3/(3T³) + f6·1e-9·T³/3
//! ```
//!
//! H(T) = H298·1000 + ∫₂₉₈.₁₅ᵀ Cp dT and S(T) = S298 + ∫₂₉₈.₁₅ᵀ Cp/T dT.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tc_core::constants::T_REF_K;
use tc_core::kj_to_j;

use crate::cache::{PropertyCache, PropertyKey};
use crate::error::{RangeBound, ThermoError, ThermoResult};
use crate::properties::ThermodynamicProperties;
use crate::quadrature;
use crate::record::{DatabaseRecord, HeatCapacityCoefficients};

/// How ∫Cp dT and ∫Cp/T dT are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum IntegrationMethod {
    /// Exact antiderivative, O(1).
    #[default]
    ClosedForm,
    /// Composite Simpson rule; kept for cross-validating the closed form.
    Simpson { intervals: u32 },
}

impl IntegrationMethod {
    /// Stable discriminator used in cache keys.
    fn scheme_tag(self) -> u32 {
        match self {
            Self::ClosedForm => 0,
            Self::Simpson { intervals } => intervals.max(1),
        }
    }
}

impl HeatCapacityCoefficients {
    /// Cp(T) [J/(mol·K)], no range check.
    pub fn cp(&self, t: f64) -> f64 {
        let t2 = t * t;
        let t3 = t2 * t;
        self.f1 + self.f2 * t * 1e-3 + self.f3 * 1e5 / t2 + self.f4 * t2 * 1e-6
            + self.f5 * 1e3 / t3
            + self.f6 * t3 * 1e-9
    }

    /// Antiderivative of Cp(T).
    pub fn enthalpy_antiderivative(&self, t: f64) -> f64 {
        let t2 = t * t;
        let t3 = t2 * t;
        self.f1 * t + self.f2 * 1e-3 * t2 / 2.0 - self.f3 * 1e5 / t + self.f4 * 1e-6 * t3 / 3.0
            - self.f5 * 1e3 / (2.0 * t2)
            + self.f6 * 1e-9 * t3 * t / 4.0
    }

    /// Antiderivative of Cp(T)/T.
    pub fn entropy_antiderivative(&self, t: f64) -> f64 {
        let t2 = t * t;
        let t3 = t2 * t;
        self.f1 * t.ln() + self.f2 * 1e-3 * t - self.f3 * 1e5 / (2.0 * t2)
            + self.f4 * 1e-6 * t2 / 2.0
            - self.f5 * 1e3 / (3.0 * t3)
            + self.f6 * 1e-9 * t3 / 3.0
    }

    /// ∫ Cp dT from `t0` to `t1` [J/mol].
    pub fn enthalpy_increment(&self, t0: f64, t1: f64) -> f64 {
        self.enthalpy_antiderivative(t1) - self.enthalpy_antiderivative(t0)
    }

    /// ∫ Cp/T dT from `t0` to `t1` [J/(mol·K)].
    pub fn entropy_increment(&self, t0: f64, t1: f64) -> f64 {
        self.entropy_antiderivative(t1) - self.entropy_antiderivative(t0)
    }
}

/// Property model for the six-coefficient law.
///
/// Holds an optional caller-owned [`PropertyCache`]. The model itself is
/// immutable and `Send + Sync`; share it by reference.
#[derive(Debug, Clone, Default)]
pub struct PolynomialPropertyModel {
    method: IntegrationMethod,
    cache: Option<Arc<PropertyCache>>,
}

impl PolynomialPropertyModel {
    /// Uncached, closed-form model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Closed-form model memoizing into `cache`.
    pub fn with_cache(cache: Arc<PropertyCache>) -> Self {
        Self {
            method: IntegrationMethod::ClosedForm,
            cache: Some(cache),
        }
    }

    pub fn with_method(mut self, method: IntegrationMethod) -> Self {
        self.method = method;
        self
    }

    pub fn method(&self) -> IntegrationMethod {
        self.method
    }

    pub fn cache(&self) -> Option<&PropertyCache> {
        self.cache.as_deref()
    }

    /// Cp(T) of a record; fails outside `[Tmin, Tmax]`.
    pub fn heat_capacity(&self, record: &DatabaseRecord, t: f64) -> ThermoResult<f64> {
        check_temperature(t)?;
        check_record_range(record, t)?;
        Ok(record.coefficients().cp(t))
    }

    /// H, S, G and Cp of a record at `t`.
    ///
    /// Baseline H298/S298 come from `reference` when given, else from the
    /// record. `is_elemental` forces the baseline enthalpy to zero.
    pub fn properties(
        &self,
        record: &DatabaseRecord,
        t: f64,
        reference: Option<&DatabaseRecord>,
        is_elemental: bool,
    ) -> ThermoResult<ThermodynamicProperties> {
        check_temperature(t)?;
        check_record_range(record, t)?;
        Ok(self.evaluate(record, t, reference, is_elemental))
    }

    /// Like [`properties`](Self::properties) without the range check.
    ///
    /// Used for boundary bookkeeping where a record is deliberately evaluated
    /// slightly past its own range (gaps, nearest-record transitions).
    pub(crate) fn properties_extrapolated(
        &self,
        record: &DatabaseRecord,
        t: f64,
        reference: Option<&DatabaseRecord>,
        is_elemental: bool,
    ) -> ThermoResult<ThermodynamicProperties> {
        check_temperature(t)?;
        Ok(self.evaluate(record, t, reference, is_elemental))
    }

    fn evaluate(
        &self,
        record: &DatabaseRecord,
        t: f64,
        reference: Option<&DatabaseRecord>,
        is_elemental: bool,
    ) -> ThermodynamicProperties {
        let reference = reference.unwrap_or(record);
        let key = PropertyKey::new(record, reference, is_elemental, self.method.scheme_tag(), t);

        if let Some(hit) = self.cache().and_then(|c| c.get(&key)) {
            return hit;
        }

        let h_ref_j = if is_elemental {
            0.0
        } else {
            kj_to_j(reference.h298_kj())
        };
        let s_ref = reference.s298();
        let coeffs = record.coefficients();

        let (h, s) = if t == T_REF_K {
            (h_ref_j, s_ref)
        } else {
            let (dh, ds) = self.increments(coeffs, t);
            (h_ref_j + dh, s_ref + ds)
        };
        let props = ThermodynamicProperties::new(t, coeffs.cp(t), h, s, Some(record.phase()));

        if let Some(cache) = self.cache() {
            cache.insert(key, props);
        }
        props
    }

    fn increments(&self, coeffs: &HeatCapacityCoefficients, t: f64) -> (f64, f64) {
        match self.method {
            IntegrationMethod::ClosedForm => (
                coeffs.enthalpy_increment(T_REF_K, t),
                coeffs.entropy_increment(T_REF_K, t),
            ),
            IntegrationMethod::Simpson { intervals } => (
                quadrature::enthalpy_increment(coeffs, T_REF_K, t, intervals),
                quadrature::entropy_increment(coeffs, T_REF_K, t, intervals),
            ),
        }
    }
}

fn check_temperature(t: f64) -> ThermoResult<()> {
    if !t.is_finite() || t <= 0.0 {
        return Err(ThermoError::NonPositiveTemperature { t_k: t });
    }
    Ok(())
}

fn check_record_range(record: &DatabaseRecord, t: f64) -> ThermoResult<()> {
    if record.covers(t) {
        return Ok(());
    }
    let (bound, limit_k) = if t < record.t_min() {
        (RangeBound::Lower, record.t_min())
    } else {
        (RangeBound::Upper, record.t_max())
    };
    Err(ThermoError::RecordRange {
        formula: record.formula().to_string(),
        phase: record.phase(),
        t_k: t,
        bound,
        limit_k,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::Phase;
    use tc_core::RecordId;

    fn gas_record() -> DatabaseRecord {
        // CO2-like fit
        DatabaseRecord::builder(RecordId::from_index(0), "CO2", Phase::Gas)
            .range(298.0, 1200.0)
            .reference(-393.51, 213.79)
            .coefficients([44.14, 9.04, -8.54, 0.0, 0.0, 0.0])
            .build()
            .unwrap()
    }

    #[test]
    fn heat_capacity_formula() {
        let r = gas_record();
        let model = PolynomialPropertyModel::new();
        let t = 500.0_f64;
        let expected = 44.14 + 9.04 * t / 1000.0 + (-8.54) * 1e5 / (t * t);
        let cp = model.heat_capacity(&r, t).unwrap();
        assert!((cp - expected).abs() < 1e-12);
    }

    #[test]
    fn heat_capacity_rejects_out_of_range() {
        let r = gas_record();
        let model = PolynomialPropertyModel::new();
        let err = model.heat_capacity(&r, 1500.0).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("CO2"));
        assert!(msg.contains("(g)"));
        assert!(msg.contains("Tmax"));

        let err = model.heat_capacity(&r, 200.0).unwrap_err();
        assert!(err.to_string().contains("Tmin"));
    }

    #[test]
    fn reference_point_is_exact() {
        let r = gas_record();
        let model = PolynomialPropertyModel::new();
        let p = model.properties(&r, T_REF_K, None, false).unwrap();
        assert_eq!(p.h_j_mol, -393.51 * 1000.0);
        assert_eq!(p.s_j_mol_k, 213.79);
        assert_eq!(p.g_j_mol, p.h_j_mol - T_REF_K * p.s_j_mol_k);
    }

    #[test]
    fn elemental_override_zeroes_baseline_enthalpy() {
        let r = gas_record();
        let model = PolynomialPropertyModel::new();
        let p = model.properties(&r, T_REF_K, None, true).unwrap();
        assert_eq!(p.h_j_mol, 0.0);
        assert_eq!(p.s_j_mol_k, 213.79);
    }

    #[test]
    fn reference_record_supplies_baseline() {
        let r = gas_record();
        let reference = DatabaseRecord::builder(RecordId::from_index(9), "CO2", Phase::Gas)
            .range(298.0, 600.0)
            .reference(-400.0, 200.0)
            .build()
            .unwrap();
        let model = PolynomialPropertyModel::new();
        let p = model.properties(&r, 600.0, Some(&reference), false).unwrap();
        let own = model.properties(&r, 600.0, None, false).unwrap();
        assert!((own.h_j_mol - p.h_j_mol - (-393.51 + 400.0) * 1000.0).abs() < 1e-6);
        assert!((own.s_j_mol_k - p.s_j_mol_k - 13.79).abs() < 1e-9);
    }

    #[test]
    fn constant_cp_integrates_exactly() {
        let r = DatabaseRecord::builder(RecordId::from_index(0), "H2O", Phase::Liquid)
            .range(273.15, 373.15)
            .reference(-285.83, 69.95)
            .constant_cp(75.3)
            .build()
            .unwrap();
        let model = PolynomialPropertyModel::new();
        let p = model.properties(&r, 350.0, None, false).unwrap();
        let dh = 75.3 * (350.0 - T_REF_K);
        let ds = 75.3 * (350.0_f64 / T_REF_K).ln();
        assert!((p.h_j_mol - (-285_830.0 + dh)).abs() < 1e-6);
        assert!((p.s_j_mol_k - (69.95 + ds)).abs() < 1e-9);
    }

    #[test]
    fn antiderivatives_differentiate_back_to_cp() {
        let c = HeatCapacityCoefficients::new([30.0, 12.0, -3.0, 4.0, 2.0, 1.5]);
        let t = 700.0;
        let h = 1e-3;
        let d_h = (c.enthalpy_antiderivative(t + h) - c.enthalpy_antiderivative(t - h)) / (2.0 * h);
        let d_s = (c.entropy_antiderivative(t + h) - c.entropy_antiderivative(t - h)) / (2.0 * h);
        assert!((d_h - c.cp(t)).abs() / c.cp(t) < 1e-7);
        assert!((d_s - c.cp(t) / t).abs() / (c.cp(t) / t) < 1e-6);
    }

    #[test]
    fn cached_and_uncached_are_bit_identical() {
        let r = gas_record();
        let cache = Arc::new(PropertyCache::new(16));
        let cached = PolynomialPropertyModel::with_cache(cache.clone());
        let plain = PolynomialPropertyModel::new();

        let first = cached.properties(&r, 812.5, None, false).unwrap();
        let second = cached.properties(&r, 812.5, None, false).unwrap();
        let reference = plain.properties(&r, 812.5, None, false).unwrap();

        assert_eq!(first.h_j_mol.to_bits(), reference.h_j_mol.to_bits());
        assert_eq!(second.s_j_mol_k.to_bits(), reference.s_j_mol_k.to_bits());
        assert_eq!(second.g_j_mol.to_bits(), reference.g_j_mol.to_bits());
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn extrapolation_skips_range_check_only() {
        let r = gas_record();
        let model = PolynomialPropertyModel::new();
        assert!(model.properties(&r, 1300.0, None, false).is_err());
        assert!(model.properties_extrapolated(&r, 1300.0, None, false).is_ok());
        assert!(model.properties_extrapolated(&r, 0.0, None, false).is_err());
    }
}
