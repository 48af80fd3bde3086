//! Fixed-grid composite Simpson integration of the heat-capacity law.
//!
//! Not used on the default path; the closed form in `polynomial` is exact.
//! Selecting `IntegrationMethod::Simpson` routes evaluations here so the two
//! can be cross-checked.

use crate::record::HeatCapacityCoefficients;

/// Interval count giving < 1e-6 relative error on typical database fits.
pub const DEFAULT_SIMPSON_INTERVALS: u32 = 1000;
/// Upper bound on the interval count; larger requests are clamped.
pub const MAX_SIMPSON_INTERVALS: u32 = 1_000_000;

/// Composite Simpson rule over `[a, b]` with `intervals` (clamped to
/// `2..=MAX_SIMPSON_INTERVALS`, rounded up to even).
pub fn simpson(f: impl Fn(f64) -> f64, a: f64, b: f64, intervals: u32) -> f64 {
    if a == b {
        return 0.0;
    }
    let n = intervals.clamp(2, MAX_SIMPSON_INTERVALS).next_multiple_of(2);
    let h = (b - a) / f64::from(n);
    let mut sum = f(a) + f(b);
    for i in 1..n {
        let x = a + f64::from(i) * h;
        sum += if i % 2 == 1 { 4.0 * f(x) } else { 2.0 * f(x) };
    }
    sum * h / 3.0
}

/// ∫ Cp dT from `t0` to `t1`.
pub fn enthalpy_increment(c: &HeatCapacityCoefficients, t0: f64, t1: f64, intervals: u32) -> f64 {
    simpson(|t| c.cp(t), t0, t1, intervals)
}

/// ∫ Cp/T dT from `t0` to `t1`.
pub fn entropy_increment(c: &HeatCapacityCoefficients, t0: f64, t1: f64, intervals: u32) -> f64 {
    simpson(|t| c.cp(t) / t, t0, t1, intervals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_core::constants::T_REF_K;
    use tc_core::relative_difference;

    #[test]
    fn simpson_is_exact_for_cubics() {
        let v = simpson(|x| x * x * x + 2.0 * x, 0.0, 2.0, 2);
        assert!((v - 8.0).abs() < 1e-12);
    }

    #[test]
    fn odd_interval_count_is_rounded_up() {
        let v = simpson(|x| x, 0.0, 1.0, 3);
        assert!((v - 0.5).abs() < 1e-14);
    }

    #[test]
    fn matches_closed_form_within_tolerance() {
        let c = HeatCapacityCoefficients::new([29.1, 8.2, -2.1, 1.3, 0.4, 0.2]);
        for t in [350.0, 600.0, 1200.0, 2500.0] {
            let dh = enthalpy_increment(&c, T_REF_K, t, DEFAULT_SIMPSON_INTERVALS);
            let ds = entropy_increment(&c, T_REF_K, t, DEFAULT_SIMPSON_INTERVALS);
            assert!(relative_difference(dh, c.enthalpy_increment(T_REF_K, t)) < 1e-6);
            assert!(relative_difference(ds, c.entropy_increment(T_REF_K, t)) < 1e-6);
        }
    }

    #[test]
    fn reversed_bounds_change_sign() {
        let c = HeatCapacityCoefficients::constant(30.0);
        let down = enthalpy_increment(&c, T_REF_K, 250.0, 100);
        assert!((down - 30.0 * (250.0 - T_REF_K)).abs() < 1e-9);
    }

    #[test]
    fn oversized_interval_count_is_clamped() {
        let exact = simpson(|x| x * x, 0.0, 3.0, MAX_SIMPSON_INTERVALS);
        let clamped = simpson(|x| x * x, 0.0, 3.0, u32::MAX);
        assert_eq!(exact.to_bits(), clamped.to_bits());
        assert!((clamped - 9.0).abs() < 1e-9);
    }
}
