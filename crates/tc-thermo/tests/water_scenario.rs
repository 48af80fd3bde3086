//! End-to-end: water from ice to steam.

use tc_core::RecordId;
use tc_thermo::{
    CalculationMethod, CompoundRecordSet, ConsistencyWarning, DatabaseRecord, Phase,
    TemperatureGrid, ThermoEngine, ThermoError, TransitionKind,
};

fn water_records() -> Vec<DatabaseRecord> {
    let rec = |i: u32, phase: Phase, t: (f64, f64), h: f64, s: f64, cp: f64| {
        DatabaseRecord::builder(RecordId::from_index(i), "H2O", phase)
            .range(t.0, t.1)
            .reference(h, s)
            .constant_cp(cp)
            .melting_point(273.15)
            .boiling_point(373.15)
            .build()
            .unwrap()
    };
    vec![
        rec(2, Phase::Gas, (373.15, 2000.0), -241.83, 188.84, 33.6),
        rec(0, Phase::Solid, (0.0, 273.15), -292.8, 44.6, 37.0),
        rec(1, Phase::Liquid, (273.15, 373.15), -285.83, 69.95, 75.3),
    ]
}

fn water_set(engine: &ThermoEngine) -> CompoundRecordSet {
    engine.build_record_set(water_records()).unwrap()
}

#[test]
fn phase_follows_temperature() {
    let engine = ThermoEngine::default();
    let set = water_set(&engine);
    let ice = engine.properties_with_transitions(&set, 250.0).unwrap();
    let liquid = engine.properties_with_transitions(&set, 300.0).unwrap();
    let steam = engine.properties_with_transitions(&set, 500.0).unwrap();
    assert_eq!(ice.phase, Some(Phase::Solid));
    assert_eq!(liquid.phase, Some(Phase::Liquid));
    assert_eq!(steam.phase, Some(Phase::Gas));

    let expected = -241_830.0 + 33.6 * (500.0 - 298.15);
    assert!((steam.h_j_mol - expected).abs() < 1e-6);
}

#[test]
fn melting_and_boiling_are_derived() {
    let engine = ThermoEngine::default();
    let set = water_set(&engine);
    let transitions = engine.extract_transitions(&set);
    assert_eq!(transitions.len(), 2);

    let melt = &transitions[0];
    assert_eq!(melt.kind(), TransitionKind::Melting);
    assert_eq!(melt.method(), CalculationMethod::Calculated);
    assert_eq!(melt.temperature_k(), 273.15);
    assert!((melt.delta_h_kj_mol() - 6.0125).abs() < 1e-6);
    assert_eq!(melt.reliability(), 0.8);

    let boil = &transitions[1];
    assert_eq!(boil.kind(), TransitionKind::Boiling);
    assert_eq!(boil.temperature_k(), 373.15);
    assert!((boil.delta_h_kj_mol() - 40.8725).abs() < 1e-6);
    assert!((boil.delta_s_j_mol_k() - 40_872.5 / 373.15).abs() < 1e-6);

    for tr in &transitions {
        assert!(tr.delta_h_kj_mol() > 0.0);
        assert!(tr.delta_s_j_mol_k() > 0.0);
    }
}

#[test]
fn water_boiling_entropy_trips_trouton_window() {
    let engine = ThermoEngine::default();
    let set = water_set(&engine);
    let warnings = engine.validate_consistency(&engine.extract_transitions(&set));
    assert_eq!(warnings.len(), 1);
    assert!(matches!(
        warnings[0],
        ConsistencyWarning::TroutonDeviation { .. }
    ));
}

#[test]
fn enthalpy_jumps_across_boiling_point() {
    let engine = ThermoEngine::default();
    let set = water_set(&engine);
    let below = engine.properties_with_transitions(&set, 373.1499).unwrap();
    let above = engine.properties_with_transitions(&set, 373.1501).unwrap();
    assert_eq!(below.phase, Some(Phase::Liquid));
    assert_eq!(above.phase, Some(Phase::Gas));
    let jump = above.h_j_mol - below.h_j_mol;
    assert!((jump - 40_872.5).abs() < 1.0, "jump = {jump}");
}

#[test]
fn value_at_transition_includes_the_jump() {
    let engine = ThermoEngine::default();
    let set = water_set(&engine);
    let at = engine.properties_with_transitions(&set, 373.15).unwrap();
    let gas = engine.properties_multi_record(&set, 373.15).unwrap();
    assert_eq!(at.phase, Some(Phase::Gas));
    assert!((at.h_j_mol - gas.h_j_mol).abs() < 1e-6);
    // ΔS is taken as ΔH/T, so entropy only agrees to the data's own consistency
    assert!((at.s_j_mol_k - gas.s_j_mol_k).abs() < 0.01);
}

#[test]
fn table_spans_all_phases() {
    let engine = ThermoEngine::default();
    let set = water_set(&engine);
    let grid = TemperatureGrid::new(200.0, 600.0, 50.0).unwrap();
    let table = engine.table(&set, &grid).unwrap();
    assert_eq!(table.len(), 9);
    let phases: Vec<_> = table.iter().map(|r| r.phase).collect();
    assert_eq!(phases[0], Some(Phase::Solid));
    assert_eq!(phases[2], Some(Phase::Liquid));
    assert_eq!(phases[8], Some(Phase::Gas));
    assert!(table.enthalpies().windows(2).all(|w| w[1] > w[0]));
}

#[test]
fn out_of_range_queries_fail() {
    let engine = ThermoEngine::default();
    let set = water_set(&engine);
    assert!(matches!(
        engine.properties_with_transitions(&set, 2500.0),
        Err(ThermoError::CompoundRange { .. })
    ));
    assert!(matches!(
        engine.properties_with_transitions(&set, -5.0),
        Err(ThermoError::NonPositiveTemperature { .. })
    ));
    let liquid = &set.records()[1];
    let err = engine.properties(liquid, 400.0).unwrap_err();
    assert!(err.to_string().contains("Tmax"));
}
