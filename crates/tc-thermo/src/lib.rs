//! tc-thermo: multi-phase thermodynamic property engine.
//!
//! Turns already-retrieved source-database records into Cp, H, S and G as
//! functions of temperature:
//! - `polynomial`: six-coefficient Cp law with exact integrals
//! - `reference`: which record supplies the H298/S298 baseline
//! - `record_set`: records of one compound, sorted and segmented by phase
//! - `continuity`: offsets joining adjacent same-phase records
//! - `transitions` / `validation`: derived melting, boiling and sublimation
//! - `engine`: the orchestrator tying them together
//!
//! The engine does not fetch data or render output.

pub mod cache;
pub mod config;
pub mod continuity;
pub mod engine;
pub mod error;
pub mod formula;
pub mod heuristics;
pub mod phase;
pub mod polynomial;
pub mod properties;
pub mod quadrature;
pub mod record;
pub mod record_set;
pub mod reference;
pub mod table;
pub mod transitions;
pub mod validation;

pub use cache::{CacheStats, DEFAULT_CACHE_CAPACITY, PropertyCache};
pub use config::EngineConfig;
pub use continuity::{
    ContinuityThresholds, CorrectionQuality, RecordContinuityCorrector, RecordTransitionCorrection,
};
pub use engine::ThermoEngine;
pub use error::{ConsistencyWarning, GapSeverity, RangeBound, ThermoError, ThermoResult};
pub use formula::CompoundClass;
pub use phase::Phase;
pub use polynomial::{IntegrationMethod, PolynomialPropertyModel};
pub use properties::ThermodynamicProperties;
pub use record::{DatabaseRecord, HeatCapacityCoefficients, RecordBuilder};
pub use record_set::{CompoundRecordSet, PhaseSegment};
pub use reference::ReferenceValueSelector;
pub use table::{PropertyTable, TableSource, TemperatureGrid};
pub use transitions::{
    CalculationMethod, PhaseTransition, TransitionAnalysis, TransitionExtractor, TransitionKind,
    detect_at,
};
pub use validation::{TransitionValidator, ValidationWindows, validate_consistency};
