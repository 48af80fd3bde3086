//! Engine errors and non-fatal consistency warnings.

use std::fmt;

use tc_core::{RecordId, TcError};
use thiserror::Error;

use crate::phase::Phase;
use crate::transitions::TransitionKind;

/// Result type for engine operations.
pub type ThermoResult<T> = Result<T, ThermoError>;

/// Which side of a temperature range was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    Lower,
    Upper,
}

impl fmt::Display for RangeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lower => f.write_str("below the lower bound Tmin"),
            Self::Upper => f.write_str("above the upper bound Tmax"),
        }
    }
}

/// Errors that can occur during property calculations.
///
/// Range errors signal caller misuse and are never retried: every computation
/// is deterministic, so repeating the call fails identically.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ThermoError {
    /// Temperature outside a single record's validity range.
    #[error("T = {t_k} K is {bound} = {limit_k} K of record {formula} ({phase})")]
    RecordRange {
        formula: String,
        phase: Phase,
        t_k: f64,
        bound: RangeBound,
        limit_k: f64,
    },

    /// Temperature outside the span covered by all records of a compound.
    #[error("T = {t_k} K is outside the available range [{t_min_k}, {t_max_k}] K of {formula}")]
    CompoundRange {
        formula: String,
        t_k: f64,
        t_min_k: f64,
        t_max_k: f64,
    },

    /// Temperature inside the compound span but in a hole between records.
    #[error("No record of {formula} covers T = {t_k} K (gap in source data)")]
    NoCoveringRecord { formula: String, t_k: f64 },

    #[error("Temperature must be positive and finite, got {t_k} K")]
    NonPositiveTemperature { t_k: f64 },

    #[error("Invalid parameter: {what}")]
    InvalidParameter { what: String },

    #[error("Invalid record {id}: {what}")]
    InvalidRecord { id: RecordId, what: String },

    /// A phase transition must absorb heat: ΔH > 0 and ΔS > 0.
    #[error("Invalid {kind} transition {from} -> {to} at {t_k} K: {what}")]
    InvalidTransition {
        kind: TransitionKind,
        from: Phase,
        to: Phase,
        t_k: f64,
        what: String,
    },
}

impl ThermoError {
    /// True for the range family (record, compound, gap, non-positive T).
    pub fn is_range_error(&self) -> bool {
        matches!(
            self,
            Self::RecordRange { .. }
                | Self::CompoundRange { .. }
                | Self::NoCoveringRecord { .. }
                | Self::NonPositiveTemperature { .. }
        )
    }
}

impl From<ThermoError> for TcError {
    fn from(err: ThermoError) -> Self {
        if err.is_range_error() {
            return TcError::OutOfRange {
                what: err.to_string(),
            };
        }
        match err {
            ThermoError::InvalidTransition { .. } => TcError::Invariant {
                what: err.to_string(),
            },
            other => TcError::InvalidArg {
                what: other.to_string(),
            },
        }
    }
}

/// Severity of a gap between two adjacent same-phase records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapSeverity {
    Minor,
    SignificantEnthalpy,
    SignificantEntropy,
}

impl fmt::Display for GapSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minor => f.write_str("minor gap"),
            Self::SignificantEnthalpy => f.write_str("significant enthalpy gap"),
            Self::SignificantEntropy => f.write_str("significant entropy gap"),
        }
    }
}

/// Data-quality issue attached to a result instead of being thrown.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsistencyWarning {
    /// `Tmax` of one record is below `Tmin` of the next.
    AdjacencyGap {
        formula: String,
        before: RecordId,
        after: RecordId,
        t_max_k: f64,
        next_t_min_k: f64,
    },
    /// `Tmax` of one record is above `Tmin` of the next.
    AdjacencyOverlap {
        formula: String,
        before: RecordId,
        after: RecordId,
        t_max_k: f64,
        next_t_min_k: f64,
    },
    /// Switching between two same-phase records needed a correction.
    ContinuityGap {
        formula: String,
        before: RecordId,
        after: RecordId,
        t_k: f64,
        severity: GapSeverity,
        delta_h_j_mol: f64,
        delta_s_j_mol_k: f64,
    },
    /// An empirical estimate replaced the derived transition values.
    HeuristicTransition {
        formula: String,
        kind: TransitionKind,
        t_k: f64,
        reason: String,
    },
    /// Boiling entropy outside the Trouton window.
    TroutonDeviation {
        formula: String,
        t_k: f64,
        delta_s_j_mol_k: f64,
        window: (f64, f64),
    },
    /// Melting entropy outside the usual window.
    MeltingEntropyDeviation {
        formula: String,
        t_k: f64,
        delta_s_j_mol_k: f64,
        window: (f64, f64),
    },
    /// Melting point above boiling point.
    TransitionOrder {
        formula: String,
        melting_k: f64,
        boiling_k: f64,
    },
}

impl fmt::Display for ConsistencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdjacencyGap {
                formula,
                before,
                after,
                t_max_k,
                next_t_min_k,
            } => write!(
                f,
                "{formula}: data gap between record {before} (Tmax = {t_max_k} K) and record {after} (Tmin = {next_t_min_k} K)"
            ),
            Self::AdjacencyOverlap {
                formula,
                before,
                after,
                t_max_k,
                next_t_min_k,
            } => write!(
                f,
                "{formula}: record {before} (Tmax = {t_max_k} K) overlaps record {after} (Tmin = {next_t_min_k} K)"
            ),
            Self::ContinuityGap {
                formula,
                before,
                after,
                t_k,
                severity,
                delta_h_j_mol,
                delta_s_j_mol_k,
            } => write!(
                f,
                "{formula}: {severity} between records {before} and {after} at {t_k} K (ΔH = {:.3} kJ/mol, ΔS = {:.3} J/(mol·K))",
                delta_h_j_mol / 1000.0,
                delta_s_j_mol_k
            ),
            Self::HeuristicTransition {
                formula,
                kind,
                t_k,
                reason,
            } => write!(
                f,
                "{formula}: {kind} at {t_k} K uses an empirical estimate ({reason})"
            ),
            Self::TroutonDeviation {
                formula,
                t_k,
                delta_s_j_mol_k,
                window,
            } => write!(
                f,
                "{formula}: boiling entropy {delta_s_j_mol_k:.2} J/(mol·K) at {t_k} K is outside Trouton's range [{}, {}]",
                window.0, window.1
            ),
            Self::MeltingEntropyDeviation {
                formula,
                t_k,
                delta_s_j_mol_k,
                window,
            } => write!(
                f,
                "{formula}: melting entropy {delta_s_j_mol_k:.2} J/(mol·K) at {t_k} K is outside the typical range [{}, {}]",
                window.0, window.1
            ),
            Self::TransitionOrder {
                formula,
                melting_k,
                boiling_k,
            } => write!(
                f,
                "{formula}: melting point {melting_k} K lies above boiling point {boiling_k} K"
            ),
        }
    }
}
