//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::continuity::ContinuityThresholds;
use crate::error::{ThermoError, ThermoResult};
use crate::polynomial::IntegrationMethod;
use crate::quadrature::MAX_SIMPSON_INTERVALS;
use crate::record_set::DEFAULT_ADJACENCY_TOLERANCE_K;
use crate::reference::DEFAULT_REFERENCE_EPSILON;
use crate::transitions::DEFAULT_TRANSITION_TOLERANCE_K;
use crate::validation::ValidationWindows;

/// Tunables for [`ThermoEngine`](crate::ThermoEngine). Every field defaults.
///
/// ```yaml
/// cache_capacity: 5000
/// integration:
///   method: simpson
///   intervals: 2000
/// windows:
///   boiling_entropy: [70.0, 100.0]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Property cache entries; 0 disables memoization.
    pub cache_capacity: usize,
    pub integration: IntegrationMethod,
    /// Magnitude under which H298/S298 count as placeholders.
    pub reference_epsilon: f64,
    /// Tmax/Tmin mismatch tolerated between neighbouring records [K].
    pub adjacency_tolerance_k: f64,
    /// Distance at which a query snaps to a transition [K].
    pub transition_tolerance_k: f64,
    pub continuity: ContinuityThresholds,
    pub windows: ValidationWindows,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            integration: IntegrationMethod::default(),
            reference_epsilon: DEFAULT_REFERENCE_EPSILON,
            adjacency_tolerance_k: DEFAULT_ADJACENCY_TOLERANCE_K,
            transition_tolerance_k: DEFAULT_TRANSITION_TOLERANCE_K,
            continuity: ContinuityThresholds::default(),
            windows: ValidationWindows::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> ThermoResult<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ThermoError::InvalidParameter {
            what: format!("engine config: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ThermoResult<()> {
        let positive = |v: f64, what: &str| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ThermoError::InvalidParameter {
                    what: format!("{what} must be positive, got {v}"),
                })
            }
        };
        positive(self.reference_epsilon, "reference_epsilon")?;
        positive(self.adjacency_tolerance_k, "adjacency_tolerance_k")?;
        positive(self.transition_tolerance_k, "transition_tolerance_k")?;

        let c = &self.continuity;
        positive(c.natural_h_j_mol, "continuity.natural_h_j_mol")?;
        positive(c.natural_s_j_mol_k, "continuity.natural_s_j_mol_k")?;
        if c.significant_h_j_mol < c.natural_h_j_mol || c.significant_s_j_mol_k < c.natural_s_j_mol_k {
            return Err(ThermoError::InvalidParameter {
                what: "continuity significance thresholds must not be below the natural ones"
                    .to_string(),
            });
        }

        if !self.windows.is_valid() {
            return Err(ThermoError::InvalidParameter {
                what: format!("validation windows must be ascending: {:?}", self.windows),
            });
        }
        if let IntegrationMethod::Simpson { intervals } = self.integration {
            if !(2..=MAX_SIMPSON_INTERVALS).contains(&intervals) {
                return Err(ThermoError::InvalidParameter {
                    what: format!(
                        "simpson intervals must lie in 2..={MAX_SIMPSON_INTERVALS}, got {intervals}"
                    ),
                });
            }
        }
        Ok(())
    }
}
