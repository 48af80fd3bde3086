//! Orchestration of the property engine.
//!
//! [`ThermoEngine`] owns the one property model (and with it the cache) that
//! every collaborator borrows: the continuity corrector, the transition
//! extractor and the table/batch helpers all evaluate through it.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::cache::{CacheStats, PropertyCache};
use crate::config::EngineConfig;
use crate::continuity::RecordContinuityCorrector;
use crate::error::{ConsistencyWarning, ThermoResult};
use crate::polynomial::PolynomialPropertyModel;
use crate::properties::ThermodynamicProperties;
use crate::record::DatabaseRecord;
use crate::record_set::CompoundRecordSet;
use crate::reference::ReferenceValueSelector;
use crate::table::{PropertyTable, TableSource, TemperatureGrid};
use crate::transitions::{
    PhaseTransition, Side, TransitionAnalysis, TransitionExtractor, detect_at, side_record,
};
use crate::validation::TransitionValidator;

/// Entry point for property evaluation over records and record sets.
#[derive(Debug, Clone)]
pub struct ThermoEngine {
    model: PolynomialPropertyModel,
    config: EngineConfig,
}

impl Default for ThermoEngine {
    fn default() -> Self {
        let config = EngineConfig::default();
        let cache = Arc::new(PropertyCache::new(config.cache_capacity));
        Self {
            model: PolynomialPropertyModel::with_cache(cache).with_method(config.integration),
            config,
        }
    }
}

impl ThermoEngine {
    /// Engine with its own cache sized from `config`.
    pub fn new(config: EngineConfig) -> ThermoResult<Self> {
        config.validate()?;
        let cache = Arc::new(PropertyCache::new(config.cache_capacity));
        let model = PolynomialPropertyModel::with_cache(cache).with_method(config.integration);
        Ok(Self { model, config })
    }

    /// Engine over a caller-built model (e.g. one sharing a cache).
    ///
    /// The model's integration method wins over `config.integration`.
    pub fn with_model(model: PolynomialPropertyModel, config: EngineConfig) -> ThermoResult<Self> {
        config.validate()?;
        Ok(Self { model, config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn model(&self) -> &PolynomialPropertyModel {
        &self.model
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.model.cache().map(PropertyCache::stats)
    }

    pub fn corrector(&self) -> RecordContinuityCorrector<'_> {
        RecordContinuityCorrector::new(&self.model)
            .with_selector(ReferenceValueSelector::new(self.config.reference_epsilon))
            .with_thresholds(self.config.continuity)
    }

    pub fn extractor(&self) -> TransitionExtractor<'_> {
        TransitionExtractor::from_corrector(self.corrector())
    }

    pub fn validator(&self) -> TransitionValidator {
        TransitionValidator::new(self.config.windows)
    }

    /// Record set using the configured adjacency tolerance.
    pub fn build_record_set(&self, records: Vec<DatabaseRecord>) -> ThermoResult<CompoundRecordSet> {
        CompoundRecordSet::with_tolerance(records, self.config.adjacency_tolerance_k)
    }

    /// Single-record evaluation on the record's own baseline.
    pub fn properties(
        &self,
        record: &DatabaseRecord,
        t: f64,
    ) -> ThermoResult<ThermodynamicProperties> {
        self.model.properties(record, t, None, false)
    }

    /// Smooth value from the active record, continuity offsets included.
    pub fn properties_multi_record(
        &self,
        set: &CompoundRecordSet,
        t: f64,
    ) -> ThermoResult<ThermodynamicProperties> {
        let index = set.index_at(t)?;
        let phase = set.records()[index].phase();
        let props = self.corrector().anchored_properties(set, index, t, false)?;
        Ok(props.with_phase(phase))
    }

    /// Multi-record value with phase-transition jumps applied.
    pub fn properties_with_transitions(
        &self,
        set: &CompoundRecordSet,
        t: f64,
    ) -> ThermoResult<ThermodynamicProperties> {
        let analysis = self.analyze_transitions(set);
        self.properties_with_analysis(set, t, &analysis)
    }

    fn properties_with_analysis(
        &self,
        set: &CompoundRecordSet,
        t: f64,
        analysis: &TransitionAnalysis,
    ) -> ThermoResult<ThermodynamicProperties> {
        let index = set.index_at(t)?;
        let corrector = self.corrector();

        if let Some(tr) = detect_at(&analysis.transitions, t, self.config.transition_tolerance_k) {
            let from = tr.from_phase();
            if let Some((bi, _)) = side_record(set, from, t, Side::Before) {
                let (dh, ds) = analysis.offset(from);
                let before = corrector
                    .anchored_properties(set, bi, t, true)?
                    .with_offsets(dh, ds)
                    .with_phase(from);
                debug!(
                    formula = %set.formula(),
                    t_k = t,
                    kind = %tr.kind(),
                    "query at phase transition"
                );
                return Ok(if t < tr.temperature_k() {
                    before
                } else {
                    tr.apply(&before)
                });
            }
        }

        let record = &set.records()[index];
        let (dh, ds) = analysis.offset(record.phase());
        let props = corrector.anchored_properties(set, index, t, false)?;
        Ok(props.with_offsets(dh, ds).with_phase(record.phase()))
    }

    /// Transitions and per-phase entry offsets.
    pub fn analyze_transitions(&self, set: &CompoundRecordSet) -> TransitionAnalysis {
        self.extractor().analyze(set)
    }

    /// Transitions in temperature order.
    pub fn extract_transitions(&self, set: &CompoundRecordSet) -> Vec<PhaseTransition> {
        self.extractor().extract(set)
    }

    /// Build a set from raw records and extract its transitions.
    pub fn extract_transitions_from_records(
        &self,
        records: Vec<DatabaseRecord>,
    ) -> ThermoResult<Vec<PhaseTransition>> {
        let set = self.build_record_set(records)?;
        Ok(self.extract_transitions(&set))
    }

    pub fn validate_consistency(&self, transitions: &[PhaseTransition]) -> Vec<ConsistencyWarning> {
        self.validator().validate(transitions)
    }

    /// Rows over `grid`. Compound tables include transition jumps.
    pub fn table<'a>(
        &self,
        source: impl Into<TableSource<'a>>,
        grid: &TemperatureGrid,
    ) -> ThermoResult<PropertyTable> {
        let source = source.into();
        let rows = match source {
            TableSource::Record(record) => grid
                .points()
                .map(|t| self.properties(record, t))
                .collect::<ThermoResult<Vec<_>>>()?,
            TableSource::Compound(set) => {
                let analysis = self.analyze_transitions(set);
                grid.points()
                    .map(|t| self.properties_with_analysis(set, t, &analysis))
                    .collect::<ThermoResult<Vec<_>>>()?
            }
        };
        Ok(PropertyTable::new(source.formula(), *grid, rows))
    }

    /// Parallel evaluation; results follow the order of `temperatures`.
    pub fn evaluate_batch(
        &self,
        set: &CompoundRecordSet,
        temperatures: &[f64],
    ) -> Vec<ThermoResult<ThermodynamicProperties>> {
        let analysis = self.analyze_transitions(set);
        temperatures
            .par_iter()
            .map(|&t| self.properties_with_analysis(set, t, &analysis))
            .collect()
    }
}
