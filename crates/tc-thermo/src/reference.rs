//! Choice of the H298/S298 baseline for a record.
//!
//! Sources store authoritative reference values only on the first record of a
//! phase; later records of the same phase, and sometimes the first record of a
//! new phase, carry zero placeholders. The selector walks back to the record
//! whose values should anchor the integration.

use tc_core::is_negligible;
use tracing::debug;

use crate::record::DatabaseRecord;

/// Values at or below this magnitude count as "not stored".
pub const DEFAULT_REFERENCE_EPSILON: f64 = 1e-6;

/// Picks the reference record for a position in a Tmin-sorted record list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceValueSelector {
    epsilon: f64,
}

impl Default for ReferenceValueSelector {
    fn default() -> Self {
        Self::new(DEFAULT_REFERENCE_EPSILON)
    }
}

impl ReferenceValueSelector {
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon: epsilon.abs(),
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Both H298 and S298 are (near) zero.
    pub fn is_placeholder(&self, record: &DatabaseRecord) -> bool {
        is_negligible(record.h298_kj(), self.epsilon) && is_negligible(record.s298(), self.epsilon)
    }

    /// Index of the record supplying the baseline for `records[index]`.
    ///
    /// `records` must be sorted by Tmin. `None` only when `index` is out of
    /// bounds.
    pub fn select(&self, records: &[DatabaseRecord], index: usize) -> Option<usize> {
        if index >= records.len() {
            return None;
        }
        let mut i = index;
        while i > 0 {
            if records[i - 1].phase() == records[i].phase() {
                i = run_start(records, i);
            } else if self.is_placeholder(&records[i]) {
                // placeholder at a phase start: fall back to the previous run
                i = run_start(records, i - 1);
            } else {
                break;
            }
        }
        debug!(
            formula = %records[index].formula(),
            record = %records[index].id(),
            reference = %records[i].id(),
            "reference record selected"
        );
        Some(i)
    }

    /// The baseline for `records[index]` comes from a different phase.
    pub fn is_inherited(&self, records: &[DatabaseRecord], index: usize) -> bool {
        self.select(records, index)
            .is_some_and(|r| records[r].phase() != records[index].phase())
    }
}

/// First index of the same-phase run containing `i`.
fn run_start(records: &[DatabaseRecord], i: usize) -> usize {
    let phase = records[i].phase();
    let mut start = i;
    while start > 0 && records[start - 1].phase() == phase {
        start -= 1;
    }
    start
}
