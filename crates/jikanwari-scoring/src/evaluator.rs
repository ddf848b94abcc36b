//! The pure `evaluate` contract.

use jikanwari_core::{
    ConstraintConfig, DomainSnapshot, EngineError, PenaltyScore, PlacementSet, Result,
};

use crate::director::TimetableDirector;
use crate::violation::Violation;

/// Result of evaluating a placement set: which hard constraints are
/// violated and the weighted soft score.
#[derive(Clone, Debug)]
pub struct Evaluation {
    pub violations: Vec<Violation>,
    pub score: PenaltyScore,
}

impl Evaluation {
    pub fn is_feasible(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Evaluates complete or partial placement sets against a domain
/// snapshot and constraint configuration.
///
/// Construction validates both inputs, so the search (and the host's
/// manual-placement re-validation path) can assume a well-formed world
/// afterwards. Evaluation itself never fails for data it can interpret.
pub struct ConstraintEvaluator<'a> {
    domain: &'a DomainSnapshot,
    config: &'a ConstraintConfig,
}

impl<'a> ConstraintEvaluator<'a> {
    pub fn new(domain: &'a DomainSnapshot, config: &'a ConstraintConfig) -> Result<Self> {
        domain.validate()?;
        config.validate()?;
        Ok(ConstraintEvaluator { domain, config })
    }

    pub fn domain(&self) -> &'a DomainSnapshot {
        self.domain
    }

    pub fn config(&self) -> &'a ConstraintConfig {
        self.config
    }

    /// Opens an incremental director over the same domain and
    /// configuration. The solver drives one of these per restart.
    pub fn director(&self) -> TimetableDirector<'a> {
        TimetableDirector::new(self.domain, self.config)
    }

    /// Evaluates a placement set. Placements referencing blocks the
    /// snapshot does not contain are `InvalidInput`.
    pub fn evaluate(&self, placements: &PlacementSet) -> Result<Evaluation> {
        let mut director = self.director();
        for placement in placements.iter() {
            let block = self.domain.block(placement.occurrence.block).ok_or_else(|| {
                EngineError::InvalidInput(format!(
                    "placement references unknown {}",
                    placement.occurrence.block
                ))
            })?;
            director.place(block, placement);
        }
        let violations = director.scan_violations();
        let score = PenaltyScore::of(-(violations.len() as i64), director.score().soft());
        Ok(Evaluation { violations, score })
    }
}
