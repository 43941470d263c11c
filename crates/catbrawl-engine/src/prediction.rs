//! Exactly-once prediction transitions.
//!
//! An event opens a prediction when it starts, locks it once, and ends it once
//! (resolved or canceled). [`PredictionDriver`] is the state machine that
//! guarantees this: a second lock or a second end is refused with a
//! [`PredictionError`] instead of reaching the broadcast API again.

use serde::{Deserialize, Serialize};

use crate::services::PredictionUpdate;

/// Repeated or out-of-order prediction transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredictionError {
    /// `lock` was already called.
    #[error("prediction is already locked")]
    AlreadyLocked,
    /// The prediction was already resolved or canceled.
    #[error("prediction has already ended")]
    AlreadyEnded,
}

/// Where the prediction of one event stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredictionPhase {
    /// Accepting predictions.
    Open,
    /// Locked, waiting for the outcome.
    Locked,
    /// Resolved or canceled.
    Ended,
}

/// Per-event prediction state machine.
#[derive(Debug, Clone)]
pub struct PredictionDriver {
    phase: PredictionPhase,
}

impl Default for PredictionDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictionDriver {
    /// A freshly opened prediction.
    pub fn new() -> Self {
        Self {
            phase: PredictionPhase::Open,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> PredictionPhase {
        self.phase
    }

    /// Stop accepting predictions.
    pub fn lock(&mut self) -> Result<PredictionUpdate, PredictionError> {
        match self.phase {
            PredictionPhase::Open => {
                self.phase = PredictionPhase::Locked;
                Ok(PredictionUpdate::Locked)
            }
            PredictionPhase::Locked => Err(PredictionError::AlreadyLocked),
            PredictionPhase::Ended => Err(PredictionError::AlreadyEnded),
        }
    }

    /// Pay out to `winner`.
    pub fn resolve(
        &mut self,
        winner: &str,
        reason: &str,
    ) -> Result<PredictionUpdate, PredictionError> {
        self.end()?;
        Ok(PredictionUpdate::Resolved {
            winner: winner.to_owned(),
            reason: reason.to_owned(),
        })
    }

    /// Refund everyone.
    pub fn cancel(&mut self, reason: &str) -> Result<PredictionUpdate, PredictionError> {
        self.end()?;
        Ok(PredictionUpdate::Canceled {
            reason: reason.to_owned(),
        })
    }

    fn end(&mut self) -> Result<(), PredictionError> {
        if self.phase == PredictionPhase::Ended {
            return Err(PredictionError::AlreadyEnded);
        }
        self.phase = PredictionPhase::Ended;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_then_resolve() {
        let mut p = PredictionDriver::new();
        assert_eq!(p.lock(), Ok(PredictionUpdate::Locked));
        assert_eq!(p.lock(), Err(PredictionError::AlreadyLocked));
        assert!(matches!(p.resolve("tom", ""), Ok(PredictionUpdate::Resolved { .. })));
        assert_eq!(p.phase(), PredictionPhase::Ended);
    }

    #[test]
    fn end_happens_once() {
        let mut p = PredictionDriver::new();
        p.cancel("draw").unwrap();
        assert_eq!(p.cancel("draw"), Err(PredictionError::AlreadyEnded));
        assert_eq!(p.resolve("tom", ""), Err(PredictionError::AlreadyEnded));
        assert_eq!(p.lock(), Err(PredictionError::AlreadyEnded));
    }

    #[test]
    fn ending_without_lock_is_allowed() {
        let mut p = PredictionDriver::new();
        assert!(p.resolve("zombies", "").is_ok());
    }
}
