//! Async entry point
//!
//! The pipeline is CPU-bound, so `solve` runs it on tokio's blocking pool
//! and the calling task only awaits the join handle. Cancellation is
//! honoured up to the moment the solve starts; a running solve always
//! completes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::debug;

use crate::error::{BEMError, BEMResult};
use crate::model::{BemProblem, BoundaryElementSolver};
use crate::results::{BemAnalysis, SolverStatistics};

/// Shared flag a caller sets to abandon a pending solve
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Cloneable handle serialising solves on one `BoundaryElementSolver`
#[derive(Clone)]
pub struct AsyncBoundaryElementSolver {
    inner: Arc<Mutex<BoundaryElementSolver>>,
}

impl AsyncBoundaryElementSolver {
    pub fn new(solver: BoundaryElementSolver) -> Self {
        Self { inner: Arc::new(Mutex::new(solver)) }
    }

    pub async fn solve(&self, problem: BemProblem, cancel: Option<CancellationFlag>) -> BEMResult<Arc<BemAnalysis>> {
        if cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
            return Err(BEMError::Cancelled);
        }

        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut solver = inner
                .lock()
                .map_err(|_| BEMError::AnalysisFailed("solver lock poisoned".to_string()))?;
            // The flag may have been set while waiting for the lock
            if cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
                debug!("solve cancelled before start");
                return Err(BEMError::Cancelled);
            }
            solver.solve(&problem)
        })
        .await
        .map_err(|e| BEMError::AnalysisFailed(format!("solver task failed: {}", e)))?
    }

    /// Statistics of the most recent solve
    pub fn last_statistics(&self) -> BEMResult<SolverStatistics> {
        let solver = self
            .inner
            .lock()
            .map_err(|_| BEMError::AnalysisFailed("solver lock poisoned".to_string()))?;
        Ok(solver.last_statistics().clone())
    }

    pub fn clear_caches(&self) -> BEMResult<()> {
        let mut solver = self
            .inner
            .lock()
            .map_err(|_| BEMError::AnalysisFailed("solver lock poisoned".to_string()))?;
        solver.clear_caches();
        Ok(())
    }
}
