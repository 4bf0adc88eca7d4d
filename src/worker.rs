//! Background backtest worker.
//!
//! The worker owns its bar snapshot, so the caller's data can keep changing
//! while a run is in flight. The result comes back over an `mpsc` channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use crate::domain::backtest::{BacktestConfig, run_backtest_cancellable};
use crate::domain::bar::EnrichedBar;
use crate::domain::error::SigtraderError;
use crate::domain::metrics::BacktestReport;
use crate::domain::policy::ScoringPolicy;

pub type BacktestOutcome = Result<BacktestReport, SigtraderError>;

pub struct BacktestHandle {
    rx: Receiver<BacktestOutcome>,
    cancel: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl BacktestHandle {
    /// Ask the run to stop; it notices before its next bar.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Non-blocking poll. `None` while the run is still going.
    pub fn try_result(&mut self) -> Option<BacktestOutcome> {
        match self.rx.try_recv() {
            Ok(outcome) => {
                self.join();
                Some(outcome)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(worker_gone())),
        }
    }

    /// Block until the run finishes.
    pub fn wait(mut self) -> BacktestOutcome {
        let outcome = self.rx.recv().unwrap_or_else(|_| Err(worker_gone()));
        self.join();
        outcome
    }

    fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("backtest worker panicked");
            }
        }
    }
}

/// A dropped handle abandons the run; the worker stops before its next bar.
impl Drop for BacktestHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn worker_gone() -> SigtraderError {
    SigtraderError::Io(std::io::Error::other(
        "backtest worker exited without a result",
    ))
}

/// Run a backtest over `bars` on a dedicated thread.
pub fn spawn_backtest(
    bars: Vec<EnrichedBar>,
    policy: ScoringPolicy,
    config: BacktestConfig,
) -> Result<BacktestHandle, SigtraderError> {
    let (tx, rx) = mpsc::channel();
    let cancel = Arc::new(AtomicBool::new(false));
    let worker_cancel = Arc::clone(&cancel);

    let thread = thread::Builder::new()
        .name("sigtrader-backtest".into())
        .spawn(move || {
            let outcome = run_backtest_cancellable(&bars, &policy, &config, &worker_cancel)
                .map(|run| BacktestReport::compute(run, config.starting_balance, &bars));
            if let Err(e) = &outcome {
                tracing::warn!(error = %e, "background backtest ended without a report");
            }
            // Receiver may already be gone; nothing to report to.
            let _ = tx.send(outcome);
        })?;

    Ok(BacktestHandle {
        rx,
        cancel,
        thread: Some(thread),
    })
}
