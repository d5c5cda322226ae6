//! Progress reporting seam.
//!
//! The pipeline emits progress through an injected sink so frontends can
//! consume it from another thread without blocking on the whole run. The
//! sink is synchronous and must not block for long.

use log::{debug, info};

/// One progress message: step label, 0-100 percentage, display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Short label of the current pipeline step.
    pub step: String,
    /// Overall completion, 0-100, never decreasing within a run.
    pub percentage: u8,
    /// Human-readable message, prefixed with the percentage.
    pub message: String,
}

/// Receives progress updates from a running pipeline.
pub trait ProgressSink: Send + Sync {
    /// Accepts one update. Implementations must not panic.
    fn report(&self, update: ProgressUpdate);
}

/// Discards all updates.
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn report(&self, _update: ProgressUpdate) {}
}

/// Writes updates to the log at info level.
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, update: ProgressUpdate) {
        info!("{}", update.message);
    }
}

/// Forwards updates into a channel, for frontends polling from another
/// thread. A closed receiver is logged and otherwise ignored; progress is
/// best-effort and must never take the run down.
impl ProgressSink for std::sync::mpsc::Sender<ProgressUpdate> {
    fn report(&self, update: ProgressUpdate) {
        if self.send(update).is_err() {
            log::warn!("Progress receiver disconnected; dropping update");
        }
    }
}

/// Clamps percentages to 0-100 and enforces monotonicity before handing
/// updates to the sink.
pub(crate) struct ProgressReporter<'a> {
    sink: &'a dyn ProgressSink,
    last: u8,
}

impl<'a> ProgressReporter<'a> {
    pub(crate) fn new(sink: &'a dyn ProgressSink) -> Self {
        ProgressReporter { sink, last: 0 }
    }

    pub(crate) fn report(&mut self, step: &str, percentage: u8, message: impl Into<String>) {
        let clamped = percentage.min(100).max(self.last);
        self.last = clamped;
        debug!("Progress: {} - {}%", step, clamped);
        self.sink.report(ProgressUpdate {
            step: step.to_string(),
            percentage: clamped,
            message: format!("[{}%] {}", clamped, message.into()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn reporter_clamps_and_never_regresses() {
        let (tx, rx) = mpsc::channel();
        let mut reporter = ProgressReporter::new(&tx);
        reporter.report("a", 30, "thirty");
        reporter.report("b", 10, "stale value");
        reporter.report("c", 250, "overflow");

        let percentages: Vec<u8> = rx.try_iter().map(|u| u.percentage).collect();
        assert_eq!(percentages, [30, 30, 100]);
    }

    #[test]
    fn messages_carry_percentage_prefix() {
        let (tx, rx) = mpsc::channel();
        ProgressReporter::new(&tx).report("Reading", 5, "Reading input...");
        let update = rx.recv().unwrap();
        assert_eq!(update.step, "Reading");
        assert_eq!(update.message, "[5%] Reading input...");
    }

    #[test]
    fn closed_receiver_does_not_panic() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        ProgressReporter::new(&tx).report("a", 1, "m");
    }
}
