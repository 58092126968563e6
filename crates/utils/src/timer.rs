//! Wall-clock instrumentation with named splits

// standard library
use std::time::{Duration, Instant};

// external crates
use log::info;

/// Start/stop timer recording named splits
///
/// A [Timer] accumulates elapsed wall-clock time between calls to
/// [start()](Timer::start) and [stop()](Timer::stop). The accumulated time
/// can be recorded under a name with [record_split()](Timer::record_split)
/// and the timer cleared with [reset()](Timer::reset) for the next stage.
///
/// ```rust
/// # use moctools_utils::Timer;
/// let mut timer = Timer::new();
///
/// timer.start();
/// timer.stop();
/// timer.record_split("Initialising the geometry");
/// timer.reset();
///
/// assert_eq!(timer.splits().len(), 1);
/// assert_eq!(timer.splits()[0].0, "Initialising the geometry");
/// ```
///
/// Recording a split while the timer is still running includes the time up
/// to that call without stopping the timer.
#[derive(Debug, Default, Clone)]
pub struct Timer {
    /// Instant the current run started, `None` when stopped
    started: Option<Instant>,
    /// Time accumulated over completed runs
    elapsed: Duration,
    /// Named splits in the order they were recorded
    splits: Vec<(String, f64)>,
}

impl Timer {
    /// New stopped timer with no splits
    pub fn new() -> Self {
        Default::default()
    }

    /// Start (or resume) the timer
    ///
    /// Calling this on a running timer has no effect.
    pub fn start(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    /// Stop the timer, keeping the accumulated time
    pub fn stop(&mut self) {
        if let Some(started) = self.started.take() {
            self.elapsed += started.elapsed();
        }
    }

    /// Clear the accumulated time, splits are kept
    pub fn reset(&mut self) {
        self.started = None;
        self.elapsed = Duration::ZERO;
    }

    /// Is the timer currently running?
    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    /// Accumulated time in seconds, including any current run
    pub fn elapsed(&self) -> f64 {
        let running = self.started.map(|s| s.elapsed()).unwrap_or_default();
        (self.elapsed + running).as_secs_f64()
    }

    /// Record the accumulated time under `name`
    pub fn record_split(&mut self, name: impl Into<String>) {
        let seconds = self.elapsed();
        self.splits.push((name.into(), seconds));
    }

    /// All recorded splits as (name, seconds)
    pub fn splits(&self) -> &[(String, f64)] {
        &self.splits
    }

    /// Look up the most recent split recorded under `name`
    pub fn split(&self, name: &str) -> Option<f64> {
        self.splits
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, t)| *t)
    }

    /// Remove every recorded split
    pub fn clear_splits(&mut self) {
        self.splits.clear();
    }

    /// Log every split at info level
    pub fn print_splits(&self) {
        let width = self.splits.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
        for (name, seconds) in &self.splits {
            info!("{name:.<width$}...{seconds:>12.4e} sec", width = width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_timer_does_not_accumulate() {
        let mut timer = Timer::new();
        assert_eq!(timer.elapsed(), 0.0);
        timer.stop();
        assert_eq!(timer.elapsed(), 0.0);
        assert!(!timer.is_running());
    }

    #[test]
    fn splits_keep_order_and_survive_reset() {
        let mut timer = Timer::new();
        timer.start();
        std::thread::sleep(Duration::from_millis(2));
        timer.stop();
        timer.record_split("first");
        timer.reset();
        assert_eq!(timer.elapsed(), 0.0);

        timer.start();
        timer.stop();
        timer.record_split("second");

        let names: Vec<&str> = timer.splits().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert!(timer.split("first").unwrap() >= 0.002);
        assert!(timer.split("missing").is_none());
    }

    #[test]
    fn start_is_idempotent() {
        let mut timer = Timer::new();
        timer.start();
        timer.start();
        assert!(timer.is_running());
        timer.stop();
        assert!(!timer.is_running());
    }
}
