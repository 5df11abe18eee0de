//! Campaign progress reporting: an interactive single-line TTY backend and
//! a log-line CI backend, selected by TTY detection (§4.8 "ProgressReporter").

use std::io::{self, IsTerminal, Write as _};

use tracing::info;

/// One progress snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct Progress {
    /// Total test cases planned for this campaign.
    pub total_tests: u32,
    /// Total HTTP calls made so far.
    pub total_calls: u32,
    /// Total checks evaluated so far.
    pub total_checks: u32,
    /// HTTP calls made in the current test.
    pub test_calls: u32,
    /// Whether no bug has been found so far.
    pub success: bool,
}

/// Reports campaign progress to the user.
pub trait ProgressReporter: Send + Sync {
    /// Called whenever campaign progress advances.
    fn report(&mut self, progress: Progress);
    /// Called once the campaign ends.
    fn finish(&mut self, progress: Progress);
}

/// Redraws a single status line in place, for an interactive terminal.
#[derive(Debug, Default)]
pub struct TtyProgressReporter;

impl ProgressReporter for TtyProgressReporter {
    fn report(&mut self, progress: Progress) {
        let mut stderr = io::stderr();
        let _ = write!(
            stderr,
            "\rtests: {}/{}  calls: {}  checks: {}  {}",
            progress.test_calls,
            progress.total_tests,
            progress.total_calls,
            progress.total_checks,
            if progress.success { "no bugs yet" } else { "bug found" },
        );
        let _ = stderr.flush();
    }

    fn finish(&mut self, progress: Progress) {
        let mut stderr = io::stderr();
        let _ = writeln!(
            stderr,
            "\rtests: {}/{}  calls: {}  checks: {}  {}",
            progress.test_calls,
            progress.total_tests,
            progress.total_calls,
            progress.total_checks,
            if progress.success { "no bugs yet" } else { "bug found" },
        );
    }
}

/// Emits one structured log line per update, for non-interactive (CI) output.
#[derive(Debug, Default)]
pub struct LogProgressReporter;

impl ProgressReporter for LogProgressReporter {
    fn report(&mut self, progress: Progress) {
        info!(
            total_tests = progress.total_tests,
            total_calls = progress.total_calls,
            total_checks = progress.total_checks,
            test_calls = progress.test_calls,
            success = progress.success,
            "campaign progress"
        );
    }

    fn finish(&mut self, progress: Progress) {
        info!(
            total_tests = progress.total_tests,
            total_calls = progress.total_calls,
            total_checks = progress.total_checks,
            test_calls = progress.test_calls,
            success = progress.success,
            "campaign finished"
        );
    }
}

/// Picks [`TtyProgressReporter`] when stderr is an interactive terminal,
/// [`LogProgressReporter`] otherwise (redirected to a file, piped in CI, …).
#[must_use]
pub fn default_reporter() -> Box<dyn ProgressReporter> {
    if io::stderr().is_terminal() {
        Box::new(TtyProgressReporter)
    } else {
        Box::new(LogProgressReporter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_reporter_does_not_panic() {
        let mut reporter = LogProgressReporter;
        let progress = Progress {
            total_tests: 100,
            total_calls: 40,
            total_checks: 120,
            test_calls: 3,
            success: false,
        };
        reporter.report(progress);
        reporter.finish(progress);
    }
}
