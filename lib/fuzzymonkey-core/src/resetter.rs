//! SUT lifecycle management via shell subprocesses (§4.6 "Resetter").

use std::io::{self, Write as _};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::ResetterConfig;
use crate::error::FuzzError;

/// Errors running a resetter subprocess.
///
/// Kept distinct from a generic command failure per §4.6: a resetter
/// exiting non-zero ends the campaign via a dedicated recovery path
/// (`FailureDueToResetterError`), not the same one a check failure takes.
#[derive(Debug, Clone, derive_more::Error, derive_more::Display)]
#[display("resetter command {cmd:?} exited with status {status}")]
pub struct ResetterError {
    /// The shell command that failed.
    pub cmd: String,
    /// Its exit status, rendered for diagnostics (e.g. `"1"`, `"signal: 9"`).
    pub status: String,
}

/// The three lifecycle hooks a configuration script can bind to a modeler
/// (§4.4 reserved keys `ExecStart`/`ExecReset`/`ExecStop`, §4.6 `Resetter`).
#[derive(Debug, Clone, Default)]
pub struct Resetter {
    config: ResetterConfig,
}

impl Resetter {
    /// Builds a resetter from a modeler's reserved-key configuration.
    #[must_use]
    pub fn new(config: ResetterConfig) -> Self {
        Self { config }
    }

    /// Runs `ExecStart` once, before the campaign begins, if bound.
    ///
    /// `cancel` is the campaign's cancellation signal (§4.6's `ctx`); `stdout`
    /// and `stderr` receive the subprocess's output line by line.
    ///
    /// # Errors
    /// Returns [`ResetterError`] if the command exits non-zero.
    pub async fn start(
        &self,
        cancel: &watch::Receiver<bool>,
        stdout: &mut dyn io::Write,
        stderr: &mut dyn io::Write,
    ) -> Result<(), ResetterError> {
        self.run_hook("start", self.config.exec_start.as_deref(), cancel, false, stdout, stderr)
            .await
    }

    /// Runs `ExecReset` between test cases to restore SUT state, if bound.
    ///
    /// `only_if_needed` mirrors the coordinator's own reset call: the one
    /// call site this crate grounds its protocol loop on always passes
    /// `false` (a forced reset) — `true` only short-circuits an unbound hook,
    /// since this crate has no finer per-call dirty-state tracking to decide
    /// "needed" against. A cancelled campaign skips the hook outright rather
    /// than starting a fresh subprocess that would just be killed.
    ///
    /// # Errors
    /// Returns [`ResetterError`] if the command exits non-zero.
    pub async fn reset(
        &self,
        cancel: &watch::Receiver<bool>,
        stdout: &mut dyn io::Write,
        stderr: &mut dyn io::Write,
        only_if_needed: bool,
    ) -> Result<(), ResetterError> {
        if only_if_needed && self.config.exec_reset.is_none() {
            return Ok(());
        }
        self.run_hook("reset", self.config.exec_reset.as_deref(), cancel, true, stdout, stderr)
            .await
    }

    /// Runs `ExecStop` once, after the campaign ends, if bound.
    ///
    /// # Errors
    /// Returns [`ResetterError`] if the command exits non-zero.
    pub async fn stop(
        &self,
        cancel: &watch::Receiver<bool>,
        stdout: &mut dyn io::Write,
        stderr: &mut dyn io::Write,
    ) -> Result<(), ResetterError> {
        self.run_hook("stop", self.config.exec_stop.as_deref(), cancel, false, stdout, stderr)
            .await
    }

    /// Forcibly ends the campaign (§5 "Cancellation": `Terminate(ctx, err)`,
    /// invoked exactly once). Runs `ExecStop` regardless of the cancellation
    /// signal's state, swallowing its own errors since this is called while
    /// already unwinding from `err`.
    pub async fn terminate(
        &self,
        cancel: &watch::Receiver<bool>,
        stdout: &mut dyn io::Write,
        stderr: &mut dyn io::Write,
        err: &FuzzError,
    ) {
        let _ = writeln!(stderr, "terminating: {err}");
        if let Err(stop_err) = self
            .run_hook("stop", self.config.exec_stop.as_deref(), cancel, false, stdout, stderr)
            .await
        {
            warn!(%stop_err, "resetter stop failed during terminate");
        }
    }

    async fn run_hook(
        &self,
        phase: &'static str,
        cmd: Option<&str>,
        cancel: &watch::Receiver<bool>,
        skip_if_cancelled: bool,
        stdout: &mut dyn io::Write,
        stderr: &mut dyn io::Write,
    ) -> Result<(), ResetterError> {
        let Some(cmd) = cmd else {
            debug!(phase, "no resetter command bound, skipping");
            return Ok(());
        };

        if skip_if_cancelled && *cancel.borrow() {
            debug!(phase, "campaign cancelled, skipping resetter command");
            return Ok(());
        }

        info!(phase, %cmd, "running resetter command");
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| ResetterError {
                cmd: cmd.to_string(),
                status: format!("failed to spawn: {err}"),
            })?;

        let child_stdout = child.stdout.take();
        let child_stderr = child.stderr.take();

        if let Some(out) = child_stdout {
            stream_lines(out, cmd, "stdout", stdout).await;
        }
        if let Some(err) = child_stderr {
            stream_lines(err, cmd, "stderr", stderr).await;
        }

        let status = child.wait().await.map_err(|err| ResetterError {
            cmd: cmd.to_string(),
            status: format!("failed to wait: {err}"),
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(ResetterError {
                cmd: cmd.to_string(),
                status: status
                    .code()
                    .map_or_else(|| "terminated by signal".to_string(), |code| code.to_string()),
            })
        }
    }
}

async fn stream_lines(
    reader: impl tokio::io::AsyncRead + Unpin,
    cmd: &str,
    stream: &'static str,
    sink: &mut dyn io::Write,
) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(%cmd, stream, %line, "resetter output");
        let _ = writeln!(sink, "{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_cancel() -> watch::Receiver<bool> {
        watch::channel(false).1
    }

    #[tokio::test]
    async fn unbound_hooks_are_no_ops() {
        let resetter = Resetter::new(ResetterConfig::default());
        let cancel = no_cancel();
        let mut out = io::sink();
        let mut err = io::sink();
        assert!(resetter.start(&cancel, &mut out, &mut err).await.is_ok());
        assert!(resetter.reset(&cancel, &mut out, &mut err, false).await.is_ok());
        assert!(resetter.stop(&cancel, &mut out, &mut err).await.is_ok());
    }

    #[tokio::test]
    async fn successful_command_reports_ok() {
        let resetter = Resetter::new(ResetterConfig {
            exec_start: Some("true".to_string()),
            ..Default::default()
        });
        let cancel = no_cancel();
        let mut out = io::sink();
        let mut err = io::sink();
        assert!(resetter.start(&cancel, &mut out, &mut err).await.is_ok());
    }

    #[tokio::test]
    async fn failing_command_reports_resetter_error() {
        let resetter = Resetter::new(ResetterConfig {
            exec_reset: Some("exit 7".to_string()),
            ..Default::default()
        });
        let cancel = no_cancel();
        let mut out = io::sink();
        let mut err = io::sink();
        let result = resetter.reset(&cancel, &mut out, &mut err, false).await;
        assert_eq!(result.unwrap_err().status, "7");
    }

    #[tokio::test]
    async fn only_if_needed_skips_unbound_reset() {
        let resetter = Resetter::new(ResetterConfig::default());
        let cancel = no_cancel();
        let mut out = io::sink();
        let mut err = io::sink();
        assert!(resetter.reset(&cancel, &mut out, &mut err, true).await.is_ok());
    }

    #[tokio::test]
    async fn cancelled_campaign_skips_reset() {
        let resetter = Resetter::new(ResetterConfig {
            exec_reset: Some("exit 7".to_string()),
            ..Default::default()
        });
        let (tx, cancel) = watch::channel(false);
        tx.send(true).expect("receiver still alive");
        let mut out = io::sink();
        let mut err = io::sink();
        assert!(resetter.reset(&cancel, &mut out, &mut err, false).await.is_ok());
    }

    #[tokio::test]
    async fn terminate_never_panics_on_failure() {
        let resetter = Resetter::new(ResetterConfig {
            exec_stop: Some("exit 1".to_string()),
            ..Default::default()
        });
        let cancel = no_cancel();
        let mut out = io::sink();
        let mut err = io::sink();
        resetter
            .terminate(&cancel, &mut out, &mut err, &FuzzError::Cancelled)
            .await;
    }

    #[tokio::test]
    async fn command_output_reaches_provided_sinks() {
        let resetter = Resetter::new(ResetterConfig {
            exec_start: Some("echo hello".to_string()),
            ..Default::default()
        });
        let cancel = no_cancel();
        let mut out = Vec::new();
        let mut err = io::sink();
        resetter.start(&cancel, &mut out, &mut err).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "hello\n");
    }
}
