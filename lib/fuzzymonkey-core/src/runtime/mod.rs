//! The fuzzing runtime: drives the coordinator protocol through its state
//! machine, dispatching `Call`/`Reset` instructions and reporting progress
//! (§4.8 "Runtime").

mod campaign;
mod messages;
mod progress;
mod scratch;
mod shrink;
mod transport;

pub use campaign::{Campaign, CampaignOutcome, CampaignReport, CallRecord};
pub use messages::{ClientMessage, FuzzAnnounce, ServerMessage};
pub use progress::{LogProgressReporter, Progress, ProgressReporter, TtyProgressReporter, default_reporter};
pub use scratch::scratch_file_name;
pub use shrink::{ShrinkBudget, ShrinkState};
pub use transport::{ChannelStream, CoordinatorStream, TransportError};

use std::io;
use std::time::Duration;

use tokio::time::{Instant, timeout};
use tracing::{debug, info, warn};

use crate::check::{CheckContext, CheckEngine, CheckFailure};
use crate::endpoint::EndpointTable;
use crate::error::FuzzError;
use crate::http::{Capture, HttpCaller};
use crate::ir::SchemaIr;
use crate::resetter::Resetter;
use crate::validator::Validator;

use messages::ResetStatus;

/// Every send/receive on the coordinator stream is bounded by this timeout
/// (§5 "Timeouts"); exceeding it is fatal to the campaign.
const TX_TIMEOUT: Duration = Duration::from_secs(10);

/// What a bounded receive against the coordinator stream produced.
enum RecvOutcome {
    /// A message arrived within `TX_TIMEOUT`.
    Message(ServerMessage),
    /// The coordinator closed the stream.
    Closed,
}

/// The runtime's coarse state, mirroring the coordinator protocol
/// (§4.8): `DIALING` → `READY` → one of `{IN_CALL, IN_RESET,
/// RECV_PROGRESS}` → back to `READY`, until `DONE` or `ABORTED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    /// Announcing readiness, before the first `READY` transition.
    Dialing,
    /// Idle, waiting for the coordinator's next instruction.
    Ready,
    /// Executing an HTTP call the coordinator requested.
    InCall,
    /// Running the resetter's reset hook.
    InReset,
    /// Updating progress reporting from a `FuzzingProgress` message.
    RecvProgress,
    /// The campaign ended normally.
    Done,
    /// The campaign ended due to a fatal error.
    Aborted,
}

/// Drives one fuzzing campaign's coordinator protocol to completion.
pub struct Runtime {
    stream: Box<dyn CoordinatorStream>,
    caller: HttpCaller,
    checks: CheckEngine,
    resetter: Resetter,
    ir: SchemaIr,
    validator: Validator,
    endpoints: EndpointTable,
    state: crate::config::State,
    reporter: Box<dyn ProgressReporter>,
    runtime_state: RuntimeState,
    shrink_budget: ShrinkBudget,
    shrink_state: ShrinkState,
    announce: FuzzAnnounce,
    cancel: tokio::sync::watch::Receiver<bool>,
}

impl Runtime {
    /// Assembles a runtime from its fully-resolved dependencies.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        stream: Box<dyn CoordinatorStream>,
        caller: HttpCaller,
        checks: CheckEngine,
        resetter: Resetter,
        ir: SchemaIr,
        validator: Validator,
        endpoints: EndpointTable,
        state: crate::config::State,
        reporter: Box<dyn ProgressReporter>,
        shrink_budget: ShrinkBudget,
        announce: FuzzAnnounce,
        cancel: tokio::sync::watch::Receiver<bool>,
    ) -> Self {
        Self {
            stream,
            caller,
            checks,
            resetter,
            ir,
            validator,
            endpoints,
            state,
            reporter,
            runtime_state: RuntimeState::Dialing,
            shrink_budget,
            shrink_state: ShrinkState::default(),
            announce,
            cancel,
        }
    }

    /// Runs the campaign to completion: `Start`s the resetter, drives the
    /// coordinator protocol until the stream closes, a terminal progress
    /// message arrives, cancellation fires, or a fatal error occurs.
    ///
    /// On cancellation, `Resetter::terminate` runs exactly once and this
    /// returns [`FuzzError::Cancelled`]. Every other exit path calls
    /// `Resetter::stop` once to tear down the subprocess.
    ///
    /// # Errors
    /// Returns [`FuzzError`] if the resetter's start hook fails, or if the
    /// coordinator protocol hits a fatal error (timeout, cancellation,
    /// unexpected message).
    pub async fn run(&mut self) -> Result<CampaignReport, FuzzError> {
        self.resetter
            .start(&self.cancel, &mut io::stderr(), &mut io::stderr())
            .await?;
        match self.drive().await {
            Err(FuzzError::Cancelled) => {
                self.resetter
                    .terminate(&self.cancel, &mut io::stderr(), &mut io::stderr(), &FuzzError::Cancelled)
                    .await;
                Err(FuzzError::Cancelled)
            }
            other => {
                if let Err(err) = self
                    .resetter
                    .stop(&self.cancel, &mut io::stderr(), &mut io::stderr())
                    .await
                {
                    warn!(%err, "resetter stop hook failed");
                }
                other
            }
        }
    }

    /// Receives the coordinator's next message, bounded by [`TX_TIMEOUT`].
    async fn recv_timed(&mut self) -> Result<RecvOutcome, FuzzError> {
        match timeout(TX_TIMEOUT, self.stream.recv()).await {
            Err(_elapsed) => Err(FuzzError::TxTimeout),
            Ok(Ok(message)) => Ok(RecvOutcome::Message(message)),
            Ok(Err(_closed)) => Ok(RecvOutcome::Closed),
        }
    }

    /// Races a bounded receive against the cancellation signal (§5
    /// "Cancellation"). If cancellation wins, returns [`FuzzError::Cancelled`]
    /// without consuming a coordinator message; otherwise behaves like
    /// [`Self::recv_timed`].
    async fn recv_or_cancel(&mut self) -> Result<RecvOutcome, FuzzError> {
        if *self.cancel.borrow() {
            return Err(FuzzError::Cancelled);
        }
        tokio::select! {
            biased;
            changed = self.cancel.changed() => {
                if changed.is_ok() && *self.cancel.borrow() {
                    return Err(FuzzError::Cancelled);
                }
                // Spurious wake (false -> false) or the sender was dropped
                // (cancellation now unreachable): fall back to a plain
                // bounded receive for this one call.
                self.recv_timed().await
            }
            outcome = self.recv_timed() => outcome,
        }
    }

    async fn send_timed(&mut self, message: ClientMessage) -> Result<(), FuzzError> {
        timeout(TX_TIMEOUT, self.stream.send(message))
            .await
            .map_err(|_elapsed| FuzzError::TxTimeout)?
            .map_err(|_closed| FuzzError::TxTimeout)
    }

    /// Blocks for the `FuzzingProgress` the coordinator sends after every
    /// `Call`/`Reset` (§4.8: the runtime "refuses to proceed until
    /// `FuzzingProgress` arrives within `tx_timeout`"), applying it to
    /// `report` and the progress reporter. `Ok(Err(report))` means a
    /// terminal message (or a closed stream) ended the campaign.
    async fn await_fuzzing_progress(
        &mut self,
        report: CampaignReport,
    ) -> Result<Result<CampaignReport, CampaignReport>, FuzzError> {
        self.runtime_state = RuntimeState::RecvProgress;
        let message = match self.recv_or_cancel().await? {
            RecvOutcome::Message(message) => message,
            RecvOutcome::Closed => {
                let mut report = report;
                report.outcome = self.final_outcome(&report);
                return Ok(Err(report));
            }
        };
        let ServerMessage::FuzzingProgress { .. } = &message else {
            return Err(FuzzError::UnexpectedServerMessage {
                kind: format!("{message:?}"),
            });
        };
        Ok(self.apply_fuzzing_progress(report, message))
    }

    /// Applies a `FuzzingProgress` message's fields to `report` and the
    /// progress reporter. `Err(report)` once the message is `terminal`.
    fn apply_fuzzing_progress(
        &mut self,
        mut report: CampaignReport,
        message: ServerMessage,
    ) -> Result<CampaignReport, CampaignReport> {
        let ServerMessage::FuzzingProgress {
            total_tests,
            total_calls,
            total_checks,
            test_calls,
            call_checks: _,
            success,
            terminal,
        } = message
        else {
            unreachable!("caller already matched ServerMessage::FuzzingProgress")
        };
        let progress = Progress {
            total_tests,
            total_calls,
            total_checks,
            test_calls,
            success,
        };
        self.reporter.report(progress);
        if terminal {
            self.runtime_state = RuntimeState::Done;
            report.outcome = self.outcome_from_success(success);
            self.reporter.finish(progress);
            return Err(report);
        }
        self.runtime_state = RuntimeState::Ready;
        Ok(report)
    }

    async fn drive(&mut self) -> Result<CampaignReport, FuzzError> {
        let mut report = CampaignReport::default();

        self.send_timed(ClientMessage::Fuzz(self.announce.clone())).await?;
        self.runtime_state = RuntimeState::Ready;

        loop {
            let message = match self.recv_or_cancel().await? {
                RecvOutcome::Message(message) => message,
                RecvOutcome::Closed => {
                    self.runtime_state = RuntimeState::Done;
                    report.outcome = self.final_outcome(&report);
                    info!(
                        cases = report.calls.len(),
                        outcome = ?report.outcome,
                        "coordinator stream closed, campaign done"
                    );
                    return Ok(report);
                }
            };

            match message {
                ServerMessage::Call(skeleton) => {
                    self.runtime_state = RuntimeState::InCall;
                    let capture = self.caller.call(&skeleton).await.map_err(|err| {
                        warn!(%err, "HTTP call failed");
                        FuzzError::TxTimeout
                    })?;
                    let record = self.evaluate_call(capture);
                    if let Some(failure) = record.failure.clone() {
                        report.bugs_found += 1;
                        warn!(%failure, "check failed");
                    }
                    self.send_timed(ClientMessage::CallResponse {
                        capture: record.capture.clone(),
                        checks: record.checks.clone(),
                    })
                    .await?;
                    report.calls.push(record);
                    match self.await_fuzzing_progress(report).await? {
                        Ok(carried) => report = carried,
                        Err(done) => return Ok(done),
                    }
                }
                ServerMessage::Reset => {
                    self.runtime_state = RuntimeState::InReset;
                    self.send_timed(ClientMessage::ResetProgress {
                        status: ResetStatus::Started,
                        elapsed_ns: 0,
                        reason: Vec::new(),
                    })
                    .await?;

                    let start = Instant::now();
                    // Resetter output goes to stderr, never stdout: stdout is
                    // the coordinator's own wire transport (§6).
                    if let Err(err) = self
                        .resetter
                        .reset(&self.cancel, &mut io::stderr(), &mut io::stderr(), false)
                        .await
                    {
                        let elapsed_ns = u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX);
                        warn!(%err, "resetter reset hook failed, ending campaign");
                        self.send_timed(ClientMessage::ResetProgress {
                            status: ResetStatus::Failed,
                            elapsed_ns,
                            reason: vec![err.to_string()],
                        })
                        .await?;
                        report.outcome = CampaignOutcome::FailureDueToResetterError;
                        self.runtime_state = RuntimeState::Aborted;
                        return Ok(report);
                    }
                    let elapsed_ns = u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX);
                    self.send_timed(ClientMessage::ResetProgress {
                        status: ResetStatus::Ended,
                        elapsed_ns,
                        reason: Vec::new(),
                    })
                    .await?;
                    match self.await_fuzzing_progress(report).await? {
                        Ok(carried) => report = carried,
                        Err(done) => return Ok(done),
                    }
                }
                ServerMessage::FuzzingProgress { .. } => {
                    // Only expected unsolicited between a Reset/Call pair and
                    // the coordinator's next instruction, not as the reply to
                    // one — that path is handled by `await_fuzzing_progress`.
                    match self.apply_fuzzing_progress(report, message) {
                        Ok(carried) => report = carried,
                        Err(done) => return Ok(done),
                    }
                }
                ServerMessage::ShrinkHint => {
                    let continuing = self.shrink_state.can_attempt(self.shrink_budget);
                    if continuing {
                        self.shrink_state.shrinking = true;
                        self.shrink_state.record_attempt();
                        debug!(attempts = self.shrink_state.unshrunk, "attempting a shrink");
                    } else {
                        debug!("shrink budget exhausted, declining further shrinking");
                    }
                    self.send_timed(ClientMessage::ShrinkProgress { continuing }).await?;
                }
            }
        }
    }

    /// Selects the single termination outcome a finished campaign reports
    /// when the coordinator stream closes without ever sending a terminal
    /// `FuzzingProgress` (§4.8 "Shrinking": exactly one of `Success`/
    /// `Failure`/`Shrinkable`/`FailureDueToResetterError`; the resetter-error
    /// case is reported directly where the failure happens, not here).
    fn final_outcome(&self, report: &CampaignReport) -> CampaignOutcome {
        self.outcome_from_success(report.bugs_found == 0)
    }

    /// Selects a termination outcome from a `FuzzingProgress` message's
    /// `success` flag, honoring whether shrinking is still in progress.
    fn outcome_from_success(&self, success: bool) -> CampaignOutcome {
        if success {
            return CampaignOutcome::Success;
        }
        if self.shrink_state.shrinking && self.shrink_state.can_attempt(self.shrink_budget) {
            CampaignOutcome::Shrinkable
        } else {
            CampaignOutcome::Failure
        }
    }

    fn evaluate_call(&mut self, capture: Capture) -> CallRecord {
        let endpoint = self
            .endpoints
            .iter()
            .find(|e| e.method == capture.request.method);
        let ctx = CheckContext::new(&self.state, capture.request.clone(), capture.response.clone());

        let Some(endpoint) = endpoint else {
            debug!(method = %capture.request.method, "no matching endpoint for call, skipping checks");
            return CallRecord {
                capture,
                checks: crate::check::CheckReport::default(),
                failure: None,
            };
        };

        let report = self.checks.run(&ctx, endpoint, &self.ir, &self.validator);
        let failure = CheckFailure::from_report(&report);
        // Checks may have written to `ctx.state()` (§3: state "may only be
        // mutated through the CheckEngine during check evaluation");  carry
        // that forward so the next call's context starts from it.
        self.state = ctx.into_state();
        CallRecord {
            capture,
            checks: report,
            failure,
        }
    }
}
