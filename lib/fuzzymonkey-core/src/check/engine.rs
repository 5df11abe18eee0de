//! The check engine: three fixed first-class checks, then user checks in
//! registration order, short-circuiting on the first first-class failure
//! (§4.5).

use crate::endpoint::{Bucket, Endpoint};
use crate::validator::Validator;
use crate::ir::SchemaIr;

use super::context::CheckContext;
use super::report::{CheckOutcome, CheckReport, CheckResult};

/// A user-registered check: a name plus a closure over the frozen context.
pub type UserCheck = Box<dyn Fn(&CheckContext) -> CheckOutcome + Send + Sync>;

/// Runs the three fixed first-class checks, then every registered user
/// check, against one call's [`CheckContext`].
///
/// First-class checks run in a fixed order — HTTP status code membership in
/// the declared outputs, response-body JSON well-formedness, and schema
/// validation against the matching bucket — and a failure in any of them
/// skips every later check (user checks included): a response that isn't
/// even valid JSON has nothing meaningful left to assert about it.
pub struct CheckEngine {
    user_checks: Vec<(String, UserCheck)>,
}

impl std::fmt::Debug for CheckEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckEngine")
            .field("user_checks", &self.user_checks.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .finish()
    }
}

impl Default for CheckEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckEngine {
    /// Creates an engine with no user checks registered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            user_checks: Vec::new(),
        }
    }

    /// Registers a user check under `name`, to run after the first-class
    /// checks, in registration order.
    pub fn register(&mut self, name: impl Into<String>, check: UserCheck) {
        self.user_checks.push((name.into(), check));
    }

    /// Runs every applicable check against `ctx` for the matched `endpoint`.
    pub fn run(
        &self,
        ctx: &CheckContext,
        endpoint: &Endpoint,
        ir: &SchemaIr,
        validator: &Validator,
    ) -> CheckReport {
        let mut report = CheckReport::default();

        let status_result = check_status_code_declared(ctx, endpoint);
        let status_passed = status_result.outcome.is_pass();
        report.results.push(status_result);
        if !status_passed {
            return report;
        }

        let json_result = check_valid_json(ctx);
        let json_passed = json_result.outcome.is_pass();
        report.results.push(json_result);
        if !json_passed {
            return report;
        }

        let schema_result = check_schema(ctx, endpoint, ir, validator);
        let schema_passed = schema_result.outcome.is_pass();
        report.results.push(schema_result);
        if !schema_passed {
            return report;
        }

        for (name, check) in &self.user_checks {
            ctx.reset_access_tracking();
            let outcome = check(ctx);
            let passed = outcome.is_pass();
            report.results.push(CheckResult {
                name: name.clone(),
                first_class: false,
                outcome,
            });
            if !passed {
                break;
            }
        }

        report
    }
}

fn bucket_for(endpoint: &Endpoint, status_code: u16) -> Option<crate::ir::OptSid> {
    if let Some(sid) = endpoint.outputs.get(&Bucket::Code(status_code)) {
        return Some(*sid);
    }
    let class = u8::try_from(status_code / 100).ok()?;
    if let Some(sid) = endpoint.outputs.get(&Bucket::Class(class)) {
        return Some(*sid);
    }
    endpoint.outputs.get(&Bucket::Default).copied()
}

fn check_status_code_declared(ctx: &CheckContext, endpoint: &Endpoint) -> CheckResult {
    let status = ctx.response_raw().status_code;
    let outcome = if bucket_for(endpoint, status).is_some() {
        CheckOutcome::Pass
    } else {
        CheckOutcome::Fail(vec![format!(
            "status code {status} is not declared for {} {}",
            endpoint.method,
            endpoint.path_template()
        )])
    };
    CheckResult {
        name: "http-code-declared".to_string(),
        first_class: true,
        outcome,
    }
}

fn check_valid_json(ctx: &CheckContext) -> CheckResult {
    let response = ctx.response_raw();
    let outcome = if response.body.is_empty() {
        CheckOutcome::Pass
    } else if response.json_body.is_some() {
        CheckOutcome::Pass
    } else {
        CheckOutcome::Fail(vec!["response body is not valid JSON".to_string()])
    };
    CheckResult {
        name: "response-is-valid-json".to_string(),
        first_class: true,
        outcome,
    }
}

fn check_schema(
    ctx: &CheckContext,
    endpoint: &Endpoint,
    ir: &SchemaIr,
    validator: &Validator,
) -> CheckResult {
    let response = ctx.response_raw();
    let Some(sid) = bucket_for(endpoint, response.status_code).and_then(|opt| opt.sid()) else {
        return CheckResult {
            name: "response-matches-schema".to_string(),
            first_class: true,
            outcome: CheckOutcome::Pass,
        };
    };
    let Some(json_body) = &response.json_body else {
        return CheckResult {
            name: "response-matches-schema".to_string(),
            first_class: true,
            outcome: CheckOutcome::Pass,
        };
    };
    let outcome = match validator.validate(ir, sid, json_body) {
        Ok(messages) if messages.is_empty() => CheckOutcome::Pass,
        Ok(messages) => CheckOutcome::Fail(messages),
        Err(err) => CheckOutcome::Fail(vec![err.to_string()]),
    };
    CheckResult {
        name: "response-matches-schema".to_string(),
        first_class: true,
        outcome,
    }
}
