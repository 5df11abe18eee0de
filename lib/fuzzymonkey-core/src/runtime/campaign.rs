//! Ties the configuration sandbox's output to a running [`super::Runtime`]
//! (§3 "Call record", "Campaign progress").

use crate::check::CheckReport;
use crate::config::{ConfigError, Sandbox};
use crate::endpoint::EndpointTable;
use crate::ir::SchemaIr;
use crate::normalizer::{NormalizedSpec, SpecError, SpecNormalizer};
use crate::validator::Validator;

/// One executed call, with its full capture and check results (§3 "Call record").
#[derive(Debug, Clone)]
pub struct CallRecord {
    /// The captured request/response exchange.
    pub capture: crate::http::Capture,
    /// The check results evaluated against this call.
    pub checks: CheckReport,
    /// The first check failure, if any.
    pub failure: Option<crate::check::CheckFailure>,
}

/// The four termination outcomes a campaign selects exactly one of
/// (§4.8 "Shrinking"; Open Question b resolves the source's ambiguous
/// `shrink_attempts == nil` vs `*shrink_attempts == 0` distinction into
/// this explicit enum).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CampaignOutcome {
    /// No check ever failed.
    #[default]
    Success,
    /// A check failed and the shrink budget was exhausted (or disabled)
    /// before the coordinator stream closed.
    Failure,
    /// A check failed and the coordinator closed the stream while a
    /// shrink attempt was still permitted under the budget.
    Shrinkable,
    /// A resetter hook exited non-zero mid-campaign.
    FailureDueToResetterError,
}

/// The full outcome of a campaign run (§3 "Campaign progress").
#[derive(Debug, Clone, Default)]
pub struct CampaignReport {
    /// Every call executed, in execution order.
    pub calls: Vec<CallRecord>,
    /// Distinct bugs found (calls with a first-class or user check failure).
    pub bugs_found: u64,
    /// Which of the four termination outcomes this run selected.
    pub outcome: CampaignOutcome,
}

/// Errors setting up a campaign from a loaded configuration and OpenAPI document.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum CampaignSetupError {
    /// The configuration script itself failed to load.
    #[display("{_0}")]
    Config(ConfigError),
    /// Normalizing the bound OpenAPI document failed.
    #[display("{_0}")]
    Spec(SpecError),
    /// The configuration named a modeler kind this crate cannot yet resolve.
    #[display("modeler {_0:?} is not resolvable to an OpenAPI document here")]
    #[from(skip)]
    UnresolvedModeler(String),
}

/// A fully-resolved campaign, ready to hand to [`super::Runtime::new`].
#[derive(Debug)]
pub struct Campaign {
    /// The de-duplicated schema IR extracted from the bound OpenAPI document.
    pub ir: SchemaIr,
    /// The validator, pre-seeded with every raw schema the normalizer saw.
    pub validator: Validator,
    /// The endpoint table extracted from the bound OpenAPI document.
    pub endpoints: EndpointTable,
    /// The resetter wiring bound by the configuration script's modeler.
    pub resetter: crate::config::ResetterConfig,
    /// The seeded campaign state.
    pub state: crate::config::State,
}

impl Campaign {
    /// Resolves a loaded configuration sandbox plus its bound OpenAPI
    /// document into a ready-to-run campaign.
    ///
    /// # Errors
    /// Returns [`CampaignSetupError`] if the sandbox named an unresolvable
    /// modeler kind, or if normalizing the document fails.
    pub fn resolve(sandbox: &Sandbox, document: &openapiv3::OpenAPI) -> Result<Self, CampaignSetupError> {
        let modeler = sandbox
            .modelers
            .iter()
            .find(|m| m.kind == "OpenAPIv3")
            .ok_or_else(|| CampaignSetupError::UnresolvedModeler("<none>".to_string()))?;

        let NormalizedSpec { ir, validator, endpoints } = SpecNormalizer::normalize(document)?;

        Ok(Self {
            ir,
            validator,
            endpoints,
            resetter: modeler.resetter.clone(),
            state: sandbox.state.clone(),
        })
    }
}
