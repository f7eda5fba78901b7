//! Per-request pipeline state.

use crate::auth::AuthorizationContext;
use crate::error::ErrorStatus;
use kiosync_protocol::Slots;
use std::fmt;
use tracing::trace;

/// Where a request is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Accepted from the transport.
    Received,
    /// Body decoded into JSON.
    BodyDecoded,
    /// Payload matched its schema.
    Validated,
    /// Caller authorized.
    Authorized,
    /// Handed to the sync engine.
    Dispatched,
    /// Response produced.
    Responded,
    /// Terminated by an error.
    Failed(ErrorStatus),
}

impl Stage {
    /// Returns true for `Responded` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Responded | Stage::Failed(_))
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Received => f.write_str("received"),
            Stage::BodyDecoded => f.write_str("body_decoded"),
            Stage::Validated => f.write_str("validated"),
            Stage::Authorized => f.write_str("authorized"),
            Stage::Dispatched => f.write_str("dispatched"),
            Stage::Responded => f.write_str("responded"),
            Stage::Failed(status) => write!(f, "failed({status})"),
        }
    }
}

/// State owned by one request for its whole lifetime.
///
/// Holds the current stage, the typed values earlier stages produced and,
/// once the caller is authorized, its [`AuthorizationContext`]. Nothing in
/// here is shared with other requests.
#[derive(Debug)]
pub struct RequestContext {
    stage: Stage,
    slots: Slots,
    authorization: Option<AuthorizationContext>,
}

impl RequestContext {
    /// Creates a context in the `Received` stage.
    pub fn new() -> Self {
        Self {
            stage: Stage::Received,
            slots: Slots::new(),
            authorization: None,
        }
    }

    /// Returns the current stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Moves to `next`. Terminal stages are final.
    pub fn advance(&mut self, next: Stage) {
        if self.stage.is_terminal() {
            return;
        }
        trace!(from = %self.stage, to = %next, "stage");
        self.stage = next;
    }

    /// Records a failure.
    pub fn fail(&mut self, status: ErrorStatus) {
        self.advance(Stage::Failed(status));
    }

    /// Returns the values stored by earlier stages.
    pub fn slots(&self) -> &Slots {
        &self.slots
    }

    /// Returns the slots for a stage to write into.
    pub fn slots_mut(&mut self) -> &mut Slots {
        &mut self.slots
    }

    /// Records a successful authorization and advances to `Authorized`.
    pub fn authorize(&mut self, authorization: AuthorizationContext) {
        self.authorization = Some(authorization);
        self.advance(Stage::Authorized);
    }

    /// Returns the authorization, if the caller has been authorized.
    pub fn authorization(&self) -> Option<&AuthorizationContext> {
        self.authorization.as_ref()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
