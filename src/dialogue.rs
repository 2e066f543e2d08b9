//! Session dialogue context: the single authoritative per-call flag set

use serde::{Deserialize, Serialize};

/// Accumulated session state consulted by the reply evaluator.
///
/// Extensible with additional per-session flags; today it carries only the
/// escalation flag, which is monotonic once set (see `evaluator`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DialogueContext {
    pub escalation_requested: bool,
}

impl DialogueContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Owner of the one authoritative `DialogueContext` value.
///
/// `replace` is the only mutation path; evaluation output is always the
/// full next context, so a stale field can never survive a turn.
#[derive(Debug, Default)]
pub struct ContextStore {
    current: DialogueContext,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &DialogueContext {
        &self.current
    }

    /// Swap in the full next context produced by an evaluation.
    pub fn replace(&mut self, next: DialogueContext) {
        self.current = next;
    }

    /// Return to the initial value. Used only when the session resets.
    pub fn reset(&mut self) {
        self.current = DialogueContext::default();
    }
}
