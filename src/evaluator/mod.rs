//! Reply evaluator: pure keyword classification over the dialogue context
//!
//! `evaluate` is a pure function of (utterance, context): it consults no
//! process-wide state and always produces a defined outcome for non-empty
//! input, so it can be tested exhaustively as data-in/data-out.

mod rules;

pub use rules::Intent;

use crate::dialogue::DialogueContext;
use rules::{FALLBACK, RULES};

/// Result of evaluating one customer utterance.
///
/// Transient: consumed immediately to produce the agent turn and the next
/// context, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyOutcome {
    pub intent: Intent,
    pub message: String,
    /// Suggested next questions; empty (not omitted) when the intent
    /// defines none, so callers can unconditionally replace their list.
    pub follow_up_prompts: Vec<String>,
    pub updated_context: DialogueContext,
}

/// Classify an utterance and derive the agent reply.
///
/// Callers must filter empty-after-trim input before invoking; the
/// evaluator does not special-case blank text.
pub fn evaluate(utterance: &str, context: &DialogueContext) -> ReplyOutcome {
    debug_assert!(
        !utterance.trim().is_empty(),
        "callers must drop blank utterances before evaluation"
    );

    let normalized = utterance.to_lowercase();
    let rule = RULES
        .iter()
        .find(|rule| rule.matches(&normalized))
        .unwrap_or(&FALLBACK);

    ReplyOutcome {
        intent: rule.intent,
        message: rule.reply.to_string(),
        follow_up_prompts: rule.follow_ups.iter().map(|s| (*s).to_string()).collect(),
        // Escalation is monotonic: ORing here makes it structurally
        // impossible for any rule to clear the flag.
        updated_context: DialogueContext {
            escalation_requested: context.escalation_requested || rule.escalates,
        },
    }
}
