//! Pure state transition function for the call session
//!
//! Every lifecycle guard lives here as a match arm: re-entrant start,
//! restart-only-while-active, reset-from-anywhere, and the release of a
//! capture handle whose acquisition raced an end or reset. Given the same
//! (state, context, event), `transition` always produces the same result
//! and performs no I/O.

use super::{CallState, Effect, Event};
use crate::dialogue::DialogueContext;
use crate::evaluator::evaluate;

/// Agent greeting appended when the call goes active.
pub const GREETING: &str =
    "Hi, you've reached Shopline support — I'm Aria. How can I help you today?";

/// Agent farewell appended when the call ends.
pub const FAREWELL: &str = "Thanks for calling Shopline support. Take care!";

/// System notice seeding a fresh (or freshly reset) transcript.
pub const READY_NOTICE: &str = "Session ready. Start a call or type a question below.";

/// System notice when voice input fails but the call stays live.
pub const VOICE_FALLBACK_NOTICE: &str =
    "Voice input ran into a problem. The call is still connected — you can keep typing.";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub next_state: CallState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: CallState) -> Self {
        Self {
            next_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Pure transition function.
///
/// Ignored events return the unchanged state with no effects; out-of-state
/// requests are no-ops by contract, never errors.
pub fn transition(state: CallState, context: &DialogueContext, event: Event) -> TransitionResult {
    match (state, event) {
        // ============================================================
        // Call start and capture acquisition
        // ============================================================
        (CallState::Idle, Event::StartRequested) => {
            TransitionResult::new(CallState::Connecting).with_effect(Effect::AcquireCapture)
        }

        // Re-entrant start is ignored, not an error; Ended requires reset.
        (CallState::Connecting | CallState::Active | CallState::Ended, Event::StartRequested) => {
            TransitionResult::new(state)
        }

        (CallState::Connecting, Event::CaptureReady { handle }) => {
            TransitionResult::new(CallState::Active)
                .with_effect(Effect::RetainCapture { handle })
                .with_effect(Effect::agent_turn(GREETING))
                .with_effect(Effect::StartStream)
        }

        // Acquisition settled after the call left Connecting (an end or
        // reset raced it). The late handle must still be released.
        (_, Event::CaptureReady { handle }) => {
            TransitionResult::new(state).with_effect(Effect::DiscardCapture { handle })
        }

        (CallState::Connecting, Event::CaptureFailed { message }) => {
            TransitionResult::new(CallState::Idle).with_effect(Effect::system_turn(format!(
                "Couldn't start the call: {message}. Check microphone permissions and try again."
            )))
        }

        (_, Event::CaptureFailed { .. }) => TransitionResult::new(state),

        // ============================================================
        // Call end and reset
        // ============================================================
        (CallState::Active, Event::EndRequested) => TransitionResult::new(CallState::Ended)
            .with_effect(Effect::StopStream)
            .with_effect(Effect::ReleaseCapture)
            .with_effect(Effect::ClearPartial)
            .with_effect(Effect::agent_turn(FAREWELL)),

        // End from Idle (or any non-active state) is a no-op: no farewell.
        (_, Event::EndRequested) => TransitionResult::new(state),

        // Reset is unconditional from every state; all release paths
        // converge on the same StopStream + ReleaseCapture effects.
        (_, Event::ResetRequested) => TransitionResult::new(CallState::Idle)
            .with_effect(Effect::StopStream)
            .with_effect(Effect::ReleaseCapture)
            .with_effect(Effect::ClearPartial)
            .with_effect(Effect::PublishFollowUps { prompts: vec![] })
            .with_effect(Effect::ClearTranscript)
            .with_effect(Effect::ResetContext)
            .with_effect(Effect::system_turn(READY_NOTICE)),

        // ============================================================
        // Customer turns (steady state while Active)
        // ============================================================
        (CallState::Active, Event::UtteranceFinalized { text }) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                // Caller-side guard: blank input is dropped silently and
                // never reaches the evaluator.
                return TransitionResult::new(state);
            }

            let outcome = evaluate(trimmed, context);
            TransitionResult::new(CallState::Active)
                .with_effect(Effect::ClearPartial)
                .with_effect(Effect::customer_turn(trimmed))
                .with_effect(Effect::agent_turn(outcome.message.clone()))
                .with_effect(Effect::ReplaceContext {
                    next: outcome.updated_context,
                })
                .with_effect(Effect::PublishFollowUps {
                    prompts: outcome.follow_up_prompts,
                })
                .with_effect(Effect::Speak {
                    text: outcome.message,
                })
        }

        (_, Event::UtteranceFinalized { .. }) => TransitionResult::new(state),

        (CallState::Active, Event::PartialTranscript { text }) => {
            TransitionResult::new(CallState::Active).with_effect(Effect::PublishPartial { text })
        }

        (_, Event::PartialTranscript { .. }) => TransitionResult::new(state),

        // ============================================================
        // Streaming-input lifecycle
        // ============================================================

        // Transient disconnect: restart only while still Active, which
        // guards against a restart racing a concurrent end or reset.
        (CallState::Active, Event::StreamEnded) => {
            TransitionResult::new(CallState::Active).with_effect(Effect::StartStream)
        }

        (_, Event::StreamEnded) => TransitionResult::new(state),

        // Voice errors never change call state: typed input keeps working.
        (CallState::Active, Event::StreamError { message }) => {
            TransitionResult::new(CallState::Active)
                .with_effect(Effect::ClearPartial)
                .with_effect(Effect::system_turn(format!(
                    "{VOICE_FALLBACK_NOTICE} ({message})"
                )))
        }

        (_, Event::StreamError { .. }) => TransitionResult::new(state),
    }
}
