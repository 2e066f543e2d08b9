//! Effects produced by state transitions

use crate::dialogue::DialogueContext;
use crate::runtime::traits::CaptureHandle;
use crate::transcript::Author;

/// Side effects to be executed, in order, after a state transition.
///
/// Transitions stay pure by describing I/O as data; the runtime executor
/// interprets each variant against the real collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Begin asynchronous capture acquisition; the result comes back as a
    /// `CaptureReady` or `CaptureFailed` event
    AcquireCapture,

    /// Stash the freshly acquired handle for later release
    RetainCapture { handle: CaptureHandle },

    /// Release a handle that arrived after the call left `Connecting`
    /// (acquisition raced an end or reset)
    DiscardCapture { handle: CaptureHandle },

    /// Release the retained handle, if any
    ReleaseCapture,

    /// Start (or restart) the streaming-input forwarder
    StartStream,

    /// Cancel the forwarder and stop the streaming-input collaborator
    StopStream,

    /// Append a turn to the transcript and publish it to the rendering layer
    AppendTurn { author: Author, text: String },

    /// Swap in the full next dialogue context
    ReplaceContext { next: DialogueContext },

    /// Replace the rendered follow-up list (possibly with an empty one)
    PublishFollowUps { prompts: Vec<String> },

    /// Surface interim transcription on the listening indicator
    PublishPartial { text: String },

    /// Clear the listening indicator
    ClearPartial,

    /// Drop all transcript turns (reset path only)
    ClearTranscript,

    /// Return the dialogue context to its initial value (reset path only)
    ResetContext,

    /// Forward agent speech to the playback collaborator, fire-and-forget
    Speak { text: String },
}

impl Effect {
    pub fn customer_turn(text: impl Into<String>) -> Self {
        Effect::AppendTurn {
            author: Author::Customer,
            text: text.into(),
        }
    }

    pub fn agent_turn(text: impl Into<String>) -> Self {
        Effect::AppendTurn {
            author: Author::Agent,
            text: text.into(),
        }
    }

    pub fn system_turn(text: impl Into<String>) -> Self {
        Effect::AppendTurn {
            author: Author::System,
            text: text.into(),
        }
    }
}
