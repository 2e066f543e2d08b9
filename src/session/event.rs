//! Events that drive the call session state machine

use crate::runtime::traits::CaptureHandle;

/// Discrete external events, processed one at a time to completion.
#[derive(Debug, Clone)]
pub enum Event {
    // Driver requests
    StartRequested,
    EndRequested,
    ResetRequested,

    // Capture acquisition results (reported by the spawned acquire task)
    CaptureReady { handle: CaptureHandle },
    CaptureFailed { message: String },

    // Input arrival: typed text and finalized transcript fragments share
    // one path; partials only feed the live listening indicator
    UtteranceFinalized { text: String },
    PartialTranscript { text: String },

    // Streaming-input lifecycle signals
    StreamEnded,
    StreamError { message: String },
}
