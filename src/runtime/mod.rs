//! Session runtime: the event loop around the pure state machine
//!
//! `spawn_session` wires a `CallRuntime` onto a tokio task and hands back a
//! `SessionHandle` the rendering layer drives. Events flow in over a single
//! mpsc channel; rendering updates fan out over a broadcast channel.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::CallRuntime;
pub use traits::{
    CaptureDevice, CaptureError, CaptureErrorKind, CaptureHandle, OrderDirectory, Playback,
    SpeechEvent, SpeechSource,
};

use crate::session::{CallState, Event};
use crate::transcript::Turn;
use tokio::sync::{broadcast, mpsc};

/// Updates published to the rendering layer.
///
/// Slow or absent subscribers never block the session; broadcast drops for
/// laggards and the runtime ignores send errors when nobody listens.
#[derive(Debug, Clone)]
pub enum UiEvent {
    StateChanged { state: CallState },
    TurnAppended { turn: Turn },
    /// Full replacement of the follow-up prompt list
    FollowUps { prompts: Vec<String> },
    /// Interim transcription for the listening indicator; `None` clears it
    PartialInput { text: Option<String> },
    TranscriptCleared,
}

/// Driver handle for a running session.
///
/// Dropping the last clone closes the event channel and the runtime tears
/// itself down, releasing capture and stopping the stream.
#[derive(Clone)]
pub struct SessionHandle {
    event_tx: mpsc::Sender<Event>,
    ui_tx: broadcast::Sender<UiEvent>,
}

impl SessionHandle {
    pub async fn start(&self) {
        self.send(Event::StartRequested).await;
    }

    pub async fn end(&self) {
        self.send(Event::EndRequested).await;
    }

    pub async fn reset(&self) {
        self.send(Event::ResetRequested).await;
    }

    /// Submit typed customer input. Equivalent to a finalized utterance
    /// from the streaming path.
    pub async fn submit_text(&self, text: impl Into<String>) {
        self.send(Event::UtteranceFinalized { text: text.into() }).await;
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.ui_tx.subscribe()
    }

    async fn send(&self, event: Event) {
        if self.event_tx.send(event).await.is_err() {
            tracing::warn!("Session runtime has stopped; event dropped");
        }
    }
}

/// Spawn a session runtime on the current tokio runtime and return its
/// driver handle.
pub fn spawn_session<C, S, P>(capture: C, speech: S, playback: P) -> SessionHandle
where
    C: CaptureDevice + 'static,
    S: SpeechSource + 'static,
    P: Playback + 'static,
{
    let (event_tx, event_rx) = mpsc::channel(32);
    let (ui_tx, _) = broadcast::channel(128);

    // The runtime gets only a weak sender, so the loop ends (and resources
    // release) once every driver handle has been dropped.
    let runtime = CallRuntime::new(
        capture,
        speech,
        playback,
        event_rx,
        event_tx.downgrade(),
        ui_tx.clone(),
    );
    tokio::spawn(runtime.run());

    SessionHandle { event_tx, ui_tx }
}
