//! Call session runtime executor
//!
//! Owns the transcript, the dialogue context store, and the collaborator
//! handles. A single event loop processes each event to completion: pure
//! transition first, then the resulting effects in order, so customer
//! turns and their agent replies land in strict receipt order.

use super::traits::{CaptureDevice, CaptureHandle, Playback, SpeechEvent, SpeechSource};
use super::UiEvent;
use crate::dialogue::ContextStore;
use crate::session::transition::READY_NOTICE;
use crate::session::{transition, CallState, Effect, Event};
use crate::transcript::{Author, TranscriptLog};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

/// Generic session runtime over any capture, speech, and playback
/// implementations.
pub struct CallRuntime<C, S, P>
where
    C: CaptureDevice + 'static,
    S: SpeechSource + 'static,
    P: Playback + 'static,
{
    state: CallState,
    transcript: TranscriptLog,
    context: ContextStore,
    capture: Arc<C>,
    speech: Arc<S>,
    playback: Arc<P>,
    /// Handle retained while the call holds the capture resource
    capture_handle: Option<CaptureHandle>,
    /// Token cancelling the current stream forwarder task
    stream_cancel: Option<CancellationToken>,
    event_rx: mpsc::Receiver<Event>,
    /// Weak so the runtime's own spawned tasks never keep the channel
    /// open; the loop exits once every driver handle is gone.
    event_tx: mpsc::WeakSender<Event>,
    ui_tx: broadcast::Sender<UiEvent>,
}

impl<C, S, P> CallRuntime<C, S, P>
where
    C: CaptureDevice + 'static,
    S: SpeechSource + 'static,
    P: Playback + 'static,
{
    pub fn new(
        capture: C,
        speech: S,
        playback: P,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::WeakSender<Event>,
        ui_tx: broadcast::Sender<UiEvent>,
    ) -> Self {
        Self {
            state: CallState::Idle,
            transcript: TranscriptLog::new(),
            context: ContextStore::new(),
            capture: Arc::new(capture),
            speech: Arc::new(speech),
            playback: Arc::new(playback),
            capture_handle: None,
            stream_cancel: None,
            event_rx,
            event_tx,
            ui_tx,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("Starting call session runtime");

        // Seed the transcript so a fresh session and a reset session look
        // identical to the rendering layer.
        self.append_turn(Author::System, READY_NOTICE.to_string());

        // Process events in a loop - no recursion
        while let Some(event) = self.event_rx.recv().await {
            self.process_event(event).await;
        }

        // Teardown (driver handle dropped): converge on the same release
        // routine as end and reset so capture never leaks.
        self.stop_stream().await;
        self.release_capture().await;

        tracing::info!("Call session runtime stopped");
    }

    async fn process_event(&mut self, event: Event) {
        let result = transition(self.state, self.context.current(), event);

        if result.next_state != self.state {
            tracing::info!(from = ?self.state, to = ?result.next_state, "Call state changed");
            self.state = result.next_state;
            let _ = self.ui_tx.send(UiEvent::StateChanged { state: self.state });
        }

        for effect in result.effects {
            self.execute_effect(effect).await;
        }
    }

    async fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AcquireCapture => {
                // Acquisition is asynchronous relative to the start event;
                // the result comes back through the event channel.
                let capture = Arc::clone(&self.capture);
                let event_tx = self.event_tx.clone();
                tokio::spawn(async move {
                    match capture.acquire().await {
                        Ok(handle) => {
                            let undelivered = match event_tx.upgrade() {
                                Some(tx) => tx
                                    .send(Event::CaptureReady { handle })
                                    .await
                                    .err()
                                    .map(|e| e.0),
                                None => Some(Event::CaptureReady { handle }),
                            };
                            // Runtime already gone: release the grant here
                            // instead of leaking it.
                            if let Some(Event::CaptureReady { handle }) = undelivered {
                                capture.release(handle).await;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Capture acquisition failed");
                            if let Some(tx) = event_tx.upgrade() {
                                let _ = tx
                                    .send(Event::CaptureFailed {
                                        message: e.to_string(),
                                    })
                                    .await;
                            }
                        }
                    }
                });
            }

            Effect::RetainCapture { handle } => {
                tracing::debug!(handle = handle.id(), "Retaining capture handle");
                if let Some(old) = self.capture_handle.replace(handle) {
                    // Shouldn't happen given the state guards, but never
                    // leak a previously retained handle.
                    tracing::warn!(handle = old.id(), "Releasing superseded capture handle");
                    self.capture.release(old).await;
                }
            }

            Effect::DiscardCapture { handle } => {
                tracing::warn!(handle = handle.id(), "Discarding late capture handle");
                self.capture.release(handle).await;
            }

            Effect::ReleaseCapture => self.release_capture().await,

            Effect::StartStream => self.start_stream().await,

            Effect::StopStream => self.stop_stream().await,

            Effect::AppendTurn { author, text } => self.append_turn(author, text),

            Effect::ReplaceContext { next } => self.context.replace(next),

            Effect::PublishFollowUps { prompts } => {
                let _ = self.ui_tx.send(UiEvent::FollowUps { prompts });
            }

            Effect::PublishPartial { text } => {
                let _ = self.ui_tx.send(UiEvent::PartialInput { text: Some(text) });
            }

            Effect::ClearPartial => {
                let _ = self.ui_tx.send(UiEvent::PartialInput { text: None });
            }

            Effect::ClearTranscript => {
                self.transcript.clear();
                let _ = self.ui_tx.send(UiEvent::TranscriptCleared);
            }

            Effect::ResetContext => self.context.reset(),

            Effect::Speak { text } => {
                // Fire-and-forget: playback never blocks the event loop.
                let playback = Arc::clone(&self.playback);
                tokio::spawn(async move {
                    playback.speak(&text).await;
                });
            }
        }
    }

    fn append_turn(&mut self, author: Author, text: String) {
        let turn = self.transcript.append(author, text);
        let _ = self.ui_tx.send(UiEvent::TurnAppended { turn });
    }

    /// Start (or restart) the streaming-input forwarder.
    ///
    /// The forwarder maps collaborator events onto session events until the
    /// stream ends or the token is cancelled; a restart gets a fresh
    /// forwarder, keeping the reconnect loop explicit instead of recursive.
    async fn start_stream(&mut self) {
        if let Some(token) = self.stream_cancel.take() {
            token.cancel();
        }
        let cancel = CancellationToken::new();
        self.stream_cancel = Some(cancel.clone());

        let mut speech_rx = self.speech.start().await;
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;

                    () = cancel.cancelled() => break,

                    maybe = speech_rx.recv() => {
                        let (event, stream_over) = match maybe {
                            Some(SpeechEvent::Partial { text }) => {
                                (Event::PartialTranscript { text }, false)
                            }
                            Some(SpeechEvent::Final { text }) => {
                                (Event::UtteranceFinalized { text }, false)
                            }
                            Some(SpeechEvent::Error { message }) => {
                                (Event::StreamError { message }, false)
                            }
                            Some(SpeechEvent::Ended) | None => (Event::StreamEnded, true),
                        };
                        let Some(tx) = event_tx.upgrade() else { break };
                        if tx.send(event).await.is_err() || stream_over {
                            break;
                        }
                    }
                }
            }
        });
    }

    async fn stop_stream(&mut self) {
        if let Some(token) = self.stream_cancel.take() {
            token.cancel();
            self.speech.stop().await;
        }
    }

    async fn release_capture(&mut self) {
        if let Some(handle) = self.capture_handle.take() {
            tracing::debug!(handle = handle.id(), "Releasing capture handle");
            self.capture.release(handle).await;
        }
    }
}
