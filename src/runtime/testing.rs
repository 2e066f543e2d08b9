//! Mock collaborators and end-to-end session tests
//!
//! The mocks record every acquire, release, start, and stop so tests can
//! assert the resource accounting that the state machine's effects imply.

use super::traits::{
    CaptureDevice, CaptureError, CaptureHandle, Playback, SpeechEvent, SpeechSource,
};
use super::{spawn_session, SessionHandle, UiEvent};
use crate::session::CallState;
use crate::transcript::{Author, Turn};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Semaphore};
use tokio::time::{timeout, Instant};

const WAIT: Duration = Duration::from_secs(2);

/// Capture device that grants, denies, or waits on a gate before settling.
pub struct MockCaptureDevice {
    deny: Option<String>,
    gate: Option<Arc<Semaphore>>,
    next_id: AtomicU64,
    acquired: Mutex<Vec<u64>>,
    released: Mutex<Vec<u64>>,
}

impl MockCaptureDevice {
    pub fn granting() -> Self {
        Self {
            deny: None,
            gate: None,
            next_id: AtomicU64::new(1),
            acquired: Mutex::new(vec![]),
            released: Mutex::new(vec![]),
        }
    }

    pub fn denying(message: &str) -> Self {
        Self {
            deny: Some(message.to_string()),
            ..Self::granting()
        }
    }

    /// Acquisition blocks until the returned semaphore gets a permit, so a
    /// test can interleave other events while acquisition is in flight.
    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let device = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::granting()
        };
        (device, gate)
    }

    pub fn acquired(&self) -> Vec<u64> {
        self.acquired.lock().unwrap().clone()
    }

    pub fn released(&self) -> Vec<u64> {
        self.released.lock().unwrap().clone()
    }
}

#[async_trait]
impl CaptureDevice for MockCaptureDevice {
    async fn acquire(&self) -> Result<CaptureHandle, CaptureError> {
        if let Some(gate) = &self.gate {
            let permit = gate.acquire().await.unwrap();
            permit.forget();
        }
        if let Some(message) = &self.deny {
            return Err(CaptureError::denied(message.clone()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.acquired.lock().unwrap().push(id);
        Ok(CaptureHandle::new(id))
    }

    async fn release(&self, handle: CaptureHandle) {
        self.released.lock().unwrap().push(handle.id());
    }
}

/// Speech source whose events are pushed by the test.
pub struct ScriptedSpeechSource {
    sender: Mutex<Option<mpsc::Sender<SpeechEvent>>>,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl ScriptedSpeechSource {
    pub fn new() -> Self {
        Self {
            sender: Mutex::new(None),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        }
    }

    /// Feed an event into the most recently started stream.
    pub async fn push(&self, event: SpeechEvent) {
        let sender = self
            .sender
            .lock()
            .unwrap()
            .clone()
            .expect("stream not started");
        sender.send(event).await.expect("forwarder gone");
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSource for ScriptedSpeechSource {
    async fn start(&self) -> mpsc::Receiver<SpeechEvent> {
        let (tx, rx) = mpsc::channel(16);
        *self.sender.lock().unwrap() = Some(tx);
        self.starts.fetch_add(1, Ordering::SeqCst);
        rx
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Playback that records everything it is asked to speak.
pub struct RecordingPlayback {
    spoken: Mutex<Vec<String>>,
}

impl RecordingPlayback {
    pub fn new() -> Self {
        Self {
            spoken: Mutex::new(vec![]),
        }
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl Playback for RecordingPlayback {
    async fn speak(&self, text: &str) {
        self.spoken.lock().unwrap().push(text.to_string());
    }
}

/// A spawned session plus handles to all of its mocks.
pub struct TestSession {
    pub capture: Arc<MockCaptureDevice>,
    pub speech: Arc<ScriptedSpeechSource>,
    pub playback: Arc<RecordingPlayback>,
    pub handle: SessionHandle,
    pub ui: broadcast::Receiver<UiEvent>,
}

impl TestSession {
    pub fn new() -> Self {
        Self::with_capture(MockCaptureDevice::granting())
    }

    pub fn with_capture(capture: MockCaptureDevice) -> Self {
        let capture = Arc::new(capture);
        let speech = Arc::new(ScriptedSpeechSource::new());
        let playback = Arc::new(RecordingPlayback::new());
        let handle = spawn_session(
            Arc::clone(&capture),
            Arc::clone(&speech),
            Arc::clone(&playback),
        );
        let ui = handle.subscribe();
        Self {
            capture,
            speech,
            playback,
            handle,
            ui,
        }
    }

    pub async fn next_ui(&mut self) -> UiEvent {
        timeout(WAIT, self.ui.recv())
            .await
            .expect("timed out waiting for ui event")
            .expect("ui channel closed")
    }

    /// Skip ahead until the session reports the wanted state.
    pub async fn expect_state(&mut self, want: CallState) {
        loop {
            if let UiEvent::StateChanged { state } = self.next_ui().await {
                assert_eq!(state, want);
                return;
            }
        }
    }

    /// Skip ahead until the next appended turn.
    pub async fn expect_turn(&mut self) -> Turn {
        loop {
            if let UiEvent::TurnAppended { turn } = self.next_ui().await {
                return turn;
            }
        }
    }

    pub async fn start_and_wait_active(&mut self) {
        self.handle.start().await;
        self.expect_state(CallState::Connecting).await;
        self.expect_state(CallState::Active).await;
    }
}

/// Poll a condition until it holds or the shared deadline passes.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + WAIT;
    while !condition() {
        assert!(Instant::now() < deadline, "condition not met in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_session_seeds_a_system_ready_turn() {
        let mut session = TestSession::new();
        let turn = session.expect_turn().await;
        assert_eq!(turn.author, Author::System);
    }

    #[tokio::test]
    async fn start_goes_active_and_greets() {
        let mut session = TestSession::new();
        session.expect_turn().await; // seeded notice

        session.start_and_wait_active().await;

        let greeting = session.expect_turn().await;
        assert_eq!(greeting.author, Author::Agent);
        assert!(!greeting.text.is_empty());
        assert_eq!(session.capture.acquired().len(), 1);
        assert_eq!(session.speech.start_count(), 1);
    }

    #[tokio::test]
    async fn typed_submission_appends_customer_then_agent_turn() {
        let mut session = TestSession::new();
        session.start_and_wait_active().await;
        session.expect_turn().await; // greeting

        session.handle.submit_text("do you ship internationally?").await;

        let customer = session.expect_turn().await;
        assert_eq!(customer.author, Author::Customer);
        assert_eq!(customer.text, "do you ship internationally?");

        let agent = session.expect_turn().await;
        assert_eq!(agent.author, Author::Agent);
        assert!(!agent.text.is_empty());
    }

    #[tokio::test]
    async fn agent_reply_is_spoken_and_follow_ups_published() {
        let mut session = TestSession::new();
        session.start_and_wait_active().await;
        session.expect_turn().await; // greeting

        session.handle.submit_text("I never got a refund").await;

        let mut follow_ups = None;
        let agent = loop {
            match session.next_ui().await {
                UiEvent::TurnAppended { turn } if turn.author == Author::Agent => break turn,
                UiEvent::FollowUps { prompts } => follow_ups = Some(prompts),
                _ => {}
            }
        };

        let playback = Arc::clone(&session.playback);
        let spoken_reply = agent.text.clone();
        wait_until(move || playback.spoken().contains(&spoken_reply)).await;

        // FollowUps is emitted after the agent turn in the effect order.
        if follow_ups.is_none() {
            loop {
                if let UiEvent::FollowUps { prompts } = session.next_ui().await {
                    follow_ups = Some(prompts);
                    break;
                }
            }
        }
        assert!(!follow_ups.unwrap().is_empty());
    }

    #[tokio::test]
    async fn finalized_speech_behaves_like_typed_input() {
        let mut session = TestSession::new();
        session.start_and_wait_active().await;
        session.expect_turn().await; // greeting

        session
            .speech
            .push(SpeechEvent::Final {
                text: "when are you open".to_string(),
            })
            .await;

        let customer = session.expect_turn().await;
        assert_eq!(customer.author, Author::Customer);
        assert_eq!(customer.text, "when are you open");
        let agent = session.expect_turn().await;
        assert_eq!(agent.author, Author::Agent);
    }

    #[tokio::test]
    async fn partial_speech_surfaces_then_clears_on_finalization() {
        let mut session = TestSession::new();
        session.start_and_wait_active().await;
        session.expect_turn().await; // greeting

        session
            .speech
            .push(SpeechEvent::Partial {
                text: "where is".to_string(),
            })
            .await;

        loop {
            if let UiEvent::PartialInput { text } = session.next_ui().await {
                assert_eq!(text.as_deref(), Some("where is"));
                break;
            }
        }

        session
            .speech
            .push(SpeechEvent::Final {
                text: "where is my order".to_string(),
            })
            .await;

        loop {
            if let UiEvent::PartialInput { text } = session.next_ui().await {
                assert!(text.is_none());
                break;
            }
        }
    }

    #[tokio::test]
    async fn capture_denial_returns_to_idle_with_a_notice() {
        let mut session =
            TestSession::with_capture(MockCaptureDevice::denying("microphone denied"));
        session.expect_turn().await; // seeded notice

        session.handle.start().await;
        session.expect_state(CallState::Connecting).await;
        session.expect_state(CallState::Idle).await;

        let notice = session.expect_turn().await;
        assert_eq!(notice.author, Author::System);
        assert!(notice.text.contains("microphone denied"));
        assert_eq!(session.speech.start_count(), 0, "no stream without capture");
    }

    #[tokio::test]
    async fn stream_end_restarts_while_active() {
        let mut session = TestSession::new();
        session.start_and_wait_active().await;
        assert_eq!(session.speech.start_count(), 1);

        session.speech.push(SpeechEvent::Ended).await;

        let speech = Arc::clone(&session.speech);
        wait_until(move || speech.start_count() == 2).await;
    }

    #[tokio::test]
    async fn stream_error_keeps_the_call_active() {
        let mut session = TestSession::new();
        session.start_and_wait_active().await;
        session.expect_turn().await; // greeting

        session
            .speech
            .push(SpeechEvent::Error {
                message: "socket dropped".to_string(),
            })
            .await;

        let notice = session.expect_turn().await;
        assert_eq!(notice.author, Author::System);
        assert!(notice.text.contains("socket dropped"));

        // Typed input still works on the same call.
        session.handle.submit_text("do you do returns?").await;
        let customer = session.expect_turn().await;
        assert_eq!(customer.author, Author::Customer);
    }

    #[tokio::test]
    async fn ending_the_call_releases_capture_and_stops_the_stream() {
        let mut session = TestSession::new();
        session.start_and_wait_active().await;
        session.expect_turn().await; // greeting

        session.handle.end().await;
        session.expect_state(CallState::Ended).await;

        let farewell = session.expect_turn().await;
        assert_eq!(farewell.author, Author::Agent);

        let capture = Arc::clone(&session.capture);
        wait_until(move || capture.released() == capture.acquired()).await;
        assert_eq!(session.speech.stop_count(), 1);
    }

    #[tokio::test]
    async fn reset_clears_the_transcript_and_reseeds_it() {
        let mut session = TestSession::new();
        session.start_and_wait_active().await;
        session.expect_turn().await; // greeting
        session.handle.submit_text("hello there").await;
        session.expect_turn().await; // customer
        session.expect_turn().await; // agent

        session.handle.reset().await;
        session.expect_state(CallState::Idle).await;

        loop {
            if let UiEvent::TranscriptCleared = session.next_ui().await {
                break;
            }
        }
        let reseeded = session.expect_turn().await;
        assert_eq!(reseeded.author, Author::System);

        let capture = Arc::clone(&session.capture);
        wait_until(move || capture.released() == capture.acquired()).await;
    }

    #[tokio::test]
    async fn capture_settling_after_reset_is_still_released() {
        let (device, gate) = MockCaptureDevice::gated();
        let mut session = TestSession::with_capture(device);
        session.expect_turn().await; // seeded notice

        session.handle.start().await;
        session.expect_state(CallState::Connecting).await;

        // Reset lands while acquisition is still in flight.
        session.handle.reset().await;
        session.expect_state(CallState::Idle).await;

        gate.add_permits(1);

        let capture = Arc::clone(&session.capture);
        wait_until(move || capture.released().len() == 1).await;
        assert_eq!(session.speech.start_count(), 0, "never went active");
    }

    #[tokio::test]
    async fn dropping_every_handle_tears_the_session_down() {
        let mut session = TestSession::new();
        session.start_and_wait_active().await;

        let capture = Arc::clone(&session.capture);
        let speech = Arc::clone(&session.speech);
        drop(session);

        let released = Arc::clone(&capture);
        wait_until(move || released.released() == released.acquired()).await;
        assert_eq!(capture.acquired().len(), 1);
        assert_eq!(speech.stop_count(), 1);
    }

    #[tokio::test]
    async fn starting_twice_acquires_only_once() {
        let mut session = TestSession::new();
        session.start_and_wait_active().await;
        session.expect_turn().await; // greeting

        session.handle.start().await;
        // A later submission proves the second start was processed first.
        session.handle.submit_text("are you open on sunday").await;
        let customer = session.expect_turn().await;
        assert_eq!(customer.author, Author::Customer);

        assert_eq!(session.capture.acquired().len(), 1);
    }
}
