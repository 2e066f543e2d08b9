//! Interactive console demo for the call session core.
//!
//! Drives a session from stdin with slash commands and prints every
//! rendering update; capture always succeeds and playback goes to stdout,
//! so the whole lifecycle can be exercised without audio hardware.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use switchboard::orders::StaticOrderDirectory;
use switchboard::runtime::{
    spawn_session, CaptureDevice, CaptureError, CaptureHandle, OrderDirectory, Playback,
    SpeechEvent, SpeechSource, UiEvent,
};
use switchboard::transcript::Author;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Capture device that always grants a handle.
struct ConsoleCapture {
    next_id: AtomicU64,
}

#[async_trait]
impl CaptureDevice for ConsoleCapture {
    async fn acquire(&self) -> Result<CaptureHandle, CaptureError> {
        Ok(CaptureHandle::new(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    async fn release(&self, _handle: CaptureHandle) {}
}

/// Speech source that never produces events; input comes through stdin.
///
/// The sender is held until `stop` so the stream does not end and trigger
/// the restart path.
struct SilentSpeechSource {
    sender: Mutex<Option<mpsc::Sender<SpeechEvent>>>,
}

#[async_trait]
impl SpeechSource for SilentSpeechSource {
    async fn start(&self) -> mpsc::Receiver<SpeechEvent> {
        let (tx, rx) = mpsc::channel(1);
        *self.sender.lock().await = Some(tx);
        rx
    }

    async fn stop(&self) {
        self.sender.lock().await.take();
    }
}

struct ConsolePlayback;

#[async_trait]
impl Playback for ConsolePlayback {
    async fn speak(&self, text: &str) {
        tracing::debug!(len = text.len(), "speaking agent reply");
    }
}

fn author_label(author: Author) -> &'static str {
    match author {
        Author::Customer => "you",
        Author::Agent => "aria",
        Author::System => "system",
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "switchboard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let session = spawn_session(
        ConsoleCapture {
            next_id: AtomicU64::new(1),
        },
        SilentSpeechSource {
            sender: Mutex::new(None),
        },
        ConsolePlayback,
    );

    // Printer task: render every update as it arrives.
    let mut ui = session.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = ui.recv().await {
            match event {
                UiEvent::StateChanged { state } => println!("  [call: {state:?}]"),
                UiEvent::TurnAppended { turn } => {
                    println!("  {}: {}", author_label(turn.author), turn.text);
                }
                UiEvent::FollowUps { prompts } if !prompts.is_empty() => {
                    println!("  suggested: {}", prompts.join(" | "));
                }
                UiEvent::FollowUps { .. } => {}
                UiEvent::PartialInput { text: Some(text) } => println!("  (hearing: {text}…)"),
                UiEvent::PartialInput { text: None } => {}
                UiEvent::TranscriptCleared => println!("  [transcript cleared]"),
            }
        }
    });

    println!("commands: /start  /end  /reset  /orders  /quit  (anything else is sent to the agent)");

    let orders = StaticOrderDirectory;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => {}
            "/quit" => break,
            "/start" => session.start().await,
            "/end" => session.end().await,
            "/reset" => session.reset().await,
            "/orders" => {
                for order in orders.orders() {
                    println!("  {}", serde_json::to_string(&order)?);
                }
            }
            text => session.submit_text(text).await,
        }
    }

    Ok(())
}
