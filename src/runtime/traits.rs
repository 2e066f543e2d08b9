//! Trait abstractions for the external call collaborators
//!
//! The session core only ever talks to capture, speech, playback, and the
//! order dataset through these traits, so the runtime can be integration
//! tested with mock implementations.

use crate::orders::OrderRecord;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Opaque token for an acquired capture resource.
///
/// The device mints it on `acquire` and takes it back on `release`; the
/// core never inspects it beyond logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureHandle {
    id: u64,
}

impl CaptureHandle {
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Capture acquisition failure with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CaptureError {
    pub kind: CaptureErrorKind,
    pub message: String,
}

impl CaptureError {
    pub fn new(kind: CaptureErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn denied(message: impl Into<String>) -> Self {
        Self::new(CaptureErrorKind::Denied, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(CaptureErrorKind::Unavailable, message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureErrorKind {
    /// Permission refused by the user or platform
    Denied,
    /// No usable device present
    Unavailable,
    Unknown,
}

/// Device/capture resource: asynchronous acquisition, explicit release.
///
/// No deadline is imposed on `acquire`; failure is reported only through
/// its own error, never a timeout.
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    async fn acquire(&self) -> Result<CaptureHandle, CaptureError>;
    async fn release(&self, handle: CaptureHandle);
}

/// Events emitted by the streaming-input collaborator
#[derive(Debug, Clone)]
pub enum SpeechEvent {
    /// Interim transcription, surfaced on the listening indicator only
    Partial { text: String },
    /// Finalized transcription, consumed as a customer turn
    Final { text: String },
    /// End of stream (e.g. transient disconnect); restartable
    Ended,
    /// Runtime error; the call stays live on the typed-input path
    Error { message: String },
}

/// Streaming input source delivering transcribed speech.
///
/// `start` hands back a fresh event stream; channel closure is treated the
/// same as an explicit `Ended` signal.
#[async_trait]
pub trait SpeechSource: Send + Sync {
    async fn start(&self) -> mpsc::Receiver<SpeechEvent>;
    async fn stop(&self);
}

/// Text-to-speech playback; fire-and-forget, no acknowledgment expected.
#[async_trait]
pub trait Playback: Send + Sync {
    async fn speak(&self, text: &str);
}

/// Read-only provider of the fixed order dataset shown by the rendering
/// layer. The evaluator does not query it per-utterance (extension point).
pub trait OrderDirectory: Send + Sync {
    fn orders(&self) -> Vec<OrderRecord>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: CaptureDevice + ?Sized> CaptureDevice for Arc<T> {
    async fn acquire(&self) -> Result<CaptureHandle, CaptureError> {
        (**self).acquire().await
    }

    async fn release(&self, handle: CaptureHandle) {
        (**self).release(handle).await;
    }
}

#[async_trait]
impl<T: SpeechSource + ?Sized> SpeechSource for Arc<T> {
    async fn start(&self) -> mpsc::Receiver<SpeechEvent> {
        (**self).start().await
    }

    async fn stop(&self) {
        (**self).stop().await;
    }
}

#[async_trait]
impl<T: Playback + ?Sized> Playback for Arc<T> {
    async fn speak(&self, text: &str) {
        (**self).speak(text).await;
    }
}

impl<T: OrderDirectory + ?Sized> OrderDirectory for Arc<T> {
    fn orders(&self) -> Vec<OrderRecord> {
        (**self).orders()
    }
}
