//! Switchboard: a live customer-support call session core.
//!
//! The session is an Elm-style state machine: `session::transition` is a
//! pure function over (state, context, event) that returns the next state
//! plus a list of effects, and `runtime::CallRuntime` interprets those
//! effects against pluggable capture, speech, and playback collaborators.
//! The reply evaluator, transcript log, and dialogue context store are all
//! plain synchronous modules underneath it.

pub mod dialogue;
pub mod evaluator;
pub mod orders;
pub mod runtime;
pub mod session;
pub mod transcript;
