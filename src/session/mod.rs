//! Call session state machine
//!
//! Elm-architecture core: pure transitions over (state, context, event)
//! producing effects the runtime executes.

mod effect;
pub mod event;
mod state;
pub mod transition;


pub use effect::Effect;
pub use event::Event;
pub use state::CallState;
pub use transition::{transition, TransitionResult};
