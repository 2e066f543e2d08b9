//! Call lifecycle states

use serde::{Deserialize, Serialize};

/// Lifecycle of the single active call session.
///
/// The machine is cyclic: `Ended` is not terminal. Reset is
/// accepted from every state and returns to `Idle`, from which a fresh
/// call can always be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallState {
    /// No call in progress; ready for a start request
    #[default]
    Idle,

    /// Start accepted; capture acquisition in flight
    Connecting,

    /// Call live: customer turns are accepted and evaluated
    Active,

    /// Call finished; transcript retained for post-call review until reset
    Ended,
}

impl CallState {
    pub fn is_active(self) -> bool {
        matches!(self, CallState::Active)
    }
}
