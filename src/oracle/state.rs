//! Interaction state types

use serde::{Deserialize, Serialize};

/// What the ball is doing, as seen by UI and animation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Mode {
    /// Resting, waiting for a shake
    #[default]
    Idle,
    /// Physically shaking (a request is usually outstanding too)
    Shaking,
    /// Request outstanding without a shake
    Loading,
    /// An answer is available
    Responding,
}

/// User-visible interaction state.
///
/// `shaking` and `loading` may both hold. `response` is only `Some` in
/// [`Mode::Responding`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InteractionState {
    pub shaking: bool,
    pub loading: bool,
    pub question: Option<String>,
    pub response: Option<String>,
    /// Response came from the local fallback pool
    pub fallback_used: bool,
}

impl InteractionState {
    pub fn mode(&self) -> Mode {
        if self.response.is_some() {
            Mode::Responding
        } else if self.shaking {
            Mode::Shaking
        } else if self.loading {
            Mode::Loading
        } else {
            Mode::Idle
        }
    }

    /// A shake or request is in progress; new shakes must wait
    pub fn is_busy(&self) -> bool {
        self.shaking || self.loading
    }

    pub fn is_baseline(&self) -> bool {
        *self == Self::default()
    }
}
