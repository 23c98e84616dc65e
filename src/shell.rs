//! Presentation shell
//!
//! Maps raw user input (keys, clicks, the question box) to commands against
//! the store. The only local state is the draft question, keyboard focus
//! and the mute flag; none of it affects the interaction state.

use crate::client::PredictionSource;
use crate::oracle::{InteractionState, Mode, OracleStore};

/// Raw input from a front-end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    /// `KeyboardEvent.key` value, e.g. `" "`, `"Enter"`, `"r"`
    KeyDown(String),
    /// Click or tap on the ball
    BallClicked,
    /// New contents of the question box
    QuestionEdited(String),
    /// Enter in the question box or the Ask button
    QuestionSubmitted,
    /// An editable element gained or lost focus
    FocusChanged { editing: bool },
    MuteToggled,
    ResetClicked,
}

/// What the front-end should do in response to an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Shake the ball and ask for a prediction
    Shake { question: Option<String> },
    Reset,
    SetMuted(bool),
}

/// Local UI state
#[derive(Debug, Clone, Default)]
pub struct Shell {
    draft: String,
    editing: bool,
    muted: bool,
}

impl Shell {
    pub fn new(muted: bool) -> Self {
        Self {
            muted,
            ..Default::default()
        }
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn clear_draft(&mut self) {
        self.draft.clear();
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Handle one input event.
    ///
    /// Shakes are refused while a shake or request is in progress; reset is
    /// always honored.
    pub fn handle(&mut self, event: ShellEvent, state: &InteractionState) -> Option<ShellCommand> {
        match event {
            ShellEvent::KeyDown(key) => {
                // Typing a space or an "r" into the box must not trigger
                if self.editing {
                    return None;
                }
                match key.as_str() {
                    " " | "Enter" => self.shake(state),
                    "r" | "R" => Some(ShellCommand::Reset),
                    _ => None,
                }
            }
            ShellEvent::BallClicked => self.shake(state),
            ShellEvent::QuestionEdited(text) => {
                self.draft = text;
                None
            }
            ShellEvent::QuestionSubmitted => {
                if can_submit(state, &self.draft) {
                    self.shake(state)
                } else {
                    None
                }
            }
            ShellEvent::FocusChanged { editing } => {
                self.editing = editing;
                None
            }
            ShellEvent::MuteToggled => {
                self.muted = !self.muted;
                Some(ShellCommand::SetMuted(self.muted))
            }
            ShellEvent::ResetClicked => Some(ShellCommand::Reset),
        }
    }

    fn shake(&self, state: &InteractionState) -> Option<ShellCommand> {
        if state.is_busy() {
            return None;
        }
        let question = self.draft.trim();
        Some(ShellCommand::Shake {
            question: (!question.is_empty()).then(|| question.to_string()),
        })
    }
}

/// Whether the Ask button should be enabled
pub fn can_submit(state: &InteractionState, draft: &str) -> bool {
    !state.is_busy() && !draft.trim().is_empty()
}

/// Passive indicator of what the oracle is doing
pub fn status_line(state: &InteractionState) -> &'static str {
    match state.mode() {
        Mode::Idle => "Ask a question and the oracle shall answer",
        Mode::Shaking if state.loading => "Consulting the oracle...",
        Mode::Shaking => "The spirits stir...",
        Mode::Loading => "Consulting the oracle...",
        Mode::Responding => "The oracle has spoken. Press R to ask again",
    }
}

/// Apply the synchronous part of a command: raise the shake flags and store
/// the question, or reset. Returns whether the store changed.
///
/// Front-ends call this from the event handler itself so the next event
/// already sees the new flags, then spawn the fetch separately.
pub fn apply_command(store: &OracleStore, command: &ShellCommand) -> bool {
    match command {
        ShellCommand::Shake { question } => {
            store.start_shake();
            if let Some(q) = question.as_deref() {
                store.set_question(q);
            }
            true
        }
        ShellCommand::Reset => {
            store.reset_ball();
            true
        }
        ShellCommand::SetMuted(_) => false,
    }
}

/// Finish a command after [`apply_command`]: `Shake` awaits its prediction.
///
/// Returns whether a fetch result was applied. Other commands have nothing
/// left to do.
pub async fn run_command<S>(store: &OracleStore, source: &S, command: ShellCommand) -> bool
where
    S: PredictionSource + ?Sized,
{
    match command {
        ShellCommand::Shake { question } => {
            store.fetch_response(source, question.as_deref()).await
        }
        ShellCommand::Reset | ShellCommand::SetMuted(_) => false,
    }
}
