use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepId(pub Uuid);

impl StepId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StepId {
    fn default() -> Self {
        Self::new()
    }
}

/// Linear RGBA color component of a step accent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    #[serde(default = "default_alpha")]
    pub a: f32,
}

fn default_alpha() -> f32 {
    1.0
}

impl Color {
    pub const CLEAR: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };
    pub const BLUE: Color = Color::rgb(0.004, 0.373, 1.0);
    pub const CYAN: Color = Color::rgb(0.0, 0.875, 1.0);
    pub const AZURE: Color = Color::rgb(0.004, 0.678, 1.0);
    pub const ORANGE: Color = Color::rgb(1.0, 0.584, 0.0);
    pub const PURPLE: Color = Color::rgb(0.686, 0.322, 0.871);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

/// Three-color tuple theming the ambient background while a step is active.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Accent(pub Color, pub Color, pub Color);

impl Accent {
    /// Neutral value used once no step is active anymore.
    pub const fn clear() -> Self {
        Accent(Color::CLEAR, Color::CLEAR, Color::CLEAR)
    }

    pub const fn solid(color: Color) -> Self {
        Accent(color, color, color)
    }

    /// Gradient shown on the welcome screen before any step is active.
    pub const fn welcome() -> Self {
        Accent(Color::BLUE, Color::CYAN, Color::AZURE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Idle,
    Loading,
    Success,
    Error,
}

impl StepStatus {
    /// A step accepts a new submission while idle or after a failed one.
    pub fn accepts_submission(self) -> bool {
        matches!(self, Self::Idle | Self::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Text,
    Email,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum StepPrompt {
    Button { label: String, icon: String },
    Text { placeholder: String, input: InputKind },
}

impl StepPrompt {
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }
}

/// Describable half of a step: everything a renderer needs, minus the action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepContent {
    #[serde(default)]
    pub id: StepId,
    pub icon: String,
    pub title: String,
    pub description: String,
    pub prompt: StepPrompt,
    pub accent: Accent,
}

/// Copy shown by the terminal step: one pair while its own action runs,
/// another once it has succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionContent {
    pub pending_title: String,
    pub pending_description: String,
    pub done_title: String,
    pub done_description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPhase {
    Pending,
    Finalizing,
    Done,
    Failed,
}

impl CompletionPhase {
    /// Finalization may be (re-)started from these phases.
    pub fn accepts_finalize(self) -> bool {
        matches!(self, Self::Pending | Self::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_accent_is_fully_transparent() {
        let Accent(a, b, c) = Accent::clear();
        for color in [a, b, c] {
            assert_eq!(color.a, 0.0);
        }
    }

    #[test]
    fn statuses_accepting_submission() {
        assert!(StepStatus::Idle.accepts_submission());
        assert!(StepStatus::Error.accepts_submission());
        assert!(!StepStatus::Loading.accepts_submission());
        assert!(!StepStatus::Success.accepts_submission());
    }

    #[test]
    fn phases_accepting_finalize() {
        assert!(CompletionPhase::Pending.accepts_finalize());
        assert!(CompletionPhase::Failed.accepts_finalize());
        assert!(!CompletionPhase::Finalizing.accepts_finalize());
        assert!(!CompletionPhase::Done.accepts_finalize());
    }

    #[test]
    fn fresh_step_ids_are_unique() {
        assert_ne!(StepId::new(), StepId::new());
    }
}
