use thiserror::Error;

/// Errors the form controller reports to its caller directly.
///
/// Failures inside a step's submit action are not represented here: they are
/// contained per step and surface as that step's `Error` status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("text prompt requires a non-empty answer")]
    EmptyAnswer,
}
